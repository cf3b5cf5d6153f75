//! Advisor administration and the country-allocations dashboard data.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::advisors::NewAdvisor;
use crate::db::store::Table;
use crate::db::{DashboardDb, DbAdvisor};
use crate::error::AppError;
use crate::refresh::RefreshHub;
use crate::validate;

/// Fields collected by the add/edit advisor modal.
#[derive(Debug, Clone)]
pub struct AdvisorForm {
    pub department_code: String,
    pub name: String,
    pub short_name: String,
    pub role: String,
    pub email: String,
    pub active: bool,
    /// Multi-select of ISO alpha-3 codes.
    pub country_codes: Vec<String>,
    pub colour: String,
}

/// Validation mirrors the original modal: colour format first, then the
/// required trio, then the email shape.
fn validated(form: &AdvisorForm) -> Result<NewAdvisor, AppError> {
    validate::validate_hex_colour(&form.colour)?;
    if form.name.trim().is_empty()
        || form.short_name.trim().is_empty()
        || form.department_code.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Name, Short Name, and Department are required fields.".to_string(),
        ));
    }
    validate::validate_email(&form.email)?;

    let country_codes = validate::join_list(&form.country_codes);
    Ok(NewAdvisor {
        department_code: form.department_code.trim().to_string(),
        name: form.name.trim().to_string(),
        short_name: form.short_name.trim().to_string(),
        role: match form.role.trim() {
            "" => None,
            role => Some(role.to_string()),
        },
        email: Some(form.email.trim().to_string()),
        active: form.active,
        country_codes: if country_codes.is_empty() {
            None
        } else {
            Some(country_codes)
        },
        colour: Some(form.colour.clone()),
    })
}

pub fn create_advisor(
    db: &DashboardDb,
    hub: &RefreshHub,
    form: &AdvisorForm,
) -> Result<i64, AppError> {
    let advisor = validated(form)?;
    let id = db.insert_advisor(&advisor)?;
    hub.publish(&[Table::Advisors]);
    Ok(id)
}

pub fn update_advisor(
    db: &DashboardDb,
    hub: &RefreshHub,
    id: i64,
    form: &AdvisorForm,
) -> Result<usize, AppError> {
    let advisor = validated(form)?;
    let affected = db.update_advisor(id, &advisor)?;
    hub.publish(&[Table::Advisors]);
    Ok(affected)
}

/// Bulk delete from the admin table.
pub fn delete_advisors(db: &DashboardDb, hub: &RefreshHub, ids: &[i64]) -> Result<usize, AppError> {
    let ids = super::require_selection(ids, "delete")?;
    let removed = db.delete_advisors(ids)?;
    hub.publish(&[Table::Advisors]);
    Ok(removed)
}

pub fn list_advisors(db: &DashboardDb) -> Result<Vec<DbAdvisor>, AppError> {
    Ok(db.list_advisors()?)
}

/// Short names offered in form selection lists (active advisors only).
pub fn advisor_options(db: &DashboardDb, department_code: &str) -> Result<Vec<String>, AppError> {
    let advisors = db.list_department_advisors(department_code, true)?;
    Ok(advisors.into_iter().map(|a| a.short_name).collect())
}

/// One advisor↔country pair on the allocations choropleth.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryAllocation {
    pub advisor_short_name: String,
    pub country_name: String,
    pub colour: Option<String>,
}

/// Active advisors' country codes exploded and joined against the countries
/// reference table. Codes with no reference row are dropped, matching the
/// original left-join-then-plot behaviour.
pub fn allocations(
    db: &DashboardDb,
    department_code: &str,
) -> Result<Vec<CountryAllocation>, AppError> {
    let advisors = db.list_department_advisors(department_code, true)?;
    let names_by_code = db.country_names_by_code()?;

    let mut allocations = Vec::new();
    for advisor in &advisors {
        let Some(codes) = &advisor.country_codes else {
            continue;
        };
        for code in validate::split_list(codes) {
            match names_by_code.get(&code) {
                Some(country_name) => allocations.push(CountryAllocation {
                    advisor_short_name: advisor.short_name.clone(),
                    country_name: country_name.clone(),
                    colour: advisor.colour.clone(),
                }),
                None => log::debug!(
                    "Advisor {} references unknown country code {code}",
                    advisor.short_name
                ),
            }
        }
    }
    Ok(allocations)
}

/// short_name → legend colour for one department.
pub fn colour_map(
    db: &DashboardDb,
    department_code: &str,
) -> Result<HashMap<String, String>, AppError> {
    Ok(db.advisor_colour_map(department_code)?)
}
