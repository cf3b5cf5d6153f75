//! Countries panel: focal-point contact CRUD and filter options.

use crate::db::country_focals::NewCountryFocal;
use crate::db::store::Table;
use crate::db::{DashboardDb, DbCountryFocal};
use crate::error::AppError;
use crate::refresh::RefreshHub;
use crate::validate;

/// Fields collected by the add/edit focal-point modal.
#[derive(Debug, Clone)]
pub struct CountryFocalForm {
    pub name: String,
    pub country_name: String,
    pub role: String,
    pub email: String,
}

fn validated(department_code: &str, form: &CountryFocalForm) -> Result<NewCountryFocal, AppError> {
    validate::require("Name", &form.name)?;
    validate::require("Country", &form.country_name)?;
    if !form.email.trim().is_empty() {
        validate::validate_email(form.email.trim())?;
    }
    Ok(NewCountryFocal {
        department_code: department_code.to_string(),
        name: form.name.trim().to_string(),
        country_name: form.country_name.trim().to_string(),
        role: match form.role.trim() {
            "" => None,
            role => Some(role.to_string()),
        },
        email: match form.email.trim() {
            "" => None,
            email => Some(email.to_string()),
        },
    })
}

pub fn create_focal(
    db: &DashboardDb,
    hub: &RefreshHub,
    department_code: &str,
    form: &CountryFocalForm,
) -> Result<i64, AppError> {
    let focal = validated(department_code, form)?;
    let id = db.insert_country_focal(&focal)?;
    hub.publish(&[Table::CountryFocals]);
    Ok(id)
}

pub fn update_focal(
    db: &DashboardDb,
    hub: &RefreshHub,
    department_code: &str,
    id: i64,
    form: &CountryFocalForm,
) -> Result<usize, AppError> {
    let focal = validated(department_code, form)?;
    let affected = db.update_country_focal(id, &focal)?;
    hub.publish(&[Table::CountryFocals]);
    Ok(affected)
}

pub fn delete_focal(db: &DashboardDb, hub: &RefreshHub, id: i64) -> Result<usize, AppError> {
    let removed = db.delete_country_focal(id)?;
    hub.publish(&[Table::CountryFocals]);
    Ok(removed)
}

/// One department's focal points, optionally narrowed to one country.
pub fn list_focals(
    db: &DashboardDb,
    department_code: &str,
    country: Option<&str>,
) -> Result<Vec<DbCountryFocal>, AppError> {
    Ok(db.list_country_focals(department_code, country)?)
}

/// Country choices for the focal-point filter.
pub fn country_filter_options(
    db: &DashboardDb,
    department_code: &str,
) -> Result<Vec<String>, AppError> {
    Ok(db.focal_countries(department_code)?)
}
