//! Proposal / concept-note panel: pipeline CRUD and the submission
//! aggregations behind the timeline and result pie charts.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::db::calendar::DATE_FORMAT;
use crate::db::proposals::NewProposal;
use crate::db::store::Table;
use crate::db::{DashboardDb, DbProposal, ProposalResult};
use crate::error::AppError;
use crate::refresh::RefreshHub;
use crate::validate;

/// Submission kinds offered by the form.
pub const KINDS: [&str; 2] = ["proposal", "concept note"];

/// Fields collected by the add/edit proposal modal.
#[derive(Debug, Clone)]
pub struct ProposalForm {
    pub kind: String,
    pub country_name: String,
    pub donor: String,
    pub date_submission: NaiveDate,
    pub result: ProposalResult,
    pub sal_support: Vec<String>,
    pub country_focal: String,
    pub description: String,
}

fn validated(department_code: &str, form: &ProposalForm) -> Result<NewProposal, AppError> {
    if !KINDS.contains(&form.kind.as_str()) {
        return Err(AppError::Validation(format!(
            "Type must be one of: {}.",
            KINDS.join(", ")
        )));
    }
    validate::require("Country", &form.country_name)?;

    let sal_support = validate::join_list(&form.sal_support);
    Ok(NewProposal {
        department_code: department_code.to_string(),
        kind: form.kind.clone(),
        country_name: form.country_name.trim().to_string(),
        donor: match form.donor.trim() {
            "" => None,
            donor => Some(donor.to_string()),
        },
        date_submission: form.date_submission,
        result: form.result,
        sal_support: if sal_support.is_empty() {
            None
        } else {
            Some(sal_support)
        },
        country_focal: match form.country_focal.trim() {
            "" => None,
            focal => Some(focal.to_string()),
        },
        description: match form.description.trim() {
            "" => None,
            description => Some(description.to_string()),
        },
    })
}

pub fn create_proposal(
    db: &DashboardDb,
    hub: &RefreshHub,
    department_code: &str,
    form: &ProposalForm,
) -> Result<i64, AppError> {
    let proposal = validated(department_code, form)?;
    let id = db.insert_proposal(&proposal)?;
    hub.publish(&[Table::Proposals]);
    Ok(id)
}

pub fn update_proposal(
    db: &DashboardDb,
    hub: &RefreshHub,
    department_code: &str,
    id: i64,
    form: &ProposalForm,
) -> Result<usize, AppError> {
    let proposal = validated(department_code, form)?;
    let affected = db.update_proposal(id, &proposal)?;
    hub.publish(&[Table::Proposals]);
    Ok(affected)
}

pub fn delete_proposal(db: &DashboardDb, hub: &RefreshHub, id: i64) -> Result<usize, AppError> {
    let removed = db.delete_proposal(id)?;
    hub.publish(&[Table::Proposals]);
    Ok(removed)
}

pub fn list_proposals(
    db: &DashboardDb,
    department_code: &str,
) -> Result<Vec<DbProposal>, AppError> {
    Ok(db.list_proposals(department_code)?)
}

/// Year choices for the insights filter.
pub fn year_options(db: &DashboardDb, department_code: &str) -> Result<Vec<i32>, AppError> {
    Ok(db.proposal_years(department_code)?)
}

/// Country choices for the insights filter, limited to the selected year.
pub fn country_filter_options(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
) -> Result<Vec<String>, AppError> {
    Ok(db.proposal_countries(department_code, year)?)
}

fn load_filtered(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
    country: Option<&str>,
) -> Result<Vec<DbProposal>, AppError> {
    let proposals = db.list_proposals(department_code)?;
    Ok(proposals
        .into_iter()
        .filter(|proposal| {
            let Ok(date) = NaiveDate::parse_from_str(&proposal.date_submission, DATE_FORMAT)
            else {
                log::warn!(
                    "Skipping proposal {} with unparseable submission date",
                    proposal.id
                );
                return false;
            };
            date.year() == year && country.is_none_or(|c| proposal.country_name == c)
        })
        .collect())
}

/// One bar segment of the monthly submissions chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyResultCount {
    /// 1-based calendar month.
    pub month: u32,
    pub result: ProposalResult,
    pub total: u32,
}

/// Submission counts per (month, result) for one year and optional country.
pub fn monthly_result_counts(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
    country: Option<&str>,
) -> Result<Vec<MonthlyResultCount>, AppError> {
    let proposals = load_filtered(db, department_code, year, country)?;

    let mut totals: HashMap<(u32, &'static str), (ProposalResult, u32)> = HashMap::new();
    for proposal in &proposals {
        if let Ok(date) = NaiveDate::parse_from_str(&proposal.date_submission, DATE_FORMAT) {
            let slot = totals
                .entry((date.month(), proposal.result.as_str()))
                .or_insert((proposal.result, 0));
            slot.1 += 1;
        }
    }

    let mut counts: Vec<MonthlyResultCount> = totals
        .into_iter()
        .map(|((month, _), (result, total))| MonthlyResultCount {
            month,
            result,
            total,
        })
        .collect();
    counts.sort_by_key(|c| (c.month, c.result.as_str()));
    Ok(counts)
}

/// One slice of the result pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCount {
    pub result: ProposalResult,
    pub total: u32,
}

/// Win/lost/pending totals for one year and optional country.
pub fn result_totals(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
    country: Option<&str>,
) -> Result<Vec<ResultCount>, AppError> {
    let proposals = load_filtered(db, department_code, year, country)?;

    let mut totals: HashMap<&'static str, (ProposalResult, u32)> = HashMap::new();
    for proposal in &proposals {
        let slot = totals
            .entry(proposal.result.as_str())
            .or_insert((proposal.result, 0));
        slot.1 += 1;
    }

    let mut counts: Vec<ResultCount> = totals
        .into_values()
        .map(|(result, total)| ResultCount { result, total })
        .collect();
    counts.sort_by_key(|c| c.result.as_str());
    Ok(counts)
}
