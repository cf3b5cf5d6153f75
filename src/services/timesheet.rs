//! Country support panel: timesheet CRUD and the hour aggregations behind
//! the overview, timeline, pie and per-advisor charts.
//!
//! `country_name` and `sal_attendees` are comma-joined lists. Exploding
//! happens here, at query time: an entry logged against two countries
//! contributes its full hours to each of them, as the dashboard has always
//! reported.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::db::calendar::DATE_FORMAT;
use crate::db::store::Table;
use crate::db::timesheet::NewTimesheetEntry;
use crate::db::{DashboardDb, DbTimesheetEntry};
use crate::error::AppError;
use crate::refresh::RefreshHub;
use crate::validate;

/// Form bounds of the hours input.
const MIN_HOURS: f64 = 0.5;
const MAX_HOURS: f64 = 8.0;

/// Fields collected by the add/edit timesheet modal.
#[derive(Debug, Clone)]
pub struct TimesheetForm {
    pub date: NaiveDate,
    pub country_names: Vec<String>,
    pub sal_attendees: Vec<String>,
    pub country_attendees: String,
    pub support_name: String,
    pub description: String,
    pub hours: f64,
}

fn validated(department_code: &str, form: &TimesheetForm) -> Result<NewTimesheetEntry, AppError> {
    let country_name = validate::join_list(&form.country_names);
    validate::require("Country", &country_name)?;
    let sal_attendees = validate::join_list(&form.sal_attendees);
    validate::require("Advisor", &sal_attendees)?;
    validate::require("Country Attendee(s)", &form.country_attendees)?;
    validate::require("Type of Support", &form.support_name)?;
    if !(MIN_HOURS..=MAX_HOURS).contains(&form.hours) {
        return Err(AppError::Validation(format!(
            "Hours must be between {MIN_HOURS} and {MAX_HOURS}."
        )));
    }

    Ok(NewTimesheetEntry {
        department_code: department_code.to_string(),
        date: form.date,
        country_name,
        sal_attendees,
        country_attendees: form.country_attendees.trim().to_string(),
        support_name: form.support_name.trim().to_string(),
        description: match form.description.trim() {
            "" => None,
            description => Some(description.to_string()),
        },
        hours: form.hours,
    })
}

pub fn create_entry(
    db: &DashboardDb,
    hub: &RefreshHub,
    department_code: &str,
    form: &TimesheetForm,
) -> Result<i64, AppError> {
    let entry = validated(department_code, form)?;
    let id = db.insert_timesheet_entry(&entry)?;
    hub.publish(&[Table::Timesheet]);
    Ok(id)
}

pub fn update_entry(
    db: &DashboardDb,
    hub: &RefreshHub,
    department_code: &str,
    id: i64,
    form: &TimesheetForm,
) -> Result<usize, AppError> {
    let entry = validated(department_code, form)?;
    let affected = db.update_timesheet_entry(id, &entry)?;
    hub.publish(&[Table::Timesheet]);
    Ok(affected)
}

pub fn delete_entry(db: &DashboardDb, hub: &RefreshHub, id: i64) -> Result<usize, AppError> {
    let removed = db.delete_timesheet_entry(id)?;
    hub.publish(&[Table::Timesheet]);
    Ok(removed)
}

pub fn list_entries(
    db: &DashboardDb,
    department_code: &str,
) -> Result<Vec<DbTimesheetEntry>, AppError> {
    Ok(db.list_timesheet(department_code)?)
}

/// Year choices for the overview and insights filters.
pub fn year_options(db: &DashboardDb, department_code: &str) -> Result<Vec<i32>, AppError> {
    Ok(db.timesheet_years(department_code)?)
}

/// Country choices for the insights filter: every country appearing in the
/// department's exploded timesheet.
pub fn country_filter_options(
    db: &DashboardDb,
    department_code: &str,
) -> Result<Vec<String>, AppError> {
    let entries = db.list_timesheet(department_code)?;
    let mut countries: Vec<String> = entries
        .iter()
        .flat_map(|entry| validate::split_list(&entry.country_name))
        .collect();
    countries.sort();
    countries.dedup();
    Ok(countries)
}

/// Entries of one year, optionally narrowed to entries mentioning a country.
fn load_filtered(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
    country: Option<&str>,
) -> Result<Vec<DbTimesheetEntry>, AppError> {
    let entries = db.list_timesheet(department_code)?;
    Ok(entries
        .into_iter()
        .filter(|entry| {
            let Ok(date) = NaiveDate::parse_from_str(&entry.date, DATE_FORMAT) else {
                log::warn!("Skipping timesheet entry {} with unparseable date", entry.id);
                return false;
            };
            if date.year() != year {
                return false;
            }
            match country {
                Some(country) => validate::split_list(&entry.country_name)
                    .iter()
                    .any(|c| c == country),
                None => true,
            }
        })
        .collect())
}

fn sorted<K: Ord, V, F: Fn((K, f64)) -> V>(totals: HashMap<K, f64>, build: F) -> Vec<V> {
    let mut pairs: Vec<(K, f64)> = totals.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs.into_iter().map(build).collect()
}

/// One bar of the "hours by country" overview chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountrySupportHours {
    pub country_name: String,
    pub support_name: String,
    pub total_hours: f64,
}

/// Total hours per (country, support kind) for one year, countries exploded.
pub fn hours_by_country(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
) -> Result<Vec<CountrySupportHours>, AppError> {
    let entries = load_filtered(db, department_code, year, None)?;

    let mut totals: HashMap<(String, String), f64> = HashMap::new();
    for entry in &entries {
        for country in validate::split_list(&entry.country_name) {
            *totals
                .entry((country, entry.support_name.clone()))
                .or_insert(0.0) += entry.hours;
        }
    }
    Ok(sorted(totals, |((country_name, support_name), total_hours)| {
        CountrySupportHours {
            country_name,
            support_name,
            total_hours,
        }
    }))
}

/// One bar of the monthly timeline chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyHours {
    /// 1-based calendar month.
    pub month: u32,
    pub total_hours: f64,
}

/// Total hours per month for one year and optional country.
pub fn monthly_hours(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
    country: Option<&str>,
) -> Result<Vec<MonthlyHours>, AppError> {
    let entries = load_filtered(db, department_code, year, country)?;

    let mut totals: HashMap<u32, f64> = HashMap::new();
    for entry in &entries {
        if let Ok(date) = NaiveDate::parse_from_str(&entry.date, DATE_FORMAT) {
            *totals.entry(date.month()).or_insert(0.0) += entry.hours;
        }
    }
    Ok(sorted(totals, |(month, total_hours)| MonthlyHours {
        month,
        total_hours,
    }))
}

/// One slice of the "support by type" pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportHours {
    pub support_name: String,
    pub total_hours: f64,
}

/// Total hours per support kind for one year and optional country,
/// largest first.
pub fn hours_by_support(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
    country: Option<&str>,
) -> Result<Vec<SupportHours>, AppError> {
    let entries = load_filtered(db, department_code, year, country)?;

    let mut totals: HashMap<String, f64> = HashMap::new();
    for entry in &entries {
        *totals.entry(entry.support_name.clone()).or_insert(0.0) += entry.hours;
    }

    let mut support: Vec<SupportHours> = totals
        .into_iter()
        .map(|(support_name, total_hours)| SupportHours {
            support_name,
            total_hours,
        })
        .collect();
    support.sort_by(|a, b| {
        b.total_hours
            .partial_cmp(&a.total_hours)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.support_name.cmp(&b.support_name))
    });
    Ok(support)
}

/// One bar of the "support by advisor" chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorHours {
    pub advisor_short_name: String,
    pub total_hours: f64,
}

/// Total hours per advisor for one year and optional country, attendees
/// exploded: a two-advisor session credits its full hours to both.
pub fn hours_by_advisor(
    db: &DashboardDb,
    department_code: &str,
    year: i32,
    country: Option<&str>,
) -> Result<Vec<AdvisorHours>, AppError> {
    let entries = load_filtered(db, department_code, year, country)?;

    let mut totals: HashMap<String, f64> = HashMap::new();
    for entry in &entries {
        for advisor in validate::split_list(&entry.sal_attendees) {
            *totals.entry(advisor).or_insert(0.0) += entry.hours;
        }
    }
    Ok(sorted(totals, |(advisor_short_name, total_hours)| {
        AdvisorHours {
            advisor_short_name,
            total_hours,
        }
    }))
}
