//! Calendar panel: entry CRUD and the availability insights behind the
//! timeline and stacked-bar charts.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::db::calendar::{NewCalendarEntry, DATE_FORMAT};
use crate::db::store::Table;
use crate::db::{DashboardDb, DbCalendarEntry};
use crate::error::AppError;
use crate::refresh::RefreshHub;
use crate::validate;

/// Business days assumed in a full year when computing the "% of year"
/// column of the insights table.
const BUSINESS_DAYS_PER_YEAR: f64 = 260.0;

/// Fields collected by the add/edit calendar modal.
#[derive(Debug, Clone)]
pub struct CalendarForm {
    pub advisor_short_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub event_name: String,
    pub notes: String,
}

fn validated(department_code: &str, form: &CalendarForm) -> Result<NewCalendarEntry, AppError> {
    validate::require("Advisor", &form.advisor_short_name)?;
    validate::require("Type", &form.event_name)?;
    Ok(NewCalendarEntry {
        department_code: department_code.to_string(),
        advisor_short_name: form.advisor_short_name.trim().to_string(),
        start_date: form.start_date,
        end_date: form.end_date,
        event_name: form.event_name.trim().to_string(),
        notes: match form.notes.trim() {
            "" => None,
            notes => Some(notes.to_string()),
        },
    })
}

pub fn create_entry(
    db: &DashboardDb,
    hub: &RefreshHub,
    department_code: &str,
    form: &CalendarForm,
) -> Result<i64, AppError> {
    let entry = validated(department_code, form)?;
    let id = db.insert_calendar_entry(&entry)?;
    hub.publish(&[Table::Calendar]);
    Ok(id)
}

pub fn update_entry(
    db: &DashboardDb,
    hub: &RefreshHub,
    department_code: &str,
    id: i64,
    form: &CalendarForm,
) -> Result<usize, AppError> {
    let entry = validated(department_code, form)?;
    let affected = db.update_calendar_entry(id, &entry)?;
    hub.publish(&[Table::Calendar]);
    Ok(affected)
}

pub fn delete_entry(db: &DashboardDb, hub: &RefreshHub, id: i64) -> Result<usize, AppError> {
    let removed = db.delete_calendar_entry(id)?;
    hub.publish(&[Table::Calendar]);
    Ok(removed)
}

pub fn list_entries(
    db: &DashboardDb,
    department_code: &str,
) -> Result<Vec<DbCalendarEntry>, AppError> {
    Ok(db.list_calendar(department_code)?)
}

/// Year choices for the insights filter.
pub fn year_options(db: &DashboardDb, department_code: &str) -> Result<Vec<i32>, AppError> {
    Ok(db.calendar_years(department_code)?)
}

/// Advisor choices for the insights filter.
pub fn advisor_filter_options(
    db: &DashboardDb,
    department_code: &str,
) -> Result<Vec<String>, AppError> {
    Ok(db.calendar_advisors(department_code)?)
}

/// One aggregated row of the insights table / stacked bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarInsight {
    pub year: i32,
    pub advisor_short_name: String,
    pub event_name: String,
    pub total_days: i64,
    /// `total_days` as a share of a 260-business-day year, rounded to one
    /// decimal.
    pub percentage_of_year: f64,
}

/// Count business days (Mon–Fri) in the half-open range `[start, end)`.
/// A single-day entry (start == end) therefore counts zero days, matching
/// how the dashboard has always summed availability.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end <= start {
        return 0;
    }
    start
        .iter_days()
        .take_while(|day| *day < end)
        .filter(|day| day.weekday().number_from_monday() <= 5)
        .count() as i64
}

/// Total business days per (year, advisor, event), optionally narrowed to
/// one start-date year and/or one advisor.
pub fn insights(
    db: &DashboardDb,
    department_code: &str,
    year: Option<i32>,
    advisor: Option<&str>,
) -> Result<Vec<CalendarInsight>, AppError> {
    let entries = db.list_calendar(department_code)?;

    let mut totals: HashMap<(i32, String, String), i64> = HashMap::new();
    for entry in &entries {
        let (Ok(start), Ok(end)) = (
            NaiveDate::parse_from_str(&entry.start_date, DATE_FORMAT),
            NaiveDate::parse_from_str(&entry.end_date, DATE_FORMAT),
        ) else {
            log::warn!("Skipping calendar entry {} with unparseable dates", entry.id);
            continue;
        };

        if year.is_some_and(|y| start.year() != y) {
            continue;
        }
        if advisor.is_some_and(|a| entry.advisor_short_name != a) {
            continue;
        }

        let key = (
            start.year(),
            entry.advisor_short_name.clone(),
            entry.event_name.clone(),
        );
        *totals.entry(key).or_insert(0) += business_days(start, end);
    }

    let mut insights: Vec<CalendarInsight> = totals
        .into_iter()
        .map(|((year, advisor_short_name, event_name), total_days)| CalendarInsight {
            year,
            advisor_short_name,
            event_name,
            total_days,
            percentage_of_year: (total_days as f64 / BUSINESS_DAYS_PER_YEAR * 1000.0).round()
                / 10.0,
        })
        .collect();
    insights.sort_by(|a, b| {
        (a.year, &a.advisor_short_name, &a.event_name)
            .cmp(&(b.year, &b.advisor_short_name, &b.event_name))
    });
    Ok(insights)
}
