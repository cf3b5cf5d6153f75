//! Calendar rows: advisor availability and engagements per department.
//! Dates are stored as `%Y-%m-%d` TEXT.

use chrono::NaiveDate;
use rusqlite::params;

use crate::db::store::{self, Filter, Table, Value};
use crate::db::types::{DbCalendarEntry, DbError};
use crate::db::DashboardDb;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Caller-supplied calendar fields; the id is always store-assigned.
#[derive(Debug, Clone)]
pub struct NewCalendarEntry {
    pub department_code: String,
    pub advisor_short_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub event_name: String,
    pub notes: Option<String>,
}

impl NewCalendarEntry {
    fn editable_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            (
                "advisor_short_name",
                Value::from(self.advisor_short_name.clone()),
            ),
            (
                "start_date",
                Value::from(self.start_date.format(DATE_FORMAT).to_string()),
            ),
            (
                "end_date",
                Value::from(self.end_date.format(DATE_FORMAT).to_string()),
            ),
            ("event_name", Value::from(self.event_name.clone())),
            ("notes", Value::from(self.notes.clone())),
        ]
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        let mut row = vec![(
            "department_code",
            Value::from(self.department_code.clone()),
        )];
        row.extend(self.editable_columns());
        row
    }
}

impl DashboardDb {
    pub fn insert_calendar_entry(&self, entry: &NewCalendarEntry) -> Result<i64, DbError> {
        store::insert(self.conn_ref(), Table::Calendar, &entry.to_row())
    }

    /// The edit form never moves an entry between departments, so the
    /// department column is left untouched.
    pub fn update_calendar_entry(
        &self,
        id: i64,
        entry: &NewCalendarEntry,
    ) -> Result<usize, DbError> {
        store::update(
            self.conn_ref(),
            Table::Calendar,
            &entry.editable_columns(),
            &[Filter::id(id)],
        )
    }

    pub fn delete_calendar_entry(&self, id: i64) -> Result<usize, DbError> {
        store::delete(self.conn_ref(), Table::Calendar, &[Filter::id(id)])
    }

    /// One department's calendar, newest entries first.
    pub fn list_calendar(&self, department_code: &str) -> Result<Vec<DbCalendarEntry>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, department_code, advisor_short_name, start_date, end_date,
                    event_name, notes
             FROM calendar
             WHERE department_code = ?1
             ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![department_code], map_calendar_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Distinct start-date years present in one department's calendar.
    pub fn calendar_years(&self, department_code: &str) -> Result<Vec<i32>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT DISTINCT CAST(strftime('%Y', start_date) AS INTEGER) AS year
             FROM calendar
             WHERE department_code = ?1
             ORDER BY year",
        )?;
        let rows = stmt.query_map(params![department_code], |row| row.get(0))?;

        let mut years = Vec::new();
        for row in rows {
            years.push(row?);
        }
        Ok(years)
    }

    /// Distinct advisor short names appearing in one department's calendar.
    pub fn calendar_advisors(&self, department_code: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT DISTINCT advisor_short_name
             FROM calendar
             WHERE department_code = ?1
             ORDER BY advisor_short_name",
        )?;
        let rows = stmt.query_map(params![department_code], |row| row.get(0))?;

        let mut advisors = Vec::new();
        for row in rows {
            advisors.push(row?);
        }
        Ok(advisors)
    }
}

fn map_calendar_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbCalendarEntry> {
    Ok(DbCalendarEntry {
        id: row.get(0)?,
        department_code: row.get(1)?,
        advisor_short_name: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        event_name: row.get(5)?,
        notes: row.get(6)?,
    })
}
