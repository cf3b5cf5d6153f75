//! Timesheet rows: country technical-support sessions per department.
//!
//! `country_name` and `sal_attendees` hold comma-joined lists; the services
//! layer explodes them when aggregating.

use chrono::NaiveDate;
use rusqlite::params;

use crate::db::calendar::DATE_FORMAT;
use crate::db::store::{self, Filter, Table, Value};
use crate::db::types::{DbError, DbTimesheetEntry};
use crate::db::DashboardDb;

/// Caller-supplied timesheet fields; the id is always store-assigned.
#[derive(Debug, Clone)]
pub struct NewTimesheetEntry {
    pub department_code: String,
    pub date: NaiveDate,
    /// Comma-joined country names.
    pub country_name: String,
    /// Comma-joined advisor short names.
    pub sal_attendees: String,
    pub country_attendees: String,
    pub support_name: String,
    pub description: Option<String>,
    pub hours: f64,
}

impl NewTimesheetEntry {
    fn editable_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            (
                "date",
                Value::from(self.date.format(DATE_FORMAT).to_string()),
            ),
            ("country_name", Value::from(self.country_name.clone())),
            ("sal_attendees", Value::from(self.sal_attendees.clone())),
            (
                "country_attendees",
                Value::from(self.country_attendees.clone()),
            ),
            ("support_name", Value::from(self.support_name.clone())),
            ("description", Value::from(self.description.clone())),
            ("hours", Value::from(self.hours)),
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
    pub fn insert_timesheet_entry(&self, entry: &NewTimesheetEntry) -> Result<i64, DbError> {
        store::insert(self.conn_ref(), Table::Timesheet, &entry.to_row())
    }

    pub fn update_timesheet_entry(
        &self,
        id: i64,
        entry: &NewTimesheetEntry,
    ) -> Result<usize, DbError> {
        store::update(
            self.conn_ref(),
            Table::Timesheet,
            &entry.editable_columns(),
            &[Filter::id(id)],
        )
    }

    pub fn delete_timesheet_entry(&self, id: i64) -> Result<usize, DbError> {
        store::delete(self.conn_ref(), Table::Timesheet, &[Filter::id(id)])
    }

    /// One department's timesheet, newest entries first.
    pub fn list_timesheet(&self, department_code: &str) -> Result<Vec<DbTimesheetEntry>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, department_code, date, country_name, sal_attendees,
                    country_attendees, support_name, description, hours
             FROM timesheet
             WHERE department_code = ?1
             ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![department_code], map_timesheet_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Distinct years present in one department's timesheet.
    pub fn timesheet_years(&self, department_code: &str) -> Result<Vec<i32>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT DISTINCT CAST(strftime('%Y', date) AS INTEGER) AS year
             FROM timesheet
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
}

fn map_timesheet_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbTimesheetEntry> {
    Ok(DbTimesheetEntry {
        id: row.get(0)?,
        department_code: row.get(1)?,
        date: row.get(2)?,
        country_name: row.get(3)?,
        sal_attendees: row.get(4)?,
        country_attendees: row.get(5)?,
        support_name: row.get(6)?,
        description: row.get(7)?,
        hours: row.get(8)?,
    })
}
