//! Advisor rows. Advisors belong to a department and are referenced from
//! calendar and timesheet rows by `short_name`, not by id — renaming a
//! short name silently orphans historical rows, exactly as the dashboard
//! has always behaved.

use std::collections::HashMap;

use rusqlite::params;

use crate::db::store::{self, Filter, Table, Value};
use crate::db::types::{DbAdvisor, DbError};
use crate::db::DashboardDb;

/// Caller-supplied advisor fields; the id is always store-assigned.
#[derive(Debug, Clone)]
pub struct NewAdvisor {
    pub department_code: String,
    pub name: String,
    pub short_name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub active: bool,
    pub country_codes: Option<String>,
    pub colour: Option<String>,
}

impl NewAdvisor {
    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("department_code", Value::from(self.department_code.clone())),
            ("name", Value::from(self.name.clone())),
            ("short_name", Value::from(self.short_name.clone())),
            ("role", Value::from(self.role.clone())),
            ("email", Value::from(self.email.clone())),
            ("active", Value::from(self.active)),
            ("country_codes", Value::from(self.country_codes.clone())),
            ("colour", Value::from(self.colour.clone())),
        ]
    }
}

impl DashboardDb {
    pub fn insert_advisor(&self, advisor: &NewAdvisor) -> Result<i64, DbError> {
        store::insert(self.conn_ref(), Table::Advisors, &advisor.to_row())
    }

    pub fn update_advisor(&self, id: i64, advisor: &NewAdvisor) -> Result<usize, DbError> {
        store::update(
            self.conn_ref(),
            Table::Advisors,
            &advisor.to_row(),
            &[Filter::id(id)],
        )
    }

    pub fn delete_advisors(&self, ids: &[i64]) -> Result<usize, DbError> {
        store::delete(self.conn_ref(), Table::Advisors, &[Filter::id_in(ids)])
    }

    pub fn get_advisor(&self, id: i64) -> Result<Option<DbAdvisor>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, department_code, name, short_name, role, email, active,
                    country_codes, colour
             FROM advisors
             WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], map_advisor)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// All advisors across departments, for the admin table.
    pub fn list_advisors(&self) -> Result<Vec<DbAdvisor>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, department_code, name, short_name, role, email, active,
                    country_codes, colour
             FROM advisors
             ORDER BY department_code",
        )?;
        let rows = stmt.query_map([], map_advisor)?;

        let mut advisors = Vec::new();
        for row in rows {
            advisors.push(row?);
        }
        Ok(advisors)
    }

    /// Advisors of one department, optionally only the active ones
    /// (form selection lists exclude inactive advisors).
    pub fn list_department_advisors(
        &self,
        department_code: &str,
        active_only: bool,
    ) -> Result<Vec<DbAdvisor>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, department_code, name, short_name, role, email, active,
                    country_codes, colour
             FROM advisors
             WHERE department_code = ?1
               AND (?2 = 0 OR active = 1)
             ORDER BY short_name",
        )?;
        let rows = stmt.query_map(params![department_code, active_only], map_advisor)?;

        let mut advisors = Vec::new();
        for row in rows {
            advisors.push(row?);
        }
        Ok(advisors)
    }

    /// short_name → chart colour for one department's legends.
    pub fn advisor_colour_map(
        &self,
        department_code: &str,
    ) -> Result<HashMap<String, String>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT short_name, colour FROM advisors WHERE department_code = ?1",
        )?;
        let rows = stmt.query_map(params![department_code], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (short_name, colour) = row?;
            if let Some(colour) = colour {
                map.insert(short_name, colour);
            }
        }
        Ok(map)
    }
}

fn map_advisor(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbAdvisor> {
    Ok(DbAdvisor {
        id: row.get(0)?,
        department_code: row.get(1)?,
        name: row.get(2)?,
        short_name: row.get(3)?,
        role: row.get(4)?,
        email: row.get(5)?,
        active: row.get(6)?,
        country_codes: row.get(7)?,
        colour: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn advisor(dept: &str, short_name: &str) -> NewAdvisor {
        NewAdvisor {
            department_code: dept.to_string(),
            name: format!("Advisor {short_name}"),
            short_name: short_name.to_string(),
            role: Some("TA".to_string()),
            email: Some(format!("{}@example.org", short_name.to_lowercase())),
            active: true,
            country_codes: Some("KEN, UGA".to_string()),
            colour: Some("#112233".to_string()),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let db = DashboardDb::open_in_memory();
        let id = db.insert_advisor(&advisor("FIN", "JD")).expect("insert");

        let stored = db.get_advisor(id).expect("get").expect("present");
        assert_eq!(stored.short_name, "JD");
        assert!(stored.active);
        assert_eq!(stored.country_codes.as_deref(), Some("KEN, UGA"));
    }

    #[test]
    fn test_department_scoped_listing_filters_inactive() {
        let db = DashboardDb::open_in_memory();
        db.insert_advisor(&advisor("FIN", "JD")).expect("insert");
        let mut inactive = advisor("FIN", "XY");
        inactive.active = false;
        db.insert_advisor(&inactive).expect("insert");
        db.insert_advisor(&advisor("WAT", "AB")).expect("insert");

        let all_fin = db.list_department_advisors("FIN", false).expect("list");
        assert_eq!(all_fin.len(), 2);

        let active_fin = db.list_department_advisors("FIN", true).expect("list");
        assert_eq!(active_fin.len(), 1);
        assert_eq!(active_fin[0].short_name, "JD");
    }

    #[test]
    fn test_colour_map_skips_missing_colours() {
        let db = DashboardDb::open_in_memory();
        db.insert_advisor(&advisor("FIN", "JD")).expect("insert");
        let mut uncoloured = advisor("FIN", "XY");
        uncoloured.colour = None;
        db.insert_advisor(&uncoloured).expect("insert");

        let map = db.advisor_colour_map("FIN").expect("map");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("JD").map(String::as_str), Some("#112233"));
    }
}
