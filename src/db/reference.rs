//! Static reference tables: countries, calendar event kinds, and technical
//! support kinds. These are normally loaded once via workbook import and
//! only read afterwards; generic CRUD still applies if an admin needs to
//! touch them directly.

use std::collections::HashMap;

use crate::db::types::{DbCountry, DbError, DbEventKind, DbSupportKind};
use crate::db::DashboardDb;

impl DashboardDb {
    /// All countries, ordered by display name.
    pub fn list_countries(&self) -> Result<Vec<DbCountry>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT iso_alpha3_code, name, continent FROM countries ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DbCountry {
                iso_alpha3_code: row.get(0)?,
                name: row.get(1)?,
                continent: row.get(2)?,
            })
        })?;

        let mut countries = Vec::new();
        for row in rows {
            countries.push(row?);
        }
        Ok(countries)
    }

    /// ISO alpha-3 code → country display name.
    pub fn country_names_by_code(&self) -> Result<HashMap<String, String>, DbError> {
        let mut stmt = self
            .conn_ref()
            .prepare("SELECT iso_alpha3_code, name FROM countries")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (code, name) = row?;
            map.insert(code, name);
        }
        Ok(map)
    }

    /// All calendar event kinds.
    pub fn list_events(&self) -> Result<Vec<DbEventKind>, DbError> {
        let mut stmt = self
            .conn_ref()
            .prepare("SELECT name, description, colour FROM events ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(DbEventKind {
                name: row.get(0)?,
                description: row.get(1)?,
                colour: row.get(2)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// All technical support kinds.
    pub fn list_support(&self) -> Result<Vec<DbSupportKind>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT category, name, description, colour FROM support ORDER BY category, name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DbSupportKind {
                category: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                colour: row.get(3)?,
            })
        })?;

        let mut support = Vec::new();
        for row in rows {
            support.push(row?);
        }
        Ok(support)
    }

    /// event name → chart colour.
    pub fn event_colour_map(&self) -> Result<HashMap<String, String>, DbError> {
        colour_map(self, "SELECT name, colour FROM events")
    }

    /// support name → chart colour.
    pub fn support_colour_map(&self) -> Result<HashMap<String, String>, DbError> {
        colour_map(self, "SELECT name, colour FROM support")
    }
}

fn colour_map(db: &DashboardDb, sql: &str) -> Result<HashMap<String, String>, DbError> {
    let mut stmt = db.conn_ref().prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut map = HashMap::new();
    for row in rows {
        let (name, colour) = row?;
        if let Some(colour) = colour {
            map.insert(name, colour);
        }
    }
    Ok(map)
}
