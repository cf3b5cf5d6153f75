//! Country focal-point contacts per department.

use rusqlite::params;

use crate::db::store::{self, Filter, Table, Value};
use crate::db::types::{DbCountryFocal, DbError};
use crate::db::DashboardDb;

/// Caller-supplied focal-point fields; the id is always store-assigned.
#[derive(Debug, Clone)]
pub struct NewCountryFocal {
    pub department_code: String,
    pub name: String,
    pub country_name: String,
    pub role: Option<String>,
    pub email: Option<String>,
}

impl NewCountryFocal {
    fn editable_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::from(self.name.clone())),
            ("country_name", Value::from(self.country_name.clone())),
            ("role", Value::from(self.role.clone())),
            ("email", Value::from(self.email.clone())),
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
    pub fn insert_country_focal(&self, focal: &NewCountryFocal) -> Result<i64, DbError> {
        store::insert(self.conn_ref(), Table::CountryFocals, &focal.to_row())
    }

    pub fn update_country_focal(&self, id: i64, focal: &NewCountryFocal) -> Result<usize, DbError> {
        store::update(
            self.conn_ref(),
            Table::CountryFocals,
            &focal.editable_columns(),
            &[Filter::id(id)],
        )
    }

    pub fn delete_country_focal(&self, id: i64) -> Result<usize, DbError> {
        store::delete(self.conn_ref(), Table::CountryFocals, &[Filter::id(id)])
    }

    /// One department's focal points, optionally narrowed to one country.
    pub fn list_country_focals(
        &self,
        department_code: &str,
        country: Option<&str>,
    ) -> Result<Vec<DbCountryFocal>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, department_code, name, country_name, role, email
             FROM country_focals
             WHERE department_code = ?1
               AND (?2 IS NULL OR country_name = ?2)
             ORDER BY country_name, name",
        )?;
        let rows = stmt.query_map(params![department_code, country], map_country_focal)?;

        let mut focals = Vec::new();
        for row in rows {
            focals.push(row?);
        }
        Ok(focals)
    }

    /// Distinct countries with a focal point in one department.
    pub fn focal_countries(&self, department_code: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT DISTINCT country_name
             FROM country_focals
             WHERE department_code = ?1
             ORDER BY country_name",
        )?;
        let rows = stmt.query_map(params![department_code], |row| row.get(0))?;

        let mut countries = Vec::new();
        for row in rows {
            countries.push(row?);
        }
        Ok(countries)
    }
}

fn map_country_focal(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbCountryFocal> {
    Ok(DbCountryFocal {
        id: row.get(0)?,
        department_code: row.get(1)?,
        name: row.get(2)?,
        country_name: row.get(3)?,
        role: row.get(4)?,
        email: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focal(dept: &str, name: &str, country: &str) -> NewCountryFocal {
        NewCountryFocal {
            department_code: dept.to_string(),
            name: name.to_string(),
            country_name: country.to_string(),
            role: Some("Ministry focal".to_string()),
            email: None,
        }
    }

    #[test]
    fn test_country_filter() {
        let db = DashboardDb::open_in_memory();
        db.insert_country_focal(&focal("FIN", "A. Mwangi", "Kenya"))
            .expect("insert");
        db.insert_country_focal(&focal("FIN", "B. Okello", "Uganda"))
            .expect("insert");

        let all = db.list_country_focals("FIN", None).expect("list");
        assert_eq!(all.len(), 2);

        let kenyan = db
            .list_country_focals("FIN", Some("Kenya"))
            .expect("list");
        assert_eq!(kenyan.len(), 1);
        assert_eq!(kenyan[0].name, "A. Mwangi");

        assert_eq!(
            db.focal_countries("FIN").expect("countries"),
            vec!["Kenya".to_string(), "Uganda".to_string()]
        );
    }

    #[test]
    fn test_update_and_delete() {
        let db = DashboardDb::open_in_memory();
        let id = db
            .insert_country_focal(&focal("FIN", "A. Mwangi", "Kenya"))
            .expect("insert");

        let mut edited = focal("FIN", "A. Mwangi", "Kenya");
        edited.email = Some("a.mwangi@gov.ke".to_string());
        db.update_country_focal(id, &edited).expect("update");

        let listed = db.list_country_focals("FIN", None).expect("list");
        assert_eq!(listed[0].email.as_deref(), Some("a.mwangi@gov.ke"));

        db.delete_country_focal(id).expect("delete");
        assert!(db.list_country_focals("FIN", None).expect("list").is_empty());
    }
}
