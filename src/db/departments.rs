//! Department rows: the top-level partition of almost all dashboard data.

use rusqlite::params;

use crate::db::store::{self, Filter, Table, Value};
use crate::db::types::{DbDepartment, DbError};
use crate::db::DashboardDb;

/// Caller-supplied department fields; the id is always store-assigned.
#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub name: String,
    pub code: String,
    pub icon: Option<String>,
}

impl NewDepartment {
    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::from(self.name.clone())),
            ("code", Value::from(self.code.clone())),
            ("icon", Value::from(self.icon.clone())),
        ]
    }
}

impl DashboardDb {
    pub fn insert_department(&self, dept: &NewDepartment) -> Result<i64, DbError> {
        store::insert(self.conn_ref(), Table::Departments, &dept.to_row())
    }

    pub fn update_department(&self, id: i64, dept: &NewDepartment) -> Result<usize, DbError> {
        store::update(
            self.conn_ref(),
            Table::Departments,
            &dept.to_row(),
            &[Filter::id(id)],
        )
    }

    pub fn delete_departments(&self, ids: &[i64]) -> Result<usize, DbError> {
        store::delete(self.conn_ref(), Table::Departments, &[Filter::id_in(ids)])
    }

    pub fn get_department(&self, id: i64) -> Result<Option<DbDepartment>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, name, code, icon FROM departments WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], map_department)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// All departments, ordered by code for the admin table.
    pub fn list_departments(&self) -> Result<Vec<DbDepartment>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, name, code, icon FROM departments ORDER BY code",
        )?;
        let rows = stmt.query_map([], map_department)?;

        let mut departments = Vec::new();
        for row in rows {
            departments.push(row?);
        }
        Ok(departments)
    }

    /// `(code, icon)` pairs for the navbar, newest codes first as the
    /// original dashboard ordered them.
    pub fn department_nav(&self) -> Result<Vec<(String, Option<String>)>, DbError> {
        let mut stmt = self
            .conn_ref()
            .prepare("SELECT code, icon FROM departments ORDER BY code DESC")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut nav = Vec::new();
        for row in rows {
            nav.push(row?);
        }
        Ok(nav)
    }
}

fn map_department(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbDepartment> {
    Ok(DbDepartment {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        icon: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept(name: &str, code: &str) -> NewDepartment {
        NewDepartment {
            name: name.to_string(),
            code: code.to_string(),
            icon: Some("building-user".to_string()),
        }
    }

    #[test]
    fn test_insert_and_list_ordered_by_code() {
        let db = DashboardDb::open_in_memory();
        db.insert_department(&dept("Water", "WAT")).expect("insert");
        db.insert_department(&dept("Finance", "FIN")).expect("insert");

        let listed = db.list_departments().expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].code, "FIN");
        assert_eq!(listed[1].code, "WAT");
    }

    #[test]
    fn test_nav_orders_codes_descending() {
        let db = DashboardDb::open_in_memory();
        db.insert_department(&dept("Finance", "FIN")).expect("insert");
        db.insert_department(&dept("Water", "WAT")).expect("insert");

        let nav = db.department_nav().expect("nav");
        assert_eq!(nav[0].0, "WAT");
        assert_eq!(nav[1].0, "FIN");
    }

    #[test]
    fn test_update_and_delete() {
        let db = DashboardDb::open_in_memory();
        let id = db.insert_department(&dept("Finance", "FIN")).expect("insert");
        let other = db.insert_department(&dept("Water", "WAT")).expect("insert");

        let affected = db
            .update_department(id, &dept("Corporate Finance", "FIN"))
            .expect("update");
        assert_eq!(affected, 1);
        let updated = db.get_department(id).expect("get").expect("present");
        assert_eq!(updated.name, "Corporate Finance");

        let removed = db.delete_departments(&[id, other]).expect("delete");
        assert_eq!(removed, 2);
        assert!(db.get_department(id).expect("get").is_none());
    }
}
