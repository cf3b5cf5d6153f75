//! Department administration (admin area).

use crate::db::departments::NewDepartment;
use crate::db::store::Table;
use crate::db::{DashboardDb, DbDepartment};
use crate::error::AppError;
use crate::refresh::RefreshHub;

/// Fields collected by the add/edit department modal.
#[derive(Debug, Clone)]
pub struct DepartmentForm {
    pub name: String,
    pub code: String,
    pub icon: String,
}

fn validated(form: &DepartmentForm) -> Result<NewDepartment, AppError> {
    if form.name.trim().is_empty() || form.code.trim().is_empty() {
        return Err(AppError::Validation(
            "Name and Code are required fields.".to_string(),
        ));
    }
    Ok(NewDepartment {
        name: form.name.trim().to_string(),
        code: form.code.trim().to_string(),
        icon: match form.icon.trim() {
            "" => None,
            icon => Some(icon.to_string()),
        },
    })
}

pub fn create_department(
    db: &DashboardDb,
    hub: &RefreshHub,
    form: &DepartmentForm,
) -> Result<i64, AppError> {
    let dept = validated(form)?;
    let id = db.insert_department(&dept)?;
    hub.publish(&[Table::Departments]);
    Ok(id)
}

pub fn update_department(
    db: &DashboardDb,
    hub: &RefreshHub,
    id: i64,
    form: &DepartmentForm,
) -> Result<usize, AppError> {
    let dept = validated(form)?;
    let affected = db.update_department(id, &dept)?;
    hub.publish(&[Table::Departments]);
    Ok(affected)
}

/// Bulk delete from the admin table. Deleting a department does not cascade:
/// its calendar/timesheet/proposal rows keep their now-orphaned code.
pub fn delete_departments(
    db: &DashboardDb,
    hub: &RefreshHub,
    ids: &[i64],
) -> Result<usize, AppError> {
    let ids = super::require_selection(ids, "delete")?;
    let removed = db.delete_departments(ids)?;
    hub.publish(&[Table::Departments]);
    Ok(removed)
}

pub fn list_departments(db: &DashboardDb) -> Result<Vec<DbDepartment>, AppError> {
    Ok(db.list_departments()?)
}

/// `(code, icon)` pairs driving the per-department navbar.
pub fn department_nav(db: &DashboardDb) -> Result<Vec<(String, Option<String>)>, AppError> {
    Ok(db.department_nav()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, code: &str) -> DepartmentForm {
        DepartmentForm {
            name: name.to_string(),
            code: code.to_string(),
            icon: "building-user".to_string(),
        }
    }

    #[test]
    fn test_create_requires_name_and_code() {
        let db = DashboardDb::open_in_memory();
        let hub = RefreshHub::new();

        let err = create_department(&db, &hub, &form("", "FIN")).expect_err("missing name");
        assert!(matches!(err, AppError::Validation(_)));
        assert!(list_departments(&db).expect("list").is_empty());

        create_department(&db, &hub, &form("Finance", "FIN")).expect("create");
        assert_eq!(list_departments(&db).expect("list").len(), 1);
    }

    #[test]
    fn test_mutations_publish_departments_refresh() {
        let db = DashboardDb::open_in_memory();
        let hub = RefreshHub::new();
        let token = hub.subscribe(&[Table::Departments]);

        let id = create_department(&db, &hub, &form("Finance", "FIN")).expect("create");
        assert!(hub.is_stale(&token));

        let token = hub.subscribe(&[Table::Departments]);
        update_department(&db, &hub, id, &form("Corporate Finance", "FIN")).expect("update");
        assert!(hub.is_stale(&token));

        let token = hub.subscribe(&[Table::Departments]);
        delete_departments(&db, &hub, &[id]).expect("delete");
        assert!(hub.is_stale(&token));
    }

    #[test]
    fn test_failed_validation_publishes_nothing() {
        let db = DashboardDb::open_in_memory();
        let hub = RefreshHub::new();
        let token = hub.subscribe(&[Table::Departments]);

        let _ = create_department(&db, &hub, &form("", ""));
        assert!(!hub.is_stale(&token));
    }

    #[test]
    fn test_delete_requires_selection() {
        let db = DashboardDb::open_in_memory();
        let hub = RefreshHub::new();
        let err = delete_departments(&db, &hub, &[]).expect_err("empty selection");
        assert!(matches!(err, AppError::Selection(_)));
    }
}
