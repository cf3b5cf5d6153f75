//! Admin area: whole-store workbook export and import.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::db::DashboardDb;
use crate::excel::{self, ExcelError, ImportSummary};
use crate::refresh::RefreshHub;

/// Export the whole store into `dir`, returning the download path
/// (`sal_ta_dashboard_export_<ISO-timestamp>.xlsx`).
pub fn export_workbook(
    db: &DashboardDb,
    dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, ExcelError> {
    let path = dir.join(excel::export_filename(now));
    excel::export_to_workbook(db, &path)?;
    log::info!("Database exported to {}", path.display());
    Ok(path)
}

/// Import a workbook, replacing every matching table, then notify the
/// views of exactly the tables that changed.
pub fn import_workbook(
    db: &DashboardDb,
    hub: &RefreshHub,
    path: &Path,
) -> Result<ImportSummary, ExcelError> {
    let summary = excel::import_workbook(db, path)?;
    if !summary.tables_replaced.is_empty() {
        hub.publish(&summary.tables_replaced);
    }
    log::info!(
        "Imported {} rows into {} tables from {}",
        summary.rows_loaded,
        summary.tables_replaced.len(),
        path.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::db::store::Table;

    #[test]
    fn test_export_then_import_notifies_replaced_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = DashboardDb::open_in_memory();
        db.conn_ref()
            .execute(
                "INSERT INTO departments (name, code) VALUES ('Finance', 'FIN')",
                [],
            )
            .expect("seed");

        let now = Local.with_ymd_and_hms(2026, 8, 6, 9, 15, 0).unwrap();
        let path = export_workbook(&db, dir.path(), now).expect("export");
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name")
            .starts_with("sal_ta_dashboard_export_"));

        let hub = RefreshHub::new();
        let departments_view = hub.subscribe(&[Table::Departments]);

        let summary = import_workbook(&db, &hub, &path).expect("import");
        assert_eq!(summary.tables_replaced.len(), Table::ALL.len());
        assert!(hub.is_stale(&departments_view));
    }
}
