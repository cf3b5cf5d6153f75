//! Workbook export/import for the admin area.
//!
//! Export writes every registry table as one worksheet (header row, then
//! data rows). Import is a wholesale replacement: each sheet whose lowered
//! name matches a registry table replaces that table's entire row set,
//! preserving exported ids. The whole import runs in one transaction, so a
//! bad sheet leaves every table untouched.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, Local};
use rusqlite::Connection;
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use crate::db::store::{self, Table, Value};
use crate::db::types::ProposalResult;
use crate::db::{DashboardDb, DbError};

/// Errors from workbook export/import.
#[derive(Debug, Error)]
pub enum ExcelError {
    #[error("Store error: {0}")]
    Db(#[from] DbError),

    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::Error),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] XlsxError),
}

/// Download name for an export taken at `now`, e.g.
/// `sal_ta_dashboard_export_2026-08-06T09_15_00.xlsx`. Colons are not
/// filesystem-safe, so the time components are underscore-separated.
pub fn export_filename(now: DateTime<Local>) -> String {
    format!(
        "sal_ta_dashboard_export_{}.xlsx",
        now.format("%Y-%m-%dT%H_%M_%S")
    )
}

/// Write every registry table as one worksheet of a new workbook at `path`.
pub fn export_to_workbook(db: &DashboardDb, path: &Path) -> Result<(), ExcelError> {
    let mut workbook = Workbook::new();

    for table in Table::ALL {
        let data = store::read(db.conn_ref(), table, &[])?;
        let sheet = workbook.add_worksheet();
        sheet.set_name(table.name())?;

        for (col, name) in data.columns.iter().enumerate() {
            sheet.write_string(0, col as u16, name.as_str())?;
        }
        for (row_idx, row) in data.rows.iter().enumerate() {
            let r = (row_idx + 1) as u32;
            for (col_idx, value) in row.iter().enumerate() {
                let c = col_idx as u16;
                match value {
                    Value::Null => {}
                    Value::Integer(n) => {
                        sheet.write_number(r, c, *n as f64)?;
                    }
                    Value::Real(f) => {
                        sheet.write_number(r, c, *f)?;
                    }
                    Value::Text(s) => {
                        sheet.write_string(r, c, s.as_str())?;
                    }
                    Value::Bool(b) => {
                        sheet.write_boolean(r, c, *b)?;
                    }
                }
            }
        }
        log::info!("Exported {} rows from {}", data.rows.len(), table.name());
    }

    workbook.save(path)?;
    Ok(())
}

/// What an import actually did.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub tables_replaced: Vec<Table>,
    pub sheets_skipped: Vec<String>,
    pub rows_loaded: usize,
}

/// One parsed worksheet, ready to load.
struct SheetData {
    table: Table,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Replace every matching table with its worksheet's rows.
///
/// Sheets with no registry counterpart are skipped with a warning; tables
/// with no sheet are left untouched. All replacements happen in a single
/// transaction, followed by an identity-sequence realignment so the next
/// insert continues above the imported ids.
pub fn import_workbook(db: &DashboardDb, path: &Path) -> Result<ImportSummary, ExcelError> {
    let mut workbook = open_workbook_auto(path)?;

    // Parse everything up front so a malformed sheet aborts before any
    // table is touched.
    let mut sheets = Vec::new();
    let mut summary = ImportSummary::default();
    for sheet_name in workbook.sheet_names().to_vec() {
        let Some(table) = Table::from_sheet_name(&sheet_name) else {
            log::warn!("Skipping worksheet {:?}: no matching table", sheet_name);
            summary.sheets_skipped.push(sheet_name);
            continue;
        };
        let range = workbook.worksheet_range(&sheet_name)?;
        sheets.push(parse_sheet(table, &range));
    }

    db.with_transaction::<_, _, ExcelError>(|db| {
        for sheet in &sheets {
            store::delete(db.conn_ref(), sheet.table, &[])?;
            if !sheet.rows.is_empty() {
                summary.rows_loaded +=
                    store::bulk_load(db.conn_ref(), sheet.table, &sheet.columns, &sheet.rows)?;
            }
            summary.tables_replaced.push(sheet.table);
            log::info!(
                "Replaced {} with {} imported rows",
                sheet.table.name(),
                sheet.rows.len()
            );
        }
        realign_sequences(db.conn_ref())?;
        Ok(())
    })?;

    Ok(summary)
}

/// Reset each identity sequence to its table's current MAX(id) so the next
/// insert continues above whatever the import brought in.
pub fn realign_sequences(conn: &Connection) -> Result<(), DbError> {
    for table in Table::ALL.into_iter().filter(|t| t.has_identity()) {
        let max_id: i64 = conn.query_row(
            &format!("SELECT COALESCE(MAX(id), 0) FROM {}", table.name()),
            [],
            |row| row.get(0),
        )?;

        let updated = conn.execute(
            "UPDATE sqlite_sequence SET seq = ?1 WHERE name = ?2",
            rusqlite::params![max_id, table.name()],
        )?;
        if updated == 0 {
            conn.execute(
                "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
                rusqlite::params![table.name(), max_id],
            )?;
        }
    }
    Ok(())
}

fn parse_sheet(table: Table, range: &calamine::Range<Data>) -> SheetData {
    let mut rows_iter = range.rows();
    let Some(header) = rows_iter.next() else {
        return SheetData {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
        };
    };

    // Keep the contiguous run of named header cells; anything to the right
    // of the first blank header is stray formatting, not data.
    let columns: Vec<String> = header
        .iter()
        .map(cell_to_header)
        .take_while(|name| !name.is_empty())
        .collect();
    let result_column = match table {
        Table::Proposals => columns.iter().position(|c| c == "result"),
        _ => None,
    };

    let mut rows = Vec::new();
    for sheet_row in rows_iter {
        let mut row: Vec<Value> = sheet_row
            .iter()
            .take(columns.len())
            .map(cell_to_value)
            .collect();
        row.resize(columns.len(), Value::Null);

        if let Some(idx) = result_column {
            row[idx] = coerce_result(std::mem::replace(&mut row[idx], Value::Null));
        }
        rows.push(row);
    }

    SheetData {
        table,
        columns,
        rows,
    }
}

fn cell_to_header(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Int(n) => Value::Integer(*n),
        // Spreadsheets store integers as floats; keep exact ones integral
        // so identity columns survive the round trip.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Value::Integer(*f as i64)
        }
        Data::Float(f) => Value::Real(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(e) => {
            log::warn!("Treating spreadsheet error cell {:?} as NULL", e);
            Value::Null
        }
        Data::DateTime(dt) => Value::Text(dt.to_string()),
        Data::DateTimeIso(s) => Value::Text(s.clone()),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

/// Pre-tri-state workbooks stored the proposal result as a nullable
/// boolean; coerce those cells to the enum's text form.
fn coerce_result(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Text(ProposalResult::from_legacy(Some(b)).as_str().to_string()),
        Value::Null => Value::Text(ProposalResult::Pending.as_str().to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seeded_db() -> DashboardDb {
        let db = DashboardDb::open_in_memory();
        db.conn_ref()
            .execute_batch(
                "INSERT INTO departments (name, code, icon) VALUES ('Finance', 'FIN', 'building-user');
                 INSERT INTO advisors (department_code, name, short_name, email, active, country_codes, colour)
                    VALUES ('FIN', 'Jane Doe', 'JD', 'jane@x.org', 1, 'KEN, UGA', '#112233');
                 INSERT INTO calendar (department_code, advisor_short_name, start_date, end_date, event_name)
                    VALUES ('FIN', 'JD', '2025-03-03', '2025-03-07', 'Mission');
                 INSERT INTO timesheet (department_code, date, country_name, sal_attendees,
                                        country_attendees, support_name, hours)
                    VALUES ('FIN', '2025-02-03', 'Kenya, Uganda', 'JD', 'Ministry team', 'Remote support', 1.5);
                 INSERT INTO proposals (department_code, type, country_name, date_submission, result)
                    VALUES ('FIN', 'proposal', 'Kenya', '2025-03-01', 'win');
                 INSERT INTO country_focals (department_code, name, country_name)
                    VALUES ('FIN', 'A. Mwangi', 'Kenya');
                 INSERT INTO countries (iso_alpha3_code, name, continent)
                    VALUES ('KEN', 'Kenya', 'Africa');
                 INSERT INTO events (name, colour) VALUES ('Mission', '#AA0000');
                 INSERT INTO support (category, name) VALUES ('remote', 'Remote support');",
            )
            .expect("seed");
        db
    }

    /// Row sets in a comparable, order-independent form.
    fn table_rows(db: &DashboardDb, table: Table) -> Vec<String> {
        let data = store::read(db.conn_ref(), table, &[]).expect("read");
        let mut rows: Vec<String> = data.rows.iter().map(|row| format!("{row:?}")).collect();
        rows.sort();
        rows
    }

    #[test]
    fn test_export_filename_is_timestamped_and_colon_free() {
        let now = Local.with_ymd_and_hms(2026, 8, 6, 9, 15, 0).unwrap();
        let name = export_filename(now);
        assert_eq!(name, "sal_ta_dashboard_export_2026-08-06T09_15_00.xlsx");
        assert!(!name.contains(':'));
    }

    #[test]
    fn test_round_trip_reproduces_every_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.xlsx");

        let source = seeded_db();
        export_to_workbook(&source, &path).expect("export");

        let target = DashboardDb::open_in_memory();
        let summary = import_workbook(&target, &path).expect("import");
        assert_eq!(summary.tables_replaced.len(), Table::ALL.len());
        assert!(summary.sheets_skipped.is_empty());

        for table in Table::ALL {
            assert_eq!(
                table_rows(&source, table),
                table_rows(&target, table),
                "row set mismatch in {}",
                table.name()
            );
        }
    }

    #[test]
    fn test_import_is_a_wholesale_replacement() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.xlsx");

        let source = seeded_db();
        export_to_workbook(&source, &path).expect("export");

        let target = DashboardDb::open_in_memory();
        target
            .conn_ref()
            .execute(
                "INSERT INTO departments (name, code) VALUES ('Stale', 'OLD')",
                [],
            )
            .expect("pre-existing row");

        import_workbook(&target, &path).expect("import");

        let rows = table_rows(&target, Table::Departments);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("Finance"), "stale row must be gone: {rows:?}");
    }

    #[test]
    fn test_identities_continue_above_imported_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.xlsx");

        let source = seeded_db();
        // Push the exported advisor id up so the gap is visible.
        source
            .conn_ref()
            .execute("UPDATE advisors SET id = 40 WHERE short_name = 'JD'", [])
            .expect("bump id");
        export_to_workbook(&source, &path).expect("export");

        let target = DashboardDb::open_in_memory();
        import_workbook(&target, &path).expect("import");

        let next = db_insert_advisor(&target);
        assert!(next > 40, "next id {next} must continue above imported ids");
    }

    fn db_insert_advisor(db: &DashboardDb) -> i64 {
        db.conn_ref()
            .execute(
                "INSERT INTO advisors (department_code, name, short_name) VALUES ('FIN', 'New', 'NW')",
                [],
            )
            .expect("insert");
        db.conn_ref().last_insert_rowid()
    }

    #[test]
    fn test_unknown_sheets_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mixed.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("departments").expect("name");
        sheet.write_string(0, 0, "name").expect("write");
        sheet.write_string(0, 1, "code").expect("write");
        sheet.write_string(1, 0, "Finance").expect("write");
        sheet.write_string(1, 1, "FIN").expect("write");
        let stray = workbook.add_worksheet();
        stray.set_name("scratchpad").expect("name");
        stray.write_string(0, 0, "notes").expect("write");
        workbook.save(&path).expect("save");

        let db = DashboardDb::open_in_memory();
        let summary = import_workbook(&db, &path).expect("import");
        assert_eq!(summary.tables_replaced, vec![Table::Departments]);
        assert_eq!(summary.sheets_skipped, vec!["scratchpad".to_string()]);
        assert_eq!(table_rows(&db, Table::Departments).len(), 1);
    }

    #[test]
    fn test_legacy_boolean_results_coerced_to_tri_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("legacy.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("proposals").expect("name");
        for (col, header) in ["department_code", "type", "country_name", "date_submission", "result"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *header).expect("write");
        }
        let base = ["FIN", "proposal", "Kenya", "2024-05-01"];
        for (row, result) in [Some(true), Some(false), None].iter().enumerate() {
            let r = (row + 1) as u32;
            for (col, value) in base.iter().enumerate() {
                sheet.write_string(r, col as u16, *value).expect("write");
            }
            if let Some(b) = result {
                sheet.write_boolean(r, 4, *b).expect("write");
            }
        }
        workbook.save(&path).expect("save");

        let db = DashboardDb::open_in_memory();
        import_workbook(&db, &path).expect("import");

        let results: Vec<ProposalResult> = db
            .list_proposals("FIN")
            .expect("list")
            .into_iter()
            .map(|p| p.result)
            .collect();
        assert!(results.contains(&ProposalResult::Win));
        assert!(results.contains(&ProposalResult::Lost));
        assert!(results.contains(&ProposalResult::Pending));
    }

    #[test]
    fn test_bad_sheet_rolls_back_the_whole_import() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.xlsx");

        let mut workbook = Workbook::new();
        let good = workbook.add_worksheet();
        good.set_name("departments").expect("name");
        good.write_string(0, 0, "name").expect("write");
        good.write_string(0, 1, "code").expect("write");
        good.write_string(1, 0, "Imported").expect("write");
        good.write_string(1, 1, "IMP").expect("write");
        let bad = workbook.add_worksheet();
        bad.set_name("advisors").expect("name");
        bad.write_string(0, 0, "not a column").expect("write");
        bad.write_string(1, 0, "x").expect("write");
        workbook.save(&path).expect("save");

        let db = seeded_db();
        let before = table_rows(&db, Table::Departments);

        let result = import_workbook(&db, &path);
        assert!(result.is_err(), "invalid header must fail the import");
        assert_eq!(
            table_rows(&db, Table::Departments),
            before,
            "failed import must leave every table untouched"
        );
    }
}
