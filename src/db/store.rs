//! Generic CRUD over the fixed table registry.
//!
//! Every mutation in the app funnels through this module so that identity
//! stripping and parameter binding happen in exactly one place. Table names
//! come from the closed [`Table`] enum and predicates are structured
//! [`Filter`] values bound at the statement boundary — no caller-supplied
//! SQL fragment ever reaches the store.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

use crate::db::types::DbError;

/// The closed set of tables the dashboard persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Departments,
    Advisors,
    Calendar,
    Timesheet,
    Proposals,
    CountryFocals,
    ConstructionRiskMatrix,
    Countries,
    Events,
    Support,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Departments,
        Table::Advisors,
        Table::Calendar,
        Table::Timesheet,
        Table::Proposals,
        Table::CountryFocals,
        Table::ConstructionRiskMatrix,
        Table::Countries,
        Table::Events,
        Table::Support,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Departments => "departments",
            Table::Advisors => "advisors",
            Table::Calendar => "calendar",
            Table::Timesheet => "timesheet",
            Table::Proposals => "proposals",
            Table::CountryFocals => "country_focals",
            Table::ConstructionRiskMatrix => "construction_risk_matrix",
            Table::Countries => "countries",
            Table::Events => "events",
            Table::Support => "support",
        }
    }

    /// Resolve a worksheet name to a registry table (case-insensitive).
    pub fn from_sheet_name(sheet: &str) -> Option<Table> {
        let lowered = sheet.trim().to_ascii_lowercase();
        Table::ALL.into_iter().find(|t| t.name() == lowered)
    }

    /// Whether the table carries a store-assigned integer identity.
    /// Reference tables (countries, events, support) are keyed by name.
    pub fn has_identity(self) -> bool {
        !matches!(self, Table::Countries | Table::Events | Table::Support)
    }
}

/// A single SQL-typed value crossing the store boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Integer(n) => Some(*n != 0),
            _ => None,
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as SqlValue;
        let owned = match self {
            Value::Null => SqlValue::Null,
            Value::Integer(n) => SqlValue::Integer(*n),
            Value::Real(f) => SqlValue::Real(*f),
            Value::Text(s) => SqlValue::Text(s.clone()),
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        };
        Ok(ToSqlOutput::Owned(owned))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

fn value_from_column(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        // The schema declares no blob columns; anything unexpected reads as NULL.
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Comparison operators allowed in a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
        }
    }
}

/// A structured, parameter-bound predicate. Multiple filters are AND-joined.
#[derive(Debug, Clone)]
pub enum Filter {
    Cmp {
        column: String,
        op: Op,
        value: Value,
    },
    /// `id IN (...)` for multi-row admin operations.
    IdIn(Vec<i64>),
}

impl Filter {
    pub fn cmp(column: &str, op: Op, value: impl Into<Value>) -> Self {
        Filter::Cmp {
            column: column.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::cmp(column, Op::Eq, value)
    }

    pub fn id(id: i64) -> Self {
        Filter::eq("id", id)
    }

    pub fn id_in(ids: &[i64]) -> Self {
        Filter::IdIn(ids.to_vec())
    }
}

/// A fully materialized query result, column-major metadata + row-major data.
#[derive(Debug, Clone)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell accessor by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// Column and table identifiers must be plain snake_case words. The table
/// names come from [`Table`] anyway; this guards the column side.
fn check_identifier(name: &str) -> Result<(), DbError> {
    let ok = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

fn build_where(filters: &[Filter]) -> Result<(String, Vec<Value>), DbError> {
    if filters.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut fragments = Vec::with_capacity(filters.len());
    let mut params = Vec::new();
    for filter in filters {
        match filter {
            Filter::Cmp { column, op, value } => {
                check_identifier(column)?;
                fragments.push(format!("{} {} ?", column, op.sql()));
                params.push(value.clone());
            }
            Filter::IdIn(ids) => {
                if ids.is_empty() {
                    // IN over the empty set matches nothing.
                    fragments.push("1 = 0".to_string());
                } else {
                    let placeholders = vec!["?"; ids.len()].join(", ");
                    fragments.push(format!("id IN ({placeholders})"));
                    params.extend(ids.iter().map(|id| Value::Integer(*id)));
                }
            }
        }
    }

    Ok((format!(" WHERE {}", fragments.join(" AND ")), params))
}

/// Insert one row, stripping any caller-supplied identity column.
///
/// Returns the store-assigned row id (meaningless for reference tables,
/// which have no identity column).
pub fn insert(conn: &Connection, table: Table, row: &[(&str, Value)]) -> Result<i64, DbError> {
    let kept: Vec<&(&str, Value)> = row
        .iter()
        .filter(|(column, _)| !column.eq_ignore_ascii_case("id"))
        .collect();
    if kept.is_empty() {
        return Err(DbError::EmptyRow(table.name()));
    }

    let mut columns = Vec::with_capacity(kept.len());
    for (column, _) in &kept {
        check_identifier(column)?;
        columns.push(*column);
    }

    let placeholders = vec!["?"; kept.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(kept.iter().map(|(_, v)| v)))?;
    Ok(conn.last_insert_rowid())
}

/// Read all rows (optionally filtered) into an in-memory [`ResultSet`].
/// No pagination; the full result set is always materialized.
pub fn read(conn: &Connection, table: Table, filters: &[Filter]) -> Result<ResultSet, DbError> {
    let (where_clause, params) = build_where(filters)?;
    let sql = format!("SELECT * FROM {}{}", table.name(), where_clause);

    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let count = columns.len();

    let mapped = stmt.query_map(params_from_iter(params.iter()), |row| {
        let mut cells = Vec::with_capacity(count);
        for i in 0..count {
            cells.push(value_from_column(row.get_ref(i)?));
        }
        Ok(cells)
    })?;

    let mut rows = Vec::new();
    for row in mapped {
        rows.push(row?);
    }
    Ok(ResultSet { columns, rows })
}

/// Apply a column→value mapping to every row matching the filters.
/// Returns the number of rows affected. Identity is never updatable.
pub fn update(
    conn: &Connection,
    table: Table,
    updates: &[(&str, Value)],
    filters: &[Filter],
) -> Result<usize, DbError> {
    let kept: Vec<&(&str, Value)> = updates
        .iter()
        .filter(|(column, _)| !column.eq_ignore_ascii_case("id"))
        .collect();
    if kept.is_empty() {
        return Err(DbError::EmptyRow(table.name()));
    }

    let mut set_fragments = Vec::with_capacity(kept.len());
    let mut params: Vec<Value> = Vec::new();
    for (column, value) in &kept {
        check_identifier(column)?;
        set_fragments.push(format!("{column} = ?"));
        params.push(value.clone());
    }

    let (where_clause, where_params) = build_where(filters)?;
    params.extend(where_params);

    let sql = format!(
        "UPDATE {} SET {}{}",
        table.name(),
        set_fragments.join(", "),
        where_clause
    );
    Ok(conn.execute(&sql, params_from_iter(params.iter()))?)
}

/// Delete every row matching the filters. Returns the number of rows removed.
pub fn delete(conn: &Connection, table: Table, filters: &[Filter]) -> Result<usize, DbError> {
    let (where_clause, params) = build_where(filters)?;
    let sql = format!("DELETE FROM {}{}", table.name(), where_clause);
    Ok(conn.execute(&sql, params_from_iter(params.iter()))?)
}

/// Bulk-insert pre-shaped rows, keeping identity values as-is.
///
/// This is the workbook-import path: a wholesale table replacement must
/// preserve exported row ids so the result reproduces the source row set.
/// Everything else goes through [`insert`].
pub fn bulk_load(
    conn: &Connection,
    table: Table,
    columns: &[String],
    rows: &[Vec<Value>],
) -> Result<usize, DbError> {
    if columns.is_empty() {
        return Err(DbError::EmptyRow(table.name()));
    }
    for column in columns {
        check_identifier(column)?;
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut loaded = 0;
    for row in rows {
        stmt.execute(params_from_iter(row.iter()))?;
        loaded += 1;
    }
    Ok(loaded)
}
