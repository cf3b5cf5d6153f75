//! Shared type definitions for the database layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Database not initialized")]
    NotInitialized,

    #[error("Invalid identifier in query: {0:?}")]
    InvalidIdentifier(String),

    #[error("No columns provided for {0}")]
    EmptyRow(&'static str),
}

/// Outcome of a proposal / concept note. Stored as lowercase TEXT.
///
/// Legacy exports encoded this as a nullable boolean (TRUE = win,
/// FALSE = lost, empty = still pending); `from_legacy` keeps those
/// workbooks importable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalResult {
    Win,
    Lost,
    Pending,
}

impl ProposalResult {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalResult::Win => "win",
            ProposalResult::Lost => "lost",
            ProposalResult::Pending => "pending",
        }
    }

    /// Parse a stored value. Unknown or empty values read back as pending
    /// rather than failing the whole row.
    pub fn from_db(value: &str) -> Self {
        match value {
            "win" => ProposalResult::Win,
            "lost" => ProposalResult::Lost,
            _ => ProposalResult::Pending,
        }
    }

    /// Coerce a legacy boolean cell from pre-tri-state workbooks.
    pub fn from_legacy(value: Option<bool>) -> Self {
        match value {
            Some(true) => ProposalResult::Win,
            Some(false) => ProposalResult::Lost,
            None => ProposalResult::Pending,
        }
    }
}

/// A row from the `departments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbDepartment {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub icon: Option<String>,
}

/// A row from the `advisors` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAdvisor {
    pub id: i64,
    pub department_code: String,
    pub name: String,
    pub short_name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub active: bool,
    /// Comma-joined ISO alpha-3 codes, e.g. `"KEN, UGA"`.
    pub country_codes: Option<String>,
    /// Hex colour used for chart legends, e.g. `"#112233"`.
    pub colour: Option<String>,
}

/// A row from the `calendar` table. Dates are `%Y-%m-%d` TEXT.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbCalendarEntry {
    pub id: i64,
    pub department_code: String,
    pub advisor_short_name: String,
    pub start_date: String,
    pub end_date: String,
    pub event_name: String,
    pub notes: Option<String>,
}

/// A row from the `timesheet` table.
///
/// `country_name` and `sal_attendees` are comma-joined lists, exploded at
/// query time by the services layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTimesheetEntry {
    pub id: i64,
    pub department_code: String,
    pub date: String,
    pub country_name: String,
    pub sal_attendees: String,
    pub country_attendees: String,
    pub support_name: String,
    pub description: Option<String>,
    pub hours: f64,
}

/// A row from the `proposals` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbProposal {
    pub id: i64,
    pub department_code: String,
    /// `"proposal"` or `"concept note"`. Stored in the `type` column.
    pub kind: String,
    pub country_name: String,
    pub donor: Option<String>,
    pub date_submission: String,
    pub result: ProposalResult,
    pub sal_support: Option<String>,
    pub country_focal: Option<String>,
    pub description: Option<String>,
}

/// A row from the `country_focals` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbCountryFocal {
    pub id: i64,
    pub department_code: String,
    pub name: String,
    pub country_name: String,
    pub role: Option<String>,
    pub email: Option<String>,
}

/// A row from the `construction_risk_matrix` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbRiskEntry {
    pub id: i64,
    pub country_name: String,
    pub date: String,
    pub score: i64,
    pub description: Option<String>,
    pub remarks: Option<String>,
}

/// A row from the `countries` reference table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbCountry {
    pub iso_alpha3_code: String,
    pub name: String,
    pub continent: String,
}

/// A row from the `events` reference table (calendar event kinds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEventKind {
    pub name: String,
    pub description: Option<String>,
    pub colour: Option<String>,
}

/// A row from the `support` reference table (technical support kinds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSupportKind {
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub colour: Option<String>,
}
