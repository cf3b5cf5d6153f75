//! Backend for the SAL TA multi-department operations dashboard.
//!
//! The dashboard tracks advisor calendars, country technical-support
//! timesheets, country focal-point contacts, and proposal pipelines, one
//! navbar section per department, plus an admin area with workbook
//! export/import. Everything persists in a single embedded SQLite file.
//!
//! Layering, bottom to top:
//! - [`db`] — the store: generic structured-filter CRUD over a closed
//!   table registry, typed row mapping per entity, schema migrations.
//! - [`refresh`] — table-scoped invalidation connecting mutations to the
//!   views that must re-fetch.
//! - [`services`] — per-panel business logic: selection checks, field
//!   validation, mutations, and chart aggregations.
//! - [`excel`] — whole-store workbook export and wholesale import.
//! - [`auth`] / [`state`] — login, 1-day session expiry, and the shared
//!   [`state::AppState`] a UI shell binds against.

pub mod auth;
pub mod db;
pub mod error;
pub mod excel;
mod migrations;
pub mod refresh;
pub mod services;
pub mod state;
pub mod validate;

pub use db::DashboardDb;
pub use error::{AppError, UiError};
pub use state::AppState;
