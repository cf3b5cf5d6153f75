//! Error types for user-facing dashboard operations.
//!
//! Errors are classified by where they stop the in-flight action:
//! - Validation: rejected before the store is touched
//! - Selection: rejected before any modal/data work happens
//! - Store: the embedded database refused the statement
//!
//! Every error is terminal for the current user action; nothing retries.

use thiserror::Error;

use crate::db::DbError;

/// Error type for service-level operations.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Selection(String),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Selection(_) => ErrorKind::Selection,
            AppError::Store(_) => ErrorKind::Store,
        }
    }

    /// True when the store was never touched (the mutation definitely did
    /// not happen, as opposed to a store error where it definitely failed).
    pub fn rejected_before_store(&self) -> bool {
        !matches!(self, AppError::Store(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Selection,
    Store,
}

/// Serializable error representation for the UI boundary.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiError {
    pub message: String,
    pub kind: ErrorKind,
}

impl From<&AppError> for UiError {
    fn from(err: &AppError) -> Self {
        UiError {
            message: err.to_string(),
            kind: err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = AppError::Validation("Name is required".to_string());
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.rejected_before_store());

        let err = AppError::Store(DbError::Migration("boom".to_string()));
        assert_eq!(err.kind(), ErrorKind::Store);
        assert!(!err.rejected_before_store());
    }

    #[test]
    fn test_ui_error_carries_message() {
        let err = AppError::Selection("Please select a row to edit.".to_string());
        let ui = UiError::from(&err);
        assert_eq!(ui.message, "Please select a row to edit.");
        assert_eq!(ui.kind, ErrorKind::Selection);
    }
}
