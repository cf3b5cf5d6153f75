//! Application state shared by every UI-facing operation: the open store,
//! the refresh hub, and the single login session.

use std::sync::Mutex;

use chrono::Utc;

use crate::auth::{CredentialProvider, Session, StaticCredentials};
use crate::db::{DashboardDb, DbError};
use crate::error::AppError;
use crate::refresh::RefreshHub;

pub struct AppState {
    pub db: Mutex<Option<DashboardDb>>,
    pub refresh: RefreshHub,
    pub session: Mutex<Session>,
    credentials: Box<dyn CredentialProvider + Send + Sync>,
}

impl AppState {
    /// Open the store and discover credentials. A failed open leaves the
    /// app running with data features disabled rather than crashing at
    /// startup.
    pub fn new() -> Self {
        let db = match DashboardDb::open() {
            Ok(db) => Some(db),
            Err(e) => {
                log::warn!("Failed to open dashboard database: {e}. Data features disabled.");
                None
            }
        };
        Self::with_parts(db, Box::new(StaticCredentials::discover()))
    }

    /// Assemble state from explicit parts. Useful for tests and for
    /// embedding with a different credential backend.
    pub fn with_parts(
        db: Option<DashboardDb>,
        credentials: Box<dyn CredentialProvider + Send + Sync>,
    ) -> Self {
        Self {
            db: Mutex::new(db),
            refresh: RefreshHub::new(),
            session: Mutex::new(Session::new()),
            credentials,
        }
    }

    /// Run a closure against the open store.
    pub fn with_db<T>(
        &self,
        f: impl FnOnce(&DashboardDb) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let guard = self.db.lock().unwrap_or_else(|e| e.into_inner());
        let db = guard.as_ref().ok_or(DbError::NotInitialized)?;
        f(db)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<(), AppError> {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.login(self.credentials.as_ref(), username, password, Utc::now())
    }

    pub fn logout(&self) {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.logout();
    }

    /// Whether a non-expired login is present. Every panel checks this
    /// before rendering anything.
    pub fn session_is_active(&self) -> bool {
        let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.is_active(Utc::now())
    }

    /// Clear an expired session; returns true when this call expired it
    /// (the caller shows the "please log in again" notice exactly once).
    pub fn expire_stale_session(&self) -> bool {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.expire_if_stale(Utc::now())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_state() -> AppState {
        let mut users = HashMap::new();
        users.insert("sal".to_string(), "hunter2".to_string());
        AppState::with_parts(
            Some(DashboardDb::open_in_memory()),
            Box::new(StaticCredentials::from_users(users)),
        )
    }

    #[test]
    fn test_login_gates_session() {
        let state = test_state();
        assert!(!state.session_is_active());

        assert!(state.login("sal", "wrong").is_err());
        assert!(!state.session_is_active());

        state.login("sal", "hunter2").expect("login");
        assert!(state.session_is_active());

        state.logout();
        assert!(!state.session_is_active());
    }

    #[test]
    fn test_with_db_runs_against_open_store() {
        let state = test_state();
        let count = state
            .with_db(|db| Ok(db.list_departments()?.len()))
            .expect("query");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_with_db_reports_missing_store() {
        let state = AppState::with_parts(None, Box::new(StaticCredentials::default()));
        let err = state
            .with_db(|db| Ok(db.list_departments()?.len()))
            .expect_err("no db");
        assert!(matches!(err, AppError::Store(DbError::NotInitialized)));
    }
}
