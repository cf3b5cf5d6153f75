//! Login and session expiry.
//!
//! Credentials come from an optional local `.secrets.json`
//! (`{"users": {"name": "password", ...}}`). Without one, a single `sal`
//! account is accepted with the password from `SAL_DASHBOARD_PASSWORD`.
//! The provider is a trait so credential storage can evolve without
//! touching session logic.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::AppError;

/// A session is considered expired after 1 day of wall-clock time since
/// the last login.
pub const SESSION_TTL_DAYS: i64 = 1;

/// Name of the secrets file searched in the working directory.
pub const SECRETS_FILE: &str = ".secrets.json";

/// Fallback account name used when no secrets file exists.
const FALLBACK_USERNAME: &str = "sal";
/// Environment variable holding the fallback account's password.
const FALLBACK_PASSWORD_ENV: &str = "SAL_DASHBOARD_PASSWORD";

pub trait CredentialProvider {
    fn verify(&self, username: &str, password: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    users: HashMap<String, String>,
}

/// Username→password list, either loaded from the secrets file or the
/// single fallback account.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn from_users(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// Parse a secrets file. Returns None when the file is missing or
    /// malformed (the caller falls back to the single account).
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let secrets: SecretsFile = match serde_json::from_str(&content) {
            Ok(secrets) => secrets,
            Err(e) => {
                log::warn!("Ignoring malformed secrets file {}: {}", path.display(), e);
                return None;
            }
        };
        Some(Self::from_users(secrets.users))
    }

    /// Secrets file if present, otherwise the fallback `sal` account with
    /// the password taken from the environment.
    pub fn discover() -> Self {
        if let Some(credentials) = Self::load(Path::new(SECRETS_FILE)) {
            return credentials;
        }
        log::info!("No secrets file found; using single-account fallback");

        let mut users = HashMap::new();
        if let Ok(password) = std::env::var(FALLBACK_PASSWORD_ENV) {
            users.insert(FALLBACK_USERNAME.to_string(), password);
        } else {
            log::warn!(
                "{} is not set; login is disabled until credentials are configured",
                FALLBACK_PASSWORD_ENV
            );
        }
        Self::from_users(users)
    }
}

impl CredentialProvider for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|stored| stored == password)
    }
}

/// Login state for the single active session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    username: Option<String>,
    last_login: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify credentials and stamp the login time. On failure the session
    /// state is left untouched.
    pub fn login(
        &mut self,
        provider: &dyn CredentialProvider,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if !provider.verify(username, password) {
            return Err(AppError::Validation(
                "Invalid username or password.".to_string(),
            ));
        }
        self.username = Some(username.to_string());
        self.last_login = Some(now);
        Ok(())
    }

    pub fn logout(&mut self) {
        self.username = None;
        self.last_login = None;
    }

    /// Logged in and within the TTL.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.last_login {
            Some(last_login) => now - last_login <= Duration::days(SESSION_TTL_DAYS),
            None => false,
        }
    }

    /// Clear an expired session. Returns true when the session was expired
    /// by this call, so the caller can surface the "please log in again"
    /// notice exactly once.
    pub fn expire_if_stale(&mut self, now: DateTime<Utc>) -> bool {
        if self.last_login.is_some() && !self.is_active(now) {
            self.logout();
            return true;
        }
        false
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StaticCredentials {
        let mut users = HashMap::new();
        users.insert("sal".to_string(), "hunter2".to_string());
        users.insert("admin".to_string(), "s3cret".to_string());
        StaticCredentials::from_users(users)
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid timestamp")
    }

    #[test]
    fn test_login_success_and_failure() {
        let provider = provider();
        let mut session = Session::new();
        let now = at("2026-08-06T09:00:00Z");

        assert!(session
            .login(&provider, "sal", "wrong", now)
            .is_err());
        assert!(!session.is_active(now));

        session
            .login(&provider, "sal", "hunter2", now)
            .expect("login");
        assert!(session.is_active(now));
        assert_eq!(session.username(), Some("sal"));
    }

    #[test]
    fn test_unknown_user_rejected() {
        let provider = provider();
        let mut session = Session::new();
        let now = at("2026-08-06T09:00:00Z");
        assert!(session.login(&provider, "mallory", "hunter2", now).is_err());
    }

    #[test]
    fn test_session_expires_after_one_day() {
        let provider = provider();
        let mut session = Session::new();
        let login_time = at("2026-08-06T09:00:00Z");
        session
            .login(&provider, "sal", "hunter2", login_time)
            .expect("login");

        // Exactly at the TTL boundary the session is still active.
        assert!(session.is_active(at("2026-08-07T09:00:00Z")));
        // One second past, it is not.
        assert!(!session.is_active(at("2026-08-07T09:00:01Z")));
    }

    #[test]
    fn test_expire_if_stale_fires_once() {
        let provider = provider();
        let mut session = Session::new();
        session
            .login(&provider, "sal", "hunter2", at("2026-08-06T09:00:00Z"))
            .expect("login");

        let later = at("2026-08-08T09:00:00Z");
        assert!(session.expire_if_stale(later));
        assert!(!session.expire_if_stale(later), "second call is a no-op");
        assert!(!session.is_active(later));
    }

    #[test]
    fn test_load_secrets_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".secrets.json");
        std::fs::write(&path, r#"{"users": {"paolo": "pw1", "sal": "pw2"}}"#)
            .expect("write");

        let credentials = StaticCredentials::load(&path).expect("load");
        assert!(credentials.verify("paolo", "pw1"));
        assert!(!credentials.verify("paolo", "pw2"));

        std::fs::write(&path, "not json").expect("write");
        assert!(StaticCredentials::load(&path).is_none());
        assert!(StaticCredentials::load(&dir.path().join("missing.json")).is_none());
    }
}
