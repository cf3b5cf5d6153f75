//! Form-field validation and the comma-joined list encoding shared by
//! advisors (country codes), timesheets (countries, attendees) and
//! proposals (supporting advisors).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::AppError;

/// Deliberately liberal: the dashboard only guards against obvious typos,
/// matching what users have already stored over the years.
fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("valid regex"))
}

fn hex_colour_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[A-Fa-f0-9]{6}$").expect("valid regex"))
}

/// Reject empty or whitespace-only required fields.
pub fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is a required field.")));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if !email_regex().is_match(email) {
        return Err(AppError::Validation(
            "Email must be a valid email address.".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_hex_colour(colour: &str) -> Result<(), AppError> {
    if !hex_colour_regex().is_match(colour) {
        return Err(AppError::Validation(
            "Colour must be a valid HEX code (e.g., #FF5733).".to_string(),
        ));
    }
    Ok(())
}

/// Encode a multi-value selection as the stored comma-joined form.
/// Empty and whitespace-only items are dropped.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| item.as_ref().trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Explode a stored comma-joined field back into its items.
pub fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("Name", "Jane Doe").is_ok());
        assert!(require("Name", "").is_err());
        assert!(require("Name", "   ").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("jane@x.org").is_ok());
        assert!(validate_email("jane@bad").is_err());
        assert!(validate_email("@x.org").is_err());
        assert!(validate_email("jane@@x.org").is_err());
    }

    #[test]
    fn test_hex_colour() {
        assert!(validate_hex_colour("#112233").is_ok());
        assert!(validate_hex_colour("#FF5733").is_ok());
        assert!(validate_hex_colour("112233").is_err());
        assert!(validate_hex_colour("#11223").is_err());
        assert!(validate_hex_colour("#11223G").is_err());
    }

    #[test]
    fn test_list_round_trip() {
        let joined = join_list(&["KEN", " UGA ", "", "TZA"]);
        assert_eq!(joined, "KEN, UGA, TZA");
        assert_eq!(split_list(&joined), vec!["KEN", "UGA", "TZA"]);
        assert!(split_list("").is_empty());
    }
}
