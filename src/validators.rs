/// Input validators for account and article fields
///
/// Length limits guard against oversized payloads; the email checks also
/// reject addresses carrying injection or phishing patterns.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MIN_EMAIL_LENGTH: usize = 5;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_TITLE_LENGTH: usize = 255;
const MAX_CONTENT_LENGTH: usize = 100_000;

lazy_static! {
    // RFC 5322 simplified
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");

    static ref SQL_INJECTION_PATTERNS: [Regex; 3] = [
        Regex::new(r"(--|;|/\*|\*/)").expect("comment pattern is valid"),
        Regex::new(r"(?i)\s+UNION\s+").expect("union pattern is valid"),
        Regex::new(r#"(?i)(\bOR\b|\bAND\b)\s*['"]?[0-9]*['"]?\s*=\s*['"]?[0-9]*['"]?"#)
            .expect("boolean pattern is valid"),
    ];
}

/// Validates and normalises an email address (trimmed, lowercased)
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    check_length("email", trimmed, MIN_EMAIL_LENGTH, MAX_EMAIL_LENGTH)?;

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    let local_part_too_long = trimmed
        .split('@')
        .next()
        .map_or(false, |local| local.len() > MAX_LOCAL_PART_LENGTH);
    if local_part_too_long || trimmed.contains('\0') {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    if SQL_INJECTION_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
        return Err(ValidationError::PossibleSQLInjection);
    }

    Ok(trimmed.to_lowercase())
}

/// Validates an article title: 1..=255 characters, no control characters
pub fn is_valid_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    check_length("title", trimmed, 1, MAX_TITLE_LENGTH)?;

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("title".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates article content. Content is stored verbatim.
pub fn is_valid_content(content: &str) -> Result<String, ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyField("content".to_string()));
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(ValidationError::TooLong(
            "content".to_string(),
            MAX_CONTENT_LENGTH,
        ));
    }
    if content.contains('\0') {
        return Err(ValidationError::SuspiciousContent("content".to_string()));
    }

    Ok(content.to_string())
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let length = value.chars().count();
    if length == 0 {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    if length < min {
        return Err(ValidationError::TooShort(field.to_string(), min));
    }
    if length > max {
        return Err(ValidationError::TooLong(field.to_string(), max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_is_normalised() {
        assert_eq!(is_valid_email("  User@Gmail.com ").unwrap(), "user@gmail.com");
    }

    #[test]
    fn test_invalid_email_format() {
        for email in ["invalid", "user@", "@example.com", "user@@example.com"] {
            assert!(is_valid_email(email).is_err(), "accepted {}", email);
        }
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
        assert!(matches!(is_valid_email(""), Err(ValidationError::EmptyField(_))));
        assert!(matches!(is_valid_email("a@b"), Err(ValidationError::TooShort(_, _))));
    }

    #[test]
    fn test_sql_injection_in_email() {
        assert!(is_valid_email("user' OR '1'='1@example.com").is_err());
        assert!(is_valid_email("user--@example.com").is_err());
    }

    #[test]
    fn test_title_rules() {
        assert_eq!(is_valid_title("  Hello Rust  ").unwrap(), "Hello Rust");
        assert!(matches!(is_valid_title("   "), Err(ValidationError::EmptyField(_))));
        assert!(matches!(is_valid_title(&"t".repeat(256)), Err(ValidationError::TooLong(_, 255))));
        assert!(is_valid_title("bad\u{7}title").is_err());
    }

    #[test]
    fn test_content_rules() {
        assert!(is_valid_content("-- SQL comments are fine in a blog post;").is_ok());
        assert!(matches!(is_valid_content("\n\t"), Err(ValidationError::EmptyField(_))));
        assert!(is_valid_content("nul\0byte").is_err());
    }
}
