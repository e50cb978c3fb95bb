/// Password Hashing and Verification
///
/// bcrypt at a configurable cost, plus the strength rules applied at signup.

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password after checking its strength
///
/// # Errors
/// Returns error if the password is too weak or bcrypt fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    validate_password_strength(password)?;

    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against its stored hash
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!(error = %e, "Stored password hash could not be verified");
            false
        }
    }
}

/// 8..=128 characters with at least one digit, one lowercase and one
/// uppercase letter.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }

    // bcrypt only looks at the first 72 bytes anyway
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::InvalidFormat("password".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lowest cost bcrypt allows, keeps the tests fast
    const COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("ValidPassword123", COST).expect("Failed to hash password");

        assert_ne!(hash, "ValidPassword123");
        assert!(hash.starts_with("$2"));
        assert!(verify_password("ValidPassword123", &hash));
        assert!(!verify_password("WrongPassword123", &hash));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!verify_password("ValidPassword123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_weak_passwords_rejected() {
        let too_long = "a".repeat(MAX_PASSWORD_LENGTH + 1) + "A1";
        for weak in ["Short1", "NoDigitsPassword", "NOLOWERCASE1", "nouppercase1", too_long.as_str()] {
            assert!(hash_password(weak, COST).is_err(), "accepted {}", weak);
        }
    }

    #[test]
    fn test_strength_error_kinds() {
        assert!(matches!(
            validate_password_strength("Ab1"),
            Err(ValidationError::TooShort(_, MIN_PASSWORD_LENGTH))
        ));
        assert!(matches!(
            validate_password_strength("alllowercase1"),
            Err(ValidationError::InvalidFormat(_))
        ));
    }
}
