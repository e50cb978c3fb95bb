/// HMAC-SHA256 signing and verification
///
/// Signatures cover `header "." payload` and are base64url encoded.
/// Verification re-signs and compares in constant time.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey};

use crate::error::{ConfigError, TokenError};

/// Process-wide HMAC secret. Built once at startup, never mutated.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// # Errors
    /// Returns error if the secret is empty
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey([redacted])")
    }
}

#[derive(Debug, Clone)]
pub struct TokenSigner {
    key: Arc<SigningKey>,
}

impl TokenSigner {
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self { key }
    }

    pub fn sign(&self, header: &str, payload: &str) -> Result<String, TokenError> {
        crypto::sign(
            signing_input(header, payload).as_bytes(),
            &self.key.encoding,
            Algorithm::HS256,
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Never fails: any anomaly is reported as `false`.
    pub fn verify(&self, header: &str, payload: &str, signature: &str) -> bool {
        if signature.is_empty() {
            return false;
        }
        crypto::verify(
            signature,
            signing_input(header, payload).as_bytes(),
            &self.key.decoding,
            Algorithm::HS256,
        )
        .unwrap_or(false)
    }
}

fn signing_input(header: &str, payload: &str) -> String {
    format!("{}.{}", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(Arc::new(SigningKey::new(secret).expect("Failed to build key")))
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = signer("test-secret-key-at-least-32-characters-long");
        let signature = signer.sign("aGVhZGVy", "cGF5bG9hZA").unwrap();

        assert!(signer.verify("aGVhZGVy", "cGF5bG9hZA", &signature));
    }

    #[test]
    fn test_signature_is_stable() {
        let signer = signer("secret");
        assert_eq!(signer.sign("a", "b").unwrap(), signer.sign("a", "b").unwrap());
    }

    #[test]
    fn test_payload_change_fails_verification() {
        let signer = signer("secret");
        let signature = signer.sign("aGVhZGVy", "cGF5bG9hZA").unwrap();

        assert!(!signer.verify("aGVhZGVy", "cGF5bG9hZB", &signature));
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let signature = signer("secret-one").sign("h", "p").unwrap();
        assert!(!signer("secret-two").verify("h", "p", &signature));
    }

    #[test]
    fn test_garbage_signature_is_false() {
        let signer = signer("secret");
        assert!(!signer.verify("h", "p", ""));
        assert!(!signer.verify("h", "p", "!!not-base64!!"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(SigningKey::new("").is_err());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let key = SigningKey::new("super-secret-value").unwrap();
        assert!(!format!("{:?}", key).contains("super-secret-value"));
    }
}
