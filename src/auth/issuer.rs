/// Token Generation
///
/// Builds and signs tokens for a subject. The lifetime is chosen by the
/// caller per token class; nothing is persisted here.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::claims::{encode_header, token_header, TokenClaims};
use crate::auth::signer::TokenSigner;
use crate::error::TokenError;

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    issuer: String,
    signer: TokenSigner,
}

impl TokenIssuer {
    pub fn new(issuer: impl Into<String>, signer: TokenSigner) -> Self {
        Self {
            issuer: issuer.into(),
            signer,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for `subject` valid for `ttl` from now
    ///
    /// # Errors
    /// Returns error if `ttl` is not positive, or the subject/user id
    /// would produce invalid claims
    pub fn issue(&self, subject: &str, user_id: i64, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, user_id, ttl, Utc::now().timestamp())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        user_id: i64,
        ttl: Duration,
        now: i64,
    ) -> Result<String, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidTtl);
        }

        let claims = TokenClaims::new(
            self.issuer.clone(),
            subject,
            user_id,
            now,
            now.saturating_add(ttl.num_seconds()),
        )
        .with_token_id(Uuid::new_v4().to_string());

        self.sign_claims(&claims)
    }

    /// Sign an already built set of claims into a compact token.
    pub fn sign_claims(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        claims.check_invariants()?;

        let header = encode_header(&token_header())?;
        let payload = claims.encode()?;
        let signature = self.signer.sign(&header, &payload)?;

        Ok(format!("{}.{}.{}", header, payload, signature))
    }
}
