/// Token Validation
///
/// Full decode + signature + issuer + expiry check. The request
/// authentication path only ever sees a boolean or an `Option`, so a bad
/// token can never fail the pipeline; claim accessors re-verify the token
/// themselves instead of trusting their call site.

use chrono::Utc;

use crate::auth::claims::{decode_header, TokenClaims};
use crate::auth::principal::AuthenticatedPrincipal;
use crate::auth::signer::TokenSigner;
use crate::error::TokenError;

#[derive(Debug, Clone)]
pub struct TokenValidator {
    issuer: String,
    signer: TokenSigner,
    leeway: i64,
}

impl TokenValidator {
    /// `leeway` is the clock skew tolerance in seconds applied to `exp`.
    pub fn new(issuer: impl Into<String>, signer: TokenSigner, leeway: i64) -> Self {
        Self {
            issuer: issuer.into(),
            signer,
            leeway: leeway.max(0),
        }
    }

    /// Decode and verify a token against the current time
    ///
    /// # Errors
    /// - `MalformedToken` for a wrong segment count or an undecodable header
    /// - `SignatureMismatch` when the signature does not cover the token
    /// - `MalformedClaims` when the payload is not a valid claims set
    /// - `IssuerMismatch` when issued by someone else
    /// - `Expired` when `now > exp + leeway`
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        let (header, payload, signature) = split_token(token)?;

        decode_header(header)?;
        if !self.signer.verify(header, payload, signature) {
            return Err(TokenError::SignatureMismatch);
        }

        let claims = TokenClaims::decode(payload)?;
        if claims.iss != self.issuer {
            return Err(TokenError::IssuerMismatch);
        }
        if claims.is_expired_at(now, self.leeway) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.is_valid_at(token, Utc::now().timestamp())
    }

    pub fn is_valid_at(&self, token: &str, now: i64) -> bool {
        match self.verify_at(token, now) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(reason = %e, "Token rejected");
                false
            }
        }
    }

    /// Claims of a verified token; every failure is `InvalidToken`.
    pub fn claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify(token).map_err(|_| TokenError::InvalidToken)
    }

    pub fn user_id(&self, token: &str) -> Result<i64, TokenError> {
        self.claims(token).map(|claims| claims.user_id)
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedPrincipal, TokenError> {
        self.claims(token).map(|claims| AuthenticatedPrincipal::from_claims(&claims))
    }
}

fn split_token(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(TokenError::MalformedToken),
    }
}
