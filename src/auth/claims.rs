/// JWT Claims and segment codec
///
/// Claims travel as base64url (unpadded) JSON, exactly like the header
/// segment of an RFC 7519 compact token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, Header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Payload of every token this service issues, access and refresh alike
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer
    pub iss: String,
    /// Subject (the user's email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Owning user's id
    #[serde(rename = "id")]
    pub user_id: i64,
    /// Unique token id, makes tokens minted in the same second distinct
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl TokenClaims {
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        user_id: i64,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            iat: issued_at,
            exp: expires_at,
            user_id,
            jti: None,
        }
    }

    pub fn with_token_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// `iat <= exp`, a non-empty subject and a positive user id.
    pub fn check_invariants(&self) -> Result<(), TokenError> {
        if self.sub.trim().is_empty() || self.user_id <= 0 || self.iat > self.exp {
            return Err(TokenError::MalformedClaims);
        }
        Ok(())
    }

    pub fn is_expired_at(&self, now: i64, leeway: i64) -> bool {
        now > self.exp.saturating_add(leeway)
    }

    /// Encode into a payload segment.
    pub fn encode(&self) -> Result<String, TokenError> {
        encode_segment(self).map_err(|_| TokenError::MalformedClaims)
    }

    /// Decode a payload segment, enforcing the claim invariants.
    pub fn decode(segment: &str) -> Result<Self, TokenError> {
        let claims: Self = decode_segment(segment).map_err(|_| TokenError::MalformedClaims)?;
        claims.check_invariants()?;
        Ok(claims)
    }
}

/// Header used for every issued token: `{"typ":"JWT","alg":"HS256"}`
pub fn token_header() -> Header {
    Header::new(Algorithm::HS256)
}

pub fn encode_header(header: &Header) -> Result<String, TokenError> {
    encode_segment(header).map_err(|_| TokenError::MalformedToken)
}

/// Decode a header segment. Only HS256 tokens are accepted.
pub fn decode_header(segment: &str) -> Result<Header, TokenError> {
    let header: Header = decode_segment(segment).map_err(|_| TokenError::MalformedToken)?;
    if header.alg != Algorithm::HS256 {
        return Err(TokenError::MalformedToken);
    }
    Ok(header)
}

#[derive(Debug)]
enum SegmentError {
    Base64,
    Json,
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, SegmentError> {
    let json = serde_json::to_vec(value).map_err(|_| SegmentError::Json)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, SegmentError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| SegmentError::Base64)?;
    serde_json::from_slice(&bytes).map_err(|_| SegmentError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims::new("blog@example.com", "user@gmail.com", 42, 1_700_000_000, 1_700_007_200)
    }

    #[test]
    fn test_claims_round_trip() {
        let claims = sample_claims().with_token_id("3f1c2a");
        let segment = claims.encode().expect("Failed to encode claims");

        assert_eq!(TokenClaims::decode(&segment).unwrap(), claims);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let claims = sample_claims();
        assert_eq!(claims.encode().unwrap(), claims.encode().unwrap());
    }

    #[test]
    fn test_wire_names() {
        let segment = sample_claims().encode().unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap();

        assert_eq!(json["iss"], "blog@example.com");
        assert_eq!(json["sub"], "user@gmail.com");
        assert_eq!(json["id"], 42);
        assert!(json.get("jti").is_none());
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let json = r#"{"id":42,"exp":1700007200,"sub":"user@gmail.com","iat":1700000000,"iss":"blog@example.com"}"#;
        let segment = URL_SAFE_NO_PAD.encode(json);

        assert_eq!(TokenClaims::decode(&segment).unwrap(), sample_claims());
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let segment = URL_SAFE_NO_PAD.encode(r#"{"iss":"x","sub":"a@b.com","iat":1,"exp":2}"#);
        assert_eq!(TokenClaims::decode(&segment), Err(TokenError::MalformedClaims));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let segment =
            URL_SAFE_NO_PAD.encode(r#"{"iss":"x","sub":"a@b.com","iat":1,"exp":2,"id":"seven"}"#);
        assert_eq!(TokenClaims::decode(&segment), Err(TokenError::MalformedClaims));
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        assert_eq!(TokenClaims::decode("not base64!"), Err(TokenError::MalformedClaims));
    }

    #[test]
    fn test_invariants_enforced_on_decode() {
        let mut claims = sample_claims();
        claims.iat = claims.exp + 1;
        let segment = encode_segment(&claims).unwrap();
        assert_eq!(TokenClaims::decode(&segment), Err(TokenError::MalformedClaims));

        let mut claims = sample_claims();
        claims.user_id = 0;
        assert_eq!(claims.check_invariants(), Err(TokenError::MalformedClaims));

        let mut claims = sample_claims();
        claims.sub = String::new();
        assert_eq!(claims.check_invariants(), Err(TokenError::MalformedClaims));
    }

    #[test]
    fn test_expiry_with_leeway() {
        let claims = sample_claims();
        assert!(!claims.is_expired_at(claims.exp, 0));
        assert!(claims.is_expired_at(claims.exp + 1, 0));
        assert!(!claims.is_expired_at(claims.exp + 30, 30));
    }

    #[test]
    fn test_header_round_trip() {
        let segment = encode_header(&token_header()).unwrap();
        let header = decode_header(&segment).unwrap();

        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_foreign_algorithm_rejected() {
        let segment = URL_SAFE_NO_PAD.encode(r#"{"typ":"JWT","alg":"HS512"}"#);
        assert_eq!(decode_header(&segment).unwrap_err(), TokenError::MalformedToken);

        let segment = URL_SAFE_NO_PAD.encode(r#"{"typ":"JWT","alg":"none"}"#);
        assert_eq!(decode_header(&segment).unwrap_err(), TokenError::MalformedToken);
    }
}
