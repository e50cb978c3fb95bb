/// Refresh Token storage contract
///
/// Refresh tokens are signed JWTs handed to the client at login. The server
/// keeps only their SHA-256 digest, one per user; a new login replaces the
/// previous token and logout deletes it.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::DatabaseError;

/// Outcome of a failed owner lookup.
///
/// `NotFound` is kept apart from backend failures so it can be logged as
/// such, even though the renewal protocol reports it like an invalid token.
#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Hash a refresh token using SHA-256
///
/// Never store plaintext tokens in the database.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
