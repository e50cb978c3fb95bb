/// Access-Token Renewal
///
/// Exchanges a refresh token for a fresh access token:
///
/// ```text
/// Start -> ValidatingRefresh -> ResolvingOwner -> IssuingAccess -> Done
///    \__________________\_______________\_____________\___> Rejected
/// ```
///
/// Nothing is persisted between steps and nothing is retried. Every
/// successful call mints a new, independent access token.

use std::sync::Arc;

use chrono::Duration;

use crate::auth::issuer::TokenIssuer;
use crate::auth::refresh_token::RefreshTokenError;
use crate::auth::validator::TokenValidator;
use crate::domain::User;
use crate::error::{AppError, AuthError};
use crate::storage::{RefreshTokenStore, UserStore};

#[derive(Debug)]
enum RenewalState<'a> {
    Start { refresh_token: &'a str },
    ValidatingRefresh { refresh_token: &'a str, claimed_user_id: i64 },
    ResolvingOwner { user_id: i64 },
    IssuingAccess { user: User },
    Done { access_token: String },
}

impl RenewalState<'_> {
    fn name(&self) -> &'static str {
        match self {
            RenewalState::Start { .. } => "start",
            RenewalState::ValidatingRefresh { .. } => "validating_refresh",
            RenewalState::ResolvingOwner { .. } => "resolving_owner",
            RenewalState::IssuingAccess { .. } => "issuing_access",
            RenewalState::Done { .. } => "done",
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    issuer: TokenIssuer,
    validator: TokenValidator,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    users: Arc<dyn UserStore>,
    access_token_ttl: Duration,
}

impl TokenService {
    pub fn new(
        issuer: TokenIssuer,
        validator: TokenValidator,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        users: Arc<dyn UserStore>,
        access_token_ttl: Duration,
    ) -> Self {
        Self {
            issuer,
            validator,
            refresh_tokens,
            users,
            access_token_ttl,
        }
    }

    /// Mint a new access token from a refresh token
    ///
    /// # Errors
    /// - `AuthError::UnexpectedToken` if the refresh token is invalid, unknown
    ///   to the store, or bound to a different user
    /// - `AuthError::UnexpectedUser` if its owner no longer exists
    /// - `AppError::Database` if a lookup fails
    pub async fn create_new_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let mut state = RenewalState::Start { refresh_token };

        loop {
            let stage = state.name();
            state = match self.advance(state).await {
                Ok(RenewalState::Done { access_token }) => return Ok(access_token),
                Ok(next) => next,
                Err(e) => {
                    tracing::warn!(stage = stage, error = %e, "Access token renewal rejected");
                    return Err(e);
                }
            };
        }
    }

    async fn advance<'a>(&self, state: RenewalState<'a>) -> Result<RenewalState<'a>, AppError> {
        match state {
            RenewalState::Start { refresh_token } => {
                let claims = self.validator.verify(refresh_token).map_err(|e| {
                    tracing::debug!(reason = %e, "Refresh token failed validation");
                    AuthError::UnexpectedToken
                })?;
                Ok(RenewalState::ValidatingRefresh {
                    refresh_token,
                    claimed_user_id: claims.user_id,
                })
            }
            RenewalState::ValidatingRefresh {
                refresh_token,
                claimed_user_id,
            } => {
                let user_id = match self.refresh_tokens.find_owner(refresh_token).await {
                    Ok(user_id) => user_id,
                    Err(RefreshTokenError::NotFound) => {
                        tracing::info!("Refresh token is valid but unknown to the store");
                        return Err(AuthError::UnexpectedToken.into());
                    }
                    Err(RefreshTokenError::Database(e)) => return Err(e.into()),
                };
                if user_id != claimed_user_id {
                    tracing::warn!(
                        owner = user_id,
                        claimed = claimed_user_id,
                        "Refresh token owner does not match its claims"
                    );
                    return Err(AuthError::UnexpectedToken.into());
                }
                Ok(RenewalState::ResolvingOwner { user_id })
            }
            RenewalState::ResolvingOwner { user_id } => {
                let user = self
                    .users
                    .find_user(user_id)
                    .await?
                    .ok_or(AuthError::UnexpectedUser)?;
                Ok(RenewalState::IssuingAccess { user })
            }
            RenewalState::IssuingAccess { user } => {
                let access_token = self
                    .issuer
                    .issue(&user.email, user.id, self.access_token_ttl)?;
                tracing::info!(user_id = user.id, "Access token renewed");
                Ok(RenewalState::Done { access_token })
            }
            done @ RenewalState::Done { .. } => Ok(done),
        }
    }
}
