use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::startup::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessTokenRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessTokenResponse {
    pub access_token: String,
}

/// POST /api/token
///
/// Exchanges a refresh token for a new access token.
///
/// # Errors
/// - 401 `UNEXPECTED_TOKEN`: invalid, unknown or mismatched refresh token
/// - 401 `UNEXPECTED_USER`: the token's owner no longer exists
pub async fn create_new_access_token(
    body: web::Json<CreateAccessTokenRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let access_token = state
        .tokens
        .create_new_access_token(&body.refresh_token)
        .await?;

    Ok(HttpResponse::Created().json(CreateAccessTokenResponse { access_token }))
}
