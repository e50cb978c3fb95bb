/// Account Routes
///
/// Signup, login (token issuance), logout and the current principal.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, AuthenticatedPrincipal};
use crate::domain::NewUser;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::startup::AppState;
use crate::validators::is_valid_email;

#[derive(Deserialize)]
pub struct AddUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserResponse {
    pub id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// POST /user
///
/// # Errors
/// - 400: invalid email or weak password
/// - 409: email already registered
pub async fn signup(
    form: web::Json<AddUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_signup");
    let form = form.into_inner();

    let email = is_valid_email(&form.email)?;
    let cost = state.password_hash_cost;
    let password = form.password;
    // bcrypt blocks, run it on the blocking pool
    let password_hash = web::block(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

    let user = state
        .users
        .insert_user(NewUser {
            email,
            password_hash,
        })
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(AddUserResponse { id: user.id }))
}

/// POST /login
///
/// Unknown email and wrong password are indistinguishable to the caller.
///
/// # Errors
/// - 400: malformed email
/// - 401: invalid credentials
pub async fn login(
    form: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let form = form.into_inner();

    let email = is_valid_email(&form.email)?;
    let user = state
        .users
        .find_user_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let password_hash = user.password_hash.clone();
    let password = form.password;
    let password_valid = web::block(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;
    if !password_valid {
        let error = AppError::Auth(AuthError::InvalidCredentials);
        context.with_user_id(user.id).log_error(&error);
        return Err(error);
    }

    let access_token = state
        .issuer
        .issue(&user.email, user.id, state.jwt.access_token_ttl())?;
    let refresh_token = state
        .issuer
        .issue(&user.email, user.id, state.jwt.refresh_token_ttl())?;
    state
        .refresh_tokens
        .save_refresh_token(user.id, &refresh_token)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.jwt.access_token_expiry,
    }))
}

/// POST /logout
///
/// Deletes the caller's refresh token. Outstanding access tokens stay valid
/// until they expire.
pub async fn logout(
    principal: AuthenticatedPrincipal,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .refresh_tokens
        .delete_refresh_token(principal.user_id)
        .await?;

    tracing::info!(user_id = principal.user_id, "User logged out");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/me
pub async fn current_user(principal: AuthenticatedPrincipal) -> HttpResponse {
    HttpResponse::Ok().json(principal)
}
