use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::error::Result;
use crate::models::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, ResendVerificationRequest,
    UserRole, VerifyEmailQuery,
};
use crate::services::AuthService;
use crate::AppState;

/// Login with email and password
/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let response = AuthService::login(&state.db, &state.config, req).await?;
    Ok(Json(response))
}

/// Register a manufacturer account
/// POST /v1/auth/register/manufacturer
pub async fn register_manufacturer(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let response = AuthService::register(
        &state.db,
        &state.config,
        state.mailer.clone(),
        UserRole::Manufacturer,
        req,
    )
    .await?;
    Ok(Json(response))
}

/// Register a healthcare account
/// POST /v1/auth/register/healthcare
pub async fn register_healthcare(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let response = AuthService::register(
        &state.db,
        &state.config,
        state.mailer.clone(),
        UserRole::Healthcare,
        req,
    )
    .await?;
    Ok(Json(response))
}

/// Register an admin account, gated by the app key header
/// POST /v1/auth/register/admin
pub async fn register_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let api_key = headers.get("x-api-key").and_then(|h| h.to_str().ok());
    let response = AuthService::register_admin(&state.db, &state.config, api_key, req).await?;
    Ok(Json(response))
}

/// Redeem the mailed verification token
/// GET /v1/auth/verify-email?token=
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<RegisterResponse>> {
    let response = AuthService::verify_email(&state.db, &state.config, &query.token).await?;
    Ok(Json(response))
}

/// Re-send the verification mail for a pending account
/// POST /v1/auth/send-email-verification?email=
pub async fn send_email_verification(
    State(state): State<AppState>,
    Query(query): Query<ResendVerificationRequest>,
) -> Result<Json<RegisterResponse>> {
    let response = AuthService::resend_verification(
        &state.db,
        &state.config,
        state.mailer.clone(),
        &query.email,
    )
    .await?;
    Ok(Json(response))
}
