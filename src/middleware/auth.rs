use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::{Actor, UserRole};
use crate::services::AuthService;
use crate::AppState;

/// Authentication middleware for protected routes. Validates the
/// bearer JWT and inserts the `Actor` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid Authorization header".to_string()))?;

    let claims = AuthService::validate_token(token, &state.config)?;
    let actor = build_actor(&state, claims.sub).await?;

    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

/// Authentication middleware for public routes whose responses depend
/// on who is asking. Always passes; inserts `Option<Actor>`, None for
/// anonymous or failed authentication.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let actor = match bearer_token(&request) {
        Some(token) => match AuthService::validate_token(token, &state.config) {
            Ok(claims) => build_actor(&state, claims.sub).await.ok(),
            Err(_) => None,
        },
        None => None,
    };

    request.extensions_mut().insert(actor);

    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

async fn build_actor(state: &AppState, user_id: i64) -> Result<Actor, AppError> {
    let user: Option<(String, String)> = sqlx::query_as("SELECT email, role FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(state.db.pool())
        .await
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    let Some((email, role)) = user else {
        return Err(AppError::Unauthorized("Invalid token".to_string()));
    };
    let role = UserRole::from_str(&role)
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    let manufacturer_id = if role == UserRole::Manufacturer {
        sqlx::query_scalar("SELECT id FROM manufacturers WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(state.db.pool())
            .await?
    } else {
        None
    };

    Ok(Actor {
        user_id,
        email,
        role,
        manufacturer_id,
    })
}
