use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::error::Result;
use crate::models::{Actor, UserDetailResponse, UserListQuery};
use crate::pagination::Page;
use crate::services::UserService;
use crate::AppState;

/// List accounts with their role profiles, admin only
/// GET /v1/users
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Page<UserDetailResponse>>> {
    let page = UserService::list(&state.db, &actor, query).await?;
    Ok(Json(page))
}

/// Single account detail, admin only
/// GET /v1/users/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<UserDetailResponse>> {
    let user = UserService::get(&state.db, &actor, id).await?;
    Ok(Json(user))
}
