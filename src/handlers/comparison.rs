//! Side-by-side product comparisons, a product-only feature.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::error::{MessageResponse, Result};
use crate::models::{Actor, ComparisonInput, ComparisonResponse};
use crate::pagination::{Page, PageQuery};
use crate::services::ComparisonService;
use crate::AppState;

/// GET /v1/products/:id_or_slug/comparisons
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ComparisonResponse>>> {
    let page = ComparisonService::list(
        &state.db,
        actor.as_ref(),
        &id_or_slug,
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(page))
}

/// Compare the product against another one, spec pair by spec pair
/// POST /v1/products/:id_or_slug/comparisons
pub async fn store(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    Json(input): Json<ComparisonInput>,
) -> Result<Json<ComparisonResponse>> {
    let row = ComparisonService::store(&state.db, &actor, &id_or_slug, input).await?;
    Ok(Json(row))
}

/// Retarget a comparison; its spec pairs are rebuilt from the input
/// PUT /v1/products/:id_or_slug/comparisons/:comparison_id
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, comparison_id)): Path<(String, i64)>,
    Json(input): Json<ComparisonInput>,
) -> Result<Json<ComparisonResponse>> {
    let row =
        ComparisonService::update(&state.db, &actor, &id_or_slug, comparison_id, input).await?;
    Ok(Json(row))
}

/// DELETE /v1/products/:id_or_slug/comparisons/:comparison_id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, comparison_id)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>> {
    let done = ComparisonService::destroy(&state.db, &actor, &id_or_slug, comparison_id).await?;
    Ok(Json(done))
}
