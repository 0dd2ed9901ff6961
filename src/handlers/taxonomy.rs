//! Category taxonomies and fixed lookup tables. The four taxonomies
//! share one handler set; the router supplies the [`TaxonomyKind`] of
//! each subtree. Countries and industry categories are read only.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::error::{MessageResponse, Result};
use crate::models::{Actor, Category, CategoryRequest, Country, NamedRow, TaxonomyKind};
use crate::pagination::{Page, PageQuery};
use crate::services::{LookupService, TaxonomyService};
use crate::AppState;

// Paths shown for product categories; the same routes exist under
// /v1/service-categories, /v1/regulation-service-categories and
// /v1/marketing-service-categories.

/// GET /v1/product-categories
pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Category>>> {
    let page = TaxonomyService::list(&state.db, kind, query.page, query.limit).await?;
    Ok(Json(page))
}

/// GET /v1/product-categories/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    Path(id): Path<i64>,
) -> Result<Json<Category>> {
    let category = TaxonomyService::get(&state.db, kind, id).await?;
    Ok(Json(category))
}

/// POST /v1/product-categories
pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    let category = TaxonomyService::create(&state.db, &actor, kind, req).await?;
    Ok(Json(category))
}

/// PUT /v1/product-categories/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    let category = TaxonomyService::update(&state.db, &actor, kind, id, req).await?;
    Ok(Json(category))
}

/// DELETE /v1/product-categories/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let done = TaxonomyService::destroy(&state.db, &actor, kind, id).await?;
    Ok(Json(done))
}

// ---- lookups ----

/// GET /v1/countries
pub async fn countries(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Country>>> {
    let page = LookupService::countries(&state.db, query.page, query.limit).await?;
    Ok(Json(page))
}

/// GET /v1/countries/:id
pub async fn country(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Country>> {
    let country = LookupService::country(&state.db, id).await?;
    Ok(Json(country))
}

/// GET /v1/industry-categories
pub async fn industry_categories(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<NamedRow>>> {
    let page = LookupService::industry_categories(&state.db, query.page, query.limit).await?;
    Ok(Json(page))
}

/// GET /v1/industry-categories/:id
pub async fn industry_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NamedRow>> {
    let row = LookupService::industry_category(&state.db, id).await?;
    Ok(Json(row))
}
