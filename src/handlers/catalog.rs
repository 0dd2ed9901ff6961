//! Product and service endpoints. The same handlers serve both
//! resources; the router tags each subtree with its [`CatalogKind`].

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};

use crate::error::{MessageResponse, Result};
use crate::models::{
    Actor, CatalogInput, CatalogItemDetail, CatalogItemResponse, CatalogKind, CatalogListQuery,
};
use crate::pagination::Page;
use crate::services::catalog::CatalogFiles;
use crate::services::CatalogService;
use crate::uploads::FormData;
use crate::AppState;

/// The collection fields of a catalog form arrive as JSON-encoded
/// arrays next to the file parts.
fn catalog_input(form: &FormData) -> Result<CatalogInput> {
    Ok(CatalogInput {
        name: form.text("name").map(String::from),
        description: form.text("description").map(String::from),
        category_id: form.i64_field("category_id")?,
        is_published: form.bool_field("is_published")?,
        tags: form.text("tags").map(String::from),
        videos: form.json_field("videos")?.unwrap_or_default(),
        specifications: form.json_field("specifications")?.unwrap_or_default(),
        clinical_applications: form.json_field("clinical_applications")?.unwrap_or_default(),
        workflows: form.json_field("workflows")?.unwrap_or_default(),
        faqs: form.json_field("faqs")?.unwrap_or_default(),
    })
}

fn catalog_files(form: &FormData) -> CatalogFiles {
    CatalogFiles {
        thumbnail: form.file("thumbnail").cloned(),
        images: form.file_list("images").into_iter().cloned().collect(),
        user_manuals: form.file_list("user_manuals").into_iter().cloned().collect(),
    }
}

/// List catalog items visible to the caller
/// GET /v1/products | /v1/services
pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Option<Actor>>,
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<Page<CatalogItemResponse>>> {
    let page = CatalogService::list(&state.db, actor.as_ref(), kind, query).await?;
    Ok(Json(page))
}

/// Show one catalog item with its detail collections
/// GET /v1/products/:id_or_slug | /v1/services/:id_or_slug
pub async fn get(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<CatalogItemDetail>> {
    let detail = CatalogService::get(&state.db, actor.as_ref(), kind, &id_or_slug).await?;
    Ok(Json(detail))
}

/// Create a catalog item under the caller's manufacturer
/// POST /v1/products | /v1/services
pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    multipart: Multipart,
) -> Result<Json<CatalogItemDetail>> {
    let form = FormData::read(multipart).await?;
    let input = catalog_input(&form)?;
    let files = catalog_files(&form);
    let detail = CatalogService::create(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        kind,
        input,
        files,
    )
    .await?;
    Ok(Json(detail))
}

/// Update fields, thumbnail and tags of a catalog item
/// PUT /v1/products/:id_or_slug | /v1/services/:id_or_slug
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    multipart: Multipart,
) -> Result<Json<CatalogItemDetail>> {
    let form = FormData::read(multipart).await?;
    let input = catalog_input(&form)?;
    let files = catalog_files(&form);
    let detail = CatalogService::update(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        kind,
        &id_or_slug,
        input,
        files,
    )
    .await?;
    Ok(Json(detail))
}

/// Delete a catalog item together with its stored files
/// DELETE /v1/products/:id_or_slug | /v1/services/:id_or_slug
pub async fn destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<MessageResponse>> {
    let done = CatalogService::destroy(
        &state.db,
        state.storage.as_ref(),
        &actor,
        kind,
        &id_or_slug,
    )
    .await?;
    Ok(Json(done))
}
