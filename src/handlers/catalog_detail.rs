//! Child collections of products and services: media, specifications,
//! clinical applications, workflows, question answers and user
//! manuals. The router supplies the [`CatalogKind`] of each subtree;
//! paths below are shown for products, the same routes exist under
//! /v1/services.

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};

use crate::error::{MessageResponse, Result};
use crate::models::{
    Actor, CatalogKind, ClinicalApplication, ClinicalApplicationInput, Media, MediaInput, Qa,
    QaInput, Specification, SpecificationInput, UserManualResponse, Workflow, WorkflowInput,
    WorkflowUpdate,
};
use crate::pagination::{Page, PageQuery};
use crate::services::CatalogDetailService;
use crate::uploads::FormData;
use crate::AppState;

// ---- media ----

/// GET /v1/products/:id_or_slug/media
pub async fn media_list(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Media>>> {
    let page = CatalogDetailService::media_list(
        &state.db,
        actor.as_ref(),
        kind,
        &id_or_slug,
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(page))
}

/// Attach an image, video link or 3d link to a catalog item
/// POST /v1/products/:id_or_slug/media
pub async fn media_store(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    multipart: Multipart,
) -> Result<Json<Media>> {
    let form = FormData::read(multipart).await?;
    let input = MediaInput {
        name: form.text("name").map(String::from),
        url: form.text("url").map(String::from),
        media_type: form.text("type").unwrap_or_default().to_string(),
    };
    let image = form.file("image").cloned();
    let media = CatalogDetailService::media_store(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        kind,
        &id_or_slug,
        input,
        image,
    )
    .await?;
    Ok(Json(media))
}

/// DELETE /v1/products/:id_or_slug/media/:media_id
pub async fn media_destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, media_id)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>> {
    let done = CatalogDetailService::media_destroy(
        &state.db,
        state.storage.as_ref(),
        &actor,
        kind,
        &id_or_slug,
        media_id,
    )
    .await?;
    Ok(Json(done))
}

// ---- specifications ----

/// GET /v1/products/:id_or_slug/specifications
pub async fn specification_list(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Specification>>> {
    let page = CatalogDetailService::specification_list(
        &state.db,
        actor.as_ref(),
        kind,
        &id_or_slug,
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(page))
}

/// POST /v1/products/:id_or_slug/specifications
pub async fn specification_store(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    Json(input): Json<SpecificationInput>,
) -> Result<Json<Specification>> {
    let row =
        CatalogDetailService::specification_store(&state.db, &actor, kind, &id_or_slug, input)
            .await?;
    Ok(Json(row))
}

/// PUT /v1/products/:id_or_slug/specifications/:spec_id
pub async fn specification_update(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, spec_id)): Path<(String, i64)>,
    Json(input): Json<SpecificationInput>,
) -> Result<Json<Specification>> {
    let row = CatalogDetailService::specification_update(
        &state.db,
        &actor,
        kind,
        &id_or_slug,
        spec_id,
        input,
    )
    .await?;
    Ok(Json(row))
}

/// DELETE /v1/products/:id_or_slug/specifications/:spec_id
pub async fn specification_destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, spec_id)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>> {
    let done = CatalogDetailService::specification_destroy(
        &state.db,
        &actor,
        kind,
        &id_or_slug,
        spec_id,
    )
    .await?;
    Ok(Json(done))
}

// ---- clinical applications ----

/// GET /v1/products/:id_or_slug/clinical-applications
pub async fn clinical_application_list(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ClinicalApplication>>> {
    let page = CatalogDetailService::clinical_application_list(
        &state.db,
        actor.as_ref(),
        kind,
        &id_or_slug,
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(page))
}

/// POST /v1/products/:id_or_slug/clinical-applications
pub async fn clinical_application_store(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    Json(input): Json<ClinicalApplicationInput>,
) -> Result<Json<ClinicalApplication>> {
    let row = CatalogDetailService::clinical_application_store(
        &state.db,
        &actor,
        kind,
        &id_or_slug,
        input,
    )
    .await?;
    Ok(Json(row))
}

/// PUT /v1/products/:id_or_slug/clinical-applications/:application_id
pub async fn clinical_application_update(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, application_id)): Path<(String, i64)>,
    Json(input): Json<ClinicalApplicationInput>,
) -> Result<Json<ClinicalApplication>> {
    let row = CatalogDetailService::clinical_application_update(
        &state.db,
        &actor,
        kind,
        &id_or_slug,
        application_id,
        input,
    )
    .await?;
    Ok(Json(row))
}

/// DELETE /v1/products/:id_or_slug/clinical-applications/:application_id
pub async fn clinical_application_destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, application_id)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>> {
    let done = CatalogDetailService::clinical_application_destroy(
        &state.db,
        &actor,
        kind,
        &id_or_slug,
        application_id,
    )
    .await?;
    Ok(Json(done))
}

// ---- workflows ----

/// GET /v1/products/:id_or_slug/workflows
pub async fn workflow_list(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Workflow>>> {
    let page = CatalogDetailService::workflow_list(
        &state.db,
        actor.as_ref(),
        kind,
        &id_or_slug,
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(page))
}

/// POST /v1/products/:id_or_slug/workflows
pub async fn workflow_store(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    Json(input): Json<WorkflowInput>,
) -> Result<Json<Workflow>> {
    let row =
        CatalogDetailService::workflow_store(&state.db, &actor, kind, &id_or_slug, input).await?;
    Ok(Json(row))
}

/// PUT /v1/products/:id_or_slug/workflows/:workflow_id
pub async fn workflow_update(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, workflow_id)): Path<(String, i64)>,
    Json(input): Json<WorkflowUpdate>,
) -> Result<Json<Workflow>> {
    let row = CatalogDetailService::workflow_update(
        &state.db,
        &actor,
        kind,
        &id_or_slug,
        workflow_id,
        input,
    )
    .await?;
    Ok(Json(row))
}

/// DELETE /v1/products/:id_or_slug/workflows/:workflow_id
pub async fn workflow_destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, workflow_id)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>> {
    let done = CatalogDetailService::workflow_destroy(
        &state.db,
        &actor,
        kind,
        &id_or_slug,
        workflow_id,
    )
    .await?;
    Ok(Json(done))
}

// ---- question answers ----

/// GET /v1/products/:id_or_slug/question-answers
pub async fn qa_list(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Qa>>> {
    let page = CatalogDetailService::qa_list(
        &state.db,
        actor.as_ref(),
        kind,
        &id_or_slug,
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(page))
}

/// POST /v1/products/:id_or_slug/question-answers
pub async fn qa_store(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    Json(input): Json<QaInput>,
) -> Result<Json<Qa>> {
    let row = CatalogDetailService::qa_store(&state.db, &actor, kind, &id_or_slug, input).await?;
    Ok(Json(row))
}

/// PUT /v1/products/:id_or_slug/question-answers/:qa_id
pub async fn qa_update(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, qa_id)): Path<(String, i64)>,
    Json(input): Json<QaInput>,
) -> Result<Json<Qa>> {
    let row =
        CatalogDetailService::qa_update(&state.db, &actor, kind, &id_or_slug, qa_id, input).await?;
    Ok(Json(row))
}

/// DELETE /v1/products/:id_or_slug/question-answers/:qa_id
pub async fn qa_destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, qa_id)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>> {
    let done =
        CatalogDetailService::qa_destroy(&state.db, &actor, kind, &id_or_slug, qa_id).await?;
    Ok(Json(done))
}

// ---- user manuals ----

/// GET /v1/products/:id_or_slug/user-manuals
pub async fn manual_list(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserManualResponse>>> {
    let page = CatalogDetailService::manual_list(
        &state.db,
        actor.as_ref(),
        kind,
        &id_or_slug,
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(page))
}

/// Upload a manual document, "file" part
/// POST /v1/products/:id_or_slug/user-manuals
pub async fn manual_store(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    multipart: Multipart,
) -> Result<Json<UserManualResponse>> {
    let form = FormData::read(multipart).await?;
    let file = form.file("file").cloned();
    let row = CatalogDetailService::manual_store(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        kind,
        &id_or_slug,
        file,
    )
    .await?;
    Ok(Json(row))
}

/// DELETE /v1/products/:id_or_slug/user-manuals/:manual_id
pub async fn manual_destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    Extension(actor): Extension<Actor>,
    Path((id_or_slug, manual_id)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>> {
    let done = CatalogDetailService::manual_destroy(
        &state.db,
        state.storage.as_ref(),
        &actor,
        kind,
        &id_or_slug,
        manual_id,
    )
    .await?;
    Ok(Json(done))
}
