//! Regulation assessment endpoints. Manufacturers submit device
//! dossiers with license documents; admins review them.

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};

use crate::error::{MessageResponse, Result};
use crate::models::{Actor, AssessmentInput, AssessmentListQuery, AssessmentResponse, AssessmentStatusUpdate};
use crate::pagination::Page;
use crate::services::AssessmentService;
use crate::uploads::FormData;
use crate::AppState;

/// List assessments, admins see all, manufacturers their own
/// GET /v1/regulation-assessments
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AssessmentListQuery>,
) -> Result<Json<Page<AssessmentResponse>>> {
    let page = AssessmentService::list(&state.db, &actor, query).await?;
    Ok(Json(page))
}

/// GET /v1/regulation-assessments/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<AssessmentResponse>> {
    let assessment = AssessmentService::get(&state.db, &actor, id).await?;
    Ok(Json(assessment))
}

/// Submit a device dossier; license documents ride along as file
/// parts named after their slot
/// POST /v1/regulation-assessments
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    multipart: Multipart,
) -> Result<Json<AssessmentResponse>> {
    let form = FormData::read(multipart).await?;
    let input = AssessmentInput {
        product_owner: form.text("product_owner").map(String::from),
        device_label: form.text("device_label").map(String::from),
        device_identifier: form.text("device_identifier").map(String::from),
        intended_purpose: form.text("intended_purpose").map(String::from),
        country_id: form.i64_field("country_id")?,
        risk_classification_id: form.i64_field("risk_classification_id")?,
        specimen_type_id: form.i64_field("specimen_type_id")?,
        regulatory_agency_ids: form.id_list("regulatory_agency_ids")?,
        daeler_type_ids: form.id_list("daeler_type_ids")?,
    };
    let files = form.into_files();
    let assessment = AssessmentService::create(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        input,
        files,
    )
    .await?;
    Ok(Json(assessment))
}

/// Review decision
/// PUT /v1/regulation-assessments/:id
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(input): Json<AssessmentStatusUpdate>,
) -> Result<Json<AssessmentResponse>> {
    let assessment = AssessmentService::update_status(&state.db, &actor, id, input).await?;
    Ok(Json(assessment))
}

/// DELETE /v1/regulation-assessments/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let done = AssessmentService::destroy(&state.db, state.storage.as_ref(), &actor, id).await?;
    Ok(Json(done))
}
