use axum::{
    extract::{Multipart, State},
    Extension, Json,
};

use crate::error::Result;
use crate::models::{
    Actor, HealthcareProfileUpdate, HealthcareResponse, ManufacturerProfileUpdate,
    ManufacturerResponse,
};
use crate::services::ProfileService;
use crate::uploads::FormData;
use crate::AppState;

/// Own manufacturer profile, created lazily on first read
/// GET /v1/manufacturer/profile
pub async fn manufacturer_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ManufacturerResponse>> {
    let profile = ProfileService::manufacturer_profile(&state.db, &actor).await?;
    Ok(Json(profile))
}

/// Update the manufacturer profile, optional logo, company file and
/// password change
/// PUT /v1/manufacturer/profile
pub async fn update_manufacturer_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    multipart: Multipart,
) -> Result<Json<ManufacturerResponse>> {
    let form = FormData::read(multipart).await?;
    let input = ManufacturerProfileUpdate {
        name: form.text("name").map(String::from),
        pic_name: form.text("pic_name").map(String::from),
        description: form.text("description").map(String::from),
        address: form.text("address").map(String::from),
        website: form.text("website").map(String::from),
        video: form.text("video").map(String::from),
        about: form.text("about").map(String::from),
        country_id: form.i64_field("country_id")?,
        industry_category_id: form.i64_field("industry_category_id")?,
        category_id_one: form.i64_field("category_id_one")?,
        category_id_two: form.i64_field("category_id_two")?,
        current_password: form.text("current_password").map(String::from),
        new_password: form.text("new_password").map(String::from),
        confirm_new_password: form.text("confirm_new_password").map(String::from),
    };
    let logo = form.file("logo").cloned();
    let profile_file = form.file("profile_file").cloned();

    let profile = ProfileService::update_manufacturer_profile(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        input,
        logo,
        profile_file,
    )
    .await?;
    Ok(Json(profile))
}

/// Own healthcare profile, created lazily on first read
/// GET /v1/healthcare/profile
pub async fn healthcare_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<HealthcareResponse>> {
    let profile = ProfileService::healthcare_profile(&state.db, &actor).await?;
    Ok(Json(profile))
}

/// Update the healthcare profile, optional logo and password change
/// PUT /v1/healthcare/profile
pub async fn update_healthcare_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    multipart: Multipart,
) -> Result<Json<HealthcareResponse>> {
    let form = FormData::read(multipart).await?;
    let input = HealthcareProfileUpdate {
        name: form.text("name").map(String::from),
        description: form.text("description").map(String::from),
        address: form.text("address").map(String::from),
        country_id: form.i64_field("country_id")?,
        industry_category_id: form.i64_field("industry_category_id")?,
        current_password: form.text("current_password").map(String::from),
        new_password: form.text("new_password").map(String::from),
        confirm_new_password: form.text("confirm_new_password").map(String::from),
    };
    let logo = form.file("logo").cloned();

    let profile = ProfileService::update_healthcare_profile(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        input,
        logo,
    )
    .await?;
    Ok(Json(profile))
}
