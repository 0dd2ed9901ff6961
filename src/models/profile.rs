use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::file::FileUploadResponse;
use super::lookup::{Category, Country, NamedRow};
use super::user::UserResponse;

/// Manufacturer profile, 0..1 per manufacturer user. Created empty at
/// registration and filled in through the profile endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct Manufacturer {
    pub id: i64,
    pub name: Option<String>,
    pub pic_name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub video: Option<String>,
    pub about: Option<String>,
    pub country_id: Option<i64>,
    pub industry_category_id: Option<i64>,
    pub category_id_one: Option<i64>,
    pub category_id_two: Option<i64>,
    pub user_id: i64,
    pub logo_id: Option<i64>,
    pub profile_file_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManufacturerResponse {
    pub id: i64,
    pub name: Option<String>,
    pub pic_name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub video: Option<String>,
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_category: Option<NamedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_one: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_two: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<FileUploadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_file: Option<FileUploadResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// Healthcare provider profile, 0..1 per healthcare user.
#[derive(Debug, Clone, FromRow)]
pub struct Healthcare {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub country_id: Option<i64>,
    pub industry_category_id: Option<i64>,
    pub user_id: i64,
    pub logo_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthcareResponse {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_category: Option<NamedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<FileUploadResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// Text fields of the manufacturer profile update. Files (logo,
/// profile_file) and the optional password change ride along in the
/// same multipart request.
#[derive(Debug, Default, Deserialize)]
pub struct ManufacturerProfileUpdate {
    pub name: Option<String>,
    pub pic_name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub video: Option<String>,
    pub about: Option<String>,
    pub country_id: Option<i64>,
    pub industry_category_id: Option<i64>,
    pub category_id_one: Option<i64>,
    pub category_id_two: Option<i64>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthcareProfileUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub country_id: Option<i64>,
    pub industry_category_id: Option<i64>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_new_password: Option<String>,
}
