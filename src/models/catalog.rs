use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::file::FileUploadResponse;
use super::lookup::{Category, Tag};
use super::profile::ManufacturerResponse;

/// The two owned catalog families. Products and services share one
/// shape, so queries are keyed by kind instead of being written twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Product,
    Service,
}

impl CatalogKind {
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Product => "products",
            CatalogKind::Service => "services",
        }
    }

    /// Table prefix of the child tables ({prefix}_media, ...) and the
    /// parent foreign key column ({prefix}_id).
    pub fn prefix(&self) -> &'static str {
        match self {
            CatalogKind::Product => "product",
            CatalogKind::Service => "service",
        }
    }

    pub fn category_table(&self) -> &'static str {
        match self {
            CatalogKind::Product => "product_categories",
            CatalogKind::Service => "service_categories",
        }
    }

    /// Entity name used in error messages.
    pub fn label(&self) -> &'static str {
        self.prefix()
    }

    /// Route segment used for paginator links.
    pub fn base_path(&self) -> &'static str {
        match self {
            CatalogKind::Product => "/products",
            CatalogKind::Service => "/services",
        }
    }
}

/// Product or service row
#[derive(Debug, Clone, FromRow)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_published: bool,
    pub thumbnail_id: Option<i64>,
    pub category_id: Option<i64>,
    pub manufacturer_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogItemResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<FileUploadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<ManufacturerResponse>,
    pub tags: Vec<Tag>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fully loaded item with every child collection, returned by show and
/// by create.
#[derive(Debug, Serialize)]
pub struct CatalogItemDetail {
    #[serde(flatten)]
    pub item: CatalogItemResponse,
    pub media: Vec<Media>,
    pub specifications: Vec<Specification>,
    pub clinical_applications: Vec<ClinicalApplication>,
    pub workflows: Vec<Workflow>,
    pub question_answers: Vec<Qa>,
    pub user_manuals: Vec<UserManualResponse>,
}

/// Media attachment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    #[serde(rename = "3d")]
    ThreeD,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::ThreeD => "3d",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "3d" => Some(MediaKind::ThreeD),
            _ => None,
        }
    }
}

/// Media row: images carry a storage key in `name`, videos and 3d
/// models carry an external url.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Media {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub media_type: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Specification {
    pub id: i64,
    pub name: String,
    pub value: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClinicalApplication {
    pub id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Workflow {
    pub id: i64,
    pub seq: i64,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Qa {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserManual {
    pub id: i64,
    pub file_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserManualResponse {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileUploadResponse>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Comparison {
    pub id: i64,
    pub product_id: i64,
    pub comp_product_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub id: i64,
    pub product: CatalogItemResponse,
    pub comp_product: CatalogItemResponse,
    pub specs: Vec<CompSpecResponse>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct CompSpec {
    pub id: i64,
    pub origin_spec_id: i64,
    pub comp_spec_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CompSpecResponse {
    pub id: i64,
    pub origin_spec: Specification,
    pub comp_spec: Specification,
}

/// Text fields of the catalog create/update multipart request. The
/// collection fields arrive as JSON-encoded arrays; files (thumbnail,
/// images, user_manuals) ride along as file parts.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub is_published: Option<bool>,
    /// Comma-separated tag names.
    pub tags: Option<String>,
    /// External video urls.
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub specifications: Vec<SpecificationInput>,
    #[serde(default)]
    pub clinical_applications: Vec<ClinicalApplicationInput>,
    #[serde(default)]
    pub workflows: Vec<WorkflowInput>,
    #[serde(default)]
    pub faqs: Vec<QaInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SpecificationInput {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClinicalApplicationInput {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowInput {
    pub seq: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QaInput {
    pub question: String,
    pub answer: String,
}

/// Partial workflow update; a seq change is checked for collision.
#[derive(Debug, Default, Deserialize)]
pub struct WorkflowUpdate {
    pub seq: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaInput {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub media_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompSpecInput {
    pub origin_spec_id: i64,
    pub comp_spec_id: i64,
}

/// A missing or unknown `comp_product_id` falls through to the
/// "compared product is not found" lookup error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ComparisonInput {
    pub comp_product_id: i64,
    pub specs: Vec<CompSpecInput>,
}

/// List filters of the catalog index endpoints
#[derive(Debug, Default, Deserialize)]
pub struct CatalogListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub manufacturer_id: Option<i64>,
    pub keyword: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    /// Comma-separated country ids, matched against the owning
    /// manufacturer.
    pub country_ids: Option<String>,
    /// Comma-separated category ids.
    pub category_ids: Option<String>,
}
