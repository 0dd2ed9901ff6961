use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::file::FileUploadResponse;
use super::lookup::{Category, Country};

/// News article, admin-managed platform content
#[derive(Debug, Clone, FromRow)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub is_published: bool,
    pub image_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<FileUploadResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// Government affair: a news article scoped to a country
#[derive(Debug, Clone, FromRow)]
pub struct GovAffair {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub is_published: bool,
    pub country_id: Option<i64>,
    pub image_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GovAffairResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<FileUploadResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// The two admin-managed market offering families. They share one
/// shape and differ only in table and category taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketKind {
    Regulation,
    Marketing,
}

impl MarketKind {
    pub fn table(&self) -> &'static str {
        match self {
            MarketKind::Regulation => "regulation_services",
            MarketKind::Marketing => "marketing_services",
        }
    }

    pub fn category_table(&self) -> &'static str {
        match self {
            MarketKind::Regulation => "regulation_service_categories",
            MarketKind::Marketing => "marketing_service_categories",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketKind::Regulation => "regulation service",
            MarketKind::Marketing => "marketing service",
        }
    }

    pub fn base_path(&self) -> &'static str {
        match self {
            MarketKind::Regulation => "/regulation-services",
            MarketKind::Marketing => "/marketing-services",
        }
    }
}

/// Regulation or marketing service row
#[derive(Debug, Clone, FromRow)]
pub struct MarketItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub country_id: Option<i64>,
    pub image_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketItemResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<FileUploadResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// Text fields of the news / gov affair create and update requests.
/// The image file rides along in the multipart body.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_published: Option<bool>,
    pub country_id: Option<i64>,
}

/// Text fields of the market offering create and update requests.
#[derive(Debug, Default, Deserialize)]
pub struct MarketItemInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_published: Option<bool>,
    pub category_id: Option<i64>,
    pub country_id: Option<i64>,
}

/// List filters of the market offering index endpoints
#[derive(Debug, Default, Deserialize)]
pub struct MarketListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category_ids: Option<String>,
    pub country_ids: Option<String>,
}
