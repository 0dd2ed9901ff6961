use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Country lookup row, seeded at migration time
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub iso: String,
    pub phone_code: String,
}

/// Simple id/name lookup row (industry categories, risk
/// classifications, specimen types, regulatory agencies, daeler types)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NamedRow {
    pub id: i64,
    pub name: String,
}

/// Category row of one of the four content taxonomies
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// The four admin-managed category taxonomies. Maps each to its table
/// so one set of queries serves all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyKind {
    ProductCategory,
    ServiceCategory,
    RegulationServiceCategory,
    MarketingServiceCategory,
}

impl TaxonomyKind {
    pub fn table(&self) -> &'static str {
        match self {
            TaxonomyKind::ProductCategory => "product_categories",
            TaxonomyKind::ServiceCategory => "service_categories",
            TaxonomyKind::RegulationServiceCategory => "regulation_service_categories",
            TaxonomyKind::MarketingServiceCategory => "marketing_service_categories",
        }
    }

    /// Entity name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            TaxonomyKind::ProductCategory => "product category",
            TaxonomyKind::ServiceCategory => "service category",
            TaxonomyKind::RegulationServiceCategory => "regulation service category",
            TaxonomyKind::MarketingServiceCategory => "marketing service category",
        }
    }

    /// Paginator base path
    pub fn base_path(&self) -> &'static str {
        match self {
            TaxonomyKind::ProductCategory => "/product-categories",
            TaxonomyKind::ServiceCategory => "/service-categories",
            TaxonomyKind::RegulationServiceCategory => "/regulation-service-categories",
            TaxonomyKind::MarketingServiceCategory => "/marketing-service-categories",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryRequest {
    pub name: String,
}

/// Tag attached to products and services
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
