pub mod assessment;
pub mod auth;
pub mod catalog;
pub mod catalog_detail;
pub mod comparison;
pub mod content;
pub mod lookup;
pub mod market;
pub mod profile;
pub mod taxonomy;
pub mod user;

pub use assessment::AssessmentService;
pub use auth::AuthService;
pub use catalog::CatalogService;
pub use catalog_detail::CatalogDetailService;
pub use comparison::ComparisonService;
pub use content::ContentService;
pub use lookup::LookupService;
pub use market::MarketService;
pub use profile::ProfileService;
pub use taxonomy::TaxonomyService;
pub use user::UserService;
