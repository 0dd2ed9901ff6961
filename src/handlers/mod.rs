pub mod assessment;
pub mod auth;
pub mod catalog;
pub mod catalog_detail;
pub mod comparison;
pub mod content;
pub mod profile;
pub mod taxonomy;
pub mod uploads;
pub mod user;
