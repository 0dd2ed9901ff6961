use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Category, Country, NamedRow};
use crate::pagination::{page_params, Page};

/// Read side of the fixed lookup tables (countries, industry
/// categories). Rows are seeded at migration time and not editable
/// over the API.
pub struct LookupService;

impl LookupService {
    pub async fn countries(
        db: &Database,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<Country>> {
        let (page, per_page, offset) = page_params(page, limit);
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM countries")
            .fetch_one(db.pool())
            .await?;
        let rows: Vec<Country> =
            sqlx::query_as("SELECT * FROM countries ORDER BY id LIMIT ? OFFSET ?")
                .bind(per_page as i64)
                .bind(offset)
                .fetch_all(db.pool())
                .await?;
        Ok(Page::new(rows, total, page, per_page, "/countries"))
    }

    pub async fn country(db: &Database, id: i64) -> Result<Country> {
        country_row(db, Some(id))
            .await?
            .ok_or_else(|| AppError::NotFound("country is not found".to_string()))
    }

    pub async fn industry_categories(
        db: &Database,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<NamedRow>> {
        let (page, per_page, offset) = page_params(page, limit);
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM industry_categories")
            .fetch_one(db.pool())
            .await?;
        let rows: Vec<NamedRow> =
            sqlx::query_as("SELECT id, name FROM industry_categories ORDER BY id LIMIT ? OFFSET ?")
                .bind(per_page as i64)
                .bind(offset)
                .fetch_all(db.pool())
                .await?;
        Ok(Page::new(rows, total, page, per_page, "/industry-categories"))
    }

    pub async fn industry_category(db: &Database, id: i64) -> Result<NamedRow> {
        named_row(db, "industry_categories", Some(id))
            .await?
            .ok_or_else(|| AppError::NotFound("industry category is not found".to_string()))
    }
}

pub(crate) async fn country_row(db: &Database, id: Option<i64>) -> Result<Option<Country>> {
    let Some(id) = id else { return Ok(None) };
    let row = sqlx::query_as("SELECT * FROM countries WHERE id = ?")
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row)
}

pub(crate) async fn named_row(
    db: &Database,
    table: &str,
    id: Option<i64>,
) -> Result<Option<NamedRow>> {
    let Some(id) = id else { return Ok(None) };
    let row = sqlx::query_as(&format!("SELECT id, name FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row)
}

pub(crate) async fn category_row(
    db: &Database,
    table: &str,
    id: Option<i64>,
) -> Result<Option<Category>> {
    let Some(id) = id else { return Ok(None) };
    let row = sqlx::query_as(&format!("SELECT * FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_countries_are_seeded_and_paginated() {
        let db = Database::memory().await.unwrap();

        let page = LookupService::countries(&db, Some(2), Some(15)).await.unwrap();
        assert_eq!(page.meta.total, 40);
        assert_eq!(page.meta.current_page, 2);
        assert_eq!(page.meta.last_page, 3);
        assert_eq!(page.data.len(), 15);
        assert_eq!(page.meta.next_page_url.as_deref(), Some("/countries?page=3"));
    }

    #[tokio::test]
    async fn test_country_show() {
        let db = Database::memory().await.unwrap();

        let country = LookupService::country(&db, 1).await.unwrap();
        assert!(!country.iso.is_empty());

        let err = LookupService::country(&db, 9999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "country is not found"));
    }

    #[tokio::test]
    async fn test_industry_categories() {
        let db = Database::memory().await.unwrap();

        let page = LookupService::industry_categories(&db, None, None).await.unwrap();
        assert_eq!(page.meta.total, 2);

        let one = LookupService::industry_category(&db, 1).await.unwrap();
        assert_eq!(one.id, 1);
        let err = LookupService::industry_category(&db, 42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
