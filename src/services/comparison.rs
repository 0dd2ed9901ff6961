use std::collections::HashSet;

use sqlx::{Sqlite, Transaction};

use crate::access::{self, Action, EntityKind};
use crate::db::Database;
use crate::error::{AppError, MessageResponse, Result};
use crate::models::{
    Actor, CatalogItem, CatalogKind, Comparison, ComparisonInput, ComparisonResponse, CompSpec,
    CompSpecInput, CompSpecResponse, Specification,
};
use crate::pagination::{page_params, Page};
use crate::services::CatalogService;

/// Product-to-product comparisons: a parent product, a compared
/// product and pairs of their specification rows.
pub struct ComparisonService;

impl ComparisonService {
    pub async fn list(
        db: &Database,
        actor: Option<&Actor>,
        id_or_slug: &str,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<ComparisonResponse>> {
        let product = Self::parent(db, actor, id_or_slug, Action::ViewList).await?;
        let (page, per_page, offset) = page_params(page, limit);

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_comparisons WHERE product_id = ?")
                .bind(product.id)
                .fetch_one(db.pool())
                .await?;
        let rows: Vec<Comparison> = sqlx::query_as(
            "SELECT * FROM product_comparisons WHERE product_id = ? ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(product.id)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(db.pool())
        .await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            data.push(Self::load_response(db, &row).await?);
        }
        Ok(Page::new(
            data,
            total,
            page,
            per_page,
            &format!("/products/{id_or_slug}/comparisons"),
        ))
    }

    pub async fn store(
        db: &Database,
        actor: &Actor,
        id_or_slug: &str,
        input: ComparisonInput,
    ) -> Result<ComparisonResponse> {
        let product = Self::parent(db, Some(actor), id_or_slug, Action::Create).await?;
        let comp = Self::comp_product(db, &product, input.comp_product_id).await?;

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM product_comparisons WHERE product_id = ? AND comp_product_id = ?",
        )
        .bind(product.id)
        .bind(comp.id)
        .fetch_optional(db.pool())
        .await?;
        if existing.is_some() {
            return Err(AppError::Unprocessable(
                "product comparison already exists".to_string(),
            ));
        }

        let pairs = Self::check_specs(db, &product, &comp, &input.specs).await?;

        let mut tx = db.pool().begin().await?;
        let result = sqlx::query(
            "INSERT INTO product_comparisons (product_id, comp_product_id) VALUES (?, ?)",
        )
        .bind(product.id)
        .bind(comp.id)
        .execute(&mut *tx)
        .await?;
        let comparison_id = result.last_insert_rowid();
        Self::insert_specs(&mut tx, comparison_id, &pairs).await?;
        tx.commit().await?;

        let row = Self::find(db, product.id, comparison_id).await?;
        Self::load_response(db, &row).await
    }

    /// Replaces the compared product and the whole spec pair set.
    pub async fn update(
        db: &Database,
        actor: &Actor,
        id_or_slug: &str,
        comparison_id: i64,
        input: ComparisonInput,
    ) -> Result<ComparisonResponse> {
        let product = Self::parent(db, Some(actor), id_or_slug, Action::Update).await?;
        let comp = Self::comp_product(db, &product, input.comp_product_id).await?;
        let row = Self::find(db, product.id, comparison_id).await?;

        // Another comparison may already hold the new pairing
        if row.comp_product_id != comp.id {
            let existing: Option<(i64,)> = sqlx::query_as(
                "SELECT id FROM product_comparisons WHERE product_id = ? AND comp_product_id = ?",
            )
            .bind(product.id)
            .bind(comp.id)
            .fetch_optional(db.pool())
            .await?;
            if existing.is_some() {
                return Err(AppError::Unprocessable(
                    "product comparison already exists".to_string(),
                ));
            }
        }

        let pairs = Self::check_specs(db, &product, &comp, &input.specs).await?;

        let mut tx = db.pool().begin().await?;
        sqlx::query("DELETE FROM product_comp_specs WHERE product_comparison_id = ?")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE product_comparisons SET comp_product_id = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(comp.id)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;
        Self::insert_specs(&mut tx, row.id, &pairs).await?;
        tx.commit().await?;

        let row = Self::find(db, product.id, row.id).await?;
        Self::load_response(db, &row).await
    }

    pub async fn destroy(
        db: &Database,
        actor: &Actor,
        id_or_slug: &str,
        comparison_id: i64,
    ) -> Result<MessageResponse> {
        let product = Self::parent(db, Some(actor), id_or_slug, Action::Delete).await?;
        let row = Self::find(db, product.id, comparison_id).await?;

        sqlx::query("DELETE FROM product_comparisons WHERE id = ?")
            .bind(row.id)
            .execute(db.pool())
            .await?;
        Ok(MessageResponse::deleted("product comparison"))
    }

    async fn parent(
        db: &Database,
        actor: Option<&Actor>,
        id_or_slug: &str,
        action: Action,
    ) -> Result<CatalogItem> {
        let product =
            CatalogService::find_by_id_or_slug(db, CatalogKind::Product, id_or_slug).await?;
        let target = CatalogService::target(db, &product).await?;
        access::authorize(actor, EntityKind::ProductChild, action, Some(&target))?;
        Ok(product)
    }

    async fn comp_product(
        db: &Database,
        product: &CatalogItem,
        comp_product_id: i64,
    ) -> Result<CatalogItem> {
        if comp_product_id == product.id {
            return Err(AppError::Unprocessable(
                "Compared product id cannot be same with product id".to_string(),
            ));
        }
        let comp: Option<CatalogItem> = sqlx::query_as("SELECT * FROM products WHERE id = ?")
            .bind(comp_product_id)
            .fetch_optional(db.pool())
            .await?;
        comp.ok_or_else(|| AppError::NotFound("compared product is not found".to_string()))
    }

    /// Validates that every pair references a spec of the right
    /// product and that no spec id repeats within the request.
    async fn check_specs(
        db: &Database,
        product: &CatalogItem,
        comp: &CatalogItem,
        specs: &[CompSpecInput],
    ) -> Result<Vec<(i64, i64)>> {
        let mut origin_seen = HashSet::new();
        let mut comp_seen = HashSet::new();
        let mut pairs = Vec::with_capacity(specs.len());
        for spec in specs {
            if !origin_seen.insert(spec.origin_spec_id) || !comp_seen.insert(spec.comp_spec_id) {
                return Err(AppError::Unprocessable("There is duplicate specs".to_string()));
            }
            Self::spec_of(db, spec.origin_spec_id, product.id, "origin").await?;
            Self::spec_of(db, spec.comp_spec_id, comp.id, "comp").await?;
            pairs.push((spec.origin_spec_id, spec.comp_spec_id));
        }
        Ok(pairs)
    }

    async fn spec_of(db: &Database, spec_id: i64, product_id: i64, side: &str) -> Result<()> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM product_specifications WHERE id = ? AND product_id = ?",
        )
        .bind(spec_id)
        .bind(product_id)
        .fetch_optional(db.pool())
        .await?;
        if row.is_none() {
            return Err(AppError::Unprocessable(format!(
                "{side} spec with id {spec_id} is not found"
            )));
        }
        Ok(())
    }

    async fn insert_specs(
        tx: &mut Transaction<'_, Sqlite>,
        comparison_id: i64,
        pairs: &[(i64, i64)],
    ) -> Result<()> {
        for (origin_spec_id, comp_spec_id) in pairs {
            sqlx::query(
                "INSERT INTO product_comp_specs (product_comparison_id, origin_spec_id, comp_spec_id) VALUES (?, ?, ?)",
            )
            .bind(comparison_id)
            .bind(origin_spec_id)
            .bind(comp_spec_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn find(db: &Database, product_id: i64, comparison_id: i64) -> Result<Comparison> {
        let row: Option<Comparison> = sqlx::query_as(
            "SELECT * FROM product_comparisons WHERE id = ? AND product_id = ?",
        )
        .bind(comparison_id)
        .bind(product_id)
        .fetch_optional(db.pool())
        .await?;
        row.ok_or_else(|| AppError::NotFound("product comparison is not found".to_string()))
    }

    async fn load_response(db: &Database, row: &Comparison) -> Result<ComparisonResponse> {
        let product = Self::catalog_response(db, row.product_id).await?;
        let comp_product = Self::catalog_response(db, row.comp_product_id).await?;

        let spec_rows: Vec<CompSpec> = sqlx::query_as(
            "SELECT * FROM product_comp_specs WHERE product_comparison_id = ? ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(db.pool())
        .await?;
        let mut specs = Vec::with_capacity(spec_rows.len());
        for spec in spec_rows {
            specs.push(CompSpecResponse {
                id: spec.id,
                origin_spec: Self::spec_row(db, spec.origin_spec_id).await?,
                comp_spec: Self::spec_row(db, spec.comp_spec_id).await?,
            });
        }

        Ok(ComparisonResponse {
            id: row.id,
            product,
            comp_product,
            specs,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
        })
    }

    async fn catalog_response(
        db: &Database,
        product_id: i64,
    ) -> Result<crate::models::CatalogItemResponse> {
        let item: CatalogItem = sqlx::query_as("SELECT * FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_one(db.pool())
            .await?;
        CatalogService::load_response(db, CatalogKind::Product, &item, false).await
    }

    async fn spec_row(db: &Database, spec_id: i64) -> Result<Specification> {
        let spec = sqlx::query_as("SELECT * FROM product_specifications WHERE id = ?")
            .bind(spec_id)
            .fetch_one(db.pool())
            .await?;
        Ok(spec)
    }
}
