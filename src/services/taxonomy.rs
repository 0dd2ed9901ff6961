use crate::access::{self, Action, EntityKind};
use crate::db::Database;
use crate::error::{AppError, MessageResponse, Result};
use crate::models::{Actor, Category, CategoryRequest, TaxonomyKind};
use crate::pagination::{page_params, Page};

/// CRUD over the four category taxonomies. One service covers all of
/// them; the kind picks the table and the error label.
pub struct TaxonomyService;

impl TaxonomyService {
    pub async fn list(
        db: &Database,
        kind: TaxonomyKind,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<Category>> {
        let (page, per_page, offset) = page_params(page, limit);
        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", kind.table()))
                .fetch_one(db.pool())
                .await?;
        let rows: Vec<Category> = sqlx::query_as(&format!(
            "SELECT * FROM {} ORDER BY id LIMIT ? OFFSET ?",
            kind.table()
        ))
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(db.pool())
        .await?;
        Ok(Page::new(rows, total, page, per_page, kind.base_path()))
    }

    pub async fn get(db: &Database, kind: TaxonomyKind, id: i64) -> Result<Category> {
        Self::find(db, kind, id).await
    }

    pub async fn create(
        db: &Database,
        actor: &Actor,
        kind: TaxonomyKind,
        req: CategoryRequest,
    ) -> Result<Category> {
        access::authorize(Some(actor), EntityKind::Taxonomy, Action::Create, None)?;
        let name = valid_name(&req)?;

        let result = sqlx::query(&format!("INSERT INTO {} (name) VALUES (?)", kind.table()))
            .bind(name)
            .execute(db.pool())
            .await?;
        Self::find(db, kind, result.last_insert_rowid()).await
    }

    pub async fn update(
        db: &Database,
        actor: &Actor,
        kind: TaxonomyKind,
        id: i64,
        req: CategoryRequest,
    ) -> Result<Category> {
        let category = Self::find(db, kind, id).await?;
        access::authorize(Some(actor), EntityKind::Taxonomy, Action::Update, None)?;
        let name = valid_name(&req)?;

        sqlx::query(&format!(
            "UPDATE {} SET name = ?, updated_at = datetime('now') WHERE id = ?",
            kind.table()
        ))
        .bind(name)
        .bind(category.id)
        .execute(db.pool())
        .await?;
        Self::find(db, kind, category.id).await
    }

    pub async fn destroy(
        db: &Database,
        actor: &Actor,
        kind: TaxonomyKind,
        id: i64,
    ) -> Result<MessageResponse> {
        let category = Self::find(db, kind, id).await?;
        access::authorize(Some(actor), EntityKind::Taxonomy, Action::Delete, None)?;

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(category.id)
            .execute(db.pool())
            .await?;
        Ok(MessageResponse::deleted(kind.label()))
    }

    async fn find(db: &Database, kind: TaxonomyKind, id: i64) -> Result<Category> {
        let row: Option<Category> =
            sqlx::query_as(&format!("SELECT * FROM {} WHERE id = ?", kind.table()))
                .bind(id)
                .fetch_optional(db.pool())
                .await?;
        row.ok_or_else(|| AppError::NotFound(format!("{} is not found", kind.label())))
    }
}

fn valid_name(req: &CategoryRequest) -> Result<&str> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::field("name", "name is required"));
    }
    Ok(name)
}
