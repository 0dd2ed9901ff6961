use sqlx::{QueryBuilder, Sqlite};

use crate::access::{self, Action, EntityKind, Target, Visibility};
use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, MessageResponse, Result};
use crate::models::{
    Actor, MarketItem, MarketItemInput, MarketItemResponse, MarketKind, MarketListQuery,
};
use crate::pagination::{page_params, Page};
use crate::services::content::require_field;
use crate::services::lookup::{category_row, country_row};
use crate::storage::StorageProvider;
use crate::uploads::{self, market_image, parse_id_csv, UploadedFile};

/// Regulation and marketing service offerings. One service covers
/// both families; the kind picks the table, the category taxonomy and
/// the image slot.
pub struct MarketService;

impl MarketService {
    fn entity(kind: MarketKind) -> EntityKind {
        match kind {
            MarketKind::Regulation => EntityKind::RegulationService,
            MarketKind::Marketing => EntityKind::MarketingService,
        }
    }

    pub async fn list(
        db: &Database,
        actor: Option<&Actor>,
        kind: MarketKind,
        query: MarketListQuery,
    ) -> Result<Page<MarketItemResponse>> {
        let scope = Visibility::platform_content(actor);
        let (page, per_page, offset) = page_params(query.page, query.limit);
        let category_ids = csv_filter(&query.category_ids, "category_ids")?;
        let country_ids = csv_filter(&query.country_ids, "country_ids")?;

        let push_filters = |qb: &mut QueryBuilder<'_, Sqlite>| {
            if let Some(ids) = &category_ids {
                qb.push(" AND category_id IN (");
                let mut sep = qb.separated(", ");
                for id in ids {
                    sep.push_bind(*id);
                }
                qb.push(")");
            }
            if let Some(ids) = &country_ids {
                qb.push(" AND country_id IN (");
                let mut sep = qb.separated(", ");
                for id in ids {
                    sep.push_bind(*id);
                }
                qb.push(")");
            }
        };

        let mut count = QueryBuilder::<Sqlite>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE 1 = 1",
            kind.table()
        ));
        scope.push_predicate(&mut count, "id");
        push_filters(&mut count);
        let (total,): (i64,) = count.build_query_as().fetch_one(db.pool()).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT * FROM {} WHERE 1 = 1",
            kind.table()
        ));
        scope.push_predicate(&mut select, "id");
        push_filters(&mut select);
        select.push(" ORDER BY id DESC LIMIT ");
        select.push_bind(per_page as i64);
        select.push(" OFFSET ");
        select.push_bind(offset);
        let rows: Vec<MarketItem> = select.build_query_as().fetch_all(db.pool()).await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            data.push(Self::response(db, kind, row).await?);
        }
        Ok(Page::new(data, total, page, per_page, kind.base_path()))
    }

    pub async fn get(
        db: &Database,
        actor: Option<&Actor>,
        kind: MarketKind,
        id: i64,
    ) -> Result<MarketItemResponse> {
        let item = Self::find(db, kind, id).await?;
        access::authorize(
            actor,
            Self::entity(kind),
            Action::View,
            Some(&Target::published(item.is_published)),
        )?;
        Self::response(db, kind, item).await
    }

    pub async fn create(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: MarketKind,
        input: MarketItemInput,
        image: Option<UploadedFile>,
    ) -> Result<MarketItemResponse> {
        access::authorize(Some(actor), Self::entity(kind), Action::Create, None)?;
        let title = require_field(&input.title, "title")?;
        let content = require_field(&input.content, "content")?;
        let category = category_row(db, kind.category_table(), input.category_id)
            .await?
            .ok_or_else(|| {
                AppError::Unprocessable(format!("{} category is not found", kind.label()))
            })?;
        let country = country_row(db, input.country_id)
            .await?
            .ok_or_else(|| AppError::Unprocessable("country is not found".to_string()))?;

        let image_id = Self::store_image(db, config, storage, kind, &image, None).await?;

        let result = sqlx::query(&format!(
            "INSERT INTO {} (title, content, is_published, category_id, country_id, image_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
            kind.table()
        ))
        .bind(title)
        .bind(content)
        .bind(input.is_published.unwrap_or(false))
        .bind(category.id)
        .bind(country.id)
        .bind(image_id)
        .execute(db.pool())
        .await?;

        let item = Self::find(db, kind, result.last_insert_rowid()).await?;
        Self::response(db, kind, item).await
    }

    pub async fn update(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: MarketKind,
        id: i64,
        input: MarketItemInput,
        image: Option<UploadedFile>,
    ) -> Result<MarketItemResponse> {
        let item = Self::find(db, kind, id).await?;
        access::authorize(Some(actor), Self::entity(kind), Action::Update, None)?;

        let category_id = match input.category_id {
            Some(id) => {
                let category = category_row(db, kind.category_table(), Some(id))
                    .await?
                    .ok_or_else(|| {
                        AppError::Unprocessable(format!("{} category is not found", kind.label()))
                    })?;
                Some(category.id)
            }
            None => item.category_id,
        };
        let country_id = match input.country_id {
            Some(id) => {
                let country = country_row(db, Some(id))
                    .await?
                    .ok_or_else(|| AppError::Unprocessable("country is not found".to_string()))?;
                Some(country.id)
            }
            None => item.country_id,
        };
        let image_id =
            Self::store_image(db, config, storage, kind, &image, item.image_id).await?;

        sqlx::query(&format!(
            "UPDATE {} SET title = ?, content = ?, is_published = ?, category_id = ?, \
             country_id = ?, image_id = ?, updated_at = datetime('now') WHERE id = ?",
            kind.table()
        ))
        .bind(input.title.as_deref().unwrap_or(&item.title))
        .bind(input.content.as_deref().unwrap_or(&item.content))
        .bind(input.is_published.unwrap_or(item.is_published))
        .bind(category_id)
        .bind(country_id)
        .bind(image_id)
        .bind(item.id)
        .execute(db.pool())
        .await?;

        let item = Self::find(db, kind, item.id).await?;
        Self::response(db, kind, item).await
    }

    pub async fn destroy(
        db: &Database,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: MarketKind,
        id: i64,
    ) -> Result<MessageResponse> {
        let item = Self::find(db, kind, id).await?;
        access::authorize(Some(actor), Self::entity(kind), Action::Delete, None)?;

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(item.id)
            .execute(db.pool())
            .await?;
        if let Some(image_id) = item.image_id {
            uploads::remove(db, storage, image_id).await?;
        }
        Ok(MessageResponse::deleted(kind.label()))
    }

    async fn store_image(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        kind: MarketKind,
        image: &Option<UploadedFile>,
        existing: Option<i64>,
    ) -> Result<Option<i64>> {
        let Some(file) = image else {
            return Ok(existing);
        };
        let stored =
            uploads::store(storage, config.public_base_url(), market_image(kind), file).await?;
        let mut tx = db.pool().begin().await?;
        let id = uploads::replace(&mut tx, storage, existing, &stored).await?;
        tx.commit().await?;
        Ok(Some(id))
    }

    async fn find(db: &Database, kind: MarketKind, id: i64) -> Result<MarketItem> {
        let row: Option<MarketItem> =
            sqlx::query_as(&format!("SELECT * FROM {} WHERE id = ?", kind.table()))
                .bind(id)
                .fetch_optional(db.pool())
                .await?;
        row.ok_or_else(|| AppError::NotFound(format!("{} is not found", kind.label())))
    }

    async fn response(
        db: &Database,
        kind: MarketKind,
        item: MarketItem,
    ) -> Result<MarketItemResponse> {
        Ok(MarketItemResponse {
            id: item.id,
            title: item.title,
            content: item.content,
            is_published: item.is_published,
            category: category_row(db, kind.category_table(), item.category_id).await?,
            country: country_row(db, item.country_id).await?,
            image: uploads::load_file(db, item.image_id).await?,
            created_at: item.created_at,
            updated_at: item.updated_at,
        })
    }
}

fn csv_filter(raw: &Option<String>, name: &str) -> Result<Option<Vec<i64>>> {
    match raw.as_deref().filter(|s| !s.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => {
            let ids = parse_id_csv(raw)
                .ok_or_else(|| AppError::field(name, &format!("{name} must be a list of ids")))?;
            Ok(if ids.is_empty() { None } else { Some(ids) })
        }
    }
}
