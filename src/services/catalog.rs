use sqlx::{QueryBuilder, Sqlite, Transaction};
use std::collections::HashSet;

use crate::access::{self, Action, EntityKind, Target, Visibility};
use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, MessageResponse, Result};
use crate::models::{
    Actor, CatalogInput, CatalogItem, CatalogItemDetail, CatalogItemResponse, CatalogKind,
    CatalogListQuery, ClinicalApplication, Manufacturer, Media, MediaKind, Qa, Specification,
    Tag, UserManual, UserManualResponse, Workflow,
};
use crate::pagination::{page_params, Page};
use crate::services::content::require_field;
use crate::services::lookup::category_row;
use crate::services::ProfileService;
use crate::slug::unique_slug;
use crate::storage::StorageProvider;
use crate::uploads::{
    self, catalog_manual, catalog_media, catalog_thumbnail, parse_id_csv, UploadedFile,
};

/// File parts of a catalog create or update request
#[derive(Debug, Default)]
pub struct CatalogFiles {
    pub thumbnail: Option<UploadedFile>,
    pub images: Vec<UploadedFile>,
    pub user_manuals: Vec<UploadedFile>,
}

/// Products and services with their child collections. The kind picks
/// the tables; everything else is shared between the two families.
pub struct CatalogService;

impl CatalogService {
    pub(crate) fn entity(kind: CatalogKind) -> EntityKind {
        match kind {
            CatalogKind::Product => EntityKind::Product,
            CatalogKind::Service => EntityKind::Service,
        }
    }

    pub async fn list(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        query: CatalogListQuery,
    ) -> Result<Page<CatalogItemResponse>> {
        let scope = Visibility::owned_catalog(actor);
        let (page, per_page, offset) = page_params(query.page, query.limit);
        let category_ids = csv_ids(&query.category_ids, "category_ids")?;
        let country_ids = csv_ids(&query.country_ids, "country_ids")?;
        let keyword = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| format!("%{k}%"));
        let (sort, order) = sort_clause(query.sort.as_deref(), query.order.as_deref());

        let push_filters = |qb: &mut QueryBuilder<'_, Sqlite>| {
            scope.push_predicate(qb, "manufacturer_id");
            if let Some(manufacturer_id) = query.manufacturer_id {
                qb.push(" AND manufacturer_id = ").push_bind(manufacturer_id);
            }
            // The keyword pair stays grouped so it cannot widen the
            // visibility predicate.
            if let Some(pattern) = &keyword {
                qb.push(" AND (name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description LIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
            if let Some(ids) = &category_ids {
                qb.push(" AND category_id IN (");
                let mut sep = qb.separated(", ");
                for id in ids {
                    sep.push_bind(*id);
                }
                qb.push(")");
            }
            if let Some(ids) = &country_ids {
                qb.push(" AND manufacturer_id IN (SELECT id FROM manufacturers WHERE country_id IN (");
                let mut sep = qb.separated(", ");
                for id in ids {
                    sep.push_bind(*id);
                }
                qb.push("))");
            }
        };

        let mut count = QueryBuilder::<Sqlite>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE 1 = 1",
            kind.table()
        ));
        push_filters(&mut count);
        let (total,): (i64,) = count.build_query_as().fetch_one(db.pool()).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT * FROM {} WHERE 1 = 1",
            kind.table()
        ));
        push_filters(&mut select);
        select.push(format!(" ORDER BY {sort} {order} LIMIT "));
        select.push_bind(per_page as i64);
        select.push(" OFFSET ");
        select.push_bind(offset);
        let rows: Vec<CatalogItem> = select.build_query_as().fetch_all(db.pool()).await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            data.push(Self::load_response(db, kind, &row, true).await?);
        }
        Ok(Page::new(data, total, page, per_page, kind.base_path()))
    }

    pub async fn get(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        id_or_slug: &str,
    ) -> Result<CatalogItemDetail> {
        let item = Self::find_by_id_or_slug(db, kind, id_or_slug).await?;
        let target = Self::target(db, &item).await?;
        access::authorize(actor, Self::entity(kind), Action::View, Some(&target))?;
        Self::load_detail(db, kind, &item).await
    }

    pub async fn create(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: CatalogKind,
        input: CatalogInput,
        files: CatalogFiles,
    ) -> Result<CatalogItemDetail> {
        access::authorize(Some(actor), Self::entity(kind), Action::Create, None)?;

        let manufacturer = ProfileService::manufacturer_by_user_id(db, actor.user_id)
            .await?
            .ok_or_else(|| AppError::Unprocessable("manufacturer_id is not found".to_string()))?;
        let name = require_field(&input.name, "name")?;
        let category = category_row(db, kind.category_table(), input.category_id)
            .await?
            .ok_or_else(|| AppError::Unprocessable("category_id is not found".to_string()))?;
        check_workflow_seqs(kind, &input.workflows, &[])?;
        Self::validate_files(kind, &files)?;

        let slug = unique_slug(db, kind.table(), name, None).await?;
        let base_url = config.public_base_url();
        let mut tx = db.pool().begin().await?;

        let thumbnail_id = match &files.thumbnail {
            Some(file) => {
                let stored =
                    uploads::store(storage, base_url, catalog_thumbnail(kind), file).await?;
                Some(uploads::attach(&mut tx, &stored).await?)
            }
            None => None,
        };

        let result = sqlx::query(&format!(
            "INSERT INTO {} (name, slug, description, is_published, thumbnail_id, category_id, \
             manufacturer_id) VALUES (?, ?, ?, ?, ?, ?, ?)",
            kind.table()
        ))
        .bind(name)
        .bind(&slug)
        .bind(&input.description)
        .bind(input.is_published.unwrap_or(false))
        .bind(thumbnail_id)
        .bind(category.id)
        .bind(manufacturer.id)
        .execute(&mut *tx)
        .await?;
        let item_id = result.last_insert_rowid();

        if let Some(tags) = &input.tags {
            Self::sync_tags(&mut tx, kind, item_id, tags).await?;
        }
        Self::insert_children(&mut tx, kind, item_id, &input).await?;

        let prefix = kind.prefix();
        for file in &files.images {
            let stored = uploads::store(storage, base_url, catalog_media(kind), file).await?;
            sqlx::query(&format!(
                "INSERT INTO {prefix}_media ({prefix}_id, name, url, media_type) VALUES (?, ?, ?, 'image')"
            ))
            .bind(item_id)
            .bind(&stored.key)
            .bind(&stored.url)
            .execute(&mut *tx)
            .await?;
        }
        for file in &files.user_manuals {
            let stored = uploads::store(storage, base_url, catalog_manual(kind), file).await?;
            let file_id = uploads::attach(&mut tx, &stored).await?;
            sqlx::query(&format!(
                "INSERT INTO {prefix}_user_manuals ({prefix}_id, file_id) VALUES (?, ?)"
            ))
            .bind(item_id)
            .bind(file_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let item = Self::find_by_id_or_slug(db, kind, &item_id.to_string()).await?;
        Self::load_detail(db, kind, &item).await
    }

    pub async fn update(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        input: CatalogInput,
        files: CatalogFiles,
    ) -> Result<CatalogItemDetail> {
        let item = Self::find_by_id_or_slug(db, kind, id_or_slug).await?;
        let target = Self::target(db, &item).await?;
        access::authorize(Some(actor), Self::entity(kind), Action::Update, Some(&target))?;

        let category_id = match input.category_id {
            Some(id) => {
                let category = category_row(db, kind.category_table(), Some(id))
                    .await?
                    .ok_or_else(|| {
                        AppError::Unprocessable("category_id is not found".to_string())
                    })?;
                Some(category.id)
            }
            None => item.category_id,
        };
        Self::validate_files(kind, &files)?;

        let base_url = config.public_base_url();
        let mut tx = db.pool().begin().await?;

        let mut thumbnail_id = item.thumbnail_id;
        if let Some(file) = &files.thumbnail {
            let stored = uploads::store(storage, base_url, catalog_thumbnail(kind), file).await?;
            thumbnail_id =
                Some(uploads::replace(&mut tx, storage, item.thumbnail_id, &stored).await?);
        }

        sqlx::query(&format!(
            "UPDATE {} SET name = ?, description = ?, is_published = ?, thumbnail_id = ?, \
             category_id = ?, updated_at = datetime('now') WHERE id = ?",
            kind.table()
        ))
        .bind(input.name.as_deref().unwrap_or(&item.name))
        .bind(input.description.as_deref().or(item.description.as_deref()))
        .bind(input.is_published.unwrap_or(item.is_published))
        .bind(thumbnail_id)
        .bind(category_id)
        .bind(item.id)
        .execute(&mut *tx)
        .await?;

        if let Some(tags) = &input.tags {
            let prefix = kind.prefix();
            sqlx::query(&format!("DELETE FROM {prefix}_tags WHERE {prefix}_id = ?"))
                .bind(item.id)
                .execute(&mut *tx)
                .await?;
            Self::sync_tags(&mut tx, kind, item.id, tags).await?;
        }

        tx.commit().await?;

        let item = Self::find_by_id_or_slug(db, kind, &item.id.to_string()).await?;
        Self::load_detail(db, kind, &item).await
    }

    pub async fn destroy(
        db: &Database,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
    ) -> Result<MessageResponse> {
        let item = Self::find_by_id_or_slug(db, kind, id_or_slug).await?;
        let target = Self::target(db, &item).await?;
        access::authorize(Some(actor), Self::entity(kind), Action::Delete, Some(&target))?;

        // Attachment bookkeeping happens before the delete; the child
        // rows cascade away with the parent.
        let prefix = kind.prefix();
        let manual_file_ids: Vec<(i64,)> = sqlx::query_as(&format!(
            "SELECT file_id FROM {prefix}_user_manuals WHERE {prefix}_id = ? AND file_id IS NOT NULL"
        ))
        .bind(item.id)
        .fetch_all(db.pool())
        .await?;
        let image_keys: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT name FROM {prefix}_media WHERE {prefix}_id = ? AND media_type = 'image'"
        ))
        .bind(item.id)
        .fetch_all(db.pool())
        .await?;

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(item.id)
            .execute(db.pool())
            .await?;

        if let Some(thumbnail_id) = item.thumbnail_id {
            uploads::remove(db, storage, thumbnail_id).await?;
        }
        for (file_id,) in manual_file_ids {
            uploads::remove(db, storage, file_id).await?;
        }
        for (key,) in image_keys {
            storage.delete(&key).await?;
        }

        Ok(MessageResponse::deleted(kind.label()))
    }

    pub(crate) async fn find_by_id_or_slug(
        db: &Database,
        kind: CatalogKind,
        id_or_slug: &str,
    ) -> Result<CatalogItem> {
        let id: i64 = id_or_slug.parse().unwrap_or(-1);
        let row: Option<CatalogItem> = sqlx::query_as(&format!(
            "SELECT * FROM {} WHERE id = ? OR slug = ?",
            kind.table()
        ))
        .bind(id)
        .bind(id_or_slug)
        .fetch_optional(db.pool())
        .await?;
        row.ok_or_else(|| AppError::NotFound(format!("{} is not found", kind.label())))
    }

    /// Ownership target of a row, resolved through the owning
    /// manufacturer's user.
    pub(crate) async fn target(db: &Database, item: &CatalogItem) -> Result<Target> {
        let owner = Self::owner_user_id(db, item.manufacturer_id).await?;
        Ok(Target::owned(item.is_published, owner))
    }

    pub(crate) async fn owner_user_id(
        db: &Database,
        manufacturer_id: i64,
    ) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM manufacturers WHERE id = ?")
            .bind(manufacturer_id)
            .fetch_optional(db.pool())
            .await?;
        Ok(row.map(|(user_id,)| user_id))
    }

    pub async fn load_response(
        db: &Database,
        kind: CatalogKind,
        item: &CatalogItem,
        with_manufacturer: bool,
    ) -> Result<CatalogItemResponse> {
        let manufacturer = if with_manufacturer {
            let row: Option<Manufacturer> =
                sqlx::query_as("SELECT * FROM manufacturers WHERE id = ?")
                    .bind(item.manufacturer_id)
                    .fetch_optional(db.pool())
                    .await?;
            match row {
                Some(row) => Some(ProfileService::manufacturer_response(db, &row, true).await?),
                None => None,
            }
        } else {
            None
        };

        Ok(CatalogItemResponse {
            id: item.id,
            name: item.name.clone(),
            slug: item.slug.clone(),
            description: item.description.clone(),
            is_published: item.is_published,
            thumbnail: uploads::load_file(db, item.thumbnail_id).await?,
            category: category_row(db, kind.category_table(), item.category_id).await?,
            manufacturer,
            tags: Self::load_tags(db, kind, item.id).await?,
            created_at: item.created_at.clone(),
            updated_at: item.updated_at.clone(),
        })
    }

    pub async fn load_detail(
        db: &Database,
        kind: CatalogKind,
        item: &CatalogItem,
    ) -> Result<CatalogItemDetail> {
        let prefix = kind.prefix();
        let response = Self::load_response(db, kind, item, true).await?;

        let media: Vec<Media> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_media WHERE {prefix}_id = ? ORDER BY id"
        ))
        .bind(item.id)
        .fetch_all(db.pool())
        .await?;
        let specifications: Vec<Specification> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_specifications WHERE {prefix}_id = ? ORDER BY id"
        ))
        .bind(item.id)
        .fetch_all(db.pool())
        .await?;
        let clinical_applications: Vec<ClinicalApplication> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_clinical_applications WHERE {prefix}_id = ? ORDER BY id"
        ))
        .bind(item.id)
        .fetch_all(db.pool())
        .await?;
        let workflows: Vec<Workflow> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_workflows WHERE {prefix}_id = ? ORDER BY seq"
        ))
        .bind(item.id)
        .fetch_all(db.pool())
        .await?;
        let question_answers: Vec<Qa> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_qas WHERE {prefix}_id = ? ORDER BY id"
        ))
        .bind(item.id)
        .fetch_all(db.pool())
        .await?;

        let manual_rows: Vec<UserManual> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_user_manuals WHERE {prefix}_id = ? ORDER BY id"
        ))
        .bind(item.id)
        .fetch_all(db.pool())
        .await?;
        let mut user_manuals = Vec::with_capacity(manual_rows.len());
        for row in manual_rows {
            user_manuals.push(UserManualResponse {
                id: row.id,
                file: uploads::load_file(db, row.file_id).await?,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }

        Ok(CatalogItemDetail {
            item: response,
            media,
            specifications,
            clinical_applications,
            workflows,
            question_answers,
            user_manuals,
        })
    }

    pub(crate) async fn load_tags(
        db: &Database,
        kind: CatalogKind,
        item_id: i64,
    ) -> Result<Vec<Tag>> {
        let prefix = kind.prefix();
        let tags = sqlx::query_as(&format!(
            "SELECT t.id, t.name FROM tags t \
             JOIN {prefix}_tags jt ON jt.tag_id = t.id WHERE jt.{prefix}_id = ? ORDER BY t.id"
        ))
        .bind(item_id)
        .fetch_all(db.pool())
        .await?;
        Ok(tags)
    }

    /// Find-or-create every tag of the comma separated list and link
    /// it. Blank names are dropped.
    async fn sync_tags(
        tx: &mut Transaction<'_, Sqlite>,
        kind: CatalogKind,
        item_id: i64,
        tags: &str,
    ) -> Result<()> {
        let prefix = kind.prefix();
        for name in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await?;
            let tag_id = match existing {
                Some((id,)) => id,
                None => {
                    let result = sqlx::query("INSERT INTO tags (name) VALUES (?)")
                        .bind(name)
                        .execute(&mut **tx)
                        .await?;
                    result.last_insert_rowid()
                }
            };
            sqlx::query(&format!(
                "INSERT INTO {prefix}_tags ({prefix}_id, tag_id) VALUES (?, ?)"
            ))
            .bind(item_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Inline child collections of the create request: external video
    /// urls plus the four structured lists.
    async fn insert_children(
        tx: &mut Transaction<'_, Sqlite>,
        kind: CatalogKind,
        item_id: i64,
        input: &CatalogInput,
    ) -> Result<()> {
        let prefix = kind.prefix();
        for url in input.videos.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            sqlx::query(&format!(
                "INSERT INTO {prefix}_media ({prefix}_id, name, url, media_type) VALUES (?, ?, ?, ?)"
            ))
            .bind(item_id)
            .bind(url)
            .bind(url)
            .bind(MediaKind::Video.as_str())
            .execute(&mut **tx)
            .await?;
        }
        for spec in &input.specifications {
            sqlx::query(&format!(
                "INSERT INTO {prefix}_specifications ({prefix}_id, name, value) VALUES (?, ?, ?)"
            ))
            .bind(item_id)
            .bind(&spec.name)
            .bind(&spec.value)
            .execute(&mut **tx)
            .await?;
        }
        for application in &input.clinical_applications {
            sqlx::query(&format!(
                "INSERT INTO {prefix}_clinical_applications ({prefix}_id, content) VALUES (?, ?)"
            ))
            .bind(item_id)
            .bind(&application.content)
            .execute(&mut **tx)
            .await?;
        }
        for workflow in &input.workflows {
            sqlx::query(&format!(
                "INSERT INTO {prefix}_workflows ({prefix}_id, seq, title, description) VALUES (?, ?, ?, ?)"
            ))
            .bind(item_id)
            .bind(workflow.seq)
            .bind(&workflow.title)
            .bind(&workflow.description)
            .execute(&mut **tx)
            .await?;
        }
        for qa in &input.faqs {
            sqlx::query(&format!(
                "INSERT INTO {prefix}_qas ({prefix}_id, question, answer) VALUES (?, ?, ?)"
            ))
            .bind(item_id)
            .bind(&qa.question)
            .bind(&qa.answer)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    fn validate_files(kind: CatalogKind, files: &CatalogFiles) -> Result<()> {
        if let Some(file) = &files.thumbnail {
            uploads::validate(catalog_thumbnail(kind), file)?;
        }
        for file in &files.images {
            uploads::validate(catalog_media(kind), file)?;
        }
        for file in &files.user_manuals {
            uploads::validate(catalog_manual(kind), file)?;
        }
        Ok(())
    }
}

fn sort_clause(sort: Option<&str>, order: Option<&str>) -> (&'static str, &'static str) {
    let sort = match sort {
        Some("name") => "name",
        Some("created_at") => "created_at",
        Some("updated_at") => "updated_at",
        _ => "id",
    };
    let order = match order {
        Some(o) if o.eq_ignore_ascii_case("desc") => "DESC",
        _ => "ASC",
    };
    (sort, order)
}

pub(crate) fn csv_ids(raw: &Option<String>, name: &str) -> Result<Option<Vec<i64>>> {
    match raw.as_deref().filter(|s| !s.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => {
            let ids = parse_id_csv(raw)
                .ok_or_else(|| AppError::field(name, &format!("{name} must be a list of ids")))?;
            Ok(if ids.is_empty() { None } else { Some(ids) })
        }
    }
}

/// Seq collision check of submitted workflows against each other and
/// against rows already in the table.
pub(crate) fn check_workflow_seqs(
    kind: CatalogKind,
    incoming: &[crate::models::WorkflowInput],
    existing: &[i64],
) -> Result<()> {
    let mut seen: HashSet<i64> = existing.iter().copied().collect();
    for workflow in incoming {
        if !seen.insert(workflow.seq) {
            return Err(AppError::Unprocessable(format!(
                "{} workflow seq already exists",
                kind.label()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClinicalApplicationInput, QaInput, SpecificationInput, UserRole, WorkflowInput,
    };
    use crate::services::AuthService;
    use crate::storage::LocalStorage;
    use bytes::Bytes;

    async fn seed_manufacturer(db: &Database, email: &str, country_id: i64) -> Actor {
        let hash = AuthService::hash_password("hunter2secret").unwrap();
        sqlx::query(
            "INSERT INTO users (email, username, password_hash, role, is_verified) VALUES (?, ?, ?, 'manufacturer', 1)",
        )
        .bind(email)
        .bind(email.split('@').next().unwrap())
        .bind(&hash)
        .execute(db.pool())
        .await
        .unwrap();
        let (user_id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO manufacturers (user_id, name, country_id) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(email.split('@').next().unwrap())
            .bind(country_id)
            .execute(db.pool())
            .await
            .unwrap();
        let (manufacturer_id,): (i64,) =
            sqlx::query_as("SELECT id FROM manufacturers WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(db.pool())
                .await
                .unwrap();

        Actor {
            user_id,
            email: email.to_string(),
            role: UserRole::Manufacturer,
            manufacturer_id: Some(manufacturer_id),
        }
    }

    async fn seed_category(db: &Database, kind: CatalogKind, name: &str) -> i64 {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (name) VALUES (?)",
            kind.category_table()
        ))
        .bind(name)
        .execute(db.pool())
        .await
        .unwrap();
        result.last_insert_rowid()
    }

    fn png(field: &str, name: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"png-bytes"),
        }
    }

    fn pdf(field: &str, name: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            filename: name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-fake"),
        }
    }

    fn base_input(name: &str, category_id: i64, published: bool) -> CatalogInput {
        CatalogInput {
            name: Some(name.to_string()),
            description: Some("descriptive text".to_string()),
            category_id: Some(category_id),
            is_published: Some(published),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_full_product() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let actor = seed_manufacturer(&db, "maker@example.com", 1).await;
        let category = seed_category(&db, CatalogKind::Product, "Imaging").await;

        let mut input = base_input("X-Ray Scanner Mk II", category, true);
        input.tags = Some("radiology, imaging,".to_string());
        input.videos = vec!["https://video.example.com/demo".to_string()];
        input.specifications = vec![SpecificationInput {
            name: "Weight".to_string(),
            value: "120kg".to_string(),
        }];
        input.clinical_applications = vec![ClinicalApplicationInput {
            content: "Orthopedic imaging".to_string(),
        }];
        input.workflows = vec![
            WorkflowInput { seq: 1, title: "Position".to_string(), description: "Place the patient".to_string() },
            WorkflowInput { seq: 2, title: "Scan".to_string(), description: "Run the scan".to_string() },
        ];
        input.faqs = vec![QaInput {
            question: "Is it portable?".to_string(),
            answer: "No".to_string(),
        }];
        let files = CatalogFiles {
            thumbnail: Some(png("thumbnail", "front.png")),
            images: vec![png("images", "side.png"), png("images", "back.png")],
            user_manuals: vec![pdf("user_manuals", "manual.pdf")],
        };

        let detail = CatalogService::create(
            &db, &config, &storage, &actor, CatalogKind::Product, input, files,
        )
        .await
        .unwrap();

        assert_eq!(detail.item.slug, "x-ray-scanner-mk-ii");
        assert_eq!(detail.item.tags.len(), 2);
        assert!(detail.item.thumbnail.is_some());
        assert_eq!(detail.item.category.as_ref().map(|c| c.id), Some(category));
        assert_eq!(
            detail.item.manufacturer.as_ref().and_then(|m| m.user.as_ref()).map(|u| u.email.as_str()),
            Some("maker@example.com")
        );
        // Two uploaded images plus the external video
        assert_eq!(detail.media.len(), 3);
        assert_eq!(detail.media.iter().filter(|m| m.media_type == "image").count(), 2);
        assert_eq!(detail.specifications.len(), 1);
        assert_eq!(detail.clinical_applications.len(), 1);
        assert_eq!(detail.workflows.len(), 2);
        assert_eq!(detail.question_answers.len(), 1);
        assert_eq!(detail.user_manuals.len(), 1);
        assert!(detail.user_manuals[0].file.is_some());
    }

    #[tokio::test]
    async fn test_create_validations() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let actor = seed_manufacturer(&db, "maker@example.com", 1).await;
        let category = seed_category(&db, CatalogKind::Product, "Imaging").await;

        // Unknown category
        let err = CatalogService::create(
            &db,
            &config,
            &storage,
            &actor,
            CatalogKind::Product,
            base_input("Scanner", 999, true),
            CatalogFiles::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m == "category_id is not found"));

        // Missing name
        let mut input = base_input("x", category, true);
        input.name = None;
        let err = CatalogService::create(
            &db, &config, &storage, &actor, CatalogKind::Product, input, CatalogFiles::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_, _)));

        // Duplicate workflow seq within the request
        let mut input = base_input("Scanner", category, true);
        input.workflows = vec![
            WorkflowInput { seq: 1, title: "A".to_string(), description: "a".to_string() },
            WorkflowInput { seq: 1, title: "B".to_string(), description: "b".to_string() },
        ];
        let err = CatalogService::create(
            &db, &config, &storage, &actor, CatalogKind::Product, input, CatalogFiles::default(),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, AppError::Unprocessable(ref m) if m == "product workflow seq already exists")
        );

        // A user without a manufacturer row cannot create
        sqlx::query("INSERT INTO users (email, username, password_hash, role, is_verified) VALUES ('bare@example.com', 'bare', 'x', 'manufacturer', 1)")
            .execute(db.pool())
            .await
            .unwrap();
        let (bare_id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE email = 'bare@example.com'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let bare = Actor {
            user_id: bare_id,
            email: "bare@example.com".to_string(),
            role: UserRole::Manufacturer,
            manufacturer_id: None,
        };
        let err = CatalogService::create(
            &db,
            &config,
            &storage,
            &bare,
            CatalogKind::Product,
            base_input("Scanner", category, true),
            CatalogFiles::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m == "manufacturer_id is not found"));
    }

    #[tokio::test]
    async fn test_list_scope_and_filters() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let indonesia = seed_manufacturer(&db, "jakarta@example.com", 1).await;
        let malaysia = seed_manufacturer(&db, "kuala@example.com", 2).await;
        let category = seed_category(&db, CatalogKind::Product, "Imaging").await;

        for (actor, name, published) in [
            (&indonesia, "Scanner published", true),
            (&indonesia, "Scanner draft", false),
            (&malaysia, "Analyzer published", true),
        ] {
            CatalogService::create(
                &db,
                &config,
                &storage,
                actor,
                CatalogKind::Product,
                base_input(name, category, published),
                CatalogFiles::default(),
            )
            .await
            .unwrap();
        }

        // Anonymous readers see published rows only
        let public = CatalogService::list(&db, None, CatalogKind::Product, CatalogListQuery::default())
            .await
            .unwrap();
        assert_eq!(public.meta.total, 2);

        // A keyword cannot leak a draft past the visibility scope
        let probed = CatalogService::list(
            &db,
            None,
            CatalogKind::Product,
            CatalogListQuery {
                keyword: Some("draft".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(probed.meta.total, 0);

        // Owners see their own rows, drafts included, and nothing else
        let own = CatalogService::list(
            &db,
            Some(&indonesia),
            CatalogKind::Product,
            CatalogListQuery::default(),
        )
        .await
        .unwrap();
        assert_eq!(own.meta.total, 2);
        assert!(own.data.iter().all(|p| p.name.starts_with("Scanner")));

        // Country filter resolves through the owning manufacturer
        let by_country = CatalogService::list(
            &db,
            None,
            CatalogKind::Product,
            CatalogListQuery {
                country_ids: Some("2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_country.meta.total, 1);
        assert_eq!(by_country.data[0].name, "Analyzer published");

        let sorted = CatalogService::list(
            &db,
            None,
            CatalogKind::Product,
            CatalogListQuery {
                sort: Some("name".to_string()),
                order: Some("desc".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(sorted.data[0].name, "Scanner published");
    }

    #[tokio::test]
    async fn test_get_visibility() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let owner = seed_manufacturer(&db, "owner@example.com", 1).await;
        let rival = seed_manufacturer(&db, "rival@example.com", 1).await;
        let category = seed_category(&db, CatalogKind::Service, "Calibration").await;

        let draft = CatalogService::create(
            &db,
            &config,
            &storage,
            &owner,
            CatalogKind::Service,
            base_input("Calibration visit", category, false),
            CatalogFiles::default(),
        )
        .await
        .unwrap();

        assert!(CatalogService::get(&db, Some(&owner), CatalogKind::Service, "calibration-visit")
            .await
            .is_ok());
        let err = CatalogService::get(&db, Some(&rival), CatalogKind::Service, "calibration-visit")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = CatalogService::get(&db, None, CatalogKind::Service, &draft.item.id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = CatalogService::get(&db, None, CatalogKind::Service, "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "service is not found"));
    }

    #[tokio::test]
    async fn test_update_partial_fields_and_tags() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let actor = seed_manufacturer(&db, "maker@example.com", 1).await;
        let category = seed_category(&db, CatalogKind::Product, "Imaging").await;

        let mut input = base_input("Scanner", category, false);
        input.tags = Some("alpha,beta".to_string());
        let created = CatalogService::create(
            &db,
            &config,
            &storage,
            &actor,
            CatalogKind::Product,
            input,
            CatalogFiles {
                thumbnail: Some(png("thumbnail", "one.png")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let first_thumb = created.item.thumbnail.clone().unwrap();

        // Rename: slug stays, tags stay when the field is omitted
        let renamed = CatalogService::update(
            &db,
            &config,
            &storage,
            &actor,
            CatalogKind::Product,
            &created.item.id.to_string(),
            CatalogInput {
                name: Some("Scanner Pro".to_string()),
                is_published: Some(true),
                ..Default::default()
            },
            CatalogFiles::default(),
        )
        .await
        .unwrap();
        assert_eq!(renamed.item.name, "Scanner Pro");
        assert_eq!(renamed.item.slug, "scanner");
        assert!(renamed.item.is_published);
        assert_eq!(renamed.item.tags.len(), 2);

        // Tag resync and thumbnail replace in place
        let retagged = CatalogService::update(
            &db,
            &config,
            &storage,
            &actor,
            CatalogKind::Product,
            "scanner",
            CatalogInput {
                tags: Some("gamma".to_string()),
                ..Default::default()
            },
            CatalogFiles {
                thumbnail: Some(png("thumbnail", "two.png")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(retagged.item.tags.len(), 1);
        assert_eq!(retagged.item.tags[0].name, "gamma");
        let second_thumb = retagged.item.thumbnail.clone().unwrap();
        assert_eq!(second_thumb.id, first_thumb.id);
        assert_ne!(second_thumb.url, first_thumb.url);

        // A rival manufacturer cannot update someone else's row
        let rival = seed_manufacturer(&db, "rival@example.com", 1).await;
        let err = CatalogService::update(
            &db,
            &config,
            &storage,
            &rival,
            CatalogKind::Product,
            "scanner",
            CatalogInput::default(),
            CatalogFiles::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_destroy_cleans_attachments() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let actor = seed_manufacturer(&db, "maker@example.com", 1).await;
        let category = seed_category(&db, CatalogKind::Product, "Imaging").await;

        let detail = CatalogService::create(
            &db,
            &config,
            &storage,
            &actor,
            CatalogKind::Product,
            base_input("Scanner", category, true),
            CatalogFiles {
                thumbnail: Some(png("thumbnail", "front.png")),
                images: vec![png("images", "side.png")],
                user_manuals: vec![pdf("user_manuals", "manual.pdf")],
            },
        )
        .await
        .unwrap();
        let thumb_key = uploads::object_key(&detail.item.thumbnail.as_ref().unwrap().url)
            .unwrap()
            .to_string();
        let image_key = detail
            .media
            .iter()
            .find(|m| m.media_type == "image")
            .unwrap()
            .name
            .clone();
        let manual_url = detail.user_manuals[0].file.as_ref().unwrap().url.clone();
        let manual_key = uploads::object_key(&manual_url).unwrap().to_string();

        let done = CatalogService::destroy(
            &db,
            &storage,
            &actor,
            CatalogKind::Product,
            &detail.item.id.to_string(),
        )
        .await
        .unwrap();
        assert_eq!(done.message, "SUCCESS: product deleted");

        assert!(!storage.exists(&thumb_key).await.unwrap());
        assert!(!storage.exists(&image_key).await.unwrap());
        assert!(!storage.exists(&manual_key).await.unwrap());
        let (media_left,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_media WHERE product_id = ?")
                .bind(detail.item.id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(media_left, 0);
        let (files_left,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM file_uploads")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(files_left, 0);
    }
}
