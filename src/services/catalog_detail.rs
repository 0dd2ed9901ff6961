use crate::access::{self, Action, EntityKind};
use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, MessageResponse, Result};
use crate::models::{
    Actor, CatalogItem, CatalogKind, ClinicalApplication, ClinicalApplicationInput, Media,
    MediaInput, MediaKind, Qa, QaInput, Specification, SpecificationInput, UserManual,
    UserManualResponse, Workflow, WorkflowInput, WorkflowUpdate,
};
use crate::pagination::{page_params, Page};
use crate::services::CatalogService;
use crate::storage::StorageProvider;
use crate::uploads::{self, catalog_manual, catalog_media, UploadedFile};

/// Child collections of a product or service. Every operation resolves
/// the parent first and runs the policy check against it, so a child is
/// only as visible as the row it hangs off.
pub struct CatalogDetailService;

impl CatalogDetailService {
    fn entity(kind: CatalogKind) -> EntityKind {
        match kind {
            CatalogKind::Product => EntityKind::ProductChild,
            CatalogKind::Service => EntityKind::ServiceChild,
        }
    }

    async fn parent(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        id_or_slug: &str,
        action: Action,
    ) -> Result<CatalogItem> {
        let item = CatalogService::find_by_id_or_slug(db, kind, id_or_slug).await?;
        let target = CatalogService::target(db, &item).await?;
        access::authorize(actor, Self::entity(kind), action, Some(&target))?;
        Ok(item)
    }

    fn base_path(kind: CatalogKind, id_or_slug: &str, segment: &str) -> String {
        format!("{}/{}/{}", kind.base_path(), id_or_slug, segment)
    }

    async fn child_page<T>(
        db: &Database,
        kind: CatalogKind,
        table_suffix: &str,
        item_id: i64,
        page: Option<u64>,
        limit: Option<u64>,
        base_path: String,
    ) -> Result<Page<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
    {
        let prefix = kind.prefix();
        let (page, per_page, offset) = page_params(page, limit);
        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {prefix}_{table_suffix} WHERE {prefix}_id = ?"
        ))
        .bind(item_id)
        .fetch_one(db.pool())
        .await?;
        let order = if table_suffix == "workflows" { "seq" } else { "id" };
        let rows: Vec<T> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_{table_suffix} WHERE {prefix}_id = ? ORDER BY {order} LIMIT ? OFFSET ?"
        ))
        .bind(item_id)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(db.pool())
        .await?;
        Ok(Page::new(rows, total, page, per_page, &base_path))
    }

    fn child_not_found(kind: CatalogKind, child: &str) -> AppError {
        AppError::NotFound(format!("{} {child} is not found", kind.label()))
    }

    fn require_text<'a>(value: &'a str, name: &str) -> Result<&'a str> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::field(name, &format!("{name} is required")));
        }
        Ok(value)
    }

    // ---- media ----

    pub async fn media_list(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        id_or_slug: &str,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<Media>> {
        let item = Self::parent(db, actor, kind, id_or_slug, Action::ViewList).await?;
        Self::child_page(
            db,
            kind,
            "media",
            item.id,
            page,
            limit,
            Self::base_path(kind, id_or_slug, "media"),
        )
        .await
    }

    pub async fn media_store(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        input: MediaInput,
        image: Option<UploadedFile>,
    ) -> Result<Media> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Create).await?;

        let media_type = MediaKind::from_str(&input.media_type)
            .ok_or_else(|| AppError::field("type", "type must be one of: image, video, 3d"))?;

        let (name, url) = match media_type {
            MediaKind::Image => {
                let image = image.as_ref().ok_or_else(|| {
                    AppError::Unprocessable(
                        "\"image\" field is required when type is \"image\"".to_string(),
                    )
                })?;
                let stored =
                    uploads::store(storage, config.public_base_url(), catalog_media(kind), image)
                        .await?;
                (stored.key, stored.url)
            }
            MediaKind::Video | MediaKind::ThreeD => {
                let url = input
                    .url
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| {
                        AppError::Unprocessable(
                            "\"url\" field is required when type is \"video\" or \"3d\""
                                .to_string(),
                        )
                    })?;
                let name = input
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        AppError::Unprocessable(
                            "\"name\" field is required when type is \"video\" or \"3d\""
                                .to_string(),
                        )
                    })?;
                (name.to_string(), url.to_string())
            }
        };

        let prefix = kind.prefix();
        let result = sqlx::query(&format!(
            "INSERT INTO {prefix}_media ({prefix}_id, name, url, media_type) VALUES (?, ?, ?, ?)"
        ))
        .bind(item.id)
        .bind(&name)
        .bind(&url)
        .bind(media_type.as_str())
        .execute(db.pool())
        .await?;

        Self::media_row(db, kind, item.id, result.last_insert_rowid()).await
    }

    pub async fn media_destroy(
        db: &Database,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        media_id: i64,
    ) -> Result<MessageResponse> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Delete).await?;
        let media = Self::media_row(db, kind, item.id, media_id).await?;

        // Image rows carry their object key in `name`
        if media.media_type == MediaKind::Image.as_str() {
            storage.delete(&media.name).await?;
        }
        let prefix = kind.prefix();
        sqlx::query(&format!("DELETE FROM {prefix}_media WHERE id = ?"))
            .bind(media.id)
            .execute(db.pool())
            .await?;

        Ok(MessageResponse::deleted(&format!("{} media", kind.label())))
    }

    async fn media_row(
        db: &Database,
        kind: CatalogKind,
        item_id: i64,
        media_id: i64,
    ) -> Result<Media> {
        let prefix = kind.prefix();
        let row: Option<Media> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_media WHERE id = ? AND {prefix}_id = ?"
        ))
        .bind(media_id)
        .bind(item_id)
        .fetch_optional(db.pool())
        .await?;
        row.ok_or_else(|| Self::child_not_found(kind, "media"))
    }

    // ---- specifications ----

    pub async fn specification_list(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        id_or_slug: &str,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<Specification>> {
        let item = Self::parent(db, actor, kind, id_or_slug, Action::ViewList).await?;
        Self::child_page(
            db,
            kind,
            "specifications",
            item.id,
            page,
            limit,
            Self::base_path(kind, id_or_slug, "specifications"),
        )
        .await
    }

    pub async fn specification_store(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        input: SpecificationInput,
    ) -> Result<Specification> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Create).await?;
        let name = Self::require_text(&input.name, "name")?;
        let value = Self::require_text(&input.value, "value")?;

        let prefix = kind.prefix();
        let result = sqlx::query(&format!(
            "INSERT INTO {prefix}_specifications ({prefix}_id, name, value) VALUES (?, ?, ?)"
        ))
        .bind(item.id)
        .bind(name)
        .bind(value)
        .execute(db.pool())
        .await?;
        Self::specification_row(db, kind, item.id, result.last_insert_rowid()).await
    }

    pub async fn specification_update(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        spec_id: i64,
        input: SpecificationInput,
    ) -> Result<Specification> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Update).await?;
        let row = Self::specification_row(db, kind, item.id, spec_id).await?;
        let name = Self::require_text(&input.name, "name")?;
        let value = Self::require_text(&input.value, "value")?;

        let prefix = kind.prefix();
        sqlx::query(&format!(
            "UPDATE {prefix}_specifications SET name = ?, value = ?, updated_at = datetime('now') WHERE id = ?"
        ))
        .bind(name)
        .bind(value)
        .bind(row.id)
        .execute(db.pool())
        .await?;
        Self::specification_row(db, kind, item.id, row.id).await
    }

    pub async fn specification_destroy(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        spec_id: i64,
    ) -> Result<MessageResponse> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Delete).await?;
        let row = Self::specification_row(db, kind, item.id, spec_id).await?;

        let prefix = kind.prefix();
        sqlx::query(&format!("DELETE FROM {prefix}_specifications WHERE id = ?"))
            .bind(row.id)
            .execute(db.pool())
            .await?;
        Ok(MessageResponse::deleted(&format!(
            "{} specification",
            kind.label()
        )))
    }

    async fn specification_row(
        db: &Database,
        kind: CatalogKind,
        item_id: i64,
        spec_id: i64,
    ) -> Result<Specification> {
        let prefix = kind.prefix();
        let row: Option<Specification> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_specifications WHERE id = ? AND {prefix}_id = ?"
        ))
        .bind(spec_id)
        .bind(item_id)
        .fetch_optional(db.pool())
        .await?;
        row.ok_or_else(|| Self::child_not_found(kind, "specification"))
    }

    // ---- clinical applications ----

    pub async fn clinical_application_list(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        id_or_slug: &str,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<ClinicalApplication>> {
        let item = Self::parent(db, actor, kind, id_or_slug, Action::ViewList).await?;
        Self::child_page(
            db,
            kind,
            "clinical_applications",
            item.id,
            page,
            limit,
            Self::base_path(kind, id_or_slug, "clinical-applications"),
        )
        .await
    }

    pub async fn clinical_application_store(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        input: ClinicalApplicationInput,
    ) -> Result<ClinicalApplication> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Create).await?;
        let content = Self::require_text(&input.content, "content")?;

        let prefix = kind.prefix();
        let result = sqlx::query(&format!(
            "INSERT INTO {prefix}_clinical_applications ({prefix}_id, content) VALUES (?, ?)"
        ))
        .bind(item.id)
        .bind(content)
        .execute(db.pool())
        .await?;
        Self::clinical_application_row(db, kind, item.id, result.last_insert_rowid()).await
    }

    pub async fn clinical_application_update(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        application_id: i64,
        input: ClinicalApplicationInput,
    ) -> Result<ClinicalApplication> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Update).await?;
        let row = Self::clinical_application_row(db, kind, item.id, application_id).await?;
        let content = Self::require_text(&input.content, "content")?;

        let prefix = kind.prefix();
        sqlx::query(&format!(
            "UPDATE {prefix}_clinical_applications SET content = ?, updated_at = datetime('now') WHERE id = ?"
        ))
        .bind(content)
        .bind(row.id)
        .execute(db.pool())
        .await?;
        Self::clinical_application_row(db, kind, item.id, row.id).await
    }

    pub async fn clinical_application_destroy(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        application_id: i64,
    ) -> Result<MessageResponse> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Delete).await?;
        let row = Self::clinical_application_row(db, kind, item.id, application_id).await?;

        let prefix = kind.prefix();
        sqlx::query(&format!(
            "DELETE FROM {prefix}_clinical_applications WHERE id = ?"
        ))
        .bind(row.id)
        .execute(db.pool())
        .await?;
        Ok(MessageResponse::deleted(&format!(
            "{} clinical application",
            kind.label()
        )))
    }

    async fn clinical_application_row(
        db: &Database,
        kind: CatalogKind,
        item_id: i64,
        application_id: i64,
    ) -> Result<ClinicalApplication> {
        let prefix = kind.prefix();
        let row: Option<ClinicalApplication> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_clinical_applications WHERE id = ? AND {prefix}_id = ?"
        ))
        .bind(application_id)
        .bind(item_id)
        .fetch_optional(db.pool())
        .await?;
        row.ok_or_else(|| Self::child_not_found(kind, "clinical application"))
    }

    // ---- workflows ----

    pub async fn workflow_list(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        id_or_slug: &str,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<Workflow>> {
        let item = Self::parent(db, actor, kind, id_or_slug, Action::ViewList).await?;
        Self::child_page(
            db,
            kind,
            "workflows",
            item.id,
            page,
            limit,
            Self::base_path(kind, id_or_slug, "workflows"),
        )
        .await
    }

    pub async fn workflow_store(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        input: WorkflowInput,
    ) -> Result<Workflow> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Create).await?;
        let title = Self::require_text(&input.title, "title")?;
        let description = Self::require_text(&input.description, "description")?;
        Self::ensure_free_seq(db, kind, item.id, input.seq).await?;

        let prefix = kind.prefix();
        let result = sqlx::query(&format!(
            "INSERT INTO {prefix}_workflows ({prefix}_id, seq, title, description) VALUES (?, ?, ?, ?)"
        ))
        .bind(item.id)
        .bind(input.seq)
        .bind(title)
        .bind(description)
        .execute(db.pool())
        .await?;
        Self::workflow_row(db, kind, item.id, result.last_insert_rowid()).await
    }

    pub async fn workflow_update(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        workflow_id: i64,
        input: WorkflowUpdate,
    ) -> Result<Workflow> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Update).await?;
        let row = Self::workflow_row(db, kind, item.id, workflow_id).await?;

        // Only a changed seq is checked, a row may keep its own
        let seq = input.seq.unwrap_or(row.seq);
        if seq != row.seq {
            Self::ensure_free_seq(db, kind, item.id, seq).await?;
        }

        let prefix = kind.prefix();
        sqlx::query(&format!(
            "UPDATE {prefix}_workflows SET seq = ?, title = ?, description = ?, updated_at = datetime('now') WHERE id = ?"
        ))
        .bind(seq)
        .bind(input.title.as_deref().unwrap_or(&row.title))
        .bind(input.description.as_deref().unwrap_or(&row.description))
        .bind(row.id)
        .execute(db.pool())
        .await?;
        Self::workflow_row(db, kind, item.id, row.id).await
    }

    pub async fn workflow_destroy(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        workflow_id: i64,
    ) -> Result<MessageResponse> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Delete).await?;
        let row = Self::workflow_row(db, kind, item.id, workflow_id).await?;

        let prefix = kind.prefix();
        sqlx::query(&format!("DELETE FROM {prefix}_workflows WHERE id = ?"))
            .bind(row.id)
            .execute(db.pool())
            .await?;
        Ok(MessageResponse::deleted(&format!("{} workflow", kind.label())))
    }

    async fn ensure_free_seq(
        db: &Database,
        kind: CatalogKind,
        item_id: i64,
        seq: i64,
    ) -> Result<()> {
        let prefix = kind.prefix();
        let taken: Option<(i64,)> = sqlx::query_as(&format!(
            "SELECT id FROM {prefix}_workflows WHERE {prefix}_id = ? AND seq = ?"
        ))
        .bind(item_id)
        .bind(seq)
        .fetch_optional(db.pool())
        .await?;
        if taken.is_some() {
            return Err(AppError::Unprocessable(format!(
                "{} workflow seq already exists",
                kind.label()
            )));
        }
        Ok(())
    }

    async fn workflow_row(
        db: &Database,
        kind: CatalogKind,
        item_id: i64,
        workflow_id: i64,
    ) -> Result<Workflow> {
        let prefix = kind.prefix();
        let row: Option<Workflow> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_workflows WHERE id = ? AND {prefix}_id = ?"
        ))
        .bind(workflow_id)
        .bind(item_id)
        .fetch_optional(db.pool())
        .await?;
        row.ok_or_else(|| Self::child_not_found(kind, "workflow"))
    }

    // ---- question answers ----

    pub async fn qa_list(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        id_or_slug: &str,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<Qa>> {
        let item = Self::parent(db, actor, kind, id_or_slug, Action::ViewList).await?;
        Self::child_page(
            db,
            kind,
            "qas",
            item.id,
            page,
            limit,
            Self::base_path(kind, id_or_slug, "question-answers"),
        )
        .await
    }

    pub async fn qa_store(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        input: QaInput,
    ) -> Result<Qa> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Create).await?;
        let question = Self::require_text(&input.question, "question")?;
        let answer = Self::require_text(&input.answer, "answer")?;

        let prefix = kind.prefix();
        let result = sqlx::query(&format!(
            "INSERT INTO {prefix}_qas ({prefix}_id, question, answer) VALUES (?, ?, ?)"
        ))
        .bind(item.id)
        .bind(question)
        .bind(answer)
        .execute(db.pool())
        .await?;
        Self::qa_row(db, kind, item.id, result.last_insert_rowid()).await
    }

    pub async fn qa_update(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        qa_id: i64,
        input: QaInput,
    ) -> Result<Qa> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Update).await?;
        let row = Self::qa_row(db, kind, item.id, qa_id).await?;
        let question = Self::require_text(&input.question, "question")?;
        let answer = Self::require_text(&input.answer, "answer")?;

        let prefix = kind.prefix();
        sqlx::query(&format!(
            "UPDATE {prefix}_qas SET question = ?, answer = ?, updated_at = datetime('now') WHERE id = ?"
        ))
        .bind(question)
        .bind(answer)
        .bind(row.id)
        .execute(db.pool())
        .await?;
        Self::qa_row(db, kind, item.id, row.id).await
    }

    pub async fn qa_destroy(
        db: &Database,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        qa_id: i64,
    ) -> Result<MessageResponse> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Delete).await?;
        let row = Self::qa_row(db, kind, item.id, qa_id).await?;

        let prefix = kind.prefix();
        sqlx::query(&format!("DELETE FROM {prefix}_qas WHERE id = ?"))
            .bind(row.id)
            .execute(db.pool())
            .await?;
        Ok(MessageResponse::deleted(&format!(
            "{} question answer",
            kind.label()
        )))
    }

    async fn qa_row(db: &Database, kind: CatalogKind, item_id: i64, qa_id: i64) -> Result<Qa> {
        let prefix = kind.prefix();
        let row: Option<Qa> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_qas WHERE id = ? AND {prefix}_id = ?"
        ))
        .bind(qa_id)
        .bind(item_id)
        .fetch_optional(db.pool())
        .await?;
        row.ok_or_else(|| Self::child_not_found(kind, "question answer"))
    }

    // ---- user manuals ----

    pub async fn manual_list(
        db: &Database,
        actor: Option<&Actor>,
        kind: CatalogKind,
        id_or_slug: &str,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<UserManualResponse>> {
        let item = Self::parent(db, actor, kind, id_or_slug, Action::ViewList).await?;
        let page: Page<UserManual> = Self::child_page(
            db,
            kind,
            "user_manuals",
            item.id,
            page,
            limit,
            Self::base_path(kind, id_or_slug, "user-manuals"),
        )
        .await?;

        let mut data = Vec::with_capacity(page.data.len());
        for row in page.data {
            data.push(UserManualResponse {
                id: row.id,
                file: uploads::load_file(db, row.file_id).await?,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }
        Ok(Page { meta: page.meta, data })
    }

    pub async fn manual_store(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        file: Option<UploadedFile>,
    ) -> Result<UserManualResponse> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Create).await?;
        let file = file
            .as_ref()
            .ok_or_else(|| AppError::field("file", "file is required"))?;

        let stored =
            uploads::store(storage, config.public_base_url(), catalog_manual(kind), file).await?;
        let mut tx = db.pool().begin().await?;
        let file_id = uploads::attach(&mut tx, &stored).await?;
        let prefix = kind.prefix();
        let result = sqlx::query(&format!(
            "INSERT INTO {prefix}_user_manuals ({prefix}_id, file_id) VALUES (?, ?)"
        ))
        .bind(item.id)
        .bind(file_id)
        .execute(&mut *tx)
        .await?;
        let manual_id = result.last_insert_rowid();
        tx.commit().await?;

        let row = Self::manual_row(db, kind, item.id, manual_id).await?;
        Ok(UserManualResponse {
            id: row.id,
            file: uploads::load_file(db, row.file_id).await?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    pub async fn manual_destroy(
        db: &Database,
        storage: &dyn StorageProvider,
        actor: &Actor,
        kind: CatalogKind,
        id_or_slug: &str,
        manual_id: i64,
    ) -> Result<MessageResponse> {
        let item = Self::parent(db, Some(actor), kind, id_or_slug, Action::Delete).await?;
        let row = Self::manual_row(db, kind, item.id, manual_id).await?;

        let prefix = kind.prefix();
        sqlx::query(&format!("DELETE FROM {prefix}_user_manuals WHERE id = ?"))
            .bind(row.id)
            .execute(db.pool())
            .await?;
        if let Some(file_id) = row.file_id {
            uploads::remove(db, storage, file_id).await?;
        }

        Ok(MessageResponse::deleted(&format!(
            "{} user manual",
            kind.label()
        )))
    }

    async fn manual_row(
        db: &Database,
        kind: CatalogKind,
        item_id: i64,
        manual_id: i64,
    ) -> Result<UserManual> {
        let prefix = kind.prefix();
        let row: Option<UserManual> = sqlx::query_as(&format!(
            "SELECT * FROM {prefix}_user_manuals WHERE id = ? AND {prefix}_id = ?"
        ))
        .bind(manual_id)
        .bind(item_id)
        .fetch_optional(db.pool())
        .await?;
        row.ok_or_else(|| Self::child_not_found(kind, "user manual"))
    }
}
