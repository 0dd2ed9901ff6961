use sqlx::{QueryBuilder, Sqlite};

use crate::access::{self, Action, EntityKind, Target, Visibility};
use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, MessageResponse, Result};
use crate::models::{
    Actor, ArticleInput, GovAffair, GovAffairResponse, News, NewsResponse,
};
use crate::pagination::{page_params, Page};
use crate::services::lookup::country_row;
use crate::slug::unique_slug;
use crate::storage::StorageProvider;
use crate::uploads::{self, AttachmentKind, UploadedFile, GOV_AFFAIR_IMAGE, NEWS_IMAGE};

/// News and government affair articles. Admin-written platform
/// content; gov affairs are the same article shape pinned to a
/// country.
pub struct ContentService;

impl ContentService {
    pub async fn news_list(
        db: &Database,
        actor: Option<&Actor>,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<NewsResponse>> {
        let scope = Visibility::platform_content(actor);
        let (page, per_page, offset) = page_params(page, limit);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM news WHERE 1 = 1");
        scope.push_predicate(&mut count, "id");
        let (total,): (i64,) = count.build_query_as().fetch_one(db.pool()).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM news WHERE 1 = 1");
        scope.push_predicate(&mut select, "id");
        select.push(" ORDER BY id DESC LIMIT ");
        select.push_bind(per_page as i64);
        select.push(" OFFSET ");
        select.push_bind(offset);
        let rows: Vec<News> = select.build_query_as().fetch_all(db.pool()).await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            data.push(Self::news_response(db, row).await?);
        }
        Ok(Page::new(data, total, page, per_page, "/news"))
    }

    pub async fn news_get(
        db: &Database,
        actor: Option<&Actor>,
        id_or_slug: &str,
    ) -> Result<NewsResponse> {
        let news = Self::find_news(db, id_or_slug).await?;
        access::authorize(
            actor,
            EntityKind::News,
            Action::View,
            Some(&Target::published(news.is_published)),
        )?;
        Self::news_response(db, news).await
    }

    pub async fn news_create(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        input: ArticleInput,
        image: Option<UploadedFile>,
    ) -> Result<NewsResponse> {
        access::authorize(Some(actor), EntityKind::News, Action::Create, None)?;
        let title = require_field(&input.title, "title")?;
        let content = require_field(&input.content, "content")?;

        let slug = unique_slug(db, "news", title, None).await?;
        let image_id = Self::store_image(db, config, storage, &NEWS_IMAGE, &image, None).await?;

        let result = sqlx::query(
            "INSERT INTO news (title, slug, content, is_published, image_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(&slug)
        .bind(content)
        .bind(input.is_published.unwrap_or(false))
        .bind(image_id)
        .execute(db.pool())
        .await?;

        let news = Self::find_news(db, &result.last_insert_rowid().to_string()).await?;
        Self::news_response(db, news).await
    }

    pub async fn news_update(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        id_or_slug: &str,
        input: ArticleInput,
        image: Option<UploadedFile>,
    ) -> Result<NewsResponse> {
        let news = Self::find_news(db, id_or_slug).await?;
        access::authorize(Some(actor), EntityKind::News, Action::Update, None)?;

        let image_id =
            Self::store_image(db, config, storage, &NEWS_IMAGE, &image, news.image_id).await?;

        sqlx::query(
            "UPDATE news SET title = ?, content = ?, is_published = ?, image_id = ?, \
             updated_at = datetime('now') WHERE id = ?",
        )
        .bind(input.title.as_deref().unwrap_or(&news.title))
        .bind(input.content.as_deref().unwrap_or(&news.content))
        .bind(input.is_published.unwrap_or(news.is_published))
        .bind(image_id)
        .bind(news.id)
        .execute(db.pool())
        .await?;

        let news = Self::find_news(db, &news.id.to_string()).await?;
        Self::news_response(db, news).await
    }

    pub async fn news_destroy(
        db: &Database,
        storage: &dyn StorageProvider,
        actor: &Actor,
        id_or_slug: &str,
    ) -> Result<MessageResponse> {
        let news = Self::find_news(db, id_or_slug).await?;
        access::authorize(Some(actor), EntityKind::News, Action::Delete, None)?;

        sqlx::query("DELETE FROM news WHERE id = ?")
            .bind(news.id)
            .execute(db.pool())
            .await?;
        if let Some(image_id) = news.image_id {
            uploads::remove(db, storage, image_id).await?;
        }
        Ok(MessageResponse::deleted("news"))
    }

    pub async fn gov_affair_list(
        db: &Database,
        actor: Option<&Actor>,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Page<GovAffairResponse>> {
        let scope = Visibility::platform_content(actor);
        let (page, per_page, offset) = page_params(page, limit);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM gov_affairs WHERE 1 = 1");
        scope.push_predicate(&mut count, "id");
        let (total,): (i64,) = count.build_query_as().fetch_one(db.pool()).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM gov_affairs WHERE 1 = 1");
        scope.push_predicate(&mut select, "id");
        select.push(" ORDER BY id DESC LIMIT ");
        select.push_bind(per_page as i64);
        select.push(" OFFSET ");
        select.push_bind(offset);
        let rows: Vec<GovAffair> = select.build_query_as().fetch_all(db.pool()).await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            data.push(Self::gov_affair_response(db, row).await?);
        }
        Ok(Page::new(data, total, page, per_page, "/gov-affairs"))
    }

    pub async fn gov_affair_get(
        db: &Database,
        actor: Option<&Actor>,
        id_or_slug: &str,
    ) -> Result<GovAffairResponse> {
        let affair = Self::find_gov_affair(db, id_or_slug).await?;
        access::authorize(
            actor,
            EntityKind::GovAffair,
            Action::View,
            Some(&Target::published(affair.is_published)),
        )?;
        Self::gov_affair_response(db, affair).await
    }

    pub async fn gov_affair_create(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        input: ArticleInput,
        image: Option<UploadedFile>,
    ) -> Result<GovAffairResponse> {
        access::authorize(Some(actor), EntityKind::GovAffair, Action::Create, None)?;
        let title = require_field(&input.title, "title")?;
        let content = require_field(&input.content, "content")?;
        let country = country_row(db, input.country_id)
            .await?
            .ok_or_else(|| AppError::Unprocessable("country is not found".to_string()))?;

        let slug = unique_slug(db, "gov_affairs", title, None).await?;
        let image_id =
            Self::store_image(db, config, storage, &GOV_AFFAIR_IMAGE, &image, None).await?;

        let result = sqlx::query(
            "INSERT INTO gov_affairs (title, slug, content, is_published, country_id, image_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(&slug)
        .bind(content)
        .bind(input.is_published.unwrap_or(false))
        .bind(country.id)
        .bind(image_id)
        .execute(db.pool())
        .await?;

        let affair = Self::find_gov_affair(db, &result.last_insert_rowid().to_string()).await?;
        Self::gov_affair_response(db, affair).await
    }

    pub async fn gov_affair_update(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        id_or_slug: &str,
        input: ArticleInput,
        image: Option<UploadedFile>,
    ) -> Result<GovAffairResponse> {
        let affair = Self::find_gov_affair(db, id_or_slug).await?;
        access::authorize(Some(actor), EntityKind::GovAffair, Action::Update, None)?;

        let country_id = match input.country_id {
            Some(id) => {
                let country = country_row(db, Some(id))
                    .await?
                    .ok_or_else(|| AppError::Unprocessable("country is not found".to_string()))?;
                Some(country.id)
            }
            None => affair.country_id,
        };
        let image_id =
            Self::store_image(db, config, storage, &GOV_AFFAIR_IMAGE, &image, affair.image_id)
                .await?;

        sqlx::query(
            "UPDATE gov_affairs SET title = ?, content = ?, is_published = ?, country_id = ?, \
             image_id = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(input.title.as_deref().unwrap_or(&affair.title))
        .bind(input.content.as_deref().unwrap_or(&affair.content))
        .bind(input.is_published.unwrap_or(affair.is_published))
        .bind(country_id)
        .bind(image_id)
        .bind(affair.id)
        .execute(db.pool())
        .await?;

        let affair = Self::find_gov_affair(db, &affair.id.to_string()).await?;
        Self::gov_affair_response(db, affair).await
    }

    pub async fn gov_affair_destroy(
        db: &Database,
        storage: &dyn StorageProvider,
        actor: &Actor,
        id_or_slug: &str,
    ) -> Result<MessageResponse> {
        let affair = Self::find_gov_affair(db, id_or_slug).await?;
        access::authorize(Some(actor), EntityKind::GovAffair, Action::Delete, None)?;

        sqlx::query("DELETE FROM gov_affairs WHERE id = ?")
            .bind(affair.id)
            .execute(db.pool())
            .await?;
        if let Some(image_id) = affair.image_id {
            uploads::remove(db, storage, image_id).await?;
        }
        Ok(MessageResponse::deleted("gov affair"))
    }

    /// Stores the incoming image into the row's slot. None leaves the
    /// slot untouched.
    async fn store_image(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        kind: &AttachmentKind,
        image: &Option<UploadedFile>,
        existing: Option<i64>,
    ) -> Result<Option<i64>> {
        let Some(file) = image else {
            return Ok(existing);
        };
        let stored = uploads::store(storage, config.public_base_url(), kind, file).await?;
        let mut tx = db.pool().begin().await?;
        let id = uploads::replace(&mut tx, storage, existing, &stored).await?;
        tx.commit().await?;
        Ok(Some(id))
    }

    async fn find_news(db: &Database, id_or_slug: &str) -> Result<News> {
        let id: i64 = id_or_slug.parse().unwrap_or(-1);
        let row: Option<News> = sqlx::query_as("SELECT * FROM news WHERE id = ? OR slug = ?")
            .bind(id)
            .bind(id_or_slug)
            .fetch_optional(db.pool())
            .await?;
        row.ok_or_else(|| AppError::NotFound("news is not found".to_string()))
    }

    async fn find_gov_affair(db: &Database, id_or_slug: &str) -> Result<GovAffair> {
        let id: i64 = id_or_slug.parse().unwrap_or(-1);
        let row: Option<GovAffair> =
            sqlx::query_as("SELECT * FROM gov_affairs WHERE id = ? OR slug = ?")
                .bind(id)
                .bind(id_or_slug)
                .fetch_optional(db.pool())
                .await?;
        row.ok_or_else(|| AppError::NotFound("gov affair is not found".to_string()))
    }

    async fn news_response(db: &Database, news: News) -> Result<NewsResponse> {
        Ok(NewsResponse {
            id: news.id,
            title: news.title,
            slug: news.slug,
            content: news.content,
            is_published: news.is_published,
            image: uploads::load_file(db, news.image_id).await?,
            created_at: news.created_at,
            updated_at: news.updated_at,
        })
    }

    async fn gov_affair_response(db: &Database, affair: GovAffair) -> Result<GovAffairResponse> {
        Ok(GovAffairResponse {
            id: affair.id,
            title: affair.title,
            slug: affair.slug,
            content: affair.content,
            is_published: affair.is_published,
            country: country_row(db, affair.country_id).await?,
            image: uploads::load_file(db, affair.image_id).await?,
            created_at: affair.created_at,
            updated_at: affair.updated_at,
        })
    }
}

pub(crate) fn require_field<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::field(name, &format!("{name} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::storage::LocalStorage;
    use bytes::Bytes;

    fn admin() -> Actor {
        Actor {
            user_id: 1,
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
            manufacturer_id: None,
        }
    }

    fn image(name: &str) -> UploadedFile {
        UploadedFile {
            field: "image".to_string(),
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"png-bytes"),
        }
    }

    fn article(title: &str, published: bool) -> ArticleInput {
        ArticleInput {
            title: Some(title.to_string()),
            content: Some("body text".to_string()),
            is_published: Some(published),
            country_id: None,
        }
    }

    #[tokio::test]
    async fn test_news_lifecycle() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let admin = admin();

        let created = ContentService::news_create(
            &db,
            &config,
            &storage,
            &admin,
            article("Recall notice issued", true),
            Some(image("cover.png")),
        )
        .await
        .unwrap();
        assert_eq!(created.slug, "recall-notice-issued");
        let first_image = created.image.clone().unwrap();

        // Reachable by slug and by id
        let by_slug = ContentService::news_get(&db, None, "recall-notice-issued")
            .await
            .unwrap();
        assert_eq!(by_slug.id, created.id);
        let by_id = ContentService::news_get(&db, None, &created.id.to_string())
            .await
            .unwrap();
        assert_eq!(by_id.id, created.id);

        // Update keeps the slug and swaps the image in place
        let updated = ContentService::news_update(
            &db,
            &config,
            &storage,
            &admin,
            &created.id.to_string(),
            ArticleInput {
                title: Some("Recall notice updated".to_string()),
                ..Default::default()
            },
            Some(image("cover2.png")),
        )
        .await
        .unwrap();
        assert_eq!(updated.slug, "recall-notice-issued");
        assert_eq!(updated.title, "Recall notice updated");
        let second_image = updated.image.clone().unwrap();
        assert_eq!(second_image.id, first_image.id);
        assert_ne!(second_image.url, first_image.url);
        let old_key = uploads::object_key(&first_image.url).unwrap();
        assert!(!storage.exists(old_key).await.unwrap());

        let done = ContentService::news_destroy(&db, &storage, &admin, &created.id.to_string())
            .await
            .unwrap();
        assert_eq!(done.message, "SUCCESS: news deleted");
        let gone_key = uploads::object_key(&second_image.url).unwrap();
        assert!(!storage.exists(gone_key).await.unwrap());
        assert!(ContentService::news_get(&db, None, &created.id.to_string())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_news_visibility() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let admin = admin();

        ContentService::news_create(&db, &config, &storage, &admin, article("Public", true), None)
            .await
            .unwrap();
        let draft = ContentService::news_create(
            &db,
            &config,
            &storage,
            &admin,
            article("Draft", false),
            None,
        )
        .await
        .unwrap();

        let anonymous = ContentService::news_list(&db, None, None, None).await.unwrap();
        assert_eq!(anonymous.meta.total, 1);
        let admin_view = ContentService::news_list(&db, Some(&admin), None, None)
            .await
            .unwrap();
        assert_eq!(admin_view.meta.total, 2);

        let err = ContentService::news_get(&db, None, &draft.id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(ContentService::news_get(&db, Some(&admin), &draft.id.to_string())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_news_requires_title() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();

        let err = ContentService::news_create(
            &db,
            &config,
            &storage,
            &admin(),
            ArticleInput {
                content: Some("text".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
        match err {
            AppError::Validation(_, details) => {
                assert_eq!(details[0].field.as_deref(), Some("title"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gov_affair_requires_country() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let admin = admin();

        let err = ContentService::gov_affair_create(
            &db,
            &config,
            &storage,
            &admin,
            article("Border rules", true),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m == "country is not found"));

        let mut input = article("Border rules", true);
        input.country_id = Some(2);
        let affair = ContentService::gov_affair_create(&db, &config, &storage, &admin, input, None)
            .await
            .unwrap();
        assert_eq!(affair.country.as_ref().map(|c| c.id), Some(2));

        // Omitting the country on update keeps it
        let updated = ContentService::gov_affair_update(
            &db,
            &config,
            &storage,
            &admin,
            &affair.id.to_string(),
            ArticleInput::default(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(updated.country.as_ref().map(|c| c.id), Some(2));
    }

    #[tokio::test]
    async fn test_slug_collision_gets_suffix() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let admin = admin();

        let first = ContentService::news_create(
            &db, &config, &storage, &admin, article("Same title", true), None,
        )
        .await
        .unwrap();
        let second = ContentService::news_create(
            &db, &config, &storage, &admin, article("Same title", true), None,
        )
        .await
        .unwrap();
        assert_eq!(first.slug, "same-title");
        assert_eq!(second.slug, "same-title-2");
    }

    #[tokio::test]
    async fn test_writes_are_admin_only() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let maker = Actor {
            user_id: 2,
            email: "maker@example.com".to_string(),
            role: UserRole::Manufacturer,
            manufacturer_id: Some(1),
        };

        let err = ContentService::news_create(
            &db, &config, &storage, &maker, article("Nope", true), None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
