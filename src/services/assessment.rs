use sqlx::{QueryBuilder, Sqlite};

use crate::access::{self, Action, EntityKind, Target};
use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, MessageResponse, Result};
use crate::models::{
    Actor, AssessmentInput, AssessmentListQuery, AssessmentResponse, AssessmentStatus,
    AssessmentStatusUpdate, Manufacturer, NamedRow, RegulationAssessment,
};
use crate::pagination::{page_params, Page};
use crate::services::content::require_field;
use crate::services::lookup::{country_row, named_row};
use crate::services::{CatalogService, ProfileService};
use crate::storage::StorageProvider;
use crate::uploads::{self, UploadedFile, ASSESSMENT_DOCS};

/// Regulation assessment submissions: a manufacturer files device
/// details plus license documents, admins review and set the status.
pub struct AssessmentService;

impl AssessmentService {
    pub async fn list(
        db: &Database,
        actor: &Actor,
        query: AssessmentListQuery,
    ) -> Result<Page<AssessmentResponse>> {
        access::authorize(Some(actor), EntityKind::Assessment, Action::ViewList, None)?;

        let status = match query.status.as_deref() {
            Some(raw) => Some(Self::parse_status(raw)?),
            None => None,
        };
        let (page, per_page, offset) = page_params(query.page, query.limit);

        let push_filters = |qb: &mut QueryBuilder<'_, Sqlite>| {
            if !actor.is_admin() {
                qb.push(" AND manufacturer_id = ")
                    .push_bind(actor.manufacturer_id.unwrap_or(-1));
            }
            if let Some(status) = status {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
        };

        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM regulation_assessments WHERE 1 = 1",
        );
        push_filters(&mut count);
        let (total,): (i64,) = count.build_query_as().fetch_one(db.pool()).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new("SELECT * FROM regulation_assessments WHERE 1 = 1");
        push_filters(&mut select);
        select.push(" ORDER BY id DESC LIMIT ");
        select.push_bind(per_page as i64);
        select.push(" OFFSET ");
        select.push_bind(offset);
        let rows: Vec<RegulationAssessment> =
            select.build_query_as().fetch_all(db.pool()).await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            data.push(Self::load_response(db, &row).await?);
        }
        Ok(Page::new(data, total, page, per_page, "/regulation-assessments"))
    }

    pub async fn get(db: &Database, actor: &Actor, id: i64) -> Result<AssessmentResponse> {
        let row = Self::find(db, id).await?;
        let target = Self::target(db, &row).await?;
        access::authorize(Some(actor), EntityKind::Assessment, Action::View, Some(&target))?;
        Self::load_response(db, &row).await
    }

    pub async fn create(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        input: AssessmentInput,
        files: Vec<UploadedFile>,
    ) -> Result<AssessmentResponse> {
        access::authorize(Some(actor), EntityKind::Assessment, Action::Create, None)?;

        let manufacturer = ProfileService::manufacturer_by_user_id(db, actor.user_id)
            .await?
            .ok_or_else(|| AppError::Unprocessable("manufacturer_id is not found".to_string()))?;

        let product_owner = require_field(&input.product_owner, "product_owner")?;
        let device_label = require_field(&input.device_label, "device_label")?;
        let device_identifier = require_field(&input.device_identifier, "device_identifier")?;
        let intended_purpose = require_field(&input.intended_purpose, "intended_purpose")?;
        if input.regulatory_agency_ids.is_empty() {
            return Err(AppError::field(
                "regulatory_agency_ids",
                "regulatory_agency_ids is required",
            ));
        }
        if input.daeler_type_ids.is_empty() {
            return Err(AppError::field("daeler_type_ids", "daeler_type_ids is required"));
        }

        let risk_classification =
            named_row(db, "risk_classifications", input.risk_classification_id)
                .await?
                .ok_or_else(|| {
                    AppError::Unprocessable("risk classification is not found".to_string())
                })?;
        let agency_ids = Self::check_ids(
            db,
            "regulatory_agencies",
            "regulatory agency",
            &input.regulatory_agency_ids,
        )
        .await?;
        let country = country_row(db, input.country_id)
            .await?
            .ok_or_else(|| AppError::Unprocessable("country is not found".to_string()))?;
        let daeler_ids =
            Self::check_ids(db, "daeler_types", "daeler type", &input.daeler_type_ids).await?;
        let specimen_type = named_row(db, "specimen_types", input.specimen_type_id)
            .await?
            .ok_or_else(|| AppError::Unprocessable("specimen type is not found".to_string()))?;

        // Every document is validated before the first object is put
        for (field, _, kind) in ASSESSMENT_DOCS {
            if let Some(file) = files.iter().find(|f| f.field == *field) {
                uploads::validate(kind, file)?;
            }
        }

        let base_url = config.public_base_url();
        let mut tx = db.pool().begin().await?;

        let mut slot_ids: Vec<Option<i64>> = Vec::with_capacity(ASSESSMENT_DOCS.len());
        for (field, _, kind) in ASSESSMENT_DOCS {
            match files.iter().find(|f| f.field == *field) {
                Some(file) => {
                    let stored = uploads::store(storage, base_url, kind, file).await?;
                    slot_ids.push(Some(uploads::attach(&mut tx, &stored).await?));
                }
                None => slot_ids.push(None),
            }
        }

        let result = sqlx::query(
            "INSERT INTO regulation_assessments (manufacturer_id, country_id, \
             risk_classification_id, specimen_type_id, product_owner, device_label, \
             device_identifier, intended_purpose, status, importer_license_id, \
             wholesaler_license_id, manufacturer_license_id, medical_license_id, \
             testing_report_id, user_manual_id) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(manufacturer.id)
        .bind(country.id)
        .bind(risk_classification.id)
        .bind(specimen_type.id)
        .bind(product_owner)
        .bind(device_label)
        .bind(device_identifier)
        .bind(intended_purpose)
        .bind(AssessmentStatus::Submitted.as_str())
        .bind(slot_ids[0])
        .bind(slot_ids[1])
        .bind(slot_ids[2])
        .bind(slot_ids[3])
        .bind(slot_ids[4])
        .bind(slot_ids[5])
        .execute(&mut *tx)
        .await?;
        let assessment_id = result.last_insert_rowid();

        for agency_id in &agency_ids {
            sqlx::query(
                "INSERT INTO regulation_assessment_agencies (regulation_assessment_id, regulatory_agency_id) VALUES (?, ?)",
            )
            .bind(assessment_id)
            .bind(agency_id)
            .execute(&mut *tx)
            .await?;
        }
        for daeler_id in &daeler_ids {
            sqlx::query(
                "INSERT INTO regulation_assessment_daeler_types (regulation_assessment_id, daeler_type_id) VALUES (?, ?)",
            )
            .bind(assessment_id)
            .bind(daeler_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let row = Self::find(db, assessment_id).await?;
        Self::load_response(db, &row).await
    }

    /// Review decision; only the status moves after submission.
    pub async fn update_status(
        db: &Database,
        actor: &Actor,
        id: i64,
        input: AssessmentStatusUpdate,
    ) -> Result<AssessmentResponse> {
        let row = Self::find(db, id).await?;
        access::authorize(Some(actor), EntityKind::Assessment, Action::Update, None)?;
        let status = Self::parse_status(&input.status)?;

        sqlx::query(
            "UPDATE regulation_assessments SET status = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(row.id)
        .execute(db.pool())
        .await?;

        let row = Self::find(db, row.id).await?;
        Self::load_response(db, &row).await
    }

    pub async fn destroy(
        db: &Database,
        storage: &dyn StorageProvider,
        actor: &Actor,
        id: i64,
    ) -> Result<MessageResponse> {
        let row = Self::find(db, id).await?;
        let target = Self::target(db, &row).await?;
        access::authorize(Some(actor), EntityKind::Assessment, Action::Delete, Some(&target))?;

        let slot_ids = [
            row.importer_license_id,
            row.wholesaler_license_id,
            row.manufacturer_license_id,
            row.medical_license_id,
            row.testing_report_id,
            row.user_manual_id,
        ];

        sqlx::query("DELETE FROM regulation_assessments WHERE id = ?")
            .bind(row.id)
            .execute(db.pool())
            .await?;
        for file_id in slot_ids.into_iter().flatten() {
            uploads::remove(db, storage, file_id).await?;
        }

        Ok(MessageResponse::deleted("regulation assessment"))
    }

    async fn find(db: &Database, id: i64) -> Result<RegulationAssessment> {
        let row: Option<RegulationAssessment> =
            sqlx::query_as("SELECT * FROM regulation_assessments WHERE id = ?")
                .bind(id)
                .fetch_optional(db.pool())
                .await?;
        row.ok_or_else(|| AppError::NotFound("regulation assessment is not found".to_string()))
    }

    async fn target(db: &Database, row: &RegulationAssessment) -> Result<Target> {
        let owner = CatalogService::owner_user_id(db, row.manufacturer_id).await?;
        Ok(Target::owned(false, owner))
    }

    fn parse_status(raw: &str) -> Result<AssessmentStatus> {
        AssessmentStatus::from_str(raw).ok_or_else(|| {
            AppError::field("status", "status must be one of: submitted, feasible, not_feasible")
        })
    }

    /// Checks each id against the lookup table, deduplicating while
    /// the order is kept.
    async fn check_ids(
        db: &Database,
        table: &str,
        label: &str,
        ids: &[i64],
    ) -> Result<Vec<i64>> {
        let mut seen = Vec::with_capacity(ids.len());
        for id in ids {
            let found = named_row(db, table, Some(*id)).await?;
            if found.is_none() {
                return Err(AppError::Unprocessable(format!(
                    "{label} with id {id} is not found"
                )));
            }
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        Ok(seen)
    }

    async fn load_response(
        db: &Database,
        row: &RegulationAssessment,
    ) -> Result<AssessmentResponse> {
        let manufacturer: Option<Manufacturer> =
            sqlx::query_as("SELECT * FROM manufacturers WHERE id = ?")
                .bind(row.manufacturer_id)
                .fetch_optional(db.pool())
                .await?;
        let manufacturer = match manufacturer {
            Some(row) => Some(ProfileService::manufacturer_response(db, &row, true).await?),
            None => None,
        };

        let regulatory_agencies: Vec<NamedRow> = sqlx::query_as(
            "SELECT ra.id, ra.name FROM regulatory_agencies ra \
             JOIN regulation_assessment_agencies j ON j.regulatory_agency_id = ra.id \
             WHERE j.regulation_assessment_id = ? ORDER BY ra.id",
        )
        .bind(row.id)
        .fetch_all(db.pool())
        .await?;
        let daeler_types: Vec<NamedRow> = sqlx::query_as(
            "SELECT dt.id, dt.name FROM daeler_types dt \
             JOIN regulation_assessment_daeler_types j ON j.daeler_type_id = dt.id \
             WHERE j.regulation_assessment_id = ? ORDER BY dt.id",
        )
        .bind(row.id)
        .fetch_all(db.pool())
        .await?;

        Ok(AssessmentResponse {
            id: row.id,
            product_owner: row.product_owner.clone(),
            device_label: row.device_label.clone(),
            device_identifier: row.device_identifier.clone(),
            intended_purpose: row.intended_purpose.clone(),
            status: row.status.clone(),
            manufacturer,
            country: country_row(db, row.country_id).await?,
            risk_classification: named_row(db, "risk_classifications", row.risk_classification_id)
                .await?,
            specimen_type: named_row(db, "specimen_types", row.specimen_type_id).await?,
            regulatory_agencies,
            daeler_types,
            importer_license: uploads::load_file(db, row.importer_license_id).await?,
            wholesaler_license: uploads::load_file(db, row.wholesaler_license_id).await?,
            manufacturer_license: uploads::load_file(db, row.manufacturer_license_id).await?,
            medical_license: uploads::load_file(db, row.medical_license_id).await?,
            testing_report: uploads::load_file(db, row.testing_report_id).await?,
            user_manual: uploads::load_file(db, row.user_manual_id).await?,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::services::AuthService;
    use crate::storage::LocalStorage;
    use bytes::Bytes;

    async fn seed_user(db: &Database, email: &str, role: UserRole) -> Actor {
        let hash = AuthService::hash_password("hunter2secret").unwrap();
        sqlx::query(
            "INSERT INTO users (email, username, password_hash, role, is_verified) VALUES (?, ?, ?, ?, 1)",
        )
        .bind(email)
        .bind(email.split('@').next().unwrap())
        .bind(&hash)
        .bind(role.as_str())
        .execute(db.pool())
        .await
        .unwrap();
        let (user_id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(db.pool())
            .await
            .unwrap();

        let manufacturer_id = if role.is_manufacturer() {
            sqlx::query("INSERT INTO manufacturers (user_id, name, country_id) VALUES (?, ?, 1)")
                .bind(user_id)
                .bind(email.split('@').next().unwrap())
                .execute(db.pool())
                .await
                .unwrap();
            let (id,): (i64,) = sqlx::query_as("SELECT id FROM manufacturers WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(db.pool())
                .await
                .unwrap();
            Some(id)
        } else {
            None
        };

        Actor {
            user_id,
            email: email.to_string(),
            role,
            manufacturer_id,
        }
    }

    fn pdf(field: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            filename: format!("{field}.pdf"),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-fake"),
        }
    }

    fn full_input() -> AssessmentInput {
        AssessmentInput {
            product_owner: Some("Acme Medical".to_string()),
            device_label: Some("Acme Thermometer".to_string()),
            device_identifier: Some("ACME-T-100".to_string()),
            intended_purpose: Some("Body temperature measurement".to_string()),
            country_id: Some(1),
            risk_classification_id: Some(1),
            specimen_type_id: Some(1),
            regulatory_agency_ids: vec![1, 2],
            daeler_type_ids: vec![1],
        }
    }

    #[tokio::test]
    async fn test_submit_full() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let maker = seed_user(&db, "maker@example.com", UserRole::Manufacturer).await;

        let created = AssessmentService::create(
            &db,
            &config,
            &storage,
            &maker,
            full_input(),
            vec![pdf("importer_license"), pdf("testing_report")],
        )
        .await
        .unwrap();

        assert_eq!(created.status, "submitted");
        assert_eq!(created.product_owner.as_deref(), Some("Acme Medical"));
        assert_eq!(
            created.manufacturer.as_ref().and_then(|m| m.user.as_ref()).map(|u| u.email.as_str()),
            Some("maker@example.com")
        );
        assert!(created.country.is_some());
        assert!(created.risk_classification.is_some());
        assert!(created.specimen_type.is_some());
        assert_eq!(created.regulatory_agencies.len(), 2);
        assert_eq!(created.daeler_types.len(), 1);
        assert!(created.importer_license.is_some());
        assert!(created.testing_report.is_some());
        assert!(created.wholesaler_license.is_none());

        let key = uploads::object_key(&created.importer_license.as_ref().unwrap().url)
            .unwrap()
            .to_string();
        assert!(key.starts_with("regulation-assessment/importer-license/"));
        assert!(storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_validations() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let maker = seed_user(&db, "maker@example.com", UserRole::Manufacturer).await;
        let admin = seed_user(&db, "admin@example.com", UserRole::Admin).await;

        // Review staff cannot submit
        let err = AssessmentService::create(&db, &config, &storage, &admin, full_input(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let mut input = full_input();
        input.device_label = None;
        let err = AssessmentService::create(&db, &config, &storage, &maker, input, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_, _)));

        let mut input = full_input();
        input.regulatory_agency_ids = vec![];
        let err = AssessmentService::create(&db, &config, &storage, &maker, input, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_, _)));

        let mut input = full_input();
        input.risk_classification_id = None;
        let err = AssessmentService::create(&db, &config, &storage, &maker, input, vec![])
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Unprocessable(ref m) if m == "risk classification is not found")
        );

        let mut input = full_input();
        input.regulatory_agency_ids = vec![1, 999];
        let err = AssessmentService::create(&db, &config, &storage, &maker, input, vec![])
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Unprocessable(ref m) if m == "regulatory agency with id 999 is not found")
        );

        let mut input = full_input();
        input.country_id = None;
        let err = AssessmentService::create(&db, &config, &storage, &maker, input, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m == "country is not found"));

        let mut input = full_input();
        input.daeler_type_ids = vec![99];
        let err = AssessmentService::create(&db, &config, &storage, &maker, input, vec![])
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Unprocessable(ref m) if m == "daeler type with id 99 is not found")
        );

        let mut input = full_input();
        input.specimen_type_id = Some(9999);
        let err = AssessmentService::create(&db, &config, &storage, &maker, input, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m == "specimen type is not found"));

        // An oversized document is rejected before anything is stored
        let big = UploadedFile {
            field: "importer_license".to_string(),
            filename: "big.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from(vec![0u8; 2 * 1024 * 1024 + 1]),
        };
        let err = AssessmentService::create(&db, &config, &storage, &maker, full_input(), vec![big])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_, _)));
        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM regulation_assessments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_list_scope_and_status_filter() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let maker_a = seed_user(&db, "a@example.com", UserRole::Manufacturer).await;
        let maker_b = seed_user(&db, "b@example.com", UserRole::Manufacturer).await;
        let admin = seed_user(&db, "admin@example.com", UserRole::Admin).await;
        let clinic = seed_user(&db, "clinic@example.com", UserRole::Healthcare).await;

        let first = AssessmentService::create(&db, &config, &storage, &maker_a, full_input(), vec![])
            .await
            .unwrap();
        AssessmentService::create(&db, &config, &storage, &maker_b, full_input(), vec![])
            .await
            .unwrap();

        let all = AssessmentService::list(&db, &admin, AssessmentListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.meta.total, 2);

        let own = AssessmentService::list(&db, &maker_a, AssessmentListQuery::default())
            .await
            .unwrap();
        assert_eq!(own.meta.total, 1);
        assert_eq!(own.data[0].id, first.id);

        let err = AssessmentService::list(&db, &clinic, AssessmentListQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        AssessmentService::update_status(
            &db,
            &admin,
            first.id,
            AssessmentStatusUpdate {
                status: "feasible".to_string(),
            },
        )
        .await
        .unwrap();
        let feasible = AssessmentService::list(
            &db,
            &admin,
            AssessmentListQuery {
                status: Some("feasible".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(feasible.meta.total, 1);
        assert_eq!(feasible.data[0].id, first.id);

        let err = AssessmentService::list(
            &db,
            &admin,
            AssessmentListQuery {
                status: Some("rejected".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_, _)));
    }

    #[tokio::test]
    async fn test_view_and_review_gates() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let owner = seed_user(&db, "owner@example.com", UserRole::Manufacturer).await;
        let rival = seed_user(&db, "rival@example.com", UserRole::Manufacturer).await;
        let admin = seed_user(&db, "admin@example.com", UserRole::Admin).await;

        let created = AssessmentService::create(&db, &config, &storage, &owner, full_input(), vec![])
            .await
            .unwrap();

        assert!(AssessmentService::get(&db, &owner, created.id).await.is_ok());
        assert!(AssessmentService::get(&db, &admin, created.id).await.is_ok());
        let err = AssessmentService::get(&db, &rival, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = AssessmentService::get(&db, &admin, 999).await.unwrap_err();
        assert!(
            matches!(err, AppError::NotFound(ref m) if m == "regulation assessment is not found")
        );

        // The submitting manufacturer cannot move the status
        let err = AssessmentService::update_status(
            &db,
            &owner,
            created.id,
            AssessmentStatusUpdate {
                status: "feasible".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = AssessmentService::update_status(
            &db,
            &admin,
            created.id,
            AssessmentStatusUpdate {
                status: "approved".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_, _)));

        let reviewed = AssessmentService::update_status(
            &db,
            &admin,
            created.id,
            AssessmentStatusUpdate {
                status: "not_feasible".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(reviewed.status, "not_feasible");
    }

    #[tokio::test]
    async fn test_destroy_owner_only_and_cleans_documents() {
        let db = Database::memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();
        let owner = seed_user(&db, "owner@example.com", UserRole::Manufacturer).await;
        let admin = seed_user(&db, "admin@example.com", UserRole::Admin).await;

        let created = AssessmentService::create(
            &db,
            &config,
            &storage,
            &owner,
            full_input(),
            vec![pdf("importer_license"), pdf("user_manual")],
        )
        .await
        .unwrap();
        let key = uploads::object_key(&created.user_manual.as_ref().unwrap().url)
            .unwrap()
            .to_string();

        let err = AssessmentService::destroy(&db, &storage, &admin, created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let done = AssessmentService::destroy(&db, &storage, &owner, created.id)
            .await
            .unwrap();
        assert_eq!(done.message, "SUCCESS: regulation assessment deleted");
        assert!(!storage.exists(&key).await.unwrap());
        let (files_left,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM file_uploads")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(files_left, 0);
        let (links_left,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM regulation_assessment_agencies")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(links_left, 0);
    }
}
