use crate::access::{self, Action, EntityKind};
use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    Actor, Healthcare, HealthcareProfileUpdate, HealthcareResponse, Manufacturer,
    ManufacturerProfileUpdate, ManufacturerResponse, User, UserResponse,
};
use crate::services::lookup::{category_row, country_row, named_row};
use crate::services::AuthService;
use crate::storage::StorageProvider;
use crate::uploads::{
    self, UploadedFile, HEALTHCARE_LOGO, MANUFACTURER_LOGO, MANUFACTURER_PROFILE_FILE,
};

/// Manufacturer and healthcare profile service. Profile rows are
/// created empty at registration; both read and update lazily create
/// the row when it is missing so older accounts keep working.
pub struct ProfileService;

impl ProfileService {
    pub async fn manufacturer_profile(db: &Database, actor: &Actor) -> Result<ManufacturerResponse> {
        access::authorize(Some(actor), EntityKind::ManufacturerProfile, Action::View, None)?;

        let manufacturer = Self::find_or_create_manufacturer(db, actor.user_id).await?;
        Self::manufacturer_response(db, &manufacturer, true).await
    }

    pub async fn update_manufacturer_profile(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        input: ManufacturerProfileUpdate,
        logo: Option<UploadedFile>,
        profile_file: Option<UploadedFile>,
    ) -> Result<ManufacturerResponse> {
        access::authorize(Some(actor), EntityKind::ManufacturerProfile, Action::Update, None)?;

        let manufacturer = Self::find_or_create_manufacturer(db, actor.user_id).await?;

        if let Some(id) = input.industry_category_id {
            ensure_ref(db, "industry_categories", id, "industry category not found").await?;
        }
        if let Some(id) = input.country_id {
            ensure_ref(db, "countries", id, "country not found").await?;
        }
        if let Some(id) = input.category_id_one {
            ensure_ref(db, "product_categories", id, "category_id_one is not found").await?;
        }
        if let Some(id) = input.category_id_two {
            ensure_ref(db, "product_categories", id, "category_id_two is not found").await?;
        }

        let password_hash = Self::password_change(db, actor.user_id, &input.current_password,
            &input.new_password, &input.confirm_new_password).await?;

        // Both uploads are checked before either object is written so a
        // bad second file cannot leave a half-applied pair.
        if let Some(file) = &logo {
            uploads::validate(&MANUFACTURER_LOGO, file)?;
        }
        if let Some(file) = &profile_file {
            uploads::validate(&MANUFACTURER_PROFILE_FILE, file)?;
        }

        let base_url = config.public_base_url();
        let mut tx = db.pool().begin().await?;

        let mut logo_id = manufacturer.logo_id;
        if let Some(file) = &logo {
            let stored = uploads::store(storage, base_url, &MANUFACTURER_LOGO, file).await?;
            logo_id = Some(uploads::replace(&mut tx, storage, manufacturer.logo_id, &stored).await?);
        }
        let mut profile_file_id = manufacturer.profile_file_id;
        if let Some(file) = &profile_file {
            let stored =
                uploads::store(storage, base_url, &MANUFACTURER_PROFILE_FILE, file).await?;
            profile_file_id =
                Some(uploads::replace(&mut tx, storage, manufacturer.profile_file_id, &stored).await?);
        }

        sqlx::query(
            "UPDATE manufacturers SET name = ?, pic_name = ?, description = ?, address = ?, \
             website = ?, video = ?, about = ?, country_id = ?, industry_category_id = ?, \
             category_id_one = ?, category_id_two = ?, logo_id = ?, profile_file_id = ?, \
             updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.pic_name)
        .bind(&input.description)
        .bind(&input.address)
        .bind(&input.website)
        .bind(&input.video)
        .bind(&input.about)
        .bind(input.country_id.or(manufacturer.country_id))
        .bind(input.industry_category_id.or(manufacturer.industry_category_id))
        .bind(input.category_id_one.or(manufacturer.category_id_one))
        .bind(input.category_id_two.or(manufacturer.category_id_two))
        .bind(logo_id)
        .bind(profile_file_id)
        .bind(manufacturer.id)
        .execute(&mut *tx)
        .await?;

        if let Some(hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(&hash)
                .bind(actor.user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let manufacturer = Self::find_or_create_manufacturer(db, actor.user_id).await?;
        Self::manufacturer_response(db, &manufacturer, true).await
    }

    pub async fn healthcare_profile(db: &Database, actor: &Actor) -> Result<HealthcareResponse> {
        access::authorize(Some(actor), EntityKind::HealthcareProfile, Action::View, None)?;

        let healthcare = Self::find_or_create_healthcare(db, actor.user_id).await?;
        Self::healthcare_response(db, &healthcare, true).await
    }

    pub async fn update_healthcare_profile(
        db: &Database,
        config: &Config,
        storage: &dyn StorageProvider,
        actor: &Actor,
        input: HealthcareProfileUpdate,
        logo: Option<UploadedFile>,
    ) -> Result<HealthcareResponse> {
        access::authorize(Some(actor), EntityKind::HealthcareProfile, Action::Update, None)?;

        let healthcare = Self::find_or_create_healthcare(db, actor.user_id).await?;

        if let Some(id) = input.industry_category_id {
            ensure_ref(db, "industry_categories", id, "industry category not found").await?;
        }
        if let Some(id) = input.country_id {
            ensure_ref(db, "countries", id, "country not found").await?;
        }

        let password_hash = Self::password_change(db, actor.user_id, &input.current_password,
            &input.new_password, &input.confirm_new_password).await?;

        if let Some(file) = &logo {
            uploads::validate(&HEALTHCARE_LOGO, file)?;
        }

        let base_url = config.public_base_url();
        let mut tx = db.pool().begin().await?;

        let mut logo_id = healthcare.logo_id;
        if let Some(file) = &logo {
            let stored = uploads::store(storage, base_url, &HEALTHCARE_LOGO, file).await?;
            logo_id = Some(uploads::replace(&mut tx, storage, healthcare.logo_id, &stored).await?);
        }

        sqlx::query(
            "UPDATE healthcares SET name = ?, description = ?, address = ?, country_id = ?, \
             industry_category_id = ?, logo_id = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.address)
        .bind(input.country_id.or(healthcare.country_id))
        .bind(input.industry_category_id.or(healthcare.industry_category_id))
        .bind(logo_id)
        .bind(healthcare.id)
        .execute(&mut *tx)
        .await?;

        if let Some(hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(&hash)
                .bind(actor.user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let healthcare = Self::find_or_create_healthcare(db, actor.user_id).await?;
        Self::healthcare_response(db, &healthcare, true).await
    }

    /// Validates an optional password change and returns the new hash.
    /// Runs before any write so a bad change leaves the profile
    /// untouched.
    async fn password_change(
        db: &Database,
        user_id: i64,
        current: &Option<String>,
        new: &Option<String>,
        confirm: &Option<String>,
    ) -> Result<Option<String>> {
        let Some(new) = new.as_deref() else {
            return Ok(None);
        };

        let current = current.as_deref().ok_or_else(|| {
            AppError::Unprocessable("current password is required".to_string())
        })?;
        if confirm.as_deref() != Some(new) {
            return Err(AppError::Unprocessable(
                "confirm new password is not same with new password".to_string(),
            ));
        }
        if new.len() < 8 {
            return Err(AppError::field(
                "new_password",
                "password must be at least 8 characters",
            ));
        }

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(db.pool())
            .await?;
        if !AuthService::verify_password(current, &user.password_hash)? {
            return Err(AppError::Unprocessable(
                "current password is incorrect".to_string(),
            ));
        }

        Ok(Some(AuthService::hash_password(new)?))
    }

    pub async fn find_or_create_manufacturer(db: &Database, user_id: i64) -> Result<Manufacturer> {
        let existing: Option<Manufacturer> =
            sqlx::query_as("SELECT * FROM manufacturers WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(db.pool())
                .await?;
        if let Some(manufacturer) = existing {
            return Ok(manufacturer);
        }

        sqlx::query("INSERT INTO manufacturers (user_id) VALUES (?)")
            .bind(user_id)
            .execute(db.pool())
            .await?;
        let manufacturer = sqlx::query_as("SELECT * FROM manufacturers WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(db.pool())
            .await?;
        Ok(manufacturer)
    }

    pub async fn find_or_create_healthcare(db: &Database, user_id: i64) -> Result<Healthcare> {
        let existing: Option<Healthcare> =
            sqlx::query_as("SELECT * FROM healthcares WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(db.pool())
                .await?;
        if let Some(healthcare) = existing {
            return Ok(healthcare);
        }

        sqlx::query("INSERT INTO healthcares (user_id) VALUES (?)")
            .bind(user_id)
            .execute(db.pool())
            .await?;
        let healthcare = sqlx::query_as("SELECT * FROM healthcares WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(db.pool())
            .await?;
        Ok(healthcare)
    }

    pub async fn manufacturer_by_user_id(
        db: &Database,
        user_id: i64,
    ) -> Result<Option<Manufacturer>> {
        let manufacturer = sqlx::query_as("SELECT * FROM manufacturers WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?;
        Ok(manufacturer)
    }

    pub async fn manufacturer_response(
        db: &Database,
        manufacturer: &Manufacturer,
        include_user: bool,
    ) -> Result<ManufacturerResponse> {
        let user = if include_user {
            let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
                .bind(manufacturer.user_id)
                .fetch_optional(db.pool())
                .await?;
            user.map(UserResponse::from)
        } else {
            None
        };

        Ok(ManufacturerResponse {
            id: manufacturer.id,
            name: manufacturer.name.clone(),
            pic_name: manufacturer.pic_name.clone(),
            description: manufacturer.description.clone(),
            address: manufacturer.address.clone(),
            website: manufacturer.website.clone(),
            video: manufacturer.video.clone(),
            about: manufacturer.about.clone(),
            user,
            country: country_row(db, manufacturer.country_id).await?,
            industry_category: named_row(db, "industry_categories", manufacturer.industry_category_id)
                .await?,
            category_one: category_row(db, "product_categories", manufacturer.category_id_one)
                .await?,
            category_two: category_row(db, "product_categories", manufacturer.category_id_two)
                .await?,
            logo: uploads::load_file(db, manufacturer.logo_id).await?,
            profile_file: uploads::load_file(db, manufacturer.profile_file_id).await?,
            created_at: manufacturer.created_at.clone(),
            updated_at: manufacturer.updated_at.clone(),
        })
    }

    pub async fn healthcare_by_user_id(db: &Database, user_id: i64) -> Result<Option<Healthcare>> {
        let healthcare = sqlx::query_as("SELECT * FROM healthcares WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?;
        Ok(healthcare)
    }

    pub async fn healthcare_response(
        db: &Database,
        healthcare: &Healthcare,
        include_user: bool,
    ) -> Result<HealthcareResponse> {
        let user = if include_user {
            let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
                .bind(healthcare.user_id)
                .fetch_optional(db.pool())
                .await?;
            user.map(UserResponse::from)
        } else {
            None
        };

        Ok(HealthcareResponse {
            id: healthcare.id,
            name: healthcare.name.clone(),
            description: healthcare.description.clone(),
            address: healthcare.address.clone(),
            user,
            country: country_row(db, healthcare.country_id).await?,
            industry_category: named_row(db, "industry_categories", healthcare.industry_category_id)
                .await?,
            logo: uploads::load_file(db, healthcare.logo_id).await?,
            created_at: healthcare.created_at.clone(),
            updated_at: healthcare.updated_at.clone(),
        })
    }
}

/// Unprocessable-entity check of a provided foreign key
async fn ensure_ref(db: &Database, table: &str, id: i64, message: &str) -> Result<()> {
    let found: Option<(i64,)> = sqlx::query_as(&format!("SELECT id FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    if found.is_none() {
        return Err(AppError::Unprocessable(message.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
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

        Actor {
            user_id,
            email: email.to_string(),
            role,
            manufacturer_id: None,
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

    fn png(field: &str, name: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"png-bytes"),
        }
    }

    #[tokio::test]
    async fn test_manufacturer_profile_update() {
        let db = Database::memory().await.unwrap();
        let actor = seed_user(&db, "maker@example.com", UserRole::Manufacturer).await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();

        let input = ManufacturerProfileUpdate {
            name: Some("Acme Medical".to_string()),
            pic_name: Some("Jane Roe".to_string()),
            country_id: Some(1),
            ..Default::default()
        };
        let profile = ProfileService::update_manufacturer_profile(
            &db, &config, &storage, &actor, input, None, None,
        )
        .await
        .unwrap();

        assert_eq!(profile.name.as_deref(), Some("Acme Medical"));
        assert_eq!(profile.country.as_ref().map(|c| c.id), Some(1));
        assert_eq!(
            profile.user.as_ref().map(|u| u.email.as_str()),
            Some("maker@example.com")
        );

        // Omitted ids keep their value, omitted text clears
        let second = ManufacturerProfileUpdate {
            pic_name: Some("John Roe".to_string()),
            ..Default::default()
        };
        let profile = ProfileService::update_manufacturer_profile(
            &db, &config, &storage, &actor, second, None, None,
        )
        .await
        .unwrap();
        assert_eq!(profile.name, None);
        assert_eq!(profile.pic_name.as_deref(), Some("John Roe"));
        assert_eq!(profile.country.as_ref().map(|c| c.id), Some(1));
    }

    #[tokio::test]
    async fn test_manufacturer_profile_rejects_unknown_refs() {
        let db = Database::memory().await.unwrap();
        let actor = seed_user(&db, "maker@example.com", UserRole::Manufacturer).await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();

        let input = ManufacturerProfileUpdate {
            country_id: Some(9999),
            ..Default::default()
        };
        let err = ProfileService::update_manufacturer_profile(
            &db, &config, &storage, &actor, input, None, None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m == "country not found"));

        let input = ManufacturerProfileUpdate {
            category_id_one: Some(1),
            ..Default::default()
        };
        let err = ProfileService::update_manufacturer_profile(
            &db, &config, &storage, &actor, input, None, None,
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, AppError::Unprocessable(ref m) if m == "category_id_one is not found")
        );
    }

    #[tokio::test]
    async fn test_profile_logo_replace_keeps_slot() {
        let db = Database::memory().await.unwrap();
        let actor = seed_user(&db, "maker@example.com", UserRole::Manufacturer).await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();

        let first = ProfileService::update_manufacturer_profile(
            &db,
            &config,
            &storage,
            &actor,
            ManufacturerProfileUpdate::default(),
            Some(png("logo", "logo.png")),
            Some(pdf("profile_file", "company.pdf")),
        )
        .await
        .unwrap();
        let first_logo = first.logo.unwrap();
        assert!(first.profile_file.is_some());

        let second = ProfileService::update_manufacturer_profile(
            &db,
            &config,
            &storage,
            &actor,
            ManufacturerProfileUpdate::default(),
            Some(png("logo", "rebrand.png")),
            None,
        )
        .await
        .unwrap();
        let second_logo = second.logo.unwrap();

        // Same slot row, new object, untouched sibling slot
        assert_eq!(second_logo.id, first_logo.id);
        assert_ne!(second_logo.url, first_logo.url);
        assert!(second.profile_file.is_some());

        let key = uploads::object_key(&first_logo.url).unwrap();
        assert!(!storage.exists(key).await.unwrap());
    }

    #[tokio::test]
    async fn test_password_change_rules() {
        let db = Database::memory().await.unwrap();
        let actor = seed_user(&db, "care@example.com", UserRole::Healthcare).await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let config = Config::default();

        let input = HealthcareProfileUpdate {
            new_password: Some("nextpassword".to_string()),
            confirm_new_password: Some("nextpassword".to_string()),
            ..Default::default()
        };
        let err = ProfileService::update_healthcare_profile(&db, &config, &storage, &actor, input, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m == "current password is required"));

        let input = HealthcareProfileUpdate {
            current_password: Some("wrong-password".to_string()),
            new_password: Some("nextpassword".to_string()),
            confirm_new_password: Some("nextpassword".to_string()),
            ..Default::default()
        };
        let err = ProfileService::update_healthcare_profile(&db, &config, &storage, &actor, input, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m == "current password is incorrect"));

        let input = HealthcareProfileUpdate {
            current_password: Some("hunter2secret".to_string()),
            new_password: Some("nextpassword".to_string()),
            confirm_new_password: Some("different".to_string()),
            ..Default::default()
        };
        let err = ProfileService::update_healthcare_profile(&db, &config, &storage, &actor, input, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m.starts_with("confirm new password")));

        let input = HealthcareProfileUpdate {
            current_password: Some("hunter2secret".to_string()),
            new_password: Some("nextpassword".to_string()),
            confirm_new_password: Some("nextpassword".to_string()),
            ..Default::default()
        };
        ProfileService::update_healthcare_profile(&db, &config, &storage, &actor, input, None)
            .await
            .unwrap();

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(actor.user_id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert!(AuthService::verify_password("nextpassword", &user.password_hash).unwrap());
        assert!(!AuthService::verify_password("hunter2secret", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_profile_role_gates() {
        let db = Database::memory().await.unwrap();
        let maker = seed_user(&db, "maker@example.com", UserRole::Manufacturer).await;
        let care = seed_user(&db, "care@example.com", UserRole::Healthcare).await;

        assert!(matches!(
            ProfileService::healthcare_profile(&db, &maker).await.unwrap_err(),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            ProfileService::manufacturer_profile(&db, &care).await.unwrap_err(),
            AppError::Forbidden(_)
        ));

        // First read creates the empty row
        let profile = ProfileService::manufacturer_profile(&db, &maker).await.unwrap();
        assert_eq!(profile.name, None);
        let again = ProfileService::manufacturer_profile(&db, &maker).await.unwrap();
        assert_eq!(again.id, profile.id);
    }
}
