use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::mailer::{self, Mailer};
use crate::models::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, User, UserResponse,
    UserRole, VerifyClaims,
};

const VERIFY_AUDIENCE: &str = "medmarket:email-verification";

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Login with email and password. Unverified accounts cannot log
    /// in; registration leaves them pending until the mailed token is
    /// redeemed.
    pub async fn login(db: &Database, config: &Config, req: LoginRequest) -> Result<LoginResponse> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(&req.email)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::Unauthorized("email is not registered".to_string()))?;

        if !user.is_verified {
            return Err(AppError::Unauthorized("user is not verified yet".to_string()));
        }

        if !Self::verify_password(&req.password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = Self::generate_token(&user, config)?;

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: config.jwt.token_expire_days * 24 * 60 * 60,
            user: UserResponse::from(user),
        })
    }

    /// Register a manufacturer or healthcare account. Creates the
    /// user plus its empty profile row and sends the verification
    /// mail; in preview mode, the rendered mail is returned instead.
    pub async fn register(
        db: &Database,
        config: &Config,
        mailer: Arc<dyn Mailer>,
        role: UserRole,
        req: RegisterRequest,
    ) -> Result<RegisterResponse> {
        let user = Self::create_user(db, &req, role, false).await?;

        match role {
            UserRole::Manufacturer => {
                sqlx::query("INSERT INTO manufacturers (user_id) VALUES (?)")
                    .bind(user.id)
                    .execute(db.pool())
                    .await?;
            }
            UserRole::Healthcare => {
                sqlx::query("INSERT INTO healthcares (user_id) VALUES (?)")
                    .bind(user.id)
                    .execute(db.pool())
                    .await?;
            }
            UserRole::Admin => {}
        }

        let preview = Self::send_verification(config, mailer, &user)?;

        Ok(RegisterResponse {
            message: format!("Email confirmation sent to {}", user.email),
            preview,
        })
    }

    /// Register an admin account. Gated by the configured app key;
    /// admins are verified up front and get no mail.
    pub async fn register_admin(
        db: &Database,
        config: &Config,
        api_key: Option<&str>,
        req: RegisterRequest,
    ) -> Result<RegisterResponse> {
        if config.app.key.is_empty() || api_key != Some(config.app.key.as_str()) {
            return Err(AppError::Unauthorized("Unauthorized access".to_string()));
        }

        Self::create_user(db, &req, UserRole::Admin, true).await?;

        Ok(RegisterResponse {
            message: "Admin created successfully".to_string(),
            preview: None,
        })
    }

    /// Re-send the verification mail for a pending account
    pub async fn resend_verification(
        db: &Database,
        config: &Config,
        mailer: Arc<dyn Mailer>,
        email: &str,
    ) -> Result<RegisterResponse> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::Unprocessable("email is not registered".to_string()))?;

        if user.is_verified {
            return Err(AppError::Unprocessable(
                "user with this email already verified".to_string(),
            ));
        }

        let preview = Self::send_verification(config, mailer, &user)?;

        Ok(RegisterResponse {
            message: format!("Email verification sent to {}", user.email),
            preview,
        })
    }

    /// Redeem a verification token
    pub async fn verify_email(
        db: &Database,
        config: &Config,
        token: &str,
    ) -> Result<RegisterResponse> {
        let claims = Self::decode_verify_token(token, config)?;

        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(&claims.email)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::Unprocessable("Email is not registered".to_string()))?;

        if user.is_verified {
            return Err(AppError::Unprocessable("Email already verified".to_string()));
        }

        sqlx::query("UPDATE users SET is_verified = 1, updated_at = datetime('now') WHERE id = ?")
            .bind(user.id)
            .execute(db.pool())
            .await?;

        Ok(RegisterResponse {
            message: "Email verified successfully".to_string(),
            preview: None,
        })
    }

    async fn create_user(
        db: &Database,
        req: &RegisterRequest,
        role: UserRole,
        verified: bool,
    ) -> Result<User> {
        if !req.email.contains('@') {
            return Err(AppError::field("email", "email must be a valid email address"));
        }
        if req.username.trim().is_empty() {
            return Err(AppError::field("username", "username is required"));
        }
        if req.password.len() < 8 {
            return Err(AppError::field(
                "password",
                "password must be at least 8 characters",
            ));
        }

        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(&req.email)
            .fetch_optional(db.pool())
            .await?;
        if existing.is_some() {
            return Err(AppError::Unprocessable("Email already exist".to_string()));
        }

        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(&req.username)
            .fetch_optional(db.pool())
            .await?;
        if existing.is_some() {
            return Err(AppError::Unprocessable("Username already exist".to_string()));
        }

        let password_hash = Self::hash_password(&req.password)?;

        let result = sqlx::query(
            "INSERT INTO users (email, username, password_hash, role, is_verified) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&req.email)
        .bind(&req.username)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(verified)
        .execute(db.pool())
        .await?;

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db.pool())
            .await?;

        Ok(user)
    }

    /// Composes the verification mail. Preview mode returns it to the
    /// caller; otherwise the send runs detached and failures only log.
    fn send_verification(
        config: &Config,
        mailer: Arc<dyn Mailer>,
        user: &User,
    ) -> Result<Option<crate::models::VerificationMail>> {
        let token = Self::generate_verify_token(user, config)?;
        let mail = mailer::compose_verification(config, &user.email, &user.username, &token);

        if config.mail.preview {
            return Ok(Some(mail));
        }

        let to = mail.to.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(mail.into()).await {
                tracing::warn!("Failed to send verification mail to {}: {}", to, e);
            }
        });
        Ok(None)
    }

    /// Generate a login token
    fn generate_token(user: &User, config: &Config) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::days(config.jwt.token_expire_days as i64);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
        )?;

        Ok(token)
    }

    fn generate_verify_token(user: &User, config: &Config) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(config.jwt.verify_expire_hours as i64);

        let claims = VerifyClaims {
            sub: user.id,
            email: user.email.clone(),
            aud: VERIFY_AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Validate a login token and extract its claims
    pub fn validate_token(token: &str, config: &Config) -> Result<Claims> {
        let validation = Validation::default();

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
    }

    /// The audience claim keeps verification tokens from doubling as
    /// login tokens; anything invalid maps to the tamper message.
    fn decode_verify_token(token: &str, config: &Config) -> Result<VerifyClaims> {
        let mut validation = Validation::default();
        validation.set_audience(&[VERIFY_AUDIENCE]);

        decode::<VerifyClaims>(
            token,
            &DecodingKey::from_secret(config.jwt.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| {
            AppError::Unprocessable("Signature is missing or URL was tampered.".to_string())
        })
    }

    /// Hash a password with Argon2
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against its hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::LogMailer;

    fn preview_config() -> Config {
        let mut config = Config::default();
        config.mail.preview = true;
        config
    }

    fn request(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "secret-password".to_string(),
        }
    }

    fn token_from(mail: &crate::models::VerificationMail) -> String {
        mail.verify_url
            .split_once("token=")
            .map(|(_, t)| t.to_string())
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_verify_login_roundtrip() {
        let db = Database::memory().await.unwrap();
        let config = preview_config();

        let response = AuthService::register(
            &db,
            &config,
            Arc::new(LogMailer),
            UserRole::Manufacturer,
            request("m@example.com", "acme"),
        )
        .await
        .unwrap();
        assert_eq!(response.message, "Email confirmation sent to m@example.com");
        let mail = response.preview.expect("preview mode returns the mail");

        // Profile row exists from the start
        let manufacturer: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM manufacturers WHERE user_id = 1")
                .fetch_optional(db.pool())
                .await
                .unwrap();
        assert!(manufacturer.is_some());

        // Unverified accounts cannot log in
        let err = AuthService::login(
            &db,
            &config,
            LoginRequest {
                email: "m@example.com".to_string(),
                password: "secret-password".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        AuthService::verify_email(&db, &config, &token_from(&mail))
            .await
            .unwrap();

        let login = AuthService::login(
            &db,
            &config,
            LoginRequest {
                email: "m@example.com".to_string(),
                password: "secret-password".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(login.user.role, "manufacturer");
        let claims = AuthService::validate_token(&login.token, &config).unwrap();
        assert_eq!(claims.sub, login.user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let db = Database::memory().await.unwrap();
        let config = preview_config();

        AuthService::register(
            &db,
            &config,
            Arc::new(LogMailer),
            UserRole::Healthcare,
            request("h@example.com", "clinic"),
        )
        .await
        .unwrap();

        let err = AuthService::register(
            &db,
            &config,
            Arc::new(LogMailer),
            UserRole::Healthcare,
            request("h@example.com", "other"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(m) if m == "Email already exist"));

        let err = AuthService::register(
            &db,
            &config,
            Arc::new(LogMailer),
            UserRole::Healthcare,
            request("h2@example.com", "clinic"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(m) if m == "Username already exist"));
    }

    #[tokio::test]
    async fn test_admin_registration_requires_app_key() {
        let db = Database::memory().await.unwrap();
        let mut config = preview_config();
        config.app.key = "top-secret".to_string();

        let err = AuthService::register_admin(
            &db,
            &config,
            Some("wrong"),
            request("a@example.com", "root"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let response = AuthService::register_admin(
            &db,
            &config,
            Some("top-secret"),
            request("a@example.com", "root"),
        )
        .await
        .unwrap();
        assert_eq!(response.message, "Admin created successfully");

        // Admins are verified immediately
        let login = AuthService::login(
            &db,
            &config,
            LoginRequest {
                email: "a@example.com".to_string(),
                password: "secret-password".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(login.user.role, "admin");
    }

    #[tokio::test]
    async fn test_verify_email_is_single_use() {
        let db = Database::memory().await.unwrap();
        let config = preview_config();

        let response = AuthService::register(
            &db,
            &config,
            Arc::new(LogMailer),
            UserRole::Manufacturer,
            request("m@example.com", "acme"),
        )
        .await
        .unwrap();
        let token = token_from(&response.preview.unwrap());

        AuthService::verify_email(&db, &config, &token).await.unwrap();
        let err = AuthService::verify_email(&db, &config, &token).await.unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(m) if m == "Email already verified"));

        let err =
            AuthService::resend_verification(&db, &config, Arc::new(LogMailer), "m@example.com")
                .await
                .unwrap_err();
        assert!(
            matches!(err, AppError::Unprocessable(m) if m == "user with this email already verified")
        );
    }

    #[tokio::test]
    async fn test_verify_email_rejects_login_token() {
        let db = Database::memory().await.unwrap();
        let mut config = preview_config();
        config.app.key = "k".to_string();

        AuthService::register_admin(&db, &config, Some("k"), request("a@example.com", "root"))
            .await
            .unwrap();

        let login = AuthService::login(
            &db,
            &config,
            LoginRequest {
                email: "a@example.com".to_string(),
                password: "secret-password".to_string(),
            },
        )
        .await
        .unwrap();

        let err = AuthService::verify_email(&db, &config, &login.token)
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Unprocessable(m) if m == "Signature is missing or URL was tampered.")
        );
    }
}
