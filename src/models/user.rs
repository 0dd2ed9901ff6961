use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manufacturer,
    Healthcare,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manufacturer => "manufacturer",
            UserRole::Healthcare => "healthcare",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "manufacturer" => Some(UserRole::Manufacturer),
            "healthcare" => Some(UserRole::Healthcare),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn is_manufacturer(&self) -> bool {
        matches!(self, UserRole::Manufacturer)
    }

    pub fn is_healthcare(&self) -> bool {
        matches!(self, UserRole::Healthcare)
    }
}

/// User model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn get_role(&self) -> Option<UserRole> {
        UserRole::from_str(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// User response (without sensitive data)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: String,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
            is_verified: user.is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Admin listing row: the user plus its role profile
#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<super::profile::ManufacturerResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcare: Option<super::profile::HealthcareResponse>,
}

/// The authenticated party making a request, extracted from a verified
/// token once per request. `manufacturer_id` is present only for
/// manufacturer users with a profile row.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    pub manufacturer_id: Option<i64>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_manufacturer(&self) -> bool {
        self.role.is_manufacturer()
    }

    pub fn is_healthcare(&self) -> bool {
        self.role.is_healthcare()
    }
}

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of the email verification token. `aud` keeps it from being
/// accepted as a login token.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyClaims {
    pub sub: i64,
    pub email: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Registration request, shared by the three registration endpoints
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Registration response. `preview` carries the rendered verification
/// mail when mail preview mode is on.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<VerificationMail>,
}

/// Rendered verification mail
#[derive(Debug, Clone, Serialize)]
pub struct VerificationMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub verify_url: String,
    pub resend_url: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

/// Filter for the admin user listing
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<String>,
}
