use sqlx::{QueryBuilder, Sqlite};

use crate::access::{self, Action, EntityKind};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Actor, User, UserDetailResponse, UserListQuery, UserResponse, UserRole};
use crate::pagination::{page_params, Page};
use crate::services::ProfileService;

/// Admin user directory. Read only; accounts are created through the
/// registration endpoints.
pub struct UserService;

impl UserService {
    pub async fn list(
        db: &Database,
        actor: &Actor,
        query: UserListQuery,
    ) -> Result<Page<UserDetailResponse>> {
        access::authorize(Some(actor), EntityKind::UserAdmin, Action::ViewList, None)?;

        let (page, per_page, offset) = page_params(query.page, query.limit);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        if let Some(role) = &query.role {
            count.push(" AND role = ").push_bind(role);
        }
        let (total,): (i64,) = count.build_query_as().fetch_one(db.pool()).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE 1 = 1");
        if let Some(role) = &query.role {
            select.push(" AND role = ").push_bind(role);
        }
        select.push(" ORDER BY id LIMIT ");
        select.push_bind(per_page as i64);
        select.push(" OFFSET ");
        select.push_bind(offset);
        let users: Vec<User> = select.build_query_as().fetch_all(db.pool()).await?;

        let mut data = Vec::with_capacity(users.len());
        for user in users {
            data.push(Self::detail(db, user).await?);
        }
        Ok(Page::new(data, total, page, per_page, "/users"))
    }

    pub async fn get(db: &Database, actor: &Actor, id: i64) -> Result<UserDetailResponse> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("user is not found".to_string()))?;
        access::authorize(Some(actor), EntityKind::UserAdmin, Action::View, None)?;

        Self::detail(db, user).await
    }

    /// The user with its role profile attached. The nested user of the
    /// profile response is dropped, the outer row already carries it.
    async fn detail(db: &Database, user: User) -> Result<UserDetailResponse> {
        let mut manufacturer = None;
        let mut healthcare = None;
        match user.get_role() {
            Some(UserRole::Manufacturer) => {
                if let Some(row) = ProfileService::manufacturer_by_user_id(db, user.id).await? {
                    manufacturer =
                        Some(ProfileService::manufacturer_response(db, &row, false).await?);
                }
            }
            Some(UserRole::Healthcare) => {
                if let Some(row) = ProfileService::healthcare_by_user_id(db, user.id).await? {
                    healthcare = Some(ProfileService::healthcare_response(db, &row, false).await?);
                }
            }
            _ => {}
        }

        Ok(UserDetailResponse {
            user: UserResponse::from(user),
            manufacturer,
            healthcare,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AuthService;

    async fn seed_user(db: &Database, email: &str, role: UserRole) -> i64 {
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
        let (id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(db.pool())
            .await
            .unwrap();
        id
    }

    fn admin(user_id: i64) -> Actor {
        Actor {
            user_id,
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
            manufacturer_id: None,
        }
    }

    #[tokio::test]
    async fn test_list_users_with_role_filter() {
        let db = Database::memory().await.unwrap();
        let admin_id = seed_user(&db, "admin@example.com", UserRole::Admin).await;
        let maker_id = seed_user(&db, "maker@example.com", UserRole::Manufacturer).await;
        seed_user(&db, "care@example.com", UserRole::Healthcare).await;
        sqlx::query("INSERT INTO manufacturers (user_id, name) VALUES (?, 'Acme Medical')")
            .bind(maker_id)
            .execute(db.pool())
            .await
            .unwrap();
        let actor = admin(admin_id);

        let all = UserService::list(
            &db,
            &actor,
            UserListQuery { page: None, limit: None, role: None },
        )
        .await
        .unwrap();
        assert_eq!(all.meta.total, 3);

        let makers = UserService::list(
            &db,
            &actor,
            UserListQuery {
                page: None,
                limit: None,
                role: Some("manufacturer".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(makers.meta.total, 1);
        let row = &makers.data[0];
        assert_eq!(row.user.email, "maker@example.com");
        assert_eq!(
            row.manufacturer.as_ref().and_then(|m| m.name.as_deref()),
            Some("Acme Medical")
        );
        assert!(row.manufacturer.as_ref().is_some_and(|m| m.user.is_none()));
    }

    #[tokio::test]
    async fn test_get_user() {
        let db = Database::memory().await.unwrap();
        let admin_id = seed_user(&db, "admin@example.com", UserRole::Admin).await;
        let care_id = seed_user(&db, "care@example.com", UserRole::Healthcare).await;
        let actor = admin(admin_id);

        let detail = UserService::get(&db, &actor, care_id).await.unwrap();
        assert_eq!(detail.user.role, "healthcare");

        let err = UserService::get(&db, &actor, 999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "user is not found"));
    }

    #[tokio::test]
    async fn test_users_area_is_admin_only() {
        let db = Database::memory().await.unwrap();
        let maker_id = seed_user(&db, "maker@example.com", UserRole::Manufacturer).await;
        let actor = Actor {
            user_id: maker_id,
            email: "maker@example.com".to_string(),
            role: UserRole::Manufacturer,
            manufacturer_id: None,
        };

        let err = UserService::list(
            &db,
            &actor,
            UserListQuery { page: None, limit: None, role: None },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
