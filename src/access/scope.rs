//! Row visibility of list queries. Resolved once per request from the
//! actor and appended to the SQL as a predicate, so the COUNT and the
//! page query agree on the same row set.

use sqlx::{QueryBuilder, Sqlite};

use crate::models::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Unrestricted,
    PublishedOnly,
    OwnedBy(i64),
}

impl Visibility {
    /// Manufacturer-owned catalogs (products, services). Anonymous
    /// viewers get published rows, a manufacturer exactly its own
    /// rows whether published or not, other signed-in roles fall
    /// through unfiltered; single-row view stays gated by the policy
    /// check.
    pub fn owned_catalog(actor: Option<&Actor>) -> Self {
        match actor {
            None => Visibility::PublishedOnly,
            // A manufacturer user without a profile row owns nothing
            Some(a) if a.is_manufacturer() => Visibility::OwnedBy(a.manufacturer_id.unwrap_or(-1)),
            Some(_) => Visibility::Unrestricted,
        }
    }

    /// Admin-managed platform content (news, gov affairs, regulation
    /// and marketing services)
    pub fn platform_content(actor: Option<&Actor>) -> Self {
        match actor {
            Some(a) if a.is_admin() => Visibility::Unrestricted,
            _ => Visibility::PublishedOnly,
        }
    }

    /// ANDs the predicate onto a query that already has a WHERE
    /// clause. `owner_col` names the owning-manufacturer FK column.
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Sqlite>, owner_col: &str) {
        match self {
            Visibility::Unrestricted => {}
            Visibility::PublishedOnly => {
                qb.push(" AND is_published = 1");
            }
            Visibility::OwnedBy(manufacturer_id) => {
                qb.push(format!(" AND {} = ", owner_col));
                qb.push_bind(*manufacturer_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn actor(role: UserRole, manufacturer_id: Option<i64>) -> Actor {
        Actor {
            user_id: 1,
            email: "u@example.com".to_string(),
            role,
            manufacturer_id,
        }
    }

    #[test]
    fn test_owned_catalog_scopes() {
        assert_eq!(Visibility::owned_catalog(None), Visibility::PublishedOnly);
        assert_eq!(
            Visibility::owned_catalog(Some(&actor(UserRole::Manufacturer, Some(7)))),
            Visibility::OwnedBy(7)
        );
        assert_eq!(
            Visibility::owned_catalog(Some(&actor(UserRole::Admin, None))),
            Visibility::Unrestricted
        );
        assert_eq!(
            Visibility::owned_catalog(Some(&actor(UserRole::Healthcare, None))),
            Visibility::Unrestricted
        );
    }

    #[test]
    fn test_manufacturer_without_profile_owns_nothing() {
        assert_eq!(
            Visibility::owned_catalog(Some(&actor(UserRole::Manufacturer, None))),
            Visibility::OwnedBy(-1)
        );
    }

    #[test]
    fn test_platform_content_scopes() {
        assert_eq!(Visibility::platform_content(None), Visibility::PublishedOnly);
        assert_eq!(
            Visibility::platform_content(Some(&actor(UserRole::Manufacturer, Some(7)))),
            Visibility::PublishedOnly
        );
        assert_eq!(
            Visibility::platform_content(Some(&actor(UserRole::Admin, None))),
            Visibility::Unrestricted
        );
    }

    #[test]
    fn test_predicate_sql() {
        let mut qb = QueryBuilder::new("SELECT * FROM products WHERE 1=1");
        Visibility::PublishedOnly.push_predicate(&mut qb, "manufacturer_id");
        assert!(qb.sql().ends_with("AND is_published = 1"));

        let mut qb = QueryBuilder::new("SELECT * FROM products WHERE 1=1");
        Visibility::OwnedBy(7).push_predicate(&mut qb, "manufacturer_id");
        assert!(qb.sql().contains("AND manufacturer_id = "));

        let mut qb = QueryBuilder::new("SELECT * FROM news WHERE 1=1");
        Visibility::Unrestricted.push_predicate(&mut qb, "manufacturer_id");
        assert!(qb.sql().ends_with("WHERE 1=1"));
    }
}
