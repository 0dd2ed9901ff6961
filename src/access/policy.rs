//! Authorization rule table. One row per (entity kind, action); the
//! admin grant is spelled out per rule, never implied, so the
//! asymmetries between entities stay visible in one place.

use crate::error::{AppError, Result};
use crate::models::Actor;

/// Entities the rule table covers. Child rows of a catalog item
/// (media, specifications, workflows, ...) share one kind per parent;
/// their checks run against the parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Product,
    Service,
    ProductChild,
    ServiceChild,
    News,
    GovAffair,
    RegulationService,
    MarketingService,
    Taxonomy,
    UserAdmin,
    Assessment,
    ManufacturerProfile,
    HealthcareProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewList,
    View,
    Create,
    Update,
    Delete,
}

/// Who a rule admits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Anyone,
    AdminOnly,
    /// Role gate without an admin grant
    ManufacturerOnly,
    HealthcareOnly,
    /// The acting user must be the owning manufacturer's user.
    /// No admin grant.
    OwnerOnly,
    /// Published rows are open; unpublished only to the owner or admin
    PublishedOwnerAdmin,
    /// Published rows are open; unpublished only to admin
    PublishedOrAdmin,
    AdminOrOwner,
    AdminOrManufacturer,
}

/// Row the check runs against. Platform content has no owner;
/// assessment targets have no publish flag.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub is_published: bool,
    pub owner_user_id: Option<i64>,
}

impl Target {
    pub fn published(is_published: bool) -> Self {
        Self {
            is_published,
            owner_user_id: None,
        }
    }

    pub fn owned(is_published: bool, owner_user_id: Option<i64>) -> Self {
        Self {
            is_published,
            owner_user_id,
        }
    }
}

pub fn rule_for(kind: EntityKind, action: Action) -> Rule {
    use Action::*;
    use EntityKind::*;
    match (kind, action) {
        (Product | Service, ViewList) => Rule::Anyone,
        (Product | Service, View) => Rule::PublishedOwnerAdmin,
        (Product | Service, Create) => Rule::ManufacturerOnly,
        (Product | Service, Update | Delete) => Rule::OwnerOnly,

        (ProductChild | ServiceChild, ViewList | View) => Rule::PublishedOwnerAdmin,
        (ProductChild | ServiceChild, Create | Update | Delete) => Rule::OwnerOnly,

        (News | GovAffair | RegulationService | MarketingService, ViewList) => Rule::Anyone,
        (News | GovAffair | RegulationService | MarketingService, View) => Rule::PublishedOrAdmin,
        (News | GovAffair | RegulationService | MarketingService, Create | Update | Delete) => {
            Rule::AdminOnly
        }

        (Taxonomy, ViewList | View) => Rule::Anyone,
        (Taxonomy, Create | Update | Delete) => Rule::AdminOnly,

        (UserAdmin, _) => Rule::AdminOnly,

        (Assessment, ViewList) => Rule::AdminOrManufacturer,
        (Assessment, View) => Rule::AdminOrOwner,
        (Assessment, Create) => Rule::ManufacturerOnly,
        (Assessment, Update) => Rule::AdminOnly,
        (Assessment, Delete) => Rule::OwnerOnly,

        (ManufacturerProfile, _) => Rule::ManufacturerOnly,
        (HealthcareProfile, _) => Rule::HealthcareOnly,
    }
}

/// Checks one action. `Err(Forbidden)` on deny; an absent actor can
/// only pass rules that admit anyone or published rows.
pub fn authorize(
    actor: Option<&Actor>,
    kind: EntityKind,
    action: Action,
    target: Option<&Target>,
) -> Result<()> {
    if allowed(rule_for(kind, action), actor, target) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to perform this action".to_string(),
        ))
    }
}

fn allowed(rule: Rule, actor: Option<&Actor>, target: Option<&Target>) -> bool {
    match rule {
        Rule::Anyone => true,
        Rule::AdminOnly => actor.is_some_and(|a| a.is_admin()),
        Rule::ManufacturerOnly => actor.is_some_and(|a| a.is_manufacturer()),
        Rule::HealthcareOnly => actor.is_some_and(|a| a.is_healthcare()),
        Rule::OwnerOnly => is_owner(actor, target),
        Rule::PublishedOwnerAdmin => {
            target.is_some_and(|t| t.is_published)
                || actor.is_some_and(|a| a.is_admin())
                || is_owner(actor, target)
        }
        Rule::PublishedOrAdmin => {
            target.is_some_and(|t| t.is_published) || actor.is_some_and(|a| a.is_admin())
        }
        Rule::AdminOrOwner => actor.is_some_and(|a| a.is_admin()) || is_owner(actor, target),
        Rule::AdminOrManufacturer => actor.is_some_and(|a| a.is_admin() || a.is_manufacturer()),
    }
}

fn is_owner(actor: Option<&Actor>, target: Option<&Target>) -> bool {
    match (actor, target) {
        (Some(a), Some(t)) => a.is_manufacturer() && t.owner_user_id == Some(a.user_id),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn actor(user_id: i64, role: UserRole) -> Actor {
        Actor {
            user_id,
            email: format!("u{user_id}@example.com"),
            role,
            manufacturer_id: match role {
                UserRole::Manufacturer => Some(user_id * 10),
                _ => None,
            },
        }
    }

    #[test]
    fn test_unpublished_owned_row_view() {
        let owner = actor(1, UserRole::Manufacturer);
        let rival = actor(2, UserRole::Manufacturer);
        let admin = actor(3, UserRole::Admin);
        let target = Target::owned(false, Some(1));

        assert!(authorize(Some(&owner), EntityKind::Product, Action::View, Some(&target)).is_ok());
        assert!(authorize(Some(&admin), EntityKind::Product, Action::View, Some(&target)).is_ok());
        assert!(authorize(Some(&rival), EntityKind::Product, Action::View, Some(&target)).is_err());
        assert!(authorize(None, EntityKind::Product, Action::View, Some(&target)).is_err());
    }

    #[test]
    fn test_published_row_is_open() {
        let target = Target::owned(true, Some(1));
        assert!(authorize(None, EntityKind::Product, Action::View, Some(&target)).is_ok());
        let healthcare = actor(5, UserRole::Healthcare);
        assert!(
            authorize(Some(&healthcare), EntityKind::Service, Action::View, Some(&target)).is_ok()
        );
    }

    #[test]
    fn test_catalog_create_has_no_admin_grant() {
        let admin = actor(3, UserRole::Admin);
        let manufacturer = actor(1, UserRole::Manufacturer);
        let healthcare = actor(5, UserRole::Healthcare);

        assert!(authorize(Some(&manufacturer), EntityKind::Product, Action::Create, None).is_ok());
        assert!(authorize(Some(&admin), EntityKind::Product, Action::Create, None).is_err());
        assert!(authorize(Some(&healthcare), EntityKind::Product, Action::Create, None).is_err());
        assert!(authorize(None, EntityKind::Service, Action::Create, None).is_err());
    }

    #[test]
    fn test_catalog_update_is_owner_only() {
        let owner = actor(1, UserRole::Manufacturer);
        let rival = actor(2, UserRole::Manufacturer);
        let admin = actor(3, UserRole::Admin);
        let target = Target::owned(true, Some(1));

        assert!(authorize(Some(&owner), EntityKind::Product, Action::Update, Some(&target)).is_ok());
        assert!(authorize(Some(&rival), EntityKind::Product, Action::Update, Some(&target)).is_err());
        // Published does not soften writes, and admin gets no grant here
        assert!(authorize(Some(&admin), EntityKind::Product, Action::Delete, Some(&target)).is_err());
    }

    #[test]
    fn test_child_rows_follow_parent_ownership() {
        let owner = actor(1, UserRole::Manufacturer);
        let rival = actor(2, UserRole::Manufacturer);
        let parent = Target::owned(false, Some(1));

        assert!(
            authorize(Some(&owner), EntityKind::ProductChild, Action::Create, Some(&parent)).is_ok()
        );
        assert!(
            authorize(Some(&rival), EntityKind::ProductChild, Action::Create, Some(&parent))
                .is_err()
        );
        // Unpublished parent hides its children from outsiders
        assert!(
            authorize(Some(&rival), EntityKind::ProductChild, Action::ViewList, Some(&parent))
                .is_err()
        );
        assert!(
            authorize(Some(&owner), EntityKind::ServiceChild, Action::ViewList, Some(&parent))
                .is_ok()
        );
    }

    #[test]
    fn test_platform_content_is_admin_managed() {
        let admin = actor(3, UserRole::Admin);
        let manufacturer = actor(1, UserRole::Manufacturer);

        assert!(authorize(Some(&admin), EntityKind::News, Action::Create, None).is_ok());
        assert!(authorize(Some(&manufacturer), EntityKind::News, Action::Create, None).is_err());

        let unpublished = Target::published(false);
        assert!(authorize(Some(&admin), EntityKind::GovAffair, Action::View, Some(&unpublished)).is_ok());
        assert!(
            authorize(Some(&manufacturer), EntityKind::GovAffair, Action::View, Some(&unpublished))
                .is_err()
        );
        assert!(authorize(None, EntityKind::News, Action::View, Some(&unpublished)).is_err());
        let published = Target::published(true);
        assert!(authorize(None, EntityKind::News, Action::View, Some(&published)).is_ok());
    }

    #[test]
    fn test_taxonomy_rules() {
        let admin = actor(3, UserRole::Admin);
        let manufacturer = actor(1, UserRole::Manufacturer);

        assert!(authorize(None, EntityKind::Taxonomy, Action::ViewList, None).is_ok());
        assert!(authorize(Some(&admin), EntityKind::Taxonomy, Action::Create, None).is_ok());
        assert!(authorize(Some(&manufacturer), EntityKind::Taxonomy, Action::Delete, None).is_err());
    }

    #[test]
    fn test_assessment_rules() {
        let admin = actor(3, UserRole::Admin);
        let owner = actor(1, UserRole::Manufacturer);
        let rival = actor(2, UserRole::Manufacturer);
        let healthcare = actor(5, UserRole::Healthcare);
        let target = Target::owned(false, Some(1));

        assert!(authorize(Some(&owner), EntityKind::Assessment, Action::Create, None).is_ok());
        assert!(authorize(Some(&admin), EntityKind::Assessment, Action::Create, None).is_err());

        assert!(authorize(Some(&admin), EntityKind::Assessment, Action::View, Some(&target)).is_ok());
        assert!(authorize(Some(&owner), EntityKind::Assessment, Action::View, Some(&target)).is_ok());
        assert!(authorize(Some(&rival), EntityKind::Assessment, Action::View, Some(&target)).is_err());

        assert!(authorize(Some(&admin), EntityKind::Assessment, Action::Update, Some(&target)).is_ok());
        assert!(authorize(Some(&owner), EntityKind::Assessment, Action::Update, Some(&target)).is_err());

        assert!(authorize(Some(&owner), EntityKind::Assessment, Action::Delete, Some(&target)).is_ok());
        assert!(authorize(Some(&admin), EntityKind::Assessment, Action::Delete, Some(&target)).is_err());

        assert!(authorize(Some(&healthcare), EntityKind::Assessment, Action::ViewList, None).is_err());
        assert!(authorize(Some(&owner), EntityKind::Assessment, Action::ViewList, None).is_ok());
    }

    #[test]
    fn test_profile_areas_are_role_gated() {
        let admin = actor(3, UserRole::Admin);
        let manufacturer = actor(1, UserRole::Manufacturer);
        let healthcare = actor(5, UserRole::Healthcare);

        assert!(
            authorize(Some(&manufacturer), EntityKind::ManufacturerProfile, Action::Update, None)
                .is_ok()
        );
        assert!(
            authorize(Some(&healthcare), EntityKind::ManufacturerProfile, Action::View, None)
                .is_err()
        );
        assert!(
            authorize(Some(&healthcare), EntityKind::HealthcareProfile, Action::Update, None)
                .is_ok()
        );
        assert!(
            authorize(Some(&admin), EntityKind::HealthcareProfile, Action::View, None).is_err()
        );
        assert!(authorize(None, EntityKind::ManufacturerProfile, Action::View, None).is_err());
    }

    #[test]
    fn test_user_admin_area() {
        let admin = actor(3, UserRole::Admin);
        let healthcare = actor(5, UserRole::Healthcare);
        assert!(authorize(Some(&admin), EntityKind::UserAdmin, Action::ViewList, None).is_ok());
        assert!(authorize(Some(&healthcare), EntityKind::UserAdmin, Action::ViewList, None).is_err());
        assert!(authorize(None, EntityKind::UserAdmin, Action::View, None).is_err());
    }
}
