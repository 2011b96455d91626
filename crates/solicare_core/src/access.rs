//! crates/solicare_core/src/access.rs
//!
//! Decides whether an authenticated principal may act on a member- or
//! senior-owned resource. Every check runs per request against the stores; the
//! only side effect is the read-only care-link lookup.

use std::collections::BTreeSet;
use uuid::Uuid;

use crate::domain::Role;
use crate::ports::{CareStore, PortResult};

/// The authenticated caller: token subject plus the roles that survived validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: Uuid,
    pub roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(subject: Uuid, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            subject,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has(Role::Admin)
    }

    fn is(&self, role: Role, target: Uuid) -> bool {
        self.has(role) && self.subject == target
    }
}

/// The decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(&'static str),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allowed)
    }
}

/// Member-owned resources: admins, or the member themself.
pub fn member_self(principal: &Principal, member_id: Uuid) -> Access {
    if principal.is_admin() || principal.is(Role::Member, member_id) {
        Access::Allowed
    } else {
        Access::Denied("Only the member themself can access this resource.")
    }
}

/// Senior-owned resources reserved to the senior: admins, or the senior themself.
pub fn senior_self(principal: &Principal, senior_id: Uuid) -> Access {
    if principal.is_admin() || principal.is(Role::Senior, senior_id) {
        Access::Allowed
    } else {
        Access::Denied("Only the senior themself can access this resource.")
    }
}

/// Senior-owned resources shared with caregivers: admins, the senior, or a
/// member with a care link to the senior.
///
/// A failing care lookup is returned as an error; callers must report it as a
/// server error rather than a denial.
pub async fn member_or_senior(
    principal: &Principal,
    senior_id: Uuid,
    care: &dyn CareStore,
) -> PortResult<Access> {
    if principal.is_admin() || principal.is(Role::Senior, senior_id) {
        return Ok(Access::Allowed);
    }
    if principal.has(Role::Member) && care.care_exists(principal.subject, senior_id).await? {
        return Ok(Access::Allowed);
    }
    Ok(Access::Denied(
        "Only the senior or a linked caregiver can access this resource.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use crate::testing::InMemoryStore;
    use async_trait::async_trait;

    #[test]
    fn senior_role_is_limited_to_its_own_subject() {
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let principal = Principal::new(s1, [Role::Senior]);

        assert_eq!(senior_self(&principal, s1), Access::Allowed);
        assert!(!senior_self(&principal, s2).is_allowed());
        assert!(!member_self(&principal, s1).is_allowed());
    }

    #[test]
    fn admin_is_allowed_regardless_of_subject() {
        let admin = Principal::new(Uuid::new_v4(), [Role::Admin]);
        assert!(member_self(&admin, Uuid::new_v4()).is_allowed());
        assert!(senior_self(&admin, Uuid::new_v4()).is_allowed());
    }

    #[tokio::test]
    async fn member_needs_a_care_link() {
        let store = InMemoryStore::new();
        let member = store.seed_member("m@x.com", "pw").await;
        let linked = store.seed_senior("linked", "pw").await;
        let other = store.seed_senior("other", "pw").await;
        store.seed_care(member.id, linked.id).await;

        let principal = Principal::new(member.id, [Role::Member]);
        let allowed = member_or_senior(&principal, linked.id, &store).await.unwrap();
        let denied = member_or_senior(&principal, other.id, &store).await.unwrap();

        assert_eq!(allowed, Access::Allowed);
        assert!(!denied.is_allowed());
    }

    #[tokio::test]
    async fn senior_is_allowed_on_itself_without_lookup() {
        let senior = Uuid::new_v4();
        let principal = Principal::new(senior, [Role::Senior]);
        let access = member_or_senior(&principal, senior, &FailingCare).await.unwrap();
        assert_eq!(access, Access::Allowed);
    }

    #[tokio::test]
    async fn failed_care_lookup_is_an_error_not_a_denial() {
        let principal = Principal::new(Uuid::new_v4(), [Role::Member]);
        let result = member_or_senior(&principal, Uuid::new_v4(), &FailingCare).await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }

    struct FailingCare;

    #[async_trait]
    impl CareStore for FailingCare {
        async fn care_exists(&self, _: Uuid, _: Uuid) -> PortResult<bool> {
            Err(PortError::Unexpected("connection reset".into()))
        }
        async fn create_care(&self, _: Uuid, _: Uuid) -> PortResult<crate::domain::Care> {
            Err(PortError::Unexpected("connection reset".into()))
        }
        async fn seniors_of_member(&self, _: Uuid) -> PortResult<Vec<crate::domain::Senior>> {
            Err(PortError::Unexpected("connection reset".into()))
        }
        async fn members_of_senior(&self, _: Uuid) -> PortResult<Vec<crate::domain::Member>> {
            Err(PortError::Unexpected("connection reset".into()))
        }
    }
}
