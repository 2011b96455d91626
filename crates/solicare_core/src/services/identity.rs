//! crates/solicare_core/src/services/identity.rs
//!
//! Sign-up, login and profile lookup for members and seniors.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Gender, Member, NewMember, NewSenior, Role, Senior};
use crate::outcome::{Outcome, Status, StatusKind};
use crate::ports::{CredentialHasher, IdentityStore, OptionalExt, PortResult, TokenIssuer};

pub mod status {
    use super::*;

    pub const MEMBER_JOINED: Status =
        Status::new(StatusKind::Created, "MEMBER201", "The member has signed up.");
    pub const SENIOR_JOINED: Status =
        Status::new(StatusKind::Created, "SENIOR201", "The senior has signed up.");
    pub const LOGGED_IN: Status =
        Status::new(StatusKind::Success, "AUTH200", "Logged in successfully.");
    pub const PROFILE_FOUND: Status =
        Status::new(StatusKind::Success, "PROFILE200", "The profile was found.");
    pub const ALREADY_TAKEN_EMAIL: Status = Status::new(
        StatusKind::Conflict,
        "EMAIL409",
        "The email address is already in use.",
    );
    pub const ALREADY_TAKEN_PHONE: Status = Status::new(
        StatusKind::Conflict,
        "PHONE409",
        "The phone number is already in use.",
    );
    pub const ALREADY_TAKEN_USERID: Status = Status::new(
        StatusKind::Conflict,
        "USERID409",
        "The user id is already in use.",
    );
    pub const MEMBER_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "MEMBER404", "The member could not be found.");
    pub const SENIOR_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "SENIOR404", "The senior could not be found.");
    pub const INVALID_PASSWORD: Status = Status::new(
        StatusKind::Unauthorized,
        "AUTH401",
        "The password does not match.",
    );
    pub const IDENTITY_ERROR: Status = Status::new(
        StatusKind::Internal,
        "AUTH500",
        "An error occurred while processing the account.",
    );
}

use status::*;

#[derive(Debug, Clone)]
pub struct MemberJoin {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone)]
pub struct MemberLogin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SeniorJoin {
    pub user_id: String,
    pub password: String,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub phone_number: String,
    pub address: String,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct SeniorLogin {
    pub user_id: String,
    pub password: String,
}

/// A freshly authenticated account and its bearer token.
#[derive(Debug, Clone)]
pub struct Session<T> {
    pub profile: T,
    pub token: String,
}

pub struct IdentityService {
    identity: Arc<dyn IdentityStore>,
    hasher: Arc<dyn CredentialHasher>,
    issuer: Arc<dyn TokenIssuer>,
}

impl IdentityService {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        hasher: Arc<dyn CredentialHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            identity,
            hasher,
            issuer,
        }
    }

    // --- Members ---

    pub async fn join_member(&self, join: MemberJoin) -> Outcome<Session<Member>> {
        Outcome::settle(self.try_join_member(join).await, IDENTITY_ERROR)
    }

    async fn try_join_member(&self, join: MemberJoin) -> PortResult<Outcome<Session<Member>>> {
        if self.identity.member_email_exists(&join.email).await? {
            return Ok(Outcome::of(ALREADY_TAKEN_EMAIL));
        }
        if self.identity.member_phone_exists(&join.phone_number).await? {
            return Ok(Outcome::of(ALREADY_TAKEN_PHONE));
        }

        let member = self
            .identity
            .create_member(NewMember {
                email: join.email,
                phone_number: join.phone_number,
                hashed_password: self.hasher.hash(&join.password)?,
                name: join.name,
            })
            .await?;
        let token = self.issuer.issue(member.id, &[Role::Member])?;
        info!(member_id = %member.id, "Member signed up");
        Ok(Outcome::with(
            MEMBER_JOINED,
            Session {
                profile: member,
                token,
            },
        ))
    }

    pub async fn login_member(&self, login: MemberLogin) -> Outcome<Session<Member>> {
        Outcome::settle(self.try_login_member(login).await, IDENTITY_ERROR)
    }

    async fn try_login_member(&self, login: MemberLogin) -> PortResult<Outcome<Session<Member>>> {
        let Some(member) = self
            .identity
            .get_member_by_email(&login.email)
            .await
            .optional()?
        else {
            return Ok(Outcome::of(MEMBER_NOT_FOUND));
        };
        if !self.hasher.verify(&login.password, &member.hashed_password)? {
            return Ok(Outcome::of(INVALID_PASSWORD));
        }
        let token = self.issuer.issue(member.id, &[Role::Member])?;
        Ok(Outcome::with(
            LOGGED_IN,
            Session {
                profile: member,
                token,
            },
        ))
    }

    pub async fn member_profile(&self, member_id: Uuid) -> Outcome<Member> {
        let result = match self.identity.get_member(member_id).await.optional() {
            Ok(Some(member)) => Ok(Outcome::with(PROFILE_FOUND, member)),
            Ok(None) => Ok(Outcome::of(MEMBER_NOT_FOUND)),
            Err(e) => Err(e),
        };
        Outcome::settle(result, IDENTITY_ERROR)
    }

    // --- Seniors ---

    pub async fn join_senior(&self, join: SeniorJoin) -> Outcome<Session<Senior>> {
        Outcome::settle(self.try_join_senior(join).await, IDENTITY_ERROR)
    }

    async fn try_join_senior(&self, join: SeniorJoin) -> PortResult<Outcome<Session<Senior>>> {
        if self.identity.senior_user_id_exists(&join.user_id).await? {
            return Ok(Outcome::of(ALREADY_TAKEN_USERID));
        }
        if self.identity.senior_phone_exists(&join.phone_number).await? {
            return Ok(Outcome::of(ALREADY_TAKEN_PHONE));
        }

        let senior = self
            .identity
            .create_senior(NewSenior {
                user_id: join.user_id,
                hashed_password: self.hasher.hash(&join.password)?,
                name: join.name,
                age: join.age,
                gender: join.gender,
                phone_number: join.phone_number,
                address: join.address,
                note: join.note,
            })
            .await?;
        let token = self.issuer.issue(senior.id, &[Role::Senior])?;
        info!(senior_id = %senior.id, "Senior signed up");
        Ok(Outcome::with(
            SENIOR_JOINED,
            Session {
                profile: senior,
                token,
            },
        ))
    }

    pub async fn login_senior(&self, login: SeniorLogin) -> Outcome<Session<Senior>> {
        Outcome::settle(self.try_login_senior(login).await, IDENTITY_ERROR)
    }

    async fn try_login_senior(&self, login: SeniorLogin) -> PortResult<Outcome<Session<Senior>>> {
        let Some(senior) = self
            .identity
            .get_senior_by_user_id(&login.user_id)
            .await
            .optional()?
        else {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        };
        if !self.hasher.verify(&login.password, &senior.hashed_password)? {
            return Ok(Outcome::of(INVALID_PASSWORD));
        }
        let token = self.issuer.issue(senior.id, &[Role::Senior])?;
        Ok(Outcome::with(
            LOGGED_IN,
            Session {
                profile: senior,
                token,
            },
        ))
    }

    pub async fn senior_profile(&self, senior_id: Uuid) -> Outcome<Senior> {
        let result = match self.identity.get_senior(senior_id).await.optional() {
            Ok(Some(senior)) => Ok(Outcome::with(PROFILE_FOUND, senior)),
            Ok(None) => Ok(Outcome::of(SENIOR_NOT_FOUND)),
            Err(e) => Err(e),
        };
        Outcome::settle(result, IDENTITY_ERROR)
    }

    /// Whether a token subject still refers to a stored account for `role`.
    pub async fn principal_exists(&self, role: Role, subject: Uuid) -> PortResult<bool> {
        match role {
            Role::Member => self.identity.member_exists(subject).await,
            Role::Senior => self.identity.senior_exists(subject).await,
            Role::Admin => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::harness;

    fn member_join(email: &str, phone: &str) -> MemberJoin {
        MemberJoin {
            email: email.into(),
            password: "pw2".into(),
            name: "Minji".into(),
            phone_number: phone.into(),
        }
    }

    #[tokio::test]
    async fn member_join_rejects_taken_email_and_phone() {
        let h = harness();
        let identity = &h.services.identity;

        let joined = identity.join_member(member_join("m@x.com", "010-1")).await;
        assert_eq!(joined.status, MEMBER_JOINED);
        let session = joined.payload.unwrap();
        assert!(session.token.contains(&session.profile.id.to_string()));
        assert_ne!(session.profile.hashed_password, "pw2");

        let email = identity.join_member(member_join("m@x.com", "010-2")).await;
        assert_eq!(email.status, ALREADY_TAKEN_EMAIL);
        let phone = identity.join_member(member_join("n@x.com", "010-1")).await;
        assert_eq!(phone.status, ALREADY_TAKEN_PHONE);
    }

    #[tokio::test]
    async fn member_login_checks_the_password() {
        let h = harness();
        h.store.seed_member("m@x.com", "pw2").await;
        let identity = &h.services.identity;

        let wrong = identity
            .login_member(MemberLogin {
                email: "m@x.com".into(),
                password: "nope".into(),
            })
            .await;
        assert_eq!(wrong.status, INVALID_PASSWORD);

        let missing = identity
            .login_member(MemberLogin {
                email: "x@x.com".into(),
                password: "pw2".into(),
            })
            .await;
        assert_eq!(missing.status, MEMBER_NOT_FOUND);

        let ok = identity
            .login_member(MemberLogin {
                email: "m@x.com".into(),
                password: "pw2".into(),
            })
            .await;
        assert_eq!(ok.status, LOGGED_IN);
    }

    #[tokio::test]
    async fn senior_join_then_login() {
        let h = harness();
        let identity = &h.services.identity;
        let join = SeniorJoin {
            user_id: "senior1".into(),
            password: "pw1".into(),
            name: "Grace".into(),
            age: 82,
            gender: Gender::Female,
            phone_number: "010-9".into(),
            address: "Somewhere".into(),
            note: String::new(),
        };

        let joined = identity.join_senior(join.clone()).await;
        assert_eq!(joined.status, SENIOR_JOINED);
        assert!(!joined.payload.unwrap().profile.monitored);
        assert_eq!(identity.join_senior(join).await.status, ALREADY_TAKEN_USERID);

        let login = identity
            .login_senior(SeniorLogin {
                user_id: "senior1".into(),
                password: "pw1".into(),
            })
            .await;
        assert_eq!(login.status, LOGGED_IN);
    }

    #[tokio::test]
    async fn admin_principals_always_exist() {
        let h = harness();
        let identity = &h.services.identity;
        let ghost = Uuid::new_v4();
        assert!(identity.principal_exists(Role::Admin, ghost).await.unwrap());
        assert!(!identity.principal_exists(Role::Member, ghost).await.unwrap());
        assert!(!identity.principal_exists(Role::Senior, ghost).await.unwrap());
    }
}
