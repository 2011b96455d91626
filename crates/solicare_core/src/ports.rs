//! crates/solicare_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the database, the push gateway, password hashing and
//! token signing.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::domain::{
    Care, CareAlert, Device, Medicine, MedicineHistory, Member, NewCareAlert, NewMedicine,
    NewMedicineHistory, NewMember, NewSenior, NewSensorStat, Owner, PushMessage, PushMethod,
    Role, Senior, SensorStat,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflicting item: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Turns a `NotFound` error into `Ok(None)` so lookups can branch on absence.
pub trait OptionalExt<T> {
    fn optional(self) -> PortResult<Option<T>>;
}

impl<T> OptionalExt<T> for PortResult<T> {
    fn optional(self) -> PortResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(PortError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityStore: Send + Sync {
    // --- Members ---
    async fn create_member(&self, member: NewMember) -> PortResult<Member>;

    async fn get_member(&self, member_id: Uuid) -> PortResult<Member>;

    async fn get_member_by_email(&self, email: &str) -> PortResult<Member>;

    async fn member_exists(&self, member_id: Uuid) -> PortResult<bool>;

    async fn member_email_exists(&self, email: &str) -> PortResult<bool>;

    async fn member_phone_exists(&self, phone_number: &str) -> PortResult<bool>;

    // --- Seniors ---
    async fn create_senior(&self, senior: NewSenior) -> PortResult<Senior>;

    async fn get_senior(&self, senior_id: Uuid) -> PortResult<Senior>;

    async fn get_senior_by_user_id(&self, user_id: &str) -> PortResult<Senior>;

    async fn senior_exists(&self, senior_id: Uuid) -> PortResult<bool>;

    async fn senior_user_id_exists(&self, user_id: &str) -> PortResult<bool>;

    async fn senior_phone_exists(&self, phone_number: &str) -> PortResult<bool>;

    async fn set_senior_monitored(&self, senior_id: Uuid, monitored: bool) -> PortResult<Senior>;
}

#[async_trait]
pub trait CareStore: Send + Sync {
    async fn care_exists(&self, member_id: Uuid, senior_id: Uuid) -> PortResult<bool>;

    async fn create_care(&self, member_id: Uuid, senior_id: Uuid) -> PortResult<Care>;

    /// Seniors linked to the member, ordered by name.
    async fn seniors_of_member(&self, member_id: Uuid) -> PortResult<Vec<Senior>>;

    /// Members linked to the senior, ordered by name.
    async fn members_of_senior(&self, senior_id: Uuid) -> PortResult<Vec<Member>>;
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn create_device(&self, push_method: PushMethod, token: &str) -> PortResult<Device>;

    async fn get_device(&self, device_id: Uuid) -> PortResult<Device>;

    async fn get_device_by_token(&self, push_method: PushMethod, token: &str)
        -> PortResult<Device>;

    async fn device_token_exists(&self, push_method: PushMethod, token: &str) -> PortResult<bool>;

    /// Persists token, owner and last-seen time of an existing device.
    async fn save_device(&self, device: &Device) -> PortResult<Device>;

    async fn delete_device(&self, device_id: Uuid) -> PortResult<()>;

    async fn devices_of_owner(&self, owner: Owner) -> PortResult<Vec<Device>>;

    async fn devices_by_method(&self, push_method: PushMethod) -> PortResult<Vec<Device>>;
}

#[async_trait]
pub trait TelemetryStore: Send + Sync {
    // --- Alerts ---
    async fn create_alert(&self, senior_id: Uuid, alert: NewCareAlert) -> PortResult<CareAlert>;

    async fn get_alert(&self, alert_id: Uuid) -> PortResult<CareAlert>;

    /// Non-dismissed alerts of the senior, newest first.
    async fn recent_alerts(&self, senior_id: Uuid, limit: i64) -> PortResult<Vec<CareAlert>>;

    /// Alerts that are neither read nor dismissed.
    async fn count_unread_alerts(&self, senior_id: Uuid) -> PortResult<i64>;

    // --- Sensor stats ---
    async fn create_stat(&self, senior_id: Uuid, stat: NewSensorStat) -> PortResult<SensorStat>;

    /// Sensor stats of the senior, newest first.
    async fn recent_stats(&self, senior_id: Uuid, limit: i64) -> PortResult<Vec<SensorStat>>;
}

#[async_trait]
pub trait MedicineStore: Send + Sync {
    async fn create_medicine(&self, senior_id: Uuid, medicine: NewMedicine)
        -> PortResult<Medicine>;

    async fn get_medicine(&self, medicine_id: Uuid) -> PortResult<Medicine>;

    async fn medicines_of_senior(&self, senior_id: Uuid) -> PortResult<Vec<Medicine>>;

    /// Removes the medicine together with its intake history.
    async fn delete_medicine(&self, medicine_id: Uuid) -> PortResult<()>;

    async fn create_history(
        &self,
        medicine_id: Uuid,
        history: NewMedicineHistory,
    ) -> PortResult<MedicineHistory>;

    /// Intake history of a medicine in recording order, optionally only from `since` on.
    async fn histories_of_medicine(
        &self,
        medicine_id: Uuid,
        since: Option<NaiveDateTime>,
    ) -> PortResult<Vec<MedicineHistory>>;
}

//=========================================================================================
// Collaborator Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// The push method whose tokens this gateway understands.
    fn push_method(&self) -> PushMethod;

    /// Delivers one message to one device token.
    async fn send(&self, token: &str, message: &PushMessage) -> PortResult<()>;
}

pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> PortResult<String>;

    fn verify(&self, password: &str, hashed_password: &str) -> PortResult<bool>;
}

pub trait TokenIssuer: Send + Sync {
    /// Issues a signed bearer token for `subject` carrying the given roles.
    fn issue(&self, subject: Uuid, roles: &[Role]) -> PortResult<String>;
}
