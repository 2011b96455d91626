//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API. Requests carry `validator`
//! rules; responses are built from domain values with `From`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use solicare_core::domain::{
    CareAlert, DayOfWeek, Device, Gender, IntakeStatus, IntakeTime, Medicine, MedicineHistory,
    Member, MonitorMode, NewCareAlert, NewMedicine, NewMedicineHistory, NewSensorStat,
    PushChannel, PushMessage, Role, Senior, SeniorEvent, SensorStat,
};
use solicare_core::services::care::{LinkedSenior, SeniorDetail};
use solicare_core::services::identity::Session;
use solicare_core::services::medicine::MedicineWithHistory;
use solicare_core::services::push::{DeliveryStatus, PushDelivery};
use std::collections::{BTreeMap, BTreeSet};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

//=========================================================================================
// Identity
//=========================================================================================

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberJoinRequest {
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "m@x.com")]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    #[schema(example = "010-1234-5678")]
    pub phone_number: String,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberLoginRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeniorJoinRequest {
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    #[schema(example = "senior1")]
    pub user_id: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub name: String,
    #[validate(range(min = 0, max = 150, message = "must be between 0 and 150"))]
    pub age: i32,
    #[schema(value_type = String, example = "FEMALE")]
    pub gender: Gender,
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    pub phone_number: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub address: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeniorLoginRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

impl From<Member> for MemberProfile {
    fn from(member: Member) -> Self {
        Self {
            uuid: member.id,
            name: member.name,
            email: member.email,
            phone_number: member.phone_number,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeniorProfile {
    pub uuid: Uuid,
    pub user_id: String,
    pub name: String,
    pub age: i32,
    #[schema(value_type = String)]
    pub gender: Gender,
    pub phone_number: String,
    pub address: String,
    pub note: String,
    pub monitored: bool,
}

impl From<Senior> for SeniorProfile {
    fn from(senior: Senior) -> Self {
        Self {
            uuid: senior.id,
            user_id: senior.user_id,
            name: senior.name,
            age: senior.age,
            gender: senior.gender,
            phone_number: senior.phone_number,
            address: senior.address,
            note: senior.note,
            monitored: senior.monitored,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MemberSession {
    pub profile: MemberProfile,
    pub token: String,
}

impl From<Session<Member>> for MemberSession {
    fn from(session: Session<Member>) -> Self {
        Self {
            profile: session.profile.into(),
            token: session.token,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SeniorSession {
    pub profile: SeniorProfile,
    pub token: String,
}

impl From<Session<Senior>> for SeniorSession {
    fn from(session: Session<Senior>) -> Self {
        Self {
            profile: session.profile.into(),
            token: session.token,
        }
    }
}

//=========================================================================================
// Care
//=========================================================================================

/// Credentials of the senior a member wants to monitor.
#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeniorLinkRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// Credentials of the member who should monitor the senior.
#[derive(Deserialize, Validate, ToSchema)]
pub struct MemberLinkRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeniorBrief {
    pub uuid: Uuid,
    pub name: String,
    pub age: i32,
    #[schema(value_type = String)]
    pub gender: Gender,
    pub unread_alert_count: i64,
}

impl From<LinkedSenior> for SeniorBrief {
    fn from(linked: LinkedSenior) -> Self {
        Self {
            uuid: linked.senior.id,
            name: linked.senior.name,
            age: linked.senior.age,
            gender: linked.senior.gender,
            unread_alert_count: linked.unread_alerts,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertBrief {
    pub uuid: Uuid,
    #[schema(value_type = String)]
    pub event_type: SeniorEvent,
    #[schema(value_type = String, example = "2025-09-20T12:34:56")]
    pub timestamp: NaiveDateTime,
    pub is_read: bool,
}

impl From<CareAlert> for AlertBrief {
    fn from(alert: CareAlert) -> Self {
        Self {
            uuid: alert.id,
            event_type: alert.event_type,
            timestamp: alert.timestamp,
            is_read: alert.is_read,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertDetail {
    pub uuid: Uuid,
    #[schema(value_type = String)]
    pub event_type: SeniorEvent,
    #[schema(value_type = String)]
    pub monitor_mode: MonitorMode,
    #[schema(value_type = String, example = "2025-09-20T12:34:56")]
    pub timestamp: NaiveDateTime,
    pub base64_image: Option<String>,
    pub is_read: bool,
    pub is_dismissed: bool,
}

impl From<CareAlert> for AlertDetail {
    fn from(alert: CareAlert) -> Self {
        Self {
            uuid: alert.id,
            event_type: alert.event_type,
            monitor_mode: alert.monitor_mode,
            timestamp: alert.timestamp,
            base64_image: alert.base64_image,
            is_read: alert.is_read,
            is_dismissed: alert.is_dismissed,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatBrief {
    pub uuid: Uuid,
    #[schema(value_type = String, example = "2025-09-20T12:34:56")]
    pub timestamp: NaiveDateTime,
    pub heart_rate: i32,
    pub temperature: f64,
}

impl From<SensorStat> for StatBrief {
    fn from(stat: SensorStat) -> Self {
        Self {
            uuid: stat.id,
            timestamp: stat.timestamp,
            heart_rate: stat.heart_rate,
            temperature: stat.temperature,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeniorDetailResponse {
    pub profile: SeniorProfile,
    pub is_monitored: bool,
    pub alerts: Vec<AlertBrief>,
    pub stats: Vec<StatBrief>,
}

impl From<SeniorDetail> for SeniorDetailResponse {
    fn from(detail: SeniorDetail) -> Self {
        Self {
            is_monitored: detail.senior.monitored,
            profile: detail.senior.into(),
            alerts: detail.alerts.into_iter().map(AlertBrief::from).collect(),
            stats: detail.stats.into_iter().map(StatBrief::from).collect(),
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatRequest {
    #[schema(value_type = String, example = "2025-09-20T12:34:56")]
    pub timestamp: NaiveDateTime,
    pub camera_fall_detected: bool,
    pub wearable_fall_detected: bool,
    pub temperature: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub humidity: f64,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub heart_rate: i32,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub wearable_battery: f64,
}

impl From<SensorStatRequest> for NewSensorStat {
    fn from(req: SensorStatRequest) -> Self {
        Self {
            timestamp: req.timestamp,
            camera_fall_detected: req.camera_fall_detected,
            wearable_fall_detected: req.wearable_fall_detected,
            temperature: req.temperature,
            humidity: req.humidity,
            heart_rate: req.heart_rate,
            wearable_battery: req.wearable_battery,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CareAlertRequest {
    #[schema(value_type = String, example = "2025-09-20T12:34:56")]
    pub timestamp: NaiveDateTime,
    #[schema(value_type = String, example = "FALL_DETECTED")]
    pub event_type: SeniorEvent,
    #[schema(value_type = String, example = "FULL_MONITORING")]
    pub monitor_mode: MonitorMode,
    pub base64_image: Option<String>,
    pub is_read: Option<bool>,
    pub is_dismissed: Option<bool>,
}

impl From<CareAlertRequest> for NewCareAlert {
    fn from(req: CareAlertRequest) -> Self {
        Self {
            timestamp: req.timestamp,
            event_type: req.event_type,
            monitor_mode: req.monitor_mode,
            base64_image: req.base64_image,
            is_read: req.is_read.unwrap_or(false),
            is_dismissed: req.is_dismissed.unwrap_or(false),
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct MonitoringQuery {
    pub enabled: bool,
}

#[derive(Serialize, ToSchema)]
pub struct MonitoringStatus {
    pub monitored: bool,
}

//=========================================================================================
// Devices and Push
//=========================================================================================

#[derive(Deserialize, Validate, ToSchema)]
pub struct TokenBody {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub token: String,
}

#[derive(Deserialize, IntoParams)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub uuid: Uuid,
    #[schema(value_type = String, example = "FCM")]
    pub push_method: solicare_core::domain::PushMethod,
    pub token: String,
    #[schema(value_type = Option<String>, example = "MEMBER")]
    pub owner_role: Option<Role>,
    pub owner_uuid: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl From<Device> for DeviceInfo {
    fn from(device: Device) -> Self {
        Self {
            uuid: device.id,
            push_method: device.push_method,
            token: device.token,
            owner_role: device.owner.map(|o| o.role()),
            owner_uuid: device.owner.map(|o| o.id()),
            last_seen_at: device.last_seen_at,
        }
    }
}

/// A message pushed to every device of a member or senior.
#[derive(Deserialize, Validate, ToSchema)]
pub struct PushRequest {
    #[schema(value_type = String, example = "INFO")]
    pub channel: PushChannel,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub message: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl From<PushRequest> for PushMessage {
    fn from(req: PushRequest) -> Self {
        PushMessage {
            channel: req.channel,
            title: req.title,
            body: req.message,
            data: req.data,
        }
    }
}

/// A message pushed straight to one token.
#[derive(Deserialize, Validate, ToSchema)]
pub struct TokenPushRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub token: String,
    #[schema(value_type = String, example = "INFO")]
    pub channel: PushChannel,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub device_uuid: Option<Uuid>,
    #[schema(example = "SENT")]
    pub status: String,
    pub reason: Option<String>,
}

impl From<PushDelivery> for DeliveryInfo {
    fn from(delivery: PushDelivery) -> Self {
        let status = match delivery.status {
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Error => "ERROR",
            DeliveryStatus::Unavailable => "UNAVAILABLE",
        };
        Self {
            device_uuid: delivery.device_id,
            status: status.to_string(),
            reason: delivery.reason,
        }
    }
}

//=========================================================================================
// Medicine
//=========================================================================================

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    #[schema(example = "Aspirin")]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub dose_amount: Option<f64>,
    pub dose_instruction: Option<String>,
    #[serde(default)]
    #[schema(value_type = Vec<String>, example = json!(["MONDAY", "FRIDAY"]))]
    pub days_of_week: BTreeSet<DayOfWeek>,
    #[schema(value_type = Option<String>, example = "08:30:00")]
    pub intake_time: Option<NaiveTime>,
    #[serde(default)]
    #[schema(value_type = Vec<String>, example = json!(["MORNING"]))]
    pub time_categories: BTreeSet<IntakeTime>,
    pub memo: Option<String>,
}

impl From<MedicineRequest> for NewMedicine {
    fn from(req: MedicineRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            dose_amount: req.dose_amount,
            dose_instruction: req.dose_instruction,
            days_of_week: req.days_of_week,
            intake_time: req.intake_time,
            time_categories: req.time_categories,
            memo: req.memo,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRequest {
    #[schema(value_type = String, example = "2026-03-02T08:30:00")]
    pub recorded_at: NaiveDateTime,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub intake_amount: f64,
    #[schema(value_type = String, example = "TAKEN")]
    pub status: IntakeStatus,
}

impl From<IntakeRequest> for NewMedicineHistory {
    fn from(req: IntakeRequest) -> Self {
        Self {
            recorded_at: req.recorded_at,
            intake_amount: req.intake_amount,
            status: req.status,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct SummaryQuery {
    /// The day the summary starts at, `YYYY-MM-DD`.
    #[param(value_type = String, example = "2026-03-02")]
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInfo {
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub dose_amount: Option<f64>,
    pub dose_instruction: Option<String>,
    #[schema(value_type = Vec<String>)]
    pub days_of_week: BTreeSet<DayOfWeek>,
    #[schema(value_type = Option<String>)]
    pub intake_time: Option<NaiveTime>,
    #[schema(value_type = Vec<String>)]
    pub time_categories: BTreeSet<IntakeTime>,
    pub memo: Option<String>,
}

impl From<Medicine> for MedicineInfo {
    fn from(medicine: Medicine) -> Self {
        Self {
            uuid: medicine.id,
            name: medicine.name,
            description: medicine.description,
            dose_amount: medicine.dose_amount,
            dose_instruction: medicine.dose_instruction,
            days_of_week: medicine.days_of_week,
            intake_time: medicine.intake_time,
            time_categories: medicine.time_categories,
            memo: medicine.memo,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntakeHistory {
    pub uuid: Uuid,
    #[schema(value_type = String)]
    pub recorded_at: NaiveDateTime,
    pub intake_amount: f64,
    #[schema(value_type = String)]
    pub status: IntakeStatus,
}

impl From<MedicineHistory> for IntakeHistory {
    fn from(history: MedicineHistory) -> Self {
        Self {
            uuid: history.id,
            recorded_at: history.recorded_at,
            intake_amount: history.intake_amount,
            status: history.status,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MedicineSummary {
    pub medicine: MedicineInfo,
    pub history: Vec<IntakeHistory>,
}

impl From<MedicineWithHistory> for MedicineSummary {
    fn from(entry: MedicineWithHistory) -> Self {
        Self {
            medicine: entry.medicine.into(),
            history: entry.histories.into_iter().map(IntakeHistory::from).collect(),
        }
    }
}

/// Collects converted items; used when a service returns a list of domain values.
pub fn all<T, U: From<T>>(items: Vec<T>) -> Vec<U> {
    items.into_iter().map(U::from).collect()
}
