//! crates/solicare_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database. Enumerations carry the
//! upper-case names they are stored and transmitted under.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Named Enumerations
//=========================================================================================

/// Returned when a stored or transmitted name does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a fieldless enum together with its canonical upper-case name.
macro_rules! named_enum {
    ($(#[$meta:meta])* pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

named_enum! {
    /// The role claims a bearer token may carry.
    pub enum Role {
        Member => "MEMBER",
        Senior => "SENIOR",
        Admin => "ADMIN",
    }
}

named_enum! {
    pub enum Gender {
        Male => "MALE",
        Female => "FEMALE",
        Other => "OTHER",
    }
}

impl Gender {
    /// Human readable form used inside notification titles.
    pub fn text(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "gender unknown",
        }
    }
}

named_enum! {
    pub enum PushMethod {
        Fcm => "FCM",
    }
}

named_enum! {
    /// Notification channel on the receiving device.
    pub enum PushChannel {
        Info => "INFO",
        Alert => "ALERT",
    }
}

impl PushChannel {
    pub fn channel_id(&self) -> &'static str {
        match self {
            PushChannel::Info => "info_channel",
            PushChannel::Alert => "alert_channel",
        }
    }

    pub fn notification_icon(&self) -> &'static str {
        match self {
            PushChannel::Info => "ic_notification_info",
            PushChannel::Alert => "ic_notification_alert",
        }
    }
}

named_enum! {
    /// Events reported by the senior-side sensing system.
    pub enum SeniorEvent {
        FallDetected => "FALL_DETECTED",
        CameraBatteryLow => "CAMERA_BATTERY_LOW",
        CameraDisconnected => "CAMERA_DISCONNECTED",
        WearableBatteryLow => "WEARABLE_BATTERY_LOW",
        WearableDisconnected => "WEARABLE_DISCONNECTED",
        InactivityAlert => "INACTIVITY_ALERT",
    }
}

impl SeniorEvent {
    pub fn title(&self) -> &'static str {
        match self {
            SeniorEvent::FallDetected => "Fall detected",
            SeniorEvent::CameraBatteryLow | SeniorEvent::WearableBatteryLow => "Device warning",
            SeniorEvent::CameraDisconnected | SeniorEvent::WearableDisconnected => {
                "Device disconnected"
            }
            SeniorEvent::InactivityAlert => "Inactivity detected",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SeniorEvent::FallDetected => {
                "A fall was detected.\nOpen the dashboard to check on the senior."
            }
            SeniorEvent::CameraBatteryLow => {
                "The camera battery is low.\nPlease connect the camera to a charger."
            }
            SeniorEvent::CameraDisconnected => {
                "The camera lost its connection.\nPlease check that the camera is working."
            }
            SeniorEvent::WearableBatteryLow => {
                "The wearable battery is low.\nPlease connect the wearable to a charger."
            }
            SeniorEvent::WearableDisconnected => {
                "The wearable lost its connection.\nPlease check that the wearable is working."
            }
            SeniorEvent::InactivityAlert => {
                "No movement has been detected for a long time.\nPlease check on the senior directly."
            }
        }
    }

    /// Battery warnings concern the senior's own hardware and are not broadcast to caregivers.
    pub fn is_device_health(&self) -> bool {
        matches!(
            self,
            SeniorEvent::CameraBatteryLow | SeniorEvent::WearableBatteryLow
        )
    }
}

named_enum! {
    pub enum MonitorMode {
        FullMonitoring => "FULL_MONITORING",
        CameraOnly => "CAMERA_ONLY",
        WearableOnly => "WEARABLE_ONLY",
        NoMonitoring => "NO_MONITORING",
    }
}

named_enum! {
    pub enum DayOfWeek {
        Monday => "MONDAY",
        Tuesday => "TUESDAY",
        Wednesday => "WEDNESDAY",
        Thursday => "THURSDAY",
        Friday => "FRIDAY",
        Saturday => "SATURDAY",
        Sunday => "SUNDAY",
    }
}

named_enum! {
    /// The part of the day a medicine should be taken in.
    pub enum IntakeTime {
        Morning => "MORNING",
        Afternoon => "AFTERNOON",
        Evening => "EVENING",
        Night => "NIGHT",
    }
}

impl IntakeTime {
    /// Start and end hour of the intake window.
    pub fn window(&self) -> (u32, u32) {
        match self {
            IntakeTime::Morning => (6, 9),
            IntakeTime::Afternoon => (11, 14),
            IntakeTime::Evening => (17, 20),
            IntakeTime::Night => (21, 23),
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let (start, end) = self.window();
        time.hour() >= start && time.hour() < end
    }
}

named_enum! {
    pub enum IntakeStatus {
        Taken => "TAKEN",
        Skipped => "SKIPPED",
        Missed => "MISSED",
    }
}

//=========================================================================================
// Identities
//=========================================================================================

/// A caregiver account.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub hashed_password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub phone_number: String,
    pub hashed_password: String,
    pub name: String,
}

/// A monitored person's account.
#[derive(Debug, Clone)]
pub struct Senior {
    pub id: Uuid,
    pub user_id: String,
    pub hashed_password: String,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub phone_number: String,
    pub address: String,
    pub note: String,
    pub monitored: bool,
}

#[derive(Debug, Clone)]
pub struct NewSenior {
    pub user_id: String,
    pub hashed_password: String,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub phone_number: String,
    pub address: String,
    pub note: String,
}

/// The link between a member and a senior they monitor.
#[derive(Debug, Clone)]
pub struct Care {
    pub id: Uuid,
    pub member_id: Uuid,
    pub senior_id: Uuid,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Devices and Push Messages
//=========================================================================================

/// The single principal a device may belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Member(Uuid),
    Senior(Uuid),
}

impl Owner {
    pub fn id(&self) -> Uuid {
        match self {
            Owner::Member(id) | Owner::Senior(id) => *id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Owner::Member(_) => Role::Member,
            Owner::Senior(_) => Role::Senior,
        }
    }
}

/// A registered push endpoint.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: Uuid,
    pub push_method: PushMethod,
    pub token: String,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub owner: Option<Owner>,
}

impl Device {
    /// Hands the device to `owner`, replacing any previous owner.
    pub fn link(&mut self, owner: Owner) {
        self.owner = Some(owner);
        self.touch();
    }

    pub fn unlink(&mut self) {
        self.owner = None;
        self.touch();
    }

    pub fn renew(&mut self, token: impl Into<String>) {
        self.token = token.into();
        self.touch();
    }

    fn touch(&mut self) {
        self.last_seen_at = Some(Utc::now());
    }
}

/// A notification to deliver to one or more devices.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub channel: PushChannel,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    pub fn new(channel: PushChannel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            channel,
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

//=========================================================================================
// Telemetry
//=========================================================================================

/// A discrete notable event tied to a senior.
#[derive(Debug, Clone)]
pub struct CareAlert {
    pub id: Uuid,
    pub senior_id: Uuid,
    pub timestamp: NaiveDateTime,
    pub event_type: SeniorEvent,
    pub monitor_mode: MonitorMode,
    pub base64_image: Option<String>,
    pub is_read: bool,
    pub is_dismissed: bool,
}

#[derive(Debug, Clone)]
pub struct NewCareAlert {
    pub timestamp: NaiveDateTime,
    pub event_type: SeniorEvent,
    pub monitor_mode: MonitorMode,
    pub base64_image: Option<String>,
    pub is_read: bool,
    pub is_dismissed: bool,
}

/// A periodic telemetry snapshot tied to a senior.
#[derive(Debug, Clone)]
pub struct SensorStat {
    pub id: Uuid,
    pub senior_id: Uuid,
    pub timestamp: NaiveDateTime,
    pub camera_fall_detected: bool,
    pub wearable_fall_detected: bool,
    pub temperature: f64,
    pub humidity: f64,
    pub heart_rate: i32,
    pub wearable_battery: f64,
}

#[derive(Debug, Clone)]
pub struct NewSensorStat {
    pub timestamp: NaiveDateTime,
    pub camera_fall_detected: bool,
    pub wearable_fall_detected: bool,
    pub temperature: f64,
    pub humidity: f64,
    pub heart_rate: i32,
    pub wearable_battery: f64,
}

//=========================================================================================
// Medicine
//=========================================================================================

/// A prescribed medication for a senior.
#[derive(Debug, Clone)]
pub struct Medicine {
    pub id: Uuid,
    pub senior_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub dose_amount: Option<f64>,
    pub dose_instruction: Option<String>,
    pub days_of_week: BTreeSet<DayOfWeek>,
    pub intake_time: Option<NaiveTime>,
    pub time_categories: BTreeSet<IntakeTime>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub name: String,
    pub description: Option<String>,
    pub dose_amount: Option<f64>,
    pub dose_instruction: Option<String>,
    pub days_of_week: BTreeSet<DayOfWeek>,
    pub intake_time: Option<NaiveTime>,
    pub time_categories: BTreeSet<IntakeTime>,
    pub memo: Option<String>,
}

/// One logged intake event for a medicine.
#[derive(Debug, Clone)]
pub struct MedicineHistory {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub recorded_at: NaiveDateTime,
    pub intake_amount: f64,
    pub status: IntakeStatus,
}

#[derive(Debug, Clone)]
pub struct NewMedicineHistory {
    pub recorded_at: NaiveDateTime,
    pub intake_amount: f64,
    pub status: IntakeStatus,
}

/// Joins named enum values into the comma separated form used for storage.
pub fn join_names<'a, T, I>(values: I) -> String
where
    T: Copy + 'a + fmt::Display,
    I: IntoIterator<Item = &'a T>,
{
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses the comma separated form written by [`join_names`].
pub fn split_names<T>(raw: &str) -> Result<BTreeSet<T>, UnknownVariant>
where
    T: FromStr<Err = UnknownVariant> + Ord,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .collect()
}
