//! crates/solicare_core/src/testing.rs
//!
//! In-memory implementations of every port, used by unit tests in this crate and
//! by the HTTP tests of the api service (through the `testing` feature).

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::domain::{
    Care, CareAlert, Device, Gender, Medicine, MedicineHistory, Member, NewCareAlert,
    NewMedicine, NewMedicineHistory, NewMember, NewSenior, NewSensorStat, Owner, PushMessage,
    PushMethod, Role, Senior, SensorStat,
};
use crate::ports::{
    CareStore, CredentialHasher, DeviceStore, IdentityStore, MedicineStore, PortError,
    PortResult, PushGateway, TelemetryStore, TokenIssuer,
};
use crate::services::{Services, Stores};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(what: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, id))
}

//=========================================================================================
// In-memory stores
//=========================================================================================

#[derive(Default)]
struct State {
    members: Vec<Member>,
    seniors: Vec<Senior>,
    cares: Vec<Care>,
    devices: Vec<Device>,
    alerts: Vec<CareAlert>,
    stats: Vec<SensorStat>,
    medicines: Vec<Medicine>,
    histories: Vec<MedicineHistory>,
}

/// Implements all store ports over plain vectors, enforcing the same unique
/// keys as the database schema.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        locked(&self.state)
    }

    /// Stores a member whose password was hashed by [`PlainHasher`].
    pub async fn seed_member(&self, email: &str, password: &str) -> Member {
        let new = NewMember {
            email: email.to_string(),
            phone_number: format!("010-{}", Uuid::new_v4().simple()),
            hashed_password: PlainHasher::digest(password),
            name: email.split('@').next().unwrap_or(email).to_string(),
        };
        self.create_member(new).await.expect("seed member")
    }

    /// Stores a senior whose password was hashed by [`PlainHasher`].
    pub async fn seed_senior(&self, user_id: &str, password: &str) -> Senior {
        let new = NewSenior {
            user_id: user_id.to_string(),
            hashed_password: PlainHasher::digest(password),
            name: user_id.to_string(),
            age: 81,
            gender: Gender::Female,
            phone_number: format!("010-{}", Uuid::new_v4().simple()),
            address: "1 Test Street".to_string(),
            note: String::new(),
        };
        self.create_senior(new).await.expect("seed senior")
    }

    pub async fn seed_care(&self, member_id: Uuid, senior_id: Uuid) -> Care {
        self.create_care(member_id, senior_id)
            .await
            .expect("seed care")
    }

    pub async fn seed_device(&self, token: &str, owner: Option<Owner>) -> Device {
        let mut device = self
            .create_device(PushMethod::Fcm, token)
            .await
            .expect("seed device");
        if let Some(owner) = owner {
            device.link(owner);
            device = self.save_device(&device).await.expect("link seeded device");
        }
        device
    }

    pub fn care_count(&self) -> usize {
        self.state().cares.len()
    }

    pub fn stat_count(&self) -> usize {
        self.state().stats.len()
    }

    pub fn alert_count(&self) -> usize {
        self.state().alerts.len()
    }

    pub fn history_count(&self) -> usize {
        self.state().histories.len()
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn create_member(&self, member: NewMember) -> PortResult<Member> {
        let mut state = self.state();
        if state
            .members
            .iter()
            .any(|m| m.email == member.email || m.phone_number == member.phone_number)
        {
            return Err(PortError::Conflict(format!("member {}", member.email)));
        }
        let member = Member {
            id: Uuid::new_v4(),
            email: member.email,
            phone_number: member.phone_number,
            hashed_password: member.hashed_password,
            name: member.name,
        };
        state.members.push(member.clone());
        Ok(member)
    }

    async fn get_member(&self, member_id: Uuid) -> PortResult<Member> {
        self.state()
            .members
            .iter()
            .find(|m| m.id == member_id)
            .cloned()
            .ok_or_else(|| not_found("Member", member_id))
    }

    async fn get_member_by_email(&self, email: &str) -> PortResult<Member> {
        self.state()
            .members
            .iter()
            .find(|m| m.email == email)
            .cloned()
            .ok_or_else(|| not_found("Member", email))
    }

    async fn member_exists(&self, member_id: Uuid) -> PortResult<bool> {
        Ok(self.state().members.iter().any(|m| m.id == member_id))
    }

    async fn member_email_exists(&self, email: &str) -> PortResult<bool> {
        Ok(self.state().members.iter().any(|m| m.email == email))
    }

    async fn member_phone_exists(&self, phone_number: &str) -> PortResult<bool> {
        Ok(self
            .state()
            .members
            .iter()
            .any(|m| m.phone_number == phone_number))
    }

    async fn create_senior(&self, senior: NewSenior) -> PortResult<Senior> {
        let mut state = self.state();
        if state
            .seniors
            .iter()
            .any(|s| s.user_id == senior.user_id || s.phone_number == senior.phone_number)
        {
            return Err(PortError::Conflict(format!("senior {}", senior.user_id)));
        }
        let senior = Senior {
            id: Uuid::new_v4(),
            user_id: senior.user_id,
            hashed_password: senior.hashed_password,
            name: senior.name,
            age: senior.age,
            gender: senior.gender,
            phone_number: senior.phone_number,
            address: senior.address,
            note: senior.note,
            monitored: false,
        };
        state.seniors.push(senior.clone());
        Ok(senior)
    }

    async fn get_senior(&self, senior_id: Uuid) -> PortResult<Senior> {
        self.state()
            .seniors
            .iter()
            .find(|s| s.id == senior_id)
            .cloned()
            .ok_or_else(|| not_found("Senior", senior_id))
    }

    async fn get_senior_by_user_id(&self, user_id: &str) -> PortResult<Senior> {
        self.state()
            .seniors
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found("Senior", user_id))
    }

    async fn senior_exists(&self, senior_id: Uuid) -> PortResult<bool> {
        Ok(self.state().seniors.iter().any(|s| s.id == senior_id))
    }

    async fn senior_user_id_exists(&self, user_id: &str) -> PortResult<bool> {
        Ok(self.state().seniors.iter().any(|s| s.user_id == user_id))
    }

    async fn senior_phone_exists(&self, phone_number: &str) -> PortResult<bool> {
        Ok(self
            .state()
            .seniors
            .iter()
            .any(|s| s.phone_number == phone_number))
    }

    async fn set_senior_monitored(&self, senior_id: Uuid, monitored: bool) -> PortResult<Senior> {
        let mut state = self.state();
        let senior = state
            .seniors
            .iter_mut()
            .find(|s| s.id == senior_id)
            .ok_or_else(|| not_found("Senior", senior_id))?;
        senior.monitored = monitored;
        Ok(senior.clone())
    }
}

#[async_trait]
impl CareStore for InMemoryStore {
    async fn care_exists(&self, member_id: Uuid, senior_id: Uuid) -> PortResult<bool> {
        Ok(self
            .state()
            .cares
            .iter()
            .any(|c| c.member_id == member_id && c.senior_id == senior_id))
    }

    async fn create_care(&self, member_id: Uuid, senior_id: Uuid) -> PortResult<Care> {
        let mut state = self.state();
        if state
            .cares
            .iter()
            .any(|c| c.member_id == member_id && c.senior_id == senior_id)
        {
            return Err(PortError::Conflict(format!("care {}/{}", member_id, senior_id)));
        }
        let care = Care {
            id: Uuid::new_v4(),
            member_id,
            senior_id,
            created_at: Utc::now(),
        };
        state.cares.push(care.clone());
        Ok(care)
    }

    async fn seniors_of_member(&self, member_id: Uuid) -> PortResult<Vec<Senior>> {
        let state = self.state();
        let mut seniors: Vec<Senior> = state
            .cares
            .iter()
            .filter(|c| c.member_id == member_id)
            .filter_map(|c| state.seniors.iter().find(|s| s.id == c.senior_id).cloned())
            .collect();
        seniors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(seniors)
    }

    async fn members_of_senior(&self, senior_id: Uuid) -> PortResult<Vec<Member>> {
        let state = self.state();
        let mut members: Vec<Member> = state
            .cares
            .iter()
            .filter(|c| c.senior_id == senior_id)
            .filter_map(|c| state.members.iter().find(|m| m.id == c.member_id).cloned())
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }
}

#[async_trait]
impl DeviceStore for InMemoryStore {
    async fn create_device(&self, push_method: PushMethod, token: &str) -> PortResult<Device> {
        let mut state = self.state();
        if state
            .devices
            .iter()
            .any(|d| d.push_method == push_method && d.token == token)
        {
            return Err(PortError::Conflict(format!("device token {}", token)));
        }
        let device = Device {
            id: Uuid::new_v4(),
            push_method,
            token: token.to_string(),
            last_seen_at: Some(Utc::now()),
            owner: None,
        };
        state.devices.push(device.clone());
        Ok(device)
    }

    async fn get_device(&self, device_id: Uuid) -> PortResult<Device> {
        self.state()
            .devices
            .iter()
            .find(|d| d.id == device_id)
            .cloned()
            .ok_or_else(|| not_found("Device", device_id))
    }

    async fn get_device_by_token(
        &self,
        push_method: PushMethod,
        token: &str,
    ) -> PortResult<Device> {
        self.state()
            .devices
            .iter()
            .find(|d| d.push_method == push_method && d.token == token)
            .cloned()
            .ok_or_else(|| not_found("Device token", token))
    }

    async fn device_token_exists(&self, push_method: PushMethod, token: &str) -> PortResult<bool> {
        Ok(self
            .state()
            .devices
            .iter()
            .any(|d| d.push_method == push_method && d.token == token))
    }

    async fn save_device(&self, device: &Device) -> PortResult<Device> {
        let mut state = self.state();
        if state.devices.iter().any(|d| {
            d.id != device.id && d.push_method == device.push_method && d.token == device.token
        }) {
            return Err(PortError::Conflict(format!("device token {}", device.token)));
        }
        let stored = state
            .devices
            .iter_mut()
            .find(|d| d.id == device.id)
            .ok_or_else(|| not_found("Device", device.id))?;
        *stored = device.clone();
        Ok(device.clone())
    }

    async fn delete_device(&self, device_id: Uuid) -> PortResult<()> {
        let mut state = self.state();
        let before = state.devices.len();
        state.devices.retain(|d| d.id != device_id);
        if state.devices.len() == before {
            return Err(not_found("Device", device_id));
        }
        Ok(())
    }

    async fn devices_of_owner(&self, owner: Owner) -> PortResult<Vec<Device>> {
        Ok(self
            .state()
            .devices
            .iter()
            .filter(|d| d.owner == Some(owner))
            .cloned()
            .collect())
    }

    async fn devices_by_method(&self, push_method: PushMethod) -> PortResult<Vec<Device>> {
        Ok(self
            .state()
            .devices
            .iter()
            .filter(|d| d.push_method == push_method)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TelemetryStore for InMemoryStore {
    async fn create_alert(&self, senior_id: Uuid, alert: NewCareAlert) -> PortResult<CareAlert> {
        let alert = CareAlert {
            id: Uuid::new_v4(),
            senior_id,
            timestamp: alert.timestamp,
            event_type: alert.event_type,
            monitor_mode: alert.monitor_mode,
            base64_image: alert.base64_image,
            is_read: alert.is_read,
            is_dismissed: alert.is_dismissed,
        };
        self.state().alerts.push(alert.clone());
        Ok(alert)
    }

    async fn get_alert(&self, alert_id: Uuid) -> PortResult<CareAlert> {
        self.state()
            .alerts
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
            .ok_or_else(|| not_found("Alert", alert_id))
    }

    async fn recent_alerts(&self, senior_id: Uuid, limit: i64) -> PortResult<Vec<CareAlert>> {
        let mut alerts: Vec<CareAlert> = self
            .state()
            .alerts
            .iter()
            .filter(|a| a.senior_id == senior_id && !a.is_dismissed)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        alerts.truncate(limit.max(0) as usize);
        Ok(alerts)
    }

    async fn count_unread_alerts(&self, senior_id: Uuid) -> PortResult<i64> {
        Ok(self
            .state()
            .alerts
            .iter()
            .filter(|a| a.senior_id == senior_id && !a.is_read && !a.is_dismissed)
            .count() as i64)
    }

    async fn create_stat(&self, senior_id: Uuid, stat: NewSensorStat) -> PortResult<SensorStat> {
        let stat = SensorStat {
            id: Uuid::new_v4(),
            senior_id,
            timestamp: stat.timestamp,
            camera_fall_detected: stat.camera_fall_detected,
            wearable_fall_detected: stat.wearable_fall_detected,
            temperature: stat.temperature,
            humidity: stat.humidity,
            heart_rate: stat.heart_rate,
            wearable_battery: stat.wearable_battery,
        };
        self.state().stats.push(stat.clone());
        Ok(stat)
    }

    async fn recent_stats(&self, senior_id: Uuid, limit: i64) -> PortResult<Vec<SensorStat>> {
        let mut stats: Vec<SensorStat> = self
            .state()
            .stats
            .iter()
            .filter(|s| s.senior_id == senior_id)
            .cloned()
            .collect();
        stats.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        stats.truncate(limit.max(0) as usize);
        Ok(stats)
    }
}

#[async_trait]
impl MedicineStore for InMemoryStore {
    async fn create_medicine(
        &self,
        senior_id: Uuid,
        medicine: NewMedicine,
    ) -> PortResult<Medicine> {
        let medicine = Medicine {
            id: Uuid::new_v4(),
            senior_id,
            name: medicine.name,
            description: medicine.description,
            dose_amount: medicine.dose_amount,
            dose_instruction: medicine.dose_instruction,
            days_of_week: medicine.days_of_week,
            intake_time: medicine.intake_time,
            time_categories: medicine.time_categories,
            memo: medicine.memo,
        };
        self.state().medicines.push(medicine.clone());
        Ok(medicine)
    }

    async fn get_medicine(&self, medicine_id: Uuid) -> PortResult<Medicine> {
        self.state()
            .medicines
            .iter()
            .find(|m| m.id == medicine_id)
            .cloned()
            .ok_or_else(|| not_found("Medicine", medicine_id))
    }

    async fn medicines_of_senior(&self, senior_id: Uuid) -> PortResult<Vec<Medicine>> {
        Ok(self
            .state()
            .medicines
            .iter()
            .filter(|m| m.senior_id == senior_id)
            .cloned()
            .collect())
    }

    async fn delete_medicine(&self, medicine_id: Uuid) -> PortResult<()> {
        let mut state = self.state();
        if !state.medicines.iter().any(|m| m.id == medicine_id) {
            return Err(not_found("Medicine", medicine_id));
        }
        state.histories.retain(|h| h.medicine_id != medicine_id);
        state.medicines.retain(|m| m.id != medicine_id);
        Ok(())
    }

    async fn create_history(
        &self,
        medicine_id: Uuid,
        history: NewMedicineHistory,
    ) -> PortResult<MedicineHistory> {
        let history = MedicineHistory {
            id: Uuid::new_v4(),
            medicine_id,
            recorded_at: history.recorded_at,
            intake_amount: history.intake_amount,
            status: history.status,
        };
        self.state().histories.push(history.clone());
        Ok(history)
    }

    async fn histories_of_medicine(
        &self,
        medicine_id: Uuid,
        since: Option<NaiveDateTime>,
    ) -> PortResult<Vec<MedicineHistory>> {
        let mut histories: Vec<MedicineHistory> = self
            .state()
            .histories
            .iter()
            .filter(|h| h.medicine_id == medicine_id)
            .filter(|h| since.map_or(true, |since| h.recorded_at >= since))
            .cloned()
            .collect();
        histories.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(histories)
    }
}

//=========================================================================================
// Collaborator fakes
//=========================================================================================

/// A push gateway that records every message and fails for chosen tokens.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(String, PushMessage)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later delivery to `token` fail.
    pub fn fail_token(&self, token: &str) {
        locked(&self.failing).insert(token.to_string());
    }

    pub fn sent(&self) -> Vec<(String, PushMessage)> {
        locked(&self.sent).clone()
    }

    /// Tokens that received at least one message, in delivery order.
    pub fn tokens(&self) -> Vec<String> {
        locked(&self.sent).iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl PushGateway for RecordingGateway {
    fn push_method(&self) -> PushMethod {
        PushMethod::Fcm
    }

    async fn send(&self, token: &str, message: &PushMessage) -> PortResult<()> {
        if locked(&self.failing).contains(token) {
            return Err(PortError::Unexpected(format!("token {} rejected", token)));
        }
        locked(&self.sent).push((token.to_string(), message.clone()));
        Ok(())
    }
}

/// A reversible stand-in for a real password hash.
pub struct PlainHasher;

impl PlainHasher {
    pub fn digest(password: &str) -> String {
        format!("plain${}", password)
    }
}

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> PortResult<String> {
        Ok(Self::digest(password))
    }

    fn verify(&self, password: &str, hashed_password: &str) -> PortResult<bool> {
        Ok(Self::digest(password) == hashed_password)
    }
}

/// Issues predictable, unsigned tokens.
pub struct StaticIssuer;

impl TokenIssuer for StaticIssuer {
    fn issue(&self, subject: Uuid, roles: &[Role]) -> PortResult<String> {
        let roles: Vec<&str> = roles.iter().map(Role::as_str).collect();
        Ok(format!("token:{}:{}", subject, roles.join(",")))
    }
}

//=========================================================================================
// Assembled services
//=========================================================================================

/// Services wired to one shared in-memory store and a recording gateway.
pub struct Harness {
    pub services: Services,
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<RecordingGateway>,
}

pub fn harness() -> Harness {
    harness_with(Arc::new(StaticIssuer))
}

/// Like [`harness`], with a caller-supplied token issuer.
pub fn harness_with(issuer: Arc<dyn TokenIssuer>) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let gateway = Arc::new(RecordingGateway::new());
    let stores = Stores {
        identity: store.clone(),
        care: store.clone(),
        devices: store.clone(),
        telemetry: store.clone(),
        medicine: store.clone(),
    };
    let gateways: Vec<Arc<dyn PushGateway>> = vec![gateway.clone()];
    let services = Services::new(stores, Arc::new(PlainHasher), issuer, gateways);
    Harness {
        services,
        store,
        gateway,
    }
}
