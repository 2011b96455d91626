//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of
//! every store port from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`. Enumerations are stored as their upper-case
//! names and day/category sets as comma separated names.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use solicare_core::domain::{
    join_names, split_names, Care, CareAlert, Device, Medicine, MedicineHistory, Member,
    NewCareAlert, NewMedicine, NewMedicineHistory, NewMember, NewSenior, NewSensorStat, Owner,
    PushMethod, Senior, SensorStat, UnknownVariant,
};
use solicare_core::ports::{
    CareStore, DeviceStore, IdentityStore, MedicineStore, PortError, PortResult, TelemetryStore,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn db_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(db.message().to_string())
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

fn lookup_error(what: impl std::fmt::Display) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        other => db_error(other),
    }
}

fn corrupt(e: UnknownVariant) -> PortError {
    PortError::Unexpected(format!("Stored data is invalid: {}", e))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct MemberRecord {
    id: Uuid,
    email: String,
    phone_number: String,
    hashed_password: String,
    name: String,
}
impl MemberRecord {
    fn to_domain(self) -> Member {
        Member {
            id: self.id,
            email: self.email,
            phone_number: self.phone_number,
            hashed_password: self.hashed_password,
            name: self.name,
        }
    }
}

#[derive(FromRow)]
struct SeniorRecord {
    id: Uuid,
    user_id: String,
    hashed_password: String,
    name: String,
    age: i32,
    gender: String,
    phone_number: String,
    address: String,
    note: String,
    monitored: bool,
}
impl SeniorRecord {
    fn to_domain(self) -> PortResult<Senior> {
        Ok(Senior {
            id: self.id,
            user_id: self.user_id,
            hashed_password: self.hashed_password,
            name: self.name,
            age: self.age,
            gender: self.gender.parse().map_err(corrupt)?,
            phone_number: self.phone_number,
            address: self.address,
            note: self.note,
            monitored: self.monitored,
        })
    }
}

#[derive(FromRow)]
struct CareRecord {
    id: Uuid,
    member_id: Uuid,
    senior_id: Uuid,
    created_at: DateTime<Utc>,
}
impl CareRecord {
    fn to_domain(self) -> Care {
        Care {
            id: self.id,
            member_id: self.member_id,
            senior_id: self.senior_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct DeviceRecord {
    id: Uuid,
    push_method: String,
    token: String,
    last_seen_at: Option<DateTime<Utc>>,
    member_id: Option<Uuid>,
    senior_id: Option<Uuid>,
}
impl DeviceRecord {
    fn to_domain(self) -> PortResult<Device> {
        let owner = match (self.member_id, self.senior_id) {
            (Some(id), None) => Some(Owner::Member(id)),
            (None, Some(id)) => Some(Owner::Senior(id)),
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err(PortError::Unexpected(format!(
                    "Device {} has two owners",
                    self.id
                )))
            }
        };
        Ok(Device {
            id: self.id,
            push_method: self.push_method.parse().map_err(corrupt)?,
            token: self.token,
            last_seen_at: self.last_seen_at,
            owner,
        })
    }
}

#[derive(FromRow)]
struct CareAlertRecord {
    id: Uuid,
    senior_id: Uuid,
    occurred_at: NaiveDateTime,
    event_type: String,
    monitor_mode: String,
    base64_image: Option<String>,
    is_read: bool,
    is_dismissed: bool,
}
impl CareAlertRecord {
    fn to_domain(self) -> PortResult<CareAlert> {
        Ok(CareAlert {
            id: self.id,
            senior_id: self.senior_id,
            timestamp: self.occurred_at,
            event_type: self.event_type.parse().map_err(corrupt)?,
            monitor_mode: self.monitor_mode.parse().map_err(corrupt)?,
            base64_image: self.base64_image,
            is_read: self.is_read,
            is_dismissed: self.is_dismissed,
        })
    }
}

#[derive(FromRow)]
struct SensorStatRecord {
    id: Uuid,
    senior_id: Uuid,
    measured_at: NaiveDateTime,
    camera_fall_detected: bool,
    wearable_fall_detected: bool,
    temperature: f64,
    humidity: f64,
    heart_rate: i32,
    wearable_battery: f64,
}
impl SensorStatRecord {
    fn to_domain(self) -> SensorStat {
        SensorStat {
            id: self.id,
            senior_id: self.senior_id,
            timestamp: self.measured_at,
            camera_fall_detected: self.camera_fall_detected,
            wearable_fall_detected: self.wearable_fall_detected,
            temperature: self.temperature,
            humidity: self.humidity,
            heart_rate: self.heart_rate,
            wearable_battery: self.wearable_battery,
        }
    }
}

#[derive(FromRow)]
struct MedicineRecord {
    id: Uuid,
    senior_id: Uuid,
    name: String,
    description: Option<String>,
    dose_amount: Option<f64>,
    dose_instruction: Option<String>,
    days_of_week: String,
    intake_time: Option<NaiveTime>,
    time_categories: String,
    memo: Option<String>,
}
impl MedicineRecord {
    fn to_domain(self) -> PortResult<Medicine> {
        Ok(Medicine {
            id: self.id,
            senior_id: self.senior_id,
            name: self.name,
            description: self.description,
            dose_amount: self.dose_amount,
            dose_instruction: self.dose_instruction,
            days_of_week: split_names(&self.days_of_week).map_err(corrupt)?,
            intake_time: self.intake_time,
            time_categories: split_names(&self.time_categories).map_err(corrupt)?,
            memo: self.memo,
        })
    }
}

#[derive(FromRow)]
struct MedicineHistoryRecord {
    id: Uuid,
    medicine_id: Uuid,
    recorded_at: NaiveDateTime,
    intake_amount: f64,
    status: String,
}
impl MedicineHistoryRecord {
    fn to_domain(self) -> PortResult<MedicineHistory> {
        Ok(MedicineHistory {
            id: self.id,
            medicine_id: self.medicine_id,
            recorded_at: self.recorded_at,
            intake_amount: self.intake_amount,
            status: self.status.parse().map_err(corrupt)?,
        })
    }
}

fn all_to_domain<R, T>(
    records: Vec<R>,
    to_domain: impl Fn(R) -> PortResult<T>,
) -> PortResult<Vec<T>> {
    records.into_iter().map(to_domain).collect()
}

//=========================================================================================
// `IdentityStore` Implementation
//=========================================================================================

#[async_trait]
impl IdentityStore for DbAdapter {
    async fn create_member(&self, member: NewMember) -> PortResult<Member> {
        let record = sqlx::query_as::<_, MemberRecord>(
            "INSERT INTO members (id, email, phone_number, hashed_password, name) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, email, phone_number, hashed_password, name",
        )
        .bind(Uuid::new_v4())
        .bind(&member.email)
        .bind(&member.phone_number)
        .bind(&member.hashed_password)
        .bind(&member.name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.to_domain())
    }

    async fn get_member(&self, member_id: Uuid) -> PortResult<Member> {
        let record = sqlx::query_as::<_, MemberRecord>(
            "SELECT id, email, phone_number, hashed_password, name FROM members WHERE id = $1",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Member {}", member_id)))?;
        Ok(record.to_domain())
    }

    async fn get_member_by_email(&self, email: &str) -> PortResult<Member> {
        let record = sqlx::query_as::<_, MemberRecord>(
            "SELECT id, email, phone_number, hashed_password, name FROM members WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Member {}", email)))?;
        Ok(record.to_domain())
    }

    async fn member_exists(&self, member_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM members WHERE id = $1)")
            .bind(member_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn member_email_exists(&self, email: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM members WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn member_phone_exists(&self, phone_number: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM members WHERE phone_number = $1)",
        )
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn create_senior(&self, senior: NewSenior) -> PortResult<Senior> {
        sqlx::query_as::<_, SeniorRecord>(
            "INSERT INTO seniors \
                 (id, user_id, hashed_password, name, age, gender, phone_number, address, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, user_id, hashed_password, name, age, gender, phone_number, \
                       address, note, monitored",
        )
        .bind(Uuid::new_v4())
        .bind(&senior.user_id)
        .bind(&senior.hashed_password)
        .bind(&senior.name)
        .bind(senior.age)
        .bind(senior.gender.as_str())
        .bind(&senior.phone_number)
        .bind(&senior.address)
        .bind(&senior.note)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?
        .to_domain()
    }

    async fn get_senior(&self, senior_id: Uuid) -> PortResult<Senior> {
        sqlx::query_as::<_, SeniorRecord>(
            "SELECT id, user_id, hashed_password, name, age, gender, phone_number, address, \
                    note, monitored \
             FROM seniors WHERE id = $1",
        )
        .bind(senior_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Senior {}", senior_id)))?
        .to_domain()
    }

    async fn get_senior_by_user_id(&self, user_id: &str) -> PortResult<Senior> {
        sqlx::query_as::<_, SeniorRecord>(
            "SELECT id, user_id, hashed_password, name, age, gender, phone_number, address, \
                    note, monitored \
             FROM seniors WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Senior {}", user_id)))?
        .to_domain()
    }

    async fn senior_exists(&self, senior_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM seniors WHERE id = $1)")
            .bind(senior_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn senior_user_id_exists(&self, user_id: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM seniors WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn senior_phone_exists(&self, phone_number: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM seniors WHERE phone_number = $1)",
        )
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn set_senior_monitored(&self, senior_id: Uuid, monitored: bool) -> PortResult<Senior> {
        sqlx::query_as::<_, SeniorRecord>(
            "UPDATE seniors SET monitored = $2 WHERE id = $1 \
             RETURNING id, user_id, hashed_password, name, age, gender, phone_number, \
                       address, note, monitored",
        )
        .bind(senior_id)
        .bind(monitored)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Senior {}", senior_id)))?
        .to_domain()
    }
}

//=========================================================================================
// `CareStore` Implementation
//=========================================================================================

#[async_trait]
impl CareStore for DbAdapter {
    async fn care_exists(&self, member_id: Uuid, senior_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM cares WHERE member_id = $1 AND senior_id = $2)",
        )
        .bind(member_id)
        .bind(senior_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn create_care(&self, member_id: Uuid, senior_id: Uuid) -> PortResult<Care> {
        let record = sqlx::query_as::<_, CareRecord>(
            "INSERT INTO cares (id, member_id, senior_id) VALUES ($1, $2, $3) \
             RETURNING id, member_id, senior_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(member_id)
        .bind(senior_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.to_domain())
    }

    async fn seniors_of_member(&self, member_id: Uuid) -> PortResult<Vec<Senior>> {
        let records = sqlx::query_as::<_, SeniorRecord>(
            "SELECT s.id, s.user_id, s.hashed_password, s.name, s.age, s.gender, \
                    s.phone_number, s.address, s.note, s.monitored \
             FROM cares c JOIN seniors s ON s.id = c.senior_id \
             WHERE c.member_id = $1 \
             ORDER BY s.name ASC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        all_to_domain(records, SeniorRecord::to_domain)
    }

    async fn members_of_senior(&self, senior_id: Uuid) -> PortResult<Vec<Member>> {
        let records = sqlx::query_as::<_, MemberRecord>(
            "SELECT m.id, m.email, m.phone_number, m.hashed_password, m.name \
             FROM cares c JOIN members m ON m.id = c.member_id \
             WHERE c.senior_id = $1 \
             ORDER BY m.name ASC",
        )
        .bind(senior_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(records.into_iter().map(MemberRecord::to_domain).collect())
    }
}

//=========================================================================================
// `DeviceStore` Implementation
//=========================================================================================

#[async_trait]
impl DeviceStore for DbAdapter {
    async fn create_device(&self, push_method: PushMethod, token: &str) -> PortResult<Device> {
        sqlx::query_as::<_, DeviceRecord>(
            "INSERT INTO devices (id, push_method, token, last_seen_at) VALUES ($1, $2, $3, now()) \
             RETURNING id, push_method, token, last_seen_at, member_id, senior_id",
        )
        .bind(Uuid::new_v4())
        .bind(push_method.as_str())
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?
        .to_domain()
    }

    async fn get_device(&self, device_id: Uuid) -> PortResult<Device> {
        sqlx::query_as::<_, DeviceRecord>(
            "SELECT id, push_method, token, last_seen_at, member_id, senior_id \
             FROM devices WHERE id = $1",
        )
        .bind(device_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Device {}", device_id)))?
        .to_domain()
    }

    async fn get_device_by_token(
        &self,
        push_method: PushMethod,
        token: &str,
    ) -> PortResult<Device> {
        sqlx::query_as::<_, DeviceRecord>(
            "SELECT id, push_method, token, last_seen_at, member_id, senior_id \
             FROM devices WHERE push_method = $1 AND token = $2",
        )
        .bind(push_method.as_str())
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("Device token"))?
        .to_domain()
    }

    async fn device_token_exists(&self, push_method: PushMethod, token: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM devices WHERE push_method = $1 AND token = $2)",
        )
        .bind(push_method.as_str())
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn save_device(&self, device: &Device) -> PortResult<Device> {
        let (member_id, senior_id) = match device.owner {
            Some(Owner::Member(id)) => (Some(id), None),
            Some(Owner::Senior(id)) => (None, Some(id)),
            None => (None, None),
        };
        sqlx::query_as::<_, DeviceRecord>(
            "UPDATE devices \
             SET token = $2, last_seen_at = $3, member_id = $4, senior_id = $5 \
             WHERE id = $1 \
             RETURNING id, push_method, token, last_seen_at, member_id, senior_id",
        )
        .bind(device.id)
        .bind(&device.token)
        .bind(device.last_seen_at)
        .bind(member_id)
        .bind(senior_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Device {}", device.id)))?
        .to_domain()
    }

    async fn delete_device(&self, device_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(device_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Device {} not found", device_id)));
        }
        Ok(())
    }

    async fn devices_of_owner(&self, owner: Owner) -> PortResult<Vec<Device>> {
        let sql = match owner {
            Owner::Member(_) => {
                "SELECT id, push_method, token, last_seen_at, member_id, senior_id \
                 FROM devices WHERE member_id = $1 ORDER BY last_seen_at DESC NULLS LAST"
            }
            Owner::Senior(_) => {
                "SELECT id, push_method, token, last_seen_at, member_id, senior_id \
                 FROM devices WHERE senior_id = $1 ORDER BY last_seen_at DESC NULLS LAST"
            }
        };
        let records = sqlx::query_as::<_, DeviceRecord>(sql)
            .bind(owner.id())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        all_to_domain(records, DeviceRecord::to_domain)
    }

    async fn devices_by_method(&self, push_method: PushMethod) -> PortResult<Vec<Device>> {
        let records = sqlx::query_as::<_, DeviceRecord>(
            "SELECT id, push_method, token, last_seen_at, member_id, senior_id \
             FROM devices WHERE push_method = $1 ORDER BY last_seen_at DESC NULLS LAST",
        )
        .bind(push_method.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        all_to_domain(records, DeviceRecord::to_domain)
    }
}

//=========================================================================================
// `TelemetryStore` Implementation
//=========================================================================================

#[async_trait]
impl TelemetryStore for DbAdapter {
    async fn create_alert(&self, senior_id: Uuid, alert: NewCareAlert) -> PortResult<CareAlert> {
        sqlx::query_as::<_, CareAlertRecord>(
            "INSERT INTO care_alerts \
                 (id, senior_id, occurred_at, event_type, monitor_mode, base64_image, \
                  is_read, is_dismissed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, senior_id, occurred_at, event_type, monitor_mode, base64_image, \
                       is_read, is_dismissed",
        )
        .bind(Uuid::new_v4())
        .bind(senior_id)
        .bind(alert.timestamp)
        .bind(alert.event_type.as_str())
        .bind(alert.monitor_mode.as_str())
        .bind(&alert.base64_image)
        .bind(alert.is_read)
        .bind(alert.is_dismissed)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?
        .to_domain()
    }

    async fn get_alert(&self, alert_id: Uuid) -> PortResult<CareAlert> {
        sqlx::query_as::<_, CareAlertRecord>(
            "SELECT id, senior_id, occurred_at, event_type, monitor_mode, base64_image, \
                    is_read, is_dismissed \
             FROM care_alerts WHERE id = $1",
        )
        .bind(alert_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Alert {}", alert_id)))?
        .to_domain()
    }

    async fn recent_alerts(&self, senior_id: Uuid, limit: i64) -> PortResult<Vec<CareAlert>> {
        let records = sqlx::query_as::<_, CareAlertRecord>(
            "SELECT id, senior_id, occurred_at, event_type, monitor_mode, base64_image, \
                    is_read, is_dismissed \
             FROM care_alerts \
             WHERE senior_id = $1 AND NOT is_dismissed \
             ORDER BY occurred_at DESC \
             LIMIT $2",
        )
        .bind(senior_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        all_to_domain(records, CareAlertRecord::to_domain)
    }

    async fn count_unread_alerts(&self, senior_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM care_alerts \
             WHERE senior_id = $1 AND NOT is_read AND NOT is_dismissed",
        )
        .bind(senior_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn create_stat(&self, senior_id: Uuid, stat: NewSensorStat) -> PortResult<SensorStat> {
        let record = sqlx::query_as::<_, SensorStatRecord>(
            "INSERT INTO sensor_stats \
                 (id, senior_id, measured_at, camera_fall_detected, wearable_fall_detected, \
                  temperature, humidity, heart_rate, wearable_battery) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, senior_id, measured_at, camera_fall_detected, wearable_fall_detected, \
                       temperature, humidity, heart_rate, wearable_battery",
        )
        .bind(Uuid::new_v4())
        .bind(senior_id)
        .bind(stat.timestamp)
        .bind(stat.camera_fall_detected)
        .bind(stat.wearable_fall_detected)
        .bind(stat.temperature)
        .bind(stat.humidity)
        .bind(stat.heart_rate)
        .bind(stat.wearable_battery)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.to_domain())
    }

    async fn recent_stats(&self, senior_id: Uuid, limit: i64) -> PortResult<Vec<SensorStat>> {
        let records = sqlx::query_as::<_, SensorStatRecord>(
            "SELECT id, senior_id, measured_at, camera_fall_detected, wearable_fall_detected, \
                    temperature, humidity, heart_rate, wearable_battery \
             FROM sensor_stats \
             WHERE senior_id = $1 \
             ORDER BY measured_at DESC \
             LIMIT $2",
        )
        .bind(senior_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(records.into_iter().map(SensorStatRecord::to_domain).collect())
    }
}

//=========================================================================================
// `MedicineStore` Implementation
//=========================================================================================

#[async_trait]
impl MedicineStore for DbAdapter {
    async fn create_medicine(
        &self,
        senior_id: Uuid,
        medicine: NewMedicine,
    ) -> PortResult<Medicine> {
        sqlx::query_as::<_, MedicineRecord>(
            "INSERT INTO medicines \
                 (id, senior_id, name, description, dose_amount, dose_instruction, \
                  days_of_week, intake_time, time_categories, memo) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id, senior_id, name, description, dose_amount, dose_instruction, \
                       days_of_week, intake_time, time_categories, memo",
        )
        .bind(Uuid::new_v4())
        .bind(senior_id)
        .bind(&medicine.name)
        .bind(&medicine.description)
        .bind(medicine.dose_amount)
        .bind(&medicine.dose_instruction)
        .bind(join_names(&medicine.days_of_week))
        .bind(medicine.intake_time)
        .bind(join_names(&medicine.time_categories))
        .bind(&medicine.memo)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?
        .to_domain()
    }

    async fn get_medicine(&self, medicine_id: Uuid) -> PortResult<Medicine> {
        sqlx::query_as::<_, MedicineRecord>(
            "SELECT id, senior_id, name, description, dose_amount, dose_instruction, \
                    days_of_week, intake_time, time_categories, memo \
             FROM medicines WHERE id = $1",
        )
        .bind(medicine_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Medicine {}", medicine_id)))?
        .to_domain()
    }

    async fn medicines_of_senior(&self, senior_id: Uuid) -> PortResult<Vec<Medicine>> {
        let records = sqlx::query_as::<_, MedicineRecord>(
            "SELECT id, senior_id, name, description, dose_amount, dose_instruction, \
                    days_of_week, intake_time, time_categories, memo \
             FROM medicines WHERE senior_id = $1 ORDER BY created_at ASC",
        )
        .bind(senior_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        all_to_domain(records, MedicineRecord::to_domain)
    }

    async fn delete_medicine(&self, medicine_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query("DELETE FROM medicine_histories WHERE medicine_id = $1")
            .bind(medicine_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(medicine_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Medicine {} not found",
                medicine_id
            )));
        }
        tx.commit().await.map_err(db_error)
    }

    async fn create_history(
        &self,
        medicine_id: Uuid,
        history: NewMedicineHistory,
    ) -> PortResult<MedicineHistory> {
        sqlx::query_as::<_, MedicineHistoryRecord>(
            "INSERT INTO medicine_histories (id, medicine_id, recorded_at, intake_amount, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, medicine_id, recorded_at, intake_amount, status",
        )
        .bind(Uuid::new_v4())
        .bind(medicine_id)
        .bind(history.recorded_at)
        .bind(history.intake_amount)
        .bind(history.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?
        .to_domain()
    }

    async fn histories_of_medicine(
        &self,
        medicine_id: Uuid,
        since: Option<NaiveDateTime>,
    ) -> PortResult<Vec<MedicineHistory>> {
        let records = sqlx::query_as::<_, MedicineHistoryRecord>(
            "SELECT id, medicine_id, recorded_at, intake_amount, status \
             FROM medicine_histories \
             WHERE medicine_id = $1 AND ($2::timestamp IS NULL OR recorded_at >= $2) \
             ORDER BY recorded_at ASC",
        )
        .bind(medicine_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        all_to_domain(records, MedicineHistoryRecord::to_domain)
    }
}
