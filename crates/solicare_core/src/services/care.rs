//! crates/solicare_core/src/services/care.rs
//!
//! Care relationships between members and seniors, and the telemetry a senior's
//! hardware reports: sensor stats and alerts. Alert ingestion routes a push
//! notification depending on the event.

use futures::future::{join_all, try_join_all};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    CareAlert, Member, NewCareAlert, NewSensorStat, Owner, PushChannel, PushMessage, Senior,
    SensorStat,
};
use crate::outcome::{Outcome, Status, StatusKind};
use crate::ports::{
    CareStore, CredentialHasher, IdentityStore, OptionalExt, PortError, PortResult,
    TelemetryStore,
};
use crate::services::push::PushService;

/// Alerts listed in a senior's detail view.
pub const DETAIL_ALERT_LIMIT: i64 = 5;
/// Sensor stats listed in a senior's detail view.
pub const DETAIL_STAT_LIMIT: i64 = 20;

pub mod status {
    use super::*;

    pub const LINKED: Status =
        Status::new(StatusKind::Created, "CARE201", "The care link was created.");
    pub const ALREADY_LINKED: Status = Status::new(
        StatusKind::Conflict,
        "CARE409",
        "The member and the senior are already linked.",
    );
    pub const INVALID_SENIOR_PASSWORD: Status = Status::new(
        StatusKind::Unauthorized,
        "SENIOR401",
        "The senior's password does not match.",
    );
    pub const INVALID_MEMBER_PASSWORD: Status = Status::new(
        StatusKind::Unauthorized,
        "MEMBER401",
        "The member's password does not match.",
    );
    pub const QUERIED: Status =
        Status::new(StatusKind::Success, "CARE200", "The care data was retrieved.");
    pub const STAT_RECORDED: Status =
        Status::new(StatusKind::Created, "STAT201", "The sensor stat was recorded.");
    pub const ALERT_RECORDED: Status =
        Status::new(StatusKind::Created, "ALERT201", "The alert was recorded.");
    pub const MONITORING_UPDATED: Status = Status::new(
        StatusKind::Success,
        "MONITOR200",
        "The monitoring flag was updated.",
    );
    pub const MEMBER_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "MEMBER404", "The member could not be found.");
    pub const SENIOR_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "SENIOR404", "The senior could not be found.");
    pub const ALERT_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "ALERT404", "The alert could not be found.");
    pub const UNLINK_NOT_IMPLEMENTED: Status = Status::new(
        StatusKind::NotImplemented,
        "CARE501",
        "Removing a care link is not supported yet.",
    );
    pub const CARE_ERROR: Status = Status::new(
        StatusKind::Internal,
        "CARE500",
        "An error occurred while processing the care request.",
    );
}

use status::*;

/// Credentials of the senior a member wants to monitor.
#[derive(Debug, Clone)]
pub struct SeniorLink {
    pub user_id: String,
    pub password: String,
}

/// Credentials of the member a senior wants to be monitored by.
#[derive(Debug, Clone)]
pub struct MemberLink {
    pub email: String,
    pub password: String,
}

/// A senior as listed to one of its caregivers.
#[derive(Debug, Clone)]
pub struct LinkedSenior {
    pub senior: Senior,
    pub unread_alerts: i64,
}

/// Everything a caregiver's dashboard shows for one senior.
#[derive(Debug, Clone)]
pub struct SeniorDetail {
    pub senior: Senior,
    pub alerts: Vec<CareAlert>,
    pub stats: Vec<SensorStat>,
}

pub struct CareService {
    identity: Arc<dyn IdentityStore>,
    care: Arc<dyn CareStore>,
    telemetry: Arc<dyn TelemetryStore>,
    hasher: Arc<dyn CredentialHasher>,
    push: Arc<PushService>,
}

impl CareService {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        care: Arc<dyn CareStore>,
        telemetry: Arc<dyn TelemetryStore>,
        hasher: Arc<dyn CredentialHasher>,
        push: Arc<PushService>,
    ) -> Self {
        Self {
            identity,
            care,
            telemetry,
            hasher,
            push,
        }
    }

    //=====================================================================================
    // Care links
    //=====================================================================================

    /// Links `member_id` to the senior whose credentials are given.
    pub async fn link_senior_to_member(
        &self,
        member_id: Uuid,
        link: SeniorLink,
    ) -> Outcome<LinkedSenior> {
        Outcome::settle(self.try_link_senior_to_member(member_id, link).await, CARE_ERROR)
    }

    async fn try_link_senior_to_member(
        &self,
        member_id: Uuid,
        link: SeniorLink,
    ) -> PortResult<Outcome<LinkedSenior>> {
        let Some(member) = self.identity.get_member(member_id).await.optional()? else {
            return Ok(Outcome::of(MEMBER_NOT_FOUND));
        };
        let Some(senior) = self
            .identity
            .get_senior_by_user_id(&link.user_id)
            .await
            .optional()?
        else {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        };
        if self.care.care_exists(member.id, senior.id).await? {
            return Ok(Outcome::of(ALREADY_LINKED));
        }
        if !self.hasher.verify(&link.password, &senior.hashed_password)? {
            return Ok(Outcome::of(INVALID_SENIOR_PASSWORD));
        }

        match self.care.create_care(member.id, senior.id).await {
            Ok(_) => {}
            Err(PortError::Conflict(_)) => return Ok(Outcome::of(ALREADY_LINKED)),
            Err(e) => return Err(e),
        }
        info!(member_id = %member.id, senior_id = %senior.id, "Care link created by member");

        let message = PushMessage::new(
            PushChannel::Info,
            "New monitoring target",
            format!("{} added you as a caregiver.", senior.name),
        );
        self.push.notify(Owner::Member(member.id), &message).await;

        Ok(Outcome::with(
            LINKED,
            LinkedSenior {
                senior,
                unread_alerts: 0,
            },
        ))
    }

    /// Links `senior_id` to the member whose credentials are given.
    pub async fn link_member_to_senior(
        &self,
        senior_id: Uuid,
        link: MemberLink,
    ) -> Outcome<Member> {
        Outcome::settle(self.try_link_member_to_senior(senior_id, link).await, CARE_ERROR)
    }

    async fn try_link_member_to_senior(
        &self,
        senior_id: Uuid,
        link: MemberLink,
    ) -> PortResult<Outcome<Member>> {
        let Some(member) = self
            .identity
            .get_member_by_email(&link.email)
            .await
            .optional()?
        else {
            return Ok(Outcome::of(MEMBER_NOT_FOUND));
        };
        let Some(senior) = self.identity.get_senior(senior_id).await.optional()? else {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        };
        if self.care.care_exists(member.id, senior.id).await? {
            return Ok(Outcome::of(ALREADY_LINKED));
        }
        if !self.hasher.verify(&link.password, &member.hashed_password)? {
            return Ok(Outcome::of(INVALID_MEMBER_PASSWORD));
        }

        match self.care.create_care(member.id, senior.id).await {
            Ok(_) => {}
            Err(PortError::Conflict(_)) => return Ok(Outcome::of(ALREADY_LINKED)),
            Err(e) => return Err(e),
        }
        info!(member_id = %member.id, senior_id = %senior.id, "Care link created by senior");

        let message = PushMessage::new(
            PushChannel::Info,
            "New caregiver",
            format!("{} started monitoring you.", member.name),
        );
        self.push.notify(Owner::Senior(senior.id), &message).await;

        Ok(Outcome::with(LINKED, member))
    }

    /// Removing a care link is reported as not implemented.
    pub async fn unlink(&self, member_id: Uuid, senior_id: Uuid) -> Outcome<()> {
        info!(%member_id, %senior_id, "Care unlink requested");
        Outcome::of(UNLINK_NOT_IMPLEMENTED)
    }

    pub async fn query_seniors_by_member(&self, member_id: Uuid) -> Outcome<Vec<LinkedSenior>> {
        Outcome::settle(self.try_query_seniors_by_member(member_id).await, CARE_ERROR)
    }

    async fn try_query_seniors_by_member(
        &self,
        member_id: Uuid,
    ) -> PortResult<Outcome<Vec<LinkedSenior>>> {
        if !self.identity.member_exists(member_id).await? {
            return Ok(Outcome::of(MEMBER_NOT_FOUND));
        }
        let seniors = self.care.seniors_of_member(member_id).await?;
        let linked = try_join_all(seniors.into_iter().map(|senior| async move {
            let unread_alerts = self.telemetry.count_unread_alerts(senior.id).await?;
            Ok::<_, PortError>(LinkedSenior {
                senior,
                unread_alerts,
            })
        }))
        .await?;
        Ok(Outcome::with(QUERIED, linked))
    }

    pub async fn query_members_by_senior(&self, senior_id: Uuid) -> Outcome<Vec<Member>> {
        Outcome::settle(self.try_query_members_by_senior(senior_id).await, CARE_ERROR)
    }

    async fn try_query_members_by_senior(
        &self,
        senior_id: Uuid,
    ) -> PortResult<Outcome<Vec<Member>>> {
        if !self.identity.senior_exists(senior_id).await? {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        }
        let members = self.care.members_of_senior(senior_id).await?;
        Ok(Outcome::with(QUERIED, members))
    }

    pub async fn has_member_access_to_senior(
        &self,
        member_id: Uuid,
        senior_id: Uuid,
    ) -> Outcome<bool> {
        let result = self
            .care
            .care_exists(member_id, senior_id)
            .await
            .map(|linked| Outcome::with(QUERIED, linked));
        Outcome::settle(result, CARE_ERROR)
    }

    //=====================================================================================
    // Monitoring
    //=====================================================================================

    pub async fn get_monitoring(&self, senior_id: Uuid) -> Outcome<bool> {
        let result = match self.identity.get_senior(senior_id).await.optional() {
            Ok(Some(senior)) => Ok(Outcome::with(QUERIED, senior.monitored)),
            Ok(None) => Ok(Outcome::of(SENIOR_NOT_FOUND)),
            Err(e) => Err(e),
        };
        Outcome::settle(result, CARE_ERROR)
    }

    pub async fn set_monitoring(&self, senior_id: Uuid, enabled: bool) -> Outcome<Senior> {
        Outcome::settle(self.try_set_monitoring(senior_id, enabled).await, CARE_ERROR)
    }

    async fn try_set_monitoring(
        &self,
        senior_id: Uuid,
        enabled: bool,
    ) -> PortResult<Outcome<Senior>> {
        let Some(senior) = self
            .identity
            .set_senior_monitored(senior_id, enabled)
            .await
            .optional()?
        else {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        };
        info!(%senior_id, enabled, "Monitoring flag changed");
        Ok(Outcome::with(MONITORING_UPDATED, senior))
    }

    //=====================================================================================
    // Telemetry
    //=====================================================================================

    pub async fn add_sensor_stat(
        &self,
        senior_id: Uuid,
        stat: NewSensorStat,
    ) -> Outcome<SensorStat> {
        Outcome::settle(self.try_add_sensor_stat(senior_id, stat).await, CARE_ERROR)
    }

    async fn try_add_sensor_stat(
        &self,
        senior_id: Uuid,
        stat: NewSensorStat,
    ) -> PortResult<Outcome<SensorStat>> {
        if !self.identity.senior_exists(senior_id).await? {
            return Ok(missing_senior(senior_id));
        }
        let stat = self.telemetry.create_stat(senior_id, stat).await?;
        Ok(Outcome::with(STAT_RECORDED, stat))
    }

    /// Stores an alert, then notifies whoever should hear about it.
    ///
    /// Battery warnings go to the senior's own devices only. Every other event
    /// goes to each linked member and never to the senior.
    pub async fn add_care_alert(&self, senior_id: Uuid, alert: NewCareAlert) -> Outcome<CareAlert> {
        Outcome::settle(self.try_add_care_alert(senior_id, alert).await, CARE_ERROR)
    }

    async fn try_add_care_alert(
        &self,
        senior_id: Uuid,
        alert: NewCareAlert,
    ) -> PortResult<Outcome<CareAlert>> {
        let Some(senior) = self.identity.get_senior(senior_id).await.optional()? else {
            return Ok(missing_senior(senior_id));
        };
        let alert = self.telemetry.create_alert(senior.id, alert).await?;
        info!(alert_id = %alert.id, %senior_id, event = %alert.event_type, "Alert recorded");

        self.route_alert(&senior, &alert).await;
        Ok(Outcome::with(ALERT_RECORDED, alert))
    }

    async fn route_alert(&self, senior: &Senior, alert: &CareAlert) {
        let event = alert.event_type;
        if event.is_device_health() {
            let message = PushMessage::new(PushChannel::Alert, event.title(), event.message())
                .with_data("eventUuid", alert.id.to_string())
                .with_data("seniorUuid", senior.id.to_string());
            self.push.notify(Owner::Senior(senior.id), &message).await;
            return;
        }

        let members = match self.care.members_of_senior(senior.id).await {
            Ok(members) => members,
            Err(e) => {
                warn!(senior_id = %senior.id, "Could not resolve caregivers for alert: {}", e);
                return;
            }
        };
        let title = format!(
            "[{}] {} ({}, {})",
            event.title(),
            senior.name,
            senior.gender.text(),
            senior.age
        );
        let message = PushMessage::new(PushChannel::Alert, title, event.message())
            .with_data("eventUuid", alert.id.to_string())
            .with_data("seniorUuid", senior.id.to_string());
        join_all(
            members
                .iter()
                .map(|member| self.push.notify(Owner::Member(member.id), &message)),
        )
        .await;
    }

    pub async fn get_senior_detail(&self, senior_id: Uuid) -> Outcome<SeniorDetail> {
        Outcome::settle(self.try_get_senior_detail(senior_id).await, CARE_ERROR)
    }

    async fn try_get_senior_detail(&self, senior_id: Uuid) -> PortResult<Outcome<SeniorDetail>> {
        let Some(senior) = self.identity.get_senior(senior_id).await.optional()? else {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        };
        let alerts = self
            .telemetry
            .recent_alerts(senior_id, DETAIL_ALERT_LIMIT)
            .await?;
        let stats = self
            .telemetry
            .recent_stats(senior_id, DETAIL_STAT_LIMIT)
            .await?;
        Ok(Outcome::with(
            QUERIED,
            SeniorDetail {
                senior,
                alerts,
                stats,
            },
        ))
    }

    /// The alert, provided it belongs to `senior_id`.
    pub async fn get_alert_detail(&self, senior_id: Uuid, alert_id: Uuid) -> Outcome<CareAlert> {
        let result = match self.telemetry.get_alert(alert_id).await.optional() {
            Ok(Some(alert)) if alert.senior_id == senior_id => Ok(Outcome::with(QUERIED, alert)),
            Ok(_) => Ok(Outcome::of(ALERT_NOT_FOUND)),
            Err(e) => Err(e),
        };
        Outcome::settle(result, CARE_ERROR)
    }
}

fn missing_senior<T>(senior_id: Uuid) -> Outcome<T> {
    Outcome::failed(
        SENIOR_NOT_FOUND,
        PortError::NotFound(format!("Senior {} not found", senior_id)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Care, MonitorMode, SeniorEvent};
    use crate::ports::PushGateway;
    use crate::testing::{harness, Harness, InMemoryStore, PlainHasher, RecordingGateway};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDateTime, Utc};

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    fn stat(heart_rate: i32, temperature: f64) -> NewSensorStat {
        NewSensorStat {
            timestamp: now(),
            camera_fall_detected: false,
            wearable_fall_detected: false,
            temperature,
            humidity: 41.5,
            heart_rate,
            wearable_battery: 88.0,
        }
    }

    fn alert(event_type: SeniorEvent, at: NaiveDateTime) -> NewCareAlert {
        NewCareAlert {
            timestamp: at,
            event_type,
            monitor_mode: MonitorMode::FullMonitoring,
            base64_image: None,
            is_read: false,
            is_dismissed: false,
        }
    }

    fn link(user_id: &str, password: &str) -> SeniorLink {
        SeniorLink {
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    async fn setup_test() -> (Harness, Member, Senior) {
        let h = harness();
        let member = h.store.seed_member("m@x.com", "pw2").await;
        let senior = h.store.seed_senior("senior1", "pw1").await;
        (h, member, senior)
    }

    #[tokio::test]
    async fn linking_twice_reports_already_linked() {
        let (h, member, senior) = setup_test().await;
        let care = &h.services.care;

        let first = care.link_senior_to_member(member.id, link("senior1", "pw1")).await;
        assert_eq!(first.status, LINKED);
        let linked = first.payload.unwrap();
        assert_eq!(linked.senior.id, senior.id);
        assert_eq!(linked.unread_alerts, 0);

        let second = care.link_senior_to_member(member.id, link("senior1", "pw1")).await;
        assert_eq!(second.status, ALREADY_LINKED);
        assert_eq!(h.store.care_count(), 1);
    }

    #[tokio::test]
    async fn wrong_password_creates_no_link() {
        let (h, member, senior) = setup_test().await;
        let care = &h.services.care;

        let by_member = care.link_senior_to_member(member.id, link("senior1", "pw2")).await;
        assert_eq!(by_member.status, INVALID_SENIOR_PASSWORD);

        let by_senior = care
            .link_member_to_senior(
                senior.id,
                MemberLink {
                    email: "m@x.com".into(),
                    password: "pw1".into(),
                },
            )
            .await;
        assert_eq!(by_senior.status, INVALID_MEMBER_PASSWORD);
        assert_eq!(h.store.care_count(), 0);
    }

    #[tokio::test]
    async fn senior_side_link_checks_the_members_password() {
        let (h, member, senior) = setup_test().await;
        let outcome = h
            .services
            .care
            .link_member_to_senior(
                senior.id,
                MemberLink {
                    email: "m@x.com".into(),
                    password: "pw2".into(),
                },
            )
            .await;
        assert_eq!(outcome.status, LINKED);
        assert_eq!(outcome.payload.unwrap().id, member.id);
    }

    #[tokio::test]
    async fn access_follows_care_rows_exactly() {
        let (h, member, senior) = setup_test().await;
        let other = h.store.seed_senior("senior2", "pw").await;
        h.store.seed_care(member.id, senior.id).await;
        let care = &h.services.care;

        assert_eq!(
            care.has_member_access_to_senior(member.id, senior.id).await.payload,
            Some(true)
        );
        assert_eq!(
            care.has_member_access_to_senior(member.id, other.id).await.payload,
            Some(false)
        );
    }

    #[tokio::test]
    async fn linked_seniors_are_sorted_and_count_unread_alerts() {
        let (h, member, senior) = setup_test().await;
        let zed = h.store.seed_senior("zed", "pw").await;
        let abe = h.store.seed_senior("abe", "pw").await;
        for s in [&senior, &zed, &abe] {
            h.store.seed_care(member.id, s.id).await;
        }
        let mut read = alert(SeniorEvent::InactivityAlert, now());
        read.is_read = true;
        h.store.create_alert(abe.id, read).await.unwrap();
        h.store
            .create_alert(abe.id, alert(SeniorEvent::FallDetected, now()))
            .await
            .unwrap();

        let outcome = h.services.care.query_seniors_by_member(member.id).await;
        let names: Vec<_> = outcome
            .payload
            .unwrap()
            .into_iter()
            .map(|l| (l.senior.name, l.unread_alerts))
            .collect();
        assert_eq!(
            names,
            vec![
                ("abe".to_string(), 1),
                ("senior1".to_string(), 0),
                ("zed".to_string(), 0)
            ]
        );
    }

    #[tokio::test]
    async fn stat_for_unknown_senior_persists_nothing() {
        let (h, _, senior) = setup_test().await;
        let care = &h.services.care;

        let ok = care.add_sensor_stat(senior.id, stat(72, 36.6)).await;
        assert_eq!(ok.status, STAT_RECORDED);
        let recorded = ok.payload.unwrap();
        assert_eq!(recorded.heart_rate, 72);
        assert_eq!(recorded.temperature, 36.6);

        let missing = care.add_sensor_stat(Uuid::new_v4(), stat(80, 37.0)).await;
        assert!(!missing.is_success());
        assert!(matches!(missing.error, Some(PortError::NotFound(_))));
        assert_eq!(h.store.stat_count(), 1);
    }

    #[tokio::test]
    async fn battery_alerts_reach_only_the_senior() {
        let (h, member, senior) = setup_test().await;
        h.store.seed_care(member.id, senior.id).await;
        h.store.seed_device("senior-phone", Some(Owner::Senior(senior.id))).await;
        h.store.seed_device("member-phone", Some(Owner::Member(member.id))).await;

        let outcome = h
            .services
            .care
            .add_care_alert(senior.id, alert(SeniorEvent::CameraBatteryLow, now()))
            .await;
        assert_eq!(outcome.status, ALERT_RECORDED);
        assert_eq!(h.gateway.tokens(), vec!["senior-phone".to_string()]);
    }

    #[tokio::test]
    async fn fall_alerts_reach_every_caregiver_but_not_the_senior() {
        let (h, member, senior) = setup_test().await;
        let second = h.store.seed_member("n@x.com", "pw").await;
        h.store.seed_care(member.id, senior.id).await;
        h.store.seed_care(second.id, senior.id).await;
        h.store.seed_device("senior-phone", Some(Owner::Senior(senior.id))).await;
        h.store.seed_device("m-phone", Some(Owner::Member(member.id))).await;
        h.store.seed_device("n-phone", Some(Owner::Member(second.id))).await;

        let outcome = h
            .services
            .care
            .add_care_alert(senior.id, alert(SeniorEvent::FallDetected, now()))
            .await;
        let alert = outcome.payload.unwrap();

        let mut tokens = h.gateway.tokens();
        tokens.sort();
        assert_eq!(tokens, vec!["m-phone".to_string(), "n-phone".to_string()]);

        let (_, message) = &h.gateway.sent()[0];
        assert_eq!(message.title, "[Fall detected] senior1 (female, 81)");
        assert_eq!(message.data["eventUuid"], alert.id.to_string());
        assert_eq!(message.data["seniorUuid"], senior.id.to_string());
    }

    #[tokio::test]
    async fn alert_survives_a_failing_push() {
        let (h, member, senior) = setup_test().await;
        h.store.seed_care(member.id, senior.id).await;
        h.store.seed_device("m-phone", Some(Owner::Member(member.id))).await;
        h.gateway.fail_token("m-phone");

        let outcome = h
            .services
            .care
            .add_care_alert(senior.id, alert(SeniorEvent::InactivityAlert, now()))
            .await;
        assert_eq!(outcome.status, ALERT_RECORDED);
        assert_eq!(h.store.alert_count(), 1);
    }

    #[tokio::test]
    async fn detail_lists_recent_non_dismissed_alerts_newest_first() {
        let (h, _, senior) = setup_test().await;
        let base = now();
        for minutes in 0..7 {
            h.store
                .create_alert(
                    senior.id,
                    alert(SeniorEvent::InactivityAlert, base + Duration::minutes(minutes)),
                )
                .await
                .unwrap();
        }
        let mut dismissed = alert(SeniorEvent::FallDetected, base + Duration::hours(1));
        dismissed.is_dismissed = true;
        h.store.create_alert(senior.id, dismissed).await.unwrap();
        for _ in 0..25 {
            h.store.create_stat(senior.id, stat(70, 36.5)).await.unwrap();
        }

        let detail = h.services.care.get_senior_detail(senior.id).await.payload.unwrap();
        assert_eq!(detail.alerts.len(), 5);
        assert!(detail.alerts.iter().all(|a| !a.is_dismissed));
        assert_eq!(detail.alerts[0].timestamp, base + Duration::minutes(6));
        assert_eq!(detail.stats.len(), 20);
    }

    #[tokio::test]
    async fn alert_detail_is_scoped_to_its_senior() {
        let (h, _, senior) = setup_test().await;
        let other = h.store.seed_senior("senior2", "pw").await;
        let stored = h
            .store
            .create_alert(senior.id, alert(SeniorEvent::FallDetected, now()))
            .await
            .unwrap();

        let care = &h.services.care;
        assert_eq!(care.get_alert_detail(senior.id, stored.id).await.status, QUERIED);
        assert_eq!(
            care.get_alert_detail(other.id, stored.id).await.status,
            ALERT_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn monitoring_toggle_round_trips() {
        let (h, _, senior) = setup_test().await;
        let care = &h.services.care;

        assert_eq!(care.get_monitoring(senior.id).await.payload, Some(false));
        let updated = care.set_monitoring(senior.id, true).await;
        assert_eq!(updated.status, MONITORING_UPDATED);
        assert!(updated.payload.unwrap().monitored);
        assert_eq!(care.get_monitoring(senior.id).await.payload, Some(true));
        assert_eq!(
            care.set_monitoring(Uuid::new_v4(), true).await.status,
            SENIOR_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn unlink_is_not_implemented() {
        let (h, member, senior) = setup_test().await;
        h.store.seed_care(member.id, senior.id).await;
        let outcome = h.services.care.unlink(member.id, senior.id).await;
        assert_eq!(outcome.status.kind, StatusKind::NotImplemented);
        assert_eq!(h.store.care_count(), 1);
    }

    /// Answers every existence check with "no", as a concurrent request would
    /// see it just before the other one inserts.
    struct StaleCareStore(Arc<InMemoryStore>);

    #[async_trait]
    impl CareStore for StaleCareStore {
        async fn care_exists(&self, _member_id: Uuid, _senior_id: Uuid) -> PortResult<bool> {
            Ok(false)
        }

        async fn create_care(&self, member_id: Uuid, senior_id: Uuid) -> PortResult<Care> {
            self.0.create_care(member_id, senior_id).await
        }

        async fn seniors_of_member(&self, member_id: Uuid) -> PortResult<Vec<Senior>> {
            self.0.seniors_of_member(member_id).await
        }

        async fn members_of_senior(&self, senior_id: Uuid) -> PortResult<Vec<Member>> {
            self.0.members_of_senior(senior_id).await
        }
    }

    #[tokio::test]
    async fn duplicate_caught_by_the_store_is_still_already_linked() {
        let store = Arc::new(InMemoryStore::new());
        let member = store.seed_member("m@x.com", "pw2").await;
        let senior = store.seed_senior("senior1", "pw1").await;
        let gateways: Vec<Arc<dyn PushGateway>> = vec![Arc::new(RecordingGateway::new())];
        let push = Arc::new(PushService::new(store.clone(), store.clone(), gateways));
        let care = CareService::new(
            store.clone(),
            Arc::new(StaleCareStore(store.clone())),
            store.clone(),
            Arc::new(PlainHasher),
            push,
        );

        let first = care.link_senior_to_member(member.id, link("senior1", "pw1")).await;
        assert_eq!(first.status, LINKED);

        let second = care.link_senior_to_member(member.id, link("senior1", "pw1")).await;
        assert_eq!(second.status, ALREADY_LINKED);
        assert!(second.error.is_none());

        let from_senior = care
            .link_member_to_senior(
                senior.id,
                MemberLink {
                    email: "m@x.com".into(),
                    password: "pw2".into(),
                },
            )
            .await;
        assert_eq!(from_senior.status, ALREADY_LINKED);
        assert_eq!(store.care_count(), 1);
    }
}
