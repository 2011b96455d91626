//! crates/solicare_core/src/services/push.rs
//!
//! Notification dispatch. A batch resolves every device of one owner and hands
//! the message to the gateway registered for each device's push method. Every
//! delivery is accounted for on its own; a failed device never hides the others.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Device, Owner, PushMessage, PushMethod};
use crate::outcome::{Outcome, Status, StatusKind};
use crate::ports::{DeviceStore, IdentityStore, OptionalExt, PortResult, PushGateway};

pub mod status {
    use super::*;

    pub const BATCH_SUCCESS: Status = Status::new(
        StatusKind::Success,
        "PUSH200",
        "The message was delivered to every device.",
    );
    pub const PARTIAL: Status = Status::new(
        StatusKind::Success,
        "PUSH207",
        "The message was delivered to some of the devices.",
    );
    pub const SENT: Status = Status::new(
        StatusKind::Success,
        "PUSH200",
        "The message was delivered.",
    );
    pub const NO_DEVICES: Status = Status::new(
        StatusKind::NotFound,
        "PUSH404",
        "The owner has no registered devices.",
    );
    pub const OWNER_NOT_FOUND: Status = Status::new(
        StatusKind::NotFound,
        "OWNER404",
        "The owner of the devices could not be found.",
    );
    pub const FAILURE: Status = Status::new(
        StatusKind::Unavailable,
        "PUSH503",
        "The message could not be delivered.",
    );
    pub const PUSH_ERROR: Status = Status::new(
        StatusKind::Internal,
        "PUSH500",
        "An error occurred while sending the push message.",
    );
}

use status::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Sent,
    Error,
    Unavailable,
}

/// The result of handing one message to one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushDelivery {
    pub device_id: Option<Uuid>,
    pub status: DeliveryStatus,
    pub reason: Option<String>,
}

impl PushDelivery {
    fn sent(device_id: Option<Uuid>) -> Self {
        Self {
            device_id,
            status: DeliveryStatus::Sent,
            reason: None,
        }
    }

    fn error(device_id: Option<Uuid>, reason: impl Into<String>) -> Self {
        Self {
            device_id,
            status: DeliveryStatus::Error,
            reason: Some(reason.into()),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

pub struct PushService {
    identity: Arc<dyn IdentityStore>,
    devices: Arc<dyn DeviceStore>,
    gateways: HashMap<PushMethod, Arc<dyn PushGateway>>,
}

impl PushService {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        devices: Arc<dyn DeviceStore>,
        gateways: impl IntoIterator<Item = Arc<dyn PushGateway>>,
    ) -> Self {
        let gateways = gateways
            .into_iter()
            .map(|gateway| (gateway.push_method(), gateway))
            .collect();
        Self {
            identity,
            devices,
            gateways,
        }
    }

    /// Sends `message` to every device owned by `owner`, concurrently.
    ///
    /// The payload lists one delivery per device. An owner without devices
    /// yields `NO_DEVICES` with an empty list, which is distinct from `FAILURE`.
    pub async fn push_batch(
        &self,
        owner: Owner,
        message: &PushMessage,
    ) -> Outcome<Vec<PushDelivery>> {
        let result = self.try_push_batch(owner, message).await;
        Outcome::settle(result, PUSH_ERROR)
    }

    async fn try_push_batch(
        &self,
        owner: Owner,
        message: &PushMessage,
    ) -> PortResult<Outcome<Vec<PushDelivery>>> {
        if !self.owner_exists(owner).await? {
            return Ok(Outcome::with(OWNER_NOT_FOUND, Vec::new()));
        }

        let devices = self.devices.devices_of_owner(owner).await?;
        if devices.is_empty() {
            return Ok(Outcome::with(NO_DEVICES, Vec::new()));
        }

        let deliveries =
            join_all(devices.iter().map(|device| self.deliver(device, message))).await;
        let sent = deliveries.iter().filter(|d| d.is_sent()).count();
        let status = if sent == deliveries.len() {
            BATCH_SUCCESS
        } else if sent == 0 {
            FAILURE
        } else {
            PARTIAL
        };
        debug!(?owner, sent, total = deliveries.len(), "Push batch finished");
        Ok(Outcome::with(status, deliveries))
    }

    /// Sends `message` to a single registered device.
    pub async fn send_push_to_device(
        &self,
        device_id: Uuid,
        message: &PushMessage,
    ) -> PushDelivery {
        match self.devices.get_device(device_id).await.optional() {
            Ok(Some(device)) => self.deliver(&device, message).await,
            Ok(None) => PushDelivery {
                device_id: Some(device_id),
                status: DeliveryStatus::Unavailable,
                reason: Some("Device not found".to_string()),
            },
            Err(e) => PushDelivery::error(Some(device_id), e.to_string()),
        }
    }

    /// Sends `message` straight to a token, whether or not it is registered.
    pub async fn send_to_token(
        &self,
        push_method: PushMethod,
        token: &str,
        message: &PushMessage,
    ) -> Outcome<PushDelivery> {
        let delivery = self.send_with(push_method, token, None, message).await;
        let status = if delivery.is_sent() { SENT } else { FAILURE };
        Outcome::with(status, delivery)
    }

    /// Pushes a side-channel notification. The result is only logged.
    pub async fn notify(&self, owner: Owner, message: &PushMessage) {
        let outcome = self.push_batch(owner, message).await;
        if !outcome.is_success() {
            warn!(
                ?owner,
                code = outcome.status.code,
                error = ?outcome.error,
                "Notification '{}' was not delivered",
                message.title
            );
        }
    }

    async fn deliver(&self, device: &Device, message: &PushMessage) -> PushDelivery {
        self.send_with(device.push_method, &device.token, Some(device.id), message)
            .await
    }

    async fn send_with(
        &self,
        push_method: PushMethod,
        token: &str,
        device_id: Option<Uuid>,
        message: &PushMessage,
    ) -> PushDelivery {
        let Some(gateway) = self.gateways.get(&push_method) else {
            return PushDelivery::error(
                device_id,
                format!("Unsupported push method: {}", push_method),
            );
        };
        match gateway.send(token, message).await {
            Ok(()) => PushDelivery::sent(device_id),
            Err(e) => {
                warn!(?device_id, "Push delivery failed: {}", e);
                PushDelivery::error(device_id, e.to_string())
            }
        }
    }

    async fn owner_exists(&self, owner: Owner) -> PortResult<bool> {
        match owner {
            Owner::Member(id) => self.identity.member_exists(id).await,
            Owner::Senior(id) => self.identity.senior_exists(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PushChannel;
    use crate::testing::harness;

    fn message() -> PushMessage {
        PushMessage::new(PushChannel::Info, "Hello", "World")
    }

    #[tokio::test]
    async fn owner_without_devices_gets_no_deliveries() {
        let h = harness();
        let member = h.store.seed_member("m@x.com", "pw").await;

        let outcome = h.services.push.push_batch(Owner::Member(member.id), &message()).await;

        assert_eq!(outcome.status, NO_DEVICES);
        assert_ne!(outcome.status, FAILURE);
        assert_eq!(outcome.payload, Some(Vec::new()));
    }

    #[tokio::test]
    async fn missing_owner_short_circuits() {
        let h = harness();
        let outcome = h
            .services
            .push
            .push_batch(Owner::Senior(Uuid::new_v4()), &message())
            .await;
        assert_eq!(outcome.status, OWNER_NOT_FOUND);
        assert!(h.gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn batch_status_reflects_each_delivery() {
        let h = harness();
        let member = h.store.seed_member("m@x.com", "pw").await;
        let owner = Owner::Member(member.id);
        h.store.seed_device("good", Some(owner)).await;
        h.store.seed_device("bad", Some(owner)).await;
        h.store.seed_device("unowned", None).await;

        let outcome = h.services.push.push_batch(owner, &message()).await;
        assert_eq!(outcome.status, BATCH_SUCCESS);
        let deliveries = outcome.payload.unwrap();
        assert_eq!(deliveries.len(), 2);
        assert!(deliveries.iter().all(|d| d.is_sent()));

        h.gateway.fail_token("bad");
        let outcome = h.services.push.push_batch(owner, &message()).await;
        assert_eq!(outcome.status, PARTIAL);
        assert_eq!(
            outcome.payload.unwrap().iter().filter(|d| d.is_sent()).count(),
            1
        );

        h.gateway.fail_token("good");
        let outcome = h.services.push.push_batch(owner, &message()).await;
        assert_eq!(outcome.status, FAILURE);
    }

    #[tokio::test]
    async fn unknown_device_is_unavailable() {
        let h = harness();
        let delivery = h
            .services
            .push
            .send_push_to_device(Uuid::new_v4(), &message())
            .await;
        assert_eq!(delivery.status, DeliveryStatus::Unavailable);
    }
}
