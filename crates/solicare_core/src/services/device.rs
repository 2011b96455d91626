//! crates/solicare_core/src/services/device.rs
//!
//! Push token lifecycle and device ownership.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Device, Owner, PushChannel, PushMessage, PushMethod};
use crate::outcome::{Outcome, Status, StatusKind};
use crate::ports::{DeviceStore, IdentityStore, OptionalExt, PortError, PortResult};
use crate::services::push::PushService;

pub mod status {
    use super::*;

    pub const CREATED: Status =
        Status::new(StatusKind::Created, "DEVICE201", "The device was registered.");
    pub const UPDATED: Status =
        Status::new(StatusKind::Success, "DEVICE200", "The device token was renewed.");
    pub const DELETED: Status =
        Status::new(StatusKind::Success, "DEVICE200", "The device was unregistered.");
    pub const LINKED: Status =
        Status::new(StatusKind::Success, "DEVICE200", "The device was linked.");
    pub const UNLINKED: Status =
        Status::new(StatusKind::Success, "DEVICE200", "The device was unlinked.");
    pub const DEVICES_FOUND: Status =
        Status::new(StatusKind::Success, "DEVICE200", "The devices were retrieved.");
    pub const ALREADY_EXISTS: Status = Status::new(
        StatusKind::Conflict,
        "DEVICE409",
        "The device token is already registered.",
    );
    pub const ALREADY_LINKED: Status = Status::new(
        StatusKind::Conflict,
        "DEVICE409",
        "The device is already linked to this owner.",
    );
    pub const DEVICE_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "DEVICE404", "The device could not be found.");
    pub const TOKEN_NOT_FOUND: Status = Status::new(
        StatusKind::NotFound,
        "TOKEN404",
        "The device token is not registered.",
    );
    pub const MEMBER_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "MEMBER404", "The member could not be found.");
    pub const SENIOR_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "SENIOR404", "The senior could not be found.");
    pub const DEVICE_ERROR: Status = Status::new(
        StatusKind::Internal,
        "DEVICE500",
        "An error occurred while processing the device.",
    );
}

use status::*;

pub struct DeviceService {
    identity: Arc<dyn IdentityStore>,
    devices: Arc<dyn DeviceStore>,
    push: Arc<PushService>,
}

impl DeviceService {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        devices: Arc<dyn DeviceStore>,
        push: Arc<PushService>,
    ) -> Self {
        Self {
            identity,
            devices,
            push,
        }
    }

    //=====================================================================================
    // Token lifecycle
    //=====================================================================================

    /// Stores a new, unowned device for the token.
    pub async fn register(&self, push_method: PushMethod, token: &str) -> Outcome<Device> {
        Outcome::settle(self.try_register(push_method, token).await, DEVICE_ERROR)
    }

    async fn try_register(
        &self,
        push_method: PushMethod,
        token: &str,
    ) -> PortResult<Outcome<Device>> {
        if self.devices.device_token_exists(push_method, token).await? {
            return Ok(Outcome::of(ALREADY_EXISTS));
        }
        let device = match self.devices.create_device(push_method, token).await {
            Ok(device) => device,
            Err(PortError::Conflict(_)) => return Ok(Outcome::of(ALREADY_EXISTS)),
            Err(e) => return Err(e),
        };
        info!(device_id = %device.id, %push_method, "Device registered");
        Ok(Outcome::with(CREATED, device))
    }

    /// Replaces `old_token` with `new_token`, keeping the device and its owner.
    /// An unknown old token registers the new one instead.
    pub async fn renew(
        &self,
        push_method: PushMethod,
        old_token: &str,
        new_token: &str,
    ) -> Outcome<Device> {
        Outcome::settle(
            self.try_renew(push_method, old_token, new_token).await,
            DEVICE_ERROR,
        )
    }

    async fn try_renew(
        &self,
        push_method: PushMethod,
        old_token: &str,
        new_token: &str,
    ) -> PortResult<Outcome<Device>> {
        let Some(mut device) = self
            .devices
            .get_device_by_token(push_method, old_token)
            .await
            .optional()?
        else {
            return self.try_register(push_method, new_token).await;
        };
        if self.devices.device_token_exists(push_method, new_token).await? {
            return Ok(Outcome::of(ALREADY_EXISTS));
        }
        device.renew(new_token);
        let device = match self.devices.save_device(&device).await {
            Ok(device) => device,
            Err(PortError::Conflict(_)) => return Ok(Outcome::of(ALREADY_EXISTS)),
            Err(e) => return Err(e),
        };
        Ok(Outcome::with(UPDATED, device))
    }

    pub async fn unregister(&self, push_method: PushMethod, token: &str) -> Outcome<()> {
        Outcome::settle(self.try_unregister(push_method, token).await, DEVICE_ERROR)
    }

    async fn try_unregister(
        &self,
        push_method: PushMethod,
        token: &str,
    ) -> PortResult<Outcome<()>> {
        let Some(device) = self
            .devices
            .get_device_by_token(push_method, token)
            .await
            .optional()?
        else {
            return Ok(Outcome::of(DEVICE_NOT_FOUND));
        };
        self.devices.delete_device(device.id).await?;
        info!(device_id = %device.id, "Device unregistered");
        Ok(Outcome::of(DELETED))
    }

    //=====================================================================================
    // Ownership
    //=====================================================================================

    /// Hands the device to `owner`, taking it away from any previous owner.
    pub async fn link(&self, owner: Owner, device_id: Uuid) -> Outcome<Device> {
        Outcome::settle(self.try_link(owner, device_id).await, DEVICE_ERROR)
    }

    async fn try_link(&self, owner: Owner, device_id: Uuid) -> PortResult<Outcome<Device>> {
        let Some(mut device) = self.devices.get_device(device_id).await.optional()? else {
            return Ok(Outcome::of(DEVICE_NOT_FOUND));
        };
        if device.owner == Some(owner) {
            return Ok(Outcome::with(ALREADY_LINKED, device));
        }
        let exists = match owner {
            Owner::Member(id) => self.identity.member_exists(id).await?,
            Owner::Senior(id) => self.identity.senior_exists(id).await?,
        };
        if !exists {
            return Ok(Outcome::of(match owner {
                Owner::Member(_) => MEMBER_NOT_FOUND,
                Owner::Senior(_) => SENIOR_NOT_FOUND,
            }));
        }

        let announcement = PushMessage::new(
            PushChannel::Info,
            "New device connected",
            "A new device was connected to your account.",
        );
        self.push.notify(owner, &announcement).await;

        device.link(owner);
        let device = self.devices.save_device(&device).await?;
        info!(device_id = %device.id, ?owner, "Device linked");

        let welcome = PushMessage::new(
            PushChannel::Info,
            "Device connected",
            "This device was connected successfully.",
        );
        self.push.send_push_to_device(device.id, &welcome).await;

        Ok(Outcome::with(LINKED, device))
    }

    pub async fn unlink(&self, device_id: Uuid) -> Outcome<Device> {
        Outcome::settle(self.try_unlink(device_id).await, DEVICE_ERROR)
    }

    async fn try_unlink(&self, device_id: Uuid) -> PortResult<Outcome<Device>> {
        let Some(mut device) = self.devices.get_device(device_id).await.optional()? else {
            return Ok(Outcome::of(DEVICE_NOT_FOUND));
        };
        device.unlink();
        let device = self.devices.save_device(&device).await?;
        Ok(Outcome::with(UNLINKED, device))
    }

    //=====================================================================================
    // Queries
    //=====================================================================================

    pub async fn get_devices(&self, owner: Owner) -> Outcome<Vec<Device>> {
        let result = self
            .devices
            .devices_of_owner(owner)
            .await
            .map(|devices| Outcome::with(DEVICES_FOUND, devices));
        Outcome::settle(result, DEVICE_ERROR)
    }

    pub async fn get_all_devices(&self, push_method: PushMethod) -> Outcome<Vec<Device>> {
        let result = self
            .devices
            .devices_by_method(push_method)
            .await
            .map(|devices| Outcome::with(DEVICES_FOUND, devices));
        Outcome::settle(result, DEVICE_ERROR)
    }

    pub async fn get_device_status(&self, push_method: PushMethod, token: &str) -> Outcome<Device> {
        let result = match self.devices.get_device_by_token(push_method, token).await.optional() {
            Ok(Some(device)) => Ok(Outcome::with(DEVICES_FOUND, device)),
            Ok(None) => Ok(Outcome::of(TOKEN_NOT_FOUND)),
            Err(e) => Err(e),
        };
        Outcome::settle(result, DEVICE_ERROR)
    }

    /// The device with `device_id`, if `owner` owns it.
    pub async fn owned_device(&self, owner: Owner, device_id: Uuid) -> PortResult<Option<Device>> {
        let device = self.devices.get_device(device_id).await.optional()?;
        Ok(device.filter(|d| d.owner == Some(owner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PushGateway;
    use crate::testing::{harness, InMemoryStore, RecordingGateway};
    use async_trait::async_trait;

    #[tokio::test]
    async fn register_rejects_known_tokens() {
        let h = harness();
        let devices = &h.services.devices;

        let created = devices.register(PushMethod::Fcm, "tok").await;
        assert_eq!(created.status, CREATED);
        assert_eq!(created.payload.unwrap().owner, None);
        assert_eq!(devices.register(PushMethod::Fcm, "tok").await.status, ALREADY_EXISTS);
    }

    #[tokio::test]
    async fn renew_keeps_identity_and_owner() {
        let h = harness();
        let member = h.store.seed_member("m@x.com", "pw").await;
        let owner = Owner::Member(member.id);
        let original = h.store.seed_device("old", Some(owner)).await;
        let devices = &h.services.devices;

        let renewed = devices.renew(PushMethod::Fcm, "old", "new").await;
        assert_eq!(renewed.status, UPDATED);

        let found = devices
            .get_device_status(PushMethod::Fcm, "new")
            .await
            .payload
            .unwrap();
        assert_eq!(found.id, original.id);
        assert_eq!(found.token, "new");
        assert_eq!(found.owner, Some(owner));
        assert_eq!(
            devices.get_device_status(PushMethod::Fcm, "old").await.status,
            TOKEN_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn renew_of_unknown_token_registers_the_new_one() {
        let h = harness();
        h.store.seed_device("taken", None).await;
        let devices = &h.services.devices;

        assert_eq!(devices.renew(PushMethod::Fcm, "gone", "fresh").await.status, CREATED);
        assert_eq!(
            devices.renew(PushMethod::Fcm, "fresh", "taken").await.status,
            ALREADY_EXISTS
        );
    }

    #[tokio::test]
    async fn unregister_removes_the_device() {
        let h = harness();
        h.store.seed_device("tok", None).await;
        let devices = &h.services.devices;

        assert_eq!(devices.unregister(PushMethod::Fcm, "tok").await.status, DELETED);
        assert_eq!(
            devices.unregister(PushMethod::Fcm, "tok").await.status,
            DEVICE_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn link_moves_the_device_and_notifies() {
        let h = harness();
        let member = h.store.seed_member("m@x.com", "pw").await;
        let senior = h.store.seed_senior("senior1", "pw").await;
        h.store
            .seed_device("member-old", Some(Owner::Member(member.id)))
            .await;
        let device = h
            .store
            .seed_device("shared", Some(Owner::Senior(senior.id)))
            .await;
        let devices = &h.services.devices;

        let linked = devices.link(Owner::Member(member.id), device.id).await;
        assert_eq!(linked.status, LINKED);
        assert_eq!(linked.payload.unwrap().owner, Some(Owner::Member(member.id)));
        assert_eq!(
            h.gateway.tokens(),
            vec!["member-old".to_string(), "shared".to_string()]
        );

        let again = devices.link(Owner::Member(member.id), device.id).await;
        assert_eq!(again.status, ALREADY_LINKED);
        assert!(devices
            .get_devices(Owner::Senior(senior.id))
            .await
            .payload
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn link_checks_device_and_owner() {
        let h = harness();
        let device = h.store.seed_device("tok", None).await;
        let devices = &h.services.devices;

        assert_eq!(
            devices
                .link(Owner::Senior(Uuid::new_v4()), device.id)
                .await
                .status,
            SENIOR_NOT_FOUND
        );
        assert_eq!(
            devices
                .link(Owner::Member(Uuid::new_v4()), Uuid::new_v4())
                .await
                .status,
            DEVICE_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn unlink_clears_the_owner() {
        let h = harness();
        let senior = h.store.seed_senior("senior1", "pw").await;
        let device = h.store.seed_device("tok", Some(Owner::Senior(senior.id))).await;

        let outcome = h.services.devices.unlink(device.id).await;
        assert_eq!(outcome.status, UNLINKED);
        assert_eq!(outcome.payload.unwrap().owner, None);
        assert_eq!(
            h.services.devices.unlink(Uuid::new_v4()).await.status,
            DEVICE_NOT_FOUND
        );
    }

    /// Never sees a token as taken, so only the store's unique key can catch a duplicate.
    struct StaleDeviceStore(Arc<InMemoryStore>);

    #[async_trait]
    impl DeviceStore for StaleDeviceStore {
        async fn create_device(&self, push_method: PushMethod, token: &str) -> PortResult<Device> {
            self.0.create_device(push_method, token).await
        }

        async fn get_device(&self, device_id: Uuid) -> PortResult<Device> {
            self.0.get_device(device_id).await
        }

        async fn get_device_by_token(
            &self,
            push_method: PushMethod,
            token: &str,
        ) -> PortResult<Device> {
            self.0.get_device_by_token(push_method, token).await
        }

        async fn device_token_exists(&self, _: PushMethod, _: &str) -> PortResult<bool> {
            Ok(false)
        }

        async fn save_device(&self, device: &Device) -> PortResult<Device> {
            self.0.save_device(device).await
        }

        async fn delete_device(&self, device_id: Uuid) -> PortResult<()> {
            self.0.delete_device(device_id).await
        }

        async fn devices_of_owner(&self, owner: Owner) -> PortResult<Vec<Device>> {
            self.0.devices_of_owner(owner).await
        }

        async fn devices_by_method(&self, push_method: PushMethod) -> PortResult<Vec<Device>> {
            self.0.devices_by_method(push_method).await
        }
    }

    #[tokio::test]
    async fn duplicate_token_caught_by_the_store_is_already_exists() {
        let store = Arc::new(InMemoryStore::new());
        let stale: Arc<dyn DeviceStore> = Arc::new(StaleDeviceStore(store.clone()));
        let gateways: Vec<Arc<dyn PushGateway>> = vec![Arc::new(RecordingGateway::new())];
        let push = Arc::new(PushService::new(store.clone(), stale.clone(), gateways));
        let devices = DeviceService::new(store.clone(), stale, push);

        assert_eq!(devices.register(PushMethod::Fcm, "tok").await.status, CREATED);
        let again = devices.register(PushMethod::Fcm, "tok").await;
        assert_eq!(again.status, ALREADY_EXISTS);
        assert!(again.error.is_none());

        devices.register(PushMethod::Fcm, "other").await;
        let renewed = devices.renew(PushMethod::Fcm, "other", "tok").await;
        assert_eq!(renewed.status, ALREADY_EXISTS);
        assert_eq!(
            devices.get_device_status(PushMethod::Fcm, "other").await.status,
            DEVICES_FOUND
        );
    }
}
