//! crates/solicare_core/src/services/mod.rs
//!
//! The application services. Each one is built from ports only, so the same
//! services run against PostgreSQL in production and in-memory stores in tests.

pub mod care;
pub mod device;
pub mod identity;
pub mod medicine;
pub mod push;

use std::sync::Arc;

use crate::ports::{
    CareStore, CredentialHasher, DeviceStore, IdentityStore, MedicineStore, PushGateway,
    TelemetryStore, TokenIssuer,
};

pub use care::CareService;
pub use device::DeviceService;
pub use identity::IdentityService;
pub use medicine::MedicineService;
pub use push::PushService;

/// The store ports the services read and write through.
#[derive(Clone)]
pub struct Stores {
    pub identity: Arc<dyn IdentityStore>,
    pub care: Arc<dyn CareStore>,
    pub devices: Arc<dyn DeviceStore>,
    pub telemetry: Arc<dyn TelemetryStore>,
    pub medicine: Arc<dyn MedicineStore>,
}

/// Every service, wired once at startup and shared behind `Arc`s.
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<IdentityService>,
    pub care: Arc<CareService>,
    pub devices: Arc<DeviceService>,
    pub push: Arc<PushService>,
    pub medicine: Arc<MedicineService>,
}

impl Services {
    pub fn new(
        stores: Stores,
        hasher: Arc<dyn CredentialHasher>,
        issuer: Arc<dyn TokenIssuer>,
        gateways: Vec<Arc<dyn PushGateway>>,
    ) -> Self {
        let push = Arc::new(PushService::new(
            stores.identity.clone(),
            stores.devices.clone(),
            gateways,
        ));
        Self {
            identity: Arc::new(IdentityService::new(
                stores.identity.clone(),
                hasher.clone(),
                issuer,
            )),
            care: Arc::new(CareService::new(
                stores.identity.clone(),
                stores.care.clone(),
                stores.telemetry.clone(),
                hasher,
                push.clone(),
            )),
            devices: Arc::new(DeviceService::new(
                stores.identity.clone(),
                stores.devices.clone(),
                push.clone(),
            )),
            medicine: Arc::new(MedicineService::new(stores.identity, stores.medicine)),
            push,
        }
    }
}
