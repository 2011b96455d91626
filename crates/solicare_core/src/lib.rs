pub mod access;
pub mod domain;
pub mod outcome;
pub mod ports;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use access::{Access, Principal};
pub use domain::{
    Care, CareAlert, DayOfWeek, Device, Gender, IntakeStatus, IntakeTime, Medicine,
    MedicineHistory, Member, MonitorMode, Owner, PushChannel, PushMessage, PushMethod, Role,
    Senior, SeniorEvent, SensorStat,
};
pub use outcome::{Outcome, Status, StatusKind};
pub use ports::{
    CareStore, CredentialHasher, DeviceStore, IdentityStore, MedicineStore, PortError,
    PortResult, PushGateway, TelemetryStore, TokenIssuer,
};
pub use services::{Services, Stores};
