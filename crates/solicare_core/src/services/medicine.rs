//! crates/solicare_core/src/services/medicine.rs
//!
//! A senior's prescriptions and their intake log. Every operation that names a
//! medicine also names the senior, and the two must match.

use chrono::NaiveDate;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Medicine, MedicineHistory, NewMedicine, NewMedicineHistory};
use crate::outcome::{Outcome, Status, StatusKind};
use crate::ports::{IdentityStore, MedicineStore, OptionalExt, PortError, PortResult};

pub mod status {
    use super::*;

    pub const MEDICINE_CREATED: Status =
        Status::new(StatusKind::Created, "MEDICINE201", "The medicine was added.");
    pub const MEDICINES_FOUND: Status =
        Status::new(StatusKind::Success, "MEDICINE200", "The medicines were retrieved.");
    pub const MEDICINE_DELETED: Status =
        Status::new(StatusKind::Success, "MEDICINE200", "The medicine was deleted.");
    pub const HISTORY_RECORDED: Status =
        Status::new(StatusKind::Created, "HISTORY201", "The intake was recorded.");
    pub const HISTORY_FOUND: Status = Status::new(
        StatusKind::Success,
        "HISTORY200",
        "The intake history was retrieved.",
    );
    pub const MEDICINE_NOT_FOUND: Status = Status::new(
        StatusKind::NotFound,
        "MEDICINE404",
        "The medicine could not be found.",
    );
    pub const SENIOR_NOT_FOUND: Status =
        Status::new(StatusKind::NotFound, "SENIOR404", "The senior could not be found.");
    pub const MEDICINE_ERROR: Status = Status::new(
        StatusKind::Internal,
        "MEDICINE500",
        "An error occurred while processing the medicine.",
    );
}

use status::*;

/// A medicine together with part of its intake log.
#[derive(Debug, Clone)]
pub struct MedicineWithHistory {
    pub medicine: Medicine,
    pub histories: Vec<MedicineHistory>,
}

pub struct MedicineService {
    identity: Arc<dyn IdentityStore>,
    medicines: Arc<dyn MedicineStore>,
}

impl MedicineService {
    pub fn new(identity: Arc<dyn IdentityStore>, medicines: Arc<dyn MedicineStore>) -> Self {
        Self {
            identity,
            medicines,
        }
    }

    pub async fn create_medicine(
        &self,
        senior_id: Uuid,
        medicine: NewMedicine,
    ) -> Outcome<Medicine> {
        Outcome::settle(self.try_create_medicine(senior_id, medicine).await, MEDICINE_ERROR)
    }

    async fn try_create_medicine(
        &self,
        senior_id: Uuid,
        medicine: NewMedicine,
    ) -> PortResult<Outcome<Medicine>> {
        if !self.identity.senior_exists(senior_id).await? {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        }
        let medicine = self.medicines.create_medicine(senior_id, medicine).await?;
        info!(medicine_id = %medicine.id, %senior_id, "Medicine added");
        Ok(Outcome::with(MEDICINE_CREATED, medicine))
    }

    pub async fn get_medicines(&self, senior_id: Uuid) -> Outcome<Vec<Medicine>> {
        Outcome::settle(self.try_get_medicines(senior_id).await, MEDICINE_ERROR)
    }

    async fn try_get_medicines(&self, senior_id: Uuid) -> PortResult<Outcome<Vec<Medicine>>> {
        if !self.identity.senior_exists(senior_id).await? {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        }
        let medicines = self.medicines.medicines_of_senior(senior_id).await?;
        Ok(Outcome::with(MEDICINES_FOUND, medicines))
    }

    /// Deletes the medicine and its whole intake log.
    pub async fn delete_medicine(&self, senior_id: Uuid, medicine_id: Uuid) -> Outcome<()> {
        Outcome::settle(self.try_delete_medicine(senior_id, medicine_id).await, MEDICINE_ERROR)
    }

    async fn try_delete_medicine(
        &self,
        senior_id: Uuid,
        medicine_id: Uuid,
    ) -> PortResult<Outcome<()>> {
        if self.medicine_of(senior_id, medicine_id).await?.is_none() {
            return Ok(missing_medicine(medicine_id));
        }
        self.medicines.delete_medicine(medicine_id).await?;
        info!(%medicine_id, %senior_id, "Medicine deleted");
        Ok(Outcome::of(MEDICINE_DELETED))
    }

    pub async fn record_intake(
        &self,
        senior_id: Uuid,
        medicine_id: Uuid,
        history: NewMedicineHistory,
    ) -> Outcome<MedicineHistory> {
        Outcome::settle(
            self.try_record_intake(senior_id, medicine_id, history).await,
            MEDICINE_ERROR,
        )
    }

    async fn try_record_intake(
        &self,
        senior_id: Uuid,
        medicine_id: Uuid,
        history: NewMedicineHistory,
    ) -> PortResult<Outcome<MedicineHistory>> {
        if self.medicine_of(senior_id, medicine_id).await?.is_none() {
            return Ok(missing_medicine(medicine_id));
        }
        let history = self.medicines.create_history(medicine_id, history).await?;
        Ok(Outcome::with(HISTORY_RECORDED, history))
    }

    pub async fn get_history(
        &self,
        senior_id: Uuid,
        medicine_id: Uuid,
    ) -> Outcome<Vec<MedicineHistory>> {
        Outcome::settle(self.try_get_history(senior_id, medicine_id).await, MEDICINE_ERROR)
    }

    async fn try_get_history(
        &self,
        senior_id: Uuid,
        medicine_id: Uuid,
    ) -> PortResult<Outcome<Vec<MedicineHistory>>> {
        if self.medicine_of(senior_id, medicine_id).await?.is_none() {
            return Ok(missing_medicine(medicine_id));
        }
        let histories = self.medicines.histories_of_medicine(medicine_id, None).await?;
        Ok(Outcome::with(HISTORY_FOUND, histories))
    }

    /// Every medicine of the senior with the intakes recorded since the start of `date`.
    pub async fn get_summary(
        &self,
        senior_id: Uuid,
        date: NaiveDate,
    ) -> Outcome<Vec<MedicineWithHistory>> {
        Outcome::settle(self.try_get_summary(senior_id, date).await, MEDICINE_ERROR)
    }

    async fn try_get_summary(
        &self,
        senior_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Outcome<Vec<MedicineWithHistory>>> {
        if !self.identity.senior_exists(senior_id).await? {
            return Ok(Outcome::of(SENIOR_NOT_FOUND));
        }
        let since = date.and_time(chrono::NaiveTime::MIN);
        let medicines = self.medicines.medicines_of_senior(senior_id).await?;
        let summary = try_join_all(medicines.into_iter().map(|medicine| async move {
            let histories = self
                .medicines
                .histories_of_medicine(medicine.id, Some(since))
                .await?;
            Ok::<_, PortError>(MedicineWithHistory {
                medicine,
                histories,
            })
        }))
        .await?;
        Ok(Outcome::with(MEDICINES_FOUND, summary))
    }

    async fn medicine_of(
        &self,
        senior_id: Uuid,
        medicine_id: Uuid,
    ) -> PortResult<Option<Medicine>> {
        let medicine = self.medicines.get_medicine(medicine_id).await.optional()?;
        Ok(medicine.filter(|m| m.senior_id == senior_id))
    }
}

fn missing_medicine<T>(medicine_id: Uuid) -> Outcome<T> {
    Outcome::failed(
        MEDICINE_NOT_FOUND,
        PortError::NotFound(format!("Medicine {} not found", medicine_id)),
    )
}
