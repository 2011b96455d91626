//! services/api/src/web/medicine.rs
//!
//! A senior's medicines and intake log. Only the senior (or an admin) may
//! read or change them.

use axum::extract::State;
use solicare_core::access;
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{
    all, IntakeHistory, IntakeRequest, MedicineInfo, MedicineRequest, MedicineSummary,
    SummaryQuery,
};
use crate::web::envelope::{require, ApiResult};
use crate::web::middleware::Authenticated;
use crate::web::state::AppState;
use crate::web::validation::{ValidJson, ValidPath, ValidQuery};

/// POST /api/senior/{uuid}/medicine
#[utoipa::path(
    post,
    path = "/api/senior/{uuid}/medicine",
    tag = "Medicine",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    request_body = MedicineRequest,
    responses(
        (status = 201, description = "Medicine added", body = MedicineInfo),
        (status = 404, description = "Senior not found")
    ),
    security(("bearer" = []))
)]
pub async fn create_medicine_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<MedicineRequest>,
) -> ApiResult<MedicineInfo> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state
        .services
        .medicine
        .create_medicine(senior_id, req.into())
        .await;
    Ok(outcome.map(MedicineInfo::from).into())
}

/// GET /api/senior/{uuid}/medicine
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}/medicine",
    tag = "Medicine",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    responses(
        (status = 200, description = "The senior's medicines", body = [MedicineInfo]),
        (status = 404, description = "Senior not found")
    ),
    security(("bearer" = []))
)]
pub async fn list_medicines_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
) -> ApiResult<Vec<MedicineInfo>> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state.services.medicine.get_medicines(senior_id).await;
    Ok(outcome.map(all::<_, MedicineInfo>).into())
}

/// GET /api/senior/{uuid}/medicine/summary?date=YYYY-MM-DD - Intakes since the start of a day
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}/medicine/summary",
    tag = "Medicine",
    params(("uuid" = Uuid, Path, description = "Senior UUID"), SummaryQuery),
    responses(
        (status = 200, description = "Every medicine with its recent intakes", body = [MedicineSummary]),
        (status = 404, description = "Senior not found")
    ),
    security(("bearer" = []))
)]
pub async fn medicine_summary_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
    ValidQuery(query): ValidQuery<SummaryQuery>,
) -> ApiResult<Vec<MedicineSummary>> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state
        .services
        .medicine
        .get_summary(senior_id, query.date)
        .await;
    Ok(outcome.map(all::<_, MedicineSummary>).into())
}

/// DELETE /api/senior/{uuid}/medicine/{medicineUuid} - Remove a medicine and its intake log
#[utoipa::path(
    delete,
    path = "/api/senior/{uuid}/medicine/{medicineUuid}",
    tag = "Medicine",
    params(
        ("uuid" = Uuid, Path, description = "Senior UUID"),
        ("medicineUuid" = Uuid, Path, description = "Medicine UUID")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "The senior has no such medicine")
    ),
    security(("bearer" = []))
)]
pub async fn delete_medicine_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((senior_id, medicine_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state
        .services
        .medicine
        .delete_medicine(senior_id, medicine_id)
        .await;
    Ok(outcome.into())
}

/// POST /api/senior/{uuid}/medicine/{medicineUuid}/history - Log an intake
#[utoipa::path(
    post,
    path = "/api/senior/{uuid}/medicine/{medicineUuid}/history",
    tag = "Medicine",
    params(
        ("uuid" = Uuid, Path, description = "Senior UUID"),
        ("medicineUuid" = Uuid, Path, description = "Medicine UUID")
    ),
    request_body = IntakeRequest,
    responses(
        (status = 201, description = "Recorded", body = IntakeHistory),
        (status = 404, description = "The senior has no such medicine")
    ),
    security(("bearer" = []))
)]
pub async fn record_intake_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((senior_id, medicine_id)): ValidPath<(Uuid, Uuid)>,
    ValidJson(req): ValidJson<IntakeRequest>,
) -> ApiResult<IntakeHistory> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state
        .services
        .medicine
        .record_intake(senior_id, medicine_id, req.into())
        .await;
    Ok(outcome.map(IntakeHistory::from).into())
}

/// GET /api/senior/{uuid}/medicine/{medicineUuid}/history
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}/medicine/{medicineUuid}/history",
    tag = "Medicine",
    params(
        ("uuid" = Uuid, Path, description = "Senior UUID"),
        ("medicineUuid" = Uuid, Path, description = "Medicine UUID")
    ),
    responses(
        (status = 200, description = "The intake log in recording order", body = [IntakeHistory]),
        (status = 404, description = "The senior has no such medicine")
    ),
    security(("bearer" = []))
)]
pub async fn intake_history_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((senior_id, medicine_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<Vec<IntakeHistory>> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state
        .services
        .medicine
        .get_history(senior_id, medicine_id)
        .await;
    Ok(outcome.map(all::<_, IntakeHistory>).into())
}
