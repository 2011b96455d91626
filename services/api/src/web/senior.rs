//! services/api/src/web/senior.rs
//!
//! Senior profile, linked members, monitoring and the telemetry the senior's
//! hardware reports.

use axum::extract::State;
use solicare_core::access::{self, Principal};
use solicare_core::services::care::MemberLink;
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{
    all, AlertBrief, AlertDetail, CareAlertRequest, MemberLinkRequest, MemberProfile,
    MonitoringQuery, MonitoringStatus, SeniorDetailResponse, SeniorProfile, SensorStatRequest,
    StatBrief,
};
use crate::web::envelope::{require, ApiResult, Reply};
use crate::web::middleware::Authenticated;
use crate::web::state::AppState;
use crate::web::validation::{ValidJson, ValidPath, ValidQuery};

/// Lets the senior, an admin or a linked member through.
async fn require_member_or_senior(
    state: &AppState,
    principal: &Principal,
    senior_id: Uuid,
) -> Result<(), Reply<()>> {
    let decision = access::member_or_senior(principal, senior_id, state.care.as_ref())
        .await
        .map_err(Reply::internal)?;
    require(decision)
}

/// GET /api/senior/{uuid} - The senior's own profile
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}",
    tag = "Senior",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    responses(
        (status = 200, description = "Profile found", body = SeniorProfile),
        (status = 403, description = "Not the senior"),
        (status = 404, description = "Senior not found")
    ),
    security(("bearer" = []))
)]
pub async fn senior_profile_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
) -> ApiResult<SeniorProfile> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state.services.identity.senior_profile(senior_id).await;
    Ok(outcome.map(SeniorProfile::from).into())
}

/// GET /api/senior/{uuid}/members - Members monitoring the senior, by name
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}/members",
    tag = "Care",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    responses(
        (status = 200, description = "Linked members", body = [MemberProfile]),
        (status = 403, description = "Not the senior")
    ),
    security(("bearer" = []))
)]
pub async fn senior_members_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
) -> ApiResult<Vec<MemberProfile>> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state.services.care.query_members_by_senior(senior_id).await;
    Ok(outcome.map(all::<_, MemberProfile>).into())
}

/// POST /api/senior/{uuid}/members - Let a member monitor the senior using the member's credentials
#[utoipa::path(
    post,
    path = "/api/senior/{uuid}/members",
    tag = "Care",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    request_body = MemberLinkRequest,
    responses(
        (status = 201, description = "Linked", body = MemberProfile),
        (status = 401, description = "Wrong member password"),
        (status = 404, description = "Member or senior not found"),
        (status = 409, description = "Already linked")
    ),
    security(("bearer" = []))
)]
pub async fn senior_link_member_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<MemberLinkRequest>,
) -> ApiResult<MemberProfile> {
    require(access::senior_self(&principal, senior_id))?;
    let link = MemberLink {
        email: req.email,
        password: req.password,
    };
    let outcome = state
        .services
        .care
        .link_member_to_senior(senior_id, link)
        .await;
    Ok(outcome.map(MemberProfile::from).into())
}

/// DELETE /api/senior/{uuid}/members/{memberUuid} - Stop being monitored by a member
#[utoipa::path(
    delete,
    path = "/api/senior/{uuid}/members/{memberUuid}",
    tag = "Care",
    params(
        ("uuid" = Uuid, Path, description = "Senior UUID"),
        ("memberUuid" = Uuid, Path, description = "Member UUID")
    ),
    responses(
        (status = 403, description = "Not the senior"),
        (status = 501, description = "Unlinking is not supported yet")
    ),
    security(("bearer" = []))
)]
pub async fn senior_unlink_member_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((senior_id, member_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    require(access::senior_self(&principal, senior_id))?;
    Ok(state.services.care.unlink(member_id, senior_id).await.into())
}

/// GET /api/senior/{uuid}/detail - Profile with recent alerts and sensor stats
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}/detail",
    tag = "Care",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    responses(
        (status = 200, description = "The senior's dashboard", body = SeniorDetailResponse),
        (status = 403, description = "Neither the senior nor a linked member"),
        (status = 404, description = "Senior not found")
    ),
    security(("bearer" = []))
)]
pub async fn senior_detail_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
) -> ApiResult<SeniorDetailResponse> {
    require_member_or_senior(&state, &principal, senior_id).await?;
    let outcome = state.services.care.get_senior_detail(senior_id).await;
    Ok(outcome.map(SeniorDetailResponse::from).into())
}

/// GET /api/senior/{uuid}/alerts/{alertUuid} - One alert with its image
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}/alerts/{alertUuid}",
    tag = "Care",
    params(
        ("uuid" = Uuid, Path, description = "Senior UUID"),
        ("alertUuid" = Uuid, Path, description = "Alert UUID")
    ),
    responses(
        (status = 200, description = "Alert found", body = AlertDetail),
        (status = 403, description = "Neither the senior nor a linked member"),
        (status = 404, description = "Alert not found")
    ),
    security(("bearer" = []))
)]
pub async fn senior_alert_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((senior_id, alert_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<AlertDetail> {
    require_member_or_senior(&state, &principal, senior_id).await?;
    let outcome = state.services.care.get_alert_detail(senior_id, alert_id).await;
    Ok(outcome.map(AlertDetail::from).into())
}

/// GET /api/senior/{uuid}/monitoring - Whether monitoring is switched on
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}/monitoring",
    tag = "Care",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    responses(
        (status = 200, description = "Monitoring flag", body = MonitoringStatus),
        (status = 403, description = "Not the senior")
    ),
    security(("bearer" = []))
)]
pub async fn get_monitoring_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
) -> ApiResult<MonitoringStatus> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state.services.care.get_monitoring(senior_id).await;
    Ok(outcome.map(|monitored| MonitoringStatus { monitored }).into())
}

/// PATCH /api/senior/{uuid}/monitoring?enabled=bool - Switch monitoring on or off
#[utoipa::path(
    patch,
    path = "/api/senior/{uuid}/monitoring",
    tag = "Care",
    params(("uuid" = Uuid, Path, description = "Senior UUID"), MonitoringQuery),
    responses(
        (status = 200, description = "Updated profile", body = SeniorProfile),
        (status = 403, description = "Neither the senior nor a linked member"),
        (status = 404, description = "Senior not found")
    ),
    security(("bearer" = []))
)]
pub async fn set_monitoring_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
    ValidQuery(query): ValidQuery<MonitoringQuery>,
) -> ApiResult<SeniorProfile> {
    require_member_or_senior(&state, &principal, senior_id).await?;
    let outcome = state
        .services
        .care
        .set_monitoring(senior_id, query.enabled)
        .await;
    Ok(outcome.map(SeniorProfile::from).into())
}

/// POST /api/senior/{uuid}/stats - Record a sensor snapshot
#[utoipa::path(
    post,
    path = "/api/senior/{uuid}/stats",
    tag = "Telemetry",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    request_body = SensorStatRequest,
    responses(
        (status = 201, description = "Recorded", body = StatBrief),
        (status = 403, description = "Not the senior"),
        (status = 404, description = "Senior not found")
    ),
    security(("bearer" = []))
)]
pub async fn add_stat_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<SensorStatRequest>,
) -> ApiResult<StatBrief> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state
        .services
        .care
        .add_sensor_stat(senior_id, req.into())
        .await;
    Ok(outcome.map(StatBrief::from).into())
}

/// POST /api/senior/{uuid}/alerts - Record an event and notify whoever must know
#[utoipa::path(
    post,
    path = "/api/senior/{uuid}/alerts",
    tag = "Telemetry",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    request_body = CareAlertRequest,
    responses(
        (status = 201, description = "Recorded", body = AlertBrief),
        (status = 403, description = "Not the senior"),
        (status = 404, description = "Senior not found")
    ),
    security(("bearer" = []))
)]
pub async fn add_alert_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<CareAlertRequest>,
) -> ApiResult<AlertBrief> {
    require(access::senior_self(&principal, senior_id))?;
    let outcome = state
        .services
        .care
        .add_care_alert(senior_id, req.into())
        .await;
    Ok(outcome.map(AlertBrief::from).into())
}
