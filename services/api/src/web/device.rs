//! services/api/src/web/device.rs
//!
//! The devices a member or senior owns and pushes to all of them. Every route
//! exists once under `/api/member/{uuid}` and once under `/api/senior/{uuid}`;
//! both resolve to the same owner-scoped operations.

use axum::extract::State;
use solicare_core::access::{self, Principal};
use solicare_core::domain::{Owner, PushMessage};
use solicare_core::outcome::Outcome;
use solicare_core::services::device::status::DEVICE_NOT_FOUND;
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{all, DeliveryInfo, DeviceInfo, PushRequest};
use crate::web::envelope::{require, ApiResult, Reply};
use crate::web::middleware::Authenticated;
use crate::web::state::AppState;
use crate::web::validation::{ValidJson, ValidPath};

/// Checks that the caller is the path owner (or an admin).
fn authorize_owner(principal: &Principal, owner: Owner) -> Result<Owner, Reply<()>> {
    let decision = match owner {
        Owner::Member(id) => access::member_self(principal, id),
        Owner::Senior(id) => access::senior_self(principal, id),
    };
    require(decision)?;
    Ok(owner)
}

async fn list(state: &AppState, owner: Owner) -> ApiResult<Vec<DeviceInfo>> {
    let outcome = state.services.devices.get_devices(owner).await;
    Ok(outcome.map(all::<_, DeviceInfo>).into())
}

async fn link(state: &AppState, owner: Owner, device_id: Uuid) -> ApiResult<DeviceInfo> {
    let outcome = state.services.devices.link(owner, device_id).await;
    Ok(outcome.map(DeviceInfo::from).into())
}

/// Only devices the owner holds can be released through the owner's routes.
async fn unlink(state: &AppState, owner: Owner, device_id: Uuid) -> ApiResult<DeviceInfo> {
    let owned = state
        .services
        .devices
        .owned_device(owner, device_id)
        .await
        .map_err(Reply::internal)?;
    if owned.is_none() {
        return Ok(Outcome::of(DEVICE_NOT_FOUND).into());
    }
    let outcome = state.services.devices.unlink(device_id).await;
    Ok(outcome.map(DeviceInfo::from).into())
}

async fn push(state: &AppState, owner: Owner, req: PushRequest) -> ApiResult<Vec<DeliveryInfo>> {
    let message = PushMessage::from(req);
    let outcome = state.services.push.push_batch(owner, &message).await;
    Ok(outcome.map(all::<_, DeliveryInfo>).into())
}

//=========================================================================================
// Member routes
//=========================================================================================

/// GET /api/member/{uuid}/devices
#[utoipa::path(
    get,
    path = "/api/member/{uuid}/devices",
    tag = "Device",
    params(("uuid" = Uuid, Path, description = "Member UUID")),
    responses((status = 200, description = "The member's devices", body = [DeviceInfo])),
    security(("bearer" = []))
)]
pub async fn member_devices_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(member_id): ValidPath<Uuid>,
) -> ApiResult<Vec<DeviceInfo>> {
    let owner = authorize_owner(&principal, Owner::Member(member_id))?;
    list(&state, owner).await
}

/// PUT /api/member/{uuid}/devices/{deviceUuid} - Take ownership of a registered device
#[utoipa::path(
    put,
    path = "/api/member/{uuid}/devices/{deviceUuid}",
    tag = "Device",
    params(
        ("uuid" = Uuid, Path, description = "Member UUID"),
        ("deviceUuid" = Uuid, Path, description = "Device UUID")
    ),
    responses(
        (status = 200, description = "Linked", body = DeviceInfo),
        (status = 404, description = "Device not found"),
        (status = 409, description = "Already linked to the member")
    ),
    security(("bearer" = []))
)]
pub async fn member_link_device_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((member_id, device_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<DeviceInfo> {
    let owner = authorize_owner(&principal, Owner::Member(member_id))?;
    link(&state, owner, device_id).await
}

/// DELETE /api/member/{uuid}/devices/{deviceUuid} - Release a device
#[utoipa::path(
    delete,
    path = "/api/member/{uuid}/devices/{deviceUuid}",
    tag = "Device",
    params(
        ("uuid" = Uuid, Path, description = "Member UUID"),
        ("deviceUuid" = Uuid, Path, description = "Device UUID")
    ),
    responses(
        (status = 200, description = "Unlinked", body = DeviceInfo),
        (status = 404, description = "The member has no such device")
    ),
    security(("bearer" = []))
)]
pub async fn member_unlink_device_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((member_id, device_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<DeviceInfo> {
    let owner = authorize_owner(&principal, Owner::Member(member_id))?;
    unlink(&state, owner, device_id).await
}

/// POST /api/member/{uuid}/push - Push a message to every device of the member
#[utoipa::path(
    post,
    path = "/api/member/{uuid}/push",
    tag = "Push",
    params(("uuid" = Uuid, Path, description = "Member UUID")),
    request_body = PushRequest,
    responses(
        (status = 200, description = "Per-device deliveries", body = [DeliveryInfo]),
        (status = 404, description = "No devices or no such member"),
        (status = 503, description = "No delivery succeeded")
    ),
    security(("bearer" = []))
)]
pub async fn member_push_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(member_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<PushRequest>,
) -> ApiResult<Vec<DeliveryInfo>> {
    let owner = authorize_owner(&principal, Owner::Member(member_id))?;
    push(&state, owner, req).await
}

//=========================================================================================
// Senior routes
//=========================================================================================

/// GET /api/senior/{uuid}/devices
#[utoipa::path(
    get,
    path = "/api/senior/{uuid}/devices",
    tag = "Device",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    responses((status = 200, description = "The senior's devices", body = [DeviceInfo])),
    security(("bearer" = []))
)]
pub async fn senior_devices_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
) -> ApiResult<Vec<DeviceInfo>> {
    let owner = authorize_owner(&principal, Owner::Senior(senior_id))?;
    list(&state, owner).await
}

/// PUT /api/senior/{uuid}/devices/{deviceUuid} - Take ownership of a registered device
#[utoipa::path(
    put,
    path = "/api/senior/{uuid}/devices/{deviceUuid}",
    tag = "Device",
    params(
        ("uuid" = Uuid, Path, description = "Senior UUID"),
        ("deviceUuid" = Uuid, Path, description = "Device UUID")
    ),
    responses(
        (status = 200, description = "Linked", body = DeviceInfo),
        (status = 404, description = "Device not found"),
        (status = 409, description = "Already linked to the senior")
    ),
    security(("bearer" = []))
)]
pub async fn senior_link_device_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((senior_id, device_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<DeviceInfo> {
    let owner = authorize_owner(&principal, Owner::Senior(senior_id))?;
    link(&state, owner, device_id).await
}

/// DELETE /api/senior/{uuid}/devices/{deviceUuid} - Release a device
#[utoipa::path(
    delete,
    path = "/api/senior/{uuid}/devices/{deviceUuid}",
    tag = "Device",
    params(
        ("uuid" = Uuid, Path, description = "Senior UUID"),
        ("deviceUuid" = Uuid, Path, description = "Device UUID")
    ),
    responses(
        (status = 200, description = "Unlinked", body = DeviceInfo),
        (status = 404, description = "The senior has no such device")
    ),
    security(("bearer" = []))
)]
pub async fn senior_unlink_device_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((senior_id, device_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<DeviceInfo> {
    let owner = authorize_owner(&principal, Owner::Senior(senior_id))?;
    unlink(&state, owner, device_id).await
}

/// POST /api/senior/{uuid}/push - Push a message to every device of the senior
#[utoipa::path(
    post,
    path = "/api/senior/{uuid}/push",
    tag = "Push",
    params(("uuid" = Uuid, Path, description = "Senior UUID")),
    request_body = PushRequest,
    responses(
        (status = 200, description = "Per-device deliveries", body = [DeliveryInfo]),
        (status = 404, description = "No devices or no such senior"),
        (status = 503, description = "No delivery succeeded")
    ),
    security(("bearer" = []))
)]
pub async fn senior_push_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(senior_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<PushRequest>,
) -> ApiResult<Vec<DeliveryInfo>> {
    let owner = authorize_owner(&principal, Owner::Senior(senior_id))?;
    push(&state, owner, req).await
}
