//! services/api/src/web/firebase.rs
//!
//! FCM token lifecycle. Registration, renewal and removal are public because
//! apps register their token before anyone logs in.

use axum::extract::State;
use solicare_core::domain::{PushMessage, PushMethod};
use std::sync::Arc;

use crate::web::dto::{all, DeliveryInfo, DeviceInfo, TokenBody, TokenPushRequest, TokenQuery};
use crate::web::envelope::{ApiResult, Reply};
use crate::web::middleware::Authenticated;
use crate::web::state::AppState;
use crate::web::validation::{ValidJson, ValidPath, ValidQuery};

/// POST /api/firebase/fcm/register - Register an FCM token as an unowned device
#[utoipa::path(
    post,
    path = "/api/firebase/fcm/register",
    tag = "Firebase",
    request_body = TokenBody,
    responses(
        (status = 201, description = "Registered", body = DeviceInfo),
        (status = 409, description = "Token already registered")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<TokenBody>,
) -> ApiResult<DeviceInfo> {
    let outcome = state
        .services
        .devices
        .register(PushMethod::Fcm, &req.token)
        .await;
    Ok(outcome.map(DeviceInfo::from).into())
}

/// PUT /api/firebase/fcm/renew/{oldToken} - Replace a token, keeping the device
#[utoipa::path(
    put,
    path = "/api/firebase/fcm/renew/{oldToken}",
    tag = "Firebase",
    params(("oldToken" = String, Path, description = "The token being replaced")),
    request_body = TokenBody,
    responses(
        (status = 200, description = "Renewed", body = DeviceInfo),
        (status = 201, description = "The old token was unknown; the new one was registered", body = DeviceInfo),
        (status = 409, description = "New token already registered")
    )
)]
pub async fn renew_handler(
    State(state): State<Arc<AppState>>,
    ValidPath(old_token): ValidPath<String>,
    ValidJson(req): ValidJson<TokenBody>,
) -> ApiResult<DeviceInfo> {
    let outcome = state
        .services
        .devices
        .renew(PushMethod::Fcm, &old_token, &req.token)
        .await;
    Ok(outcome.map(DeviceInfo::from).into())
}

/// DELETE /api/firebase/fcm/{token} - Remove a token
#[utoipa::path(
    delete,
    path = "/api/firebase/fcm/{token}",
    tag = "Firebase",
    params(("token" = String, Path, description = "The token to remove")),
    responses(
        (status = 200, description = "Removed"),
        (status = 404, description = "Token not registered")
    )
)]
pub async fn unregister_handler(
    State(state): State<Arc<AppState>>,
    ValidPath(token): ValidPath<String>,
) -> ApiResult<()> {
    let outcome = state
        .services
        .devices
        .unregister(PushMethod::Fcm, &token)
        .await;
    Ok(outcome.into())
}

/// GET /api/firebase/fcm/devices - Every FCM device (admin only)
#[utoipa::path(
    get,
    path = "/api/firebase/fcm/devices",
    tag = "Firebase",
    responses(
        (status = 200, description = "All FCM devices", body = [DeviceInfo]),
        (status = 403, description = "Not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn all_devices_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<DeviceInfo>> {
    if !principal.is_admin() {
        return Err(Reply::denied("Only administrators can list every device."));
    }
    let outcome = state.services.devices.get_all_devices(PushMethod::Fcm).await;
    Ok(outcome.map(all::<_, DeviceInfo>).into())
}

/// GET /api/firebase/fcm/status?token= - Look up the device behind a token
#[utoipa::path(
    get,
    path = "/api/firebase/fcm/status",
    tag = "Firebase",
    params(TokenQuery),
    responses(
        (status = 200, description = "Device found", body = DeviceInfo),
        (status = 404, description = "Token not registered")
    ),
    security(("bearer" = []))
)]
pub async fn status_handler(
    Authenticated(_principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<TokenQuery>,
) -> ApiResult<DeviceInfo> {
    let outcome = state
        .services
        .devices
        .get_device_status(PushMethod::Fcm, &query.token)
        .await;
    Ok(outcome.map(DeviceInfo::from).into())
}

/// POST /api/firebase/fcm/push - Send a test message straight to a token
#[utoipa::path(
    post,
    path = "/api/firebase/fcm/push",
    tag = "Firebase",
    request_body = TokenPushRequest,
    responses(
        (status = 200, description = "Delivered", body = DeliveryInfo),
        (status = 503, description = "The gateway did not accept the message", body = DeliveryInfo)
    ),
    security(("bearer" = []))
)]
pub async fn push_handler(
    Authenticated(_principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<TokenPushRequest>,
) -> ApiResult<DeliveryInfo> {
    let message = PushMessage::new(req.channel, req.title, req.message);
    let outcome = state
        .services
        .push
        .send_to_token(PushMethod::Fcm, &req.token, &message)
        .await;
    Ok(outcome.map(DeliveryInfo::from).into())
}
