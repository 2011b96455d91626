//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the health check.
//! Every documented body is delivered inside the common response envelope.

use axum::extract::State;
use serde::Serialize;
use solicare_core::outcome::{Outcome, SUCCESS};
use std::sync::Arc;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::web::envelope::Reply;
use crate::web::state::AppState;
use crate::web::{auth, device, dto, firebase, medicine, member, senior};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Solicare API",
        description = "Caregiving backend: members monitor seniors through sensor data, alerts and push notifications. \
                       Every response body is `{success, status, code, message, data, error?}`; the schemas below describe `data`."
    ),
    paths(
        health_handler,
        auth::member_join_handler,
        auth::member_login_handler,
        auth::senior_join_handler,
        auth::senior_login_handler,
        member::member_profile_handler,
        member::member_seniors_handler,
        member::member_link_senior_handler,
        member::member_unlink_senior_handler,
        senior::senior_profile_handler,
        senior::senior_members_handler,
        senior::senior_link_member_handler,
        senior::senior_unlink_member_handler,
        senior::senior_detail_handler,
        senior::senior_alert_handler,
        senior::get_monitoring_handler,
        senior::set_monitoring_handler,
        senior::add_stat_handler,
        senior::add_alert_handler,
        device::member_devices_handler,
        device::member_link_device_handler,
        device::member_unlink_device_handler,
        device::member_push_handler,
        device::senior_devices_handler,
        device::senior_link_device_handler,
        device::senior_unlink_device_handler,
        device::senior_push_handler,
        firebase::register_handler,
        firebase::renew_handler,
        firebase::unregister_handler,
        firebase::all_devices_handler,
        firebase::status_handler,
        firebase::push_handler,
        medicine::create_medicine_handler,
        medicine::list_medicines_handler,
        medicine::medicine_summary_handler,
        medicine::delete_medicine_handler,
        medicine::record_intake_handler,
        medicine::intake_history_handler,
    ),
    components(schemas(
        HealthStatus,
        dto::MemberJoinRequest,
        dto::MemberLoginRequest,
        dto::SeniorJoinRequest,
        dto::SeniorLoginRequest,
        dto::MemberProfile,
        dto::SeniorProfile,
        dto::MemberSession,
        dto::SeniorSession,
        dto::SeniorLinkRequest,
        dto::MemberLinkRequest,
        dto::SeniorBrief,
        dto::AlertBrief,
        dto::AlertDetail,
        dto::StatBrief,
        dto::SeniorDetailResponse,
        dto::SensorStatRequest,
        dto::CareAlertRequest,
        dto::MonitoringStatus,
        dto::TokenBody,
        dto::DeviceInfo,
        dto::PushRequest,
        dto::TokenPushRequest,
        dto::DeliveryInfo,
        dto::MedicineRequest,
        dto::IntakeRequest,
        dto::MedicineInfo,
        dto::IntakeHistory,
        dto::MedicineSummary,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness."),
        (name = "Member", description = "Member accounts."),
        (name = "Senior", description = "Senior accounts."),
        (name = "Care", description = "Care links and the monitoring dashboard."),
        (name = "Telemetry", description = "Sensor stats and alerts reported by a senior's hardware."),
        (name = "Device", description = "Devices owned by a member or senior."),
        (name = "Push", description = "Notifications to every device of an owner."),
        (name = "Firebase", description = "FCM token lifecycle."),
        (name = "Medicine", description = "Medicines and intake history.")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub push_configured: bool,
}

/// GET /health - Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "The service is up", body = HealthStatus))
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Reply<HealthStatus> {
    let health = HealthStatus {
        status: "ok".to_string(),
        push_configured: state.config.fcm.is_some(),
    };
    Outcome::with(SUCCESS, health).into()
}
