pub mod auth;
pub mod device;
pub mod dto;
pub mod envelope;
pub mod firebase;
pub mod medicine;
pub mod member;
pub mod middleware;
pub mod rest;
pub mod senior;
pub mod state;
pub mod validation;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use self::middleware::authenticate;
use self::rest::ApiDoc;
use self::state::AppState;

/// Builds the complete application: every route, the bearer-token layer,
/// CORS, request tracing and the Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(rest::health_handler))
        // --- Accounts ---
        .route("/api/member/join", post(auth::member_join_handler))
        .route("/api/member/login", post(auth::member_login_handler))
        .route("/api/senior/join", post(auth::senior_join_handler))
        .route("/api/senior/login", post(auth::senior_login_handler))
        // --- Member ---
        .route("/api/member/{uuid}", get(member::member_profile_handler))
        .route(
            "/api/member/{uuid}/seniors",
            get(member::member_seniors_handler).post(member::member_link_senior_handler),
        )
        .route(
            "/api/member/{uuid}/seniors/{seniorUuid}",
            delete(member::member_unlink_senior_handler),
        )
        .route(
            "/api/member/{uuid}/devices",
            get(device::member_devices_handler),
        )
        .route(
            "/api/member/{uuid}/devices/{deviceUuid}",
            put(device::member_link_device_handler).delete(device::member_unlink_device_handler),
        )
        .route("/api/member/{uuid}/push", post(device::member_push_handler))
        // --- Senior ---
        .route("/api/senior/{uuid}", get(senior::senior_profile_handler))
        .route(
            "/api/senior/{uuid}/members",
            get(senior::senior_members_handler).post(senior::senior_link_member_handler),
        )
        .route(
            "/api/senior/{uuid}/members/{memberUuid}",
            delete(senior::senior_unlink_member_handler),
        )
        .route(
            "/api/senior/{uuid}/detail",
            get(senior::senior_detail_handler),
        )
        .route(
            "/api/senior/{uuid}/alerts",
            post(senior::add_alert_handler),
        )
        .route(
            "/api/senior/{uuid}/alerts/{alertUuid}",
            get(senior::senior_alert_handler),
        )
        .route(
            "/api/senior/{uuid}/monitoring",
            get(senior::get_monitoring_handler).patch(senior::set_monitoring_handler),
        )
        .route("/api/senior/{uuid}/stats", post(senior::add_stat_handler))
        .route(
            "/api/senior/{uuid}/devices",
            get(device::senior_devices_handler),
        )
        .route(
            "/api/senior/{uuid}/devices/{deviceUuid}",
            put(device::senior_link_device_handler).delete(device::senior_unlink_device_handler),
        )
        .route("/api/senior/{uuid}/push", post(device::senior_push_handler))
        // --- Medicine ---
        .route(
            "/api/senior/{uuid}/medicine",
            get(medicine::list_medicines_handler).post(medicine::create_medicine_handler),
        )
        .route(
            "/api/senior/{uuid}/medicine/summary",
            get(medicine::medicine_summary_handler),
        )
        .route(
            "/api/senior/{uuid}/medicine/{medicineUuid}",
            delete(medicine::delete_medicine_handler),
        )
        .route(
            "/api/senior/{uuid}/medicine/{medicineUuid}/history",
            get(medicine::intake_history_handler).post(medicine::record_intake_handler),
        )
        // --- Firebase ---
        .route("/api/firebase/fcm/register", post(firebase::register_handler))
        .route(
            "/api/firebase/fcm/renew/{oldToken}",
            put(firebase::renew_handler),
        )
        .route("/api/firebase/fcm/devices", get(firebase::all_devices_handler))
        .route("/api/firebase/fcm/status", get(firebase::status_handler))
        .route("/api/firebase/fcm/push", post(firebase::push_handler))
        .route(
            "/api/firebase/fcm/{token}",
            delete(firebase::unregister_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ))
        .layer(cors_layer(&state.config.cors_allowed_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin).allow_credentials(true),
        Err(_) => {
            warn!(origin, "Ignoring an unparsable CORS origin");
            layer
        }
    }
}
