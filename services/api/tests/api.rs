//! End-to-end tests of the HTTP surface over the in-memory stores.

use api_lib::adapters::JwtAdapter;
use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use solicare_core::domain::{Owner, Role};
use solicare_core::testing::{harness_with, InMemoryStore, RecordingGateway};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    jwt: Arc<JwtAdapter>,
    store: Arc<InMemoryStore>,
    gateway: Arc<RecordingGateway>,
}

fn test_app() -> TestApp {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        _ => None,
    })
    .expect("test config");
    let jwt = Arc::new(JwtAdapter::new(&config.jwt_secret, 60));
    let harness = harness_with(jwt.clone());
    let state = Arc::new(AppState {
        services: harness.services,
        care: harness.store.clone(),
        jwt: jwt.clone(),
        config: Arc::new(config),
    });
    TestApp {
        router: router(state),
        jwt,
        store: harness.store,
        gateway: harness.gateway,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    async fn join_senior(&self, user_id: &str, password: &str, phone: &str) -> (Uuid, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/senior/join",
                None,
                Some(json!({
                    "userId": user_id,
                    "password": password,
                    "name": "Grandma",
                    "age": 80,
                    "gender": "FEMALE",
                    "phoneNumber": phone,
                    "address": "Seoul"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        session(&body)
    }

    async fn join_member(&self, email: &str, password: &str, phone: &str) -> (Uuid, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/member/join",
                None,
                Some(json!({
                    "email": email,
                    "password": password,
                    "name": "Minji",
                    "phoneNumber": phone
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        session(&body)
    }
}

fn session(body: &Value) -> (Uuid, String) {
    let id = body["data"]["profile"]["uuid"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("profile uuid");
    let token = body["data"]["token"].as_str().expect("token").to_string();
    (id, token)
}

fn stat_body() -> Value {
    json!({
        "timestamp": "2025-09-20T12:34:56",
        "cameraFallDetected": false,
        "wearableFallDetected": false,
        "temperature": 36.5,
        "humidity": 40.0,
        "heartRate": 72,
        "wearableBattery": 80.0
    })
}

#[tokio::test]
async fn health_reports_ok_in_the_envelope() {
    let app = test_app();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 200);
    assert_eq!(body["code"], "COMMON200");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["push_configured"], false);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn member_links_a_senior_once() {
    let app = test_app();
    let (senior_id, _) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let (member_id, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;

    let uri = format!("/api/member/{}/seniors", member_id);
    let link = json!({ "userId": "senior1", "password": "pw1" });

    let (status, body) = app
        .call(Method::POST, &uri, Some(&member_token), Some(link.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["code"], "CARE201");
    assert_eq!(body["data"]["uuid"], senior_id.to_string());
    assert_eq!(body["data"]["unreadAlertCount"], 0);

    let (status, body) = app
        .call(Method::POST, &uri, Some(&member_token), Some(link))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "CARE409");
    assert_eq!(app.store.care_count(), 1);

    let (status, body) = app.call(Method::GET, &uri, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn linking_with_a_wrong_senior_password_is_unauthorized() {
    let app = test_app();
    app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let (member_id, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/member/{}/seniors", member_id),
            Some(&member_token),
            Some(json!({ "userId": "senior1", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "SENIOR401");
    assert_eq!(app.store.care_count(), 0);
}

#[tokio::test]
async fn senior_records_a_sensor_stat() {
    let app = test_app();
    let (senior_id, senior_token) = app.join_senior("senior1", "pw1", "010-0000-0001").await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/senior/{}/stats", senior_id),
            Some(&senior_token),
            Some(stat_body()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["code"], "STAT201");
    assert_eq!(body["data"]["heartRate"], 72);
    assert_eq!(body["data"]["temperature"], 36.5);
    assert_eq!(app.store.stat_count(), 1);
}

#[tokio::test]
async fn stats_for_an_unknown_senior_are_denied_to_seniors_and_missing_for_admins() {
    let app = test_app();
    let (_, senior_token) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let unknown = Uuid::new_v4();
    let uri = format!("/api/senior/{}/stats", unknown);

    let (status, body) = app
        .call(Method::POST, &uri, Some(&senior_token), Some(stat_body()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "COMMON403");

    let admin_token = app
        .jwt
        .generate(Uuid::new_v4(), &[Role::Admin])
        .expect("admin token");
    let (status, body) = app
        .call(Method::POST, &uri, Some(&admin_token), Some(stat_body()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SENIOR404");
    assert_eq!(app.store.stat_count(), 0);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let app = test_app();
    let (senior_id, _) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let uri = format!("/api/senior/{}", senior_id);

    let (status, body) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "COMMON401");

    let (status, body) = app.call(Method::GET, &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn a_token_for_a_deleted_account_is_rejected() {
    let app = test_app();
    let (senior_id, _) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let ghost = app
        .jwt
        .generate(Uuid::new_v4(), &[Role::Senior])
        .expect("token");

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/senior/{}", senior_id),
            Some(&ghost),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn seniors_cannot_read_each_other() {
    let app = test_app();
    let (first_id, _) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let (_, second_token) = app.join_senior("senior2", "pw1", "010-0000-0002").await;

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/senior/{}", first_id),
            Some(&second_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "COMMON403");
}

#[tokio::test]
async fn linked_member_sees_the_senior_detail() {
    let app = test_app();
    let (senior_id, senior_token) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let (member_id, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;
    let detail = format!("/api/senior/{}/detail", senior_id);

    let (status, _) = app.call(Method::GET, &detail, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.call(
        Method::POST,
        &format!("/api/member/{}/seniors", member_id),
        Some(&member_token),
        Some(json!({ "userId": "senior1", "password": "pw1" })),
    )
    .await;
    app.call(
        Method::POST,
        &format!("/api/senior/{}/stats", senior_id),
        Some(&senior_token),
        Some(stat_body()),
    )
    .await;

    let (status, body) = app.call(Method::GET, &detail, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["profile"]["userId"], "senior1");
    assert_eq!(body["data"]["stats"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn fall_alert_reaches_the_linked_members_devices() {
    let app = test_app();
    let (senior_id, senior_token) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let (member_id, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;
    app.call(
        Method::POST,
        &format!("/api/member/{}/seniors", member_id),
        Some(&member_token),
        Some(json!({ "userId": "senior1", "password": "pw1" })),
    )
    .await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/firebase/fcm/register",
            None,
            Some(json!({ "token": "member-phone" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let device_id = body["data"]["uuid"].as_str().expect("device uuid").to_string();

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/member/{}/devices/{}", member_id, device_id),
            Some(&member_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/senior/{}/alerts", senior_id),
            Some(&senior_token),
            Some(json!({
                "timestamp": "2025-09-20T12:34:56",
                "eventType": "FALL_DETECTED",
                "monitorMode": "FULL_MONITORING"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["isRead"], false);
    assert!(app.gateway.tokens().contains(&"member-phone".to_string()));
}

#[tokio::test]
async fn unlinking_a_care_is_not_implemented() {
    let app = test_app();
    let (senior_id, _) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let (member_id, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/member/{}/seniors/{}", member_id, senior_id),
            Some(&member_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["code"], "CARE501");
}

#[tokio::test]
async fn malformed_and_invalid_bodies_are_bad_requests() {
    let app = test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/member/join")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app.router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/member/join",
            None,
            Some(json!({
                "email": "not-an-email",
                "password": "pw",
                "name": "Minji",
                "phoneNumber": "010-0000-0002"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "COMMON400");
    let error = body["error"].as_str().unwrap_or_default();
    assert!(error.contains("email"), "{error}");
}

#[tokio::test]
async fn member_login_returns_a_usable_token() {
    let app = test_app();
    let (member_id, _) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/member/login",
            None,
            Some(json!({ "email": "m@x.com", "password": "pw2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, token) = session(&body);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/member/{}", member_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "m@x.com");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/member/login",
            None,
            Some(json!({ "email": "m@x.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH401");
}

#[tokio::test]
async fn only_admins_list_every_device() {
    let app = test_app();
    let (_, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;
    app.store.seed_device("tok-1", None).await;

    let (status, _) = app
        .call(Method::GET, "/api/firebase/fcm/devices", Some(&member_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = app
        .jwt
        .generate(Uuid::new_v4(), &[Role::Admin])
        .expect("admin token");
    let (status, body) = app
        .call(Method::GET, "/api/firebase/fcm/devices", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn monitoring_toggle_follows_the_care_link() {
    let app = test_app();
    let (senior_id, senior_token) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let (member_id, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;
    let (_, stranger_token) = app.join_member("s@x.com", "pw3", "010-0000-0003").await;
    app.call(
        Method::POST,
        &format!("/api/member/{}/seniors", member_id),
        Some(&member_token),
        Some(json!({ "userId": "senior1", "password": "pw1" })),
    )
    .await;
    let toggle =
        |enabled: bool| format!("/api/senior/{}/monitoring?enabled={}", senior_id, enabled);

    let (status, body) = app.call(Method::PATCH, &toggle(true), Some(&member_token), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["code"], "MONITOR200");
    assert_eq!(body["data"]["monitored"], true);

    let (status, body) = app
        .call(Method::PATCH, &toggle(false), Some(&stranger_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "COMMON403");

    let (status, body) = app.call(Method::PATCH, &toggle(false), Some(&senior_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["monitored"], false);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/senior/{}/monitoring", senior_id),
            Some(&senior_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["monitored"], false);

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/senior/{}/monitoring", senior_id),
            Some(&member_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn medicine_log_belongs_to_the_senior_alone() {
    let app = test_app();
    let (senior_id, senior_token) = app.join_senior("senior1", "pw1", "010-0000-0001").await;
    let (other_id, other_token) = app.join_senior("senior2", "pw1", "010-0000-0002").await;
    let (member_id, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0003").await;
    app.call(
        Method::POST,
        &format!("/api/member/{}/seniors", member_id),
        Some(&member_token),
        Some(json!({ "userId": "senior1", "password": "pw1" })),
    )
    .await;
    let medicines = format!("/api/senior/{}/medicine", senior_id);

    let (status, body) = app
        .call(
            Method::POST,
            &medicines,
            Some(&senior_token),
            Some(json!({
                "name": "Aspirin",
                "doseAmount": 1.0,
                "daysOfWeek": ["MONDAY"],
                "timeCategories": ["MORNING"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["code"], "MEDICINE201");
    let medicine_id = body["data"]["uuid"].as_str().expect("medicine uuid").to_string();
    let history = format!("/api/senior/{}/medicine/{}/history", senior_id, medicine_id);

    let (status, body) = app
        .call(
            Method::POST,
            &history,
            Some(&senior_token),
            Some(json!({
                "recordedAt": "2026-03-02T08:30:00",
                "intakeAmount": 1.0,
                "status": "TAKEN"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["code"], "HISTORY201");

    let (status, body) = app
        .call(
            Method::GET,
            &format!("{}/summary?date=2026-03-02", medicines),
            Some(&senior_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"][0]["medicine"]["name"], "Aspirin");
    assert_eq!(body["data"][0]["history"].as_array().map(Vec::len), Some(1));

    // Caregivers have no access, even when linked.
    let (status, _) = app.call(Method::GET, &medicines, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(Method::GET, &history, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Another senior cannot reach the medicine through their own path.
    let foreign = format!("/api/senior/{}/medicine/{}", other_id, medicine_id);
    let (status, body) = app.call(Method::DELETE, &foreign, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MEDICINE404");

    let own = format!("/api/senior/{}/medicine/{}", senior_id, medicine_id);
    let (status, body) = app.call(Method::DELETE, &own, Some(&senior_token), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (_, body) = app.call(Method::GET, &medicines, Some(&senior_token), None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
    assert_eq!(app.store.history_count(), 0);
}

#[tokio::test]
async fn token_lifecycle_works_before_login() {
    let app = test_app();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/firebase/fcm/register",
            None,
            Some(json!({ "token": "old" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let device_id = body["data"]["uuid"].clone();

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/firebase/fcm/renew/old",
            None,
            Some(json!({ "token": "new" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["uuid"], device_id);
    assert_eq!(body["data"]["token"], "new");

    let (status, body) = app
        .call(Method::DELETE, "/api/firebase/fcm/new", None, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .call(Method::DELETE, "/api/firebase/fcm/new", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "DEVICE404");
}

#[tokio::test]
async fn owner_push_reports_missing_and_partial_deliveries() {
    let app = test_app();
    let (member_id, member_token) = app.join_member("m@x.com", "pw2", "010-0000-0002").await;
    let push = format!("/api/member/{}/push", member_id);
    let message = json!({ "channel": "INFO", "title": "Hello", "message": "Checking in" });

    let (status, body) = app
        .call(Method::POST, &push, Some(&member_token), Some(message.clone()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PUSH404");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    let owner = Some(Owner::Member(member_id));
    app.store.seed_device("phone", owner).await;
    app.store.seed_device("tablet", owner).await;
    app.gateway.fail_token("tablet");

    let (status, body) = app
        .call(Method::POST, &push, Some(&member_token), Some(message))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["code"], "PUSH207");
    let mut statuses: Vec<&str> = body["data"]
        .as_array()
        .expect("deliveries")
        .iter()
        .filter_map(|d| d["status"].as_str())
        .collect();
    statuses.sort_unstable();
    assert_eq!(statuses, ["ERROR", "SENT"]);
    assert_eq!(app.gateway.tokens(), ["phone"]);
}
