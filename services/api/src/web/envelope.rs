//! services/api/src/web/envelope.rs
//!
//! Every response body shares one JSON shape:
//! `{"success", "status", "code", "message", "data", "error"?}`.
//! The HTTP status is derived from the outcome's `StatusKind`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use solicare_core::access::Access;
use solicare_core::outcome::{Outcome, Status, StatusKind};
use solicare_core::ports::PortError;
use tracing::error;

pub const UNAUTHORIZED: Status = Status::new(
    StatusKind::Unauthorized,
    "COMMON401",
    "Authentication is required.",
);
pub const INVALID_REQUEST: Status =
    Status::new(StatusKind::Invalid, "COMMON400", "The request is invalid.");
pub const DENIED_CODE: &str = "COMMON403";

pub fn http_status(kind: StatusKind) -> StatusCode {
    match kind {
        StatusKind::Success => StatusCode::OK,
        StatusKind::Created => StatusCode::CREATED,
        StatusKind::NotFound => StatusCode::NOT_FOUND,
        StatusKind::Conflict => StatusCode::CONFLICT,
        StatusKind::Denied => StatusCode::FORBIDDEN,
        StatusKind::Unauthorized => StatusCode::UNAUTHORIZED,
        StatusKind::Invalid => StatusCode::BAD_REQUEST,
        StatusKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        StatusKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        StatusKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    status: u16,
    code: &'static str,
    message: &'static str,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// A service outcome on its way out as an HTTP response.
#[derive(Debug)]
pub struct Reply<T> {
    outcome: Outcome<T>,
    detail: Option<String>,
}

/// Handlers either answer with a payload reply or reject before any service work.
pub type ApiResult<T> = Result<Reply<T>, Reply<()>>;

impl<T> From<Outcome<T>> for Reply<T> {
    fn from(outcome: Outcome<T>) -> Self {
        Self {
            outcome,
            detail: None,
        }
    }
}

impl<T> Reply<T> {
    pub fn status(&self) -> Status {
        self.outcome.status
    }
}

impl Reply<()> {
    fn rejection(status: Status, detail: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::of(status),
            detail: Some(detail.into()),
        }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::rejection(UNAUTHORIZED, detail)
    }

    pub fn denied(reason: &'static str) -> Self {
        Self::from(Outcome::of(Status::new(
            StatusKind::Denied,
            DENIED_CODE,
            reason,
        )))
    }

    /// A malformed or rule-breaking request; `detail` lists what is wrong.
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::rejection(INVALID_REQUEST, detail)
    }

    pub fn internal(error: PortError) -> Self {
        Self::from(Outcome::failed(solicare_core::outcome::ERROR, error))
    }
}

/// Turns an access decision into a 403 rejection.
pub fn require(access: Access) -> Result<(), Reply<()>> {
    match access {
        Access::Allowed => Ok(()),
        Access::Denied(reason) => Err(Reply::denied(reason)),
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let Reply { outcome, detail } = self;
        let Outcome {
            status,
            payload,
            error: cause,
        } = outcome;
        let http = http_status(status.kind);
        let error = detail.or_else(|| cause.map(|e| e.to_string()));

        if http.is_server_error() {
            error!(code = status.code, error = ?error, "Request failed");
        }

        let body = Envelope {
            success: status.kind.is_success(),
            status: http.as_u16(),
            code: status.code,
            message: status.message,
            data: payload,
            error,
        };
        (http, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn body_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn every_kind_has_a_distinct_http_status() {
        assert_eq!(http_status(StatusKind::Created), StatusCode::CREATED);
        assert_eq!(http_status(StatusKind::Denied), StatusCode::FORBIDDEN);
        assert_eq!(
            http_status(StatusKind::NotImplemented),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            http_status(StatusKind::Unavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn success_carries_data_without_error() {
        let status = Status::new(StatusKind::Created, "TEST201", "Made.");
        let response = Reply::from(Outcome::with(status, vec![1, 2])).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_of(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], 201);
        assert_eq!(body["code"], "TEST201");
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn failures_report_their_cause() {
        let response = Reply::internal(PortError::Unexpected("db down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], Value::Null);
        assert!(body["error"].as_str().unwrap().contains("db down"));
    }

    #[tokio::test]
    async fn denial_uses_the_reason_as_message() {
        let response = require(Access::Denied("Not yours.")).unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_of(response).await["message"], "Not yours.");
    }
}
