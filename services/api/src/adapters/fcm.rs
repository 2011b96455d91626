//! services/api/src/adapters/fcm.rs
//!
//! Push delivery through the FCM HTTP v1 API.

use async_trait::async_trait;
use serde_json::json;
use solicare_core::domain::{PushMessage, PushMethod};
use solicare_core::ports::{PortError, PortResult, PushGateway};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FcmConfig;

pub struct FcmGateway {
    client: reqwest::Client,
    endpoint: String,
    credentials: Option<FcmConfig>,
}

impl FcmGateway {
    /// Builds the gateway. Without credentials every send fails with "not configured".
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Option<FcmConfig>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    fn send_url(&self, project_id: &str) -> String {
        format!("{}/v1/projects/{}/messages:send", self.endpoint, project_id)
    }
}

/// The request body of `messages:send`.
fn fcm_body(token: &str, message: &PushMessage) -> serde_json::Value {
    json!({
        "message": {
            "token": token,
            "notification": {
                "title": message.title,
                "body": message.body,
            },
            "android": {
                "notification": {
                    "channel_id": message.channel.channel_id(),
                    "icon": message.channel.notification_icon(),
                }
            },
            "data": message.data,
        }
    })
}

#[async_trait]
impl PushGateway for FcmGateway {
    fn push_method(&self) -> PushMethod {
        PushMethod::Fcm
    }

    async fn send(&self, token: &str, message: &PushMessage) -> PortResult<()> {
        let Some(credentials) = &self.credentials else {
            return Err(PortError::Unexpected(
                "FCM push is not configured".to_string(),
            ));
        };

        let response = self
            .client
            .post(self.send_url(&credentials.project_id))
            .bearer_auth(&credentials.access_token)
            .json(&fcm_body(token, message))
            .send()
            .await
            .map_err(|e| {
                warn!("FCM request failed: {}", e);
                PortError::Unexpected(format!("FCM request failed: {}", e))
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(title = %message.title, "FCM message accepted");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PortError::Unexpected(format!(
            "FCM rejected the message ({}): {}",
            status, body
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solicare_core::domain::PushChannel;

    #[test]
    fn body_carries_channel_and_data() {
        let message = PushMessage::new(PushChannel::Alert, "[Fall detected] Kim", "Check now")
            .with_data("eventUuid", "e-1");
        let body = fcm_body("tok-1", &message);

        assert_eq!(body["message"]["token"], "tok-1");
        assert_eq!(body["message"]["notification"]["title"], "[Fall detected] Kim");
        assert_eq!(
            body["message"]["android"]["notification"]["channel_id"],
            "alert_channel"
        );
        assert_eq!(body["message"]["data"]["eventUuid"], "e-1");
    }

    #[tokio::test]
    async fn sending_without_credentials_fails() {
        let gateway =
            FcmGateway::new("http://localhost:9", None, Duration::from_secs(1)).unwrap();
        let message = PushMessage::new(PushChannel::Info, "t", "b");
        assert!(matches!(
            gateway.send("tok", &message).await,
            Err(PortError::Unexpected(m)) if m.contains("not configured")
        ));
    }

    #[test]
    fn url_targets_the_project() {
        let gateway = FcmGateway::new("https://fcm.example", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            gateway.send_url("solicare"),
            "https://fcm.example/v1/projects/solicare/messages:send"
        );
    }
}
