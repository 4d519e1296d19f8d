//! JSON-over-HTTP notification backend.
//!
//! Endpoints, all `POST` with a JSON body:
//!
//! | Endpoint               | Body                    |
//! |------------------------|-------------------------|
//! | `/api/triggerCheckIn`  | `{userId}`              |
//! | `/api/alertPrimary`    | `{userId, contact}`     |
//! | `/api/alertSecondary`  | `{userId, contact}`     |
//! | `/api/logEvent`        | `{state, message}`      |

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{EmergencyAlertReceipt, NotificationGateway, PrimaryAlertReceipt};
use crate::error::GatewayError;
use crate::escalation::{Contact, Phase};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserBody<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AlertBody<'a> {
    user_id: &'a str,
    contact: &'a Contact,
}

#[derive(Serialize)]
struct LogBody<'a> {
    state: Phase,
    message: &'a str,
}

/// Gateway posting to a remote backend.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGateway {
    /// Creates a gateway for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if the URL is empty or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(GatewayError::InvalidConfig("base_url is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("silentsignals/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            timeout,
        })
    }

    /// Base URL requests are sent to, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}/api/{endpoint}", self.base_url);
        debug!(%url, "posting to gateway");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.timeout)
                } else {
                    GatewayError::from(e)
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<T, GatewayError> {
        let response = self.post(endpoint, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl NotificationGateway for HttpGateway {
    async fn notify_check_in_started(&self, user_id: &str) -> Result<(), GatewayError> {
        self.post("triggerCheckIn", &UserBody { user_id })
            .await
            .map(drop)
    }

    async fn notify_primary(
        &self,
        user_id: &str,
        contact: &Contact,
    ) -> Result<PrimaryAlertReceipt, GatewayError> {
        self.post_json("alertPrimary", &AlertBody { user_id, contact })
            .await
    }

    async fn notify_emergency(
        &self,
        user_id: &str,
        contact: &Contact,
    ) -> Result<EmergencyAlertReceipt, GatewayError> {
        self.post_json("alertSecondary", &AlertBody { user_id, contact })
            .await
    }

    async fn record_audit(&self, phase: Phase, message: &str) -> Result<(), GatewayError> {
        self.post(
            "logEvent",
            &LogBody {
                state: phase,
                message,
            },
        )
        .await
        .map(drop)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::ContactRole;
    use mockito::Matcher;

    fn mom() -> Contact {
        Contact::new("p1", "Mom", "555-0101", ContactRole::Primary)
    }

    #[test]
    fn rejects_empty_base_url() {
        let err = HttpGateway::new("/", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidConfig(_)));
    }

    #[test]
    fn trims_trailing_slash() {
        let gateway = HttpGateway::new("http://localhost:7071/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:7071");
    }

    #[tokio::test]
    async fn primary_alert_posts_camel_case_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/alertPrimary")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "userId": "alex",
                "contact": {"name": "Mom", "phone": "555-0101", "role": "PRIMARY"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"PRIMARY_ALERT_SENT","sent_to":"555-0101","via":"test"}"#)
            .create_async()
            .await;

        let gateway = HttpGateway::new(&server.url(), Duration::from_secs(5)).unwrap();
        let receipt = gateway.notify_primary("alex", &mom()).await.unwrap();

        mock.assert_async().await;
        assert!(receipt.delivered());
        assert_eq!(receipt.sent_to, "555-0101");
    }

    #[tokio::test]
    async fn emergency_alert_decodes_action() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/alertSecondary")
            .with_status(200)
            .with_body(r#"{"status":"SECONDARY_ALERT_SENT","action":"AUTOMATED_CALL_INITIATED"}"#)
            .create_async()
            .await;

        let gateway = HttpGateway::new(&server.url(), Duration::from_secs(5)).unwrap();
        let receipt = gateway.notify_emergency("alex", &mom()).await.unwrap();
        assert!(receipt.delivered());
        assert_eq!(receipt.action, "AUTOMATED_CALL_INITIATED");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/triggerCheckIn")
            .with_status(503)
            .create_async()
            .await;

        let gateway = HttpGateway::new(&server.url(), Duration::from_secs(5)).unwrap();
        let err = gateway.notify_check_in_started("alex").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Status { ref endpoint, status: 503 } if endpoint == "triggerCheckIn"
        ));
    }

    #[tokio::test]
    async fn audit_posts_state_and_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/logEvent")
            .match_body(Matcher::Json(serde_json::json!({
                "state": "ALERT_PRIMARY",
                "message": "No response. Alerting Primary Contact: Mom"
            })))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        let gateway = HttpGateway::new(&server.url(), Duration::from_secs(5)).unwrap();
        gateway
            .record_audit(
                Phase::AlertPrimary,
                "No response. Alerting Primary Contact: Mom",
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/alertPrimary")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let gateway = HttpGateway::new(&server.url(), Duration::from_secs(5)).unwrap();
        let err = gateway.notify_primary("alex", &mom()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }
}
