//! Notification gateway.
//!
//! The engine alerts contacts through the [`NotificationGateway`] trait and
//! never waits on the result. Two implementations ship with the crate:
//!
//! - [`MockGateway`]: simulated backend with latency, call recording, and
//!   failure injection
//! - [`HttpGateway`]: JSON-over-HTTP backend

pub mod http;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{GatewayMode, GatewaySettings};
use crate::error::GatewayError;
use crate::escalation::{Contact, Phase};

pub use http::HttpGateway;
pub use mock::{GatewayCall, GatewayOperation, MockGateway};

/// Status string a backend returns once the check-in is registered.
pub const STATUS_CHECK_IN_INITIATED: &str = "CHECK_IN_INITIATED";

/// Status string for a delivered primary alert.
pub const STATUS_PRIMARY_ALERT_SENT: &str = "PRIMARY_ALERT_SENT";

/// Status string for a delivered emergency alert.
pub const STATUS_SECONDARY_ALERT_SENT: &str = "SECONDARY_ALERT_SENT";

/// Receipt for a primary-contact alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryAlertReceipt {
    /// Backend status string
    pub status: String,
    /// Number the alert was sent to
    #[serde(default)]
    pub sent_to: String,
}

impl PrimaryAlertReceipt {
    /// Whether the backend reports the alert as sent.
    #[must_use]
    pub fn delivered(&self) -> bool {
        self.status == STATUS_PRIMARY_ALERT_SENT
    }
}

/// Receipt for an emergency-contact alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyAlertReceipt {
    /// Backend status string
    pub status: String,
    /// Action the backend took (e.g. `AUTOMATED_CALL_INITIATED`)
    #[serde(default)]
    pub action: String,
}

impl EmergencyAlertReceipt {
    /// Whether the backend reports the alert as sent.
    #[must_use]
    pub fn delivered(&self) -> bool {
        self.status == STATUS_SECONDARY_ALERT_SENT
    }
}

/// Capability the engine uses to reach the outside world.
///
/// Every method may be slow or fail. The engine spawns each call and only
/// inspects the outcome to record diagnostics.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// A check-in started for `user_id`.
    async fn notify_check_in_started(&self, user_id: &str) -> Result<(), GatewayError>;

    /// Alert the primary contact.
    async fn notify_primary(
        &self,
        user_id: &str,
        contact: &Contact,
    ) -> Result<PrimaryAlertReceipt, GatewayError>;

    /// Alert the secondary / emergency contact.
    async fn notify_emergency(
        &self,
        user_id: &str,
        contact: &Contact,
    ) -> Result<EmergencyAlertReceipt, GatewayError>;

    /// Forward an audit line to the backend's log sink.
    async fn record_audit(&self, phase: Phase, message: &str) -> Result<(), GatewayError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Builds the gateway selected by `settings`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidConfig`] when `mode: http` has no
/// `base_url`, or the HTTP client cannot be built.
pub fn build_gateway(
    settings: &GatewaySettings,
) -> Result<Arc<dyn NotificationGateway>, GatewayError> {
    match settings.mode {
        GatewayMode::Mock => Ok(Arc::new(MockGateway::with_latency(settings.latency))),
        GatewayMode::Http => {
            let base_url = settings.base_url.as_deref().ok_or_else(|| {
                GatewayError::InvalidConfig("gateway.base_url is required for mode: http".into())
            })?;
            Ok(Arc::new(HttpGateway::new(base_url, settings.timeout)?))
        }
    }
}
