//! Simulated notification backend.
//!
//! Logs what a real backend would send, optionally sleeps to mimic network
//! latency, and records every call so tests can assert on exact counts.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use super::{
    EmergencyAlertReceipt, NotificationGateway, PrimaryAlertReceipt, STATUS_PRIMARY_ALERT_SENT,
    STATUS_SECONDARY_ALERT_SENT,
};
use crate::error::GatewayError;
use crate::escalation::{Contact, Phase};

/// Action reported for an emergency alert.
pub const ACTION_AUTOMATED_CALL: &str = "AUTOMATED_CALL_INITIATED";

/// Gateway operation, used for counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    /// `notify_check_in_started`
    CheckInStarted,
    /// `notify_primary`
    Primary,
    /// `notify_emergency`
    Emergency,
    /// `record_audit`
    Audit,
}

/// One recorded gateway invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    /// Which operation was called
    pub operation: GatewayOperation,
    /// User the call was made for (empty for audit calls)
    pub user_id: String,
    /// Contact alerted, for notify operations
    pub contact: Option<Contact>,
    /// Audit phase and message, for audit calls
    pub audit: Option<(Phase, String)>,
    /// When the call arrived
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<GatewayCall>,
    failing: HashSet<GatewayOperation>,
    undelivered: HashSet<GatewayOperation>,
}

/// In-process gateway that simulates SMS and call dispatch.
#[derive(Debug, Default)]
pub struct MockGateway {
    latency: Duration,
    state: Mutex<MockState>,
}

impl MockGateway {
    /// Mock with no simulated latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that sleeps `latency` before answering each notify call.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            state: Mutex::default(),
        }
    }

    /// Makes every future call to `operation` fail with
    /// [`GatewayError::Rejected`].
    pub fn fail(&self, operation: GatewayOperation) {
        self.lock().failing.insert(operation);
    }

    /// Makes future notify calls for `operation` succeed with a
    /// non-delivered status.
    pub fn withhold_delivery(&self, operation: GatewayOperation) {
        self.lock().undelivered.insert(operation);
    }

    /// Clears injected failures.
    pub fn heal(&self) {
        let mut state = self.lock();
        state.failing.clear();
        state.undelivered.clear();
    }

    /// Every call recorded so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Number of calls recorded for `operation`.
    #[must_use]
    pub fn count(&self, operation: GatewayOperation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and returns `(should_fail, delivered)`.
    fn record(
        &self,
        operation: GatewayOperation,
        user_id: &str,
        contact: Option<&Contact>,
        audit: Option<(Phase, &str)>,
    ) -> (bool, bool) {
        let mut state = self.lock();
        state.calls.push(GatewayCall {
            operation,
            user_id: user_id.to_string(),
            contact: contact.cloned(),
            audit: audit.map(|(p, m)| (p, m.to_string())),
            at: Utc::now(),
        });
        (
            state.failing.contains(&operation),
            !state.undelivered.contains(&operation),
        )
    }

    async fn simulate_latency(&self, factor: u32) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency.saturating_mul(factor) / 5).await;
        }
    }
}

#[async_trait]
impl NotificationGateway for MockGateway {
    async fn notify_check_in_started(&self, user_id: &str) -> Result<(), GatewayError> {
        let (fail, _) = self.record(GatewayOperation::CheckInStarted, user_id, None, None);
        info!(user_id, "[mock backend] check-in triggered");
        self.simulate_latency(5).await;
        if fail {
            return Err(GatewayError::Rejected("injected check-in failure".into()));
        }
        Ok(())
    }

    async fn notify_primary(
        &self,
        user_id: &str,
        contact: &Contact,
    ) -> Result<PrimaryAlertReceipt, GatewayError> {
        let (fail, delivered) =
            self.record(GatewayOperation::Primary, user_id, Some(contact), None);
        info!(
            user_id,
            contact = %contact.name,
            phone = %contact.phone,
            "[mock backend] SMS: unusual inactivity detected for {user_id}"
        );
        self.simulate_latency(8).await;
        if fail {
            return Err(GatewayError::Rejected("injected primary alert failure".into()));
        }
        Ok(PrimaryAlertReceipt {
            status: if delivered {
                STATUS_PRIMARY_ALERT_SENT.into()
            } else {
                "PRIMARY_ALERT_QUEUED".into()
            },
            sent_to: contact.phone.clone(),
        })
    }

    async fn notify_emergency(
        &self,
        user_id: &str,
        contact: &Contact,
    ) -> Result<EmergencyAlertReceipt, GatewayError> {
        let (fail, delivered) =
            self.record(GatewayOperation::Emergency, user_id, Some(contact), None);
        info!(
            user_id,
            contact = %contact.name,
            phone = %contact.phone,
            "[mock backend] call/SMS: escalation, no response from {user_id}"
        );
        self.simulate_latency(10).await;
        if fail {
            return Err(GatewayError::Rejected(
                "injected emergency alert failure".into(),
            ));
        }
        Ok(EmergencyAlertReceipt {
            status: if delivered {
                STATUS_SECONDARY_ALERT_SENT.into()
            } else {
                "SECONDARY_ALERT_QUEUED".into()
            },
            action: ACTION_AUTOMATED_CALL.into(),
        })
    }

    async fn record_audit(&self, phase: Phase, message: &str) -> Result<(), GatewayError> {
        let (fail, _) = self.record(GatewayOperation::Audit, "", None, Some((phase, message)));
        if fail {
            return Err(GatewayError::Rejected("injected audit failure".into()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
