//! Prometheus-compatible metrics.
//!
//! Every label value comes from a closed enum (`Phase`, `Tier`, drop
//! reason), so label cardinality is bounded without sanitizing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::SilentSignalsError;
use crate::escalation::{Phase, Tier};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Why the engine discarded an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The event is not defined for the current phase.
    Undefined,
    /// A timer fired for a phase that was already superseded.
    StaleTimer,
    /// A user report named a phase that was already superseded.
    StaleEvent,
}

impl DropReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::StaleTimer => "stale_timer",
            Self::StaleEvent => "stale_event",
        }
    }
}

/// Outcome of a notify call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Backend reported the alert as sent.
    Delivered,
    /// Backend answered but did not confirm delivery.
    Undelivered,
    /// The call failed.
    Failed,
}

impl NotifyOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Undelivered => "undelivered",
            Self::Failed => "failed",
        }
    }
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint. Calling this twice is a no-op.
///
/// # Errors
///
/// Returns `SilentSignalsError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), SilentSignalsError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| SilentSignalsError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "silentsignals_transitions_total",
        "Committed escalation transitions"
    );
    describe_gauge!(
        "silentsignals_current_phase",
        "Currently active phase (1 = active)"
    );
    describe_counter!(
        "silentsignals_notifications_total",
        "Notify calls by tier and outcome"
    );
    describe_histogram!(
        "silentsignals_notification_duration_ms",
        "Gateway notify call latency in milliseconds"
    );
    describe_counter!(
        "silentsignals_dropped_events_total",
        "Events discarded by the engine"
    );
    describe_counter!(
        "silentsignals_audit_entries_total",
        "Audit entries recorded"
    );
}

/// Records a committed transition.
pub fn record_transition(from: Phase, to: Phase) {
    counter!(
        "silentsignals_transitions_total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Sets the current phase gauge, zeroing the previous label.
pub fn set_current_phase(phase: Phase, previous: Option<Phase>) {
    if let Some(prev) = previous {
        gauge!("silentsignals_current_phase", "phase" => prev.as_str()).set(0.0);
    }
    gauge!("silentsignals_current_phase", "phase" => phase.as_str()).set(1.0);
}

/// Records a completed notify call.
pub fn record_notification(tier: Tier, outcome: NotifyOutcome, elapsed: Duration) {
    counter!(
        "silentsignals_notifications_total",
        "tier" => tier.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("silentsignals_notification_duration_ms", "tier" => tier.as_str())
        .record(elapsed.as_secs_f64() * 1000.0);
}

/// Records a discarded event.
pub fn record_dropped_event(reason: DropReason) {
    counter!("silentsignals_dropped_events_total", "reason" => reason.as_str()).increment(1);
}

/// Records an audit entry.
pub fn record_audit_entry() {
    counter!("silentsignals_audit_entries_total").increment(1);
}
