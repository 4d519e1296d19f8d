//! Phase and event vocabulary for the escalation state machine.

use serde::{Deserialize, Serialize};

/// The single discrete state of an escalation session.
///
/// Serialized as `SCREAMING_SNAKE_CASE` (`"CHECK_IN"`, `"ALERT_PRIMARY"`, ...),
/// which is also the wire form the HTTP gateway's audit sink expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// No session in flight; manual check-in and SOS are available.
    #[default]
    Idle,
    /// Waiting for the user to respond before alerting anyone.
    CheckIn,
    /// Primary contact alerted; waiting once more before the final tier.
    AlertPrimary,
    /// Secondary / emergency contact alerted. No countdown runs here.
    AlertSecondary,
    /// User reported safe; returns to `Idle` after the grace interval.
    Resolved,
}

impl Phase {
    /// All phases in escalation order.
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::CheckIn,
        Self::AlertPrimary,
        Self::AlertSecondary,
        Self::Resolved,
    ];

    /// Whether a countdown runs while this phase is active.
    #[must_use]
    pub const fn is_timed(self) -> bool {
        matches!(self, Self::CheckIn | Self::AlertPrimary)
    }

    /// Whether a contact has been (or is being) alerted in this phase.
    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::AlertPrimary | Self::AlertSecondary)
    }

    /// Stable label used in logs, metrics, and the audit wire format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::CheckIn => "CHECK_IN",
            Self::AlertPrimary => "ALERT_PRIMARY",
            Self::AlertSecondary => "ALERT_SECONDARY",
            Self::Resolved => "RESOLVED",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input to the transition policy.
///
/// `Timeout` is the only event the engine generates itself; the others come
/// from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationEvent {
    /// Manual (or voice-triggered) start of a check-in.
    StartCheckIn,
    /// The running countdown reached zero.
    Timeout,
    /// The user confirmed they are safe.
    ReportSafe,
    /// The user asked for immediate help.
    ReportDanger,
}

impl EscalationEvent {
    /// Stable label used in logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartCheckIn => "start_check_in",
            Self::Timeout => "timeout",
            Self::ReportSafe => "report_safe",
            Self::ReportDanger => "report_danger",
        }
    }
}

impl std::fmt::Display for EscalationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escalation level a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// The primary contact (first tier).
    Primary,
    /// The secondary / emergency contact (final tier).
    Secondary,
}

impl Tier {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Audio/haptic cue requested from the feedback collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCue {
    /// Gentle chime and short vibration: "are you okay?"
    Soft,
    /// More insistent tone and vibration pattern: a contact is being alerted.
    Urgent,
}
