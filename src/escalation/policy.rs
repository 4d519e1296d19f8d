//! Transition policy.
//!
//! A pure function from `(phase, event)` to the next phase plus the ordered
//! list of side effects the engine must perform. The engine owns every
//! mutation; nothing here touches state, clocks, or collaborators.
//!
//! ```text
//!            start_check_in            timeout                 timeout
//!   Idle ─────────────────► CheckIn ─────────► AlertPrimary ─────────► AlertSecondary
//!    │ ▲                      │  │                │     │                    │
//!    │ │         report_safe  │  │ report_danger  │     │ report_danger      │ report_safe
//!    │ │                      ▼  └────────────────┼─────┴───────────────────►│
//!    │ └──(grace)──────── Resolved ◄──────────────┘ report_safe              │
//!    │                        ▲──────────────────────────────────────────────┘
//!    └── report_danger (SOS) ──────────────────────────────────────────────► AlertSecondary
//! ```
//!
//! There are no self-loops, so a phase can only be re-entered after passing
//! back through `Idle`. That is what bounds every tier to one notification
//! per cycle.

use super::phase::{EscalationEvent, FeedbackCue, Phase, Tier};

/// Which configured duration a countdown is armed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// `check_in_duration_seconds`
    CheckIn,
    /// `primary_alert_duration_seconds`
    PrimaryAlert,
}

/// Audit message produced by a transition.
///
/// Rendered to text by the engine, which knows the contact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditNote {
    /// A new check-in countdown started.
    CheckInStarted,
    /// The check-in expired and the primary contact is being alerted.
    PrimaryAlerted,
    /// The primary alert expired and the secondary contact is being alerted.
    SecondaryEscalated,
    /// The user asked for help directly.
    DangerReported,
    /// The user confirmed they are safe.
    ReportedSafe,
}

/// A side effect requested by a transition, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start a fresh one-second countdown for the given duration.
    ArmCountdown(Countdown),
    /// Tell the gateway a check-in began.
    AnnounceCheckIn,
    /// Alert the contact for this tier.
    Notify(Tier),
    /// Ask the feedback collaborator for a cue.
    Feedback(FeedbackCue),
    /// Append an audit entry.
    Record(AuditNote),
    /// Arm the one-shot return to `Idle`.
    ScheduleReset,
}

/// Outcome of a defined transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Phase the event was applied to
    pub from: Phase,
    /// Phase to commit
    pub to: Phase,
    /// The event that caused the transition
    pub event: EscalationEvent,
    /// Side effects, in order
    pub effects: Vec<Effect>,
}

/// Computes the transition for `event` in `phase`.
///
/// Returns `None` when the event is not defined for the phase; the engine
/// drops such events silently. The `Resolved → Idle` reset is not an event
/// and is handled by the engine's reset timer.
#[must_use]
pub fn transition(phase: Phase, event: EscalationEvent) -> Option<Transition> {
    use EscalationEvent::{ReportDanger, ReportSafe, StartCheckIn, Timeout};

    let (to, effects) = match (phase, event) {
        (Phase::Idle, StartCheckIn) => (
            Phase::CheckIn,
            vec![
                Effect::ArmCountdown(Countdown::CheckIn),
                Effect::AnnounceCheckIn,
                Effect::Feedback(FeedbackCue::Soft),
                Effect::Record(AuditNote::CheckInStarted),
            ],
        ),
        (Phase::CheckIn, Timeout) => (
            Phase::AlertPrimary,
            vec![
                Effect::ArmCountdown(Countdown::PrimaryAlert),
                Effect::Notify(Tier::Primary),
                Effect::Feedback(FeedbackCue::Urgent),
                Effect::Record(AuditNote::PrimaryAlerted),
            ],
        ),
        (Phase::AlertPrimary, Timeout) => (
            Phase::AlertSecondary,
            vec![
                Effect::Notify(Tier::Secondary),
                Effect::Feedback(FeedbackCue::Urgent),
                Effect::Record(AuditNote::SecondaryEscalated),
            ],
        ),
        (Phase::Idle | Phase::CheckIn | Phase::AlertPrimary, ReportDanger) => (
            Phase::AlertSecondary,
            vec![
                Effect::Notify(Tier::Secondary),
                Effect::Record(AuditNote::DangerReported),
            ],
        ),
        (Phase::CheckIn | Phase::AlertPrimary | Phase::AlertSecondary, ReportSafe) => (
            Phase::Resolved,
            vec![Effect::Record(AuditNote::ReportedSafe), Effect::ScheduleReset],
        ),
        _ => return None,
    };

    Some(Transition {
        from: phase,
        to,
        event,
        effects,
    })
}
