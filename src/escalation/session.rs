//! The live escalation session value.

use serde::Serialize;

use super::phase::Phase;

/// Snapshot of the state register: the active phase and its countdown.
///
/// `remaining_seconds` only counts down in timed phases (`CheckIn`,
/// `AlertPrimary`); every constructor forces it to `0` elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EscalationSession {
    phase: Phase,
    remaining_seconds: u32,
}

impl EscalationSession {
    /// The session every engine starts in.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            remaining_seconds: 0,
        }
    }

    /// Enters `phase` with a full countdown of `seconds`.
    ///
    /// The countdown is dropped for untimed phases.
    #[must_use]
    pub const fn enter(phase: Phase, seconds: u32) -> Self {
        Self {
            phase,
            remaining_seconds: if phase.is_timed() { seconds } else { 0 },
        }
    }

    /// The active phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Seconds left on the running countdown, `0` when none runs.
    #[must_use]
    pub const fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Consumes one tick and returns the new remaining count.
    ///
    /// Saturates at zero and does nothing in untimed phases.
    pub const fn tick(&mut self) -> u32 {
        if self.phase.is_timed() {
            self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        }
        self.remaining_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn idle_has_no_countdown() {
        let session = EscalationSession::idle();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session, EscalationSession::default());
    }

    #[test]
    fn untimed_phases_drop_the_countdown() {
        for phase in [Phase::Idle, Phase::AlertSecondary, Phase::Resolved] {
            assert_eq!(EscalationSession::enter(phase, 30).remaining_seconds(), 0);
        }
    }

    #[test]
    fn tick_counts_down_and_saturates() {
        let mut session = EscalationSession::enter(Phase::CheckIn, 2);
        assert_eq!(session.tick(), 1);
        assert_eq!(session.tick(), 0);
        assert_eq!(session.tick(), 0);
    }

    #[test]
    fn serializes_phase_label() {
        let json = serde_json::to_value(EscalationSession::enter(Phase::AlertPrimary, 5)).unwrap();
        assert_eq!(json["phase"], "ALERT_PRIMARY");
        assert_eq!(json["remaining_seconds"], 5);
    }

    proptest! {
        #[test]
        fn remaining_is_zero_outside_timed_phases(
            phase_idx in 0usize..5,
            seconds in 0u32..10_000,
            ticks in 0usize..20,
        ) {
            let phase = Phase::ALL[phase_idx];
            let mut session = EscalationSession::enter(phase, seconds);
            for _ in 0..ticks {
                session.tick();
            }
            if phase.is_timed() {
                prop_assert!(session.remaining_seconds() <= seconds);
            } else {
                prop_assert_eq!(session.remaining_seconds(), 0);
            }
        }
    }
}
