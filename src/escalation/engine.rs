//! Escalation engine.
//!
//! Owns the state register, the countdown and reset tasks, and the audit
//! log, and orchestrates the side effects computed by [`policy`].
//!
//! Every read and write of the register goes through one mutex. A
//! transition bumps the register's `epoch` and drops any armed timer; each
//! timer remembers the epoch it was armed in and is discarded if that epoch
//! is gone by the time it fires. Gateway calls are spawned on the runtime
//! and never awaited by a transition. Structured events and feedback cues
//! are collected under the lock and delivered after it is released.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::audit::{AuditLog, AuditLogEntry};
use super::contact::{Contact, EscalationContacts};
use super::phase::{EscalationEvent, FeedbackCue, Phase, Tier};
use super::policy::{self, AuditNote, Countdown, Effect, Transition};
use super::scheduler::{RESOLVED_GRACE, ScheduledTask, TICK};
use super::session::EscalationSession;
use crate::error::{EngineError, GatewayError};
use crate::feedback::{FeedbackSink, TracingFeedback};
use crate::gateway::NotificationGateway;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics::{self, DropReason, NotifyOutcome};

/// Default user identifier passed to the gateway.
pub const DEFAULT_USER_ID: &str = "Alex Doe";

// ============================================================================
// Configuration
// ============================================================================

/// Countdown durations, fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationConfig {
    check_in_duration_seconds: u32,
    primary_alert_duration_seconds: u32,
}

impl EscalationConfig {
    /// Validates and builds a config.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if either duration is zero.
    pub fn new(
        check_in_duration_seconds: u32,
        primary_alert_duration_seconds: u32,
    ) -> Result<Self, EngineError> {
        if check_in_duration_seconds == 0 {
            return Err(EngineError::InvalidConfig(
                "check_in_duration_seconds must be positive".into(),
            ));
        }
        if primary_alert_duration_seconds == 0 {
            return Err(EngineError::InvalidConfig(
                "primary_alert_duration_seconds must be positive".into(),
            ));
        }
        Ok(Self {
            check_in_duration_seconds,
            primary_alert_duration_seconds,
        })
    }

    /// Seconds the user has to answer a check-in.
    #[must_use]
    pub const fn check_in_duration_seconds(&self) -> u32 {
        self.check_in_duration_seconds
    }

    /// Seconds between the primary alert and the final escalation.
    #[must_use]
    pub const fn primary_alert_duration_seconds(&self) -> u32 {
        self.primary_alert_duration_seconds
    }

    const fn seconds_for(&self, countdown: Countdown) -> u32 {
        match countdown {
            Countdown::CheckIn => self.check_in_duration_seconds,
            Countdown::PrimaryAlert => self.primary_alert_duration_seconds,
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            check_in_duration_seconds: 30,
            primary_alert_duration_seconds: 30,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`EscalationEngine`].
pub struct EscalationEngineBuilder {
    config: EscalationConfig,
    contacts: EscalationContacts,
    gateway: Arc<dyn NotificationGateway>,
    user_id: String,
    feedback: Arc<dyn FeedbackSink>,
    events: Arc<EventEmitter>,
}

impl EscalationEngineBuilder {
    /// User identifier passed to every gateway call.
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Feedback collaborator. Defaults to [`TracingFeedback`].
    #[must_use]
    pub fn feedback(mut self, feedback: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    /// Structured event sink. Defaults to [`EventEmitter::noop`].
    #[must_use]
    pub fn events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    /// Builds the engine in `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoRuntime`] when called outside a Tokio
    /// runtime.
    pub fn build(self) -> Result<EscalationEngine, EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        let shared = Arc::new(Shared {
            config: self.config,
            user_id: self.user_id,
            gateway: self.gateway,
            feedback: self.feedback,
            events: self.events,
            runtime,
            cancel: CancellationToken::new(),
            register: Mutex::new(Register {
                session: EscalationSession::idle(),
                epoch: 0,
                total_seconds: 0,
                session_id: None,
                contacts: self.contacts.clone(),
                countdown: None,
                reset: None,
                audit: AuditLog::new(),
            }),
            snapshot: watch::Sender::new(EscalationSession::idle()),
            next_contacts: Mutex::new(self.contacts),
        });

        metrics::set_current_phase(Phase::Idle, None);
        shared.events.emit(Event::EngineStarted {
            timestamp: Utc::now(),
            user_id: shared.user_id.clone(),
            gateway: shared.gateway.name().to_string(),
            check_in_seconds: shared.config.check_in_duration_seconds,
            primary_alert_seconds: shared.config.primary_alert_duration_seconds,
        });
        info!(
            user_id = %shared.user_id,
            gateway = shared.gateway.name(),
            check_in = shared.config.check_in_duration_seconds,
            primary_alert = shared.config.primary_alert_duration_seconds,
            "escalation engine ready"
        );

        Ok(EscalationEngine { shared })
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Timer-driven escalation state machine.
///
/// Cheap to clone; clones share the same session. All methods are
/// synchronous and return once local state has committed. Must be built
/// inside a Tokio runtime, which runs the timers and gateway calls.
#[derive(Clone)]
pub struct EscalationEngine {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for EscalationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationEngine")
            .field("session", &self.session())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl EscalationEngine {
    /// Starts building an engine.
    #[must_use]
    pub fn builder(
        config: EscalationConfig,
        contacts: EscalationContacts,
        gateway: Arc<dyn NotificationGateway>,
    ) -> EscalationEngineBuilder {
        EscalationEngineBuilder {
            config,
            contacts,
            gateway,
            user_id: DEFAULT_USER_ID.to_string(),
            feedback: Arc::new(TracingFeedback),
            events: Arc::new(EventEmitter::noop()),
        }
    }

    /// Starts a check-in. Ignored unless the engine is `Idle`.
    ///
    /// Returns the phase after the call.
    pub fn start_check_in(&self) -> Phase {
        self.shared.handle(EscalationEvent::StartCheckIn)
    }

    /// The user is safe. Ignored in `Idle` and `Resolved`.
    pub fn report_safe(&self) -> Phase {
        self.shared.handle(EscalationEvent::ReportSafe)
    }

    /// Like [`report_safe`](Self::report_safe), but only if the engine is
    /// still in `expected`, the phase the user was answering.
    ///
    /// When a countdown expires at the same instant the user answers, only
    /// one of the two transitions commits: if the timeout won, the answer
    /// is dropped.
    pub fn report_safe_from(&self, expected: Phase) -> Phase {
        self.shared.handle_from(expected, EscalationEvent::ReportSafe)
    }

    /// The user needs help now. Jumps to `AlertSecondary` from `Idle`,
    /// `CheckIn`, or `AlertPrimary`.
    pub fn report_danger(&self) -> Phase {
        self.shared.handle(EscalationEvent::ReportDanger)
    }

    /// Like [`report_danger`](Self::report_danger), but only if the engine
    /// is still in `expected`.
    pub fn report_danger_from(&self, expected: Phase) -> Phase {
        self.shared.handle_from(expected, EscalationEvent::ReportDanger)
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.lock().session.phase()
    }

    /// Seconds left on the running countdown, `0` when none runs.
    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.shared.lock().session.remaining_seconds()
    }

    /// Phase and countdown read atomically.
    #[must_use]
    pub fn session(&self) -> EscalationSession {
        self.shared.lock().session
    }

    /// Full length of the current countdown, `0` in untimed phases.
    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.shared.lock().total_seconds
    }

    /// Identifier of the cycle in flight, `None` while `Idle`.
    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        self.shared.lock().session_id
    }

    /// Audit log snapshot, oldest first.
    #[must_use]
    pub fn audit_log(&self) -> Vec<AuditLogEntry> {
        self.shared.lock().audit.entries()
    }

    /// Up to `n` most recent audit entries, newest first.
    #[must_use]
    pub fn recent_audit(&self, n: usize) -> Vec<AuditLogEntry> {
        self.shared.lock().audit.latest(n)
    }

    /// Receiver updated on every commit and every countdown tick.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EscalationSession> {
        self.shared.snapshot.subscribe()
    }

    /// Replaces the contacts used by the next cycle.
    ///
    /// A cycle in flight keeps the contacts it started with.
    pub fn set_contacts(&self, contacts: EscalationContacts) {
        *self
            .shared
            .next_contacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = contacts;
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> EscalationConfig {
        self.shared.config
    }

    /// User identifier passed to the gateway.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.shared.user_id
    }

    /// Cancels every pending timer. Transitions requested afterwards still
    /// commit, but no countdown or reset will fire again.
    pub fn shutdown(&self) {
        self.shared.cancel.cancel();
        let mut reg = self.shared.lock();
        reg.epoch = reg.epoch.wrapping_add(1);
        reg.countdown = None;
        reg.reset = None;
        drop(reg);
        self.shared.events.emit(Event::EngineStopped {
            timestamp: Utc::now(),
            reason: "shutdown".to_string(),
        });
        info!("escalation engine stopped");
    }
}

// ============================================================================
// Internals
// ============================================================================

struct Register {
    session: EscalationSession,
    /// Bumped on every commit; timers armed under an older epoch are stale.
    epoch: u64,
    total_seconds: u32,
    session_id: Option<Uuid>,
    /// Contacts snapshot for the cycle in flight.
    contacts: EscalationContacts,
    countdown: Option<ScheduledTask>,
    reset: Option<ScheduledTask>,
    audit: AuditLog,
}

/// Side effects that run once the register lock is released.
#[derive(Default)]
struct Outbox {
    events: Vec<Event>,
    cues: Vec<FeedbackCue>,
}

impl Outbox {
    fn deliver(self, shared: &Shared) {
        for cue in self.cues {
            shared.feedback.emit(cue);
        }
        for event in self.events {
            shared.events.emit(event);
        }
    }
}

struct Shared {
    config: EscalationConfig,
    user_id: String,
    gateway: Arc<dyn NotificationGateway>,
    feedback: Arc<dyn FeedbackSink>,
    events: Arc<EventEmitter>,
    runtime: Handle,
    cancel: CancellationToken,
    register: Mutex<Register>,
    snapshot: watch::Sender<EscalationSession>,
    next_contacts: Mutex<EscalationContacts>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Register> {
        self.register.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(self: &Arc<Self>, event: EscalationEvent) -> Phase {
        let mut out = Outbox::default();
        let mut reg = self.lock();
        self.apply(&mut reg, event, &mut out);
        let phase = reg.session.phase();
        drop(reg);
        out.deliver(self);
        phase
    }

    fn handle_from(self: &Arc<Self>, expected: Phase, event: EscalationEvent) -> Phase {
        let mut out = Outbox::default();
        let mut reg = self.lock();
        let current = reg.session.phase();
        if current == expected {
            self.apply(&mut reg, event, &mut out);
        } else {
            debug!(%expected, phase = %current, %event, "event raised against a superseded phase");
            metrics::record_dropped_event(DropReason::StaleEvent);
        }
        let phase = reg.session.phase();
        drop(reg);
        out.deliver(self);
        phase
    }

    /// Applies `event` to the register. Returns `false` if it was ignored.
    fn apply(
        self: &Arc<Self>,
        reg: &mut Register,
        event: EscalationEvent,
        out: &mut Outbox,
    ) -> bool {
        let from = reg.session.phase();
        let Some(transition) = policy::transition(from, event) else {
            debug!(phase = %from, %event, "event ignored in current phase");
            metrics::record_dropped_event(DropReason::Undefined);
            return false;
        };
        let Transition { to, effects, .. } = transition;

        reg.epoch = reg.epoch.wrapping_add(1);
        reg.countdown = None;
        reg.reset = None;

        if from == Phase::Idle {
            self.begin_cycle(reg, event, out);
        }

        let armed = effects.iter().find_map(|e| match e {
            Effect::ArmCountdown(c) => Some(self.config.seconds_for(*c)),
            _ => None,
        });
        reg.session = EscalationSession::enter(to, armed.unwrap_or(0));
        reg.total_seconds = reg.session.remaining_seconds();

        info!(from = %from, to = %to, %event, "escalation transition");
        metrics::record_transition(from, to);
        metrics::set_current_phase(to, Some(from));
        out.events.push(Event::PhaseEntered {
            timestamp: Utc::now(),
            session_id: reg.session_id,
            from,
            to,
            event,
            remaining_seconds: reg.session.remaining_seconds(),
        });

        for effect in effects {
            self.perform(reg, effect, out);
        }

        self.snapshot.send_replace(reg.session);
        true
    }

    fn begin_cycle(&self, reg: &mut Register, trigger: EscalationEvent, out: &mut Outbox) {
        let id = Uuid::new_v4();
        reg.session_id = Some(id);
        reg.contacts = self
            .next_contacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!(session_id = %id, %trigger, "escalation cycle started");
        out.events.push(Event::SessionStarted {
            timestamp: Utc::now(),
            session_id: id,
            trigger,
        });
    }

    fn perform(self: &Arc<Self>, reg: &mut Register, effect: Effect, out: &mut Outbox) {
        match effect {
            Effect::ArmCountdown(_) => self.arm_countdown(reg),
            Effect::AnnounceCheckIn => self.announce_check_in(),
            Effect::Notify(tier) => self.notify(reg, tier),
            Effect::Feedback(cue) => out.cues.push(cue),
            Effect::Record(note) => {
                let message = render_note(note, &reg.contacts);
                self.record(reg, message);
            }
            Effect::ScheduleReset => self.schedule_reset(reg),
        }
    }

    // ------------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------------

    fn arm_countdown(self: &Arc<Self>, reg: &mut Register) {
        let weak = Arc::downgrade(self);
        let epoch = reg.epoch;
        reg.countdown = Some(ScheduledTask::repeating(
            &self.runtime,
            &self.cancel,
            TICK,
            move || {
                weak.upgrade()
                    .map_or(ControlFlow::Break(()), |shared| shared.on_tick(epoch))
            },
        ));
    }

    fn on_tick(self: &Arc<Self>, epoch: u64) -> ControlFlow<()> {
        let mut reg = self.lock();
        if reg.epoch != epoch || !reg.session.phase().is_timed() {
            debug!(armed = epoch, current = reg.epoch, "stale countdown tick dropped");
            metrics::record_dropped_event(DropReason::StaleTimer);
            return ControlFlow::Break(());
        }

        if reg.session.tick() > 0 {
            self.snapshot.send_replace(reg.session);
            return ControlFlow::Continue(());
        }

        let mut out = Outbox::default();
        self.apply(&mut reg, EscalationEvent::Timeout, &mut out);
        drop(reg);
        out.deliver(self);
        ControlFlow::Break(())
    }

    fn schedule_reset(self: &Arc<Self>, reg: &mut Register) {
        let weak = Arc::downgrade(self);
        let epoch = reg.epoch;
        reg.reset = Some(ScheduledTask::once(
            &self.runtime,
            &self.cancel,
            RESOLVED_GRACE,
            move || {
                if let Some(shared) = weak.upgrade() {
                    shared.on_reset(epoch);
                }
            },
        ));
    }

    fn on_reset(&self, epoch: u64) {
        let mut reg = self.lock();
        if reg.epoch != epoch || reg.session.phase() != Phase::Resolved {
            debug!(armed = epoch, current = reg.epoch, "stale reset dropped");
            metrics::record_dropped_event(DropReason::StaleTimer);
            return;
        }

        reg.epoch = reg.epoch.wrapping_add(1);
        reg.session = EscalationSession::idle();
        reg.total_seconds = 0;
        reg.reset = None;
        let session_id = reg.session_id.take();

        info!(from = %Phase::Resolved, to = %Phase::Idle, "grace interval elapsed, back to idle");
        metrics::record_transition(Phase::Resolved, Phase::Idle);
        metrics::set_current_phase(Phase::Idle, Some(Phase::Resolved));
        self.snapshot.send_replace(reg.session);
        drop(reg);
        self.events.emit(Event::SessionReset {
            timestamp: Utc::now(),
            session_id,
        });
    }

    // ------------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------------

    /// Appends to the local log and forwards to the gateway's sink.
    fn record(&self, reg: &mut Register, message: String) {
        let entry = reg.audit.record(reg.session.phase(), message);
        info!(phase = %entry.phase, "audit: {}", entry.message);
        metrics::record_audit_entry();

        let gateway = Arc::clone(&self.gateway);
        self.runtime.spawn(async move {
            if let Err(e) = gateway.record_audit(entry.phase, &entry.message).await {
                debug!(error = %e, "audit forwarding failed");
            }
        });
    }

    fn record_failure(&self, message: String) {
        let mut reg = self.lock();
        self.record(&mut reg, message);
    }

    // ------------------------------------------------------------------------
    // Gateway calls
    // ------------------------------------------------------------------------

    fn announce_check_in(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let gateway = Arc::clone(&self.gateway);
        let user_id = self.user_id.clone();
        self.runtime.spawn(async move {
            if let Err(e) = gateway.notify_check_in_started(&user_id).await {
                warn!(error = %e, "check-in notification failed");
                if let Some(shared) = weak.upgrade() {
                    shared.record_failure(format!("Check-in notification failed: {e}"));
                }
            }
        });
    }

    fn notify(self: &Arc<Self>, reg: &Register, tier: Tier) {
        let contact = match tier {
            Tier::Primary => reg.contacts.primary.clone(),
            Tier::Secondary => reg.contacts.secondary.clone(),
        };
        let session_id = reg.session_id;
        let weak = Arc::downgrade(self);
        let gateway = Arc::clone(&self.gateway);
        let events = Arc::clone(&self.events);
        let user_id = self.user_id.clone();

        self.runtime.spawn(async move {
            let started = Instant::now();
            let outcome = deliver(&*gateway, &user_id, &contact, tier).await;
            let elapsed = started.elapsed();

            let failure = match outcome {
                Ok(true) => {
                    debug!(tier = tier.as_str(), contact = %contact.name, "alert delivered");
                    metrics::record_notification(tier, NotifyOutcome::Delivered, elapsed);
                    None
                }
                Ok(false) => {
                    metrics::record_notification(tier, NotifyOutcome::Undelivered, elapsed);
                    Some("not confirmed by backend".to_string())
                }
                Err(e) => {
                    metrics::record_notification(tier, NotifyOutcome::Failed, elapsed);
                    Some(e.to_string())
                }
            };

            match failure {
                None => events.emit(Event::NotificationSent {
                    timestamp: Utc::now(),
                    session_id,
                    tier,
                    contact: contact.name.clone(),
                    delivered: true,
                }),
                Some(reason) => {
                    warn!(tier = tier.as_str(), contact = %contact.name, %reason, "alert not delivered");
                    events.emit(Event::NotificationFailed {
                        timestamp: Utc::now(),
                        session_id,
                        tier,
                        contact: contact.name.clone(),
                        error: reason.clone(),
                    });
                    if let Some(shared) = weak.upgrade() {
                        shared.record_failure(format!(
                            "{} alert to {} failed: {reason}",
                            tier_label(tier),
                            contact.name
                        ));
                    }
                }
            }
        });
    }
}

/// Runs the notify call for `tier` and reports whether delivery was confirmed.
async fn deliver(
    gateway: &dyn NotificationGateway,
    user_id: &str,
    contact: &Contact,
    tier: Tier,
) -> Result<bool, GatewayError> {
    match tier {
        Tier::Primary => gateway
            .notify_primary(user_id, contact)
            .await
            .map(|r| r.delivered()),
        Tier::Secondary => gateway
            .notify_emergency(user_id, contact)
            .await
            .map(|r| r.delivered()),
    }
}

const fn tier_label(tier: Tier) -> &'static str {
    match tier {
        Tier::Primary => "Primary",
        Tier::Secondary => "Emergency",
    }
}

fn render_note(note: AuditNote, contacts: &EscalationContacts) -> String {
    match note {
        AuditNote::CheckInStarted => "Check-in initiated. Waiting for user response.".to_string(),
        AuditNote::PrimaryAlerted => format!(
            "No response. Alerting Primary Contact: {}",
            contacts.primary.name
        ),
        AuditNote::SecondaryEscalated => format!(
            "Still no response. Escalating to Secondary: {}",
            contacts.secondary.name
        ),
        AuditNote::DangerReported => format!(
            "User requested immediate help. Alerting {}.",
            contacts.secondary.name
        ),
        AuditNote::ReportedSafe => "User reported safe. Escalation cancelled.".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
