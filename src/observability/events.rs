//! Structured event stream.
//!
//! Typed events emitted as an escalation engine runs. Events are serialized
//! as newline-delimited JSON (JSONL) and carry a monotonically increasing
//! sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::escalation::{EscalationEvent, Phase, Tier};

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted by the engine or the CLI.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An engine was built and is waiting in `Idle`.
    EngineStarted {
        /// When the engine started.
        timestamp: DateTime<Utc>,
        /// User the engine watches over.
        user_id: String,
        /// Gateway implementation name.
        gateway: String,
        /// Configured check-in countdown.
        check_in_seconds: u32,
        /// Configured primary-alert countdown.
        primary_alert_seconds: u32,
    },

    /// The engine shut down.
    EngineStopped {
        /// When the engine stopped.
        timestamp: DateTime<Utc>,
        /// Human-readable reason.
        reason: String,
    },

    /// A cycle left `Idle`.
    SessionStarted {
        /// When the cycle began.
        timestamp: DateTime<Utc>,
        /// Identifier minted for the cycle.
        session_id: Uuid,
        /// Event that started it.
        trigger: EscalationEvent,
    },

    /// A transition was committed.
    PhaseEntered {
        /// When the transition committed.
        timestamp: DateTime<Utc>,
        /// Cycle the transition belongs to.
        session_id: Option<Uuid>,
        /// Phase left.
        from: Phase,
        /// Phase entered.
        to: Phase,
        /// Event applied.
        event: EscalationEvent,
        /// Countdown armed on entry (0 when untimed).
        remaining_seconds: u32,
    },

    /// A gateway notify call completed.
    NotificationSent {
        /// When the call returned.
        timestamp: DateTime<Utc>,
        /// Cycle the notification belongs to.
        session_id: Option<Uuid>,
        /// Tier alerted.
        tier: Tier,
        /// Contact name.
        contact: String,
        /// Whether the backend reported delivery.
        delivered: bool,
    },

    /// A gateway notify call failed.
    NotificationFailed {
        /// When the failure was observed.
        timestamp: DateTime<Utc>,
        /// Cycle the notification belongs to.
        session_id: Option<Uuid>,
        /// Tier that could not be alerted.
        tier: Tier,
        /// Contact name.
        contact: String,
        /// Error text.
        error: String,
    },

    /// `Resolved` returned to `Idle` after the grace interval.
    SessionReset {
        /// When the reset happened.
        timestamp: DateTime<Utc>,
        /// Cycle that ended.
        session_id: Option<Uuid>,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) increments the sequence counter,
/// serializes the event as one line, and flushes. Serialization and I/O
/// failures are dropped.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events. The engine default.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::noop()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    /// In-memory writer for capturing emitter output in tests.
    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn phase_entered() -> Event {
        Event::PhaseEntered {
            timestamp: DateTime::parse_from_rfc3339("2025-02-04T10:15:30Z")
                .unwrap()
                .with_timezone(&Utc),
            session_id: None,
            from: Phase::CheckIn,
            to: Phase::AlertPrimary,
            event: EscalationEvent::Timeout,
            remaining_seconds: 30,
        }
    }

    #[test]
    fn event_serializes_with_type_tag_and_wire_labels() {
        let parsed = serde_json::to_value(phase_entered()).unwrap();
        assert_eq!(parsed["type"], "PhaseEntered");
        assert_eq!(parsed["from"], "CHECK_IN");
        assert_eq!(parsed["to"], "ALERT_PRIMARY");
        assert_eq!(parsed["event"], "timeout");
    }

    #[test]
    fn emitter_writes_sequenced_jsonl() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(phase_entered());
        emitter.emit(Event::NotificationFailed {
            timestamp: Utc::now(),
            session_id: Some(Uuid::new_v4()),
            tier: Tier::Secondary,
            contact: "Emergency Services".to_owned(),
            error: "gateway rejected request: down".to_owned(),
        });

        assert_eq!(emitter.event_count(), 2);

        let lines: Vec<serde_json::Value> = tw
            .contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["tier"], "secondary");
        assert!(lines[0].get("event").is_some_and(|e| e == "timeout"));
    }

    #[test]
    fn noop_counts_but_discards() {
        let emitter = EventEmitter::noop();
        emitter.emit(Event::EngineStopped {
            timestamp: Utc::now(),
            reason: "test".to_owned(),
        });
        assert_eq!(emitter.event_count(), 1);
    }

    #[test]
    fn from_file_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let emitter = EventEmitter::from_file(&path).unwrap();
        emitter.emit(Event::SessionReset {
            timestamp: Utc::now(),
            session_id: None,
        });
        drop(emitter);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"type\":\"SessionReset\""));
    }
}
