//! Check-in escalation state machine.
//!
//! - [`phase`]: phase and event vocabulary
//! - [`policy`]: pure transition table
//! - [`session`]: the phase + countdown value
//! - [`audit`]: append-only audit log
//! - [`scheduler`]: cancellable countdown and reset tasks
//! - [`engine`]: the engine tying them together

pub mod audit;
pub mod contact;
pub mod engine;
pub mod phase;
pub mod policy;
pub mod scheduler;
pub mod session;

pub use audit::{AuditLog, AuditLogEntry};
pub use contact::{Contact, ContactRole, EscalationContacts};
pub use engine::{EscalationConfig, EscalationEngine, EscalationEngineBuilder};
pub use phase::{EscalationEvent, FeedbackCue, Phase, Tier};
pub use session::EscalationSession;
