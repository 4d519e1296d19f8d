//! `SilentSignals` - personal-safety check-in monitor
//!
//! This library provides the escalation engine that walks a user through a
//! timed check-in and, when no answer arrives, alerts a primary contact and
//! then an emergency contact through a notification gateway.

pub mod cli;
pub mod config;
pub mod error;
pub mod escalation;
pub mod feedback;
pub mod gateway;
pub mod observability;

pub use error::{Result, SilentSignalsError};
pub use escalation::{EscalationConfig, EscalationEngine, EscalationEvent, Phase};
