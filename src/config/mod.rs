//! Configuration
//!
//! Loading and validation of `SilentSignals` YAML configuration files, and
//! selection of the contact pair an escalation cycle alerts.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::{AppConfig, EscalationSettings, GatewayMode, GatewaySettings};
pub use validation::{ValidationResult, Validator};

use crate::error::{ConfigError, EngineError};
use crate::escalation::{Contact, ContactRole, EscalationConfig, EscalationContacts};

/// Picks the contacts for one escalation cycle.
///
/// The primary is the first `PRIMARY` contact. The secondary is the first
/// `EMERGENCY` contact, falling back to the first `SECONDARY`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] naming the missing role.
pub fn select_contacts(contacts: &[Contact]) -> Result<EscalationContacts, ConfigError> {
    let first = |role: ContactRole| contacts.iter().find(|c| c.role == role);

    let primary = first(ContactRole::Primary)
        .ok_or_else(|| missing_role(contacts, "a PRIMARY contact"))?;
    let secondary = first(ContactRole::Emergency)
        .or_else(|| first(ContactRole::Secondary))
        .ok_or_else(|| missing_role(contacts, "an EMERGENCY or SECONDARY contact"))?;

    Ok(EscalationContacts::new(primary.clone(), secondary.clone()))
}

fn missing_role(contacts: &[Contact], expected: &str) -> ConfigError {
    let roles: Vec<&str> = contacts.iter().map(|c| c.role.as_str()).collect();
    ConfigError::InvalidValue {
        field: "contacts".to_string(),
        value: format!("[{}]", roles.join(", ")),
        expected: expected.to_string(),
    }
}

impl AppConfig {
    /// Engine durations from the `escalation` section.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a zero duration.
    pub fn escalation_config(&self) -> Result<EscalationConfig, EngineError> {
        EscalationConfig::new(
            self.escalation.check_in_duration_seconds,
            self.escalation.primary_alert_duration_seconds,
        )
    }

    /// Contact pair selected from `contacts`.
    ///
    /// # Errors
    ///
    /// See [`select_contacts`].
    pub fn escalation_contacts(&self) -> Result<EscalationContacts, ConfigError> {
        select_contacts(&self.contacts)
    }
}
