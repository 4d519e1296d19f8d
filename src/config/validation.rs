//! Configuration validation.
//!
//! Collects every issue instead of stopping at the first, so `validate`
//! can report a whole file in one pass.

use std::collections::HashSet;

use crate::config::schema::{AppConfig, GatewayMode};
use crate::config::select_contacts;
use crate::error::{Severity, ValidationIssue};

/// Countdowns longer than this are accepted with a warning.
const LONG_COUNTDOWN_SECONDS: u32 = 24 * 60 * 60;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &AppConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        if config.user_id.trim().is_empty() {
            self.add_error("user_id", "user_id must not be empty");
        }
        self.validate_durations(config);
        self.validate_contacts(config);
        self.validate_gateway(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_durations(&mut self, config: &AppConfig) {
        let fields = [
            (
                "escalation.check_in_duration_seconds",
                config.escalation.check_in_duration_seconds,
            ),
            (
                "escalation.primary_alert_duration_seconds",
                config.escalation.primary_alert_duration_seconds,
            ),
        ];
        for (path, seconds) in fields {
            if seconds == 0 {
                self.add_error(path, "duration must be a positive number of seconds");
            } else if seconds > LONG_COUNTDOWN_SECONDS {
                self.add_warning(path, "duration is longer than a day");
            }
        }
    }

    fn validate_contacts(&mut self, config: &AppConfig) {
        let mut seen = HashSet::new();
        for (i, contact) in config.contacts.iter().enumerate() {
            if contact.name.trim().is_empty() {
                self.add_error(&format!("contacts[{i}].name"), "name must not be empty");
            }
            if contact.phone.trim().is_empty() {
                self.add_error(&format!("contacts[{i}].phone"), "phone must not be empty");
            }
            if !seen.insert(contact.id.as_str()) {
                self.add_warning(
                    &format!("contacts[{i}].id"),
                    &format!("duplicate contact id '{}'", contact.id),
                );
            }
        }

        if let Err(missing) = select_contacts(&config.contacts) {
            self.add_error("contacts", &missing.to_string());
        }
    }

    fn validate_gateway(&mut self, config: &AppConfig) {
        let gateway = &config.gateway;
        match gateway.mode {
            GatewayMode::Http => match gateway.base_url.as_deref() {
                None | Some("") => {
                    self.add_error("gateway.base_url", "base_url is required for mode: http");
                }
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    self.add_error("gateway.base_url", "base_url must be an http(s) URL");
                }
                Some(_) => {}
            },
            GatewayMode::Mock => {
                if gateway.base_url.is_some() {
                    self.add_warning("gateway.base_url", "base_url is ignored in mode: mock");
                }
            }
        }
        if gateway.timeout.is_zero() {
            self.add_error("gateway.timeout", "timeout must be greater than zero");
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}
