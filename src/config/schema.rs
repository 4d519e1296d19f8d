//! Configuration schema.
//!
//! Deserialized from YAML. Every section is optional; omitted sections take
//! the defaults of the stock demo profile (30 s check-in, 30 s primary
//! alert, Mom as primary contact, Emergency Services as final tier, mock
//! gateway).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::escalation::engine::DEFAULT_USER_ID;
use crate::escalation::{Contact, ContactRole};

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// User identifier passed to the gateway.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Countdown durations.
    #[serde(default)]
    pub escalation: EscalationSettings,

    /// Contact list the escalation pair is selected from.
    #[serde(default = "default_contacts")]
    pub contacts: Vec<Contact>,

    /// Notification backend.
    #[serde(default)]
    pub gateway: GatewaySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            escalation: EscalationSettings::default(),
            contacts: default_contacts(),
            gateway: GatewaySettings::default(),
        }
    }
}

/// Countdown durations in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EscalationSettings {
    /// Time the user has to answer a check-in.
    #[serde(default = "default_duration_seconds")]
    pub check_in_duration_seconds: u32,

    /// Time between the primary alert and the final escalation.
    #[serde(default = "default_duration_seconds")]
    pub primary_alert_duration_seconds: u32,
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            check_in_duration_seconds: default_duration_seconds(),
            primary_alert_duration_seconds: default_duration_seconds(),
        }
    }
}

/// Which gateway implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// In-process simulated backend.
    #[default]
    Mock,
    /// Remote JSON-over-HTTP backend.
    Http,
}

/// Gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySettings {
    /// Backend implementation.
    #[serde(default)]
    pub mode: GatewayMode,

    /// Simulated latency of the mock backend (e.g. `500ms`).
    #[serde(default = "default_latency", with = "humantime_serde")]
    pub latency: Duration,

    /// Base URL of the HTTP backend. Required for `mode: http`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout of the HTTP backend (e.g. `10s`).
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            mode: GatewayMode::default(),
            latency: default_latency(),
            base_url: None,
            timeout: default_timeout(),
        }
    }
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

const fn default_duration_seconds() -> u32 {
    30
}

const fn default_latency() -> Duration {
    Duration::from_millis(500)
}

const fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_contacts() -> Vec<Contact> {
    vec![
        Contact::new("1", "Mom", "555-0101", ContactRole::Primary),
        Contact::new("2", "Emergency Services", "911", ContactRole::Emergency),
    ]
}

mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_takes_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.user_id, "Alex Doe");
        assert_eq!(config.escalation.check_in_duration_seconds, 30);
        assert_eq!(config.contacts.len(), 2);
        assert_eq!(config.gateway.mode, GatewayMode::Mock);
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
user_id: sam
escalation:
  check_in_duration_seconds: 45
  primary_alert_duration_seconds: 60
contacts:
  - { id: p1, name: Dad, phone: "555-0102", role: PRIMARY }
  - { id: s1, name: Neighbor, phone: "555-0199", role: SECONDARY }
gateway:
  mode: http
  base_url: https://example.test
  timeout: 2s
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.user_id, "sam");
        assert_eq!(config.escalation.primary_alert_duration_seconds, 60);
        assert_eq!(config.contacts[1].role, ContactRole::Secondary);
        assert_eq!(config.gateway.mode, GatewayMode::Http);
        assert_eq!(config.gateway.timeout, Duration::from_secs(2));
        assert_eq!(config.gateway.latency, Duration::from_millis(500));
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<AppConfig, _> = serde_yaml::from_str("escalation:\n  check_in: 5\n");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_duration() {
        let result: Result<GatewaySettings, _> = serde_yaml::from_str("latency: soon\n");
        assert!(result.is_err());
    }
}
