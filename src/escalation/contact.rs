//! Contacts handed to the engine.

use serde::{Deserialize, Serialize};

/// Role a contact plays in the escalation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactRole {
    /// First tier
    Primary,
    /// Fallback final tier when no emergency contact exists
    Secondary,
    /// Preferred final tier
    Emergency,
}

impl ContactRole {
    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Secondary => "SECONDARY",
            Self::Emergency => "EMERGENCY",
        }
    }
}

impl std::fmt::Display for ContactRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person (or service) that can be alerted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable identifier
    pub id: String,
    /// Display name used in audit messages
    pub name: String,
    /// Phone number the gateway dials or texts
    pub phone: String,
    /// Escalation role
    pub role: ContactRole,
}

impl Contact {
    /// Convenience constructor.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        role: ContactRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            role,
        }
    }
}

/// The two contacts one escalation cycle alerts.
///
/// The engine never chooses among a list; the application picks these
/// (see [`crate::config::select_contacts`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationContacts {
    /// Alerted when the check-in expires
    pub primary: Contact,
    /// Alerted when the primary alert expires or the user reports danger
    pub secondary: Contact,
}

impl EscalationContacts {
    /// Pairs a primary and a secondary contact.
    #[must_use]
    pub const fn new(primary: Contact, secondary: Contact) -> Self {
        Self { primary, secondary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_uses_screaming_case_on_the_wire() {
        let contact = Contact::new("e1", "Emergency Services", "911", ContactRole::Emergency);
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["role"], "EMERGENCY");

        let role: ContactRole = serde_yaml::from_str("SECONDARY").unwrap();
        assert_eq!(role, ContactRole::Secondary);
    }
}
