//! Error types for `SilentSignals`
//!
//! One error enum per domain, aggregated under [`SilentSignalsError`] with a
//! mapping onto process exit codes. The escalation engine itself has no
//! runtime error path: invalid transitions, stale timer ticks, and gateway
//! failures all degrade to diagnostics and audit entries. Only construction
//! can fail.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `SilentSignals` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Notification gateway could not be constructed
    pub const GATEWAY_ERROR: i32 = 4;

    /// Escalation engine could not be constructed
    pub const ENGINE_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `SilentSignals` operations.
#[derive(Debug, Error)]
pub enum SilentSignalsError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Notification gateway error
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Escalation engine construction error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SilentSignalsError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Gateway(_) => ExitCode::GATEWAY_ERROR,
            Self::Engine(_) => ExitCode::ENGINE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", summarize(errors))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location in the configuration where it was referenced
        location: String,
    },
}

fn summarize(errors: &[ValidationIssue]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "contacts[1].phone")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Gateway Errors
// ============================================================================

/// Notification gateway errors.
///
/// The engine catches these at the call site and turns them into audit
/// entries; they only surface to callers when constructing a gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP request could not be sent or the connection failed
    #[error("gateway request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status
    #[error("gateway endpoint '{endpoint}' returned status {status}")]
    Status {
        /// Endpoint name (e.g. `alertPrimary`)
        endpoint: String,
        /// HTTP status code
        status: u16,
    },

    /// The backend response body could not be decoded
    #[error("gateway response could not be decoded: {0}")]
    Decode(String),

    /// The request did not complete within the configured timeout
    #[error("gateway request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The backend refused the request
    #[error("gateway rejected request: {0}")]
    Rejected(String),

    /// Gateway configuration is unusable
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

// ============================================================================
// Engine Errors
// ============================================================================

/// Escalation engine construction errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine parameters are unusable
    #[error("invalid escalation config: {0}")]
    InvalidConfig(String),

    /// The engine was built outside a Tokio runtime
    #[error("escalation engine must be built inside a Tokio runtime")]
    NoRuntime,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `SilentSignals` operations.
pub type Result<T> = std::result::Result<T, SilentSignalsError>;

// ============================================================================
// Tests
// ============================================================================
