//! Configuration loader.
//!
//! Loading pipeline:
//! 1. Read the file (size limit, UTF-8 BOM stripped)
//! 2. Environment variable expansion on the raw text
//! 3. YAML parsing and deserialization
//! 4. Validation
//! 5. Freeze with `Arc`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::schema::AppConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_config_size: env_or("SILENTSIGNALS_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<AppConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Loads, validates, and freezes a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or is too large
    /// - A required environment variable is unset
    /// - YAML parsing or deserialization fails
    /// - Validation reports an error
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size =
            usize::try_from(metadata.len()).unwrap_or(self.options.max_config_size.saturating_add(1));
        if file_size > self.options.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {} bytes", self.options.max_config_size),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_str(&raw, path)
    }

    /// Runs the pipeline on in-memory YAML. `origin` is used in messages.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus file access.
    pub fn load_str(&self, raw: &str, origin: &Path) -> Result<LoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        // Stage 1: environment variable substitution (before YAML parsing)
        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(raw, origin)?;
        warnings.extend(env_sub.warnings);

        // Stage 2: parse. An empty document means "all defaults".
        let config: AppConfig = if substituted.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        // Stage 3: validation
        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: origin.display().to_string(),
                errors: result.errors,
            });
        }
        warnings.extend(result.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }
}

// ============================================================================
// Environment Substitution
// ============================================================================

struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables in raw YAML text.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset, with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw_yaml: &str, source_path: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw_yaml.len());
        let mut chars = raw_yaml.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let spec = Self::parse_var_spec(&mut chars, source_path)?;
                    match std::env::var(&spec.name) {
                        Ok(value) => result.push_str(&value),
                        Err(_) => match spec.fallback {
                            Fallback::Default(value) => result.push_str(&value),
                            Fallback::Required(message) => {
                                return Err(ConfigError::EnvVarNotSet {
                                    var: spec.name,
                                    location: message,
                                });
                            }
                            Fallback::Empty => self.warnings.push(LoadWarning {
                                message: format!(
                                    "environment variable '{}' is not set, using empty string",
                                    spec.name
                                ),
                                location: Some(source_path.display().to_string()),
                            }),
                        },
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    /// Parses the body of `${...}` after the opening brace.
    fn parse_var_spec(
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        source_path: &Path,
    ) -> Result<VarSpec, ConfigError> {
        let mut name = String::new();

        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Ok(VarSpec {
                        name,
                        fallback: Fallback::Empty,
                    });
                }
                ':' => match chars.peek() {
                    Some('-') => {
                        chars.next();
                        let value = Self::read_until_close(chars, &name, source_path)?;
                        return Ok(VarSpec {
                            name,
                            fallback: Fallback::Default(value),
                        });
                    }
                    Some('?') => {
                        chars.next();
                        let message = Self::read_until_close(chars, &name, source_path)?;
                        return Ok(VarSpec {
                            name,
                            fallback: Fallback::Required(message),
                        });
                    }
                    _ => name.push(':'),
                },
                _ => name.push(c),
            }
        }

        Err(unclosed(&name, source_path))
    }

    /// Reads until the matching `}`, allowing nested braces.
    fn read_until_close(
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        name: &str,
        source_path: &Path,
    ) -> Result<String, ConfigError> {
        let mut value = String::new();
        let mut depth = 1usize;

        for c in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(value);
                    }
                }
                _ => {}
            }
            value.push(c);
        }

        Err(unclosed(name, source_path))
    }
}

struct VarSpec {
    name: String,
    fallback: Fallback,
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

fn unclosed(name: &str, source_path: &Path) -> ConfigError {
    ConfigError::ParseError {
        path: PathBuf::from(source_path),
        line: None,
        message: format!("unclosed environment variable reference: ${{{name}"),
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn loader() -> ConfigLoader {
        ConfigLoader::default()
    }

    #[test]
    fn env_substitution_simple() {
        // PATH is always set
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("path: ${PATH}", Path::new("test.yaml"))
            .unwrap();
        assert!(!result.contains("${PATH}"));
        assert!(result.len() > "path: ".len());
        assert!(sub.warnings.is_empty());
    }

    #[test]
    fn env_substitution_default() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute(
                "phone: ${SILENTSIGNALS_TEST_UNSET_XYZ123:-555-0101}",
                Path::new("test.yaml"),
            )
            .unwrap();
        assert_eq!(result, "phone: 555-0101");
    }

    #[test]
    fn env_substitution_required_missing() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute(
            "phone: ${SILENTSIGNALS_TEST_REQUIRED_XYZ123:?primary phone}",
            Path::new("test.yaml"),
        );
        match result {
            Err(ConfigError::EnvVarNotSet { var, location }) => {
                assert_eq!(var, "SILENTSIGNALS_TEST_REQUIRED_XYZ123");
                assert_eq!(location, "primary phone");
            }
            other => panic!("expected EnvVarNotSet, got {other:?}"),
        }
    }

    #[test]
    fn env_substitution_escaped_dollar() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("note: $$5 and $x", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "note: $5 and $x");
    }

    #[test]
    fn env_substitution_missing_warns() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("id: ${SILENTSIGNALS_TEST_WARN_XYZ123}", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "id: ");
        assert_eq!(sub.warnings.len(), 1);
        assert!(
            sub.warnings[0]
                .message
                .contains("SILENTSIGNALS_TEST_WARN_XYZ123")
        );
    }

    #[test]
    fn env_substitution_unclosed_is_parse_error() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("id: ${OOPS", Path::new("test.yaml"));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn empty_document_loads_defaults() {
        let result = loader().load_str("", Path::new("empty.yaml")).unwrap();
        assert_eq!(*result.config, AppConfig::default());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn bom_is_stripped() {
        let result = loader()
            .load_str("\u{feff}user_id: sam\n", Path::new("bom.yaml"))
            .unwrap();
        assert_eq!(result.config.user_id, "sam");
    }

    #[test]
    fn parse_error_reports_line() {
        let err = loader()
            .load_str("escalation:\n  check_in_duration_seconds: [\n", Path::new("bad.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { line: Some(_), .. }));
    }

    #[test]
    fn validation_errors_are_returned() {
        let err = loader()
            .load_str(
                "escalation:\n  check_in_duration_seconds: 0\n",
                Path::new("zero.yaml"),
            )
            .unwrap_err();
        match err {
            ConfigError::ValidationError { path, errors } => {
                assert_eq!(path, "zero.yaml");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn validation_warnings_are_collected() {
        let yaml = r#"
contacts:
  - { id: a, name: Mom, phone: "555-0101", role: PRIMARY }
  - { id: a, name: Emergency Services, phone: "911", role: EMERGENCY }
"#;
        let result = loader().load_str(yaml, Path::new("dup.yaml")).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].location.as_deref(), Some("contacts[1].id"));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "user_id: ${{SILENTSIGNALS_TEST_USER_XYZ123:-casey}}\nescalation:\n  check_in_duration_seconds: 5"
        )
        .unwrap();

        let result = loader().load(file.path()).unwrap();
        assert_eq!(result.config.user_id, "casey");
        assert_eq!(result.config.escalation.check_in_duration_seconds, 5);
        assert_eq!(result.config.escalation.primary_alert_duration_seconds, 30);
    }

    #[test]
    fn missing_file() {
        let err = loader()
            .load(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user_id: {}", "x".repeat(64)).unwrap();

        let loader = ConfigLoader::new(LoaderOptions {
            max_config_size: 16,
        });
        let err = loader.load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "file_size"));
    }
}
