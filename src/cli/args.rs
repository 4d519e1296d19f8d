//! CLI argument definitions.
//!
//! All Clap derive structs for `SilentSignals` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Personal-safety check-in monitor with tiered contact escalation.
#[derive(Parser, Debug)]
#[command(name = "silentsignals", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "SILENTSIGNALS_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an interactive escalation session driven from stdin.
    Run(RunArgs),

    /// Validate configuration files.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "SILENTSIGNALS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the check-in countdown, in seconds.
    #[arg(long = "check-in", value_name = "SECS")]
    pub check_in: Option<u32>,

    /// Override the primary-alert countdown, in seconds.
    #[arg(long = "primary-alert", value_name = "SECS")]
    pub primary_alert: Option<u32>,

    /// Override the gateway mode.
    #[arg(long)]
    pub gateway: Option<GatewayChoice>,

    /// Write JSONL engine events to this file.
    #[arg(long, env = "SILENTSIGNALS_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on 127.0.0.1:<PORT>.
    #[arg(long, env = "SILENTSIGNALS_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Gateway override for `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GatewayChoice {
    /// Simulated backend.
    Mock,
    /// HTTP backend from the configuration file.
    Http,
}

/// Output format for informational commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_with_overrides() {
        let cli = Cli::try_parse_from([
            "silentsignals",
            "run",
            "--config",
            "profile.yaml",
            "--check-in",
            "10",
            "--primary-alert",
            "20",
            "--gateway",
            "mock",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, Some(PathBuf::from("profile.yaml")));
        assert_eq!(args.check_in, Some(10));
        assert_eq!(args.primary_alert, Some(20));
        assert_eq!(args.gateway, Some(GatewayChoice::Mock));
    }

    #[test]
    fn validate_requires_files() {
        assert!(Cli::try_parse_from(["silentsignals", "validate"]).is_err());
        let cli = Cli::try_parse_from(["silentsignals", "validate", "a.yaml", "b.yaml"]).unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.files.len(), 2);
    }

    #[test]
    fn global_flags() {
        let cli =
            Cli::try_parse_from(["silentsignals", "-vv", "--color", "never", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
        assert!(!cli.quiet);
    }

    #[test]
    fn version_json_format() {
        let cli = Cli::try_parse_from(["silentsignals", "version", "--format", "json"]).unwrap();
        let Commands::Version(args) = cli.command else {
            panic!("expected version");
        };
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn completions_shell_names() {
        let cli = Cli::try_parse_from(["silentsignals", "completions", "powershell"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions(CompletionsArgs {
                shell: Shell::PowerShell
            })
        ));
    }

    #[test]
    fn zero_countdown_parses_but_is_rejected_later() {
        let cli = Cli::try_parse_from(["silentsignals", "run", "--check-in", "0"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.check_in, Some(0));
    }
}
