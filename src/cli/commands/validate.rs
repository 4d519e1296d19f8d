//! `validate` command.

use crate::cli::args::ValidateArgs;
use crate::config::ConfigLoader;
use crate::error::SilentSignalsError;

/// Load and validate every file, printing a verdict per file.
///
/// # Errors
///
/// Returns the first load or validation error.
pub fn run(args: &ValidateArgs) -> Result<(), SilentSignalsError> {
    let loader = ConfigLoader::default();
    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let result = loader.load(path)?;

        for warning in &result.warnings {
            tracing::warn!(
                location = warning.location.as_deref().unwrap_or("<unknown>"),
                "{}",
                warning.message
            );
            eprintln!("warning: {warning}");
        }

        let contacts = result.config.escalation_contacts()?;
        println!(
            "{}: ok (check-in {}s, primary alert {}s, primary {}, secondary {})",
            path.display(),
            result.config.escalation.check_in_duration_seconds,
            result.config.escalation.primary_alert_duration_seconds,
            contacts.primary.name,
            contacts.secondary.name,
        );
    }
    Ok(())
}
