//! `run` command: an interactive escalation session on the terminal.
//!
//! Reads one command per line from stdin and prints every phase change and
//! countdown value as the engine publishes it.

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::args::{GatewayChoice, RunArgs};
use crate::config::{AppConfig, ConfigLoader, GatewayMode};
use crate::error::SilentSignalsError;
use crate::escalation::{EscalationEngine, EscalationSession, Phase};
use crate::feedback::TerminalFeedback;
use crate::gateway::build_gateway;
use crate::observability::{EventEmitter, init_metrics};

const HELP: &str = "\
commands:
  check-in, c     start a check-in
  safe, s         report that you are safe
  danger, sos     ask for help now
  status          show the current phase
  log             show recent activity
  help, h         show this help
  quit, q         exit";

/// Number of audit entries `log` prints.
const LOG_LINES: usize = 10;

/// Phase the user last saw on the terminal.
///
/// Reports are dispatched against this phase, so an answer typed while a
/// countdown expires cannot also apply to the phase that replaced it.
#[derive(Debug)]
struct SeenPhase(Mutex<Phase>);

impl SeenPhase {
    const fn new(phase: Phase) -> Self {
        Self(Mutex::new(phase))
    }

    fn get(&self) -> Phase {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, phase: Phase) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }
}

/// A line command typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a check-in
    CheckIn,
    /// Report safe
    Safe,
    /// Report danger
    Danger,
    /// Print the current phase
    Status,
    /// Print recent audit entries
    Log,
    /// Print the command list
    Help,
    /// Leave the session
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check-in" | "checkin" | "c" => Ok(Self::CheckIn),
            "safe" | "s" | "ok" => Ok(Self::Safe),
            "danger" | "sos" | "help me" => Ok(Self::Danger),
            "status" => Ok(Self::Status),
            "log" => Ok(Self::Log),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}' (type 'help')")),
        }
    }
}

/// Runs an interactive session until `quit`, end of input, or `cancel`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the gateway or
/// engine cannot be built, or the events file cannot be created.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), SilentSignalsError> {
    let config = resolve_config(args)?;

    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "metrics endpoint listening");
    }

    let events = match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    };

    let gateway = build_gateway(&config.gateway)?;
    let engine = EscalationEngine::builder(
        config.escalation_config()?,
        config.escalation_contacts()?,
        gateway,
    )
    .user_id(config.user_id.clone())
    .feedback(Arc::new(TerminalFeedback::stdout()))
    .events(Arc::new(events))
    .build()?;

    println!(
        "SilentSignals watching over {} (check-in {}s, primary alert {}s)",
        engine.user_id(),
        config.escalation.check_in_duration_seconds,
        config.escalation.primary_alert_duration_seconds,
    );
    println!("{HELP}");

    let seen = Arc::new(SeenPhase::new(engine.phase()));
    let display = tokio::spawn(display_loop(
        engine.clone(),
        Arc::clone(&seen),
        cancel.child_token(),
    ));
    let result = drive(&engine, BufReader::new(tokio::io::stdin()), &cancel, &seen).await;

    engine.shutdown();
    display.abort();
    result
}

/// Feeds line commands from `input` to the engine until `quit`, end of
/// input, or `cancel`.
async fn drive<R>(
    engine: &EscalationEngine,
    input: R,
    cancel: &CancellationToken,
    seen: &SeenPhase,
) -> Result<(), SilentSignalsError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            debug!("stdin closed");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => return Ok(()),
            Ok(command) => execute(engine, command, seen),
            Err(message) => eprintln!("{message}"),
        }
    }
}

/// Loads the configuration file (or defaults) and applies CLI overrides.
fn resolve_config(args: &RunArgs) -> Result<AppConfig, SilentSignalsError> {
    let mut config = match &args.config {
        Some(path) => {
            let result = ConfigLoader::default().load(path)?;
            for warning in &result.warnings {
                tracing::warn!("{warning}");
            }
            (*result.config).clone()
        }
        None => AppConfig::default(),
    };

    if let Some(seconds) = args.check_in {
        config.escalation.check_in_duration_seconds = seconds;
    }
    if let Some(seconds) = args.primary_alert {
        config.escalation.primary_alert_duration_seconds = seconds;
    }
    if let Some(choice) = args.gateway {
        config.gateway.mode = match choice {
            GatewayChoice::Mock => GatewayMode::Mock,
            GatewayChoice::Http => GatewayMode::Http,
        };
    }
    Ok(config)
}

fn execute(engine: &EscalationEngine, command: Command, seen: &SeenPhase) {
    match command {
        Command::CheckIn => {
            if engine.phase() != Phase::Idle {
                println!("a session is already in progress");
            }
            seen.set(engine.start_check_in());
        }
        Command::Safe => {
            let expected = seen.get();
            let phase = engine.report_safe_from(expected);
            if phase != expected && phase != Phase::Resolved {
                println!("[{phase}] report not applied, type 'safe' again");
            }
            seen.set(phase);
        }
        Command::Danger => {
            let expected = seen.get();
            if expected == Phase::AlertSecondary {
                println!("help is already on the way");
            }
            let phase = engine.report_danger_from(expected);
            if phase != expected && phase != Phase::AlertSecondary {
                println!("[{phase}] report not applied, type 'sos' again");
            }
            seen.set(phase);
        }
        Command::Status => {
            let session = engine.session();
            seen.set(session.phase());
            println!("{}", describe(session, engine.total_seconds()));
        }
        Command::Log => {
            let entries = engine.recent_audit(LOG_LINES);
            if entries.is_empty() {
                println!("no activity yet");
            }
            for entry in entries {
                println!("{entry}");
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

/// Prints phase changes and countdown values until cancelled.
async fn display_loop(engine: EscalationEngine, seen: Arc<SeenPhase>, cancel: CancellationToken) {
    let mut rx = engine.subscribe();
    let mut last_phase = rx.borrow_and_update().phase();
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        let session = *rx.borrow_and_update();
        if session.phase() == last_phase {
            if session.phase().is_timed() {
                println!("  {}s", session.remaining_seconds());
            }
        } else {
            last_phase = session.phase();
            println!("{}", describe(session, engine.total_seconds()));
            seen.set(last_phase);
        }
    }
}

/// One-line description of a session for the terminal.
#[must_use]
pub fn describe(session: EscalationSession, total_seconds: u32) -> String {
    let label = match session.phase() {
        Phase::Idle => "idle: type 'check-in' to start, 'sos' for immediate help",
        Phase::CheckIn => "are you okay? type 'safe' to confirm",
        Phase::AlertPrimary => "no response, primary contact alerted",
        Phase::AlertSecondary => "emergency contact alerted, type 'safe' to cancel",
        Phase::Resolved => "you are safe, escalation cancelled",
    };
    if session.phase().is_timed() {
        format!(
            "[{}] {label} ({}s of {total_seconds}s left)",
            session.phase(),
            session.remaining_seconds()
        )
    } else {
        format!("[{}] {label}", session.phase())
    }
}
