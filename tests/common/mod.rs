//! Shared integration-test helpers for driving the `silentsignals` binary
//! and building engines against the mock gateway.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use std::time::Duration;

use silentsignals::escalation::{
    Contact, ContactRole, EscalationConfig, EscalationContacts, EscalationEngine,
};
use silentsignals::gateway::{MockGateway, NotificationGateway};

/// Returns the path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs the binary with `args` to completion, feeding `stdin` if given.
#[allow(clippy::missing_panics_doc)]
pub fn run_binary(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_silentsignals"))
        .args(args)
        .env_remove("SILENTSIGNALS_CONFIG")
        .env_remove("SILENTSIGNALS_EVENTS_FILE")
        .env_remove("SILENTSIGNALS_METRICS_PORT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn silentsignals");

    {
        let mut pipe = child.stdin.take().expect("stdin not captured");
        // The process may exit before reading its input.
        if let Some(input) = stdin {
            let _ = pipe.write_all(input.as_bytes());
        }
    }

    child.wait_with_output().expect("wait for silentsignals")
}

/// The contact pair used throughout the integration tests.
pub fn contacts() -> EscalationContacts {
    EscalationContacts::new(
        Contact::new("1", "Mom", "555-0101", ContactRole::Primary),
        Contact::new("2", "Emergency Services", "911", ContactRole::Emergency),
    )
}

/// Builds an engine with the given countdowns over a zero-latency mock.
#[allow(clippy::missing_panics_doc)]
pub fn engine(check_in: u32, primary: u32) -> (EscalationEngine, Arc<MockGateway>) {
    let gateway = Arc::new(MockGateway::new());
    let engine = EscalationEngine::builder(
        EscalationConfig::new(check_in, primary).expect("valid config"),
        contacts(),
        Arc::clone(&gateway) as Arc<dyn NotificationGateway>,
    )
    .build()
    .expect("engine builds inside a runtime");
    (engine, gateway)
}

/// Advances paused time far enough for spawned gateway tasks to finish.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
