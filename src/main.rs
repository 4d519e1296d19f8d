//! `SilentSignals` - personal-safety check-in monitor

use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

use silentsignals::cli::args::Cli;
use silentsignals::cli::commands;
use silentsignals::error::ExitCode;
use silentsignals::observability::{LogFormat, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(LogFormat::Human, cli.verbose, cli.color);
    }

    let cancel = CancellationToken::new();

    // First signal ends the session gracefully, a second one forces exit.
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                None
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            Some(()) = recv(sigterm.as_mut()) => {}
        }

        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        shutdown.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            Some(()) = recv(sigterm.as_mut()) => std::process::exit(ExitCode::TERMINATED),
        }
    });

    let result = commands::dispatch(cli, cancel).await;

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn recv(stream: Option<&mut tokio::signal::unix::Signal>) -> Option<()> {
    match stream {
        Some(s) => s.recv().await,
        None => std::future::pending().await,
    }
}
