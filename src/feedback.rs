//! Audio / haptic feedback seam.
//!
//! The engine asks for a [`FeedbackCue`] on entering `CheckIn` (soft) and
//! on every automatic escalation (urgent). Producing sound or vibration is
//! left to the embedding application.

use std::io::Write;
use std::sync::Mutex;

use tracing::info;

pub use crate::escalation::FeedbackCue;

/// Receives feedback cues from the engine.
///
/// Called synchronously while the engine commits a transition, so
/// implementations must return quickly and must not call back into the
/// engine.
pub trait FeedbackSink: Send + Sync {
    /// Play the cue.
    fn emit(&self, cue: FeedbackCue);
}

/// Logs cues through `tracing`. The engine default.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn emit(&self, cue: FeedbackCue) {
        match cue {
            FeedbackCue::Soft => info!(cue = "soft", "feedback: gentle chime"),
            FeedbackCue::Urgent => info!(cue = "urgent", "feedback: urgent alert tone"),
        }
    }
}

/// Rings the terminal bell on urgent cues, in addition to logging.
pub struct TerminalFeedback {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalFeedback {
    /// Writes bells to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            out: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Writes bells to an arbitrary writer.
    #[must_use]
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(writer),
        }
    }
}

impl std::fmt::Debug for TerminalFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalFeedback").finish_non_exhaustive()
    }
}

impl FeedbackSink for TerminalFeedback {
    fn emit(&self, cue: FeedbackCue) {
        TracingFeedback.emit(cue);
        if cue == FeedbackCue::Urgent
            && let Ok(mut out) = self.out.lock()
        {
            let _ = out.write_all(b"\x07");
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bell_only_on_urgent() {
        let buf = SharedBuf::default();
        let sink = TerminalFeedback::with_writer(Box::new(buf.clone()));

        sink.emit(FeedbackCue::Soft);
        assert!(buf.0.lock().unwrap().is_empty());

        sink.emit(FeedbackCue::Urgent);
        assert_eq!(buf.0.lock().unwrap().as_slice(), b"\x07");
    }

    #[test]
    fn tracing_feedback_does_not_panic() {
        TracingFeedback.emit(FeedbackCue::Soft);
        TracingFeedback.emit(FeedbackCue::Urgent);
    }
}
