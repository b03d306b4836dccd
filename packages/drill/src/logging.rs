//! Diagnostics for the `tango` binary
//!
//! Drill prompts own stdout, so every log line goes to stderr in a compact,
//! timestamp-free form. A rolling file (`tango.log.YYYY-MM-DD`) can be added
//! for full records.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FALLBACK_DIRECTIVE: &str = "warn";
const LOG_FILE_PREFIX: &str = "tango.log";

/// Flushes buffered file logs when dropped; hold it until `main` returns
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// `RUST_LOG`-style directives, falling back to warnings only
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|err| {
        eprintln!("ignoring log filter {directives:?}: {err}");
        EnvFilter::new(FALLBACK_DIRECTIVE)
    })
}

/// Install the global subscriber
///
/// `file_logs` adds a daily rolling file under `log_dir`. If that directory
/// cannot be created the binary keeps running with stderr output only.
pub fn init_tracing(log_level: &str, file_logs: bool, log_dir: &Path) -> Option<FileLogGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .compact();

    let mut guard = None;
    let file_layer = if file_logs {
        match std::fs::create_dir_all(log_dir) {
            Ok(()) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
                let (writer, worker) = tracing_appender::non_blocking(appender);
                guard = Some(FileLogGuard { _guard: worker });
                Some(fmt::layer().with_writer(writer).with_ansi(false))
            }
            Err(err) => {
                eprintln!("file logging disabled, cannot create {}: {err}", log_dir.display());
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}
