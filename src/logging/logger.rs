//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, OutputEntry, OutputStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger backed by the global [`tracing`] subscriber.
///
/// Messages reach the console through the formatter installed by
/// [`init_subscriber`](super::init_subscriber) and are always appended to
/// `$XDG_CACHE_HOME/rcforge/<command>.log`.
#[derive(Debug)]
pub struct Logger {
    outputs: Mutex<Vec<OutputEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger for `command`.
    ///
    /// Only remembers the log file path for the summary; the file itself is
    /// created by [`init_subscriber`](super::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            outputs: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded output entries.
    #[must_use]
    pub fn output_entries(&self) -> Vec<OutputEntry> {
        self.outputs.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record an output result for the summary.
    pub fn record_output(&self, name: &str, status: OutputStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.outputs.lock() {
            guard.push(OutputEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the outputs that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outputs.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|o| o.status == OutputStatus::Failed)
                .count()
        })
    }

    /// Print one line per recorded output followed by the non-zero totals.
    pub fn print_summary(&self) {
        let outputs = self.output_entries();
        if outputs.is_empty() {
            return;
        }
        self.stage("Summary");

        let mut counts = [0usize; OutputStatus::ALL.len()];
        for output in &outputs {
            let (icon, color) = output.status.marker();
            let suffix = output
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", output.name));
            if let Some(slot) = OutputStatus::ALL
                .iter()
                .position(|s| *s == output.status)
                .and_then(|i| counts.get_mut(i))
            {
                *slot += 1;
            }
        }

        let totals: Vec<String> = OutputStatus::ALL
            .iter()
            .zip(counts)
            .filter(|(_, n)| *n > 0)
            .map(|(status, n)| format!("{n} {}", status.label()))
            .collect();
        self.info(&format!("{} file(s): {}", outputs.len(), totals.join(", ")));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_output(&self, name: &str, status: OutputStatus, message: Option<&str>) {
        self.record_output(name, status, message);
    }
}
