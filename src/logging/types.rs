//! Core logging types: output entries, status, and the [`Log`] trait.

/// Result of producing one output file, kept for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEntry {
    /// Target name or path the entry describes.
    pub name: String,
    /// Final status of the output.
    pub status: OutputStatus,
    /// Optional detail (e.g. module count or skip reason).
    pub message: Option<String>,
}

/// Status of a produced (or skipped) output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// The file was written.
    Written,
    /// The file already had the desired content.
    Unchanged,
    /// Dry-run mode; nothing was written.
    DryRun,
    /// Written, but at least one module was replaced by a placeholder.
    Degraded,
    /// Deliberately not produced.
    Skipped,
    /// Producing the file failed.
    Failed,
}

impl OutputStatus {
    /// Every status, in summary order.
    pub const ALL: [Self; 6] = [
        Self::Written,
        Self::Unchanged,
        Self::DryRun,
        Self::Degraded,
        Self::Skipped,
        Self::Failed,
    ];

    /// Word used in summary totals.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Unchanged => "unchanged",
            Self::DryRun => "dry-run",
            Self::Degraded => "degraded",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Icon and ANSI colour for a summary line.
    pub(super) const fn marker(self) -> (&'static str, &'static str) {
        match self {
            Self::Written => ("✓", "\x1b[32m"),
            Self::Unchanged => ("·", "\x1b[2m"),
            Self::DryRun => ("~", "\x1b[36m"),
            Self::Degraded => ("!", "\x1b[33m"),
            Self::Skipped => ("○", "\x1b[33m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }
}

/// Abstraction over logging backends.
///
/// Engine code logs through `&dyn Log` so that tests can capture messages
/// without installing a global subscriber.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record an output result for the summary.
    fn record_output(&self, name: &str, status: OutputStatus, message: Option<&str>);
}
