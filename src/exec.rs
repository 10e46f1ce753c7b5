//! External process execution.
//!
//! The engine only shells out for optional git bookkeeping of snapshots.
//! Callers go through the [`Executor`] trait so tests can substitute a
//! recording stub.
use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Runs external programs.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `program` in `dir`, failing on a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run `program` in `dir` and return its result whatever the exit code.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process cannot be spawned.
    fn run_in_unchecked(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Returns `true` if `program` is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.run_in_unchecked(dir, program, args)?;
        if !result.success {
            bail!(
                "{program} {} failed (exit {}): {}",
                args.join(" "),
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn run_in_unchecked(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| format!("failed to execute: {program} in {}", dir.display()))?;
        Ok(ExecResult::from(output))
    }

    fn which(&self, program: &str) -> bool {
        #[cfg(target_os = "windows")]
        let check = Command::new("where").arg(program).output();

        #[cfg(not(target_os = "windows"))]
        let check = Command::new("which").arg(program).output();

        check.is_ok_and(|o| o.status.success())
    }
}

/// Stub [`Executor`] that records every invocation and reports success.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: std::sync::Mutex<Vec<String>>,
    /// Value returned by `which()` regardless of program name.
    pub which_result: bool,
    /// Stdout returned by unchecked runs.
    pub unchecked_stdout: String,
}

#[cfg(test)]
impl RecordingExecutor {
    /// Executor whose `which()` answers `which` for every program.
    pub fn with_which(which: bool) -> Self {
        Self {
            which_result: which,
            ..Self::default()
        }
    }

    /// Commands issued so far, as `"program arg arg"` strings.
    #[allow(clippy::unwrap_used)]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    #[allow(clippy::unwrap_used)]
    fn record(&self, program: &str, args: &[&str]) {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().unwrap().push(line);
    }
}

#[cfg(test)]
impl Executor for RecordingExecutor {
    fn run_in(&self, _: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.record(program, args);
        Ok(ExecResult {
            success: true,
            code: Some(0),
            ..ExecResult::default()
        })
    }

    fn run_in_unchecked(&self, _: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.record(program, args);
        Ok(ExecResult {
            stdout: self.unchecked_stdout.clone(),
            success: true,
            code: Some(0),
            ..ExecResult::default()
        })
    }

    fn which(&self, _: &str) -> bool {
        self.which_result
    }
}
