// Shared helpers for integration tests.
//
// Provides a temporary config directory and home directory plus a fluent
// builder so each integration test can set up an isolated environment
// without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone as _, Utc};
use rcforge_cli::build::BuildOptions;
use rcforge_cli::logging::{Log, OutputEntry, OutputStatus};

/// Timestamp used by every test build so generated headers are stable.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// An isolated config directory and home directory, each backed by a
/// [`tempfile::TempDir`] that is deleted when dropped.
pub struct IntegrationTestContext {
    /// Directory holding the manifest and module sources.
    pub config: tempfile::TempDir,
    /// Home directory builds and deploys target.
    pub home: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Path to the config directory.
    pub fn config_dir(&self) -> &Path {
        self.config.path()
    }

    /// Path to the home directory.
    pub fn home_dir(&self) -> &Path {
        self.home.path()
    }

    /// Path of the default build output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.config.path().join("build")
    }

    /// Build options for `os` with a fixed timestamp.
    pub fn build_options(&self, os: &str) -> BuildOptions {
        BuildOptions {
            config_dir: self.config_dir().to_path_buf(),
            os: Some(os.to_string()),
            home: self.home_dir().to_path_buf(),
            generated_at: Some(fixed_time()),
            ..BuildOptions::default()
        }
    }

    /// Read a file relative to the home directory.
    pub fn read_home(&self, rel: &str) -> String {
        std::fs::read_to_string(self.home_dir().join(rel)).expect("read home file")
    }

    /// Write a file relative to the home directory.
    pub fn write_home(&self, rel: &str, content: &str) {
        write_file(&self.home_dir().join(rel), content);
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a context with empty config and home directories.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext {
                config: tempfile::tempdir().expect("create config dir"),
                home: tempfile::tempdir().expect("create home dir"),
            },
        }
    }

    /// Write `modules.yaml` into the config directory.
    pub fn with_manifest(self, yaml: &str) -> Self {
        write_file(&self.ctx.config_dir().join("modules.yaml"), yaml);
        self
    }

    /// Write a module source file relative to the config directory.
    pub fn with_module_file(self, rel: &str, content: &str) -> Self {
        write_file(&self.ctx.config_dir().join(rel), content);
        self
    }

    /// Write a file relative to the home directory.
    pub fn with_home_file(self, rel: &str, content: &str) -> Self {
        self.ctx.write_home(rel, content);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}

/// [`Log`] implementation that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: Mutex<Vec<(&'static str, String)>>,
    outputs: Mutex<Vec<OutputEntry>>,
}

impl MemoryLog {
    fn push(&self, level: &'static str, msg: &str) {
        self.messages
            .lock()
            .expect("log lock")
            .push((level, msg.to_string()));
    }

    /// Messages logged at `level`.
    pub fn at(&self, level: &str) -> Vec<String> {
        self.messages
            .lock()
            .expect("log lock")
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Recorded outputs.
    pub fn outputs(&self) -> Vec<OutputEntry> {
        self.outputs.lock().expect("log lock").clone()
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_output(&self, name: &str, status: OutputStatus, message: Option<&str>) {
        self.outputs.lock().expect("log lock").push(OutputEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}
