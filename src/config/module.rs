//! The module: a named, orderable unit of shell configuration.
use serde::{Deserialize, Serialize};

use crate::platform::os_matches;

/// Priority applied when a module leaves `priority` unset (or `0`).
pub const DEFAULT_PRIORITY: u32 = 50;

/// Highest priority value a module may declare.
pub const MAX_PRIORITY: u32 = 100;

/// Target used when a module leaves `target` empty and no shell is known.
pub const DEFAULT_TARGET: &str = "zshrc";

/// A single module entry from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Unique module name.
    pub name: String,
    /// Source file path, relative to the config directory.
    pub file: String,
    /// Names of modules that must precede this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    /// Operating systems this module applies to; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,
    /// Logical destination name; empty means the shell's primary target.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    /// Ordering within a target, `1..=100`; `0` means [`DEFAULT_PRIORITY`].
    #[serde(default, skip_serializing_if = "is_zero")]
    pub priority: u32,
    /// Free-text description, copied into generated headers.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Module {
    /// Create a module with only the required fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            requires: Vec::new(),
            os: Vec::new(),
            target: String::new(),
            priority: 0,
            description: String::new(),
        }
    }

    /// Set the required module names.
    #[must_use]
    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }

    /// Set the OS filter.
    #[must_use]
    pub fn with_os<I, S>(mut self, os: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.os = os.into_iter().map(Into::into).collect();
        self
    }

    /// Set the logical target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Priority with `0` mapped to [`DEFAULT_PRIORITY`].
    #[must_use]
    pub const fn effective_priority(&self) -> u32 {
        if self.priority == 0 {
            DEFAULT_PRIORITY
        } else {
            self.priority
        }
    }

    /// Target name, or `default` when none is declared.
    #[must_use]
    pub fn target_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.target.trim().is_empty() {
            default
        } else {
            self.target.trim()
        }
    }

    /// Returns `true` if the module applies to `target_os`.
    ///
    /// An empty OS list applies everywhere.
    #[must_use]
    pub fn applies_to(&self, target_os: &str) -> bool {
        self.os.is_empty() || self.os.iter().any(|os| os_matches(os, target_os))
    }
}
