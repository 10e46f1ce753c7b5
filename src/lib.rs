//! Shell startup file assembly engine.
//!
//! rcforge keeps a shell configuration as small modules listed in a
//! manifest (`modules.yaml`). Each module declares the modules it requires,
//! the operating systems it applies to and the startup file it belongs in.
//! A build orders the modules with a topological sort, drops those that do
//! not apply to the current platform, and concatenates each target's
//! modules into one generated file.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: parse and validate the module manifest
//! - **[`resolver`]**: dependency graph, cycle detection and OS filtering
//! - **[`targets`]**: map shell target names to home-relative paths
//! - **[`build`]**: assemble target files and write build metadata
//! - **[`deploy`]**, **[`snapshot`]**: install builds and keep restorable backups
//! - **[`migrate`]**, **[`scaffold`]**, **[`diff`]**: authoring helpers
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod build;
pub mod cli;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod diff;
pub mod error;
pub mod exec;
pub mod logging;
pub mod migrate;
pub mod operations;
pub mod platform;
pub mod resolver;
pub mod resources;
pub mod scaffold;
pub mod snapshot;
pub mod targets;
