#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing
)]
//! Integration tests for migrating an existing RC file and building the
//! result.

mod common;

use common::{MemoryLog, TestContextBuilder};
use rcforge_cli::build;
use rcforge_cli::config::manifest;
use rcforge_cli::error::ErrorKind;
use rcforge_cli::migrate::{self, MigrateOptions};
use rcforge_cli::operations::SystemFileSystemOps;

const BASHRC: &str = "\
# ~/.bashrc
[ -z \"$PS1\" ] && return

# === Aliases ===
alias ll='ls -l'

# === Prompt ===
PS1='\\u@\\h \\w$ '
";

#[test]
fn migrated_rc_file_builds_back() {
    let ctx = TestContextBuilder::new()
        .with_home_file(".bashrc", BASHRC)
        .build();
    let fs = SystemFileSystemOps;
    let options = MigrateOptions {
        rc_file: ctx.home_dir().join(".bashrc"),
        config_dir: ctx.config_dir().to_path_buf(),
        ..MigrateOptions::default()
    };

    let report = migrate::migrate(&options, &fs, &MemoryLog::default()).unwrap();
    assert_eq!(report.shell.as_str(), "bash");
    let slugs: Vec<&str> = report.sections.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs, vec!["preamble", "aliases", "prompt"]);

    let manifest = manifest::load(&fs, &report.manifest_path).unwrap();
    assert_eq!(manifest.shell.as_deref(), Some("bash"));
    assert_eq!(manifest.modules.len(), 3);
    assert!(ctx.config_dir().join("modules/aliases.sh").is_file());

    let built = build::build(&ctx.build_options("linux"), &fs, &MemoryLog::default()).unwrap();
    let bashrc = &built.output_for("bashrc").expect("bashrc output").content;
    let aliases = bashrc.find("alias ll").unwrap();
    let prompt = bashrc.find("PS1='").unwrap();
    assert!(aliases < prompt);
}

#[test]
fn existing_manifest_requires_force() {
    let ctx = TestContextBuilder::new()
        .with_manifest("modules: []\n")
        .with_home_file(".zshrc", "export A=1\n")
        .build();
    let options = MigrateOptions {
        rc_file: ctx.home_dir().join(".zshrc"),
        config_dir: ctx.config_dir().to_path_buf(),
        ..MigrateOptions::default()
    };

    let err = migrate::migrate(&options, &SystemFileSystemOps, &MemoryLog::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let forced = MigrateOptions {
        force: true,
        ..options
    };
    migrate::migrate(&forced, &SystemFileSystemOps, &MemoryLog::default()).unwrap();
}

#[test]
fn missing_rc_file_is_not_found() {
    let ctx = TestContextBuilder::new().build();
    let options = MigrateOptions {
        rc_file: ctx.home_dir().join(".zshrc"),
        config_dir: ctx.config_dir().to_path_buf(),
        ..MigrateOptions::default()
    };
    let err = migrate::migrate(&options, &SystemFileSystemOps, &MemoryLog::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
