//! Command: split an existing RC file into modules.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, MigrateOpts};
use crate::logging::Logger;
use crate::migrate::{MigrateOptions, migrate};
use crate::operations::SystemFileSystemOps;

/// Run the migrate command.
///
/// # Errors
///
/// Returns an error if the RC file is missing, a manifest already exists
/// without `--force`, or a write fails.
pub fn run(global: &GlobalOpts, opts: &MigrateOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, false, log)?;
    let rc_file = opts
        .rc_file
        .clone()
        .unwrap_or_else(|| setup.home.join(".zshrc"));

    let options = MigrateOptions {
        rc_file,
        config_dir: setup.config_dir.clone(),
        shell: opts.shell.clone(),
        dry_run: global.dry_run,
        force: opts.force,
    };
    let report = migrate(&options, &SystemFileSystemOps, log)
        .with_context(|| format!("migrating {}", options.rc_file.display()))?;

    for section in &report.sections {
        log.info(&format!("{} <- \"{}\"", section.slug, section.title));
    }
    log.info(&format!(
        "{} module(s) for {} in {}",
        report.sections.len(),
        report.shell,
        report.manifest_path.display()
    ));
    super::finish(log)
}
