//! Command: copy the last build into the home directory.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::build::{DEFAULT_OUTPUT_DIR, expand_dir};
use crate::cli::{DeployOpts, GlobalOpts};
use crate::config::manifest;
use crate::deploy::{DeployOptions, deploy};
use crate::logging::Logger;
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Run the deploy command.
///
/// The output directory comes from `--output`, then the manifest's
/// `output_dir`, then `./build` below the config directory.
///
/// # Errors
///
/// Returns an error if no build exists or a copy fails.
pub fn run(global: &GlobalOpts, opts: &DeployOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, false, log)?;
    let fs = SystemFileSystemOps;

    let manifest_path = opts.manifest.as_ref().map_or_else(
        || manifest::find(&fs, &setup.config_dir),
        |p| Some(setup.config_dir.join(p)),
    );
    let manifest_output = match &manifest_path {
        Some(path) if fs.is_file(path) => manifest::load(&fs, path)?.output_dir,
        _ => None,
    };
    let raw = opts
        .output
        .as_deref()
        .or(manifest_output.as_deref())
        .unwrap_or(DEFAULT_OUTPUT_DIR);
    let output_dir = expand_dir(raw, &setup.home, &setup.config_dir);

    let options = DeployOptions {
        config_dir: setup.config_dir.clone(),
        output_dir,
        home: setup.home.clone(),
        dry_run: global.dry_run,
        no_backup: opts.no_backup,
        now: None,
    };
    let report = deploy(&options, &fs, log).context("deploy failed")?;

    if let Some(id) = &report.snapshot {
        log.info(&format!("previous files saved in snapshot {id}"));
    }
    log.info(&format!(
        "{} deployed, {} unchanged, {} skipped",
        report.applied.len(),
        report.unchanged.len(),
        report.skipped.len()
    ));
    super::finish(log)
}
