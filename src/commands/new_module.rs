//! Command: create a new module from a template.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, NewOpts};
use crate::logging::Logger;
use crate::operations::SystemFileSystemOps;
use crate::scaffold::{NewModuleOptions, new_module};

/// Run the new command.
///
/// # Errors
///
/// Returns an error if the module already exists, its target is illegal,
/// or a write fails.
pub fn run(global: &GlobalOpts, opts: &NewOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, false, log)?;
    let options = NewModuleOptions {
        config_dir: setup.config_dir,
        manifest: opts.manifest.clone(),
        name: opts.name.clone(),
        description: opts.description.clone(),
        target: opts.target.clone(),
        requires: opts.requires.clone(),
        os: opts.os.clone(),
        priority: opts.priority,
        shell: opts.shell.clone(),
        dry_run: global.dry_run,
    };
    let report = new_module(&options, &SystemFileSystemOps, log)
        .with_context(|| format!("creating module '{}'", opts.name))?;
    log.info(&format!("edit {}", report.file_path.display()));
    Ok(())
}
