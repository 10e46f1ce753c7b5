//! Command: assemble module sources into shell startup files.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{BuildOpts, GlobalOpts};
use crate::logging::Logger;
use crate::operations::SystemFileSystemOps;

/// Run the build command.
///
/// # Errors
///
/// Returns an error if the directories cannot be resolved or the build fails.
pub fn run(global: &GlobalOpts, opts: &BuildOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, true, log)?;
    let mut options = setup.build_options(&opts.select, global.dry_run);
    options.output_dir.clone_from(&opts.output);
    options.targets.clone_from(&opts.targets);

    let report = crate::build::build(&options, &SystemFileSystemOps, log).context("build failed")?;

    log.info(&format!(
        "{} file(s) for {} on {} in {}",
        report.outputs.len(),
        report.shell,
        report.os,
        report.output_dir.display()
    ));
    if let Some(path) = &report.metadata_path {
        log.debug(&format!("metadata: {}", path.display()));
    }
    super::finish(log)
}
