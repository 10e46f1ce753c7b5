//! Command: compare a built target with the file it would replace.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{DiffOpts, GlobalOpts};
use crate::diff::{DiffStats, diff_lines, render_unified, strip_generated_header};
use crate::logging::{Log, Logger};
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Run the diff command.
///
/// The target is built in memory; nothing is written. A missing original
/// compares as empty.
///
/// # Errors
///
/// Returns an error if the build fails, the target produced no output, or
/// `--original` is combined with a directory target.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &DiffOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, true, log)?;
    let report = setup.plan(&opts.select, log)?;
    let target = opts
        .target
        .clone()
        .unwrap_or_else(|| report.shell.primary_target().to_string());

    let outputs: Vec<_> = report.outputs.iter().filter(|o| o.target == target).collect();
    anyhow::ensure!(
        !outputs.is_empty(),
        "target '{target}' has no modules for {} on {}",
        report.shell,
        report.os
    );
    anyhow::ensure!(
        opts.original.is_none() || outputs.len() == 1,
        "--original needs a single-file target, but '{target}' produced {} files",
        outputs.len()
    );

    let fs = SystemFileSystemOps;
    let mut changed = false;
    for output in outputs {
        let original_path = opts
            .original
            .clone()
            .unwrap_or_else(|| setup.home.join(&output.dest_path));
        let original = read_original(&fs, &original_path, log)?;

        let (old, new) = if opts.ignore_headers {
            (
                strip_generated_header(&original),
                strip_generated_header(&output.content),
            )
        } else {
            (original, output.content.clone())
        };
        let ops = diff_lines(&old, &new);
        let stats = DiffStats::from_ops(&ops);
        if stats.is_identical() {
            log.info(&format!("{}: no differences", output.dest_path));
            continue;
        }
        changed = true;

        println!("--- {}", original_path.display());
        println!("+++ {} (generated)", output.dest_path);
        let context = (!opts.full).then_some(opts.context);
        print!("{}", render_unified(&ops, context));
        log.info(&format!("{}: {stats}", output.dest_path));
    }

    if !changed {
        log.info("everything is up to date");
    }
    Ok(())
}

fn read_original(fs: &dyn FileSystemOps, path: &Path, log: &dyn Log) -> Result<String> {
    if !fs.exists(path) {
        log.warn(&format!("{} does not exist; comparing against empty", path.display()));
        return Ok(String::new());
    }
    fs.read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
}
