//! Command: print the resolved module order.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, OrderOpts};
use crate::config::manifest;
use crate::logging::Logger;
use crate::operations::SystemFileSystemOps;
use crate::platform::Os;
use crate::resolver;
use crate::targets::{ShellType, TargetResolver};

/// Print the dependency order for the selected OS to stdout, then the
/// excluded modules with their reasons.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or does not resolve.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &OrderOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, true, log)?;
    let options = setup.build_options(&opts.select, true);
    let fs = SystemFileSystemOps;

    let path = crate::build::manifest_path(&fs, &options)?;
    let manifest = manifest::load(&fs, &path)
        .with_context(|| format!("loading {}", path.display()))?;
    manifest.validate().context("invalid manifest")?;

    let shell = ShellType::select_name(options.shell.as_deref(), manifest.shell.as_deref());
    let targets = TargetResolver::with_config_home(shell, Path::new(""), Path::new(""), None)?;
    let os = options.os.clone().unwrap_or_else(|| Os::detect().to_string());

    let graph = resolver::build_graph(&manifest)?;
    let resolution = resolver::resolve(&graph, &os).context("resolving module order")?;

    let width = resolution
        .ordered
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(0);
    for (idx, module) in resolution.ordered.iter().enumerate() {
        println!(
            "{:>3}. {:<width$}  {:<12} priority {}",
            idx + 1,
            module.name,
            targets.effective_target(module),
            module.effective_priority()
        );
    }
    if !resolution.excluded.is_empty() {
        println!();
        println!("excluded on {os}:");
        for exclusion in &resolution.excluded {
            println!("  {}: {}", exclusion.module, exclusion.reason);
        }
    }
    Ok(())
}
