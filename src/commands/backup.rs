//! Command: snapshot the files a deploy would replace.
use anyhow::{Context as _, Result};
use chrono::Utc;

use super::CommandSetup;
use crate::cli::{BackupOpts, GlobalOpts};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::operations::{FileSystemOps as _, SystemFileSystemOps};
use crate::snapshot::SnapshotStore;

/// Run the backup command.
///
/// The destinations come from an in-memory build, so no prior build is
/// needed.
///
/// # Errors
///
/// Returns an error if the build plan fails, a file cannot be copied, or
/// the optional git commit fails.
pub fn run(global: &GlobalOpts, opts: &BackupOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, true, log)?;
    let report = setup.plan(&opts.select, log)?;
    let files: Vec<String> = report.outputs.iter().map(|o| o.dest_path.clone()).collect();

    let fs = SystemFileSystemOps;
    let store = SnapshotStore::new(&setup.config_dir, &fs);
    if global.dry_run {
        let existing = files
            .iter()
            .filter(|f| fs.is_file(&setup.home.join(f)))
            .count();
        log.dry_run(&format!(
            "would snapshot {existing} file(s) into {}",
            store.root().display()
        ));
        return Ok(());
    }

    log.stage("Creating snapshot");
    let snapshot = store
        .create(&files, &setup.home, opts.label.as_deref(), Utc::now())
        .context("creating snapshot")?;
    for entry in &snapshot.entries {
        log.debug(&format!("saved {}", entry.path));
    }
    log.info(&format!(
        "snapshot {} saved ({} file(s))",
        snapshot.id,
        snapshot.entries.len()
    ));

    if opts.commit {
        store.commit(&SystemExecutor, &snapshot)?;
        log.info(&format!("committed snapshot {}", snapshot.id));
    }
    Ok(())
}
