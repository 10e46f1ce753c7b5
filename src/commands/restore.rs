//! Command: restore a snapshot into the home directory.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, RestoreOpts};
use crate::logging::Logger;
use crate::operations::SystemFileSystemOps;
use crate::snapshot::SnapshotStore;

/// Run the restore command.
///
/// # Errors
///
/// Returns an error if the snapshot does not exist, fails verification, or
/// a file cannot be copied.
pub fn run(global: &GlobalOpts, opts: &RestoreOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, false, log)?;
    let fs = SystemFileSystemOps;
    let store = SnapshotStore::new(&setup.config_dir, &fs);

    let snapshot = store.get(opts.id.as_deref())?;
    log.stage(&format!("Restoring snapshot {}", snapshot.id));

    if global.dry_run {
        store.verify(&snapshot)?;
        for entry in &snapshot.entries {
            log.dry_run(&format!(
                "would restore {}",
                setup.home.join(&entry.path).display()
            ));
        }
        return Ok(());
    }

    let restored = store
        .restore(&snapshot, &setup.home)
        .with_context(|| format!("restoring snapshot {}", snapshot.id))?;
    for path in &restored {
        log.debug(&format!("restored {}", path.display()));
    }
    log.info(&format!(
        "restored {} file(s) from {}",
        restored.len(),
        snapshot.id
    ));
    Ok(())
}
