//! Command: list or prune snapshots.
use anyhow::Result;
use chrono::SecondsFormat;

use super::CommandSetup;
use crate::cli::{GlobalOpts, SnapshotsOpts};
use crate::logging::Logger;
use crate::operations::SystemFileSystemOps;
use crate::snapshot::SnapshotStore;

/// Run the snapshots command.
///
/// Without `--prune`, prints one line per snapshot, newest first.
///
/// # Errors
///
/// Returns an error if the store cannot be read or a snapshot cannot be
/// removed.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &SnapshotsOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, false, log)?;
    let fs = SystemFileSystemOps;
    let store = SnapshotStore::new(&setup.config_dir, &fs);

    if let Some(keep) = opts.prune {
        if global.dry_run {
            for snapshot in store.list()?.iter().skip(keep.max(1)) {
                log.dry_run(&format!("would remove snapshot {}", snapshot.id));
            }
            return Ok(());
        }
        let removed = store.prune(keep)?;
        for id in &removed {
            log.debug(&format!("removed snapshot {id}"));
        }
        log.info(&format!("removed {} snapshot(s)", removed.len()));
        return Ok(());
    }

    let snapshots = store.list()?;
    if snapshots.is_empty() {
        log.info(&format!("no snapshots in {}", store.root().display()));
        return Ok(());
    }
    for snapshot in &snapshots {
        println!(
            "{}  {}  {:>3} file(s)  {}",
            snapshot.id,
            snapshot.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            snapshot.entries.len(),
            snapshot.label.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
