//! Copy built files from the output directory into the home directory.
//!
//! The build metadata says which built file lands where. Each copy is an
//! idempotent [`FileCopyResource`]: identical destinations are left alone,
//! and a snapshot of every existing destination is taken before the first
//! one is replaced.
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::build::metadata::BuildMetadata;
use crate::error::Result;
use crate::logging::{Log, OutputStatus};
use crate::operations::FileSystemOps;
use crate::resources::file_copy::FileCopyResource;
use crate::resources::{Resource, ResourceChange, ResourceState};
use crate::snapshot::SnapshotStore;

/// Label attached to automatic pre-deploy snapshots.
pub const PRE_DEPLOY_LABEL: &str = "pre-deploy";

/// Inputs of a deploy run.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Directory holding the snapshot store.
    pub config_dir: PathBuf,
    /// Build output directory containing the metadata file.
    pub output_dir: PathBuf,
    /// Home directory the destinations are relative to.
    pub home: PathBuf,
    /// Report without writing.
    pub dry_run: bool,
    /// Skip the pre-deploy snapshot.
    pub no_backup: bool,
    /// Fixed snapshot timestamp; `None` uses the current time.
    pub now: Option<DateTime<Utc>>,
}

/// What a deploy run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployReport {
    /// Destinations written (or that would be, in dry-run).
    pub applied: Vec<PathBuf>,
    /// Destinations that already matched.
    pub unchanged: Vec<PathBuf>,
    /// Destinations skipped, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Id of the pre-deploy snapshot, if one was taken.
    pub snapshot: Option<String>,
}

/// Deploy the last build in `options.output_dir`.
///
/// # Errors
///
/// Returns [`crate::error::NotFoundError::File`] if no build metadata exists,
/// or an I/O error if a snapshot or copy fails.
pub fn deploy(
    options: &DeployOptions,
    fs: &dyn FileSystemOps,
    log: &dyn Log,
) -> Result<DeployReport> {
    log.stage("Reading build metadata");
    let metadata =
        BuildMetadata::read(fs, &options.output_dir).map_err(|e| e.in_stage("read build metadata"))?;
    log.debug(&format!(
        "build from {} ({} {}, {} files)",
        metadata.generated_at,
        metadata.shell,
        metadata.os,
        metadata.files.len()
    ));

    let resources: Vec<(&str, FileCopyResource<'_>)> = metadata
        .files
        .iter()
        .map(|f| {
            (
                f.dest_path.as_str(),
                FileCopyResource::new(
                    options.output_dir.join(&f.source),
                    options.home.join(&f.dest_path),
                    fs,
                ),
            )
        })
        .collect();

    let mut states = Vec::with_capacity(resources.len());
    for (_, resource) in &resources {
        states.push(resource.current_state().map_err(|e| e.in_stage("check destinations"))?);
    }

    let mut report = DeployReport::default();
    let replaces_any = states
        .iter()
        .any(|s| matches!(s, ResourceState::Incorrect { .. }));
    if replaces_any && !options.no_backup {
        let existing: Vec<String> = resources
            .iter()
            .filter(|(_, r)| fs.is_file(&r.dest))
            .map(|(dest, _)| (*dest).to_string())
            .collect();
        if options.dry_run {
            log.dry_run(&format!("would snapshot {} existing file(s)", existing.len()));
        } else {
            log.stage("Snapshotting existing files");
            let store = SnapshotStore::new(&options.config_dir, fs);
            let snapshot = store
                .create(
                    &existing,
                    &options.home,
                    Some(PRE_DEPLOY_LABEL),
                    options.now.unwrap_or_else(Utc::now),
                )
                .map_err(|e| e.in_stage("snapshot destinations"))?;
            log.info(&format!(
                "snapshot {} saved ({} file(s))",
                snapshot.id,
                snapshot.entries.len()
            ));
            report.snapshot = Some(snapshot.id);
        }
    }

    log.stage("Deploying files");
    for ((name, resource), state) in resources.iter().zip(states) {
        match state {
            ResourceState::Correct => {
                log.debug(&format!("{name} is up to date"));
                log.record_output(name, OutputStatus::Unchanged, None);
                report.unchanged.push(resource.dest.clone());
            }
            ResourceState::Invalid { reason } => {
                log.warn(&format!("skipping {name}: {reason}"));
                log.record_output(name, OutputStatus::Skipped, Some(&reason));
                report.skipped.push((resource.dest.clone(), reason));
            }
            ResourceState::Missing | ResourceState::Incorrect { .. } if options.dry_run => {
                log.dry_run(&format!("would deploy {}", resource.description()));
                log.record_output(name, OutputStatus::DryRun, None);
                report.applied.push(resource.dest.clone());
            }
            ResourceState::Missing | ResourceState::Incorrect { .. } => {
                match resource.apply().map_err(|e| e.in_stage("deploy files"))? {
                    ResourceChange::Applied => {
                        log.debug(&format!("deployed {}", resource.description()));
                        log.record_output(name, OutputStatus::Written, None);
                        report.applied.push(resource.dest.clone());
                    }
                    ResourceChange::AlreadyCorrect => {
                        log.record_output(name, OutputStatus::Unchanged, None);
                        report.unchanged.push(resource.dest.clone());
                    }
                    ResourceChange::Skipped { reason } => {
                        log.warn(&format!("skipping {name}: {reason}"));
                        log.record_output(name, OutputStatus::Skipped, Some(&reason));
                        report.skipped.push((resource.dest.clone(), reason));
                    }
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::build::metadata::FileMapping;
    use crate::error::ErrorKind;
    use crate::logging::CapturedLog;
    use crate::operations::MockFileSystemOps;
    use chrono::TimeZone;
    use std::path::Path;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn options() -> DeployOptions {
        DeployOptions {
            config_dir: PathBuf::from("/cfg"),
            output_dir: PathBuf::from("/out"),
            home: PathBuf::from("/home/u"),
            now: Some(now()),
            ..DeployOptions::default()
        }
    }

    /// Output dir with a `.zshrc` and `.zshenv` build and its metadata.
    fn built() -> MockFileSystemOps {
        let fs = MockFileSystemOps::new()
            .with_file("/out/.zshrc", "new rc\n")
            .with_file("/out/.zshenv", "new env\n");
        BuildMetadata {
            shell: "zsh".to_string(),
            os: "Linux".to_string(),
            generated_at: now(),
            files: [(".zshrc", "zshrc"), (".zshenv", "zshenv")]
                .into_iter()
                .map(|(path, target)| FileMapping {
                    source: path.to_string(),
                    target: target.to_string(),
                    dest_path: path.to_string(),
                })
                .collect(),
        }
        .write(&fs, Path::new("/out"))
        .unwrap();
        fs
    }

    #[test]
    fn fresh_home_copies_everything_without_snapshot() {
        let fs = built();
        let log = CapturedLog::default();
        let report = deploy(&options(), &fs, &log).unwrap();

        assert_eq!(report.applied.len(), 2);
        assert!(report.snapshot.is_none());
        assert_eq!(fs.file("/home/u/.zshrc").as_deref(), Some("new rc\n"));
        assert_eq!(fs.file("/home/u/.zshenv").as_deref(), Some("new env\n"));
    }

    #[test]
    fn identical_destination_is_unchanged() {
        let fs = built().with_file("/home/u/.zshrc", "new rc\n");
        let report = deploy(&options(), &fs, &CapturedLog::default()).unwrap();
        assert_eq!(report.unchanged, vec![PathBuf::from("/home/u/.zshrc")]);
        assert_eq!(report.applied, vec![PathBuf::from("/home/u/.zshenv")]);
        assert!(report.snapshot.is_none());
    }

    #[test]
    fn replacing_a_file_snapshots_existing_destinations_first() {
        let fs = built().with_file("/home/u/.zshrc", "old rc\n");
        let report = deploy(&options(), &fs, &CapturedLog::default()).unwrap();

        assert_eq!(report.snapshot.as_deref(), Some("20240501-120000"));
        assert_eq!(
            fs.file("/cfg/.snapshots/20240501-120000/files/.zshrc").as_deref(),
            Some("old rc\n")
        );
        assert_eq!(fs.file("/home/u/.zshrc").as_deref(), Some("new rc\n"));
    }

    #[test]
    fn no_backup_skips_snapshot() {
        let fs = built().with_file("/home/u/.zshrc", "old rc\n");
        let opts = DeployOptions {
            no_backup: true,
            ..options()
        };
        let report = deploy(&opts, &fs, &CapturedLog::default()).unwrap();
        assert!(report.snapshot.is_none());
        assert!(!fs.exists(Path::new("/cfg/.snapshots")));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let fs = built().with_file("/home/u/.zshrc", "old rc\n");
        let before = fs.written_paths().len();
        let log = CapturedLog::default();
        let opts = DeployOptions {
            dry_run: true,
            ..options()
        };
        let report = deploy(&opts, &fs, &log).unwrap();

        assert_eq!(report.applied.len(), 2);
        assert_eq!(fs.written_paths().len(), before);
        assert_eq!(fs.file("/home/u/.zshrc").as_deref(), Some("old rc\n"));
        assert_eq!(log.at("dry_run").len(), 3);
    }

    #[test]
    fn missing_built_file_is_skipped() {
        let fs = MockFileSystemOps::new();
        BuildMetadata {
            shell: "zsh".to_string(),
            os: "Linux".to_string(),
            generated_at: now(),
            files: vec![FileMapping {
                source: ".zshrc".to_string(),
                target: "zshrc".to_string(),
                dest_path: ".zshrc".to_string(),
            }],
        }
        .write(&fs, Path::new("/out"))
        .unwrap();
        let log = CapturedLog::default();
        let report = deploy(&options(), &fs, &log).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(log.outputs()[0].status, OutputStatus::Skipped);
    }

    #[test]
    fn missing_metadata_is_not_found() {
        let fs = MockFileSystemOps::new();
        let err = deploy(&options(), &fs, &CapturedLog::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("failed to read build metadata"));
    }
}
