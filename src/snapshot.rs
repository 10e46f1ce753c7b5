//! Point-in-time copies of deployed files.
//!
//! Each snapshot lives in its own directory under `<config-dir>/.snapshots`:
//!
//! ```text
//! .snapshots/
//! └── 20240501-120000/
//!     ├── snapshot.json        id, label, created_at, {path, sha256} entries
//!     └── files/
//!         └── .zshrc           copied verbatim, home-relative
//! ```
//!
//! Restoring verifies every checksum before touching the home directory.
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, NotFoundError, Result, ValidationError};
use crate::exec::Executor;
use crate::operations::FileSystemOps;
use crate::resources::checksum::{file_sha256, sha256_hex};

/// Directory name of the snapshot root inside the config directory.
pub const SNAPSHOT_DIR: &str = ".snapshots";

/// Index file inside each snapshot directory.
pub const INDEX_FILE: &str = "snapshot.json";

const FILES_DIR: &str = "files";
const ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One saved file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Path relative to the home directory, `/`-separated.
    pub path: String,
    /// SHA-256 of the content at snapshot time.
    pub sha256: String,
}

/// Index of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Directory name, derived from the creation time.
    pub id: String,
    /// Optional free-form label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Saved files.
    #[serde(default)]
    pub entries: Vec<SnapshotEntry>,
}

/// Snapshot directory manager.
#[derive(Debug)]
pub struct SnapshotStore<'a> {
    root: PathBuf,
    fs: &'a dyn FileSystemOps,
}

impl<'a> SnapshotStore<'a> {
    /// Store rooted at `<config_dir>/.snapshots`.
    #[must_use]
    pub fn new(config_dir: &Path, fs: &'a dyn FileSystemOps) -> Self {
        Self {
            root: config_dir.join(SNAPSHOT_DIR),
            fs,
        }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy every existing file among `files` (home-relative) into a new
    /// snapshot. Files that do not exist are left out.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file cannot be read or copied, or the index
    /// cannot be written.
    pub fn create(
        &self,
        files: &[String],
        home: &Path,
        label: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Snapshot> {
        let id = self.unused_id(now);
        let dir = self.root.join(&id);
        self.fs
            .create_dir_all(&dir)
            .map_err(|e| Error::io("create directory", &dir, e))?;

        let mut entries = Vec::new();
        for rel in files {
            let src = home.join(rel);
            if !self.fs.is_file(&src) {
                continue;
            }
            let content = self
                .fs
                .read_to_string(&src)
                .map_err(|e| Error::io("read", &src, e))?;
            let dest = dir.join(FILES_DIR).join(rel);
            self.fs
                .write(&dest, &content)
                .map_err(|e| Error::io("write", &dest, e))?;
            entries.push(SnapshotEntry {
                path: rel.clone(),
                sha256: sha256_hex(content.as_bytes()),
            });
        }

        let snapshot = Snapshot {
            id,
            label: label.map(str::to_string),
            created_at: now,
            entries,
        };
        let index = dir.join(INDEX_FILE);
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| {
            Error::from(ValidationError::MalformedFile {
                path: index.display().to_string(),
                message: e.to_string(),
            })
        })?;
        self.fs
            .write(&index, &format!("{json}\n"))
            .map_err(|e| Error::io("write", &index, e))?;
        Ok(snapshot)
    }

    /// All snapshots, newest first. A missing store is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed or an index is malformed.
    pub fn list(&self) -> Result<Vec<Snapshot>> {
        if !self.fs.exists(&self.root) {
            return Ok(Vec::new());
        }
        let children = self
            .fs
            .read_dir(&self.root)
            .map_err(|e| Error::io("read directory", &self.root, e))?;

        let mut snapshots = Vec::new();
        for child in children {
            let index = child.join(INDEX_FILE);
            if self.fs.is_file(&index) {
                snapshots.push(self.read_index(&index)?);
            }
        }
        snapshots.sort_by(|a, b| {
            (b.created_at, b.id.len(), &b.id).cmp(&(a.created_at, a.id.len(), &a.id))
        });
        Ok(snapshots)
    }

    /// Look up a snapshot by id, or the newest one when `id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSnapshotId`] for ids that are not a
    /// single path component and [`NotFoundError::Snapshot`] if no such
    /// snapshot exists.
    pub fn get(&self, id: Option<&str>) -> Result<Snapshot> {
        let Some(id) = id else {
            return self
                .list()?
                .into_iter()
                .next()
                .ok_or_else(|| NotFoundError::Snapshot("latest".to_string()).into());
        };
        validate_id(id)?;
        let index = self.root.join(id).join(INDEX_FILE);
        if !self.fs.is_file(&index) {
            return Err(NotFoundError::Snapshot(id.to_string()).into());
        }
        self.read_index(&index)
    }

    /// Check every saved file against its recorded checksum.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SnapshotChecksum`] for the first mismatch
    /// or missing file.
    pub fn verify(&self, snapshot: &Snapshot) -> Result<()> {
        for entry in &snapshot.entries {
            let saved = self.saved_path(snapshot, entry);
            let actual = file_sha256(self.fs, &saved).ok();
            if actual.as_deref() != Some(entry.sha256.as_str()) {
                return Err(ValidationError::SnapshotChecksum {
                    snapshot: snapshot.id.clone(),
                    path: entry.path.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Verify, then copy every saved file back under `home`.
    ///
    /// Nothing is written unless the whole snapshot verifies.
    ///
    /// # Errors
    ///
    /// Returns a checksum error from [`verify`](Self::verify) or an I/O error
    /// if a copy fails.
    pub fn restore(&self, snapshot: &Snapshot, home: &Path) -> Result<Vec<PathBuf>> {
        self.verify(snapshot)?;
        let mut restored = Vec::with_capacity(snapshot.entries.len());
        for entry in &snapshot.entries {
            let dest = home.join(&entry.path);
            self.fs
                .copy(&self.saved_path(snapshot, entry), &dest)
                .map_err(|e| Error::io("restore", &dest, e))?;
            restored.push(dest);
        }
        Ok(restored)
    }

    /// Delete the oldest snapshots so that at most `keep` remain. `keep` is
    /// raised to 1, so the newest snapshot always survives.
    ///
    /// Returns the ids that were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed or a directory cannot
    /// be removed.
    pub fn prune(&self, keep: usize) -> Result<Vec<String>> {
        let keep = keep.max(1);
        let mut removed = Vec::new();
        for snapshot in self.list()?.into_iter().skip(keep) {
            let dir = self.root.join(&snapshot.id);
            self.fs
                .remove_dir_all(&dir)
                .map_err(|e| Error::io("remove", &dir, e))?;
            removed.push(snapshot.id);
        }
        Ok(removed)
    }

    /// Commit the store to a git repository inside its root, initialising
    /// the repository on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if `git` is unavailable or any git command fails.
    pub fn commit(&self, executor: &dyn Executor, snapshot: &Snapshot) -> anyhow::Result<()> {
        anyhow::ensure!(executor.which("git"), "git is not available on PATH");
        if !self.fs.exists(&self.root.join(".git")) {
            executor
                .run_in(&self.root, "git", &["init", "--quiet"])
                .context("initialising snapshot repository")?;
        }
        executor
            .run_in(&self.root, "git", &["add", "--all"])
            .context("staging snapshot")?;
        let message = snapshot.label.as_ref().map_or_else(
            || format!("snapshot {}", snapshot.id),
            |label| format!("snapshot {}: {label}", snapshot.id),
        );
        executor
            .run_in(
                &self.root,
                "git",
                &[
                    "-c",
                    "user.name=rcforge",
                    "-c",
                    "user.email=rcforge@localhost",
                    "commit",
                    "--quiet",
                    "--allow-empty",
                    "-m",
                    &message,
                ],
            )
            .with_context(|| format!("committing snapshot {}", snapshot.id))?;
        Ok(())
    }

    fn unused_id(&self, now: DateTime<Utc>) -> String {
        let base = now.format(ID_FORMAT).to_string();
        if !self.fs.exists(&self.root.join(&base)) {
            return base;
        }
        (1..)
            .map(|n| format!("{base}-{n}"))
            .find(|id| !self.fs.exists(&self.root.join(id)))
            .unwrap_or(base)
    }

    fn saved_path(&self, snapshot: &Snapshot, entry: &SnapshotEntry) -> PathBuf {
        self.root
            .join(&snapshot.id)
            .join(FILES_DIR)
            .join(&entry.path)
    }

    fn read_index(&self, index: &Path) -> Result<Snapshot> {
        let json = self
            .fs
            .read_to_string(index)
            .map_err(|e| Error::io("read", index, e))?;
        serde_json::from_str(&json).map_err(|e| {
            Error::from(ValidationError::MalformedFile {
                path: index.display().to_string(),
                message: e.to_string(),
            })
        })
    }
}

fn validate_id(id: &str) -> Result<(), ValidationError> {
    let single_component = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.starts_with('.');
    if single_component {
        Ok(())
    } else {
        Err(ValidationError::InvalidSnapshotId(id.to_string()))
    }
}
