//! File copy resource: place a file at a destination, skipping identical content.
use std::path::PathBuf;

use super::checksum::file_sha256;
use super::{Resource, ResourceChange, ResourceState};
use crate::error::{Error, Result};
use crate::operations::FileSystemOps;

/// A file that should exist at `dest` with the same content as `source`.
#[derive(Debug, Clone)]
pub struct FileCopyResource<'a> {
    /// File to copy from.
    pub source: PathBuf,
    /// Where the copy should live.
    pub dest: PathBuf,
    fs: &'a dyn FileSystemOps,
}

impl<'a> FileCopyResource<'a> {
    /// Create a new copy resource.
    #[must_use]
    pub fn new(source: PathBuf, dest: PathBuf, fs: &'a dyn FileSystemOps) -> Self {
        Self { source, dest, fs }
    }
}

impl Resource for FileCopyResource<'_> {
    fn description(&self) -> String {
        format!("{} -> {}", self.source.display(), self.dest.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.fs.is_file(&self.source) {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }
        if !self.fs.exists(&self.dest) {
            return Ok(ResourceState::Missing);
        }
        if !self.fs.is_file(&self.dest) {
            return Ok(ResourceState::Invalid {
                reason: "destination is a directory".to_string(),
            });
        }

        let want = file_sha256(self.fs, &self.source)
            .map_err(|e| Error::io("read", &self.source, e))?;
        let have =
            file_sha256(self.fs, &self.dest).map_err(|e| Error::io("read", &self.dest, e))?;
        if want == have {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: format!("sha256 {}", have.get(..12).unwrap_or(&have)),
            })
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
            ResourceState::Missing | ResourceState::Incorrect { .. } => {
                self.fs
                    .copy(&self.source, &self.dest)
                    .map_err(|e| Error::io("copy", &self.dest, e))?;
                Ok(ResourceChange::Applied)
            }
        }
    }
}
