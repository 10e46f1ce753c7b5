//! Build metadata: the record of which built file deploys where.
//!
//! Written as pretty JSON into the output directory after every non-dry-run
//! build and read back by `deploy`. Readers ignore unknown fields and
//! default missing ones, so new fields can be added without a version bump.
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, NotFoundError, Result, ValidationError};
use crate::operations::FileSystemOps;

/// File name of the metadata artifact inside the output directory.
pub const METADATA_FILE_NAME: &str = ".rcforge-build.json";

/// One emitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapping {
    /// Path of the built file relative to the output directory.
    pub source: String,
    /// Logical target the file belongs to.
    pub target: String,
    /// Destination path relative to the home directory.
    pub dest_path: String,
}

/// Everything the deploy step needs to know about a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    /// Shell type of the build.
    #[serde(default)]
    pub shell: String,
    /// Target OS of the build.
    #[serde(default)]
    pub os: String,
    /// Build timestamp (RFC 3339).
    pub generated_at: DateTime<Utc>,
    /// Emitted files in build order.
    #[serde(default)]
    pub files: Vec<FileMapping>,
}

impl BuildMetadata {
    /// Path of the metadata file inside `output_dir`.
    #[must_use]
    pub fn path_in(output_dir: &Path) -> PathBuf {
        output_dir.join(METADATA_FILE_NAME)
    }

    /// Serialize as indented JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| {
            Error::from(ValidationError::MalformedFile {
                path: METADATA_FILE_NAME.to_string(),
                message: e.to_string(),
            })
        })?;
        json.push('\n');
        Ok(json)
    }

    /// Write the metadata into `output_dir`, returning the file path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write fails.
    pub fn write(&self, fs: &dyn FileSystemOps, output_dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(output_dir);
        let json = self.to_json()?;
        fs.write(&path, &json)
            .map_err(|e| Error::io("write", &path, e))?;
        Ok(path)
    }

    /// Read the metadata from `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::File`] if no metadata exists (no build has
    /// run), an I/O error if it cannot be read, or a validation error if it
    /// is not valid JSON.
    pub fn read(fs: &dyn FileSystemOps, output_dir: &Path) -> Result<Self> {
        let path = Self::path_in(output_dir);
        if !fs.is_file(&path) {
            return Err(NotFoundError::File(path).into());
        }
        let json = fs
            .read_to_string(&path)
            .map_err(|e| Error::io("read", &path, e))?;
        serde_json::from_str(&json).map_err(|e| {
            Error::from(ValidationError::MalformedFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::operations::MockFileSystemOps;
    use chrono::TimeZone;

    fn sample() -> BuildMetadata {
        BuildMetadata {
            shell: "fish".to_string(),
            os: "Linux".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            files: vec![FileMapping {
                source: ".config/fish/conf.d/x.fish".to_string(),
                target: "conf.d".to_string(),
                dest_path: ".config/fish/conf.d/x.fish".to_string(),
            }],
        }
    }

    #[test]
    fn json_layout() {
        insta::assert_snapshot!(sample().to_json().unwrap(), @r#"
        {
          "shell": "fish",
          "os": "Linux",
          "generated_at": "2024-05-01T12:00:00Z",
          "files": [
            {
              "source": ".config/fish/conf.d/x.fish",
              "target": "conf.d",
              "dest_path": ".config/fish/conf.d/x.fish"
            }
          ]
        }
        "#);
    }

    #[test]
    fn write_then_read() {
        let fs = MockFileSystemOps::new();
        let path = sample().write(&fs, Path::new("/out")).unwrap();
        assert_eq!(path, PathBuf::from("/out/.rcforge-build.json"));
        assert_eq!(BuildMetadata::read(&fs, Path::new("/out")).unwrap(), sample());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let fs = MockFileSystemOps::new().with_file(
            "/out/.rcforge-build.json",
            r#"{"generated_at":"2024-05-01T12:00:00Z","version":3,"files":[]}"#,
        );
        let meta = BuildMetadata::read(&fs, Path::new("/out")).unwrap();
        assert!(meta.files.is_empty());
        assert!(meta.shell.is_empty());
    }

    #[test]
    fn missing_metadata_is_not_found() {
        let fs = MockFileSystemOps::new();
        let err = BuildMetadata::read(&fs, Path::new("/out")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
