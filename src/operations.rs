//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the build pipeline can be
//! unit-tested without touching the real filesystem.  Production code uses
//! [`SystemFileSystemOps`]; tests use `MockFileSystemOps`.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction over the filesystem capabilities the engine consumes.
///
/// Every fallible method returns a plain [`io::Result`]; callers attach the
/// action and path when converting into [`crate::error::Error::Io`].
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Read the whole file at `path` as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or not UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Returns the immediate child paths inside `path`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Write `content` to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a parent cannot be created or the write fails.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Copy the file at `from` to `to`, creating parent directories of `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the copy fails.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create `path` and all of its ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove the directory at `path` and everything below it.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Stage to a sibling temp file so readers never observe a partial write.
        let file_name = path.file_name().map_or_else(
            || "rcforge_tmp".to_string(),
            |n| format!(".{}.rcforge_tmp", n.to_string_lossy()),
        );
        let tmp = path.with_file_name(file_name);
        std::fs::write(&tmp, content)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(from, to).map(|_| ())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }
}

/// In-memory [`FileSystemOps`] for unit tests.
///
/// Pre-configure files with [`with_file`](Self::with_file); everything the
/// code under test writes is kept in memory and can be inspected with
/// [`file`](Self::file) and [`written_paths`](Self::written_paths).
///
/// # Example
///
/// ```ignore
/// let fs = MockFileSystemOps::new()
///     .with_file("/cfg/modules.yaml", "modules: []")
///     .with_unreadable("/cfg/broken.zsh");
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    state: std::sync::Mutex<MockState>,
    unreadable: Vec<PathBuf>,
    fail_writes: bool,
}

#[cfg(test)]
#[derive(Debug, Default)]
struct MockState {
    files: std::collections::BTreeMap<PathBuf, String>,
    dirs: std::collections::BTreeSet<PathBuf>,
    writes: Vec<PathBuf>,
}

#[cfg(test)]
impl MockFileSystemOps {
    /// Create an empty mock with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file with the given content (parents become directories).
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        {
            let mut state = self.lock();
            add_parents(&mut state.dirs, &path);
            state.files.insert(path, content.to_string());
        }
        self
    }

    /// Register a file that exists but fails every read.
    #[must_use]
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        {
            let mut state = self.lock();
            add_parents(&mut state.dirs, &path);
            state.files.insert(path.clone(), String::new());
        }
        self.unreadable.push(path);
        self
    }

    /// Make every write fail with `PermissionDenied`.
    #[must_use]
    pub const fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Content of the file at `path`, if present.
    #[must_use]
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    /// Paths written through [`FileSystemOps::write`] or `copy`, in order.
    #[must_use]
    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
fn add_parents(dirs: &mut std::collections::BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

#[cfg(test)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.unreadable.iter().any(|p| p == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.lock();
        if !state.dirs.contains(path) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        let mut children: Vec<PathBuf> = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        children.sort();
        children.dedup();
        Ok(children)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        let mut state = self.lock();
        add_parents(&mut state.dirs, path);
        state.files.insert(path.to_path_buf(), content.to_string());
        state.writes.push(path.to_path_buf());
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let content = self.read_to_string(from)?;
        self.write(to, &content)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        add_parents(&mut state.dirs, path);
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn system_write_creates_parents_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/.zshrc");
        SystemFileSystemOps.write(&target, "echo hi\n").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "echo hi\n");
        let names: Vec<_> = std::fs::read_dir(dir.path().join("a/b"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1, "temp file should be renamed away");
    }

    #[test]
    fn system_read_dir_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b"), "").unwrap();
        std::fs::write(dir.path().join("a"), "").unwrap();
        let entries = SystemFileSystemOps.read_dir(dir.path()).unwrap();
        assert_eq!(entries, vec![dir.path().join("a"), dir.path().join("b")]);
    }

    #[test]
    fn mock_tracks_writes_and_directories() {
        let fs = MockFileSystemOps::new();
        fs.write(Path::new("/out/.config/fish/config.fish"), "x")
            .unwrap();
        assert!(fs.exists(Path::new("/out/.config/fish")));
        assert!(fs.is_file(Path::new("/out/.config/fish/config.fish")));
        assert_eq!(
            fs.written_paths(),
            vec![PathBuf::from("/out/.config/fish/config.fish")]
        );
    }

    #[test]
    fn mock_unreadable_file_exists_but_fails_reads() {
        let fs = MockFileSystemOps::new().with_unreadable("/cfg/bad.zsh");
        assert!(fs.exists(Path::new("/cfg/bad.zsh")));
        let err = fs.read_to_string(Path::new("/cfg/bad.zsh")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn mock_read_dir_lists_children() {
        let fs = MockFileSystemOps::new()
            .with_file("/s/one/snapshot.json", "{}")
            .with_file("/s/two/snapshot.json", "{}");
        let entries = fs.read_dir(Path::new("/s")).unwrap();
        assert_eq!(
            entries,
            vec![PathBuf::from("/s/one"), PathBuf::from("/s/two")]
        );
    }
}
