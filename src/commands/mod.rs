//! Top-level subcommand orchestration.
//!
//! Each command resolves its directories through [`CommandSetup`], calls
//! into the library, and converts typed errors into [`anyhow::Error`] with
//! context for the user.
pub mod backup;
pub mod build;
pub mod completions;
pub mod deploy;
pub mod diff;
pub mod migrate;
pub mod new_module;
pub mod order;
pub mod restore;
pub mod snapshots;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::build::{BuildOptions, BuildReport};
use crate::cli::{GlobalOpts, SelectOpts};
use crate::config::manifest;
use crate::logging::{Log, Logger};
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Environment variable naming the config directory.
pub const CONFIG_DIR_ENV: &str = "RCFORGE_CONFIG_DIR";

/// Directories every command works with.
#[derive(Debug, Clone)]
pub struct CommandSetup {
    /// Directory holding the manifest and module sources.
    pub config_dir: PathBuf,
    /// Home directory builds and deploys target.
    pub home: PathBuf,
    /// `XDG_CONFIG_HOME`, if set.
    pub config_home: Option<PathBuf>,
}

impl CommandSetup {
    /// Resolve the home and config directories.
    ///
    /// With `require_manifest` the config directory must contain a manifest
    /// unless it was given explicitly; without it the default location is
    /// used when nothing else matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory or the config directory
    /// cannot be determined.
    pub fn init(global: &GlobalOpts, require_manifest: bool, log: &dyn Log) -> Result<Self> {
        let home = resolve_home(global.home.as_deref())?;
        let config_home = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
        let cwd = std::env::current_dir().context("reading current directory")?;
        let config_dir = resolve_config_dir(
            &ConfigDirSources {
                flag: global.config_dir.clone(),
                env: std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from),
                cwd,
                default: default_config_dir(&home, config_home.as_deref()),
            },
            &SystemFileSystemOps,
            require_manifest,
        )?;
        log.debug(&format!("config dir: {}", config_dir.display()));
        log.debug(&format!("home: {}", home.display()));
        Ok(Self {
            config_dir,
            home,
            config_home,
        })
    }

    /// Build options for this setup and the given selection.
    #[must_use]
    pub fn build_options(&self, select: &SelectOpts, dry_run: bool) -> BuildOptions {
        BuildOptions {
            config_dir: self.config_dir.clone(),
            manifest: select.manifest.clone(),
            os: select.os.clone(),
            dry_run,
            shell: select.shell.clone(),
            home: self.home.clone(),
            config_home: self.config_home.clone(),
            ..BuildOptions::default()
        }
    }

    /// Run a build that writes nothing and return what it would produce.
    ///
    /// # Errors
    ///
    /// Returns an error if the build fails.
    pub fn plan(&self, select: &SelectOpts, log: &dyn Log) -> Result<BuildReport> {
        let options = self.build_options(select, true);
        crate::build::build(&options, &QuietFileSystem, log).context("planning build")
    }
}

/// Candidate locations for the config directory, in precedence order.
#[derive(Debug, Clone, Default)]
pub struct ConfigDirSources {
    /// `--config-dir`.
    pub flag: Option<PathBuf>,
    /// `RCFORGE_CONFIG_DIR`.
    pub env: Option<PathBuf>,
    /// Current working directory.
    pub cwd: PathBuf,
    /// `$XDG_CONFIG_HOME/rcforge` or `~/.config/rcforge`.
    pub default: PathBuf,
}

/// Pick the config directory: flag, then environment, then the current
/// directory if it holds a manifest, then the default location if it holds
/// one. Without `require_manifest` the default location is returned even
/// when empty.
///
/// # Errors
///
/// Returns an error if a manifest is required and none of the candidates
/// has one.
pub fn resolve_config_dir(
    sources: &ConfigDirSources,
    fs: &dyn FileSystemOps,
    require_manifest: bool,
) -> Result<PathBuf> {
    if let Some(dir) = sources.flag.as_ref().or(sources.env.as_ref()) {
        return Ok(dir.clone());
    }
    for dir in [&sources.cwd, &sources.default] {
        if manifest::find(fs, dir).is_some() {
            return Ok(dir.clone());
        }
    }
    if require_manifest {
        anyhow::bail!(
            "no manifest found in {} or {}. Use --config-dir or set {CONFIG_DIR_ENV}",
            sources.cwd.display(),
            sources.default.display()
        );
    }
    Ok(sources.default.clone())
}

/// `$XDG_CONFIG_HOME/rcforge` when it is absolute, else `<home>/.config/rcforge`.
#[must_use]
pub fn default_config_dir(home: &Path, config_home: Option<&Path>) -> PathBuf {
    config_home
        .filter(|p| p.is_absolute())
        .map_or_else(|| home.join(".config"), Path::to_path_buf)
        .join("rcforge")
}

/// Resolve the home directory from the flag or the environment.
///
/// # Errors
///
/// Returns an error if no home directory is configured.
pub fn resolve_home(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(home) = flag {
        return Ok(home.to_path_buf());
    }
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .with_context(|| format!("cannot determine home directory. Use --home or set {var}"))
}

/// Print the summary and fail if any output was recorded as failed.
///
/// # Errors
///
/// Returns an error if one or more outputs failed.
pub fn finish(log: &Logger) -> Result<()> {
    log.print_summary();
    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} output(s) failed");
    }
    Ok(())
}

/// Read-only view of the real filesystem: reads pass through, writes are
/// refused. Used for planning builds.
#[derive(Debug, Default)]
struct QuietFileSystem;

impl FileSystemOps for QuietFileSystem {
    fn exists(&self, path: &Path) -> bool {
        SystemFileSystemOps.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        SystemFileSystemOps.is_file(path)
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        SystemFileSystemOps.read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        SystemFileSystemOps.read_dir(path)
    }

    fn write(&self, path: &Path, _: &str) -> std::io::Result<()> {
        Err(read_only(path))
    }

    fn copy(&self, _: &Path, to: &Path) -> std::io::Result<()> {
        Err(read_only(to))
    }

    fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        Err(read_only(path))
    }

    fn remove_dir_all(&self, path: &Path) -> std::io::Result<()> {
        Err(read_only(path))
    }
}

fn read_only(path: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        format!("refusing to modify {} while planning", path.display()),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::MockFileSystemOps;

    fn sources() -> ConfigDirSources {
        ConfigDirSources {
            flag: None,
            env: None,
            cwd: PathBuf::from("/work"),
            default: PathBuf::from("/home/u/.config/rcforge"),
        }
    }

    #[test]
    fn flag_beats_environment() {
        let s = ConfigDirSources {
            flag: Some(PathBuf::from("/flag")),
            env: Some(PathBuf::from("/env")),
            ..sources()
        };
        let fs = MockFileSystemOps::new();
        assert_eq!(resolve_config_dir(&s, &fs, true).unwrap(), PathBuf::from("/flag"));
    }

    #[test]
    fn environment_beats_cwd() {
        let s = ConfigDirSources {
            env: Some(PathBuf::from("/env")),
            ..sources()
        };
        let fs = MockFileSystemOps::new().with_file("/work/modules.yaml", "");
        assert_eq!(resolve_config_dir(&s, &fs, true).unwrap(), PathBuf::from("/env"));
    }

    #[test]
    fn cwd_with_manifest_beats_default() {
        let fs = MockFileSystemOps::new()
            .with_file("/work/modules.toml", "")
            .with_file("/home/u/.config/rcforge/modules.yaml", "");
        assert_eq!(
            resolve_config_dir(&sources(), &fs, true).unwrap(),
            PathBuf::from("/work")
        );
    }

    #[test]
    fn default_with_manifest_is_used() {
        let fs = MockFileSystemOps::new().with_file("/home/u/.config/rcforge/modules.yaml", "");
        assert_eq!(
            resolve_config_dir(&sources(), &fs, true).unwrap(),
            PathBuf::from("/home/u/.config/rcforge")
        );
    }

    #[test]
    fn no_manifest_anywhere() {
        let fs = MockFileSystemOps::new();
        assert!(resolve_config_dir(&sources(), &fs, true).is_err());
        assert_eq!(
            resolve_config_dir(&sources(), &fs, false).unwrap(),
            PathBuf::from("/home/u/.config/rcforge")
        );
    }

    #[test]
    fn default_config_dir_honours_absolute_xdg() {
        let home = Path::new("/home/u");
        assert_eq!(
            default_config_dir(home, Some(Path::new("/xdg"))),
            PathBuf::from("/xdg/rcforge")
        );
        assert_eq!(
            default_config_dir(home, Some(Path::new("rel"))),
            PathBuf::from("/home/u/.config/rcforge")
        );
        assert_eq!(
            default_config_dir(home, None),
            PathBuf::from("/home/u/.config/rcforge")
        );
    }

    #[test]
    fn home_flag_wins() {
        assert_eq!(
            resolve_home(Some(Path::new("/h"))).unwrap(),
            PathBuf::from("/h")
        );
    }

    #[test]
    fn planning_filesystem_refuses_writes() {
        let err = QuietFileSystem
            .write(Path::new("/tmp/x"), "y")
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);
    }
}
