//! Shell types and logical output targets.
//!
//! A [`TargetResolver`] maps a logical target name such as `zshrc` or
//! `conf.d` to a path below a base directory. Each shell type has a fixed
//! table of legal targets; anything else is a [`ValidationError`].
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::config::Module;
use crate::config::module::DEFAULT_TARGET;
use crate::error::ValidationError;

/// Shell a build produces startup files for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShellType {
    /// Z shell.
    #[default]
    Zsh,
    /// GNU Bash.
    Bash,
    /// fish.
    Fish,
}

impl ShellType {
    /// Lowercase shell name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zsh => "zsh",
            Self::Bash => "bash",
            Self::Fish => "fish",
        }
    }

    /// File extension (with dot) used for module sources and fan-out files.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zsh => ".zsh",
            Self::Bash => ".sh",
            Self::Fish => ".fish",
        }
    }

    /// Main startup file for the shell; `migrate` and `new` assign it
    /// explicitly.
    #[must_use]
    pub const fn primary_target(self) -> &'static str {
        match self {
            Self::Zsh => "zshrc",
            Self::Bash => "bashrc",
            Self::Fish => "config",
        }
    }

    const fn table(self) -> &'static [TargetSpec] {
        match self {
            Self::Zsh => ZSH_TARGETS,
            Self::Bash => BASH_TARGETS,
            Self::Fish => FISH_TARGETS,
        }
    }

    /// Shell name by precedence: explicit override, then the manifest's
    /// `shell`, then zsh. Blank values are skipped.
    #[must_use]
    pub fn select_name<'a>(
        override_name: Option<&'a str>,
        manifest_name: Option<&'a str>,
    ) -> &'a str {
        override_name
            .filter(|s| !s.trim().is_empty())
            .or_else(|| manifest_name.filter(|s| !s.trim().is_empty()))
            .unwrap_or(Self::Zsh.as_str())
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShellType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zsh" => Ok(Self::Zsh),
            "bash" => Ok(Self::Bash),
            "fish" => Ok(Self::Fish),
            _ => Err(ValidationError::UnsupportedShell(s.to_string())),
        }
    }
}

/// Where a logical target lives, relative to the base directory.
#[derive(Debug, Clone, Copy)]
struct TargetSpec {
    name: &'static str,
    /// Path segments below the base; `config_relative` paths start at the
    /// XDG config directory instead.
    path: &'static str,
    config_relative: bool,
    directory: bool,
}

const fn file(name: &'static str, path: &'static str) -> TargetSpec {
    TargetSpec {
        name,
        path,
        config_relative: false,
        directory: false,
    }
}

const ZSH_TARGETS: &[TargetSpec] = &[
    file("zshrc", ".zshrc"),
    file("zshenv", ".zshenv"),
    file("zprofile", ".zprofile"),
    file("zlogin", ".zlogin"),
    file("zlogout", ".zlogout"),
];

const BASH_TARGETS: &[TargetSpec] = &[
    file("bashrc", ".bashrc"),
    file("bash_profile", ".bash_profile"),
    file("profile", ".profile"),
    file("bash_logout", ".bash_logout"),
];

const FISH_TARGETS: &[TargetSpec] = &[
    TargetSpec {
        name: "config",
        path: "fish/config.fish",
        config_relative: true,
        directory: false,
    },
    TargetSpec {
        name: "conf.d",
        path: "fish/conf.d",
        config_relative: true,
        directory: true,
    },
    TargetSpec {
        name: "functions",
        path: "fish/functions",
        config_relative: true,
        directory: true,
    },
];

/// Default config directory relative to the base.
const DEFAULT_CONFIG_DIR: &str = ".config";

/// Maps logical targets to paths for one shell type and base directory.
#[derive(Debug, Clone)]
pub struct TargetResolver {
    shell: ShellType,
    base: PathBuf,
    config_dir: PathBuf,
}

impl TargetResolver {
    /// Create a resolver for `shell` writing below `base`.
    ///
    /// `XDG_CONFIG_HOME` is honoured when it points inside `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedShell`] for an unknown shell.
    pub fn new(shell: &str, base: impl Into<PathBuf>) -> Result<Self, ValidationError> {
        let base = base.into();
        let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
        Self::with_config_home(shell, base.clone(), &base, xdg.as_deref())
    }

    /// Create a resolver with an explicit XDG config home.
    ///
    /// `config_home` is accepted only if it is absolute and lies inside
    /// `anchor` (normally the home directory); its path relative to `anchor`
    /// then replaces `.config` for config-relative targets. Any other value
    /// silently falls back to `.config`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedShell`] for an unknown shell.
    pub fn with_config_home(
        shell: &str,
        base: impl Into<PathBuf>,
        anchor: &Path,
        config_home: Option<&Path>,
    ) -> Result<Self, ValidationError> {
        let shell = shell.parse::<ShellType>()?;
        let config_dir = config_home
            .and_then(|home| relative_inside(home, anchor))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
        Ok(Self {
            shell,
            base: base.into(),
            config_dir,
        })
    }

    /// The shell type.
    #[must_use]
    pub const fn shell(&self) -> ShellType {
        self.shell
    }

    /// The base directory outputs are resolved against.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Names of all legal targets for the shell, in table order.
    #[must_use]
    pub fn target_names(&self) -> Vec<&'static str> {
        self.shell.table().iter().map(|t| t.name).collect()
    }

    /// Target for modules that leave `target` empty. The same for every
    /// shell, so bash and fish modules must name their target.
    #[must_use]
    pub const fn default_target(&self) -> &'static str {
        DEFAULT_TARGET
    }

    /// The module's target, or [`DEFAULT_TARGET`].
    #[must_use]
    pub fn effective_target<'a>(&self, module: &'a Module) -> &'a str {
        module.target_or(self.default_target())
    }

    /// Returns `true` if `target` is legal for the shell.
    #[must_use]
    pub fn is_valid_target(&self, target: &str) -> bool {
        self.spec(target).is_some()
    }

    /// Full path of `target` below the base directory.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTarget`] if the target is not legal
    /// for the shell.
    pub fn resolve(&self, target: &str) -> Result<PathBuf, ValidationError> {
        Ok(self.base.join(self.relative_path(target)?))
    }

    /// Path of `target` relative to the base directory.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTarget`] if the target is not legal
    /// for the shell.
    pub fn relative_path(&self, target: &str) -> Result<PathBuf, ValidationError> {
        let spec = self.spec(target).ok_or_else(|| self.unknown(target))?;
        Ok(if spec.config_relative {
            self.config_dir.join(spec.path)
        } else {
            PathBuf::from(spec.path)
        })
    }

    /// Relative path of the fan-out file for `module_name` in a directory
    /// target.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTarget`] if the target is not legal
    /// for the shell.
    pub fn module_relative_path(
        &self,
        target: &str,
        module_name: &str,
    ) -> Result<PathBuf, ValidationError> {
        Ok(self
            .relative_path(target)?
            .join(self.module_file_name(module_name)))
    }

    /// File name used for a module inside a directory target.
    #[must_use]
    pub fn module_file_name(&self, module_name: &str) -> String {
        format!("{}{}", sanitize_name(module_name), self.shell.extension())
    }

    /// Returns `true` if `target` collects one file per module.
    ///
    /// Unknown targets are not directory targets.
    #[must_use]
    pub fn is_directory_target(&self, target: &str) -> bool {
        self.spec(target).is_some_and(|t| t.directory)
    }

    /// Check that every module's effective target is legal for the shell.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidModuleTarget`] for the first module
    /// with an illegal target.
    pub fn validate_targets(&self, modules: &[Module]) -> Result<(), ValidationError> {
        for module in modules {
            let target = self.effective_target(module);
            if !self.is_valid_target(target) {
                return Err(ValidationError::InvalidModuleTarget {
                    module: module.name.clone(),
                    target: target.to_string(),
                    shell: self.shell.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check that every entry of a requested target filter is legal.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTargetFilter`] for the first illegal
    /// entry.
    pub fn validate_filter(&self, targets: &[String]) -> Result<(), ValidationError> {
        match targets.iter().find(|t| !self.is_valid_target(t)) {
            Some(bad) => Err(ValidationError::InvalidTargetFilter {
                target: bad.clone(),
                shell: self.shell.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn spec(&self, target: &str) -> Option<&'static TargetSpec> {
        self.shell.table().iter().find(|t| t.name == target)
    }

    fn unknown(&self, target: &str) -> ValidationError {
        ValidationError::UnknownTarget {
            target: target.to_string(),
            shell: self.shell.to_string(),
            available: self.target_names().join(", "),
        }
    }
}

/// Filesystem-safe token for a module name: lowercase, with spaces and
/// path-separator-like characters replaced by `_`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Render a relative path with `/` separators for metadata and messages.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Return `path` relative to `anchor` when it is absolute, lies strictly
/// inside `anchor`, and has no `..` components.
fn relative_inside(path: &Path, anchor: &Path) -> Option<PathBuf> {
    if !path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
        return None;
    }
    let relative = path.strip_prefix(anchor).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(relative.to_path_buf())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn resolver(shell: &str) -> TargetResolver {
        TargetResolver::with_config_home(shell, "/home/u", Path::new("/home/u"), None).unwrap()
    }

    // ---- shell types ----

    #[test]
    fn shell_selection_skips_blank_values() {
        assert_eq!(ShellType::select_name(Some("fish"), Some("bash")), "fish");
        assert_eq!(ShellType::select_name(Some("  "), Some("bash")), "bash");
        assert_eq!(ShellType::select_name(None, Some("")), "zsh");
        assert_eq!(ShellType::select_name(None, None), "zsh");
    }

    #[test]
    fn shell_type_parses_case_insensitively() {
        assert_eq!("ZSH".parse::<ShellType>().unwrap(), ShellType::Zsh);
        assert_eq!(" Fish ".parse::<ShellType>().unwrap(), ShellType::Fish);
        assert_eq!(
            "tcsh".parse::<ShellType>(),
            Err(ValidationError::UnsupportedShell("tcsh".to_string()))
        );
    }

    #[test]
    fn unsupported_shell_fails_construction() {
        assert!(TargetResolver::new("csh", "/home/u").is_err());
    }

    // ---- resolve ----

    #[test]
    fn resolve_zsh_targets() {
        let r = resolver("zsh");
        assert_eq!(r.resolve("zshrc").unwrap(), PathBuf::from("/home/u/.zshrc"));
        assert_eq!(
            r.relative_path("zprofile").unwrap(),
            PathBuf::from(".zprofile")
        );
    }

    #[test]
    fn resolve_bash_targets() {
        let r = resolver("bash");
        assert_eq!(
            r.resolve("bash_profile").unwrap(),
            PathBuf::from("/home/u/.bash_profile")
        );
    }

    #[test]
    fn resolve_fish_targets_under_config() {
        let r = resolver("fish");
        assert_eq!(
            r.resolve("config").unwrap(),
            PathBuf::from("/home/u/.config/fish/config.fish")
        );
        assert_eq!(
            to_slash(&r.relative_path("conf.d").unwrap()),
            ".config/fish/conf.d"
        );
    }

    #[test]
    fn unknown_target_is_validation_error() {
        let r = resolver("fish");
        let err = r.resolve("zshrc").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownTarget { .. }));
        assert!(err.to_string().contains("config, conf.d, functions"));
    }

    #[test]
    fn resolve_is_pure() {
        let a = resolver("zsh").resolve("zshenv").unwrap();
        let b = resolver("zsh").resolve("zshenv").unwrap();
        assert_eq!(a, b);
    }

    // ---- directory targets ----

    #[test]
    fn directory_targets() {
        let r = resolver("fish");
        assert!(r.is_directory_target("conf.d"));
        assert!(r.is_directory_target("functions"));
        assert!(!r.is_directory_target("config"));
        assert!(!resolver("zsh").is_directory_target("zshrc"));
        assert!(!r.is_directory_target("nope"));
    }

    #[test]
    fn module_relative_path_in_conf_d() {
        let r = resolver("fish");
        assert_eq!(
            to_slash(&r.module_relative_path("conf.d", "X").unwrap()),
            ".config/fish/conf.d/x.fish"
        );
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_name("My Path/Setup:Win\\x"), "my_path_setup_win_x");
    }

    // ---- validation ----

    #[test]
    fn validate_targets_names_offending_module() {
        let r = resolver("bash");
        let modules = vec![
            Module::new("core", "core.sh").with_target("bashrc"),
            Module::new("prompt", "prompt.sh").with_target("zshrc"),
        ];
        assert_eq!(
            r.validate_targets(&modules),
            Err(ValidationError::InvalidModuleTarget {
                module: "prompt".to_string(),
                target: "zshrc".to_string(),
                shell: "bash".to_string(),
            })
        );
    }

    #[test]
    fn empty_target_defaults_to_zshrc_for_every_shell() {
        let m = Module::new("core", "core.fish");
        assert_eq!(resolver("fish").effective_target(&m), "zshrc");
        assert_eq!(resolver("bash").effective_target(&m), "zshrc");
        assert_eq!(resolver("zsh").effective_target(&m), "zshrc");
        assert!(resolver("zsh").validate_targets(std::slice::from_ref(&m)).is_ok());
    }

    #[test]
    fn untargeted_module_is_invalid_outside_zsh() {
        let m = Module::new("core", "core.sh");
        for shell in ["bash", "fish"] {
            assert_eq!(
                resolver(shell).validate_targets(std::slice::from_ref(&m)),
                Err(ValidationError::InvalidModuleTarget {
                    module: "core".to_string(),
                    target: "zshrc".to_string(),
                    shell: shell.to_string(),
                })
            );
        }
    }

    #[test]
    fn validate_filter_rejects_unknown() {
        let r = resolver("zsh");
        assert!(r.validate_filter(&["zshrc".to_string()]).is_ok());
        assert!(matches!(
            r.validate_filter(&["conf.d".to_string()]),
            Err(ValidationError::InvalidTargetFilter { .. })
        ));
    }

    // ---- XDG config home ----

    #[test]
    fn xdg_inside_anchor_is_used() {
        let r = TargetResolver::with_config_home(
            "fish",
            "/out",
            Path::new("/home/u"),
            Some(Path::new("/home/u/.xdg")),
        )
        .unwrap();
        assert_eq!(
            r.resolve("config").unwrap(),
            PathBuf::from("/out/.xdg/fish/config.fish")
        );
    }

    #[test]
    fn xdg_outside_anchor_falls_back() {
        let r = TargetResolver::with_config_home(
            "fish",
            "/home/u",
            Path::new("/home/u"),
            Some(Path::new("/etc/xdg")),
        )
        .unwrap();
        assert_eq!(
            to_slash(&r.relative_path("config").unwrap()),
            ".config/fish/config.fish"
        );
    }

    #[test]
    fn relative_or_escaping_xdg_falls_back() {
        for xdg in ["cfg", "/home/u/../etc", "/home/u"] {
            let r = TargetResolver::with_config_home(
                "fish",
                "/home/u",
                Path::new("/home/u"),
                Some(Path::new(xdg)),
            )
            .unwrap();
            assert_eq!(
                to_slash(&r.relative_path("conf.d").unwrap()),
                ".config/fish/conf.d",
                "xdg {xdg} should be ignored"
            );
        }
    }
}
