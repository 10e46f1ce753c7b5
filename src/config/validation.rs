//! Non-fatal manifest lint checks.
//!
//! Fatal structural problems live in [`Manifest::validate`](super::Manifest::validate);
//! the validators here only produce warnings that are logged before a build.
use std::path::Path;

use super::manifest::Manifest;
use super::module::Module;
use crate::operations::FileSystemOps;
use crate::platform::is_known_os;

/// A validation warning detected while inspecting the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The module that triggered the warning.
    pub module: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a new warning.
    #[must_use]
    pub fn new(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "module '{}': {}", self.module, self.message)
    }
}

/// A lint check over a slice of modules.
pub trait ConfigValidator {
    /// Inspect the modules and return any warnings found.
    fn validate(&self, config_dir: &Path, fs: &dyn FileSystemOps) -> Vec<ValidationWarning>;

    /// Short name of the check, used in debug output.
    fn name(&self) -> &'static str;
}

/// Warns about source files that are missing or given as absolute paths.
#[derive(Debug)]
pub struct SourceFileValidator<'a> {
    modules: &'a [Module],
}

impl<'a> SourceFileValidator<'a> {
    /// Create a validator over `modules`.
    #[must_use]
    pub const fn new(modules: &'a [Module]) -> Self {
        Self { modules }
    }
}

impl ConfigValidator for SourceFileValidator<'_> {
    fn validate(&self, config_dir: &Path, fs: &dyn FileSystemOps) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for module in self.modules {
            if Path::new(&module.file).is_absolute() || module.file.starts_with('/') {
                warnings.push(ValidationWarning::new(
                    &module.name,
                    "source path should be relative to the config directory",
                ));
            }

            let source = config_dir.join(&module.file);
            if !fs.exists(&source) {
                warnings.push(ValidationWarning::new(
                    &module.name,
                    format!("source file does not exist: {}", source.display()),
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "source-files"
    }
}

/// Warns about OS filter entries that name no known operating system.
#[derive(Debug)]
pub struct OsFilterValidator<'a> {
    modules: &'a [Module],
}

impl<'a> OsFilterValidator<'a> {
    /// Create a validator over `modules`.
    #[must_use]
    pub const fn new(modules: &'a [Module]) -> Self {
        Self { modules }
    }
}

impl ConfigValidator for OsFilterValidator<'_> {
    fn validate(&self, _config_dir: &Path, _fs: &dyn FileSystemOps) -> Vec<ValidationWarning> {
        self.modules
            .iter()
            .flat_map(|module| {
                module
                    .os
                    .iter()
                    .filter(|os| !is_known_os(os))
                    .map(|os| {
                        ValidationWarning::new(
                            &module.name,
                            format!("unknown OS '{os}' in filter (expected Linux, Mac or Windows)"),
                        )
                    })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "os-filters"
    }
}

/// Warns about modules that list themselves, or the same module twice, in
/// `requires`.
#[derive(Debug)]
pub struct RequiresValidator<'a> {
    modules: &'a [Module],
}

impl<'a> RequiresValidator<'a> {
    /// Create a validator over `modules`.
    #[must_use]
    pub const fn new(modules: &'a [Module]) -> Self {
        Self { modules }
    }
}

impl ConfigValidator for RequiresValidator<'_> {
    fn validate(&self, _config_dir: &Path, _fs: &dyn FileSystemOps) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for module in self.modules {
            if module.requires.iter().any(|r| r == &module.name) {
                warnings.push(ValidationWarning::new(
                    &module.name,
                    "module requires itself; this is reported as a circular dependency",
                ));
            }
            let mut seen = std::collections::HashSet::new();
            for req in &module.requires {
                if !seen.insert(req.as_str()) {
                    warnings.push(ValidationWarning::new(
                        &module.name,
                        format!("'{req}' is listed more than once in requires"),
                    ));
                }
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "requires"
    }
}

/// Run every validator over the manifest and collect all warnings.
#[must_use]
pub fn validate_all(
    manifest: &Manifest,
    config_dir: &Path,
    fs: &dyn FileSystemOps,
) -> Vec<ValidationWarning> {
    let validators: [&dyn ConfigValidator; 3] = [
        &SourceFileValidator::new(&manifest.modules),
        &OsFilterValidator::new(&manifest.modules),
        &RequiresValidator::new(&manifest.modules),
    ];
    validators
        .iter()
        .flat_map(|v| v.validate(config_dir, fs))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::operations::MockFileSystemOps;

    #[test]
    fn source_validator_detects_missing_file() {
        let fs = MockFileSystemOps::new();
        let modules = vec![Module::new("core", "modules/core.zsh")];
        let warnings = SourceFileValidator::new(&modules).validate(Path::new("/cfg"), &fs);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("does not exist"));
    }

    #[test]
    fn source_validator_detects_absolute_path() {
        let fs = MockFileSystemOps::new().with_file("/etc/zshrc", "");
        let modules = vec![Module::new("core", "/etc/zshrc")];
        let warnings = SourceFileValidator::new(&modules).validate(Path::new("/cfg"), &fs);
        assert!(
            warnings
                .iter()
                .any(|w| w.message.contains("should be relative"))
        );
    }

    #[test]
    fn os_validator_flags_unknown_names() {
        let fs = MockFileSystemOps::new();
        let modules = vec![Module::new("a", "a.zsh").with_os(["Mac", "Plan9"])];
        let warnings = OsFilterValidator::new(&modules).validate(Path::new("/cfg"), &fs);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("Plan9"));
    }

    #[test]
    fn requires_validator_flags_self_and_repeats() {
        let fs = MockFileSystemOps::new();
        let modules = vec![Module::new("a", "a.zsh").with_requires(["a", "b", "b"])];
        let warnings = RequiresValidator::new(&modules).validate(Path::new("/cfg"), &fs);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn validate_all_clean_manifest_has_no_warnings() {
        let fs = MockFileSystemOps::new().with_file("/cfg/core.zsh", "");
        let manifest = Manifest {
            modules: vec![Module::new("core", "core.zsh").with_os(["linux"])],
            ..Manifest::default()
        };
        assert!(validate_all(&manifest, Path::new("/cfg"), &fs).is_empty());
    }

    #[test]
    fn warning_display_names_module() {
        let w = ValidationWarning::new("core", "oops");
        assert_eq!(w.to_string(), "module 'core': oops");
    }
}
