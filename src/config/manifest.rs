//! The module manifest and its YAML/TOML file formats.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::module::{MAX_PRIORITY, Module};
use crate::error::{Error, NotFoundError, Result, ValidationError};
use crate::operations::FileSystemOps;

/// Manifest file name used when creating a new manifest.
pub const DEFAULT_MANIFEST_NAME: &str = "modules.yaml";

/// Manifest file names probed inside a config directory, in order.
pub const MANIFEST_FILE_NAMES: &[&str] = &["modules.yaml", "modules.yml", "modules.toml"];

/// The declared collection of modules for a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Shell type the manifest targets (`zsh`, `bash` or `fish`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Output directory for built files; `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Modules in declaration order.
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Manifest {
    /// Look up a module by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Check field-level invariants: non-empty name and file, priority in
    /// range, and unique names.
    ///
    /// Dependency references are checked when the graph is built.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, in declaration order.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(ValidationError::EmptyField {
                    module: module.name.clone(),
                    field: "name",
                });
            }
            if module.file.trim().is_empty() {
                return Err(ValidationError::EmptyField {
                    module: module.name.clone(),
                    field: "file",
                });
            }
            if module.priority > MAX_PRIORITY {
                return Err(ValidationError::PriorityOutOfRange {
                    module: module.name.clone(),
                    priority: module.priority,
                });
            }
            if !seen.insert(module.name.as_str()) {
                return Err(ValidationError::DuplicateModule(module.name.clone()));
            }
        }
        Ok(())
    }
}

/// On-disk manifest format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl Format {
    /// Determine the format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ManifestSyntax`] for any other extension.
    pub fn from_path(path: &Path) -> std::result::Result<Self, ValidationError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(ValidationError::ManifestSyntax {
                path: path.display().to_string(),
                message: "unsupported manifest extension (expected .yaml, .yml or .toml)"
                    .to_string(),
            }),
        }
    }
}

/// Return the first manifest file that exists in `config_dir`.
#[must_use]
pub fn find(fs: &dyn FileSystemOps, config_dir: &Path) -> Option<PathBuf> {
    MANIFEST_FILE_NAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|path| fs.is_file(path))
}

/// Parse manifest text in the given format.
///
/// # Errors
///
/// Returns [`ValidationError::ManifestSyntax`] if the text does not parse.
pub fn parse(content: &str, format: Format, path: &Path) -> Result<Manifest> {
    let parsed = match format {
        // An empty YAML document deserializes to unit, not a mapping.
        Format::Yaml if content.trim().is_empty() => Ok(Manifest::default()),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| {
        Error::from(ValidationError::ManifestSyntax {
            path: path.display().to_string(),
            message,
        })
    })
}

/// Read and parse the manifest at `path`.
///
/// # Errors
///
/// Returns [`NotFoundError::Manifest`] if the file does not exist, an I/O
/// error if it cannot be read, or a validation error if it does not parse.
pub fn load(fs: &dyn FileSystemOps, path: &Path) -> Result<Manifest> {
    if !fs.is_file(path) {
        return Err(NotFoundError::Manifest(path.to_path_buf()).into());
    }
    let format = Format::from_path(path)?;
    let content = fs
        .read_to_string(path)
        .map_err(|e| Error::io("read", path, e))?;
    parse(&content, format, path)
}

/// Serialize a manifest in the given format.
///
/// # Errors
///
/// Returns a validation error if serialization fails.
pub fn to_string(manifest: &Manifest, format: Format) -> Result<String> {
    let rendered = match format {
        Format::Yaml => serde_yaml::to_string(manifest).map_err(|e| e.to_string()),
        Format::Toml => toml::to_string_pretty(manifest).map_err(|e| e.to_string()),
    };
    rendered.map_err(|message| {
        Error::from(ValidationError::ManifestSyntax {
            path: String::from("<serialize>"),
            message,
        })
    })
}

/// Write `manifest` to `path` in the format implied by its extension.
///
/// # Errors
///
/// Returns an error if the extension is unsupported or the write fails.
pub fn save(fs: &dyn FileSystemOps, path: &Path, manifest: &Manifest) -> Result<()> {
    let format = Format::from_path(path)?;
    let content = to_string(manifest, format)?;
    fs.write(path, &content)
        .map_err(|e| Error::io("write", path, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::operations::MockFileSystemOps;

    const YAML: &str = "\
shell: bash
output_dir: ~/build
modules:
  - name: core
    file: core.sh
    description: Core settings
  - name: aliases
    file: aliases.sh
    requires: [core]
    os: [Linux, Mac]
    target: bashrc
    priority: 20
";

    #[test]
    fn parse_yaml_manifest() {
        let m = parse(YAML, Format::Yaml, Path::new("modules.yaml")).unwrap();
        assert_eq!(m.shell.as_deref(), Some("bash"));
        assert_eq!(m.output_dir.as_deref(), Some("~/build"));
        assert_eq!(m.modules.len(), 2);
        assert_eq!(m.modules[1].requires, vec!["core"]);
        assert_eq!(m.modules[1].priority, 20);
        assert_eq!(m.modules[0].description, "Core settings");
    }

    #[test]
    fn parse_toml_manifest() {
        let toml = r#"
shell = "fish"

[[modules]]
name = "path"
file = "path.fish"
target = "conf.d"
"#;
        let m = parse(toml, Format::Toml, Path::new("modules.toml")).unwrap();
        assert_eq!(m.shell.as_deref(), Some("fish"));
        assert_eq!(m.modules[0].target, "conf.d");
    }

    #[test]
    fn parse_empty_yaml_is_empty_manifest() {
        let m = parse("", Format::Yaml, Path::new("modules.yaml")).unwrap();
        assert!(m.modules.is_empty());
    }

    #[test]
    fn parse_error_is_validation_kind() {
        let err = parse("modules: [", Format::Yaml, Path::new("m.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("m.yaml"));
    }

    #[test]
    fn unknown_extension_rejected() {
        assert!(Format::from_path(Path::new("modules.json")).is_err());
        assert_eq!(
            Format::from_path(Path::new("MODULES.YML")).unwrap(),
            Format::Yaml
        );
    }

    #[test]
    fn load_missing_manifest_is_not_found() {
        let fs = MockFileSystemOps::new();
        let err = load(&fs, Path::new("/cfg/modules.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn find_prefers_yaml() {
        let fs = MockFileSystemOps::new()
            .with_file("/cfg/modules.toml", "")
            .with_file("/cfg/modules.yaml", "");
        assert_eq!(
            find(&fs, Path::new("/cfg")),
            Some(PathBuf::from("/cfg/modules.yaml"))
        );
    }

    #[test]
    fn save_then_load_preserves_modules() {
        let fs = MockFileSystemOps::new();
        let manifest = parse(YAML, Format::Yaml, Path::new("m.yaml")).unwrap();
        save(&fs, Path::new("/cfg/modules.yaml"), &manifest).unwrap();
        let loaded = load(&fs, Path::new("/cfg/modules.yaml")).unwrap();
        assert_eq!(loaded, manifest);
    }

    // ---- validate ----

    #[test]
    fn validate_rejects_duplicate_names() {
        let m = Manifest {
            modules: vec![Module::new("a", "a.zsh"), Module::new("a", "b.zsh")],
            ..Manifest::default()
        };
        assert_eq!(
            m.validate(),
            Err(ValidationError::DuplicateModule("a".to_string()))
        );
    }

    #[test]
    fn validate_rejects_empty_file() {
        let m = Manifest {
            modules: vec![Module::new("a", " ")],
            ..Manifest::default()
        };
        assert!(matches!(
            m.validate(),
            Err(ValidationError::EmptyField { field: "file", .. })
        ));
    }

    #[test]
    fn validate_rejects_priority_above_hundred() {
        let m = Manifest {
            modules: vec![Module::new("a", "a.zsh").with_priority(101)],
            ..Manifest::default()
        };
        assert!(matches!(
            m.validate(),
            Err(ValidationError::PriorityOutOfRange { priority: 101, .. })
        ));
    }

    #[test]
    fn validate_accepts_well_formed_manifest() {
        let m = parse(YAML, Format::Yaml, Path::new("m.yaml")).unwrap();
        assert_eq!(m.validate(), Ok(()));
    }
}
