//! Scaffolding for new modules.
use std::path::{Path, PathBuf};

use minijinja::{Environment, context};

use crate::config::manifest::{self, DEFAULT_MANIFEST_NAME, Manifest};
use crate::config::Module;
use crate::error::{Error, Result, ValidationError};
use crate::logging::{Log, OutputStatus};
use crate::migrate::{MODULES_DIR, slugify};
use crate::operations::FileSystemOps;
use crate::targets::{ShellType, TargetResolver};

const POSIX_TEMPLATE: &str = "\
# {{ name }}{% if description %}: {{ description }}{% endif %}
# Part of the {{ shell }} configuration managed by rcforge.

# export EXAMPLE_VAR=\"value\"
# alias example='echo example'
";

const FISH_TEMPLATE: &str = "\
# {{ name }}{% if description %}: {{ description }}{% endif %}
# Part of the {{ shell }} configuration managed by rcforge.

# set -gx EXAMPLE_VAR value
# abbr -a example 'echo example'
";

/// Inputs of `new`.
#[derive(Debug, Clone, Default)]
pub struct NewModuleOptions {
    /// Config directory holding the manifest.
    pub config_dir: PathBuf,
    /// Manifest path; `None` probes the standard names and creates
    /// `modules.yaml` if none exists.
    pub manifest: Option<PathBuf>,
    /// Module name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Output target; `None` writes the shell's primary target into the
    /// manifest.
    pub target: Option<String>,
    /// Modules this one depends on.
    pub requires: Vec<String>,
    /// OS filter.
    pub os: Vec<String>,
    /// Sort priority.
    pub priority: Option<u32>,
    /// Shell override; otherwise the manifest's shell, then zsh.
    pub shell: Option<String>,
    /// Report without writing.
    pub dry_run: bool,
}

/// What `new` produced.
#[derive(Debug, Clone)]
pub struct NewModuleReport {
    /// The manifest entry that was added.
    pub module: Module,
    /// Absolute path of the module source file.
    pub file_path: PathBuf,
    /// Manifest that was updated.
    pub manifest_path: PathBuf,
    /// Rendered boilerplate.
    pub content: String,
}

/// Render the boilerplate for a module of `shell`.
///
/// # Errors
///
/// Returns a validation error if the template fails to render.
pub fn render_module(shell: ShellType, name: &str, description: Option<&str>) -> Result<String> {
    let template = match shell {
        ShellType::Zsh | ShellType::Bash => POSIX_TEMPLATE,
        ShellType::Fish => FISH_TEMPLATE,
    };
    let env = Environment::new();
    env.render_str(
        template,
        context! {
            name => name,
            description => description.unwrap_or_default(),
            shell => shell.as_str(),
        },
    )
    .map(|mut rendered| {
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        rendered
    })
    .map_err(|e| {
        Error::from(ValidationError::MalformedFile {
            path: format!("{shell} module template"),
            message: e.to_string(),
        })
    })
}

/// Create a module source file from the shell's template and append the
/// module to the manifest.
///
/// An existing source file at the chosen path is kept as is.
///
/// # Errors
///
/// Returns [`ValidationError::ModuleExists`] if the name is taken, a
/// validation error for an illegal target or priority, or an I/O error if
/// a write fails.
pub fn new_module(
    options: &NewModuleOptions,
    fs: &dyn FileSystemOps,
    log: &dyn Log,
) -> Result<NewModuleReport> {
    let manifest_path = match &options.manifest {
        Some(path) => options.config_dir.join(path),
        None => manifest::find(fs, &options.config_dir)
            .unwrap_or_else(|| options.config_dir.join(DEFAULT_MANIFEST_NAME)),
    };
    let mut manifest = if fs.is_file(&manifest_path) {
        manifest::load(fs, &manifest_path)?
    } else {
        log.info(&format!("creating {}", manifest_path.display()));
        Manifest::default()
    };

    if manifest.get(&options.name).is_some() {
        return Err(ValidationError::ModuleExists(options.name.clone()).into());
    }

    let shell: ShellType = options
        .shell
        .as_deref()
        .or(manifest.shell.as_deref())
        .unwrap_or(ShellType::default().as_str())
        .parse()?;
    if manifest.shell.is_none() {
        manifest.shell = Some(shell.to_string());
    }

    let rel = format!("{MODULES_DIR}/{}{}", slugify(&options.name), shell.extension());
    let mut module = Module::new(options.name.clone(), rel.clone())
        .with_requires(options.requires.iter().cloned())
        .with_os(options.os.iter().cloned())
        .with_priority(options.priority.unwrap_or_default());
    if let Some(description) = &options.description {
        module = module.with_description(description.clone());
    }
    let target = options
        .target
        .clone()
        .unwrap_or_else(|| shell.primary_target().to_string());
    module = module.with_target(target);

    let targets = TargetResolver::with_config_home(shell.as_str(), Path::new(""), Path::new(""), None)?;
    targets.validate_targets(std::slice::from_ref(&module))?;
    manifest.modules.push(module.clone());
    manifest.validate()?;

    let content = render_module(shell, &options.name, options.description.as_deref())?;
    let file_path = options.config_dir.join(&rel);

    if options.dry_run {
        log.dry_run(&format!("would write {}", file_path.display()));
        log.dry_run(&format!(
            "would add module '{}' to {}",
            options.name,
            manifest_path.display()
        ));
        log.record_output(&rel, OutputStatus::DryRun, None);
    } else {
        if fs.exists(&file_path) {
            log.warn(&format!("keeping existing {}", file_path.display()));
            log.record_output(&rel, OutputStatus::Unchanged, None);
        } else {
            fs.write(&file_path, &content)
                .map_err(|e| Error::io("write", &file_path, e))?;
            log.record_output(&rel, OutputStatus::Written, None);
        }
        manifest::save(fs, &manifest_path, &manifest)?;
        log.info(&format!(
            "added module '{}' to {}",
            options.name,
            manifest_path.display()
        ));
    }

    Ok(NewModuleReport {
        module,
        file_path,
        manifest_path,
        content,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::logging::CapturedLog;
    use crate::operations::MockFileSystemOps;

    fn options(name: &str) -> NewModuleOptions {
        NewModuleOptions {
            config_dir: PathBuf::from("/cfg"),
            name: name.to_string(),
            ..NewModuleOptions::default()
        }
    }

    #[test]
    fn zsh_template() {
        let out = render_module(ShellType::Zsh, "Git Aliases", Some("git shortcuts")).unwrap();
        insta::assert_snapshot!(out, @r#"
        # Git Aliases: git shortcuts
        # Part of the zsh configuration managed by rcforge.

        # export EXAMPLE_VAR="value"
        # alias example='echo example'
        "#);
    }

    #[test]
    fn fish_template_without_description() {
        let out = render_module(ShellType::Fish, "path", None).unwrap();
        assert!(out.starts_with("# path\n"));
        assert!(out.contains("set -gx"));
    }

    #[test]
    fn creates_manifest_and_file() {
        let fs = MockFileSystemOps::new();
        let report = new_module(&options("Git Aliases"), &fs, &CapturedLog::default()).unwrap();

        assert_eq!(report.module.file, "modules/git_aliases.zsh");
        assert!(fs.file("/cfg/modules/git_aliases.zsh").unwrap().starts_with("# Git Aliases"));
        let manifest = manifest::load(&fs, Path::new("/cfg/modules.yaml")).unwrap();
        assert_eq!(manifest.shell.as_deref(), Some("zsh"));
        assert_eq!(manifest.modules[0].name, "Git Aliases");
    }

    #[test]
    fn appends_to_existing_manifest_using_its_shell() {
        let fs = MockFileSystemOps::new().with_file(
            "/cfg/modules.yaml",
            "shell: fish\nmodules:\n  - name: env\n    file: env.fish\n",
        );
        let opts = NewModuleOptions {
            requires: vec!["env".to_string()],
            target: Some("conf.d".to_string()),
            ..options("prompt")
        };
        let report = new_module(&opts, &fs, &CapturedLog::default()).unwrap();
        assert_eq!(report.module.file, "modules/prompt.fish");

        let manifest = manifest::load(&fs, Path::new("/cfg/modules.yaml")).unwrap();
        assert_eq!(manifest.modules.len(), 2);
        assert_eq!(manifest.modules[1].requires, vec!["env"]);
        assert_eq!(manifest.modules[1].target, "conf.d");
    }

    #[test]
    fn untargeted_bash_module_gets_bashrc() {
        let fs = MockFileSystemOps::new()
            .with_file("/cfg/modules.yaml", "shell: bash\nmodules: []\n");
        let report = new_module(&options("env"), &fs, &CapturedLog::default()).unwrap();
        assert_eq!(report.module.target, "bashrc");
        let manifest = manifest::load(&fs, Path::new("/cfg/modules.yaml")).unwrap();
        assert_eq!(manifest.modules[0].target, "bashrc");
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let fs = MockFileSystemOps::new()
            .with_file("/cfg/modules.yaml", "modules:\n  - name: env\n    file: env.zsh\n");
        let err = new_module(&options("env"), &fs, &CapturedLog::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("already exists"));
        assert!(fs.written_paths().is_empty());
    }

    #[test]
    fn illegal_target_is_rejected() {
        let fs = MockFileSystemOps::new();
        let opts = NewModuleOptions {
            target: Some("conf.d".to_string()),
            ..options("x")
        };
        let err = new_module(&opts, &fs, &CapturedLog::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn existing_source_file_is_kept() {
        let fs = MockFileSystemOps::new().with_file("/cfg/modules/env.zsh", "export A=1\n");
        new_module(&options("env"), &fs, &CapturedLog::default()).unwrap();
        assert_eq!(fs.file("/cfg/modules/env.zsh").as_deref(), Some("export A=1\n"));
        assert!(fs.is_file(Path::new("/cfg/modules.yaml")));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let fs = MockFileSystemOps::new();
        let opts = NewModuleOptions {
            dry_run: true,
            ..options("env")
        };
        new_module(&opts, &fs, &CapturedLog::default()).unwrap();
        assert!(fs.written_paths().is_empty());
    }
}
