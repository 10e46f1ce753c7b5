//! The build pipeline.
//!
//! ```text
//! parse manifest → resolve dependencies → group by target
//!   → assemble each target → write outputs → write metadata
//! ```
//!
//! Every stage runs sequentially. The first fatal error aborts the build
//! and is returned wrapped in the stage it escaped from; files written for
//! earlier targets stay on disk. Missing or unreadable module sources are
//! not fatal: they are replaced inline by a placeholder comment.

pub mod assemble;
pub mod metadata;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use self::assemble::{HeaderContext, SourceContent, merged_file, module_file, read_source};
use self::metadata::{BuildMetadata, FileMapping};
use crate::config::validation::{ValidationWarning, validate_all};
use crate::config::{Manifest, Module, manifest};
use crate::error::{Error, NotFoundError, Result, ValidationError};
use crate::logging::{Log, OutputStatus};
use crate::operations::FileSystemOps;
use crate::platform::Os;
use crate::resolver::{self, Exclusion, ExclusionReason};
use crate::targets::{ShellType, TargetResolver, to_slash};

/// Output directory used when neither the options nor the manifest set one.
pub const DEFAULT_OUTPUT_DIR: &str = "./build";

/// Configuration surface of a single build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Directory holding the manifest and module sources.
    pub config_dir: PathBuf,
    /// Manifest path; relative paths are taken from `config_dir`. `None`
    /// probes the standard manifest names.
    pub manifest: Option<PathBuf>,
    /// Target OS; `None` uses the OS this binary was built for.
    pub os: Option<String>,
    /// Assemble everything but write nothing.
    pub dry_run: bool,
    /// Output directory override (`~` is expanded).
    pub output_dir: Option<String>,
    /// Shell type override.
    pub shell: Option<String>,
    /// Only build these targets; empty builds all.
    pub targets: Vec<String>,
    /// Home directory used for `~` expansion and the XDG layout.
    pub home: PathBuf,
    /// `XDG_CONFIG_HOME`, if set.
    pub config_home: Option<PathBuf>,
    /// Fixed build timestamp; `None` uses the current time.
    pub generated_at: Option<DateTime<Utc>>,
}

/// A file produced (or previewed) by a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltFile {
    /// Absolute path the file is written to.
    pub path: PathBuf,
    /// Path relative to the output directory.
    pub source: String,
    /// Logical target.
    pub target: String,
    /// Destination path relative to the home directory.
    pub dest_path: String,
    /// Modules assembled into the file, in output order.
    pub modules: Vec<String>,
    /// Modules replaced by a placeholder.
    pub degraded: Vec<String>,
    /// Assembled content.
    pub content: String,
}

/// Summary of a completed build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Effective shell type.
    pub shell: ShellType,
    /// Target OS.
    pub os: String,
    /// Effective output directory.
    pub output_dir: PathBuf,
    /// Timestamp written into headers and metadata.
    pub generated_at: DateTime<Utc>,
    /// Emitted files, in write order.
    pub outputs: Vec<BuiltFile>,
    /// Modules excluded for the target OS.
    pub excluded: Vec<Exclusion>,
    /// Non-fatal manifest lint warnings.
    pub warnings: Vec<ValidationWarning>,
    /// Metadata path; `None` in dry-run mode.
    pub metadata_path: Option<PathBuf>,
}

impl BuildReport {
    /// Find the first output for `target`.
    #[must_use]
    pub fn output_for(&self, target: &str) -> Option<&BuiltFile> {
        self.outputs.iter().find(|o| o.target == target)
    }
}

/// Locate the manifest for `options`.
///
/// # Errors
///
/// Returns [`NotFoundError::Manifest`] if no manifest file exists.
pub fn manifest_path(fs: &dyn FileSystemOps, options: &BuildOptions) -> Result<PathBuf> {
    match &options.manifest {
        Some(path) if path.is_absolute() => Ok(path.clone()),
        Some(path) => Ok(options.config_dir.join(path)),
        None => manifest::find(fs, &options.config_dir).ok_or_else(|| {
            NotFoundError::Manifest(options.config_dir.join(manifest::DEFAULT_MANIFEST_NAME)).into()
        }),
    }
}

/// Expand `~` against `home` and resolve relative paths against `base`.
#[must_use]
pub fn expand_dir(raw: &str, home: &Path, base: &Path) -> PathBuf {
    let home_str = home.to_string_lossy().into_owned();
    let expanded = shellexpand::tilde_with_context(raw, || Some(home_str));
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Run a build.
///
/// # Errors
///
/// Returns the first fatal error, wrapped with the stage it escaped from:
/// manifest parse or validation failures, unknown dependencies, cycles,
/// unsupported shells, illegal targets, and write failures.
pub fn build(
    options: &BuildOptions,
    fs: &dyn FileSystemOps,
    log: &dyn Log,
) -> Result<BuildReport> {
    log.stage("Parsing manifest");
    let manifest_path = manifest_path(fs, options).map_err(|e| e.in_stage("parse manifest"))?;
    log.debug(&format!("manifest: {}", manifest_path.display()));
    let manifest = manifest::load(fs, &manifest_path).map_err(|e| e.in_stage("parse manifest"))?;
    manifest
        .validate()
        .map_err(|e| Error::from(e).in_stage("validate manifest"))?;

    let warnings = validate_all(&manifest, &options.config_dir, fs);
    for warning in &warnings {
        log.warn(&warning.to_string());
    }

    let shell_name = effective_shell(options, &manifest);
    let os = options
        .os
        .clone()
        .unwrap_or_else(|| Os::detect().to_string());

    log.stage("Resolving dependencies");
    let graph = resolver::build_graph(&manifest)
        .map_err(|e| e.in_stage("build dependency graph"))?;
    let resolution =
        resolver::resolve(&graph, &os).map_err(|e| e.in_stage("resolve dependencies"))?;
    for exclusion in &resolution.excluded {
        match &exclusion.reason {
            ExclusionReason::OsMismatch { .. } => log.debug(&format!(
                "skipping module '{}': {}",
                exclusion.module, exclusion.reason
            )),
            ExclusionReason::DependsOnExcluded(_) => log.warn(&format!(
                "skipping module '{}': {}",
                exclusion.module, exclusion.reason
            )),
        }
    }
    log.info(&format!(
        "{} modules resolved for {os} ({} excluded)",
        resolution.ordered.len(),
        resolution.excluded.len()
    ));

    let raw_output = options
        .output_dir
        .as_deref()
        .or(manifest.output_dir.as_deref())
        .unwrap_or(DEFAULT_OUTPUT_DIR);
    let output_dir = expand_dir(raw_output, &options.home, &options.config_dir);

    let targets = TargetResolver::with_config_home(
        &shell_name,
        output_dir.clone(),
        &options.home,
        options.config_home.as_deref(),
    )
    .map_err(|e| Error::from(e).in_stage("resolve targets"))?;
    targets
        .validate_targets(&resolution.ordered)
        .map_err(|e| Error::from(e).in_stage("validate targets"))?;
    targets
        .validate_filter(&options.targets)
        .map_err(|e| Error::from(e).in_stage("validate targets"))?;

    let groups = group_by_target(&resolution.ordered, &targets, &options.targets);

    let generated_at = options.generated_at.unwrap_or_else(Utc::now);
    let timestamp = generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let shell = targets.shell();
    let ctx = HeaderContext {
        shell: shell.as_str(),
        os: &os,
        generated_at: &timestamp,
    };

    log.stage("Assembling outputs");
    let mut outputs = Vec::new();
    for (target, modules) in &groups {
        let files = assemble_target(fs, &options.config_dir, &targets, ctx, target, modules)
            .map_err(|e| Error::from(e).in_stage("assemble outputs"))?;
        for file in files {
            write_output(fs, log, options.dry_run, &file)
                .map_err(|e| e.in_stage("write outputs"))?;
            outputs.push(file);
        }
    }

    let metadata_path = if options.dry_run {
        log.dry_run(&format!(
            "would write build metadata to {}",
            BuildMetadata::path_in(&output_dir).display()
        ));
        None
    } else {
        let metadata = BuildMetadata {
            shell: shell.to_string(),
            os: os.clone(),
            generated_at,
            files: outputs
                .iter()
                .map(|o| FileMapping {
                    source: o.source.clone(),
                    target: o.target.clone(),
                    dest_path: o.dest_path.clone(),
                })
                .collect(),
        };
        let path = metadata
            .write(fs, &output_dir)
            .map_err(|e| e.in_stage("write metadata"))?;
        log.debug(&format!("wrote build metadata {}", path.display()));
        Some(path)
    };

    Ok(BuildReport {
        shell,
        os,
        output_dir,
        generated_at,
        outputs,
        excluded: resolution.excluded,
        warnings,
        metadata_path,
    })
}

fn effective_shell(options: &BuildOptions, manifest: &Manifest) -> String {
    ShellType::select_name(options.shell.as_deref(), manifest.shell.as_deref()).to_string()
}

/// Group modules by effective target in lexicographic target order, keeping
/// only `filter` targets when given, and stably sort each group by priority.
fn group_by_target<'a>(
    ordered: &'a [Module],
    targets: &TargetResolver,
    filter: &[String],
) -> BTreeMap<String, Vec<&'a Module>> {
    let mut groups: BTreeMap<String, Vec<&Module>> = BTreeMap::new();
    for module in ordered {
        let target = targets.effective_target(module);
        if filter.is_empty() || filter.iter().any(|f| f == target) {
            groups.entry(target.to_string()).or_default().push(module);
        }
    }
    for modules in groups.values_mut() {
        modules.sort_by_key(|m| m.effective_priority());
    }
    groups
}

fn assemble_target(
    fs: &dyn FileSystemOps,
    config_dir: &Path,
    targets: &TargetResolver,
    ctx: HeaderContext<'_>,
    target: &str,
    modules: &[&Module],
) -> std::result::Result<Vec<BuiltFile>, ValidationError> {
    let sources: Vec<(&Module, SourceContent)> = modules
        .iter()
        .map(|m| (*m, read_source(fs, config_dir, m)))
        .collect();

    if targets.is_directory_target(target) {
        let mut claimed: HashMap<String, &str> = HashMap::new();
        return sources
            .iter()
            .map(|(module, content)| {
                let relative = targets.module_relative_path(target, &module.name)?;
                let dest_path = to_slash(&relative);
                if let Some(first) = claimed.insert(dest_path.clone(), &module.name) {
                    return Err(ValidationError::DuplicateModuleFile {
                        target: target.to_string(),
                        first: first.to_string(),
                        second: module.name.clone(),
                        path: dest_path,
                    });
                }
                Ok(BuiltFile {
                    path: targets.base().join(&relative),
                    source: dest_path.clone(),
                    target: target.to_string(),
                    dest_path,
                    modules: vec![module.name.clone()],
                    degraded: content
                        .is_degraded()
                        .then(|| module.name.clone())
                        .into_iter()
                        .collect(),
                    content: module_file(ctx, target, module, content),
                })
            })
            .collect();
    }

    let relative = targets.relative_path(target)?;
    let dest_path = to_slash(&relative);
    Ok(vec![BuiltFile {
        path: targets.base().join(&relative),
        source: dest_path.clone(),
        target: target.to_string(),
        dest_path,
        modules: modules.iter().map(|m| m.name.clone()).collect(),
        degraded: degraded_names(&sources),
        content: merged_file(ctx, target, &sources),
    }])
}

fn degraded_names(sources: &[(&Module, SourceContent)]) -> Vec<String> {
    sources
        .iter()
        .filter(|(_, content)| content.is_degraded())
        .map(|(module, _)| module.name.clone())
        .collect()
}

fn write_output(
    fs: &dyn FileSystemOps,
    log: &dyn Log,
    dry_run: bool,
    file: &BuiltFile,
) -> Result<()> {
    let summary = format!("{} module(s)", file.modules.len());
    for name in &file.degraded {
        log.warn(&format!(
            "module '{name}' source unavailable; placeholder written to {}",
            file.dest_path
        ));
    }

    if dry_run {
        log.dry_run(&format!("would write {}", file.path.display()));
        log.record_output(&file.dest_path, OutputStatus::DryRun, Some(&summary));
        return Ok(());
    }

    fs.write(&file.path, &file.content)
        .map_err(|e| Error::io("write", &file.path, e))?;
    log.debug(&format!("wrote {}", file.path.display()));
    let status = if file.degraded.is_empty() {
        OutputStatus::Written
    } else {
        OutputStatus::Degraded
    };
    log.record_output(&file.dest_path, status, Some(&summary));
    Ok(())
}
