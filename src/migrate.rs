//! Split a monolithic RC file into modules.
//!
//! Section boundaries are comment headers. Recognised forms:
//!
//! ```text
//! # --- Aliases ---          # === Aliases ===
//! ### Aliases ###            #### Aliases
//!
//! # ==========
//! # Aliases
//! # ==========
//! ```
//!
//! Anything before the first header becomes a `preamble` module.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::manifest::{self, DEFAULT_MANIFEST_NAME, Manifest};
use crate::config::Module;
use crate::error::{Error, NotFoundError, Result, ValidationError};
use crate::logging::{Log, OutputStatus};
use crate::operations::FileSystemOps;
use crate::targets::ShellType;

/// Name given to the lines before the first header.
pub const PREAMBLE: &str = "preamble";

/// Directory, relative to the config dir, that receives module files.
pub const MODULES_DIR: &str = "modules";

struct Patterns {
    fenced: Regex,
    hashed: Regex,
    hash_prefix: Regex,
    rule: Regex,
    title: Regex,
}

#[allow(clippy::expect_used)]
static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    fenced: Regex::new(r"^#\s*(?:-{3,}|={3,})\s*([^\s=-].*?)\s*(?:-{3,}|={3,})\s*$")
        .expect("fenced header pattern"),
    hashed: Regex::new(r"^#{3,}\s+(\S.*?)\s+#{3,}\s*$").expect("hashed header pattern"),
    hash_prefix: Regex::new(r"^#{4,}\s+([^\s#=*-].*?)\s*$").expect("hash prefix pattern"),
    rule: Regex::new(r"^#\s?[-=#*]{3,}\s*$").expect("rule pattern"),
    title: Regex::new(r"^#\s+([^\s#=*-].*?)\s*$").expect("title pattern"),
});

/// One section of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Header text as written.
    pub title: String,
    /// Unique module name derived from the title.
    pub slug: String,
    /// Section body without the header, blank edges trimmed.
    pub body: String,
}

/// Inputs of a migration.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// RC file to split.
    pub rc_file: PathBuf,
    /// Config directory that receives the manifest and module files.
    pub config_dir: PathBuf,
    /// Shell type; `None` guesses from the RC file name, then zsh.
    pub shell: Option<String>,
    /// Report without writing.
    pub dry_run: bool,
    /// Overwrite an existing manifest.
    pub force: bool,
}

/// Result of a migration.
#[derive(Debug, Clone)]
pub struct MigrateReport {
    /// Shell the modules were written for.
    pub shell: ShellType,
    /// Sections found, in file order.
    pub sections: Vec<Section>,
    /// The generated manifest.
    pub manifest: Manifest,
    /// Where the manifest was (or would be) written.
    pub manifest_path: PathBuf,
}

/// Lowercase `name`, turn every run of non-alphanumerics into one `_`, and
/// trim underscores from the ends.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Guess the shell type from an RC file name.
#[must_use]
pub fn shell_for_rc_file(path: &Path) -> Option<ShellType> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if name.contains("zsh") || name.starts_with(".z") {
        Some(ShellType::Zsh)
    } else if name.contains("bash") || name == ".profile" {
        Some(ShellType::Bash)
    } else if name.ends_with(".fish") {
        Some(ShellType::Fish)
    } else {
        None
    }
}

/// Split RC text into sections at recognised headers.
#[must_use]
pub fn split_sections(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.lines().collect();
    let mut raw: Vec<(String, Vec<&str>)> = vec![(PREAMBLE.to_string(), Vec::new())];

    let mut i = 0;
    while let Some(&line) = lines.get(i) {
        if let Some(title) = boxed_title(&lines, i) {
            raw.push((title, Vec::new()));
            i += 3;
            continue;
        }
        if let Some(title) = single_line_title(line) {
            raw.push((title, Vec::new()));
        } else if let Some((_, body)) = raw.last_mut() {
            body.push(line);
        }
        i += 1;
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, (title, body))| {
            let body = trim_blank_edges(&body);
            if idx == 0 && body.is_empty() {
                return None;
            }
            let base = slugify(&title);
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let slug = if *count == 1 {
                base
            } else {
                format!("{base}_{count}")
            };
            Some(Section { title, slug, body })
        })
        .collect()
}

fn single_line_title(line: &str) -> Option<String> {
    let p = &*PATTERNS;
    [&p.fenced, &p.hashed, &p.hash_prefix]
        .into_iter()
        .find_map(|re| re.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn boxed_title(lines: &[&str], i: usize) -> Option<String> {
    let p = &*PATTERNS;
    let (top, middle, bottom) = (lines.get(i)?, lines.get(i + 1)?, lines.get(i + 2)?);
    if !p.rule.is_match(top) || !p.rule.is_match(bottom) {
        return None;
    }
    p.title
        .captures(middle)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn trim_blank_edges(body: &[&str]) -> String {
    let start = body.iter().position(|l| !l.trim().is_empty());
    let end = body.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => body
            .iter()
            .take(end + 1)
            .skip(start)
            .copied()
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Split `options.rc_file` and write one module file per section plus a
/// manifest into `options.config_dir`.
///
/// # Errors
///
/// Returns [`NotFoundError::File`] if the RC file is missing,
/// [`ValidationError::ManifestExists`] if a manifest is present and `force`
/// is not set, or an I/O error if a write fails.
pub fn migrate(
    options: &MigrateOptions,
    fs: &dyn FileSystemOps,
    log: &dyn Log,
) -> Result<MigrateReport> {
    log.stage(&format!("Reading {}", options.rc_file.display()));
    if !fs.is_file(&options.rc_file) {
        return Err(NotFoundError::File(options.rc_file.clone()).into());
    }
    let text = fs
        .read_to_string(&options.rc_file)
        .map_err(|e| Error::io("read", &options.rc_file, e))?;

    let shell = match options.shell.as_deref() {
        Some(name) => name.parse::<ShellType>()?,
        None => shell_for_rc_file(&options.rc_file).unwrap_or_default(),
    };

    let manifest_path = options.config_dir.join(DEFAULT_MANIFEST_NAME);
    if let Some(existing) = manifest::find(fs, &options.config_dir)
        && !options.force
    {
        return Err(ValidationError::ManifestExists(existing.display().to_string()).into());
    }

    let sections = split_sections(&text);
    log.info(&format!(
        "found {} section(s) in {}",
        sections.len(),
        options.rc_file.display()
    ));

    let manifest = Manifest {
        shell: Some(shell.to_string()),
        output_dir: None,
        modules: sections
            .iter()
            .map(|s| {
                Module::new(s.slug.clone(), module_file(s, shell))
                    .with_description(s.title.clone())
                    .with_target(shell.primary_target())
            })
            .collect(),
    };

    log.stage("Writing modules");
    for section in &sections {
        let rel = module_file(section, shell);
        let path = options.config_dir.join(&rel);
        if options.dry_run {
            log.dry_run(&format!("would write {}", path.display()));
            log.record_output(&rel, OutputStatus::DryRun, None);
            continue;
        }
        fs.write(&path, &format!("{}\n", section.body))
            .map_err(|e| Error::io("write", &path, e))?;
        log.debug(&format!("wrote {}", path.display()));
        log.record_output(&rel, OutputStatus::Written, Some(&section.title));
    }

    if options.dry_run {
        log.dry_run(&format!("would write {}", manifest_path.display()));
    } else {
        manifest::save(fs, &manifest_path, &manifest)?;
        log.info(&format!("wrote {}", manifest_path.display()));
    }

    Ok(MigrateReport {
        shell,
        sections,
        manifest,
        manifest_path,
    })
}

fn module_file(section: &Section, shell: ShellType) -> String {
    format!("{MODULES_DIR}/{}{}", section.slug, shell.extension())
}
