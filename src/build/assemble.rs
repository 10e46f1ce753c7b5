//! Content assembly for merged and per-module output files.
use std::path::Path;

use crate::config::Module;
use crate::operations::FileSystemOps;

/// Rule line framing every generated header.
pub const BANNER_RULE: &str =
    "# =============================================================================";

/// First line inside the banner.
pub const BANNER_TITLE: &str = "# Generated by rcforge - do not edit by hand";

/// A module's source text, or the reason it is unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    /// The file was read.
    Text(String),
    /// The file does not exist.
    Missing,
    /// The file exists but could not be read.
    Unreadable(String),
}

impl SourceContent {
    /// Returns `true` if the source had to be replaced by a placeholder.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

/// Read a module's source file relative to `config_dir`.
///
/// Never fails: a missing or unreadable file becomes a placeholder variant.
pub fn read_source(fs: &dyn FileSystemOps, config_dir: &Path, module: &Module) -> SourceContent {
    let path = config_dir.join(&module.file);
    if !fs.exists(&path) {
        return SourceContent::Missing;
    }
    match fs.read_to_string(&path) {
        Ok(text) => SourceContent::Text(text),
        Err(e) => SourceContent::Unreadable(e.to_string()),
    }
}

/// Values shared by every header of one build.
#[derive(Debug, Clone, Copy)]
pub struct HeaderContext<'a> {
    /// Shell type name.
    pub shell: &'a str,
    /// Target OS name.
    pub os: &'a str,
    /// Build timestamp, already formatted.
    pub generated_at: &'a str,
}

/// Assemble one merged file holding every module of a target, in order.
#[must_use]
pub fn merged_file(
    ctx: HeaderContext<'_>,
    target: &str,
    modules: &[(&Module, SourceContent)],
) -> String {
    let mut out = banner(&[
        format!("Shell: {}", ctx.shell),
        format!("Target: {target}"),
        format!("OS: {}", ctx.os),
        format!("Modules: {}", modules.len()),
        format!("Generated: {}", ctx.generated_at),
    ]);

    for (module, content) in modules {
        out.push('\n');
        out.push_str(&format!("# --- {} ---\n", module.name));
        push_module_comments(&mut out, module);
        out.push_str(&body(module, content));
        out.push('\n');
    }

    finish(out)
}

/// Assemble the fan-out file for one module of a directory target.
#[must_use]
pub fn module_file(
    ctx: HeaderContext<'_>,
    target: &str,
    module: &Module,
    content: &SourceContent,
) -> String {
    let mut out = banner(&[
        format!("Shell: {}", ctx.shell),
        format!("Module: {}", module.name),
        format!("Target: {target}"),
        format!("OS: {}", ctx.os),
        format!("Generated: {}", ctx.generated_at),
    ]);
    push_module_comments(&mut out, module);
    out.push('\n');
    out.push_str(&body(module, content));
    finish(out)
}

fn banner(lines: &[String]) -> String {
    let mut out = String::new();
    out.push_str(BANNER_RULE);
    out.push('\n');
    out.push_str(BANNER_TITLE);
    out.push('\n');
    for line in lines {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(BANNER_RULE);
    out.push('\n');
    out
}

fn push_module_comments(out: &mut String, module: &Module) {
    if !module.description.trim().is_empty() {
        out.push_str(&format!("# Description: {}\n", module.description.trim()));
    }
    if module.priority != 0 {
        out.push_str(&format!("# Priority: {}\n", module.priority));
    }
}

fn body(module: &Module, content: &SourceContent) -> String {
    match content {
        SourceContent::Text(text) => text.trim_end_matches(['\n', '\r']).to_string(),
        SourceContent::Missing => format!("# FILE NOT FOUND: {}", module.file),
        SourceContent::Unreadable(reason) => format!("# READ ERROR: {}: {reason}", module.file),
    }
}

/// Guarantee exactly one trailing newline.
fn finish(mut out: String) -> String {
    let trimmed = out.trim_end_matches(['\n', '\r']).len();
    out.truncate(trimmed);
    out.push('\n');
    out
}
