//! Line diff between an existing RC file and a built one.
use std::fmt;

use crate::build::assemble::{BANNER_RULE, BANNER_TITLE};

/// One line of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp<'a> {
    /// Present on both sides.
    Equal(&'a str),
    /// Only in the original.
    Removed(&'a str),
    /// Only in the generated file.
    Added(&'a str),
}

impl DiffOp<'_> {
    const fn is_change(&self) -> bool {
        !matches!(self, Self::Equal(_))
    }
}

impl fmt::Display for DiffOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal(line) => write!(f, " {line}"),
            Self::Removed(line) => write!(f, "-{line}"),
            Self::Added(line) => write!(f, "+{line}"),
        }
    }
}

/// Line counts of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Lines only in the generated file.
    pub added: usize,
    /// Lines only in the original.
    pub removed: usize,
    /// Lines on both sides.
    pub unchanged: usize,
}

impl DiffStats {
    /// Count the operations of a diff.
    #[must_use]
    pub fn from_ops(ops: &[DiffOp<'_>]) -> Self {
        ops.iter().fold(Self::default(), |mut stats, op| {
            match op {
                DiffOp::Equal(_) => stats.unchanged += 1,
                DiffOp::Removed(_) => stats.removed += 1,
                DiffOp::Added(_) => stats.added += 1,
            }
            stats
        })
    }

    /// Returns `true` if both sides are the same.
    #[must_use]
    pub const fn is_identical(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} removed, {} unchanged",
            self.added, self.removed, self.unchanged
        )
    }
}

/// Diff two texts line by line using a longest common subsequence.
///
/// Removals are emitted before additions where both are possible.
#[must_use]
pub fn diff_lines<'a>(original: &'a str, generated: &'a str) -> Vec<DiffOp<'a>> {
    let a: Vec<&str> = original.lines().collect();
    let b: Vec<&str> = generated.lines().collect();
    let width = b.len() + 1;

    // lcs[i * width + j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![0_usize; (a.len() + 1) * width];
    let at = |table: &[usize], i: usize, j: usize| table.get(i * width + j).copied().unwrap_or(0);
    for (i, line_a) in a.iter().enumerate().rev() {
        for (j, line_b) in b.iter().enumerate().rev() {
            let value = if line_a == line_b {
                at(&lcs, i + 1, j + 1) + 1
            } else {
                at(&lcs, i + 1, j).max(at(&lcs, i, j + 1))
            };
            if let Some(cell) = lcs.get_mut(i * width + j) {
                *cell = value;
            }
        }
    }

    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);
    while let (Some(&line_a), Some(&line_b)) = (a.get(i), b.get(j)) {
        if line_a == line_b {
            ops.push(DiffOp::Equal(line_a));
            i += 1;
            j += 1;
        } else if at(&lcs, i + 1, j) >= at(&lcs, i, j + 1) {
            ops.push(DiffOp::Removed(line_a));
            i += 1;
        } else {
            ops.push(DiffOp::Added(line_b));
            j += 1;
        }
    }
    ops.extend(a.iter().skip(i).copied().map(DiffOp::Removed));
    ops.extend(b.iter().skip(j).copied().map(DiffOp::Added));
    ops
}

/// Render a diff with `-`/`+`/` ` line prefixes.
///
/// With `context: None` every line is printed. With `Some(n)` only changed
/// lines and up to `n` lines around them are printed, grouped into hunks
/// with `@@ -start,count +start,count @@` headers. Identical inputs render
/// as an empty string.
#[must_use]
pub fn render_unified(ops: &[DiffOp<'_>], context: Option<usize>) -> String {
    let mut out = String::new();
    let Some(context) = context else {
        for op in ops {
            out.push_str(&op.to_string());
            out.push('\n');
        }
        return out;
    };

    // Line positions (0-based) on each side before each op.
    let mut positions = Vec::with_capacity(ops.len() + 1);
    let (mut old, mut new) = (0_usize, 0_usize);
    for op in ops {
        positions.push((old, new));
        match op {
            DiffOp::Equal(_) => {
                old += 1;
                new += 1;
            }
            DiffOp::Removed(_) => old += 1,
            DiffOp::Added(_) => new += 1,
        }
    }
    positions.push((old, new));

    for (start, end) in hunks(ops, context) {
        let (old_start, new_start) = positions.get(start).copied().unwrap_or_default();
        let (old_end, new_end) = positions.get(end).copied().unwrap_or_default();
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            range(old_start, old_end - old_start),
            range(new_start, new_end - new_start)
        ));
        for op in ops.iter().take(end).skip(start) {
            out.push_str(&op.to_string());
            out.push('\n');
        }
    }
    out
}

/// Op index ranges `[start, end)` covering each group of nearby changes.
fn hunks(ops: &[DiffOp<'_>], context: usize) -> Vec<(usize, usize)> {
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for (idx, _) in ops.iter().enumerate().filter(|(_, op)| op.is_change()) {
        let start = idx.saturating_sub(context);
        let end = (idx + context + 1).min(ops.len());
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => hunks.push((start, end)),
        }
    }
    hunks
}

fn range(start: usize, count: usize) -> String {
    if count == 0 {
        format!("{start},0")
    } else {
        format!("{},{count}", start + 1)
    }
}

/// Remove rcforge's generated banner blocks so that only module content is
/// compared.
#[must_use]
pub fn strip_generated_header(text: &str) -> String {
    let mut out = Vec::new();
    let mut lines = text.lines().peekable();
    while let Some(line) = lines.next() {
        if line == BANNER_RULE && lines.peek() == Some(&BANNER_TITLE) {
            for inner in lines.by_ref().skip(1) {
                if inner == BANNER_RULE {
                    break;
                }
            }
            continue;
        }
        out.push(line);
    }
    let mut joined = out.join("\n");
    if !joined.is_empty() {
        joined.push('\n');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_are_all_equal() {
        let ops = diff_lines("a\nb\n", "a\nb\n");
        assert_eq!(ops, vec![DiffOp::Equal("a"), DiffOp::Equal("b")]);
        assert!(DiffStats::from_ops(&ops).is_identical());
        assert_eq!(render_unified(&ops, Some(3)), "");
    }

    #[test]
    fn replaced_line_is_removed_then_added() {
        let ops = diff_lines("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(
            ops,
            vec![
                DiffOp::Equal("a"),
                DiffOp::Removed("b"),
                DiffOp::Added("B"),
                DiffOp::Equal("c"),
            ]
        );
        let stats = DiffStats::from_ops(&ops);
        assert_eq!(stats.to_string(), "1 added, 1 removed, 2 unchanged");
    }

    #[test]
    fn empty_sides() {
        assert_eq!(diff_lines("", "x\n"), vec![DiffOp::Added("x")]);
        assert_eq!(diff_lines("x\n", ""), vec![DiffOp::Removed("x")]);
        assert!(diff_lines("", "").is_empty());
    }

    #[test]
    fn insertion_keeps_common_lines() {
        let ops = diff_lines("a\nc\n", "a\nb\nc\n");
        let stats = DiffStats::from_ops(&ops);
        assert_eq!(stats.unchanged, 2);
        assert_eq!(stats.added, 1);
        assert_eq!(stats.removed, 0);
    }

    #[test]
    fn full_render_prefixes_every_line() {
        let ops = diff_lines("a\nb\n", "a\nc\n");
        assert_eq!(render_unified(&ops, None), " a\n-b\n+c\n");
    }

    #[test]
    fn context_render_collapses_distant_lines() {
        let original = "1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        let generated = "1\n2\nthree\n4\n5\n6\n7\n8\nnine\n";
        let ops = diff_lines(original, generated);
        insta::assert_snapshot!(render_unified(&ops, Some(1)), @r"
        @@ -2,3 +2,3 @@
         2
        -3
        +three
         4
        @@ -8,2 +8,2 @@
         8
        -9
        +nine
        ");
    }

    #[test]
    fn nearby_changes_share_a_hunk() {
        let ops = diff_lines("a\nb\nc\nd\n", "A\nb\nC\nd\n");
        let rendered = render_unified(&ops, Some(1));
        assert_eq!(rendered.matches("@@").count(), 2, "{rendered}");
    }

    #[test]
    fn strip_header_removes_banner_only() {
        let text = format!(
            "{BANNER_RULE}\n{BANNER_TITLE}\n# Shell: zsh\n# Generated: now\n{BANNER_RULE}\n\n# --- core ---\nexport A=1\n"
        );
        assert_eq!(strip_generated_header(&text), "\n# --- core ---\nexport A=1\n");
    }

    #[test]
    fn strip_header_leaves_plain_rules() {
        let text = format!("{BANNER_RULE}\n# My section\n{BANNER_RULE}\nx\n");
        assert_eq!(strip_generated_header(&text), text);
    }
}
