//! Log file location, ANSI stripping and timestamps.
use std::fs;
use std::path::PathBuf;

/// Remove ANSI CSI escape sequences (colours, cursor movement) from `s`.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            // Parameters run until a final byte in '@'..='~'.
            chars.by_ref().find(|inner| ('@'..='~').contains(inner));
        }
    }
    out
}

/// `$XDG_CACHE_HOME/rcforge`, falling back to `~/.cache/rcforge`. Created
/// on demand; `None` if that fails.
fn cache_dir() -> Option<PathBuf> {
    let cache_home = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .map(|home| PathBuf::from(home).join(".cache"))
        })?;
    let dir = cache_home.join("rcforge");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Log file for `command`.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    Some(cache_dir()?.join(format!("{command}.log")))
}

/// Current UTC time rendered with a `chrono` format string.
pub(super) fn now_utc(format: &str) -> String {
    chrono::Utc::now().format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_ansi_removes_colours() {
        assert_eq!(strip_ansi("\x1b[31merror:\x1b[0m boom"), "error: boom");
        assert_eq!(strip_ansi("plain"), "plain");
        assert_eq!(
            strip_ansi("\x1b[1;34m==>\x1b[0m \x1b[1mBuilding\x1b[0m"),
            "==> Building"
        );
    }

    #[test]
    fn strip_ansi_removes_cursor_sequences() {
        assert_eq!(strip_ansi("\x1b[2Jzshrc"), "zshrc");
        assert_eq!(strip_ansi("\x1b[Kbashrc"), "bashrc");
    }

    #[test]
    fn now_utc_uses_format() {
        let s = now_utc("%H:%M:%S");
        assert_eq!(s.len(), 8);
        assert_eq!(s.matches(':').count(), 2);
    }
}
