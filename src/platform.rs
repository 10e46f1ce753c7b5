//! Target operating system detection and OS filter matching.
use std::fmt;
use std::str::FromStr;

/// Operating system a build is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Linux and other Unix-likes without a more specific entry.
    Linux,
    /// macOS.
    Mac,
    /// Windows.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "Linux"),
            Self::Mac => write!(f, "Mac"),
            Self::Windows => write!(f, "Windows"),
        }
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "mac" | "macos" | "darwin" | "osx" => Ok(Self::Mac),
            "windows" | "win" => Ok(Self::Windows),
            other => Err(format!("unknown OS '{other}'")),
        }
    }
}

impl Os {
    /// Detect the OS this binary was compiled for.
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::Mac
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            // Default to Linux for other Unix-like systems
            Self::Linux
        }
    }
}

/// Check whether a module OS filter entry names `target_os`.
///
/// Both sides are compared case-insensitively, and known aliases
/// (`darwin`, `macos`, ...) are folded onto their canonical name. Entries
/// that name no known OS only match an identical (case-insensitive) string.
#[must_use]
pub fn os_matches(filter_entry: &str, target_os: &str) -> bool {
    match (filter_entry.parse::<Os>(), target_os.parse::<Os>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => filter_entry.trim().eq_ignore_ascii_case(target_os.trim()),
    }
}

/// Returns `true` if `name` is a recognised OS name or alias.
#[must_use]
pub fn is_known_os(name: &str) -> bool {
    name.parse::<Os>().is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn detect_returns_valid() {
        let os = Os::detect();
        assert!(matches!(os, Os::Linux | Os::Mac | Os::Windows));
    }

    #[test]
    fn os_display() {
        assert_eq!(Os::Linux.to_string(), "Linux");
        assert_eq!(Os::Mac.to_string(), "Mac");
        assert_eq!(Os::Windows.to_string(), "Windows");
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("darwin".parse::<Os>().unwrap(), Os::Mac);
        assert_eq!("MacOS".parse::<Os>().unwrap(), Os::Mac);
        assert_eq!("LINUX".parse::<Os>().unwrap(), Os::Linux);
        assert_eq!("win".parse::<Os>().unwrap(), Os::Windows);
        assert!("plan9".parse::<Os>().is_err());
    }

    #[test]
    fn matches_case_insensitively() {
        assert!(os_matches("Mac", "mac"));
        assert!(os_matches("mac", "Darwin"));
        assert!(!os_matches("Mac", "Linux"));
    }

    #[test]
    fn unknown_names_match_only_themselves() {
        assert!(os_matches("FreeBSD", "freebsd"));
        assert!(!os_matches("FreeBSD", "Linux"));
    }
}
