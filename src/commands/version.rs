//! Command: print version information.

/// Version string, overridable at build time through `RCFORGE_VERSION`.
#[must_use]
pub fn version() -> &'static str {
    option_env!("RCFORGE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the rcforge version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("rcforge {}", version());
}
