//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI entry point for rcforge.
#[derive(Parser, Debug)]
#[command(
    name = "rcforge",
    about = "Assemble shell startup files from dependency-ordered modules",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Directory holding modules.yaml and the module sources
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Home directory to build and deploy for
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Preview changes without writing anything
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble module sources into shell startup files
    Build(BuildOpts),
    /// Print the resolved module order
    Order(OrderOpts),
    /// Copy the last build into the home directory
    Deploy(DeployOpts),
    /// Split an existing RC file into modules
    Migrate(MigrateOpts),
    /// Compare a built target with the file it would replace
    Diff(DiffOpts),
    /// Snapshot the files a deploy would replace
    Backup(BackupOpts),
    /// Restore a snapshot into the home directory
    Restore(RestoreOpts),
    /// List or prune snapshots
    Snapshots(SnapshotsOpts),
    /// Create a new module from a template
    New(NewOpts),
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file of this command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Order(_) => "order",
            Self::Deploy(_) => "deploy",
            Self::Migrate(_) => "migrate",
            Self::Diff(_) => "diff",
            Self::Backup(_) => "backup",
            Self::Restore(_) => "restore",
            Self::Snapshots(_) => "snapshots",
            Self::New(_) => "new",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

/// Manifest and platform selection shared by commands that resolve modules.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectOpts {
    /// Manifest file (default: modules.yaml in the config directory)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Target operating system (linux, mac, windows)
    #[arg(long)]
    pub os: Option<String>,

    /// Shell type override (zsh, bash, fish)
    #[arg(long)]
    pub shell: Option<String>,
}

/// Options for the `build` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildOpts {
    /// Manifest, OS and shell selection.
    #[command(flatten)]
    pub select: SelectOpts,

    /// Output directory (default: the manifest's output_dir, then ./build)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Only build these targets
    #[arg(short, long = "target", value_delimiter = ',')]
    pub targets: Vec<String>,
}

/// Options for the `order` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct OrderOpts {
    /// Manifest, OS and shell selection.
    #[command(flatten)]
    pub select: SelectOpts,
}

/// Options for the `deploy` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct DeployOpts {
    /// Manifest used to find the output directory
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Build output directory to deploy from
    #[arg(short, long)]
    pub output: Option<String>,

    /// Do not snapshot files before replacing them
    #[arg(long)]
    pub no_backup: bool,
}

/// Options for the `migrate` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct MigrateOpts {
    /// RC file to split (default: ~/.zshrc)
    pub rc_file: Option<PathBuf>,

    /// Shell type (default: guessed from the file name)
    #[arg(long)]
    pub shell: Option<String>,

    /// Overwrite an existing manifest
    #[arg(long)]
    pub force: bool,
}

/// Options for the `diff` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct DiffOpts {
    /// Manifest, OS and shell selection.
    #[command(flatten)]
    pub select: SelectOpts,

    /// Target to compare (default: the shell's primary target)
    #[arg(short, long)]
    pub target: Option<String>,

    /// File to compare against (default: the deployed file in the home directory)
    #[arg(long)]
    pub original: Option<PathBuf>,

    /// Ignore rcforge's generated header blocks
    #[arg(long)]
    pub ignore_headers: bool,

    /// Lines of context around each change
    #[arg(short = 'U', long, default_value_t = 3)]
    pub context: usize,

    /// Print every line instead of hunks
    #[arg(long, conflicts_with = "context")]
    pub full: bool,
}

/// Options for the `backup` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct BackupOpts {
    /// Manifest, OS and shell selection.
    #[command(flatten)]
    pub select: SelectOpts,

    /// Label stored with the snapshot
    #[arg(short, long)]
    pub label: Option<String>,

    /// Commit the snapshot to a git repository in the snapshot directory
    #[arg(long)]
    pub commit: bool,
}

/// Options for the `restore` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct RestoreOpts {
    /// Snapshot id (default: the latest snapshot)
    pub id: Option<String>,
}

/// Options for the `snapshots` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SnapshotsOpts {
    /// Delete all but the newest N snapshots (at least one is kept)
    #[arg(long, value_name = "N")]
    pub prune: Option<usize>,
}

/// Options for the `new` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct NewOpts {
    /// Module name
    pub name: String,

    /// Short description
    #[arg(long)]
    pub description: Option<String>,

    /// Output target (default: the shell's primary target)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Modules this one depends on
    #[arg(long, value_delimiter = ',')]
    pub requires: Vec<String>,

    /// Operating systems the module applies to
    #[arg(long, value_delimiter = ',')]
    pub os: Vec<String>,

    /// Sort priority within the target (1-100, lower first)
    #[arg(long)]
    pub priority: Option<u32>,

    /// Shell type (default: the manifest's shell)
    #[arg(long)]
    pub shell: Option<String>,

    /// Manifest file (default: modules.yaml in the config directory)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

/// Options for the `completions` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
