//! rcforge command-line entry point.

use anyhow::Result;
use clap::Parser;

use rcforge_cli::cli::{Cli, Command};
use rcforge_cli::commands;
use rcforge_cli::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let name = args.command.name();
    init_subscriber(args.verbose, name);
    let log = Logger::new(name);

    match &args.command {
        Command::Build(opts) => commands::build::run(&args.global, opts, &log),
        Command::Order(opts) => commands::order::run(&args.global, opts, &log),
        Command::Deploy(opts) => commands::deploy::run(&args.global, opts, &log),
        Command::Migrate(opts) => commands::migrate::run(&args.global, opts, &log),
        Command::Diff(opts) => commands::diff::run(&args.global, opts, &log),
        Command::Backup(opts) => commands::backup::run(&args.global, opts, &log),
        Command::Restore(opts) => commands::restore::run(&args.global, opts, &log),
        Command::Snapshots(opts) => commands::snapshots::run(&args.global, opts, &log),
        Command::New(opts) => commands::new_module::run(&args.global, opts, &log),
        Command::Completions(opts) => {
            commands::completions::run(opts);
            Ok(())
        }
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
