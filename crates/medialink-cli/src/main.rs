// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

mod devices;
mod error;
mod pair;

use clap::{Parser, Subcommand};
use error::result_to_exit_code;
use std::process::ExitCode;

/// medialink CLI - V4L2 device discovery and media-controller correlation
#[derive(Parser)]
#[command(name = "medialink")]
#[command(version)]
#[command(about = "medialink CLI - V4L2 device discovery and media-controller correlation")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (use RUST_LOG=debug for more)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List video device nodes with their capability records
    Devices(devices::Args),

    /// Probe for a video device and correlate its media controller
    Pair(pair::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose, cli.quiet);

    // Execute the subcommand and convert result to exit code
    let result = match cli.command {
        Commands::Devices(args) => devices::execute(args, cli.json),
        Commands::Pair(args) => pair::execute(args, cli.json),
    };

    result_to_exit_code(result)
}

/// Initialize env_logger based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    // Determine log level from flags or RUST_LOG environment variable
    let env = env_logger::Env::default();

    let env = if quiet {
        // Quiet mode: only show errors
        env.default_filter_or("error")
    } else if verbose {
        // Verbose mode: show debug messages
        env.default_filter_or("debug")
    } else {
        // Default: show info and above
        env.default_filter_or("info")
    };

    env_logger::Builder::from_env(env)
        .format_timestamp(None) // Disable timestamps for cleaner CLI output
        .format_target(false) // Disable target (module path) for cleaner output
        .init();

    log::debug!("Logging initialized");
}
