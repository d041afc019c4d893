//! fieldmerge CLI - Command-line interface
//!
//! This binary drives the fieldmerge library: region cleaning, batch runs,
//! partition merges, geometry audits and configuration management.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;

#[derive(Parser)]
#[command(name = "fieldmerge")]
#[command(version = fieldmerge::VERSION)]
#[command(about = "Priority overlay cleaning of field boundary datasets", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.fieldmerge/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean one region and write its tile partitions
    Clean {
        /// Region name (a directory under the input directory)
        region: String,

        /// Use the strict cleaning variant from the start
        #[arg(long)]
        strict: bool,

        /// Reprocess the region even if its output exists
        #[arg(long)]
        overwrite: bool,
    },

    /// Clean several regions in parallel
    Batch {
        /// Regions to process (default: every region directory)
        regions: Vec<String>,

        /// Reprocess regions even if their output exists
        #[arg(long)]
        overwrite: bool,
    },

    /// Merge tile partitions into one dataset
    Merge {
        /// Output dataset path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Partition datasets to merge, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Count valid and defective geometries in a dataset
    Check {
        /// Dataset to audit
        file: PathBuf,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.clone();

    let result = match cli.command {
        Commands::Clean {
            region,
            strict,
            overwrite,
        } => commands::clean::run(commands::clean::CleanArgs {
            config: config_path,
            verbose: cli.verbose,
            region,
            strict,
            overwrite,
        }),
        Commands::Batch { regions, overwrite } => commands::batch::run(commands::batch::BatchArgs {
            config: config_path,
            verbose: cli.verbose,
            regions,
            overwrite,
        }),
        Commands::Merge { output, inputs } => {
            commands::merge::run(config_path, cli.verbose, &inputs, &output)
        }
        Commands::Check { file } => commands::check::run(config_path, cli.verbose, &file),
        Commands::Config { command } => commands::config::run(config_path, command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
