//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init` for locating,
//! viewing and creating the configuration file.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use fieldmerge::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (defaults overlaid by the file)
    Show,

    /// Write a default configuration file if none exists
    Init,
}

/// Run a config subcommand.
pub fn run(config_path: Option<PathBuf>, command: ConfigCommands) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Init => run_init(&path),
    }
}

fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist, defaults in use; run 'fieldmerge config init')");
    }
    Ok(())
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_init(path: &Path) -> Result<(), CliError> {
    if ConfigFile::ensure_exists_at(path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists, left unchanged", path.display());
    }
    Ok(())
}
