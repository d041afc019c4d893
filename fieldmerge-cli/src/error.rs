//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use fieldmerge::config::ConfigFileError;
use fieldmerge::merge::MergeError;
use fieldmerge::pipeline::RegionError;
use fieldmerge::store::StoreError;
use fieldmerge::tiles::TileError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// No tile dataset configured
    MissingTiles,
    /// Failed to load the tile dataset
    Tiles(TileError),
    /// Failed to open the error log
    ErrorLog { path: PathBuf, error: std::io::Error },
    /// A region failed with both cleaning variants
    Region { region: String, error: RegionError },
    /// One or more regions of a batch failed
    BatchFailed { failed: usize, total: usize },
    /// Partition merge failed
    Merge(MergeError),
    /// Dataset read or write failed
    Store(StoreError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::MissingTiles => {
                eprintln!();
                eprintln!("Set the tile dataset in the config file:");
                eprintln!("  [paths]");
                eprintln!("  tiles = /path/to/mgrs_tiles.geojson");
                eprintln!();
                eprintln!("Run 'fieldmerge config path' to locate the file.");
            }
            CliError::Region { .. } | CliError::BatchFailed { .. } => {
                eprintln!();
                eprintln!("Failed regions are recorded in the error log.");
                eprintln!("Rerun with --verbose for detailed logging.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::MissingTiles => write!(f, "No tile dataset configured"),
            CliError::Tiles(e) => write!(f, "Failed to load tile dataset: {}", e),
            CliError::ErrorLog { path, error } => {
                write!(f, "Failed to open error log '{}': {}", path.display(), error)
            }
            CliError::Region { region, error } => {
                write!(f, "Region {} failed: {}", region, error)
            }
            CliError::BatchFailed { failed, total } => {
                write!(f, "{} of {} regions failed", failed, total)
            }
            CliError::Merge(e) => write!(f, "Merge failed: {}", e),
            CliError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Tiles(e) => Some(e),
            CliError::ErrorLog { error, .. } => Some(error),
            CliError::Region { error, .. } => Some(error),
            CliError::Merge(e) => Some(e),
            CliError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<MergeError> for CliError {
    fn from(e: MergeError) -> Self {
        CliError::Merge(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<TileError> for CliError {
    fn from(e: TileError) -> Self {
        CliError::Tiles(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_failed_message() {
        let err = CliError::BatchFailed {
            failed: 2,
            total: 5,
        };
        assert_eq!(err.to_string(), "2 of 5 regions failed");
    }

    #[test]
    fn test_region_error_has_source() {
        use std::error::Error;

        let err = CliError::Region {
            region: "TX".to_string(),
            error: RegionError::NoInputs(PathBuf::from("/in/TX")),
        };
        assert!(err.to_string().starts_with("Region TX failed"));
        assert!(err.source().is_some());
    }
}
