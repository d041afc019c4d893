//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and pipeline context
//! creation to reduce duplication across command handlers.

use std::path::PathBuf;

use fieldmerge::config::{config_file_path, ConfigFile};
use fieldmerge::logging::{init_logging, LoggingGuard};
use fieldmerge::pipeline::{ErrorLog, PipelineContext, PipelineSettings};
use fieldmerge::store::{GeoJsonStore, VectorStore};
use fieldmerge::tiles::SpatialTileIndex;
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config (explicit path or the default location) and start
    /// logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file given with `--config`, if any
    /// * `verbose` - When true, enables debug-level logging unless RUST_LOG is set
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Result<Self, CliError> {
        let path = config_path.unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&path)?;

        let logging_guard = init_logging(&config.logging.file, verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("fieldmerge v{}", fieldmerge::VERSION);
        info!("fieldmerge CLI: {} command", command);
    }

    /// Build the shared pipeline context: tile index, priority table and
    /// error log from the loaded configuration.
    pub fn pipeline_context(&self) -> Result<PipelineContext, CliError> {
        let tiles_path = self
            .config
            .paths
            .tiles
            .as_ref()
            .ok_or(CliError::MissingTiles)?;

        let layer = GeoJsonStore::new().read(tiles_path)?;
        let tiles = SpatialTileIndex::from_layer(layer, &self.config.tiles.id_field)?;
        info!(
            path = %tiles_path.display(),
            tiles = tiles.len(),
            "Loaded tile index"
        );

        let error_log_path = &self.config.paths.error_log;
        let error_log = ErrorLog::open(error_log_path).map_err(|e| CliError::ErrorLog {
            path: error_log_path.clone(),
            error: e,
        })?;

        Ok(PipelineContext::new(
            PipelineSettings::from_config(&self.config),
            self.config.priority_table(),
            tiles,
        )
        .with_error_log(error_log))
    }
}
