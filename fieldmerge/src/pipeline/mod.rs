//! Region pipeline.
//!
//! A region is a directory of source layers under the input directory. For
//! each region the pipeline:
//!
//! 1. skips the region if its output dataset already exists
//! 2. discovers the input layers and sorts them by priority
//! 3. cleans and overlays them into one layer
//! 4. assigns tiles and writes one partition per (tile, source code)
//! 5. writes the region dataset, which marks the region complete
//!
//! Regions are independent of each other and [`run_batch`] runs them in
//! parallel. A failed lenient run is retried once with the strict
//! [`CleaningVariant`](crate::overlay::CleaningVariant); failures go to the
//! [`ErrorLog`].

mod batch;
mod error_log;
mod inputs;
mod region;

pub use batch::{run_batch, BatchReport};
pub use error_log::{ErrorLog, ERROR_LOG_HEADER};
pub use inputs::{discover_inputs, list_regions, source_code_of, DATASET_EXTENSION};
pub use region::{
    process_region, run_region_with_fallback, PipelineContext, PipelineSettings, RegionJob,
    RegionOutcome, RegionSummary,
};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::overlay::OverlayError;
use crate::priority::PriorityError;
use crate::store::StoreError;
use crate::tiles::TileError;

/// Errors that abort one region.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Region directory not found: {}", .0.display())]
    RegionNotFound(PathBuf),

    #[error("No input layers in {}", .0.display())]
    NoInputs(PathBuf),

    #[error(transparent)]
    Priority(#[from] PriorityError),

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
