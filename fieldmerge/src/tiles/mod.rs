//! Spatial tile partitioning.
//!
//! The [`SpatialTileIndex`] resolves each final feature to the tile
//! containing its centroid, and the [`TileSplitter`] groups the tagged
//! features into one partition per (tile, source code) pair.
//!
//! # Flow
//!
//! ```text
//! tile dataset ──► SpatialTileIndex::from_layer
//!                        │
//! final layer ──► assign (centroid → tile) ──► TileSplitter::split
//!                                                   │
//!                          <tile>_<code>.geojson ◄──┘
//! ```

mod index;
mod split;

pub use index::{SpatialTileIndex, Tile, TileAssignment, DEFAULT_TILE_ID_FIELD};
pub use split::{write_partitions, Partition, SplitResult, TileSplitter};

use thiserror::Error;

use crate::store::StoreError;

/// Errors building or writing tile partitions.
#[derive(Debug, Error)]
pub enum TileError {
    /// A required attribute is absent from the tile dataset.
    #[error("Bad attribution: tile dataset has no '{field}' attribute")]
    BadAttribution { field: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
