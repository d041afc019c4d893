//! Priority-based overlay of source layers.
//!
//! This module turns a priority-ordered list of source layers into one
//! non-overlapping, provenance-tagged layer:
//!
//! - [`InputCleaner`] sanitises raw geometry per [`CleaningVariant`]
//! - [`remove_self_overlaps`] partitions each layer so it no longer overlaps
//!   itself
//! - [`OverlayEngine`] clips each layer against the accumulated base
//! - [`SliverClassifier`] and [`EliminationMerger`] remove overlay artifacts
//!
//! # Example
//!
//! ```ignore
//! use fieldmerge::geometry::GeoOps;
//! use fieldmerge::overlay::{OverlayEngine, OverlaySettings, SourceLayer};
//!
//! let ops = GeoOps::default();
//! let engine = OverlayEngine::new(&ops, OverlaySettings::default());
//! let state = engine.ingest(engine.start(), SourceLayer::new("CLU", high))?;
//! let state = engine.ingest(state, SourceLayer::new("NLCD", low))?;
//! let output = engine.finish(state)?;
//! ```

mod clean;
mod dedupe;
mod eliminate;
mod engine;
mod ids;
mod sliver;

pub use clean::{CleaningVariant, InputCleaner, DEFAULT_STRICT_MIN_AREA};
pub use dedupe::{drop_duplicates, remove_self_overlaps};
pub use eliminate::{Adjacency, AdjacencyGraph, EliminationMerger, EliminationSummary};
pub use engine::{
    OverlayEngine, OverlayOutput, OverlaySettings, OverlayStage, OverlayState, OverlayStats,
    SourceLayer, DEFAULT_REPAIR_BUFFER,
};
pub use ids::IdSequence;
pub use sliver::{
    compactness, ClassifySummary, SliverClassifier, DEFAULT_MIN_AREA, DEFAULT_RATIO_THRESHOLD,
};

use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::GeometryError;

/// Region-fatal overlay failures.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// A configured input layer does not exist.
    #[error("Missing input file: {}", .0.display())]
    MissingInputFile(PathBuf),

    /// Difference against the base failed after the repair-and-retry.
    #[error("Geometry operation failed for layer {source_code} after repair: {source}")]
    GeometryOperationFailure {
        source_code: String,
        #[source]
        source: GeometryError,
    },

    /// A boolean operation outside the difference step failed.
    #[error("Geometry operation failed at stage {stage} for layer {source_code}: {source}")]
    Geometry {
        stage: OverlayStage,
        source_code: String,
        #[source]
        source: GeometryError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let missing = OverlayError::MissingInputFile(PathBuf::from("/data/tx_CLU.geojson"));
        assert_eq!(missing.to_string(), "Missing input file: /data/tx_CLU.geojson");

        let failed = OverlayError::GeometryOperationFailure {
            source_code: "NLCD".to_string(),
            source: GeometryError::Aborted {
                operation: "difference",
            },
        };
        assert_eq!(
            failed.to_string(),
            "Geometry operation failed for layer NLCD after repair: difference: geometry engine aborted"
        );
    }
}
