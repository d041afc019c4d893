//! fieldmerge - priority overlay cleaning of agricultural field polygons
//!
//! This library merges several overlapping polygon datasets for a region into
//! one non-overlapping dataset. Where sources overlap, the geometry of the
//! higher-priority source wins; slivers left by the overlay are merged into
//! their neighbours or removed. The result is partitioned by spatial tile and
//! source code.
//!
//! # High-Level API
//!
//! For most use cases, the [`pipeline`] module drives whole regions:
//!
//! ```ignore
//! use fieldmerge::config::ConfigFile;
//! use fieldmerge::pipeline::{run_batch, PipelineContext, PipelineSettings};
//!
//! let config = ConfigFile::load()?;
//! let ctx = PipelineContext::new(
//!     PipelineSettings::from_config(&config),
//!     config.priority_table(),
//!     tiles,
//! );
//! let report = run_batch(&["TX".to_string(), "MT".to_string()], &ctx, false);
//! ```
//!
//! The overlay itself lives in [`overlay`] and works on any
//! [`geometry::GeometryOps`] backend.

pub mod config;
pub mod crs;
pub mod feature;
pub mod geometry;
pub mod logging;
pub mod merge;
pub mod overlay;
pub mod pipeline;
pub mod priority;
pub mod store;
pub mod tiles;

/// Version of the fieldmerge library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
