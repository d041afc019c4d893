//! CLI command implementations.
//!
//! Each subcommand has its own module with its handler.
//!
//! # Command Modules
//!
//! - [`batch`] - Clean several regions in parallel
//! - [`check`] - Geometry audit of one dataset
//! - [`clean`] - Clean one region
//! - [`config`] - Configuration management (path, show, init)
//! - [`merge`] - Merge tile partitions

pub mod batch;
pub mod check;
pub mod clean;
pub mod config;
pub mod merge;
