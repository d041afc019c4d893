//! Geometry operations capability.
//!
//! The overlay, elimination and tiling code only talks to the
//! [`GeometryOps`] trait, so the backing geometry library can be swapped
//! (or wrapped, as the tests do to inject failures). [`GeoOps`] is the
//! default backend built on the `geo` crate.
//!
//! # Operations
//!
//! | Operation                | Used by                               |
//! |--------------------------|---------------------------------------|
//! | `union`, `intersection`  | self-overlap removal, elimination     |
//! | `difference`             | clipping against the accumulated base |
//! | `is_valid`, `repair`     | input sanitising, difference repair   |
//! | `contract`               | difference repair (negative buffer)   |
//! | `explode`                | multipart to singlepart split         |
//! | `area`, `perimeter`      | sliver classification                 |
//! | `shared_boundary_length` | elimination adjacency graph           |
//! | `centroid`               | tile assignment                       |

mod boundary;
mod envelope;
mod geo_ops;

pub use boundary::shared_boundary_length;
pub use envelope::{envelope_of, IndexedEnvelope};
pub use geo_ops::{GeoOps, DEFAULT_ADJACENCY_TOLERANCE};

use geo::{MultiPolygon, Point, Polygon, Rect};
use thiserror::Error;

/// Errors raised by boolean geometry operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// An operand contained NaN or infinite coordinates.
    #[error("{operation}: operand contains non-finite coordinates")]
    NonFiniteCoordinates { operation: &'static str },

    /// The geometry library aborted while computing the result.
    #[error("{operation}: geometry engine aborted")]
    Aborted { operation: &'static str },
}

/// Narrow set of geometry operations the cleaning pipeline depends on.
///
/// Implementations must be deterministic: identical inputs in identical
/// order produce identical outputs.
pub trait GeometryOps: Send + Sync {
    /// Boolean union of two polygon sets.
    fn union(&self, a: &MultiPolygon, b: &MultiPolygon) -> Result<MultiPolygon, GeometryError>;

    /// Boolean intersection of two polygon sets.
    fn intersection(
        &self,
        a: &MultiPolygon,
        b: &MultiPolygon,
    ) -> Result<MultiPolygon, GeometryError>;

    /// Area of `a` not covered by `b`.
    fn difference(&self, a: &MultiPolygon, b: &MultiPolygon)
        -> Result<MultiPolygon, GeometryError>;

    /// OGC validity predicate.
    fn is_valid(&self, polygon: &Polygon) -> bool;

    /// Topology repair: rebuilds the geometry so that rings no longer
    /// self-intersect or overlap.
    fn repair(&self, geometry: &MultiPolygon) -> Result<MultiPolygon, GeometryError>;

    /// Contracts a polygon's boundary inwards by `distance` map units.
    fn contract(&self, polygon: &Polygon, distance: f64) -> Result<MultiPolygon, GeometryError>;

    /// Planar area in square map units.
    fn area(&self, polygon: &Polygon) -> f64;

    /// Total boundary length of all rings.
    fn perimeter(&self, polygon: &Polygon) -> f64;

    fn centroid(&self, polygon: &Polygon) -> Option<Point>;

    fn bounding_box(&self, polygon: &Polygon) -> Option<Rect>;

    /// Length of boundary shared by two polygons that touch along edges.
    fn shared_boundary_length(&self, a: &Polygon, b: &Polygon) -> f64;

    /// Splits a multipart geometry into its single-ring-set parts.
    ///
    /// Degenerate parts (exterior ring with fewer than four coordinates)
    /// are discarded.
    fn explode(&self, geometry: MultiPolygon) -> Vec<Polygon> {
        geometry
            .0
            .into_iter()
            .filter(|polygon| polygon.exterior().0.len() >= 4)
            .collect()
    }
}
