//! [`GeometryOps`] backed by the `geo` crate.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use geo::{
    Area, BooleanOps, BoundingRect, Buffer, Centroid, CoordsIter, MultiPolygon, Point, Polygon,
    Rect, Validation,
};

use tracing::debug;

use super::{boundary, GeometryError, GeometryOps};

/// Default tolerance (map units) for deciding that two edges are collinear.
pub const DEFAULT_ADJACENCY_TOLERANCE: f64 = 1e-3;

/// Geometry backend using `geo`'s boolean operations.
///
/// `geo` signals unrecoverable numerical trouble by panicking inside the
/// sweep-line overlay; those panics are caught here and surfaced as
/// [`GeometryError::Aborted`] so the caller can run its repair protocol.
/// While a guarded operation runs, the panic message is reported through
/// `tracing` at debug level instead of the default stderr hook; panics
/// elsewhere in the process still reach the previous hook.
#[derive(Debug, Clone, Copy)]
pub struct GeoOps {
    adjacency_tolerance: f64,
}

impl GeoOps {
    pub fn new(adjacency_tolerance: f64) -> Self {
        Self {
            adjacency_tolerance,
        }
    }
}

impl Default for GeoOps {
    fn default() -> Self {
        Self::new(DEFAULT_ADJACENCY_TOLERANCE)
    }
}

fn all_finite(geometry: &MultiPolygon) -> bool {
    geometry
        .coords_iter()
        .all(|c| c.x.is_finite() && c.y.is_finite())
}

thread_local! {
    static IN_GUARDED_OP: Cell<bool> = const { Cell::new(false) };
}

static INSTALL_HOOK: Once = Once::new();

/// Wraps the process panic hook so panics raised inside [`guarded`] are
/// logged instead of printed.
fn install_quiet_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if in_guarded_op() {
                debug!(panic = %info, "Geometry engine panicked");
            } else {
                previous(info);
            }
        }));
    });
}

fn in_guarded_op() -> bool {
    IN_GUARDED_OP.with(Cell::get)
}

fn guarded<F>(
    operation: &'static str,
    operands: &[&MultiPolygon],
    f: F,
) -> Result<MultiPolygon, GeometryError>
where
    F: FnOnce() -> MultiPolygon,
{
    if !operands.iter().all(|g| all_finite(g)) {
        return Err(GeometryError::NonFiniteCoordinates { operation });
    }
    install_quiet_hook();
    IN_GUARDED_OP.with(|flag| flag.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    IN_GUARDED_OP.with(|flag| flag.set(false));
    result.map_err(|_| GeometryError::Aborted { operation })
}

impl GeometryOps for GeoOps {
    fn union(&self, a: &MultiPolygon, b: &MultiPolygon) -> Result<MultiPolygon, GeometryError> {
        guarded("union", &[a, b], || a.union(b))
    }

    fn intersection(
        &self,
        a: &MultiPolygon,
        b: &MultiPolygon,
    ) -> Result<MultiPolygon, GeometryError> {
        guarded("intersection", &[a, b], || a.intersection(b))
    }

    fn difference(
        &self,
        a: &MultiPolygon,
        b: &MultiPolygon,
    ) -> Result<MultiPolygon, GeometryError> {
        guarded("difference", &[a, b], || a.difference(b))
    }

    fn is_valid(&self, polygon: &Polygon) -> bool {
        polygon.is_valid()
    }

    fn repair(&self, geometry: &MultiPolygon) -> Result<MultiPolygon, GeometryError> {
        let empty = MultiPolygon::new(Vec::new());
        guarded("repair", &[geometry], || geometry.union(&empty))
    }

    fn contract(&self, polygon: &Polygon, distance: f64) -> Result<MultiPolygon, GeometryError> {
        let operand = MultiPolygon::new(vec![polygon.clone()]);
        guarded("contract", &[&operand], || polygon.buffer(-distance.abs()))
    }

    fn area(&self, polygon: &Polygon) -> f64 {
        polygon.unsigned_area()
    }

    fn perimeter(&self, polygon: &Polygon) -> f64 {
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .flat_map(|ring| ring.lines())
            .map(|line| line.dx().hypot(line.dy()))
            .sum()
    }

    fn centroid(&self, polygon: &Polygon) -> Option<Point> {
        polygon.centroid()
    }

    fn bounding_box(&self, polygon: &Polygon) -> Option<Rect> {
        polygon.bounding_rect()
    }

    fn shared_boundary_length(&self, a: &Polygon, b: &Polygon) -> f64 {
        boundary::shared_boundary_length(a, b, self.adjacency_tolerance)
    }
}
