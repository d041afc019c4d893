//! Shared boundary measurement between touching polygons.

use geo::{Coord, Line, Polygon};

/// Length of boundary shared by `a` and `b`.
///
/// Every ring segment of `a` is compared against every ring segment of `b`;
/// segments lying on the same line (within `tolerance` map units) contribute
/// the length of their overlapping span. Polygons that only meet at a vertex
/// share no boundary. Vertices along a shared edge do not need to coincide,
/// which matters for edges produced by separate boolean operations.
pub fn shared_boundary_length(a: &Polygon, b: &Polygon, tolerance: f64) -> f64 {
    let b_lines: Vec<Line> = rings(b).flat_map(|ring| ring.lines()).collect();

    rings(a)
        .flat_map(|ring| ring.lines())
        .map(|segment| {
            b_lines
                .iter()
                .map(|other| collinear_overlap(&segment, other, tolerance))
                .sum::<f64>()
        })
        .sum()
}

fn rings(polygon: &Polygon) -> impl Iterator<Item = &geo::LineString> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

/// Overlap length of two segments lying on a common line, or 0.
fn collinear_overlap(a: &Line, b: &Line, tolerance: f64) -> f64 {
    let d = a.delta();
    let len = d.x.hypot(d.y);
    if len <= tolerance {
        return 0.0;
    }

    if distance_to_line(a.start, d, len, b.start) > tolerance
        || distance_to_line(a.start, d, len, b.end) > tolerance
    {
        return 0.0;
    }

    let t0 = project(a.start, d, len, b.start);
    let t1 = project(a.start, d, len, b.end);
    let lo = t0.min(t1).max(0.0);
    let hi = t0.max(t1).min(len);

    (hi - lo).max(0.0)
}

fn distance_to_line(origin: Coord, d: Coord, len: f64, p: Coord) -> f64 {
    let v = p - origin;
    (d.x * v.y - d.y * v.x).abs() / len
}

fn project(origin: Coord, d: Coord, len: f64, p: Coord) -> f64 {
    let v = p - origin;
    (d.x * v.x + d.y * v.y) / len
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    const TOL: f64 = 1e-6;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    #[test]
    fn test_full_edge_shared() {
        let a = rect(0.0, 0.0, 90.0, 100.0);
        let b = rect(90.0, 0.0, 91.0, 100.0);
        let shared = shared_boundary_length(&a, &b, TOL);
        assert!((shared - 100.0).abs() < 1e-9, "shared = {shared}");
    }

    #[test]
    fn test_partial_edge_shared() {
        let sliver = rect(90.0, 0.0, 91.0, 100.0);
        let small = rect(91.0, -48.0, 141.0, 2.0);
        let shared = shared_boundary_length(&sliver, &small, TOL);
        assert!((shared - 2.0).abs() < 1e-9, "shared = {shared}");
    }

    #[test]
    fn test_vertices_need_not_coincide() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        // b's left edge is split into two segments at y = 3
        let b = Polygon::new(
            geo::LineString::from(vec![
                (10.0, 0.0),
                (20.0, 0.0),
                (20.0, 10.0),
                (10.0, 10.0),
                (10.0, 3.0),
                (10.0, 0.0),
            ]),
            vec![],
        );
        let shared = shared_boundary_length(&a, &b, TOL);
        assert!((shared - 10.0).abs() < 1e-9, "shared = {shared}");
    }

    #[test]
    fn test_corner_touch_shares_nothing() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 10.0, 20.0, 20.0);
        assert_eq!(shared_boundary_length(&a, &b, TOL), 0.0);
    }

    #[test]
    fn test_disjoint_shares_nothing() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(30.0, 0.0, 40.0, 10.0);
        assert_eq!(shared_boundary_length(&a, &b, TOL), 0.0);
    }

    #[test]
    fn test_is_symmetric() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 4.0, 15.0, 30.0);
        let ab = shared_boundary_length(&a, &b, TOL);
        let ba = shared_boundary_length(&b, &a, TOL);
        assert!((ab - ba).abs() < 1e-9);
        assert!((ab - 6.0).abs() < 1e-9);
    }
}
