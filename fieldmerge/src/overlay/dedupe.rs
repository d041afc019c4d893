//! Self-overlap removal within one layer.
//!
//! Overlapping polygons of the same layer are cut into a planar partition:
//! each incoming polygon splits the pieces it overlaps into their outside
//! part and the overlap, and only its uncovered remainder is added as a new
//! piece. Overlaps therefore survive exactly once. A final pass drops
//! geometries that are exact duplicates regardless of ring start or
//! orientation.

use std::collections::HashSet;

use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
use rstar::{RTree, AABB};
use tracing::debug;

use crate::geometry::{envelope_of, GeometryError, GeometryOps, IndexedEnvelope};

/// Removes overlaps between the polygons of one layer.
///
/// Accepted pieces are indexed in an R-tree, so each incoming polygon only
/// visits the pieces whose bounding boxes it touches. Output order follows
/// the order in which pieces were created, so the result is deterministic
/// for a given input order.
pub fn remove_self_overlaps<G: GeometryOps + ?Sized>(
    ops: &G,
    polygons: Vec<Polygon>,
) -> Result<Vec<Polygon>, GeometryError> {
    let input_count = polygons.len();
    let mut pieces = PieceSet::with_capacity(input_count);

    for polygon in polygons {
        let Some(rect) = ops.bounding_box(&polygon) else {
            continue;
        };
        let incoming = MultiPolygon::new(vec![polygon]);
        let mut remainder = incoming.clone();

        for entry in pieces.candidates(envelope_of(rect)) {
            let Some(piece) = pieces.get(entry.idx) else {
                continue;
            };
            let piece_mp = MultiPolygon::new(vec![piece.clone()]);
            let overlap = ops.intersection(&piece_mp, &incoming)?;
            if overlap.unsigned_area() <= 0.0 {
                continue;
            }

            let outside = ops.difference(&piece_mp, &incoming)?;
            pieces.remove(entry);
            pieces.push_parts(ops, outside);
            pieces.push_parts(ops, overlap);
            if !remainder.0.is_empty() {
                remainder = ops.difference(&remainder, &piece_mp)?;
            }
        }
        pieces.push_parts(ops, remainder);
    }

    let (unique, duplicates) = drop_duplicates(pieces.into_polygons());
    debug!(
        input = input_count,
        output = unique.len(),
        duplicates,
        "Removed self-overlaps"
    );
    Ok(unique)
}

/// Pieces of the partition in creation order, with a spatial index over
/// the live ones.
struct PieceSet {
    slots: Vec<Option<Polygon>>,
    tree: RTree<IndexedEnvelope>,
}

impl PieceSet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            tree: RTree::new(),
        }
    }

    fn get(&self, idx: usize) -> Option<&Polygon> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    /// Live pieces whose envelopes intersect `env`, oldest first.
    fn candidates(&self, env: AABB<[f64; 2]>) -> Vec<IndexedEnvelope> {
        let mut found: Vec<IndexedEnvelope> = self
            .tree
            .locate_in_envelope_intersecting(&env)
            .copied()
            .collect();
        found.sort_by_key(|e| e.idx);
        found
    }

    fn remove(&mut self, entry: IndexedEnvelope) {
        self.tree.remove(&entry);
        if let Some(slot) = self.slots.get_mut(entry.idx) {
            *slot = None;
        }
    }

    fn push_parts<G: GeometryOps + ?Sized>(&mut self, ops: &G, geometry: MultiPolygon) {
        for part in ops.explode(geometry) {
            if ops.area(&part) <= 0.0 {
                continue;
            }
            if let Some(rect) = ops.bounding_box(&part) {
                let idx = self.slots.len();
                self.tree.insert(IndexedEnvelope::new(idx, rect));
                self.slots.push(Some(part));
            }
        }
    }

    fn into_polygons(self) -> Vec<Polygon> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Drops polygons whose canonical coordinates repeat an earlier polygon.
///
/// Returns the survivors and the number of duplicates removed.
pub fn drop_duplicates(polygons: Vec<Polygon>) -> (Vec<Polygon>, usize) {
    let mut seen = HashSet::new();
    let before = polygons.len();
    let unique: Vec<Polygon> = polygons
        .into_iter()
        .filter(|p| seen.insert(canonical_key(p)))
        .collect();
    let removed = before - unique.len();
    (unique, removed)
}

type RingKey = Vec<(u64, u64)>;

/// Ring-rotation and orientation independent key of a polygon.
fn canonical_key(polygon: &Polygon) -> (RingKey, Vec<RingKey>) {
    let mut interiors: Vec<RingKey> = polygon.interiors().iter().map(canonical_ring).collect();
    interiors.sort();
    (canonical_ring(polygon.exterior()), interiors)
}

fn canonical_ring(ring: &LineString) -> RingKey {
    let mut coords: Vec<Coord> = ring.0.clone();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.is_empty() {
        return Vec::new();
    }
    if signed_area(&coords) < 0.0 {
        coords.reverse();
    }

    let start = coords
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    coords.rotate_left(start);

    coords
        .into_iter()
        .map(|c| (bits(c.x), bits(c.y)))
        .collect()
}

fn signed_area(coords: &[Coord]) -> f64 {
    let n = coords.len();
    (0..n)
        .map(|i| {
            let a = coords[i];
            let b = coords[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

/// Bit pattern with -0.0 folded onto 0.0.
fn bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}
