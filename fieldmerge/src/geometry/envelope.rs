//! Bounding-box entries for `rstar` R-trees.

use geo::Rect;
use rstar::{RTreeObject, AABB};

/// A bounding box tagged with the position of the geometry it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedEnvelope {
    pub idx: usize,
    pub env: AABB<[f64; 2]>,
}

impl IndexedEnvelope {
    pub fn new(idx: usize, rect: Rect) -> Self {
        Self {
            idx,
            env: envelope_of(rect),
        }
    }
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

/// Converts a `geo` rectangle to an `rstar` envelope.
pub fn envelope_of(rect: Rect) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}
