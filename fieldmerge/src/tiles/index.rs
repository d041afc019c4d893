//! Bounding-box index over tile polygons.

use geo::{BoundingRect, Geometry, Intersects, MultiPolygon, Point};
use rstar::{RTree, AABB};
use tracing::{debug, info, warn};

use super::TileError;
use crate::feature::Layer;
use crate::geometry::{GeometryOps, IndexedEnvelope};
use crate::store::RawLayer;

/// Attribute holding the tile identifier in the tile dataset.
pub const DEFAULT_TILE_ID_FIELD: &str = "MGRS_TILE";

/// One partition cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: String,
    pub boundary: MultiPolygon,
}

/// Counts from one assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileAssignment {
    pub assigned: usize,
    /// Features whose centroid lies in no tile.
    pub unassigned: usize,
}

/// Read-only tile lookup, built once per run.
///
/// When a point lies in more than one tile (shared edges, overlapping
/// cells), the tile with the smallest identifier wins. Containment is
/// closed: a point on a tile's boundary lies in that tile.
#[derive(Debug)]
pub struct SpatialTileIndex {
    tiles: Vec<Tile>,
    tree: RTree<IndexedEnvelope>,
}

impl SpatialTileIndex {
    pub fn new(tiles: Vec<Tile>) -> Self {
        let envelopes = tiles
            .iter()
            .enumerate()
            .filter_map(|(idx, tile)| {
                tile.boundary
                    .bounding_rect()
                    .map(|rect| IndexedEnvelope::new(idx, rect))
            })
            .collect();
        Self {
            tree: RTree::bulk_load(envelopes),
            tiles,
        }
    }

    /// Builds the index from a tile dataset.
    ///
    /// Fails with [`TileError::BadAttribution`] if the dataset has no
    /// `id_field` attribute. Tiles with a null or non-areal geometry, or a
    /// null identifier, are skipped.
    pub fn from_layer(layer: RawLayer, id_field: &str) -> Result<Self, TileError> {
        if !layer.features.is_empty() && !layer.has_field(id_field) {
            return Err(TileError::BadAttribution {
                field: id_field.to_string(),
            });
        }

        let mut tiles = Vec::with_capacity(layer.features.len());
        let mut skipped = 0usize;
        for feature in layer.features {
            let id = feature.property_str(id_field);
            let boundary = match feature.geometry {
                Some(Geometry::Polygon(p)) => Some(MultiPolygon::new(vec![p])),
                Some(Geometry::MultiPolygon(mp)) => Some(mp),
                _ => None,
            };
            match (id, boundary) {
                (Some(id), Some(boundary)) => tiles.push(Tile { id, boundary }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "Skipped tiles without identifier or polygon");
        }
        info!(tiles = tiles.len(), "Loaded tile index");
        Ok(Self::new(tiles))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile containing `point`, if any.
    pub fn lookup(&self, point: Point) -> Option<&str> {
        let mut candidates: Vec<&Tile> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x(), point.y()]))
            .map(|entry| &self.tiles[entry.idx])
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        candidates
            .into_iter()
            .find(|tile| tile.boundary.intersects(&point))
            .map(|tile| tile.id.as_str())
    }

    /// Sets `mgrs_tile` on every feature from its centroid.
    pub fn assign<G: GeometryOps + ?Sized>(&self, ops: &G, layer: &mut Layer) -> TileAssignment {
        let mut summary = TileAssignment::default();
        for feature in layer.features_mut() {
            feature.mgrs_tile = ops
                .centroid(&feature.geometry)
                .and_then(|c| self.lookup(c))
                .map(str::to_string);
            match feature.mgrs_tile {
                Some(_) => summary.assigned += 1,
                None => summary.unassigned += 1,
            }
        }
        debug!(
            assigned = summary.assigned,
            unassigned = summary.unassigned,
            "Assigned tiles"
        );
        summary
    }
}
