//! Sliver elimination by merging into the longest-shared-boundary neighbour.
//!
//! One pass: an [`AdjacencyGraph`] is built from flagged to unflagged
//! features, every flagged feature selects its absorbing neighbour, and the
//! selected merges are then applied together. Flagged features with no
//! unflagged neighbour are left in place, still flagged.

use std::collections::{BTreeMap, HashSet};

use geo::{MultiPolygon, Polygon};
use rstar::RTree;
use tracing::debug;

use crate::feature::{Feature, Layer};
use crate::geometry::{envelope_of, GeometryError, GeometryOps, IndexedEnvelope};

/// Touching neighbour of a flagged feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjacency {
    /// Index of the unflagged neighbour in the layer.
    pub neighbor: usize,
    /// Length of the shared boundary.
    pub shared: f64,
}

/// Flagged-to-unflagged adjacency, weighted by shared boundary length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjacencyGraph {
    edges: BTreeMap<usize, Vec<Adjacency>>,
}

impl AdjacencyGraph {
    /// Builds the graph for every flagged feature in `features`.
    ///
    /// Only neighbours sharing a boundary of positive length are recorded;
    /// polygons meeting at a single point are not adjacent.
    pub fn build<G: GeometryOps + ?Sized>(ops: &G, features: &[Feature]) -> Self {
        let candidates: Vec<IndexedEnvelope> = features
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.eliminate)
            .filter_map(|(idx, f)| {
                ops.bounding_box(&f.geometry)
                    .map(|rect| IndexedEnvelope::new(idx, rect))
            })
            .collect();
        let tree = RTree::bulk_load(candidates);

        let mut edges = BTreeMap::new();
        for (idx, feature) in features.iter().enumerate().filter(|(_, f)| f.eliminate) {
            let Some(rect) = ops.bounding_box(&feature.geometry) else {
                continue;
            };
            let query = envelope_of(rect);

            let mut neighbors: Vec<Adjacency> = tree
                .locate_in_envelope_intersecting(&query)
                .map(|entry| Adjacency {
                    neighbor: entry.idx,
                    shared: ops.shared_boundary_length(
                        &feature.geometry,
                        &features[entry.idx].geometry,
                    ),
                })
                .filter(|adj| adj.shared > 0.0)
                .collect();
            neighbors.sort_by_key(|adj| adj.neighbor);
            edges.insert(idx, neighbors);
        }

        Self { edges }
    }

    pub fn neighbors(&self, idx: usize) -> &[Adjacency] {
        self.edges.get(&idx).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Neighbour sharing the longest boundary with `idx`.
    ///
    /// Equal lengths resolve to the neighbour with the smaller identifier.
    pub fn best_neighbor(&self, idx: usize, features: &[Feature]) -> Option<usize> {
        self.neighbors(idx)
            .iter()
            .max_by(|a, b| {
                a.shared
                    .total_cmp(&b.shared)
                    .then_with(|| features[b.neighbor].id.cmp(&features[a.neighbor].id))
            })
            .map(|adj| adj.neighbor)
    }
}

/// Counts from one elimination pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EliminationSummary {
    /// Flagged features absorbed into a neighbour.
    pub merged: usize,
    /// Flagged features with no unflagged neighbour.
    pub unresolved: usize,
}

/// Absorbs flagged features into their best unflagged neighbour.
#[derive(Debug, Clone, Copy, Default)]
pub struct EliminationMerger;

impl EliminationMerger {
    pub fn new() -> Self {
        Self
    }

    /// Runs one selection-then-merge pass over `layer`.
    ///
    /// The absorbing feature keeps its identifier and source code. If the
    /// merged geometry comes out multipart, each part carries the absorbing
    /// feature's attributes.
    pub fn merge<G: GeometryOps + ?Sized>(
        &self,
        ops: &G,
        layer: Layer,
    ) -> Result<(Layer, EliminationSummary), GeometryError> {
        let features = layer.into_features();
        let graph = AdjacencyGraph::build(ops, &features);

        let mut targets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut summary = EliminationSummary::default();
        for (idx, _) in features.iter().enumerate().filter(|(_, f)| f.eliminate) {
            match graph.best_neighbor(idx, &features) {
                Some(target) => {
                    targets.entry(target).or_default().push(idx);
                    summary.merged += 1;
                }
                None => summary.unresolved += 1,
            }
        }

        let absorbed: HashSet<usize> = targets.values().flatten().copied().collect();
        let mut out = Vec::with_capacity(features.len() - absorbed.len());

        for (idx, feature) in features.iter().enumerate() {
            if absorbed.contains(&idx) {
                continue;
            }
            let Some(victims) = targets.get(&idx) else {
                out.push(feature.clone());
                continue;
            };

            let mut merged = single(feature.geometry.clone());
            for &victim in victims {
                merged = ops.union(&merged, &single(features[victim].geometry.clone()))?;
            }
            out.extend(
                ops.explode(merged)
                    .into_iter()
                    .map(|part| feature.with_geometry(part)),
            );
        }

        debug!(
            merged = summary.merged,
            unresolved = summary.unresolved,
            "Eliminated slivers"
        );
        Ok((Layer::new(out), summary))
    }
}

fn single(polygon: Polygon) -> MultiPolygon {
    MultiPolygon::new(vec![polygon])
}
