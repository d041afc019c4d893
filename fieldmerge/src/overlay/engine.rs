//! Priority overlay engine.
//!
//! Layers are folded into an accumulating base in priority order. Each step
//! consumes the previous [`OverlayState`] and returns the next one; nothing
//! is shared between steps except through that value.
//!
//! ```text
//! INIT → LOADED → DEDUPED → SOURCED
//!      → (DIFFERENCED → SINGLEPART → CLASSIFIED → ELIMINATED → MERGED)*
//!      → FINAL_CLASSIFIED → FINAL_CLEAN → DONE
//! ```
//!
//! The first layer becomes the base unchanged. Every later layer is clipped
//! against the base (area already claimed by higher-priority sources), its
//! slivers are merged into neighbours, and the survivors are appended to the
//! base. After the last layer the whole base is classified once more and
//! anything still flagged is deleted.

use std::fmt;

use geo::MultiPolygon;
use rstar::RTree;
use tracing::{debug, info, warn};

use super::dedupe::remove_self_overlaps;
use super::eliminate::EliminationMerger;
use super::ids::IdSequence;
use super::sliver::SliverClassifier;
use super::OverlayError;
use crate::feature::{Feature, Layer};
use crate::geometry::{envelope_of, GeometryError, GeometryOps, IndexedEnvelope};
use crate::priority::LayerInput;

/// Default contraction distance (map units) applied to the base when the
/// difference operation fails.
pub const DEFAULT_REPAIR_BUFFER: f64 = 0.1;

/// Processing stage of a region's overlay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStage {
    Init,
    Loaded,
    Deduped,
    Sourced,
    Differenced,
    Singlepart,
    Classified,
    Eliminated,
    Merged,
    FinalClassified,
    FinalClean,
    Done,
}

impl fmt::Display for OverlayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Loaded => "loaded",
            Self::Deduped => "deduped",
            Self::Sourced => "sourced",
            Self::Differenced => "differenced",
            Self::Singlepart => "singlepart",
            Self::Classified => "classified",
            Self::Eliminated => "eliminated",
            Self::Merged => "merged",
            Self::FinalClassified => "final_classified",
            Self::FinalClean => "final_clean",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// One source layer's geometry, ready for the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLayer {
    pub source_code: String,
    pub polygons: Vec<geo::Polygon>,
}

impl SourceLayer {
    pub fn new(source_code: impl Into<String>, polygons: Vec<geo::Polygon>) -> Self {
        Self {
            source_code: source_code.into(),
            polygons,
        }
    }
}

/// Running totals of one overlay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayStats {
    pub layers: usize,
    /// Slivers merged into neighbours during the per-layer passes.
    pub slivers_merged: usize,
    /// Base repairs performed after a failed difference.
    pub repairs: usize,
    /// Features hard-deleted by the final classification.
    pub deleted: usize,
}

/// Accumulator threaded through the overlay fold.
#[derive(Debug, Clone)]
pub struct OverlayState {
    base: Option<Layer>,
    ids: IdSequence,
    stage: OverlayStage,
    stats: OverlayStats,
}

impl OverlayState {
    pub fn stage(&self) -> OverlayStage {
        self.stage
    }

    pub fn stats(&self) -> OverlayStats {
        self.stats
    }

    /// Accumulated features so far, if any layer has been ingested.
    pub fn base(&self) -> Option<&Layer> {
        self.base.as_ref()
    }

    /// Identifier the next assigned feature will receive.
    pub fn next_id(&self) -> u64 {
        self.ids.peek()
    }

    fn advance(&mut self, stage: OverlayStage) {
        debug!(from = %self.stage, to = %stage, "Overlay stage");
        self.stage = stage;
    }
}

/// Result of a completed overlay run.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOutput {
    /// Final features, identifiers renumbered from 1.
    pub layer: Layer,
    pub stats: OverlayStats,
}

/// Tunables of the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlaySettings {
    pub classifier: SliverClassifier,
    /// Contraction distance used by the difference repair protocol.
    pub repair_buffer: f64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            classifier: SliverClassifier::default(),
            repair_buffer: DEFAULT_REPAIR_BUFFER,
        }
    }
}

/// Folds priority-ordered layers into one deduplicated, provenance-tagged
/// layer.
pub struct OverlayEngine<'a, G: GeometryOps + ?Sized> {
    ops: &'a G,
    settings: OverlaySettings,
    merger: EliminationMerger,
}

impl<'a, G: GeometryOps + ?Sized> OverlayEngine<'a, G> {
    pub fn new(ops: &'a G, settings: OverlaySettings) -> Self {
        Self {
            ops,
            settings,
            merger: EliminationMerger::new(),
        }
    }

    /// Initial accumulator.
    pub fn start(&self) -> OverlayState {
        OverlayState {
            base: None,
            ids: IdSequence::new(),
            stage: OverlayStage::Init,
            stats: OverlayStats::default(),
        }
    }

    /// Runs the whole overlay over `inputs`, loading each layer with `load`.
    ///
    /// Inputs must already be in priority order. A missing input file
    /// aborts the run before anything is loaded for it.
    pub fn run<E, F>(&self, inputs: &[LayerInput], mut load: F) -> Result<OverlayOutput, E>
    where
        F: FnMut(&LayerInput) -> Result<SourceLayer, E>,
        E: From<OverlayError>,
    {
        let state = inputs.iter().try_fold(self.start(), |state, input| {
            if !input.path.exists() {
                return Err(E::from(OverlayError::MissingInputFile(input.path.clone())));
            }
            info!(path = %input.path.display(), code = %input.source_code, "Processing layer");
            let layer = load(input)?;
            self.ingest(state, layer).map_err(E::from)
        })?;
        self.finish(state).map_err(E::from)
    }

    /// Adds one layer to the accumulated base.
    pub fn ingest(
        &self,
        mut state: OverlayState,
        source: SourceLayer,
    ) -> Result<OverlayState, OverlayError> {
        let code = source.source_code;
        state.advance(OverlayStage::Loaded);

        let polygons = remove_self_overlaps(self.ops, source.polygons).map_err(|e| {
            OverlayError::Geometry {
                stage: OverlayStage::Deduped,
                source_code: code.clone(),
                source: e,
            }
        })?;
        state.advance(OverlayStage::Deduped);

        let mut working: Layer = polygons
            .into_iter()
            .map(|polygon| Feature::new(0, polygon, code.as_str()))
            .collect();
        state.ids.assign(working.features_mut());
        state.advance(OverlayStage::Sourced);
        state.stats.layers += 1;

        let Some(base) = state.base.take() else {
            info!(code = %code, features = working.len(), "Layer becomes base");
            state.base = Some(working);
            return Ok(state);
        };

        let (clipped, mut base) = self.difference_with_repair(&working, base, &mut state, &code)?;
        state.advance(OverlayStage::Differenced);

        let mut working: Layer = clipped
            .into_iter()
            .flat_map(|(feature, geometry)| {
                self.ops
                    .explode(geometry)
                    .into_iter()
                    .map(move |part| feature.with_geometry(part))
                    .collect::<Vec<_>>()
            })
            .collect();
        state.ids.assign(working.features_mut());
        state.advance(OverlayStage::Singlepart);

        let classified = self.settings.classifier.classify(self.ops, &mut working);
        state.advance(OverlayStage::Classified);

        let (mut working, eliminated) =
            self.merger
                .merge(self.ops, working)
                .map_err(|e| OverlayError::Geometry {
                    stage: OverlayStage::Eliminated,
                    source_code: code.clone(),
                    source: e,
                })?;
        state.ids.assign(working.features_mut());
        state.stats.slivers_merged += eliminated.merged;
        state.advance(OverlayStage::Eliminated);

        info!(
            code = %code,
            added = working.len(),
            slivers = classified.slivers,
            low_area = classified.low_area,
            merged = eliminated.merged,
            unresolved = eliminated.unresolved,
            "Layer clipped against base"
        );

        base.extend(working);
        state.base = Some(base);
        state.advance(OverlayStage::Merged);
        Ok(state)
    }

    /// Final classification, hard delete of remaining slivers and
    /// renumbering from 1.
    pub fn finish(&self, mut state: OverlayState) -> Result<OverlayOutput, OverlayError> {
        let mut base = state.base.take().unwrap_or_default();

        let summary = self.settings.classifier.classify(self.ops, &mut base);
        state.advance(OverlayStage::FinalClassified);

        let before = base.len();
        let mut layer: Layer = base.into_features().into_iter().filter(|f| !f.eliminate).collect();
        state.stats.deleted = before - layer.len();
        state.advance(OverlayStage::FinalClean);

        IdSequence::new().assign(layer.features_mut());
        state.advance(OverlayStage::Done);

        info!(
            before,
            deleted = state.stats.deleted,
            after = layer.len(),
            slivers = summary.slivers,
            low_area = summary.low_area,
            "Overlay complete"
        );
        Ok(OverlayOutput {
            layer,
            stats: state.stats,
        })
    }

    /// Clips `working` against `base`, repairing the base and retrying once
    /// if the first attempt fails.
    ///
    /// Returns the clipped features and the base to carry forward, which is
    /// the repaired base when a repair happened.
    fn difference_with_repair(
        &self,
        working: &Layer,
        base: Layer,
        state: &mut OverlayState,
        code: &str,
    ) -> Result<(Vec<(Feature, MultiPolygon)>, Layer), OverlayError> {
        let first = match difference_layer(self.ops, working, &base) {
            Ok(clipped) => return Ok((clipped, base)),
            Err(e) => e,
        };
        warn!(code = %code, error = %first, "Difference failed, checking validity on base");

        let repaired = self.repair_base(base, &mut state.ids).map_err(|e| {
            OverlayError::GeometryOperationFailure {
                source_code: code.to_string(),
                source: e,
            }
        })?;
        state.stats.repairs += 1;

        match difference_layer(self.ops, working, &repaired) {
            Ok(clipped) => Ok((clipped, repaired)),
            Err(second) => Err(OverlayError::GeometryOperationFailure {
                source_code: code.to_string(),
                source: second,
            }),
        }
    }

    /// Repairs invalid base features, then contracts every base feature by
    /// the repair buffer distance.
    fn repair_base(&self, base: Layer, ids: &mut IdSequence) -> Result<Layer, GeometryError> {
        let mut invalid = 0usize;
        let mut repaired = Vec::with_capacity(base.len());

        for feature in base.into_features() {
            let geometry = if self.ops.is_valid(&feature.geometry) {
                MultiPolygon::new(vec![feature.geometry.clone()])
            } else {
                invalid += 1;
                self.ops
                    .repair(&MultiPolygon::new(vec![feature.geometry.clone()]))?
            };

            for part in self.ops.explode(geometry) {
                let contracted = self.ops.contract(&part, self.settings.repair_buffer)?;
                repaired.extend(
                    self.ops
                        .explode(contracted)
                        .into_iter()
                        .filter(|p| self.ops.area(p) > 0.0)
                        .map(|p| feature.with_geometry(p)),
                );
            }
        }

        warn!(
            invalid,
            features = repaired.len(),
            distance = self.settings.repair_buffer,
            "Repaired base"
        );
        let mut layer = Layer::new(repaired);
        ids.assign(layer.features_mut());
        Ok(layer)
    }
}

/// Subtracts the base from every working feature.
///
/// Base candidates are found through an R-tree over their bounding boxes
/// and subtracted in base order.
fn difference_layer<G: GeometryOps + ?Sized>(
    ops: &G,
    working: &Layer,
    base: &Layer,
) -> Result<Vec<(Feature, MultiPolygon)>, GeometryError> {
    let envelopes: Vec<IndexedEnvelope> = base
        .features()
        .iter()
        .enumerate()
        .filter_map(|(idx, f)| ops.bounding_box(&f.geometry).map(|r| IndexedEnvelope::new(idx, r)))
        .collect();
    let tree = RTree::bulk_load(envelopes);

    let mut out = Vec::with_capacity(working.len());
    for feature in working.features() {
        let mut remainder = MultiPolygon::new(vec![feature.geometry.clone()]);

        if let Some(rect) = ops.bounding_box(&feature.geometry) {
            let mut candidates: Vec<usize> = tree
                .locate_in_envelope_intersecting(&envelope_of(rect))
                .map(|entry| entry.idx)
                .collect();
            candidates.sort_unstable();

            for idx in candidates {
                if remainder.0.is_empty() {
                    break;
                }
                let clip = MultiPolygon::new(vec![base.features()[idx].geometry.clone()]);
                remainder = ops.difference(&remainder, &clip)?;
            }
        }

        out.push((feature.clone(), remainder));
    }
    Ok(out)
}
