//! Partition merge and geometry audit.
//!
//! [`merge_partitions`] concatenates tile partitions back into one dataset
//! with fresh global identifiers. [`check_geometry`] counts valid and
//! defective features in a dataset without changing it.

use std::fmt;
use std::path::{Path, PathBuf};

use geo::{Geometry, Polygon};
use thiserror::Error;
use tracing::{info, warn};

use crate::feature::{check_polygon, Defect, GeometryTally};
use crate::geometry::GeometryOps;
use crate::overlay::IdSequence;
use crate::store::{OutputRecord, RawFeature, StoreError, VectorStore, FIELD_MGRS_TILE, FIELD_SOURCE_CODE};

/// Partition merge errors.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A partition lacks a required attribute.
    #[error("Bad attribution: {} has no '{field}' attribute", path.display())]
    BadAttribution { path: PathBuf, field: String },

    #[error("No partitions to merge")]
    NoInputs,
}

/// Counts from a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub files: usize,
    pub written: usize,
    pub tally: GeometryTally,
}

/// Merges partition datasets into `output`.
///
/// Each kept feature gets a fresh identifier from 1 in input order and keeps
/// its `SOURCECODE`. Its tile comes from the `MGRS_TILE` attribute, or from
/// the partition's file name prefix when the attribute is null. Null,
/// invalid and zero-area geometries are dropped and tallied.
pub fn merge_partitions<S, G>(
    store: &S,
    ops: &G,
    files: &[PathBuf],
    output: &Path,
) -> Result<MergeSummary, MergeError>
where
    S: VectorStore + ?Sized,
    G: GeometryOps + ?Sized,
{
    if files.is_empty() {
        return Err(MergeError::NoInputs);
    }

    let mut ids = IdSequence::new();
    let mut tally = GeometryTally::default();
    let mut records = Vec::new();

    for path in files {
        let layer = store.read(path)?;
        if !layer.features.is_empty() && !layer.has_field(FIELD_SOURCE_CODE) {
            return Err(MergeError::BadAttribution {
                path: path.clone(),
                field: FIELD_SOURCE_CODE.to_string(),
            });
        }
        let fallback_tile = tile_from_file_name(path);

        for feature in &layer.features {
            let Some(source_code) = feature.property_str(FIELD_SOURCE_CODE) else {
                return Err(MergeError::BadAttribution {
                    path: path.clone(),
                    field: FIELD_SOURCE_CODE.to_string(),
                });
            };
            let mgrs_tile = feature
                .property_str(FIELD_MGRS_TILE)
                .or_else(|| fallback_tile.clone());

            for polygon in audited_polygons(ops, feature, &mut tally) {
                records.push(OutputRecord {
                    id: ids.next_id(),
                    geometry: polygon,
                    source_code: source_code.clone(),
                    mgrs_tile: mgrs_tile.clone(),
                });
            }
        }
    }

    store.write(output, &records)?;
    info!(
        output = %output.display(),
        files = files.len(),
        written = records.len(),
        dropped = %tally,
        "Merged partitions"
    );
    Ok(MergeSummary {
        files: files.len(),
        written: records.len(),
        tally,
    })
}

/// Geometry health of one dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryAudit {
    pub valid: usize,
    pub none_geometry: usize,
    pub invalid_geometry: usize,
    pub zero_area: usize,
}

impl GeometryAudit {
    pub fn total(&self) -> usize {
        self.valid + self.none_geometry + self.invalid_geometry + self.zero_area
    }

    pub fn is_clean(&self) -> bool {
        self.valid == self.total()
    }
}

impl fmt::Display for GeometryAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "valid {}, {} none, {} invalid, {} zero area, {} total",
            self.valid,
            self.none_geometry,
            self.invalid_geometry,
            self.zero_area,
            self.total()
        )
    }
}

/// Audits every feature of the dataset at `path`.
///
/// A feature counts as valid only if all of its polygon parts are.
pub fn check_geometry<S, G>(store: &S, ops: &G, path: &Path) -> Result<GeometryAudit, StoreError>
where
    S: VectorStore + ?Sized,
    G: GeometryOps + ?Sized,
{
    let layer = store.read(path)?;
    let mut audit = GeometryAudit::default();

    for feature in &layer.features {
        let parts = match &feature.geometry {
            None => {
                audit.none_geometry += 1;
                continue;
            }
            Some(geometry) => match polygon_parts(geometry) {
                Some(parts) => parts,
                None => {
                    audit.invalid_geometry += 1;
                    continue;
                }
            },
        };

        let defect = parts
            .iter()
            .filter_map(|p| check_polygon(ops, p).err())
            .min_by_key(|d| match d {
                Defect::Invalid => 0,
                Defect::ZeroArea => 1,
            });
        match defect {
            None if !parts.is_empty() => audit.valid += 1,
            None | Some(Defect::ZeroArea) => audit.zero_area += 1,
            Some(Defect::Invalid) => audit.invalid_geometry += 1,
        }
    }

    info!(path = %path.display(), audit = %audit, "Checked geometry");
    Ok(audit)
}

fn audited_polygons<G: GeometryOps + ?Sized>(
    ops: &G,
    feature: &RawFeature,
    tally: &mut GeometryTally,
) -> Vec<Polygon> {
    let Some(geometry) = &feature.geometry else {
        tally.none_geometry += 1;
        return Vec::new();
    };
    let Some(parts) = polygon_parts(geometry) else {
        tally.invalid_geometry += 1;
        return Vec::new();
    };

    parts
        .into_iter()
        .filter(|polygon| match check_polygon(ops, polygon) {
            Ok(()) => true,
            Err(Defect::Invalid) => {
                tally.invalid_geometry += 1;
                false
            }
            Err(Defect::ZeroArea) => {
                warn!("Zero-area polygon in partition");
                tally.zero_area += 1;
                false
            }
        })
        .collect()
}

fn polygon_parts(geometry: &Geometry) -> Option<Vec<Polygon>> {
    match geometry {
        Geometry::Polygon(p) => Some(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => Some(mp.0.clone()),
        _ => None,
    }
}

/// Tile prefix of a partition file name, `<tile>_<code>.geojson`.
fn tile_from_file_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let tile = stem.split('_').next()?.trim();
    (!tile.is_empty()).then(|| tile.to_string())
}
