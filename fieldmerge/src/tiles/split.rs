//! Partitioning of the final layer by tile and source code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::feature::Layer;
use crate::overlay::IdSequence;
use crate::store::{OutputRecord, StoreError, VectorStore};

/// Features of one (tile, source code) pair, renumbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub tile: String,
    pub source_code: String,
    pub records: Vec<OutputRecord>,
}

impl Partition {
    /// Dataset file name, `<tile>_<code>.geojson`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.geojson", self.tile, self.source_code)
    }
}

/// Output of [`TileSplitter::split`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitResult {
    /// Partitions ordered by tile, then source code.
    pub partitions: Vec<Partition>,
    /// Features without a tile, excluded from every partition.
    pub unassigned: usize,
}

/// Groups tagged features into per-tile, per-source partitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileSplitter;

impl TileSplitter {
    pub fn new() -> Self {
        Self
    }

    pub fn split(&self, layer: &Layer) -> SplitResult {
        let mut groups: BTreeMap<(String, String), Vec<OutputRecord>> = BTreeMap::new();
        let mut unassigned = 0usize;

        for feature in layer.features() {
            let Some(tile) = &feature.mgrs_tile else {
                unassigned += 1;
                continue;
            };
            groups
                .entry((tile.clone(), feature.source_code.clone()))
                .or_default()
                .push(OutputRecord::from(feature));
        }

        let partitions = groups
            .into_iter()
            .map(|((tile, source_code), mut records)| {
                let mut ids = IdSequence::new();
                for record in &mut records {
                    record.id = ids.next_id();
                }
                Partition {
                    tile,
                    source_code,
                    records,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            partitions = partitions.len(),
            unassigned, "Split layer by tile and source"
        );
        SplitResult {
            partitions,
            unassigned,
        }
    }
}

/// Writes each non-empty partition to `dir`, returning the written paths.
pub fn write_partitions<S: VectorStore + ?Sized>(
    store: &S,
    dir: &Path,
    partitions: &[Partition],
) -> Result<Vec<PathBuf>, StoreError> {
    let mut written = Vec::with_capacity(partitions.len());
    for partition in partitions.iter().filter(|p| !p.records.is_empty()) {
        let path = dir.join(partition.file_name());
        store.write(&path, &partition.records)?;
        written.push(path);
    }
    info!(dir = %dir.display(), partitions = written.len(), "Wrote partitions");
    Ok(written)
}
