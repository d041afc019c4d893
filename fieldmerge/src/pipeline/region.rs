//! Processing of one region: discover, overlay, tile, write.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, info_span, warn};

use super::error_log::ErrorLog;
use super::inputs::{discover_inputs, DATASET_EXTENSION};
use super::RegionError;
use crate::config::ConfigFile;
use crate::feature::{retain_valid, GeometryTally, Layer};
use crate::geometry::{GeoOps, GeometryOps};
use crate::overlay::{
    CleaningVariant, IdSequence, InputCleaner, OverlayEngine, OverlaySettings, OverlayStats,
    SourceLayer,
};
use crate::priority::PriorityTable;
use crate::store::{GeoJsonStore, OutputRecord, VectorStore};
use crate::tiles::{write_partitions, SpatialTileIndex, TileSplitter};

/// Locations and thresholds shared by every region of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub overlay: OverlaySettings,
    pub strict_min_area: f64,
}

impl PipelineSettings {
    pub fn from_config(config: &ConfigFile) -> Self {
        Self {
            input_dir: config.paths.input_dir.clone(),
            output_dir: config.paths.output_dir.clone(),
            overlay: config.overlay_settings(),
            strict_min_area: config.cleaning.strict_min_area,
        }
    }
}

/// Read-only state shared by all region workers.
pub struct PipelineContext {
    settings: PipelineSettings,
    priority: PriorityTable,
    tiles: SpatialTileIndex,
    ops: Box<dyn GeometryOps>,
    store: Box<dyn VectorStore>,
    error_log: Option<ErrorLog>,
}

impl PipelineContext {
    /// Context using the `geo` backend and GeoJSON datasets.
    pub fn new(settings: PipelineSettings, priority: PriorityTable, tiles: SpatialTileIndex) -> Self {
        Self {
            settings,
            priority,
            tiles,
            ops: Box::new(GeoOps::default()),
            store: Box::new(GeoJsonStore::new()),
            error_log: None,
        }
    }

    pub fn with_ops(mut self, ops: impl GeometryOps + 'static) -> Self {
        self.ops = Box::new(ops);
        self
    }

    pub fn with_store(mut self, store: impl VectorStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_error_log(mut self, error_log: ErrorLog) -> Self {
        self.error_log = Some(error_log);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn error_log(&self) -> Option<&ErrorLog> {
        self.error_log.as_ref()
    }

    /// Completed region dataset, `<output>/<region>.geojson`.
    pub fn region_output_path(&self, region: &str) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("{region}.{DATASET_EXTENSION}"))
    }

    /// Directory receiving the region's tile partitions.
    pub fn partition_dir(&self, region: &str) -> PathBuf {
        self.settings.output_dir.join(region)
    }

    fn log_failure(&self, region: &str, variant: CleaningVariant, error: &RegionError) {
        if let Some(log) = &self.error_log {
            if let Err(e) = log.append(region, variant, error) {
                warn!(path = %log.path().display(), error = %e, "Failed to write error log");
            }
        }
    }
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionJob {
    pub region: String,
    pub variant: CleaningVariant,
    /// Reprocess even if the region's output already exists.
    pub overwrite: bool,
}

impl RegionJob {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            variant: CleaningVariant::Lenient,
            overwrite: false,
        }
    }

    pub fn with_variant(mut self, variant: CleaningVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Counts from a completed region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub region: String,
    pub variant: CleaningVariant,
    pub layers: usize,
    /// Features in the region dataset.
    pub features: usize,
    pub partitions: usize,
    /// Features without a tile, written to the region dataset only.
    pub unassigned: usize,
    pub tally: GeometryTally,
    pub overlay: OverlayStats,
    pub output: PathBuf,
}

impl fmt::Display for RegionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} features from {} layers, {} partitions, {} unassigned, dropped {}",
            self.region,
            self.variant,
            self.features,
            self.layers,
            self.partitions,
            self.unassigned,
            self.tally
        )
    }
}

/// Result of a region run that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome {
    Completed(RegionSummary),
    /// Output already present and overwrite not requested.
    Skipped { region: String, output: PathBuf },
}

/// Runs the full pipeline for one region.
///
/// The region dataset is written last and marks completion: while it
/// exists, later runs skip the region unless `overwrite` is set.
pub fn process_region(job: &RegionJob, ctx: &PipelineContext) -> Result<RegionOutcome, RegionError> {
    let span = info_span!("region", region = %job.region, variant = %job.variant);
    let _enter = span.enter();

    let output = ctx.region_output_path(&job.region);
    if output.exists() {
        if !job.overwrite {
            info!(output = %output.display(), "Output exists, skipping region");
            return Ok(RegionOutcome::Skipped {
                region: job.region.clone(),
                output,
            });
        }
        remove_file(&output)?;
    }

    let region_dir = ctx.settings.input_dir.join(&job.region);
    let inputs = discover_inputs(&region_dir)?;
    if inputs.is_empty() {
        return Err(RegionError::NoInputs(region_dir));
    }
    let inputs = ctx.priority.resolve(&job.region, inputs)?;
    info!(
        layers = inputs.len(),
        order = %inputs.iter().map(|i| i.source_code.as_str()).collect::<Vec<_>>().join(" > "),
        "Resolved priority order"
    );

    let ops = ctx.ops.as_ref();
    let cleaner = InputCleaner::new(job.variant, ctx.settings.strict_min_area);
    let engine = OverlayEngine::new(ops, ctx.settings.overlay);
    let mut tally = GeometryTally::default();

    let overlay = engine.run(&inputs, |input| -> Result<SourceLayer, RegionError> {
        let raw = ctx.store.read(&input.path)?;
        let polygons = cleaner.clean(
            ops,
            raw.features.into_iter().map(|f| f.geometry),
            &mut tally,
        );
        Ok(SourceLayer::new(input.source_code.clone(), polygons))
    })?;

    let mut layer = Layer::new(retain_valid(ops, overlay.layer.into_features(), &mut tally));
    IdSequence::new().assign(layer.features_mut());

    let assignment = ctx.tiles.assign(ops, &mut layer);
    let split = TileSplitter::new().split(&layer);

    let partition_dir = ctx.partition_dir(&job.region);
    if partition_dir.exists() {
        fs::remove_dir_all(&partition_dir).map_err(|e| RegionError::Io {
            path: partition_dir.clone(),
            source: e,
        })?;
    }
    let written = write_partitions(ctx.store.as_ref(), &partition_dir, &split.partitions)?;

    let records: Vec<OutputRecord> = layer.features().iter().map(OutputRecord::from).collect();
    ctx.store.write(&output, &records)?;

    let summary = RegionSummary {
        region: job.region.clone(),
        variant: job.variant,
        layers: inputs.len(),
        features: layer.len(),
        partitions: written.len(),
        unassigned: assignment.unassigned,
        tally,
        overlay: overlay.stats,
        output,
    };
    info!(
        features = summary.features,
        partitions = summary.partitions,
        unassigned = summary.unassigned,
        none_geometry = tally.none_geometry,
        invalid_geometry = tally.invalid_geometry,
        "Region complete"
    );
    Ok(RegionOutcome::Completed(summary))
}

/// Runs a region, retrying once with the strict variant if the lenient run
/// fails.
///
/// Every failed attempt is appended to the context's error log.
pub fn run_region_with_fallback(
    job: &RegionJob,
    ctx: &PipelineContext,
) -> Result<RegionOutcome, RegionError> {
    let error = match process_region(job, ctx) {
        Ok(outcome) => return Ok(outcome),
        Err(e) => e,
    };
    ctx.log_failure(&job.region, job.variant, &error);

    if job.variant == CleaningVariant::Strict {
        return Err(error);
    }
    warn!(region = %job.region, error = %error, "Lenient run failed, retrying with strict variant");

    let strict = job.clone().with_variant(CleaningVariant::Strict);
    process_region(&strict, ctx).inspect_err(|e| {
        ctx.log_failure(&strict.region, strict.variant, e);
    })
}

fn remove_file(path: &Path) -> Result<(), RegionError> {
    fs::remove_file(path).map_err(|e| RegionError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
