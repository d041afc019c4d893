//! Integration tests for the region pipeline.
//!
//! These tests run whole regions against GeoJSON datasets on disk:
//! - Discovery → priority → overlay → tiles → partitions → region dataset
//! - Idempotent reruns and overwrite
//! - Lenient → strict fallback and the error log
//! - Parallel batches with a failing region
//! - Merging the written partitions back and auditing them
//!
//! Run with: `cargo test --test region_pipeline_integration`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use geo::{MultiPolygon, Point, Polygon, Rect};
use tempfile::TempDir;

use fieldmerge::geometry::{GeoOps, GeometryError, GeometryOps};
use fieldmerge::merge::{check_geometry, merge_partitions};
use fieldmerge::overlay::{CleaningVariant, OverlaySettings};
use fieldmerge::pipeline::{
    process_region, run_batch, run_region_with_fallback, ErrorLog, PipelineContext,
    PipelineSettings, RegionError, RegionJob, RegionOutcome,
};
use fieldmerge::priority::{PriorityError, PriorityTable};
use fieldmerge::store::{GeoJsonStore, OutputRecord, RawLayer, StoreError, VectorStore};
use fieldmerge::tiles::{SpatialTileIndex, DEFAULT_TILE_ID_FIELD};

// ============================================================================
// Test Helpers
// ============================================================================

/// GeoJSON polygon feature for an axis-aligned rectangle.
fn rect_feature(x0: f64, y0: f64, x1: f64, y1: f64, properties: &str) -> String {
    format!(
        r#"{{"type":"Feature","properties":{properties},"geometry":{{"type":"Polygon","coordinates":[[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}}}}"#
    )
}

fn write_collection(path: &Path, features: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        path,
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        ),
    )
    .unwrap();
}

/// Workspace with an input region `TX` of two overlapping layers and a tile
/// dataset of two side-by-side tiles.
struct Fixture {
    _temp: TempDir,
    input_dir: PathBuf,
    output_dir: PathBuf,
    tiles_path: PathBuf,
    error_log: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let input_dir = temp.path().join("input");
        let output_dir = temp.path().join("output");
        let tiles_path = temp.path().join("tiles.geojson");
        let error_log = temp.path().join("errors.log");

        // CLU outranks NLCD in TX; NLCD overlaps the right half of CLU.
        write_collection(
            &input_dir.join("TX").join("tx_clu.geojson"),
            &[rect_feature(0.0, 0.0, 100.0, 100.0, "{}")],
        );
        write_collection(
            &input_dir.join("TX").join("tx_nlcd.geojson"),
            &[rect_feature(50.0, 0.0, 200.0, 100.0, "{}")],
        );

        write_collection(
            &tiles_path,
            &[
                rect_feature(0.0, 0.0, 100.0, 100.0, r#"{"MGRS_TILE":"14RPV"}"#),
                rect_feature(100.0, 0.0, 200.0, 100.0, r#"{"MGRS_TILE":"14RQV"}"#),
            ],
        );

        Self {
            _temp: temp,
            input_dir,
            output_dir,
            tiles_path,
            error_log,
        }
    }

    fn add_layer(&self, region: &str, file: &str, features: &[String]) {
        write_collection(&self.input_dir.join(region).join(file), features);
    }

    fn context(&self) -> PipelineContext {
        let mut priority = PriorityTable::new();
        priority.set("TX", vec!["CLU".to_string(), "NLCD".to_string()]);
        priority.set("NM", vec!["CLU".to_string()]);

        let layer = GeoJsonStore::new().read(&self.tiles_path).unwrap();
        let tiles = SpatialTileIndex::from_layer(layer, DEFAULT_TILE_ID_FIELD).unwrap();

        let settings = PipelineSettings {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            overlay: OverlaySettings::default(),
            strict_min_area: 2023.0,
        };
        PipelineContext::new(settings, priority, tiles)
            .with_error_log(ErrorLog::open(&self.error_log).unwrap())
    }

    fn error_log_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.error_log)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Geometry backend whose first `failures` differences abort.
struct FailingDifferenceOps {
    inner: GeoOps,
    failures: usize,
    calls: AtomicUsize,
}

impl FailingDifferenceOps {
    fn new(failures: usize) -> Self {
        Self {
            inner: GeoOps::default(),
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

impl GeometryOps for FailingDifferenceOps {
    fn union(&self, a: &MultiPolygon, b: &MultiPolygon) -> Result<MultiPolygon, GeometryError> {
        self.inner.union(a, b)
    }
    fn intersection(
        &self,
        a: &MultiPolygon,
        b: &MultiPolygon,
    ) -> Result<MultiPolygon, GeometryError> {
        self.inner.intersection(a, b)
    }
    fn difference(
        &self,
        a: &MultiPolygon,
        b: &MultiPolygon,
    ) -> Result<MultiPolygon, GeometryError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(GeometryError::Aborted {
                operation: "difference",
            });
        }
        self.inner.difference(a, b)
    }
    fn is_valid(&self, polygon: &Polygon) -> bool {
        self.inner.is_valid(polygon)
    }
    fn repair(&self, geometry: &MultiPolygon) -> Result<MultiPolygon, GeometryError> {
        self.inner.repair(geometry)
    }
    fn contract(&self, polygon: &Polygon, distance: f64) -> Result<MultiPolygon, GeometryError> {
        self.inner.contract(polygon, distance)
    }
    fn area(&self, polygon: &Polygon) -> f64 {
        self.inner.area(polygon)
    }
    fn perimeter(&self, polygon: &Polygon) -> f64 {
        self.inner.perimeter(polygon)
    }
    fn centroid(&self, polygon: &Polygon) -> Option<Point> {
        self.inner.centroid(polygon)
    }
    fn bounding_box(&self, polygon: &Polygon) -> Option<Rect> {
        self.inner.bounding_box(polygon)
    }
    fn shared_boundary_length(&self, a: &Polygon, b: &Polygon) -> f64 {
        self.inner.shared_boundary_length(a, b)
    }
}

/// Store that reads GeoJSON but refuses every write.
struct ReadOnlyStore;

impl VectorStore for ReadOnlyStore {
    fn read(&self, path: &Path) -> Result<RawLayer, StoreError> {
        GeoJsonStore::new().read(path)
    }

    fn write(&self, path: &Path, _records: &[OutputRecord]) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

fn property(path: &Path, index: usize, key: &str) -> Option<String> {
    let layer = GeoJsonStore::new().read(path).unwrap();
    layer.features[index].property_str(key)
}

// ============================================================================
// Single region
// ============================================================================

#[test]
fn test_region_writes_dataset_and_partitions() {
    let fixture = Fixture::new();
    let ctx = fixture.context();

    let outcome = process_region(&RegionJob::new("TX"), &ctx).unwrap();

    let RegionOutcome::Completed(summary) = outcome else {
        panic!("expected a completed region");
    };
    assert_eq!(summary.layers, 2);
    assert_eq!(summary.features, 2);
    assert_eq!(summary.partitions, 2);
    assert_eq!(summary.unassigned, 0);
    assert_eq!(summary.variant, CleaningVariant::Lenient);

    let region_file = fixture.output_dir.join("TX.geojson");
    assert_eq!(summary.output, region_file);
    assert_eq!(GeoJsonStore::new().read(&region_file).unwrap().features.len(), 2);

    // highest priority keeps its full square, in the left tile
    assert_eq!(property(&region_file, 0, "SOURCECODE").as_deref(), Some("CLU"));
    assert_eq!(property(&region_file, 0, "MGRS_TILE").as_deref(), Some("14RPV"));
    assert_eq!(property(&region_file, 1, "SOURCECODE").as_deref(), Some("NLCD"));
    assert_eq!(property(&region_file, 1, "MGRS_TILE").as_deref(), Some("14RQV"));

    let partition_dir = fixture.output_dir.join("TX");
    assert!(partition_dir.join("14RPV_CLU.geojson").exists());
    assert!(partition_dir.join("14RQV_NLCD.geojson").exists());
    assert_eq!(
        property(&partition_dir.join("14RQV_NLCD.geojson"), 0, "id").as_deref(),
        Some("1")
    );
}

#[test]
fn test_completed_region_is_skipped() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    process_region(&RegionJob::new("TX"), &ctx).unwrap();

    let outcome = process_region(&RegionJob::new("TX"), &ctx).unwrap();

    assert!(matches!(outcome, RegionOutcome::Skipped { ref region, .. } if region == "TX"));
}

#[test]
fn test_overwrite_replaces_stale_partitions() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    process_region(&RegionJob::new("TX"), &ctx).unwrap();

    let stale = fixture.output_dir.join("TX").join("99XXX_OLD.geojson");
    fs::write(&stale, "{}").unwrap();

    let outcome = process_region(&RegionJob::new("TX").with_overwrite(true), &ctx).unwrap();

    assert!(matches!(outcome, RegionOutcome::Completed(_)));
    assert!(!stale.exists());
    assert!(fixture.output_dir.join("TX.geojson").exists());
}

#[test]
fn test_missing_priority_entry_is_logged_for_both_variants() {
    let fixture = Fixture::new();
    fixture.add_layer(
        "TX",
        "tx_gap.geojson",
        &[rect_feature(300.0, 0.0, 400.0, 100.0, "{}")],
    );
    let ctx = fixture.context();

    let err = run_region_with_fallback(&RegionJob::new("TX"), &ctx).unwrap_err();

    assert!(matches!(
        err,
        RegionError::Priority(PriorityError::MissingPriorityEntry { ref code, .. }) if code == "GAP"
    ));
    let lines = fixture.error_log_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "ERROR LOG");
    assert!(lines[1].starts_with("TX lenient "));
    assert!(lines[2].starts_with("TX strict "));
    assert!(lines[2].contains("GAP"));
    // no completion marker for a failed region
    assert!(!fixture.output_dir.join("TX.geojson").exists());
}

#[test]
fn test_strict_retry_completes_after_lenient_failure() {
    let fixture = Fixture::new();
    // the lenient difference and its repaired retry both abort
    let ctx = fixture.context().with_ops(FailingDifferenceOps::new(2));

    let outcome = run_region_with_fallback(&RegionJob::new("TX"), &ctx).unwrap();

    let RegionOutcome::Completed(summary) = outcome else {
        panic!("expected a completed region");
    };
    assert_eq!(summary.variant, CleaningVariant::Strict);
    assert_eq!(summary.features, 2);
    assert!(fixture.output_dir.join("TX.geojson").exists());

    let lines = fixture.error_log_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("TX lenient "), "{}", lines[1]);
    assert!(lines[1].contains("difference"));
}

#[test]
fn test_failed_partition_write_leaves_no_completion_marker() {
    let fixture = Fixture::new();
    let ctx = fixture.context().with_store(ReadOnlyStore);

    let err = process_region(&RegionJob::new("TX"), &ctx).unwrap_err();

    assert!(matches!(err, RegionError::Store(StoreError::Io { .. })));
    assert!(!fixture.output_dir.join("TX.geojson").exists());
    assert_eq!(ctx.settings().output_dir, fixture.output_dir);
    assert_eq!(
        ctx.error_log().map(|log| log.path().to_path_buf()),
        Some(fixture.error_log.clone())
    );
}

#[test]
fn test_strict_variant_drops_small_parts() {
    let fixture = Fixture::new();
    fixture.add_layer(
        "NM",
        "nm_clu.geojson",
        &[
            rect_feature(0.0, 0.0, 100.0, 100.0, "{}"),
            rect_feature(150.0, 0.0, 160.0, 10.0, "{}"),
        ],
    );
    let ctx = fixture.context();

    let job = RegionJob::new("NM").with_variant(CleaningVariant::Strict);
    let RegionOutcome::Completed(summary) = process_region(&job, &ctx).unwrap() else {
        panic!("expected a completed region");
    };

    assert_eq!(summary.features, 1);
    assert_eq!(summary.tally.small_area, 1);
}

// ============================================================================
// Batch
// ============================================================================

#[test]
fn test_batch_continues_past_failed_region() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let regions = vec!["TX".to_string(), "ZZ".to_string()];

    let report = run_batch(&regions, &ctx, false);

    assert_eq!(report.total(), 2);
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].region, "TX");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "ZZ");
    assert!(matches!(report.failed[0].1, RegionError::RegionNotFound(_)));
    assert!(!report.is_success());

    let rerun = run_batch(&regions[..1], &ctx, false);
    assert_eq!(rerun.skipped, vec!["TX".to_string()]);
}

// ============================================================================
// Merge and audit
// ============================================================================

#[test]
fn test_partitions_merge_back_into_clean_dataset() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    process_region(&RegionJob::new("TX"), &ctx).unwrap();

    let partition_dir = fixture.output_dir.join("TX");
    let mut files: Vec<PathBuf> = fs::read_dir(&partition_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    files.sort();
    let merged = fixture.output_dir.join("merged.geojson");

    let summary =
        merge_partitions(&GeoJsonStore::new(), &GeoOps::default(), &files, &merged).unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(summary.written, 2);
    assert_eq!(property(&merged, 1, "id").as_deref(), Some("2"));

    let audit = check_geometry(&GeoJsonStore::new(), &GeoOps::default(), &merged).unwrap();
    assert!(audit.is_clean());
    assert_eq!(audit.total(), 2);
}
