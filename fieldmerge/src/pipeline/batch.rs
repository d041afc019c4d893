//! Parallel processing across regions.

use rayon::prelude::*;
use tracing::{error, info};

use super::region::{run_region_with_fallback, PipelineContext, RegionJob, RegionOutcome, RegionSummary};
use super::RegionError;
use crate::feature::GeometryTally;

/// Outcome of a batch run, in the order regions were given.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<RegionSummary>,
    pub skipped: Vec<String>,
    /// Regions that failed both variants, with the final error.
    pub failed: Vec<(String, RegionError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.skipped.len() + self.failed.len()
    }

    /// Dropped-geometry counts summed over completed regions.
    pub fn tally(&self) -> GeometryTally {
        let mut tally = GeometryTally::default();
        for summary in &self.completed {
            tally.absorb(summary.tally);
        }
        tally
    }
}

/// Processes `regions` concurrently.
///
/// Regions are independent: each owns its working data and writes to its
/// own output paths. A failing region is logged and does not stop the
/// others.
pub fn run_batch(regions: &[String], ctx: &PipelineContext, overwrite: bool) -> BatchReport {
    info!(regions = regions.len(), "Starting batch");

    let results: Vec<(String, Result<RegionOutcome, RegionError>)> = regions
        .par_iter()
        .map(|region| {
            let job = RegionJob::new(region.as_str()).with_overwrite(overwrite);
            (region.clone(), run_region_with_fallback(&job, ctx))
        })
        .collect();

    let mut report = BatchReport::default();
    for (region, result) in results {
        match result {
            Ok(RegionOutcome::Completed(summary)) => report.completed.push(summary),
            Ok(RegionOutcome::Skipped { region, .. }) => report.skipped.push(region),
            Err(e) => {
                error!(region = %region, error = %e, "Region failed");
                report.failed.push((region, e));
            }
        }
    }

    info!(
        completed = report.completed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        dropped = %report.tally(),
        "Batch complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{CleaningVariant, OverlayStats};
    use std::path::PathBuf;

    fn summary(region: &str, none_geometry: usize, small_area: usize) -> RegionSummary {
        RegionSummary {
            region: region.to_string(),
            variant: CleaningVariant::Lenient,
            layers: 1,
            features: 1,
            partitions: 1,
            unassigned: 0,
            tally: GeometryTally {
                none_geometry,
                small_area,
                ..GeometryTally::default()
            },
            overlay: OverlayStats::default(),
            output: PathBuf::from(format!("/out/{region}.geojson")),
        }
    }

    #[test]
    fn test_report_tally_sums_completed_regions() {
        let report = BatchReport {
            completed: vec![summary("TX", 2, 0), summary("MT", 1, 3)],
            skipped: vec!["NM".to_string()],
            failed: vec![(
                "ZZ".to_string(),
                RegionError::RegionNotFound(PathBuf::from("/in/ZZ")),
            )],
        };

        let tally = report.tally();

        assert_eq!(tally.none_geometry, 3);
        assert_eq!(tally.small_area, 3);
        assert_eq!(tally.dropped(), 6);
        assert_eq!(report.total(), 4);
        assert!(!report.is_success());
    }
}
