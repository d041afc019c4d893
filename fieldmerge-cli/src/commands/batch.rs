//! Batch command - every listed (or discovered) region in parallel.

use std::path::PathBuf;

use fieldmerge::pipeline::{list_regions, run_batch};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the batch command.
pub struct BatchArgs {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub regions: Vec<String>,
    pub overwrite: bool,
}

/// Run the batch command.
pub fn run(args: BatchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config, args.verbose)?;
    runner.log_startup("batch");
    let ctx = runner.pipeline_context()?;

    let regions = if args.regions.is_empty() {
        list_regions(&ctx.settings().input_dir).map_err(|e| CliError::Config(e.to_string()))?
    } else {
        args.regions
    };

    if regions.is_empty() {
        println!("No regions to process.");
        return Ok(());
    }

    println!("Processing {} regions...", regions.len());
    let report = run_batch(&regions, &ctx, args.overwrite);

    for summary in &report.completed {
        println!("  done     {}", summary);
    }
    for region in &report.skipped {
        println!("  skipped  {}", region);
    }
    for (region, error) in &report.failed {
        println!("  FAILED   {}: {}", region, error);
    }
    println!();
    println!(
        "{} completed, {} skipped, {} failed",
        report.completed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    if report.tally().dropped() > 0 {
        println!("Dropped geometries: {}", report.tally());
    }
    if let (false, Some(log)) = (report.is_success(), ctx.error_log()) {
        println!("Failures logged to {}", log.path().display());
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::BatchFailed {
            failed: report.failed.len(),
            total: report.total(),
        })
    }
}
