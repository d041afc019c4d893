//! Clean command - one region, lenient with strict fallback.

use std::path::PathBuf;

use fieldmerge::overlay::CleaningVariant;
use fieldmerge::pipeline::{run_region_with_fallback, RegionJob, RegionOutcome};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the clean command.
pub struct CleanArgs {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub region: String,
    pub strict: bool,
    pub overwrite: bool,
}

/// Run the clean command.
pub fn run(args: CleanArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config, args.verbose)?;
    runner.log_startup("clean");
    let ctx = runner.pipeline_context()?;

    let variant = if args.strict {
        CleaningVariant::Strict
    } else {
        CleaningVariant::Lenient
    };
    let job = RegionJob::new(args.region.as_str())
        .with_variant(variant)
        .with_overwrite(args.overwrite);

    match run_region_with_fallback(&job, &ctx) {
        Ok(RegionOutcome::Completed(summary)) => {
            println!("{}", summary);
            println!("Output: {}", summary.output.display());
            Ok(())
        }
        Ok(RegionOutcome::Skipped { region, output }) => {
            println!(
                "{}: output {} exists, skipped (use --overwrite to reprocess)",
                region,
                output.display()
            );
            Ok(())
        }
        Err(error) => {
            if let Some(log) = ctx.error_log() {
                println!("Failure logged to {}", log.path().display());
            }
            Err(CliError::Region {
                region: args.region,
                error,
            })
        }
    }
}
