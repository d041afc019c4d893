//! Merge command - concatenate tile partitions with fresh ids.

use std::path::{Path, PathBuf};

use fieldmerge::geometry::GeoOps;
use fieldmerge::merge::merge_partitions;
use fieldmerge::store::GeoJsonStore;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the merge command.
pub fn run(
    config: Option<PathBuf>,
    verbose: bool,
    inputs: &[PathBuf],
    output: &Path,
) -> Result<(), CliError> {
    let runner = CliRunner::new(config, verbose)?;
    runner.log_startup("merge");

    let summary = merge_partitions(&GeoJsonStore::new(), &GeoOps::default(), inputs, output)?;

    println!(
        "Merged {} features from {} partitions into {}",
        summary.written,
        summary.files,
        output.display()
    );
    if summary.tally.dropped() > 0 {
        println!("Dropped: {}", summary.tally);
    }
    Ok(())
}
