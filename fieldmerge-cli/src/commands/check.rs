//! Check command - geometry audit without modification.

use std::path::{Path, PathBuf};

use fieldmerge::geometry::GeoOps;
use fieldmerge::merge::check_geometry;
use fieldmerge::store::GeoJsonStore;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the check command.
pub fn run(config: Option<PathBuf>, verbose: bool, file: &Path) -> Result<(), CliError> {
    let runner = CliRunner::new(config, verbose)?;
    runner.log_startup("check");

    let audit = check_geometry(&GeoJsonStore::new(), &GeoOps::default(), file)?;

    println!("{}", file.display());
    println!("  valid:          {}", audit.valid);
    println!("  none geometry:  {}", audit.none_geometry);
    println!("  invalid:        {}", audit.invalid_geometry);
    println!("  zero area:      {}", audit.zero_area);
    println!("  total:          {}", audit.total());
    if audit.is_clean() {
        println!("All geometries valid.");
    }
    Ok(())
}
