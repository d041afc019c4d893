//! Coordinate reference system contract.
//!
//! All area, perimeter and distance computations assume North America Albers
//! Equal Area Conic (GRS80/NAD83, standard parallels 20°N and 60°N, central
//! meridian 96°W, latitude of origin 40°N). Map units are metres.

use thiserror::Error;

/// PROJ definition of the working projection.
pub const ALBERS_PROJ: &str = "+proj=aea +lat_1=20 +lat_2=60 +lat_0=40 +lon_0=-96 \
     +x_0=0 +y_0=0 +ellps=GRS80 +datum=NAD83 +units=m +no_defs";

/// Name written into output datasets.
pub const ALBERS_CRS_NAME: &str = "ESRI:102008";

/// Names under which the working projection is accepted on input.
const ACCEPTED_NAMES: &[&str] = &[
    "ESRI:102008",
    "EPSG:102008",
    "urn:ogc:def:crs:ESRI::102008",
    "urn:ogc:def:crs:EPSG::102008",
    "North_America_Albers_Equal_Area_Conic",
];

/// Input dataset is not in the working projection.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unsupported coordinate reference system '{0}', expected {ALBERS_CRS_NAME}")]
pub struct CrsError(pub String);

/// Checks a dataset's declared CRS name against the working projection.
///
/// Datasets without a declared CRS are assumed to already be projected.
pub fn check_crs(name: Option<&str>) -> Result<(), CrsError> {
    match name {
        None => Ok(()),
        Some(name) => {
            let trimmed = name.trim();
            if trimmed.is_empty()
                || ACCEPTED_NAMES
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(trimmed))
                || trimmed == ALBERS_PROJ
            {
                Ok(())
            } else {
                Err(CrsError(trimmed.to_string()))
            }
        }
    }
}
