//! Input sanitising ahead of the overlay.

use std::fmt;
use std::str::FromStr;

use geo::{Geometry, MultiPolygon, Polygon};
use tracing::debug;

use crate::feature::{check_polygon, Defect, GeometryTally};
use crate::geometry::GeometryOps;

/// Default minimum part area kept by the strict variant.
pub const DEFAULT_STRICT_MIN_AREA: f64 = 2023.0;

/// Topology-cleaning variant applied to input layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleaningVariant {
    /// Invalid input parts are dropped.
    #[default]
    Lenient,
    /// Invalid input parts are repaired, and parts below the strict minimum
    /// area are removed.
    Strict,
}

impl CleaningVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for CleaningVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleaningVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown cleaning variant '{other}'")),
        }
    }
}

/// Turns raw input geometries into single-part polygons fit for the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputCleaner {
    pub variant: CleaningVariant,
    pub strict_min_area: f64,
}

impl InputCleaner {
    pub fn new(variant: CleaningVariant, strict_min_area: f64) -> Self {
        Self {
            variant,
            strict_min_area,
        }
    }

    /// Sanitises one layer's geometries, recording every drop in `tally`.
    ///
    /// Missing geometries count as `none_geometry`; non-areal geometries and
    /// parts failing the validity predicate count as `invalid_geometry`.
    pub fn clean<G, I>(&self, ops: &G, geometries: I, tally: &mut GeometryTally) -> Vec<Polygon>
    where
        G: GeometryOps + ?Sized,
        I: IntoIterator<Item = Option<Geometry>>,
    {
        let mut out = Vec::new();

        for geometry in geometries {
            let parts = match geometry {
                None => {
                    tally.none_geometry += 1;
                    continue;
                }
                Some(Geometry::Polygon(p)) => vec![p],
                Some(Geometry::MultiPolygon(mp)) => ops.explode(mp),
                Some(Geometry::Rect(r)) => vec![r.to_polygon()],
                Some(Geometry::Triangle(t)) => vec![t.to_polygon()],
                Some(_) => {
                    tally.invalid_geometry += 1;
                    continue;
                }
            };

            for part in parts {
                for polygon in self.sanitise(ops, part, tally) {
                    if self.variant == CleaningVariant::Strict
                        && ops.area(&polygon) < self.strict_min_area
                    {
                        tally.small_area += 1;
                        continue;
                    }
                    out.push(polygon);
                }
            }
        }

        debug!(variant = %self.variant, kept = out.len(), dropped = %tally, "Cleaned input");
        out
    }

    fn sanitise<G: GeometryOps + ?Sized>(
        &self,
        ops: &G,
        polygon: Polygon,
        tally: &mut GeometryTally,
    ) -> Vec<Polygon> {
        match check_polygon(ops, &polygon) {
            Ok(()) => vec![polygon],
            Err(Defect::ZeroArea) => {
                tally.zero_area += 1;
                Vec::new()
            }
            Err(Defect::Invalid) if self.variant == CleaningVariant::Strict => {
                let repaired = ops
                    .repair(&MultiPolygon::new(vec![polygon]))
                    .map(|mp| ops.explode(mp))
                    .unwrap_or_default();
                let kept: Vec<Polygon> = repaired
                    .into_iter()
                    .filter(|p| check_polygon(ops, p).is_ok())
                    .collect();
                if kept.is_empty() {
                    tally.invalid_geometry += 1;
                }
                kept
            }
            Err(Defect::Invalid) => {
                tally.invalid_geometry += 1;
                Vec::new()
            }
        }
    }
}

impl Default for InputCleaner {
    fn default() -> Self {
        Self::new(CleaningVariant::Lenient, DEFAULT_STRICT_MIN_AREA)
    }
}
