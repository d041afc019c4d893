//! Feature and layer data model.
//!
//! A [`Feature`] is a single-part polygon with its provenance attributes. A
//! [`Layer`] is an owned collection of features sharing the working
//! projection; each overlay step consumes one layer and returns a new one.

use std::fmt;

use geo::Polygon;

use crate::geometry::GeometryOps;

/// A single-part polygon with provenance and classification attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Sequential identifier, unique within one region's overlay run.
    pub id: u64,
    pub geometry: Polygon,
    /// Code of the dataset the feature originates from.
    pub source_code: String,
    /// Tile the feature was assigned to, if any.
    pub mgrs_tile: Option<String>,
    pub area: f64,
    /// Polsby-Popper compactness, set by the sliver classifier.
    pub sliver_ratio: f64,
    pub eliminate: bool,
}

impl Feature {
    /// Creates an unclassified, untiled feature.
    pub fn new(id: u64, geometry: Polygon, source_code: impl Into<String>) -> Self {
        Self {
            id,
            geometry,
            source_code: source_code.into(),
            mgrs_tile: None,
            area: 0.0,
            sliver_ratio: 0.0,
            eliminate: false,
        }
    }

    /// Same attributes, different geometry.
    pub fn with_geometry(&self, geometry: Polygon) -> Self {
        Self {
            geometry,
            ..self.clone()
        }
    }
}

/// An owned collection of features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    features: Vec<Feature>,
}

impl Layer {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut [Feature] {
        &mut self.features
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Appends another layer's features, taking ownership of them.
    pub fn extend(&mut self, other: Layer) {
        self.features.extend(other.features);
    }

    /// Total planar area of all features.
    pub fn total_area<G: GeometryOps + ?Sized>(&self, ops: &G) -> f64 {
        self.features.iter().map(|f| ops.area(&f.geometry)).sum()
    }
}

impl FromIterator<Feature> for Layer {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Counts of features dropped for defective geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryTally {
    pub none_geometry: usize,
    pub invalid_geometry: usize,
    pub zero_area: usize,
    /// Features removed before overlay because they were below the strict
    /// variant's minimum area.
    pub small_area: usize,
}

impl GeometryTally {
    pub fn dropped(&self) -> usize {
        self.none_geometry + self.invalid_geometry + self.zero_area + self.small_area
    }

    pub fn absorb(&mut self, other: GeometryTally) {
        self.none_geometry += other.none_geometry;
        self.invalid_geometry += other.invalid_geometry;
        self.zero_area += other.zero_area;
        self.small_area += other.small_area;
    }
}

impl fmt::Display for GeometryTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} none, {} invalid, {} zero area, {} small area",
            self.none_geometry, self.invalid_geometry, self.zero_area, self.small_area
        )
    }
}

/// Reason a geometry was rejected by [`check_polygon`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defect {
    Invalid,
    ZeroArea,
}

/// Validity gate applied before any feature is written.
pub fn check_polygon<G: GeometryOps + ?Sized>(ops: &G, polygon: &Polygon) -> Result<(), Defect> {
    if !ops.is_valid(polygon) {
        return Err(Defect::Invalid);
    }
    if ops.area(polygon) <= 0.0 {
        return Err(Defect::ZeroArea);
    }
    Ok(())
}

/// Drops defective features, recording each drop in `tally`.
pub fn retain_valid<G: GeometryOps + ?Sized>(
    ops: &G,
    features: Vec<Feature>,
    tally: &mut GeometryTally,
) -> Vec<Feature> {
    features
        .into_iter()
        .filter(|feature| match check_polygon(ops, &feature.geometry) {
            Ok(()) => true,
            Err(Defect::Invalid) => {
                tally.invalid_geometry += 1;
                false
            }
            Err(Defect::ZeroArea) => {
                tally.zero_area += 1;
                false
            }
        })
        .collect()
}
