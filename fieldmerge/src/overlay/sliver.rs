//! Sliver detection.
//!
//! A feature is flagged for elimination when its Polsby-Popper compactness
//! (`4π·area / perimeter²`) is below the ratio threshold, or when its area is
//! below the minimum area. Classification is a pure function of geometry.

use std::f64::consts::PI;

use tracing::debug;

use crate::feature::Layer;
use crate::geometry::GeometryOps;

/// Default compactness threshold.
pub const DEFAULT_RATIO_THRESHOLD: f64 = 0.05;

/// Default minimum area in square map units (about half an acre).
pub const DEFAULT_MIN_AREA: f64 = 2025.0;

/// Polsby-Popper score: 1.0 for a circle, approaching 0 for a sliver.
///
/// A zero perimeter (degenerate geometry) scores 0.
pub fn compactness(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * PI * area / (perimeter * perimeter)
}

/// Outcome counts of one classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifySummary {
    /// Flagged for low compactness.
    pub slivers: usize,
    /// Flagged for low area only.
    pub low_area: usize,
    pub keep: usize,
}

/// Flags features that are slivers or too small to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliverClassifier {
    pub ratio_threshold: f64,
    pub min_area: f64,
}

impl Default for SliverClassifier {
    fn default() -> Self {
        Self {
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
            min_area: DEFAULT_MIN_AREA,
        }
    }
}

impl SliverClassifier {
    pub fn new(ratio_threshold: f64, min_area: f64) -> Self {
        Self {
            ratio_threshold,
            min_area,
        }
    }

    /// Whether a feature with these metrics must be eliminated.
    pub fn should_eliminate(&self, sliver_ratio: f64, area: f64) -> bool {
        sliver_ratio < self.ratio_threshold || area < self.min_area
    }

    /// Sets `area`, `sliver_ratio` and `eliminate` on every feature.
    pub fn classify<G: GeometryOps + ?Sized>(&self, ops: &G, layer: &mut Layer) -> ClassifySummary {
        let mut summary = ClassifySummary::default();

        for feature in layer.features_mut() {
            let area = ops.area(&feature.geometry);
            let ratio = compactness(area, ops.perimeter(&feature.geometry));
            feature.area = area;
            feature.sliver_ratio = ratio;
            feature.eliminate = self.should_eliminate(ratio, area);

            if ratio < self.ratio_threshold {
                summary.slivers += 1;
            } else if area < self.min_area {
                summary.low_area += 1;
            } else {
                summary.keep += 1;
            }
        }

        debug!(
            slivers = summary.slivers,
            low_area = summary.low_area,
            keep = summary.keep,
            "Classified features"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::geometry::GeoOps;
    use geo::{polygon, Polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    #[test]
    fn test_compactness_of_square() {
        // 4π·100 / 40² = π/4
        let score = compactness(100.0, 40.0);
        assert!((score - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_compactness_zero_perimeter() {
        assert_eq!(compactness(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_thin_strip_is_sliver() {
        let ops = GeoOps::default();
        let mut layer = Layer::new(vec![Feature::new(1, rect(0.0, 0.0, 1.0, 100.0), "A")]);

        let summary = SliverClassifier::default().classify(&ops, &mut layer);

        let f = &layer.features()[0];
        assert!(f.sliver_ratio < 0.05, "ratio = {}", f.sliver_ratio);
        assert!(f.eliminate);
        assert_eq!(summary.slivers, 1);
    }

    #[test]
    fn test_small_compact_polygon_is_low_area() {
        let ops = GeoOps::default();
        let mut layer = Layer::new(vec![Feature::new(1, rect(0.0, 0.0, 40.0, 40.0), "A")]);

        let summary = SliverClassifier::default().classify(&ops, &mut layer);

        assert!(layer.features()[0].eliminate);
        assert_eq!(summary.low_area, 1);
        assert_eq!(summary.slivers, 0);
    }

    #[test]
    fn test_large_compact_polygon_is_kept() {
        let ops = GeoOps::default();
        let mut layer = Layer::new(vec![Feature::new(1, rect(0.0, 0.0, 90.0, 100.0), "A")]);

        let summary = SliverClassifier::default().classify(&ops, &mut layer);

        let f = &layer.features()[0];
        assert!(!f.eliminate);
        assert!((f.area - 9000.0).abs() < 1e-9);
        assert_eq!(summary.keep, 1);
    }

    #[test]
    fn test_area_exactly_at_threshold_is_kept() {
        let classifier = SliverClassifier::default();
        assert!(!classifier.should_eliminate(0.5, DEFAULT_MIN_AREA));
        assert!(classifier.should_eliminate(0.5, DEFAULT_MIN_AREA - 0.001));
    }

    #[test]
    fn test_classification_is_repeatable() {
        let ops = GeoOps::default();
        let mut layer = Layer::new(vec![
            Feature::new(1, rect(0.0, 0.0, 1.0, 100.0), "A"),
            Feature::new(2, rect(0.0, 0.0, 60.0, 60.0), "A"),
        ]);
        let classifier = SliverClassifier::default();

        classifier.classify(&ops, &mut layer);
        let first = layer.clone();
        classifier.classify(&ops, &mut layer);

        assert_eq!(first, layer);
    }
}
