//! Vector dataset collaborator.
//!
//! The pipeline reads input layers and tile boundaries, and writes region and
//! partition datasets, through the [`VectorStore`] trait. [`GeoJsonStore`] is
//! the default implementation.

mod geojson_store;

pub use geojson_store::GeoJsonStore;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use geo::{Geometry, Polygon};
use serde_json::Value;
use thiserror::Error;

use crate::crs::CrsError;
use crate::feature::Feature;

/// Output attribute holding the feature identifier.
pub const FIELD_ID: &str = "id";

/// Output attribute holding the provenance code.
pub const FIELD_SOURCE_CODE: &str = "SOURCECODE";

/// Output attribute holding the tile identifier.
pub const FIELD_MGRS_TILE: &str = "MGRS_TILE";

/// Errors reading or writing vector datasets.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{}: {source}", path.display())]
    Crs {
        path: PathBuf,
        #[source]
        source: CrsError,
    },
}

/// One feature as read from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    /// `None` when the feature has a null geometry.
    pub geometry: Option<Geometry>,
    pub properties: BTreeMap<String, Value>,
}

impl RawFeature {
    /// Property as text. Numbers are rendered, null and missing are `None`.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Dataset contents: CRS metadata, attribute schema and features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLayer {
    /// Declared CRS name, if the dataset carries one.
    pub crs: Option<String>,
    /// Attribute names present on any feature, sorted.
    pub fields: Vec<String>,
    pub features: Vec<RawFeature>,
}

impl RawLayer {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}

/// One feature as written to an output dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub id: u64,
    pub geometry: Polygon,
    pub source_code: String,
    pub mgrs_tile: Option<String>,
}

impl From<&Feature> for OutputRecord {
    fn from(feature: &Feature) -> Self {
        Self {
            id: feature.id,
            geometry: feature.geometry.clone(),
            source_code: feature.source_code.clone(),
            mgrs_tile: feature.mgrs_tile.clone(),
        }
    }
}

/// Reads and writes geometry-plus-attribute datasets.
pub trait VectorStore: Send + Sync {
    /// Opens a dataset.
    ///
    /// Fails with [`StoreError::NotFound`] if `path` does not exist and with
    /// [`StoreError::Crs`] if it declares a CRS other than the working
    /// projection.
    fn read(&self, path: &Path) -> Result<RawLayer, StoreError>;

    /// Writes `records` as a new dataset, replacing any existing file.
    ///
    /// A file left incomplete by a failed write is removed.
    fn write(&self, path: &Path, records: &[OutputRecord]) -> Result<(), StoreError>;
}
