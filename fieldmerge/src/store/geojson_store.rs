//! GeoJSON-backed [`VectorStore`].
//!
//! Output datasets are FeatureCollections carrying a named-CRS member for the
//! working projection:
//!
//! ```json
//! {
//!   "type": "FeatureCollection",
//!   "crs": { "type": "name", "properties": { "name": "ESRI:102008" } },
//!   "features": [ ... ]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::Geometry;
use geojson::{Feature as GeoJsonFeature, FeatureCollection, GeoJson, JsonObject};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    OutputRecord, RawFeature, RawLayer, StoreError, VectorStore, FIELD_ID, FIELD_MGRS_TILE,
    FIELD_SOURCE_CODE,
};
use crate::crs::{check_crs, ALBERS_CRS_NAME};

/// Reads and writes GeoJSON FeatureCollections.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonStore;

impl GeoJsonStore {
    pub fn new() -> Self {
        Self
    }
}

impl VectorStore for GeoJsonStore {
    fn read(&self, path: &Path) -> Result<RawLayer, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let parsed: GeoJson = text.parse().map_err(|e: geojson::Error| StoreError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let (crs, features) = match parsed {
            GeoJson::FeatureCollection(fc) => (crs_name(fc.foreign_members.as_ref()), fc.features),
            GeoJson::Feature(f) => (crs_name(f.foreign_members.as_ref()), vec![f]),
            GeoJson::Geometry(_) => {
                return Err(StoreError::Parse {
                    path: path.to_path_buf(),
                    reason: "expected a Feature or FeatureCollection".to_string(),
                })
            }
        };

        check_crs(crs.as_deref()).map_err(|e| StoreError::Crs {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut fields = BTreeSet::new();
        let mut raw = Vec::with_capacity(features.len());
        for feature in features {
            let properties: BTreeMap<String, Value> =
                feature.properties.unwrap_or_default().into_iter().collect();
            fields.extend(properties.keys().cloned());

            let geometry = match feature.geometry {
                None => None,
                Some(g) => match Geometry::<f64>::try_from(g) {
                    Ok(g) => Some(g),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Unreadable geometry, treating as null");
                        None
                    }
                },
            };
            raw.push(RawFeature {
                geometry,
                properties,
            });
        }

        debug!(path = %path.display(), features = raw.len(), "Read dataset");
        Ok(RawLayer {
            crs,
            fields: fields.into_iter().collect(),
            features: raw,
        })
    }

    fn write(&self, path: &Path, records: &[OutputRecord]) -> Result<(), StoreError> {
        let collection = FeatureCollection {
            bbox: None,
            features: records.iter().map(to_geojson_feature).collect(),
            foreign_members: Some(crs_member()),
        };

        let result = write_collection(path, &collection);
        if result.is_err() && path.exists() {
            // partial file
            let _ = fs::remove_file(path);
        }
        result?;

        debug!(path = %path.display(), features = records.len(), "Wrote dataset");
        Ok(())
    }
}

fn write_collection(path: &Path, collection: &FeatureCollection) -> Result<(), StoreError> {
    let io_err = |e: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, collection).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)
}

fn to_geojson_feature(record: &OutputRecord) -> GeoJsonFeature {
    let mut properties = JsonObject::new();
    properties.insert(FIELD_ID.to_string(), json!(record.id));
    properties.insert(FIELD_SOURCE_CODE.to_string(), json!(record.source_code));
    properties.insert(FIELD_MGRS_TILE.to_string(), json!(record.mgrs_tile));

    GeoJsonFeature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(
            &record.geometry,
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn crs_member() -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": ALBERS_CRS_NAME } }),
    );
    members
}

fn crs_name(members: Option<&JsonObject>) -> Option<String> {
    members?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use tempfile::TempDir;

    fn record(id: u64, tile: Option<&str>) -> OutputRecord {
        OutputRecord {
            id,
            geometry: polygon![(x: 0.0, y: 0.0), (x: 50.0, y: 0.0), (x: 50.0, y: 50.0), (x: 0.0, y: 50.0)],
            source_code: "CLU".to_string(),
            mgrs_tile: tile.map(str::to_string),
        }
    }

    #[test]
    fn test_written_dataset_reads_back_with_schema_and_crs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join("tx.geojson");
        let store = GeoJsonStore::new();

        store
            .write(&path, &[record(1, Some("14RPV")), record(2, None)])
            .unwrap();
        let layer = store.read(&path).unwrap();

        assert_eq!(layer.crs.as_deref(), Some(ALBERS_CRS_NAME));
        assert_eq!(layer.fields, vec!["MGRS_TILE", "SOURCECODE", "id"]);
        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.features[0].property_str("id").as_deref(), Some("1"));
        assert_eq!(layer.features[0].property_str("MGRS_TILE").as_deref(), Some("14RPV"));
        assert_eq!(layer.features[1].property_str("MGRS_TILE"), None);
        assert!(matches!(layer.features[0].geometry, Some(Geometry::Polygon(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = GeoJsonStore::new()
            .read(&temp.path().join("absent.geojson"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_foreign_crs_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wgs84.geojson");
        fs::write(
            &path,
            r#"{"type":"FeatureCollection","crs":{"type":"name","properties":{"name":"EPSG:4326"}},"features":[]}"#,
        )
        .unwrap();

        let err = GeoJsonStore::new().read(&path).unwrap_err();
        assert!(matches!(err, StoreError::Crs { .. }));
    }

    #[test]
    fn test_null_geometry_is_preserved_as_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nulls.geojson");
        fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null,"properties":{"NAME":"x"}}]}"#,
        )
        .unwrap();

        let layer = GeoJsonStore::new().read(&path).unwrap();

        assert_eq!(layer.crs, None);
        assert_eq!(layer.features.len(), 1);
        assert!(layer.features[0].geometry.is_none());
        assert!(layer.has_field("NAME"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.geojson");
        fs::write(&path, "{ not json").unwrap();

        let err = GeoJsonStore::new().read(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
