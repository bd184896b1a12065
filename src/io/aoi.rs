//! Area-of-interest geometry: GeoJSON loading plus the intersection and extent
//! queries the planner needs.
use std::path::Path;

use geo::{BoundingRect, Coord, Intersects, LineString, MultiPolygon, Polygon, Rect};
use serde_json::Value;

use crate::error::{Error, Result};

/// Named AOI polygon set in geographic coordinates (lon, lat)
#[derive(Debug, Clone, PartialEq)]
pub struct Aoi {
    /// Used to nest AOI outputs below `<out_dir>/<name>/`
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl Aoi {
    pub fn from_polygon(name: impl Into<String>, polygon: Polygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry: MultiPolygon::new(vec![polygon]),
        }
    }

    /// Load a GeoJSON file; the AOI is named after the file stem.
    pub fn from_geojson_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "aoi".to_string());
        Self::from_geojson_str(name, &text)
    }

    /// Parse a GeoJSON `Polygon`, `MultiPolygon`, `Feature` or `FeatureCollection`.
    pub fn from_geojson_str(name: impl Into<String>, text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let mut polygons = Vec::new();
        collect_polygons(&value, &mut polygons)?;
        if polygons.is_empty() {
            return Err(Error::InvalidInput(
                "AOI GeoJSON contains no polygon".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            geometry: MultiPolygon::new(polygons),
        })
    }

    pub fn intersects(&self, polygon: &Polygon<f64>) -> bool {
        self.geometry.0.iter().any(|p| p.intersects(polygon))
    }

    /// Bounding box of the AOI, `None` for an empty geometry.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidInput("GeoJSON object without `type`".to_string()))?;

    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::InvalidInput("FeatureCollection without features".into()))?;
            for feature in features {
                collect_polygons(feature, out)?;
            }
        }
        "Feature" => {
            if let Some(geometry) = value.get("geometry").filter(|g| !g.is_null()) {
                collect_polygons(geometry, out)?;
            }
        }
        "Polygon" => out.push(polygon_from_rings(coordinates(value)?)?),
        "MultiPolygon" => {
            let polys = coordinates(value)?
                .as_array()
                .ok_or_else(|| Error::InvalidInput("MultiPolygon coordinates".into()))?;
            for rings in polys {
                out.push(polygon_from_rings(rings)?);
            }
        }
        other => {
            return Err(Error::InvalidInput(format!(
                "unsupported AOI geometry type `{other}`"
            )));
        }
    }
    Ok(())
}

fn coordinates(value: &Value) -> Result<&Value> {
    value
        .get("coordinates")
        .ok_or_else(|| Error::InvalidInput("geometry without coordinates".to_string()))
}

fn polygon_from_rings(rings: &Value) -> Result<Polygon<f64>> {
    let rings = rings
        .as_array()
        .ok_or_else(|| Error::InvalidInput("polygon rings must be an array".into()))?;
    let mut parsed = rings.iter().map(ring).collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        return Err(Error::InvalidInput("polygon without exterior ring".into()));
    }
    let exterior = parsed.remove(0);
    Ok(Polygon::new(exterior, parsed))
}

fn ring(value: &Value) -> Result<LineString<f64>> {
    let positions = value
        .as_array()
        .ok_or_else(|| Error::InvalidInput("ring must be an array of positions".into()))?;
    let coords = positions
        .iter()
        .map(|pos| {
            let x = pos.get(0).and_then(Value::as_f64);
            let y = pos.get(1).and_then(Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(Error::InvalidInput(format!("invalid position {pos}"))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    if coords.len() < 3 {
        return Err(Error::InvalidInput("ring needs at least 3 positions".into()));
    }
    Ok(LineString::from(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELD: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "field"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[11.0, 50.0], [11.5, 50.0], [11.5, 50.4], [11.0, 50.4], [11.0, 50.0]]]
            }
        }]
    }"#;

    #[test]
    fn feature_collection_polygon_is_loaded() {
        let aoi = Aoi::from_geojson_str("field", FIELD).unwrap();
        assert_eq!(aoi.geometry.0.len(), 1);
        let bounds = aoi.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 11.0, y: 50.0 });
        assert_eq!(bounds.max(), Coord { x: 11.5, y: 50.4 });
    }

    #[test]
    fn intersection_with_footprints() {
        let aoi = Aoi::from_geojson_str("field", FIELD).unwrap();
        let inside = Polygon::new(
            LineString::from(vec![(11.2, 50.1), (12.0, 50.1), (12.0, 51.0), (11.2, 51.0)]),
            vec![],
        );
        let outside = Polygon::new(
            LineString::from(vec![(20.0, 50.1), (21.0, 50.1), (21.0, 51.0), (20.0, 51.0)]),
            vec![],
        );
        assert!(aoi.intersects(&inside));
        assert!(!aoi.intersects(&outside));
    }

    #[test]
    fn file_stem_names_the_aoi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lake_district.geojson");
        std::fs::write(&path, FIELD).unwrap();
        let aoi = Aoi::from_geojson_file(&path).unwrap();
        assert_eq!(aoi.name, "lake_district");
    }

    #[test]
    fn point_geometry_is_rejected() {
        let err = Aoi::from_geojson_str("p", r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
