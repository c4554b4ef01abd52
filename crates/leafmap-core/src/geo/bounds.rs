use geo::algorithm::bounding_rect::BoundingRect;
use geo::{Geometry as GeoGeometry, Rect};
use serde::{Deserialize, Serialize};

use crate::models::MapFeature;

/// Axis-aligned bounding box in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self { west, south, east, north }
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    pub fn center(&self) -> [f64; 2] {
        [(self.west + self.east) / 2.0, (self.south + self.north) / 2.0]
    }
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Bounds::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// Bounding box of a feature's geometry; `None` for missing or empty geometry
pub fn feature_bounds(feature: &MapFeature) -> Option<Bounds> {
    let geometry = feature.geometry.clone()?;
    let geo_geom: GeoGeometry<f64> = match GeoGeometry::try_from(geometry) {
        Ok(g) => g,
        Err(e) => {
            tracing::debug!(feature_id = %feature.id, error = %e, "Skipping unconvertible geometry");
            return None;
        }
    };
    geo_geom.bounding_rect().map(Bounds::from)
}

/// Union of the bounds of all features that have geometry
pub fn union_bounds<'a, I>(features: I) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a MapFeature>,
{
    features
        .into_iter()
        .filter_map(feature_bounds)
        .reduce(|acc, b| acc.union(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureId;
    use serde_json::{json, Map};

    fn square(id: &str, x: f64, y: f64, size: f64) -> MapFeature {
        let geometry: geojson::Geometry = serde_json::from_value(json!({
            "type": "Polygon",
            "coordinates": [[[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]]
        }))
        .unwrap();
        MapFeature {
            id: FeatureId(id.into()),
            district: None,
            block: None,
            gp: None,
            geometry: Some(geometry),
            properties: Map::new(),
        }
    }

    #[test]
    fn test_feature_bounds() {
        let bounds = feature_bounds(&square("a", 95.0, 27.0, 0.5)).unwrap();
        assert_eq!(bounds, Bounds::new(95.0, 27.0, 95.5, 27.5));
        assert_eq!(bounds.center(), [95.25, 27.25]);
    }

    #[test]
    fn test_union_bounds() {
        let features = vec![square("a", 95.0, 27.0, 0.5), square("b", 94.0, 26.5, 0.2)];
        let bounds = union_bounds(&features).unwrap();
        assert_eq!(bounds, Bounds::new(94.0, 26.5, 95.5, 27.5));
    }

    #[test]
    fn test_missing_geometry_has_no_bounds() {
        let mut feature = square("a", 0.0, 0.0, 1.0);
        feature.geometry = None;
        assert!(feature_bounds(&feature).is_none());
        assert!(union_bounds(std::iter::once(&feature)).is_none());
    }
}
