//! GeoJSON wire types
//!
//! Only the subset needed by the overlay is modeled: a `FeatureCollection` of `LineString`
//! features. Input features are decoded one by one so a single malformed entry can be skipped
//! without rejecting the whole collection.

use crate::Coordinate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GeoJSON properties object
pub type Properties = Map<String, Value>;

/// A GeoJSON `FeatureCollection`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

/// A GeoJSON `Feature` carrying a line geometry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Option<Properties>,
}

/// Geometry variants produced by this crate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<Coordinate> },
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

impl Feature {
    pub fn line_string(coordinates: Vec<Coordinate>, properties: Option<Properties>) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry: Geometry::LineString { coordinates },
            properties,
        }
    }
}

/// Outcome of decoding one entry of a collection's `features` array
#[derive(Debug, PartialEq)]
pub(crate) enum DecodedFeature {
    /// A usable line string
    Line {
        coordinates: Vec<Coordinate>,
        properties: Option<Properties>,
    },
    /// A well-formed feature with a geometry other than `LineString`
    Ignored { geometry_type: String },
    /// A feature that cannot be used
    Malformed { reason: String },
}

/// Extract the `features` array of a `FeatureCollection`
pub(crate) fn collection_features(value: &Value) -> Result<&[Value], String> {
    let object = value
        .as_object()
        .ok_or_else(|| "top level is not a JSON object".to_string())?;

    match object.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        Some(other) => return Err(format!("expected a FeatureCollection, found {other}")),
        None => return Err("missing \"type\" member".to_string()),
    }

    object
        .get("features")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| "missing \"features\" array".to_string())
}

/// Decode a single feature, validating every position
pub(crate) fn decode_feature(value: &Value) -> DecodedFeature {
    let malformed = |reason: &str| DecodedFeature::Malformed {
        reason: reason.to_string(),
    };

    let Some(object) = value.as_object() else {
        return malformed("feature is not a JSON object");
    };
    let Some(geometry) = object.get("geometry").and_then(Value::as_object) else {
        return malformed("missing geometry");
    };
    let Some(geometry_type) = geometry.get("type").and_then(Value::as_str) else {
        return malformed("geometry has no type");
    };
    if geometry_type != "LineString" {
        return DecodedFeature::Ignored {
            geometry_type: geometry_type.to_string(),
        };
    }

    let Some(raw_coordinates) = geometry.get("coordinates") else {
        return malformed("missing coordinates");
    };
    let coordinates: Vec<Coordinate> = match Vec::<Coordinate>::deserialize(raw_coordinates) {
        Ok(coordinates) => coordinates,
        Err(err) => {
            return DecodedFeature::Malformed {
                reason: format!("invalid coordinates: {err}"),
            };
        }
    };
    if let Some(bad) = coordinates.iter().find(|c| !c.is_valid()) {
        return DecodedFeature::Malformed {
            reason: format!("coordinate out of range: {bad}"),
        };
    }

    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .cloned();

    DecodedFeature::Line {
        coordinates,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_line_string() {
        let value = json!({
            "type": "Feature",
            "properties": { "name": "Jericho road" },
            "geometry": { "type": "LineString", "coordinates": [[35.2, 31.7], [35.4, 31.8]] }
        });
        match decode_feature(&value) {
            DecodedFeature::Line {
                coordinates,
                properties,
            } => {
                assert_eq!(coordinates.len(), 2);
                assert_eq!(properties.unwrap()["name"], "Jericho road");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_ignores_other_geometries() {
        let value = json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [35.2, 31.7] }
        });
        assert_eq!(
            decode_feature(&value),
            DecodedFeature::Ignored {
                geometry_type: "Point".to_string()
            }
        );
    }

    #[test]
    fn test_decode_malformed_features() {
        let cases = [
            json!("not a feature"),
            json!({ "type": "Feature" }),
            json!({ "type": "Feature", "geometry": { "coordinates": [] } }),
            json!({ "type": "Feature", "geometry": { "type": "LineString" } }),
            json!({ "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[1.0]] } }),
            json!({ "type": "Feature", "geometry": { "type": "LineString", "coordinates": "x" } }),
            json!({ "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [200.0, 0.0]] } }),
        ];
        for case in cases {
            assert!(
                matches!(decode_feature(&case), DecodedFeature::Malformed { .. }),
                "{case}"
            );
        }
    }

    #[test]
    fn test_collection_features() {
        let value = json!({ "type": "FeatureCollection", "features": [{}, {}] });
        assert_eq!(collection_features(&value).unwrap().len(), 2);

        assert!(collection_features(&json!([])).is_err());
        assert!(collection_features(&json!({ "type": "Feature" })).is_err());
        assert!(collection_features(&json!({ "type": "FeatureCollection" })).is_err());
    }

    #[test]
    fn test_serialize_feature_collection() {
        let collection = FeatureCollection::new(vec![Feature::line_string(
            vec![Coordinate::new(0.0, 0.0)],
            None,
        )]);
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0]] },
                    "properties": null
                }]
            })
        );
    }
}
