use crate::error::GeometryError;
use crate::models::Coordinates;
use geojson::GeoJson;
use serde::{Deserialize, Serialize};

/// Precision used by the directions service for route geometries
pub const POLYLINE_PRECISION: u32 = 6;

/// Non-empty, immutable sequence of route points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinates>", into = "Vec<Coordinates>")]
pub struct RoutePolyline {
    points: Vec<Coordinates>,
}

impl RoutePolyline {
    pub fn new(points: Vec<Coordinates>) -> Result<Self, GeometryError> {
        if points.is_empty() {
            return Err(GeometryError::EmptyPolyline);
        }
        for point in &points {
            point.validate()?;
        }
        Ok(RoutePolyline { points })
    }

    /// Decode an encoded polyline string (Google polyline algorithm)
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, GeometryError> {
        let factor = 10_f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut index = 0;
        let mut lat: i64 = 0;
        let mut lng: i64 = 0;
        let mut points = Vec::new();

        while index < bytes.len() {
            lat += decode_value(bytes, &mut index)?;
            lng += decode_value(bytes, &mut index)?;
            points.push(Coordinates::new(lat as f64 / factor, lng as f64 / factor)?);
        }

        Self::new(points)
    }

    /// Parse a GeoJSON `LineString` geometry, or a feature wrapping one
    pub fn from_geojson(raw: &str) -> Result<Self, GeometryError> {
        let parsed: GeoJson = raw
            .parse()
            .map_err(|e: geojson::Error| GeometryError::InvalidGeoJson(e.to_string()))?;

        let geometry = match parsed {
            GeoJson::Geometry(geometry) => geometry,
            GeoJson::Feature(feature) => feature.geometry.ok_or_else(|| {
                GeometryError::InvalidGeoJson("feature has no geometry".to_string())
            })?,
            GeoJson::FeatureCollection(_) => {
                return Err(GeometryError::InvalidGeoJson(
                    "expected a LineString, got a FeatureCollection".to_string(),
                ))
            }
        };

        let geometry: geo::Geometry<f64> = geometry
            .try_into()
            .map_err(|e: geojson::Error| GeometryError::InvalidGeoJson(e.to_string()))?;

        match geometry {
            geo::Geometry::LineString(line) => {
                let points = line
                    .points()
                    .map(Coordinates::from_point)
                    .collect::<Result<Vec<_>, _>>()?;
                Self::new(points)
            }
            _ => Err(GeometryError::InvalidGeoJson(
                "expected a LineString geometry".to_string(),
            )),
        }
    }

    pub fn encode(&self, precision: u32) -> String {
        let factor = 10_f64.powi(precision as i32);
        let mut encoded = String::new();
        let mut prev_lat: i64 = 0;
        let mut prev_lng: i64 = 0;

        for point in &self.points {
            let lat = (point.lat * factor).round() as i64;
            let lng = (point.lng * factor).round() as i64;
            encode_value(lat - prev_lat, &mut encoded);
            encode_value(lng - prev_lng, &mut encoded);
            prev_lat = lat;
            prev_lng = lng;
        }

        encoded
    }

    pub fn points(&self) -> &[Coordinates] {
        &self.points
    }

    pub fn first(&self) -> Coordinates {
        self.points[0]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl TryFrom<Vec<Coordinates>> for RoutePolyline {
    type Error = GeometryError;

    fn try_from(points: Vec<Coordinates>) -> Result<Self, Self::Error> {
        RoutePolyline::new(points)
    }
}

impl From<RoutePolyline> for Vec<Coordinates> {
    fn from(polyline: RoutePolyline) -> Self {
        polyline.points
    }
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64, GeometryError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*index).ok_or_else(|| {
            GeometryError::MalformedPolyline(format!("truncated value at byte {}", *index))
        })?;
        if !(63..=126).contains(&byte) {
            return Err(GeometryError::MalformedPolyline(format!(
                "invalid character {:?} at byte {}",
                byte as char, *index
            )));
        }
        if shift > 60 {
            return Err(GeometryError::MalformedPolyline(format!(
                "value overflow at byte {}",
                *index
            )));
        }
        *index += 1;

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= 0x20 {
        out.push((((value & 0x1f) | 0x20) as u8 + 63) as char);
        value >>= 5;
    }
    out.push((value as u8 + 63) as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn test_decode_reference_polyline() {
        let polyline = RoutePolyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@", 5).unwrap();
        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];

        assert_eq!(polyline.len(), 3);
        for (point, (lat, lng)) in polyline.points().iter().zip(expected) {
            assert!((point.lat - lat).abs() < 1e-9, "lat {} vs {}", point.lat, lat);
            assert!((point.lng - lng).abs() < 1e-9, "lng {} vs {}", point.lng, lng);
        }
    }

    #[test]
    fn test_encode_matches_reference() {
        let polyline =
            RoutePolyline::new(vec![c(38.5, -120.2), c(40.7, -120.95), c(43.252, -126.453)])
                .unwrap();
        assert_eq!(polyline.encode(5), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }

    #[test]
    fn test_precision_six_decoding() {
        let polyline = RoutePolyline::new(vec![c(48.856614, 2.352222), c(48.8584, 2.2945)]).unwrap();
        let decoded = RoutePolyline::decode(&polyline.encode(POLYLINE_PRECISION), 6).unwrap();
        assert_eq!(decoded, polyline);
    }

    #[test]
    fn test_empty_and_malformed_input() {
        assert_eq!(
            RoutePolyline::decode("", 6),
            Err(GeometryError::EmptyPolyline)
        );
        // Truncated: a continuation chunk with nothing after it
        assert!(matches!(
            RoutePolyline::decode("_", 6),
            Err(GeometryError::MalformedPolyline(_))
        ));
        // Space is below the valid character range
        assert!(matches!(
            RoutePolyline::decode("_p~iF ps|U", 5),
            Err(GeometryError::MalformedPolyline(_))
        ));
    }

    #[test]
    fn test_decoded_points_are_validated() {
        // Latitude 100 encoded at precision 5
        let mut encoded = String::new();
        encode_value(10_000_000, &mut encoded);
        encode_value(0, &mut encoded);
        assert!(matches!(
            RoutePolyline::decode(&encoded, 5),
            Err(GeometryError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_from_geojson_geometry_and_feature() {
        let geometry = r#"{"type":"LineString","coordinates":[[2.35,48.85],[2.36,48.86]]}"#;
        let polyline = RoutePolyline::from_geojson(geometry).unwrap();
        assert_eq!(polyline.first(), c(48.85, 2.35));
        assert_eq!(polyline.len(), 2);

        let feature = format!(r#"{{"type":"Feature","properties":{{}},"geometry":{}}}"#, geometry);
        assert_eq!(RoutePolyline::from_geojson(&feature).unwrap(), polyline);
    }

    #[test]
    fn test_from_geojson_rejects_other_geometries() {
        let point = r#"{"type":"Point","coordinates":[2.35,48.85]}"#;
        assert!(matches!(
            RoutePolyline::from_geojson(point),
            Err(GeometryError::InvalidGeoJson(_))
        ));
        assert!(RoutePolyline::from_geojson("not json").is_err());
    }

    #[test]
    fn test_serde_rejects_empty() {
        assert!(serde_json::from_str::<RoutePolyline>("[]").is_err());
        let polyline: RoutePolyline =
            serde_json::from_str(r#"[{"lat": 1.0, "lng": 2.0}]"#).unwrap();
        assert_eq!(polyline.first(), c(1.0, 2.0));
    }
}
