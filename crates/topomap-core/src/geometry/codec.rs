// GeoJSON text <-> structured geometry.
//
// Parsing is two-stage: the text must be valid JSON, then the value must
// be an object with a recognized `type` and well-formed `coordinates`.
// Every failure is a `GeometryParseError` the form can show verbatim.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use super::types::{Area, Coordinate, Geometry, LineString, Polygon};

/// GeoJSON geometry type names the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPolygon,
}

/// Why a piece of geometry text was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryParseError {
    #[error("invalid JSON: {0}")]
    Syntax(String),

    #[error("geometry must be a JSON object")]
    NotAnObject,

    #[error("geometry is missing a \"type\" field")]
    MissingType,

    #[error("unrecognized geometry type \"{0}\"")]
    UnknownType(String),

    #[error("expected {expected} geometry, got {found}")]
    UnexpectedType {
        expected: String,
        found: GeometryKind,
    },

    #[error("geometry is missing \"coordinates\"")]
    MissingCoordinates,

    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("a LineString needs at least 2 positions, got {0}")]
    TooFewPositions(usize),

    #[error("ring {index} must be closed and have at least 4 positions")]
    InvalidRing { index: usize },

    #[error("geometry has no coordinates")]
    Empty,
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Parse GeoJSON text into any recognized geometry.
pub fn parse(text: &str) -> Result<Geometry, GeometryParseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| GeometryParseError::Syntax(e.to_string()))?;
    from_value(&value)
}

/// Parse GeoJSON text, accepting only the listed geometry kinds.
pub fn parse_as(text: &str, accepted: &[GeometryKind]) -> Result<Geometry, GeometryParseError> {
    let geometry = parse(text)?;
    ensure_kind(&geometry, accepted)?;
    Ok(geometry)
}

/// Parse the geometry text of a link.
pub fn parse_line_string(text: &str) -> Result<LineString, GeometryParseError> {
    match parse_as(text, &[GeometryKind::LineString])? {
        Geometry::LineString(line) => Ok(line),
        other => Err(unexpected(&other, &[GeometryKind::LineString])),
    }
}

/// Parse the geometry text of a zone.
pub fn parse_area(text: &str) -> Result<Area, GeometryParseError> {
    into_area(parse(text)?)
}

/// Decode an already-parsed JSON value.
///
/// A JSON string is treated as GeoJSON text, and a `Feature` wrapper is
/// unwrapped to its `geometry`.
pub fn from_value(value: &Value) -> Result<Geometry, GeometryParseError> {
    let object = match value {
        Value::String(text) => return parse(text),
        Value::Object(object) => object,
        _ => return Err(GeometryParseError::NotAnObject),
    };

    let type_name = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(GeometryParseError::MissingType)?;

    if type_name == "Feature" {
        let inner = object
            .get("geometry")
            .ok_or(GeometryParseError::MissingCoordinates)?;
        return from_value(inner);
    }

    let kind: GeometryKind = type_name
        .parse()
        .map_err(|_| GeometryParseError::UnknownType(type_name.to_owned()))?;
    decode_kind(kind, object)
}

pub(crate) fn line_string_from_value(value: &Value) -> Result<LineString, GeometryParseError> {
    match from_value(value)? {
        Geometry::LineString(line) => Ok(line),
        other => Err(unexpected(&other, &[GeometryKind::LineString])),
    }
}

pub(crate) fn area_from_value(value: &Value) -> Result<Area, GeometryParseError> {
    into_area(from_value(value)?)
}

fn decode_kind(
    kind: GeometryKind,
    object: &Map<String, Value>,
) -> Result<Geometry, GeometryParseError> {
    let coordinates = object
        .get("coordinates")
        .ok_or(GeometryParseError::MissingCoordinates)?;

    match kind {
        GeometryKind::Point => Ok(Geometry::Point(decode(coordinates)?)),
        GeometryKind::LineString => Ok(Geometry::LineString(LineString::new(decode(
            coordinates,
        )?)?)),
        GeometryKind::Polygon => Ok(Geometry::Polygon(Polygon::new(decode(coordinates)?)?)),
        GeometryKind::MultiPolygon => {
            let raw: Vec<Vec<Vec<Coordinate>>> = decode(coordinates)?;
            if raw.is_empty() {
                return Err(GeometryParseError::Empty);
            }
            let polygons = raw
                .into_iter()
                .map(Polygon::new)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::MultiPolygon(polygons))
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(value: &Value) -> Result<T, GeometryParseError> {
    T::deserialize(value).map_err(|e| GeometryParseError::InvalidCoordinates(e.to_string()))
}

fn into_area(geometry: Geometry) -> Result<Area, GeometryParseError> {
    match geometry {
        Geometry::Polygon(p) => Ok(Area::Polygon(p)),
        Geometry::MultiPolygon(ps) => Ok(Area::MultiPolygon(ps)),
        other => Err(unexpected(
            &other,
            &[GeometryKind::Polygon, GeometryKind::MultiPolygon],
        )),
    }
}

fn ensure_kind(geometry: &Geometry, accepted: &[GeometryKind]) -> Result<(), GeometryParseError> {
    if accepted.is_empty() || accepted.contains(&geometry.kind()) {
        Ok(())
    } else {
        Err(unexpected(geometry, accepted))
    }
}

fn unexpected(geometry: &Geometry, accepted: &[GeometryKind]) -> GeometryParseError {
    let expected = accepted
        .iter()
        .map(GeometryKind::as_ref)
        .collect::<Vec<_>>()
        .join(" or ");
    GeometryParseError::UnexpectedType {
        expected,
        found: geometry.kind(),
    }
}

// ── Serialization ───────────────────────────────────────────────────

/// Encode as a GeoJSON geometry object.
pub fn to_value(geometry: &Geometry) -> Value {
    let coordinates = match geometry {
        Geometry::Point(c) => position(*c),
        Geometry::LineString(line) => path(line.coordinates()),
        Geometry::Polygon(p) => rings(p),
        Geometry::MultiPolygon(ps) => Value::Array(ps.iter().map(rings).collect()),
    };
    json!({ "type": geometry.kind().as_ref(), "coordinates": coordinates })
}

/// Encode as compact GeoJSON text.
pub fn to_text(geometry: &Geometry) -> String {
    to_value(geometry).to_string()
}

pub(crate) fn line_string_value(line: &LineString) -> Value {
    json!({ "type": GeometryKind::LineString.as_ref(), "coordinates": path(line.coordinates()) })
}

fn position(c: Coordinate) -> Value {
    json!([c.lng, c.lat])
}

fn path(coordinates: &[Coordinate]) -> Value {
    Value::Array(coordinates.iter().copied().map(position).collect())
}

fn rings(polygon: &Polygon) -> Value {
    Value::Array(polygon.rings().iter().map(|r| path(r)).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LINE: &str = r#"{"type":"LineString","coordinates":[[2.0,1.0],[4.0,3.0]]}"#;

    #[test]
    fn parses_line_string() {
        let line = parse_line_string(LINE).unwrap();
        assert_eq!(
            line.coordinates(),
            &[Coordinate::new(2.0, 1.0), Coordinate::new(4.0, 3.0)]
        );
    }

    #[test]
    fn text_round_trips_through_value() {
        let geometry = parse(LINE).unwrap();
        let reparsed: Value = serde_json::from_str(&to_text(&geometry)).unwrap();
        let original: Value = serde_json::from_str(LINE).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn parses_multipolygon_as_area() {
        let text = r#"{"type":"MultiPolygon","coordinates":[
            [[[0,0],[1,0],[1,1],[0,0]]],
            [[[5,5],[6,5],[6,6],[5,5]]]
        ]}"#;
        match parse_area(text).unwrap() {
            Area::MultiPolygon(polys) => assert_eq!(polys.len(), 2),
            Area::Polygon(_) => panic!("expected MultiPolygon"),
        }
    }

    #[test]
    fn unwraps_feature() {
        let text = format!(r#"{{"type":"Feature","properties":{{}},"geometry":{LINE}}}"#);
        assert!(matches!(parse(&text).unwrap(), Geometry::LineString(_)));
    }

    #[test]
    fn accepts_geometry_embedded_as_text() {
        let value = Value::String(LINE.to_owned());
        assert_eq!(from_value(&value).unwrap().kind(), GeometryKind::LineString);
    }

    #[test]
    fn syntax_error_carries_parser_message() {
        let err = parse("{\"type\": ").unwrap_err();
        match err {
            GeometryParseError::Syntax(msg) => assert!(msg.contains("EOF"), "{msg}"),
            other => panic!("expected Syntax error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_objects_and_unknown_types() {
        assert_eq!(parse("[1,2]").unwrap_err(), GeometryParseError::NotAnObject);
        assert_eq!(
            parse(r#"{"coordinates":[1,2]}"#).unwrap_err(),
            GeometryParseError::MissingType
        );
        assert_eq!(
            parse(r#"{"type":"Circle","coordinates":[1,2]}"#).unwrap_err(),
            GeometryParseError::UnknownType("Circle".into())
        );
    }

    #[test]
    fn link_geometry_rejects_polygons() {
        let err = parse_line_string(
            r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#,
        )
        .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"expected LineString geometry, got Polygon");
    }

    #[test]
    fn zone_geometry_rejects_points() {
        let err = parse_area(r#"{"type":"Point","coordinates":[1,2]}"#).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"expected Polygon or MultiPolygon geometry, got Point"
        );
    }

    #[test]
    fn single_position_line_is_rejected() {
        let err = parse(r#"{"type":"LineString","coordinates":[[1,2]]}"#).unwrap_err();
        assert_eq!(err, GeometryParseError::TooFewPositions(1));
    }

    #[test]
    fn malformed_positions_are_reported() {
        let err = parse(r#"{"type":"LineString","coordinates":[[1,"x"],[2,3]]}"#).unwrap_err();
        assert!(matches!(err, GeometryParseError::InvalidCoordinates(_)));
    }
}
