use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::codec::{self, GeometryKind, GeometryParseError};

// ── Coordinate ──────────────────────────────────────────────────────

/// A single `[lng, lat]` position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = String;

    /// Accepts `[lng, lat]` and `[lng, lat, alt]`; altitude is dropped.
    fn try_from(raw: Vec<f64>) -> Result<Self, Self::Error> {
        match raw.as_slice() {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Ok(Self::new(*lng, *lat)),
            [_, _, ..] => Err("position contains a non-finite number".into()),
            other => Err(format!(
                "position needs [lng, lat], got {} number(s)",
                other.len()
            )),
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lng, c.lat]
    }
}

// ── LineString ──────────────────────────────────────────────────────

/// An ordered path of two or more positions.
#[derive(Debug, Clone, PartialEq)]
pub struct LineString(Vec<Coordinate>);

impl LineString {
    pub fn new(coordinates: Vec<Coordinate>) -> Result<Self, GeometryParseError> {
        if coordinates.len() < 2 {
            return Err(GeometryParseError::TooFewPositions(coordinates.len()));
        }
        Ok(Self(coordinates))
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Coordinate> {
        self.0
    }
}

// ── Polygon ─────────────────────────────────────────────────────────

/// Exterior ring followed by optional holes. Every ring is closed and has
/// at least four positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon(Vec<Vec<Coordinate>>);

impl Polygon {
    pub fn new(rings: Vec<Vec<Coordinate>>) -> Result<Self, GeometryParseError> {
        if rings.is_empty() {
            return Err(GeometryParseError::Empty);
        }
        for (index, ring) in rings.iter().enumerate() {
            let closed = ring.len() >= 4 && ring.first() == ring.last();
            if !closed {
                return Err(GeometryParseError::InvalidRing { index });
            }
        }
        Ok(Self(rings))
    }

    pub fn rings(&self) -> &[Vec<Coordinate>] {
        &self.0
    }

    pub fn exterior(&self) -> &[Coordinate] {
        self.0.first().map_or(&[], Vec::as_slice)
    }
}

// ── Area ────────────────────────────────────────────────────────────

/// Geometry of a zone.
#[derive(Debug, Clone, PartialEq)]
pub enum Area {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl From<Area> for Geometry {
    fn from(area: Area) -> Self {
        match area {
            Area::Polygon(p) => Self::Polygon(p),
            Area::MultiPolygon(ps) => Self::MultiPolygon(ps),
        }
    }
}

// ── Geometry ────────────────────────────────────────────────────────

/// Any geometry the engine accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(LineString),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::LineString(_) => GeometryKind::LineString,
            Self::Polygon(_) => GeometryKind::Polygon,
            Self::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }
}

impl From<LineString> for Geometry {
    fn from(line: LineString) -> Self {
        Self::LineString(line)
    }
}

// ── Serde: always through the codec ─────────────────────────────────

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        codec::to_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        codec::from_value(&raw).map_err(D::Error::custom)
    }
}

impl Serialize for LineString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        codec::line_string_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LineString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        codec::line_string_from_value(&raw).map_err(D::Error::custom)
    }
}

impl Serialize for Area {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        codec::to_value(&Geometry::from(self.clone())).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Area {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        codec::area_from_value(&raw).map_err(D::Error::custom)
    }
}
