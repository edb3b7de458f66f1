// ── Geometry values and the GeoJSON codec ──
//
// Positions are `[lng, lat]` pairs in degrees, matching GeoJSON. The
// structured types below can only be built through validating
// constructors, so a `LineString` always has two or more positions and
// every polygon ring is closed.

mod codec;
mod types;

pub use codec::{
    GeometryKind, GeometryParseError, from_value, parse, parse_area, parse_as, parse_line_string,
    to_text, to_value,
};
pub use types::{Area, Coordinate, Geometry, LineString, Polygon};
