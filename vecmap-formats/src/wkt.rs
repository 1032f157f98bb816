//! Reader and writer of the OGC Well-Known Text geometry representation.
//!
//! Supported geometry types are `POINT`, `LINESTRING`, `MULTILINESTRING`, `POLYGON` and `MULTIPOLYGON`.
//! Keywords are case-insensitive. Coordinates may have a third (or fourth) value, which is ignored.
//!
//! Serialization always uses `.` as the decimal separator and no spaces after commas:
//!
//! ```text
//! POINT(1 2)
//! MULTILINESTRING((0 0,1 1),(2 2,3 3))
//! POLYGON((0 0,0 5,5 5,5 0,0 0),(1 1,2 1,2 2,1 1))
//! ```

use vecmap_types::{Feature, Line, Point, PolyLine, Polygon, Ring};

use crate::error::VecmapFormatsError;

const POLYGON_SEPARATOR: &str = ")),((";
const CONTOUR_SEPARATOR: &str = "),(";

/// Geometry types that can be read from WKT.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WktGeometryType {
    /// `POINT`
    Point,
    /// `LINESTRING`
    LineString,
    /// `MULTILINESTRING`
    MultiLineString,
    /// `POLYGON`
    Polygon,
    /// `MULTIPOLYGON`
    MultiPolygon,
}

impl WktGeometryType {
    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword.to_ascii_uppercase().as_str() {
            "POINT" => Self::Point,
            "LINESTRING" => Self::LineString,
            "MULTILINESTRING" => Self::MultiLineString,
            "POLYGON" => Self::Polygon,
            "MULTIPOLYGON" => Self::MultiPolygon,
            _ => return None,
        })
    }

    fn nesting_depth(&self) -> usize {
        match self {
            Self::Point | Self::LineString => 1,
            Self::MultiLineString | Self::Polygon => 2,
            Self::MultiPolygon => 3,
        }
    }
}

/// WKT string split into the geometry type and normalized body.
struct WktText {
    geometry_type: WktGeometryType,
    /// Body without whitespace around parentheses and commas, or `None` for `EMPTY` geometries.
    body: Option<String>,
}

impl WktText {
    fn split(wkt: &str) -> Result<Self, VecmapFormatsError> {
        let wkt = wkt.trim();
        let keyword_end = wkt
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(wkt.len());
        let keyword = &wkt[..keyword_end];
        let geometry_type = WktGeometryType::from_keyword(keyword)
            .ok_or_else(|| malformed(format!("unknown geometry type '{keyword}'")))?;

        let mut rest = wkt[keyword_end..].trim_start();
        // Dimension tag, e.g. `POINT Z (1 2 3)`.
        for tag in ["ZM", "Z", "M"] {
            let has_tag = rest
                .get(..tag.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(tag));
            let tag_ends = rest
                .as_bytes()
                .get(tag.len())
                .is_some_and(|c| !c.is_ascii_alphabetic());
            if has_tag && tag_ends {
                rest = rest[tag.len()..].trim_start();
                break;
            }
        }

        if rest.eq_ignore_ascii_case("EMPTY") {
            return Ok(Self {
                geometry_type,
                body: None,
            });
        }

        let body = normalize(rest);
        check_parentheses(&body, geometry_type.nesting_depth())?;

        Ok(Self {
            geometry_type,
            body: Some(body),
        })
    }

    fn require_type(self, expected: WktGeometryType) -> Result<Self, VecmapFormatsError> {
        if self.geometry_type != expected {
            return Err(malformed(format!(
                "expected {expected:?} geometry, found {:?}",
                self.geometry_type
            )));
        }

        Ok(self)
    }
}

fn malformed(message: impl Into<String>) -> VecmapFormatsError {
    VecmapFormatsError::MalformedWkt(message.into())
}

/// Removes whitespace around parentheses and commas, and replaces other whitespace sequences with a single space.
fn normalize(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut pending_space = false;
    for c in body.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        let is_delimiter = matches!(c, '(' | ')' | ',');
        if pending_space
            && !is_delimiter
            && !result.is_empty()
            && !result.ends_with(['(', ')', ','])
        {
            result.push(' ');
        }

        pending_space = false;
        result.push(c);
    }

    result
}

/// Checks that the body is wrapped into parentheses, they are balanced and nested exactly `depth` levels deep.
fn check_parentheses(body: &str, depth: usize) -> Result<(), VecmapFormatsError> {
    if !body.starts_with('(') || !body.ends_with(')') {
        return Err(malformed("geometry body must be enclosed in parentheses"));
    }

    let mut current = 0usize;
    let mut max = 0;
    for (index, c) in body.char_indices() {
        match c {
            '(' => {
                current += 1;
                max = max.max(current);
            }
            ')' => {
                current = current
                    .checked_sub(1)
                    .ok_or_else(|| malformed("unbalanced parentheses"))?;
                if current == 0 && index != body.len() - 1 {
                    return Err(malformed("unexpected text after geometry"));
                }
            }
            _ => {}
        }
    }

    if current != 0 {
        return Err(malformed("unbalanced parentheses"));
    }

    if max != depth {
        return Err(malformed(format!(
            "expected {depth} levels of parentheses, found {max}"
        )));
    }

    Ok(())
}

/// Removes one level of enclosing parentheses. The body is already checked by [`check_parentheses`].
fn strip_outer(body: &str) -> &str {
    &body[1..body.len() - 1]
}

fn trim_parentheses(text: &str) -> &str {
    text.trim_start_matches('(').trim_end_matches(')')
}

fn parse_coordinate(text: &str) -> Result<Point, VecmapFormatsError> {
    let mut tokens = text.split(' ').filter(|t| !t.is_empty());
    let (Some(x), Some(y)) = (tokens.next(), tokens.next()) else {
        return Err(malformed(format!(
            "coordinate must have at least 2 values: '{text}'"
        )));
    };

    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| malformed(format!("invalid coordinate value '{value}'")))
    };

    Ok(Point::new(parse(x)?, parse(y)?))
}

fn parse_coordinates(text: &str) -> Result<Vec<Point>, VecmapFormatsError> {
    text.split(',').map(parse_coordinate).collect()
}

fn parse_rings(text: &str) -> Result<Vec<Ring>, VecmapFormatsError> {
    trim_parentheses(text)
        .split(CONTOUR_SEPARATOR)
        .map(|ring_text| {
            let mut ring = Ring::new(parse_coordinates(trim_parentheses(ring_text))?);
            ring.close();
            Ok(ring)
        })
        .collect()
}

fn parse_lines(text: &str) -> Result<Vec<Line>, VecmapFormatsError> {
    trim_parentheses(text)
        .split(CONTOUR_SEPARATOR)
        .map(|line_text| Ok(Line::new(parse_coordinates(trim_parentheses(line_text))?)))
        .collect()
}

/// Parses a `POINT`.
pub fn parse_point(wkt: &str) -> Result<Point, VecmapFormatsError> {
    let text = WktText::split(wkt)?.require_type(WktGeometryType::Point)?;
    let body = text.body.ok_or_else(|| malformed("empty point"))?;
    parse_coordinate(strip_outer(&body))
}

/// Parses a `LINESTRING` into a polyline with one line.
pub fn parse_line_string(wkt: &str) -> Result<PolyLine, VecmapFormatsError> {
    let text = WktText::split(wkt)?.require_type(WktGeometryType::LineString)?;
    read_line_string(text.body.as_deref())
}

/// Parses a `MULTILINESTRING`.
pub fn parse_multi_line_string(wkt: &str) -> Result<PolyLine, VecmapFormatsError> {
    let text = WktText::split(wkt)?.require_type(WktGeometryType::MultiLineString)?;
    read_multi_line_string(text.body.as_deref())
}

/// Parses a `POLYGON`. Rings are closed if they are not.
pub fn parse_polygon(wkt: &str) -> Result<Polygon, VecmapFormatsError> {
    let text = WktText::split(wkt)?.require_type(WktGeometryType::Polygon)?;
    read_polygon(text.body.as_deref())
}

/// Parses a `MULTIPOLYGON`. Rings of all polygons are put into one [`Polygon`].
pub fn parse_multi_polygon(wkt: &str) -> Result<Polygon, VecmapFormatsError> {
    let text = WktText::split(wkt)?.require_type(WktGeometryType::MultiPolygon)?;
    read_multi_polygon(text.body.as_deref())
}

/// Parses any supported geometry, detecting its type by the leading keyword.
pub fn parse(wkt: &str) -> Result<Feature, VecmapFormatsError> {
    let text = WktText::split(wkt)?;
    let body = text.body.as_deref();
    Ok(match text.geometry_type {
        WktGeometryType::Point => {
            let body = body.ok_or_else(|| malformed("empty point"))?;
            Feature::Point(parse_coordinate(strip_outer(body))?)
        }
        WktGeometryType::LineString => Feature::PolyLine(read_line_string(body)?),
        WktGeometryType::MultiLineString => Feature::PolyLine(read_multi_line_string(body)?),
        WktGeometryType::Polygon => Feature::Polygon(read_polygon(body)?),
        WktGeometryType::MultiPolygon => Feature::Polygon(read_multi_polygon(body)?),
    })
}

fn read_line_string(body: Option<&str>) -> Result<PolyLine, VecmapFormatsError> {
    let Some(body) = body else {
        return Ok(PolyLine::default());
    };

    Ok(PolyLine::from(Line::new(parse_coordinates(strip_outer(body))?)))
}

fn read_multi_line_string(body: Option<&str>) -> Result<PolyLine, VecmapFormatsError> {
    let Some(body) = body else {
        return Ok(PolyLine::default());
    };

    Ok(PolyLine::new(parse_lines(strip_outer(body))?))
}

fn read_polygon(body: Option<&str>) -> Result<Polygon, VecmapFormatsError> {
    let Some(body) = body else {
        return Ok(Polygon::default());
    };

    Ok(Polygon::new(parse_rings(strip_outer(body))?))
}

fn read_multi_polygon(body: Option<&str>) -> Result<Polygon, VecmapFormatsError> {
    let Some(body) = body else {
        return Ok(Polygon::default());
    };

    let mut rings = vec![];
    for polygon_text in strip_outer(body).split(POLYGON_SEPARATOR) {
        rings.extend(parse_rings(polygon_text)?);
    }

    Ok(Polygon::new(rings))
}

fn points_text(points: &[Point]) -> String {
    let coordinates: Vec<String> = points.iter().map(Point::to_string).collect();
    format!("({})", coordinates.join(","))
}

fn rings_text(rings: &[Ring]) -> String {
    let rings: Vec<String> = rings.iter().map(|r| points_text(r.points())).collect();
    rings.join(",")
}

/// Writes a point as `POINT(x y)`.
pub fn create_from_point(point: &Point) -> String {
    format!("POINT({point})")
}

/// Writes a polyline. The result is always a `MULTILINESTRING`, even for a single line.
pub fn create_from_poly_line(poly_line: &PolyLine) -> String {
    if poly_line.is_empty() {
        return "MULTILINESTRING EMPTY".to_string();
    }

    let lines: Vec<String> = poly_line
        .lines()
        .iter()
        .map(|l| points_text(l.points()))
        .collect();
    format!("MULTILINESTRING({})", lines.join(","))
}

/// Writes a polygon.
///
/// Rings are grouped into physical polygons by their winding (see [`Polygon::physical_polygons`]). A single group
/// is written as `POLYGON`, several groups as `MULTIPOLYGON`.
pub fn create_from_polygon(polygon: &Polygon) -> String {
    let groups = polygon.physical_polygons();
    match groups.as_slice() {
        [] => "POLYGON EMPTY".to_string(),
        [rings] => format!("POLYGON({})", rings_text(rings)),
        groups => {
            let polygons: Vec<String> = groups
                .iter()
                .map(|rings| format!("({})", rings_text(rings)))
                .collect();
            format!("MULTIPOLYGON({})", polygons.join(","))
        }
    }
}

/// Writes any feature geometry.
pub fn create_from_feature(feature: &Feature) -> String {
    match feature {
        Feature::Point(p) => create_from_point(p),
        Feature::PolyLine(l) => create_from_poly_line(l),
        Feature::Polygon(p) => create_from_polygon(p),
    }
}
