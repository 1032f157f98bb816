//! Reader of the OGC Well-Known Binary geometry representation.

use bytes::Buf;
use vecmap_types::{Feature, Line, Point, PolyLine, Polygon, Ring};

use crate::cursor::{ByteCursor, ByteOrder};
use crate::error::VecmapFormatsError;

const POINT_SIZE: usize = 16;
const SUB_HEADER_SIZE: usize = 5;

/// WKB geometry type codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
enum WkbGeometryType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiLineString = 5,
    MultiPolygon = 6,
}

impl WkbGeometryType {
    fn from_code(code: u32) -> Result<Self, VecmapFormatsError> {
        Ok(match code {
            1 => Self::Point,
            2 => Self::LineString,
            3 => Self::Polygon,
            5 => Self::MultiLineString,
            6 => Self::MultiPolygon,
            _ => return Err(VecmapFormatsError::UnsupportedGeometryType(code)),
        })
    }
}

/// Parses a WKB geometry.
///
/// Points, line strings, polygons, multi line strings and multi polygons are supported. Line strings become a
/// [`PolyLine`] with one line, rings of all members of a multi polygon are put into one [`Polygon`].
pub fn parse(data: &[u8]) -> Result<Feature, VecmapFormatsError> {
    let mut cursor = ByteCursor::new(data);
    let (order, geometry_type) = read_header(&mut cursor)?;

    Ok(match geometry_type {
        WkbGeometryType::Point => Feature::Point(read_point(&mut cursor, order)?),
        WkbGeometryType::LineString => {
            Feature::PolyLine(PolyLine::from(Line::new(read_points(&mut cursor, order)?)))
        }
        WkbGeometryType::Polygon => Feature::Polygon(Polygon::new(read_rings(&mut cursor, order)?)),
        WkbGeometryType::MultiLineString => {
            let count = read_count(&mut cursor, order, SUB_HEADER_SIZE)?;
            let mut lines = Vec::with_capacity(count);
            for _ in 0..count {
                let order = read_member_header(&mut cursor, WkbGeometryType::LineString)?;
                lines.push(Line::new(read_points(&mut cursor, order)?));
            }

            Feature::PolyLine(PolyLine::new(lines))
        }
        WkbGeometryType::MultiPolygon => {
            let count = read_count(&mut cursor, order, SUB_HEADER_SIZE)?;
            let mut rings = vec![];
            for _ in 0..count {
                let order = read_member_header(&mut cursor, WkbGeometryType::Polygon)?;
                rings.extend(read_rings(&mut cursor, order)?);
            }

            Feature::Polygon(Polygon::new(rings))
        }
    })
}

fn read_header(
    cursor: &mut ByteCursor<impl Buf>,
) -> Result<(ByteOrder, WkbGeometryType), VecmapFormatsError> {
    let order = match cursor.u8()? {
        0 => ByteOrder::Big,
        1 => ByteOrder::Little,
        flag => {
            return Err(VecmapFormatsError::InvalidFormat(format!(
                "invalid byte order flag {flag}"
            )))
        }
    };

    let geometry_type = WkbGeometryType::from_code(cursor.u32(order)?)?;
    Ok((order, geometry_type))
}

fn read_member_header(
    cursor: &mut ByteCursor<impl Buf>,
    expected: WkbGeometryType,
) -> Result<ByteOrder, VecmapFormatsError> {
    let (order, geometry_type) = read_header(cursor)?;
    if geometry_type != expected {
        return Err(VecmapFormatsError::InvalidFormat(format!(
            "expected {expected:?} member, found {geometry_type:?}"
        )));
    }

    Ok(order)
}

fn read_count(
    cursor: &mut ByteCursor<impl Buf>,
    order: ByteOrder,
    item_size: usize,
) -> Result<usize, VecmapFormatsError> {
    let count = cursor.u32(order)? as usize;
    cursor.check_count(count, item_size)?;
    Ok(count)
}

fn read_point(
    cursor: &mut ByteCursor<impl Buf>,
    order: ByteOrder,
) -> Result<Point, VecmapFormatsError> {
    let x = cursor.f64(order)?;
    let y = cursor.f64(order)?;
    Ok(Point::new(x, y))
}

fn read_points(
    cursor: &mut ByteCursor<impl Buf>,
    order: ByteOrder,
) -> Result<Vec<Point>, VecmapFormatsError> {
    let count = read_count(cursor, order, POINT_SIZE)?;
    (0..count).map(|_| read_point(cursor, order)).collect()
}

fn read_rings(
    cursor: &mut ByteCursor<impl Buf>,
    order: ByteOrder,
) -> Result<Vec<Ring>, VecmapFormatsError> {
    let count = read_count(cursor, order, 4)?;
    (0..count)
        .map(|_| Ok(Ring::new(read_points(cursor, order)?)))
        .collect()
}
