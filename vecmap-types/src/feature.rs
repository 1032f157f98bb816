//! Geometry sum type and geometry kind tags.

use serde::{Deserialize, Serialize};

use crate::line::PolyLine;
use crate::point::Point;
use crate::polygon::Polygon;
use crate::projection::Projection;
use crate::rect::Rectangle;
use crate::VecmapTypesError;

/// Geometry of a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    /// Single point.
    Point(Point),
    /// One or more open lines.
    PolyLine(PolyLine),
    /// One or more rings.
    Polygon(Polygon),
}

impl Feature {
    /// Kind of the geometry.
    pub fn feature_type(&self) -> FeatureType {
        match self {
            Feature::Point(_) => FeatureType::Point,
            Feature::PolyLine(_) => FeatureType::Polyline,
            Feature::Polygon(_) => FeatureType::Polygon,
        }
    }

    /// Bounding rectangle of the geometry.
    pub fn bounds(&self) -> Rectangle {
        match self {
            Feature::Point(p) => Rectangle::new(*p, *p),
            Feature::PolyLine(l) => l.bounds(),
            Feature::Polygon(p) => p.bounds(),
        }
    }

    /// Returns a simplified copy of the geometry. Points are returned unchanged.
    pub fn simplify(&self, tolerance: f64) -> Self {
        match self {
            Feature::Point(p) => Feature::Point(*p),
            Feature::PolyLine(l) => Feature::PolyLine(l.simplify(tolerance)),
            Feature::Polygon(p) => Feature::Polygon(p.simplify(tolerance)),
        }
    }

    /// Returns a copy of the geometry with all points projected.
    pub fn project(&self, projection: &(impl Projection + ?Sized)) -> Result<Self, VecmapTypesError> {
        Ok(match self {
            Feature::Point(p) => Feature::Point(projection.project(p)?),
            Feature::PolyLine(l) => Feature::PolyLine(l.project(projection)?),
            Feature::Polygon(p) => Feature::Polygon(p.project(projection)?),
        })
    }
}

impl From<Point> for Feature {
    fn from(value: Point) -> Self {
        Self::Point(value)
    }
}

impl From<PolyLine> for Feature {
    fn from(value: PolyLine) -> Self {
        Self::PolyLine(value)
    }
}

impl From<Polygon> for Feature {
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}

/// Kind of geometries a data source produces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    /// Points.
    Point,
    /// Polylines.
    Polyline,
    /// Polygons.
    Polygon,
    /// No geometry.
    None,
}

/// Shape type codes of the Esri shapefile format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ShapeType {
    /// Record without geometry.
    Null = 0,
    /// Point.
    Point = 1,
    /// Polyline.
    PolyLine = 3,
    /// Polygon.
    Polygon = 5,
    /// Set of points.
    MultiPoint = 8,
    /// Point with Z coordinate.
    PointZ = 11,
    /// Polyline with Z coordinates.
    PolyLineZ = 13,
    /// Polygon with Z coordinates.
    PolygonZ = 15,
    /// Set of points with Z coordinates.
    MultiPointZ = 18,
    /// Point with measure.
    PointM = 21,
    /// Polyline with measures.
    PolyLineM = 23,
    /// Polygon with measures.
    PolygonM = 25,
    /// Set of points with measures.
    MultiPointM = 28,
    /// Surface patches.
    MultiPatch = 31,
}

impl ShapeType {
    /// Parses a raw shape type code. Returns `None` for codes not defined by the format.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Null,
            1 => Self::Point,
            3 => Self::PolyLine,
            5 => Self::Polygon,
            8 => Self::MultiPoint,
            11 => Self::PointZ,
            13 => Self::PolyLineZ,
            15 => Self::PolygonZ,
            18 => Self::MultiPointZ,
            21 => Self::PointM,
            23 => Self::PolyLineM,
            25 => Self::PolygonM,
            28 => Self::MultiPointM,
            31 => Self::MultiPatch,
            _ => return None,
        })
    }

    /// Raw code of the shape type.
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Whether records of this type carry measure values.
    pub fn is_measured(&self) -> bool {
        matches!(
            self,
            Self::PointM | Self::PolyLineM | Self::PolygonM | Self::MultiPointM
        )
    }

    /// Kind of geometry records of this type are read into.
    ///
    /// Only 2d and measured point, polyline and polygon types are supported. Other types return
    /// [`VecmapTypesError::UnsupportedShapeType`].
    pub fn feature_type(&self) -> Result<FeatureType, VecmapTypesError> {
        match self {
            Self::Null => Ok(FeatureType::None),
            Self::Point | Self::PointM => Ok(FeatureType::Point),
            Self::PolyLine | Self::PolyLineM => Ok(FeatureType::Polyline),
            Self::Polygon | Self::PolygonM => Ok(FeatureType::Polygon),
            _ => Err(VecmapTypesError::UnsupportedShapeType(self.code())),
        }
    }
}
