//! Contract for the external projection engine.
//!
//! The geometry model never projects coordinates by itself. A cartographic projection library is plugged in by
//! implementing [`Projection`] (a fixed source/target pair) or [`CoordinateTransform`] (arbitrary pairs of
//! coordinate systems). Geometry types then expose `project` methods that return new projected instances.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::point::Point;

/// Error returned by a projection engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// The point is outside of the domain of the projection.
    #[error("point cannot be projected: {0}")]
    OutOfDomain(String),
    /// The engine does not know one of the coordinate systems.
    #[error("unknown coordinate system: {0}")]
    UnknownCrs(Crs),
    /// Any other failure of the engine.
    #[error("{0}")]
    Generic(String),
}

/// Identifier of a coordinate reference system, e.g. `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(String);

impl Crs {
    /// Creates a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// WGS84 geographic coordinates.
    pub fn wgs84() -> Self {
        Self::new("EPSG:4326")
    }

    /// Spherical mercator used by most web maps.
    pub fn web_mercator() -> Self {
        Self::new("EPSG:3857")
    }

    /// String value of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Projection from one fixed coordinate system into another.
pub trait Projection {
    /// Projects a single point.
    fn project(&self, point: &Point) -> Result<Point, ProjectionError>;
}

/// Engine able to transform points between any pair of coordinate systems it knows.
pub trait CoordinateTransform {
    /// Transforms a point from `src` into `dst` coordinates.
    fn transform(&self, src: &Crs, dst: &Crs, point: &Point) -> Result<Point, ProjectionError>;

    /// Binds the engine to a fixed pair of coordinate systems.
    fn projection<'a>(&'a self, src: &'a Crs, dst: &'a Crs) -> BoundTransform<'a, Self>
    where
        Self: Sized,
    {
        BoundTransform {
            engine: self,
            src,
            dst,
        }
    }
}

/// [`CoordinateTransform`] bound to a source and target coordinate systems.
pub struct BoundTransform<'a, T> {
    engine: &'a T,
    src: &'a Crs,
    dst: &'a Crs,
}

impl<T: CoordinateTransform> Projection for BoundTransform<'_, T> {
    fn project(&self, point: &Point) -> Result<Point, ProjectionError> {
        self.engine.transform(self.src, self.dst, point)
    }
}

/// Projection that returns points unchanged.
#[derive(Debug, Default, Copy, Clone)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn project(&self, point: &Point) -> Result<Point, ProjectionError> {
        Ok(*point)
    }
}

impl CoordinateTransform for IdentityProjection {
    fn transform(&self, src: &Crs, dst: &Crs, point: &Point) -> Result<Point, ProjectionError> {
        if src == dst {
            Ok(*point)
        } else {
            Err(ProjectionError::UnknownCrs(dst.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{Feature, Line, PolyLine, VecmapTypesError};

    struct Shift(f64);

    impl Projection for Shift {
        fn project(&self, point: &Point) -> Result<Point, ProjectionError> {
            if point.x < 0.0 {
                return Err(ProjectionError::OutOfDomain(point.to_string()));
            }

            Ok(Point::new(point.x + self.0, point.y))
        }
    }

    #[test]
    fn project_returns_new_geometry() {
        let line = Feature::from(PolyLine::from(Line::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
        ])));

        let projected = line.project(&Shift(10.0)).unwrap();
        let Feature::PolyLine(projected) = projected else {
            panic!("invalid geometry type");
        };
        assert_eq!(
            projected.lines()[0].points(),
            &[Point::new(10.0, 0.0), Point::new(11.0, 1.0)]
        );
        assert_eq!(line.bounds().min, Point::new(0.0, 0.0));
    }

    #[test]
    fn failing_point_fails_geometry() {
        let line = PolyLine::from(Line::new(vec![Point::new(0.0, 0.0), Point::new(-1.0, 1.0)]));
        assert_matches!(
            line.project(&Shift(1.0)),
            Err(VecmapTypesError::Projection(ProjectionError::OutOfDomain(_)))
        );
    }

    #[test]
    fn identity_transform() {
        let point = Point::new(3.0, 4.0);
        let wgs84 = Crs::wgs84();
        let projection = IdentityProjection.projection(&wgs84, &wgs84);
        assert_eq!(projection.project(&point), Ok(point));

        assert_matches!(
            IdentityProjection.transform(&wgs84, &Crs::web_mercator(), &point),
            Err(ProjectionError::UnknownCrs(_))
        );
    }
}
