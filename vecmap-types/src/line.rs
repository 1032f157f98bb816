use serde::{Deserialize, Serialize};

use crate::point::Point;
use crate::projection::Projection;
use crate::rect::Rectangle;
use crate::simplify::simplify;
use crate::VecmapTypesError;

/// Open sequence of points. There is no requirement for the first and the last points to be connected.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    points: Vec<Point>,
}

impl Line {
    /// Creates a new line.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Points of the line.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consumes the line returning its points.
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the line has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total length of all segments.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    /// Bounding rectangle.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::from_points(&self.points)
    }

    /// Returns a simplified copy of the line. See [`simplify`].
    pub fn simplify(&self, tolerance: f64) -> Self {
        Self {
            points: simplify(&self.points, tolerance, false),
        }
    }

    /// Returns a copy of the line with all points projected.
    pub fn project(&self, projection: &(impl Projection + ?Sized)) -> Result<Self, VecmapTypesError> {
        Ok(Self {
            points: self
                .points
                .iter()
                .map(|p| projection.project(p))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<Vec<Point>> for Line {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point> for Line {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Set of lines. Each line is one component of the geometry (OGC MultiLineString).
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    lines: Vec<Line>,
}

impl PolyLine {
    /// Creates a new polyline.
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Components of the polyline.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Consumes the polyline returning its components.
    pub fn into_lines(self) -> Vec<Line> {
        self.lines
    }

    /// Whether there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total length of all lines.
    pub fn length(&self) -> f64 {
        self.lines.iter().map(Line::length).sum()
    }

    /// Bounding rectangle of all lines.
    pub fn bounds(&self) -> Rectangle {
        self.lines.iter().map(Line::bounds).collect()
    }

    /// Returns a copy with every line simplified.
    pub fn simplify(&self, tolerance: f64) -> Self {
        Self {
            lines: self.lines.iter().map(|l| l.simplify(tolerance)).collect(),
        }
    }

    /// Returns a copy of the polyline with all points projected.
    pub fn project(&self, projection: &(impl Projection + ?Sized)) -> Result<Self, VecmapTypesError> {
        Ok(Self {
            lines: self
                .lines
                .iter()
                .map(|l| l.project(projection))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<Vec<Line>> for PolyLine {
    fn from(lines: Vec<Line>) -> Self {
        Self::new(lines)
    }
}

impl From<Line> for PolyLine {
    fn from(line: Line) -> Self {
        Self::new(vec![line])
    }
}
