//! One closed contour of a polygon.
//!
//! Unlike a typical "closed contour" that never repeats its first point, a [`Ring`] stores exactly the points the
//! source format gave it. A ring read from a shapefile usually repeats the first point at the end, while a ring
//! constructed by hand may not. [`Ring::close`] appends the missing point when needed.

use serde::{Deserialize, Serialize};

use crate::point::Point;
use crate::projection::Projection;
use crate::rect::Rectangle;
use crate::simplify::simplify;
use crate::VecmapTypesError;

/// Winding direction of a ring.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Winding {
    /// Clockwise winding. Exterior rings of a polygon.
    Clockwise,
    /// Counterclockwise winding. Holes of a polygon.
    CounterClockwise,
}

/// Ordered sequence of points forming one contour of a polygon.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    points: Vec<Point>,
}

impl Ring {
    /// Creates a new ring. Points are stored as given, the ring is not closed automatically.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Points of the ring.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consumes the ring returning its points.
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Number of points in the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the ring contains no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A ring is closed when it has more than three points and the last one equals the first one.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 3 && self.points.first() == self.points.last()
    }

    /// Appends a copy of the first point to the end of the ring, if the ring is not closed and has more than two
    /// points. Otherwise does nothing.
    pub fn close(&mut self) {
        if self.points.len() > 2 && !self.is_closed() {
            let first = self.points[0];
            self.points.push(first);
        }
    }

    /// Consuming version of [`Ring::close`].
    pub fn closed(mut self) -> Self {
        self.close();
        self
    }

    /// Signed area of the ring. Positive area means clockwise winding.
    ///
    /// For a ring that is not closed, the segment from the last point back to the first one is included.
    pub fn area(&self) -> f64 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };

        let mut aggr = 0.0;
        let mut prev = first;
        for p in self.points.iter().skip(1).chain(if self.is_closed() {
            None
        } else {
            Some(first)
        }) {
            aggr += prev.x * p.y - p.x * prev.y;
            prev = p;
        }

        -0.5 * aggr
    }

    /// Winding of the ring, derived from the sign of [`Ring::area`].
    pub fn winding(&self) -> Winding {
        if self.area() >= 0.0 {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }

    /// Whether the ring is wound clockwise.
    pub fn is_clockwise(&self) -> bool {
        self.winding() == Winding::Clockwise
    }

    /// Bounding rectangle of the ring.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::from_points(&self.points)
    }

    /// Returns a new ring with the reversed order of points.
    pub fn reversed(&self) -> Self {
        Self {
            points: self.points.iter().rev().copied().collect(),
        }
    }

    /// Returns a simplified copy of the ring. See [`simplify`].
    pub fn simplify(&self, tolerance: f64) -> Self {
        Self {
            points: simplify(&self.points, tolerance, true),
        }
    }

    /// Returns a copy of the ring with all points projected.
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

impl From<Vec<Point>> for Ring {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point> for Ring {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Ring {
        coords.iter().map(|&c| Point::from(c)).collect()
    }

    #[test]
    fn is_closed_requires_four_points() {
        assert!(!ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]).is_closed());
        assert!(ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).is_closed());
        assert!(!ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).is_closed());
    }

    #[test]
    fn close_is_idempotent() {
        let mut once = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        once.close();
        assert_eq!(once.len(), 4);
        assert!(once.is_closed());

        let mut twice = once.clone();
        twice.close();
        assert_eq!(once, twice);
    }

    #[test]
    fn close_ignores_short_rings() {
        let mut short = ring(&[(0.0, 0.0), (1.0, 0.0)]);
        short.close();
        assert_eq!(short.len(), 2);

        let mut empty = Ring::default();
        empty.close();
        assert!(empty.is_empty());
    }

    #[test]
    fn winding() {
        let cw = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).closed();
        assert_abs_diff_eq!(cw.area(), 1.0);
        assert!(cw.is_clockwise());
        assert_eq!(cw.winding(), Winding::Clockwise);

        let ccw = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).closed();
        assert_abs_diff_eq!(ccw.area(), -1.0);
        assert!(!ccw.is_clockwise());

        assert_eq!(ccw.reversed().winding(), Winding::Clockwise);
    }

    #[test]
    fn area_of_open_ring_wraps_around() {
        let open = ring(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
        assert_abs_diff_eq!(open.area(), 4.0);
        assert_abs_diff_eq!(open.clone().closed().area(), 4.0);
    }

    #[test]
    fn degenerate_ring_counts_as_clockwise() {
        assert!(Ring::default().is_clockwise());
        assert!(ring(&[(0.0, 0.0), (1.0, 1.0)]).is_clockwise());
    }

    #[test]
    fn bounds() {
        let r = ring(&[(0.0, 0.0), (0.0, 5.0), (5.0, 6.0), (5.0, 0.0)]);
        assert_eq!(r.bounds(), Rectangle::from_coords(0.0, 0.0, 5.0, 6.0));
    }
}
