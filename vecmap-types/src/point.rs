use std::fmt::{Display, Formatter};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// 2d point in map units.
///
/// Equality is exact floating point equality, without any tolerance.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// X coordinate.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Euclidean distance to the other point.
    pub fn distance(&self, other: &Point) -> f64 {
        (*other - *self).norm()
    }

    /// Returns true if both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Sub for Point {
    type Output = Vector2<f64>;

    fn sub(self, rhs: Self) -> Self::Output {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add<Vector2<f64>> for Point {
    type Output = Point;

    fn add(self, rhs: Vector2<f64>) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for nalgebra::Point2<f64> {
    fn from(value: Point) -> Self {
        nalgebra::Point2::new(value.x, value.y)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn exact_equality() {
        assert_eq!(Point::new(1.0, 2.0), Point::new(1.0, 2.0));
        assert_ne!(Point::new(1.0, 2.0), Point::new(1.0, 2.0 + f64::EPSILON * 2.0));
    }

    #[test]
    fn distance() {
        assert_abs_diff_eq!(Point::new(0.0, 0.0).distance(&Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn display_is_culture_invariant() {
        assert_eq!(Point::new(1.5, -20.0).to_string(), "1.5 -20");
    }
}
