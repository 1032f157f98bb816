use serde::{Deserialize, Serialize};

use crate::error::VecmapTypesError;
use crate::point::Point;

/// Axis aligned bounding box in map units.
///
/// A default rectangle is *empty*: its minimum corner is at `(+inf, +inf)` and its maximum corner is at
/// `(-inf, -inf)`, so that the union with any other rectangle gives that other rectangle. Operations such as
/// [`Rectangle::intersect`] may produce inverted rectangles, which are also considered empty.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Minimum corner.
    pub min: Point,
    /// Maximum corner.
    pub max: Point,
}

impl Default for Rectangle {
    fn default() -> Self {
        Self::empty()
    }
}

impl Rectangle {
    /// Creates a new rectangle from its corners. Corners are taken as given.
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates a new rectangle from the coordinates of its corners.
    pub const fn from_coords(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            min: Point::new(x_min, y_min),
            max: Point::new(x_max, y_max),
        }
    }

    /// An empty rectangle.
    pub const fn empty() -> Self {
        Self::from_coords(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY)
    }

    /// Bounding rectangle of the given points. Returns an empty rectangle for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        points.into_iter().fold(Self::empty(), |mut rect, p| {
            rect.expand_to_include(p);
            rect
        })
    }

    /// Whether the rectangle is empty (inverted on at least one axis).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Minimum x.
    pub fn x_min(&self) -> f64 {
        self.min.x
    }

    /// Maximum x.
    pub fn x_max(&self) -> f64 {
        self.max.x
    }

    /// Minimum y.
    pub fn y_min(&self) -> f64 {
        self.min.y
    }

    /// Maximum y.
    pub fn y_max(&self) -> f64 {
        self.max.y
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center point.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Moves the rectangle so that its center is at the given point. Size stays the same.
    pub fn set_center(&mut self, center: Point) {
        let shift = center - self.center();
        self.min = self.min + shift;
        self.max = self.max + shift;
    }

    /// Ratio of width to height.
    pub fn aspect_ratio_of_width(&self) -> f64 {
        self.width() / self.height()
    }

    /// Grows the smaller dimension of the rectangle around its center so that `width / height == ratio`.
    ///
    /// The rectangle never shrinks.
    pub fn set_aspect_ratio_of_width(&mut self, ratio: f64) -> Result<(), VecmapTypesError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(VecmapTypesError::InvalidAspectRatio(ratio));
        }

        let center = self.center();
        let (width, height) = if self.aspect_ratio_of_width() < ratio {
            (self.height() * ratio, self.height())
        } else {
            (self.width(), self.width() / ratio)
        };

        self.min = Point::new(center.x - width / 2.0, center.y - height / 2.0);
        self.max = Point::new(center.x + width / 2.0, center.y + height / 2.0);

        Ok(())
    }

    /// Smallest rectangle containing both rectangles.
    pub fn union(&self, other: &Rectangle) -> Self {
        Self::from_coords(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
        )
    }

    /// Common part of two rectangles. The result is empty (inverted) if the rectangles do not intersect.
    pub fn intersect(&self, other: &Rectangle) -> Self {
        Self::from_coords(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
        )
    }

    /// Whether the rectangles overlap. Intervals are treated as half-open, so rectangles that only touch each other
    /// do not overlap.
    pub fn overlaps(&self, other: &Rectangle) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Whether the point is inside the rectangle or on its border.
    pub fn contains(&self, point: &Point) -> bool {
        self.min.x <= point.x
            && self.max.x >= point.x
            && self.min.y <= point.y
            && self.max.y >= point.y
    }

    /// Extends the rectangle to include the point.
    pub fn expand_to_include(&mut self, point: &Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Returns a copy of the rectangle moved outwards by `amount` on every side.
    pub fn buffer(&self, amount: f64) -> Self {
        Self::from_coords(
            self.min.x - amount,
            self.min.y - amount,
            self.max.x + amount,
            self.max.y + amount,
        )
    }
}

impl FromIterator<Rectangle> for Rectangle {
    fn from_iter<T: IntoIterator<Item = Rectangle>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Rectangle::empty(), |acc, rect| acc.union(&rect))
    }
}
