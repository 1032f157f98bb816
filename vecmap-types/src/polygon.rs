//! Polygons as flat lists of rings.
//!
//! A [`Polygon`] may describe several physical polygons at once (OGC MultiPolygon). The rings are ordered so that
//! every physical polygon starts with a clockwise exterior ring followed by its counterclockwise holes. The next
//! clockwise ring starts a new physical polygon. This convention is not enforced, consumers re-derive the groups with
//! [`Polygon::physical_polygons`].

use serde::{Deserialize, Serialize};

use crate::projection::Projection;
use crate::rect::Rectangle;
use crate::ring::Ring;
use crate::VecmapTypesError;

/// Ordered set of rings.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    rings: Vec<Ring>,
}

impl Polygon {
    /// Creates a new polygon.
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    /// Rings of the polygon.
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Consumes the polygon returning its rings.
    pub fn into_rings(self) -> Vec<Ring> {
        self.rings
    }

    /// Whether there are no rings.
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Splits the rings into physical polygons by winding transitions.
    ///
    /// The first ring always starts a group. Every following clockwise ring starts a new group, counterclockwise
    /// rings are added to the current one.
    pub fn physical_polygons(&self) -> Vec<&[Ring]> {
        let mut groups = vec![];
        let mut start = 0;
        for (index, ring) in self.rings.iter().enumerate().skip(1) {
            if ring.is_clockwise() {
                groups.push(&self.rings[start..index]);
                start = index;
            }
        }

        if start < self.rings.len() {
            groups.push(&self.rings[start..]);
        }

        groups
    }

    /// Bounding rectangle of all rings.
    pub fn bounds(&self) -> Rectangle {
        self.rings.iter().map(Ring::bounds).collect()
    }

    /// Sum of signed areas of all rings. Holes have negative area, so for a well-formed polygon this is the area
    /// covered by the polygon.
    pub fn area(&self) -> f64 {
        self.rings.iter().map(Ring::area).sum()
    }

    /// Returns a copy with every ring simplified.
    pub fn simplify(&self, tolerance: f64) -> Self {
        Self {
            rings: self.rings.iter().map(|r| r.simplify(tolerance)).collect(),
        }
    }

    /// Returns a copy of the polygon with all points projected.
    pub fn project(&self, projection: &(impl Projection + ?Sized)) -> Result<Self, VecmapTypesError> {
        Ok(Self {
            rings: self
                .rings
                .iter()
                .map(|r| r.project(projection))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<Vec<Ring>> for Polygon {
    fn from(rings: Vec<Ring>) -> Self {
        Self::new(rings)
    }
}

impl From<Ring> for Polygon {
    fn from(ring: Ring) -> Self {
        Self::new(vec![ring])
    }
}
