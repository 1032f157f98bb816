//! Geometry model of `vecmap`.
//!
//! All geometries are plain owned values in map units:
//!
//! * [`Point`] - a pair of coordinates;
//! * [`Line`] and [`PolyLine`] - open sequences of points;
//! * [`Ring`] and [`Polygon`] - closed contours and sets of them;
//! * [`Rectangle`] - axis aligned bounding box.
//!
//! [`Feature`] joins all of them into one sum type that format readers produce. Transformations, such as
//! [`simplification`](simplify) or [`projection`](projection), never modify geometries in place but return new
//! instances, so parsed data can be shared between threads freely.

pub mod error;
mod feature;
mod line;
mod point;
mod polygon;
pub mod projection;
mod rect;
mod ring;
pub mod simplify;

pub use error::VecmapTypesError;
pub use feature::{Feature, FeatureType, ShapeType};
pub use line::{Line, PolyLine};
pub use point::Point;
pub use polygon::Polygon;
pub use projection::{CoordinateTransform, Crs, IdentityProjection, Projection, ProjectionError};
pub use rect::Rectangle;
pub use ring::{Ring, Winding};
