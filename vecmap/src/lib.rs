//! Vecmap is a toolkit for turning vector GIS data into map tiles. It reads Esri shapefiles with their dBase
//! attribute tables, reads and writes WKT, reads WKB, simplifies geometries and calculates tile grids of a zoom
//! level pyramid.
//!
//! # Main components of Vecmap
//!
//! * [`ShapefileSource`] opens a `.shp` file together with its `.dbf` table and answers which features fall into a
//!   given map rectangle and what attributes they have;
//! * [`TilePyramid`] converts between map coordinates and [tile indices](TileIndex): which tiles cover a map area,
//!   what map area a tile covers, and Bing-style quad keys;
//! * geometries themselves live in the [`vecmap_types`] crate, and format readers in [`vecmap_formats`]. Both are
//!   re-exported from this crate.
//!
//! A typical tile generation loop looks like this:
//!
//! ```no_run
//! use vecmap::{ShapefileSource, TilePyramid};
//!
//! let source = ShapefileSource::open("countries.shp", None)?;
//! let pyramid = TilePyramid::web(8);
//! for zoom in 0..=pyramid.max_zoom() {
//!     let tolerance = pyramid.map_units_per_pixel(zoom)?;
//!     for tile in pyramid.iter_tiles(&source.extents(), zoom)? {
//!         let extent = pyramid.tile_to_map_rect(tile)?;
//!         for record in source.features_in(&extent.map_rect) {
//!             let _simplified = record.feature.simplify(tolerance);
//!         }
//!     }
//! }
//! # Ok::<(), vecmap::error::VecmapError>(())
//! ```
//!
//! All parsing happens when a source is opened. After that all values are immutable, so work on different tiles can
//! be spread over threads without any synchronization.

pub mod error;
mod source;
pub mod tile_pyramid;

pub use source::ShapefileSource;
pub use tile_pyramid::{
    TileExtent, TileIndex, TilePyramid, TilePyramidConfig, TileRange, VerticalDirection,
};

// Reexport types and formats
pub use vecmap_formats;
pub use vecmap_types;
