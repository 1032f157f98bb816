//! Readers of vector data formats producing [`vecmap_types`] geometries.
//!
//! * [`shapefile`] - Esri shapefile geometry stream (`.shp`);
//! * [`dbf`] - dBase III attribute tables (`.dbf`) that accompany shapefiles;
//! * [`wkt`] - Well-Known Text reader and writer;
//! * [`wkb`] - Well-Known Binary reader.
//!
//! Binary readers parse the whole input eagerly and fail with [`VecmapFormatsError::UnexpectedEof`] instead of
//! panicking when the data is truncated.

mod cursor;
pub mod dbf;
pub mod error;
pub mod shapefile;
pub mod wkb;
pub mod wkt;

pub use dbf::{DbfColumn, DbfDate, DbfFieldType, DbfRow, DbfTable, DbfValue, DEFAULT_ENCODING};
pub use error::VecmapFormatsError;
pub use shapefile::{ShapeFile, ShapeRecord};

// Reexport encodings for `DbfTable`
pub use encoding_rs;
