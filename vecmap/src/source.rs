//! Feature source backed by a shapefile and its attribute table.

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use log::{info, warn};
use vecmap_formats::{DbfTable, DbfValue, ShapeFile, ShapeRecord};
use vecmap_types::{FeatureType, Rectangle};

use crate::error::VecmapError;

/// Geometries of a `.shp` file paired with the rows of the sibling `.dbf` table.
///
/// Rows are matched with records by their position in the files. If the table is missing, features have no
/// attributes.
#[derive(Debug, Clone)]
pub struct ShapefileSource {
    path: PathBuf,
    shapes: ShapeFile,
    attributes: Option<DbfTable>,
}

impl ShapefileSource {
    /// Opens the shapefile at `path` and the `.dbf` file with the same stem next to it.
    ///
    /// `path` may point to the `.shp` file or omit the extension. `encoding` is used to decode text attributes, see
    /// [`DbfTable::open`].
    pub fn open(
        path: impl AsRef<Path>,
        encoding: Option<&'static Encoding>,
    ) -> Result<Self, VecmapError> {
        let path = path.as_ref().with_extension("shp");
        let shapes = ShapeFile::open(&path)?;

        let attributes = match sibling_table(&path) {
            Some(dbf_path) => {
                let table = DbfTable::open(&dbf_path, encoding)?;
                if table.record_count() != shapes.record_count() {
                    warn!(
                        "Attribute table {dbf_path:?} has {} rows, but shapefile {path:?} has {} records",
                        table.record_count(),
                        shapes.record_count()
                    );
                }

                Some(table)
            }
            None => {
                warn!("No attribute table found for shapefile {path:?}");
                None
            }
        };

        info!(
            "Opened shapefile source {path:?}: {} features of type {:?}",
            shapes.records().len(),
            shapes.feature_type()
        );

        Ok(Self {
            path,
            shapes,
            attributes,
        })
    }

    /// Path of the `.shp` file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of geometries in the source.
    pub fn feature_type(&self) -> FeatureType {
        self.shapes.feature_type()
    }

    /// Bounding rectangle declared in the shapefile header.
    pub fn extents(&self) -> Rectangle {
        self.shapes.extents()
    }

    /// All records with geometries.
    pub fn records(&self) -> &[ShapeRecord] {
        self.shapes.records()
    }

    /// Attribute table, if the source has one.
    pub fn attributes(&self) -> Option<&DbfTable> {
        self.attributes.as_ref()
    }

    /// Records whose bounding rectangles touch or overlap the given rectangle.
    pub fn features_in<'a>(
        &'a self,
        rect: &'a Rectangle,
    ) -> impl Iterator<Item = &'a ShapeRecord> + 'a {
        self.shapes
            .records()
            .iter()
            .filter(move |record| !record.feature.bounds().intersect(rect).is_empty())
    }

    /// Value of the attribute `field` of the record. Field names are case-insensitive.
    ///
    /// Returns `None` if the source has no attribute table, the table has no such field or no row for the record.
    pub fn attribute(&self, record: &ShapeRecord, field: &str) -> Option<&DbfValue> {
        let table = self.attributes.as_ref()?;
        table.row(record.index)?.get_by_name(table, field)
    }
}

fn sibling_table(shp_path: &Path) -> Option<PathBuf> {
    ["dbf", "DBF"]
        .into_iter()
        .map(|extension| shp_path.with_extension(extension))
        .find(|path| path.is_file())
}
