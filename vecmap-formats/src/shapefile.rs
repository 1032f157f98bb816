//! Reader of the Esri shapefile geometry stream (`.shp`).
//!
//! The whole file is parsed when a [`ShapeFile`] is created, a failed parse never gives out partial results.
//!
//! Only 2d and measured point, polyline and polygon files are supported. A file declaring the null shape type is
//! read as a file without geometries of [`FeatureType::None`]. Within a file, records of shape types
//! that are not supported are skipped, since every record declares its own length.

use std::path::Path;

use log::debug;
use vecmap_types::{Feature, FeatureType, Line, Point, PolyLine, Polygon, Rectangle, Ring, ShapeType};

use crate::cursor::ByteCursor;
use crate::error::VecmapFormatsError;

/// Magic number at the beginning of every shapefile.
pub const FILE_CODE: u32 = 9994;

/// Size of the main file header in 16-bit words.
const HEADER_WORDS: usize = 50;

/// Size of a record header in 16-bit words.
const RECORD_HEADER_WORDS: usize = 4;

/// One geometry record of the shapefile.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    /// Position of the record in the file, starting from 0. Null and skipped records also take a position, so this
    /// index can be used to look up the attributes of the record in the accompanying `.dbf` table.
    pub index: usize,
    /// Geometry of the record.
    pub feature: Feature,
}

/// Parsed shapefile.
#[derive(Debug, Clone)]
pub struct ShapeFile {
    shape_type: ShapeType,
    feature_type: FeatureType,
    extents: Rectangle,
    records: Vec<ShapeRecord>,
    record_count: usize,
}

impl ShapeFile {
    /// Reads and parses the file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VecmapFormatsError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        debug!("Read {} bytes from shapefile {path:?}", data.len());

        Self::from_bytes(&data)
    }

    /// Parses shapefile contents.
    pub fn from_bytes(data: &[u8]) -> Result<Self, VecmapFormatsError> {
        let mut header = ByteCursor::new(data);
        let file_code = header.u32_be()?;
        if file_code != FILE_CODE {
            return Err(VecmapFormatsError::InvalidFormat(format!(
                "invalid shapefile code {file_code}, expected {FILE_CODE}"
            )));
        }

        header.skip(20)?;
        let file_length = header.u32_be()? as usize;
        let _version = header.u32_le()?;
        let shape_code = header.u32_le()?;
        let shape_type = ShapeType::from_code(shape_code)
            .ok_or(VecmapFormatsError::UnsupportedShapeType(shape_code))?;
        let feature_type = shape_type
            .feature_type()
            .map_err(|_| VecmapFormatsError::UnsupportedShapeType(shape_code))?;

        let x_min = header.f64_le()?;
        let y_min = header.f64_le()?;
        let x_max = header.f64_le()?;
        let y_max = header.f64_le()?;
        // Z and M ranges.
        header.skip(32)?;

        let mut records = vec![];
        let mut record_count = 0;
        let mut offset = HEADER_WORDS;
        while offset < file_length {
            let record_start = offset * 2;
            let mut record_header =
                ByteCursor::new(data.get(record_start..).ok_or(VecmapFormatsError::UnexpectedEof)?);
            let _record_number = record_header.u32_be()?;
            let content_length = record_header.u32_be()? as usize;

            let content_start = record_start + RECORD_HEADER_WORDS * 2;
            let content = content_start
                .checked_add(content_length * 2)
                .and_then(|content_end| data.get(content_start..content_end))
                .ok_or(VecmapFormatsError::UnexpectedEof)?;

            if let Some(feature) = read_record(content, record_count)? {
                records.push(ShapeRecord {
                    index: record_count,
                    feature,
                });
            }

            record_count += 1;
            offset += content_length + RECORD_HEADER_WORDS;
        }

        debug!(
            "Parsed shapefile of type {shape_type:?}: {} features in {record_count} records",
            records.len()
        );

        Ok(Self {
            shape_type,
            feature_type,
            extents: Rectangle::from_coords(x_min, y_min, x_max, y_max),
            records,
            record_count,
        })
    }

    /// Shape type declared in the file header.
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// Kind of geometries in the file.
    pub fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    /// Bounding box declared in the file header.
    pub fn extents(&self) -> Rectangle {
        self.extents
    }

    /// Records that have geometry, in file order.
    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    /// Total number of records in the file, including null and skipped ones.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Iterates over geometries of the file.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.records.iter().map(|r| &r.feature)
    }

    /// Consumes the file returning its geometries.
    pub fn into_features(self) -> Vec<Feature> {
        self.records.into_iter().map(|r| r.feature).collect()
    }

    /// Consumes the file returning its records.
    pub fn into_records(self) -> Vec<ShapeRecord> {
        self.records
    }
}

/// Reads record content (starting with the shape type). Returns `None` for records without geometry or with
/// unsupported shape type.
fn read_record(content: &[u8], index: usize) -> Result<Option<Feature>, VecmapFormatsError> {
    let mut cursor = ByteCursor::new(content);
    let code = cursor.u32_le()?;

    let feature = match ShapeType::from_code(code) {
        Some(ShapeType::Null) => return Ok(None),
        Some(shape_type @ (ShapeType::Point | ShapeType::PointM)) => {
            let point = Point::new(cursor.f64_le()?, cursor.f64_le()?);
            if shape_type.is_measured() {
                let _measure = cursor.f64_le()?;
            }

            Feature::Point(point)
        }
        Some(shape_type @ (ShapeType::PolyLine | ShapeType::PolyLineM)) => {
            let parts = read_parts(&mut cursor, shape_type.is_measured())?;
            Feature::PolyLine(PolyLine::new(parts.into_iter().map(Line::new).collect()))
        }
        Some(shape_type @ (ShapeType::Polygon | ShapeType::PolygonM)) => {
            let parts = read_parts(&mut cursor, shape_type.is_measured())?;
            Feature::Polygon(Polygon::new(parts.into_iter().map(Ring::new).collect()))
        }
        _ => {
            debug!(
                "Skipping record {index} with unsupported shape type {code} ({} bytes)",
                content.len()
            );
            return Ok(None);
        }
    };

    Ok(Some(feature))
}

/// Reads the multipart payload shared by polyline and polygon records.
fn read_parts(
    cursor: &mut ByteCursor<&[u8]>,
    is_measured: bool,
) -> Result<Vec<Vec<Point>>, VecmapFormatsError> {
    // Bounding box of the record.
    cursor.skip(32)?;
    let num_parts = cursor.u32_le()? as usize;
    let num_points = cursor.u32_le()? as usize;

    cursor.check_count(num_parts, 4)?;
    let mut part_starts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        part_starts.push(cursor.u32_le()? as usize);
    }

    cursor.check_count(num_points, 16)?;
    let mut parts: Vec<Vec<Point>> = Vec::with_capacity(num_parts);
    let mut current = vec![];
    let mut part = 0;
    for point_index in 0..num_points {
        while part + 1 < num_parts && point_index >= part_starts[part + 1] {
            parts.push(std::mem::take(&mut current));
            part += 1;
        }

        current.push(Point::new(cursor.f64_le()?, cursor.f64_le()?));
    }

    if num_parts > 0 {
        parts.push(current);
        // Trailing parts that start after the last point are empty.
        parts.resize_with(num_parts, Vec::new);
    }

    if is_measured {
        let measures_size = 16 + num_points * 8;
        // Measures are optional in measured records.
        if cursor.remaining() >= measures_size {
            cursor.skip(measures_size)?;
        }
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use bytes::BufMut;

    use super::*;

    /// Writes shapefiles for tests.
    struct ShapeFileWriter {
        shape_type: u32,
        records: Vec<Vec<u8>>,
    }

    impl ShapeFileWriter {
        fn new(shape_type: ShapeType) -> Self {
            Self::with_code(shape_type.code())
        }

        fn with_code(shape_type: u32) -> Self {
            Self {
                shape_type,
                records: vec![],
            }
        }

        fn null(mut self) -> Self {
            let mut content = vec![];
            content.put_u32_le(0);
            self.records.push(content);
            self
        }

        fn point(mut self, x: f64, y: f64, measure: Option<f64>) -> Self {
            let mut content = vec![];
            content.put_u32_le(if measure.is_some() { 21 } else { 1 });
            content.put_f64_le(x);
            content.put_f64_le(y);
            if let Some(m) = measure {
                content.put_f64_le(m);
            }
            self.records.push(content);
            self
        }

        fn multipart(mut self, code: u32, parts: &[&[(f64, f64)]], measured: bool) -> Self {
            let mut content = vec![];
            content.put_u32_le(code);
            for _ in 0..4 {
                content.put_f64_le(0.0);
            }
            let num_points: usize = parts.iter().map(|p| p.len()).sum();
            content.put_u32_le(parts.len() as u32);
            content.put_u32_le(num_points as u32);
            let mut start = 0;
            for part in parts {
                content.put_u32_le(start);
                start += part.len() as u32;
            }
            for &(x, y) in parts.iter().flat_map(|p| p.iter()) {
                content.put_f64_le(x);
                content.put_f64_le(y);
            }
            if measured {
                content.put_f64_le(0.0);
                content.put_f64_le(10.0);
                for i in 0..num_points {
                    content.put_f64_le(i as f64);
                }
            }
            self.records.push(content);
            self
        }

        fn raw(mut self, code: u32, payload: &[u8]) -> Self {
            let mut content = vec![];
            content.put_u32_le(code);
            content.put_slice(payload);
            self.records.push(content);
            self
        }

        fn build(self) -> Vec<u8> {
            let records_length: usize = self.records.iter().map(|r| r.len() + 8).sum();
            let mut data = vec![];
            data.put_u32(FILE_CODE);
            data.put_bytes(0, 20);
            data.put_u32(((100 + records_length) / 2) as u32);
            data.put_u32_le(1000);
            data.put_u32_le(self.shape_type);
            for v in [-180.0, -90.0, 180.0, 90.0, 0.0, 0.0, 0.0, 0.0] {
                data.put_f64_le(v);
            }

            for (i, record) in self.records.into_iter().enumerate() {
                data.put_u32(i as u32 + 1);
                data.put_u32((record.len() / 2) as u32);
                data.put_slice(&record);
            }

            data
        }
    }

    #[test]
    fn invalid_file_code() {
        let mut data = ShapeFileWriter::new(ShapeType::Point)
            .point(1.0, 2.0, None)
            .build();
        data[3] = 0;
        assert_matches!(
            ShapeFile::from_bytes(&data),
            Err(VecmapFormatsError::InvalidFormat(_))
        );
    }

    #[test]
    fn unsupported_file_shape_type() {
        let data = ShapeFileWriter::new(ShapeType::MultiPoint).build();
        assert_matches!(
            ShapeFile::from_bytes(&data),
            Err(VecmapFormatsError::UnsupportedShapeType(8))
        );

        let data = ShapeFileWriter::with_code(2).build();
        assert_matches!(
            ShapeFile::from_bytes(&data),
            Err(VecmapFormatsError::UnsupportedShapeType(2))
        );
    }

    #[test]
    fn header() {
        let data = ShapeFileWriter::new(ShapeType::PolygonM).build();
        let file = ShapeFile::from_bytes(&data).unwrap();
        assert_eq!(file.shape_type(), ShapeType::PolygonM);
        assert_eq!(file.feature_type(), FeatureType::Polygon);
        assert_eq!(
            file.extents(),
            Rectangle::from_coords(-180.0, -90.0, 180.0, 90.0)
        );
        assert_eq!(file.records().len(), 0);
    }

    #[test]
    fn points() {
        let data = ShapeFileWriter::new(ShapeType::Point)
            .point(1.0, 2.0, None)
            .null()
            .point(3.0, 4.0, Some(100.0))
            .build();
        let file = ShapeFile::from_bytes(&data).unwrap();

        assert_eq!(file.record_count(), 3);
        assert_eq!(
            file.records(),
            &[
                ShapeRecord {
                    index: 0,
                    feature: Feature::Point(Point::new(1.0, 2.0)),
                },
                ShapeRecord {
                    index: 2,
                    feature: Feature::Point(Point::new(3.0, 4.0)),
                },
            ]
        );
    }

    #[test]
    fn polygon_parts() {
        let outer: &[(f64, f64)] = &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)];
        let hole: &[(f64, f64)] = &[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)];
        let data = ShapeFileWriter::new(ShapeType::Polygon)
            .multipart(5, &[outer, hole], false)
            .build();
        let features = ShapeFile::from_bytes(&data).unwrap().into_features();

        assert_eq!(features.len(), 1);
        let Feature::Polygon(polygon) = &features[0] else {
            panic!("invalid geometry type");
        };
        assert_eq!(polygon.rings().len(), 2);
        assert_eq!(polygon.rings()[0].len(), 5);
        assert_eq!(polygon.rings()[1].points()[1], Point::new(2.0, 1.0));
        assert!(polygon.rings()[0].is_clockwise());
        assert!(!polygon.rings()[1].is_clockwise());
    }

    #[test]
    fn rings_are_not_closed_by_reader() {
        let open: &[(f64, f64)] = &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0)];
        let data = ShapeFileWriter::new(ShapeType::Polygon)
            .multipart(5, &[open], false)
            .build();
        let features = ShapeFile::from_bytes(&data).unwrap().into_features();
        let Feature::Polygon(polygon) = &features[0] else {
            panic!("invalid geometry type");
        };
        assert_eq!(polygon.rings()[0].len(), 3);
        assert!(!polygon.rings()[0].is_closed());
    }

    #[test]
    fn measured_polylines() {
        let first: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 1.0)];
        let second: &[(f64, f64)] = &[(5.0, 5.0), (6.0, 5.0), (7.0, 4.0)];
        let data = ShapeFileWriter::new(ShapeType::PolyLineM)
            .multipart(23, &[first, second], true)
            .multipart(23, &[second], false)
            .build();
        let file = ShapeFile::from_bytes(&data).unwrap();
        assert_eq!(file.feature_type(), FeatureType::Polyline);

        let features = file.into_features();
        assert_eq!(features.len(), 2);
        let Feature::PolyLine(poly_line) = &features[0] else {
            panic!("invalid geometry type");
        };
        assert_eq!(poly_line.lines().len(), 2);
        assert_eq!(poly_line.lines()[1].points()[2], Point::new(7.0, 4.0));

        let Feature::PolyLine(poly_line) = &features[1] else {
            panic!("invalid geometry type");
        };
        assert_eq!(poly_line.lines().len(), 1);
    }

    #[test]
    fn measured_polygons() {
        let ring: &[(f64, f64)] = &[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0), (0.0, 0.0)];
        let data = ShapeFileWriter::new(ShapeType::PolygonM)
            .multipart(25, &[ring], true)
            .null()
            .multipart(25, &[ring], false)
            .build();
        let file = ShapeFile::from_bytes(&data).unwrap();
        assert_eq!(file.feature_type(), FeatureType::Polygon);
        assert_eq!(file.record_count(), 3);

        let records = file.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].index, 2);
        for record in records {
            let Feature::Polygon(polygon) = &record.feature else {
                panic!("invalid geometry type");
            };
            assert_eq!(polygon.rings().len(), 1);
            let points: Vec<Point> = ring.iter().map(|&(x, y)| Point::new(x, y)).collect();
            assert_eq!(polygon.rings()[0].points(), &points[..]);
        }
    }

    #[test]
    fn null_file_shape_type() {
        let data = ShapeFileWriter::new(ShapeType::Null).null().null().build();
        let file = ShapeFile::from_bytes(&data).unwrap();
        assert_eq!(file.shape_type(), ShapeType::Null);
        assert_eq!(file.feature_type(), FeatureType::None);
        assert_eq!(file.record_count(), 2);
        assert!(file.records().is_empty());
    }

    #[test]
    fn unknown_record_types_are_skipped() {
        let line: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 1.0)];
        let data = ShapeFileWriter::new(ShapeType::PolyLine)
            .raw(8, &[0; 36])
            .raw(99, &[1, 2, 3, 4])
            .multipart(3, &[line], false)
            .build();
        let file = ShapeFile::from_bytes(&data).unwrap();
        assert_eq!(file.record_count(), 3);
        assert_eq!(file.records().len(), 1);
        assert_eq!(file.records()[0].index, 2);
    }

    #[test]
    fn truncated_data() {
        let line: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 1.0)];
        let data = ShapeFileWriter::new(ShapeType::PolyLine)
            .multipart(3, &[line], false)
            .build();
        assert_matches!(
            ShapeFile::from_bytes(&data[..data.len() - 4]),
            Err(VecmapFormatsError::UnexpectedEof)
        );
        assert_matches!(
            ShapeFile::from_bytes(&data[..60]),
            Err(VecmapFormatsError::UnexpectedEof)
        );
    }

    #[test]
    fn corrupted_point_count() {
        let line: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 1.0)];
        let mut data = ShapeFileWriter::new(ShapeType::PolyLine)
            .multipart(3, &[line], false)
            .build();
        // numPoints of the first record
        let num_points_offset = 100 + 8 + 4 + 32 + 4;
        data[num_points_offset..num_points_offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_matches!(
            ShapeFile::from_bytes(&data),
            Err(VecmapFormatsError::UnexpectedEof)
        );
    }

    #[test]
    fn open_file() {
        let path = std::env::temp_dir().join(format!("vecmap_open_{}.shp", std::process::id()));
        let data = ShapeFileWriter::new(ShapeType::Point)
            .point(1.0, 2.0, None)
            .build();
        std::fs::write(&path, data).unwrap();
        let file = ShapeFile::open(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(file.unwrap().features().count(), 1);
        assert_matches!(
            ShapeFile::open(std::env::temp_dir().join("vecmap_does_not_exist.shp")),
            Err(VecmapFormatsError::Io(_))
        );
    }
}
