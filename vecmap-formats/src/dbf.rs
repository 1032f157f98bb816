//! Reader of dBase III attribute tables (`.dbf`).
//!
//! Values that cannot be parsed according to the declared field type are read as [`DbfValue::Null`], so one
//! broken cell never makes the whole table unreadable.

use std::fmt::{Display, Formatter};
use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1252};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cursor::ByteCursor;
use crate::error::VecmapFormatsError;

/// Version byte of dBase III files.
const DBASE_III: u8 = 3;

/// Terminator of the field descriptor array.
const HEADER_TERMINATOR: u8 = 0x0d;

const FIELD_NAME_LENGTH: usize = 11;

/// Encoding used when none is given. Most shapefiles in the wild are written by ANSI Windows tools.
pub const DEFAULT_ENCODING: &Encoding = WINDOWS_1252;

fn decode_text(encoding: &'static Encoding, bytes: &[u8]) -> String {
    encoding.decode_without_bom_handling(bytes).0.into_owned()
}

/// Type of a table column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbfFieldType {
    /// `C` - text.
    Character,
    /// `D` - date in `yyyyMMdd` form.
    Date,
    /// `N` or `F` - number stored as text.
    Numeric,
    /// `L` - boolean.
    Logical,
    /// `M` - reference into a memo file. Memo fields are not included in tables.
    Memo,
}

impl DbfFieldType {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'C' => Self::Character,
            b'D' => Self::Date,
            b'N' | b'F' => Self::Numeric,
            b'L' => Self::Logical,
            b'M' => Self::Memo,
            _ => return None,
        })
    }
}

/// Column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbfColumn {
    /// Name of the column.
    pub name: String,
    /// Type of the column.
    pub field_type: DbfFieldType,
    /// Width of the column in bytes.
    pub length: u8,
    /// Number of decimal places for numeric columns.
    pub decimal_count: u8,
}

/// Calendar date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DbfDate {
    /// Year.
    pub year: u16,
    /// Month, `1..=12`.
    pub month: u8,
    /// Day of month, starting from 1.
    pub day: u8,
}

impl DbfDate {
    /// Creates a date, checking that it exists in the calendar.
    pub fn new(year: u16, month: u8, day: u8) -> Option<Self> {
        if month == 0 || month > 12 || day == 0 || day > days_in_month(year, month) {
            return None;
        }

        Some(Self { year, month, day })
    }

    /// Parses a date in exact `yyyyMMdd` form.
    pub fn parse(value: &str) -> Option<Self> {
        if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Self::new(
            value[0..4].parse().ok()?,
            value[4..6].parse().ok()?,
            value[6..8].parse().ok()?,
        )
    }
}

impl Display for DbfDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Value of a table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DbfValue {
    /// Empty or unparseable value.
    Null,
    /// Text.
    String(String),
    /// Number.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// Date.
    Date(DbfDate),
}

impl DbfValue {
    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, DbfValue::Null)
    }

    /// String value, if the cell is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DbfValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric value, if the cell is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DbfValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl Display for DbfValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DbfValue::Null => Ok(()),
            DbfValue::String(v) => write!(f, "{v}"),
            DbfValue::Number(v) => write!(f, "{v}"),
            DbfValue::Bool(v) => write!(f, "{v}"),
            DbfValue::Date(v) => write!(f, "{v}"),
        }
    }
}

/// One row of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbfRow {
    values: Vec<DbfValue>,
    is_deleted: bool,
}

impl DbfRow {
    /// Value of the column with the given index.
    pub fn get(&self, column: usize) -> Option<&DbfValue> {
        self.values.get(column)
    }

    /// Value of the column with the given name (case-insensitive).
    pub fn get_by_name(&self, table: &DbfTable, name: &str) -> Option<&DbfValue> {
        self.get(table.column_index(name)?)
    }

    /// All values of the row, in column order.
    pub fn values(&self) -> &[DbfValue] {
        &self.values
    }

    /// Whether the row is marked as deleted.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

/// Parsed dBase III table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbfTable {
    last_updated: Option<DbfDate>,
    columns: Vec<DbfColumn>,
    rows: Vec<DbfRow>,
}

struct FieldDescriptor {
    field_type: Option<DbfFieldType>,
    length: usize,
}

impl DbfTable {
    /// Reads and parses the file at the given path.
    ///
    /// Field names and character values are decoded with `encoding`, or with [`DEFAULT_ENCODING`] (Windows-1252)
    /// if it is not given. Bytes that are invalid in the encoding are replaced with `U+FFFD`.
    pub fn open(
        path: impl AsRef<Path>,
        encoding: Option<&'static Encoding>,
    ) -> Result<Self, VecmapFormatsError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        debug!("Read {} bytes from dbf file {path:?}", data.len());

        Self::from_bytes(&data, encoding)
    }

    /// Parses table contents. See [`DbfTable::open`] for text decoding.
    pub fn from_bytes(
        data: &[u8],
        encoding: Option<&'static Encoding>,
    ) -> Result<Self, VecmapFormatsError> {
        let encoding = encoding.unwrap_or(DEFAULT_ENCODING);
        let mut cursor = ByteCursor::new(data);

        let version = cursor.u8()?;
        if version != DBASE_III {
            return Err(VecmapFormatsError::InvalidFormat(format!(
                "unsupported dbf version byte {version}, expected {DBASE_III}"
            )));
        }

        let year = cursor.u8()?;
        let month = cursor.u8()?;
        let day = cursor.u8()?;
        let last_updated = DbfDate::new(1900 + year as u16, month, day);

        let record_count = cursor.u32_le()? as usize;
        let header_length = cursor.u16_le()? as usize;
        let _record_length = cursor.u16_le()?;
        cursor.skip(20)?;

        let mut columns = vec![];
        let mut descriptors = vec![];
        loop {
            let first_byte = cursor.u8()?;
            if first_byte == HEADER_TERMINATOR {
                break;
            }

            let mut name_bytes = vec![first_byte];
            name_bytes.extend(cursor.bytes(FIELD_NAME_LENGTH - 1)?);
            let name_end = name_bytes
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(FIELD_NAME_LENGTH);
            let name = decode_text(encoding, &name_bytes[..name_end]).trim().to_string();

            let type_code = cursor.u8()?;
            let _data_address = cursor.u32_le()?;
            let length = cursor.u8()?;
            let decimal_count = cursor.u8()?;
            cursor.skip(14)?;

            let field_type = DbfFieldType::from_code(type_code);
            match field_type {
                Some(DbfFieldType::Memo) => {}
                Some(field_type) => columns.push(DbfColumn {
                    name,
                    field_type,
                    length,
                    decimal_count,
                }),
                None => debug!(
                    "Field {name} has unknown type {:?}, it will be skipped",
                    type_code as char
                ),
            }

            descriptors.push(FieldDescriptor {
                field_type: field_type.filter(|t| *t != DbfFieldType::Memo),
                length: length as usize,
            });
        }

        if header_length > cursor.position() {
            cursor.skip(header_length - cursor.position())?;
        }

        let row_length = 1 + descriptors.iter().map(|d| d.length).sum::<usize>();
        cursor.check_count(record_count, row_length)?;

        let mut rows = Vec::with_capacity(record_count);
        for _ in 0..record_count {
            let deletion_flag = cursor.u8()?;
            let mut values = Vec::with_capacity(columns.len());
            for descriptor in &descriptors {
                let raw = cursor.bytes(descriptor.length)?;
                if let Some(field_type) = descriptor.field_type {
                    values.push(decode_value(field_type, &raw, encoding));
                }
            }

            rows.push(DbfRow {
                values,
                is_deleted: deletion_flag == b'*',
            });
        }

        debug!(
            "Parsed dbf table with {} columns and {} rows",
            columns.len(),
            rows.len()
        );

        Ok(Self {
            last_updated,
            columns,
            rows,
        })
    }

    /// Date of the last update stored in the header, if it is a valid date.
    pub fn last_updated(&self) -> Option<DbfDate> {
        self.last_updated
    }

    /// Columns of the table. Memo fields are not included.
    pub fn columns(&self) -> &[DbfColumn] {
        &self.columns
    }

    /// Index of the column with the given name (case-insensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// All rows of the table.
    pub fn rows(&self) -> &[DbfRow] {
        &self.rows
    }

    /// Row with the given index.
    pub fn row(&self, index: usize) -> Option<&DbfRow> {
        self.rows.get(index)
    }

    /// Number of rows.
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }
}

fn decode_value(field_type: DbfFieldType, raw: &[u8], encoding: &'static Encoding) -> DbfValue {
    let text = decode_text(encoding, raw);
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');

    match field_type {
        DbfFieldType::Character if text.is_empty() => DbfValue::Null,
        DbfFieldType::Character => DbfValue::String(text.to_string()),
        DbfFieldType::Date => DbfDate::parse(text).map_or(DbfValue::Null, DbfValue::Date),
        DbfFieldType::Numeric => text.parse().map_or(DbfValue::Null, DbfValue::Number),
        DbfFieldType::Logical => match text {
            "y" | "Y" | "t" | "T" => DbfValue::Bool(true),
            "n" | "N" | "f" | "F" => DbfValue::Bool(false),
            _ => DbfValue::Null,
        },
        DbfFieldType::Memo => DbfValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use bytes::BufMut;

    use super::*;

    /// Writes dbf tables for tests.
    struct DbfWriter {
        fields: Vec<(String, u8, u8)>,
        rows: Vec<Vec<String>>,
    }

    impl DbfWriter {
        fn new() -> Self {
            Self {
                fields: vec![],
                rows: vec![],
            }
        }

        fn field(mut self, name: &str, code: u8, length: u8) -> Self {
            self.fields.push((name.to_string(), code, length));
            self
        }

        fn row(mut self, values: &[&str]) -> Self {
            self.rows.push(values.iter().map(|v| v.to_string()).collect());
            self
        }

        fn build(self) -> Vec<u8> {
            let header_length = 32 + 32 * self.fields.len() + 1;
            let record_length = 1 + self.fields.iter().map(|f| f.2 as usize).sum::<usize>();

            let mut data = vec![];
            data.put_u8(3);
            data.put_slice(&[124, 3, 15]);
            data.put_u32_le(self.rows.len() as u32);
            data.put_u16_le(header_length as u16);
            data.put_u16_le(record_length as u16);
            data.put_bytes(0, 20);

            for (name, code, length) in &self.fields {
                let mut name_bytes = name.as_bytes().to_vec();
                name_bytes.resize(11, 0);
                data.put_slice(&name_bytes);
                data.put_u8(*code);
                data.put_u32_le(0);
                data.put_u8(*length);
                data.put_u8(0);
                data.put_bytes(0, 14);
            }
            data.put_u8(HEADER_TERMINATOR);

            for row in &self.rows {
                data.put_u8(b' ');
                for (value, (_, _, length)) in row.iter().zip(&self.fields) {
                    let mut bytes = value.as_bytes().to_vec();
                    bytes.resize(*length as usize, b' ');
                    data.put_slice(&bytes);
                }
            }

            data
        }
    }

    fn sample() -> Vec<u8> {
        DbfWriter::new()
            .field("NAME", b'C', 10)
            .field("FOUNDED", b'D', 8)
            .field("NOTES", b'M', 10)
            .field("POP", b'N', 8)
            .field("CAPITAL", b'L', 1)
            .row(&["Berlin", "12370101", "0000000001", "3645000", "T"])
            .row(&["  ", "2023x101", "", "abc", "?"])
            .row(&["Bonn", "19490230", "", "-1.5", "n"])
            .build()
    }

    #[test]
    fn header_and_columns() {
        let table = DbfTable::from_bytes(&sample(), None).unwrap();
        assert_eq!(table.last_updated(), DbfDate::new(2024, 3, 15));
        assert_eq!(table.record_count(), 3);

        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["NAME", "FOUNDED", "POP", "CAPITAL"]);
        assert_eq!(table.columns()[2].field_type, DbfFieldType::Numeric);
        assert_eq!(table.column_index("pop"), Some(2));
        assert_eq!(table.column_index("NOTES"), None);
    }

    #[test]
    fn values() {
        let table = DbfTable::from_bytes(&sample(), None).unwrap();
        let row = table.row(0).unwrap();
        assert_eq!(row.values().len(), 4);
        assert_eq!(row.get(0), Some(&DbfValue::String("Berlin".into())));
        assert_eq!(
            row.get(1),
            Some(&DbfValue::Date(DbfDate {
                year: 1237,
                month: 1,
                day: 1
            }))
        );
        assert_abs_diff_eq!(row.get(2).and_then(DbfValue::as_f64).unwrap(), 3645000.0);
        assert_eq!(row.get_by_name(&table, "capital"), Some(&DbfValue::Bool(true)));
        assert!(!row.is_deleted());
    }

    #[test]
    fn bad_cells_are_null() {
        let table = DbfTable::from_bytes(&sample(), None).unwrap();
        let row = table.row(1).unwrap();
        assert!(row.values().iter().all(DbfValue::is_null));

        let row = table.row(2).unwrap();
        assert_eq!(row.get(0), Some(&DbfValue::String("Bonn".into())));
        // February 30th does not exist.
        assert_eq!(row.get(1), Some(&DbfValue::Null));
        assert_eq!(row.get(2), Some(&DbfValue::Number(-1.5)));
        assert_eq!(row.get(3), Some(&DbfValue::Bool(false)));
    }

    #[test]
    fn float_and_logical_cells() {
        let data = DbfWriter::new()
            .field("AREA", b'F', 12)
            .field("WET", b'L', 1)
            .row(&["  12.5e3", "y"])
            .row(&["-0.25", "t"])
            .row(&["", "f"])
            .row(&["1,5", "Y"])
            .build();
        let table = DbfTable::from_bytes(&data, None).unwrap();
        assert_eq!(table.columns()[0].field_type, DbfFieldType::Numeric);
        assert_eq!(table.columns()[1].field_type, DbfFieldType::Logical);

        let cells: Vec<(Option<f64>, &DbfValue)> = table
            .rows()
            .iter()
            .map(|row| (row.values()[0].as_f64(), &row.values()[1]))
            .collect();
        assert_eq!(
            cells,
            [
                (Some(12500.0), &DbfValue::Bool(true)),
                (Some(-0.25), &DbfValue::Bool(true)),
                (None, &DbfValue::Bool(false)),
                (None, &DbfValue::Bool(true)),
            ]
        );
    }

    #[test]
    fn invalid_version() {
        let mut data = sample();
        data[0] = 0x83;
        assert_matches!(
            DbfTable::from_bytes(&data, None),
            Err(VecmapFormatsError::InvalidFormat(_))
        );
    }

    #[test]
    fn truncated_rows() {
        let data = sample();
        assert_matches!(
            DbfTable::from_bytes(&data[..data.len() - 1], None),
            Err(VecmapFormatsError::UnexpectedEof)
        );
    }

    fn single_text_cell(bytes: &[u8]) -> Vec<u8> {
        let mut data = DbfWriter::new()
            .field("CITY", b'C', bytes.len() as u8)
            .row(&[""])
            .build();
        let start = data.len() - bytes.len();
        data[start..].copy_from_slice(bytes);
        data
    }

    fn first_text(data: &[u8], encoding: Option<&'static Encoding>) -> Option<String> {
        let table = DbfTable::from_bytes(data, encoding).unwrap();
        table.rows()[0]
            .get(0)
            .and_then(DbfValue::as_str)
            .map(str::to_string)
    }

    #[test]
    fn windows_1252_is_default() {
        let data = single_text_cell(b"Caf\xe9 \x80 \x92");
        assert_eq!(first_text(&data, None).as_deref(), Some("Caf\u{e9} \u{20ac} \u{2019}"));
        assert_eq!(
            first_text(&data, Some(encoding_rs::WINDOWS_1252)).as_deref(),
            Some("Café € ’")
        );
    }

    #[test]
    fn explicit_encodings() {
        let data = single_text_cell("München".as_bytes());
        assert_eq!(
            first_text(&data, Some(encoding_rs::UTF_8)).as_deref(),
            Some("München")
        );

        // "Москва" in cp866.
        let data = single_text_cell(&[0x8c, 0xae, 0xe1, 0xaa, 0xa2, 0xa0]);
        assert_eq!(
            first_text(&data, Some(encoding_rs::IBM866)).as_deref(),
            Some("Москва")
        );

        let data = single_text_cell(b"M\xfcnchen");
        assert_eq!(
            first_text(&data, Some(encoding_rs::UTF_8)).as_deref(),
            Some("M\u{fffd}nchen")
        );
    }

    #[test]
    fn field_names_are_decoded() {
        let mut data = DbfWriter::new().field("STRASSE", b'C', 4).row(&["A"]).build();
        // 'ß' in Windows-1252 in place of "SS".
        data[32 + 4] = 0xdf;
        data.remove(32 + 5);
        data.insert(32 + 10, 0);
        let table = DbfTable::from_bytes(&data, None).unwrap();
        assert_eq!(table.columns()[0].name, "STRA\u{df}E");
        assert_eq!(table.column_index("straße"), Some(0));
    }

    #[test]
    fn date_parsing() {
        assert_eq!(DbfDate::parse("20240229"), DbfDate::new(2024, 2, 29));
        assert_eq!(DbfDate::parse("20230229"), None);
        assert_eq!(DbfDate::parse("2024-2-1"), None);
        assert_eq!(DbfDate::parse("+2024011"), None);
        assert_eq!(DbfDate::parse("20241301"), None);
        assert_eq!(DbfDate::parse("19000228").map(|d| d.to_string()), Some("1900-02-28".into()));
    }
}
