//! Embeddable writer/reader for a columnar time-series file format.
//!
//! A file holds timestamped samples organized by device and sensor. Every
//! sensor column is encoded independently, summarized by statistics and
//! indexed by a trailing footer, so a reader can locate any
//! `(device, sensor)` series and answer time-range and filter queries
//! without scanning the file.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

pub mod error;

mod encoding;
mod file;
mod io;
mod query;
mod read;
mod utils;
mod write;


pub use error::{Result, TsFileError};
pub use file::metadata::FileMetaData;
pub use query::engine::{QueryDataSet, QueryEngine, QueryExpression};
pub use query::filter::Filter;
pub use query::row_record::RowRecord;
pub use read::reader::TsFileSequenceReader;
pub use write::schema::SensorDescriptor;
pub use write::writer::TsFileWriter;

use error::FormatError;

/// Magic marker at byte 0 and again just before the footer-size trailer.
pub const MAGIC: &[u8; 12] = b"TsFilev0.8.0";

pub type Timestamp = i64;

/// Knobs for the write pipeline. Thresholds are soft: a page is sealed once
/// it crosses them, never split retroactively.
#[derive(Clone, Copy, Debug)]
pub struct TsFileConfig {
    /// A device's buffered chunks are flushed as one row group past this.
    pub row_group_size_threshold: usize,
    /// A series' current page is sealed past this many encoded bytes.
    pub page_size_threshold: usize,
    /// A series' current page is sealed at this many points.
    pub max_point_number: usize,
}

impl Default for TsFileConfig {
    fn default() -> Self {
        Self {
            row_group_size_threshold: 128 * 1024 * 1024,
            page_size_threshold: 64 * 1024,
            max_point_number: 1024,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(i16)]
pub enum TsDataType {
    Boolean = 0,
    Int32 = 1,
    Int64 = 2,
    Float = 3,
    Double = 4,
    Text = 5,
}

impl TsDataType {
    pub fn serialize(&self) -> i16 {
        *self as i16
    }
}

impl TryFrom<i16> for TsDataType {
    type Error = TsFileError;

    fn try_from(code: i16) -> Result<Self> {
        match code {
            0 => Ok(Self::Boolean),
            1 => Ok(Self::Int32),
            2 => Ok(Self::Int64),
            3 => Ok(Self::Float),
            4 => Ok(Self::Double),
            5 => Ok(Self::Text),
            other => Err(FormatError::UnknownDataType(other).into()),
        }
    }
}

impl Display for TsDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Int32 => f.write_str("INT32"),
            Self::Int64 => f.write_str("INT64"),
            Self::Float => f.write_str("FLOAT"),
            Self::Double => f.write_str("DOUBLE"),
            Self::Text => f.write_str("TEXT"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(i16)]
pub enum TsEncoding {
    Plain = 0,
    Rle = 1,
    Ts2Diff = 2,
    Gorilla = 3,
}

impl TsEncoding {
    pub fn serialize(&self) -> i16 {
        *self as i16
    }
}

impl TryFrom<i16> for TsEncoding {
    type Error = TsFileError;

    fn try_from(code: i16) -> Result<Self> {
        match code {
            0 => Ok(Self::Plain),
            1 => Ok(Self::Rle),
            2 => Ok(Self::Ts2Diff),
            3 => Ok(Self::Gorilla),
            other => Err(FormatError::UnknownEncoding(other).into()),
        }
    }
}

impl Display for TsEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("PLAIN"),
            Self::Rle => f.write_str("RLE"),
            Self::Ts2Diff => f.write_str("TS_2DIFF"),
            Self::Gorilla => f.write_str("GORILLA"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(i16)]
pub enum CompressionType {
    Uncompressed = 0,
}

impl CompressionType {
    pub fn serialize(&self) -> i16 {
        *self as i16
    }
}

impl TryFrom<i16> for CompressionType {
    type Error = TsFileError;

    fn try_from(code: i16) -> Result<Self> {
        match code {
            0 => Ok(Self::Uncompressed),
            other => Err(FormatError::UnknownCompression(other).into()),
        }
    }
}

/// A single typed sample value. Codec and statistics selection dispatch on
/// the variant tag, never on strings.
#[derive(Clone, PartialEq, Debug)]
pub enum TypedValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Text(String),
}

impl TypedValue {
    pub fn data_type(&self) -> TsDataType {
        match self {
            Self::Boolean(_) => TsDataType::Boolean,
            Self::Int32(_) => TsDataType::Int32,
            Self::Int64(_) => TsDataType::Int64,
            Self::Float(_) => TsDataType::Float,
            Self::Double(_) => TsDataType::Double,
            Self::Text(_) => TsDataType::Text,
        }
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f32> for TypedValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Display for TypedValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

/// One decoded point of one series.
#[derive(Clone, PartialEq, Debug)]
pub struct TimeValuePair {
    pub timestamp: Timestamp,
    pub value: TypedValue,
}

/// One sensor's value inside a record.
#[derive(Clone, Debug)]
pub struct DataPoint {
    pub sensor_id: String,
    pub value: TypedValue,
}

impl DataPoint {
    pub fn new(sensor_id: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            value: value.into(),
        }
    }
}

/// One row: every registered sensor of one device at one timestamp.
#[derive(Clone, Debug)]
pub struct TsRecord {
    pub device_id: String,
    pub timestamp: Timestamp,
    pub data_points: Vec<DataPoint>,
}

impl TsRecord {
    pub fn new(device_id: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            data_points: Vec::new(),
        }
    }

    pub fn add_tuple(&mut self, point: DataPoint) -> &mut Self {
        self.data_points.push(point);
        self
    }
}

/// Fully-qualified series name, `device.sensor`. The sensor part is the
/// final dot-separated component.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Path {
    pub device: String,
    pub sensor: String,
}

impl Path {
    pub fn new(device: impl Into<String>, sensor: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            sensor: sensor.into(),
        }
    }
}

impl FromStr for Path {
    type Err = TsFileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.rsplit_once('.') {
            Some((device, sensor)) if !device.is_empty() && !sensor.is_empty() => {
                Ok(Self::new(device, sensor))
            }
            _ => Err(FormatError::BadString.into()),
        }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.device, self.sensor)
    }
}
