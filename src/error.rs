use crate::{TsDataType, TsEncoding};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TsFileError>;

#[derive(Error, Debug)]
pub enum TsFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// The bytes on disk do not form a valid file.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("invalid magic marker at file {position}")]
    BadMagic { position: &'static str },
    #[error("unexpected end of data while reading {reading} ({needed} bytes needed, {remaining} remaining)")]
    Truncated {
        reading: &'static str,
        needed: usize,
        remaining: usize,
    },
    #[error("unsigned varint exceeds 32 bits")]
    BadVarint,
    #[error("unknown data type code {0}")]
    UnknownDataType(i16),
    #[error("unknown encoding code {0}")]
    UnknownEncoding(i16),
    #[error("unknown compression code {0}")]
    UnknownCompression(i16),
    #[error("string field is not valid UTF-8")]
    BadString,
    #[error("file of {0} bytes is too small to hold a footer")]
    NoFooter(u64),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("rle bit width {bit_width} needs {padded} padded bytes, at most {max} supported")]
    RleWidthTooLarge {
        bit_width: u32,
        padded: u32,
        max: u32,
    },
    #[error("rle bit-packed run declares zero groups")]
    EmptyBitPackedRun,
    #[error("delta block declares {count} values, capacity is {capacity}")]
    BadBlockCount { count: i32, capacity: usize },
    #[error("gorilla window of {leading} leading + {meaningful} meaningful bits exceeds {width} bits")]
    BadGorillaWindow {
        leading: u32,
        meaningful: u32,
        width: u32,
    },
    #[error("codec payload exhausted mid-value")]
    Exhausted,
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("sensor {0} is already registered")]
    DuplicateSensor(String),
    #[error("sensor {0} is not registered in the schema")]
    UnknownSensor(String),
    #[error("sensor {sensor} is declared {declared} but received a {received} value")]
    TypeMismatch {
        sensor: String,
        declared: TsDataType,
        received: TsDataType,
    },
    #[error("encoding {encoding} does not support data type {data_type}")]
    UnsupportedEncoding {
        encoding: TsEncoding,
        data_type: TsDataType,
    },
}

#[derive(Error, Debug)]
pub enum UsageError {
    #[error("writer is closed")]
    WriteAfterClose,
    #[error("record for device {0} carries no data points")]
    EmptyRecord(String),
    #[error("sensors must be registered before the first record is written")]
    AddSensorAfterWrite,
}
