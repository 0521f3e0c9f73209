//! PLAIN codec: fixed-width values, no framing.
//!
//! int32/int64 are big-endian, float/double are little-endian bit patterns,
//! bool is one byte, text is an i32-BE length plus raw UTF-8. The value
//! count is implicit from the page header.

use crate::error::Result;
use crate::io::{write_binary, ByteReader, FormatRead};
use crate::{TsDataType, TypedValue};

pub struct PlainEncoder {
    data_type: TsDataType,
}

impl PlainEncoder {
    pub fn new(data_type: TsDataType) -> Self {
        Self { data_type }
    }

    pub fn encode(&mut self, value: &TypedValue, out: &mut Vec<u8>) {
        match value {
            TypedValue::Boolean(v) => out.push(u8::from(*v)),
            TypedValue::Int32(v) => out.extend_from_slice(&v.to_be_bytes()),
            TypedValue::Int64(v) => out.extend_from_slice(&v.to_be_bytes()),
            TypedValue::Float(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
            TypedValue::Double(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
            TypedValue::Text(v) => write_binary(v.as_bytes(), out),
        }
    }

    pub fn flush(&mut self, _out: &mut Vec<u8>) {}

    pub fn one_item_max_size(&self) -> usize {
        match self.data_type {
            TsDataType::Boolean => 1,
            TsDataType::Int32 | TsDataType::Float => 4,
            TsDataType::Int64 | TsDataType::Double => 8,
            // length prefix plus a guess at a typical string
            TsDataType::Text => 4 + 128,
        }
    }

    /// PLAIN buffers nothing between calls.
    pub fn max_byte_size(&self) -> usize {
        0
    }
}

pub struct PlainDecoder {
    data_type: TsDataType,
    reader: ByteReader,
}

impl PlainDecoder {
    pub fn new(data_type: TsDataType, data: Vec<u8>) -> Self {
        Self {
            data_type,
            reader: ByteReader::new(data),
        }
    }

    pub fn has_next(&self) -> bool {
        let item = match self.data_type {
            TsDataType::Boolean => 1,
            TsDataType::Int32 | TsDataType::Float => 4,
            TsDataType::Int64 | TsDataType::Double => 8,
            TsDataType::Text => 1,
        };
        self.reader.remaining() >= item
    }

    pub fn next(&mut self) -> Result<TypedValue> {
        Ok(match self.data_type {
            TsDataType::Boolean => TypedValue::Boolean(self.reader.read_bool()?),
            TsDataType::Int32 => TypedValue::Int32(self.reader.read_int()?),
            TsDataType::Int64 => TypedValue::Int64(self.reader.read_long()?),
            TsDataType::Float => TypedValue::Float(self.reader.read_float()?),
            TsDataType::Double => TypedValue::Double(self.reader.read_double()?),
            TsDataType::Text => TypedValue::Text(self.reader.read_string()?),
        })
    }
}
