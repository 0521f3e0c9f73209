//! Stateful per-chunk encoders and per-page decoders.
//!
//! One implementation exists per (encoding, data type) pair; selection is a
//! static dispatch on the two enums. Timestamps always go through the
//! delta-of-delta long codec.

pub mod bitpack;
pub mod gorilla;
pub mod plain;
pub mod rle;
pub mod ts2diff;

use crate::error::{Result, SchemaError};
use crate::{TsDataType, TsEncoding, TypedValue};
use gorilla::{
    DoublePrecisionDecoder, DoublePrecisionEncoder, SinglePrecisionDecoder,
    SinglePrecisionEncoder,
};
use plain::{PlainDecoder, PlainEncoder};
use rle::{IntRleDecoder, IntRleEncoder, LongRleDecoder, LongRleEncoder};
use ts2diff::{IntDeltaDecoder, IntDeltaEncoder, LongDeltaDecoder, LongDeltaEncoder};

/// Timestamp columns are fixed to delta-of-delta over int64.
pub type TimeEncoder = LongDeltaEncoder;
pub type TimeDecoder = LongDeltaDecoder;

pub enum ValueEncoder {
    Plain(PlainEncoder),
    RleBoolean(IntRleEncoder),
    RleInt32(IntRleEncoder),
    RleInt64(LongRleEncoder),
    RleFloat(IntRleEncoder),
    RleDouble(LongRleEncoder),
    Ts2DiffInt32(IntDeltaEncoder),
    Ts2DiffInt64(LongDeltaEncoder),
    Ts2DiffFloat(IntDeltaEncoder),
    Ts2DiffDouble(LongDeltaEncoder),
    GorillaFloat(SinglePrecisionEncoder),
    GorillaDouble(DoublePrecisionEncoder),
}

impl ValueEncoder {
    pub fn new(encoding: TsEncoding, data_type: TsDataType) -> Result<Self> {
        use TsDataType::*;
        use TsEncoding::*;
        Ok(match (encoding, data_type) {
            (Plain, _) => Self::Plain(PlainEncoder::new(data_type)),
            (Rle, Boolean) => Self::RleBoolean(IntRleEncoder::new()),
            (Rle, Int32) => Self::RleInt32(IntRleEncoder::new()),
            (Rle, Int64) => Self::RleInt64(LongRleEncoder::new()),
            (Rle, Float) => Self::RleFloat(IntRleEncoder::new()),
            (Rle, Double) => Self::RleDouble(LongRleEncoder::new()),
            (Ts2Diff, Int32) => Self::Ts2DiffInt32(IntDeltaEncoder::new()),
            (Ts2Diff, Int64) => Self::Ts2DiffInt64(LongDeltaEncoder::new()),
            (Ts2Diff, Float) => Self::Ts2DiffFloat(IntDeltaEncoder::new()),
            (Ts2Diff, Double) => Self::Ts2DiffDouble(LongDeltaEncoder::new()),
            (Gorilla, Float) => Self::GorillaFloat(SinglePrecisionEncoder::new()),
            (Gorilla, Double) => Self::GorillaDouble(DoublePrecisionEncoder::new()),
            _ => {
                return Err(SchemaError::UnsupportedEncoding {
                    encoding,
                    data_type,
                }
                .into())
            }
        })
    }

    /// The caller has already type-checked `value` against the descriptor.
    pub fn encode(&mut self, value: &TypedValue, out: &mut Vec<u8>) {
        match (self, value) {
            (Self::Plain(e), v) => e.encode(v, out),
            (Self::RleBoolean(e), TypedValue::Boolean(v)) => e.encode(u32::from(*v)),
            (Self::RleInt32(e), TypedValue::Int32(v)) => e.encode(*v as u32),
            (Self::RleInt64(e), TypedValue::Int64(v)) => e.encode(*v as u64),
            (Self::RleFloat(e), TypedValue::Float(v)) => e.encode(v.to_bits()),
            (Self::RleDouble(e), TypedValue::Double(v)) => e.encode(v.to_bits()),
            (Self::Ts2DiffInt32(e), TypedValue::Int32(v)) => e.encode(*v, out),
            (Self::Ts2DiffInt64(e), TypedValue::Int64(v)) => e.encode(*v, out),
            (Self::Ts2DiffFloat(e), TypedValue::Float(v)) => {
                e.encode(v.to_bits() as i32, out)
            }
            (Self::Ts2DiffDouble(e), TypedValue::Double(v)) => {
                e.encode(v.to_bits() as i64, out)
            }
            (Self::GorillaFloat(e), TypedValue::Float(v)) => e.encode(*v),
            (Self::GorillaDouble(e), TypedValue::Double(v)) => e.encode(*v),
            _ => unreachable!("value type checked against the descriptor"),
        }
    }

    pub fn flush(&mut self, out: &mut Vec<u8>) {
        match self {
            Self::Plain(e) => e.flush(out),
            Self::RleBoolean(e) | Self::RleInt32(e) | Self::RleFloat(e) => e.flush(out),
            Self::RleInt64(e) | Self::RleDouble(e) => e.flush(out),
            Self::Ts2DiffInt32(e) | Self::Ts2DiffFloat(e) => e.flush(out),
            Self::Ts2DiffInt64(e) | Self::Ts2DiffDouble(e) => e.flush(out),
            Self::GorillaFloat(e) => e.flush(out),
            Self::GorillaDouble(e) => e.flush(out),
        }
    }

    pub fn one_item_max_size(&self) -> usize {
        match self {
            Self::Plain(e) => e.one_item_max_size(),
            Self::RleBoolean(e) | Self::RleInt32(e) | Self::RleFloat(e) => e.one_item_max_size(),
            Self::RleInt64(e) | Self::RleDouble(e) => e.one_item_max_size(),
            Self::Ts2DiffInt32(e) | Self::Ts2DiffFloat(e) => e.one_item_max_size(),
            Self::Ts2DiffInt64(e) | Self::Ts2DiffDouble(e) => e.one_item_max_size(),
            Self::GorillaFloat(e) => e.one_item_max_size(),
            Self::GorillaDouble(e) => e.one_item_max_size(),
        }
    }

    /// Upper bound on the bytes a flush would add on top of what has
    /// already been written to the page buffer.
    pub fn max_byte_size(&self) -> usize {
        match self {
            Self::Plain(e) => e.max_byte_size(),
            Self::RleBoolean(e) | Self::RleInt32(e) | Self::RleFloat(e) => e.max_byte_size(),
            Self::RleInt64(e) | Self::RleDouble(e) => e.max_byte_size(),
            Self::Ts2DiffInt32(e) | Self::Ts2DiffFloat(e) => e.max_byte_size(),
            Self::Ts2DiffInt64(e) | Self::Ts2DiffDouble(e) => e.max_byte_size(),
            Self::GorillaFloat(e) => e.max_byte_size(),
            Self::GorillaDouble(e) => e.max_byte_size(),
        }
    }
}

pub enum ValueDecoder {
    Plain(PlainDecoder),
    RleBoolean(IntRleDecoder),
    RleInt32(IntRleDecoder),
    RleInt64(LongRleDecoder),
    RleFloat(IntRleDecoder),
    RleDouble(LongRleDecoder),
    Ts2DiffInt32(IntDeltaDecoder),
    Ts2DiffInt64(LongDeltaDecoder),
    Ts2DiffFloat(IntDeltaDecoder),
    Ts2DiffDouble(LongDeltaDecoder),
    GorillaFloat(SinglePrecisionDecoder),
    GorillaDouble(DoublePrecisionDecoder),
}

impl ValueDecoder {
    pub fn new(encoding: TsEncoding, data_type: TsDataType, data: Vec<u8>) -> Result<Self> {
        use TsDataType::*;
        use TsEncoding::*;
        Ok(match (encoding, data_type) {
            (Plain, _) => Self::Plain(PlainDecoder::new(data_type, data)),
            (Rle, Boolean) => Self::RleBoolean(IntRleDecoder::new(data)),
            (Rle, Int32) => Self::RleInt32(IntRleDecoder::new(data)),
            (Rle, Int64) => Self::RleInt64(LongRleDecoder::new(data)),
            (Rle, Float) => Self::RleFloat(IntRleDecoder::new(data)),
            (Rle, Double) => Self::RleDouble(LongRleDecoder::new(data)),
            (Ts2Diff, Int32) => Self::Ts2DiffInt32(IntDeltaDecoder::new(data)),
            (Ts2Diff, Int64) => Self::Ts2DiffInt64(LongDeltaDecoder::new(data)),
            (Ts2Diff, Float) => Self::Ts2DiffFloat(IntDeltaDecoder::new(data)),
            (Ts2Diff, Double) => Self::Ts2DiffDouble(LongDeltaDecoder::new(data)),
            (Gorilla, Float) => Self::GorillaFloat(SinglePrecisionDecoder::new(data)),
            (Gorilla, Double) => Self::GorillaDouble(DoublePrecisionDecoder::new(data)),
            _ => {
                return Err(SchemaError::UnsupportedEncoding {
                    encoding,
                    data_type,
                }
                .into())
            }
        })
    }

    pub fn has_next(&mut self) -> Result<bool> {
        Ok(match self {
            Self::Plain(d) => d.has_next(),
            Self::RleBoolean(d) | Self::RleInt32(d) | Self::RleFloat(d) => d.has_next(),
            Self::RleInt64(d) | Self::RleDouble(d) => d.has_next(),
            Self::Ts2DiffInt32(d) | Self::Ts2DiffFloat(d) => d.has_next(),
            Self::Ts2DiffInt64(d) | Self::Ts2DiffDouble(d) => d.has_next(),
            Self::GorillaFloat(d) => d.has_next()?,
            Self::GorillaDouble(d) => d.has_next()?,
        })
    }

    pub fn next(&mut self) -> Result<TypedValue> {
        Ok(match self {
            Self::Plain(d) => d.next()?,
            Self::RleBoolean(d) => TypedValue::Boolean(d.next()? == 1),
            Self::RleInt32(d) => TypedValue::Int32(d.next()? as i32),
            Self::RleInt64(d) => TypedValue::Int64(d.next()? as i64),
            Self::RleFloat(d) => TypedValue::Float(f32::from_bits(d.next()?)),
            Self::RleDouble(d) => TypedValue::Double(f64::from_bits(d.next()?)),
            Self::Ts2DiffInt32(d) => TypedValue::Int32(d.next()?),
            Self::Ts2DiffInt64(d) => TypedValue::Int64(d.next()?),
            Self::Ts2DiffFloat(d) => TypedValue::Float(f32::from_bits(d.next()? as u32)),
            Self::Ts2DiffDouble(d) => TypedValue::Double(f64::from_bits(d.next()? as u64)),
            Self::GorillaFloat(d) => TypedValue::Float(d.next()?),
            Self::GorillaDouble(d) => TypedValue::Double(d.next()?),
        })
    }
}
