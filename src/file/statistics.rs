//! Per-column statistics, one implementation per data type.
//!
//! Serialization order is `min, max, first, last, sum`; integer fields are
//! big-endian, float fields and the f64 sum little-endian, text fields
//! length-prefixed. Text carries no sum. `is_empty` means "has no samples
//! yet" and is not part of the wire form.

use crate::error::Result;
use crate::io::{write_binary, FormatRead};
use crate::{TsDataType, TypedValue};

#[derive(Clone, PartialEq, Debug)]
pub struct NumericStatistics<T> {
    pub min: T,
    pub max: T,
    pub first: T,
    pub last: T,
    pub sum: f64,
    is_empty: bool,
}

impl<T: Copy + Default + PartialOrd + Into<f64>> NumericStatistics<T> {
    fn new() -> Self {
        Self {
            min: T::default(),
            max: T::default(),
            first: T::default(),
            last: T::default(),
            sum: 0.0,
            is_empty: true,
        }
    }

    fn update(&mut self, value: T) {
        if self.is_empty {
            self.min = value;
            self.max = value;
            self.first = value;
            self.is_empty = false;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }
        self.last = value;
        self.sum += value.into();
    }

    fn merge(&mut self, other: &Self) {
        if other.is_empty {
            return;
        }
        if self.is_empty {
            *self = other.clone();
            return;
        }
        if other.min < self.min {
            self.min = other.min;
        }
        if other.max > self.max {
            self.max = other.max;
        }
        self.last = other.last;
        self.sum += other.sum;
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct BooleanStatistics {
    pub min: bool,
    pub max: bool,
    pub first: bool,
    pub last: bool,
    pub sum: f64,
    is_empty: bool,
}

impl BooleanStatistics {
    fn new() -> Self {
        Self {
            min: false,
            max: false,
            first: false,
            last: false,
            sum: 0.0,
            is_empty: true,
        }
    }

    fn update(&mut self, value: bool) {
        if self.is_empty {
            self.min = value;
            self.max = value;
            self.first = value;
            self.is_empty = false;
        } else {
            self.min &= value;
            self.max |= value;
        }
        self.last = value;
        self.sum += f64::from(u8::from(value));
    }

    fn merge(&mut self, other: &Self) {
        if other.is_empty {
            return;
        }
        if self.is_empty {
            *self = other.clone();
            return;
        }
        self.min &= other.min;
        self.max |= other.max;
        self.last = other.last;
        self.sum += other.sum;
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct TextStatistics {
    pub min: Vec<u8>,
    pub max: Vec<u8>,
    pub first: Vec<u8>,
    pub last: Vec<u8>,
    is_empty: bool,
}

impl TextStatistics {
    fn new() -> Self {
        Self {
            min: Vec::new(),
            max: Vec::new(),
            first: Vec::new(),
            last: Vec::new(),
            is_empty: true,
        }
    }

    fn update(&mut self, value: &[u8]) {
        if self.is_empty {
            self.min = value.to_vec();
            self.max = value.to_vec();
            self.first = value.to_vec();
            self.is_empty = false;
        } else {
            if value < self.min.as_slice() {
                self.min = value.to_vec();
            }
            if value > self.max.as_slice() {
                self.max = value.to_vec();
            }
        }
        self.last = value.to_vec();
    }

    fn merge(&mut self, other: &Self) {
        if other.is_empty {
            return;
        }
        if self.is_empty {
            *self = other.clone();
            return;
        }
        if other.min < self.min {
            self.min = other.min.clone();
        }
        if other.max > self.max {
            self.max = other.max.clone();
        }
        self.last = other.last.clone();
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Statistics {
    Boolean(BooleanStatistics),
    Int32(NumericStatistics<i32>),
    Int64(NumericStatistics<I64Sum>),
    Float(NumericStatistics<f32>),
    Double(NumericStatistics<f64>),
    Text(TextStatistics),
}

/// i64 wrapper whose `Into<f64>` is the double-cast required for sums.
#[derive(Clone, Copy, Default, PartialEq, PartialOrd, Debug)]
pub struct I64Sum(pub i64);

impl From<I64Sum> for f64 {
    fn from(value: I64Sum) -> Self {
        value.0 as f64
    }
}

impl Statistics {
    pub fn new(data_type: TsDataType) -> Self {
        match data_type {
            TsDataType::Boolean => Self::Boolean(BooleanStatistics::new()),
            TsDataType::Int32 => Self::Int32(NumericStatistics::new()),
            TsDataType::Int64 => Self::Int64(NumericStatistics::new()),
            TsDataType::Float => Self::Float(NumericStatistics::new()),
            TsDataType::Double => Self::Double(NumericStatistics::new()),
            TsDataType::Text => Self::Text(TextStatistics::new()),
        }
    }

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

    /// The caller has already type-checked `value` against the descriptor.
    pub fn update(&mut self, value: &TypedValue) {
        match (self, value) {
            (Self::Boolean(s), TypedValue::Boolean(v)) => s.update(*v),
            (Self::Int32(s), TypedValue::Int32(v)) => s.update(*v),
            (Self::Int64(s), TypedValue::Int64(v)) => s.update(I64Sum(*v)),
            (Self::Float(s), TypedValue::Float(v)) => s.update(*v),
            (Self::Double(s), TypedValue::Double(v)) => s.update(*v),
            (Self::Text(s), TypedValue::Text(v)) => s.update(v.as_bytes()),
            _ => unreachable!("value type checked against the descriptor"),
        }
    }

    pub fn merge(&mut self, other: &Statistics) {
        match (self, other) {
            (Self::Boolean(s), Self::Boolean(o)) => s.merge(o),
            (Self::Int32(s), Self::Int32(o)) => s.merge(o),
            (Self::Int64(s), Self::Int64(o)) => s.merge(o),
            (Self::Float(s), Self::Float(o)) => s.merge(o),
            (Self::Double(s), Self::Double(o)) => s.merge(o),
            (Self::Text(s), Self::Text(o)) => s.merge(o),
            _ => unreachable!("statistics merged across data types"),
        }
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        match self {
            Self::Boolean(s) => {
                out.push(u8::from(s.min));
                out.push(u8::from(s.max));
                out.push(u8::from(s.first));
                out.push(u8::from(s.last));
                out.extend_from_slice(&s.sum.to_bits().to_le_bytes());
            }
            Self::Int32(s) => {
                out.extend_from_slice(&s.min.to_be_bytes());
                out.extend_from_slice(&s.max.to_be_bytes());
                out.extend_from_slice(&s.first.to_be_bytes());
                out.extend_from_slice(&s.last.to_be_bytes());
                out.extend_from_slice(&s.sum.to_bits().to_le_bytes());
            }
            Self::Int64(s) => {
                out.extend_from_slice(&s.min.0.to_be_bytes());
                out.extend_from_slice(&s.max.0.to_be_bytes());
                out.extend_from_slice(&s.first.0.to_be_bytes());
                out.extend_from_slice(&s.last.0.to_be_bytes());
                out.extend_from_slice(&s.sum.to_bits().to_le_bytes());
            }
            Self::Float(s) => {
                out.extend_from_slice(&s.min.to_bits().to_le_bytes());
                out.extend_from_slice(&s.max.to_bits().to_le_bytes());
                out.extend_from_slice(&s.first.to_bits().to_le_bytes());
                out.extend_from_slice(&s.last.to_bits().to_le_bytes());
                out.extend_from_slice(&s.sum.to_bits().to_le_bytes());
            }
            Self::Double(s) => {
                out.extend_from_slice(&s.min.to_bits().to_le_bytes());
                out.extend_from_slice(&s.max.to_bits().to_le_bytes());
                out.extend_from_slice(&s.first.to_bits().to_le_bytes());
                out.extend_from_slice(&s.last.to_bits().to_le_bytes());
                out.extend_from_slice(&s.sum.to_bits().to_le_bytes());
            }
            Self::Text(s) => {
                write_binary(&s.min, out);
                write_binary(&s.max, out);
                write_binary(&s.first, out);
                write_binary(&s.last, out);
            }
        }
    }

    pub fn deserialize<R: FormatRead>(reader: &mut R, data_type: TsDataType) -> Result<Self> {
        Ok(match data_type {
            TsDataType::Boolean => Self::Boolean(BooleanStatistics {
                min: reader.read_bool()?,
                max: reader.read_bool()?,
                first: reader.read_bool()?,
                last: reader.read_bool()?,
                sum: reader.read_double()?,
                is_empty: false,
            }),
            TsDataType::Int32 => Self::Int32(NumericStatistics {
                min: reader.read_int()?,
                max: reader.read_int()?,
                first: reader.read_int()?,
                last: reader.read_int()?,
                sum: reader.read_double()?,
                is_empty: false,
            }),
            TsDataType::Int64 => Self::Int64(NumericStatistics {
                min: I64Sum(reader.read_long()?),
                max: I64Sum(reader.read_long()?),
                first: I64Sum(reader.read_long()?),
                last: I64Sum(reader.read_long()?),
                sum: reader.read_double()?,
                is_empty: false,
            }),
            TsDataType::Float => Self::Float(NumericStatistics {
                min: reader.read_float()?,
                max: reader.read_float()?,
                first: reader.read_float()?,
                last: reader.read_float()?,
                sum: reader.read_double()?,
                is_empty: false,
            }),
            TsDataType::Double => Self::Double(NumericStatistics {
                min: reader.read_double()?,
                max: reader.read_double()?,
                first: reader.read_double()?,
                last: reader.read_double()?,
                sum: reader.read_double()?,
                is_empty: false,
            }),
            TsDataType::Text => Self::Text(TextStatistics {
                min: reader.read_binary()?,
                max: reader.read_binary()?,
                first: reader.read_binary()?,
                last: reader.read_binary()?,
                is_empty: false,
            }),
        })
    }

    pub fn serialized_size(&self) -> usize {
        match self {
            Self::Boolean(_) => 4 + 8,
            Self::Int32(_) | Self::Float(_) => 4 * 4 + 8,
            Self::Int64(_) | Self::Double(_) => 4 * 8 + 8,
            Self::Text(s) => 4 * 4 + s.min.len() + s.max.len() + s.first.len() + s.last.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ByteReader;

    fn round_trip(stats: &Statistics) -> Statistics {
        let mut out = Vec::new();
        stats.serialize(&mut out);
        assert_eq!(out.len(), stats.serialized_size());

        let mut reader = ByteReader::new(out);
        let parsed = Statistics::deserialize(&mut reader, stats.data_type()).unwrap();
        assert_eq!(reader.remaining(), 0);
        parsed
    }

    #[test]
    fn test_int32_reductions() {
        let mut stats = Statistics::new(TsDataType::Int32);
        for v in [5, -3, 12, 0, 7] {
            stats.update(&TypedValue::Int32(v));
        }
        let Statistics::Int32(s) = &stats else {
            panic!("wrong variant");
        };
        assert_eq!(s.min, -3);
        assert_eq!(s.max, 12);
        assert_eq!(s.first, 5);
        assert_eq!(s.last, 7);
        assert_eq!(s.sum, 21.0);

        assert_eq!(round_trip(&stats), stats);
    }

    #[test]
    fn test_boolean_first_update_clears_empty() {
        let mut stats = Statistics::new(TsDataType::Boolean);
        stats.update(&TypedValue::Boolean(true));
        stats.update(&TypedValue::Boolean(false));
        stats.update(&TypedValue::Boolean(true));

        let Statistics::Boolean(s) = &stats else {
            panic!("wrong variant");
        };
        assert!(!s.min);
        assert!(s.max);
        assert!(s.first);
        assert!(s.last);
        assert_eq!(s.sum, 2.0);

        assert_eq!(round_trip(&stats), stats);
    }

    #[test]
    fn test_text_round_trip() {
        let mut stats = Statistics::new(TsDataType::Text);
        for v in ["pear", "apple", "zucchini", "melon"] {
            stats.update(&TypedValue::Text(v.to_string()));
        }
        let Statistics::Text(s) = &stats else {
            panic!("wrong variant");
        };
        assert_eq!(s.min, b"apple");
        assert_eq!(s.max, b"zucchini");
        assert_eq!(s.first, b"pear");
        assert_eq!(s.last, b"melon");

        assert_eq!(round_trip(&stats), stats);
    }

    #[test]
    fn test_double_sum_and_round_trip() {
        let mut stats = Statistics::new(TsDataType::Double);
        let values = [11.11111, -2.5, 0.25];
        for v in values {
            stats.update(&TypedValue::Double(v));
        }
        let Statistics::Double(s) = &stats else {
            panic!("wrong variant");
        };
        assert!((s.sum - values.iter().sum::<f64>()).abs() < 1e-12);
        assert_eq!(round_trip(&stats), stats);
    }

    #[test]
    fn test_merge_rolls_pages_into_chunk() {
        let mut page1 = Statistics::new(TsDataType::Int64);
        for v in [10i64, 20, 30] {
            page1.update(&TypedValue::Int64(v));
        }
        let mut page2 = Statistics::new(TsDataType::Int64);
        for v in [5i64, 40] {
            page2.update(&TypedValue::Int64(v));
        }

        let mut chunk = Statistics::new(TsDataType::Int64);
        chunk.merge(&page1);
        chunk.merge(&page2);

        let Statistics::Int64(s) = &chunk else {
            panic!("wrong variant");
        };
        assert_eq!(s.min.0, 5);
        assert_eq!(s.max.0, 40);
        assert_eq!(s.first.0, 10);
        assert_eq!(s.last.0, 40);
        assert_eq!(s.sum, 105.0);
    }

    #[test]
    fn test_empty_statistics_serialize_to_defaults() {
        let stats = Statistics::new(TsDataType::Float);
        let parsed = round_trip(&stats);
        let Statistics::Float(s) = parsed else {
            panic!("wrong variant");
        };
        assert_eq!(s.min, 0.0);
        assert_eq!(s.sum, 0.0);
    }
}
