//! Delta-of-delta codec for integer columns and the timestamp column.
//!
//! Values are grouped into blocks of up to 128. A block serializes as
//! `valueCount:i32 BE`, `bitWidth:i32 BE`, `minDeltaOfDelta`, `firstValue`
//! (both at the variant's width, big-endian), then the packed non-negative
//! residuals `dd_i - minDeltaOfDelta` at bitWidth bits each. Reconstruction:
//!
//! ```text
//! v_0 = firstValue; delta_0 = 0
//! dd_i    = residual_i + minDeltaOfDelta
//! delta_i = delta_{i-1} + dd_i
//! v_i     = v_{i-1} + delta_i
//! ```
//!
//! All arithmetic is two's-complement wrapping at the variant's width, so
//! any value sequence round-trips, including float bit patterns routed
//! through the integer variants. Blocks concatenate within a page; the
//! final block's count field doubles as its partial-length prefix.

use super::bitpack;
use crate::error::{CodecError, Result};
use crate::io::{ByteReader, FormatRead};

pub const BLOCK_CAPACITY: usize = 128;

pub trait DeltaWord: Copy {
    const BIT_WIDTH: u32;
    const MASK: u64;

    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
    /// Signed interpretation at the variant's width, for picking the
    /// minimum delta-of-delta.
    fn signed(bits: u64) -> i64;
    fn write_be(self, out: &mut Vec<u8>);
    fn read_be(reader: &mut ByteReader) -> Result<Self>;
}

impl DeltaWord for i32 {
    const BIT_WIDTH: u32 = 32;
    const MASK: u64 = 0xFFFF_FFFF;

    fn to_bits(self) -> u64 {
        u64::from(self as u32)
    }

    fn from_bits(bits: u64) -> Self {
        bits as u32 as i32
    }

    fn signed(bits: u64) -> i64 {
        i64::from(bits as u32 as i32)
    }

    fn write_be(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn read_be(reader: &mut ByteReader) -> Result<Self> {
        reader.read_int()
    }
}

impl DeltaWord for i64 {
    const BIT_WIDTH: u32 = 64;
    const MASK: u64 = u64::MAX;

    fn to_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits as i64
    }

    fn signed(bits: u64) -> i64 {
        bits as i64
    }

    fn write_be(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn read_be(reader: &mut ByteReader) -> Result<Self> {
        reader.read_long()
    }
}

pub type IntDeltaEncoder = DeltaEncoder<i32>;
pub type LongDeltaEncoder = DeltaEncoder<i64>;
pub type IntDeltaDecoder = DeltaDecoder<i32>;
pub type LongDeltaDecoder = DeltaDecoder<i64>;

pub struct DeltaEncoder<T: DeltaWord> {
    block: Vec<T>,
}

impl<T: DeltaWord> DeltaEncoder<T> {
    pub fn new() -> Self {
        Self {
            block: Vec::with_capacity(BLOCK_CAPACITY),
        }
    }

    pub fn encode(&mut self, value: T, out: &mut Vec<u8>) {
        self.block.push(value);
        if self.block.len() == BLOCK_CAPACITY {
            self.seal_block(out);
        }
    }

    pub fn flush(&mut self, out: &mut Vec<u8>) {
        if !self.block.is_empty() {
            self.seal_block(out);
        }
    }

    fn seal_block(&mut self, out: &mut Vec<u8>) {
        let count = self.block.len();
        let first = self.block[0];

        let mut dds: Vec<u64> = Vec::with_capacity(count.saturating_sub(1));
        let mut prev_value = first.to_bits();
        let mut prev_delta: u64 = 0;
        for value in &self.block[1..] {
            let delta = value.to_bits().wrapping_sub(prev_value) & T::MASK;
            dds.push(delta.wrapping_sub(prev_delta) & T::MASK);
            prev_delta = delta;
            prev_value = value.to_bits();
        }

        let min_dd = dds
            .iter()
            .copied()
            .min_by_key(|dd| T::signed(*dd))
            .unwrap_or(0);
        let residuals: Vec<u64> = dds
            .iter()
            .map(|dd| dd.wrapping_sub(min_dd) & T::MASK)
            .collect();
        let bit_width = residuals
            .iter()
            .map(|r| bitpack::bits_needed(*r))
            .max()
            .unwrap_or(0);

        out.extend_from_slice(&(count as i32).to_be_bytes());
        out.extend_from_slice(&(bit_width as i32).to_be_bytes());
        T::from_bits(min_dd).write_be(out);
        first.write_be(out);
        bitpack::pack(&residuals, bit_width, out);

        self.block.clear();
    }

    pub fn one_item_max_size(&self) -> usize {
        (T::BIT_WIDTH / 8) as usize
    }

    pub fn max_byte_size(&self) -> usize {
        // block header plus every buffered value at full width
        24 + self.block.len() * ((T::BIT_WIDTH / 8) as usize)
    }
}

pub struct DeltaDecoder<T: DeltaWord> {
    reader: ByteReader,
    residuals: Vec<u64>,
    residual_pos: usize,
    remaining_in_block: usize,
    emit_first: bool,
    min_dd: u64,
    prev_value: u64,
    prev_delta: u64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: DeltaWord> DeltaDecoder<T> {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            reader: ByteReader::new(data),
            residuals: Vec::new(),
            residual_pos: 0,
            remaining_in_block: 0,
            emit_first: false,
            min_dd: 0,
            prev_value: 0,
            prev_delta: 0,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn has_next(&self) -> bool {
        self.remaining_in_block > 0 || self.reader.remaining() > 0
    }

    pub fn next(&mut self) -> Result<T> {
        if self.remaining_in_block == 0 {
            self.load_block()?;
        }
        self.remaining_in_block -= 1;

        if self.emit_first {
            self.emit_first = false;
            return Ok(T::from_bits(self.prev_value));
        }

        let dd = self.residuals[self.residual_pos].wrapping_add(self.min_dd) & T::MASK;
        self.residual_pos += 1;
        self.prev_delta = self.prev_delta.wrapping_add(dd) & T::MASK;
        self.prev_value = self.prev_value.wrapping_add(self.prev_delta) & T::MASK;
        Ok(T::from_bits(self.prev_value))
    }

    fn load_block(&mut self) -> Result<()> {
        if self.reader.remaining() == 0 {
            return Err(CodecError::Exhausted.into());
        }
        let count = self.reader.read_int()?;
        if count < 1 || count as usize > BLOCK_CAPACITY {
            return Err(CodecError::BadBlockCount {
                count,
                capacity: BLOCK_CAPACITY,
            }
            .into());
        }
        let bit_width = self.reader.read_int()? as u32;
        if bit_width > T::BIT_WIDTH {
            return Err(CodecError::RleWidthTooLarge {
                bit_width,
                padded: bit_width.div_ceil(8),
                max: T::BIT_WIDTH / 8,
            }
            .into());
        }

        self.min_dd = T::read_be(&mut self.reader)?.to_bits();
        self.prev_value = T::read_be(&mut self.reader)?.to_bits();
        self.prev_delta = 0;

        let residual_count = count as usize - 1;
        let payload = self.reader.read_slice(
            bitpack::packed_size(residual_count, bit_width),
            "delta block payload",
        )?;
        self.residuals.clear();
        bitpack::unpack(payload, bit_width, residual_count, &mut self.residuals);
        self.residual_pos = 0;
        self.remaining_in_block = count as usize;
        self.emit_first = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip_long(values: &[i64]) {
        let mut encoder = LongDeltaEncoder::new();
        let mut out = Vec::new();
        for v in values {
            encoder.encode(*v, &mut out);
        }
        encoder.flush(&mut out);

        let mut decoder = LongDeltaDecoder::new(out);
        for v in values {
            assert!(decoder.has_next());
            assert_eq!(decoder.next().unwrap(), *v);
        }
        assert!(!decoder.has_next());
    }

    fn round_trip_int(values: &[i32]) {
        let mut encoder = IntDeltaEncoder::new();
        let mut out = Vec::new();
        for v in values {
            encoder.encode(*v, &mut out);
        }
        encoder.flush(&mut out);

        let mut decoder = IntDeltaDecoder::new(out);
        for v in values {
            assert!(decoder.has_next());
            assert_eq!(decoder.next().unwrap(), *v);
        }
        assert!(!decoder.has_next());
    }

    #[test]
    fn test_sequential_values() {
        let values: Vec<i32> = (0..1024).map(|i| 1000 + i).collect();
        round_trip_int(&values);
    }

    #[test]
    fn test_sequential_timestamps() {
        let values: Vec<i64> = (0..1024).collect();
        round_trip_long(&values);
    }

    #[test]
    fn test_single_value_block() {
        round_trip_long(&[42]);
    }

    #[test]
    fn test_exactly_one_block() {
        let values: Vec<i64> = (0..BLOCK_CAPACITY as i64).map(|i| i * 3).collect();
        round_trip_long(&values);
    }

    #[test]
    fn test_partial_final_block() {
        let values: Vec<i64> = (0..300).map(|i| 1_000_000 + i * 7).collect();
        round_trip_long(&values);
    }

    #[test]
    fn test_negative_deltas() {
        round_trip_long(&[100, 3, 23, 0, 100, u32::MAX as i64, 1]);
        round_trip_int(&[100, -100, 50, -50, 0, 0, 7]);
    }

    #[test]
    fn test_extreme_values_wrap() {
        round_trip_long(&[i64::MAX, i64::MIN, 0, -1, i64::MAX, 1]);
        round_trip_int(&[i32::MAX, i32::MIN, -1, 0, i32::MAX]);
    }

    #[test]
    fn test_constant_series_is_compact() {
        let values = vec![5i64; 128];
        let mut encoder = LongDeltaEncoder::new();
        let mut out = Vec::new();
        for v in &values {
            encoder.encode(*v, &mut out);
        }
        encoder.flush(&mut out);
        // header only: count + width + minDelta + first
        assert_eq!(out.len(), 4 + 4 + 8 + 8);
        round_trip_long(&values);
    }

    #[test]
    fn test_bad_block_count_is_fatal() {
        let mut data = Vec::new();
        data.extend_from_slice(&500i32.to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes());
        data.extend_from_slice(&0i64.to_be_bytes());
        data.extend_from_slice(&0i64.to_be_bytes());

        let mut decoder = LongDeltaDecoder::new(data);
        assert!(decoder.next().is_err());
    }
}
