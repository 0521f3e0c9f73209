//! RLE / bit-packing hybrid.
//!
//! Package layout: `<packageLength:varint> <bitWidth:1 byte> <run>*`, where
//! packageLength counts the bitWidth byte plus all runs. A run is either
//!
//! * rle run: `<header:varint, lsb 0>` (count = header >> 1) followed by the
//!   repeated value, little-endian in ceil(bitWidth / 8) bytes, or
//! * bit-packed run: `<header:varint, lsb 1>` (groupCount = header >> 1),
//!   one byte `lastBitPackedNum`, then groupCount * bitWidth bytes packing
//!   groupCount groups of 8 values MSB-first. Only
//!   `(groupCount - 1) * 8 + lastBitPackedNum` of them are meaningful.
//!
//! The int variant caps the repeated value at 4 padded bytes, the long
//! variant at 8; a package declaring more is fatal for its page.
//!
//! Float and double columns configured with this encoding pass their raw
//! IEEE-754 bit patterns through the int/long variant, so arbitrary values
//! round-trip exactly and repeated readings still collapse to rle runs.

use super::bitpack;
use crate::error::{CodecError, Result};
use crate::io::{write_unsigned_varint, ByteReader, FormatRead};

/// Bit-packed groups hold this many values; runs shorter than this are
/// packed rather than run-length encoded.
pub const RLE_MIN_REPEATED_NUM: usize = 8;

pub trait RleWord: Copy + Eq {
    const MAX_BIT_WIDTH: u32;
    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
}

impl RleWord for u32 {
    const MAX_BIT_WIDTH: u32 = 32;

    fn to_bits(self) -> u64 {
        u64::from(self)
    }

    fn from_bits(bits: u64) -> Self {
        bits as u32
    }
}

impl RleWord for u64 {
    const MAX_BIT_WIDTH: u32 = 64;

    fn to_bits(self) -> u64 {
        self
    }

    fn from_bits(bits: u64) -> Self {
        bits
    }
}

pub type IntRleEncoder = RleEncoder<u32>;
pub type LongRleEncoder = RleEncoder<u64>;
pub type IntRleDecoder = RleDecoder<u32>;
pub type LongRleDecoder = RleDecoder<u64>;

pub struct RleEncoder<T: RleWord> {
    values: Vec<T>,
}

impl<T: RleWord> RleEncoder<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn encode(&mut self, value: T) {
        self.values.push(value);
    }

    pub fn flush(&mut self, out: &mut Vec<u8>) {
        if self.values.is_empty() {
            return;
        }

        let bit_width = self
            .values
            .iter()
            .map(|v| bitpack::bits_needed(v.to_bits()))
            .max()
            .unwrap_or(0);

        let mut body = vec![bit_width as u8];
        let mut pending: Vec<u64> = Vec::new();

        let mut i = 0;
        while i < self.values.len() {
            let mut j = i;
            while j < self.values.len() && self.values[j] == self.values[i] {
                j += 1;
            }
            if j - i >= RLE_MIN_REPEATED_NUM {
                Self::flush_bit_packed(&mut pending, bit_width, &mut body);
                Self::write_rle_run((j - i) as u32, self.values[i], bit_width, &mut body);
            } else {
                pending.extend((i..j).map(|k| self.values[k].to_bits()));
            }
            i = j;
        }
        Self::flush_bit_packed(&mut pending, bit_width, &mut body);

        write_unsigned_varint(body.len() as u32, out);
        out.extend_from_slice(&body);
        self.values.clear();
    }

    fn write_rle_run(count: u32, value: T, bit_width: u32, body: &mut Vec<u8>) {
        write_unsigned_varint(count << 1, body);
        let padded = bit_width.div_ceil(8) as usize;
        body.extend_from_slice(&value.to_bits().to_le_bytes()[..padded]);
    }

    fn flush_bit_packed(pending: &mut Vec<u64>, bit_width: u32, body: &mut Vec<u8>) {
        if pending.is_empty() {
            return;
        }
        let group_count = pending.len().div_ceil(RLE_MIN_REPEATED_NUM);
        let last_bit_packed_num = pending.len() - (group_count - 1) * RLE_MIN_REPEATED_NUM;

        write_unsigned_varint(((group_count as u32) << 1) | 1, body);
        body.push(last_bit_packed_num as u8);

        pending.resize(group_count * RLE_MIN_REPEATED_NUM, 0);
        bitpack::pack(pending, bit_width, body);
        pending.clear();
    }

    pub fn one_item_max_size(&self) -> usize {
        (T::MAX_BIT_WIDTH / 8) as usize
    }

    pub fn max_byte_size(&self) -> usize {
        // length + width byte, plus every buffered value at full width with
        // a worst-case run header each
        8 + self.values.len() * ((T::MAX_BIT_WIDTH / 8) as usize + 4)
    }
}

enum RunMode {
    Rle,
    BitPacked,
}

pub struct RleDecoder<T: RleWord> {
    reader: ByteReader,
    package: Option<ByteReader>,
    bit_width: u32,
    mode: RunMode,
    current_count: u32,
    current_value: T,
    decoded: Vec<u64>,
    decoded_pos: usize,
}

impl<T: RleWord> RleDecoder<T> {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            reader: ByteReader::new(data),
            package: None,
            bit_width: 0,
            mode: RunMode::BitPacked,
            current_count: 0,
            current_value: T::from_bits(0),
            decoded: Vec::new(),
            decoded_pos: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_count > 0
            || self.reader.remaining() > 0
            || self.package.as_ref().is_some_and(|p| p.remaining() > 0)
    }

    pub fn next(&mut self) -> Result<T> {
        if self.current_count == 0 {
            if self.package.as_ref().map_or(0, |p| p.remaining()) == 0 {
                self.load_package()?;
            }
            self.read_run()?;
        }

        self.current_count -= 1;
        Ok(match self.mode {
            RunMode::Rle => self.current_value,
            RunMode::BitPacked => {
                let value = T::from_bits(self.decoded[self.decoded_pos]);
                self.decoded_pos += 1;
                value
            }
        })
    }

    fn load_package(&mut self) -> Result<()> {
        if self.reader.remaining() == 0 {
            return Err(CodecError::Exhausted.into());
        }
        let length = self.reader.read_unsigned_varint()? as usize;
        let bytes = self.reader.read_slice(length, "rle package")?.to_vec();
        let mut package = ByteReader::new(bytes);

        let bit_width = u32::from(package.read_byte()?);
        let padded = bit_width.div_ceil(8);
        if padded > T::MAX_BIT_WIDTH / 8 {
            return Err(CodecError::RleWidthTooLarge {
                bit_width,
                padded,
                max: T::MAX_BIT_WIDTH / 8,
            }
            .into());
        }

        self.bit_width = bit_width;
        self.package = Some(package);
        Ok(())
    }

    fn read_run(&mut self) -> Result<()> {
        let package = self.package.as_mut().ok_or(CodecError::Exhausted)?;
        let header = package.read_unsigned_varint()?;

        if header & 1 == 0 {
            self.mode = RunMode::Rle;
            self.current_count = header >> 1;
            self.current_value = Self::read_padded_value(package, self.bit_width)?;
        } else {
            self.mode = RunMode::BitPacked;
            let group_count = (header >> 1) as usize;
            if group_count == 0 {
                return Err(CodecError::EmptyBitPackedRun.into());
            }
            let last_bit_packed_num = usize::from(package.read_byte()?);
            self.current_count =
                ((group_count - 1) * RLE_MIN_REPEATED_NUM + last_bit_packed_num) as u32;

            let bytes_to_read =
                (group_count * self.bit_width as usize).min(package.remaining());
            let bytes = package.read_slice(bytes_to_read, "bit-packed run")?;
            self.decoded.clear();
            bitpack::unpack(
                bytes,
                self.bit_width,
                group_count * RLE_MIN_REPEATED_NUM,
                &mut self.decoded,
            );
            self.decoded_pos = 0;
        }
        Ok(())
    }

    fn read_padded_value(package: &mut ByteReader, bit_width: u32) -> Result<T> {
        let padded = bit_width.div_ceil(8) as usize;
        let bytes = package.read_slice(padded, "rle repeated value")?;
        let mut bits: u64 = 0;
        for (i, byte) in bytes.iter().enumerate() {
            bits |= u64::from(*byte) << (8 * i);
        }
        Ok(T::from_bits(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip_int(values: &[i32]) {
        let mut encoder = IntRleEncoder::new();
        for v in values {
            encoder.encode(*v as u32);
        }
        let mut out = Vec::new();
        encoder.flush(&mut out);

        let mut decoder = IntRleDecoder::new(out);
        for v in values {
            assert!(decoder.has_next());
            assert_eq!(decoder.next().unwrap() as i32, *v);
        }
        assert!(!decoder.has_next());
    }

    fn round_trip_long(values: &[i64]) {
        let mut encoder = LongRleEncoder::new();
        for v in values {
            encoder.encode(*v as u64);
        }
        let mut out = Vec::new();
        encoder.flush(&mut out);

        let mut decoder = LongRleDecoder::new(out);
        for v in values {
            assert!(decoder.has_next());
            assert_eq!(decoder.next().unwrap() as i64, *v);
        }
        assert!(!decoder.has_next());
    }

    #[test]
    fn test_single_value() {
        round_trip_int(&[11]);
    }

    #[test]
    fn test_long_run_becomes_rle() {
        let values = vec![7i32; 100];
        let mut encoder = IntRleEncoder::new();
        for v in &values {
            encoder.encode(*v as u32);
        }
        let mut out = Vec::new();
        encoder.flush(&mut out);
        // varint len + width byte + run header + one 1-byte padded value
        assert!(out.len() <= 6);
        round_trip_int(&values);
    }

    #[test]
    fn test_mixed_runs_and_literals() {
        let mut values = Vec::new();
        values.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7]);
        values.extend(std::iter::repeat(42).take(20));
        values.extend_from_slice(&[9, 8, 7]);
        values.extend(std::iter::repeat(0).take(8));
        values.push(12345);
        round_trip_int(&values);
    }

    #[test]
    fn test_negative_values_use_full_width() {
        round_trip_int(&[-1, -5, i32::MIN, i32::MAX, 0, -1, -1, -1]);
    }

    #[test]
    fn test_all_zero_values() {
        round_trip_int(&[0; 30]);
    }

    #[test]
    fn test_partial_last_group() {
        // 11 literals: two groups, lastBitPackedNum = 3
        round_trip_int(&[3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5]);
    }

    #[test]
    fn test_long_values() {
        round_trip_long(&[1111111, 0, -1, i64::MAX, i64::MIN, 1111111, 42, 42]);
    }

    #[test]
    fn test_float_bit_patterns_round_trip() {
        let floats = [11.1f32, 11.1, 22.2, -0.0, f32::INFINITY];
        let mut encoder = IntRleEncoder::new();
        for f in &floats {
            encoder.encode(f.to_bits());
        }
        let mut out = Vec::new();
        encoder.flush(&mut out);

        let mut decoder = IntRleDecoder::new(out);
        for f in &floats {
            assert_eq!(f32::from_bits(decoder.next().unwrap()).to_bits(), f.to_bits());
        }
    }

    #[test]
    fn test_oversized_bit_width_is_fatal_for_int() {
        // package: length 2, bitWidth 40, one empty run
        let mut data = Vec::new();
        write_unsigned_varint(2, &mut data);
        data.push(40);
        data.push(0);

        let mut decoder = IntRleDecoder::new(data);
        assert!(decoder.next().is_err());
    }

    #[test]
    fn test_width_40_is_fine_for_long() {
        let wide = 1u64 << 39;
        round_trip_long(&[wide as i64, 1, 2, 3]);
    }

    #[test]
    fn test_next_past_end_is_an_error() {
        let mut encoder = IntRleEncoder::new();
        encoder.encode(1);
        let mut out = Vec::new();
        encoder.flush(&mut out);

        let mut decoder = IntRleDecoder::new(out);
        decoder.next().unwrap();
        assert!(decoder.next().is_err());
    }
}
