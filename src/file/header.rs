//! Wire structs for chunk and page headers.

use super::statistics::Statistics;
use crate::error::Result;
use crate::io::{var_int_size, write_string, write_unsigned_varint, FormatRead};
use crate::{CompressionType, Timestamp, TsDataType, TsEncoding};

/// Precedes the pages of one sensor within one row group.
#[derive(Clone, PartialEq, Debug)]
pub struct ChunkHeader {
    pub sensor_id: String,
    /// Total bytes of all following pages (headers included).
    pub data_size: u32,
    pub number_of_pages: u32,
    pub data_type: TsDataType,
    pub compression: CompressionType,
    pub encoding: TsEncoding,
}

impl ChunkHeader {
    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_string(&self.sensor_id, out);
        write_unsigned_varint(self.data_size, out);
        write_unsigned_varint(self.number_of_pages, out);
        out.extend_from_slice(&self.data_type.serialize().to_be_bytes());
        out.extend_from_slice(&self.compression.serialize().to_be_bytes());
        out.extend_from_slice(&self.encoding.serialize().to_be_bytes());
    }

    pub fn deserialize<R: FormatRead>(reader: &mut R) -> Result<Self> {
        let sensor_id = reader.read_string()?;
        let data_size = reader.read_unsigned_varint()?;
        let number_of_pages = reader.read_unsigned_varint()?;
        let data_type = TsDataType::try_from(reader.read_short()?)?;
        let compression = CompressionType::try_from(reader.read_short()?)?;
        let encoding = TsEncoding::try_from(reader.read_short()?)?;
        Ok(Self {
            sensor_id,
            data_size,
            number_of_pages,
            data_type,
            compression,
            encoding,
        })
    }

    pub fn serialized_size(&self) -> usize {
        4 + self.sensor_id.len()
            + var_int_size(self.data_size)
            + var_int_size(self.number_of_pages)
            + 3 * 2
    }
}

/// Fixed fields plus the page's type-dependent statistics. The max
/// timestamp serializes before the min.
#[derive(Clone, PartialEq, Debug)]
pub struct PageHeader {
    pub uncompressed_size: i32,
    pub compressed_size: i32,
    pub number_of_values: i32,
    pub max_timestamp: Timestamp,
    pub min_timestamp: Timestamp,
    pub statistics: Statistics,
}

impl PageHeader {
    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.uncompressed_size.to_be_bytes());
        out.extend_from_slice(&self.compressed_size.to_be_bytes());
        out.extend_from_slice(&self.number_of_values.to_be_bytes());
        out.extend_from_slice(&self.max_timestamp.to_be_bytes());
        out.extend_from_slice(&self.min_timestamp.to_be_bytes());
        self.statistics.serialize(out);
    }

    pub fn deserialize<R: FormatRead>(reader: &mut R, data_type: TsDataType) -> Result<Self> {
        Ok(Self {
            uncompressed_size: reader.read_int()?,
            compressed_size: reader.read_int()?,
            number_of_values: reader.read_int()?,
            max_timestamp: reader.read_long()?,
            min_timestamp: reader.read_long()?,
            statistics: Statistics::deserialize(reader, data_type)?,
        })
    }

    pub fn serialized_size(&self) -> usize {
        3 * 4 + 2 * 8 + self.statistics.serialized_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ByteReader;
    use crate::TypedValue;

    #[test]
    fn test_chunk_header_round_trip() {
        let header = ChunkHeader {
            sensor_id: "sensor_1".to_string(),
            data_size: 4096,
            number_of_pages: 3,
            data_type: TsDataType::Int32,
            compression: CompressionType::Uncompressed,
            encoding: TsEncoding::Rle,
        };

        let mut out = Vec::new();
        header.serialize(&mut out);
        assert_eq!(out.len(), header.serialized_size());

        let mut reader = ByteReader::new(out);
        assert_eq!(ChunkHeader::deserialize(&mut reader).unwrap(), header);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_page_header_round_trip() {
        let mut statistics = Statistics::new(TsDataType::Double);
        for v in [1.5, -2.5, 9.0] {
            statistics.update(&TypedValue::Double(v));
        }
        let header = PageHeader {
            uncompressed_size: 321,
            compressed_size: 321,
            number_of_values: 3,
            max_timestamp: 300,
            min_timestamp: 100,
            statistics,
        };

        let mut out = Vec::new();
        header.serialize(&mut out);
        assert_eq!(out.len(), header.serialized_size());

        let mut reader = ByteReader::new(out);
        let parsed = PageHeader::deserialize(&mut reader, TsDataType::Double).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_page_header_max_before_min() {
        let header = PageHeader {
            uncompressed_size: 0,
            compressed_size: 0,
            number_of_values: 0,
            max_timestamp: 0x0102_0304,
            min_timestamp: 0x0506_0708,
            statistics: Statistics::new(TsDataType::Boolean),
        };
        let mut out = Vec::new();
        header.serialize(&mut out);
        assert_eq!(&out[12..20], &0x0102_0304i64.to_be_bytes());
        assert_eq!(&out[20..28], &0x0506_0708i64.to_be_bytes());
    }
}
