//! Per-sensor write state: a time encoder, a value encoder, running
//! statistics and a buffer of sealed pages that becomes the next chunk.

use crate::encoding::{TimeEncoder, ValueEncoder};
use crate::error::{Result, SchemaError};
use crate::file::header::{ChunkHeader, PageHeader};
use crate::file::metadata::ChunkMetaData;
use crate::file::statistics::Statistics;
use crate::io::{write_unsigned_varint, PositionedWriter};
use crate::write::schema::SensorDescriptor;
use crate::{CompressionType, Timestamp, TsDataType, TsEncoding, TsFileConfig, TypedValue};
use std::io::Write;

pub struct SeriesWriter {
    sensor_id: String,
    data_type: TsDataType,
    encoding: TsEncoding,
    compression: CompressionType,

    time_encoder: TimeEncoder,
    value_encoder: ValueEncoder,
    time_buffer: Vec<u8>,
    value_buffer: Vec<u8>,

    page_statistics: Statistics,
    points_in_page: usize,
    page_min_timestamp: Timestamp,
    page_max_timestamp: Timestamp,

    // sealed pages waiting for the next row-group flush
    chunk_buffer: Vec<u8>,
    number_of_pages: u32,
    chunk_statistics: Statistics,
    chunk_start_timestamp: Timestamp,
    chunk_end_timestamp: Timestamp,

    max_point_number: usize,
    page_size_threshold: usize,
}

impl SeriesWriter {
    pub fn new(descriptor: &SensorDescriptor, config: &TsFileConfig) -> Result<Self> {
        Ok(Self {
            sensor_id: descriptor.sensor_id.clone(),
            data_type: descriptor.data_type,
            encoding: descriptor.encoding,
            compression: descriptor.compression,

            time_encoder: TimeEncoder::new(),
            value_encoder: ValueEncoder::new(descriptor.encoding, descriptor.data_type)?,
            time_buffer: Vec::new(),
            value_buffer: Vec::new(),

            page_statistics: Statistics::new(descriptor.data_type),
            points_in_page: 0,
            page_min_timestamp: 0,
            page_max_timestamp: 0,

            chunk_buffer: Vec::new(),
            number_of_pages: 0,
            chunk_statistics: Statistics::new(descriptor.data_type),
            chunk_start_timestamp: 0,
            chunk_end_timestamp: 0,

            max_point_number: config.max_point_number,
            page_size_threshold: config.page_size_threshold,
        })
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn data_type(&self) -> TsDataType {
        self.data_type
    }

    pub fn write(&mut self, timestamp: Timestamp, value: &TypedValue) -> Result<()> {
        if value.data_type() != self.data_type {
            return Err(SchemaError::TypeMismatch {
                sensor: self.sensor_id.clone(),
                declared: self.data_type,
                received: value.data_type(),
            }
            .into());
        }

        self.time_encoder.encode(timestamp, &mut self.time_buffer);
        self.value_encoder.encode(value, &mut self.value_buffer);
        self.page_statistics.update(value);

        if self.points_in_page == 0 {
            self.page_min_timestamp = timestamp;
        }
        self.page_max_timestamp = timestamp;
        self.points_in_page += 1;

        if self.points_in_page >= self.max_point_number
            || self.estimated_page_size() > self.page_size_threshold
        {
            self.seal_page();
        }
        Ok(())
    }

    fn estimated_page_size(&self) -> usize {
        self.time_buffer.len()
            + self.value_buffer.len()
            + self.time_encoder.max_byte_size()
            + self.value_encoder.max_byte_size()
    }

    /// Everything buffered for the next row-group flush, current page
    /// included.
    pub fn estimated_size(&self) -> usize {
        self.chunk_buffer.len() + self.estimated_page_size()
    }

    pub fn has_data(&self) -> bool {
        self.points_in_page > 0 || self.number_of_pages > 0
    }

    /// Seal the current page: page header, then the time segment (with its
    /// varint length prefix) and the value segment, appended to the chunk
    /// buffer. Page state resets; page statistics roll into the chunk.
    fn seal_page(&mut self) {
        if self.points_in_page == 0 {
            return;
        }
        self.time_encoder.flush(&mut self.time_buffer);
        self.value_encoder.flush(&mut self.value_buffer);

        let mut body = Vec::with_capacity(self.time_buffer.len() + self.value_buffer.len() + 5);
        write_unsigned_varint(self.time_buffer.len() as u32, &mut body);
        body.extend_from_slice(&self.time_buffer);
        body.extend_from_slice(&self.value_buffer);

        let header = PageHeader {
            uncompressed_size: body.len() as i32,
            compressed_size: body.len() as i32,
            number_of_values: self.points_in_page as i32,
            max_timestamp: self.page_max_timestamp,
            min_timestamp: self.page_min_timestamp,
            statistics: self.page_statistics.clone(),
        };
        header.serialize(&mut self.chunk_buffer);
        self.chunk_buffer.extend_from_slice(&body);

        if self.number_of_pages == 0 {
            self.chunk_start_timestamp = self.page_min_timestamp;
        }
        self.chunk_end_timestamp = self.page_max_timestamp;
        self.chunk_statistics.merge(&self.page_statistics);
        self.number_of_pages += 1;

        self.time_buffer.clear();
        self.value_buffer.clear();
        self.page_statistics = Statistics::new(self.data_type);
        self.points_in_page = 0;
    }

    /// Finalize any partial page and emit the chunk: header, then the
    /// sealed pages. Returns the chunk's metadata and its total size on
    /// disk; chunk state resets for the next row group.
    pub fn seal_chunk<W: Write>(
        &mut self,
        out: &mut PositionedWriter<W>,
    ) -> Result<(ChunkMetaData, u64)> {
        self.seal_page();

        let file_offset = out.position();
        let header = ChunkHeader {
            sensor_id: self.sensor_id.clone(),
            data_size: self.chunk_buffer.len() as u32,
            number_of_pages: self.number_of_pages,
            data_type: self.data_type,
            compression: self.compression,
            encoding: self.encoding,
        };
        let mut header_bytes = Vec::with_capacity(header.serialized_size());
        header.serialize(&mut header_bytes);
        out.write_all(&header_bytes)?;
        out.write_all(&self.chunk_buffer)?;

        let metadata = ChunkMetaData {
            sensor_id: self.sensor_id.clone(),
            file_offset_of_corresponding_data: file_offset as i64,
            data_type: self.data_type,
            start_time: self.chunk_start_timestamp,
            end_time: self.chunk_end_timestamp,
            statistics: self.chunk_statistics.clone(),
        };
        let written = (header_bytes.len() + self.chunk_buffer.len()) as u64;

        self.chunk_buffer.clear();
        self.number_of_pages = 0;
        self.chunk_statistics = Statistics::new(self.data_type);
        self.chunk_start_timestamp = 0;
        self.chunk_end_timestamp = 0;

        Ok((metadata, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TsEncoding;

    fn descriptor() -> SensorDescriptor {
        SensorDescriptor::new("s1", TsDataType::Int32, TsEncoding::Plain)
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let config = TsFileConfig::default();
        let mut writer = SeriesWriter::new(&descriptor(), &config).unwrap();
        assert!(writer.write(1, &TypedValue::Int64(5)).is_err());
        assert!(!writer.has_data());
    }

    #[test]
    fn test_pages_seal_at_max_point_number() {
        let config = TsFileConfig {
            max_point_number: 10,
            ..TsFileConfig::default()
        };
        let mut writer = SeriesWriter::new(&descriptor(), &config).unwrap();
        for i in 0..25i64 {
            writer.write(i, &TypedValue::Int32(i as i32)).unwrap();
        }

        let mut out = PositionedWriter::new(Vec::new());
        let (metadata, written) = writer.seal_chunk(&mut out).unwrap();
        assert_eq!(metadata.start_time, 0);
        assert_eq!(metadata.end_time, 24);
        assert_eq!(out.position(), written);

        // 25 points at 10 per page is three pages
        let mut reader = crate::io::ByteReader::new(out.get_mut().clone());
        let header = ChunkHeader::deserialize(&mut reader).unwrap();
        assert_eq!(header.number_of_pages, 3);
        assert_eq!(header.data_size as usize, reader.remaining());
    }

    #[test]
    fn test_empty_chunk_still_serializes() {
        let config = TsFileConfig::default();
        let mut writer = SeriesWriter::new(&descriptor(), &config).unwrap();

        let mut out = PositionedWriter::new(Vec::new());
        let (metadata, _) = writer.seal_chunk(&mut out).unwrap();
        assert_eq!(metadata.start_time, 0);
        assert_eq!(metadata.end_time, 0);

        let mut reader = crate::io::ByteReader::new(out.get_mut().clone());
        let header = ChunkHeader::deserialize(&mut reader).unwrap();
        assert_eq!(header.number_of_pages, 0);
        assert_eq!(header.data_size, 0);
    }
}
