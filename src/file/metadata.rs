//! Footer metadata: the index from devices and sensors down to chunk
//! offsets, written once at close and parsed once at open.

use super::statistics::Statistics;
use crate::error::Result;
use crate::io::{write_string, FormatRead};
use crate::{Timestamp, TsDataType};
use rustc_hash::FxHashMap;

/// Points at one chunk's header and summarizes its contents.
#[derive(Clone, PartialEq, Debug)]
pub struct ChunkMetaData {
    pub sensor_id: String,
    /// Absolute file offset of the ChunkHeader.
    pub file_offset_of_corresponding_data: i64,
    pub data_type: TsDataType,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub statistics: Statistics,
}

impl ChunkMetaData {
    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_string(&self.sensor_id, out);
        out.extend_from_slice(&self.file_offset_of_corresponding_data.to_be_bytes());
        out.extend_from_slice(&self.data_type.serialize().to_be_bytes());
        out.extend_from_slice(&self.start_time.to_be_bytes());
        out.extend_from_slice(&self.end_time.to_be_bytes());
        self.statistics.serialize(out);
    }

    pub fn deserialize<R: FormatRead>(reader: &mut R) -> Result<Self> {
        let sensor_id = reader.read_string()?;
        let file_offset_of_corresponding_data = reader.read_long()?;
        let data_type = TsDataType::try_from(reader.read_short()?)?;
        let start_time = reader.read_long()?;
        let end_time = reader.read_long()?;
        let statistics = Statistics::deserialize(reader, data_type)?;
        Ok(Self {
            sensor_id,
            file_offset_of_corresponding_data,
            data_type,
            start_time,
            end_time,
            statistics,
        })
    }
}

/// All chunks of one device flushed together, in sensor-registration order.
#[derive(Clone, PartialEq, Debug)]
pub struct RowGroupMetaData {
    pub device_id: String,
    pub total_byte_size: i64,
    pub chunk_metadata_list: Vec<ChunkMetaData>,
}

impl RowGroupMetaData {
    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_string(&self.device_id, out);
        out.extend_from_slice(&self.total_byte_size.to_be_bytes());
        out.extend_from_slice(&(self.chunk_metadata_list.len() as i32).to_be_bytes());
        for chunk in &self.chunk_metadata_list {
            chunk.serialize(out);
        }
    }

    pub fn deserialize<R: FormatRead>(reader: &mut R) -> Result<Self> {
        let device_id = reader.read_string()?;
        let total_byte_size = reader.read_long()?;
        let num_chunks = reader.read_int()?;
        let mut chunk_metadata_list = Vec::with_capacity(num_chunks.max(0) as usize);
        for _ in 0..num_chunks {
            chunk_metadata_list.push(ChunkMetaData::deserialize(reader)?);
        }
        Ok(Self {
            device_id,
            total_byte_size,
            chunk_metadata_list,
        })
    }
}

/// Row groups of one device, in on-disk order.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct DeviceMetaData {
    pub row_group_metadata_list: Vec<RowGroupMetaData>,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TimeSeriesMetaData {
    pub data_type: TsDataType,
}

/// The footer. Devices and measurements keep writer insertion order on
/// disk; lookups go through hash maps built at parse time.
#[derive(Debug, Default)]
pub struct FileMetaData {
    device_order: Vec<String>,
    devices: FxHashMap<String, DeviceMetaData>,
    sensor_order: Vec<String>,
    time_series: FxHashMap<String, TimeSeriesMetaData>,
    properties: Vec<(String, String)>,
}

impl FileMetaData {
    pub fn new(
        devices: Vec<(String, DeviceMetaData)>,
        time_series: Vec<(String, TimeSeriesMetaData)>,
        properties: Vec<(String, String)>,
    ) -> Self {
        let mut meta = Self {
            properties,
            ..Self::default()
        };
        for (device_id, device) in devices {
            meta.device_order.push(device_id.clone());
            meta.devices.insert(device_id, device);
        }
        for (sensor_id, series) in time_series {
            meta.sensor_order.push(sensor_id.clone());
            meta.time_series.insert(sensor_id, series);
        }
        meta
    }

    pub fn device(&self, device_id: &str) -> Option<&DeviceMetaData> {
        self.devices.get(device_id)
    }

    pub fn device_ids(&self) -> &[String] {
        &self.device_order
    }

    pub fn sensor_ids(&self) -> &[String] {
        &self.sensor_order
    }

    pub fn data_type(&self, sensor_id: &str) -> Option<TsDataType> {
        self.time_series.get(sensor_id).map(|ts| ts.data_type)
    }

    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.device_order.len() as i32).to_be_bytes());
        for device_id in &self.device_order {
            let device = &self.devices[device_id];
            write_string(device_id, out);
            out.extend_from_slice(&(device.row_group_metadata_list.len() as i32).to_be_bytes());
            for row_group in &device.row_group_metadata_list {
                row_group.serialize(out);
            }
        }

        out.extend_from_slice(&(self.sensor_order.len() as i32).to_be_bytes());
        for sensor_id in &self.sensor_order {
            write_string(sensor_id, out);
            out.extend_from_slice(&self.time_series[sensor_id].data_type.serialize().to_be_bytes());
        }

        out.extend_from_slice(&(self.properties.len() as i32).to_be_bytes());
        for (key, value) in &self.properties {
            write_string(key, out);
            write_string(value, out);
        }
    }

    pub fn deserialize<R: FormatRead>(reader: &mut R) -> Result<Self> {
        let mut meta = Self::default();

        let num_devices = reader.read_int()?;
        for _ in 0..num_devices {
            let device_id = reader.read_string()?;
            let num_row_groups = reader.read_int()?;
            let mut device = DeviceMetaData::default();
            for _ in 0..num_row_groups {
                device
                    .row_group_metadata_list
                    .push(RowGroupMetaData::deserialize(reader)?);
            }
            meta.device_order.push(device_id.clone());
            meta.devices.insert(device_id, device);
        }

        let num_measurements = reader.read_int()?;
        for _ in 0..num_measurements {
            let sensor_id = reader.read_string()?;
            let data_type = TsDataType::try_from(reader.read_short()?)?;
            meta.sensor_order.push(sensor_id.clone());
            meta.time_series
                .insert(sensor_id, TimeSeriesMetaData { data_type });
        }

        let num_properties = reader.read_int()?;
        for _ in 0..num_properties {
            let key = reader.read_string()?;
            let value = reader.read_string()?;
            meta.properties.push((key, value));
        }

        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ByteReader;
    use crate::TypedValue;

    fn sample_chunk(sensor_id: &str, offset: i64) -> ChunkMetaData {
        let mut statistics = Statistics::new(TsDataType::Int32);
        statistics.update(&TypedValue::Int32(11));
        statistics.update(&TypedValue::Int32(44));
        ChunkMetaData {
            sensor_id: sensor_id.to_string(),
            file_offset_of_corresponding_data: offset,
            data_type: TsDataType::Int32,
            start_time: 1,
            end_time: 99,
            statistics,
        }
    }

    #[test]
    fn test_chunk_metadata_round_trip() {
        let chunk = sample_chunk("sensor_1", 12);
        let mut out = Vec::new();
        chunk.serialize(&mut out);

        let mut reader = ByteReader::new(out);
        assert_eq!(ChunkMetaData::deserialize(&mut reader).unwrap(), chunk);
    }

    #[test]
    fn test_file_metadata_round_trip() {
        let row_group = RowGroupMetaData {
            device_id: "device_1".to_string(),
            total_byte_size: 777,
            chunk_metadata_list: vec![sample_chunk("s1", 12), sample_chunk("s2", 90)],
        };
        let meta = FileMetaData::new(
            vec![(
                "device_1".to_string(),
                DeviceMetaData {
                    row_group_metadata_list: vec![row_group],
                },
            )],
            vec![
                (
                    "s1".to_string(),
                    TimeSeriesMetaData {
                        data_type: TsDataType::Int32,
                    },
                ),
                (
                    "s2".to_string(),
                    TimeSeriesMetaData {
                        data_type: TsDataType::Int32,
                    },
                ),
            ],
            vec![("creator".to_string(), "unit-test".to_string())],
        );

        let mut out = Vec::new();
        meta.serialize(&mut out);

        let mut reader = ByteReader::new(out);
        let parsed = FileMetaData::deserialize(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);

        assert_eq!(parsed.device_ids(), ["device_1"]);
        assert_eq!(parsed.sensor_ids(), ["s1", "s2"]);
        assert_eq!(parsed.data_type("s1"), Some(TsDataType::Int32));
        assert_eq!(parsed.data_type("missing"), None);
        assert_eq!(
            parsed.device("device_1").unwrap().row_group_metadata_list[0]
                .chunk_metadata_list
                .len(),
            2
        );
        assert_eq!(parsed.properties(), [(
            "creator".to_string(),
            "unit-test".to_string()
        )]);
    }
}
