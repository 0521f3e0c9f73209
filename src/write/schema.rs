//! The file schema: which sensors exist, their types and encodings.
//!
//! The schema is populated before the first record arrives and immutable
//! afterwards; the writer enforces that.

use crate::encoding::{TimeEncoder, ValueEncoder};
use crate::error::{Result, SchemaError};
use crate::file::metadata::TimeSeriesMetaData;
use crate::{CompressionType, TsDataType, TsEncoding};
use rustc_hash::FxHashMap;

#[derive(Clone, Debug)]
pub struct SensorDescriptor {
    pub sensor_id: String,
    pub data_type: TsDataType,
    pub encoding: TsEncoding,
    pub compression: CompressionType,
}

impl SensorDescriptor {
    pub fn new(sensor_id: impl Into<String>, data_type: TsDataType, encoding: TsEncoding) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            data_type,
            encoding,
            compression: CompressionType::Uncompressed,
        }
    }
}

pub struct FileSchema {
    descriptors: FxHashMap<String, SensorDescriptor>,
    registration_order: Vec<String>,
    current_max_byte_size_in_one_row: usize,
}

impl FileSchema {
    pub fn new() -> Self {
        Self {
            descriptors: FxHashMap::default(),
            registration_order: Vec::new(),
            current_max_byte_size_in_one_row: 0,
        }
    }

    pub fn register(&mut self, descriptor: SensorDescriptor) -> Result<()> {
        if self.descriptors.contains_key(&descriptor.sensor_id) {
            return Err(SchemaError::DuplicateSensor(descriptor.sensor_id).into());
        }
        // reject unsupported (encoding, type) pairs up front
        let value_encoder = ValueEncoder::new(descriptor.encoding, descriptor.data_type)?;

        self.current_max_byte_size_in_one_row +=
            TimeEncoder::new().one_item_max_size() + value_encoder.one_item_max_size();
        self.registration_order.push(descriptor.sensor_id.clone());
        self.descriptors
            .insert(descriptor.sensor_id.clone(), descriptor);
        Ok(())
    }

    pub fn descriptor(&self, sensor_id: &str) -> Option<&SensorDescriptor> {
        self.descriptors.get(sensor_id)
    }

    pub fn data_type(&self, sensor_id: &str) -> Option<TsDataType> {
        self.descriptors.get(sensor_id).map(|d| d.data_type)
    }

    /// Sensor ids in registration order; chunk order inside every row group
    /// mirrors this.
    pub fn sensor_ids(&self) -> &[String] {
        &self.registration_order
    }

    pub fn current_max_byte_size_in_one_row(&self) -> usize {
        self.current_max_byte_size_in_one_row
    }

    pub fn time_series_metadata(&self) -> Vec<(String, TimeSeriesMetaData)> {
        self.registration_order
            .iter()
            .map(|sensor_id| {
                (
                    sensor_id.clone(),
                    TimeSeriesMetaData {
                        data_type: self.descriptors[sensor_id].data_type,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_look_up() {
        let mut schema = FileSchema::new();
        schema
            .register(SensorDescriptor::new(
                "s1",
                TsDataType::Int32,
                TsEncoding::Rle,
            ))
            .unwrap();
        schema
            .register(SensorDescriptor::new(
                "s2",
                TsDataType::Text,
                TsEncoding::Plain,
            ))
            .unwrap();

        assert_eq!(schema.sensor_ids(), ["s1", "s2"]);
        assert_eq!(schema.data_type("s1"), Some(TsDataType::Int32));
        assert_eq!(schema.data_type("nope"), None);
        assert!(schema.current_max_byte_size_in_one_row() > 0);
    }

    #[test]
    fn test_duplicate_sensor_is_rejected() {
        let mut schema = FileSchema::new();
        let descriptor = SensorDescriptor::new("s1", TsDataType::Int32, TsEncoding::Plain);
        schema.register(descriptor.clone()).unwrap();
        assert!(schema.register(descriptor).is_err());
    }

    #[test]
    fn test_invalid_encoding_pair_is_rejected() {
        let mut schema = FileSchema::new();
        assert!(schema
            .register(SensorDescriptor::new(
                "s1",
                TsDataType::Text,
                TsEncoding::Gorilla,
            ))
            .is_err());
        assert!(schema.sensor_ids().is_empty());
    }
}
