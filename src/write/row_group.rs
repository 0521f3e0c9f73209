//! Per-device group of series writers, flushed together as one row group.

use crate::error::{Result, SchemaError};
use crate::file::metadata::RowGroupMetaData;
use crate::io::PositionedWriter;
use crate::write::schema::FileSchema;
use crate::write::series::SeriesWriter;
use crate::{DataPoint, Timestamp, TsFileConfig};
use rustc_hash::FxHashMap;
use std::io::Write;

pub struct RowGroupWriter {
    device_id: String,
    // registration order; chunk order in the flushed row group mirrors it
    series: Vec<SeriesWriter>,
    index: FxHashMap<String, usize>,
}

impl RowGroupWriter {
    pub fn new(device_id: &str, schema: &FileSchema, config: &TsFileConfig) -> Result<Self> {
        let mut series = Vec::new();
        let mut index = FxHashMap::default();
        for sensor_id in schema.sensor_ids() {
            let descriptor = schema
                .descriptor(sensor_id)
                .ok_or_else(|| SchemaError::UnknownSensor(sensor_id.clone()))?;
            index.insert(sensor_id.clone(), series.len());
            series.push(SeriesWriter::new(descriptor, config)?);
        }
        Ok(Self {
            device_id: device_id.to_string(),
            series,
            index,
        })
    }

    pub fn write(&mut self, timestamp: Timestamp, data_points: &[DataPoint]) -> Result<()> {
        for point in data_points {
            let index = *self
                .index
                .get(&point.sensor_id)
                .ok_or_else(|| SchemaError::UnknownSensor(point.sensor_id.clone()))?;
            self.series[index].write(timestamp, &point.value)?;
        }
        Ok(())
    }

    /// Type- and schema-check a record without touching any series state,
    /// so a failing record leaves the writer untouched.
    pub fn validate(&self, data_points: &[DataPoint]) -> Result<()> {
        for point in data_points {
            let index = *self
                .index
                .get(&point.sensor_id)
                .ok_or_else(|| SchemaError::UnknownSensor(point.sensor_id.clone()))?;
            let declared = self.series[index].data_type();
            if point.value.data_type() != declared {
                return Err(SchemaError::TypeMismatch {
                    sensor: point.sensor_id.clone(),
                    declared,
                    received: point.value.data_type(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn estimated_size(&self) -> usize {
        self.series.iter().map(SeriesWriter::estimated_size).sum()
    }

    pub fn has_data(&self) -> bool {
        self.series.iter().any(SeriesWriter::has_data)
    }

    /// Emit one chunk per registered sensor, in registration order.
    pub fn flush<W: Write>(
        &mut self,
        out: &mut PositionedWriter<W>,
    ) -> Result<RowGroupMetaData> {
        let mut chunk_metadata_list = Vec::with_capacity(self.series.len());
        let mut total_byte_size: u64 = 0;
        for series in &mut self.series {
            let (metadata, written) = series.seal_chunk(out)?;
            chunk_metadata_list.push(metadata);
            total_byte_size += written;
        }
        Ok(RowGroupMetaData {
            device_id: self.device_id.clone(),
            total_byte_size: total_byte_size as i64,
            chunk_metadata_list,
        })
    }
}
