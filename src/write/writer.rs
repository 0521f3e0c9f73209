//! The file writer: buffers records per device, flushes row groups past
//! the size threshold and appends the footer index at close.

use crate::error::{Result, UsageError};
use crate::file::metadata::{DeviceMetaData, FileMetaData};
use crate::io::PositionedWriter;
use crate::write::row_group::RowGroupWriter;
use crate::write::schema::{FileSchema, SensorDescriptor};
use crate::{TsFileConfig, TsRecord, MAGIC};
use log::debug;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub struct TsFileWriter {
    out: PositionedWriter<File>,
    schema: FileSchema,
    config: TsFileConfig,

    row_groups: FxHashMap<String, RowGroupWriter>,
    device_order: Vec<String>,
    device_metadata: FxHashMap<String, DeviceMetaData>,
    properties: Vec<(String, String)>,

    magic_written: bool,
    closed: bool,
}

impl TsFileWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, TsFileConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: TsFileConfig) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: PositionedWriter::new(file),
            schema: FileSchema::new(),
            config,
            row_groups: FxHashMap::default(),
            device_order: Vec::new(),
            device_metadata: FxHashMap::default(),
            properties: Vec::new(),
            magic_written: false,
            closed: false,
        })
    }

    /// Register a sensor. The schema is frozen by the first record.
    pub fn add_sensor(&mut self, descriptor: SensorDescriptor) -> Result<()> {
        if self.closed {
            return Err(UsageError::WriteAfterClose.into());
        }
        if self.magic_written {
            return Err(UsageError::AddSensorAfterWrite.into());
        }
        self.schema.register(descriptor)
    }

    /// Carried into the footer's property table.
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.push((key.into(), value.into()));
    }

    pub fn write(&mut self, record: &TsRecord) -> Result<()> {
        if self.closed {
            return Err(UsageError::WriteAfterClose.into());
        }
        if record.data_points.is_empty() {
            return Err(UsageError::EmptyRecord(record.device_id.clone()).into());
        }

        let group = match self.row_groups.entry(record.device_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let group = RowGroupWriter::new(&record.device_id, &self.schema, &self.config)?;
                self.device_order.push(record.device_id.clone());
                entry.insert(group)
            }
        };
        // schema errors must leave no partial series state behind
        group.validate(&record.data_points)?;

        if !self.magic_written {
            self.out.write_all(MAGIC)?;
            self.magic_written = true;
        }
        group.write(record.timestamp, &record.data_points)?;

        if group.estimated_size() > self.config.row_group_size_threshold {
            Self::flush_row_group(
                group,
                &record.device_id,
                &mut self.out,
                &mut self.device_metadata,
            )?;
        }
        Ok(())
    }

    fn ensure_magic(&mut self) -> Result<()> {
        if !self.magic_written {
            self.out.write_all(MAGIC)?;
            self.magic_written = true;
        }
        Ok(())
    }

    fn flush_row_group(
        group: &mut RowGroupWriter,
        device_id: &str,
        out: &mut PositionedWriter<File>,
        device_metadata: &mut FxHashMap<String, DeviceMetaData>,
    ) -> Result<()> {
        let metadata = group.flush(out)?;
        debug!(
            "flushed row group for {device_id}: {} bytes, {} chunks",
            metadata.total_byte_size,
            metadata.chunk_metadata_list.len()
        );
        device_metadata
            .entry(device_id.to_string())
            .or_default()
            .row_group_metadata_list
            .push(metadata);
        Ok(())
    }

    /// Flush remaining row groups, append the footer, its size and the
    /// trailing magic, then fsync. Mandatory; a file without a footer is
    /// corrupt.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(UsageError::WriteAfterClose.into());
        }
        self.ensure_magic()?;

        for device_id in &self.device_order {
            let Some(group) = self.row_groups.get_mut(device_id) else {
                continue;
            };
            if group.has_data() {
                let metadata = group.flush(&mut self.out)?;
                self.device_metadata
                    .entry(device_id.clone())
                    .or_default()
                    .row_group_metadata_list
                    .push(metadata);
            }
        }

        let devices = self
            .device_order
            .iter()
            .filter_map(|device_id| {
                self.device_metadata
                    .remove(device_id)
                    .map(|metadata| (device_id.clone(), metadata))
            })
            .collect();
        let footer = FileMetaData::new(
            devices,
            self.schema.time_series_metadata(),
            std::mem::take(&mut self.properties),
        );

        let mut footer_bytes = Vec::new();
        footer.serialize(&mut footer_bytes);
        debug!("writing footer: {} bytes", footer_bytes.len());

        self.out.write_all(&footer_bytes)?;
        self.out
            .write_all(&(footer_bytes.len() as i32).to_be_bytes())?;
        self.out.write_all(MAGIC)?;
        self.out.flush()?;
        self.out.get_mut().sync_all()?;

        self.closed = true;
        Ok(())
    }
}
