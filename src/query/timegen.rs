//! Timestamp generator: yields the timestamps of condition rows that
//! satisfy the filter, in ascending order.

use super::filter::Filter;
use super::row_record::RowRecordReader;
use crate::error::Result;
use crate::Timestamp;

pub struct RowRecordTimestampGenerator {
    reader: RowRecordReader,
    filter: Filter,
}

impl RowRecordTimestampGenerator {
    pub fn new(reader: RowRecordReader, filter: Filter) -> Self {
        Self { reader, filter }
    }

    pub fn next(&mut self) -> Result<Option<Timestamp>> {
        while let Some(record) = self.reader.next()? {
            if self.filter.satisfy(&record) {
                return Ok(Some(record.timestamp));
            }
        }
        Ok(None)
    }
}
