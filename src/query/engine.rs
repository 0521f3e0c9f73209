//! Footer-driven query evaluation over one file.
//!
//! Every queried path resolves, through the footer, to the ordered list of
//! its pages. Filterless queries merge the select columns by timestamp;
//! filtered queries generate satisfying timestamps from the condition
//! columns and seek the select columns to each of them.

use super::filter::Filter;
use super::row_record::{RowRecord, RowRecordReader};
use super::timegen::RowRecordTimestampGenerator;
use crate::error::Result;
use crate::file::header::PageHeader;
use crate::read::reader::TsFileSequenceReader;
use crate::read::series::{PageLocation, SeekableSeriesReader, SeriesReader};
use crate::{Path, TsDataType, TsEncoding};
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct QueryExpression {
    pub select_paths: Vec<Path>,
    pub filter: Option<Filter>,
}

impl QueryExpression {
    pub fn new(select_paths: Vec<Path>) -> Self {
        Self {
            select_paths,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

struct SeriesPlan {
    data_type: TsDataType,
    encoding: TsEncoding,
    pages: Vec<PageLocation>,
    page_headers: Vec<PageHeader>,
}

pub struct QueryEngine {
    reader: Rc<RefCell<TsFileSequenceReader>>,
}

impl QueryEngine {
    pub fn new(reader: TsFileSequenceReader) -> Self {
        Self {
            reader: Rc::new(RefCell::new(reader)),
        }
    }

    pub fn query(&mut self, expression: QueryExpression) -> Result<QueryDataSet> {
        match expression.filter {
            None => {
                let readers = self.build_series_readers(&expression.select_paths)?;
                Ok(QueryDataSet::WithoutFilter {
                    reader: RowRecordReader::new(expression.select_paths, readers),
                })
            }
            Some(filter) => {
                let condition_paths = filter.condition_paths();
                let condition_readers = self.build_series_readers(&condition_paths)?;
                let generator = RowRecordTimestampGenerator::new(
                    RowRecordReader::new(condition_paths, condition_readers),
                    filter,
                );

                let mut select_readers = Vec::with_capacity(expression.select_paths.len());
                for path in &expression.select_paths {
                    let plan = self.plan_series(path)?;
                    select_readers.push(SeekableSeriesReader::new(
                        self.reader.clone(),
                        plan.data_type,
                        plan.encoding,
                        plan.pages,
                        plan.page_headers,
                    ));
                }
                Ok(QueryDataSet::WithFilter {
                    generator,
                    paths: Rc::new(expression.select_paths),
                    readers: select_readers,
                })
            }
        }
    }

    fn build_series_readers(&mut self, paths: &[Path]) -> Result<Vec<SeriesReader>> {
        let mut readers = Vec::with_capacity(paths.len());
        for path in paths {
            let plan = self.plan_series(path)?;
            readers.push(SeriesReader::new(
                self.reader.clone(),
                plan.data_type,
                plan.encoding,
                plan.pages,
            ));
        }
        Ok(readers)
    }

    /// Resolve a path to its ordered page list: footer -> chunk offsets ->
    /// chunk headers -> page headers. Unknown paths resolve to an empty
    /// series.
    fn plan_series(&mut self, path: &Path) -> Result<SeriesPlan> {
        let mut reader = self.reader.borrow_mut();

        let (data_type, chunk_offsets) = {
            let metadata = reader.read_file_metadata()?;
            let Some(data_type) = metadata.data_type(&path.sensor) else {
                warn!("no such timeseries in this file: {path}");
                return Ok(SeriesPlan::empty());
            };
            let Some(device) = metadata.device(&path.device) else {
                warn!("no such timeseries in this file: {path}");
                return Ok(SeriesPlan::empty());
            };
            let offsets: Vec<i64> = device
                .row_group_metadata_list
                .iter()
                .flat_map(|row_group| row_group.chunk_metadata_list.iter())
                .filter(|chunk| chunk.sensor_id == path.sensor)
                .map(|chunk| chunk.file_offset_of_corresponding_data)
                .collect();
            (data_type, offsets)
        };

        let mut plan = SeriesPlan {
            data_type,
            encoding: TsEncoding::Plain,
            pages: Vec::new(),
            page_headers: Vec::new(),
        };
        for chunk_offset in chunk_offsets {
            let chunk_header = reader.read_chunk_header_at(chunk_offset as u64)?;
            plan.encoding = chunk_header.encoding;
            for _ in 0..chunk_header.number_of_pages {
                let page_header = reader.read_page_header(data_type)?;
                let body_offset = reader.pos()?;
                let body_size = page_header.compressed_size as usize;
                plan.pages.push(PageLocation {
                    offset: body_offset,
                    size: body_size,
                });
                plan.page_headers.push(page_header);
                reader.skip(body_size as u64)?;
            }
        }
        Ok(plan)
    }
}

impl SeriesPlan {
    fn empty() -> Self {
        Self {
            data_type: TsDataType::Boolean,
            encoding: TsEncoding::Plain,
            pages: Vec::new(),
            page_headers: Vec::new(),
        }
    }
}

pub enum QueryDataSet {
    WithoutFilter {
        reader: RowRecordReader,
    },
    WithFilter {
        generator: RowRecordTimestampGenerator,
        paths: Rc<Vec<Path>>,
        readers: Vec<SeekableSeriesReader>,
    },
}

impl QueryDataSet {
    /// Rows come out in strictly ascending timestamp order.
    pub fn next(&mut self) -> Result<Option<RowRecord>> {
        match self {
            Self::WithoutFilter { reader } => reader.next(),
            Self::WithFilter {
                generator,
                paths,
                readers,
            } => {
                let Some(timestamp) = generator.next()? else {
                    return Ok(None);
                };
                let mut values = Vec::with_capacity(readers.len());
                for reader in readers.iter_mut() {
                    if reader.seek(timestamp)? {
                        values.push(reader.current().map(|pair| pair.value.clone()));
                    } else {
                        values.push(None);
                    }
                }
                Ok(Some(RowRecord {
                    timestamp,
                    paths: paths.clone(),
                    values,
                }))
            }
        }
    }
}
