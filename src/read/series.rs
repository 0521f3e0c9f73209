//! Iteration over one `(device, sensor)` series, one page at a time.

use super::page::PageDataReader;
use super::reader::TsFileSequenceReader;
use crate::error::{CodecError, Result};
use crate::file::header::PageHeader;
use crate::{TimeValuePair, Timestamp, TsDataType, TsEncoding};
use std::cell::RefCell;
use std::rc::Rc;

/// Where one page body lives in the file.
#[derive(Clone, Copy, Debug)]
pub struct PageLocation {
    pub offset: u64,
    pub size: usize,
}

/// Streams a series in ascending timestamp order, materializing one page
/// at a time from the shared file reader.
pub struct SeriesReader {
    reader: Rc<RefCell<TsFileSequenceReader>>,
    data_type: TsDataType,
    encoding: TsEncoding,
    pages: Vec<PageLocation>,
    next_page: usize,
    current: Option<PageDataReader>,
}

impl SeriesReader {
    pub fn new(
        reader: Rc<RefCell<TsFileSequenceReader>>,
        data_type: TsDataType,
        encoding: TsEncoding,
        pages: Vec<PageLocation>,
    ) -> Self {
        Self {
            reader,
            data_type,
            encoding,
            pages,
            next_page: 0,
            current: None,
        }
    }

    fn load_page(&mut self, index: usize) -> Result<PageDataReader> {
        let location = self.pages[index];
        let body = self
            .reader
            .borrow_mut()
            .read_raw(location.offset, location.size)?;
        PageDataReader::new(self.data_type, self.encoding, body)
    }

    pub fn has_next(&mut self) -> Result<bool> {
        loop {
            if let Some(page) = &self.current {
                if page.has_next() {
                    return Ok(true);
                }
            }
            if self.next_page >= self.pages.len() {
                return Ok(false);
            }
            let page = self.load_page(self.next_page)?;
            self.next_page += 1;
            self.current = Some(page);
        }
    }

    pub fn next(&mut self) -> Result<TimeValuePair> {
        if !self.has_next()? {
            return Err(CodecError::Exhausted.into());
        }
        self.current
            .as_mut()
            .expect("has_next loaded a page")
            .next()
    }
}

/// A series reader that also carries its page headers, so it can jump to
/// the page whose time range contains a target timestamp. Seeks only move
/// forward; the query engine feeds it ascending timestamps.
pub struct SeekableSeriesReader {
    reader: Rc<RefCell<TsFileSequenceReader>>,
    data_type: TsDataType,
    encoding: TsEncoding,
    pages: Vec<PageLocation>,
    page_headers: Vec<PageHeader>,

    loaded: Option<usize>,
    page_reader: Option<PageDataReader>,
    current: Option<TimeValuePair>,
    // first page that might still contain a future target
    floor: usize,
}

impl SeekableSeriesReader {
    pub fn new(
        reader: Rc<RefCell<TsFileSequenceReader>>,
        data_type: TsDataType,
        encoding: TsEncoding,
        pages: Vec<PageLocation>,
        page_headers: Vec<PageHeader>,
    ) -> Self {
        Self {
            reader,
            data_type,
            encoding,
            pages,
            page_headers,
            loaded: None,
            page_reader: None,
            current: None,
            floor: 0,
        }
    }

    /// Advance to the first pair with timestamp >= `timestamp`; true iff
    /// the series contains that exact timestamp, in which case
    /// `current()` holds it.
    pub fn seek(&mut self, timestamp: Timestamp) -> Result<bool> {
        let mut index = self.floor.max(self.loaded.unwrap_or(0));
        while index < self.page_headers.len() && self.page_headers[index].max_timestamp < timestamp
        {
            index += 1;
        }
        self.floor = index;
        if index >= self.page_headers.len() {
            return Ok(false);
        }
        if self.page_headers[index].min_timestamp > timestamp {
            // falls in a gap before this page; keep state for later targets
            return Ok(false);
        }

        if self.loaded != Some(index) {
            let location = self.pages[index];
            let body = self
                .reader
                .borrow_mut()
                .read_raw(location.offset, location.size)?;
            self.page_reader = Some(PageDataReader::new(self.data_type, self.encoding, body)?);
            self.loaded = Some(index);
            self.current = None;
        }

        let page = self
            .page_reader
            .as_mut()
            .expect("page loaded above");
        if self.current.is_none() {
            if !page.has_next() {
                return Ok(false);
            }
            self.current = Some(page.next()?);
        }
        while self
            .current
            .as_ref()
            .is_some_and(|pair| pair.timestamp < timestamp)
        {
            if !page.has_next() {
                return Ok(false);
            }
            self.current = Some(page.next()?);
        }

        Ok(self
            .current
            .as_ref()
            .is_some_and(|pair| pair.timestamp == timestamp))
    }

    pub fn current(&self) -> Option<&TimeValuePair> {
        self.current.as_ref()
    }
}
