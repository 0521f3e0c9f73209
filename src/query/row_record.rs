//! Multi-column row view: merges several series by timestamp.

use crate::error::Result;
use crate::read::series::SeriesReader;
use crate::{Path, TimeValuePair, Timestamp, TypedValue};
use std::rc::Rc;

/// One output row. `values[i]` belongs to `paths[i]` and is `None` when
/// that column has no sample at this timestamp.
#[derive(Clone, Debug)]
pub struct RowRecord {
    pub timestamp: Timestamp,
    pub paths: Rc<Vec<Path>>,
    pub values: Vec<Option<TypedValue>>,
}

impl RowRecord {
    pub fn value_of(&self, path: &Path) -> Option<&TypedValue> {
        let index = self.paths.iter().position(|p| p == path)?;
        self.values[index].as_ref()
    }
}

/// Merges its columns by timestamp with a one-pair lookahead cache per
/// column. Each emitted row's timestamp is the minimum over the caches;
/// rows come out strictly ascending.
pub struct RowRecordReader {
    paths: Rc<Vec<Path>>,
    readers: Vec<SeriesReader>,
    caches: Vec<Option<TimeValuePair>>,
}

impl RowRecordReader {
    pub fn new(paths: Vec<Path>, readers: Vec<SeriesReader>) -> Self {
        let caches = readers.iter().map(|_| None).collect();
        Self {
            paths: Rc::new(paths),
            readers,
            caches,
        }
    }

    fn fill_caches(&mut self) -> Result<()> {
        for (reader, cache) in self.readers.iter_mut().zip(&mut self.caches) {
            if cache.is_none() && reader.has_next()? {
                *cache = Some(reader.next()?);
            }
        }
        Ok(())
    }

    pub fn next(&mut self) -> Result<Option<RowRecord>> {
        self.fill_caches()?;

        let Some(current_time) = self
            .caches
            .iter()
            .flatten()
            .map(|pair| pair.timestamp)
            .min()
        else {
            return Ok(None);
        };

        let values = self
            .caches
            .iter_mut()
            .map(|cache| match cache {
                Some(pair) if pair.timestamp == current_time => {
                    cache.take().map(|pair| pair.value)
                }
                _ => None,
            })
            .collect();

        Ok(Some(RowRecord {
            timestamp: current_time,
            paths: self.paths.clone(),
            values,
        }))
    }
}
