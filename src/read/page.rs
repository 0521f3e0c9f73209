//! One materialized page: the decoded time and value columns, merged back
//! into `TimeValuePair`s in arrival order.

use crate::encoding::{TimeDecoder, ValueDecoder};
use crate::error::Result;
use crate::io::{ByteReader, FormatRead};
use crate::{TimeValuePair, TsDataType, TsEncoding};

pub struct PageDataReader {
    time_decoder: TimeDecoder,
    value_decoder: ValueDecoder,
}

impl PageDataReader {
    /// `body` is the page body: a varint time-segment length, the time
    /// segment, then the value segment filling the rest.
    pub fn new(data_type: TsDataType, encoding: TsEncoding, body: Vec<u8>) -> Result<Self> {
        let mut reader = ByteReader::new(body);
        let time_length = reader.read_unsigned_varint()? as usize;
        let time_segment = reader.read_slice(time_length, "time segment")?.to_vec();
        let value_segment = reader
            .read_slice(reader.remaining(), "value segment")?
            .to_vec();

        Ok(Self {
            time_decoder: TimeDecoder::new(time_segment),
            value_decoder: ValueDecoder::new(encoding, data_type, value_segment)?,
        })
    }

    /// The time column drives the pace; both columns hold the same number
    /// of entries.
    pub fn has_next(&self) -> bool {
        self.time_decoder.has_next()
    }

    pub fn next(&mut self) -> Result<TimeValuePair> {
        let timestamp = self.time_decoder.next()?;
        let value = self.value_decoder.next()?;
        Ok(TimeValuePair { timestamp, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{TimeEncoder, ValueEncoder};
    use crate::io::write_unsigned_varint;
    use crate::TypedValue;

    fn build_page(
        data_type: TsDataType,
        encoding: TsEncoding,
        pairs: &[(i64, TypedValue)],
    ) -> Vec<u8> {
        let mut time_encoder = TimeEncoder::new();
        let mut value_encoder = ValueEncoder::new(encoding, data_type).unwrap();
        let mut time_segment = Vec::new();
        let mut value_segment = Vec::new();
        for (timestamp, value) in pairs {
            time_encoder.encode(*timestamp, &mut time_segment);
            value_encoder.encode(value, &mut value_segment);
        }
        time_encoder.flush(&mut time_segment);
        value_encoder.flush(&mut value_segment);

        let mut body = Vec::new();
        write_unsigned_varint(time_segment.len() as u32, &mut body);
        body.extend_from_slice(&time_segment);
        body.extend_from_slice(&value_segment);
        body
    }

    #[test]
    fn test_page_splits_and_merges() {
        let pairs: Vec<(i64, TypedValue)> = (0..100)
            .map(|i| (i, TypedValue::Int32(1000 + i as i32)))
            .collect();
        let body = build_page(TsDataType::Int32, TsEncoding::Ts2Diff, &pairs);

        let mut page = PageDataReader::new(TsDataType::Int32, TsEncoding::Ts2Diff, body).unwrap();
        for (timestamp, value) in &pairs {
            assert!(page.has_next());
            let pair = page.next().unwrap();
            assert_eq!(pair.timestamp, *timestamp);
            assert_eq!(&pair.value, value);
        }
        assert!(!page.has_next());
    }

    #[test]
    fn test_text_page() {
        let pairs: Vec<(i64, TypedValue)> = vec![
            (1, "44.4abc".into()),
            (2, "".into()),
            (3, "third".into()),
        ];
        let body = build_page(TsDataType::Text, TsEncoding::Plain, &pairs);

        let mut page = PageDataReader::new(TsDataType::Text, TsEncoding::Plain, body).unwrap();
        for (timestamp, value) in &pairs {
            let pair = page.next().unwrap();
            assert_eq!(pair.timestamp, *timestamp);
            assert_eq!(&pair.value, value);
        }
    }

    #[test]
    fn test_truncated_body_is_an_error() {
        let pairs: Vec<(i64, TypedValue)> = vec![(1, TypedValue::Int32(1))];
        let mut body = build_page(TsDataType::Int32, TsEncoding::Plain, &pairs);
        body.truncate(2);
        assert!(PageDataReader::new(TsDataType::Int32, TsEncoding::Plain, body).is_err());
    }
}
