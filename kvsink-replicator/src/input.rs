//! Newline-delimited JSON change records.
//!
//! Each non-empty line is an object such as
//! `{"topic": "orders", "partition": 0, "offset": 42, "key": "1", "value": "shipped"}`.
//! `key` and `value` may be `null` or absent, `partition` and `offset` default to `0`.

use bytes::Bytes;
use kvsink::types::{ChangeRecord, RecordKey};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::error::{ReplicatorError, ReplicatorResult};

#[derive(Debug, Deserialize)]
struct InputRecord {
    topic: String,
    #[serde(default)]
    partition: i32,
    #[serde(default)]
    offset: i64,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl From<InputRecord> for ChangeRecord {
    fn from(record: InputRecord) -> Self {
        ChangeRecord::new(
            record.topic,
            record.key.map(RecordKey::from),
            record.value.map(Bytes::from),
        )
        .at(record.partition, record.offset)
    }
}

/// Parses one input line into a [`ChangeRecord`].
pub fn parse_record(line: &str) -> serde_json::Result<ChangeRecord> {
    serde_json::from_str::<InputRecord>(line).map(Into::into)
}

/// Reads change records from newline-delimited JSON, in batches.
pub struct RecordReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R> RecordReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Returns up to `max_size` records, or an empty batch once the input is exhausted.
    ///
    /// Blank lines are skipped. A malformed line fails the whole read.
    pub async fn next_batch(&mut self, max_size: usize) -> ReplicatorResult<Vec<ChangeRecord>> {
        let mut batch = Vec::with_capacity(max_size);

        while batch.len() < max_size {
            let Some(line) = self.lines.next_line().await? else {
                break;
            };
            self.line += 1;

            if line.trim().is_empty() {
                continue;
            }

            let record =
                parse_record(&line).map_err(|err| ReplicatorError::input(self.line, err))?;
            batch.push(record);
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let record = parse_record(
            r#"{"topic": "orders", "partition": 2, "offset": 42, "key": "1", "value": "shipped"}"#,
        )
        .unwrap();

        assert_eq!(record.topic, "orders");
        assert_eq!(record.key, Some(RecordKey::from("1")));
        assert_eq!(record.value, Some(Bytes::from_static(b"shipped")));
        assert_eq!(record.coordinates.partition, 2);
        assert_eq!(record.coordinates.offset, 42);
    }

    #[test]
    fn test_parse_record_with_nulls() {
        let record = parse_record(r#"{"topic": "orders", "key": null}"#).unwrap();

        assert_eq!(record.key, None);
        assert_eq!(record.value, None);
        assert_eq!(record.coordinates.offset, 0);
    }

    #[tokio::test]
    async fn test_reader_batches_and_skips_blank_lines() {
        let input = b"{\"topic\":\"t1\",\"key\":\"k1\",\"value\":\"v1\"}\n\n{\"topic\":\"t1\",\"key\":\"k2\"}\n{\"topic\":\"t2\",\"key\":\"k3\",\"value\":\"v3\"}\n";
        let mut reader = RecordReader::new(&input[..]);

        let first = reader.next_batch(2).await.unwrap();
        let second = reader.next_batch(2).await.unwrap();
        let third = reader.next_batch(2).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[1].key, Some(RecordKey::from("k2")));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].topic, "t2");
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_reader_reports_malformed_line() {
        let input = b"{\"topic\":\"t1\"}\nnot json\n";
        let mut reader = RecordReader::new(&input[..]);

        let err = reader.next_batch(10).await.unwrap_err();

        assert!(matches!(err, ReplicatorError::Input { line: 2, .. }));
    }
}
