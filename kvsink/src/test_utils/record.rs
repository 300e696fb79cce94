use bytes::Bytes;
use std::collections::HashMap;

use crate::router::TopicRouter;
use crate::types::{ChangeRecord, PendingOperation, RecordKey};

/// Returns a record with both a key and a value.
pub fn keyed_record(topic: &str, key: &'static str, value: &'static str) -> ChangeRecord {
    ChangeRecord::new(
        topic,
        Some(RecordKey::from(key)),
        Some(Bytes::from_static(value.as_bytes())),
    )
}

/// Returns a record with a key and no value.
pub fn null_value_record(topic: &str, key: &'static str) -> ChangeRecord {
    ChangeRecord::new(topic, Some(RecordKey::from(key)), None)
}

/// Returns a record with a value and no key.
pub fn keyless_record(topic: &str, value: &'static str) -> ChangeRecord {
    ChangeRecord::new(topic, None, Some(Bytes::from_static(value.as_bytes())))
}

/// Assigns increasing offsets on partition 0 to `records`, in order.
pub fn with_offsets(records: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(offset, record)| record.at(0, offset as i64))
        .collect()
}

/// Builds a route table from `(topic, destinations)` pairs.
pub fn routes(routes: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    routes
        .iter()
        .map(|(topic, destinations)| {
            (
                topic.to_string(),
                destinations.iter().map(|d| d.to_string()).collect(),
            )
        })
        .collect()
}

/// Builds a [`TopicRouter`] from `(topic, destinations)` pairs.
pub fn router(table: &[(&str, &[&str])]) -> TopicRouter {
    TopicRouter::new(routes(table))
}

/// Returns an upsert operation with a value.
pub fn upsert_op(key: &'static str, value: &'static str) -> PendingOperation {
    PendingOperation::Upsert {
        key: RecordKey::from(key),
        value: Some(Bytes::from_static(value.as_bytes())),
    }
}

/// Returns an upsert operation of a null value.
pub fn null_upsert_op(key: &'static str) -> PendingOperation {
    PendingOperation::Upsert {
        key: RecordKey::from(key),
        value: None,
    }
}

/// Returns a remove operation.
pub fn remove_op(key: &'static str) -> PendingOperation {
    PendingOperation::Remove {
        key: RecordKey::from(key),
    }
}
