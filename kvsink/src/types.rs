//! Core data types flowing through the sink.

use bytes::Bytes;
use std::fmt;

/// Opaque key of a change record.
///
/// Keys are compared byte-wise. The [`fmt::Display`] implementation renders the bytes as lossy
/// UTF-8 and is only meant for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(Bytes);

impl RecordKey {
    /// Creates a key from raw bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the key and returns its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<Bytes> for RecordKey {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

impl From<Vec<u8>> for RecordKey {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<&'static str> for RecordKey {
    fn from(value: &'static str) -> Self {
        Self(Bytes::from_static(value.as_bytes()))
    }
}

/// Position of a record in the source stream.
///
/// Only used to make diagnostics point at the offending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordCoordinates {
    pub partition: i32,
    pub offset: i64,
}

/// One change captured from the source stream.
///
/// A record without a key cannot be applied and is dropped by the sink. A record without a value
/// is interpreted according to the configured [`NullValuePolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub topic: String,
    pub key: Option<RecordKey>,
    pub value: Option<Bytes>,
    pub coordinates: RecordCoordinates,
}

impl ChangeRecord {
    /// Creates a record at partition 0, offset 0.
    pub fn new(topic: impl Into<String>, key: Option<RecordKey>, value: Option<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            key,
            value,
            coordinates: RecordCoordinates::default(),
        }
    }

    /// Sets the source coordinates of this record.
    pub fn at(mut self, partition: i32, offset: i64) -> Self {
        self.coordinates = RecordCoordinates { partition, offset };
        self
    }
}

/// How a record with a key but no value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullValuePolicy {
    /// The key is removed from the destination.
    #[default]
    Remove,
    /// The key is upserted with a null value.
    Upsert,
}

impl NullValuePolicy {
    /// Maps the `null_value_means_remove` configuration flag to a policy.
    pub fn from_remove_flag(null_value_means_remove: bool) -> Self {
        if null_value_means_remove {
            NullValuePolicy::Remove
        } else {
            NullValuePolicy::Upsert
        }
    }
}

/// Net effect for one key within one destination batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    /// Write `value` under `key`. A `None` value is a real null value.
    Upsert {
        key: RecordKey,
        value: Option<Bytes>,
    },
    /// Delete `key`.
    Remove { key: RecordKey },
}

impl PendingOperation {
    /// Returns the key this operation applies to.
    pub fn key(&self) -> &RecordKey {
        match self {
            PendingOperation::Upsert { key, .. } | PendingOperation::Remove { key } => key,
        }
    }

    /// Returns a short label for the operation, used in logs and metrics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            PendingOperation::Upsert { .. } => "upsert",
            PendingOperation::Remove { .. } => "remove",
        }
    }
}
