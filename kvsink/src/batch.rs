//! Per-destination accumulation of net key operations.
//!
//! A [`BatchAccumulator`] lives for exactly one invocation of the sink. Every routed record is
//! folded into the [`DestinationBatch`] of each of its destinations, where it replaces whatever
//! was pending for the same key. Executing a batch therefore issues a single operation per key,
//! derived from the last record seen for that key.

use metrics::{counter, histogram};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::destination::DestinationHandle;
use crate::error::{ErrorKind, SinkResult};
use crate::failpoints::{EXECUTE_BATCH__BEFORE_OPERATION, sink_fail_point};
use crate::metrics::{
    DESTINATION_LABEL, KVSINK_BATCH_EXECUTION_DURATION_SECONDS, KVSINK_BATCH_FAILURES_TOTAL,
    KVSINK_OPERATIONS_APPLIED_TOTAL, KVSINK_RECORDS_SUPERSEDED_TOTAL, OPERATION_LABEL,
};
use crate::sink_error;
use crate::types::{ChangeRecord, NullValuePolicy, PendingOperation, RecordKey};

/// Net operations pending for one destination within one invocation.
///
/// Holds at most one [`PendingOperation`] per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationBatch {
    operations: HashMap<RecordKey, PendingOperation>,
}

impl DestinationBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `operation` for its key, returning the operation it superseded, if any.
    pub fn install(&mut self, operation: PendingOperation) -> Option<PendingOperation> {
        self.operations.insert(operation.key().clone(), operation)
    }

    /// Returns the pending operation for `key`.
    pub fn get(&self, key: &RecordKey) -> Option<&PendingOperation> {
        self.operations.get(key)
    }

    /// Returns the number of pending operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns an iterator over the pending operations, in no particular order.
    pub fn operations(&self) -> impl Iterator<Item = &PendingOperation> {
        self.operations.values()
    }

    /// Applies every pending operation against `handle` and returns how many were applied.
    ///
    /// Operations on different keys are applied in no particular order. The first failing
    /// operation stops the execution: the remaining operations are not applied and the error is
    /// returned as [`ErrorKind::DestinationWriteFailed`]. Operations applied before the failure
    /// stay applied.
    pub async fn execute<H>(self, handle: &H) -> SinkResult<usize>
    where
        H: DestinationHandle,
    {
        let destination = handle.name().to_owned();
        let total = self.operations.len();
        let started = Instant::now();

        debug!(%destination, operations = total, "executing destination batch");

        let mut applied = 0;
        for operation in self.operations.into_values() {
            let kind = operation.kind_label();
            if let Err(err) = apply_operation(handle, operation).await {
                counter!(
                    KVSINK_BATCH_FAILURES_TOTAL,
                    DESTINATION_LABEL => destination.clone(),
                )
                .increment(1);

                warn!(
                    %destination,
                    applied,
                    remaining = total - applied,
                    error = %err,
                    "destination batch aborted"
                );

                return Err(sink_error!(
                    ErrorKind::DestinationWriteFailed,
                    "Destination batch execution failed",
                    format!(
                        "Applying a {kind} to destination '{destination}' failed after {applied} of {total} operations: {err}"
                    ),
                    source: err
                ));
            }

            counter!(
                KVSINK_OPERATIONS_APPLIED_TOTAL,
                DESTINATION_LABEL => destination.clone(),
                OPERATION_LABEL => kind,
            )
            .increment(1);
            applied += 1;
        }

        histogram!(
            KVSINK_BATCH_EXECUTION_DURATION_SECONDS,
            DESTINATION_LABEL => destination,
        )
        .record(started.elapsed().as_secs_f64());

        Ok(applied)
    }
}

async fn apply_operation<H>(handle: &H, operation: PendingOperation) -> SinkResult<()>
where
    H: DestinationHandle,
{
    sink_fail_point(EXECUTE_BATCH__BEFORE_OPERATION)?;

    match operation {
        PendingOperation::Upsert { key, value } => handle.upsert(key, value).await,
        PendingOperation::Remove { key } => handle.remove(key).await,
    }
}

/// Accumulates the [`DestinationBatch`] of every destination touched by one invocation.
#[derive(Debug, Clone, Default)]
pub struct BatchAccumulator {
    null_value_policy: NullValuePolicy,
    batches: HashMap<String, DestinationBatch>,
}

impl BatchAccumulator {
    /// Creates an empty accumulator applying `null_value_policy`.
    pub fn new(null_value_policy: NullValuePolicy) -> Self {
        Self {
            null_value_policy,
            batches: HashMap::new(),
        }
    }

    /// Folds `record` into the batch of `destination`.
    ///
    /// A record without a key is dropped with a warning. Otherwise the record becomes the net
    /// operation for its key in that destination, replacing any earlier one: a missing value
    /// becomes a removal under [`NullValuePolicy::Remove`] and an upsert of a null value under
    /// [`NullValuePolicy::Upsert`].
    ///
    /// Returns `true` when an operation was installed.
    pub fn fold(&mut self, record: &ChangeRecord, destination: &str) -> bool {
        let Some(key) = &record.key else {
            warn!(
                topic = %record.topic,
                partition = record.coordinates.partition,
                offset = record.coordinates.offset,
                destination,
                "dropping record without a key"
            );

            return false;
        };

        let operation = match (&record.value, self.null_value_policy) {
            (None, NullValuePolicy::Remove) => PendingOperation::Remove { key: key.clone() },
            (value, _) => PendingOperation::Upsert {
                key: key.clone(),
                value: value.clone(),
            },
        };

        let batch = self.batches.entry(destination.to_owned()).or_default();
        if batch.install(operation).is_some() {
            counter!(
                KVSINK_RECORDS_SUPERSEDED_TOTAL,
                DESTINATION_LABEL => destination.to_owned(),
            )
            .increment(1);
        }

        true
    }

    /// Returns the batch accumulated for `destination`.
    pub fn batch(&self, destination: &str) -> Option<&DestinationBatch> {
        self.batches.get(destination)
    }

    /// Returns the number of destinations with a batch.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Returns `true` when no record has been folded.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Consumes the accumulator and returns the batches by destination name.
    pub fn into_batches(self) -> HashMap<String, DestinationBatch> {
        self.batches
    }
}
