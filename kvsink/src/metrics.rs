//! Metrics definitions for sink monitoring.

use metrics::{Unit, describe_counter, describe_histogram};
use std::sync::Once;

static REGISTER_METRICS: Once = Once::new();

/// Label for the destination name in metrics.
pub const DESTINATION_LABEL: &str = "destination";

/// Label for the store type in metrics.
pub const STORE_LABEL: &str = "store";

/// Label for the operation kind (`upsert` or `remove`) in metrics.
pub const OPERATION_LABEL: &str = "operation";

/// Label for the reason a record was dropped.
pub const REASON_LABEL: &str = "reason";

/// Label for how a destination handle was obtained.
pub const OUTCOME_LABEL: &str = "outcome";

/// Counter for records handed to the sink.
pub const KVSINK_RECORDS_RECEIVED_TOTAL: &str = "kvsink_records_received_total";

/// Counter for records dropped without producing any operation.
pub const KVSINK_RECORDS_DROPPED_TOTAL: &str = "kvsink_records_dropped_total";

/// Counter for records superseded by a later record for the same key and destination.
pub const KVSINK_RECORDS_SUPERSEDED_TOTAL: &str = "kvsink_records_superseded_total";

/// Counter for operations applied to destinations.
pub const KVSINK_OPERATIONS_APPLIED_TOTAL: &str = "kvsink_operations_applied_total";

/// Counter for destination batches that failed to execute.
pub const KVSINK_BATCH_FAILURES_TOTAL: &str = "kvsink_batch_failures_total";

/// Histogram for the time taken to execute one destination batch.
pub const KVSINK_BATCH_EXECUTION_DURATION_SECONDS: &str =
    "kvsink_batch_execution_duration_seconds";

/// Counter for destination handle resolutions.
pub const KVSINK_DESTINATIONS_RESOLVED_TOTAL: &str = "kvsink_destinations_resolved_total";

/// Drop reason for records without a key.
pub const MISSING_KEY_REASON: &str = "missing_key";

/// Drop reason for records whose topic has no route.
pub const UNROUTED_TOPIC_REASON: &str = "unrouted_topic";

/// Registers the descriptions of the metrics emitted by the sink.
///
/// Safe to call multiple times, descriptions are only registered once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            KVSINK_RECORDS_RECEIVED_TOTAL,
            Unit::Count,
            "Total number of change records handed to the sink"
        );

        describe_counter!(
            KVSINK_RECORDS_DROPPED_TOTAL,
            Unit::Count,
            "Total number of change records dropped without producing an operation, labeled by reason"
        );

        describe_counter!(
            KVSINK_RECORDS_SUPERSEDED_TOTAL,
            Unit::Count,
            "Total number of pending operations replaced by a later record for the same key"
        );

        describe_counter!(
            KVSINK_OPERATIONS_APPLIED_TOTAL,
            Unit::Count,
            "Total number of upsert and remove operations applied to destinations"
        );

        describe_counter!(
            KVSINK_BATCH_FAILURES_TOTAL,
            Unit::Count,
            "Total number of destination batches aborted by a failed operation"
        );

        describe_histogram!(
            KVSINK_BATCH_EXECUTION_DURATION_SECONDS,
            Unit::Seconds,
            "Time taken to apply every operation of a destination batch"
        );

        describe_counter!(
            KVSINK_DESTINATIONS_RESOLVED_TOTAL,
            Unit::Count,
            "Total number of destination handles resolved, labeled by whether they were created or fetched"
        );
    });
}
