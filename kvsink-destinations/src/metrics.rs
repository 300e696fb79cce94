use std::sync::Once;

use metrics::{Unit, describe_counter};

static REGISTER_METRICS: Once = Once::new();

/// Counter for connection errors reported by store clients.
pub const KVSINK_STORE_CONNECTION_ERRORS_TOTAL: &str = "kvsink_store_connection_errors_total";

/// Counter for reconnections of store clients.
pub const KVSINK_STORE_RECONNECTIONS_TOTAL: &str = "kvsink_store_reconnections_total";

/// Registers the metrics emitted by the store clients. Descriptions are only registered once.
pub(crate) fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            KVSINK_STORE_CONNECTION_ERRORS_TOTAL,
            Unit::Count,
            "Total number of errors reported by store connections"
        );

        describe_counter!(
            KVSINK_STORE_RECONNECTIONS_TOTAL,
            Unit::Count,
            "Total number of store connections re-established"
        );
    });
}
