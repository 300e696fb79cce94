//! Batch driver tying routing, accumulation and execution together.
//!
//! A [`SinkTask`] is started once with a configuration and a connected [`StoreClient`], then
//! receives successive collections of [`ChangeRecord`]s through [`SinkTask::put`]. Every call is
//! processed to completion before it returns: records are routed and folded into fresh
//! per-destination batches, then each batch is executed against its destination handle.

use kvsink_config::shared::SinkConfig;
use metrics::counter;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::batch::BatchAccumulator;
use crate::destination::StoreClient;
use crate::destination::manager::DestinationManager;
use crate::error::{SinkError, SinkResult};
use crate::metrics::{
    KVSINK_RECORDS_DROPPED_TOTAL, KVSINK_RECORDS_RECEIVED_TOTAL, MISSING_KEY_REASON,
    REASON_LABEL, UNROUTED_TOPIC_REASON, register_metrics,
};
use crate::router::TopicRouter;
use crate::types::{ChangeRecord, NullValuePolicy};

/// Counters describing what one [`SinkTask::put`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutSummary {
    /// Number of records handed to the call.
    pub records_received: usize,
    /// Number of routed records dropped because they had no key.
    pub records_without_key: usize,
    /// Number of records dropped because their topic has no route.
    pub records_unrouted: usize,
    /// Number of operations applied, by destination.
    pub operations_applied: BTreeMap<String, usize>,
}

impl PutSummary {
    /// Returns the number of records that produced no operation.
    pub fn records_dropped(&self) -> usize {
        self.records_without_key + self.records_unrouted
    }

    /// Returns the total number of operations applied across destinations.
    pub fn total_operations_applied(&self) -> usize {
        self.operations_applied.values().sum()
    }
}

/// Sink task writing change records to a key-value store.
///
/// The task owns its router and its [`DestinationManager`]; nothing is shared with other task
/// instances except the remote store itself.
pub struct SinkTask<C>
where
    C: StoreClient,
{
    router: TopicRouter,
    null_value_policy: NullValuePolicy,
    destinations: DestinationManager<C>,
}

impl<C> fmt::Debug for SinkTask<C>
where
    C: StoreClient,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkTask")
            .field("router", &self.router)
            .field("null_value_policy", &self.null_value_policy)
            .field("destinations", &self.destinations)
            .finish()
    }
}

impl<C> SinkTask<C>
where
    C: StoreClient,
{
    /// Starts a task from `config`, resolving every routed destination against `client`.
    ///
    /// Fails when the configuration is invalid or when a destination cannot be created or
    /// fetched; in that case no record is ever processed.
    pub async fn start(config: &SinkConfig, client: C) -> SinkResult<Self> {
        info!(task_id = config.task_id, store = C::name(), "starting sink task");

        config.validate()?;

        let router = TopicRouter::new(config.topic_to_destinations.clone());
        let null_value_policy = NullValuePolicy::from_remove_flag(config.null_value_means_remove);

        Self::start_with(router, null_value_policy, client).await
    }

    /// Starts a task from an already built router and policy.
    pub async fn start_with(
        router: TopicRouter,
        null_value_policy: NullValuePolicy,
        client: C,
    ) -> SinkResult<Self> {
        register_metrics();

        let destinations =
            DestinationManager::open(client, router.destination_names()).await?;

        info!(
            topics = router.topics_count(),
            destinations = destinations.len(),
            ?null_value_policy,
            "sink task started"
        );

        Ok(Self {
            router,
            null_value_policy,
            destinations,
        })
    }

    /// Routes, collapses and applies `records`.
    ///
    /// Records without a key and records whose topic has no route are dropped with a warning.
    /// When the batch of a destination fails, its remaining operations are skipped, the other
    /// destinations are still executed, and all failures are returned together.
    pub async fn put(&mut self, records: Vec<ChangeRecord>) -> SinkResult<PutSummary> {
        let mut summary = PutSummary {
            records_received: records.len(),
            ..PutSummary::default()
        };

        debug!("received {} records", records.len());
        counter!(KVSINK_RECORDS_RECEIVED_TOTAL).increment(records.len() as u64);

        let mut accumulator = BatchAccumulator::new(self.null_value_policy);
        for record in &records {
            debug!(
                topic = %record.topic,
                partition = record.coordinates.partition,
                offset = record.coordinates.offset,
                "folding record"
            );

            let destinations = self.router.destinations_for(&record.topic);
            if destinations.is_empty() {
                warn!(
                    topic = %record.topic,
                    partition = record.coordinates.partition,
                    offset = record.coordinates.offset,
                    "dropping record for a topic without destinations"
                );
                counter!(KVSINK_RECORDS_DROPPED_TOTAL, REASON_LABEL => UNROUTED_TOPIC_REASON)
                    .increment(1);
                summary.records_unrouted += 1;

                continue;
            }

            // A keyless record is refused by the first destination already.
            let folded = destinations
                .iter()
                .all(|destination| accumulator.fold(record, destination));
            if !folded {
                counter!(KVSINK_RECORDS_DROPPED_TOTAL, REASON_LABEL => MISSING_KEY_REASON)
                    .increment(1);
                summary.records_without_key += 1;
            }
        }

        let mut errors: Vec<SinkError> = Vec::new();
        for (destination, batch) in accumulator.into_batches() {
            let result = match self.destinations.get_or_create(&destination).await {
                Ok(handle) => batch.execute(handle).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(applied) => {
                    summary.operations_applied.insert(destination, applied);
                }
                Err(err) => {
                    error!(%destination, error = %err, "failed to execute destination batch");
                    errors.push(err);
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        debug!(
            operations = summary.total_operations_applied(),
            dropped = summary.records_dropped(),
            "records applied"
        );

        Ok(summary)
    }

    /// Returns the router of this task.
    pub fn router(&self) -> &TopicRouter {
        &self.router
    }

    /// Returns the destination manager of this task.
    pub fn destinations(&self) -> &DestinationManager<C> {
        &self.destinations
    }

    /// Stops the task, releasing every destination handle and closing the store client.
    pub async fn stop(self) -> SinkResult<()> {
        info!("stopping sink task");

        self.destinations.close().await
    }
}
