use serde::Deserialize;
use std::collections::HashMap;

use crate::shared::routes::deserialize_topic_to_destinations;
use crate::shared::{BatchConfig, StoreConfig, ValidationError};

const fn default_null_value_means_remove() -> bool {
    true
}

/// Complete configuration of a sink task.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally leaking secrets
/// into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Identifier of this task instance, only used in diagnostics.
    #[serde(default)]
    pub task_id: u32,
    /// Destinations each source topic is written to.
    ///
    /// Accepts a list of `{topic, destinations}` entries, or the compact route syntax
    /// `[topic:dest1,dest2],[topic2:dest3]`. Topic names are case sensitive.
    #[serde(deserialize_with = "deserialize_topic_to_destinations")]
    pub topic_to_destinations: HashMap<String, Vec<String>>,
    /// Whether a record without a value removes its key (`true`) or stores a null value.
    #[serde(default = "default_null_value_means_remove")]
    pub null_value_means_remove: bool,
    /// Batching of the records fed to the task.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Store the destinations live in.
    #[serde(default)]
    pub store: StoreConfig,
}

impl SinkConfig {
    /// Validates the routes, the batching and the store settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic_to_destinations.is_empty() {
            return Err(ValidationError::NoRoutes);
        }

        for (topic, destinations) in &self.topic_to_destinations {
            if topic.trim().is_empty() {
                return Err(ValidationError::EmptyTopicName);
            }

            if destinations.is_empty() {
                return Err(ValidationError::NoDestinations {
                    topic: topic.clone(),
                });
            }

            if destinations.iter().any(|d| d.trim().is_empty()) {
                return Err(ValidationError::EmptyDestinationName {
                    topic: topic.clone(),
                });
            }
        }

        self.batch.validate()?;
        self.store.validate()
    }
}
