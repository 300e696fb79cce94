use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bail;
use crate::destination::{DestinationHandle, StoreClient};
use crate::error::{ErrorKind, SinkResult};
use crate::types::RecordKey;

type Entries = Arc<Mutex<HashMap<RecordKey, Option<Bytes>>>>;

#[derive(Debug, Default)]
struct Inner {
    destinations: HashMap<String, Entries>,
    closed: bool,
}

/// In-memory key-value store for testing and development purposes.
///
/// Clones of a [`MemoryStore`] share the same data, so two sink tasks built on clones behave
/// like two workers connected to the same remote store. All data is lost when the process
/// terminates.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all existing destinations, sorted.
    pub async fn destination_names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut names: Vec<String> = inner.destinations.keys().cloned().collect();
        names.sort();

        names
    }

    /// Returns a copy of the entries stored in `destination`, if it exists.
    pub async fn entries(&self, destination: &str) -> Option<HashMap<RecordKey, Option<Bytes>>> {
        let entries = {
            let inner = self.inner.lock().await;
            inner.destinations.get(destination).cloned()
        }?;

        let entries = entries.lock().await;
        Some(entries.clone())
    }

    /// Returns whether [`StoreClient::close`] was called.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

impl StoreClient for MemoryStore {
    type Handle = MemoryDestination;

    fn name() -> &'static str {
        "memory"
    }

    async fn create_destination(&self, name: &str) -> SinkResult<MemoryDestination> {
        let mut inner = self.inner.lock().await;

        if inner.destinations.contains_key(name) {
            bail!(
                ErrorKind::DestinationAlreadyExists,
                "Destination already exists",
                format!("The destination '{name}' already exists in the memory store")
            );
        }

        info!(destination = name, "creating memory destination");

        let entries = Entries::default();
        inner
            .destinations
            .insert(name.to_owned(), entries.clone());

        Ok(MemoryDestination {
            name: name.to_owned(),
            entries,
        })
    }

    async fn get_destination(&self, name: &str) -> SinkResult<MemoryDestination> {
        let inner = self.inner.lock().await;

        let Some(entries) = inner.destinations.get(name) else {
            bail!(
                ErrorKind::DestinationMissing,
                "Destination does not exist",
                format!("The destination '{name}' was not found in the memory store")
            );
        };

        Ok(MemoryDestination {
            name: name.to_owned(),
            entries: entries.clone(),
        })
    }

    async fn close(&self) -> SinkResult<()> {
        let mut inner = self.inner.lock().await;
        inner.closed = true;

        Ok(())
    }
}

/// Handle to one destination of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryDestination {
    name: String,
    entries: Entries,
}

impl DestinationHandle for MemoryDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, key: RecordKey, value: Option<Bytes>) -> SinkResult<()> {
        debug!(destination = %self.name, %key, "upserting key");
        self.entries.lock().await.insert(key, value);

        Ok(())
    }

    async fn remove(&self, key: RecordKey) -> SinkResult<()> {
        debug!(destination = %self.name, %key, "removing key");
        self.entries.lock().await.remove(&key);

        Ok(())
    }
}
