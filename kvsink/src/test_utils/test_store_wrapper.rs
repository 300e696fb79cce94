use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::bail;
use crate::destination::{DestinationHandle, StoreClient};
use crate::error::{ErrorKind, SinkResult};
use crate::types::{PendingOperation, RecordKey};

#[derive(Debug, Default)]
struct State {
    create_attempts: HashMap<String, usize>,
    get_attempts: HashMap<String, usize>,
    applied: HashMap<String, Vec<PendingOperation>>,
    failing_creations: HashSet<String>,
    failing_writes: HashMap<String, HashSet<RecordKey>>,
    close_called: bool,
}

/// Test wrapper for [`StoreClient`] implementations that tracks every call.
///
/// [`TestStoreWrapper`] forwards to the wrapped client and records each creation and lookup
/// attempt by destination name, as well as every operation successfully applied through the
/// handles it hands out. Failures can be injected for destination creation and for writes of
/// specific keys.
///
/// Clones share their recorded state.
#[derive(Clone)]
pub struct TestStoreWrapper<C> {
    wrapped: C,
    state: Arc<Mutex<State>>,
}

impl<C: fmt::Debug> fmt::Debug for TestStoreWrapper<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestStoreWrapper")
            .field("wrapped", &self.wrapped)
            .finish_non_exhaustive()
    }
}

impl<C> TestStoreWrapper<C> {
    /// Wraps `client`.
    pub fn wrap(client: C) -> Self {
        Self {
            wrapped: client,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Makes every creation of `destination` fail with a connection error.
    pub async fn fail_creation_of(&self, destination: &str) {
        let mut state = self.state.lock().await;
        state.failing_creations.insert(destination.to_owned());
    }

    /// Makes every write of `key` to `destination` fail.
    pub async fn fail_writes_of(&self, destination: &str, key: &'static str) {
        let mut state = self.state.lock().await;
        state
            .failing_writes
            .entry(destination.to_owned())
            .or_default()
            .insert(RecordKey::from(key));
    }

    /// Returns how many times creating `destination` was attempted.
    pub async fn create_attempts(&self, destination: &str) -> usize {
        let state = self.state.lock().await;
        state.create_attempts.get(destination).copied().unwrap_or(0)
    }

    /// Returns how many times fetching `destination` was attempted.
    pub async fn get_attempts(&self, destination: &str) -> usize {
        let state = self.state.lock().await;
        state.get_attempts.get(destination).copied().unwrap_or(0)
    }

    /// Returns the operations applied to `destination`, in the order they were applied.
    pub async fn applied(&self, destination: &str) -> Vec<PendingOperation> {
        let state = self.state.lock().await;
        state.applied.get(destination).cloned().unwrap_or_default()
    }

    /// Returns the applied operations of all destinations.
    pub async fn applied_by_destination(&self) -> HashMap<String, Vec<PendingOperation>> {
        let state = self.state.lock().await;
        state.applied.clone()
    }

    /// Returns whether [`StoreClient::close`] was called.
    pub async fn close_called(&self) -> bool {
        self.state.lock().await.close_called
    }
}

impl<C> StoreClient for TestStoreWrapper<C>
where
    C: StoreClient + Send + Sync,
{
    type Handle = TestDestinationWrapper<C::Handle>;

    fn name() -> &'static str {
        C::name()
    }

    async fn create_destination(&self, name: &str) -> SinkResult<Self::Handle> {
        let should_fail = {
            let mut state = self.state.lock().await;
            *state.create_attempts.entry(name.to_owned()).or_default() += 1;
            state.failing_creations.contains(name)
        };

        if should_fail {
            bail!(
                ErrorKind::StoreConnectionFailed,
                "Injected store failure",
                format!("Creation of the destination '{name}' was configured to fail")
            );
        }

        let handle = self.wrapped.create_destination(name).await?;

        Ok(TestDestinationWrapper {
            wrapped: handle,
            state: self.state.clone(),
        })
    }

    async fn get_destination(&self, name: &str) -> SinkResult<Self::Handle> {
        {
            let mut state = self.state.lock().await;
            *state.get_attempts.entry(name.to_owned()).or_default() += 1;
        }

        let handle = self.wrapped.get_destination(name).await?;

        Ok(TestDestinationWrapper {
            wrapped: handle,
            state: self.state.clone(),
        })
    }

    async fn close(&self) -> SinkResult<()> {
        {
            let mut state = self.state.lock().await;
            state.close_called = true;
        }

        self.wrapped.close().await
    }
}

/// Handle returned by [`TestStoreWrapper`], recording the operations applied through it.
#[derive(Clone)]
pub struct TestDestinationWrapper<H> {
    wrapped: H,
    state: Arc<Mutex<State>>,
}

impl<H: fmt::Debug> fmt::Debug for TestDestinationWrapper<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDestinationWrapper")
            .field("wrapped", &self.wrapped)
            .finish_non_exhaustive()
    }
}

impl<H> TestDestinationWrapper<H>
where
    H: DestinationHandle,
{
    async fn check_write(&self, key: &RecordKey) -> SinkResult<()> {
        let state = self.state.lock().await;
        let should_fail = state
            .failing_writes
            .get(self.wrapped.name())
            .is_some_and(|keys| keys.contains(key));

        if should_fail {
            bail!(
                ErrorKind::DestinationError,
                "Injected write failure",
                format!(
                    "Writing key '{key}' to the destination '{}' was configured to fail",
                    self.wrapped.name()
                )
            );
        }

        Ok(())
    }

    async fn record(&self, operation: PendingOperation) {
        let mut state = self.state.lock().await;
        state
            .applied
            .entry(self.wrapped.name().to_owned())
            .or_default()
            .push(operation);
    }
}

impl<H> DestinationHandle for TestDestinationWrapper<H>
where
    H: DestinationHandle + Clone + Send + Sync,
{
    fn name(&self) -> &str {
        self.wrapped.name()
    }

    async fn upsert(&self, key: RecordKey, value: Option<Bytes>) -> SinkResult<()> {
        self.check_write(&key).await?;
        self.wrapped.upsert(key.clone(), value.clone()).await?;
        self.record(PendingOperation::Upsert { key, value }).await;

        Ok(())
    }

    async fn remove(&self, key: RecordKey) -> SinkResult<()> {
        self.check_write(&key).await?;
        self.wrapped.remove(key.clone()).await?;
        self.record(PendingOperation::Remove { key }).await;

        Ok(())
    }
}
