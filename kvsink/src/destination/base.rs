use bytes::Bytes;
use std::future::Future;

use crate::error::SinkResult;
use crate::types::RecordKey;

/// Connected client of a remote key-value store.
///
/// [`StoreClient`] implementations resolve destination names to live [`DestinationHandle`]s.
/// Several independent tasks may share the same remote store and race to create the same
/// destination, so [`StoreClient::create_destination`] must report an existing destination
/// with [`crate::error::ErrorKind::DestinationAlreadyExists`] rather than a generic failure.
/// The [`crate::destination::manager::DestinationManager`] relies on that kind to fall back to
/// [`StoreClient::get_destination`].
pub trait StoreClient {
    /// Handle type returned for destinations of this store.
    type Handle: DestinationHandle + Clone + Send + Sync;

    /// Returns the name of the store, used in logs and metrics.
    fn name() -> &'static str;

    /// Creates the destination `name` and returns a handle to it.
    ///
    /// Must fail with [`crate::error::ErrorKind::DestinationAlreadyExists`] when the destination
    /// already exists on the remote store.
    fn create_destination(
        &self,
        name: &str,
    ) -> impl Future<Output = SinkResult<Self::Handle>> + Send;

    /// Returns a handle to the existing destination `name`.
    fn get_destination(&self, name: &str) -> impl Future<Output = SinkResult<Self::Handle>> + Send;

    /// Releases the connection to the store.
    ///
    /// The default implementation is a no-op.
    fn close(&self) -> impl Future<Output = SinkResult<()>> + Send {
        async { Ok(()) }
    }
}

/// Live reference to one remote destination.
///
/// Handles do not own the destination storage, they only issue operations against it.
pub trait DestinationHandle {
    /// Returns the name of the destination this handle points to.
    fn name(&self) -> &str;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// A `None` value must be stored as a null value, not interpreted as a removal.
    fn upsert(
        &self,
        key: RecordKey,
        value: Option<Bytes>,
    ) -> impl Future<Output = SinkResult<()>> + Send;

    /// Deletes `key`. Deleting a missing key is not an error.
    fn remove(&self, key: RecordKey) -> impl Future<Output = SinkResult<()>> + Send;
}
