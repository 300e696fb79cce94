use metrics::counter;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use tracing::{info, warn};

use crate::destination::StoreClient;
use crate::error::{ErrorKind, SinkResult};
use crate::metrics::{KVSINK_DESTINATIONS_RESOLVED_TOTAL, OUTCOME_LABEL, STORE_LABEL};
use crate::sink_error;

/// Outcome of resolving a destination against the remote store.
///
/// Both variants carry a usable handle and are treated as success by callers.
#[derive(Debug, Clone)]
pub enum DestinationResolution<H> {
    /// This worker created the destination.
    Created(H),
    /// The destination already existed, typically because a sibling worker created it first,
    /// and the handle was fetched by name.
    AlreadyPresent(H),
}

impl<H> DestinationResolution<H> {
    /// Returns the resolved handle.
    pub fn into_handle(self) -> H {
        match self {
            DestinationResolution::Created(handle)
            | DestinationResolution::AlreadyPresent(handle) => handle,
        }
    }

    fn outcome_label(&self) -> &'static str {
        match self {
            DestinationResolution::Created(_) => "created",
            DestinationResolution::AlreadyPresent(_) => "already_present",
        }
    }
}

/// Creates the destination `name`, or fetches it when it already exists.
///
/// Many task instances discover the same destinations independently and create them on first
/// use without coordinating, so an "already exists" answer from the store is expected and is
/// resolved by looking the destination up. Any other creation failure is returned as
/// [`ErrorKind::DestinationCreationFailed`].
pub async fn create_or_fetch<C>(
    client: &C,
    name: &str,
) -> SinkResult<DestinationResolution<C::Handle>>
where
    C: StoreClient,
{
    let resolution = match client.create_destination(name).await {
        Ok(handle) => DestinationResolution::Created(handle),
        Err(err) if err.kind() == ErrorKind::DestinationAlreadyExists => {
            info!(
                destination = name,
                "destination already exists, fetching the existing one"
            );

            let handle = client.get_destination(name).await.map_err(|err| {
                sink_error!(
                    ErrorKind::DestinationCreationFailed,
                    "Existing destination could not be fetched",
                    format!("The destination '{name}' exists but could not be fetched: {err}"),
                    source: err
                )
            })?;

            DestinationResolution::AlreadyPresent(handle)
        }
        Err(err) => {
            return Err(sink_error!(
                ErrorKind::DestinationCreationFailed,
                "Destination could not be created",
                format!("The destination '{name}' could not be created: {err}"),
                source: err
            ));
        }
    };

    counter!(
        KVSINK_DESTINATIONS_RESOLVED_TOTAL,
        STORE_LABEL => C::name(),
        OUTCOME_LABEL => resolution.outcome_label(),
    )
    .increment(1);

    Ok(resolution)
}

/// Owns the live destination handles of one sink task.
///
/// Each destination name goes from unresolved to ready exactly once: the first
/// [`DestinationManager::get_or_create`] for a name resolves it through [`create_or_fetch`] and
/// every later call returns the cached handle. Handles are only released by
/// [`DestinationManager::close`] at task shutdown.
pub struct DestinationManager<C>
where
    C: StoreClient,
{
    client: C,
    handles: HashMap<String, C::Handle>,
}

impl<C> fmt::Debug for DestinationManager<C>
where
    C: StoreClient,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut destinations: Vec<&str> = self.handles.keys().map(String::as_str).collect();
        destinations.sort_unstable();

        f.debug_struct("DestinationManager")
            .field("store", &C::name())
            .field("destinations", &destinations)
            .finish()
    }
}

impl<C> DestinationManager<C>
where
    C: StoreClient,
{
    /// Creates a manager with an empty handle cache.
    pub fn new(client: C) -> Self {
        Self {
            client,
            handles: HashMap::new(),
        }
    }

    /// Creates a manager and resolves every destination in `names` up front.
    ///
    /// A failure to resolve any destination aborts the startup and is returned as is.
    pub async fn open<'a, I>(client: C, names: I) -> SinkResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut manager = Self::new(client);

        for name in names {
            manager.get_or_create(name).await?;
        }

        info!(
            store = C::name(),
            destinations = manager.handles.len(),
            "destination manager opened"
        );

        Ok(manager)
    }

    /// Returns the handle for `name`, resolving and caching it on first use.
    pub async fn get_or_create(&mut self, name: &str) -> SinkResult<&C::Handle> {
        match self.handles.entry(name.to_owned()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let handle = create_or_fetch(&self.client, name).await?.into_handle();

                Ok(entry.insert(handle))
            }
        }
    }

    /// Returns the cached handle for `name` without contacting the store.
    pub fn get(&self, name: &str) -> Option<&C::Handle> {
        self.handles.get(name)
    }

    /// Returns the number of cached handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` when no handle is cached.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drops all cached handles and closes the store client.
    pub async fn close(mut self) -> SinkResult<()> {
        let count = self.handles.len();
        self.handles.clear();

        if let Err(err) = self.client.close().await {
            warn!(error = %err, "failed to close the store client");
            return Err(err);
        }

        info!(
            store = C::name(),
            destinations = count,
            "destination manager closed"
        );

        Ok(())
    }
}
