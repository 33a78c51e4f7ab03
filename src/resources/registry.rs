//! Resource handles and the registry that owns them.
//!
//! The registry is the host side of loading: it holds at most one [`Handle`]
//! per identifier and delivers the handle's single completion signal to
//! whoever subscribed. The coordinator never owns handles, it only looks them
//! up, creates them when missing and attaches listeners.
//!
//! [`ResourceRegistry`] is the boundary trait; [`HandleRegistry`] is the
//! in-memory implementation used by the binary and the tests. When built with
//! [`HandleRegistry::with_fetcher`] it asks the loader thread to fetch every
//! newly created handle.

use crate::events::loader::LoaderCmd;
use crate::resources::loadstatus::LoadStatus;
use crossbeam_channel::Sender;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// Stable id of one handle instance. Never reused, so a late completion for a
/// destroyed handle cannot reach its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

/// Id of one listener attached to a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Callback invoked synchronously with the terminal status of a handle.
pub type Listener = Box<dyn FnMut(LoadStatus) + Send + Sync>;

/// The registry's representation of a single load for one identifier.
pub struct Handle {
    id: HandleId,
    identifier: String,
    status: LoadStatus,
    listeners: SmallVec<[(ListenerId, Listener); 4]>,
    next_listener: u64,
    removal_requested: bool,
}

impl Handle {
    /// New handle in the `Loading` state with no listeners.
    pub fn new(id: HandleId, identifier: impl Into<String>) -> Self {
        Self {
            id,
            identifier: identifier.into(),
            status: LoadStatus::Loading,
            listeners: SmallVec::new(),
            next_listener: 0,
            removal_requested: false,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The status marker.
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Move the marker from `Loading` to a terminal status.
    ///
    /// Returns `false` (and leaves the marker alone) for anything else: the
    /// marker is written once on creation and once on completion.
    pub fn mark(&mut self, status: LoadStatus) -> bool {
        if self.status != LoadStatus::Loading || !status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }

    /// Attach a completion listener.
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Detach a listener. Returns `false` if it was not attached.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Invoke every attached listener with `status`, in attach order.
    /// Returns how many listeners were notified.
    pub fn publish(&mut self, status: LoadStatus) -> usize {
        for (_, listener) in self.listeners.iter_mut() {
            listener(status);
        }
        self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Remember that a consumer asked for this handle to be removed once
    /// nobody listens any more.
    pub fn request_removal(&mut self) {
        self.removal_requested = true;
    }

    pub fn removal_requested(&self) -> bool {
        self.removal_requested
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("status", &self.status)
            .field("listeners", &self.listeners.len())
            .field("removal_requested", &self.removal_requested)
            .finish()
    }
}

/// Host boundary the coordinator talks to.
///
/// Implementations must keep at most one handle per identifier.
pub trait ResourceRegistry: Send + Sync {
    /// Lookup by identifier.
    fn find(&self, identifier: &str) -> Option<HandleId>;
    /// Insert a new handle in the `Loading` state and start loading it.
    fn create(&mut self, identifier: &str) -> HandleId;
    /// Remove a handle entirely, dropping its listeners.
    fn destroy(&mut self, handle: HandleId) -> Option<Handle>;
    fn get(&self, handle: HandleId) -> Option<&Handle>;
    fn get_mut(&mut self, handle: HandleId) -> Option<&mut Handle>;
    /// Number of live handles.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Status marker of `handle`, `None` if the handle does not exist.
    fn status_marker(&self, handle: HandleId) -> Option<LoadStatus> {
        self.get(handle).map(Handle::status)
    }

    /// Write the terminal status marker. See [`Handle::mark`].
    fn set_status_marker(&mut self, handle: HandleId, status: LoadStatus) -> bool {
        self.get_mut(handle).is_some_and(|h| h.mark(status))
    }

    /// Subscribe to the completion signal of `handle`.
    fn on_complete(&mut self, handle: HandleId, listener: Listener) -> Option<ListenerId> {
        self.get_mut(handle).map(|h| h.subscribe(listener))
    }

    /// Unsubscribe from the completion signal of `handle`.
    fn off_complete(&mut self, handle: HandleId, listener: ListenerId) -> bool {
        self.get_mut(handle).is_some_and(|h| h.unsubscribe(listener))
    }
}

/// In-memory registry keyed by identifier.
#[derive(Default)]
pub struct HandleRegistry {
    handles: FxHashMap<HandleId, Handle>,
    by_identifier: FxHashMap<String, HandleId>,
    next_id: u64,
    created: usize,
    fetcher: Option<Sender<LoaderCmd>>,
}

impl HandleRegistry {
    /// Registry that never starts a fetch; completions are signalled by hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that sends [`LoaderCmd::Fetch`] for every handle it creates.
    pub fn with_fetcher(tx_cmd: Sender<LoaderCmd>) -> Self {
        Self {
            fetcher: Some(tx_cmd),
            ..Self::default()
        }
    }

    /// Total number of handles created since construction.
    pub fn created_count(&self) -> usize {
        self.created
    }
}

impl ResourceRegistry for HandleRegistry {
    fn find(&self, identifier: &str) -> Option<HandleId> {
        self.by_identifier.get(identifier).copied()
    }

    fn create(&mut self, identifier: &str) -> HandleId {
        if let Some(existing) = self.find(identifier) {
            warn!(
                "create called for '{}' while handle {:?} exists; reusing it",
                identifier, existing
            );
            return existing;
        }

        let id = HandleId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.handles.insert(id, Handle::new(id, identifier));
        self.by_identifier.insert(identifier.to_string(), id);
        debug!("registry: created {:?} for '{}'", id, identifier);

        if let Some(tx) = &self.fetcher {
            let cmd = LoaderCmd::Fetch {
                handle: id,
                identifier: identifier.to_string(),
            };
            if tx.send(cmd).is_err() {
                warn!(
                    "loader thread gone, '{}' on {:?} will stay loading",
                    identifier, id
                );
            }
        }
        id
    }

    fn destroy(&mut self, handle: HandleId) -> Option<Handle> {
        let removed = self.handles.remove(&handle)?;
        if self.by_identifier.get(removed.identifier()) == Some(&handle) {
            self.by_identifier.remove(removed.identifier());
        }
        debug!(
            "registry: destroyed {:?} for '{}' ({} listeners dropped)",
            handle,
            removed.identifier(),
            removed.listener_count()
        );
        Some(removed)
    }

    fn get(&self, handle: HandleId) -> Option<&Handle> {
        self.handles.get(&handle)
    }

    fn get_mut(&mut self, handle: HandleId) -> Option<&mut Handle> {
        self.handles.get_mut(&handle)
    }

    fn len(&self) -> usize {
        self.handles.len()
    }
}
