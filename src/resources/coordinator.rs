//! Resource load coordinator.
//!
//! Lets many independent consumers ask for the same externally hosted
//! resource while only one load happens. Each [`LoadCoordinator::request`]
//! call returns a [`Subscription`] carrying the current [`LoadStatus`]; later
//! transitions reach the subscription through the listener it attached to the
//! resource's [`Handle`](crate::resources::registry::Handle).
//!
//! # Request flow
//!
//! 1. No identifier, or `should_prevent_load` → `Idle`, registry untouched.
//! 2. Terminal status in the [`StatusCache`] → returned as is. A listener is
//!    still attached when a handle exists, but none is ever created.
//! 3. Existing handle → its marker if terminal, `Loading` otherwise.
//! 4. No handle → one is created (marker `Loading`).
//!
//! Completion signals are applied with [`LoadCoordinator::complete`], which
//! writes the handle marker, updates the cache and notifies every attached
//! listener in the same call.
//!
//! # Cleanup
//!
//! [`LoadCoordinator::detach`] only removes the subscription's listener. With
//! `remove_on_unmount` it also evicts the cache entry and destroys the handle,
//! scoped according to [`RemovalPolicy`]. Under [`RemovalPolicy::Unscoped`]
//! the other consumers of that handle stop receiving notifications, and the
//! next request for the identifier starts a fresh load.

use crate::resources::loadstatus::{LoadOutcome, LoadStatus};
use crate::resources::registry::{HandleId, ListenerId, ResourceRegistry};
use crate::resources::statuscache::StatusCache;
use bevy_ecs::prelude::Resource;
use crossbeam_channel::{Receiver, unbounded};
use log::debug;

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestOptions {
    /// Never create or observe a handle; status stays `Idle`.
    pub should_prevent_load: bool,
    /// On detach, evict the cache entry and destroy the handle.
    pub remove_on_unmount: bool,
}

impl RequestOptions {
    pub fn prevent_load() -> Self {
        Self {
            should_prevent_load: true,
            ..Self::default()
        }
    }

    pub fn remove_on_unmount() -> Self {
        Self {
            remove_on_unmount: true,
            ..Self::default()
        }
    }
}

/// How far `remove_on_unmount` reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Destroy the shared handle and evict the cache entry even if other
    /// consumers are still attached.
    #[default]
    Unscoped,
    /// Only the last attached consumer destroys the handle and evicts.
    ///
    /// A `remove_on_unmount` detach that is not the last one leaves a pending
    /// removal on the handle; whichever consumer detaches last then removes it,
    /// whatever its own options.
    LastConsumer,
}

impl RemovalPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RemovalPolicy::Unscoped => "unscoped",
            RemovalPolicy::LastConsumer => "last_consumer",
        }
    }

    /// Parse a config value. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "unscoped" => Some(RemovalPolicy::Unscoped),
            "last_consumer" | "lastconsumer" | "refcounted" => Some(RemovalPolicy::LastConsumer),
            _ => None,
        }
    }
}

/// One consumer's view of a resource load.
///
/// Holds nothing shared: the listener id it registered and the receiving end
/// of that listener's channel. Hand it back to [`LoadCoordinator::detach`]
/// when the consumer goes away.
#[derive(Debug)]
pub struct Subscription {
    identifier: Option<String>,
    handle: Option<HandleId>,
    listener: Option<ListenerId>,
    options: RequestOptions,
    status: LoadStatus,
    rx: Option<Receiver<LoadStatus>>,
}

impl Subscription {
    fn idle(identifier: Option<&str>, options: RequestOptions) -> Self {
        Self {
            identifier: identifier.map(str::to_string),
            handle: None,
            listener: None,
            options,
            status: LoadStatus::Idle,
            rx: None,
        }
    }

    /// Last status seen by this consumer.
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn options(&self) -> RequestOptions {
        self.options
    }

    /// Handle this subscription listens on, if any.
    pub fn handle(&self) -> Option<HandleId> {
        self.handle
    }

    /// Whether a listener is registered on a handle.
    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Drain pending notifications.
    ///
    /// Returns the new status when it changed. Notifications that would move
    /// the status backwards or to a second terminal value are dropped.
    pub fn poll(&mut self) -> Option<LoadStatus> {
        let rx = self.rx.as_ref()?;
        let before = self.status;
        for next in rx.try_iter() {
            if self.status.can_advance_to(next) {
                self.status = next;
            }
        }
        (self.status != before).then_some(self.status)
    }
}

/// Process-wide coordinator resource.
///
/// Owns the [`StatusCache`] and an injected [`ResourceRegistry`]. Construct it
/// once at startup; tests build their own with a fresh registry.
#[derive(Resource)]
pub struct LoadCoordinator {
    cache: StatusCache,
    registry: Box<dyn ResourceRegistry>,
    policy: RemovalPolicy,
}

impl LoadCoordinator {
    pub fn new(registry: impl ResourceRegistry + 'static) -> Self {
        Self {
            cache: StatusCache::new(),
            registry: Box::new(registry),
            policy: RemovalPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RemovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    pub fn registry(&self) -> &dyn ResourceRegistry {
        self.registry.as_ref()
    }

    /// Current status of `identifier` as a fresh consumer would see it,
    /// without attaching or creating anything.
    pub fn status_of(&self, identifier: &str) -> LoadStatus {
        if let Some(cached) = self.cache.terminal(identifier) {
            return cached;
        }
        match self.registry.find(identifier) {
            Some(handle) => self
                .registry
                .status_marker(handle)
                .unwrap_or(LoadStatus::Loading),
            None => LoadStatus::Idle,
        }
    }

    /// Attach a consumer to `identifier`.
    pub fn request(&mut self, identifier: Option<&str>, options: RequestOptions) -> Subscription {
        let Some(identifier) = identifier.filter(|_| !options.should_prevent_load) else {
            return Subscription::idle(identifier, options);
        };

        let cached = self.cache.terminal(identifier);
        let existing = self.registry.find(identifier);

        let (handle, status) = match (cached, existing) {
            (Some(status), Some(handle)) => (Some(handle), status),
            (Some(status), None) => {
                debug!("'{}' served from cache: {}", identifier, status);
                return Subscription {
                    status,
                    ..Subscription::idle(Some(identifier), options)
                };
            }
            (None, Some(handle)) => {
                let marker = self
                    .registry
                    .status_marker(handle)
                    .filter(|s| s.is_terminal())
                    .unwrap_or(LoadStatus::Loading);
                (Some(handle), marker)
            }
            (None, None) => {
                let handle = self.registry.create(identifier);
                debug!("'{}' load started on {:?}", identifier, handle);
                (Some(handle), LoadStatus::Loading)
            }
        };

        let (tx, rx) = unbounded();
        let listener = handle.and_then(|h| {
            self.registry.on_complete(
                h,
                Box::new(move |status: LoadStatus| {
                    // Receiver dropped means the consumer went away without detaching.
                    let _ = tx.send(status);
                }),
            )
        });

        Subscription {
            identifier: Some(identifier.to_string()),
            handle,
            listener,
            options,
            status,
            rx: Some(rx),
        }
    }

    /// Apply the registry's completion signal for `handle`.
    ///
    /// Returns the identifier and terminal status when the signal was applied,
    /// `None` when the handle no longer exists or already completed.
    pub fn complete(&mut self, handle: HandleId, outcome: LoadOutcome) -> Option<(String, LoadStatus)> {
        let status = outcome.status();
        let Some(h) = self.registry.get_mut(handle) else {
            debug!("completion for unknown {:?} ignored", handle);
            return None;
        };
        if !h.mark(status) {
            debug!(
                "completion for {:?} ignored, already {}",
                handle,
                h.status()
            );
            return None;
        }
        let identifier = h.identifier().to_string();
        self.cache.set(identifier.clone(), status);
        let notified = h.publish(status);
        debug!(
            "'{}' {} ({} consumers notified)",
            identifier, status, notified
        );
        Some((identifier, status))
    }

    /// Detach a consumer.
    pub fn detach(&mut self, subscription: Subscription) {
        let Subscription {
            identifier,
            handle,
            listener,
            options,
            ..
        } = subscription;
        let (Some(identifier), Some(handle)) = (identifier, handle) else {
            return;
        };

        if let Some(listener) = listener {
            self.registry.off_complete(handle, listener);
        }

        let remaining = self
            .registry
            .get(handle)
            .map_or(0, |h| h.listener_count());
        match self.policy {
            RemovalPolicy::Unscoped => {
                if !options.remove_on_unmount {
                    return;
                }
            }
            RemovalPolicy::LastConsumer => {
                let pending = self.registry.get_mut(handle).is_some_and(|h| {
                    if options.remove_on_unmount {
                        h.request_removal();
                    }
                    h.removal_requested()
                });
                if !pending {
                    return;
                }
                if remaining > 0 {
                    debug!(
                        "'{}' removal pending: {} consumers still attached",
                        identifier, remaining
                    );
                    return;
                }
            }
        }

        self.cache.delete(&identifier);
        if self.registry.destroy(handle).is_some() && remaining > 0 {
            debug!(
                "'{}' destroyed with {} consumers still attached",
                identifier, remaining
            );
        }
    }
}
