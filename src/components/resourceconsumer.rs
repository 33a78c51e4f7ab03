//! Resource consumer component.
//!
//! An entity carrying a [`ResourceConsumer`] is one call site interested in an
//! external resource. Mounting happens when the component is added
//! ([`mount_resource_consumers`]), unmounting through
//! [`UnmountConsumerEvent`]. Changing `identifier` or `options` after mount
//! makes the next mount pass drop the old subscription and request again.
//!
//! Despawning the entity, removing the component or replacing it detaches the
//! subscription from the coordinator in an `on_replace` hook, so a consumer
//! never leaves a listener behind on its handle.
//!
//! # Related
//!
//! - [`crate::systems::consumer`] – mount, poll and unmount systems
//! - [`crate::resources::coordinator::LoadCoordinator`] – shared load state
//!
//! [`mount_resource_consumers`]: crate::systems::consumer::mount_resource_consumers
//! [`UnmountConsumerEvent`]: crate::events::resourcestatus::UnmountConsumerEvent

use crate::resources::coordinator::{LoadCoordinator, RequestOptions, Subscription};
use crate::resources::loadstatus::LoadStatus;
use bevy_ecs::lifecycle::HookContext;
use bevy_ecs::prelude::Component;
use bevy_ecs::world::DeferredWorld;
use log::debug;

#[derive(Component, Debug)]
#[component(on_replace = detach_on_replace)]
pub struct ResourceConsumer {
    /// Resource to load; `None` keeps the consumer idle.
    pub identifier: Option<String>,
    pub options: RequestOptions,
    subscription: Option<Subscription>,
}

impl ResourceConsumer {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            options: RequestOptions::default(),
            subscription: None,
        }
    }

    /// Consumer with no identifier; always `Idle`.
    pub fn idle() -> Self {
        Self {
            identifier: None,
            options: RequestOptions::default(),
            subscription: None,
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Status last seen by this consumer; `Idle` before mounting.
    pub fn status(&self) -> LoadStatus {
        self.subscription
            .as_ref()
            .map_or(LoadStatus::Idle, Subscription::status)
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether the mounted subscription no longer matches `identifier` and
    /// `options`. Always `false` before mounting.
    pub fn is_stale(&self) -> bool {
        self.subscription.as_ref().is_some_and(|s| {
            s.identifier() != self.identifier.as_deref() || s.options() != self.options
        })
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    pub fn subscription_mut(&mut self) -> Option<&mut Subscription> {
        self.subscription.as_mut()
    }

    pub fn set_subscription(&mut self, subscription: Subscription) {
        self.subscription = Some(subscription);
    }

    /// Take the subscription out for detaching.
    pub fn take_subscription(&mut self) -> Option<Subscription> {
        self.subscription.take()
    }
}

/// Hand a still-mounted subscription back to the coordinator when the
/// component goes away without an unmount.
fn detach_on_replace(mut world: DeferredWorld, ctx: HookContext) {
    let Some(subscription) = world
        .get_mut::<ResourceConsumer>(ctx.entity)
        .and_then(|mut consumer| consumer.take_subscription())
    else {
        return;
    };
    if let Some(mut coordinator) = world.get_resource_mut::<LoadCoordinator>() {
        debug!("consumer {:?} dropped while mounted, detaching", ctx.entity);
        coordinator.detach(subscription);
    }
}
