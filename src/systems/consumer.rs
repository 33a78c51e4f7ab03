//! Resource consumer systems.
//!
//! - [`mount_resource_consumers`] – requests the resource for new or reconfigured consumers
//! - [`poll_resource_consumers`] – drains each subscription and reports changes
//! - [`log_resource_status_changes`] – logs every reported change
//! - [`unmount_consumer_observer`] – detaches and despawns on [`UnmountConsumerEvent`]
//!
//! # System Flow
//!
//! Each frame, after loader completions have been applied:
//!
//! 1. New consumers get a subscription and report their initial status;
//!    consumers whose identifier or options changed are detached and requested again
//! 2. Mounted consumers drain their subscription
//! 3. Any change is written as a [`ResourceStatusChanged`] message

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::components::resourceconsumer::ResourceConsumer;
use crate::events::resourcestatus::{ResourceStatusChanged, UnmountConsumerEvent};
use crate::resources::coordinator::LoadCoordinator;
use crate::resources::loadstatus::LoadStatus;

/// Request the resource for every consumer added or changed since the last run.
///
/// A mounted consumer is left alone unless its identifier or options no longer
/// match its subscription; then the old subscription is detached first.
pub fn mount_resource_consumers(
    mut coordinator: ResMut<LoadCoordinator>,
    mut query: Query<(Entity, &mut ResourceConsumer), Changed<ResourceConsumer>>,
    mut writer: MessageWriter<ResourceStatusChanged>,
) {
    for (entity, mut consumer) in query.iter_mut() {
        if consumer.is_mounted() {
            if !consumer.is_stale() {
                continue;
            }
            if let Some(old) = consumer.take_subscription() {
                debug!(
                    "consumer {:?} moved from {:?} to {:?}, resubscribing",
                    entity,
                    old.identifier(),
                    consumer.identifier
                );
                coordinator.detach(old);
            }
        }
        let subscription = coordinator.request(consumer.identifier.as_deref(), consumer.options);
        let status = subscription.status();
        debug!(
            "mounted consumer {:?} for {:?}: {}",
            entity, consumer.identifier, status
        );
        consumer.set_subscription(subscription);
        writer.write(ResourceStatusChanged {
            entity,
            identifier: consumer.identifier.clone(),
            status,
        });
    }
}

/// Drain notifications for every mounted consumer.
pub fn poll_resource_consumers(
    mut query: Query<(Entity, &mut ResourceConsumer)>,
    mut writer: MessageWriter<ResourceStatusChanged>,
) {
    for (entity, mut consumer) in query.iter_mut() {
        let Some(status) = consumer.subscription_mut().and_then(|s| s.poll()) else {
            continue;
        };
        writer.write(ResourceStatusChanged {
            entity,
            identifier: consumer.identifier.clone(),
            status,
        });
    }
}

/// Log every status change at info level.
pub fn log_resource_status_changes(mut reader: MessageReader<ResourceStatusChanged>) {
    for msg in reader.read() {
        info!(
            "consumer {:?} ({}): {}",
            msg.entity,
            msg.identifier.as_deref().unwrap_or("<none>"),
            msg.status
        );
    }
}

/// Advance the ECS message queue for [`ResourceStatusChanged`].
pub fn update_bevy_status_messages(mut msgs: ResMut<Messages<ResourceStatusChanged>>) {
    msgs.update();
}

/// Observer that unmounts a consumer.
///
/// Hands the subscription back to the coordinator (which applies
/// `remove_on_unmount` if set) and despawns the entity.
pub fn unmount_consumer_observer(
    trigger: On<UnmountConsumerEvent>,
    mut coordinator: ResMut<LoadCoordinator>,
    mut query: Query<&mut ResourceConsumer>,
    mut commands: Commands,
) {
    let entity = trigger.event().entity;
    let Ok(mut consumer) = query.get_mut(entity) else {
        warn!("unmount requested for {:?}, which has no consumer", entity);
        return;
    };
    if let Some(subscription) = consumer.take_subscription() {
        coordinator.detach(subscription);
    }
    commands.entity(entity).try_despawn();
}

/// Whether every mounted consumer has left `Loading`.
pub fn consumers_settled(world: &mut World) -> bool {
    world
        .query::<&ResourceConsumer>()
        .iter(world)
        .all(|c| c.is_mounted() && c.status() != LoadStatus::Loading)
}
