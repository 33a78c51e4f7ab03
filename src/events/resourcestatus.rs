//! Consumer-facing status events.
//!
//! [`ResourceStatusChanged`] is written whenever a
//! [`ResourceConsumer`](crate::components::resourceconsumer::ResourceConsumer)
//! learns a new status: once on mount and once per later transition.
//! [`UnmountConsumerEvent`] asks the
//! [`unmount_consumer_observer`](crate::systems::consumer::unmount_consumer_observer)
//! to detach and despawn a consumer.

use crate::resources::loadstatus::LoadStatus;
use bevy_ecs::message::Message;
use bevy_ecs::prelude::*;

/// A consumer observed a new status.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatusChanged {
    pub entity: Entity,
    pub identifier: Option<String>,
    pub status: LoadStatus,
}

/// Request to unmount the consumer on `entity`.
#[derive(Event, Debug, Clone, Copy)]
pub struct UnmountConsumerEvent {
    pub entity: Entity,
}
