//! Resource load coordination.
//!
//! Many independent consumers can ask for the same externally hosted resource
//! (a game binary, a script) while a single load happens underneath. The
//! [`LoadCoordinator`](resources::coordinator::LoadCoordinator) deduplicates
//! loads through a [`ResourceRegistry`](resources::registry::ResourceRegistry)
//! and caches outcomes for the life of the process.
//!
//! The ECS pieces (components, events, systems) wire the coordinator into a
//! `bevy_ecs` world with a background loader thread.

pub mod components;
pub mod events;
pub mod resources;
pub mod systems;
