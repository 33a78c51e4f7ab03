//! ECS systems.
//!
//! - `consumer` – mounting, polling and unmounting resource consumers
//! - `loader` – loader thread and completion plumbing
pub mod consumer;
pub mod loader;
