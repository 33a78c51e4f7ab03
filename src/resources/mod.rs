//! ECS resources and the load-coordination core.
//!
//! Overview
//! - `coordinator` – deduplicating load coordinator and consumer subscriptions
//! - `loader` – bridge and channels for the background loader thread
//! - `loaderconfig` – INI-backed settings
//! - `loadstatus` – the `Idle | Loading | Ready | Error` status
//! - `registry` – resource handles and the registry boundary
//! - `statuscache` – process-wide identifier -> status cache
pub mod coordinator;
pub mod loader;
pub mod loaderconfig;
pub mod loadstatus;
pub mod registry;
pub mod statuscache;
