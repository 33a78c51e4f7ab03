//! Event and message types.
//!
//! - `loader` – commands to and completions from the loader thread
//! - `resourcestatus` – per-consumer status changes and unmount requests
pub mod loader;
pub mod resourcestatus;
