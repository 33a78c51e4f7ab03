//! ECS components attached to consumer entities.
//!
//! - `resourceconsumer` – one call site waiting on an external resource
pub mod resourceconsumer;
