//! Messages exchanged with the background loader thread.
//!
//! [`LoaderCmd`] travels *to* the thread over a crossbeam channel;
//! [`LoaderMessage`] comes *back* and is drained into the ECS message queue by
//! [`poll_loader_messages`](crate::systems::loader::poll_loader_messages).

use crate::resources::loadstatus::LoadOutcome;
use crate::resources::registry::HandleId;
use bevy_ecs::message::Message;

/// Commands sent *to* the loader thread
#[derive(Debug, Clone)]
pub enum LoaderCmd {
    Fetch { handle: HandleId, identifier: String },
    Shutdown,
}

/// Completion signals sent *back* from the loader thread
#[derive(Message, Debug, Clone)]
pub enum LoaderMessage {
    Loaded { handle: HandleId, identifier: String },
    Failed { handle: HandleId, identifier: String, error: String },
}

impl LoaderMessage {
    /// Handle the signal refers to.
    pub fn handle(&self) -> HandleId {
        match self {
            LoaderMessage::Loaded { handle, .. } | LoaderMessage::Failed { handle, .. } => *handle,
        }
    }

    /// Success or failure, without the cause.
    pub fn outcome(&self) -> LoadOutcome {
        match self {
            LoaderMessage::Loaded { .. } => LoadOutcome::Loaded,
            LoaderMessage::Failed { .. } => LoadOutcome::Failed,
        }
    }
}
