//! ECS resources that bridge the main thread with the background loader thread.
//!
//! Use [`setup_loader`] once during initialization to spawn the loader thread
//! and insert the [`LoaderBridge`] and `Messages<LoaderMessage>` resources.
//! Call [`shutdown_loader`] during teardown to stop and join the thread.
//!
//! The loader thread plays the host's part: it performs the actual fetch for
//! every handle the [`HandleRegistry`](crate::resources::registry::HandleRegistry)
//! creates and reports completion back.

use crate::events::loader::{LoaderCmd, LoaderMessage};
use crate::systems::loader::loader_thread;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::path::PathBuf;

/// Shared bridge between the ECS world and the loader thread.
#[derive(Resource)]
pub struct LoaderBridge {
    /// Sender for [`LoaderCmd`] messages (ECS -> loader thread).
    pub tx_cmd: Sender<LoaderCmd>,
    /// Receiver for [`LoaderMessage`] messages (loader thread -> ECS).
    pub rx_msg: Receiver<LoaderMessage>,
    /// Join handle for the background loader thread.
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the loader thread and register bridge resources.
///
/// Returns a clone of the command sender so the caller can hand it to a
/// [`HandleRegistry`](crate::resources::registry::HandleRegistry).
pub fn setup_loader(world: &mut World, assets_root: impl Into<PathBuf>) -> Sender<LoaderCmd> {
    let (tx_cmd, rx_cmd) = unbounded::<LoaderCmd>();
    let (tx_msg, rx_msg) = unbounded::<LoaderMessage>();
    let assets_root = assets_root.into();

    let handle = std::thread::spawn(move || loader_thread(rx_cmd, tx_msg, assets_root));

    let tx = tx_cmd.clone();
    world.insert_resource(LoaderBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    world.insert_resource(Messages::<LoaderMessage>::default());
    tx
}

/// Gracefully request shutdown of the loader thread and join it.
pub fn shutdown_loader(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<LoaderBridge>() {
        let _ = bridge.tx_cmd.send(LoaderCmd::Shutdown);
        let _ = bridge.handle.join();
    }
}
