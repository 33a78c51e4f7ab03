//! Loader thread and the systems that feed its results to the coordinator.
//!
//! - [`loader_thread`] runs on its own OS thread and answers
//!   [`LoaderCmd::Fetch`] with a [`LoaderMessage`].
//! - [`poll_loader_messages`] drains the thread's receiver into the ECS
//!   message queue each frame without blocking.
//! - [`update_bevy_loader_messages`] advances that queue.
//! - [`apply_loader_messages`] hands every completion to the
//!   [`LoadCoordinator`], which notifies attached consumers.
//!
//! The coordinator itself never touches the channel; it only sees completion
//! signals on the main thread.

use crate::events::loader::{LoaderCmd, LoaderMessage};
use crate::resources::coordinator::LoadCoordinator;
use crate::resources::loader::LoaderBridge;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Drain pending completions from the loader thread into
/// `Messages<LoaderMessage>`.
pub fn poll_loader_messages(bridge: Res<LoaderBridge>, mut writer: MessageWriter<LoaderMessage>) {
    writer.write_batch(bridge.rx_msg.try_iter());
}

/// Advance the ECS message queue for [`LoaderMessage`].
pub fn update_bevy_loader_messages(mut msgs: ResMut<Messages<LoaderMessage>>) {
    msgs.update();
}

/// Apply every completion signal to the coordinator.
///
/// Signals for handles that were destroyed, or that already completed, are
/// dropped by the coordinator.
pub fn apply_loader_messages(
    mut coordinator: ResMut<LoadCoordinator>,
    mut reader: MessageReader<LoaderMessage>,
) {
    for msg in reader.read() {
        if let LoaderMessage::Failed {
            identifier, error, ..
        } = msg
        {
            debug!("load of '{}' failed: {}", identifier, error);
        }
        if let Some((identifier, status)) = coordinator.complete(msg.handle(), msg.outcome()) {
            info!("'{}' is {}", identifier, status);
        }
    }
}

/// Resolve an identifier to a file under `assets_root`.
///
/// Absolute paths are used as is. Anything with a URL scheme is rejected;
/// this loader only reads local files.
pub fn resolve_identifier(assets_root: &Path, identifier: &str) -> Result<PathBuf, String> {
    if identifier.contains("://") {
        return Err(format!("unsupported scheme in '{}'", identifier));
    }
    let path = Path::new(identifier);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(assets_root.join(path))
    }
}

/// Fetch one resource. Success means the file could be read in full.
pub fn fetch(assets_root: &Path, identifier: &str) -> Result<usize, String> {
    let path = resolve_identifier(assets_root, identifier)?;
    std::fs::read(&path)
        .map(|bytes| bytes.len())
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))
}

/// Entry point of the dedicated loader thread.
///
/// Blocks on the command channel, fetches each requested handle, and replies
/// with [`LoaderMessage::Loaded`] or [`LoaderMessage::Failed`]. Returns on
/// [`LoaderCmd::Shutdown`] or when every sender is gone.
pub fn loader_thread(rx_cmd: Receiver<LoaderCmd>, tx_msg: Sender<LoaderMessage>, assets_root: PathBuf) {
    debug!(
        "[loader] thread starting (id={:?}, root={:?})",
        std::thread::current().id(),
        assets_root
    );

    for cmd in rx_cmd.iter() {
        match cmd {
            LoaderCmd::Fetch { handle, identifier } => {
                let msg = match fetch(&assets_root, &identifier) {
                    Ok(bytes) => {
                        debug!("[loader] loaded '{}' ({} bytes)", identifier, bytes);
                        LoaderMessage::Loaded { handle, identifier }
                    }
                    Err(error) => {
                        warn!("[loader] {}", error);
                        LoaderMessage::Failed {
                            handle,
                            identifier,
                            error,
                        }
                    }
                };
                if tx_msg.send(msg).is_err() {
                    break;
                }
            }
            LoaderCmd::Shutdown => break,
        }
    }

    debug!("[loader] thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::registry::HandleId;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let root = Path::new("/srv/assets");
        assert_eq!(
            resolve_identifier(root, "game.wasm.js").unwrap(),
            PathBuf::from("/srv/assets/game.wasm.js")
        );
        assert_eq!(
            resolve_identifier(root, "/tmp/x.js").unwrap(),
            PathBuf::from("/tmp/x.js")
        );
        assert!(resolve_identifier(root, "https://example.com/game.js").is_err());
    }

    #[test]
    fn test_loader_thread_reports_both_outcomes() {
        let dir = std::env::temp_dir().join(format!("resourceload-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("present.js"), b"console.log(1)").unwrap();

        let (tx_cmd, rx_cmd) = unbounded();
        let (tx_msg, rx_msg) = unbounded();
        let root = dir.clone();
        let thread = std::thread::spawn(move || loader_thread(rx_cmd, tx_msg, root));

        tx_cmd
            .send(LoaderCmd::Fetch {
                handle: HandleId(1),
                identifier: "present.js".into(),
            })
            .unwrap();
        tx_cmd
            .send(LoaderCmd::Fetch {
                handle: HandleId(2),
                identifier: "absent.js".into(),
            })
            .unwrap();
        tx_cmd.send(LoaderCmd::Shutdown).unwrap();
        thread.join().unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        let msgs: Vec<LoaderMessage> = rx_msg.try_iter().collect();
        assert_eq!(msgs.len(), 2);
        assert!(matches!(&msgs[0], LoaderMessage::Loaded { handle, .. } if *handle == HandleId(1)));
        assert!(matches!(&msgs[1], LoaderMessage::Failed { handle, .. } if *handle == HandleId(2)));
    }
}
