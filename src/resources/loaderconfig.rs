//! Loader configuration resource.
//!
//! Settings loaded from an INI file. Defaults are safe to run with when the
//! file is missing.
//!
//! # Configuration File Format
//!
//! ```ini
//! [loader]
//! assets_root = ./assets
//! frame_interval_ms = 16
//! max_frames = 600
//!
//! [coordinator]
//! removal_policy = unscoped
//! ```

use crate::resources::coordinator::RemovalPolicy;
use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

const DEFAULT_ASSETS_ROOT: &str = "./assets";
const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
const DEFAULT_MAX_FRAMES: u64 = 600;
const DEFAULT_CONFIG_PATH: &str = "./resourceload.ini";

/// Loader configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct LoaderConfig {
    /// Directory identifiers are resolved against by the loader thread.
    pub assets_root: PathBuf,
    /// Sleep between frames of the main loop.
    pub frame_interval_ms: u64,
    /// Frames to run before giving up on loads still in flight.
    pub max_frames: u64,
    /// Reach of `remove_on_unmount` cleanup.
    pub removal_policy: RemovalPolicy,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            assets_root: PathBuf::from(DEFAULT_ASSETS_ROOT),
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            max_frames: DEFAULT_MAX_FRAMES,
            removal_policy: RemovalPolicy::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [loader] section
        if let Some(root) = config.get("loader", "assets_root") {
            self.assets_root = PathBuf::from(root);
        }
        if let Some(ms) = config.getuint("loader", "frame_interval_ms").ok().flatten() {
            self.frame_interval_ms = ms;
        }
        if let Some(frames) = config.getuint("loader", "max_frames").ok().flatten() {
            self.max_frames = frames;
        }

        // [coordinator] section
        if let Some(name) = config.get("coordinator", "removal_policy") {
            match RemovalPolicy::parse(&name) {
                Some(policy) => self.removal_policy = policy,
                None => warn!(
                    "Unknown removal_policy '{}', keeping {}",
                    name,
                    self.removal_policy.as_str()
                ),
            }
        }

        info!(
            "Loaded config: assets_root={:?}, frame_interval_ms={}, max_frames={}, removal_policy={}",
            self.assets_root,
            self.frame_interval_ms,
            self.max_frames,
            self.removal_policy.as_str()
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [loader] section
        config.set(
            "loader",
            "assets_root",
            Some(self.assets_root.display().to_string()),
        );
        config.set(
            "loader",
            "frame_interval_ms",
            Some(self.frame_interval_ms.to_string()),
        );
        config.set("loader", "max_frames", Some(self.max_frames.to_string()));

        // [coordinator] section
        config.set(
            "coordinator",
            "removal_policy",
            Some(self.removal_policy.as_str().to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "resourceload-{}-{}.ini",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::new();
        assert_eq!(config.assets_root, PathBuf::from("./assets"));
        assert_eq!(config.frame_interval_ms, 16);
        assert_eq!(config.max_frames, 600);
        assert_eq!(config.removal_policy, RemovalPolicy::Unscoped);
    }

    #[test]
    fn test_missing_file_is_an_error_and_keeps_defaults() {
        let mut config = LoaderConfig::with_path(temp_path("missing"));
        assert!(config.load_from_file().is_err());
        assert_eq!(config.max_frames, 600);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let mut saved = LoaderConfig::with_path(&path);
        saved.assets_root = PathBuf::from("/srv/game");
        saved.max_frames = 42;
        saved.removal_policy = RemovalPolicy::LastConsumer;
        saved.save_to_file().unwrap();

        let mut loaded = LoaderConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.assets_root, PathBuf::from("/srv/game"));
        assert_eq!(loaded.max_frames, 42);
        assert_eq!(loaded.frame_interval_ms, 16);
        assert_eq!(loaded.removal_policy, RemovalPolicy::LastConsumer);
    }

    #[test]
    fn test_unknown_policy_keeps_current() {
        let path = temp_path("badpolicy");
        std::fs::write(&path, "[coordinator]\nremoval_policy = sometimes\n").unwrap();
        let mut config = LoaderConfig::with_path(&path);
        config.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.removal_policy, RemovalPolicy::Unscoped);
    }
}
