//! resourceload entry point.
//!
//! Spawns one or more consumers per identifier inside a `bevy_ecs` world,
//! lets the loader thread fetch each resource once, and reports the final
//! status of every identifier.
//!
//! # Main Loop
//!
//! 1. Load `resourceload.ini` (defaults when missing)
//! 2. Spawn the loader thread and insert the coordinator
//! 3. Spawn `--consumers` consumer entities per identifier
//! 4. Run the schedule until every consumer settled or `max_frames` elapsed
//! 5. Report, unmount every consumer, join the loader thread
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --consumers 3 game.wasm.js
//! ```

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use clap::Parser;
use log::{info, warn};
use resourceload::components::resourceconsumer::ResourceConsumer;
use resourceload::events::resourcestatus::{ResourceStatusChanged, UnmountConsumerEvent};
use resourceload::resources::coordinator::{LoadCoordinator, RequestOptions};
use resourceload::resources::loader::{setup_loader, shutdown_loader};
use resourceload::resources::loaderconfig::LoaderConfig;
use resourceload::resources::loadstatus::LoadStatus;
use resourceload::resources::registry::HandleRegistry;
use resourceload::systems::consumer::{
    consumers_settled, log_resource_status_changes, mount_resource_consumers,
    poll_resource_consumers, unmount_consumer_observer, update_bevy_status_messages,
};
use resourceload::systems::loader::{
    apply_loader_messages, poll_loader_messages, update_bevy_loader_messages,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Load external resources once, however many consumers ask for them.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Resource identifiers to request, resolved against the assets root.
    identifiers: Vec<String>,

    /// Configuration file (default: ./resourceload.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Consumers to mount per identifier.
    #[arg(long, default_value_t = 1)]
    consumers: usize,

    /// Mount consumers with loading prevented; they stay idle.
    #[arg(long)]
    prevent_load: bool,

    /// Evict the cache entry and destroy the handle when a consumer unmounts.
    #[arg(long)]
    remove_on_unmount: bool,

    /// Print the final statuses as JSON.
    #[arg(long)]
    json: bool,

    /// Write the default configuration and exit.
    /// Optionally provide a path (default: ./resourceload.ini).
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<Option<PathBuf>>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Early-exit: write default config and quit
    if let Some(maybe_path) = cli.write_default_config {
        let config = match maybe_path {
            Some(path) => LoaderConfig::with_path(path),
            None => LoaderConfig::new(),
        };
        if let Err(e) = config.save_to_file() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        println!("Default config written to {}", config.config_path.display());
        return;
    }

    let mut config = match &cli.config {
        Some(path) => LoaderConfig::with_path(path),
        None => LoaderConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        // A missing default file is normal; an explicit one is worth a warning.
        if cli.config.is_some() {
            warn!("{e}, using defaults");
        }
    }

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    let tx_cmd = setup_loader(&mut world, config.assets_root.clone());
    world.insert_resource(
        LoadCoordinator::new(HandleRegistry::with_fetcher(tx_cmd))
            .with_policy(config.removal_policy),
    );
    world.insert_resource(Messages::<ResourceStatusChanged>::default());
    world.insert_resource(config.clone());
    world.spawn(Observer::new(unmount_consumer_observer));
    world.flush();

    let options = RequestOptions {
        should_prevent_load: cli.prevent_load,
        remove_on_unmount: cli.remove_on_unmount,
    };
    for identifier in &cli.identifiers {
        for _ in 0..cli.consumers.max(1) {
            world.spawn(ResourceConsumer::new(identifier.clone()).with_options(options));
        }
    }

    let mut update = Schedule::default();
    update.add_systems(
        (
            poll_loader_messages,
            update_bevy_loader_messages,
            apply_loader_messages,
            mount_resource_consumers,
            poll_resource_consumers,
            log_resource_status_changes,
            update_bevy_status_messages,
        )
            .chain(),
    );

    // --------------- Main loop ---------------
    let interval = Duration::from_millis(config.frame_interval_ms);
    let mut frames = 0;
    while frames < config.max_frames {
        update.run(&mut world);
        frames += 1;
        if consumers_settled(&mut world) {
            break;
        }
        std::thread::sleep(interval);
    }
    info!("Ran {} frames", frames);

    let coordinator = world.resource::<LoadCoordinator>();
    let statuses: BTreeMap<String, LoadStatus> = cli
        .identifiers
        .iter()
        .map(|id| {
            let status = if cli.prevent_load {
                LoadStatus::Idle
            } else {
                coordinator.status_of(id)
            };
            (id.clone(), status)
        })
        .collect();
    info!(
        "{} handles live, {} cache entries",
        coordinator.registry().len(),
        coordinator.cache().len()
    );

    if cli.json {
        match serde_json::to_string_pretty(&statuses) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing statuses: {e}"),
        }
    } else {
        for (identifier, status) in &statuses {
            println!("{identifier}: {status}");
        }
    }

    // --------------- Teardown ---------------
    let consumers: Vec<Entity> = world
        .query_filtered::<Entity, With<ResourceConsumer>>()
        .iter(&world)
        .collect();
    for entity in consumers {
        world.trigger(UnmountConsumerEvent { entity });
    }
    world.flush();
    shutdown_loader(&mut world);

    if statuses.values().any(|s| *s != LoadStatus::Ready && *s != LoadStatus::Idle) {
        std::process::exit(1);
    }
}
