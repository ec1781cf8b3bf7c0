use std::{fs::OpenOptions, path::Path};

use anyhow::Context;
use clap::Parser;
use phone::{
    config::Config,
    link::LocalLink,
    location_provider::GpxReplayProvider,
    surfaces::{TracingDisplay, TracingSpeech},
    tracking_controller::{tracker_channel, TrackingController},
    TRACKER_QUEUE_CAPACITY,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walk_tracker_data_management::{gpx_util::read_gpx, DataManager};
use walk_tracker_lib::remote::WearableRemote;

fn init_tracing(log_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("phone.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,walk_tracker_lib=debug,walk_tracker_data_management=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(&config.log_dir)?;

    tracing::info!("Starting phone...");

    let data_manager = DataManager::start(config.export_dir.clone()).await
        .context("Failed to start data manager")?;

    let fixes = match &config.replay {
        Some(path) => read_gpx(path, config.default_accuracy)
            .with_context(|| format!("Failed to load replay route {:?}", path))?,
        None => {
            tracing::warn!("No route to replay, the walk will have no fixes");
            Vec::new()
        }
    };

    let (tracker, inbox) = tracker_channel(TRACKER_QUEUE_CAPACITY);
    let provider = GpxReplayProvider::spawn(fixes, config.replay_interval(), tracker.clone());
    let controller = TrackingController::new(
        inbox,
        provider,
        TracingDisplay::default(),
        TracingSpeech,
        data_manager.clone(),
        config.voice(),
    );
    let controller_task = tokio::spawn(controller.run());

    // The wearable presses start, walks for a while, then presses stop.
    let mut remote = WearableRemote::new(LocalLink::new(tracker.clone()));
    remote.toggle().await.context("Start press failed")?;
    tokio::time::sleep(config.walk_duration()).await;
    remote.toggle().await.context("Stop press failed")?;

    let snapshot = tracker.snapshot().await?;
    tracing::info!(
        "Walk {:?}: {} fixes, {} in {}",
        snapshot.walk_id,
        snapshot.fix_count,
        snapshot.summary.distance_text(),
        snapshot.summary.duration_text()
    );

    tracker.shutdown().await?;
    controller_task.await?;

    for (walk_id, walk) in data_manager.list_walks().await {
        tracing::info!("Stored walk {}: {:?}, {:.1} m", walk_id, walk.state(), walk.total_distance());
    }

    Ok(())
}
