use std::time::Duration;

use chrono::Utc;
use tokio::{sync::watch, task::JoinHandle};
use walk_tracker_lib::location_fix::LocationFix;

use crate::tracking_controller::TrackerHandle;

/// Source of location fixes. Fixes are delivered to the tracker it was created with.
pub trait LocationProvider: Send {
    fn request_tracking(&mut self, on: bool);
}

/// Plays back a recorded route, one fix per interval, while tracking is requested.
///
/// Fixes are restamped with the current time as they are delivered.
pub struct GpxReplayProvider {
    enabled: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl GpxReplayProvider {
    pub fn spawn(fixes: Vec<LocationFix>, interval: Duration, listener: TrackerHandle) -> Self {
        let (enabled, rx) = watch::channel(false);
        tracing::info!("Replaying {} fixes every {:?}", fixes.len(), interval);
        let task = tokio::spawn(replay(fixes, interval, listener, rx));

        Self { enabled, task }
    }
}

impl LocationProvider for GpxReplayProvider {
    fn request_tracking(&mut self, on: bool) {
        tracing::debug!("Location updates {}", if on { "on" } else { "off" });
        self.enabled.send_replace(on);
    }
}

impl Drop for GpxReplayProvider {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn replay(fixes: Vec<LocationFix>, interval: Duration, listener: TrackerHandle, mut enabled: watch::Receiver<bool>) {
    let mut remaining = fixes.into_iter();

    loop {
        if enabled.wait_for(|on| *on).await.is_err() {
            return;
        }

        tokio::time::sleep(interval).await;

        // Turned off while sleeping
        if !*enabled.borrow() {
            continue;
        }

        let Some(fix) = remaining.next() else {
            tracing::info!("Replay finished");
            return;
        };

        let fix = LocationFix { timestamp: Utc::now(), ..fix };
        if listener.push_fixes(vec![fix]).await.is_err() {
            return;
        }
    }
}
