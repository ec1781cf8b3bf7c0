use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use walk_tracker_data_management::{DataManager, WalkId};
use walk_tracker_lib::{
    comms::LinkError,
    location_fix::LocationFix,
    route_summary::{bounding_region, path, RouteSummary},
    walk_session::{IngestOutcome, WalkError, WalkSession, WalkState},
};

use crate::{
    location_provider::LocationProvider,
    surfaces::{DisplaySurface, SpeechSurface, Utterance, VoiceSettings},
};

pub const START_ANNOUNCEMENT: &str = "Starting your run";
pub const STOP_ANNOUNCEMENT: &str = "Stopping your run";

#[derive(Debug, Error)]
#[error("tracking controller has stopped")]
pub struct TrackerStopped;

pub enum TrackerCommand {
    LocationFixes(Vec<LocationFix>),
    /// Start or stop tracking. The counter is echoed back on `reply`.
    ToggleTracking { counter: i64, reply: oneshot::Sender<i64> },
    Trash,
    Snapshot(oneshot::Sender<TrackerSnapshot>),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct TrackerSnapshot {
    pub walk_id: Option<WalkId>,
    pub state: WalkState,
    pub fix_count: usize,
    pub summary: RouteSummary,
}

impl TrackerSnapshot {
    pub fn is_tracking(&self) -> bool {
        self.state == WalkState::Active
    }
}

/// Sending side of the controller's queue. Cheap to clone.
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerCommand>,
}

pub struct TrackerInbox {
    rx: mpsc::Receiver<TrackerCommand>,
}

pub fn tracker_channel(capacity: usize) -> (TrackerHandle, TrackerInbox) {
    let (tx, rx) = mpsc::channel(capacity);
    (TrackerHandle { tx }, TrackerInbox { rx })
}

impl TrackerHandle {
    pub async fn push_fixes(&self, fixes: Vec<LocationFix>) -> Result<(), TrackerStopped> {
        self.tx.send(TrackerCommand::LocationFixes(fixes)).await.map_err(|_| TrackerStopped)
    }

    pub async fn toggle(&self, counter: i64) -> Result<i64, LinkError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(TrackerCommand::ToggleTracking { counter, reply }).await
            .map_err(|_| LinkError::PeerGone)?;
        rx.await.map_err(|_| LinkError::PeerGone)
    }

    pub async fn trash(&self) -> Result<(), TrackerStopped> {
        self.tx.send(TrackerCommand::Trash).await.map_err(|_| TrackerStopped)
    }

    pub async fn snapshot(&self) -> Result<TrackerSnapshot, TrackerStopped> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(TrackerCommand::Snapshot(reply)).await.map_err(|_| TrackerStopped)?;
        rx.await.map_err(|_| TrackerStopped)
    }

    pub async fn shutdown(&self) -> Result<(), TrackerStopped> {
        self.tx.send(TrackerCommand::Shutdown).await.map_err(|_| TrackerStopped)
    }
}

/// Owns the walk and applies every command in the order it was queued.
/// Nothing else can reach the `WalkSession`, so fixes and toggles never interleave.
pub struct TrackingController<L: LocationProvider, D: DisplaySurface, S: SpeechSurface> {
    inbox: TrackerInbox,
    session: WalkSession,
    walk_id: Option<WalkId>,
    location: L,
    display: D,
    speech: S,
    data_manager: DataManager,
    voice: VoiceSettings,
}

impl<L: LocationProvider, D: DisplaySurface, S: SpeechSurface> TrackingController<L, D, S> {
    pub fn new(inbox: TrackerInbox, location: L, display: D, speech: S, data_manager: DataManager, voice: VoiceSettings) -> Self {
        Self {
            inbox,
            session: WalkSession::new(),
            walk_id: None,
            location,
            display,
            speech,
            data_manager,
            voice,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Tracking controller running");

        while let Some(command) = self.inbox.rx.recv().await {
            match command {
                TrackerCommand::LocationFixes(fixes) => self.ingest(fixes),
                TrackerCommand::ToggleTracking { counter, reply } => {
                    tracing::info!("Toggle request, counter: {}", counter);
                    self.toggle_tracking().await;
                    if reply.send(counter).is_err() {
                        tracing::warn!("Toggle {} was not waiting for a reply", counter);
                    }
                }
                TrackerCommand::Trash => self.trash().await,
                TrackerCommand::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }
                TrackerCommand::Shutdown => break,
            }
        }

        if self.session.is_active() {
            self.location.request_tracking(false);
            self.stop_walk().await;
        }

        tracing::info!("Tracking controller stopped");
    }

    async fn toggle_tracking(&mut self) {
        if self.session.is_active() {
            self.speak(STOP_ANNOUNCEMENT);
            self.location.request_tracking(false);
            self.stop_walk().await;
        } else {
            self.speak(START_ANNOUNCEMENT);
            self.start_walk().await;
            self.location.request_tracking(true);
        }

        self.update_display();
    }

    async fn start_walk(&mut self) {
        if let Err(err) = self.session.start() {
            tracing::warn!("Could not start walk: {}", err);
            return;
        }

        match self.data_manager.create_walk().await {
            Ok(walk_id) => self.walk_id = Some(walk_id),
            Err(err) => {
                tracing::error!("Failed to register walk: {err}");
                self.walk_id = None;
            }
        }
    }

    async fn stop_walk(&mut self) {
        if let Err(err) = self.session.stop(false) {
            tracing::warn!("Could not stop walk: {}", err);
            return;
        }

        let summary = RouteSummary::of(&self.session);
        tracing::info!("Walk finished: {} in {}", summary.distance_text(), summary.duration_text());

        if let Some(walk_id) = self.walk_id {
            if let Err(err) = self.data_manager.save_walk(walk_id, &self.session).await {
                tracing::error!("Failed to save walk {}: {err}", walk_id);
            }
        }
    }

    async fn trash(&mut self) {
        self.display.clear();

        if self.session.is_active() {
            self.location.request_tracking(false);
        }

        match self.session.stop(true) {
            Ok(()) => {}
            Err(WalkError::NoActiveSession) => tracing::debug!("Nothing to trash"),
            Err(err) => tracing::warn!("Could not trash walk: {}", err),
        }

        if let Some(walk_id) = self.walk_id.take() {
            if let Err(err) = self.data_manager.delete_walk(walk_id).await {
                tracing::error!("Failed to delete walk {}: {err}", walk_id);
            }
        }
    }

    fn ingest(&mut self, fixes: Vec<LocationFix>) {
        if !self.session.is_active() {
            tracing::debug!("Ignoring {} fixes while not tracking", fixes.len());
            return;
        }

        let received = fixes.len();
        let mut accepted = 0;
        for fix in fixes {
            let outcome = self.session.ingest(fix);
            if outcome.accepted() {
                accepted += 1;
            }

            match outcome {
                // Only center on the first fix, after that the region follows the route
                IngestOutcome::FirstFix => self.display.center_on(fix.coordinate()),
                IngestOutcome::Appended { delta } => {
                    tracing::debug!("Moved {:.1} m, total {:.1} m", delta, self.session.total_distance())
                }
                IngestOutcome::Rejected(reason) => tracing::debug!("Fix rejected: {:?}", reason),
            }
        }

        // Nothing new to draw
        if accepted == 0 {
            tracing::debug!("All {} fixes in batch rejected", received);
            return;
        }

        self.update_display();
    }

    fn update_display(&mut self) {
        let region = bounding_region(&self.session);
        let path = path(&self.session);
        self.display.show_route(region, &path);
    }

    fn speak(&mut self, text: &str) {
        self.speech.speak(Utterance::new(text, &self.voice));
    }

    fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            walk_id: self.walk_id,
            state: self.session.state(),
            fix_count: self.session.samples().len(),
            summary: RouteSummary::of(&self.session),
        }
    }
}
