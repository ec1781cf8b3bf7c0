use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use walk_tracker_lib::comms::{CompanionChannel, Dictionary, LinkError, LinkMessage};

use crate::tracking_controller::TrackerHandle;

/// In-process stand-in for the wearable's link to the phone.
///
/// Requests are validated here and handed to the tracking controller. Reachability can be
/// switched off to mimic a phone out of Bluetooth range.
#[derive(Clone)]
pub struct LocalLink {
    tracker: TrackerHandle,
    reachable: Arc<AtomicBool>,
}

impl LocalLink {
    pub fn new(tracker: TrackerHandle) -> Self {
        Self {
            tracker,
            reachable: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }
}

#[async_trait::async_trait]
impl CompanionChannel for LocalLink {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }

    async fn send(&self, message: Dictionary) -> Result<Dictionary, LinkError> {
        if !self.is_reachable() {
            return Err(LinkError::Unreachable);
        }

        let counter = match LinkMessage::request_from_dictionary(&message)? {
            LinkMessage::ToggleTrackingRequest { counter } => counter,
            other => return Err(LinkError::Malformed(format!("phone cannot handle {other:?}"))),
        };

        let echoed = self.tracker.toggle(counter).await?;
        Ok(LinkMessage::ToggleTrackingReply { counter: echoed }.to_dictionary())
    }
}
