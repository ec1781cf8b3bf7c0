use crate::comms::{CompanionChannel, LinkError, LinkMessage};

/// The wearable side of the link: a start/stop button that asks the phone to toggle tracking.
pub struct WearableRemote<C: CompanionChannel> {
    channel: C,
    counter: i64,
}

impl<C: CompanionChannel> WearableRemote<C> {
    pub fn new(channel: C) -> Self {
        Self { channel, counter: 0 }
    }

    /// Number of presses sent so far
    pub fn counter(&self) -> i64 {
        self.counter
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Asks the phone to toggle tracking and returns the counter it echoed.
    ///
    /// Nothing is retried. Replies are not matched against requests, so if several presses
    /// are in flight at once the caller only learns each reply's own counter.
    pub async fn toggle(&mut self) -> Result<i64, LinkError> {
        if !self.channel.is_reachable() {
            tracing::warn!("Phone not reachable, counter: {}", self.counter);
            return Err(LinkError::Unreachable);
        }

        self.counter += 1;
        let request = LinkMessage::ToggleTrackingRequest { counter: self.counter };

        let reply = match self.channel.send(request.to_dictionary()).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!("Toggle {} failed: {}", self.counter, err);
                return Err(err);
            }
        };

        match LinkMessage::reply_from_dictionary(&reply)? {
            LinkMessage::ToggleTrackingReply { counter } => {
                if counter != self.counter {
                    tracing::warn!("Reply echoed counter {} while {} is the latest press", counter, self.counter);
                }
                tracing::info!("Phone acknowledged toggle {}", counter);
                Ok(counter)
            }
            other => Err(LinkError::Malformed(format!("unexpected reply {other:?}"))),
        }
    }
}
