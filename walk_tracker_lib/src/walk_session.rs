use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{geodesy::haversine_distance, location_fix::LocationFix};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WalkError {
    #[error("a walk is already being tracked")]
    AlreadyActive,
    #[error("no walk has been started")]
    NoActiveSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkState {
    /// Never started
    Idle,
    Active,
    Closed,
    /// Trashed. Data is cleared and a new walk can be started.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidAccuracy,
    /// Latitude or longitude is not a number or out of range
    InvalidPosition,
    NotTracking,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    /// The first fix of the walk was accepted. The display should center on it.
    FirstFix,
    Appended { delta: f64 },
    Rejected(RejectReason),
}

impl IngestOutcome {
    pub fn accepted(&self) -> bool {
        !matches!(self, IngestOutcome::Rejected(_))
    }
}

/// One continuous tracked outing.
///
/// The owner of a `WalkSession` is the only writer: every mutation takes `&mut self`,
/// so fixes must be funnelled through whatever owns the instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkSession {
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    total_distance: f64,
    samples: Vec<LocationFix>,
    state: WalkState,
}

impl Default for WalkSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkSession {
    pub fn new() -> Self {
        Self {
            started_at: None,
            ended_at: None,
            total_distance: 0.,
            samples: Vec::new(),
            state: WalkState::Idle,
        }
    }

    pub fn start(&mut self) -> Result<(), WalkError> {
        self.start_at(Utc::now())
    }

    pub fn start_at(&mut self, now: DateTime<Utc>) -> Result<(), WalkError> {
        if self.state == WalkState::Active {
            return Err(WalkError::AlreadyActive);
        }

        self.samples.clear();
        self.total_distance = 0.;
        self.started_at = Some(now);
        self.ended_at = None;
        self.state = WalkState::Active;

        tracing::info!("Walk started at {}", now);
        Ok(())
    }

    pub fn ingest(&mut self, fix: LocationFix) -> IngestOutcome {
        if self.state != WalkState::Active {
            return IngestOutcome::Rejected(RejectReason::NotTracking);
        }

        if !fix.has_valid_accuracy() {
            tracing::debug!("Dropping fix with accuracy {}", fix.horizontal_accuracy);
            return IngestOutcome::Rejected(RejectReason::InvalidAccuracy);
        }

        if !fix.has_valid_position() {
            tracing::warn!("Dropping fix at {}, {}", fix.latitude(), fix.longitude());
            return IngestOutcome::Rejected(RejectReason::InvalidPosition);
        }

        let outcome = match self.samples.last() {
            Some(last) => {
                let delta = haversine_distance(last.coordinate(), fix.coordinate());
                self.total_distance += delta;
                IngestOutcome::Appended { delta }
            }
            None => IngestOutcome::FirstFix,
        };

        self.samples.push(fix);
        outcome
    }

    /// Closes the walk, or trashes it when `discard` is set.
    /// Stopping an already stopped walk does nothing.
    pub fn stop(&mut self, discard: bool) -> Result<(), WalkError> {
        self.stop_at(discard, Utc::now())
    }

    pub fn stop_at(&mut self, discard: bool, now: DateTime<Utc>) -> Result<(), WalkError> {
        match (self.state, discard) {
            (WalkState::Idle, _) => Err(WalkError::NoActiveSession),
            (WalkState::Discarded, _) | (WalkState::Closed, false) => Ok(()),
            (WalkState::Active | WalkState::Closed, true) => {
                self.samples.clear();
                self.total_distance = 0.;
                self.state = WalkState::Discarded;
                tracing::info!("Walk discarded");
                Ok(())
            }
            (WalkState::Active, false) => {
                // Never before the start, even if the wall clock jumped back
                let end = self.started_at.map_or(now, |start| now.max(start));
                self.ended_at = Some(end);
                self.state = WalkState::Closed;
                tracing::info!("Walk closed after {:.1} m and {} fixes", self.total_distance, self.samples.len());
                Ok(())
            }
        }
    }

    pub fn duration(&self) -> Result<TimeDelta, WalkError> {
        self.duration_at(Utc::now())
    }

    pub fn duration_at(&self, now: DateTime<Utc>) -> Result<TimeDelta, WalkError> {
        let start = match (self.state, self.started_at) {
            (WalkState::Active | WalkState::Closed, Some(start)) => start,
            _ => return Err(WalkError::NoActiveSession),
        };

        Ok(self.ended_at.unwrap_or(now) - start)
    }

    pub fn is_active(&self) -> bool {
        self.state == WalkState::Active
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Meters walked so far
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn samples(&self) -> &[LocationFix] {
        &self.samples
    }
}
