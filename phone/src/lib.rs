pub mod config;
pub mod link;
pub mod location_provider;
pub mod surfaces;
pub mod tracking_controller;

/// Commands waiting for the tracking controller before senders have to wait
pub const TRACKER_QUEUE_CAPACITY: usize = 100;
