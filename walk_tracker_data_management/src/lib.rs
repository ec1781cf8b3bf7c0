use thiserror::Error;

pub mod gpx_util;
mod data_manager;

pub use data_manager::*;

pub type WalkId = i64;

#[derive(Debug, Error)]
pub enum DataManagerError {
    #[error("no walk with id {0}")]
    UnknownWalk(WalkId),
    #[error("gpx error: {0}")]
    Gpx(String),
    #[error("io error: {0}")]
    Io(String),
}
