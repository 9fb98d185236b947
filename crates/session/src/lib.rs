//! Proctoring Session
//!
//! Owns every piece of per-session state and drives it from one
//! cooperative loop:
//! - Detection cadence: one frame per tick, fanned out to the live adapters
//! - Environment events from the host, with their debounce timers
//! - Capability retries on an exponential backoff
//!
//! Nothing is shared across sessions. Teardown runs exactly once on every
//! exit path.

pub mod config;
pub mod detection;
pub mod session;
pub mod status;

pub use config::{ProctorConfig, SessionConfig};
pub use detection::DetectionLoop;
pub use session::{ProctorSession, Providers};
pub use status::DetectionStatus;

use frame_capture::CaptureError;
use thiserror::Error;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Frame capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Session already torn down")]
    Closed,
}
