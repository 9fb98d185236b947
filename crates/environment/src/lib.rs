//! Environment Event Monitor
//!
//! Turns host environment notifications into detection events. Runs
//! independently of the video pipeline and keeps its own debounce timers,
//! keyed by what they guard, so a confirming notification (focus regained,
//! mouse back in the viewport) can cancel the pending report.

pub mod event;
pub mod keys;
pub mod monitor;
pub mod timers;

pub use event::{EnvironmentEvent, KeyPress};
pub use keys::{BlockedKeys, KeyCombo};
pub use monitor::{EnvironmentConfig, EnvironmentMonitor, HostDirective, MonitorOutput};
pub use timers::{DebounceTimers, TimerKey};
