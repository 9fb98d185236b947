//! Capability registry implementation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{CapabilityError, CapabilityKind, DetectionMode};

/// Retry policy for capability initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Retries allowed after the initial attempt (default: 3)
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub retry_backoff_ms: u64,
    /// Upper bound for the doubled backoff
    pub max_backoff_ms: u64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_ms: 3000,
            max_backoff_ms: 30_000,
        }
    }
}

/// Load state of one capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityStatus {
    pub capability: CapabilityKind,
    pub loaded: bool,
    /// Retries consumed so far (the initial attempt is not counted)
    pub retries: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    /// Set once the retry budget is spent without success
    pub unavailable: bool,
}

impl CapabilityStatus {
    fn new(capability: CapabilityKind, max_retries: u32) -> Self {
        Self {
            capability,
            loaded: false,
            retries: 0,
            max_retries,
            last_error: None,
            unavailable: false,
        }
    }

    /// Whether another retry may still be attempted
    pub fn can_retry(&self) -> bool {
        !self.loaded && !self.unavailable && self.retries < self.max_retries
    }
}

/// Owns every [`CapabilityStatus`] of a session.
///
/// The detection mode is recomputed after each status change and published
/// on a watch channel.
pub struct CapabilityRegistry {
    config: CapabilityConfig,
    statuses: BTreeMap<CapabilityKind, CapabilityStatus>,
    mode_tx: watch::Sender<DetectionMode>,
}

impl CapabilityRegistry {
    pub fn new(config: CapabilityConfig) -> Self {
        let (mode_tx, _) = watch::channel(DetectionMode::Manual);
        Self {
            config,
            statuses: BTreeMap::new(),
            mode_tx,
        }
    }

    /// Register a capability; registering twice returns the existing status
    pub fn register(&mut self, capability: CapabilityKind) -> &CapabilityStatus {
        let max_retries = self.config.max_retries;
        self.statuses.entry(capability).or_insert_with(|| {
            debug!("Registered capability {}", capability);
            CapabilityStatus::new(capability, max_retries)
        })
    }

    pub fn mark_loaded(&mut self, capability: CapabilityKind) {
        self.status_mut(capability).loaded = true;
        info!("Capability {} loaded", capability);
        self.refresh_mode();
    }

    /// Record a failure. Returns whether a retry should be scheduled.
    pub fn mark_failed(&mut self, capability: CapabilityKind, error: impl Display) -> bool {
        let status = self.status_mut(capability);
        status.loaded = false;
        status.last_error = Some(error.to_string());

        let should_retry = status.retries < status.max_retries;
        if !should_retry {
            status.unavailable = true;
            error!(
                "Capability {} failed after {} retries, excluding it from detection",
                capability, status.max_retries
            );
        } else {
            warn!("Capability {} failed: {}", capability, error);
        }
        self.refresh_mode();
        should_retry
    }

    /// Initial load attempt
    pub async fn load<F, Fut, T, E>(&mut self, capability: CapabilityKind, init: F) -> Result<T, CapabilityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if self.register(capability).unavailable {
            return Err(CapabilityError::RetryBudgetExhausted(capability));
        }
        info!("Initializing capability {}", capability);
        match init().await {
            Ok(value) => {
                self.mark_loaded(capability);
                Ok(value)
            }
            Err(e) => {
                let reason = e.to_string();
                self.mark_failed(capability, &reason);
                Err(CapabilityError::InitFailed { capability, reason })
            }
        }
    }

    /// One retry of a failed capability.
    ///
    /// No-op (returns `None`) if the capability is already loaded or its
    /// budget is spent. Exhausting the budget marks it permanently unavailable.
    pub async fn retry<F, Fut, T, E>(&mut self, capability: CapabilityKind, init: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let status = self.register(capability);
        if !status.can_retry() {
            debug!("Skipping retry of {}: loaded={} retries={}", capability, status.loaded, status.retries);
            return None;
        }

        let status = self.status_mut(capability);
        status.retries += 1;
        let attempt = status.retries;
        let max = status.max_retries;
        info!("Retrying {} initialization (attempt {}/{})", capability, attempt, max);

        match init().await {
            Ok(value) => {
                info!("Capability {} initialized on retry {}", capability, attempt);
                self.mark_loaded(capability);
                Some(value)
            }
            Err(e) => {
                warn!("Capability {} retry {} failed: {}", capability, attempt, e);
                self.mark_failed(capability, e);
                None
            }
        }
    }

    /// Delay before the next retry of `capability`, doubling per retry spent
    pub fn backoff(&self, capability: CapabilityKind) -> Duration {
        let retries = self.statuses.get(&capability).map(|s| s.retries).unwrap_or(0);
        let factor = 1u64 << retries.min(16);
        let ms = self
            .config
            .retry_backoff_ms
            .saturating_mul(factor)
            .min(self.config.max_backoff_ms);
        Duration::from_millis(ms)
    }

    pub fn status(&self, capability: CapabilityKind) -> Option<&CapabilityStatus> {
        self.statuses.get(&capability)
    }

    pub fn statuses(&self) -> impl Iterator<Item = &CapabilityStatus> {
        self.statuses.values()
    }

    pub fn is_loaded(&self, capability: CapabilityKind) -> bool {
        self.statuses.get(&capability).is_some_and(|s| s.loaded)
    }

    pub fn loaded_count(&self) -> usize {
        self.statuses.values().filter(|s| s.loaded).count()
    }

    /// Mode derived from the loaded-capability count
    pub fn current_mode(&self) -> DetectionMode {
        DetectionMode::from_loaded_count(self.loaded_count())
    }

    /// Observe mode transitions
    pub fn subscribe(&self) -> watch::Receiver<DetectionMode> {
        self.mode_tx.subscribe()
    }

    /// Forget every status; only for a full session restart
    pub fn reset(&mut self) {
        self.statuses.clear();
        self.refresh_mode();
    }

    fn status_mut(&mut self, capability: CapabilityKind) -> &mut CapabilityStatus {
        let max_retries = self.config.max_retries;
        self.statuses
            .entry(capability)
            .or_insert_with(|| CapabilityStatus::new(capability, max_retries))
    }

    fn refresh_mode(&mut self) {
        let mode = self.current_mode();
        let changed = self.mode_tx.send_if_modified(|current| {
            if *current != mode {
                *current = mode;
                true
            } else {
                false
            }
        });
        if changed {
            match mode {
                DetectionMode::Full => info!("Detection mode: FULL - all capabilities active"),
                DetectionMode::Basic => warn!("Detection mode: BASIC - limited detection active"),
                DetectionMode::Manual => warn!("Detection mode: MANUAL - environment monitoring and heuristics only"),
            }
        }
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new(CapabilityConfig::default())
    }
}
