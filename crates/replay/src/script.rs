//! Scripted capability providers

use async_trait::async_trait;
use frame_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use signals::{CapabilityProvider, Detector, SignalError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// What one detector does over a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorScript<T> {
    /// Number of `init` calls that fail before one succeeds
    pub fail_init: u32,
    /// Output per tick; the last entry repeats once the list runs out
    pub outputs: Vec<T>,
    /// 1-based ticks on which `detect` fails
    pub error_ticks: Vec<u64>,
}

impl<T> Default for DetectorScript<T> {
    fn default() -> Self {
        Self {
            fail_init: 0,
            outputs: Vec::new(),
            error_ticks: Vec::new(),
        }
    }
}

pub struct ScriptedProvider<T> {
    name: &'static str,
    script: DetectorScript<T>,
    attempts: AtomicU32,
}

impl<T> ScriptedProvider<T> {
    pub fn new(name: &'static str, script: DetectorScript<T>) -> Self {
        Self {
            name,
            script,
            attempts: AtomicU32::new(0),
        }
    }

    /// `init` calls so far
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<T> CapabilityProvider for ScriptedProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    async fn init(&self) -> Result<Box<dyn Detector<Output = T>>, SignalError> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt <= self.script.fail_init {
            return Err(SignalError::ModelLoad(format!(
                "{} model unavailable (scripted failure {})",
                self.name, attempt
            )));
        }
        Ok(Box::new(ScriptedDetector {
            name: self.name,
            outputs: self.script.outputs.iter().cloned().collect(),
            last: None,
            tick: 0,
            error_ticks: self.script.error_ticks.clone(),
        }))
    }
}

struct ScriptedDetector<T> {
    name: &'static str,
    outputs: VecDeque<T>,
    last: Option<T>,
    tick: u64,
    error_ticks: Vec<u64>,
}

#[async_trait]
impl<T> Detector for ScriptedDetector<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    async fn detect(&mut self, _frame: &VideoFrame) -> Result<T, SignalError> {
        self.tick += 1;
        if self.error_ticks.contains(&self.tick) {
            return Err(SignalError::Inference(format!("{} failed on tick {}", self.name, self.tick)));
        }
        if let Some(output) = self.outputs.pop_front() {
            self.last = Some(output);
        }
        self.last
            .clone()
            .ok_or_else(|| SignalError::InvalidOutput(format!("{} script has no outputs", self.name)))
    }

    fn release(&mut self) {
        debug!("Releasing scripted {} detector after {} ticks", self.name, self.tick);
    }
}
