//! Consecutive-count filter for noisy per-frame signals

use serde::{Deserialize, Serialize};
use tracing::debug;
use violation_model::DetectionEvent;

use crate::SignalConfig;

/// Signals that need consecutive confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoisySignal {
    NoFace,
    LookingAway,
    EyesClosed,
}

/// A raw observation on its way to becoming a reported violation
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// Observation supporting the signal; carries the event to report once confirmed
    Confirming(NoisySignal, DetectionEvent),
    /// Observation against the signal; resets its counter
    Contrary(NoisySignal),
    /// Discrete, low-noise event reported without debounce
    Immediate(DetectionEvent),
}

/// Per-signal consecutive counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsecutiveCounters {
    pub no_face: u32,
    pub looking_away: u32,
    pub eyes_closed: u32,
}

impl ConsecutiveCounters {
    fn get_mut(&mut self, signal: NoisySignal) -> &mut u32 {
        match signal {
            NoisySignal::NoFace => &mut self.no_face,
            NoisySignal::LookingAway => &mut self.looking_away,
            NoisySignal::EyesClosed => &mut self.eyes_closed,
        }
    }

    pub fn get(&self, signal: NoisySignal) -> u32 {
        match signal {
            NoisySignal::NoFace => self.no_face,
            NoisySignal::LookingAway => self.looking_away,
            NoisySignal::EyesClosed => self.eyes_closed,
        }
    }
}

/// Turns candidates into reported events.
///
/// `no_face` keeps reporting on every further zero-face tick once confirmed;
/// `looking_away` and `eyes_closed` start counting again after each report.
#[derive(Debug, Clone)]
pub struct ConsecutiveFilter {
    counters: ConsecutiveCounters,
    no_face_threshold: u32,
    looking_away_threshold: u32,
    eyes_closed_threshold: u32,
}

impl ConsecutiveFilter {
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            counters: ConsecutiveCounters::default(),
            no_face_threshold: config.no_face_consecutive.max(1),
            looking_away_threshold: config.looking_away_consecutive.max(1),
            eyes_closed_threshold: config.eyes_closed_consecutive.max(1),
        }
    }

    fn threshold(&self, signal: NoisySignal) -> u32 {
        match signal {
            NoisySignal::NoFace => self.no_face_threshold,
            NoisySignal::LookingAway => self.looking_away_threshold,
            NoisySignal::EyesClosed => self.eyes_closed_threshold,
        }
    }

    /// Feed one candidate; returns the event if it is now reportable
    pub fn admit(&mut self, candidate: Candidate) -> Option<DetectionEvent> {
        match candidate {
            Candidate::Immediate(event) => Some(event),
            Candidate::Contrary(signal) => {
                let counter = self.counters.get_mut(signal);
                if *counter > 0 {
                    debug!("{:?} counter reset after {} tick(s)", signal, counter);
                }
                *counter = 0;
                None
            }
            Candidate::Confirming(signal, event) => {
                let threshold = self.threshold(signal);
                let counter = self.counters.get_mut(signal);
                *counter += 1;
                if *counter < threshold {
                    debug!("{:?} candidate {}/{} absorbed", signal, counter, threshold);
                    return None;
                }
                if signal != NoisySignal::NoFace {
                    *counter = 0;
                }
                Some(event)
            }
        }
    }

    pub fn counters(&self) -> ConsecutiveCounters {
        self.counters
    }

    pub fn reset(&mut self) {
        self.counters = ConsecutiveCounters::default();
    }
}
