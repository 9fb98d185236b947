//! Violation sink contract
//!
//! The core delivers each event once and never retries; what the sink does
//! with a failed delivery is its own business.

use tokio::sync::mpsc;

use crate::event::SinkEvent;

/// Receiver of reported violations and the one escalation event
pub trait ViolationSink {
    fn on_violation(&mut self, event: SinkEvent);
}

impl<F> ViolationSink for F
where
    F: FnMut(SinkEvent),
{
    fn on_violation(&mut self, event: SinkEvent) {
        self(event)
    }
}

impl ViolationSink for mpsc::UnboundedSender<SinkEvent> {
    fn on_violation(&mut self, event: SinkEvent) {
        // Receiver gone means the host stopped listening
        let _ = self.send(event);
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub events: Vec<SinkEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn escalations(&self) -> usize {
        self.events.iter().filter(|e| e.is_escalation()).count()
    }

    pub fn violations(&self) -> impl Iterator<Item = &crate::DetectionEvent> {
        self.events.iter().filter_map(SinkEvent::detection)
    }
}

impl ViolationSink for CollectingSink {
    fn on_violation(&mut self, event: SinkEvent) {
        self.events.push(event);
    }
}
