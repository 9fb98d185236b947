//! Session lifecycle and the cooperative event loop

use capability::{CapabilityKind, CapabilityRegistry, CapabilityStatus, DetectionMode};
use environment::{EnvironmentEvent, EnvironmentMonitor, HostDirective, MonitorOutput};
use frame_capture::FrameSource;
use scoring::{ScoreSummary, ScoringPipeline};
use signals::{CapabilityProvider, Detector, FaceBox, LandmarkMesh, ObjectPrediction};
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;
use violation_model::ViolationSink;

use crate::config::ProctorConfig;
use crate::detection::DetectionLoop;
use crate::status::DetectionStatus;
use crate::SessionError;

/// Async factories for the three capabilities. A missing provider leaves
/// its capability unloaded for the whole session.
#[derive(Default)]
pub struct Providers {
    pub presence: Option<Box<dyn CapabilityProvider<Output = Vec<FaceBox>>>>,
    pub landmarks: Option<Box<dyn CapabilityProvider<Output = Vec<LandmarkMesh>>>>,
    pub objects: Option<Box<dyn CapabilityProvider<Output = Vec<ObjectPrediction>>>>,
}

async fn acquire<T>(
    registry: &mut CapabilityRegistry,
    kind: CapabilityKind,
    provider: &dyn CapabilityProvider<Output = T>,
    retry: bool,
) -> Option<Box<dyn Detector<Output = T>>> {
    if retry {
        registry.retry(kind, || provider.init()).await
    } else {
        registry.load(kind, || provider.init()).await.ok()
    }
}

/// One proctoring session.
///
/// All state lives here and is only touched from [`ProctorSession::run`]
/// (or the step methods it calls), so nothing needs a lock.
pub struct ProctorSession {
    id: Uuid,
    config: ProctorConfig,
    registry: CapabilityRegistry,
    providers: Providers,
    detection: DetectionLoop,
    monitor: EnvironmentMonitor,
    pipeline: ScoringPipeline,
    frames: Box<dyn FrameSource + Send>,
    sink: Box<dyn ViolationSink + Send>,
    directives: Option<mpsc::UnboundedSender<HostDirective>>,
    status_tx: watch::Sender<DetectionStatus>,
    retry_at: BTreeMap<CapabilityKind, Instant>,
    started: bool,
    torn_down: bool,
}

impl ProctorSession {
    pub fn new(
        config: ProctorConfig,
        frames: impl FrameSource + Send + 'static,
        sink: impl ViolationSink + Send + 'static,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let id = Uuid::new_v4();
        let (status_tx, _) = watch::channel(DetectionStatus::default());
        info!("Creating proctoring session {}", id);

        Ok(Self {
            id,
            registry: CapabilityRegistry::new(config.capability.clone()),
            providers: Providers::default(),
            detection: DetectionLoop::new(&config.signals, config.fallback.clone()),
            monitor: EnvironmentMonitor::new(config.environment.clone()),
            pipeline: ScoringPipeline::new(id, config.scoring.clone()),
            frames: Box::new(frames),
            sink: Box::new(sink),
            directives: None,
            status_tx,
            retry_at: BTreeMap::new(),
            started: false,
            torn_down: false,
            config,
        })
    }

    pub fn with_providers(mut self, providers: Providers) -> Self {
        self.providers = providers;
        self
    }

    /// Channel for fullscreen requests and input suppression
    pub fn with_directives(mut self, tx: mpsc::UnboundedSender<HostDirective>) -> Self {
        self.directives = Some(tx);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ProctorConfig {
        &self.config
    }

    pub fn mode(&self) -> DetectionMode {
        self.registry.current_mode()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<DetectionMode> {
        self.registry.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<DetectionStatus> {
        self.status_tx.subscribe()
    }

    pub fn capability_status(&self, kind: CapabilityKind) -> Option<&CapabilityStatus> {
        self.registry.status(kind)
    }

    pub fn total(&self) -> u32 {
        self.pipeline.total()
    }

    pub fn is_escalated(&self) -> bool {
        self.pipeline.is_escalated()
    }

    pub fn summary(&self) -> ScoreSummary {
        self.pipeline.summary()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Arm the environment monitor and make the initial load attempt for
    /// every capability
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.torn_down {
            return Err(SessionError::Closed);
        }
        if self.started {
            return Ok(());
        }
        self.started = true;
        info!("Starting proctoring session {}", self.id);

        self.monitor.start(Instant::now());
        for kind in CapabilityKind::ALL {
            self.initialize(kind, false).await;
        }
        info!("Session {} running in {} detection mode", self.id, self.mode());
        Ok(())
    }

    async fn initialize(&mut self, kind: CapabilityKind, retry: bool) {
        let registry = &mut self.registry;
        let attached = match kind {
            CapabilityKind::Presence => match self.providers.presence.as_deref() {
                Some(provider) => acquire(registry, kind, provider, retry)
                    .await
                    .map(|detector| self.detection.attach_presence(detector))
                    .is_some(),
                None => false,
            },
            CapabilityKind::Landmarks => match self.providers.landmarks.as_deref() {
                Some(provider) => acquire(registry, kind, provider, retry)
                    .await
                    .map(|detector| self.detection.attach_landmarks(detector))
                    .is_some(),
                None => false,
            },
            CapabilityKind::Objects => match self.providers.objects.as_deref() {
                Some(provider) => acquire(registry, kind, provider, retry)
                    .await
                    .map(|detector| self.detection.attach_objects(detector))
                    .is_some(),
                None => false,
            },
        };

        self.retry_at.remove(&kind);
        if attached {
            return;
        }
        match self.registry.status(kind) {
            Some(status) if status.can_retry() => {
                let backoff = self.registry.backoff(kind);
                info!("Next {} retry in {:?}", kind, backoff);
                self.retry_at.insert(kind, Instant::now() + backoff);
            }
            Some(_) => {}
            None => {
                self.registry.register(kind);
                debug!("No provider for {}", kind);
            }
        }
    }

    /// Drive the session until `shutdown` resolves (or its sender is dropped),
    /// then tear down.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<EnvironmentEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<(), SessionError> {
        self.start().await?;

        let period = self.config.session.tick_interval();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut events_open = true;

        loop {
            let deadline = self.next_deadline();
            let timer = async move {
                match deadline {
                    Some(at) => time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Session {} shutting down", self.id);
                    break;
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.on_environment_event(event),
                    None => {
                        debug!("Environment channel closed");
                        events_open = false;
                    }
                },
                _ = timer => self.fire_due(Instant::now()).await,
                _ = ticker.tick() => self.tick().await,
            }
        }

        events.close();
        self.teardown();
        Ok(())
    }

    /// One detection tick. Never overlaps the next: the loop awaits it
    /// before polling the cadence timer again.
    pub async fn tick(&mut self) {
        if self.torn_down {
            return;
        }
        let mode = self.registry.current_mode();
        let confirmed = self.detection.tick(self.frames.as_mut(), mode).await;
        self.status_tx.send_replace(self.detection.status().clone());
        for event in confirmed {
            self.pipeline.deliver(event, self.sink.as_mut());
        }
    }

    pub fn on_environment_event(&mut self, event: EnvironmentEvent) {
        let output = self.monitor.handle(event, Instant::now());
        self.dispatch(output);
    }

    /// Fire due debounce timers and capability retries
    pub async fn fire_due(&mut self, now: Instant) {
        let output = self.monitor.fire_due(now);
        self.dispatch(output);

        let due: Vec<CapabilityKind> = self
            .retry_at
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(kind, _)| *kind)
            .collect();
        for kind in due {
            self.initialize(kind, true).await;
        }
    }

    fn dispatch(&mut self, output: MonitorOutput) {
        for violation in output.violations {
            self.pipeline.deliver(violation, self.sink.as_mut());
        }
        for directive in output.directives {
            debug!("Host directive: {:?}", directive);
            if let Some(tx) = &self.directives {
                let _ = tx.send(directive);
            }
        }
    }

    /// Earliest pending debounce timer or capability retry
    pub fn next_deadline(&self) -> Option<Instant> {
        let retry = self.retry_at.values().min().copied();
        match (self.monitor.next_deadline(), retry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Stop timers, cancel retries, release detectors. Safe to call any
    /// number of times; only the first call does anything.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.monitor.stop();
        self.retry_at.clear();
        self.detection.release();

        let summary = self.pipeline.summary();
        info!(
            "Session {} torn down: {} violations, trust debit {}, escalated: {}",
            self.id,
            summary.violations,
            summary.total,
            self.pipeline.is_escalated()
        );
    }
}

impl Drop for ProctorSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
