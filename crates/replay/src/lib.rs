//! Scenario replay
//!
//! A scenario is a JSON document describing the frames a camera would
//! deliver, what each detector would return on each tick, and timed
//! environment events. [`run_scenario`] plays it through a real
//! [`ProctorSession`] and returns everything the sink received.

pub mod script;

use anyhow::{Context, Result};
use capability::DetectionMode;
use environment::{EnvironmentEvent, HostDirective};
use frame_capture::{QueuedFrameSource, VideoFrame};
use scoring::ScoreSummary;
use serde::{Deserialize, Serialize};
use session::{ProctorConfig, ProctorSession, Providers};
use signals::{CapabilityProvider, FaceBox, LandmarkMesh, ObjectPrediction};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use violation_model::SinkEvent;

pub use script::{DetectorScript, ScriptedProvider};

/// Install the global tracing subscriber. Logs go to stderr so stdout
/// carries only sink events.
pub fn init_logging(level: Level, json: bool) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set tracing subscriber")
}

/// One camera frame
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSpec {
    Solid { width: u32, height: u32, rgb: [u8; 3] },
    /// Image file, relative to the scenario file
    Image(PathBuf),
}

impl FrameSpec {
    fn load(&self, base: &Path) -> Result<VideoFrame> {
        match self {
            FrameSpec::Solid { width, height, rgb } => Ok(VideoFrame::solid(*width, *height, *rgb)),
            FrameSpec::Image(path) => {
                let path = base.join(path);
                VideoFrame::open(&path).with_context(|| format!("Failed to load frame {}", path.display()))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Offset from session start
    pub at_ms: u64,
    pub event: EnvironmentEvent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Session length in virtual time
    pub duration_ms: u64,
    /// Played one per tick; the last frame repeats
    pub frames: Vec<FrameSpec>,
    pub presence: Option<DetectorScript<Vec<FaceBox>>>,
    pub landmarks: Option<DetectorScript<Vec<LandmarkMesh>>>,
    pub objects: Option<DetectorScript<Vec<ObjectPrediction>>>,
    pub events: Vec<TimedEvent>,
    /// Directory image paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        let mut scenario: Scenario =
            serde_json::from_str(&text).with_context(|| format!("Invalid scenario {}", path.display()))?;
        scenario.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(scenario)
    }

    fn frame_source(&self) -> Result<QueuedFrameSource> {
        self.frames.iter().map(|spec| spec.load(&self.base_dir)).collect()
    }

    fn providers(&self) -> Providers {
        Providers {
            presence: scripted("presence", &self.presence),
            landmarks: scripted("landmarks", &self.landmarks),
            objects: scripted("objects", &self.objects),
        }
    }
}

fn scripted<T>(name: &'static str, script: &Option<DetectorScript<T>>) -> Option<Box<dyn CapabilityProvider<Output = T>>>
where
    T: Clone + Send + Sync + 'static,
{
    let script = script.clone()?;
    Some(Box::new(ScriptedProvider::new(name, script)))
}

/// Everything a replay produced
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub events: Vec<SinkEvent>,
    pub directives: Vec<HostDirective>,
    pub summary: ScoreSummary,
    pub final_mode: DetectionMode,
}

/// Play a scenario through a fresh session. Must run on a runtime with
/// paused time for the timings to be exact.
pub async fn run_scenario(config: ProctorConfig, scenario: &Scenario) -> Result<ReplayReport> {
    let frames = scenario.frame_source()?;
    let (sink_tx, mut sink_rx) = mpsc::unbounded_channel();
    let (directive_tx, mut directive_rx) = mpsc::unbounded_channel();
    let mut session = ProctorSession::new(config, frames, sink_tx)?
        .with_providers(scenario.providers())
        .with_directives(directive_tx);
    info!("Replaying {} events over {}ms", scenario.events.len(), scenario.duration_ms);

    let mut timeline = scenario.events.clone();
    timeline.sort_by_key(|e| e.at_ms);

    let (events_tx, events_rx) = mpsc::channel(timeline.len().max(1));
    let (stop_tx, stop_rx) = oneshot::channel();
    let start = Instant::now();
    let duration = Duration::from_millis(scenario.duration_ms);

    let driver = async move {
        for timed in timeline {
            sleep_until(start + Duration::from_millis(timed.at_ms)).await;
            if events_tx.send(timed.event).await.is_err() {
                break;
            }
        }
        sleep_until(start + duration).await;
        let _ = stop_tx.send(());
    };

    let (result, ()) = tokio::join!(session.run(events_rx, stop_rx), driver);
    result?;

    let mut events = Vec::new();
    while let Ok(event) = sink_rx.try_recv() {
        events.push(event);
    }
    let mut directives = Vec::new();
    while let Ok(directive) = directive_rx.try_recv() {
        directives.push(directive);
    }

    Ok(ReplayReport {
        events,
        directives,
        summary: session.summary(),
        final_mode: session.mode(),
    })
}
