use capability::DetectionMode;
use environment::HostDirective;
use replay::{run_scenario, Scenario};
use session::ProctorConfig;
use std::path::Path;
use violation_model::{SinkEvent, ViolationKind};

fn kinds(events: &[SinkEvent]) -> Vec<ViolationKind> {
    events.iter().filter_map(SinkEvent::detection).map(|d| d.kind()).collect()
}

#[tokio::test(start_paused = true)]
async fn bundled_scenario_replays() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/tab_switch_then_fullscreen_exit.json");
    let scenario = Scenario::from_file(&path).unwrap();
    let report = run_scenario(ProctorConfig::default(), &scenario).await.unwrap();

    let reported = kinds(&report.events);
    for kind in [
        ViolationKind::TabSwitch,
        ViolationKind::SuspiciousObject,
        ViolationKind::FullscreenExit,
        ViolationKind::NoFaceDetected,
        ViolationKind::BlockedKey,
        ViolationKind::RightClick,
    ] {
        assert_eq!(reported.iter().filter(|k| **k == kind).count(), 1, "{kind}");
    }
    assert_eq!(reported.len(), 6);

    // tab switch alone reaches the threshold
    assert!(report.events[1].is_escalation());
    assert_eq!(report.events.iter().filter(|e| e.is_escalation()).count(), 1);

    assert_eq!(report.summary.total, 65);
    assert_eq!(report.final_mode, DetectionMode::Basic);
    // ctrl+c and the context menu are both suppressed; everything else re-asserts fullscreen
    let suppressed = report
        .directives
        .iter()
        .filter(|d| **d == HostDirective::SuppressNativeAction)
        .count();
    assert_eq!(suppressed, 2);
    assert!(report.directives.contains(&HostDirective::RequestFullscreen));
}

#[tokio::test(start_paused = true)]
async fn dark_camera_without_models_uses_fallback() {
    let scenario: Scenario = serde_json::from_str(
        r#"{
            "duration_ms": 10000,
            "frames": [{ "solid": { "width": 16, "height": 16, "rgb": [0, 0, 0] } }]
        }"#,
    )
    .unwrap();
    let report = run_scenario(ProctorConfig::default(), &scenario).await.unwrap();

    let details: Vec<_> = report
        .events
        .iter()
        .filter_map(SinkEvent::detection)
        .map(|d| d.details().to_string())
        .collect();
    assert_eq!(details, vec!["No face visible (fallback detection)"; 2]);
    assert_eq!(report.final_mode, DetectionMode::Manual);
}

#[tokio::test(start_paused = true)]
async fn touch_host_ignores_context_menu() {
    let scenario: Scenario = serde_json::from_str(
        r#"{
            "duration_ms": 2000,
            "events": [
                { "at_ms": 100, "event": { "type": "context_menu" } },
                { "at_ms": 200, "event": { "type": "visibility_changed", "hidden": true } }
            ]
        }"#,
    )
    .unwrap();
    let mut config = ProctorConfig::default();
    config.environment.desktop_controls = false;
    let report = run_scenario(config, &scenario).await.unwrap();

    assert_eq!(kinds(&report.events), vec![ViolationKind::TabSwitch]);
    assert!(report.directives.is_empty());
}

#[test]
fn missing_scenario_file_is_reported() {
    let err = Scenario::from_file(Path::new("/nonexistent/scenario.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read scenario"));
}
