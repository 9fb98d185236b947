//! Environment monitor state machine

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use violation_model::{DetectionEvent, Severity, ViolationKind};

use crate::event::EnvironmentEvent;
use crate::keys::BlockedKeys;
use crate::timers::{DebounceTimers, TimerKey};

/// Environment monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Window must stay unfocused this long after a blur (ms)
    pub focus_grace_ms: u64,
    /// Blurs within this window after a focus report are ignored (ms)
    pub focus_cooldown_ms: u64,
    /// Mouse must still be outside after this long (ms)
    pub mouse_grace_ms: u64,
    /// Absence longer than this, measured on return, is reported again (ms)
    pub mouse_extended_ms: u64,
    /// Delay before the first fullscreen request (ms)
    pub fullscreen_initial_ms: u64,
    /// Delay before the corrective request after an exit (ms)
    pub fullscreen_reentry_ms: u64,
    /// Period of the fullscreen re-assertion while not fullscreen (ms)
    pub fullscreen_reassert_ms: u64,
    /// A window narrower than the screen by more than this counts as minimized (px)
    pub minimize_width_margin: u32,
    /// Watch fullscreen, resize, mouse and keyboard. Off for touch hosts.
    pub desktop_controls: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            focus_grace_ms: 5000,
            focus_cooldown_ms: 10_000,
            mouse_grace_ms: 2000,
            mouse_extended_ms: 3000,
            fullscreen_initial_ms: 1000,
            fullscreen_reentry_ms: 100,
            fullscreen_reassert_ms: 3000,
            minimize_width_margin: 100,
            desktop_controls: true,
        }
    }
}

/// Side effects the host should carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostDirective {
    /// Swallow the native action of the input that was just reported
    SuppressNativeAction,
    /// Ask the host to enter fullscreen
    RequestFullscreen,
}

/// Result of handling one event or firing due timers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorOutput {
    pub violations: Vec<DetectionEvent>,
    pub directives: Vec<HostDirective>,
}

impl MonitorOutput {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty() && self.directives.is_empty()
    }

    fn extend(&mut self, other: MonitorOutput) {
        self.violations.extend(other.violations);
        self.directives.extend(other.directives);
    }
}

/// Converts environment notifications into detection events
pub struct EnvironmentMonitor {
    config: EnvironmentConfig,
    blocked_keys: BlockedKeys,
    timers: DebounceTimers<TimerKey>,
    active: bool,
    page_hidden: bool,
    focused: bool,
    fullscreen: bool,
    minimized: bool,
    tab_switches: u32,
    last_focus_report: Option<Instant>,
    mouse_left_at: Option<Instant>,
}

impl EnvironmentMonitor {
    pub fn new(config: EnvironmentConfig) -> Self {
        Self {
            config,
            blocked_keys: BlockedKeys::default(),
            timers: DebounceTimers::new(),
            active: false,
            page_hidden: false,
            focused: true,
            fullscreen: false,
            minimized: false,
            tab_switches: 0,
            last_focus_report: None,
            mouse_left_at: None,
        }
    }

    /// Begin monitoring. Arms the initial fullscreen request on desktop hosts.
    pub fn start(&mut self, now: Instant) {
        if self.active {
            return;
        }
        self.active = true;
        if self.config.desktop_controls {
            self.timers.schedule(
                TimerKey::FullscreenReassert,
                now + Duration::from_millis(self.config.fullscreen_initial_ms),
            );
        }
        info!("Environment monitor started (desktop controls: {})", self.config.desktop_controls);
    }

    /// Cancel every pending timer and ignore further events
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.timers.clear();
        self.mouse_left_at = None;
        info!("Environment monitor stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn tab_switch_count(&self) -> u32 {
        self.tab_switches
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn handle(&mut self, event: EnvironmentEvent, now: Instant) -> MonitorOutput {
        let mut out = MonitorOutput::default();
        if !self.active {
            return out;
        }
        if event.is_desktop_only() && !self.config.desktop_controls {
            debug!("Ignoring desktop-only event on touch host: {:?}", event);
            return out;
        }

        match event {
            EnvironmentEvent::VisibilityChanged { hidden } => {
                self.page_hidden = hidden;
                if hidden {
                    self.tab_switches += 1;
                    out.violations.push(DetectionEvent::new(
                        ViolationKind::TabSwitch,
                        format!("Student switched tabs (Total: {})", self.tab_switches),
                    ));
                }
            }
            EnvironmentEvent::WindowBlur => self.on_blur(now),
            EnvironmentEvent::WindowFocus => {
                self.focused = true;
                if self.timers.cancel(TimerKey::FocusLoss) {
                    debug!("Focus regained, pending focus-loss report cancelled");
                }
            }
            EnvironmentEvent::FullscreenChanged { fullscreen } => {
                self.fullscreen = fullscreen;
                // Gated on a prior tab switch so entering fullscreen for the first time never reports
                if !fullscreen && self.tab_switches > 0 {
                    out.violations.push(DetectionEvent::new(
                        ViolationKind::FullscreenExit,
                        "Exited fullscreen mode",
                    ));
                    self.timers.schedule(
                        TimerKey::FullscreenReentry,
                        now + Duration::from_millis(self.config.fullscreen_reentry_ms),
                    );
                }
            }
            EnvironmentEvent::Resized {
                outer_width,
                screen_width,
                hidden,
            } => {
                let minimized = hidden || outer_width.saturating_add(self.config.minimize_width_margin) < screen_width;
                if minimized && !self.minimized {
                    out.violations.push(DetectionEvent::new(
                        ViolationKind::WindowMinimized,
                        "Window minimized or resized - potential cheating",
                    ));
                }
                self.minimized = minimized;
            }
            EnvironmentEvent::MouseLeave => {
                if self.mouse_left_at.is_none() {
                    self.mouse_left_at = Some(now);
                    self.timers.schedule(
                        TimerKey::MouseAway,
                        now + Duration::from_millis(self.config.mouse_grace_ms),
                    );
                }
            }
            EnvironmentEvent::MouseEnter => {
                if let Some(left_at) = self.mouse_left_at.take() {
                    self.timers.cancel(TimerKey::MouseAway);
                    let away = now.saturating_duration_since(left_at);
                    if away > Duration::from_millis(self.config.mouse_extended_ms) {
                        out.violations.push(DetectionEvent::with_severity(
                            ViolationKind::MouseLeft,
                            Severity::High,
                            format!("Mouse away for {}s", away.as_secs_f64().round()),
                        ));
                    }
                }
            }
            EnvironmentEvent::KeyDown(press) => {
                if self.blocked_keys.is_blocked(&press) {
                    out.violations.push(DetectionEvent::new(
                        ViolationKind::BlockedKey,
                        format!("Attempted blocked action: {}", press),
                    ));
                    out.directives.push(HostDirective::SuppressNativeAction);
                }
            }
            EnvironmentEvent::ContextMenu => {
                out.violations.push(DetectionEvent::new(ViolationKind::RightClick, "Right-click attempted"));
                out.directives.push(HostDirective::SuppressNativeAction);
            }
        }

        for violation in &out.violations {
            warn!("Environment violation: {} - {}", violation.kind(), violation.details());
        }
        out
    }

    fn on_blur(&mut self, now: Instant) {
        self.focused = false;
        self.timers.cancel(TimerKey::FocusLoss);

        let cooldown = Duration::from_millis(self.config.focus_cooldown_ms);
        if let Some(last) = self.last_focus_report {
            if now.saturating_duration_since(last) < cooldown {
                debug!("Skipping blur within cooldown of the last focus-loss report");
                return;
            }
        }
        self.timers.schedule(
            TimerKey::FocusLoss,
            now + Duration::from_millis(self.config.focus_grace_ms),
        );
    }

    /// Fire every timer due at `now`
    pub fn fire_due(&mut self, now: Instant) -> MonitorOutput {
        let mut out = MonitorOutput::default();
        if !self.active {
            return out;
        }
        for key in self.timers.take_due(now) {
            out.extend(self.fire(key, now));
        }
        out
    }

    fn fire(&mut self, key: TimerKey, now: Instant) -> MonitorOutput {
        let mut out = MonitorOutput::default();
        match key {
            TimerKey::FocusLoss => {
                // A hidden page was already reported as a tab switch
                if !self.focused && !self.page_hidden {
                    self.last_focus_report = Some(now);
                    warn!("Window focus lost for more than {}ms", self.config.focus_grace_ms);
                    out.violations.push(DetectionEvent::new(
                        ViolationKind::WindowLostFocus,
                        "Window lost focus for extended period",
                    ));
                } else {
                    debug!("Focus loss was temporary");
                }
            }
            TimerKey::MouseAway => {
                if self.mouse_left_at.is_some() {
                    warn!("Mouse still outside the exam window");
                    out.violations.push(DetectionEvent::new(ViolationKind::MouseLeft, "Mouse left exam window"));
                }
            }
            TimerKey::FullscreenReentry => {
                if !self.fullscreen {
                    out.directives.push(HostDirective::RequestFullscreen);
                }
            }
            TimerKey::FullscreenReassert => {
                if !self.fullscreen {
                    out.directives.push(HostDirective::RequestFullscreen);
                }
                self.timers.schedule(
                    TimerKey::FullscreenReassert,
                    now + Duration::from_millis(self.config.fullscreen_reassert_ms),
                );
            }
        }
        out
    }
}

impl Default for EnvironmentMonitor {
    fn default() -> Self {
        Self::new(EnvironmentConfig::default())
    }
}
