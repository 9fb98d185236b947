//! Session configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML/JSON file, then `PROCTOR__SECTION__FIELD` environment variables.

use capability::CapabilityConfig;
use environment::EnvironmentConfig;
use fallback::FallbackConfig;
use scoring::ScoringPolicy;
use serde::{Deserialize, Serialize};
use signals::SignalConfig;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::ConfigError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PROCTOR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Detection cadence in milliseconds (default: 3000)
    pub tick_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { tick_interval_ms: 3000 }
    }
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Every tunable of a proctoring session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProctorConfig {
    pub session: SessionConfig,
    pub signals: SignalConfig,
    pub fallback: FallbackConfig,
    pub environment: EnvironmentConfig,
    pub scoring: ScoringPolicy,
    pub capability: CapabilityConfig,
}

impl ProctorConfig {
    /// Load from an optional file plus environment overrides, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: ProctorConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("session.tick_interval_ms must be positive".into()));
        }

        let consecutive = [
            ("no_face_consecutive", self.signals.no_face_consecutive),
            ("looking_away_consecutive", self.signals.looking_away_consecutive),
            ("eyes_closed_consecutive", self.signals.eyes_closed_consecutive),
        ];
        for (name, value) in consecutive {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("signals.{} must be at least 1", name)));
            }
        }

        if self.scoring.escalation_threshold == 0 {
            return Err(ConfigError::Invalid("scoring.escalation_threshold must be positive".into()));
        }

        if self.fallback.min_brightness >= self.fallback.max_brightness {
            return Err(ConfigError::Invalid(format!(
                "fallback brightness band is empty ({} >= {})",
                self.fallback.min_brightness, self.fallback.max_brightness
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ProctorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.tick_interval(), Duration::from_secs(3));
        assert_eq!(config.scoring.escalation_threshold, 10);
    }

    #[test]
    fn test_rejects_zero_tick() {
        let mut config = ProctorConfig::default();
        config.session.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_consecutive() {
        let mut config = ProctorConfig::default();
        config.signals.eyes_closed_consecutive = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("eyes_closed_consecutive"));
    }

    #[test]
    fn test_rejects_inverted_brightness_band() {
        let mut config = ProctorConfig::default();
        config.fallback.min_brightness = 200.0;
        config.fallback.max_brightness = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_toml_file() {
        let path = std::env::temp_dir().join(format!("proctor-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[session]\ntick_interval_ms = 1500\n\n[scoring]\nsevere_weight = 8\n\n[scoring.weights]\nright_click = 6\n\n[environment]\ndesktop_controls = false"
        )
        .unwrap();
        drop(file);

        let config = ProctorConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.session.tick_interval_ms, 1500);
        assert_eq!(config.scoring.severe_weight, 8);
        assert_eq!(config.scoring.weight(violation_model::ViolationKind::RightClick), 6);
        assert_eq!(config.scoring.weight(violation_model::ViolationKind::FullscreenExit), 20);
        assert!(!config.environment.desktop_controls);
        assert_eq!(config.signals.no_face_consecutive, 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("proctor-does-not-exist.toml");
        assert!(matches!(ProctorConfig::load(Some(&path)), Err(ConfigError::Load(_))));
    }
}
