use std::path::PathBuf;
use std::time::Duration;

use crate::blurring::domain::blur_intensity::BlurIntensity;
use crate::shared::constants::{
    CHANNEL_CAPACITY, FINAL_FRAME_HOLD, KEY_POLL_WAIT, MONITOR_POLL_INTERVAL, WINDOW_NAME,
    WORKER_GRACE_PERIOD, WORKER_KILL_TIMEOUT,
};

/// What to process and how to redact it. Fixed for the lifetime of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub video_path: PathBuf,
    pub enable_blur: bool,
    pub blur_intensity: BlurIntensity,
}

impl PipelineConfig {
    pub fn new(video_path: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
            enable_blur: true,
            blur_intensity: BlurIntensity::default(),
        }
    }

    pub fn with_blur(mut self, enable_blur: bool) -> Self {
        self.enable_blur = enable_blur;
        self
    }

    pub fn with_intensity(mut self, intensity: BlurIntensity) -> Self {
        self.blur_intensity = intensity;
        self
    }

    /// Blur status as shown in frame overlays: `OFF` or the intensity name.
    pub fn blur_status(&self) -> String {
        if self.enable_blur {
            self.blur_intensity.as_str().to_ascii_uppercase()
        } else {
            "OFF".to_string()
        }
    }
}

/// Timing and sizing of the orchestrator's channels, monitor and shutdown.
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorSettings {
    pub channel_capacity: usize,
    pub poll_interval: Duration,
    /// How long live workers may take to exit on their own during shutdown.
    pub grace_period: Duration,
    /// How long a killed worker may take to exit before it is detached.
    pub kill_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            channel_capacity: CHANNEL_CAPACITY,
            poll_interval: MONITOR_POLL_INTERVAL,
            grace_period: WORKER_GRACE_PERIOD,
            kill_timeout: WORKER_KILL_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PresenterSettings {
    pub window_name: String,
    /// How long the last frame stays up after the stream ends.
    pub hold_duration: Duration,
    pub key_poll: Duration,
}

impl Default for PresenterSettings {
    fn default() -> Self {
        Self {
            window_name: WINDOW_NAME.to_string(),
            hold_duration: FINAL_FRAME_HOLD,
            key_poll: KEY_POLL_WAIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::new("clip.mp4");
        assert_eq!(config.video_path, PathBuf::from("clip.mp4"));
        assert!(config.enable_blur);
        assert_eq!(config.blur_intensity, BlurIntensity::Medium);
    }

    #[test]
    fn test_blur_status() {
        let config = PipelineConfig::new("clip.mp4");
        assert_eq!(config.blur_status(), "MEDIUM");
        assert_eq!(
            config.clone().with_intensity(BlurIntensity::Heavy).blur_status(),
            "HEAVY"
        );
        assert_eq!(config.with_blur(false).blur_status(), "OFF");
    }

    #[test]
    fn test_orchestrator_defaults() {
        let settings = OrchestratorSettings::default();
        assert_eq!(settings.channel_capacity, 10);
        assert!(settings.poll_interval < Duration::from_secs(1));
        assert_eq!(settings.grace_period, Duration::from_secs(5));
    }

    #[test]
    fn test_presenter_defaults() {
        let settings = PresenterSettings::default();
        assert_eq!(settings.window_name, "Motion Guard");
        assert_eq!(settings.hold_duration, Duration::from_secs(3));
    }
}
