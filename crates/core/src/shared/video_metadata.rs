use std::path::PathBuf;
use std::time::Duration;

use super::constants::DEFAULT_SOURCE_FPS;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate reported by the container; `0.0` when unknown.
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Pause between emitted frames so production follows the nominal rate.
    ///
    /// Falls back to 30 fps when the rate is unknown, non-positive or not finite.
    pub fn frame_interval(&self) -> Duration {
        let fps = if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            DEFAULT_SOURCE_FPS
        };
        Duration::from_secs_f64(1.0 / fps)
    }
}
