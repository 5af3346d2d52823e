use std::time::Duration;

/// Pacing rate used when the container does not report a usable frame rate.
pub const DEFAULT_SOURCE_FPS: f64 = 30.0;

/// Capacity of each inter-stage channel (Source→Detector, Detector→Presenter).
pub const CHANNEL_CAPACITY: usize = 10;

/// Grayscale difference above which a pixel counts as changed.
pub const MOTION_PIXEL_THRESHOLD: u8 = 25;

/// Dilation passes applied to the changed-pixel mask.
pub const MOTION_DILATE_ITERATIONS: usize = 2;

/// Contours enclosing less than this area are treated as noise.
pub const MOTION_MIN_AREA: f64 = 500.0;

/// Clamped regions narrower or shorter than this are not redacted.
pub const MIN_REDACT_SIDE: i32 = 5;

pub const PROGRESS_LOG_EVERY: u64 = 100;

pub const MONITOR_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const WORKER_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const WORKER_KILL_TIMEOUT: Duration = Duration::from_secs(1);

pub const FINAL_FRAME_HOLD: Duration = Duration::from_secs(3);
pub const KEY_POLL_WAIT: Duration = Duration::from_millis(1);

pub const WINDOW_NAME: &str = "Motion Guard";
