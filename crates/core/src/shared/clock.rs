use chrono::{DateTime, Local, Utc};

/// Wall-clock time as fractional seconds since the Unix epoch.
pub fn unix_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Millisecond-precision local time, as drawn on presented frames.
pub fn format_overlay_time(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
