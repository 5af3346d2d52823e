use std::collections::HashMap;
use std::time::Instant;

use crate::shared::constants::PROGRESS_LOG_EVERY;

/// Cross-cutting logger for presentation events.
///
/// Decouples the presenter from specific output mechanisms so callers (and
/// tests) can observe per-frame behavior without changing the stage code.
pub trait PipelineLogger: Send {
    /// Report how many frames have been presented so far.
    fn progress(&mut self, frames: u64);

    /// Record how long a named step took for one frame.
    fn timing(&mut self, step: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. detections in a frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Count, sum and maximum of a series, kept without storing the samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStats {
    pub count: u64,
    pub total: f64,
    pub max: f64,
}

impl RunningStats {
    fn record(&mut self, value: f64) {
        self.max = if self.count == 0 {
            value
        } else {
            self.max.max(value)
        };
        self.count += 1;
        self.total += value;
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Logger backed by the `log` facade that tracks per-step timing and
/// metrics, and logs a summary when presentation ends.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct LogPipelineLogger {
    throttle_frames: u64,
    timings: HashMap<String, RunningStats>,
    metrics: HashMap<String, RunningStats>,
    start_time: Instant,
    total_frames: u64,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: u64) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.total_frames;
        let mut lines = Vec::new();

        lines.push(format!(
            "Presenter summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut steps: Vec<_> = self.timings.keys().collect();
        steps.sort();
        for step in steps {
            let stats = &self.timings[step];
            let total_ms = stats.total;
            let avg_ms = stats.average();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {step:10}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let stats = &self.metrics[name];
            lines.push(format!(
                "  {name}: avg {:.1}  max {:.0}",
                stats.average(),
                stats.max
            ));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, step: &str) -> Option<RunningStats> {
        self.timings.get(step).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<RunningStats> {
        self.metrics.get(name).copied()
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(PROGRESS_LOG_EVERY)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, frames: u64) {
        self.total_frames = frames;
        if frames > 0 && frames % self.throttle_frames == 0 {
            log::info!("Presenter: displayed {frames} frames");
        }
    }

    fn timing(&mut self, step: &str, duration_ms: f64) {
        self.timings
            .entry(step.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
