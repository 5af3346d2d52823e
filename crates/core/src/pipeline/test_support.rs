//! In-memory collaborators shared by the stage and orchestrator tests.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::detection::domain::motion_detector::MotionDetector;
use crate::display::domain::display_sink::{DisplaySink, Key};
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

use super::pipeline_logger::PipelineLogger;

pub struct VecReader {
    frames: Vec<Frame>,
    fps: f64,
    fail_open: bool,
    fail_after: Option<usize>,
    pub closed: Arc<Mutex<bool>>,
}

impl VecReader {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        Self {
            frames,
            fps,
            fail_open: false,
            fail_after: None,
            closed: Arc::new(Mutex::new(false)),
        }
    }

    pub fn static_frames(count: usize, fps: f64) -> Self {
        Self::new(vec![Frame::filled(64, 48, 3, 90); count], fps)
    }

    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Vec::new(), 30.0)
        }
    }

    /// Yields `Err` in place of frame `index`.
    pub fn failing_after(mut self, index: usize) -> Self {
        self.fail_after = Some(index);
        self
    }
}

impl VideoReader for VecReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if self.fail_open {
            return Err("unsupported container".into());
        }
        let (width, height) = self
            .frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        Ok(VideoMetadata {
            width,
            height,
            fps: self.fps,
            total_frames: self.frames.len(),
            codec: "raw".into(),
            source_path: Some(path.to_path_buf()),
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let fail_after = self.fail_after;
        Box::new(self.frames.iter().enumerate().map(move |(i, f)| {
            if Some(i) == fail_after {
                Err("corrupt packet".into())
            } else {
                Ok(f.clone())
            }
        }))
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() = true;
    }
}

/// Reports one fixed detection per frame, or fails on a given frame.
pub struct ScriptedDetector {
    pub detection: Option<Detection>,
    pub fail_on_call: Option<usize>,
    calls: usize,
}

impl ScriptedDetector {
    pub fn new(detection: Option<Detection>) -> Self {
        Self {
            detection,
            fail_on_call: None,
            calls: 0,
        }
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new(None)
        }
    }
}

impl MotionDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let call = self.calls;
        self.calls += 1;
        if Some(call) == self.fail_on_call {
            return Err("detector out of memory".into());
        }
        Ok(self.detection.iter().cloned().collect())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DisplayEvent {
    Created(String),
    Shown(Frame),
    Destroyed,
}

/// Records every call; keys are handed out in order, one per poll.
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pub events: Arc<Mutex<Vec<DisplayEvent>>>,
    pub keys: Arc<Mutex<Vec<Key>>>,
    pub show_delay: Duration,
    pub fail_create: bool,
}

impl RecordingDisplay {
    pub fn with_keys(keys: Vec<Key>) -> Self {
        Self {
            keys: Arc::new(Mutex::new(keys)),
            ..Self::default()
        }
    }

    pub fn shown(&self) -> Vec<Frame> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Shown(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> bool {
        self.events
            .lock()
            .unwrap()
            .contains(&DisplayEvent::Destroyed)
    }
}

impl DisplaySink for RecordingDisplay {
    fn create_window(&mut self, name: &str) -> Result<(), Box<dyn std::error::Error>> {
        if self.fail_create {
            return Err("no display available".into());
        }
        self.events
            .lock()
            .unwrap()
            .push(DisplayEvent::Created(name.to_string()));
        Ok(())
    }

    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if !self.show_delay.is_zero() {
            thread::sleep(self.show_delay);
        }
        self.events
            .lock()
            .unwrap()
            .push(DisplayEvent::Shown(frame.clone()));
        Ok(())
    }

    fn poll_key(&mut self, wait: Duration) -> Option<Key> {
        let mut keys = self.keys.lock().unwrap();
        if keys.is_empty() {
            drop(keys);
            thread::sleep(wait);
            None
        } else {
            Some(keys.remove(0))
        }
    }

    fn destroy_window(&mut self) {
        self.events.lock().unwrap().push(DisplayEvent::Destroyed);
    }
}

/// Shares what the presenter reports with the test body.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    pub metrics: Arc<Mutex<Vec<(String, f64)>>>,
    pub timings: Arc<Mutex<Vec<String>>>,
    pub progress: Arc<Mutex<Vec<u64>>>,
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    pub fn metric_values(&self, name: &str) -> Vec<f64> {
        self.metrics
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl PipelineLogger for RecordingLogger {
    fn progress(&mut self, frames: u64) {
        self.progress.lock().unwrap().push(frames);
    }

    fn timing(&mut self, step: &str, _duration_ms: f64) {
        self.timings.lock().unwrap().push(step.to_string());
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.lock().unwrap().push((name.to_string(), value));
    }

    fn info(&mut self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
