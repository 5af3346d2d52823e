use super::detection::Detection;
use super::frame::Frame;

/// A frame as emitted by the source: read order sequence plus capture time.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    pub sequence: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub image: Frame,
}

/// A source frame enriched with the motion found in it.
#[derive(Clone, Debug)]
pub struct ProcessedFrame {
    pub sequence: u64,
    pub timestamp: f64,
    pub image: Frame,
    /// Contour discovery order; never re-sorted.
    pub detections: Vec<Detection>,
}

impl ProcessedFrame {
    pub fn new(frame: SourceFrame, detections: Vec<Detection>) -> Self {
        Self {
            sequence: frame.sequence,
            timestamp: frame.timestamp,
            image: frame.image,
            detections,
        }
    }

    pub fn detection_count(&self) -> usize {
        self.detections.len()
    }
}

/// The single message that closes a stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StreamEnd {
    /// The source ran out of frames (or failed to read the next one).
    EndOfStream { total_frames: u64, timestamp: f64 },
    /// Acquisition was cancelled before the source was exhausted.
    Interrupted { total_frames: u64, timestamp: f64 },
}

impl StreamEnd {
    pub fn total_frames(&self) -> u64 {
        match *self {
            StreamEnd::EndOfStream { total_frames, .. } => total_frames,
            StreamEnd::Interrupted { total_frames, .. } => total_frames,
        }
    }

    pub fn is_graceful(&self) -> bool {
        matches!(self, StreamEnd::EndOfStream { .. })
    }
}

/// Message carried by an inter-stage channel.
#[derive(Clone, Debug)]
pub enum Message<F> {
    Frame(F),
    End(StreamEnd),
}

impl<F> Message<F> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Message::End(_))
    }
}

/// Source → Detector.
pub type FrameMessage = Message<SourceFrame>;

/// Detector → Presenter.
pub type ProcessedFrameMessage = Message<ProcessedFrame>;
