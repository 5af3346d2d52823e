use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for motion detection.
///
/// Implementations compare against frames seen earlier, hence `&mut self`.
pub trait MotionDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
