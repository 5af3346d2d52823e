use crate::shared::detection::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for obscuring rectangular regions within a frame.
///
/// Implementations modify the frame in-place (`&mut Frame`) and must leave
/// every pixel outside `regions` untouched.
pub trait FrameBlurrer: Send {
    fn blur(&self, frame: &mut Frame, regions: &[BoundingBox])
        -> Result<(), Box<dyn std::error::Error>>;
}
