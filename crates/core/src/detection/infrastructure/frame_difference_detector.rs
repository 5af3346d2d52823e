use ndarray::Array2;

use crate::detection::domain::motion_detector::MotionDetector;
use crate::shared::constants::{MOTION_DILATE_ITERATIONS, MOTION_MIN_AREA, MOTION_PIXEL_THRESHOLD};
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

use super::contours::find_external_contours;
use super::image_ops;

/// Detects motion by differencing each frame against the one before it.
///
/// Changed pixels are thresholded, dilated to merge fragments, and grouped
/// into external contours; contours below the noise floor are dropped.
pub struct FrameDifferenceDetector {
    previous: Option<Array2<u8>>,
    pixel_threshold: u8,
    dilate_iterations: usize,
    min_area: f64,
}

impl FrameDifferenceDetector {
    pub fn new() -> Self {
        Self {
            previous: None,
            pixel_threshold: MOTION_PIXEL_THRESHOLD,
            dilate_iterations: MOTION_DILATE_ITERATIONS,
            min_area: MOTION_MIN_AREA,
        }
    }

    pub fn has_reference(&self) -> bool {
        self.previous.is_some()
    }

    fn diff_regions(&self, previous: &Array2<u8>, current: &Array2<u8>) -> Vec<Detection> {
        let diff = image_ops::abs_diff(current, previous);
        let mask = image_ops::threshold_binary(&diff, self.pixel_threshold, 255);
        let mask = image_ops::dilate(&mask, self.dilate_iterations);

        find_external_contours(&mask)
            .into_iter()
            .filter_map(|contour| {
                let area = contour.area();
                if area < self.min_area {
                    return None;
                }
                Some(Detection::new(contour.bounding_rect(), area))
            })
            .collect()
    }
}

impl Default for FrameDifferenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionDetector for FrameDifferenceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let gray = image_ops::to_grayscale(frame)?;

        let detections = match self.previous.as_ref() {
            Some(previous) if previous.dim() == gray.dim() => self.diff_regions(previous, &gray),
            Some(previous) => {
                log::warn!(
                    "Frame size changed from {:?} to {:?}, restarting motion reference",
                    previous.dim(),
                    gray.dim()
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        self.previous = Some(gray);
        Ok(detections)
    }
}
