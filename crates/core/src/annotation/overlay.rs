use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

use super::canvas::{self, Rgb, BLACK, GREEN, RED, WHITE, YELLOW};

const BOX_THICKNESS: i32 = 2;
const CENTER_RADIUS: i32 = 5;
const LABEL_GAP: i32 = 10;
const PATCH_PADDING: i32 = 5;
const MARGIN: i32 = 10;
/// Distance from the bottom edge to the statistics baseline.
const STATS_BASELINE_OFFSET: i32 = 20;

/// Draws detection markers, the wall-clock timestamp and run statistics
/// onto presented frames.
#[derive(Clone, Debug)]
pub struct FrameAnnotator {
    label_scale: i32,
    text_scale: i32,
    box_color: Rgb,
    center_color: Rgb,
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        Self {
            label_scale: 1,
            text_scale: 2,
            box_color: GREEN,
            center_color: RED,
        }
    }
}

impl FrameAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detection_label(index: usize, detection: &Detection, blur_status: &str) -> String {
        format!(
            "MOTION {}: AREA={} BLUR:{}",
            index + 1,
            detection.area as i64,
            blur_status
        )
    }

    pub fn statistics_text(detection_count: usize, sequence: u64, blur_status: &str) -> String {
        format!("DETECTIONS: {detection_count} | FRAME: {sequence} | BLUR: {blur_status}")
    }

    /// Box, center marker and label for every detection, as given (unclamped).
    pub fn draw_detections(&self, frame: &mut Frame, detections: &[Detection], blur_status: &str) {
        for (i, detection) in detections.iter().enumerate() {
            let bbox = &detection.bounding_box;
            canvas::draw_rectangle(frame, bbox, self.box_color, BOX_THICKNESS);
            let (cx, cy) = detection.center;
            canvas::fill_circle(frame, cx, cy, CENTER_RADIUS, self.center_color);

            let label = Self::detection_label(i, detection, blur_status);
            let (_, label_h) = canvas::text_size(&label, self.label_scale);
            let label_y = (bbox.y - LABEL_GAP - label_h).max(0);
            canvas::draw_text(frame, &label, bbox.x, label_y, self.label_scale, self.box_color);
        }
    }

    /// White text on a black patch anchored at the top-left corner.
    pub fn draw_timestamp(&self, frame: &mut Frame, text: &str) {
        let (w, h) = canvas::text_size(text, self.text_scale);
        canvas::fill_rectangle(
            frame,
            MARGIN,
            MARGIN,
            w + 2 * PATCH_PADDING,
            h + 2 * PATCH_PADDING,
            BLACK,
        );
        canvas::draw_text(
            frame,
            text,
            MARGIN + PATCH_PADDING,
            MARGIN + PATCH_PADDING,
            self.text_scale,
            WHITE,
        );
    }

    /// Yellow statistics line on a black patch near the bottom-left corner.
    pub fn draw_statistics(
        &self,
        frame: &mut Frame,
        detection_count: usize,
        sequence: u64,
        blur_status: &str,
    ) {
        let text = Self::statistics_text(detection_count, sequence, blur_status);
        let (w, h) = canvas::text_size(&text, self.text_scale);
        let baseline = frame.height() as i32 - STATS_BASELINE_OFFSET;
        let top = baseline - h;
        canvas::fill_rectangle(
            frame,
            MARGIN,
            top - PATCH_PADDING,
            w + 2 * PATCH_PADDING,
            h + 2 * PATCH_PADDING,
            BLACK,
        );
        canvas::draw_text(frame, &text, MARGIN + PATCH_PADDING, top, self.text_scale, YELLOW);
    }
}
