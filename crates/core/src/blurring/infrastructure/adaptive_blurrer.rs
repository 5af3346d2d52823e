use std::cell::RefCell;
use std::collections::HashMap;

use crate::blurring::domain::blur_intensity::BlurIntensity;
use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::shared::constants::MIN_REDACT_SIDE;
use crate::shared::detection::BoundingBox;
use crate::shared::frame::Frame;

use super::gaussian::{self, RoiRect};

/// CPU rectangular blurrer whose kernel scales with each region's size.
///
/// Regions are clamped to the frame first; a clamped region with a side
/// shorter than [`MIN_REDACT_SIDE`] is left as is.
pub struct AdaptiveRegionBlurrer {
    intensity: BlurIntensity,
    kernels: RefCell<HashMap<usize, Vec<f32>>>,
    roi_buf: RefCell<Vec<u8>>,
    blur_temp: RefCell<Vec<f32>>,
}

impl AdaptiveRegionBlurrer {
    pub fn new(intensity: BlurIntensity) -> Self {
        Self {
            intensity,
            kernels: RefCell::new(HashMap::new()),
            roi_buf: RefCell::new(Vec::new()),
            blur_temp: RefCell::new(Vec::new()),
        }
    }

    /// The clamped rectangle and kernel size that `blur` would use, or
    /// `None` when the region is skipped.
    pub fn plan(
        &self,
        region: &BoundingBox,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<(RoiRect, usize)> {
        let clamped = region.clamp_to(frame_width, frame_height);
        if clamped.width < MIN_REDACT_SIDE || clamped.height < MIN_REDACT_SIDE {
            return None;
        }
        let rect = RoiRect {
            x: clamped.x as usize,
            y: clamped.y as usize,
            w: clamped.width as usize,
            h: clamped.height as usize,
        };
        let kernel_size = self
            .intensity
            .kernel_size_for(clamped.longest_side() as usize);
        Some((rect, kernel_size))
    }
}

impl FrameBlurrer for AdaptiveRegionBlurrer {
    fn blur(
        &self,
        frame: &mut Frame,
        regions: &[BoundingBox],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let fw = frame.width();
        let fh = frame.height();
        let channels = frame.channels() as usize;
        let data = frame.data_mut();

        for region in regions {
            let Some((rect, kernel_size)) = self.plan(region, fw, fh) else {
                log::trace!("Skipping region {:?}: too small after clamping", region);
                continue;
            };

            let mut kernels = self.kernels.borrow_mut();
            let kernel = kernels
                .entry(kernel_size)
                .or_insert_with(|| gaussian::gaussian_kernel_1d(kernel_size));

            let mut roi = self.roi_buf.borrow_mut();
            let mut temp = self.blur_temp.borrow_mut();
            gaussian::extract_roi(data, fw as usize, channels, rect, &mut roi);
            gaussian::separable_gaussian_blur_with_kernel(
                &mut roi, rect.w, rect.h, channels, kernel, &mut temp,
            );
            gaussian::write_roi_back(data, &roi, fw as usize, channels, rect);
        }

        Ok(())
    }
}
