pub mod blur_intensity;
pub mod frame_blurrer;
