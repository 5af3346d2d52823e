pub mod contours;
pub mod frame_difference_detector;
pub mod image_ops;
