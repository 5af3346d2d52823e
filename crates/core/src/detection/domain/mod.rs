pub mod motion_detector;
