pub mod clock;
pub mod constants;
pub mod detection;
pub mod frame;
pub mod message;
pub mod video_metadata;
