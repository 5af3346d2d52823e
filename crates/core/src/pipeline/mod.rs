pub mod frame_source_stage;
pub mod infrastructure;
pub mod motion_detection_stage;
pub mod orchestrator;
pub mod pipeline_config;
pub mod pipeline_error;
pub mod pipeline_logger;
pub mod pipeline_state;
pub mod presenter_stage;

#[cfg(test)]
pub(crate) mod test_support;
