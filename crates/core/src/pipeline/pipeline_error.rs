use std::path::PathBuf;

use super::pipeline_state::{PipelineState, Stage};

/// Input validation failures. No worker is started.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("video file '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("'{}' is not a regular file", .0.display())]
    NotAFile(PathBuf),
}

/// Why a stage worker stopped abnormally.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StageError {
    #[error("failed to open video source: {0}")]
    Open(String),
    #[error("motion detection failed on frame {sequence}: {reason}")]
    Detection { sequence: u64, reason: String },
    #[error("redaction failed on frame {sequence}: {reason}")]
    Redaction { sequence: u64, reason: String },
    #[error("display failed: {0}")]
    Display(String),
}

/// Errors returned by [`super::orchestrator::Pipeline::run`] instead of a report.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to start {stage} worker: {source}")]
    Spawn {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },
    #[error("pipeline has already been run")]
    AlreadyExecuted,
    #[error("invalid pipeline state transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },
}
