use std::fmt;

use crate::shared::message::StreamEnd;

use super::pipeline_error::PipelineError;

/// Orchestrator lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Validating,
    Running,
    Draining,
    Terminated,
}

impl PipelineState {
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Running)
                | (Validating, Terminated)
                | (Running, Draining)
                | (Running, Terminated)
                | (Draining, Terminated)
        )
    }
}

/// The orchestrator's state, owned by the orchestrator and never shared
/// with stage workers.
#[derive(Debug)]
pub struct StateMachine {
    state: PipelineState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }

    pub fn current(&self) -> PipelineState {
        self.state
    }

    pub fn transition(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        log::info!("Pipeline: {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// The three stage workers, in data-flow order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    FrameSource,
    MotionDetector,
    Presenter,
}

impl Stage {
    pub fn thread_name(self) -> &'static str {
        match self {
            Stage::FrameSource => "frame-source",
            Stage::MotionDetector => "motion-detector",
            Stage::Presenter => "presenter",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::FrameSource => "frame source",
            Stage::MotionDetector => "motion detector",
            Stage::Presenter => "presenter",
        })
    }
}

/// How a stage worker that did not fail came to stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// Sent, forwarded or handled `EndOfStream`.
    EndOfStream,
    /// Sent, forwarded or handled `Interrupted`.
    Interrupted,
    /// The presenter saw a quit key.
    UserQuit,
    /// The other end of a channel went away without a terminal message.
    Disconnected,
    /// Woken by its kill switch.
    Killed,
}

impl From<StreamEnd> for StageOutcome {
    fn from(end: StreamEnd) -> Self {
        match end {
            StreamEnd::EndOfStream { .. } => StageOutcome::EndOfStream,
            StreamEnd::Interrupted { .. } => StageOutcome::Interrupted,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    QuitKey,
    Interrupt,
}

/// Classification of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// The video was exhausted and every worker ended cleanly.
    Completed,
    /// The user stopped the run; not an error.
    Cancelled(CancelReason),
    /// A worker stopped with a failure status.
    Failed { stage: Stage, reason: String },
}

impl RunOutcome {
    pub fn is_normal(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    /// Process exit status: user cancellation still counts as success.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed | RunOutcome::Cancelled(_) => 0,
            RunOutcome::Failed { .. } => 1,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => f.write_str("completed"),
            RunOutcome::Cancelled(CancelReason::QuitKey) => f.write_str("cancelled by quit key"),
            RunOutcome::Cancelled(CancelReason::Interrupt) => f.write_str("interrupted"),
            RunOutcome::Failed { stage, reason } => write!(f, "{stage} failed: {reason}"),
        }
    }
}

/// What the caller learns about a run that got past validation.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineReport {
    pub outcome: RunOutcome,
    pub final_state: PipelineState,
    /// Workers still live after the grace period, in stage order.
    pub force_killed: Vec<Stage>,
    /// Messages thrown away while draining the channels.
    pub discarded_messages: usize,
    /// Messages left in either channel after cleanup.
    pub residual_messages: usize,
}
