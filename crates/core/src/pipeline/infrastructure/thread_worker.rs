use std::any::Any;
use std::thread::{self, JoinHandle};

use crate::pipeline::pipeline_error::{PipelineError, StageError};
use crate::pipeline::pipeline_state::{Stage, StageOutcome};

use super::stage_channel::{kill_switch, KillSignal, KillSwitch};

pub type StageResult = Result<StageOutcome, StageError>;

/// Last known state of a stage worker.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerStatus {
    Running,
    Finished(StageOutcome),
    Failed(StageError),
    Panicked(String),
    /// Abandoned after ignoring its kill switch.
    Detached,
}

/// A stage running on its own named thread, with a kill switch.
pub struct Worker {
    stage: Stage,
    handle: Option<JoinHandle<StageResult>>,
    kill: Option<KillSwitch>,
    status: WorkerStatus,
}

impl Worker {
    pub fn spawn<F>(stage: Stage, body: F) -> Result<Worker, PipelineError>
    where
        F: FnOnce(KillSignal) -> StageResult + Send + 'static,
    {
        let (switch, signal) = kill_switch();
        let handle = thread::Builder::new()
            .name(stage.thread_name().to_string())
            .spawn(move || body(signal))
            .map_err(|source| PipelineError::Spawn { stage, source })?;
        log::debug!("Started {stage} worker");
        Ok(Worker {
            stage,
            handle: Some(handle),
            kill: Some(switch),
            status: WorkerStatus::Running,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_live(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Collects the result of a finished thread; never blocks.
    pub fn poll_status(&mut self) -> WorkerStatus {
        if self.handle.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = self.handle.take() {
                self.status = match handle.join() {
                    Ok(Ok(outcome)) => WorkerStatus::Finished(outcome),
                    Ok(Err(err)) => WorkerStatus::Failed(err),
                    Err(payload) => WorkerStatus::Panicked(panic_message(payload.as_ref())),
                };
                log::info!("{} worker exited: {:?}", self.stage, self.status);
            }
        }
        self.status.clone()
    }

    pub fn kill(&mut self) {
        if let Some(switch) = self.kill.take() {
            log::warn!("Killing {} worker", self.stage);
            switch.trigger();
        }
    }

    /// Gives up on a thread that is still running.
    pub fn detach(&mut self) {
        if self.handle.take().is_some() {
            log::error!("{} worker did not exit; detaching it", self.stage);
            self.status = WorkerStatus::Detached;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
