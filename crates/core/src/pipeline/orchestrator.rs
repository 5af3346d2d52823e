use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::Receiver;

use crate::detection::domain::motion_detector::MotionDetector;
use crate::detection::infrastructure::frame_difference_detector::FrameDifferenceDetector;
use crate::display::domain::display_sink::DisplaySink;
use crate::shared::message::{FrameMessage, ProcessedFrameMessage};
use crate::video::domain::video_reader::VideoReader;

use super::frame_source_stage::FrameSourceStage;
use super::infrastructure::stage_channel::{StageInput, StageOutput};
use super::infrastructure::thread_worker::{Worker, WorkerStatus};
use super::motion_detection_stage::MotionDetectionStage;
use super::pipeline_config::{OrchestratorSettings, PipelineConfig, PresenterSettings};
use super::pipeline_error::{PipelineError, StartupError};
use super::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use super::pipeline_state::{
    CancelReason, PipelineReport, PipelineState, RunOutcome, Stage, StageOutcome, StateMachine,
};
use super::presenter_stage::PresenterStage;

/// Wires `source → detector → presenter` and supervises one run.
///
/// A pipeline runs once: `Idle → Validating → Running → Draining →
/// Terminated`. Worker threads never touch the state machine; they only
/// report how they stopped.
pub struct Pipeline {
    config: PipelineConfig,
    reader: Option<Box<dyn VideoReader>>,
    display: Option<Box<dyn DisplaySink>>,
    detector: Option<Box<dyn MotionDetector>>,
    logger: Option<Box<dyn PipelineLogger>>,
    settings: OrchestratorSettings,
    presenter_settings: PresenterSettings,
    interrupt: Arc<AtomicBool>,
    machine: StateMachine,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        reader: Box<dyn VideoReader>,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        Self {
            config,
            reader: Some(reader),
            display: Some(display),
            detector: None,
            logger: None,
            settings: OrchestratorSettings::default(),
            presenter_settings: PresenterSettings::default(),
            interrupt: Arc::new(AtomicBool::new(false)),
            machine: StateMachine::new(),
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_presenter_settings(mut self, settings: PresenterSettings) -> Self {
        self.presenter_settings = settings;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Replaces the frame-differencing detector.
    pub fn with_detector(mut self, detector: Box<dyn MotionDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Flag that cancels the run when raised, e.g. from a Ctrl-C handler.
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.machine.current()
    }

    /// Runs the pipeline to completion and reports how it ended.
    ///
    /// Returns `Err` only when the run could not start: invalid input, a
    /// worker that could not be spawned, or a second call.
    pub fn run(&mut self) -> Result<PipelineReport, PipelineError> {
        if self.machine.current() != PipelineState::Idle {
            return Err(PipelineError::AlreadyExecuted);
        }

        self.machine.transition(PipelineState::Validating)?;
        if let Err(err) = validate_input(&self.config.video_path) {
            log::error!("Pipeline: {err}");
            self.machine.transition(PipelineState::Terminated)?;
            return Err(err.into());
        }

        self.machine.transition(PipelineState::Running)?;
        let mut runtime = match self.start() {
            Ok(runtime) => runtime,
            Err(err) => {
                log::error!("Pipeline: {err}");
                self.machine.transition(PipelineState::Terminated)?;
                return Err(err);
            }
        };

        self.machine.transition(PipelineState::Draining)?;
        let outcome = self.monitor(&mut runtime);

        self.machine.transition(PipelineState::Terminated)?;
        let shutdown = runtime.shutdown();
        let outcome = match outcome {
            RunOutcome::Completed => classify(&shutdown.statuses),
            other => other,
        };

        match &outcome {
            RunOutcome::Completed => log::info!("Pipeline: {outcome}"),
            RunOutcome::Cancelled(_) => log::warn!("Pipeline: {outcome}"),
            RunOutcome::Failed { .. } => log::error!("Pipeline: {outcome}"),
        }

        Ok(PipelineReport {
            outcome,
            final_state: self.machine.current(),
            force_killed: shutdown.force_killed,
            discarded_messages: shutdown.discarded,
            residual_messages: shutdown.residual,
        })
    }

    fn start(&mut self) -> Result<PipelineRuntime, PipelineError> {
        let reader = self.reader.take().ok_or(PipelineError::AlreadyExecuted)?;
        let display = self.display.take().ok_or(PipelineError::AlreadyExecuted)?;
        let detector = self
            .detector
            .take()
            .unwrap_or_else(|| Box::new(FrameDifferenceDetector::new()));
        let logger = self
            .logger
            .take()
            .unwrap_or_else(|| Box::new(LogPipelineLogger::default()));

        let capacity = self.settings.channel_capacity;
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<FrameMessage>(capacity);
        let (processed_tx, processed_rx) =
            crossbeam_channel::bounded::<ProcessedFrameMessage>(capacity);
        let stop = Arc::new(AtomicBool::new(false));
        log::debug!("Pipeline: created two channels of capacity {capacity}");

        let mut runtime = PipelineRuntime {
            workers: Vec::with_capacity(3),
            frames: frame_rx.clone(),
            processed: processed_rx.clone(),
            stop: stop.clone(),
            settings: self.settings.clone(),
            finished: false,
        };

        let source = FrameSourceStage::new(reader, self.config.video_path.clone(), stop);
        runtime.workers.push(Worker::spawn(Stage::FrameSource, move |kill| {
            source.run(StageOutput::new(frame_tx, kill.clone()), kill)
        })?);

        let detection = MotionDetectionStage::new(detector);
        runtime
            .workers
            .push(Worker::spawn(Stage::MotionDetector, move |kill| {
                detection.run(
                    StageInput::new(frame_rx, kill.clone()),
                    StageOutput::new(processed_tx, kill),
                )
            })?);

        let presenter = PresenterStage::new(
            display,
            &self.config,
            self.presenter_settings.clone(),
            logger,
        );
        runtime.workers.push(Worker::spawn(Stage::Presenter, move |kill| {
            presenter.run(StageInput::new(processed_rx, kill.clone()), kill)
        })?);

        log::info!(
            "Pipeline: running on {} (blur {})",
            self.config.video_path.display(),
            self.config.blur_status()
        );
        Ok(runtime)
    }

    /// Polls worker liveness until a worker stops or an interrupt arrives.
    fn monitor(&self, runtime: &mut PipelineRuntime) -> RunOutcome {
        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                log::warn!("Pipeline: interrupt received");
                return RunOutcome::Cancelled(CancelReason::Interrupt);
            }
            let stopped: Vec<(Stage, WorkerStatus)> = runtime
                .workers
                .iter_mut()
                .filter(|w| !w.is_live())
                .map(|w| (w.stage(), w.poll_status()))
                .collect();
            if !stopped.is_empty() {
                return classify(&stopped);
            }
            thread::sleep(self.settings.poll_interval);
        }
    }
}

fn validate_input(path: &Path) -> Result<(), StartupError> {
    if !path.exists() {
        return Err(StartupError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(StartupError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

/// Any failure wins, then a quit key; otherwise the run completed.
fn classify(statuses: &[(Stage, WorkerStatus)]) -> RunOutcome {
    for (stage, status) in statuses {
        let reason = match status {
            WorkerStatus::Failed(err) => err.to_string(),
            WorkerStatus::Panicked(msg) => format!("worker panicked: {msg}"),
            _ => continue,
        };
        return RunOutcome::Failed {
            stage: *stage,
            reason,
        };
    }
    let quit = statuses
        .iter()
        .any(|(_, s)| *s == WorkerStatus::Finished(StageOutcome::UserQuit));
    if quit {
        RunOutcome::Cancelled(CancelReason::QuitKey)
    } else {
        RunOutcome::Completed
    }
}

struct ShutdownSummary {
    statuses: Vec<(Stage, WorkerStatus)>,
    force_killed: Vec<Stage>,
    discarded: usize,
    residual: usize,
}

/// Live workers plus the orchestrator's ends of both channels. Shuts the
/// workers down when dropped, so a failed start leaves nothing running.
struct PipelineRuntime {
    workers: Vec<Worker>,
    frames: Receiver<FrameMessage>,
    processed: Receiver<ProcessedFrameMessage>,
    stop: Arc<AtomicBool>,
    settings: OrchestratorSettings,
    finished: bool,
}

impl PipelineRuntime {
    fn shutdown(&mut self) -> ShutdownSummary {
        self.finished = true;
        self.stop.store(true, Ordering::SeqCst);

        let mut discarded = self.wait_for_exit(self.settings.grace_period);

        let mut force_killed = Vec::new();
        for worker in self.workers.iter_mut().filter(|w| w.is_live()) {
            force_killed.push(worker.stage());
            worker.kill();
        }
        if !force_killed.is_empty() {
            discarded += self.wait_for_exit(self.settings.kill_timeout);
            for worker in self.workers.iter_mut().filter(|w| w.is_live()) {
                worker.detach();
            }
        }

        discarded += self.frames.try_iter().count() + self.processed.try_iter().count();
        let residual = self.frames.len() + self.processed.len();
        if discarded > 0 {
            log::debug!("Pipeline: discarded {discarded} queued messages");
        }

        let statuses = self
            .workers
            .iter_mut()
            .map(|w| (w.stage(), w.poll_status()))
            .filter(|(_, status)| *status != WorkerStatus::Detached)
            .collect();

        ShutdownSummary {
            statuses,
            force_killed,
            discarded,
            residual,
        }
    }

    /// Waits up to `timeout` for every worker to exit, unblocking producers
    /// whose consumer is already gone. Returns the messages discarded.
    fn wait_for_exit(&self, timeout: std::time::Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut discarded = 0;
        while self.workers.iter().any(Worker::is_live) && Instant::now() < deadline {
            if !self.is_live(Stage::MotionDetector) {
                discarded += self.frames.try_iter().count();
            }
            if !self.is_live(Stage::Presenter) {
                discarded += self.processed.try_iter().count();
            }
            thread::sleep(self.settings.poll_interval);
        }
        discarded
    }

    fn is_live(&self, stage: Stage) -> bool {
        self.workers
            .iter()
            .any(|w| w.stage() == stage && w.is_live())
    }
}

impl Drop for PipelineRuntime {
    fn drop(&mut self) {
        if !self.finished {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::domain::display_sink::Key;
    use crate::display::infrastructure::headless_display::HeadlessDisplay;
    use crate::pipeline::pipeline_error::StageError;
    use crate::pipeline::test_support::{
        RecordingDisplay, RecordingLogger, ScriptedDetector, VecReader,
    };
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn fast_settings() -> OrchestratorSettings {
        OrchestratorSettings {
            channel_capacity: 10,
            poll_interval: Duration::from_millis(10),
            grace_period: Duration::from_secs(2),
            kill_timeout: Duration::from_millis(500),
        }
    }

    fn presenter_settings(hold: Duration) -> PresenterSettings {
        PresenterSettings {
            window_name: "Test".into(),
            hold_duration: hold,
            key_poll: Duration::from_millis(1),
        }
    }

    fn placeholder_video() -> NamedTempFile {
        NamedTempFile::new().unwrap()
    }

    fn pipeline(
        video: &NamedTempFile,
        reader: VecReader,
        display: Box<dyn DisplaySink>,
    ) -> Pipeline {
        Pipeline::new(PipelineConfig::new(video.path()), Box::new(reader), display)
            .with_settings(fast_settings())
            .with_presenter_settings(presenter_settings(Duration::from_millis(50)))
    }

    #[test]
    fn test_static_video_completes_without_detections() {
        let video = placeholder_video();
        let display = RecordingDisplay::default();
        let logger = RecordingLogger::default();
        let mut pipeline = pipeline(
            &video,
            VecReader::static_frames(5, 200.0),
            Box::new(display.clone()),
        )
        .with_logger(Box::new(logger.clone()));

        let report = pipeline.run().unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.outcome.exit_code(), 0);
        assert_eq!(report.final_state, PipelineState::Terminated);
        assert!(report.force_killed.is_empty());
        assert_eq!(report.residual_messages, 0);
        assert_eq!(pipeline.state(), PipelineState::Terminated);
        assert_eq!(display.shown().len(), 5);
        assert!(display.destroyed());
        assert_eq!(logger.metric_values("detections"), vec![0.0; 5]);
    }

    #[test]
    fn test_second_run_is_rejected() {
        let video = placeholder_video();
        let mut pipeline = pipeline(
            &video,
            VecReader::static_frames(1, 200.0),
            Box::new(RecordingDisplay::default()),
        );
        pipeline.run().unwrap();
        assert!(matches!(pipeline.run(), Err(PipelineError::AlreadyExecuted)));
    }

    #[test]
    fn test_missing_video_never_starts_workers() {
        let dir = tempfile::tempdir().unwrap();
        let display = RecordingDisplay::default();
        let mut pipeline = Pipeline::new(
            PipelineConfig::new(dir.path().join("missing.mp4")),
            Box::new(VecReader::static_frames(3, 200.0)),
            Box::new(display.clone()),
        );

        let err = pipeline.run().unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Startup(StartupError::NotFound(_))
        ));
        assert_eq!(pipeline.state(), PipelineState::Terminated);
        assert!(display.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_directory_is_not_a_video() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::new(
            PipelineConfig::new(dir.path()),
            Box::new(VecReader::static_frames(3, 200.0)),
            Box::new(RecordingDisplay::default()),
        );
        assert!(matches!(
            pipeline.run(),
            Err(PipelineError::Startup(StartupError::NotAFile(_)))
        ));
    }

    #[test]
    fn test_unopenable_video_fails_source() {
        let video = placeholder_video();
        let display = RecordingDisplay::default();
        let mut pipeline = pipeline(&video, VecReader::failing_open(), Box::new(display.clone()));

        let report = pipeline.run().unwrap();

        match &report.outcome {
            RunOutcome::Failed { stage, reason } => {
                assert_eq!(*stage, Stage::FrameSource);
                assert!(reason.contains("unsupported container"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(report.outcome.exit_code(), 1);
        assert!(display.shown().is_empty());
        assert!(display.destroyed());
    }

    #[test]
    fn test_detector_failure_is_reported() {
        let video = placeholder_video();
        let mut pipeline = pipeline(
            &video,
            VecReader::static_frames(40, 500.0),
            Box::new(RecordingDisplay::default()),
        )
        .with_detector(Box::new(ScriptedDetector::failing_on(2)));

        let report = pipeline.run().unwrap();

        assert_eq!(
            report.outcome,
            RunOutcome::Failed {
                stage: Stage::MotionDetector,
                reason: StageError::Detection {
                    sequence: 2,
                    reason: "detector out of memory".into()
                }
                .to_string()
            }
        );
        assert!(report.force_killed.is_empty());
        assert_eq!(report.residual_messages, 0);
    }

    #[test]
    fn test_quit_key_cancels_run() {
        let video = placeholder_video();
        let (keys_tx, keys_rx) = crossbeam_channel::unbounded();
        keys_tx.send(Key::Char('q')).unwrap();
        let mut pipeline = pipeline(
            &video,
            VecReader::static_frames(1000, 100.0),
            Box::new(HeadlessDisplay::new().with_keys(keys_rx)),
        );

        let started = Instant::now();
        let report = pipeline.run().unwrap();

        assert_eq!(report.outcome, RunOutcome::Cancelled(CancelReason::QuitKey));
        assert_eq!(report.outcome.exit_code(), 0);
        assert!(report.force_killed.is_empty());
        assert_eq!(report.residual_messages, 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_external_interrupt_cancels_run() {
        let video = placeholder_video();
        let interrupt = Arc::new(AtomicBool::new(false));
        let display = RecordingDisplay::default();
        let mut pipeline = Pipeline::new(
            PipelineConfig::new(video.path()),
            Box::new(VecReader::static_frames(1000, 100.0)),
            Box::new(display.clone()),
        )
        .with_settings(fast_settings())
        .with_presenter_settings(presenter_settings(Duration::from_secs(10)))
        .with_interrupt(interrupt.clone());

        let raiser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            interrupt.store(true, Ordering::SeqCst);
        });
        let started = Instant::now();
        let report = pipeline.run().unwrap();
        raiser.join().unwrap();

        assert_eq!(report.outcome, RunOutcome::Cancelled(CancelReason::Interrupt));
        assert_eq!(report.final_state, PipelineState::Terminated);
        assert!(report.force_killed.is_empty());
        assert_eq!(report.residual_messages, 0);
        assert!(display.destroyed());
        assert!(display.shown().len() < 1000);
        // no final-frame hold after an interrupt
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_stuck_presenter_is_force_killed() {
        let video = placeholder_video();
        let display = RecordingDisplay {
            show_delay: Duration::from_secs(2),
            ..RecordingDisplay::default()
        };
        let mut pipeline = pipeline(&video, VecReader::static_frames(5, 1000.0), Box::new(display))
            .with_settings(OrchestratorSettings {
                grace_period: Duration::from_millis(100),
                kill_timeout: Duration::from_millis(100),
                ..fast_settings()
            });

        let report = pipeline.run().unwrap();

        assert_eq!(report.force_killed, vec![Stage::Presenter]);
        assert!(report.discarded_messages > 0);
        assert_eq!(report.residual_messages, 0);
        assert_eq!(report.final_state, PipelineState::Terminated);
    }

    #[test]
    fn test_kill_cuts_final_hold_short() {
        let video = placeholder_video();
        let mut pipeline = Pipeline::new(
            PipelineConfig::new(video.path()),
            Box::new(VecReader::static_frames(3, 1000.0)),
            Box::new(RecordingDisplay::default()),
        )
        .with_settings(OrchestratorSettings {
            grace_period: Duration::from_millis(200),
            kill_timeout: Duration::from_secs(1),
            ..fast_settings()
        })
        .with_presenter_settings(presenter_settings(Duration::from_secs(10)));

        let started = Instant::now();
        let report = pipeline.run().unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.force_killed, vec![Stage::Presenter]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_classify_prefers_failure_over_quit() {
        let statuses = vec![
            (Stage::Presenter, WorkerStatus::Finished(StageOutcome::UserQuit)),
            (
                Stage::MotionDetector,
                WorkerStatus::Panicked("index out of bounds".into()),
            ),
        ];
        assert_eq!(
            classify(&statuses),
            RunOutcome::Failed {
                stage: Stage::MotionDetector,
                reason: "worker panicked: index out of bounds".into()
            }
        );
        assert_eq!(
            classify(&statuses[..1]),
            RunOutcome::Cancelled(CancelReason::QuitKey)
        );
        assert_eq!(
            classify(&[(Stage::FrameSource, WorkerStatus::Finished(StageOutcome::EndOfStream))]),
            RunOutcome::Completed
        );
    }
}
