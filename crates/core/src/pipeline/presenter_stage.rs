use std::time::{Duration, Instant};

use chrono::Local;

use crate::annotation::overlay::FrameAnnotator;
use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::blurring::infrastructure::adaptive_blurrer::AdaptiveRegionBlurrer;
use crate::display::domain::display_sink::DisplaySink;
use crate::shared::clock::format_overlay_time;
use crate::shared::detection::BoundingBox;
use crate::shared::frame::Frame;
use crate::shared::message::{Message, ProcessedFrame, ProcessedFrameMessage};

use super::infrastructure::stage_channel::{Halt, KillSignal, StageInput};
use super::infrastructure::thread_worker::StageResult;
use super::pipeline_config::{PipelineConfig, PresenterSettings};
use super::pipeline_error::StageError;
use super::pipeline_logger::PipelineLogger;
use super::pipeline_state::StageOutcome;

/// Longest single key wait while holding the last frame.
const HOLD_SLICE: Duration = Duration::from_millis(50);

/// Owns the display for the presenter's lifetime; the window is destroyed
/// on every exit path.
struct Window {
    display: Box<dyn DisplaySink>,
}

impl Window {
    fn open(mut display: Box<dyn DisplaySink>, name: &str) -> Result<Self, StageError> {
        display
            .create_window(name)
            .map_err(|e| StageError::Display(e.to_string()))?;
        Ok(Self { display })
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.display.destroy_window();
        log::debug!("Presenter: window closed");
    }
}

/// Redacts and annotates one frame at a time.
struct FrameComposer {
    blurrer: Option<Box<dyn FrameBlurrer>>,
    annotator: FrameAnnotator,
    blur_status: String,
    logger: Box<dyn PipelineLogger>,
}

impl FrameComposer {
    fn compose(&mut self, frame: ProcessedFrame) -> Result<Frame, StageError> {
        let ProcessedFrame {
            sequence,
            mut image,
            detections,
            ..
        } = frame;

        if let Some(blurrer) = self.blurrer.as_ref().filter(|_| !detections.is_empty()) {
            let started = Instant::now();
            let regions: Vec<BoundingBox> = detections.iter().map(|d| d.bounding_box).collect();
            blurrer
                .blur(&mut image, &regions)
                .map_err(|e| StageError::Redaction {
                    sequence,
                    reason: e.to_string(),
                })?;
            self.logger.timing("redact", elapsed_ms(started));
        }

        let started = Instant::now();
        self.annotator
            .draw_detections(&mut image, &detections, &self.blur_status);
        self.annotator
            .draw_timestamp(&mut image, &format_overlay_time(&Local::now()));
        self.annotator
            .draw_statistics(&mut image, detections.len(), sequence, &self.blur_status);
        self.logger.timing("annotate", elapsed_ms(started));
        self.logger.metric("detections", detections.len() as f64);

        Ok(image)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Final stage: redacts motion regions, draws overlays and shows each
/// frame, until the stream ends or the user quits.
pub struct PresenterStage {
    display: Box<dyn DisplaySink>,
    composer: FrameComposer,
    settings: PresenterSettings,
}

impl PresenterStage {
    pub fn new(
        display: Box<dyn DisplaySink>,
        config: &PipelineConfig,
        settings: PresenterSettings,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        let blurrer = config.enable_blur.then(|| {
            Box::new(AdaptiveRegionBlurrer::new(config.blur_intensity)) as Box<dyn FrameBlurrer>
        });
        Self {
            display,
            composer: FrameComposer {
                blurrer,
                annotator: FrameAnnotator::new(),
                blur_status: config.blur_status(),
                logger,
            },
            settings,
        }
    }

    pub fn run(self, input: StageInput<ProcessedFrameMessage>, kill: KillSignal) -> StageResult {
        let PresenterStage {
            display,
            mut composer,
            settings,
        } = self;

        let mut window = Window::open(display, &settings.window_name)?;
        log::info!(
            "Presenter: window '{}' open, blur {}",
            settings.window_name,
            composer.blur_status
        );
        let result = present(&mut window, &mut composer, &input, &kill, &settings);
        composer.logger.summary();
        result
    }
}

fn present(
    window: &mut Window,
    composer: &mut FrameComposer,
    input: &StageInput<ProcessedFrameMessage>,
    kill: &KillSignal,
    settings: &PresenterSettings,
) -> StageResult {
    let mut shown = 0u64;
    loop {
        let frame = match input.recv() {
            Ok(Message::Frame(frame)) => frame,
            Ok(Message::End(end)) => {
                composer
                    .logger
                    .info(&format!("Presenter: stream ended after {shown} frames"));
                if end.is_graceful()
                    && shown > 0
                    && hold_last_frame(window, composer.logger.as_mut(), kill, settings)
                {
                    return Ok(StageOutcome::Killed);
                }
                return Ok(end.into());
            }
            Err(Halt::Disconnected) => {
                log::warn!("Presenter: input closed without a terminal message");
                return Ok(StageOutcome::Disconnected);
            }
            Err(Halt::Killed) => return Ok(StageOutcome::Killed),
        };

        let image = composer.compose(frame)?;
        let started = Instant::now();
        window
            .display
            .show(&image)
            .map_err(|e| StageError::Display(e.to_string()))?;
        composer.logger.timing("render", elapsed_ms(started));
        shown += 1;
        composer.logger.progress(shown);

        if let Some(key) = window.display.poll_key(settings.key_poll) {
            if key.is_quit() {
                composer
                    .logger
                    .info(&format!("Presenter: quit key pressed after {shown} frames"));
                return Ok(StageOutcome::UserQuit);
            }
        }
    }
}

/// Keeps the last frame up until the hold expires or any key is pressed.
/// Returns `true` if the worker was killed meanwhile.
fn hold_last_frame(
    window: &mut Window,
    logger: &mut dyn PipelineLogger,
    kill: &KillSignal,
    settings: &PresenterSettings,
) -> bool {
    let deadline = Instant::now() + settings.hold_duration;
    logger.info(&format!(
        "Presenter: holding last frame for {:.1}s (press any key to close)",
        settings.hold_duration.as_secs_f64()
    ));
    loop {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        if kill.is_triggered() {
            return true;
        }
        if window.display.poll_key((deadline - now).min(HOLD_SLICE)).is_some() {
            return false;
        }
    }
}
