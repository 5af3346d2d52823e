use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::shared::clock::unix_seconds;
use crate::shared::constants::PROGRESS_LOG_EVERY;
use crate::shared::message::SourceFrame;
use crate::video::domain::video_reader::VideoReader;

use super::infrastructure::stage_channel::{Halt, KillSignal, StageOutput};
use super::infrastructure::thread_worker::StageResult;
use super::pipeline_error::StageError;

enum Ending {
    Exhausted,
    Stopped,
    Halted(Halt),
}

/// Reads the video in decode order and emits stamped frames, paced at the
/// nominal frame rate.
///
/// Ends the stream with `EndOfStream` when the input runs out (or a frame
/// fails to decode) and with `Interrupted` once `stop` is raised. If the
/// video cannot be opened nothing is sent at all.
pub struct FrameSourceStage {
    reader: Box<dyn VideoReader>,
    video_path: PathBuf,
    stop: Arc<AtomicBool>,
}

impl FrameSourceStage {
    pub fn new(reader: Box<dyn VideoReader>, video_path: PathBuf, stop: Arc<AtomicBool>) -> Self {
        Self {
            reader,
            video_path,
            stop,
        }
    }

    pub fn run(mut self, mut output: StageOutput<SourceFrame>, kill: KillSignal) -> StageResult {
        let metadata = self.reader.open(&self.video_path).map_err(|e| {
            log::error!(
                "Frame source: cannot open {}: {e}",
                self.video_path.display()
            );
            StageError::Open(e.to_string())
        })?;
        log::info!(
            "Frame source: {}x{} at {:.2} fps, {} frames",
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        );

        let ending = self.pump(&mut output, &kill, metadata.frame_interval());
        self.reader.close();

        let sent = match ending {
            Ending::Exhausted => output.end_of_stream(),
            Ending::Stopped => output.interrupted(),
            Ending::Halted(halt) => {
                log::debug!("Frame source: halted ({halt:?})");
                return Ok(halt.into());
            }
        };
        Ok(match sent {
            Ok(end) => {
                log::info!("Frame source: finished after {} frames", end.total_frames());
                end.into()
            }
            Err(halt) => halt.into(),
        })
    }

    fn pump(
        &mut self,
        output: &mut StageOutput<SourceFrame>,
        kill: &KillSignal,
        interval: Duration,
    ) -> Ending {
        let mut frames = self.reader.frames();
        loop {
            if self.stop.load(Ordering::SeqCst) {
                return Ending::Stopped;
            }
            let image = match frames.next() {
                None => return Ending::Exhausted,
                Some(Err(e)) => {
                    log::warn!(
                        "Frame source: read failed after {} frames, ending stream: {e}",
                        output.frames_sent()
                    );
                    return Ending::Exhausted;
                }
                Some(Ok(image)) => image,
            };
            let frame = SourceFrame {
                sequence: output.frames_sent(),
                timestamp: unix_seconds(),
                image,
            };
            if let Err(halt) = output.send_frame(frame) {
                return Ending::Halted(halt);
            }
            let sent = output.frames_sent();
            if sent % PROGRESS_LOG_EVERY == 0 {
                log::info!("Frame source: read {sent} frames");
            }
            if kill.sleep(interval) {
                return Ending::Halted(Halt::Killed);
            }
        }
    }
}
