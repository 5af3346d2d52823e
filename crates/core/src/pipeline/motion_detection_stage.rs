use crate::detection::domain::motion_detector::MotionDetector;
use crate::shared::constants::PROGRESS_LOG_EVERY;
use crate::shared::message::{FrameMessage, Message, ProcessedFrame};

use super::infrastructure::stage_channel::{StageInput, StageOutput};
use super::infrastructure::thread_worker::StageResult;
use super::pipeline_error::StageError;

/// Runs the motion detector on every frame and forwards the result.
///
/// Terminal messages are passed on untouched; this stage never starts or
/// ends a stream by itself.
pub struct MotionDetectionStage {
    detector: Box<dyn MotionDetector>,
}

impl MotionDetectionStage {
    pub fn new(detector: Box<dyn MotionDetector>) -> Self {
        Self { detector }
    }

    pub fn run(
        mut self,
        input: StageInput<FrameMessage>,
        mut output: StageOutput<ProcessedFrame>,
    ) -> StageResult {
        let mut total_detections = 0usize;
        loop {
            let frame = match input.recv() {
                Ok(Message::Frame(frame)) => frame,
                Ok(Message::End(end)) => {
                    log::info!(
                        "Motion detector: {} frames, {total_detections} detections",
                        output.frames_sent()
                    );
                    return Ok(match output.forward(end) {
                        Ok(()) => end.into(),
                        Err(halt) => halt.into(),
                    });
                }
                Err(halt) => {
                    log::debug!("Motion detector: input halted ({halt:?})");
                    return Ok(halt.into());
                }
            };

            let detections =
                self.detector
                    .detect(&frame.image)
                    .map_err(|e| StageError::Detection {
                        sequence: frame.sequence,
                        reason: e.to_string(),
                    })?;
            total_detections += detections.len();

            if let Err(halt) = output.send_frame(ProcessedFrame::new(frame, detections)) {
                log::debug!("Motion detector: output halted ({halt:?})");
                return Ok(halt.into());
            }
            let processed = output.frames_sent();
            if processed % PROGRESS_LOG_EVERY == 0 {
                log::info!("Motion detector: processed {processed} frames");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::frame_difference_detector::FrameDifferenceDetector;
    use crate::pipeline::infrastructure::stage_channel::kill_switch;
    use crate::pipeline::pipeline_state::StageOutcome;
    use crate::pipeline::test_support::ScriptedDetector;
    use crate::shared::detection::{BoundingBox, Detection};
    use crate::shared::frame::Frame;
    use crate::shared::message::{ProcessedFrameMessage, SourceFrame, StreamEnd};
    use crossbeam_channel::Receiver;

    fn source(sequence: u64, image: Frame) -> FrameMessage {
        Message::Frame(SourceFrame {
            sequence,
            timestamp: 1_700_000_000.0 + sequence as f64,
            image,
        })
    }

    fn run_stage(
        detector: Box<dyn MotionDetector>,
        messages: Vec<FrameMessage>,
    ) -> (StageResult, Receiver<ProcessedFrameMessage>) {
        let (in_tx, in_rx) = crossbeam_channel::bounded(messages.len().max(1));
        for msg in messages {
            in_tx.send(msg).unwrap();
        }
        drop(in_tx);
        let (out_tx, out_rx) = crossbeam_channel::bounded(16);
        let (_switch, signal) = kill_switch();
        let stage = MotionDetectionStage::new(detector);
        let result = stage.run(
            StageInput::new(in_rx, signal.clone()),
            StageOutput::new(out_tx, signal),
        );
        (result, out_rx)
    }

    #[test]
    fn test_frames_carry_metadata_and_detections() {
        let detection = Detection::new(BoundingBox::new(5, 5, 30, 30), 841.0);
        let end = StreamEnd::EndOfStream {
            total_frames: 2,
            timestamp: 42.5,
        };
        let (result, rx) = run_stage(
            Box::new(ScriptedDetector::new(Some(detection.clone()))),
            vec![
                source(0, Frame::filled(8, 8, 3, 1)),
                source(1, Frame::filled(8, 8, 3, 2)),
                Message::End(end),
            ],
        );
        assert_eq!(result, Ok(StageOutcome::EndOfStream));

        let out: Vec<ProcessedFrameMessage> = rx.try_iter().collect();
        assert_eq!(out.len(), 3);
        for (i, msg) in out[..2].iter().enumerate() {
            let Message::Frame(frame) = msg else {
                panic!("expected frame {i}");
            };
            assert_eq!(frame.sequence, i as u64);
            assert_eq!(frame.timestamp, 1_700_000_000.0 + i as f64);
            assert_eq!(frame.image, Frame::filled(8, 8, 3, i as u8 + 1));
            assert_eq!(frame.detections, vec![detection.clone()]);
        }
        // forwarded verbatim, timestamp included
        assert!(matches!(out[2], Message::End(e) if e == end));
    }

    #[test]
    fn test_interrupted_is_forwarded() {
        let end = StreamEnd::Interrupted {
            total_frames: 7,
            timestamp: 3.0,
        };
        let (result, rx) = run_stage(
            Box::new(ScriptedDetector::new(None)),
            vec![Message::End(end)],
        );
        assert_eq!(result, Ok(StageOutcome::Interrupted));
        let out: Vec<ProcessedFrameMessage> = rx.try_iter().collect();
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Message::End(e) if e == end));
    }

    #[test]
    fn test_detection_error_fails_stage() {
        let (result, rx) = run_stage(
            Box::new(ScriptedDetector::failing_on(1)),
            vec![
                source(0, Frame::filled(8, 8, 3, 0)),
                source(1, Frame::filled(8, 8, 3, 0)),
            ],
        );
        assert_eq!(
            result,
            Err(StageError::Detection {
                sequence: 1,
                reason: "detector out of memory".into()
            })
        );
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_upstream_disconnect_without_terminal() {
        let (result, rx) = run_stage(
            Box::new(ScriptedDetector::new(None)),
            vec![source(0, Frame::filled(8, 8, 3, 0))],
        );
        assert_eq!(result, Ok(StageOutcome::Disconnected));
        let out: Vec<ProcessedFrameMessage> = rx.try_iter().collect();
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_terminal());
    }

    #[test]
    fn test_real_detector_finds_moving_square() {
        let background = Frame::filled(120, 90, 3, 40);
        let mut moved = background.clone();
        for y in 30..60 {
            for x in 40..80 {
                let offset = moved.offset(x, y).unwrap();
                moved.data_mut()[offset..offset + 3].copy_from_slice(&[220, 220, 220]);
            }
        }
        let (_, rx) = run_stage(
            Box::new(FrameDifferenceDetector::new()),
            vec![
                source(0, background),
                source(1, moved),
                Message::End(StreamEnd::EndOfStream {
                    total_frames: 2,
                    timestamp: 0.0,
                }),
            ],
        );
        let counts: Vec<usize> = rx
            .try_iter()
            .filter_map(|m| match m {
                Message::Frame(f) => Some(f.detection_count()),
                Message::End(_) => None,
            })
            .collect();
        assert_eq!(counts, vec![0, 1]);
    }
}
