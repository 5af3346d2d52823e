use std::time::Duration;

use crossbeam_channel::{select, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::pipeline::pipeline_state::StageOutcome;
use crate::shared::clock::unix_seconds;
use crate::shared::message::{Message, StreamEnd};

/// Orchestrator half of a worker's kill switch. Triggering (or dropping)
/// it wakes every blocking operation of the worker's [`KillSignal`].
pub struct KillSwitch(Sender<()>);

/// Worker half of a kill switch.
#[derive(Clone)]
pub struct KillSignal(Receiver<()>);

pub fn kill_switch() -> (KillSwitch, KillSignal) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    (KillSwitch(tx), KillSignal(rx))
}

impl KillSwitch {
    pub fn trigger(self) {
        drop(self.0);
    }
}

impl KillSignal {
    pub fn is_triggered(&self) -> bool {
        matches!(self.0.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleeps for `duration` unless killed first. Returns `true` if killed.
    pub fn sleep(&self, duration: Duration) -> bool {
        matches!(
            self.0.recv_timeout(duration),
            Err(RecvTimeoutError::Disconnected)
        )
    }
}

/// Why a channel operation did not complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Halt {
    Killed,
    Disconnected,
}

impl From<Halt> for StageOutcome {
    fn from(halt: Halt) -> Self {
        match halt {
            Halt::Killed => StageOutcome::Killed,
            Halt::Disconnected => StageOutcome::Disconnected,
        }
    }
}

/// Receiving end of an inter-stage channel, interruptible by the kill switch.
pub struct StageInput<M> {
    rx: Receiver<M>,
    kill: KillSignal,
}

impl<M> StageInput<M> {
    pub fn new(rx: Receiver<M>, kill: KillSignal) -> Self {
        Self { rx, kill }
    }

    /// Blocks until a message arrives, the producers are gone, or the
    /// worker is killed.
    pub fn recv(&self) -> Result<M, Halt> {
        if self.kill.is_triggered() {
            return Err(Halt::Killed);
        }
        select! {
            recv(self.rx) -> msg => msg.map_err(|_| Halt::Disconnected),
            recv(self.kill.0) -> _ => Err(Halt::Killed),
        }
    }
}

/// Sending end of an inter-stage channel.
///
/// Counts the frames it sends, and the methods that send a terminal
/// message consume it so nothing can follow the terminal.
pub struct StageOutput<F> {
    tx: Sender<Message<F>>,
    kill: KillSignal,
    frames_sent: u64,
}

impl<F> StageOutput<F> {
    pub fn new(tx: Sender<Message<F>>, kill: KillSignal) -> Self {
        Self {
            tx,
            kill,
            frames_sent: 0,
        }
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Blocks while the channel is full.
    pub fn send_frame(&mut self, frame: F) -> Result<(), Halt> {
        self.send(Message::Frame(frame))?;
        self.frames_sent += 1;
        Ok(())
    }

    /// Closes the stream as exhausted, stamped now.
    pub fn end_of_stream(self) -> Result<StreamEnd, Halt> {
        let end = StreamEnd::EndOfStream {
            total_frames: self.frames_sent,
            timestamp: unix_seconds(),
        };
        self.forward(end).map(|()| end)
    }

    /// Closes the stream as cancelled, stamped now.
    pub fn interrupted(self) -> Result<StreamEnd, Halt> {
        let end = StreamEnd::Interrupted {
            total_frames: self.frames_sent,
            timestamp: unix_seconds(),
        };
        self.forward(end).map(|()| end)
    }

    /// Passes an upstream terminal message on unchanged.
    pub fn forward(self, end: StreamEnd) -> Result<(), Halt> {
        self.send(Message::End(end))
    }

    fn send(&self, msg: Message<F>) -> Result<(), Halt> {
        if self.kill.is_triggered() {
            return Err(Halt::Killed);
        }
        select! {
            send(self.tx, msg) -> res => res.map_err(|_| Halt::Disconnected),
            recv(self.kill.0) -> _ => Err(Halt::Killed),
        }
    }
}
