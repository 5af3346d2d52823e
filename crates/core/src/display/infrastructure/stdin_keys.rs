use std::io::BufRead;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::display::domain::display_sink::Key;

/// Keys on one line of terminal input. `esc` (any case) stands for Escape;
/// otherwise each character is a key.
pub fn parse_key_line(line: &str) -> Vec<Key> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("esc") {
        return vec![Key::Escape];
    }
    line.chars().map(|c| Key::from_code(c as u32)).collect()
}

/// Reads stdin on a background thread and forwards every key typed
/// (followed by Enter) until stdin closes or the receiver is dropped.
pub fn spawn_stdin_keys() -> std::io::Result<Receiver<Key>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("stdin-keys".into())
        .spawn(move || forward_lines(std::io::stdin().lock(), tx))?;
    Ok(rx)
}

fn forward_lines(input: impl BufRead, tx: Sender<Key>) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        for key in parse_key_line(&line) {
            if tx.send(key).is_err() {
                return;
            }
        }
    }
    log::debug!("Key input closed");
}

/// Optional key feed shared by the display sinks.
///
/// Without a feed, or once the feed disconnects, polling just waits out
/// the requested duration.
#[derive(Default)]
pub struct KeyQueue {
    rx: Option<Receiver<Key>>,
}

impl KeyQueue {
    pub fn new(rx: Option<Receiver<Key>>) -> Self {
        Self { rx }
    }

    pub fn poll(&mut self, wait: Duration) -> Option<Key> {
        let Some(rx) = self.rx.as_ref() else {
            thread::sleep(wait);
            return None;
        };
        match rx.recv_timeout(wait) {
            Ok(key) => Some(key),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.rx = None;
                thread::sleep(wait);
                None
            }
        }
    }
}
