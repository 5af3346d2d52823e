use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::display::domain::display_sink::{DisplaySink, Key};
use crate::shared::frame::Frame;

use super::stdin_keys::KeyQueue;

/// Display sink with no window: counts frames and logs them at debug level.
///
/// Keys come from an optional feed (see [`super::stdin_keys::spawn_stdin_keys`]).
pub struct HeadlessDisplay {
    window: Option<String>,
    shown: u64,
    keys: KeyQueue,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self {
            window: None,
            shown: 0,
            keys: KeyQueue::default(),
        }
    }

    pub fn with_keys(mut self, keys: Receiver<Key>) -> Self {
        self.keys = KeyQueue::new(Some(keys));
        self
    }

    pub fn frames_shown(&self) -> u64 {
        self.shown
    }

    pub fn is_open(&self) -> bool {
        self.window.is_some()
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for HeadlessDisplay {
    fn create_window(&mut self, name: &str) -> Result<(), Box<dyn std::error::Error>> {
        log::info!("Headless display '{name}' opened");
        self.window = Some(name.to_string());
        Ok(())
    }

    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let Some(name) = self.window.as_deref() else {
            return Err("HeadlessDisplay: window not created".into());
        };
        self.shown += 1;
        log::debug!(
            "[{name}] frame {} ({}x{})",
            self.shown,
            frame.width(),
            frame.height()
        );
        Ok(())
    }

    fn poll_key(&mut self, wait: Duration) -> Option<Key> {
        self.keys.poll(wait)
    }

    fn destroy_window(&mut self) {
        if let Some(name) = self.window.take() {
            log::info!("Headless display '{name}' closed after {} frames", self.shown);
        }
    }
}
