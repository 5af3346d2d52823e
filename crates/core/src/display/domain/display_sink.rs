use std::time::Duration;

use crate::shared::frame::Frame;

/// A key press delivered by a display sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Other(u32),
}

impl Key {
    /// Maps a raw key code the way terminal and window toolkits report it.
    pub fn from_code(code: u32) -> Self {
        match code {
            27 => Key::Escape,
            c => match char::from_u32(c) {
                Some(ch) if !ch.is_control() => Key::Char(ch),
                _ => Key::Other(c),
            },
        }
    }

    /// ESC or `q` end the run early.
    pub fn is_quit(&self) -> bool {
        matches!(self, Key::Escape | Key::Char('q') | Key::Char('Q'))
    }
}

/// Domain interface for putting frames on screen (or wherever frames go).
///
/// Mirrors a window toolkit's lifecycle: one window is created before the
/// first frame and destroyed once presentation ends.
pub trait DisplaySink: Send {
    fn create_window(&mut self, name: &str) -> Result<(), Box<dyn std::error::Error>>;

    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Waits up to `wait` for a key press.
    fn poll_key(&mut self, wait: Duration) -> Option<Key>;

    /// Must be safe to call more than once.
    fn destroy_window(&mut self);
}
