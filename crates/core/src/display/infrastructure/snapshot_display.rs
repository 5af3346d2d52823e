use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::display::domain::display_sink::{DisplaySink, Key};
use crate::shared::frame::Frame;

use super::stdin_keys::KeyQueue;

/// Display sink that writes every shown frame to `frame_NNNNNN.png` in a
/// directory, using the `image` crate.
pub struct SnapshotDisplay {
    dir: PathBuf,
    window: Option<String>,
    shown: u64,
    keys: KeyQueue,
}

impl SnapshotDisplay {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            window: None,
            shown: 0,
            keys: KeyQueue::default(),
        }
    }

    pub fn with_keys(mut self, keys: Receiver<Key>) -> Self {
        self.keys = KeyQueue::new(Some(keys));
        self
    }

    pub fn snapshot_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

fn save_frame(path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
    let (w, h) = (frame.width(), frame.height());
    let data = frame.data().to_vec();
    match frame.channels() {
        1 => image::GrayImage::from_raw(w, h, data)
            .ok_or("Failed to create image from frame data")?
            .save(path)?,
        3 => image::RgbImage::from_raw(w, h, data)
            .ok_or("Failed to create image from frame data")?
            .save(path)?,
        4 => image::RgbaImage::from_raw(w, h, data)
            .ok_or("Failed to create image from frame data")?
            .save(path)?,
        n => return Err(format!("Cannot save a frame with {n} channels").into()),
    }
    Ok(())
}

impl DisplaySink for SnapshotDisplay {
    fn create_window(&mut self, name: &str) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.dir)?;
        log::info!("Display '{name}' writing snapshots to {}", self.dir.display());
        self.window = Some(name.to_string());
        Ok(())
    }

    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.window.is_none() {
            return Err("SnapshotDisplay: window not created".into());
        }
        let path = self.snapshot_path(self.shown);
        save_frame(&path, frame)?;
        self.shown += 1;
        Ok(())
    }

    fn poll_key(&mut self, wait: Duration) -> Option<Key> {
        self.keys.poll(wait)
    }

    fn destroy_window(&mut self) {
        if let Some(name) = self.window.take() {
            log::info!(
                "Display '{name}' closed, {} snapshots in {}",
                self.shown,
                self.dir.display()
            );
        }
    }
}
