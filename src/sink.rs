use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::frame::{DisplaySurface, PixelBuffer};

/// Writes each delivered frame as `frame_000000.png`, `frame_000001.png`, ...
#[derive(Debug)]
pub struct PngSequence {
    directory: PathBuf,
    next_index: u64,
}

impl PngSequence {
    pub fn create(directory: &Path) -> Result<Self> {
        fs::create_dir_all(directory)
            .with_context(|| format!("failed to create output dir {}", directory.display()))?;
        Ok(Self {
            directory: directory.to_path_buf(),
            next_index: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.next_index
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.directory.join(format!("frame_{index:06}.png"))
    }
}

impl DisplaySurface for PngSequence {
    fn present(&mut self, frame: &PixelBuffer) -> Result<()> {
        let path = self.frame_path(self.next_index);
        write_png(frame, &path)?;
        self.next_index += 1;
        Ok(())
    }

    fn label(&self) -> &'static str {
        "png-sequence"
    }
}

pub fn write_png(frame: &PixelBuffer, path: &Path) -> Result<()> {
    let image = frame.to_image()?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Keeps every delivered frame in memory.
#[derive(Debug, Default)]
pub struct FrameCollector {
    frames: Vec<PixelBuffer>,
}

impl FrameCollector {
    pub fn frames(&self) -> &[PixelBuffer] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<PixelBuffer> {
        self.frames
    }
}

impl DisplaySurface for FrameCollector {
    fn present(&mut self, frame: &PixelBuffer) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn label(&self) -> &'static str {
        "collector"
    }
}
