//! Frame acquisition.
//!
//! Camera device selection and driver plumbing stay outside the core:
//! anything that can hand over frames implements [`FrameSource`]. Frames are
//! normalized to a fixed working resolution so the geometry constants keep
//! their meaning across sources.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{RgbImage, imageops};
use tracing::warn;

/// Working frame width every source output is resized to.
pub const FRAME_WIDTH: u32 = 1280;
/// Working frame height every source output is resized to.
pub const FRAME_HEIGHT: u32 = 720;

/// A source of table frames.
pub trait FrameSource: Send {
    /// Returns the next frame, or `None` when no frame is currently
    /// available. `None` is not an error: callers back off and retry.
    fn capture(&mut self) -> Result<Option<RgbImage>>;
}

/// Resizes a frame to the working resolution if needed.
pub fn normalize_frame(frame: RgbImage) -> RgbImage {
    if frame.dimensions() == (FRAME_WIDTH, FRAME_HEIGHT) {
        frame
    } else {
        imageops::resize(
            &frame,
            FRAME_WIDTH,
            FRAME_HEIGHT,
            imageops::FilterType::Triangle,
        )
    }
}

/// Replays still images from a directory in file-name order.
///
/// Stands in for a live camera in offline runs and tests. Once the folder is
/// exhausted the source keeps returning `None`, which the session loop treats
/// the same as a camera that stopped delivering frames.
pub struct FolderFrameSource {
    files: Vec<PathBuf>,
    next: usize,
}

impl FolderFrameSource {
    pub fn new(dir: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("png") | Some("jpg") | Some("jpeg") | Some("bmp")
                )
            })
            .collect();
        files.sort();
        Ok(Self { files, next: 0 })
    }

    /// Number of frames left to replay.
    pub fn remaining(&self) -> usize {
        self.files.len().saturating_sub(self.next)
    }
}

impl FrameSource for FolderFrameSource {
    fn capture(&mut self) -> Result<Option<RgbImage>> {
        while self.next < self.files.len() {
            let path = self.files[self.next].clone();
            self.next += 1;
            match image::open(&path) {
                Ok(img) => return Ok(Some(normalize_frame(img.to_rgb8()))),
                Err(e) => {
                    // Skip unreadable entries instead of stalling the replay.
                    warn!("Skipping unreadable frame {}: {}", path.display(), e);
                }
            }
        }
        Ok(None)
    }
}
