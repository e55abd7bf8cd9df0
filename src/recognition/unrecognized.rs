//! Diagnostic dumps for unrecognized samples.
//!
//! Glyphs and cells the recognizer gave up on are stored for later manual
//! labeling. The dump is best-effort: a full disk or missing directory must
//! never take down the reading loop.

use std::path::{Path, PathBuf};

use chrono::Local;
use image::{GrayImage, RgbImage};
use tracing::warn;

use super::templates::normalize_size;

/// Write-only store for glyphs and cells nothing matched.
pub struct UnrecognizedSink {
    sign_dir: PathBuf,
    cell_dir: PathBuf,
}

impl UnrecognizedSink {
    pub fn new(sign_dir: &Path, cell_dir: &Path) -> Self {
        for dir in [sign_dir, cell_dir] {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!("Failed to create dump directory {}: {}", dir.display(), e);
            }
        }
        Self {
            sign_dir: sign_dir.to_path_buf(),
            cell_dir: cell_dir.to_path_buf(),
        }
    }

    /// Files a glyph, tagging the file name with the best guess and score.
    pub fn file_glyph(&self, glyph: &GrayImage, guess: Option<u8>, confidence: f32) {
        let stamp = Local::now().format("%Y-%m-%d %H-%M-%S-%f");
        let name = match guess {
            Some(digit) => format!("{} {}({:.0}%).png", stamp, digit, confidence * 100.0),
            None => format!("{} UNRECOGNIZED.png", stamp),
        };
        let path = self.sign_dir.join(name);
        if let Err(e) = normalize_size(glyph).save(&path) {
            warn!("Failed to save unrecognized glyph {}: {}", path.display(), e);
        }
    }

    /// Files a whole cell whose read came back indeterminate.
    pub fn file_cell(&self, cell: &RgbImage) {
        let stamp = Local::now().format("%Y-%m-%d %H-%M-%S-%f");
        let path = self.cell_dir.join(format!("{}.png", stamp));
        if let Err(e) = cell.save(&path) {
            warn!("Failed to save unrecognized cell {}: {}", path.display(), e);
        }
    }
}
