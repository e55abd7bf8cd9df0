//! Reference-crop drift detection.
//!
//! Re-running full geometry detection on every frame is wasted work while
//! the table sits still. Instead one designated identity column (the
//! player-name cell) is cached per row; as long as the live crops still
//! correlate with the cached ones, the stored geometry remains valid.

use image::{GrayImage, RgbImage, imageops};

use crate::recognition::normalized_match;

use super::detect::RowBand;

/// Correlation below which a reference crop counts as moved.
const MATCH_THRESHOLD: f32 = 0.95;

/// Watches whether the physical table has shifted under the camera.
pub struct DriftWatch {
    identity_column: usize,
    references: Vec<GrayImage>,
    rows: Vec<RowBand>,
}

impl DriftWatch {
    pub fn new() -> Self {
        Self {
            identity_column: 1,
            references: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// True when geometry must be re-detected: no reference exists yet, the
    /// stored layout is inconsistent, or any live identity crop stopped
    /// matching its reference.
    pub fn has_moved(&self, frame: &RgbImage) -> bool {
        if self.rows.is_empty() || self.rows.len() != self.references.len() {
            return true;
        }
        for (row, reference) in self.rows.iter().zip(&self.references) {
            let Ok(crop) = row.cell_image(frame, self.identity_column) else {
                return true;
            };
            let live = imageops::grayscale(&crop);
            if normalized_match(&live, reference) < MATCH_THRESHOLD {
                return true;
            }
        }
        false
    }

    /// Replaces the reference set after a successful geometry detection.
    pub fn refresh(&mut self, frame: &RgbImage, rows: Vec<RowBand>, identity_column: usize) {
        self.identity_column = identity_column;
        self.references = rows
            .iter()
            .filter_map(|row| row.cell_image(frame, identity_column).ok())
            .map(|crop| imageops::grayscale(&crop))
            .collect();
        self.rows = rows;
    }

    pub fn rows(&self) -> &[RowBand] {
        &self.rows
    }
}

impl Default for DriftWatch {
    fn default() -> Self {
        Self::new()
    }
}
