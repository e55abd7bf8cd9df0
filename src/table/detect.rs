//! Row and cell band detection.
//!
//! Works on the binarized frame: a printed table row is a horizontal band
//! of mostly-white pixels, a cell a vertical band inside it. Both are found
//! with the same run detection, the column pass on a rotated slice so the
//! first column maps to the first scanned line.

use anyhow::{Result, bail};
use image::{GrayImage, RgbImage, imageops};

use super::binarize::binarize;
use super::sequence::SequencePattern;

/// Mean line value (0-255) above which a frame line counts as table ink.
const ROW_INK_THRESHOLD: u32 = 150;
/// Mean line value above which a row-slice line counts as cell ink.
const COLUMN_INK_THRESHOLD: u32 = 50;
/// Minimum run height for a row band.
const MIN_ROW_HEIGHT: u32 = 10;
/// Minimum run width for a cell band.
const MIN_CELL_WIDTH: u32 = 15;

/// Horizontal bounds of one detected cell inside a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBand {
    pub left: u32,
    pub right: u32,
}

impl CellBand {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }
}

/// One detected table row with its cells in left-to-right order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBand {
    pub top: u32,
    pub bottom: u32,
    pub cells: Vec<CellBand>,
}

impl RowBand {
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Crops the cell at `column` out of `frame`.
    ///
    /// A column index outside the detected cells, or bands outside the frame,
    /// are caller bugs and fail hard.
    pub fn cell_image(&self, frame: &RgbImage, column: usize) -> Result<RgbImage> {
        let Some(cell) = self.cells.get(column) else {
            bail!(
                "Row has only {} cells, column {} requested",
                self.cells.len(),
                column
            );
        };
        if cell.right > frame.width() || self.bottom > frame.height() {
            bail!(
                "Cell band {}..{} x {}..{} exceeds frame {}x{}",
                cell.left,
                cell.right,
                self.top,
                self.bottom,
                frame.width(),
                frame.height()
            );
        }
        Ok(imageops::crop_imm(
            frame,
            cell.left,
            self.top,
            cell.width(),
            self.height(),
        )
        .to_image())
    }
}

/// Result of one detection pass over a frame.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Every row/cell found, regardless of the sequence. Diagnostic only.
    pub all_rows: Vec<RowBand>,
    /// Rows whose cells satisfy the column sequence. Operational output.
    pub matching_rows: Vec<RowBand>,
}

/// Locates the player rows of the scoring table in a frame.
pub struct TableDetector {
    sequence: SequencePattern,
}

impl TableDetector {
    pub fn new(sequence: SequencePattern) -> Self {
        Self { sequence }
    }

    pub fn set_sequence(&mut self, sequence: SequencePattern) {
        self.sequence = sequence;
    }

    /// Scans a frame for rows of cells matching the column sequence.
    ///
    /// An empty `matching_rows` means the table was not found in this frame;
    /// callers retry on a later frame.
    pub fn detect(&self, frame: &RgbImage) -> Detection {
        if frame.width() == 0 || frame.height() == 0 {
            return Detection::default();
        }

        let binary = binarize(frame);
        let mut detection = Detection::default();

        for (top, bottom) in scan_runs(&binary, MIN_ROW_HEIGHT, ROW_INK_THRESHOLD) {
            let slice =
                imageops::crop_imm(&binary, 0, top, binary.width(), bottom - top).to_image();
            // Rotate so the first column becomes the first scanned line.
            let rotated = imageops::rotate90(&slice);
            let cells: Vec<CellBand> = scan_runs(&rotated, MIN_CELL_WIDTH, COLUMN_INK_THRESHOLD)
                .into_iter()
                .map(|(left, right)| CellBand { left, right })
                .collect();

            if let Some(window) = self.sequence.find_window(&cells) {
                detection.matching_rows.push(RowBand {
                    top,
                    bottom,
                    cells: window.to_vec(),
                });
            }
            detection.all_rows.push(RowBand { top, bottom, cells });
        }

        detection
    }
}

/// Finds maximal runs of consecutive ink lines.
///
/// A line is ink when its pixel sum exceeds `threshold * line length`. Runs
/// shorter than `min_len` are dropped. Returned bounds are end-exclusive.
fn scan_runs(img: &GrayImage, min_len: u32, threshold: u32) -> Vec<(u32, u32)> {
    let width = img.width() as u64;
    let mut runs = Vec::new();
    let mut run_start: Option<u32> = None;

    for y in 0..img.height() {
        let sum: u64 = (0..img.width()).map(|x| img.get_pixel(x, y)[0] as u64).sum();
        let is_ink = sum > threshold as u64 * width;

        match (is_ink, run_start) {
            (true, None) => run_start = Some(y),
            (false, Some(start)) => {
                if y - start >= min_len {
                    runs.push((start, y));
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        let end = img.height();
        if end - start >= min_len {
            runs.push((start, end));
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    /// Paints a flat rectangle onto the frame.
    fn paint(frame: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, value: u8) {
        for y in y0..y1 {
            for x in x0..x1 {
                frame.put_pixel(x, y, Rgb([value, value, value]));
            }
        }
    }

    /// A frame the way the hall camera sees the board: dark textured
    /// background, one bright table row with the given cell widths, thin
    /// dark grid lines between cells and a border line on either side.
    fn frame_with_row(widths: &[u32], top: u32, bottom: u32) -> RgbImage {
        let mut frame = RgbImage::from_fn(200, 120, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([40, 40, 40])
            }
        });
        let mut x = 5;
        paint(&mut frame, x, top, x + 3, bottom, 0);
        x += 3;
        for &width in widths {
            paint(&mut frame, x, top, x + width, bottom, 255);
            paint(&mut frame, x + width, top, x + width + 3, bottom, 0);
            x += width + 3;
        }
        frame
    }

    #[test]
    fn test_detects_row_and_cells() {
        let frame = frame_with_row(&[20, 40, 60], 30, 60);
        let detector = TableDetector::new(SequencePattern::new(vec![0, 1, 2]));

        let detection = detector.detect(&frame);
        assert_eq!(detection.matching_rows.len(), 1);

        let row = &detection.matching_rows[0];
        assert!(row.top >= 27 && row.top <= 33, "top was {}", row.top);
        assert_eq!(row.cells.len(), 3);
        // Adaptive binarization can nibble a pixel off each border.
        for (cell, &expected) in row.cells.iter().zip(&[20u32, 40, 60]) {
            let width = cell.width();
            assert!(
                width.abs_diff(expected) <= 3,
                "cell width {} too far from {}",
                width,
                expected
            );
        }
    }

    #[test]
    fn test_sequence_mismatch_keeps_diagnostics() {
        // Decreasing widths can never satisfy an increasing pattern.
        let frame = frame_with_row(&[60, 40, 20], 30, 60);
        let detector = TableDetector::new(SequencePattern::new(vec![0, 1, 2]));

        let detection = detector.detect(&frame);
        assert!(detection.matching_rows.is_empty());
        assert_eq!(detection.all_rows.len(), 1);
        assert!(detection.all_rows[0].cells.len() >= 3);
    }

    #[test]
    fn test_empty_frame_detects_nothing() {
        let frame = RgbImage::new(0, 0);
        let detector = TableDetector::new(SequencePattern::new(vec![0, 1, 2]));
        let detection = detector.detect(&frame);
        assert!(detection.all_rows.is_empty());
        assert!(detection.matching_rows.is_empty());
    }

    #[test]
    fn test_scan_runs_finds_bands() {
        let mut img = GrayImage::from_pixel(10, 40, Luma([0]));
        for y in 5..20 {
            for x in 0..10 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        for y in 25..28 {
            for x in 0..10 {
                img.put_pixel(x, y, Luma([255]));
            }
        }

        // The second band is below the minimum height and is dropped.
        let runs = scan_runs(&img, 10, 150);
        assert_eq!(runs, vec![(5, 20)]);
    }

    #[test]
    fn test_cell_image_out_of_range_column_fails() {
        let frame = RgbImage::new(64, 64);
        let row = RowBand {
            top: 0,
            bottom: 10,
            cells: vec![CellBand { left: 0, right: 10 }],
        };
        assert!(row.cell_image(&frame, 3).is_err());
    }
}
