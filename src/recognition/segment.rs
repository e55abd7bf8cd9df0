//! Cell-to-glyph segmentation.
//!
//! A cell crop is normalized to a fixed working size, binarized, cleaned of
//! faint grid remnants and split into per-digit partitions. Each partition
//! is then searched for the actual ink runs so the glyph is trimmed to its
//! bounding box before being brought to the canonical template size.

use image::{GrayImage, Luma, RgbImage, imageops};

use super::templates::{TEMPLATE_HEIGHT, TEMPLATE_WIDTH};

/// How many digits a cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitCount {
    One,
    Three,
}

/// Fixed binarization threshold for the resized cell.
const BINARY_THRESHOLD: u8 = 152;
/// Minimum run length for an ink band to count as part of a glyph.
const MIN_GLYPH_SPAN: u32 = 5;
/// Lines with less white than this fraction are considered grid remnants.
const FAINT_LINE_WHITE_FRACTION: f64 = 0.2;
/// Vertical crop applied after cleaning, in resized-cell coordinates.
const CELL_CROP_TOP: u32 = 2;
const CELL_CROP_BOTTOM: u32 = 69;
/// Glyph interior size before the uniform white border is added.
const GLYPH_INTERIOR_WIDTH: u32 = TEMPLATE_WIDTH - 2;
const GLYPH_INTERIOR_HEIGHT: u32 = TEMPLATE_HEIGHT - 2;

/// Splits a cell image into canonical-size glyph crops, left to right.
///
/// An empty result means the cell holds no digits at all, which for a
/// score table is a valid state (player has not thrown yet).
pub fn split_cell(cell: &RgbImage, count: DigitCount) -> Vec<GrayImage> {
    let (resize_width, resize_height, partitions): (u32, u32, &[(u32, u32)]) = match count {
        DigitCount::One => (100, 100, &[(25, 75)]),
        DigitCount::Three => (200, 100, &[(50, 99), (98, 147), (146, 194)]),
    };

    let resized = imageops::resize(cell, resize_width, resize_height, imageops::FilterType::Triangle);
    let gray = max_channel(&resized);
    let blurred = imageops::blur(&gray, 1.5);
    let mut binary = threshold(&blurred, BINARY_THRESHOLD);
    clear_faint_rows(&mut binary);
    clear_faint_columns(&mut binary);
    let binary = imageops::crop_imm(
        &binary,
        0,
        CELL_CROP_TOP,
        resize_width,
        CELL_CROP_BOTTOM - CELL_CROP_TOP,
    )
    .to_image();

    let mut glyphs = Vec::new();
    for &(x0, x1) in partitions {
        let partition = imageops::crop_imm(&binary, x0, 0, x1 - x0, binary.height()).to_image();
        for (top, bottom) in row_ink_runs(&partition, MIN_GLYPH_SPAN) {
            let band =
                imageops::crop_imm(&partition, 0, top, partition.width(), bottom - top).to_image();
            for (left, right) in column_ink_runs(&band, MIN_GLYPH_SPAN) {
                let glyph =
                    imageops::crop_imm(&band, left, 0, right - left, band.height()).to_image();
                glyphs.push(canonicalize(&glyph));
            }
        }
    }
    glyphs
}

/// Collapses a color image to the per-pixel maximum channel.
///
/// The table print is dark on a light background in every channel; taking
/// the maximum suppresses colored glare from the hall lighting.
fn max_channel(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        Luma([p[0].max(p[1]).max(p[2])])
    })
}

fn threshold(img: &GrayImage, cut: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] > cut {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Whitens rows that are almost entirely ink: those are border or grid
/// remnants, not digit strokes.
fn clear_faint_rows(img: &mut GrayImage) {
    let width = img.width();
    let limit = (width as f64 * 255.0 * FAINT_LINE_WHITE_FRACTION) as u64;
    for y in 0..img.height() {
        let sum: u64 = (0..width).map(|x| img.get_pixel(x, y)[0] as u64).sum();
        if sum < limit {
            for x in 0..width {
                img.put_pixel(x, y, Luma([255]));
            }
        }
    }
}

/// Column counterpart of [`clear_faint_rows`].
fn clear_faint_columns(img: &mut GrayImage) {
    let height = img.height();
    let limit = (height as f64 * 255.0 * FAINT_LINE_WHITE_FRACTION) as u64;
    for x in 0..img.width() {
        let sum: u64 = (0..height).map(|y| img.get_pixel(x, y)[0] as u64).sum();
        if sum < limit {
            for y in 0..height {
                img.put_pixel(x, y, Luma([255]));
            }
        }
    }
}

/// Maximal runs of consecutive rows containing any ink, at least `min_span`
/// tall. Bounds are end-exclusive.
fn row_ink_runs(img: &GrayImage, min_span: u32) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut start: Option<u32> = None;
    for y in 0..img.height() {
        let has_ink = (0..img.width()).any(|x| img.get_pixel(x, y)[0] != 255);
        match (has_ink, start) {
            (true, None) => start = Some(y),
            (false, Some(s)) => {
                if y - s >= min_span {
                    runs.push((s, y));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if img.height() - s >= min_span {
            runs.push((s, img.height()));
        }
    }
    runs
}

/// Column counterpart of [`row_ink_runs`].
fn column_ink_runs(img: &GrayImage, min_span: u32) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut start: Option<u32> = None;
    for x in 0..img.width() {
        let has_ink = (0..img.height()).any(|y| img.get_pixel(x, y)[0] != 255);
        match (has_ink, start) {
            (true, None) => start = Some(x),
            (false, Some(s)) => {
                if x - s >= min_span {
                    runs.push((s, x));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if img.width() - s >= min_span {
            runs.push((s, img.width()));
        }
    }
    runs
}

/// Resizes a trimmed glyph to the interior size and adds the uniform white
/// border, yielding the canonical template size.
fn canonicalize(glyph: &GrayImage) -> GrayImage {
    let interior = imageops::resize(
        glyph,
        GLYPH_INTERIOR_WIDTH,
        GLYPH_INTERIOR_HEIGHT,
        imageops::FilterType::Triangle,
    );
    let mut padded = GrayImage::from_pixel(TEMPLATE_WIDTH, TEMPLATE_HEIGHT, Luma([255]));
    imageops::overlay(&mut padded, &interior, 1, 1);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// A white cell with a solid dark digit-like block painted into each
    /// listed partition slot (slot 0 = leftmost of a three-digit cell).
    ///
    /// Block positions land inside the fixed partitions after the resize to
    /// the segmenter's working sizes.
    fn cell_with_blocks(slots: &[usize]) -> RgbImage {
        let mut cell = RgbImage::from_pixel(60, 30, Rgb([250, 250, 250]));
        for &slot in slots {
            let x0 = 18 + slot as u32 * 15;
            for y in 6..24 {
                for x in x0..x0 + 9 {
                    cell.put_pixel(x, y, Rgb([10, 10, 10]));
                }
            }
        }
        cell
    }

    #[test]
    fn test_single_digit_cell_yields_one_glyph() {
        let cell = cell_with_blocks(&[1]);
        let glyphs = split_cell(&cell, DigitCount::One);
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0].dimensions(), (TEMPLATE_WIDTH, TEMPLATE_HEIGHT));
    }

    #[test]
    fn test_three_digit_cell_yields_three_glyphs() {
        let cell = cell_with_blocks(&[0, 1, 2]);
        let glyphs = split_cell(&cell, DigitCount::Three);
        assert_eq!(glyphs.len(), 3);
        for glyph in &glyphs {
            assert_eq!(glyph.dimensions(), (TEMPLATE_WIDTH, TEMPLATE_HEIGHT));
        }
    }

    #[test]
    fn test_partially_filled_cell() {
        // Leading digit slot empty, as in a two-digit score in a
        // three-digit cell.
        let cell = cell_with_blocks(&[1, 2]);
        let glyphs = split_cell(&cell, DigitCount::Three);
        assert_eq!(glyphs.len(), 2);
    }

    #[test]
    fn test_blank_cell_yields_no_glyphs() {
        let cell = RgbImage::from_pixel(60, 30, Rgb([250, 250, 250]));
        assert!(split_cell(&cell, DigitCount::One).is_empty());
        assert!(split_cell(&cell, DigitCount::Three).is_empty());
    }

    #[test]
    fn test_glyph_has_ink_interior_and_white_border() {
        let cell = cell_with_blocks(&[1]);
        let glyph = &split_cell(&cell, DigitCount::One)[0];

        // Border ring is the uniform padding.
        for x in 0..TEMPLATE_WIDTH {
            assert_eq!(glyph.get_pixel(x, 0)[0], 255);
            assert_eq!(glyph.get_pixel(x, TEMPLATE_HEIGHT - 1)[0], 255);
        }
        // The trimmed interior is dominated by the digit's ink.
        let ink = glyph.pixels().filter(|p| p[0] == 0).count();
        assert!(ink > 100, "only {} ink pixels", ink);
    }

    #[test]
    fn test_grid_remnant_row_is_cleared() {
        // A cell whose top edge kept a piece of the table grid: a dark line
        // covering the full width. It must not produce a glyph.
        let mut cell = RgbImage::from_pixel(60, 30, Rgb([250, 250, 250]));
        for y in 0..3 {
            for x in 0..60 {
                cell.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }
        assert!(split_cell(&cell, DigitCount::One).is_empty());
    }
}
