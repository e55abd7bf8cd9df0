//! Cell and row value reading.
//!
//! Composes the segmenter and the recognizer into "what number is in this
//! cell", applying the confidence tiers that decide whether a match is
//! trusted, trusted enough to grow the template library, or dumped for
//! manual labeling.

use anyhow::{Context, Result, bail};
use image::RgbImage;
use tracing::warn;

use crate::settings::RecognitionSettings;
use crate::table::RowBand;

use super::matcher::GlyphRecognizer;
use super::segment::{DigitCount, split_cell};
use super::templates::TemplateRepository;
use super::unrecognized::UnrecognizedSink;

/// Result of reading one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellReading {
    /// At least one glyph could not be recognized; the cell value is
    /// indeterminate. Distinct from a cell that simply holds no digits.
    Unreadable,
    /// The cell holds no digits at all.
    Blank,
    /// Every glyph was recognized; digits in left-to-right order.
    Digits(String),
}

impl CellReading {
    /// Parses the reading as a number. `Blank` and `Unreadable` carry none.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            CellReading::Digits(digits) => digits.parse().ok(),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellReading::Blank)
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, CellReading::Unreadable)
    }
}

/// Reads numeric cell contents through the template recognizer.
pub struct CellValueReader {
    repository: TemplateRepository,
    recognizer: GlyphRecognizer,
    sink: UnrecognizedSink,
    save_to_class: f32,
    save_as_unrecognized: f32,
}

impl CellValueReader {
    /// Fails when the threshold ordering
    /// `save_as_unrecognized < end_search <= save_to_class` is violated;
    /// that is a broken deployment, not a bad frame.
    pub fn new(
        repository: TemplateRepository,
        sink: UnrecognizedSink,
        settings: &RecognitionSettings,
    ) -> Result<Self> {
        settings.validate_thresholds()?;
        Ok(Self {
            repository,
            recognizer: GlyphRecognizer::new(settings.end_search),
            sink,
            save_to_class: settings.save_to_class,
            save_as_unrecognized: settings.save_as_unrecognized,
        })
    }

    /// Reads a cell expected to hold `count` digits.
    ///
    /// One unrecognized glyph poisons the whole cell: a partially read
    /// number is worse than none, so the result is `Unreadable` rather than
    /// a shortened digit string.
    pub fn read(&mut self, cell: &RgbImage, count: DigitCount) -> CellReading {
        let glyphs = split_cell(cell, count);
        if glyphs.is_empty() {
            return CellReading::Blank;
        }

        let mut digits = String::new();
        let mut every_glyph_recognized = true;
        for glyph in &glyphs {
            let matched = self.recognizer.match_glyph(&self.repository, glyph);
            match matched.digit {
                Some(digit) if matched.confidence >= self.save_as_unrecognized => {
                    digits.push(char::from(b'0' + digit));
                    if matched.confidence >= self.save_to_class {
                        if let Err(e) = self.repository.add(digit, glyph) {
                            warn!("Failed to grow template class {}: {:#}", digit, e);
                        }
                    }
                }
                _ => {
                    self.sink
                        .file_glyph(glyph, matched.digit, matched.confidence);
                    every_glyph_recognized = false;
                }
            }
        }

        if every_glyph_recognized {
            CellReading::Digits(digits)
        } else {
            self.sink.file_cell(cell);
            CellReading::Unreadable
        }
    }

    #[cfg(test)]
    pub fn repository(&self) -> &TemplateRepository {
        &self.repository
    }
}

/// One player row read off a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReading {
    /// Lane number cell; blank while the player is off the lanes.
    pub lane: CellReading,
    /// Within-tor throw number cell.
    pub throws: CellReading,
    /// Cumulative score cell.
    pub total: CellReading,
}

/// Reads the three data columns of a player row.
pub struct RowReader {
    reader: CellValueReader,
    lane_column: usize,
    throws_column: usize,
    total_column: usize,
    rows: Vec<RowBand>,
}

impl RowReader {
    pub fn new(
        reader: CellValueReader,
        lane_column: usize,
        throws_column: usize,
        total_column: usize,
    ) -> Self {
        Self {
            reader,
            lane_column,
            throws_column,
            total_column,
            rows: Vec::new(),
        }
    }

    /// Replaces the row geometry after a fresh table detection.
    pub fn set_rows(&mut self, rows: Vec<RowBand>) {
        self.rows = rows;
    }

    pub fn set_columns(&mut self, lane: usize, throws: usize, total: usize) {
        self.lane_column = lane;
        self.throws_column = throws;
        self.total_column = total;
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Reads the lane, throw and total cells of row `index`.
    ///
    /// An index beyond the detected rows is a caller bug and fails hard.
    pub fn read_row(&mut self, frame: &RgbImage, index: usize) -> Result<RowReading> {
        let Some(row) = self.rows.get(index).cloned() else {
            bail!(
                "Row {} requested but only {} rows are known",
                index,
                self.rows.len()
            );
        };

        let lane_cell = row
            .cell_image(frame, self.lane_column)
            .context("Failed to crop lane cell")?;
        let throws_cell = row
            .cell_image(frame, self.throws_column)
            .context("Failed to crop throw cell")?;
        let total_cell = row
            .cell_image(frame, self.total_column)
            .context("Failed to crop total cell")?;

        Ok(RowReading {
            lane: self.reader.read(&lane_cell, DigitCount::One),
            throws: self.reader.read(&throws_cell, DigitCount::Three),
            total: self.reader.read(&total_cell, DigitCount::Three),
        })
    }
}
