//! Digit recognition.
//!
//! A cell image is segmented into glyph crops, each glyph is matched against
//! a per-digit template library, and confident matches grow the library
//! online. Glyphs nothing matches go to a diagnostic dump for later labeling.

mod correlate;
mod matcher;
mod reader;
mod segment;
mod templates;
mod unrecognized;

pub use correlate::normalized_match;
pub use matcher::{GlyphMatch, GlyphRecognizer};
pub use reader::{CellReading, CellValueReader, RowReader, RowReading};
pub use segment::{DigitCount, split_cell};
pub use templates::{TEMPLATE_HEIGHT, TEMPLATE_WIDTH, TemplateRepository, normalize_size};
pub use unrecognized::UnrecognizedSink;
