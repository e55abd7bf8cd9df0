//! Table geometry.
//!
//! Locates the score-table rows and cells in a frame, confirms a run of
//! cells really is the scoring table by its column-width signature, and
//! notices when the printed table has physically moved.

mod binarize;
mod detect;
mod drift;
mod sequence;

pub use binarize::binarize;
pub use detect::{CellBand, Detection, RowBand, TableDetector};
pub use drift::DriftWatch;
pub use sequence::{MAX_CELL_GAP, SequencePattern};
