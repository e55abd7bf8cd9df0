//! Result export sinks.
//!
//! Sinks consume read-only scoreboard snapshots at the end of each loop
//! iteration. A failing sink is logged and retried next iteration; it never
//! stops the reading loop.

mod csv;
mod sheet;

pub use csv::CsvExporter;
pub use sheet::{CellMap, CellUpdate, PlayerCells, SheetSync, SpreadsheetTransport, TeamCells};

use anyhow::Result;

use crate::scoring::Scoreboard;

/// A downstream consumer of score snapshots.
pub trait ScoreSink: Send {
    fn publish(&mut self, board: &Scoreboard) -> Result<()>;
}
