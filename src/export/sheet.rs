//! Spreadsheet synchronization.
//!
//! Authentication and the wire protocol live outside the core behind
//! [`SpreadsheetTransport`]. The batcher resolves every mapped statistic
//! from a snapshot, diffs against what it last pushed, and sends only the
//! changed cells. A worksheet update is slow and rate-limited, so pushing
//! the whole map every cycle is not an option.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::scoring::Scoreboard;

use super::ScoreSink;

/// One worksheet cell write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    /// A1-style coordinate, e.g. `C7`.
    pub cell: String,
    pub value: String,
}

/// Applies batched cell writes to a worksheet.
pub trait SpreadsheetTransport: Send {
    fn apply(&mut self, updates: &[CellUpdate]) -> Result<()>;
}

/// Which worksheet cell each statistic lands in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellMap {
    #[serde(default)]
    pub players: Vec<PlayerCells>,
    #[serde(default)]
    pub teams: Vec<TeamCells>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerCells {
    pub team: usize,
    pub player: usize,
    /// Statistic name → A1 coordinate.
    pub cells: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamCells {
    pub team: usize,
    pub cells: HashMap<String, String>,
}

impl CellMap {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cell map {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cell map {}", path.display()))
    }
}

/// Diffs snapshots against the worksheet state and pushes the changes.
pub struct SheetSync {
    map: CellMap,
    transport: Box<dyn SpreadsheetTransport>,
    pushed: HashMap<String, String>,
}

impl SheetSync {
    pub fn new(map: CellMap, transport: Box<dyn SpreadsheetTransport>) -> Self {
        Self {
            map,
            transport,
            pushed: HashMap::new(),
        }
    }

    /// Resolves every mapped statistic and keeps the cells whose value
    /// differs from what was last pushed.
    fn changed_cells(&self, board: &Scoreboard) -> Vec<CellUpdate> {
        let mut updates = Vec::new();
        for entry in &self.map.players {
            let Some(player) = board
                .teams
                .get(entry.team)
                .and_then(|team| team.players.get(entry.player))
            else {
                continue;
            };
            for (stat, cell) in &entry.cells {
                push_if_changed(&mut updates, &self.pushed, cell, player.stat(stat));
            }
        }
        for entry in &self.map.teams {
            let Some(team) = board.teams.get(entry.team) else {
                continue;
            };
            for (stat, cell) in &entry.cells {
                push_if_changed(&mut updates, &self.pushed, cell, team.totals.stat(stat));
            }
        }
        updates
    }
}

fn push_if_changed(
    updates: &mut Vec<CellUpdate>,
    pushed: &HashMap<String, String>,
    cell: &str,
    value: String,
) {
    if pushed.get(cell) != Some(&value) {
        updates.push(CellUpdate {
            cell: cell.to_string(),
            value,
        });
    }
}

impl ScoreSink for SheetSync {
    /// Transport failures leave the pushed-state untouched, so the same
    /// cells are retried on the next publish.
    fn publish(&mut self, board: &Scoreboard) -> Result<()> {
        let updates = self.changed_cells(board);
        if updates.is_empty() {
            return Ok(());
        }
        self.transport.apply(&updates)?;
        for update in updates {
            self.pushed.insert(update.cell, update.value);
        }
        Ok(())
    }
}
