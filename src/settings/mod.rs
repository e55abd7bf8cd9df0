//! Typed session settings.
//!
//! Everything configurable is loaded from one JSON file at startup and
//! validated into plain structs; the rest of the program never touches raw
//! JSON. A malformed file is a broken deployment and fails the session
//! start, unlike a bad frame which is always survivable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::table::SequencePattern;

/// Named column sequence layouts of the printed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSequence {
    /// Layout with the club column: lane, name, club, then the per-throw
    /// and result columns.
    WithClub,
    /// Same layout without the club column.
    WithoutClub,
}

impl ColumnSequence {
    /// The relative-width signature of this layout.
    pub fn pattern(&self) -> SequencePattern {
        match self {
            ColumnSequence::WithClub => {
                SequencePattern::new(vec![0, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1])
            }
            ColumnSequence::WithoutClub => {
                SequencePattern::new(vec![0, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1])
            }
        }
    }

    /// Column indexes of (lane, throw count, cumulative total).
    pub fn data_columns(&self) -> (usize, usize, usize) {
        match self {
            ColumnSequence::WithClub => (0, 3, 12),
            ColumnSequence::WithoutClub => (0, 2, 11),
        }
    }

    /// Column holding the player name, used as the drift reference.
    pub fn identity_column(&self) -> usize {
        1
    }
}

/// Shape and layout of one selectable game type.
#[derive(Debug, Clone, Deserialize)]
pub struct GameType {
    pub number_of_teams: usize,
    pub players_per_team: usize,
    pub column_sequence: ColumnSequence,
    /// Team index per table row, top to bottom; -1 marks a row that belongs
    /// to no seat (free lane, header remnants).
    pub affiliation: Vec<i32>,
    /// Worksheet cell map for the spreadsheet sink, if one is used.
    #[serde(default)]
    pub worksheet_cells: Option<PathBuf>,
}

impl GameType {
    /// Expands the affiliation vector into per-row seats.
    ///
    /// Players are assigned seat numbers within their team in row order,
    /// the way the roster sheet lists them.
    pub fn seats(&self) -> Vec<Option<(usize, usize)>> {
        let mut next_seat: BTreeMap<usize, usize> = BTreeMap::new();
        self.affiliation
            .iter()
            .map(|&team| {
                if team < 0 {
                    None
                } else {
                    let team = team as usize;
                    let seat = next_seat.entry(team).or_insert(0);
                    let assigned = *seat;
                    *seat += 1;
                    Some((team, assigned))
                }
            })
            .collect()
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.number_of_teams == 0 || self.players_per_team == 0 {
            bail!("Game type '{}' has an empty roster", name);
        }
        for &team in &self.affiliation {
            if team >= self.number_of_teams as i32 {
                bail!(
                    "Game type '{}' affiliates a row to team {} but has only {} teams",
                    name,
                    team,
                    self.number_of_teams
                );
            }
        }
        for team in 0..self.number_of_teams {
            let assigned = self
                .affiliation
                .iter()
                .filter(|&&t| t == team as i32)
                .count();
            if assigned != self.players_per_team {
                bail!(
                    "Game type '{}' affiliates {} rows to team {} but rosters {} players",
                    name,
                    assigned,
                    team,
                    self.players_per_team
                );
            }
        }
        Ok(())
    }
}

/// Recognition thresholds and storage locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Confidence from which a glyph also grows its template class.
    pub save_to_class: f32,
    /// Confidence from which the template scan stops early.
    pub end_search: f32,
    /// Confidence below which a glyph is dumped as unrecognized.
    pub save_as_unrecognized: f32,
    pub templates_dir: PathBuf,
    pub unrecognized_sign_dir: PathBuf,
    pub unrecognized_cell_dir: PathBuf,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            save_to_class: 0.95,
            end_search: 0.90,
            save_as_unrecognized: 0.75,
            templates_dir: crate::paths::get_templates_dir(),
            unrecognized_sign_dir: crate::paths::get_unrecognized_sign_dir(),
            unrecognized_cell_dir: crate::paths::get_unrecognized_cell_dir(),
        }
    }
}

impl RecognitionSettings {
    /// The tiers only make sense ordered
    /// `save_as_unrecognized < end_search <= save_to_class`.
    pub fn validate_thresholds(&self) -> Result<()> {
        if self.save_to_class < self.end_search || self.end_search <= self.save_as_unrecognized {
            bail!(
                "Recognition thresholds out of order: save_to_class {} >= end_search {} > save_as_unrecognized {} required",
                self.save_to_class,
                self.end_search,
                self.save_as_unrecognized
            );
        }
        Ok(())
    }
}

/// Complete session settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub game_types: BTreeMap<String, GameType>,
    /// Game type the session runs with; defaults to the first by name.
    #[serde(default)]
    pub selected_game_type: Option<String>,
    #[serde(default)]
    pub recognition: RecognitionSettings,
    /// Directory the folder frame source replays from.
    #[serde(default = "crate::paths::get_frames_dir")]
    pub frames_dir: PathBuf,
    /// Directory match reports are written to.
    #[serde(default = "crate::paths::get_results_dir")]
    pub results_dir: PathBuf,
}

impl Settings {
    /// The game type the session should run with.
    pub fn selected(&self) -> Result<(&str, &GameType)> {
        let name = match &self.selected_game_type {
            Some(name) => name.as_str(),
            None => self
                .game_types
                .keys()
                .next()
                .context("Settings define no game types")?
                .as_str(),
        };
        let game_type = self
            .game_types
            .get(name)
            .with_context(|| format!("Selected game type '{}' is not defined", name))?;
        Ok((name, game_type))
    }

    fn validate(&self) -> Result<()> {
        if self.game_types.is_empty() {
            bail!("Settings define no game types");
        }
        for (name, game_type) in &self.game_types {
            game_type.validate(name)?;
        }
        self.recognition.validate_thresholds()?;
        self.selected()?;
        Ok(())
    }
}

/// Loads and validates settings from a JSON file.
pub fn load(path: &Path) -> Result<Settings> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}
