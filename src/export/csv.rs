//! CSV match report.
//!
//! One file per session, overwritten on every publish so a crash mid-match
//! leaves the latest complete state on disk. The report carries a match
//! header, every seat's 120 throw columns split by substitution ranges,
//! and the red-card list.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::scoring::Scoreboard;

use super::ScoreSink;

/// Total throw columns in the report (four tors of thirty).
const REPORT_THROWS: usize = 120;

/// Writes the league match report as a CSV file.
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    /// The report file is named after the session start time.
    pub fn new(results_dir: &Path) -> Self {
        let stamp = Local::now().format("%y_%m_%d__%H_%M_%S");
        Self {
            path: results_dir.join(format!("results_{}.csv", stamp)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders and writes the full report.
    pub fn save(&self, board: &Scoreboard) -> Result<()> {
        let mut text = String::new();
        text.push_str(&header_block(board));
        text.push_str(&results_block(board));
        text.push_str(&red_card_block(board));
        std::fs::write(&self.path, text)
            .with_context(|| format!("Failed to write report {}", self.path.display()))
    }
}

impl ScoreSink for CsvExporter {
    fn publish(&mut self, board: &Scoreboard) -> Result<()> {
        self.save(board)
    }
}

/// Match header: opposing teams, date and roster size. Only rendered for
/// two-team play, like the league scoring itself.
fn header_block(board: &Scoreboard) -> String {
    if board.teams.len() != 2 {
        return String::new();
    }
    let mut text = String::from("Details:\n-----\nHome, Guest, Date, Players per team\n");
    let _ = writeln!(
        text,
        "{}, {}, {}, {}\n------",
        board.teams[0].totals.name,
        board.teams[1].totals.name,
        Local::now().format("%d.%m.%y"),
        board.players_per_team(),
    );
    text
}

/// Per-player throw rows. After a substitution each player of the seat gets
/// an own row covering only the throw range they actually played.
fn results_block(board: &Scoreboard) -> String {
    let mut text = String::from("Results\n-------\nName, Team_index, Player_index");
    for throw in 1..=REPORT_THROWS {
        let _ = write!(text, ", rzut_{}", throw);
    }
    text.push('\n');

    for (team_index, team) in board.teams.iter().enumerate() {
        for (player_index, player) in team.players.iter().enumerate() {
            let throws = player.all_throws();
            let starts = player.substitutions();
            for (entry, name) in player.names().iter().enumerate() {
                let from = starts.get(entry).copied().unwrap_or(0) as usize;
                let to = starts
                    .get(entry + 1)
                    .copied()
                    .map(|t| t as usize)
                    .unwrap_or(REPORT_THROWS);
                let _ = write!(text, "{}, {}, {},", name, team_index, player_index);
                for index in 0..REPORT_THROWS {
                    if (from..to).contains(&index) {
                        if let Some(Some(value)) = throws.get(index) {
                            let _ = write!(text, "{}", value);
                        }
                    }
                    text.push(',');
                }
                text.push('\n');
            }
        }
    }
    text.push_str("--------\n");
    text
}

/// Red cards: who, which throw, and the score that did not count.
fn red_card_block(board: &Scoreboard) -> String {
    let mut text = String::from("Red cards\n---------\nTeam_index, Player_index, Throw, Rejected\n");
    for (team_index, team) in board.teams.iter().enumerate() {
        for (player_index, player) in team.players.iter().enumerate() {
            for card in &player.red_cards {
                let _ = writeln!(
                    text,
                    "{}, {}, {}, {}",
                    team_index, player_index, card.throw_number, card.rejected_value
                );
            }
        }
    }
    text.push_str("----------\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::{CellReading, RowReading};
    use tempfile::tempdir;

    fn send(board: &mut Scoreboard, team: usize, seat: usize, throw: u32, total: i32) {
        let reading = RowReading {
            lane: CellReading::Digits("1".into()),
            throws: CellReading::Digits(throw.to_string()),
            total: CellReading::Digits(total.to_string()),
        };
        board.player_mut(team, seat).update(&reading);
    }

    fn sample_board() -> Scoreboard {
        let mut board = Scoreboard::new(2, 1);
        board.teams[0].totals.name = "Home KS".into();
        board.teams[1].totals.name = "Guest KS".into();
        board
            .player_mut(0, 0)
            .set_names(vec!["Jan Kowalski".into()], vec![0]);
        send(&mut board, 0, 0, 1, 9);
        send(&mut board, 0, 0, 2, 14);
        send(&mut board, 1, 0, 1, 7);
        board
    }

    #[test]
    fn test_report_layout() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());
        exporter.save(&sample_board()).unwrap();

        let content = std::fs::read_to_string(exporter.path()).unwrap();
        assert!(content.contains("Home KS, Guest KS,"));
        assert!(content.contains("rzut_1"));
        assert!(content.contains("rzut_120"));
        assert!(content.contains("Jan Kowalski, 0, 0,9,5,"));
        assert!(content.contains("Red cards"));
    }

    #[test]
    fn test_substitution_splits_throw_ranges() {
        let mut board = sample_board();
        board.player_mut(0, 0).set_names(
            vec!["Jan Kowalski".into(), "Piotr Nowak".into()],
            vec![0, 1],
        );

        let block = results_block(&board);
        let rows: Vec<&str> = block
            .lines()
            .filter(|line| line.contains("Kowalski") || line.contains("Nowak"))
            .collect();
        assert_eq!(rows.len(), 2);
        // The first player keeps only throw 1, the substitute starts at 2.
        assert!(rows[0].starts_with("Jan Kowalski, 0, 0,9,,"));
        assert!(rows[1].starts_with("Piotr Nowak, 0, 0,,5,"));
    }

    #[test]
    fn test_red_cards_listed() {
        let mut board = sample_board();
        board.player_mut(1, 0).add_red_card(17, 12);

        let block = red_card_block(&board);
        assert!(block.contains("1, 0, 17, 12"));
    }

    #[test]
    fn test_publish_overwrites_previous_report() {
        let dir = tempdir().unwrap();
        let mut exporter = CsvExporter::new(dir.path());
        let mut board = sample_board();
        exporter.publish(&board).unwrap();

        send(&mut board, 0, 0, 3, 20);
        exporter.publish(&board).unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        let content = std::fs::read_to_string(exporter.path()).unwrap();
        assert!(content.contains("9,5,6,"));
    }
}
