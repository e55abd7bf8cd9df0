//! Scoreboard storage.
//!
//! Holds every seat's results in roster shape. The reading loop is the only
//! writer; the control surface and the sinks work on cloned snapshots, so
//! no reader ever observes a half-applied update.

use super::league;
use super::player::PlayerResult;
use super::team::TeamResult;

/// One team: its players in seat order plus the aggregated totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    pub players: Vec<PlayerResult>,
    pub totals: TeamResult,
}

/// Results of every team and seat in the match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scoreboard {
    pub teams: Vec<Team>,
}

impl Scoreboard {
    pub fn new(number_of_teams: usize, players_per_team: usize) -> Self {
        let mut board = Self::default();
        board.reinitialize(number_of_teams, players_per_team);
        board
    }

    /// Replaces all stored results with a fresh roster of the given shape.
    pub fn reinitialize(&mut self, number_of_teams: usize, players_per_team: usize) {
        self.teams = (0..number_of_teams)
            .map(|_| Team {
                players: (0..players_per_team)
                    .map(|_| PlayerResult::default())
                    .collect(),
                totals: TeamResult::default(),
            })
            .collect();
    }

    pub fn players_per_team(&self) -> usize {
        self.teams.first().map_or(0, |team| team.players.len())
    }

    /// Mutable access to one seat. Indexes outside the roster are caller
    /// bugs and panic.
    pub fn player_mut(&mut self, team: usize, player: usize) -> &mut PlayerResult {
        &mut self.teams[team].players[player]
    }

    pub fn player(&self, team: usize, player: usize) -> &PlayerResult {
        &self.teams[team].players[player]
    }

    /// Recomputes team totals and, for a two-team match, the league points.
    /// Returns false when the roster is not a two-team pairing.
    pub fn calculate_league_points(&mut self) -> bool {
        for Team { players, totals } in &mut self.teams {
            totals.refresh_totals(players);
        }
        league::calculate_league_points(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_shape() {
        let board = Scoreboard::new(2, 6);
        assert_eq!(board.teams.len(), 2);
        assert_eq!(board.players_per_team(), 6);
    }

    #[test]
    fn test_reinitialize_clears_results() {
        let mut board = Scoreboard::new(2, 4);
        board.teams[0].totals.suma = 99;
        board.reinitialize(1, 1);
        assert_eq!(board.teams.len(), 1);
        assert_eq!(board.teams[0].totals.suma, 0);
    }

    #[test]
    fn test_league_points_require_two_teams() {
        let mut board = Scoreboard::new(1, 6);
        assert!(!board.calculate_league_points());
        let mut board = Scoreboard::new(3, 2);
        assert!(!board.calculate_league_points());
    }
}
