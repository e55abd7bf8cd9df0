//! League point calculation for two-team play.
//!
//! Seat pairings duel tor by tor for set points; the pairing's match point
//! goes to the higher set-point total, overall sums breaking ties. On top
//! of the pairings the team with the higher combined total takes a
//! two-point bonus.

use super::player::TORS_PER_GAME;
use super::store::Scoreboard;

/// Computes set points, match points and score differentials.
///
/// No-op returning false unless exactly two teams play. Assumes equal
/// roster sizes, which the settings validation guarantees.
pub fn calculate_league_points(board: &mut Scoreboard) -> bool {
    if board.teams.len() != 2 {
        return false;
    }

    let players_per_team = board.players_per_team();
    let mut team_pd = [0.0f32; 2];
    let mut team_ps = [0.0f32; 2];

    for seat in 0..players_per_team {
        // Per-tor set points for the two paired players.
        let tor_sums: [Vec<i32>; 2] = [0, 1].map(|side| {
            board.teams[side].players[seat]
                .tors
                .iter()
                .map(|tor| tor.suma)
                .collect()
        });
        let mut tor_ps = [[0.0f32; TORS_PER_GAME]; 2];
        let mut pairing_ps = [0.0f32; 2];
        for tor in 0..TORS_PER_GAME {
            for (own, other) in [(0, 1), (1, 0)] {
                let ps = set_points(tor_sums[own][tor], tor_sums[other][tor]);
                tor_ps[own][tor] = ps;
                pairing_ps[own] += ps;
                team_ps[own] += ps;
            }
        }

        // Match point of the pairing, with the overall sums as tie-break.
        let overall = [
            board.teams[0].players[seat].main.suma,
            board.teams[1].players[seat].main.suma,
        ];
        for (own, other) in [(0, 1), (1, 0)] {
            let ps_difference = pairing_ps[own] - pairing_ps[other];
            let pd = if ps_difference > 0.0 {
                1.0
            } else if ps_difference == 0.0 && pairing_ps[own] > 0.0 {
                match overall[own] - overall[other] {
                    d if d > 0 => 1.0,
                    d if d < 0 => 0.0,
                    _ => 0.5,
                }
            } else {
                0.0
            };
            team_pd[own] += pd;
            board.teams[own].players[seat].set_league_points(pd, pairing_ps[own], tor_ps[own]);
        }
    }

    // Team bonus for the higher combined total; a nonzero tie splits it.
    let totals = [board.teams[0].totals.suma, board.teams[1].totals.suma];
    let bonus = if totals[0] > totals[1] {
        [2.0, 0.0]
    } else if totals[0] < totals[1] {
        [0.0, 2.0]
    } else if totals[0] > 0 {
        [1.0, 1.0]
    } else {
        [0.0, 0.0]
    };
    for side in 0..2 {
        let difference = totals[side] - totals[1 - side];
        board.teams[side].totals.set_league_points(
            team_pd[side] + bonus[side],
            team_ps[side],
            difference,
        );
    }
    true
}

/// Set points for one tor: win 1, nonzero tie half, loss 0.
fn set_points(own: i32, other: i32) -> f32 {
    if own > other {
        1.0
    } else if own == other && own > 0 {
        0.5
    } else {
        0.0
    }
}
