//! Team-level result aggregation.

use super::player::{PlayerResult, format_points};

/// Summed results and league points of one team.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamResult {
    pub name: String,
    pub suma: i32,
    pub pelne: i32,
    pub zbierane: i32,
    pub dziury: u32,
    pub throw_count: u32,
    /// Set points collected across all pairings.
    pub ps: f32,
    /// Match points including the team-total bonus.
    pub pd: f32,
    /// Own total minus the opponent's total.
    pub sum_difference: i32,
}

impl TeamResult {
    /// Recomputes the summed fields from the team's players.
    pub fn refresh_totals(&mut self, players: &[PlayerResult]) {
        self.suma = players.iter().map(|p| p.main.suma).sum();
        self.pelne = players.iter().map(|p| p.main.pelne).sum();
        self.zbierane = players.iter().map(|p| p.main.zbierane).sum();
        self.dziury = players.iter().map(|p| p.main.dziury).sum();
        self.throw_count = players.iter().map(|p| p.main.throw_number).sum();
    }

    /// Writes the league points computed for this team.
    pub fn set_league_points(&mut self, pd: f32, ps: f32, sum_difference: i32) {
        self.pd = pd;
        self.ps = ps;
        self.sum_difference = sum_difference;
    }

    /// Looks up a named statistic as display text.
    ///
    /// Mirrors the worksheet cell maps: `name`, the summed results, `PS`,
    /// `PD`, `sum_difference` and its sign-gated variants. Unknown names
    /// resolve to the empty string.
    pub fn stat(&self, name: &str) -> String {
        match name {
            "name" => self.name.clone(),
            "suma" => self.suma.to_string(),
            "pelne" => self.pelne.to_string(),
            "zbierane" => self.zbierane.to_string(),
            "dziury" => self.dziury.to_string(),
            "number_of_rzut" => self.throw_count.to_string(),
            "PS" => format_points(self.ps),
            "PD" => format_points(self.pd),
            "sum_difference" => self.sum_difference.to_string(),
            "sum_difference_non_negative" if self.sum_difference >= 0 => {
                self.sum_difference.to_string()
            }
            "sum_difference_positive" if self.sum_difference > 0 => {
                self.sum_difference.to_string()
            }
            "sum_difference_negative" if self.sum_difference < 0 => {
                self.sum_difference.to_string()
            }
            _ => String::new(),
        }
    }
}
