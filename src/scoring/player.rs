//! Per-player score state.
//!
//! A player works through four tors of thirty throws: the first fifteen
//! into the full pin picture ("pełne"), the second fifteen clearing what
//! stands ("zbierane"). The table shows only the cumulative score, so the
//! state machine reconstructs individual throws from reading deltas.

use crate::recognition::{CellReading, RowReading};

/// Tors a player completes in one match; reaching this index ends the game.
pub const TORS_PER_GAME: usize = 4;
/// Throws per scoring phase within a tor.
pub const THROWS_PER_PHASE: usize = 15;
/// Throws per tor (pełne phase plus zbierane phase).
pub const THROWS_PER_TOR: usize = 30;

/// What one `update` call did to the player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// New throw data was recorded.
    Updated,
    /// The reading matched the stored state exactly; nothing changed.
    NoChange,
    /// The player has completed all tors; the state is frozen.
    GameFinished,
    /// At least one cell was indeterminate; nothing changed.
    ReadError,
}

/// A throw excluded from scoring by an officiating exception or an
/// arithmetically impossible reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedCard {
    /// Overall throw number (1-based across the whole game).
    pub throw_number: u32,
    /// The sub-score that was rejected.
    pub rejected_value: i32,
}

/// Accumulated results of a single tor.
#[derive(Debug, Clone, PartialEq)]
pub struct TorResult {
    /// Last recorded throw number on this tor (1-based, 0 = not started).
    pub throw_number: u32,
    pub pelne: i32,
    pub zbierane: i32,
    pub suma: i32,
    /// Zero-pin throws.
    pub dziury: u32,
    /// Set points won on this tor against the paired opponent.
    pub ps: f32,
    pub pelne_throws: [Option<i32>; THROWS_PER_PHASE],
    pub zbierane_throws: [Option<i32>; THROWS_PER_PHASE],
}

impl Default for TorResult {
    fn default() -> Self {
        Self {
            throw_number: 0,
            pelne: 0,
            zbierane: 0,
            suma: 0,
            dziury: 0,
            ps: 0.0,
            pelne_throws: [None; THROWS_PER_PHASE],
            zbierane_throws: [None; THROWS_PER_PHASE],
        }
    }
}

impl TorResult {
    /// Records one throw. `throw_number` is 1-based within the tor.
    fn record_throw(&mut self, throw_number: u32, value: i32) {
        self.throw_number = throw_number;
        let index = (throw_number - 1) as usize;
        if index < THROWS_PER_PHASE {
            self.pelne_throws[index] = Some(value);
            self.pelne += value;
        } else {
            self.zbierane_throws[index - THROWS_PER_PHASE] = Some(value);
            self.zbierane += value;
        }
        self.suma += value;
        if value == 0 {
            self.dziury += 1;
        }
    }

    /// All thirty throw slots, pełne phase first.
    pub fn throws(&self) -> Vec<Option<i32>> {
        self.pelne_throws
            .iter()
            .chain(self.zbierane_throws.iter())
            .copied()
            .collect()
    }
}

/// Accumulated results across the whole game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainResult {
    /// Last recorded overall throw number (1-based, 0 = not started).
    pub throw_number: u32,
    pub pelne: i32,
    pub zbierane: i32,
    pub suma: i32,
    pub dziury: u32,
    /// Set points over the whole pairing.
    pub ps: f32,
    /// Match points from the pairing.
    pub pd: f32,
}

impl MainResult {
    fn record_throw(&mut self, throw_number: u32, value: i32) {
        self.throw_number = throw_number;
        if value == 0 {
            self.dziury += 1;
            return;
        }
        if (throw_number as usize - 1) % THROWS_PER_TOR < THROWS_PER_PHASE {
            self.pelne += value;
        } else {
            self.zbierane += value;
        }
        self.suma += value;
    }
}

/// Score state of one roster seat over one match.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerResult {
    /// Name history; the last entry is the player currently on the seat.
    names: Vec<String>,
    /// Throw number each name entry started at.
    substitutions: Vec<u32>,
    pub team_name: String,
    /// Physical lane the player currently occupies, if any.
    pub lane_number: Option<u32>,
    /// Current tor index; `TORS_PER_GAME` means finished.
    pub tor_index: usize,
    /// Last stored within-tor throw number.
    pub throw_in_tor: u32,
    pub tors: [TorResult; TORS_PER_GAME],
    pub main: MainResult,
    pub red_cards: Vec<RedCard>,
    /// Last cumulative total seen on the table. Tracks the table even when a
    /// value is red-carded, so one bad jump does not poison later deltas.
    last_cumulative: i32,
    finished: bool,
}

impl Default for PlayerResult {
    fn default() -> Self {
        Self {
            names: vec![String::new()],
            substitutions: vec![0],
            team_name: String::new(),
            lane_number: None,
            tor_index: 0,
            throw_in_tor: 0,
            tors: Default::default(),
            main: MainResult::default(),
            red_cards: Vec::new(),
            last_cumulative: 0,
            finished: false,
        }
    }
}

impl PlayerResult {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Sets the name history and the throw numbers substitutions happened at.
    pub fn set_names(&mut self, names: Vec<String>, substitutions: Vec<u32>) {
        self.names = names;
        self.substitutions = substitutions;
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn substitutions(&self) -> &[u32] {
        &self.substitutions
    }

    /// Name of the player currently on the seat.
    pub fn current_name(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or("")
    }

    /// Display form of the seat's name.
    ///
    /// A single player shows in full; after substitutions every player is
    /// abbreviated to initials plus surname, slash-separated.
    pub fn display_name(&self) -> String {
        if self.names.len() == 1 {
            return self.names[0].clone();
        }
        let parts: Vec<String> = self
            .names
            .iter()
            .map(|name| {
                let words: Vec<&str> = name.split_whitespace().collect();
                match words.split_last() {
                    None => String::new(),
                    Some((last, given)) => {
                        let mut short = String::new();
                        for word in given {
                            if let Some(initial) = word.chars().next() {
                                short.push(initial);
                                short.push_str(". ");
                            }
                        }
                        short.push_str(last);
                        short
                    }
                }
            })
            .collect();
        parts.join("/")
    }

    /// Applies one row reading to the player state.
    ///
    /// The cumulative score cell is the source of truth: a throw's value is
    /// the delta against the previously stored cumulative total.
    pub fn update(&mut self, reading: &RowReading) -> UpdateStatus {
        if self.finished {
            return UpdateStatus::GameFinished;
        }

        // Lane may be blank (player between lanes); throw and total must
        // hold actual digits for the reading to be usable.
        let lane = match &reading.lane {
            CellReading::Unreadable => return UpdateStatus::ReadError,
            CellReading::Blank => None,
            CellReading::Digits(_) => match reading.lane.as_number() {
                Some(lane) => Some(lane),
                None => return UpdateStatus::ReadError,
            },
        };
        let (Some(throws), Some(total)) = (reading.throws.as_number(), reading.total.as_number())
        else {
            return UpdateStatus::ReadError;
        };
        let total = total as i32;

        let delta = total - self.last_cumulative;
        self.lane_number = lane;

        if throws == 0 && self.throw_in_tor != 0 {
            // The throw counter wrapped: the player moved to the next tor.
            self.tor_index += 1;
        } else if throws == self.throw_in_tor && delta == 0 {
            return UpdateStatus::NoChange;
        }

        if throws > THROWS_PER_TOR as u32 {
            // A throw number past the tor capacity cannot come from the
            // table; keep it out of the arithmetic entirely.
            self.red_cards.push(RedCard {
                throw_number: self.tor_index as u32 * THROWS_PER_TOR as u32 + throws,
                rejected_value: delta,
            });
            return UpdateStatus::ReadError;
        }

        self.throw_in_tor = throws;
        if self.tor_index == TORS_PER_GAME {
            self.finished = true;
            return UpdateStatus::GameFinished;
        }
        if throws == 0 {
            return UpdateStatus::Updated;
        }

        let overall_throw = self.tor_index as u32 * THROWS_PER_TOR as u32 + throws;
        self.last_cumulative = total;
        if !(0..=9).contains(&delta) {
            // Outside the possible pin count for one throw: an officiating
            // exception or a misread, either way excluded from the sums.
            self.red_cards.push(RedCard {
                throw_number: overall_throw,
                rejected_value: delta,
            });
            return UpdateStatus::Updated;
        }

        self.tors[self.tor_index].record_throw(throws, delta);
        self.main.record_throw(overall_throw, delta);
        UpdateStatus::Updated
    }

    /// Records an officiating red card directly, outside any reading.
    pub fn add_red_card(&mut self, throw_number: u32, rejected_value: i32) {
        self.red_cards.push(RedCard {
            throw_number,
            rejected_value,
        });
    }

    /// Last cumulative total seen on the table for this player.
    pub fn cumulative(&self) -> i32 {
        self.last_cumulative
    }

    /// Writes the league points computed for this player's pairing.
    pub fn set_league_points(&mut self, pd: f32, sum_ps: f32, tor_ps: [f32; TORS_PER_GAME]) {
        for (tor, ps) in self.tors.iter_mut().zip(tor_ps) {
            tor.ps = ps;
        }
        self.main.ps = sum_ps;
        self.main.pd = pd;
    }

    /// All 120 throw slots across the four tors.
    pub fn all_throws(&self) -> Vec<Option<i32>> {
        self.tors.iter().flat_map(|tor| tor.throws()).collect()
    }

    /// Looks up a named statistic as display text.
    ///
    /// Understood names mirror the worksheet cell maps: `name`,
    /// `team_name`, main results (`suma`, `pelne`, `zbierane`, `dziury`,
    /// `number_of_rzut`, `PS`, `PD`; empty before the first throw), per-tor
    /// forms `torX_<stat>` and `torX_<stat>_{win,draw,lose}` (1-based X,
    /// gated on the tor's set point), and single throws `torX_rzutN`.
    /// Anything else resolves to the empty string.
    pub fn stat(&self, name: &str) -> String {
        if name == "name" {
            return self.display_name();
        }
        if name == "team_name" {
            return self.team_name.clone();
        }
        if let Some(rest) = name.strip_prefix("tor") {
            return self.tor_stat(rest).unwrap_or_default();
        }
        if self.main.throw_number == 0 {
            return String::new();
        }
        match name {
            "suma" => self.main.suma.to_string(),
            "pelne" => self.main.pelne.to_string(),
            "zbierane" => self.main.zbierane.to_string(),
            "dziury" => self.main.dziury.to_string(),
            "number_of_rzut" => self.main.throw_number.to_string(),
            "PS" => format_points(self.main.ps),
            "PD" => format_points(self.main.pd),
            _ => String::new(),
        }
    }

    /// Resolves `X_<stat>[_outcome]` behind a `tor` prefix.
    fn tor_stat(&self, rest: &str) -> Option<String> {
        let mut parts = rest.split('_');
        let tor_index = parts.next()?.parse::<usize>().ok()?.checked_sub(1)?;
        let tor = self.tors.get(tor_index)?;
        if tor.throw_number == 0 {
            return None;
        }

        let kind = parts.next()?;
        if let Some(throw) = kind.strip_prefix("rzut") {
            let index = throw.parse::<usize>().ok()?.checked_sub(1)?;
            return tor
                .throws()
                .get(index)
                .copied()?
                .map(|value| value.to_string());
        }

        let value = match kind {
            "suma" => tor.suma.to_string(),
            "pelne" => tor.pelne.to_string(),
            "zbierane" => tor.zbierane.to_string(),
            "dziury" => tor.dziury.to_string(),
            "number_of_rzut" => tor.throw_number.to_string(),
            "PS" => format_points(tor.ps),
            _ => return None,
        };
        match parts.next() {
            None => Some(value),
            // Outcome-gated forms render only when the tor went that way.
            Some("win") if tor.ps == 1.0 => Some(value),
            Some("draw") if tor.ps == 0.5 => Some(value),
            Some("lose") if tor.ps == 0.0 => Some(value),
            Some(_) => None,
        }
    }
}

/// Renders league points without a trailing `.0` for whole values.
pub(crate) fn format_points(points: f32) -> String {
    if points.fract() == 0.0 {
        format!("{}", points as i64)
    } else {
        format!("{}", points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(lane: &str, throws: &str, total: &str) -> RowReading {
        let cell = |text: &str| {
            if text.is_empty() {
                CellReading::Blank
            } else {
                CellReading::Digits(text.to_string())
            }
        };
        RowReading {
            lane: cell(lane),
            throws: cell(throws),
            total: cell(total),
        }
    }

    #[test]
    fn test_first_throw_updates_pelne() {
        let mut player = PlayerResult::default();
        let status = player.update(&reading("1", "1", "9"));
        assert_eq!(status, UpdateStatus::Updated);
        assert_eq!(player.main.suma, 9);
        assert_eq!(player.main.pelne, 9);
        assert_eq!(player.main.zbierane, 0);
        assert_eq!(player.tors[0].pelne_throws[0], Some(9));
        assert_eq!(player.lane_number, Some(1));
    }

    #[test]
    fn test_throw_sixteen_updates_zbierane() {
        let mut player = PlayerResult::default();
        player.update(&reading("1", "15", "100"));
        let status = player.update(&reading("1", "16", "107"));
        assert_eq!(status, UpdateStatus::Updated);
        assert_eq!(player.main.pelne, 100);
        assert_eq!(player.main.zbierane, 7);
        assert_eq!(player.tors[0].zbierane_throws[0], Some(7));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut player = PlayerResult::default();
        player.update(&reading("1", "3", "25"));
        let before = player.clone();

        let status = player.update(&reading("1", "3", "25"));
        assert_eq!(status, UpdateStatus::NoChange);
        assert_eq!(player, before);
    }

    #[test]
    fn test_read_error_leaves_state_unchanged() {
        let mut player = PlayerResult::default();
        player.update(&reading("1", "3", "25"));
        let before = player.clone();

        let unreadable = RowReading {
            lane: CellReading::Digits("1".into()),
            throws: CellReading::Unreadable,
            total: CellReading::Digits("30".into()),
        };
        assert_eq!(player.update(&unreadable), UpdateStatus::ReadError);
        // Blank throw or total cells are equally unusable.
        assert_eq!(player.update(&reading("1", "", "30")), UpdateStatus::ReadError);
        assert_eq!(player.update(&reading("1", "4", "")), UpdateStatus::ReadError);
        assert_eq!(player, before);
    }

    #[test]
    fn test_blank_lane_is_valid() {
        let mut player = PlayerResult::default();
        player.update(&reading("2", "3", "25"));
        let status = player.update(&reading("", "4", "30"));
        assert_eq!(status, UpdateStatus::Updated);
        assert_eq!(player.lane_number, None);
        assert_eq!(player.main.suma, 30);
    }

    #[test]
    fn test_throw_counter_wrap_advances_tor() {
        let mut player = PlayerResult::default();
        player.update(&reading("1", "30", "150"));
        assert_eq!(player.tor_index, 0);

        let status = player.update(&reading("2", "0", "150"));
        assert_eq!(status, UpdateStatus::Updated);
        assert_eq!(player.tor_index, 1);

        // The first throw on the new tor lands in that tor's pełne.
        player.update(&reading("2", "1", "158"));
        assert_eq!(player.tors[1].pelne_throws[0], Some(8));
        assert_eq!(player.main.suma, 158);
    }

    #[test]
    fn test_pelne_plus_zbierane_equals_suma() {
        let mut player = PlayerResult::default();
        let mut total = 0;
        for tor in 0..2 {
            if tor > 0 {
                player.update(&reading("1", "0", &total.to_string()));
            }
            for throw in 1..=30 {
                total += (throw % 4) as i32;
                player.update(&reading("1", &throw.to_string(), &total.to_string()));
            }
        }

        assert_eq!(player.main.pelne + player.main.zbierane, player.main.suma);
        for tor in &player.tors {
            assert_eq!(tor.pelne + tor.zbierane, tor.suma);
        }
        assert_eq!(
            player.tors.iter().map(|t| t.suma).sum::<i32>(),
            player.main.suma
        );
    }

    #[test]
    fn test_tor_index_freezes_at_four() {
        let mut player = PlayerResult::default();
        let mut total = 0;
        for _tor in 0..4 {
            player.update(&reading("1", "0", &total.to_string()));
            for throw in 1..=30 {
                total += 1;
                player.update(&reading("1", &throw.to_string(), &total.to_string()));
            }
        }
        assert!(!player.is_finished());

        // The wrap after the fourth tor ends the game.
        let status = player.update(&reading("1", "0", &total.to_string()));
        assert_eq!(status, UpdateStatus::GameFinished);
        assert!(player.is_finished());
        assert_eq!(player.tor_index, TORS_PER_GAME);

        // Frozen: further readings change nothing.
        let before = player.clone();
        let status = player.update(&reading("1", "5", "999"));
        assert_eq!(status, UpdateStatus::GameFinished);
        assert_eq!(player, before);
    }

    #[test]
    fn test_zero_delta_throw_counts_dziura() {
        let mut player = PlayerResult::default();
        player.update(&reading("1", "1", "8"));
        let status = player.update(&reading("1", "2", "8"));
        assert_eq!(status, UpdateStatus::Updated);
        assert_eq!(player.tors[0].dziury, 1);
        assert_eq!(player.main.dziury, 1);
        assert_eq!(player.tors[0].pelne_throws[1], Some(0));
        assert_eq!(player.main.suma, 8);
    }

    #[test]
    fn test_impossible_delta_becomes_red_card() {
        let mut player = PlayerResult::default();
        player.update(&reading("1", "1", "9"));

        // A jump of 25 pins in one throw cannot be real.
        let status = player.update(&reading("1", "2", "34"));
        assert_eq!(status, UpdateStatus::Updated);
        assert_eq!(player.red_cards.len(), 1);
        assert_eq!(player.red_cards[0].throw_number, 2);
        assert_eq!(player.red_cards[0].rejected_value, 25);
        // The sums exclude the rejected value.
        assert_eq!(player.main.suma, 9);
        assert_eq!(player.tors[0].suma, 9);

        // Later throws delta against the table total, not the pruned sum,
        // so one bad jump does not red-card the rest of the game.
        let status = player.update(&reading("1", "3", "39"));
        assert_eq!(status, UpdateStatus::Updated);
        assert_eq!(player.red_cards.len(), 1);
        assert_eq!(player.tors[0].pelne_throws[2], Some(5));
    }

    #[test]
    fn test_throw_number_past_capacity_is_rejected() {
        let mut player = PlayerResult::default();
        player.update(&reading("1", "1", "9"));
        let before_suma = player.main.suma;

        let status = player.update(&reading("1", "31", "18"));
        assert_eq!(status, UpdateStatus::ReadError);
        assert_eq!(player.red_cards.len(), 1);
        assert_eq!(player.main.suma, before_suma);
    }

    #[test]
    fn test_display_name_single_and_substituted() {
        let mut player = PlayerResult::default();
        player.set_names(vec!["Jan Kowalski".into()], vec![0]);
        assert_eq!(player.display_name(), "Jan Kowalski");

        player.set_names(
            vec!["Jan Kowalski".into(), "Piotr Adam Nowak".into()],
            vec![0, 61],
        );
        assert_eq!(player.display_name(), "J. Kowalski/P. A. Nowak");
        assert_eq!(player.current_name(), "Piotr Adam Nowak");
    }

    #[test]
    fn test_stat_lookup() {
        let mut player = PlayerResult::default();
        player.set_names(vec!["Jan Kowalski".into()], vec![0]);

        // Before the first throw the numeric stats render empty.
        assert_eq!(player.stat("suma"), "");
        assert_eq!(player.stat("name"), "Jan Kowalski");

        player.update(&reading("1", "1", "9"));
        player.update(&reading("1", "2", "14"));
        assert_eq!(player.stat("suma"), "14");
        assert_eq!(player.stat("pelne"), "14");
        assert_eq!(player.stat("number_of_rzut"), "2");
        assert_eq!(player.stat("tor1_suma"), "14");
        assert_eq!(player.stat("tor1_rzut2"), "5");
        assert_eq!(player.stat("tor2_suma"), "", "untouched tor renders empty");
        assert_eq!(player.stat("tor1_rzut3"), "", "missing throw renders empty");
        assert_eq!(player.stat("nonsense"), "");
    }

    #[test]
    fn test_stat_outcome_gate() {
        let mut player = PlayerResult::default();
        player.update(&reading("1", "1", "9"));
        player.set_league_points(1.0, 2.5, [1.0, 0.5, 0.0, 0.0]);

        assert_eq!(player.stat("tor1_suma_win"), "9");
        assert_eq!(player.stat("tor1_suma_lose"), "");
        assert_eq!(player.stat("PS"), "2.5");
        assert_eq!(player.stat("PD"), "1");
    }
}
