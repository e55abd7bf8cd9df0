//! Adaptive read scheduling.
//!
//! Reading a player row costs a segmentation plus template search per cell,
//! so the loop only re-reads a row when something can plausibly have
//! changed. Each seat carries an explicit read state instead of a raw
//! timestamp, and the loop's sleep is derived from the earliest due seat.

use std::time::{Duration, Instant};

use crate::recognition::RowReading;
use crate::scoring::{THROWS_PER_TOR, UpdateStatus};

/// Wait after a normal score update.
const WAIT_AFTER_UPDATE: Duration = Duration::from_secs(20);
/// Wait after an unreadable or unchanged row.
const WAIT_AFTER_RETRY: Duration = Duration::from_secs(5);
/// Interval the off-lane seats are rechecked at.
const LANE_RECHECK_WAIT: Duration = Duration::from_secs(75);
/// Floor for the loop sleep.
const MIN_LOOP_SLEEP: Duration = Duration::from_secs(1);

/// When a seat's row should next be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// The seat is not part of the match; never read.
    NotParticipating,
    /// The player is currently off the lanes; recheck in bulk.
    AwaitingLane,
    /// Read again once the deadline passes.
    Active(Instant),
    /// The player finished the game; never read again.
    Finished,
}

/// Decides, per seat, when the next read is worthwhile.
pub struct PollingScheduler {
    entries: Vec<ReadState>,
}

impl PollingScheduler {
    /// One entry per table row; `false` marks rows without a seat.
    pub fn new(participating: &[bool], now: Instant) -> Self {
        Self {
            entries: participating
                .iter()
                .map(|&p| {
                    if p {
                        ReadState::Active(now)
                    } else {
                        ReadState::NotParticipating
                    }
                })
                .collect(),
        }
    }

    pub fn state(&self, index: usize) -> ReadState {
        self.entries[index]
    }

    /// Whether row `index` should be read now.
    pub fn is_due(&self, index: usize, now: Instant) -> bool {
        match self.entries[index] {
            ReadState::Active(due) => due <= now,
            _ => false,
        }
    }

    /// Derives the next read time from what the last read produced.
    pub fn reschedule(
        &mut self,
        index: usize,
        status: UpdateStatus,
        reading: &RowReading,
        now: Instant,
    ) {
        let entry = &mut self.entries[index];
        if *entry == ReadState::NotParticipating {
            return;
        }
        *entry = match status {
            UpdateStatus::GameFinished => ReadState::Finished,
            UpdateStatus::ReadError if reading.lane.is_blank() => {
                // Not on a lane: nothing to read until the lineup moves.
                ReadState::AwaitingLane
            }
            UpdateStatus::ReadError | UpdateStatus::NoChange => {
                ReadState::Active(now + WAIT_AFTER_RETRY)
            }
            UpdateStatus::Updated => {
                let throws = reading.throws.as_number().unwrap_or(0);
                if throws == 0 || throws >= THROWS_PER_TOR as u32 {
                    // At a tor boundary the table changes immediately.
                    ReadState::Active(now)
                } else {
                    ReadState::Active(now + WAIT_AFTER_UPDATE)
                }
            }
        };
    }

    /// Sleep until the earliest active deadline, floored at one second.
    ///
    /// When no seat is active the off-lane seats are bulk-advanced to a
    /// recheck deadline so lineup changes are eventually noticed.
    pub fn global_sleep(&mut self, now: Instant) -> Duration {
        let earliest = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ReadState::Active(due) => Some(*due),
                _ => None,
            })
            .min();

        match earliest {
            Some(due) => due.saturating_duration_since(now).max(MIN_LOOP_SLEEP),
            None => {
                for entry in &mut self.entries {
                    if *entry == ReadState::AwaitingLane {
                        *entry = ReadState::Active(now + LANE_RECHECK_WAIT);
                    }
                }
                // With every seat finished or absent this idles at the
                // recheck pace; the loop owner decides when to stop.
                LANE_RECHECK_WAIT
            }
        }
    }
}
