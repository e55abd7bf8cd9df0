//! Background reading session.
//!
//! One worker thread runs the poll-detect-read-update-publish loop; the
//! starting thread keeps a handle with the shared scoreboard and an abort
//! flag. The loop is cooperative: the flag is polled between iterations and
//! inside backoff sleeps, and a running iteration always completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::capture::FrameSource;
use crate::export::ScoreSink;
use crate::recognition::RowReader;
use crate::schedule::PollingScheduler;
use crate::scoring::Scoreboard;
use crate::table::{DriftWatch, TableDetector};

/// Sleep after a missing frame or an unaligned table.
const CAPTURE_BACKOFF: Duration = Duration::from_secs(5);
/// Granularity at which sleeps check the abort flag.
const ABORT_POLL: Duration = Duration::from_millis(200);

/// Everything the reading loop works with.
pub struct Session {
    pub frames: Box<dyn FrameSource>,
    pub detector: TableDetector,
    pub drift: DriftWatch,
    pub row_reader: RowReader,
    pub scheduler: PollingScheduler,
    /// Per table row: the (team, seat) the row belongs to, if any.
    pub seats: Vec<Option<(usize, usize)>>,
    pub identity_column: usize,
    pub board: Arc<Mutex<Scoreboard>>,
    pub sinks: Vec<Box<dyn ScoreSink>>,
}

/// Handle to a running session.
pub struct SessionHandle {
    abort: Arc<AtomicBool>,
    board: Arc<Mutex<Scoreboard>>,
    thread: JoinHandle<()>,
}

impl SessionHandle {
    /// Requests a stop; the current iteration still completes.
    pub fn request_stop(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    /// A consistent copy of the current score state.
    pub fn snapshot(&self) -> Scoreboard {
        self.board.lock().expect("scoreboard lock poisoned").clone()
    }

    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Stops the session and waits for the loop thread to exit.
    pub fn stop_and_join(self) {
        self.request_stop();
        if self.thread.join().is_err() {
            error!("Session thread panicked");
        }
    }
}

/// Spawns the reading loop on a background thread.
pub fn spawn(session: Session) -> SessionHandle {
    let abort = Arc::new(AtomicBool::new(false));
    let board = session.board.clone();

    let abort_flag = abort.clone();
    let thread = std::thread::spawn(move || {
        run_loop(session, &abort_flag);
        info!("Session loop finished");
    });

    SessionHandle {
        abort,
        board,
        thread,
    }
}

fn run_loop(mut session: Session, abort: &AtomicBool) {
    info!("Session loop started, {} table rows", session.seats.len());
    while !abort.load(Ordering::SeqCst) {
        let sleep = iterate(&mut session);
        sleep_with_abort(abort, sleep);
    }
}

/// One loop iteration. Returns how long to sleep before the next.
fn iterate(session: &mut Session) -> Duration {
    // Frame capture is the only blocking I/O in the loop; a dry source is
    // a transient condition, never a reason to stop.
    let frame = match session.frames.capture() {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            debug!("No frame available, backing off");
            return CAPTURE_BACKOFF;
        }
        Err(e) => {
            warn!("Frame capture failed: {:#}", e);
            return CAPTURE_BACKOFF;
        }
    };

    // Geometry is only recomputed when the table actually moved.
    if session.drift.has_moved(&frame) {
        debug!("Table reference lost, re-detecting geometry");
        let detection = session.detector.detect(&frame);
        if detection.matching_rows.len() == session.seats.len() {
            info!("Table aligned: {} rows", detection.matching_rows.len());
            session.drift.refresh(
                &frame,
                detection.matching_rows.clone(),
                session.identity_column,
            );
            session.row_reader.set_rows(detection.matching_rows);
        } else {
            warn!(
                "Table not aligned: {} rows found, {} expected",
                detection.matching_rows.len(),
                session.seats.len()
            );
            return CAPTURE_BACKOFF;
        }
    }

    // Read only the rows whose seat is due.
    let now = Instant::now();
    let seats = session.seats.clone();
    for (row, seat) in seats.into_iter().enumerate() {
        let Some((team, player)) = seat else {
            continue;
        };
        if !session.scheduler.is_due(row, now) {
            continue;
        }

        let reading = match session.row_reader.read_row(&frame, row) {
            Ok(reading) => reading,
            Err(e) => {
                // Geometry and seat count were checked above; this is a
                // configuration-level fault worth surfacing loudly.
                error!("Reading row {} failed: {:#}", row, e);
                continue;
            }
        };
        let status = {
            let mut board = session.board.lock().expect("scoreboard lock poisoned");
            board.player_mut(team, player).update(&reading)
        };
        debug!("Row {} ({}, {}): {:?}", row, team, player, status);
        session
            .scheduler
            .reschedule(row, status, &reading, Instant::now());
    }

    // League points and sinks always run on the iteration's final state.
    let snapshot = {
        let mut board = session.board.lock().expect("scoreboard lock poisoned");
        board.calculate_league_points();
        board.clone()
    };
    for sink in &mut session.sinks {
        if let Err(e) = sink.publish(&snapshot) {
            warn!("Sink publish failed, retrying next cycle: {:#}", e);
        }
    }

    session.scheduler.global_sleep(Instant::now())
}

/// Sleeps up to `duration`, waking early when the abort flag is set.
fn sleep_with_abort(abort: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;
    while !abort.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        std::thread::sleep(remaining.min(ABORT_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameSource;
    use crate::recognition::{CellValueReader, TemplateRepository, UnrecognizedSink};
    use crate::settings::{ColumnSequence, RecognitionSettings};
    use anyhow::Result;
    use image::RgbImage;
    use tempfile::tempdir;

    struct EmptySource;

    impl FrameSource for EmptySource {
        fn capture(&mut self) -> Result<Option<RgbImage>> {
            Ok(None)
        }
    }

    fn test_session(dir: &std::path::Path) -> Session {
        let sequence = ColumnSequence::WithoutClub;
        let repository = TemplateRepository::open(&dir.join("templates")).unwrap();
        let sink = UnrecognizedSink::new(&dir.join("sign"), &dir.join("cell"));
        let reader =
            CellValueReader::new(repository, sink, &RecognitionSettings::default()).unwrap();
        let (lane, throws, total) = sequence.data_columns();

        Session {
            frames: Box::new(EmptySource),
            detector: TableDetector::new(sequence.pattern()),
            drift: DriftWatch::new(),
            row_reader: RowReader::new(reader, lane, throws, total),
            scheduler: PollingScheduler::new(&[true], Instant::now()),
            seats: vec![Some((0, 0))],
            identity_column: sequence.identity_column(),
            board: Arc::new(Mutex::new(Scoreboard::new(2, 1))),
            sinks: Vec::new(),
        }
    }

    #[test]
    fn test_stop_interrupts_backoff_sleep() {
        let dir = tempdir().unwrap();
        let handle = spawn(test_session(dir.path()));
        assert!(handle.is_running());

        // The loop sits in the capture backoff; the stop must cut it short.
        let started = Instant::now();
        handle.stop_and_join();
        assert!(started.elapsed() < CAPTURE_BACKOFF);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let dir = tempdir().unwrap();
        let handle = spawn(test_session(dir.path()));

        let mut snapshot = handle.snapshot();
        snapshot.teams[0].totals.suma = 123;
        assert_eq!(handle.snapshot().teams[0].totals.suma, 0);

        handle.stop_and_join();
    }

    #[test]
    fn test_sleep_with_abort_honors_flag() {
        let abort = AtomicBool::new(true);
        let started = Instant::now();
        sleep_with_abort(&abort, Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
