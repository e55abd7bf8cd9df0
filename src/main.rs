//! Kegel scoreboard reader.
//!
//! Watches a camera view of a printed ninepin results table, reads the
//! numeric cells through a self-growing template recognizer, and keeps a
//! live per-player score state with league points, a CSV match report and
//! an optional spreadsheet sync.

mod capture;
mod export;
mod logging;
mod paths;
mod recognition;
mod schedule;
mod scoring;
mod session;
mod settings;
mod table;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::capture::FolderFrameSource;
use crate::export::{CellMap, CsvExporter, ScoreSink, SheetSync};
use crate::recognition::{CellValueReader, RowReader, TemplateRepository, UnrecognizedSink};
use crate::schedule::PollingScheduler;
use crate::scoring::Scoreboard;
use crate::session::Session;
use crate::table::{DriftWatch, TableDetector};

fn main() -> Result<()> {
    logging::init();
    paths::ensure_directories().context("Failed to create output directories")?;

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| paths::get_base_dir().join("settings.json"));
    let settings = settings::load(&settings_path)?;
    let (game_type_name, game_type) = settings.selected()?;
    info!("Game type: {}", game_type_name);

    let sequence = game_type.column_sequence;
    let seats = game_type.seats();

    // Recognition stack: template library, diagnostics, cell reader.
    let repository = TemplateRepository::open(&settings.recognition.templates_dir)?;
    info!("Template library loaded: {} templates", repository.len());
    let sink = UnrecognizedSink::new(
        &settings.recognition.unrecognized_sign_dir,
        &settings.recognition.unrecognized_cell_dir,
    );
    let reader = CellValueReader::new(repository, sink, &settings.recognition)?;
    let (lane, throws, total) = sequence.data_columns();
    let row_reader = RowReader::new(reader, lane, throws, total);

    // Score state shared between the loop and this control thread.
    let board = Arc::new(Mutex::new(Scoreboard::new(
        game_type.number_of_teams,
        game_type.players_per_team,
    )));

    // Sinks: the CSV report always, the spreadsheet only when mapped.
    let mut sinks: Vec<Box<dyn ScoreSink>> = vec![Box::new(CsvExporter::new(&settings.results_dir))];
    if let Some(map_path) = &game_type.worksheet_cells {
        match CellMap::load(map_path) {
            Ok(map) => sinks.push(Box::new(SheetSync::new(map, Box::new(LoggingTransport)))),
            Err(e) => warn!("Spreadsheet sync disabled: {:#}", e),
        }
    }

    std::fs::create_dir_all(&settings.results_dir)
        .with_context(|| format!("Failed to create {}", settings.results_dir.display()))?;
    std::fs::create_dir_all(&settings.frames_dir)
        .with_context(|| format!("Failed to create {}", settings.frames_dir.display()))?;
    let frames = FolderFrameSource::new(&settings.frames_dir)
        .with_context(|| format!("Failed to open frame source {}", settings.frames_dir.display()))?;

    let handle = session::spawn(Session {
        frames: Box::new(frames),
        detector: TableDetector::new(sequence.pattern()),
        drift: DriftWatch::new(),
        row_reader,
        scheduler: PollingScheduler::new(
            &seats.iter().map(Option::is_some).collect::<Vec<_>>(),
            Instant::now(),
        ),
        seats,
        identity_column: sequence.identity_column(),
        board,
        sinks,
    });

    info!("Session running; press Enter to stop");
    let stdin = std::io::stdin();
    let _ = stdin.lock().lines().next();

    info!("Stopping session");
    handle.stop_and_join();
    Ok(())
}

/// Stand-in transport: logs the batch instead of talking to a worksheet.
///
/// The real transport (authentication, API client) is deployment-specific
/// and plugs in through the same trait.
struct LoggingTransport;

impl export::SpreadsheetTransport for LoggingTransport {
    fn apply(&mut self, updates: &[export::CellUpdate]) -> Result<()> {
        for update in updates {
            info!("Worksheet {} <- {}", update.cell, update.value);
        }
        Ok(())
    }
}
