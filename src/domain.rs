use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::record::Field;

pub const PAGE_SIZE: usize = 10;
pub const EXPORT_FILE_NAME: &str = "table-data.csv";
pub const APP_NAME: &str = "datatable";

pub const HELP_TEXT: &str = "\
Navigation
  Up/Down, k/j      select row
  Left/Right, h/l   select column
  PgDown/n          next page
  PgUp/p            previous page
  Home/g, End/G     first / last page

Table
  /                 search (live, visible columns only)
  s                 sort by selected column (again flips direction)
  c                 choose visible columns
  1-6               toggle column 1-6 of the catalog
  y                 copy selected row as csv
  i                 import csv file
  e                 export csv (table-data.csv)

General
  ?                 this help
  Esc               close popup / cancel input
  q                 quit";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    PolarsError(#[from] PolarsError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Clipboard error: {0}")]
    ClipboardError(#[from] arboard::Error),

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Loading failed: {0}")]
    LoadingFailed(String),
}

/// Runtime settings, assembled from the command line in `main`.
#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct AppConfig {
    pub event_poll_time: u64,
    pub prefs_path: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            prefs_path: crate::prefs::default_prefs_path(),
            export_dir: PathBuf::from("."),
        }
    }
}

/// Expands `~` and environment variables in a user supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf, TableError> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| TableError::LoadingFailed(e.to_string()))
}

/// What the line input at the bottom of the screen is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Search,
    ImportPath,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Exit,
    Enter,
    Help,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    Sort,
    Search,
    ToggleColumnDialog,
    ToggleColumn(Field),
    Import,
    ImportFile(PathBuf),
    Export,
    CopyRow,
    RawKey(KeyEvent),
    Tick,
}
