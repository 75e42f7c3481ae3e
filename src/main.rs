use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod controller;
mod csv_io;
mod domain;
mod inputter;
mod model;
mod pipeline;
mod prefs;
mod record;
mod ui;

use controller::Controller;
use domain::{AppConfig, Message, TableError, expand_path};
use model::{Model, Status};
use prefs::JsonFileStore;
use ui::TableUI;

/// A terminal data table with search, sorting, paging and csv import/export.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Csv file to import on startup
    file: Option<String>,

    /// Preference file holding the visible columns
    #[arg(long)]
    prefs: Option<String>,

    /// Directory table-data.csv is exported to
    #[arg(long, default_value = ".")]
    export_dir: String,

    /// Log file, the terminal belongs to the ui
    #[arg(long, default_value = "datatable.log")]
    log_file: String,

    /// Milliseconds to wait for input before a tick
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(path: &str) -> Result<(), TableError> {
    let file = File::create(expand_path(path)?)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), TableError> {
    init_logging(&args.log_file)?;
    info!("Starting datatable {:?}", args);

    let mut config = AppConfig::default()
        .event_poll_time(args.poll_ms)
        .export_dir(expand_path(&args.export_dir)?);
    if let Some(prefs) = args.prefs.as_deref() {
        config = config.prefs_path(expand_path(prefs)?);
    }

    let store = JsonFileStore::open(config.prefs_path.clone());
    let mut model = Model::init(&config, Box::new(store));
    if let Some(file) = args.file.as_deref() {
        model.update(Message::ImportFile(expand_path(file)?))?;
    }

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &config);
    ratatui::restore();
    result?;

    info!("Bye");
    Ok(())
}

/// Runs while the terminal is in raw mode, the caller restores it.
fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    config: &AppConfig,
) -> Result<(), TableError> {
    let mut ui = TableUI::new();
    let controller = Controller::new(config);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(model)?;
        model.update(message)?;
    }
    Ok(())
}
