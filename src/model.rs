use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::csv_io;
use crate::domain::{AppConfig, HELP_TEXT, InputMode, Message, PAGE_SIZE, TableError, expand_path};
use crate::inputter::{InputResult, Inputter};
use crate::pipeline::{self, SortDirection, SortState, VisibleColumns};
use crate::prefs::{self, PreferenceStore};
use crate::record::{COLUMNS, Field, Record, seed_records};

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Status {
    READY,
    LOADING,
    QUITTING,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Modus {
    TABLE,
    COLUMNS,
    POPUP,
    CMDINPUT,
}

type ImportOutcome = (PathBuf, Result<Vec<Record>, TableError>);

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderView {
    pub label: String,
    pub sorted: Option<SortDirection>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnChoice {
    pub label: String,
    pub checked: bool,
}

/// Snapshot of everything the ui needs to draw one frame.
#[derive(Clone, Debug)]
pub struct UIData {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<Vec<String>>,
    pub first_row: usize, // 1-based position of rows[0] in the filtered view
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
    pub selected_row: usize,
    pub selected_column: usize,
    pub search_text: String,
    pub show_columns: bool,
    pub column_choices: Vec<ColumnChoice>,
    pub selected_choice: usize,
    pub show_popup: bool,
    pub popup_title: String,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub input_mode: Option<InputMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_status_message_update: Instant,
    pub loading: bool,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            headers: Vec::new(),
            rows: Vec::new(),
            first_row: 0,
            total: 0,
            page: 0,
            page_count: 0,
            selected_row: 0,
            selected_column: 0,
            search_text: String::new(),
            show_columns: false,
            column_choices: Vec::new(),
            selected_choice: 0,
            show_popup: false,
            popup_title: String::new(),
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            input_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
            loading: false,
        }
    }
}

pub struct Model {
    config: AppConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    records: Vec<Record>,
    visible: VisibleColumns,
    search_text: String,
    sort: SortState,
    current_page: usize,
    rows: Vec<usize>, // Filtered and sorted indices into records
    curser_row: usize,
    curser_column: usize,
    column_curser: usize,
    prefs: Box<dyn PreferenceStore>,
    clipboard: Option<Clipboard>,
    input: Inputter,
    input_mode: Option<InputMode>,
    last_input: InputResult,
    search_before_input: String,
    import_tx: Sender<ImportOutcome>,
    import_rx: Receiver<ImportOutcome>,
    pending_imports: usize,
    popup_title: String,
    popup_message: String,
    uidata: UIData,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &AppConfig, prefs: Box<dyn PreferenceStore>) -> Self {
        let visible = prefs::load_visible_columns(prefs.as_ref());
        let (import_tx, import_rx) = channel();
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            records: seed_records(),
            visible,
            search_text: String::new(),
            sort: SortState::default(),
            current_page: 0,
            rows: Vec::new(),
            curser_row: 0,
            curser_column: 0,
            column_curser: 0,
            prefs,
            clipboard: None,
            input: Inputter::default(),
            input_mode: None,
            last_input: InputResult::default(),
            search_before_input: String::new(),
            import_tx,
            import_rx,
            pending_imports: 0,
            popup_title: String::new(),
            popup_message: String::new(),
            uidata: UIData::empty(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.update_table_data();
        model.set_status_message(format!("{} records, press ? for help", model.records.len()));
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) -> Result<(), TableError> {
        if message == Message::Tick {
            // Imports finishing during an input are applied once it closes
            if self.modus != Modus::CMDINPUT {
                self.poll_imports();
            }
            return Ok(());
        }
        trace!("Update {:?} in {:?}", message, self.modus);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::Exit => self.clear_search(),
                Message::Help => self.show_popup("Help", HELP_TEXT),
                Message::MoveUp => self.move_selection_up(),
                Message::MoveDown => self.move_selection_down(),
                Message::MoveLeft => self.move_selection_left(),
                Message::MoveRight => self.move_selection_right(),
                Message::NextPage => self.set_page(self.current_page.saturating_add(1)),
                Message::PrevPage => self.set_page(self.current_page.saturating_sub(1)),
                Message::FirstPage => self.set_page(0),
                Message::LastPage => self.set_page(usize::MAX),
                Message::Sort => self.sort_current_column(),
                Message::Search => self.enter_cmd_mode(InputMode::Search),
                Message::ToggleColumnDialog => self.open_column_dialog(),
                Message::ToggleColumn(field) => self.toggle_column(field),
                Message::Import => self.enter_cmd_mode(InputMode::ImportPath),
                Message::ImportFile(path) => self.start_import(path),
                Message::Export => self.export(),
                Message::CopyRow => self.copy_row(),
                _ => {}
            },
            Modus::COLUMNS => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_column_curser(-1),
                Message::MoveDown => self.move_column_curser(1),
                Message::Enter => self.toggle_column(COLUMNS[self.column_curser].field),
                Message::ToggleColumn(field) => self.toggle_column(field),
                Message::Exit | Message::ToggleColumnDialog => self.close_overlay(),
                _ => {}
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Enter | Message::Help => self.close_overlay(),
                _ => {}
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = message {
                    self.raw_input(key)?;
                }
            }
        }
        Ok(())
    }

    // ---------------------------- Pipeline ---------------------------- //

    /// Recomputes the filtered and sorted view, clamps the page and the
    /// curser to what is left and rebuilds the ui snapshot.
    fn update_table_data(&mut self) {
        let start_time = Instant::now();
        self.rows = pipeline::view_rows(&self.records, &self.visible, &self.search_text, self.sort);

        let pages = pipeline::page_count(self.rows.len(), PAGE_SIZE);
        if self.current_page >= pages {
            self.current_page = pages.saturating_sub(1);
        }
        let page_len = self.page_rows().len();
        self.curser_row = self.curser_row.min(page_len.saturating_sub(1));
        self.curser_column = self.curser_column.min(self.visible.len().saturating_sub(1));

        trace!(
            "View: {} of {} records, page {}/{}, Cr {}, Cc {}, took {}us",
            self.rows.len(),
            self.records.len(),
            self.current_page + 1,
            pages,
            self.curser_row,
            self.curser_column,
            start_time.elapsed().as_micros()
        );
        self.update_uidata();
    }

    fn page_rows(&self) -> &[usize] {
        pipeline::paginate(&self.rows, self.current_page, PAGE_SIZE)
    }

    fn update_uidata(&mut self) {
        let headers = self
            .visible
            .fields()
            .iter()
            .map(|&field| HeaderView {
                label: field.label().to_string(),
                sorted: (field == self.sort.field).then_some(self.sort.direction),
            })
            .collect();
        let rows = self
            .page_rows()
            .iter()
            .map(|&ridx| {
                self.visible
                    .fields()
                    .iter()
                    .map(|&field| self.records[ridx].display(field))
                    .collect()
            })
            .collect();
        let column_choices = COLUMNS
            .iter()
            .map(|c| ColumnChoice {
                label: c.label.to_string(),
                checked: self.visible.contains(c.field),
            })
            .collect();

        self.uidata = UIData {
            headers,
            rows,
            first_row: self.current_page * PAGE_SIZE + 1,
            total: self.rows.len(),
            page: self.current_page,
            page_count: pipeline::page_count(self.rows.len(), PAGE_SIZE),
            selected_row: self.curser_row,
            selected_column: self.curser_column,
            search_text: self.search_text.clone(),
            show_columns: self.modus == Modus::COLUMNS,
            column_choices,
            selected_choice: self.column_curser,
            show_popup: self.modus == Modus::POPUP,
            popup_title: self.popup_title.clone(),
            popup_message: self.popup_message.clone(),
            cmdinput: self.last_input.clone(),
            input_mode: self.input_mode,
            active_cmdinput: self.modus == Modus::CMDINPUT,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
            loading: self.status == Status::LOADING,
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
    }

    // -------------------- Control handling functions ---------------------- //

    fn set_search(&mut self, term: String) {
        trace!("Search term {term:?}");
        self.search_text = term;
        self.update_table_data();
    }

    fn clear_search(&mut self) {
        if !self.search_text.is_empty() {
            self.set_search(String::new());
            self.set_status_message("Search cleared");
        }
    }

    fn set_page(&mut self, page: usize) {
        let pages = pipeline::page_count(self.rows.len(), PAGE_SIZE);
        self.current_page = page.min(pages.saturating_sub(1));
        self.curser_row = 0;
        self.update_table_data();
    }

    fn sort_current_column(&mut self) {
        if let Some(&field) = self.visible.fields().get(self.curser_column) {
            self.sort_by(field);
        }
    }

    fn sort_by(&mut self, field: Field) {
        self.sort.toggle_or_set(field);
        debug!("Sorting by {} {:?}", self.sort.field, self.sort.direction);
        self.update_table_data();
    }

    fn toggle_column(&mut self, field: Field) {
        self.visible.toggle(field);
        info!("Visible columns: {:?}", self.visible.fields());
        if let Err(e) = prefs::save_visible_columns(self.prefs.as_mut(), &self.visible) {
            warn!("Could not save column preference: {e}");
            self.set_status_message(format!("Could not save column preference: {e}"));
        }
        self.update_table_data();
    }

    fn open_column_dialog(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::COLUMNS;
        self.update_uidata();
    }

    fn move_column_curser(&mut self, step: i32) {
        let last = COLUMNS.len() - 1;
        self.column_curser = if step < 0 {
            self.column_curser.saturating_sub(1)
        } else {
            (self.column_curser + 1).min(last)
        };
        self.update_uidata();
    }

    fn show_popup(&mut self, title: &str, message: &str) {
        if self.modus != Modus::POPUP {
            self.previous_modus = self.modus;
        }
        self.modus = Modus::POPUP;
        self.popup_title = title.to_string();
        self.popup_message = message.to_string();
        self.update_uidata();
    }

    fn close_overlay(&mut self) {
        trace!("Close {:?} ...", self.modus);
        self.modus = match self.previous_modus {
            Modus::COLUMNS if self.modus == Modus::POPUP => Modus::COLUMNS,
            _ => Modus::TABLE,
        };
        self.previous_modus = Modus::TABLE;
        self.update_uidata();
    }

    fn move_selection_up(&mut self) {
        if self.curser_row > 0 {
            self.curser_row -= 1;
        } else if self.current_page > 0 {
            self.current_page -= 1;
            self.curser_row = PAGE_SIZE - 1;
        }
        self.update_table_data();
    }

    fn move_selection_down(&mut self) {
        let page_len = self.page_rows().len();
        if self.curser_row + 1 < page_len {
            self.curser_row += 1;
        } else if self.current_page + 1 < pipeline::page_count(self.rows.len(), PAGE_SIZE) {
            self.current_page += 1;
            self.curser_row = 0;
        }
        self.update_table_data();
    }

    fn move_selection_left(&mut self) {
        self.curser_column = self.curser_column.saturating_sub(1);
        self.update_uidata();
    }

    fn move_selection_right(&mut self) {
        if self.curser_column + 1 < self.visible.len() {
            self.curser_column += 1;
        }
        self.update_uidata();
    }

    fn enter_cmd_mode(&mut self, mode: InputMode) {
        trace!("Entering command mode {mode:?} ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.input_mode = Some(mode);

        self.input.clear();
        if mode == InputMode::Search {
            self.search_before_input = self.search_text.clone();
            self.input.set(&self.search_text);
        }
        self.last_input = self.input.get();
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) -> Result<(), TableError> {
        self.last_input = self.input.read(key);
        match self.input_mode {
            Some(InputMode::Search) => {
                // Search is live, every key refilters the table
                let term = if self.last_input.canceled {
                    self.search_before_input.clone()
                } else {
                    self.last_input.input.clone()
                };
                if term != self.search_text {
                    self.set_search(term);
                }
            }
            Some(InputMode::ImportPath) | None => {}
        }
        if self.last_input.finished {
            self.handle_cmd_input()?;
        }
        self.update_uidata();
        Ok(())
    }

    fn handle_cmd_input(&mut self) -> Result<(), TableError> {
        trace!("Handle cmd input {:?}", self.last_input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        let mode = self.input_mode.take();

        if self.last_input.canceled {
            return Ok(());
        }
        let cmd_input = self.last_input.input.trim().to_string();
        match mode {
            Some(InputMode::Search) => {
                self.set_status_message(format!("{} matches for {:?}", self.rows.len(), cmd_input));
            }
            Some(InputMode::ImportPath) if cmd_input.is_empty() => {}
            Some(InputMode::ImportPath) => match expand_path(&cmd_input) {
                Ok(path) => self.start_import(path),
                Err(e) => self.show_popup("Import failed", &e.to_string()),
            },
            None => info!("Cmd mode is none!"),
        }
        Ok(())
    }

    // ---------------------------- Import / Export ---------------------------- //

    /// Reads and parses the file on the rayon pool. The result arrives on the
    /// import channel and is applied by the next tick.
    fn start_import(&mut self, path: PathBuf) {
        info!("Importing {} ...", path.display());
        let tx = self.import_tx.clone();
        let job_path = path.clone();
        rayon::spawn(move || {
            let result = csv_io::read_csv_file(&job_path);
            if tx.send((job_path, result)).is_err() {
                debug!("Import finished after the model was dropped");
            }
        });
        self.pending_imports += 1;
        self.status = Status::LOADING;
        self.set_status_message(format!("Loading {} ...", path.display()));
        self.update_uidata();
    }

    fn poll_imports(&mut self) {
        loop {
            match self.import_rx.try_recv() {
                Ok((path, result)) => {
                    self.pending_imports = self.pending_imports.saturating_sub(1);
                    self.finish_import(path, result);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if self.pending_imports == 0 && self.status == Status::LOADING {
            self.status = Status::READY;
            self.update_uidata();
        }
    }

    fn finish_import(&mut self, path: PathBuf, result: Result<Vec<Record>, TableError>) {
        match result {
            Ok(records) => {
                info!("Imported {} records from {}", records.len(), path.display());
                self.records = records;
                self.current_page = 0;
                self.curser_row = 0;
                self.update_table_data();
                self.set_status_message(format!(
                    "Imported {} records from {}",
                    self.records.len(),
                    path.display()
                ));
            }
            Err(e) => {
                error!("Import of {} failed: {e}", path.display());
                self.show_popup("CSV Parse Error!", &e.to_string());
            }
        }
    }

    fn export(&mut self) {
        match csv_io::export_csv(&self.config.export_dir, &self.records, &self.visible) {
            Ok(path) => self.set_status_message(format!(
                "Exported {} records to {}",
                self.records.len(),
                path.display()
            )),
            Err(e) => {
                error!("Export failed: {e}");
                self.show_popup("Export failed", &e.to_string());
            }
        }
    }

    fn copy_row(&mut self) {
        let Some(&ridx) = self.page_rows().get(self.curser_row) else {
            return;
        };
        let line = csv_io::encode_row(&self.records[ridx], &self.visible);
        trace!("Row content: {}", line);

        match self.copy_to_clipboard(line) {
            Ok(_) => self.set_status_message("Copied row to clipboard"),
            Err(e) => {
                debug!("Error copying to clipboard: {e}");
                self.set_status_message(e.to_string());
            }
        }
    }

    fn copy_to_clipboard(&mut self, text: String) -> Result<(), TableError> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()?,
        };
        self.clipboard.insert(clipboard).set_text(text)?;
        Ok(())
    }

    #[cfg(test)]
    fn visible_fields(&self) -> &[Field] {
        self.visible.fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{COLUMN_PREFS_KEY, JsonFileStore, MemoryStore};
    use crate::record::Value;
    use pretty_assertions::assert_eq;
    use ratatui::crossterm::event::KeyCode;
    use std::time::Duration;

    fn model() -> Model {
        Model::init(&AppConfig::default(), Box::new(MemoryStore::default()))
    }

    fn names(model: &Model) -> Vec<String> {
        model.get_uidata().rows.iter().map(|r| r[0].clone()).collect()
    }

    fn wait_for_imports(model: &mut Model) {
        for _ in 0..500 {
            model.update(Message::Tick).unwrap();
            if model.pending_imports == 0 {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("import did not finish");
    }

    fn many_records(n: usize) -> String {
        let mut csv = String::from("name,age\n");
        for i in 0..n {
            csv.push_str(&format!("p{i:02},{i}\n"));
        }
        csv
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("datatable-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn starts_with_seed_rows_sorted_by_name() {
        let model = model();
        let ui = model.get_uidata();
        assert_eq!(names(&model), vec!["Shivam", "Vinay"]);
        let labels: Vec<&str> = ui.headers.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, vec!["Name", "Email", "Age", "Role"]);
        assert_eq!(ui.headers[0].sorted, Some(SortDirection::Ascending));
        assert_eq!(ui.total, 2);
        assert_eq!(ui.page_count, 1);
    }

    #[test]
    fn sort_flips_direction_then_resets_on_a_new_field() {
        let mut model = model();
        model.update(Message::Sort).unwrap();
        assert_eq!(names(&model), vec!["Vinay", "Shivam"]);
        model.sort_by(Field::Age);
        assert_eq!(names(&model), vec!["Shivam", "Vinay"]);
        assert_eq!(model.get_uidata().headers[2].sorted, Some(SortDirection::Ascending));
    }

    #[test]
    fn live_search_filters_on_each_key() {
        let mut model = model();
        model.update(Message::Search).unwrap();
        assert!(model.raw_keyevents());
        model.update(Message::RawKey(KeyEvent::from(KeyCode::Char('v')))).unwrap();
        assert_eq!(model.get_uidata().total, 2);
        model.update(Message::RawKey(KeyEvent::from(KeyCode::Char('i')))).unwrap();
        assert_eq!(names(&model), vec!["Vinay"]);

        model.update(Message::RawKey(KeyEvent::from(KeyCode::Esc))).unwrap();
        assert!(!model.raw_keyevents());
        assert_eq!(model.get_uidata().total, 2);
    }

    #[test]
    fn hidden_columns_leave_the_search_surface() {
        let mut model = model();
        model.set_search("bihar".into());
        assert_eq!(model.get_uidata().total, 0);
        model.update(Message::ToggleColumn(Field::Location)).unwrap();
        assert_eq!(names(&model), vec!["Shivam"]);
    }

    #[test]
    fn column_toggles_are_saved_in_order() {
        let path = std::env::temp_dir()
            .join(format!("datatable-model-prefs-{}", std::process::id()))
            .join("prefs.json");
        let _ = std::fs::remove_file(&path);
        let config = AppConfig::default().prefs_path(path.clone());

        let mut model = Model::init(&config, Box::new(JsonFileStore::open(path.clone())));
        model.update(Message::ToggleColumnDialog).unwrap();
        model.update(Message::ToggleColumn(Field::Email)).unwrap();
        model.update(Message::ToggleColumn(Field::Location)).unwrap();
        model.update(Message::ToggleColumn(Field::Email)).unwrap();
        assert_eq!(
            model.visible_fields(),
            &[Field::Name, Field::Age, Field::Role, Field::Location, Field::Email]
        );
        let labels: Vec<String> = model.get_uidata().headers.iter().map(|h| h.label.clone()).collect();
        assert_eq!(labels, vec!["Name", "Age", "Role", "Location", "Email"]);

        let reopened = JsonFileStore::open(path.clone());
        assert_eq!(
            reopened.get(COLUMN_PREFS_KEY).as_deref(),
            Some("[\"name\",\"age\",\"role\",\"location\",\"email\"]")
        );
        let model = Model::init(&config, Box::new(reopened));
        assert_eq!(model.visible_fields().len(), 5);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn column_dialog_toggles_with_enter() {
        let mut model = model();
        model.update(Message::ToggleColumnDialog).unwrap();
        assert!(model.get_uidata().show_columns);
        model.update(Message::MoveDown).unwrap();
        model.update(Message::Enter).unwrap();
        assert!(!model.visible_fields().contains(&Field::Email));
        assert!(!model.get_uidata().column_choices[1].checked);
        model.update(Message::Exit).unwrap();
        assert!(!model.get_uidata().show_columns);
    }

    #[test]
    fn import_replaces_store_and_paginates() {
        let mut model = model();
        let path = temp_file("many.csv", &many_records(23));
        model.update(Message::ImportFile(path)).unwrap();
        wait_for_imports(&mut model);

        let ui = model.get_uidata();
        assert_eq!(ui.total, 23);
        assert_eq!(ui.page_count, 3);
        assert_eq!(ui.rows.len(), 10);
        assert_eq!(model.status, Status::READY);

        model.update(Message::LastPage).unwrap();
        assert_eq!(model.get_uidata().rows.len(), 3);
        assert_eq!(model.get_uidata().first_row, 21);
    }

    #[test]
    fn page_is_clamped_when_the_filter_shrinks() {
        let mut model = model();
        let path = temp_file("clamp.csv", &many_records(25));
        model.update(Message::ImportFile(path)).unwrap();
        wait_for_imports(&mut model);

        model.update(Message::LastPage).unwrap();
        assert_eq!(model.get_uidata().page, 2);
        model.set_search("p1".into());
        let ui = model.get_uidata();
        assert_eq!(ui.total, 10);
        assert_eq!(ui.page, 0);
        assert_eq!(ui.rows.len(), 10);
    }

    #[test]
    fn last_completed_import_wins() {
        let mut model = model();
        let first = Record::new(1).with(Field::Name, Value::Text("First".into()));
        let second = Record::new(1).with(Field::Name, Value::Text("Second".into()));
        model.pending_imports = 2;
        model.status = Status::LOADING;
        model.import_tx.send((PathBuf::from("a.csv"), Ok(vec![first]))).unwrap();
        model.import_tx.send((PathBuf::from("b.csv"), Ok(vec![second]))).unwrap();

        model.update(Message::Tick).unwrap();
        assert_eq!(names(&model), vec!["Second"]);
        assert_eq!(model.pending_imports, 0);
        assert_eq!(model.status, Status::READY);
    }

    #[test]
    fn two_imports_leave_one_of_them_in_the_store() {
        let mut model = model();
        let small = temp_file("small.csv", &many_records(3));
        let large = temp_file("large.csv", &many_records(23));
        model.update(Message::ImportFile(small.clone())).unwrap();
        model.update(Message::ImportFile(large.clone())).unwrap();
        wait_for_imports(&mut model);

        let ui = model.get_uidata();
        let expected = if ui.status_message.contains("large.csv") { 23 } else { 3 };
        assert!(ui.status_message.contains(&format!("Imported {expected} records")));
        assert_eq!(ui.total, expected);
        assert_eq!(model.status, Status::READY);
    }

    #[test]
    fn import_is_held_back_while_the_search_prompt_is_open() {
        let mut model = model();
        model.update(Message::Search).unwrap();
        let record = Record::new(1).with(Field::Name, Value::Text("Imported".into()));
        model.pending_imports += 1;
        model.import_tx.send((PathBuf::from("late.csv"), Ok(vec![record]))).unwrap();

        model.update(Message::Tick).unwrap();
        assert_eq!(names(&model), vec!["Shivam", "Vinay"]);
        assert_eq!(model.pending_imports, 1);

        model.update(Message::RawKey(KeyEvent::from(KeyCode::Esc))).unwrap();
        assert_eq!(names(&model), vec!["Shivam", "Vinay"]);
        model.update(Message::Tick).unwrap();
        assert_eq!(names(&model), vec!["Imported"]);
        assert_eq!(model.pending_imports, 0);
    }

    #[test]
    fn failed_import_keeps_the_store() {
        let mut model = model();
        model
            .update(Message::ImportFile(PathBuf::from("tests/fixtures/ragged.csv")))
            .unwrap();
        wait_for_imports(&mut model);

        let ui = model.get_uidata();
        assert!(ui.show_popup);
        assert_eq!(ui.popup_title, "CSV Parse Error!");
        assert_eq!(names(&model), vec!["Shivam", "Vinay"]);

        model.update(Message::Exit).unwrap();
        assert!(!model.get_uidata().show_popup);
    }

    #[test]
    fn export_uses_store_order_not_view_order() {
        let dir = std::env::temp_dir().join(format!("datatable-model-export-{}", std::process::id()));
        let config = AppConfig::default().export_dir(dir.clone());
        let mut model = Model::init(&config, Box::new(MemoryStore::default()));
        model.set_search("shivam".into());
        model.update(Message::Export).unwrap();

        let csv = std::fs::read_to_string(dir.join("table-data.csv")).unwrap();
        let first_cells: Vec<&str> = csv.lines().map(|l| l.split(',').next().unwrap_or("")).collect();
        assert_eq!(first_cells, vec!["name", "Vinay", "Shivam"]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = model();
        model.update(Message::Help).unwrap();
        assert!(model.get_uidata().show_popup);
        assert_eq!(model.get_uidata().popup_message, HELP_TEXT);
        model.update(Message::Enter).unwrap();
        assert!(!model.get_uidata().show_popup);
        model.update(Message::Quit).unwrap();
        assert_eq!(model.status, Status::QUITTING);
    }
}
