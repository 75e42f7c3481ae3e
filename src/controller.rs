use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crate::domain::{AppConfig, Message, TableError};
use crate::model::Model;
use crate::record::COLUMNS;

pub struct Controller {
    event_poll_time: u64
}

impl Controller {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Waits up to the poll time for a key press. No input becomes a `Tick`
    /// so background work still gets picked up.
    pub fn handle_event(&self, model: &Model) -> Result<Message, TableError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
                && key.kind == event::KeyEventKind::Press {
                    return Ok(self.handle_key(key, model.raw_keyevents()).unwrap_or(Message::Tick));
                }
        Ok(Message::Tick)
    }

    fn handle_key(&self, key: event::KeyEvent, raw: bool) -> Option<Message> {
        if raw {
            return Some(Message::RawKey(key));
        }
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Enter | KeyCode::Char(' '), _) => Some(Message::Enter),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Up | KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down | KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Left | KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right | KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::PageDown | KeyCode::Char('n'), _) => Some(Message::NextPage),
            (KeyCode::PageUp | KeyCode::Char('p'), _) => Some(Message::PrevPage),
            (KeyCode::Home | KeyCode::Char('g'), _) => Some(Message::FirstPage),
            (KeyCode::End | KeyCode::Char('G'), _) => Some(Message::LastPage),
            (KeyCode::Char('s'), _) => Some(Message::Sort),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char('c'), _) => Some(Message::ToggleColumnDialog),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char('i'), _) => Some(Message::Import),
            (KeyCode::Char('e'), _) => Some(Message::Export),
            (KeyCode::Char(c @ '1'..='9'), _) => c
                .to_digit(10)
                .and_then(|d| COLUMNS.get(d as usize - 1))
                .map(|column| Message::ToggleColumn(column.field)),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

}
