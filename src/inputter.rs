use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line editor used for the search and import prompts.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize, // in chars, not bytes
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) => self.home(),
            (KeyCode::End, _) => self.end(),
            (kc, km) => self.key(kc, km),
        }
    }

    /// Replaces the content and puts the curser behind it.
    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.curser_pos = s.chars().count();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.curser_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.curser_pos = self.current_input.chars().count();
        self.get()
    }

    fn key(&mut self, code: KeyCode, modifier: KeyModifiers) -> InputResult {
        if modifier.contains(KeyModifiers::CONTROL) || modifier.contains(KeyModifiers::ALT) {
            trace!("Ignoring {code:?} with {modifier:?} in input");
            return self.get();
        }
        if let Some(chr) = code.as_char() {
            let at = self.byte_pos();
            self.current_input.insert(at, chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn type_str(input: &mut Inputter, s: &str) -> InputResult {
        let mut last = input.get();
        for c in s.chars() {
            last = input.read(KeyEvent::from(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn typing_and_editing_in_the_middle() {
        let mut input = Inputter::default();
        type_str(&mut input, "héllo");
        input.read(KeyEvent::from(KeyCode::Left));
        input.read(KeyEvent::from(KeyCode::Left));
        let result = input.read(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(result.input, "hélo");
        assert_eq!(result.curser_pos, 2);

        let result = type_str(&mut input, "L");
        assert_eq!(result.input, "héLlo");

        input.read(KeyEvent::from(KeyCode::Home));
        let result = input.read(KeyEvent::from(KeyCode::Delete));
        assert_eq!(result.input, "éLlo");
    }

    #[test]
    fn enter_and_escape_finish() {
        let mut input = Inputter::default();
        type_str(&mut input, "abc");
        let result = input.read(KeyEvent::from(KeyCode::Enter));
        assert!(result.finished && !result.canceled);

        input.clear();
        input.set("xyz");
        assert_eq!(input.get().curser_pos, 3);
        let result = input.read(KeyEvent::from(KeyCode::Esc));
        assert!(result.finished && result.canceled);
    }
}
