use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::InputMode;
use crate::model::UIData;
use crate::pipeline::SortDirection;

pub const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
    list_state: ListState,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, uidata: &UIData, frame: &mut Frame) {
        let [search_area, table_area, footer_area, status_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_search(uidata, frame, search_area);
        self.draw_table(uidata, frame, table_area);
        Self::draw_footer(uidata, frame, footer_area);
        Self::draw_statusline(uidata, frame, status_area);

        if uidata.show_columns {
            self.draw_column_dialog(uidata, frame);
        }
        if uidata.show_popup {
            Self::draw_popup(uidata, frame);
        }
    }

    fn draw_search(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let searching = uidata.active_cmdinput && uidata.input_mode == Some(InputMode::Search);
        let block = Block::bordered()
            .title(Line::from(" Global Search ".bold()))
            .border_set(if searching { border::THICK } else { border::PLAIN });
        let text = if searching {
            uidata.cmdinput.input.as_str()
        } else {
            uidata.search_text.as_str()
        };
        frame.render_widget(Paragraph::new(text).block(block), area);

        if searching {
            let x = cursor_x(area.x.saturating_add(1), uidata.cmdinput.curser_pos);
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let header = Row::new(uidata.headers.iter().map(|h| {
            let arrow = match h.sorted {
                Some(SortDirection::Ascending) => " ▲",
                Some(SortDirection::Descending) => " ▼",
                None => "",
            };
            Cell::from(format!("{}{}", h.label, arrow))
        }))
        .style(Style::new().bold().underlined());

        let rows = uidata
            .rows
            .iter()
            .map(|r| Row::new(r.iter().map(|v| Cell::from(v.as_str()))));

        let widths = vec![Constraint::Fill(1); uidata.headers.len().max(1)];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::bordered().border_set(border::PLAIN))
            .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .cell_highlight_style(Style::new().yellow().bold());

        if uidata.rows.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(uidata.selected_row));
            self.table_state.select_column(Some(uidata.selected_column));
        }
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_footer(uidata: &UIData, frame: &mut Frame, area: Rect) {
        let range = if uidata.rows.is_empty() {
            format!("0 of {}", uidata.total)
        } else {
            format!(
                "{}-{} of {}",
                uidata.first_row,
                uidata.first_row + uidata.rows.len() - 1,
                uidata.total
            )
        };
        let pages = format!("page {}/{}", uidata.page + 1, uidata.page_count.max(1));
        let line = Line::from(vec![
            " Rows ".into(),
            range.yellow(),
            "  ".into(),
            pages.yellow(),
            "  ".into(),
            "<?>".blue().bold(),
            " help ".into(),
        ])
        .right_aligned();
        frame.render_widget(line, area);
    }

    fn draw_statusline(uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput && uidata.input_mode == Some(InputMode::ImportPath) {
            let prompt = "Import csv: ";
            let line = Line::from(vec![prompt.blue().bold(), Span::raw(&uidata.cmdinput.input)]);
            frame.render_widget(line, area);
            let x = cursor_x(area.x, prompt.len().saturating_add(uidata.cmdinput.curser_pos));
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let mut spans = Vec::new();
        if uidata.loading {
            spans.push("[loading] ".magenta().bold());
        }
        if uidata.last_status_message_update.elapsed() < STATUS_MESSAGE_TIMEOUT {
            spans.push(Span::raw(uidata.status_message.as_str()));
        }
        frame.render_widget(Line::from(spans), area);
    }

    fn draw_column_dialog(&mut self, uidata: &UIData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 40, 50);
        let items: Vec<ListItem> = uidata
            .column_choices
            .iter()
            .enumerate()
            .map(|(idx, choice)| {
                let mark = if choice.checked { "[x]" } else { "[ ]" };
                ListItem::new(format!("{mark} {} {}", idx + 1, choice.label))
            })
            .collect();
        let block = Block::bordered()
            .title(Line::from(" Select Visible Columns ".bold()).centered())
            .title_bottom(Line::from(vec![" Toggle ".into(), "<Space>".blue().bold(), " Close ".into(), "<Esc> ".blue().bold()]).centered())
            .border_set(border::THICK);
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED));

        self.list_state.select(Some(uidata.selected_choice));
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn draw_popup(uidata: &UIData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 60, 60);
        let block = Block::bordered()
            .title(Line::from(format!(" {} ", uidata.popup_title).bold()).centered())
            .title_bottom(Line::from(vec![" Close ".into(), "<Esc> ".blue().bold()]).centered())
            .border_set(border::THICK);
        let popup = Paragraph::new(uidata.popup_message.as_str())
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(Clear, area);
        frame.render_widget(popup, area);
    }
}

/// Column of the input curser, saturating at the screen edge for long input.
fn cursor_x(start: u16, offset: usize) -> u16 {
    start.saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}
