//! Minimal multi-line text editing state for the composer.
//!
//! Holds the buffer and a byte-offset cursor (always on a char boundary) and
//! knows how to lay itself out as wrapped display rows, so rendering and
//! cursor placement agree on the same geometry.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Default)]
pub struct TextArea {
    text: String,
    cursor: usize,
}

/// One wrapped display row: a byte range of `text`, newline excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DisplayRow {
    start: usize,
    end: usize,
    /// True when the row ended because of wrapping rather than a newline or
    /// end of text; the following row starts at `end` with no separator.
    wrapped: bool,
}

impl TextArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    /// Handle an editing key. Returns false for keys the textarea does not
    /// understand so the caller can route them elsewhere.
    pub fn input(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c)
                if key
                    .modifiers
                    .difference(KeyModifiers::SHIFT)
                    .is_empty() =>
            {
                let mut buf = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut buf));
                true
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.text.replace_range(prev..self.cursor, "");
                    self.cursor = prev;
                }
                true
            }
            KeyCode::Delete => {
                if let Some(next) = self.next_boundary() {
                    self.text.replace_range(self.cursor..next, "");
                }
                true
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
                true
            }
            KeyCode::Right => {
                if let Some(next) = self.next_boundary() {
                    self.cursor = next;
                }
                true
            }
            KeyCode::Home => {
                self.cursor = self.current_line_start();
                true
            }
            KeyCode::End => {
                self.cursor = self.current_line_end();
                true
            }
            _ => false,
        }
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    fn current_line_start(&self) -> usize {
        self.text[..self.cursor]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn current_line_end(&self) -> usize {
        self.text[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.text.len())
    }

    fn display_rows(&self, width: u16) -> Vec<DisplayRow> {
        let width = usize::from(width.max(1));
        let mut rows = Vec::new();
        let mut row_start = 0;
        let mut col = 0;

        for (idx, ch) in self.text.char_indices() {
            if ch == '\n' {
                rows.push(DisplayRow {
                    start: row_start,
                    end: idx,
                    wrapped: false,
                });
                row_start = idx + 1;
                col = 0;
                continue;
            }

            let ch_width = ch.width().unwrap_or(0);
            if col + ch_width > width && col > 0 {
                rows.push(DisplayRow {
                    start: row_start,
                    end: idx,
                    wrapped: true,
                });
                row_start = idx;
                col = 0;
            }
            col += ch_width;
        }

        rows.push(DisplayRow {
            start: row_start,
            end: self.text.len(),
            wrapped: false,
        });
        rows
    }

    pub fn desired_height(&self, width: u16) -> u16 {
        u16::try_from(self.display_rows(width).len()).unwrap_or(u16::MAX)
    }

    /// Screen position of the cursor when rendered into `area`, if visible.
    pub fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if area.is_empty() {
            return None;
        }

        let rows = self.display_rows(area.width);
        for (row_idx, row) in rows.iter().enumerate() {
            let in_row = self.cursor >= row.start
                && (self.cursor < row.end || (self.cursor == row.end && !row.wrapped));
            if !in_row {
                continue;
            }
            let x = self.text[row.start..self.cursor].width();
            let x = area.x + u16::try_from(x).unwrap_or(u16::MAX);
            let y = area.y + u16::try_from(row_idx).unwrap_or(u16::MAX);
            if y < area.bottom() {
                return Some((x.min(area.right().saturating_sub(1)), y));
            }
            return None;
        }
        None
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        for (row_idx, row) in self.display_rows(area.width).iter().enumerate() {
            let Ok(offset) = u16::try_from(row_idx) else {
                break;
            };
            if offset >= area.height {
                break;
            }
            buf.set_stringn(
                area.x,
                area.y + offset,
                &self.text[row.start..row.end],
                usize::from(area.width),
                ratatui::style::Style::default(),
            );
        }
    }
}
