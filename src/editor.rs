/// Multi-line text field used for todos in edit mode.
///
/// The cursor column counts chars, not bytes.
#[derive(Debug, Clone)]
pub struct TextField {
    pub lines: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
}

impl TextField {
    /// Opens the field with the cursor at the end of `content`.
    pub fn new(content: &str) -> Self {
        let lines: Vec<String> = if content.is_empty() {
            vec![String::new()]
        } else {
            content.split('\n').map(|s| s.to_string()).collect()
        };
        let cursor_row = lines.len() - 1;
        let cursor_col = char_len(&lines[cursor_row]);

        TextField {
            lines,
            cursor_row,
            cursor_col,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let line = &mut self.lines[self.cursor_row];
        let at = byte_index(line, self.cursor_col);
        line.insert(at, c);
        self.cursor_col += 1;
    }

    pub fn insert_newline(&mut self) {
        let line = &mut self.lines[self.cursor_row];
        let at = byte_index(line, self.cursor_col);
        let remaining = line.split_off(at);

        self.cursor_row += 1;
        self.cursor_col = 0;
        self.lines.insert(self.cursor_row, remaining);
    }

    /// Backspace. Returns false when there was nothing to delete.
    pub fn delete_char(&mut self) -> bool {
        if self.cursor_col > 0 {
            let line = &mut self.lines[self.cursor_row];
            let at = byte_index(line, self.cursor_col - 1);
            line.remove(at);
            self.cursor_col -= 1;
            true
        } else if self.cursor_row > 0 {
            // Join with previous line
            let current_line = self.lines.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = char_len(&self.lines[self.cursor_row]);
            self.lines[self.cursor_row].push_str(&current_line);
            true
        } else {
            false
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = char_len(&self.lines[self.cursor_row]);
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < char_len(&self.lines[self.cursor_row]) {
            self.cursor_col += 1;
        } else if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.clamp_col();
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.clamp_col();
        }
    }

    pub fn move_to_start_of_line(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_to_end_of_line(&mut self) {
        self.cursor_col = char_len(&self.lines[self.cursor_row]);
    }

    fn clamp_col(&mut self) {
        self.cursor_col = self.cursor_col.min(char_len(&self.lines[self.cursor_row]));
    }

    pub fn content(&self) -> String {
        self.lines.join("\n")
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_index(s: &str, char_col: usize) -> usize {
    s.char_indices().nth(char_col).map_or(s.len(), |(i, _)| i)
}
