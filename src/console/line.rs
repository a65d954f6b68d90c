//! Editable line buffer used while composing commands and notes.

/// Text being typed, with a cursor (byte offset, always on a char boundary).
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    content: String,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of characters left of the cursor
    pub fn cursor_column(&self) -> usize {
        self.content[..self.cursor].chars().count()
    }

    /// Insert a character at the cursor
    pub fn insert(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.prev_boundary();
            self.content.remove(prev);
            self.cursor = prev;
        }
    }

    /// Delete the character under the cursor
    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            self.content.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_boundary();
    }

    pub fn move_right(&mut self) {
        self.cursor = self.next_boundary();
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    /// Delete from the start of the line to the cursor (Ctrl-U)
    pub fn kill_to_start(&mut self) {
        self.content.drain(..self.cursor);
        self.cursor = 0;
    }

    /// Take the content and reset
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    fn prev_boundary(&self) -> usize {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.content[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> LineBuffer {
        let mut buf = LineBuffer::new();
        for c in text.chars() {
            buf.insert(c);
        }
        buf
    }

    #[test]
    fn test_insert_and_take() {
        let mut buf = typed("echo a");
        assert_eq!(buf.content(), "echo a");
        assert_eq!(buf.cursor_column(), 6);
        assert_eq!(buf.take(), "echo a");
        assert!(buf.is_empty());
        assert_eq!(buf.cursor_column(), 0);
    }

    #[test]
    fn test_backspace_multibyte() {
        let mut buf = typed("héé");
        buf.backspace();
        assert_eq!(buf.content(), "hé");
        buf.backspace();
        buf.backspace();
        buf.backspace();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_cursor_movement_and_insert() {
        let mut buf = typed("ac");
        buf.move_left();
        buf.insert('b');
        assert_eq!(buf.content(), "abc");
        buf.move_home();
        buf.insert('>');
        assert_eq!(buf.content(), ">abc");
        buf.move_end();
        buf.insert('!');
        assert_eq!(buf.content(), ">abc!");
    }

    #[test]
    fn test_move_past_edges_is_noop() {
        let mut buf = typed("é");
        buf.move_right();
        assert_eq!(buf.cursor_column(), 1);
        buf.move_left();
        buf.move_left();
        assert_eq!(buf.cursor_column(), 0);
    }

    #[test]
    fn test_delete_under_cursor() {
        let mut buf = typed("abc");
        buf.move_home();
        buf.delete();
        assert_eq!(buf.content(), "bc");
        buf.move_end();
        buf.delete();
        assert_eq!(buf.content(), "bc");
    }

    #[test]
    fn test_kill_to_start() {
        let mut buf = typed("history 5");
        buf.move_left();
        buf.kill_to_start();
        assert_eq!(buf.content(), "5");
        assert_eq!(buf.cursor_column(), 0);
    }
}
