//! Console that replays canned input and records everything written.
//!
//! Used by the tests and for driving a loop from a script. When keys run out
//! it reports end of input; when lines run out it reports an aborted line.

use std::collections::VecDeque;
use std::io::{self, Write};

use super::{Console, Key, LineInput};

#[derive(Debug, Default)]
pub struct ScriptedConsole {
    keys: VecDeque<Key>,
    lines: VecDeque<LineInput>,
    output: Vec<u8>,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a single key
    pub fn key(mut self, key: Key) -> Self {
        self.keys.push_back(key);
        self
    }

    /// Queue each character of `text` as its own key
    pub fn chars(mut self, text: &str) -> Self {
        self.keys.extend(text.chars().map(Key::Char));
        self
    }

    /// Queue a line answer for the next line-mode read
    pub fn line(mut self, text: &str) -> Self {
        self.lines.push_back(LineInput::Text(text.to_string()));
        self
    }

    /// Queue a cancelled line-mode read
    pub fn abort_line(mut self) -> Self {
        self.lines.push_back(LineInput::Abort);
        self
    }

    /// Queue `:` followed by the command line
    pub fn command(self, line: &str) -> Self {
        self.chars(":").line(line)
    }

    /// Everything written so far
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Keys not consumed yet
    pub fn pending_keys(&self) -> usize {
        self.keys.len()
    }

    /// Lines not consumed yet
    pub fn pending_lines(&self) -> usize {
        self.lines.len()
    }
}

impl Console for ScriptedConsole {
    fn read_key(&mut self) -> io::Result<Key> {
        Ok(self.keys.pop_front().unwrap_or(Key::Eof))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<LineInput> {
        self.output.extend_from_slice(prompt.as_bytes());
        let input = self.lines.pop_front().unwrap_or(LineInput::Abort);
        if let LineInput::Text(text) = &input {
            self.output.extend_from_slice(text.as_bytes());
        }
        self.output.push(b'\n');
        Ok(input)
    }

    fn out(&mut self) -> &mut dyn Write {
        &mut self.output
    }
}
