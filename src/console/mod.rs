//! Character source and terminal output for the dispatch loop.
//!
//! - `Key`: one keystroke, control sequence or termination signal
//! - `Console`: read a key, read a line, write output
//! - `TerminalConsole`: crossterm-backed implementation
//! - `ScriptedConsole`: replays canned input and captures output

mod line;
mod scripted;
mod terminal;

use std::io::{self, Write};

pub use line::LineBuffer;
pub use scripted::ScriptedConsole;
pub use terminal::{TerminalConsole, translate_key};

/// One unit of keyboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A single character (control characters included)
    Char(char),
    /// A multi-character escape sequence with no single code point
    Sequence(String),
    /// Ctrl-C
    Interrupt,
    /// Ctrl-D / end of input
    Eof,
}

/// Result of a line-mode read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    Text(String),
    /// The user cancelled the line
    Abort,
}

/// Where the loop gets its input and sends its output.
pub trait Console {
    /// Block until the next keystroke.
    fn read_key(&mut self) -> io::Result<Key>;

    /// Show `prompt` and read one line of text.
    fn read_line(&mut self, prompt: &str) -> io::Result<LineInput>;

    /// Terminal output
    fn out(&mut self) -> &mut dyn Write;
}

