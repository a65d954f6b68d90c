//! crossterm-backed console.
//!
//! Raw mode is held only while reading, so output written between reads
//! behaves like ordinary cooked-mode output.

use std::io::{self, Stdout, Write, stdout};

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use crossterm::queue;

use super::line::LineBuffer;
use super::{Console, Key, LineInput};

struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Map a crossterm key to the loop's key model.
///
/// Ctrl+letter becomes the matching control character, Alt+char and
/// navigation keys become escape sequences. Returns `None` for keys with no
/// sensible text form.
pub fn translate_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let alt = modifiers.contains(KeyModifiers::ALT);

    let seq = |s: &str| Some(Key::Sequence(s.to_string()));
    match code {
        KeyCode::Char('c') if ctrl => Some(Key::Interrupt),
        KeyCode::Char('d') if ctrl => Some(Key::Eof),
        KeyCode::Char(c) if ctrl && c.is_ascii_alphabetic() => {
            Some(Key::Char(((c.to_ascii_lowercase() as u8) & 0x1f) as char))
        }
        KeyCode::Char(c) if alt => Some(Key::Sequence(format!("\x1b{}", c))),
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Enter => Some(Key::Char('\r')),
        KeyCode::Tab => Some(Key::Char('\t')),
        KeyCode::Backspace => Some(Key::Char('\x7f')),
        KeyCode::Esc => Some(Key::Char('\x1b')),
        KeyCode::Up => seq("\x1b[A"),
        KeyCode::Down => seq("\x1b[B"),
        KeyCode::Right => seq("\x1b[C"),
        KeyCode::Left => seq("\x1b[D"),
        KeyCode::Home => seq("\x1b[H"),
        KeyCode::End => seq("\x1b[F"),
        KeyCode::Insert => seq("\x1b[2~"),
        KeyCode::Delete => seq("\x1b[3~"),
        KeyCode::PageUp => seq("\x1b[5~"),
        KeyCode::PageDown => seq("\x1b[6~"),
        KeyCode::F(n) => Some(Key::Sequence(format!("\x1b[{}~", 10 + n))),
        _ => None,
    }
}

/// Interactive terminal console.
pub struct TerminalConsole {
    stdout: Stdout,
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self { stdout: stdout() }
    }

    fn next_key_event() -> io::Result<(KeyCode, KeyModifiers)> {
        loop {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                return Ok((key.code, key.modifiers));
            }
        }
    }

    fn redraw(&mut self, prompt: &str, buf: &LineBuffer) -> io::Result<()> {
        let column = prompt.chars().count() + buf.cursor_column();
        queue!(
            self.stdout,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(prompt),
            Print(buf.content()),
            MoveToColumn(column.min(u16::MAX as usize) as u16)
        )?;
        self.stdout.flush()
    }
}

impl Console for TerminalConsole {
    fn read_key(&mut self) -> io::Result<Key> {
        self.stdout.flush()?;
        let _raw = RawMode::enable()?;
        loop {
            let (code, modifiers) = Self::next_key_event()?;
            if let Some(key) = translate_key(code, modifiers) {
                return Ok(key);
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<LineInput> {
        let mut buf = LineBuffer::new();
        let _raw = RawMode::enable()?;
        self.redraw(prompt, &buf)?;

        let input = loop {
            let (code, modifiers) = Self::next_key_event()?;
            let ctrl = modifiers.contains(KeyModifiers::CONTROL);
            match code {
                KeyCode::Enter => break LineInput::Text(buf.take()),
                KeyCode::Esc => break LineInput::Abort,
                KeyCode::Char('c') if ctrl => break LineInput::Abort,
                KeyCode::Char('d') if ctrl && buf.is_empty() => break LineInput::Abort,
                KeyCode::Char('u') if ctrl => buf.kill_to_start(),
                KeyCode::Char('a') if ctrl => buf.move_home(),
                KeyCode::Char('e') if ctrl => buf.move_end(),
                KeyCode::Char(_) if ctrl => {}
                KeyCode::Char(c) => buf.insert(c),
                KeyCode::Backspace => buf.backspace(),
                KeyCode::Delete => buf.delete(),
                KeyCode::Left => buf.move_left(),
                KeyCode::Right => buf.move_right(),
                KeyCode::Home => buf.move_home(),
                KeyCode::End => buf.move_end(),
                _ => {}
            }
            self.redraw(prompt, &buf)?;
        };

        queue!(self.stdout, Print("\r\n"))?;
        self.stdout.flush()?;
        Ok(input)
    }

    fn out(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }
}
