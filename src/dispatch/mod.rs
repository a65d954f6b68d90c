//! Dispatch loop - read one key at a time and act on it.
//!
//! The loop has a single waiting state. Each key is handled and control
//! returns to the prompt, until end of input, an interrupt, or a break
//! character stops it:
//!
//! - `?` shows the layered documentation and the startup message
//! - `-` reads a note for the input hook (or the log)
//! - `:` reads a command line, resolves the name and invokes it
//! - a bound hotkey runs its callable
//! - anything else is echoed with its code point
//!
//! Nothing an action does can stop the loop; only the console can.

mod builder;
mod builtins;

use std::fmt::Display;
use std::io::Write;

use colored::*;
use serde_json::{Map, Value};

pub use builder::{BASE_DOC, ContextHook, Hooks, InputHook, LoopBuilder, Settings};
pub use builtins::{Builtins, DONT_LOG};

use crate::console::{Console, Key, LineInput};
use crate::domain::{InvocationRecord, WishRecord};
use crate::error::Result;
use crate::interrupt;
use crate::invoke::{Context, History, invoke, invoke_hotkey};
use crate::registry::{Hotkey, HotkeyTarget, Registry, key_display};
use crate::session::SessionLauncher;
use crate::storage::{Filter, LogSink, log_collection, wish_collection};

/// Printed when the loop starts and after the documentation
pub const STARTUP_MESSAGE: &str = ":docstrings to see all colon commands\n:shortcuts to see all hotkeys\n";

/// Shown when a stored wish exists for a key or command
const WISH_TEMPLATE: &str = "[NOT FULFILLED YET] {message} ({timestamp})";

const KEY_WISH_PROMPT: &str = "what do you wish this key press did? ";
const COMMAND_WISH_PROMPT: &str = "what do you wish this command did? ";
const COMMAND_PROMPT: &str = ":";
const NOTE_PROMPT: &str = "- ";

/// Whether the loop keeps going after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// What a wish is about
#[derive(Clone, Copy)]
enum WishTarget<'a> {
    Key(&'a str),
    Command(&'a str),
}

/// The single-key command loop.
pub struct CharLoop<C: Console> {
    console: C,
    sink: Box<dyn LogSink>,
    registry: Registry,
    settings: Settings,
    hooks: Hooks,
    launcher: Box<dyn SessionLauncher>,
    docs: Vec<String>,
    history: History,
}

impl<C: Console> CharLoop<C> {
    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// The injected log sink
    pub fn sink(&mut self) -> &mut dyn LogSink {
        &mut *self.sink
    }

    /// Add bindings before `run`; re-registering a name replaces it.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Keys and commands seen so far
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Documentation layers joined most general first
    pub fn class_doc(&self) -> String {
        let docs: Vec<&str> = self.docs.iter().map(|d| d.trim()).filter(|d| !d.is_empty()).collect();
        format!("{}\n", docs.join("\n\n"))
    }

    /// Run until end of input, an interrupt, or a break character.
    ///
    /// Only console IO errors are returned.
    pub fn run(&mut self) -> Result<()> {
        log::info!("Starting loop {}", self.settings.name);
        interrupt::install();
        writeln!(self.console.out(), "{}", STARTUP_MESSAGE)?;

        loop {
            let prompt = self.settings.prompt.cyan().bold().to_string();
            write!(self.console.out(), "{}", prompt)?;
            self.console.out().flush()?;

            let key = self.console.read_key()?;
            if self.handle_key(key)? == Flow::Stop {
                break;
            }
        }

        log::info!("Loop {} stopped", self.settings.name);
        Ok(())
    }

    fn handle_key(&mut self, key: Key) -> Result<Flow> {
        let ch = match key {
            Key::Eof | Key::Interrupt => {
                writeln!(self.console.out())?;
                return Ok(Flow::Stop);
            }
            Key::Sequence(seq) => {
                self.history.chars.push(seq.clone());
                writeln!(self.console.out(), "{:?}", seq)?;
                self.unbound_key(&seq)?;
                return Ok(Flow::Continue);
            }
            Key::Char(ch) => ch,
        };
        if ch == '\x03' || ch == '\x04' {
            writeln!(self.console.out())?;
            return Ok(Flow::Stop);
        }
        self.history.chars.push(ch.to_string());

        let hotkey = self.registry.hotkey(ch).cloned();
        match ch {
            '?' => self.show_docs()?,
            '-' => self.note_mode()?,
            ':' => self.command_mode()?,
            _ if self.settings.break_chars.contains(&ch) => {
                match hotkey {
                    Some(hotkey) => self.run_hotkey(ch, hotkey)?,
                    None => writeln!(self.console.out(), "{}", key_display(ch))?,
                }
                log::debug!("break character {:?}", ch);
                return Ok(Flow::Stop);
            }
            _ => match hotkey {
                Some(hotkey) => self.run_hotkey(ch, hotkey)?,
                None => {
                    writeln!(self.console.out(), "{:?} {}", ch, ch as u32)?;
                    self.unbound_key(&ch.to_string())?;
                }
            },
        }
        Ok(Flow::Continue)
    }

    fn context(&mut self) -> Context<'_> {
        Context::new(
            self.console.out(),
            &mut *self.sink,
            &self.registry,
            &self.settings.name,
            &self.history,
            self.settings.history_limit,
            &self.settings.triggers,
        )
    }

    fn show_docs(&mut self) -> Result<()> {
        let doc = self.class_doc();
        writeln!(self.console.out(), "?\n{}", doc)?;
        writeln!(self.console.out(), "{}", STARTUP_MESSAGE)?;
        Ok(())
    }

    fn command_mode(&mut self) -> Result<()> {
        let line = match self.console.read_line(COMMAND_PROMPT)? {
            LineInput::Text(line) => line,
            LineInput::Abort => {
                writeln!(self.console.out())?;
                return Ok(());
            }
        };
        let mut tokens = line.split_whitespace().map(str::to_string);
        let Some(name) = tokens.next() else {
            writeln!(self.console.out())?;
            return Ok(());
        };
        let args: Vec<String> = tokens.collect();
        self.history.cmds.push(name.clone());

        if let Some(command) = self.settings.triggers.get(&name).cloned() {
            return self.launch_session(&name, &command);
        }
        self.run_command(&name, &args)
    }

    fn run_command(&mut self, name: &str, args: &[String]) -> Result<()> {
        let action = match self.registry.resolve(name) {
            Ok(action) => action.clone(),
            Err(e) => {
                log::error!("{}", e);
                let record = InvocationRecord::invalid_command(&self.settings.name, name, args.to_vec());
                self.append_record(&record)?;
                writeln!(self.console.out(), "{}", e.to_string().red())?;
                if self.settings.wishlist {
                    self.wish(WishTarget::Command(name))?;
                }
                return Ok(());
            }
        };

        let record_it = !self.settings.dont_log.contains(name);
        log::info!("Running command {} {:?}", name, args);
        interrupt::take();
        let record = invoke(&action, args, &mut self.context());
        self.show_outcome(&record)?;
        self.report_interrupt(name)?;
        if record_it {
            self.append_record(&record)?;
        }
        Ok(())
    }

    fn run_hotkey(&mut self, ch: char, hotkey: Hotkey) -> Result<()> {
        writeln!(self.console.out(), "{}", key_display(ch))?;
        interrupt::take();
        let record = match &hotkey.target {
            HotkeyTarget::Callable { func, module } => {
                invoke_hotkey(ch, &hotkey.help, func, module, &mut self.context())
            }
            HotkeyTarget::Command(name) => {
                let action = match self.registry.resolve(name) {
                    Ok(action) => action.clone(),
                    Err(e) => {
                        log::error!("hotkey {:?}: {}", ch, e);
                        writeln!(self.console.out(), "{}", e.to_string().red())?;
                        return Ok(());
                    }
                };
                invoke(&action, &[], &mut self.context())
            }
        };

        if record.is_error() && !self.settings.report_hotkey_errors {
            log::debug!("hotkey {:?} failed: {:?}", ch, record.error_value);
        } else {
            self.show_outcome(&record)?;
        }
        self.report_interrupt(&key_display(ch))?;
        if self.settings.log_hotkeys && !self.settings.dont_log.contains(&record.cmd) {
            self.append_record(&record)?;
        }
        Ok(())
    }

    fn note_mode(&mut self) -> Result<()> {
        let Some(pre) = self.hook_data(true)? else {
            return Ok(());
        };
        let text = match self.console.read_line(NOTE_PROMPT)? {
            LineInput::Text(text) => text,
            LineInput::Abort => {
                writeln!(self.console.out())?;
                return Ok(());
            }
        };
        let Some(post) = self.hook_data(false)? else {
            return Ok(());
        };
        let mut data = pre;
        data.extend(post);

        match self.hooks.input.as_mut() {
            Some(hook) => {
                let mut merged = data;
                merged.insert("text".to_string(), Value::String(text));
                if let Err(e) = hook(&merged) {
                    log::error!("input hook failed: {:#}", e);
                    self.report_problem("input hook failed", format!("{:#}", e))?;
                }
            }
            None => {
                let record = InvocationRecord::note(&self.settings.name, &text, data);
                self.append_record(&record)?;
            }
        }
        Ok(())
    }

    /// Run the pre or post input hook. `None` means it failed and the note
    /// is dropped.
    fn hook_data(&mut self, pre: bool) -> Result<Option<Map<String, Value>>> {
        let hook = if pre {
            self.hooks.pre_input.as_mut()
        } else {
            self.hooks.post_input.as_mut()
        };
        let Some(hook) = hook else {
            return Ok(Some(Map::new()));
        };
        match hook() {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                let which = if pre { "pre input hook" } else { "post input hook" };
                log::error!("{} failed: {:#}", which, e);
                self.report_problem(&format!("{} failed", which), format!("{:#}", e))?;
                Ok(None)
            }
        }
    }

    fn launch_session(&mut self, trigger: &str, command: &str) -> Result<()> {
        self.console.out().flush()?;
        interrupt::take();
        let result = self.launcher.launch(trigger, command);
        if self.report_interrupt(trigger)? {
            return Ok(());
        }
        if let Err(e) = result {
            log::error!("{} session failed: {}", trigger, e);
            self.report_problem(trigger, e)?;
        }
        Ok(())
    }

    /// Ctrl-C during an action or session abandons that input only.
    fn report_interrupt(&mut self, what: &str) -> Result<bool> {
        if !interrupt::take() {
            return Ok(false);
        }
        log::info!("{} interrupted", what);
        writeln!(self.console.out(), "\n{}", format!("{} interrupted", what).yellow())?;
        Ok(true)
    }

    fn unbound_key(&mut self, text: &str) -> Result<()> {
        if !self.settings.wishlist {
            return Ok(());
        }
        let chars = &self.history.chars;
        let repeated = chars.len() >= 2 && chars[chars.len() - 2] == text;
        if self.show_wish(Filter::eq("ch", text))? || !repeated {
            return Ok(());
        }
        self.ask_wish(WishTarget::Key(text))
    }

    fn wish(&mut self, target: WishTarget<'_>) -> Result<()> {
        let filter = match target {
            WishTarget::Key(ch) => Filter::eq("ch", ch),
            WishTarget::Command(cmd) => Filter::eq("cmd", cmd),
        };
        if self.show_wish(filter)? {
            return Ok(());
        }
        self.ask_wish(target)
    }

    /// Print the most recent stored wish matching `filter`, if any.
    fn show_wish(&mut self, filter: Filter) -> Result<bool> {
        let collection = wish_collection(&self.settings.name);
        match self.sink.find(&collection, &[filter], WISH_TEMPLATE, Some(1)) {
            Ok(found) => match found.first() {
                Some(line) => {
                    writeln!(self.console.out(), "{}", line.yellow())?;
                    Ok(true)
                }
                None => Ok(false),
            },
            Err(e) => {
                log::warn!("Failed to look up wishes: {}", e);
                Ok(false)
            }
        }
    }

    fn ask_wish(&mut self, target: WishTarget<'_>) -> Result<()> {
        let prompt = match target {
            WishTarget::Key(_) => KEY_WISH_PROMPT,
            WishTarget::Command(_) => COMMAND_WISH_PROMPT,
        };
        let message = match self.console.read_line(prompt)? {
            LineInput::Text(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => return Ok(()),
        };
        let wish = match target {
            WishTarget::Key(ch) => WishRecord::for_key(&self.settings.name, ch, &message),
            WishTarget::Command(cmd) => WishRecord::for_command(&self.settings.name, cmd, &message),
        };
        let collection = wish_collection(&self.settings.name);
        let stored = serde_json::to_value(&wish)
            .map_err(Into::into)
            .and_then(|value| self.sink.append(&collection, value));
        if let Err(e) = stored {
            log::warn!("Failed to save wish: {}", e);
            self.report_problem("could not save wish", e)?;
        }
        Ok(())
    }

    /// Print a success value or the failure banner.
    fn show_outcome(&mut self, record: &InvocationRecord) -> Result<()> {
        let out = self.console.out();
        if record.is_ok() {
            match &record.value {
                Some(Value::String(text)) => writeln!(out, "{}", text)?,
                Some(value) => {
                    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                    writeln!(out, "{}", pretty)?;
                }
                None => {}
            }
            return Ok(());
        }

        writeln!(out, "{}", "=".repeat(70).red())?;
        writeln!(
            out,
            "{}: {}",
            record.error_type.as_deref().unwrap_or("error").red().bold(),
            record.error_value.as_deref().unwrap_or_default()
        )?;
        if let Some(trace) = &record.traceback_string {
            writeln!(out, "{}", trace)?;
        }
        writeln!(out, "{}", "=".repeat(70).red())?;
        Ok(())
    }

    /// Append to the session log. A sink failure is reported, not fatal.
    fn append_record(&mut self, record: &InvocationRecord) -> Result<()> {
        let collection = log_collection(&self.settings.name);
        let stored = record
            .to_value()
            .map_err(Into::into)
            .and_then(|value| self.sink.append(&collection, value));
        if let Err(e) = stored {
            log::warn!("Failed to save record for {}: {}", record.cmd, e);
            self.report_problem("could not save record", e)?;
        }
        Ok(())
    }

    fn report_problem(&mut self, what: &str, detail: impl Display) -> Result<()> {
        writeln!(self.console.out(), "{} {}", format!("{}:", what).red().bold(), detail)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedConsole;
    use crate::domain::Status;
    use crate::storage::MemorySink;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn build(builder: LoopBuilder, console: ScriptedConsole) -> CharLoop<ScriptedConsole> {
        builder.name("test").build(console, Box::new(MemorySink::new()))
    }

    fn records(chloop: &mut CharLoop<ScriptedConsole>) -> Vec<InvocationRecord> {
        chloop
            .sink()
            .query(&log_collection("test"), &[], None)
            .unwrap()
            .into_iter()
            .map(|v| InvocationRecord::from_value(v).unwrap())
            .collect()
    }

    fn wishes(chloop: &mut CharLoop<ScriptedConsole>) -> Vec<Value> {
        chloop.sink().query(&wish_collection("test"), &[], None).unwrap()
    }

    struct RecordingLauncher(Rc<RefCell<Vec<(String, String)>>>);

    impl SessionLauncher for RecordingLauncher {
        fn launch(&mut self, trigger: &str, command: &str) -> Result<()> {
            self.0.borrow_mut().push((trigger.to_string(), command.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_startup_message_and_eof() {
        let mut chloop = build(LoopBuilder::new().unwrap(), ScriptedConsole::new());
        chloop.run().unwrap();
        assert!(chloop.console().output().starts_with(STARTUP_MESSAGE));
        assert!(records(&mut chloop).is_empty());
    }

    #[test]
    fn test_control_chars_stop() {
        for ch in ['\x03', '\x04'] {
            let console = ScriptedConsole::new().key(Key::Char(ch)).command("echo never");
            let mut chloop = build(LoopBuilder::new().unwrap(), console);
            chloop.run().unwrap();
            assert_eq!(chloop.console().pending_lines(), 1);
        }
    }

    #[test]
    fn test_interrupt_stops() {
        let console = ScriptedConsole::new().key(Key::Interrupt).chars("?");
        let mut chloop = build(LoopBuilder::new().unwrap(), console);
        chloop.run().unwrap();
        assert_eq!(chloop.console().pending_keys(), 1);
    }

    #[test]
    fn test_unbound_key_prints_repr_and_code() {
        let console = ScriptedConsole::new().chars("x");
        let mut chloop = build(LoopBuilder::new().unwrap(), console);
        chloop.run().unwrap();
        assert!(chloop.console().output().contains("'x' 120\n"));
        assert_eq!(chloop.history().chars, vec!["x"]);
    }

    #[test]
    fn test_sequence_prints_repr_only() {
        let console = ScriptedConsole::new().key(Key::Sequence("\x1b[A".to_string()));
        let mut chloop = build(LoopBuilder::new().unwrap(), console);
        chloop.run().unwrap();
        assert!(chloop.console().output().contains("\"\\u{1b}[A\"\n"));
    }

    #[test]
    fn test_question_mark_shows_layered_docs() {
        let builder = LoopBuilder::new().unwrap().describe("Layer one").describe("Layer two");
        let mut chloop = build(builder, ScriptedConsole::new().chars("?"));
        chloop.run().unwrap();

        let output = chloop.console().output();
        let base = output.find("Read single keys").unwrap();
        let one = output.find("Layer one").unwrap();
        let two = output.find("Layer two").unwrap();
        assert!(base < one && one < two);
        assert_eq!(output.matches(":docstrings to see all colon commands").count(), 2);
    }

    #[test]
    fn test_command_abort_and_blank_do_nothing() {
        let console = ScriptedConsole::new().chars(":").abort_line().command("   ");
        let mut chloop = build(LoopBuilder::new().unwrap(), console);
        chloop.run().unwrap();
        assert!(records(&mut chloop).is_empty());
        assert!(chloop.history().cmds.is_empty());
    }

    #[test]
    fn test_command_records_args_in_order() {
        let builder = LoopBuilder::new()
            .unwrap()
            .command("echo", "", |_ctx, args| Ok(Value::String(args.join(" "))))
            .unwrap();
        let mut chloop = build(builder, ScriptedConsole::new().command("echo c a b"));
        chloop.run().unwrap();

        let records = records(&mut chloop);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].args, vec!["c", "a", "b"]);
        assert_eq!(records[0].value, Some(Value::String("c a b".into())));
        assert!(chloop.console().output().contains("c a b\n"));
        assert_eq!(chloop.history().cmds, vec!["echo"]);
    }

    #[test]
    fn test_non_string_value_printed_as_json() {
        let builder = LoopBuilder::new()
            .unwrap()
            .command("count", "", |_ctx, args| Ok(Value::from(args.len())))
            .unwrap();
        let mut chloop = build(builder, ScriptedConsole::new().command("count a b"));
        chloop.run().unwrap();
        assert!(chloop.console().output().contains(":count a b\n2\n"));
    }

    #[test]
    fn test_dont_log_still_runs() {
        let ran = Rc::new(RefCell::new(0));
        let counter = ran.clone();
        let builder = LoopBuilder::new()
            .unwrap()
            .dont_log("quiet")
            .command("quiet", "", move |_ctx, _args| {
                *counter.borrow_mut() += 1;
                Ok(Value::String("shh".into()))
            })
            .unwrap();
        let mut chloop = build(builder, ScriptedConsole::new().command("quiet"));
        chloop.run().unwrap();

        assert_eq!(*ran.borrow(), 1);
        assert!(chloop.console().output().contains("shh\n"));
        assert!(records(&mut chloop).is_empty());
    }

    #[test]
    fn test_unknown_command_records_and_asks_for_wish() {
        let console = ScriptedConsole::new().command("nope").line("do something");
        let mut chloop = build(LoopBuilder::new().unwrap(), console);
        chloop.run().unwrap();

        let records = records(&mut chloop);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::Error);
        assert_eq!(records[0].error_type.as_deref(), Some("invalid command"));

        let wishes = wishes(&mut chloop);
        assert_eq!(wishes.len(), 1);
        assert_eq!(wishes[0]["cmd"], "nope");
        assert_eq!(wishes[0]["message"], "do something");
        assert!(chloop.console().output().contains(COMMAND_WISH_PROMPT));
    }

    #[test]
    fn test_existing_wish_is_shown_instead_of_asking() {
        let console = ScriptedConsole::new()
            .command("nope")
            .line("first wish")
            .command("nope")
            .line("never asked");
        let mut chloop = build(LoopBuilder::new().unwrap(), console);
        chloop.run().unwrap();

        assert_eq!(wishes(&mut chloop).len(), 1);
        assert!(chloop.console().output().contains("[NOT FULFILLED YET] first wish ("));
        assert_eq!(chloop.console().pending_lines(), 1);
    }

    #[test]
    fn test_wishlist_disabled() {
        let console = ScriptedConsole::new().command("nope").line("unused");
        let mut chloop = build(LoopBuilder::new().unwrap().wishlist(false), console);
        chloop.run().unwrap();
        assert!(wishes(&mut chloop).is_empty());
        assert_eq!(chloop.console().pending_lines(), 1);
    }

    #[test]
    fn test_repeated_unbound_key_asks_for_wish() {
        let console = ScriptedConsole::new().chars("xyx").chars("xx").line("open the editor");
        let mut chloop = build(LoopBuilder::new().unwrap(), console);
        chloop.run().unwrap();

        let wishes = wishes(&mut chloop);
        assert_eq!(wishes.len(), 1);
        assert_eq!(wishes[0]["ch"], "x");
        assert!(chloop.console().output().contains("[NOT FULFILLED YET] open the editor"));
    }

    #[test]
    fn test_hotkey_prints_key_then_output() {
        let builder = LoopBuilder::new()
            .unwrap()
            .hotkey('h', "say hi", |ctx| {
                writeln!(ctx.out(), "hi")?;
                Ok(Value::Null)
            })
            .unwrap();
        let mut chloop = build(builder, ScriptedConsole::new().chars("h"));
        chloop.run().unwrap();

        assert!(chloop.console().output().contains("h\nhi\n"));
        assert!(records(&mut chloop).is_empty());
    }

    #[test]
    fn test_hotkey_failure_reported_and_optionally_logged() {
        let builder = LoopBuilder::new()
            .unwrap()
            .log_hotkeys(true)
            .hotkey('b', "break things", |_ctx| Err(eyre::eyre!("hotkey broke")))
            .unwrap();
        let mut chloop = build(builder, ScriptedConsole::new().chars("b"));
        chloop.run().unwrap();

        assert!(chloop.console().output().contains("hotkey broke"));
        let records = records(&mut chloop);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cmd, "b");
        assert_eq!(records[0].status, Status::Error);
    }

    #[test]
    fn test_hotkey_errors_can_be_silenced() {
        let builder = LoopBuilder::new()
            .unwrap()
            .report_hotkey_errors(false)
            .hotkey('b', "break things", |_ctx| Err(eyre::eyre!("hotkey broke")))
            .unwrap();
        let mut chloop = build(builder, ScriptedConsole::new().chars("b"));
        chloop.run().unwrap();
        assert!(!chloop.console().output().contains("hotkey broke"));
    }

    #[test]
    fn test_break_char_runs_hotkey_then_stops() {
        let builder = LoopBuilder::new()
            .unwrap()
            .break_chars(['q'])
            .hotkey('q', "quit", |ctx| {
                writeln!(ctx.out(), "bye")?;
                Ok(Value::Null)
            })
            .unwrap();
        let mut chloop = build(builder, ScriptedConsole::new().chars("qx"));
        chloop.run().unwrap();

        assert!(chloop.console().output().contains("q\nbye\n"));
        assert_eq!(chloop.console().pending_keys(), 1);
    }

    #[test]
    fn test_break_char_without_hotkey() {
        let mut chloop = build(
            LoopBuilder::new().unwrap().break_chars(['z']),
            ScriptedConsole::new().chars("zx"),
        );
        chloop.run().unwrap();
        assert!(chloop.console().output().ends_with("z\n"));
        assert_eq!(chloop.console().pending_keys(), 1);
    }

    #[test]
    fn test_reserved_keys_win_over_break_chars() {
        let console = ScriptedConsole::new().chars("?").command("echo hi").chars("q");
        let builder = LoopBuilder::new()
            .unwrap()
            .break_chars(['?', ':', 'q'])
            .command("echo", "", |_ctx, args| Ok(Value::String(args.join(" "))))
            .unwrap();
        let mut chloop = build(builder, console);
        chloop.run().unwrap();

        let output = chloop.console().output();
        assert!(output.contains(BASE_DOC.lines().next().unwrap()));
        assert!(output.contains("hi\n"));
        assert!(output.ends_with("q\n"));
        assert_eq!(records(&mut chloop).len(), 1);
    }

    #[test]
    fn test_note_recorded_with_hook_data() {
        let builder = LoopBuilder::new()
            .unwrap()
            .pre_input_hook(|| {
                let mut data = Map::new();
                data.insert("mood".to_string(), Value::from("curious"));
                Ok(data)
            });
        let mut chloop = build(builder, ScriptedConsole::new().chars("-").line("remember the milk"));
        chloop.run().unwrap();

        let records = records(&mut chloop);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cmd, "-");
        assert_eq!(records[0].status, Status::Ok);
        assert_eq!(records[0].extra["user_input"], "remember the milk");
        assert_eq!(records[0].extra["mood"], "curious");
    }

    #[test]
    fn test_note_goes_to_input_hook() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let builder = LoopBuilder::new()
            .unwrap()
            .post_input_hook(|| {
                let mut data = Map::new();
                data.insert("after".to_string(), Value::from(true));
                Ok(data)
            })
            .input_hook(move |data| {
                sink.borrow_mut().push(data.clone());
                Ok(())
            });
        let mut chloop = build(builder, ScriptedConsole::new().chars("-").line("note text"));
        chloop.run().unwrap();

        assert!(records(&mut chloop).is_empty());
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["text"], "note text");
        assert_eq!(seen[0]["after"], true);
    }

    #[test]
    fn test_note_abort_records_nothing() {
        let mut chloop = build(LoopBuilder::new().unwrap(), ScriptedConsole::new().chars("-").abort_line());
        chloop.run().unwrap();
        assert!(records(&mut chloop).is_empty());
    }

    #[test]
    fn test_failing_pre_hook_drops_note() {
        let builder = LoopBuilder::new().unwrap().pre_input_hook(|| Err(eyre::eyre!("no context")));
        let mut chloop = build(builder, ScriptedConsole::new().chars("-").line("unread"));
        chloop.run().unwrap();
        assert!(records(&mut chloop).is_empty());
        assert_eq!(chloop.console().pending_lines(), 1);
        assert!(chloop.console().output().contains("no context"));
    }

    #[test]
    fn test_session_trigger_bypasses_registry() {
        let launched = Rc::new(RefCell::new(Vec::new()));
        let builder = LoopBuilder::new()
            .unwrap()
            .trigger("shell", "bash")
            .launcher(RecordingLauncher(launched.clone()));
        let mut chloop = build(builder, ScriptedConsole::new().command("shell").command("pdb"));
        chloop.run().unwrap();

        let launched = launched.borrow();
        assert_eq!(launched.len(), 2);
        assert_eq!(launched[0], ("shell".to_string(), "bash".to_string()));
        assert_eq!(launched[1].0, "pdb");
        assert!(records(&mut chloop).is_empty());
        assert_eq!(chloop.history().cmds, vec!["shell", "pdb"]);
    }
}
