//! Assembling a `CharLoop`: settings, bindings, hooks and documentation.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use super::CharLoop;
use super::builtins::{Builtins, DONT_LOG};
use crate::config::Config;
use crate::console::Console;
use crate::error::Result;
use crate::invoke::{Context, History};
use crate::registry::{CommandHost, Hotkey, Registry};
use crate::session::{CommandLauncher, SessionLauncher, default_triggers};
use crate::storage::LogSink;

/// Called when `-` is pressed, before the note is read
pub type ContextHook = Box<dyn FnMut() -> eyre::Result<Map<String, Value>>>;

/// Receives the note text merged with the pre/post hook data
pub type InputHook = Box<dyn FnMut(&Map<String, Value>) -> eyre::Result<()>>;

/// Optional note-mode collaborators
#[derive(Default)]
pub struct Hooks {
    pub pre_input: Option<ContextHook>,
    pub post_input: Option<ContextHook>,
    pub input: Option<InputHook>,
}

/// Runtime settings of one loop.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Session name partitioning the log
    pub name: String,
    pub prompt: String,
    pub break_chars: Vec<char>,
    pub dont_log: BTreeSet<String>,
    pub wishlist: bool,
    pub history_limit: usize,
    pub log_hotkeys: bool,
    pub report_hotkey_errors: bool,
    pub triggers: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            prompt: "\n> ".to_string(),
            break_chars: Vec::new(),
            dont_log: DONT_LOG.iter().map(|s| s.to_string()).collect(),
            wishlist: true,
            history_limit: 10,
            log_hotkeys: false,
            report_hotkey_errors: true,
            triggers: default_triggers(),
        }
    }
}

impl Settings {
    /// Settings from a loaded config. Built-in do-not-log names always stay.
    pub fn from_config(config: &Config) -> Self {
        let mut settings = Self {
            name: config.name.clone(),
            prompt: config.prompt.clone(),
            break_chars: config.break_chars.chars().collect(),
            wishlist: config.wishlist,
            history_limit: config.history_limit,
            log_hotkeys: config.log_hotkeys,
            report_hotkey_errors: config.report_hotkey_errors,
            triggers: config.sessions.clone(),
            ..Self::default()
        };
        settings.dont_log.extend(config.dont_log.iter().cloned());
        settings
    }
}

/// Base documentation shown first on `?`
pub const BASE_DOC: &str = "\
Read single keys from the terminal and act on them

- ctrl+d or ctrl+c ends the loop
- ':' reads a command name and arguments, e.g. `:history 5`
    - every registered command can be typed this way
- '-' reads a note, passed to the input hook or saved to the log
- '?' shows this documentation and the startup message";

/// Builds a `CharLoop`.
///
/// The built-in commands are registered up front so hotkeys can be bound to
/// them and so a caller can deliberately replace one.
pub struct LoopBuilder {
    settings: Settings,
    registry: Registry,
    hooks: Hooks,
    launcher: Option<Box<dyn SessionLauncher>>,
    docs: Vec<String>,
}

impl LoopBuilder {
    pub fn new() -> Result<Self> {
        Self::with_settings(Settings::default())
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_settings(Settings::from_config(config))
    }

    fn with_settings(settings: Settings) -> Result<Self> {
        let mut registry = Registry::new();
        registry.register_method_commands(&Builtins)?;
        Ok(Self {
            settings,
            registry,
            hooks: Hooks::default(),
            launcher: None,
            docs: vec![BASE_DOC.to_string()],
        })
    }

    pub fn name(mut self, name: &str) -> Self {
        self.settings.name = name.to_string();
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.settings.prompt = prompt.to_string();
        self
    }

    /// Keys that end the loop (after running their hotkey, if bound)
    pub fn break_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.settings.break_chars.extend(chars);
        self
    }

    /// Never record invocations of `name`
    pub fn dont_log(mut self, name: &str) -> Self {
        self.settings.dont_log.insert(name.to_string());
        self
    }

    pub fn wishlist(mut self, enabled: bool) -> Self {
        self.settings.wishlist = enabled;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.settings.history_limit = limit;
        self
    }

    pub fn log_hotkeys(mut self, enabled: bool) -> Self {
        self.settings.log_hotkeys = enabled;
        self
    }

    pub fn report_hotkey_errors(mut self, enabled: bool) -> Self {
        self.settings.report_hotkey_errors = enabled;
        self
    }

    /// Add or replace a session trigger
    pub fn trigger(mut self, name: &str, command: &str) -> Self {
        self.settings.triggers.insert(name.to_string(), command.to_string());
        self
    }

    /// Add a documentation layer, shown after the more general ones
    pub fn describe(mut self, doc: &str) -> Self {
        let doc = doc.trim();
        if !doc.is_empty() {
            self.docs.push(doc.to_string());
        }
        self
    }

    pub fn commands(mut self, host: &dyn CommandHost) -> Result<Self> {
        self.registry.register_method_commands(host)?;
        Ok(self)
    }

    pub fn command<F>(mut self, name: &str, doc: &str, func: F) -> Result<Self>
    where
        F: Fn(&mut Context<'_>, &[String]) -> eyre::Result<Value> + 'static,
    {
        self.registry.register_command(name, doc, func)?;
        Ok(self)
    }

    pub fn hotkey<F>(mut self, ch: char, help: &str, func: F) -> Result<Self>
    where
        F: Fn(&mut Context<'_>) -> eyre::Result<Value> + 'static,
    {
        self.registry.register_hotkey(ch, help, func)?;
        Ok(self)
    }

    /// Bind `ch` to a registered command
    pub fn hotkey_command(mut self, ch: char, command: &str, help: &str) -> Result<Self> {
        self.registry.register_hotkey_command(ch, command, help)?;
        Ok(self)
    }

    /// Bind hotkeys in the order given
    pub fn hotkeys(mut self, hotkeys: impl IntoIterator<Item = (char, Hotkey)>) -> Result<Self> {
        self.registry.extend_hotkeys(hotkeys)?;
        Ok(self)
    }

    /// Bind hotkeys sorted by help text
    pub fn hotkeys_by_help(mut self, hotkeys: impl IntoIterator<Item = (char, Hotkey)>) -> Result<Self> {
        self.registry.extend_hotkeys_by_help(hotkeys)?;
        Ok(self)
    }

    pub fn pre_input_hook(mut self, hook: impl FnMut() -> eyre::Result<Map<String, Value>> + 'static) -> Self {
        self.hooks.pre_input = Some(Box::new(hook));
        self
    }

    pub fn post_input_hook(mut self, hook: impl FnMut() -> eyre::Result<Map<String, Value>> + 'static) -> Self {
        self.hooks.post_input = Some(Box::new(hook));
        self
    }

    pub fn input_hook(mut self, hook: impl FnMut(&Map<String, Value>) -> eyre::Result<()> + 'static) -> Self {
        self.hooks.input = Some(Box::new(hook));
        self
    }

    /// Replace the default `sh -c` session launcher
    pub fn launcher(mut self, launcher: impl SessionLauncher + 'static) -> Self {
        self.launcher = Some(Box::new(launcher));
        self
    }

    /// Finish with the given console and log sink.
    pub fn build<C: Console>(self, console: C, sink: Box<dyn LogSink>) -> CharLoop<C> {
        let launcher: Box<dyn SessionLauncher> = match self.launcher {
            Some(launcher) => launcher,
            None => Box::new(CommandLauncher::new(&self.settings.name)),
        };
        log::debug!(
            "Building loop {} with {} commands and {} hotkeys",
            self.settings.name,
            self.registry.len(),
            self.registry.list_hotkeys().len()
        );
        CharLoop {
            console,
            sink,
            registry: self.registry,
            settings: self.settings,
            hooks: self.hooks,
            launcher,
            docs: self.docs,
            history: History::default(),
        }
    }
}
