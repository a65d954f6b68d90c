//! Command registry - everything the loop can do.
//!
//! Two kinds of binding live here:
//! - named commands (`:name arg...`), variadic over string arguments
//! - hotkeys, a single character bound to a zero-argument callable or to a
//!   named command
//!
//! Commands are kept sorted by name; hotkeys keep registration order so a
//! caller can control how `shortcuts` lists them.

mod keys;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{ChloopError, Result};
use crate::invoke::Context;

pub use keys::{key_display, key_repr};

/// Signature of a named command
pub type ActionFn = Rc<dyn Fn(&mut Context<'_>, &[String]) -> eyre::Result<Value>>;

/// Signature of a hotkey callable
pub type HotkeyFn = Rc<dyn Fn(&mut Context<'_>) -> eyre::Result<Value>>;

/// Characters the dispatch loop claims before hotkeys are consulted, plus
/// the terminal's own interrupt and end-of-input characters.
pub const RESERVED_KEYS: &[char] = &[':', '-', '?', '\x03', '\x04'];

/// Prefix marking names as internal
pub const INTERNAL_PREFIX: char = '_';

/// Path of the callable type, used as the "module" of an action.
fn callable_path<F>() -> String {
    std::any::type_name::<F>().replace("::{{closure}}", "")
}

/// A named, variadic command.
#[derive(Clone)]
pub struct Action {
    pub name: String,
    pub doc: String,
    /// Module path of the callable
    pub module: String,
    func: ActionFn,
}

impl Action {
    pub fn new<F>(name: &str, doc: &str, func: F) -> Self
    where
        F: Fn(&mut Context<'_>, &[String]) -> eyre::Result<Value> + 'static,
    {
        Self {
            name: name.to_string(),
            doc: doc.to_string(),
            module: callable_path::<F>(),
            func: Rc::new(func),
        }
    }

    /// Call the underlying function. Failures and panics are not caught here;
    /// go through `invoke::invoke` for that.
    pub fn call(&self, ctx: &mut Context<'_>, args: &[String]) -> eyre::Result<Value> {
        (self.func)(ctx, args)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// What pressing a hotkey does
#[derive(Clone)]
pub enum HotkeyTarget {
    /// Call a zero-argument closure
    Callable { func: HotkeyFn, module: String },
    /// Run a named command with no arguments
    Command(String),
}

/// A single-character binding.
#[derive(Clone)]
pub struct Hotkey {
    pub help: String,
    pub target: HotkeyTarget,
}

impl Hotkey {
    /// Bind a closure
    pub fn callable<F>(help: &str, func: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> eyre::Result<Value> + 'static,
    {
        Self {
            help: help.to_string(),
            target: HotkeyTarget::Callable {
                func: Rc::new(func),
                module: callable_path::<F>(),
            },
        }
    }

    /// Bind a named command
    pub fn command(help: &str, name: &str) -> Self {
        Self {
            help: help.to_string(),
            target: HotkeyTarget::Command(name.to_string()),
        }
    }
}

impl fmt::Debug for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            HotkeyTarget::Callable { module, .. } => format!("callable {}", module),
            HotkeyTarget::Command(name) => format!("command {}", name),
        };
        f.debug_struct("Hotkey")
            .field("help", &self.help)
            .field("target", &target)
            .finish()
    }
}

/// A type that contributes named commands at construction time.
pub trait CommandHost {
    fn commands(&self) -> Vec<Action>;
}

/// Holds every command and hotkey of one loop.
#[derive(Clone, Default, Debug)]
pub struct Registry {
    commands: BTreeMap<String, Action>,
    hotkeys: Vec<(char, Hotkey)>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ChloopError::InvalidBinding("command name is empty".to_string()));
    }
    if name.starts_with(INTERNAL_PREFIX) {
        return Err(ChloopError::InvalidBinding(format!(
            "command '{}' starts with the internal prefix '{}'",
            name, INTERNAL_PREFIX
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ChloopError::InvalidBinding(format!("command '{}' contains whitespace", name)));
    }
    Ok(())
}

fn validate_key(ch: char) -> Result<()> {
    if RESERVED_KEYS.contains(&ch) {
        return Err(ChloopError::InvalidBinding(format!(
            "{} is reserved by the loop and can't be a hotkey",
            key_repr(ch)
        )));
    }
    Ok(())
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every command a host provides. Re-registering overwrites by name.
    pub fn register_method_commands(&mut self, host: &dyn CommandHost) -> Result<()> {
        for action in host.commands() {
            self.insert_action(action)?;
        }
        Ok(())
    }

    /// Register (or replace) a single named command.
    pub fn register_command<F>(&mut self, name: &str, doc: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Context<'_>, &[String]) -> eyre::Result<Value> + 'static,
    {
        self.insert_action(Action::new(name, doc, func))
    }

    /// Register a prebuilt action
    pub fn insert_action(&mut self, action: Action) -> Result<()> {
        validate_name(&action.name)?;
        if self.commands.contains_key(&action.name) {
            log::debug!("replacing command {}", action.name);
        }
        self.commands.insert(action.name.clone(), action);
        Ok(())
    }

    /// Bind `ch` to a zero-argument closure, replacing any earlier binding.
    pub fn register_hotkey<F>(&mut self, ch: char, help: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Context<'_>) -> eyre::Result<Value> + 'static,
    {
        self.bind(ch, Hotkey::callable(help, func))
    }

    /// Bind `ch` to an existing named command.
    pub fn register_hotkey_command(&mut self, ch: char, command: &str, help: &str) -> Result<()> {
        self.resolve(command)?;
        self.bind(ch, Hotkey::command(help, command))
    }

    /// Bind a prebuilt hotkey. An existing binding keeps its position.
    pub fn bind(&mut self, ch: char, hotkey: Hotkey) -> Result<()> {
        validate_key(ch)?;
        if let HotkeyTarget::Command(name) = &hotkey.target {
            validate_name(name)?;
        }
        match self.hotkeys.iter_mut().find(|(k, _)| *k == ch) {
            Some(slot) => slot.1 = hotkey,
            None => self.hotkeys.push((ch, hotkey)),
        }
        Ok(())
    }

    /// Bind several hotkeys in the order given.
    pub fn extend_hotkeys(&mut self, hotkeys: impl IntoIterator<Item = (char, Hotkey)>) -> Result<()> {
        for (ch, hotkey) in hotkeys {
            self.bind(ch, hotkey)?;
        }
        Ok(())
    }

    /// Bind several hotkeys from an unordered source, sorted by help text so
    /// the listing is deterministic.
    pub fn extend_hotkeys_by_help(&mut self, hotkeys: impl IntoIterator<Item = (char, Hotkey)>) -> Result<()> {
        let mut sorted: Vec<(char, Hotkey)> = hotkeys.into_iter().collect();
        sorted.sort_by(|a, b| a.1.help.cmp(&b.1.help).then(a.0.cmp(&b.0)));
        self.extend_hotkeys(sorted)
    }

    /// Exact-match lookup of a named command.
    pub fn resolve(&self, name: &str) -> Result<&Action> {
        self.commands
            .get(name)
            .ok_or_else(|| ChloopError::UnknownCommand(name.to_string()))
    }

    /// Look up the binding for a key
    pub fn hotkey(&self, ch: char) -> Option<&Hotkey> {
        self.hotkeys.iter().find(|(k, _)| *k == ch).map(|(_, h)| h)
    }

    /// `(key, help)` in listing order
    pub fn list_hotkeys(&self) -> Vec<(char, &str)> {
        self.hotkeys.iter().map(|(k, h)| (*k, h.help.as_str())).collect()
    }

    /// `(name, doc)` sorted by name
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        self.commands
            .values()
            .map(|a| (a.name.as_str(), a.doc.as_str()))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
