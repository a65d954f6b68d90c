//! What an action can reach while it runs.

use std::collections::BTreeMap;
use std::io::Write;

use crate::registry::Registry;
use crate::storage::{LogSink, log_collection, wish_collection};

/// Keys and command names seen during the current session
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Raw text of every key read at the main prompt
    pub chars: Vec<String>,
    /// Every command name typed after `:`
    pub cmds: Vec<String>,
}

/// Borrowed view of the loop handed to every action.
pub struct Context<'a> {
    out: &'a mut dyn Write,
    sink: &'a mut dyn LogSink,
    registry: &'a Registry,
    session: &'a str,
    history: &'a History,
    history_limit: usize,
    triggers: &'a BTreeMap<String, String>,
}

impl<'a> Context<'a> {
    pub fn new(
        out: &'a mut dyn Write,
        sink: &'a mut dyn LogSink,
        registry: &'a Registry,
        session: &'a str,
        history: &'a History,
        history_limit: usize,
        triggers: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            out,
            sink,
            registry,
            session,
            history,
            history_limit,
            triggers,
        }
    }

    /// Terminal output
    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    pub fn sink(&mut self) -> &mut dyn LogSink {
        &mut *self.sink
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Session name partitioning the log
    pub fn session(&self) -> &str {
        self.session
    }

    pub fn history(&self) -> &History {
        self.history
    }

    /// Default number of records `history` and `errors` show
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Session trigger name to launch command
    pub fn triggers(&self) -> &BTreeMap<String, String> {
        self.triggers
    }

    /// This session's invocation log collection
    pub fn log_collection(&self) -> String {
        log_collection(self.session)
    }

    /// This session's wishlist collection
    pub fn wish_collection(&self) -> String {
        wish_collection(self.session)
    }
}
