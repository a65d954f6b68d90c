//! chloop - a single-keystroke command loop
//!
//! Keys are read one at a time: hotkeys run immediately, `:` reads a command
//! line, `-` reads a note and `?` shows help. Every command invocation is
//! captured (value, error or panic) and appended to a queryable log.

pub mod config;
pub mod console;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod id;
pub mod interrupt;
pub mod invoke;
pub mod registry;
pub mod session;
pub mod storage;

pub use dispatch::{CharLoop, LoopBuilder};
pub use error::{ChloopError, Result};
