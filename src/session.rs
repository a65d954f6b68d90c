//! External interactive sessions (debugger, REPL, shell).
//!
//! Typing a trigger name after `:` hands the terminal to another program
//! until it exits. Triggers map to a command line run through `sh -c`.

use std::collections::BTreeMap;
use std::process::{Command, Stdio};

use crate::error::{ChloopError, Result};

/// Environment variable holding the loop's process id
pub const PID_ENV: &str = "CHLOOP_PID";

/// Environment variable holding the session name
pub const SESSION_ENV: &str = "CHLOOP_SESSION";

/// Trigger names and their default command lines
pub fn default_triggers() -> BTreeMap<String, String> {
    [
        ("pdb", format!("gdb -q -p \"${}\"", PID_ENV)),
        ("ipython", "ipython".to_string()),
        ("shell", "${SHELL:-sh}".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Something that can suspend the loop and run an interactive session.
pub trait SessionLauncher {
    /// Run `command` for `trigger`, returning once the session ends.
    fn launch(&mut self, trigger: &str, command: &str) -> Result<()>;
}

/// Runs the trigger's command line with the terminal attached.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    session: String,
}

impl CommandLauncher {
    pub fn new(session: &str) -> Self {
        Self {
            session: session.to_string(),
        }
    }
}

impl SessionLauncher for CommandLauncher {
    fn launch(&mut self, trigger: &str, command: &str) -> Result<()> {
        log::info!("Launching {} session: {}", trigger, command);
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env(PID_ENV, std::process::id().to_string())
            .env(SESSION_ENV, &self.session)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        if !status.success() {
            return Err(ChloopError::Session(format!(
                "{} exited with code {:?}",
                trigger,
                status.code()
            )));
        }
        log::info!("{} session ended", trigger);
        Ok(())
    }
}
