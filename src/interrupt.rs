//! Ctrl-C while an action or an interactive session runs.
//!
//! The console reads keys in raw mode, so Ctrl-C at the prompt arrives as a
//! key. Outside of it the terminal sends SIGINT to the whole process group;
//! the loop swaps the default handler for a flag so only the current input
//! is abandoned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static INTERRUPTED: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Route SIGINT to a flag for the rest of the process. Safe to call again.
pub fn install() {
    INTERRUPTED.get_or_init(|| {
        let flag = Arc::new(AtomicBool::new(false));
        #[cfg(unix)]
        match signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag)) {
            Ok(_) => log::debug!("SIGINT handler installed"),
            Err(e) => log::warn!("Failed to install SIGINT handler: {}", e),
        }
        flag
    });
}

/// Whether SIGINT arrived since the last call, clearing the flag.
pub fn take() -> bool {
    INTERRUPTED
        .get()
        .is_some_and(|flag| flag.swap(false, Ordering::SeqCst))
}

