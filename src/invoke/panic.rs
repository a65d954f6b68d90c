//! Panic capture for action invocations.
//!
//! A process-wide hook is installed once. While the current thread is inside
//! `catch`, the hook records the panic (message, location, backtrace) for
//! that thread instead of printing it; panics anywhere else go to the
//! previously installed hook untouched.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

/// Details of a caught panic
#[derive(Debug, Clone, PartialEq)]
pub struct PanicReport {
    pub message: String,
    pub location: String,
    pub backtrace: String,
}

impl PanicReport {
    /// Multi-line trace text for error records
    pub fn trace(&self) -> String {
        let mut trace = format!("panicked at {}:\n{}", self.location, self.message);
        if !self.backtrace.is_empty() {
            trace.push_str("\n\nStack backtrace:\n");
            trace.push_str(&self.backtrace);
        }
        trace
    }
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("<non-string panic payload>")
    }
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
                return;
            }
            let report = PanicReport {
                message: payload_message(info.payload()),
                location: info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                    .unwrap_or_else(|| "<unknown>".to_string()),
                backtrace: Backtrace::force_capture().to_string(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(report));
        }));
    });
}

/// Run `f`, turning a panic into a `PanicReport`.
pub fn catch<T>(f: impl FnOnce() -> T) -> Result<T, PanicReport> {
    install_hook();
    let outer = CAPTURING.with(|c| c.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|c| c.set(outer));

    result.map_err(|payload| {
        LAST_PANIC
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| PanicReport {
                message: payload_message(&*payload),
                location: "<unknown>".to_string(),
                backtrace: String::new(),
            })
    })
}
