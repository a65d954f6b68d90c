//! Invocation wrapper - run an action and describe what happened.
//!
//! Nothing an action does escapes from here: returned errors and panics both
//! become error records carrying the failure category, message, trace text,
//! the callable's name/doc/module, the arguments and the host name.

mod context;
mod kind;
mod panic;

use serde_json::Value;

pub use context::{Context, History};
pub use kind::{ActionError, error_kind};
pub use panic::{PanicReport, catch};

use crate::domain::{Failure, InvocationRecord};
use crate::registry::{Action, HotkeyFn, key_repr};

/// `error_type` recorded for panics
pub const PANIC_KIND: &str = "panic";

/// Where a failing callable came from
struct Origin<'a> {
    name: String,
    doc: &'a str,
    module: &'a str,
}

fn hostname() -> String {
    whoami::fallible::hostname().unwrap_or_else(|_| "unknown".to_string())
}

fn failure(origin: &Origin<'_>, args: &[String], error_type: String, error_value: String, traceback: String) -> Failure {
    Failure {
        error_type,
        error_value,
        traceback,
        func_name: Some(origin.name.clone()),
        func_doc: (!origin.doc.is_empty()).then(|| origin.doc.to_string()),
        func_module: Some(origin.module.to_string()),
        args_repr: format!("{:?}", args),
        hostname: hostname(),
    }
}

fn record_outcome(
    session: &str,
    cmd: &str,
    args: &[String],
    origin: Origin<'_>,
    outcome: Result<eyre::Result<Value>, PanicReport>,
) -> InvocationRecord {
    match outcome {
        Ok(Ok(value)) => InvocationRecord::ok(session, cmd, args.to_vec(), value),
        Ok(Err(report)) => {
            log::debug!("{} failed: {:#}", cmd, report);
            let failure = failure(
                &origin,
                args,
                error_kind(&report),
                report.to_string(),
                format!("{:?}", report),
            );
            InvocationRecord::failed(session, cmd, args.to_vec(), failure)
        }
        Err(panic) => {
            log::debug!("{} panicked: {}", cmd, panic.message);
            let failure = failure(&origin, args, PANIC_KIND.to_string(), panic.message.clone(), panic.trace());
            InvocationRecord::failed(session, cmd, args.to_vec(), failure)
        }
    }
}

/// Call a named command with `args` and build its record.
pub fn invoke(action: &Action, args: &[String], ctx: &mut Context<'_>) -> InvocationRecord {
    let session = ctx.session().to_string();
    let outcome = catch(|| action.call(ctx, args));
    let origin = Origin {
        name: action.name.clone(),
        doc: &action.doc,
        module: &action.module,
    };
    record_outcome(&session, &action.name, args, origin, outcome)
}

/// Call a hotkey closure and build its record. `cmd` is the key itself.
pub fn invoke_hotkey(ch: char, help: &str, func: &HotkeyFn, module: &str, ctx: &mut Context<'_>) -> InvocationRecord {
    let session = ctx.session().to_string();
    let outcome = catch(|| func(ctx));
    let origin = Origin {
        name: key_repr(ch),
        doc: help,
        module,
    };
    record_outcome(&session, &ch.to_string(), &[], origin, outcome)
}
