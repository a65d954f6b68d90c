//! Commands every loop has, whatever else is registered.

use std::collections::BTreeMap;

use eyre::WrapErr;
use serde_json::Value;

use crate::invoke::Context;
use crate::registry::{Action, CommandHost, key_display};
use crate::storage::Filter;

/// Built-ins whose invocations are never recorded
pub const DONT_LOG: &[&str] = &["docstrings", "shortcuts", "errors", "history"];

const HISTORY_TEMPLATE: &str = "{timestamp} -> cmd={cmd} status={status}";
const ERRORS_TEMPLATE: &str = "{timestamp} -> cmd={cmd} error_value={error_value}\n{traceback_string}\n";
const WISHLIST_TEMPLATE: &str = "- ch={ch} cmd={cmd} message={message}";

/// Provides `docstrings`, `shortcuts`, `history`, `errors`, `chars`, `cmds`
/// and `wishlist`.
pub struct Builtins;

impl CommandHost for Builtins {
    fn commands(&self) -> Vec<Action> {
        vec![
            Action::new("docstrings", "Print/return the docs of every colon command", docstrings),
            Action::new("shortcuts", "Print/return the hotkeys and their help text", shortcuts),
            Action::new(
                "history",
                "Print/return successful colon commands (most recent N, default from config)",
                history,
            ),
            Action::new(
                "errors",
                "Print/return colon commands that failed, with their trace (most recent N)",
                errors,
            ),
            Action::new("chars", "Show keys pressed during the current session", chars),
            Action::new("cmds", "Show colon commands typed during the current session", cmds),
            Action::new("wishlist", "Show wishes for hotkeys and commands that don't exist yet", wishlist),
        ]
    }
}

fn trigger_doc(command: &str) -> String {
    format!("Start an interactive session (`{}`). Exit it to return to the loop", command)
}

fn docstrings(ctx: &mut Context<'_>, _args: &[String]) -> eyre::Result<Value> {
    let mut docs: BTreeMap<&str, String> = ctx
        .registry()
        .list_commands()
        .into_iter()
        .map(|(name, doc)| (name, doc.trim().to_string()))
        .collect();
    for (trigger, command) in ctx.triggers() {
        docs.insert(trigger.as_str(), trigger_doc(command));
    }

    let mut text = String::new();
    for (name, doc) in docs {
        if doc.is_empty() {
            text.push_str(&format!(".:: {} (no docs) ::.\n\n", name));
        } else {
            text.push_str(&format!(".:: {} ::.\n{}\n\n", name, doc));
        }
    }
    Ok(Value::String(text))
}

fn shortcuts(ctx: &mut Context<'_>, _args: &[String]) -> eyre::Result<Value> {
    let text: String = ctx
        .registry()
        .list_hotkeys()
        .into_iter()
        .map(|(ch, help)| format!("{} -- {}\n", key_display(ch), help))
        .collect();
    Ok(Value::String(text))
}

/// Optional first argument: how many records to show.
fn parse_limit(args: &[String], default: usize) -> eyre::Result<usize> {
    match args.first() {
        Some(arg) => arg
            .parse::<usize>()
            .wrap_err_with(|| format!("limit must be a non-negative number, got {:?}", arg)),
        None => Ok(default),
    }
}

fn find_in_log(ctx: &mut Context<'_>, status: &str, template: &str, args: &[String]) -> eyre::Result<Value> {
    let limit = parse_limit(args, ctx.history_limit())?;
    let collection = ctx.log_collection();
    let lines = ctx
        .sink()
        .find(&collection, &[Filter::eq("status", status)], template, Some(limit))?;
    Ok(Value::String(lines.join("\n")))
}

fn history(ctx: &mut Context<'_>, args: &[String]) -> eyre::Result<Value> {
    find_in_log(ctx, "ok", HISTORY_TEMPLATE, args)
}

fn errors(ctx: &mut Context<'_>, args: &[String]) -> eyre::Result<Value> {
    find_in_log(ctx, "error", ERRORS_TEMPLATE, args)
}

fn chars(ctx: &mut Context<'_>, _args: &[String]) -> eyre::Result<Value> {
    Ok(Value::from(ctx.history().chars.clone()))
}

fn cmds(ctx: &mut Context<'_>, _args: &[String]) -> eyre::Result<Value> {
    Ok(Value::from(ctx.history().cmds.clone()))
}

fn wishlist(ctx: &mut Context<'_>, _args: &[String]) -> eyre::Result<Value> {
    let collection = ctx.wish_collection();
    let lines = ctx.sink().find(&collection, &[], WISHLIST_TEMPLATE, None)?;
    Ok(Value::String(lines.join("\n")))
}
