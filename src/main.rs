use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

mod cli;

use chloop::config::Config;
use chloop::console::TerminalConsole;
use chloop::dispatch::LoopBuilder;
use chloop::invoke::{ActionError, Context as ActionContext};
use chloop::registry::{Action, CommandHost};
use chloop::storage::open_sink;
use cli::Cli;

fn setup_logging(level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chloop")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("chloop.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Commands of the demo loop
struct Demo;

fn echo(_ctx: &mut ActionContext<'_>, args: &[String]) -> eyre::Result<Value> {
    Ok(Value::String(args.join(" ")))
}

fn boom(_ctx: &mut ActionContext<'_>, _args: &[String]) -> eyre::Result<Value> {
    Err(ActionError::DivisionByZero.into())
}

fn shout(_ctx: &mut ActionContext<'_>, args: &[String]) -> eyre::Result<Value> {
    if args.is_empty() {
        return Err(ActionError::MissingArgument("text".to_string()).into());
    }
    Ok(Value::String(format!("{}!", args.join(" ").to_uppercase())))
}

impl CommandHost for Demo {
    fn commands(&self) -> Vec<Action> {
        vec![
            Action::new("echo", "Return the arguments joined by spaces", echo),
            Action::new("boom", "Fail with a division by zero, to see how errors are recorded", boom),
            Action::new("shout", "Return the arguments uppercased", shout),
        ]
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(name) = &cli.name {
        config.name = name.clone();
    }
    if let Some(prompt) = &cli.prompt {
        config.prompt = prompt.clone();
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!(
            "{}",
            format!(
                "Session {} logging to {:?} storage in {}",
                config.name,
                config.storage.backend,
                config.storage.dir.display()
            )
            .yellow()
        );
    }

    let sink = open_sink(config.storage.backend, &config.storage.dir).context("Failed to open log sink")?;
    let mut chloop = LoopBuilder::from_config(config)?
        .describe("Demo loop: try :echo, :shout and :boom, or press a, h, e")
        .commands(&Demo)?
        .hotkey('a', "print a greeting", |ctx| {
            writeln!(ctx.out(), "{}", "hello from a hotkey".green())?;
            Ok(Value::Null)
        })?
        .hotkey_command('h', "history", "show recent successful commands")?
        .hotkey_command('e', "errors", "show recent errors")?
        .build(TerminalConsole::new(), sink);

    chloop.run().context("Loop failed")?;
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);

    let level = if cli.is_verbose() {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    setup_logging(&level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
