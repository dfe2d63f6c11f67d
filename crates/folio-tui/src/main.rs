use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use folio_core::{build_gateway, Config, ConversationStore, SubmitOutcome};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

mod app;
mod handler;
mod tui;
mod ui;

use app::{wait_for_reply, App};
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "folio", version)]
#[command(about = "Chat with a developer portfolio assistant")]
struct Cli {
    /// Config file (defaults to <config dir>/folio/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Assistant provider: gemini or mock
    #[arg(long, global = true, env = "FOLIO_PROVIDER")]
    provider: Option<String>,

    /// Model identifier sent to the provider
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Where the chat view writes logs (defaults to <cache dir>/folio/folio.log)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Ask a single question and print the answer with its sources
    Ask {
        /// Your question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };

    match cli.command {
        Some(Commands::Init { force }) => init_config(&config_path, force),
        Some(Commands::Ask { ref question }) => {
            init_logging(cli.verbose, None)?;
            let config = load_config(&cli, &config_path)?;
            ask_once(&config, &question.join(" ")).await
        }
        Some(Commands::Chat) | None => {
            let log_file = match &cli.log_file {
                Some(path) => path.clone(),
                None => default_log_path(),
            };
            init_logging(cli.verbose, Some(&log_file))?;
            let config = load_config(&cli, &config_path)?;
            run_chat(&config).await
        }
    }
}

/// Load the config file and apply command-line overrides
fn load_config(cli: &Cli, path: &Path) -> Result<Config> {
    let mut config = Config::load_from(path)?;
    if let Some(provider) = &cli.provider {
        config.provider = Some(provider.clone());
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    tracing::debug!(path = %path.display(), provider = ?config.provider, model = %config.model(), "Loaded config");
    Ok(config)
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::new().save_to(path)?;
    println!("Wrote default config to {}", path.display());
    println!("Set GEMINI_API_KEY or add \"api_key\" to the file to enable answers.");
    Ok(())
}

async fn ask_once(config: &Config, question: &str) -> Result<()> {
    let gateway = build_gateway(config)?;
    let mut store = ConversationStore::new(config.greeting(), config.cleared_greeting());

    if store.ask(gateway.as_ref(), question).await == SubmitOutcome::EmptyInput {
        bail!("Question is empty");
    }

    let Some(answer) = store.transcript().last() else {
        return Ok(());
    };
    println!("{}", answer.text());

    if !answer.citations().is_empty() {
        println!("\nSources:");
        for citation in answer.citations() {
            let title = if citation.title.is_empty() { "Link" } else { citation.title.as_str() };
            println!("  • {} <{}>", title, citation.uri);
        }
    }
    Ok(())
}

async fn run_chat(config: &Config) -> Result<()> {
    let provider = config.provider()?;
    let gateway = build_gateway(config)?;
    let mut app = App::new(config, provider, gateway);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    tracing::info!("Chat session started");

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event),
            reply = wait_for_reply(&mut app.query_task) => app.finish_query(reply),
        }
    }

    if let Some(task) = app.query_task.take() {
        task.abort();
    }
    tracing::info!(messages = app.store.transcript().len(), "Chat session ended");
    Ok(())
}

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("folio")
        .join("folio.log")
}

/// Log to `log_file` when given (the TUI owns the terminal), otherwise to stderr
fn init_logging(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
    let level = match verbosity {
        0 if log_file.is_some() => "info",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}
