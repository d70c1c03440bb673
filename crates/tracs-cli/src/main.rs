//! TRACS console driver.
//!
//! Wires the workflow engine to a line-oriented console transport so the
//! whole flow can be driven from a terminal: plain lines are text input,
//! `:`-prefixed lines are structured actions (inline keyboard presses),
//! `?`-prefixed lines are inline queries.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use tracs_application::WorkflowEngine;
use tracs_core::oplog::{OperationLog, OperationLogRepository};
use tracs_core::transport::{ChatTransport, Keyboard};
use tracs_infrastructure::{
    BotConfig, JsonlOperationLogRepository, MemoryOperationLogRepository, TomlTraderDirectory,
    TracsPaths,
};
use tracs_interaction::HttpLedgerClient;

#[derive(Parser)]
#[command(name = "tracs")]
#[command(about = "TRACS - Trader Redemption and Audit Console System", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive console
    Run {
        /// Conversation id to act in
        #[arg(long, default_value_t = 1)]
        chat_id: i64,
        /// Actor id to act as
        #[arg(long, default_value_t = 1)]
        actor_id: i64,
        /// Keep the operation log in memory instead of on disk
        #[arg(long)]
        ephemeral: bool,
    },
}

/// Renders engine output to stdout.
///
/// Message ids are sequential so `edit_message` targets can be referred
/// to from the prompt.
struct ConsoleTransport {
    next_message_id: AtomicI64,
}

impl ConsoleTransport {
    fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(1),
        }
    }

    fn print_keyboard(keyboard: &Keyboard) {
        match keyboard {
            Keyboard::Reply { rows } => {
                for row in rows {
                    let line = row
                        .iter()
                        .map(|label| format!("[{label}]"))
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!("{}", line.bright_black());
                }
            }
            Keyboard::Inline { rows } => {
                for row in rows {
                    let line = row
                        .iter()
                        .map(|button| format!("[{} → :{}]", button.label, button.action))
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!("{}", line.bright_black());
                }
            }
        }
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_text(&self, _chat_id: i64, text: &str) -> tracs_core::Result<()> {
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        println!("{}", format!("#{id}").bright_black());
        for line in text.lines() {
            println!("{}", line.bright_blue());
        }
        println!();
        Ok(())
    }

    async fn send_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Keyboard,
    ) -> tracs_core::Result<()> {
        self.send_text(chat_id, text).await?;
        Self::print_keyboard(&keyboard);
        println!();
        Ok(())
    }

    async fn edit_message(
        &self,
        _chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> tracs_core::Result<()> {
        println!("{}", format!("#{message_id} (edited)").bright_black());
        for line in text.lines() {
            println!("{}", line.bright_blue());
        }
        if let Some(keyboard) = &keyboard {
            Self::print_keyboard(keyboard);
        }
        println!();
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TRACS_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            chat_id,
            actor_id,
            ephemeral,
        } => run(chat_id, actor_id, ephemeral).await,
    }
}

async fn run(chat_id: i64, actor_id: i64, ephemeral: bool) -> Result<()> {
    let config = BotConfig::load().context("Failed to load configuration")?;
    config.validate()?;

    let ledger = Arc::new(HttpLedgerClient::new(
        config.api_base_url.as_str(),
        config.api_key.as_str(),
    ));

    let oplog_repository: Arc<dyn OperationLogRepository> = if ephemeral {
        Arc::new(MemoryOperationLogRepository::new())
    } else {
        let oplog_dir = match &config.data_dir {
            Some(dir) => dir.join("oplog"),
            None => TracsPaths::oplog_dir().context("Failed to resolve the data directory")?,
        };
        Arc::new(JsonlOperationLogRepository::new(&oplog_dir).await?)
    };
    let oplog = OperationLog::new(oplog_repository);

    let traders_file = TracsPaths::traders_file().context("Failed to resolve the config directory")?;
    let traders = Arc::new(TomlTraderDirectory::new(
        traders_file,
        config.owner_id,
        config.subscription_days,
    ));

    let transport = Arc::new(ConsoleTransport::new());
    let engine = WorkflowEngine::new(
        transport,
        ledger,
        oplog,
        traders,
        config.owner_id,
        config.subscription_days,
    );

    println!("{}", "=== TRACS console ===".bright_magenta().bold());
    println!(
        "{}",
        format!("chat {chat_id}, actor {actor_id} — ledger at {}", config.api_base_url)
            .bright_black()
    );
    println!(
        "{}",
        "Plain text is sent to the bot, ':logs:player:1' presses an inline button, \
         '?<query>' runs an inline query, 'quit' exits."
            .bright_black()
    );
    println!();

    engine.handle_text(chat_id, actor_id, "/start").await?;

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                let _ = rl.add_history_entry(&line);

                let result = if let Some(action) = trimmed.strip_prefix(':') {
                    engine.handle_action(chat_id, actor_id, 0, action).await
                } else if let Some(query) = trimmed.strip_prefix('?') {
                    let results = engine.handle_inline_query(actor_id, query).await;
                    if results.is_empty() {
                        println!("{}", "(no inline results)".bright_black());
                    }
                    for result in results {
                        println!("{}", format!("{} — {}", result.title, result.description).bold());
                        for line in result.text.lines() {
                            println!("{}", line.bright_blue());
                        }
                        println!();
                    }
                    Ok(())
                } else {
                    engine.handle_text(chat_id, actor_id, trimmed).await
                };

                if let Err(e) = result {
                    eprintln!("{}", format!("Error: {e}").red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}
