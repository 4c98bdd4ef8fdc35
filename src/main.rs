//! Coinkeep - Chat Currency Engine
//!
//! Minute-aligned recurring payouts plus transactional balance commands,
//! demoed over in-memory adapters and a stdin chat reader.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use coinkeep::adapters::{parse_chat_line, ConsoleChat, InMemoryCommandRegistry, InMemoryLedger};
use coinkeep::application::{CurrencyEngine, EngineSignal};
use coinkeep::config::{load_config, Config};
use coinkeep::domain::build_spec;
use coinkeep::ports::{ChatPort, CommandRegistryPort, LedgerPort};

#[derive(Parser, Debug)]
#[command(name = "coinkeep", about = "Chat currency engine", version)]
struct CliApp {
    /// Log at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the engine with in-memory adapters and a stdin chat reader
    Run(RunCmd),
    /// Validate a config file and print the bound command table
    Check(CheckCmd),
}

#[derive(Parser, Debug)]
struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/coinkeep.toml")]
    config: String,

    /// Payout tick period in seconds (wall-clock aligned)
    #[arg(long, value_name = "SECS", default_value = "60")]
    tick_period: u64,
}

#[derive(Parser, Debug)]
struct CheckCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/coinkeep.toml")]
    config: String,

    /// Output format: text, json
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (RUST_LOG overrides go here).
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Check(cmd) => check_command(cmd, app.verbose, app.debug).await,
    }
}

/// Precedence: RUST_LOG env, then --debug/--verbose, then the config level.
fn init_logging(verbose: bool, debug: bool, config_level: &str) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).init();
}

fn load_expanded_config(path: &str) -> Result<Config> {
    let path = shellexpand::tilde(path).to_string();
    load_config(&path).with_context(|| format!("Failed to load configuration from {}", path))
}

async fn seed_ledger(ledger: &InMemoryLedger, config: &Config) {
    for user in &config.users {
        ledger.add_user(&user.name, user.online, &user.groups).await;
    }
    for currency in &config.currencies {
        ledger.upsert_currency(currency.clone()).await;
    }
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_expanded_config(&cmd.config)?;
    init_logging(verbose, debug, &config.logging.level);
    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    let ledger = Arc::new(InMemoryLedger::new());
    seed_ledger(&ledger, &config).await;
    let registry = Arc::new(InMemoryCommandRegistry::new());
    let chat = Arc::new(ConsoleChat);

    let engine = Arc::new(
        CurrencyEngine::new(
            Arc::clone(&ledger) as Arc<dyn LedgerPort>,
            chat as Arc<dyn ChatPort>,
            Arc::clone(&registry) as Arc<dyn CommandRegistryPort>,
        )
        .with_tick_period(Duration::from_secs(cmd.tick_period.max(1))),
    );
    engine
        .bootstrap()
        .await
        .context("Failed to bootstrap the currency engine")?;

    // The lifecycle signal surface; the demo has no configuration UI, so
    // the sender side stays idle but the consumer loop is live.
    let (signal_tx, signal_rx) = mpsc::channel::<EngineSignal>(16);
    let signal_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        signal_engine.run_signals(signal_rx).await;
    });

    println!("coinkeep ready. Type chat lines as '<user>: !trigger args...'. Ctrl-C to quit.");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => handle_line(&engine, &registry, &line).await,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
        }
    }

    engine.shutdown().await;
    drop(signal_tx);
    tracing::info!("coinkeep stopped");
    Ok(())
}

async fn handle_line(engine: &CurrencyEngine, registry: &InMemoryCommandRegistry, line: &str) {
    let Some(invocation) = parse_chat_line(line) else {
        if !line.trim().is_empty() {
            println!("(not a command: expected '<user>: !trigger args...')");
        }
        return;
    };
    let Some(spec) = registry.spec_for_trigger(&invocation.trigger).await else {
        println!("(no command bound to {})", invocation.trigger);
        return;
    };
    engine
        .handle_invocation(&spec.id, &invocation.sender, &invocation.args)
        .await;
}

async fn check_command(cmd: CheckCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_expanded_config(&cmd.config)?;
    init_logging(verbose, debug, &config.logging.level);
    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    let specs: Vec<_> = config.currencies.iter().map(build_spec).collect();

    match cmd.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&specs)?);
        }
        "text" => {
            println!(
                "{:<12} {:<28} {:<10} {:<8} {:<8} {}",
                "trigger", "command id", "interval", "payout", "active", "transfer"
            );
            for (currency, spec) in config.currencies.iter().zip(&specs) {
                println!(
                    "{:<12} {:<28} {:<10} {:<8} {:<8} {:?}",
                    spec.trigger,
                    spec.id,
                    currency.interval,
                    currency.payout,
                    currency.active,
                    currency.transfer
                );
            }
            println!(
                "\n{} currencies, {} seeded users. Config OK.",
                config.currencies.len(),
                config.users.len()
            );
        }
        other => anyhow::bail!("Unsupported format: {} (expected text or json)", other),
    }

    Ok(())
}
