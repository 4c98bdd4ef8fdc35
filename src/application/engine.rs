//! Currency Engine
//!
//! Owns the ports and the three services (binder, executor, scheduler),
//! wires startup, and dispatches the two inbound surfaces: lifecycle
//! signals from the configuration UI and command invocations from the
//! chat dispatch framework.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::binder::CommandBinder;
use crate::application::executor::TransactionExecutor;
use crate::application::scheduler::PayoutScheduler;
use crate::domain::command::{SubCommand, COMMAND_NAMESPACE};
use crate::domain::currency::{Currency, CurrencyAction};
use crate::domain::transaction::{TransactionOutcome, TransactionReceipt, TransactionRequest};
use crate::ports::chat::ChatPort;
use crate::ports::ledger::{LedgerError, LedgerPort};
use crate::ports::registry::CommandRegistryPort;

/// Lifecycle signals pushed by the configuration surface. Actions arrive
/// string-typed on the wire; the engine parses them into the closed
/// [`CurrencyAction`] set and drops anything outside it.
#[derive(Debug, Clone)]
pub enum EngineSignal {
    Currency { action: String, currency: Currency },
    RefreshSchedule,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub struct CurrencyEngine {
    ledger: Arc<dyn LedgerPort>,
    chat: Arc<dyn ChatPort>,
    binder: CommandBinder,
    executor: TransactionExecutor,
    scheduler: PayoutScheduler,
}

impl CurrencyEngine {
    pub fn new(
        ledger: Arc<dyn LedgerPort>,
        chat: Arc<dyn ChatPort>,
        registry: Arc<dyn CommandRegistryPort>,
    ) -> Self {
        let binder = CommandBinder::new(registry);
        let executor = TransactionExecutor::new(Arc::clone(&ledger), Arc::clone(&chat));
        let scheduler = PayoutScheduler::new(Arc::clone(&ledger));
        Self {
            ledger,
            chat,
            binder,
            executor,
            scheduler,
        }
    }

    /// Set a custom payout tick period (default one minute).
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.scheduler = self.scheduler.with_tick_period(period);
        self
    }

    /// Startup: binds a command for every known currency, then starts
    /// the payout schedule.
    pub async fn bootstrap(&self) -> Result<(), EngineError> {
        let currencies = self.ledger.currencies().await?;
        self.binder.sync_all(&currencies).await;
        self.scheduler.start().await;
        tracing::info!(currencies = currencies.len(), "currency engine started");
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
    }

    pub async fn handle_signal(&self, signal: EngineSignal) {
        match signal {
            EngineSignal::Currency { action, currency } => match action.parse::<CurrencyAction>() {
                Ok(action) => self.binder.sync(action, &currency).await,
                Err(e) => {
                    tracing::warn!(currency = %currency, error = %e, "ignoring currency signal");
                }
            },
            // An idempotent restart: the scheduler re-reads the live
            // currency set on every tick anyway.
            EngineSignal::RefreshSchedule => self.scheduler.start().await,
        }
    }

    /// Consumes lifecycle signals until the channel closes.
    pub async fn run_signals(&self, mut signals: mpsc::Receiver<EngineSignal>) {
        while let Some(signal) = signals.recv().await {
            self.handle_signal(signal).await;
        }
        tracing::debug!("signal channel closed");
    }

    /// Dispatches one command invocation: resolves the command id to a
    /// live currency snapshot, routes empty args to the balance inquiry,
    /// parses the subcommand, and runs the executor. Unknown subcommands
    /// get a usage line.
    pub async fn handle_invocation(
        &self,
        command_id: &str,
        sender: &str,
        args: &[String],
    ) -> TransactionReceipt {
        let Some(currency) = self.resolve_currency(command_id).await else {
            let receipt = TransactionReceipt::new(
                TransactionOutcome::StoreError,
                "Error: Could not retrieve currency.",
            );
            self.chat.send(&receipt.detail, Some(sender)).await;
            return receipt;
        };

        if args.is_empty() {
            return self.executor.balance_inquiry(&currency, sender).await;
        }

        let Ok(sub) = args[0].parse::<SubCommand>() else {
            let detail = format!(
                "Invalid command. Usage: {} [add | remove | give | giveall | removeall]",
                crate::domain::command::clean_trigger(&currency.name)
            );
            self.chat.send(&detail, Some(sender)).await;
            return TransactionReceipt::new(TransactionOutcome::StoreError, detail);
        };

        let arg = |index: usize| args.get(index).cloned().unwrap_or_default();
        let request = match sub {
            SubCommand::Add => TransactionRequest::Add {
                target: arg(1),
                amount: arg(2),
            },
            SubCommand::Remove => TransactionRequest::Remove {
                target: arg(1),
                amount: arg(2),
            },
            SubCommand::Give => TransactionRequest::Give {
                target: arg(1),
                amount: arg(2),
            },
            SubCommand::GiveAll => TransactionRequest::GiveAll { amount: arg(1) },
            SubCommand::RemoveAll => TransactionRequest::RemoveAll { amount: arg(1) },
        };

        self.executor.execute(&currency, sender, request).await
    }

    async fn resolve_currency(&self, command_id: &str) -> Option<Currency> {
        let Some(currency_id) = command_id.strip_prefix(COMMAND_NAMESPACE) else {
            tracing::warn!(command_id, "invocation outside the currency namespace");
            return None;
        };
        match self.ledger.currencies().await {
            Ok(mut currencies) => {
                let currency = currencies.remove(currency_id);
                if currency.is_none() {
                    tracing::warn!(currency_id, "invocation for an unknown currency");
                }
                currency
            }
            Err(e) => {
                tracing::error!(currency_id, error = %e, "could not read currency definitions");
                None
            }
        }
    }
}
