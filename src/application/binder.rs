//! Command Binder
//!
//! Keeps the command registry in step with currency lifecycle events.
//! Each currency binds one command spec keyed by its deterministic id;
//! an update always unregisters the old binding before registering the
//! replacement so a renamed currency never leaves a stale trigger.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::command::{build_spec, command_id};
use crate::domain::currency::{Currency, CurrencyAction};
use crate::ports::registry::CommandRegistryPort;

pub struct CommandBinder {
    registry: Arc<dyn CommandRegistryPort>,
}

impl CommandBinder {
    pub fn new(registry: Arc<dyn CommandRegistryPort>) -> Self {
        Self { registry }
    }

    /// Applies one lifecycle action to the currency's command binding.
    pub async fn sync(&self, action: CurrencyAction, currency: &Currency) {
        tracing::debug!(
            currency = %currency,
            action = %action,
            "updating currency command binding"
        );
        match action {
            CurrencyAction::Create => {
                self.registry.register(build_spec(currency)).await;
            }
            CurrencyAction::Update => {
                self.registry.unregister(&command_id(&currency.id)).await;
                self.registry.register(build_spec(currency)).await;
            }
            CurrencyAction::Delete => {
                self.registry.unregister(&command_id(&currency.id)).await;
            }
        }
    }

    /// Startup pass: binds a command for every known currency.
    pub async fn sync_all(&self, currencies: &HashMap<String, Currency>) {
        tracing::info!(count = currencies.len(), "binding all currency commands");
        for currency in currencies.values() {
            self.sync(CurrencyAction::Create, currency).await;
        }
    }
}
