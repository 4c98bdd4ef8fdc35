//! Recording test doubles for the port traits.
//!
//! Each mock records every call it receives and lets tests inject
//! controlled failures per user. The ledger mock actually applies
//! adjusts to an in-memory balance table so tests can assert post-state,
//! not just call sequences.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::domain::command::CommandSpec;
use crate::domain::currency::Currency;
use crate::ports::chat::ChatPort;
use crate::ports::ledger::{LedgerError, LedgerPort};
use crate::ports::registry::CommandRegistryPort;

/// One recorded ledger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Currencies,
    Balance {
        user: String,
        currency: String,
    },
    Adjust {
        user: String,
        currency: String,
        delta: i64,
    },
    BulkAdjust {
        currency: String,
        delta: i64,
        group: Option<String>,
    },
}

impl LedgerCall {
    /// Balance reads and currency listings do not mutate the store.
    pub fn is_mutating(&self) -> bool {
        matches!(self, LedgerCall::Adjust { .. } | LedgerCall::BulkAdjust { .. })
    }
}

/// Mock ledger that records calls, applies adjusts, and fails on command.
#[derive(Debug, Default)]
pub struct MockLedger {
    currencies: Arc<Mutex<HashMap<String, Currency>>>,
    balances: Arc<Mutex<HashMap<(String, String), i64>>>,
    calls: Arc<Mutex<Vec<LedgerCall>>>,
    fail_adjust_for: Arc<Mutex<HashSet<String>>>,
    fail_balance_for: Arc<Mutex<HashSet<String>>>,
    fail_bulk: Arc<Mutex<bool>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed a currency definition.
    pub fn with_currency(self, currency: Currency) -> Self {
        self.currencies
            .lock()
            .unwrap()
            .insert(currency.id.clone(), currency);
        self
    }

    /// Builder method to seed a user's balance.
    pub fn with_balance(self, user: &str, currency_id: &str, amount: i64) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert((user.to_lowercase(), currency_id.to_string()), amount);
        self
    }

    /// Builder method to make every adjust for `user` fail.
    pub fn with_adjust_failure(self, user: &str) -> Self {
        self.fail_adjust_for
            .lock()
            .unwrap()
            .insert(user.to_lowercase());
        self
    }

    /// Builder method to make every balance read for `user` fail.
    pub fn with_balance_failure(self, user: &str) -> Self {
        self.fail_balance_for
            .lock()
            .unwrap()
            .insert(user.to_lowercase());
        self
    }

    /// Builder method to make every bulk adjust fail.
    pub fn with_bulk_failure(self) -> Self {
        *self.fail_bulk.lock().unwrap() = true;
        self
    }

    /// Get all recorded calls.
    pub fn get_calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Count of calls that would have mutated the store.
    pub fn mutating_call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_mutating())
            .count()
    }

    /// Current balance as the mock store sees it (0 when never touched).
    pub fn balance_of(&self, user: &str, currency_id: &str) -> i64 {
        self.balances
            .lock()
            .unwrap()
            .get(&(user.to_lowercase(), currency_id.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl LedgerPort for MockLedger {
    async fn currencies(&self) -> Result<HashMap<String, Currency>, LedgerError> {
        self.calls.lock().unwrap().push(LedgerCall::Currencies);
        Ok(self.currencies.lock().unwrap().clone())
    }

    async fn balance(&self, user: &str, currency_id: &str) -> Result<i64, LedgerError> {
        self.calls.lock().unwrap().push(LedgerCall::Balance {
            user: user.to_string(),
            currency: currency_id.to_string(),
        });
        if self
            .fail_balance_for
            .lock()
            .unwrap()
            .contains(&user.to_lowercase())
        {
            return Err(LedgerError::UnknownUser(user.to_string()));
        }
        Ok(self.balance_of(user, currency_id))
    }

    async fn adjust(&self, user: &str, currency_id: &str, delta: i64) -> Result<(), LedgerError> {
        self.calls.lock().unwrap().push(LedgerCall::Adjust {
            user: user.to_string(),
            currency: currency_id.to_string(),
            delta,
        });
        if self
            .fail_adjust_for
            .lock()
            .unwrap()
            .contains(&user.to_lowercase())
        {
            return Err(LedgerError::UnknownUser(user.to_string()));
        }
        let mut balances = self.balances.lock().unwrap();
        let entry = balances
            .entry((user.to_lowercase(), currency_id.to_string()))
            .or_insert(0);
        *entry += delta;
        Ok(())
    }

    async fn bulk_adjust_online(
        &self,
        currency_id: &str,
        delta: i64,
        group: Option<&str>,
    ) -> Result<(), LedgerError> {
        self.calls.lock().unwrap().push(LedgerCall::BulkAdjust {
            currency: currency_id.to_string(),
            delta,
            group: group.map(|g| g.to_string()),
        });
        if *self.fail_bulk.lock().unwrap() {
            return Err(LedgerError::Backend("bulk adjust failed".to_string()));
        }
        Ok(())
    }
}

/// One recorded registry call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Registered(String),
    Unregistered(String),
}

/// Mock command registry that records register/unregister order.
#[derive(Debug, Default)]
pub struct MockRegistry {
    calls: Arc<Mutex<Vec<RegistryCall>>>,
    specs: Arc<Mutex<HashMap<String, CommandSpec>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls.
    pub fn get_calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Currently registered spec for a command id, if any.
    pub fn spec(&self, command_id: &str) -> Option<CommandSpec> {
        self.specs.lock().unwrap().get(command_id).cloned()
    }

    pub fn registered_count(&self) -> usize {
        self.specs.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRegistryPort for MockRegistry {
    async fn register(&self, spec: CommandSpec) {
        self.calls
            .lock()
            .unwrap()
            .push(RegistryCall::Registered(spec.id.clone()));
        self.specs.lock().unwrap().insert(spec.id.clone(), spec);
    }

    async fn unregister(&self, command_id: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(RegistryCall::Unregistered(command_id.to_string()));
        self.specs.lock().unwrap().remove(command_id);
    }
}

/// Mock chat sink that records every outgoing line.
#[derive(Debug, Default)]
pub struct MockChat {
    sent: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all sent messages as (text, target) pairs.
    pub fn get_sent(&self) -> Vec<(String, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPort for MockChat {
    async fn send(&self, message: &str, target: Option<&str>) {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), target.map(|t| t.to_string())));
    }
}
