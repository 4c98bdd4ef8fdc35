//! In-Memory Reference Adapters
//!
//! Collaborator stubs for the demo binary and the integration tests:
//! a ledger and a command registry, each behind a single async lock.
//! One lock per store is what satisfies the atomic-adjust contract the
//! executor and scheduler rely on.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::domain::command::CommandSpec;
use crate::domain::currency::Currency;
use crate::ports::ledger::{LedgerError, LedgerPort};
use crate::ports::registry::CommandRegistryPort;

#[derive(Debug, Default)]
struct LedgerState {
    currencies: HashMap<String, Currency>,
    /// user (lowercase) -> currency id -> amount
    balances: HashMap<String, HashMap<String, i64>>,
    online: HashSet<String>,
    /// group name -> members (lowercase)
    groups: HashMap<String, HashSet<String>>,
}

/// Ledger stub. Usernames are case-insensitive keys; balances clamp at
/// zero; adjusts for unknown users fail the way a typo'd username fails
/// against the real store.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_currency(&self, currency: Currency) {
        self.state
            .write()
            .await
            .currencies
            .insert(currency.id.clone(), currency);
    }

    pub async fn remove_currency(&self, currency_id: &str) {
        self.state.write().await.currencies.remove(currency_id);
    }

    /// Seeds a user into the roster with their online flag and groups.
    pub async fn add_user(&self, name: &str, online: bool, groups: &[String]) {
        let key = name.to_lowercase();
        let mut state = self.state.write().await;
        state.balances.entry(key.clone()).or_default();
        if online {
            state.online.insert(key.clone());
        } else {
            state.online.remove(&key);
        }
        for group in groups {
            state.groups.entry(group.clone()).or_default().insert(key.clone());
        }
    }
}

#[async_trait]
impl LedgerPort for InMemoryLedger {
    async fn currencies(&self) -> Result<HashMap<String, Currency>, LedgerError> {
        Ok(self.state.read().await.currencies.clone())
    }

    async fn balance(&self, user: &str, currency_id: &str) -> Result<i64, LedgerError> {
        let state = self.state.read().await;
        let balances = state
            .balances
            .get(&user.to_lowercase())
            .ok_or_else(|| LedgerError::UnknownUser(user.to_string()))?;
        Ok(balances.get(currency_id).copied().unwrap_or(0))
    }

    async fn adjust(&self, user: &str, currency_id: &str, delta: i64) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        if !state.currencies.contains_key(currency_id) {
            return Err(LedgerError::UnknownCurrency(currency_id.to_string()));
        }
        let balances = state
            .balances
            .get_mut(&user.to_lowercase())
            .ok_or_else(|| LedgerError::UnknownUser(user.to_string()))?;
        let entry = balances.entry(currency_id.to_string()).or_insert(0);
        *entry = (*entry + delta).max(0);
        Ok(())
    }

    async fn bulk_adjust_online(
        &self,
        currency_id: &str,
        delta: i64,
        group: Option<&str>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        if !state.currencies.contains_key(currency_id) {
            return Err(LedgerError::UnknownCurrency(currency_id.to_string()));
        }

        let recipients: Vec<String> = match group {
            Some(group) => {
                let members = state.groups.get(group).cloned().unwrap_or_default();
                state.online.intersection(&members).cloned().collect()
            }
            None => state.online.iter().cloned().collect(),
        };

        for user in recipients {
            let entry = state
                .balances
                .entry(user)
                .or_default()
                .entry(currency_id.to_string())
                .or_insert(0);
            *entry = (*entry + delta).max(0);
        }
        Ok(())
    }
}

/// Command registry stub: commandId -> spec. Register replaces an
/// existing spec with the same id; unregister on an absent id is a
/// no-op.
#[derive(Debug, Default)]
pub struct InMemoryCommandRegistry {
    specs: RwLock<HashMap<String, CommandSpec>>,
}

impl InMemoryCommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a chat trigger (`!coins`) to its bound spec.
    pub async fn spec_for_trigger(&self, trigger: &str) -> Option<CommandSpec> {
        self.specs
            .read()
            .await
            .values()
            .find(|spec| spec.trigger == trigger)
            .cloned()
    }

    /// Every bound spec, sorted by trigger for stable display.
    pub async fn all_specs(&self) -> Vec<CommandSpec> {
        let mut specs: Vec<CommandSpec> = self.specs.read().await.values().cloned().collect();
        specs.sort_by(|a, b| a.trigger.cmp(&b.trigger));
        specs
    }
}

#[async_trait]
impl CommandRegistryPort for InMemoryCommandRegistry {
    async fn register(&self, spec: CommandSpec) {
        self.specs.write().await.insert(spec.id.clone(), spec);
    }

    async fn unregister(&self, command_id: &str) {
        self.specs.write().await.remove(command_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::build_spec;

    fn coins() -> Currency {
        Currency {
            id: "coins".to_string(),
            name: "Coins".to_string(),
            interval: 5,
            payout: 10,
            active: true,
            bonus: HashMap::new(),
            transfer: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_usernames_are_case_insensitive() {
        let ledger = InMemoryLedger::new();
        ledger.upsert_currency(coins()).await;
        ledger.add_user("Alice", true, &[]).await;

        ledger.adjust("ALICE", "coins", 30).await.unwrap();
        assert_eq!(ledger.balance("alice", "coins").await, Ok(30));
    }

    #[tokio::test]
    async fn test_balances_clamp_at_zero() {
        let ledger = InMemoryLedger::new();
        ledger.upsert_currency(coins()).await;
        ledger.add_user("Alice", true, &[]).await;

        ledger.adjust("Alice", "coins", 10).await.unwrap();
        ledger.adjust("Alice", "coins", -25).await.unwrap();
        assert_eq!(ledger.balance("Alice", "coins").await, Ok(0));
    }

    #[tokio::test]
    async fn test_unknown_user_fails_adjust() {
        let ledger = InMemoryLedger::new();
        ledger.upsert_currency(coins()).await;

        let result = ledger.adjust("Ghost", "coins", 5).await;
        assert_eq!(result, Err(LedgerError::UnknownUser("Ghost".to_string())));
    }

    #[tokio::test]
    async fn test_bulk_adjust_touches_only_online_users() {
        let ledger = InMemoryLedger::new();
        ledger.upsert_currency(coins()).await;
        ledger.add_user("Alice", true, &[]).await;
        ledger.add_user("Bob", false, &[]).await;

        ledger.bulk_adjust_online("coins", 10, None).await.unwrap();

        assert_eq!(ledger.balance("Alice", "coins").await, Ok(10));
        assert_eq!(ledger.balance("Bob", "coins").await, Ok(0));
    }

    #[tokio::test]
    async fn test_reseeding_user_offline_clears_online_flag() {
        let ledger = InMemoryLedger::new();
        ledger.upsert_currency(coins()).await;
        ledger.add_user("Alice", true, &[]).await;
        ledger.add_user("Alice", false, &[]).await;

        ledger.bulk_adjust_online("coins", 10, None).await.unwrap();
        assert_eq!(ledger.balance("Alice", "coins").await, Ok(0));
    }

    #[tokio::test]
    async fn test_bulk_adjust_group_filter() {
        let ledger = InMemoryLedger::new();
        ledger.upsert_currency(coins()).await;
        ledger
            .add_user("Alice", true, &["Subscribers".to_string()])
            .await;
        ledger.add_user("Bob", true, &[]).await;
        ledger
            .add_user("Cara", false, &["Subscribers".to_string()])
            .await;

        ledger
            .bulk_adjust_online("coins", 5, Some("Subscribers"))
            .await
            .unwrap();

        // Only the online subscriber is credited.
        assert_eq!(ledger.balance("Alice", "coins").await, Ok(5));
        assert_eq!(ledger.balance("Bob", "coins").await, Ok(0));
        assert_eq!(ledger.balance("Cara", "coins").await, Ok(0));
    }

    #[tokio::test]
    async fn test_registry_register_replaces_and_trigger_lookup() {
        let registry = InMemoryCommandRegistry::new();
        registry.register(build_spec(&coins())).await;

        let mut renamed = coins();
        renamed.name = "Gold Bars".to_string();
        registry.register(build_spec(&renamed)).await;

        assert_eq!(registry.all_specs().await.len(), 1);
        assert!(registry.spec_for_trigger("!gold-bars").await.is_some());
        assert!(registry.spec_for_trigger("!coins").await.is_none());
    }

    #[tokio::test]
    async fn test_registry_unregister_absent_is_noop() {
        let registry = InMemoryCommandRegistry::new();
        registry.unregister("coinkeep:currency:ghost").await;
        assert!(registry.all_specs().await.is_empty());
    }
}
