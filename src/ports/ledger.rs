use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::currency::Currency;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("store failure: {0}")]
    Backend(String),
}

/// The ledger collaborator.
///
/// `adjust` is contractually atomic: the store performs the
/// read-modify-write under its own per-user lock, which is what lets a
/// scheduled bulk payout and a command-triggered adjust run concurrently
/// against the same balance without a lost update.
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Live snapshot of every known currency definition, keyed by id.
    async fn currencies(&self) -> Result<HashMap<String, Currency>, LedgerError>;

    async fn balance(&self, user: &str, currency_id: &str) -> Result<i64, LedgerError>;

    async fn adjust(&self, user: &str, currency_id: &str, delta: i64) -> Result<(), LedgerError>;

    /// Adjusts every online user, or only online members of `group` when a
    /// filter is given. Online-set and group membership resolution belong
    /// to the store.
    async fn bulk_adjust_online(
        &self,
        currency_id: &str,
        delta: i64,
        group: Option<&str>,
    ) -> Result<(), LedgerError>;
}
