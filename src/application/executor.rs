//! Transaction Executor
//!
//! Runs one balance mutation per command invocation as an explicit
//! sequential workflow: every precondition is a checked step with an
//! early exit, and the give transfer's compensating reversal is an
//! explicit branch rather than a fallthrough. Every execution sends
//! exactly one chat acknowledgment; the receipt's detail line is that
//! acknowledgment.

use std::sync::Arc;

use crate::domain::command::strip_mention;
use crate::domain::currency::Currency;
use crate::domain::transaction::{
    parse_magnitude, TransactionOutcome, TransactionReceipt, TransactionRequest,
};
use crate::ports::chat::ChatPort;
use crate::ports::ledger::{LedgerError, LedgerPort};

pub struct TransactionExecutor {
    ledger: Arc<dyn LedgerPort>,
    chat: Arc<dyn ChatPort>,
}

impl TransactionExecutor {
    pub fn new(ledger: Arc<dyn LedgerPort>, chat: Arc<dyn ChatPort>) -> Self {
        Self { ledger, chat }
    }

    /// Executes one request against the currency snapshot and acknowledges
    /// the invoking user. Bulk successes are broadcast; every other path
    /// is whispered to the sender.
    pub async fn execute(
        &self,
        currency: &Currency,
        sender: &str,
        request: TransactionRequest,
    ) -> TransactionReceipt {
        let receipt = match &request {
            TransactionRequest::Add { target, amount } => {
                self.add(currency, target, amount).await
            }
            TransactionRequest::Remove { target, amount } => {
                self.remove(currency, target, amount).await
            }
            TransactionRequest::Give { target, amount } => {
                self.give(currency, sender, target, amount).await
            }
            TransactionRequest::GiveAll { amount } => self.give_all(currency, amount).await,
            TransactionRequest::RemoveAll { amount } => self.remove_all(currency, amount).await,
        };

        let broadcast = receipt.succeeded()
            && matches!(
                request,
                TransactionRequest::GiveAll { .. } | TransactionRequest::RemoveAll { .. }
            );
        let target = if broadcast { None } else { Some(sender) };
        self.chat.send(&receipt.detail, target).await;

        receipt
    }

    /// Reports the sender's own balance, whispered back to them.
    pub async fn balance_inquiry(&self, currency: &Currency, sender: &str) -> TransactionReceipt {
        let receipt = match self.ledger.balance(sender, &currency.id).await {
            Ok(amount) => TransactionReceipt::new(
                TransactionOutcome::Success,
                format!("{}'s {} total is {}.", sender, currency.name, amount),
            ),
            Err(e) => {
                tracing::error!(
                    user = sender,
                    currency_id = %currency.id,
                    error = %e,
                    "could not read balance for inquiry"
                );
                TransactionReceipt::new(
                    TransactionOutcome::StoreError,
                    "Error: Could not retrieve currency.",
                )
            }
        };
        self.chat.send(&receipt.detail, Some(sender)).await;
        receipt
    }

    async fn add(&self, currency: &Currency, target: &str, raw_amount: &str) -> TransactionReceipt {
        let target = strip_mention(target);
        let Some(magnitude) = parse_magnitude(raw_amount) else {
            return TransactionReceipt::new(
                TransactionOutcome::StoreError,
                "Error: Could not add currency to user.",
            );
        };

        match self.ledger.adjust(target, &currency.id, magnitude).await {
            Ok(()) => TransactionReceipt::new(
                TransactionOutcome::Success,
                format!("Added {} {} to {}.", magnitude, currency.name, target),
            ),
            Err(e) => {
                tracing::error!(
                    user = target,
                    currency_id = %currency.id,
                    amount = magnitude,
                    error = %e,
                    "could not add currency for user"
                );
                TransactionReceipt::new(
                    TransactionOutcome::StoreError,
                    "Error: Could not add currency to user.",
                )
            }
        }
    }

    async fn remove(
        &self,
        currency: &Currency,
        target: &str,
        raw_amount: &str,
    ) -> TransactionReceipt {
        let target = strip_mention(target);
        let Some(magnitude) = parse_magnitude(raw_amount) else {
            return TransactionReceipt::new(
                TransactionOutcome::StoreError,
                "Error: Could not remove currency from user.",
            );
        };

        match self.ledger.adjust(target, &currency.id, -magnitude).await {
            Ok(()) => TransactionReceipt::new(
                TransactionOutcome::Success,
                format!("Removed {} {} from {}.", magnitude, currency.name, target),
            ),
            Err(e) => {
                tracing::error!(
                    user = target,
                    currency_id = %currency.id,
                    amount = magnitude,
                    error = %e,
                    "could not remove currency for user"
                );
                TransactionReceipt::new(
                    TransactionOutcome::StoreError,
                    "Error: Could not remove currency from user.",
                )
            }
        }
    }

    /// Transfer from `sender` to `target`. Preconditions run in order
    /// (policy, self-transfer, magnitude, funds) and none of them issues
    /// a mutating store call. The target is credited before the sender is
    /// debited: an unresolvable or typo'd target is the common failure
    /// and aborting there leaves the sender untouched.
    async fn give(
        &self,
        currency: &Currency,
        sender: &str,
        target: &str,
        raw_amount: &str,
    ) -> TransactionReceipt {
        let target = strip_mention(target);

        if !currency.transfers_allowed() {
            tracing::debug!(
                user = sender,
                currency_id = %currency.id,
                "tried to give a currency with transfers turned off"
            );
            return TransactionReceipt::new(
                TransactionOutcome::TransferDisallowed,
                "Transfers are not allowed for this currency.",
            );
        }

        if sender.eq_ignore_ascii_case(target) {
            tracing::debug!(user = sender, "tried to give themselves currency");
            return TransactionReceipt::new(
                TransactionOutcome::SelfTransfer,
                "You can't give yourself currency.",
            );
        }

        let Some(magnitude) = parse_magnitude(raw_amount) else {
            return TransactionReceipt::new(
                TransactionOutcome::StoreError,
                "Error: Could not give currency to user.",
            );
        };

        let balance = match self.ledger.balance(sender, &currency.id).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::error!(
                    user = sender,
                    currency_id = %currency.id,
                    error = %e,
                    "could not read sender balance for give"
                );
                return TransactionReceipt::new(
                    TransactionOutcome::StoreError,
                    "Error: Could not retrieve currency.",
                );
            }
        };
        if balance < magnitude {
            tracing::debug!(
                user = sender,
                currency_id = %currency.id,
                balance,
                amount = magnitude,
                "give denied, insufficient funds"
            );
            return TransactionReceipt::new(
                TransactionOutcome::InsufficientFunds,
                format!("You do not have enough {} to do this action.", currency.name),
            );
        }

        if let Err(e) = self.ledger.adjust(target, &currency.id, magnitude).await {
            tracing::error!(
                user = target,
                currency_id = %currency.id,
                amount = magnitude,
                error = %e,
                "could not credit transfer target"
            );
            let outcome = match e {
                LedgerError::UnknownUser(_) => TransactionOutcome::TargetUnresolvable,
                _ => TransactionOutcome::StoreError,
            };
            return TransactionReceipt::new(
                outcome,
                "Error: Could not add currency to user. Was there a typo in the username?",
            );
        }

        if let Err(e) = self.ledger.adjust(sender, &currency.id, -magnitude).await {
            tracing::error!(
                user = sender,
                currency_id = %currency.id,
                amount = magnitude,
                error = %e,
                "debit leg failed after credit, attempting reversal"
            );
            return match self.ledger.adjust(target, &currency.id, -magnitude).await {
                Ok(()) => TransactionReceipt::new(
                    TransactionOutcome::Partial,
                    "Error: Could not complete the transfer. The transaction was rolled back.",
                ),
                Err(reversal) => {
                    tracing::error!(
                        user = target,
                        currency_id = %currency.id,
                        amount = magnitude,
                        error = %reversal,
                        "compensating reversal failed, manual reconciliation required"
                    );
                    TransactionReceipt::new(
                        TransactionOutcome::Partial,
                        "Error: Could not complete the transfer. Balances may need manual reconciliation.",
                    )
                }
            };
        }

        TransactionReceipt::new(
            TransactionOutcome::Success,
            format!("Gave {} {} to {}.", magnitude, currency.name, target),
        )
    }

    async fn give_all(&self, currency: &Currency, raw_amount: &str) -> TransactionReceipt {
        let Some(magnitude) = parse_magnitude(raw_amount) else {
            return TransactionReceipt::new(
                TransactionOutcome::StoreError,
                "Error: Could not add currency to all online users.",
            );
        };

        match self
            .ledger
            .bulk_adjust_online(&currency.id, magnitude, None)
            .await
        {
            Ok(()) => TransactionReceipt::new(
                TransactionOutcome::Success,
                format!("Added {} {} to everyone!", magnitude, currency.name),
            ),
            Err(e) => {
                tracing::error!(
                    currency_id = %currency.id,
                    amount = magnitude,
                    error = %e,
                    "could not add currency to all online users"
                );
                TransactionReceipt::new(
                    TransactionOutcome::StoreError,
                    "Error: Could not add currency to all online users.",
                )
            }
        }
    }

    async fn remove_all(&self, currency: &Currency, raw_amount: &str) -> TransactionReceipt {
        let Some(magnitude) = parse_magnitude(raw_amount) else {
            return TransactionReceipt::new(
                TransactionOutcome::StoreError,
                "Error: Could not remove currency from all online users.",
            );
        };

        match self
            .ledger
            .bulk_adjust_online(&currency.id, -magnitude, None)
            .await
        {
            Ok(()) => TransactionReceipt::new(
                TransactionOutcome::Success,
                format!("Removed {} {} from everyone!", magnitude, currency.name),
            ),
            Err(e) => {
                tracing::error!(
                    currency_id = %currency.id,
                    amount = magnitude,
                    error = %e,
                    "could not remove currency from all online users"
                );
                TransactionReceipt::new(
                    TransactionOutcome::StoreError,
                    "Error: Could not remove currency from all online users.",
                )
            }
        }
    }
}
