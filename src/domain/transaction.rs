//! Transaction Requests and Receipts
//!
//! A `TransactionRequest` is one parsed command invocation against a single
//! currency: created by the engine, consumed immediately by the executor,
//! never persisted. The executor answers with a `TransactionReceipt` whose
//! detail line is exactly the chat acknowledgment that was sent.

use std::fmt;

/// The balance mutation a subcommand asked for.
///
/// Amounts arrive as the raw argument text supplied by the command
/// framework; coercion to a magnitude happens inside the executor so that
/// unparseable input can be rejected before any store call is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRequest {
    /// Credit `target` by the given amount.
    Add { target: String, amount: String },
    /// Debit `target` by the given amount.
    Remove { target: String, amount: String },
    /// Transfer from the invoking user to `target`.
    Give { target: String, amount: String },
    /// Credit every online user.
    GiveAll { amount: String },
    /// Debit every online user.
    RemoveAll { amount: String },
}

/// How a transaction concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Success,
    /// The sender's balance did not cover the transfer.
    InsufficientFunds,
    /// The transfer target could not be resolved by the store.
    TargetUnresolvable,
    /// The currency's transfer policy forbids `give`.
    TransferDisallowed,
    /// Sender and target were the same user.
    SelfTransfer,
    /// A transfer leg failed after the other completed; a compensating
    /// reversal was attempted and the operation must be treated as failed.
    Partial,
    /// The store rejected the operation or the input never reached it.
    StoreError,
}

impl TransactionOutcome {
    /// Policy denials are user-facing and expected; everything else that is
    /// not a success indicates a store-side or consistency problem.
    pub fn is_policy_denial(&self) -> bool {
        matches!(
            self,
            TransactionOutcome::InsufficientFunds
                | TransactionOutcome::TransferDisallowed
                | TransactionOutcome::SelfTransfer
        )
    }
}

/// Final report for one executed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub outcome: TransactionOutcome,
    /// Human-readable detail; also the chat acknowledgment text.
    pub detail: String,
}

impl TransactionReceipt {
    pub fn new(outcome: TransactionOutcome, detail: impl Into<String>) -> Self {
        Self {
            outcome,
            detail: detail.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == TransactionOutcome::Success
    }
}

impl fmt::Display for TransactionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.outcome, self.detail)
    }
}

/// Coerces raw amount text to a non-negative magnitude.
///
/// Signs are discarded (`remove` and `removeall` negate on their own), so
/// "-25" and "25" both mean a magnitude of 25. Returns `None` for anything
/// that is not an integer, including `i64::MIN`, which has no non-negative
/// counterpart.
pub fn parse_magnitude(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().and_then(i64::checked_abs)
}
