//! Domain Layer - Core business logic for the currency engine
//!
//! This module contains pure domain types and decisions with no external
//! dependencies. All store, chat, and registry interactions happen through
//! the ports layer.
//!
//! - `currency`: currency definition snapshots and lifecycle actions
//! - `payout`: the pure payout-due decision and its bulk-adjust plan
//! - `transaction`: transaction requests, receipts, and magnitude coercion
//! - `command`: immutable command specifications bound to currencies

pub mod command;
pub mod currency;
pub mod payout;
pub mod transaction;

pub use command::{build_spec, clean_trigger, command_id, strip_mention, CommandSpec, SubCommand};
pub use currency::{Currency, CurrencyAction, InvalidAction, TransferPolicy};
pub use payout::{evaluate, PayoutPlan};
pub use transaction::{parse_magnitude, TransactionOutcome, TransactionReceipt, TransactionRequest};
