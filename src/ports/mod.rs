//! Ports Layer - Trait definitions for external collaborators
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The balance ledger (currencies, balances, bulk payout adjusts)
//! - The chat surface (fire-and-forget message delivery)
//! - The command registry (trigger registration per currency)

pub mod chat;
pub mod ledger;
pub mod mocks;
pub mod registry;

pub use chat::ChatPort;
pub use ledger::{LedgerError, LedgerPort};
pub use registry::CommandRegistryPort;
