//! Coinkeep - Chat Currency Engine Library
//!
//! A minute-aligned recurring payout scheduler plus a transactional
//! balance-command executor over a pluggable ledger.
//!
//! # Modules
//!
//! - `domain`: Core business logic (Currency, PayoutPlan, TransactionReceipt, CommandSpec)
//! - `ports`: Trait abstractions (LedgerPort, ChatPort, CommandRegistryPort)
//! - `application`: Scheduler, executor, binder, and the engine that owns them
//! - `adapters`: In-memory and console reference implementations
//! - `config`: Configuration loading and validation

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
