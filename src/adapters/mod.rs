//! Adapters Layer - Reference implementations of the ports
//!
//! This module contains the collaborator stubs that back the demo binary
//! and the integration tests:
//! - Memory: in-memory ledger and command registry
//! - Console: stdout chat sink and the stdin chat-line parser

pub mod console;
pub mod memory;

pub use console::{parse_chat_line, ChatInvocation, ConsoleChat};
pub use memory::{InMemoryCommandRegistry, InMemoryLedger};
