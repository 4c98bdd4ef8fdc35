pub mod binder;
pub mod engine;
pub mod executor;
pub mod scheduler;

pub use binder::CommandBinder;
pub use engine::{CurrencyEngine, EngineError, EngineSignal};
pub use executor::TransactionExecutor;
pub use scheduler::PayoutScheduler;
