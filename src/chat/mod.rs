//! Chat orchestration
//!
//! Turns user input into a user/model message pair: the user message is
//! committed before the provider is called, the reply (or a placeholder)
//! is committed when the call returns.

pub mod orchestrator;

pub use orchestrator::ChatOrchestrator;
