//! Model provider implementations for Ferrocode.
//!
//! All providers implement the `ferrocode_core::Provider` trait. The agent
//! loop only sees that trait, so swapping backends is a construction-time
//! decision.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
