//! Bounded conversation context.
//!
//! The transcript itself is append-only; what the model sees each request
//! is a budgeted view computed on demand.

pub mod store;
pub mod token;

pub use store::ContextStore;
pub use token::{estimate_tokens, estimate_turn_tokens, estimate_turns_tokens};
