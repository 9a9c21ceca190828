//! The agent loop — the heart of Ferrocode.
//!
//! One pass of the loop:
//!
//! 1. **Receive** a user input line
//! 2. **Build the view**: trim the transcript to the token budget
//! 3. **Send to the model** via the configured provider
//! 4. **If tool calls**: dispatch each in order, append results, loop back
//! 5. **If text only**: that is the answer
//!
//! The loop runs until the model answers without tool calls or the
//! iteration cap is reached, in which case the outcome is explicitly
//! marked truncated.

pub mod context;
pub mod loop_runner;

pub use context::ContextStore;
pub use loop_runner::{AgentLoop, RunOutcome};
