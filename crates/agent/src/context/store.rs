//! The append-only conversation transcript with budget-aware viewing.
//!
//! Turns are recorded in arrival order and never mutated or removed.
//! Trimming happens only in [`ContextStore::trimmed_view`], which computes
//! what to send to the model without touching the stored transcript.

use std::collections::HashSet;
use std::ops::Range;

use ferrocode_core::error::ContextError;
use ferrocode_core::turn::{Role, Turn};
use tracing::debug;

use crate::context::token::estimate_turns_tokens;

#[derive(Debug, Default)]
pub struct ContextStore {
    turns: Vec<Turn>,

    /// Call ids from appended assistant turns not yet answered by a
    /// tool-result turn.
    pending_calls: HashSet<String>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn to the transcript.
    ///
    /// Assistant turns register their tool-call ids as awaiting results.
    /// A tool-result turn must answer one of them; each id is consumed
    /// exactly once.
    pub fn append(&mut self, turn: Turn) -> Result<(), ContextError> {
        match turn.role {
            Role::Assistant => {
                for call in &turn.tool_calls {
                    self.pending_calls.insert(call.id.clone());
                }
            }
            Role::Tool => {
                let call_id = turn.call_id.clone().unwrap_or_default();
                if !self.pending_calls.remove(&call_id) {
                    return Err(ContextError::UnmatchedToolResult { call_id });
                }
            }
            Role::System | Role::User => {}
        }
        self.turns.push(turn);
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Estimated token cost of the full transcript.
    pub fn estimated_tokens(&self) -> usize {
        estimate_turns_tokens(&self.turns)
    }

    /// Compute the transcript view that fits `budget` estimated tokens.
    ///
    /// Whole turns are dropped oldest first. Never dropped: the leading
    /// system turn, the most recent user turn, and everything after it.
    /// An assistant turn carrying tool calls and the tool-result turns
    /// answering it form one removal unit, so the view never contains a
    /// result whose request was trimmed away (or the reverse). If the
    /// protected turns alone exceed the budget the view is refused with
    /// `ContextError::Overflow`.
    pub fn trimmed_view(&self, budget: usize) -> Result<Vec<Turn>, ContextError> {
        let total = self.estimated_tokens();
        if total <= budget {
            return Ok(self.turns.clone());
        }

        let units = self.removal_units();
        let last_user = self.turns.iter().rposition(|t| t.role == Role::User);

        let mut dropped = vec![false; units.len()];
        let mut remaining = total;
        for (slot, unit) in units.iter().enumerate() {
            if remaining <= budget {
                break;
            }
            if self.unit_protected(unit, last_user) {
                continue;
            }
            remaining -= estimate_turns_tokens(&self.turns[unit.clone()]);
            dropped[slot] = true;
        }

        if remaining > budget {
            return Err(ContextError::Overflow {
                needed: remaining,
                budget,
            });
        }

        debug!(
            total,
            remaining,
            budget,
            units_dropped = dropped.iter().filter(|d| **d).count(),
            "trimmed context view"
        );

        let mut view = Vec::new();
        for (slot, unit) in units.iter().enumerate() {
            if !dropped[slot] {
                view.extend(self.turns[unit.clone()].iter().cloned());
            }
        }
        Ok(view)
    }

    /// Group turn indices into removal units: an assistant turn carrying
    /// tool calls absorbs the run of tool-result turns that follows it;
    /// every other turn stands alone.
    fn removal_units(&self) -> Vec<Range<usize>> {
        let mut units = Vec::new();
        let mut i = 0;
        while i < self.turns.len() {
            let start = i;
            i += 1;
            if self.turns[start].role == Role::Assistant && self.turns[start].has_tool_calls() {
                while i < self.turns.len() && self.turns[i].role == Role::Tool {
                    i += 1;
                }
            }
            units.push(start..i);
        }
        units
    }

    fn unit_protected(&self, unit: &Range<usize>, last_user: Option<usize>) -> bool {
        if unit.start == 0 && self.turns[0].role == Role::System {
            return true;
        }
        // Protected when the unit contains the most recent user turn or
        // anything after it.
        match last_user {
            Some(u) => unit.end > u,
            None => false,
        }
    }
}
