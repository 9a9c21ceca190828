//! Turn domain types — the entries of a conversation transcript.
//!
//! Every exchange with the model is recorded as a sequence of turns:
//! User asks → Assistant answers (possibly requesting tools) → Tool results
//! flow back → Assistant answers again. Turns are immutable once appended
//! to the context store.

use crate::tool::{ToolCall, ToolResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a turn in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Leading instructions (never trimmed)
    System,
    /// The end user
    User,
    /// The model's response, possibly carrying tool calls
    Assistant,
    /// The outcome of one tool call
    Tool,
}

/// A single entry in the conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,

    /// For tool results: whether the call failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn base(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            call_id: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::base(Role::System, content.into())
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::base(Role::User, content.into())
    }

    /// Create an assistant turn with text only.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::base(Role::Assistant, content.into())
    }

    /// Create an assistant turn carrying tool calls.
    pub fn assistant_with_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        let mut turn = Self::base(Role::Assistant, content.into());
        turn.tool_calls = calls;
        turn
    }

    /// Create a tool-result turn answering `call_id`.
    pub fn tool_result(
        call_id: impl Into<String>,
        output: impl Into<String>,
        is_error: bool,
    ) -> Self {
        let mut turn = Self::base(Role::Tool, output.into());
        turn.call_id = Some(call_id.into());
        turn.is_error = is_error;
        turn
    }

    /// Convert a dispatcher result into its transcript turn.
    pub fn from_tool_result(result: &ToolResult) -> Self {
        Self::tool_result(&result.call_id, &result.output, !result.success)
    }

    /// Whether this turn requests any tool executions.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Create a hello.txt for me");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Create a hello.txt for me");
        assert!(turn.tool_calls.is_empty());
        assert!(turn.call_id.is_none());
    }

    #[test]
    fn assistant_turn_carries_calls() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "read".into(),
            arguments: serde_json::json!({"path": "main.rs"}),
        };
        let turn = Turn::assistant_with_calls("Let me look first.", vec![call]);
        assert!(turn.has_tool_calls());
        assert_eq!(turn.tool_calls[0].name, "read");
    }

    #[test]
    fn tool_result_roundtrip() {
        let result = ToolResult {
            call_id: "call_9".into(),
            success: false,
            output: "Error: File not found: main.rs".into(),
        };
        let turn = Turn::from_tool_result(&result);
        assert_eq!(turn.role, Role::Tool);
        assert_eq!(turn.call_id.as_deref(), Some("call_9"));
        assert!(turn.is_error);
        assert!(turn.content.contains("not found"));
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = Turn::tool_result("call_3", "done", false);
        let json = serde_json::to_string(&turn).unwrap();
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Tool);
        assert_eq!(back.call_id.as_deref(), Some("call_3"));
        assert!(!back.is_error);
    }
}
