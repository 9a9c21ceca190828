//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. The
//! approximation is accurate within ~10% for BPE tokenizers (GPT-4,
//! Claude) on English text. It is deterministic and monotone in content
//! length, which is what budget trimming needs to converge.

use ferrocode_core::turn::Turn;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() + 3) / 4
}

/// Estimate tokens for a single turn including per-turn overhead.
///
/// Each turn costs ~4 tokens of overhead for role name, delimiters, and
/// formatting markers in the API wire format. Tool calls count at their
/// serialized JSON size.
pub fn estimate_turn_tokens(turn: &Turn) -> usize {
    let overhead = 4;
    let mut tokens = overhead + estimate_tokens(&turn.content);
    if !turn.tool_calls.is_empty() {
        let json = serde_json::to_string(&turn.tool_calls).unwrap_or_default();
        tokens += estimate_tokens(&json);
    }
    tokens
}

/// Estimate tokens for a slice of turns.
pub fn estimate_turns_tokens(turns: &[Turn]) -> usize {
    turns.iter().map(estimate_turn_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrocode_core::tool::ToolCall;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(estimate_tokens("test"), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn hundred_chars() {
        let text = "a".repeat(100);
        assert_eq!(estimate_tokens(&text), 25);
    }

    #[test]
    fn turn_includes_overhead() {
        let turn = Turn::user("test"); // 4 chars → 1 token + 4 overhead = 5
        assert_eq!(estimate_turn_tokens(&turn), 5);
    }

    #[test]
    fn tool_calls_add_cost() {
        let plain = Turn::assistant("Let me check.");
        let with_calls = Turn::assistant_with_calls(
            "Let me check.",
            vec![ToolCall {
                id: "call_1".into(),
                name: "read".into(),
                arguments: serde_json::json!({"path": "main.rs"}),
            }],
        );
        assert!(estimate_turn_tokens(&with_calls) > estimate_turn_tokens(&plain));
    }

    #[test]
    fn multiple_turns_sum() {
        let turns = vec![
            Turn::user("hello"),      // 2 tokens + 4 overhead = 6
            Turn::assistant("world"), // 2 tokens + 4 overhead = 6
        ];
        assert_eq!(estimate_turns_tokens(&turns), 12);
    }
}
