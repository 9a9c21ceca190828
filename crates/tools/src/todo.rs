//! Todo tool — in-memory task tracking for the current session.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TodoStatus {
    Pending,
    InProgress,
    Done,
}

impl TodoStatus {
    fn marker(self) -> &'static str {
        match self {
            TodoStatus::Pending => "○",
            TodoStatus::InProgress => "◐",
            TodoStatus::Done => "✓",
        }
    }
}

#[derive(Debug, Clone)]
struct TodoItem {
    task: String,
    status: TodoStatus,
}

/// Session-scoped task list. Held in memory only and cleared when the
/// process exits.
#[derive(Default)]
pub struct TodoTool {
    items: Mutex<Vec<TodoItem>>,
}

impl TodoTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<TodoItem>>, ToolError> {
        self.items.lock().map_err(|_| ToolError::ExecutionFailed {
            tool_name: "todo".into(),
            reason: "todo list lock poisoned".into(),
        })
    }
}

#[async_trait]
impl Tool for TodoTool {
    fn name(&self) -> &str {
        "todo"
    }

    fn description(&self) -> &str {
        "Track tasks for the current session. Supports list, add, start, done, and remove actions. The list lives in memory and is cleared when the session ends."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "add", "start", "done", "remove"],
                    "description": "The operation to perform on the todo list"
                },
                "task": {
                    "type": "string",
                    "description": "Task text (required for 'add')"
                },
                "index": {
                    "type": "integer",
                    "description": "1-based todo number (required for 'start', 'done', and 'remove')"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let action = arguments
            .get("action")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'action' argument".into()))?;

        let mut items = self.lock()?;

        match action {
            "list" => {
                if items.is_empty() {
                    return Ok(ToolResult::ok("", "No todos found"));
                }
                let listing: Vec<String> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("{}. {} {}", i + 1, item.status.marker(), item.task))
                    .collect();
                Ok(ToolResult::ok("", format!("Todos:\n{}", listing.join("\n"))))
            }
            "add" => {
                let task = arguments
                    .get("task")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        ToolError::InvalidArguments("Missing 'task' argument for add".into())
                    })?;
                items.push(TodoItem {
                    task: task.to_string(),
                    status: TodoStatus::Pending,
                });
                Ok(ToolResult::ok("", format!("Added: {task}")))
            }
            "start" | "done" | "remove" => {
                let index = arguments
                    .get("index")
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| {
                        ToolError::InvalidArguments(format!(
                            "Missing 'index' argument for {action}"
                        ))
                    })? as usize;
                if items.is_empty() {
                    return Ok(ToolResult::error("", "No todos found"));
                }
                if index < 1 || index > items.len() {
                    return Ok(ToolResult::error(
                        "",
                        format!("Invalid todo number: {index}"),
                    ));
                }
                let slot = index - 1;
                match action {
                    "start" => {
                        items[slot].status = TodoStatus::InProgress;
                        Ok(ToolResult::ok("", format!("Started: {}", items[slot].task)))
                    }
                    "done" => {
                        items[slot].status = TodoStatus::Done;
                        Ok(ToolResult::ok(
                            "",
                            format!("Marked done: {}", items[slot].task),
                        ))
                    }
                    _ => {
                        let removed = items.remove(slot);
                        Ok(ToolResult::ok("", format!("Removed: {}", removed.task)))
                    }
                }
            }
            other => Ok(ToolResult::error(
                "",
                format!(
                    "Unknown action '{other}'. Expected 'list', 'add', 'start', 'done', or 'remove'"
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(tool: &TodoTool, args: serde_json::Value) -> ToolResult {
        tool.execute(args).await.unwrap()
    }

    #[tokio::test]
    async fn add_then_list_shows_numbered_pending_items() {
        let tool = TodoTool::new();
        run(&tool, serde_json::json!({"action": "add", "task": "first"})).await;
        run(&tool, serde_json::json!({"action": "add", "task": "second"})).await;

        let result = run(&tool, serde_json::json!({"action": "list"})).await;

        assert!(result.success);
        assert_eq!(result.output, "Todos:\n1. ○ first\n2. ○ second");
    }

    #[tokio::test]
    async fn start_marks_in_progress() {
        let tool = TodoTool::new();
        run(&tool, serde_json::json!({"action": "add", "task": "work"})).await;

        let result = run(&tool, serde_json::json!({"action": "start", "index": 1})).await;
        assert!(result.success);
        assert_eq!(result.output, "Started: work");

        let listing = run(&tool, serde_json::json!({"action": "list"})).await;
        assert_eq!(listing.output, "Todos:\n1. ◐ work");
    }

    #[tokio::test]
    async fn done_marks_complete() {
        let tool = TodoTool::new();
        run(&tool, serde_json::json!({"action": "add", "task": "ship it"})).await;

        let result = run(&tool, serde_json::json!({"action": "done", "index": 1})).await;
        assert!(result.success);
        assert_eq!(result.output, "Marked done: ship it");

        let listing = run(&tool, serde_json::json!({"action": "list"})).await;
        assert_eq!(listing.output, "Todos:\n1. ✓ ship it");
    }

    #[tokio::test]
    async fn remove_renumbers_remaining_items() {
        let tool = TodoTool::new();
        for task in ["a", "b", "c"] {
            run(&tool, serde_json::json!({"action": "add", "task": task})).await;
        }

        let result = run(&tool, serde_json::json!({"action": "remove", "index": 2})).await;
        assert_eq!(result.output, "Removed: b");

        let listing = run(&tool, serde_json::json!({"action": "list"})).await;
        assert_eq!(listing.output, "Todos:\n1. ○ a\n2. ○ c");
    }

    #[tokio::test]
    async fn out_of_range_index_is_an_error() {
        let tool = TodoTool::new();
        run(&tool, serde_json::json!({"action": "add", "task": "only"})).await;

        let result = run(&tool, serde_json::json!({"action": "done", "index": 5})).await;

        assert!(!result.success);
        assert_eq!(result.output, "Invalid todo number: 5");
    }

    #[tokio::test]
    async fn operations_on_empty_list_report_no_todos() {
        let tool = TodoTool::new();

        let result = run(&tool, serde_json::json!({"action": "done", "index": 1})).await;

        assert!(!result.success);
        assert_eq!(result.output, "No todos found");
    }

    #[tokio::test]
    async fn empty_list_is_reported_on_list() {
        let tool = TodoTool::new();

        let result = run(&tool, serde_json::json!({"action": "list"})).await;

        assert!(result.success);
        assert_eq!(result.output, "No todos found");
    }

    #[tokio::test]
    async fn unknown_action_is_an_error() {
        let tool = TodoTool::new();

        let result = run(&tool, serde_json::json!({"action": "archive"})).await;

        assert!(!result.success);
        assert!(result.output.contains("Unknown action 'archive'"));
    }

    #[tokio::test]
    async fn add_requires_a_task() {
        let tool = TodoTool::new();

        let err = tool
            .execute(serde_json::json!({"action": "add"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
