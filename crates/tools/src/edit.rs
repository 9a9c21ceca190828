//! Edit tool — exact string replacement in one file.
//!
//! A replacement only proceeds when the search text occurs exactly once,
//! or when `global` is set. Ambiguity is reported back with the
//! occurrence count so the model can disambiguate.

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};

pub struct EditTool;

#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        "edit"
    }

    fn description(&self) -> &str {
        "Replace an exact text match in a file. The search text must occur exactly once unless global is true. Read the file first to get the exact text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path of the file to modify, relative to the workspace root"
                },
                "search": {
                    "type": "string",
                    "description": "The exact text to search for"
                },
                "replace": {
                    "type": "string",
                    "description": "The text to replace it with"
                },
                "global": {
                    "type": "boolean",
                    "description": "Replace all occurrences of the search text. Default is false"
                },
                "summary": {
                    "type": "string",
                    "description": "Short summary of this change for the audit log"
                }
            },
            "required": ["path", "search", "replace"]
        })
    }

    fn path_parameters(&self) -> &'static [&'static str] {
        &["path"]
    }

    fn is_mutating(&self, _arguments: &serde_json::Value) -> bool {
        true
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let search = arguments["search"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'search' argument".into()))?;
        let replace = arguments["replace"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'replace' argument".into()))?;
        let global = arguments
            .get("global")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if search.is_empty() {
            return Ok(ToolResult::error("", "search text cannot be empty"));
        }
        if search == replace {
            return Ok(ToolResult::error(
                "",
                "search and replace cannot be the same",
            ));
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                return Ok(ToolResult::error("", format!("Failed to read {path}: {e}")));
            }
        };

        let occurrences = content.matches(search).count();
        if occurrences == 0 {
            return Ok(ToolResult::error(
                "",
                format!("search text not found in {path}"),
            ));
        }
        if occurrences > 1 && !global {
            return Ok(ToolResult::error(
                "",
                format!(
                    "search text appears {occurrences} times in {path}. Set global to true to replace all occurrences"
                ),
            ));
        }

        let new_content = if global {
            content.replace(search, replace)
        } else {
            content.replacen(search, replace, 1)
        };

        match tokio::fs::write(path, new_content).await {
            Ok(()) => Ok(ToolResult::ok("", format!("Edited {path}"))),
            Err(e) => Ok(ToolResult::error(
                "",
                format!("Failed to write {path}: {e}"),
            )),
        }
    }
}
