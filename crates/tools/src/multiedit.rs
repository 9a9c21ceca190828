//! Multiedit tool — a batch of string replacements applied atomically.
//!
//! Every edit is validated against the content as previous edits leave
//! it, so later edits may target text earlier edits introduced. Any
//! failure aborts the whole batch before a single byte is written.

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct EditOperation {
    search: String,
    replace: String,
    #[serde(default, alias = "global_replace")]
    global: bool,
}

pub struct MultieditTool;

#[async_trait]
impl Tool for MultieditTool {
    fn name(&self) -> &str {
        "multiedit"
    }

    fn description(&self) -> &str {
        "Apply several exact string replacements to one file in order. All edits must succeed or none are applied. Each edit sees the result of the previous ones."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path of the file to modify, relative to the workspace root"
                },
                "edits": {
                    "type": "array",
                    "description": "Edit operations applied in order",
                    "items": {
                        "type": "object",
                        "properties": {
                            "search": { "type": "string" },
                            "replace": { "type": "string" },
                            "global": {
                                "type": "boolean",
                                "description": "Replace all occurrences. Default is false"
                            }
                        },
                        "required": ["search", "replace"]
                    }
                },
                "summary": {
                    "type": "string",
                    "description": "Short summary of this change for the audit log"
                }
            },
            "required": ["path", "edits"]
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
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?
            .to_string();
        let edits_value = arguments
            .get("edits")
            .cloned()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'edits' argument".into()))?;
        let edits: Vec<EditOperation> = serde_json::from_value(edits_value)
            .map_err(|e| ToolError::InvalidArguments(format!("Invalid 'edits' array: {e}")))?;

        if edits.is_empty() {
            return Ok(ToolResult::error("", "edits array is empty"));
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                return Ok(ToolResult::error("", format!("Failed to read {path}: {e}")));
            }
        };

        // Fold the edits over a preview of the content; the file on disk
        // is only touched once every edit has validated.
        let mut preview = content;
        for (i, edit) in edits.iter().enumerate() {
            let n = i + 1;
            if edit.search.is_empty() {
                return Ok(ToolResult::error(
                    "",
                    format!("Edit {n}: search text cannot be empty"),
                ));
            }
            if edit.search == edit.replace {
                return Ok(ToolResult::error(
                    "",
                    format!("Edit {n}: search and replace cannot be the same"),
                ));
            }

            let occurrences = preview.matches(&edit.search).count();
            if occurrences == 0 {
                return Ok(ToolResult::error(
                    "",
                    format!("Edit {n}: search text not found in {path}"),
                ));
            }
            if occurrences > 1 && !edit.global {
                return Ok(ToolResult::error(
                    "",
                    format!(
                        "Edit {n}: search text appears {occurrences} times. Set global to true to replace all occurrences"
                    ),
                ));
            }

            preview = if edit.global {
                preview.replace(&edit.search, &edit.replace)
            } else {
                preview.replacen(&edit.search, &edit.replace, 1)
            };
        }

        match tokio::fs::write(&path, preview).await {
            Ok(()) => Ok(ToolResult::ok(
                "",
                format!("Applied {} edits to {path}", edits.len()),
            )),
            Err(e) => Ok(ToolResult::error(
                "",
                format!("Failed to write {path}: {e}"),
            )),
        }
    }
}
