//! Write tool — create files, refusing to silently overwrite.

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};

pub struct WriteTool;

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write content to a new file in the workspace. Fails if the file already exists unless overwrite is true. Prefer the edit tool for modifying existing files."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path of the file to write, relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Replace the file if it already exists. Default is false"
                },
                "summary": {
                    "type": "string",
                    "description": "Short summary of this change for the audit log"
                }
            },
            "required": ["path", "content"]
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
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;
        let overwrite = arguments
            .get("overwrite")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let target = std::path::Path::new(path);
        if target.exists() && !overwrite {
            return Ok(ToolResult::error(
                "",
                format!("File {path} already exists. Set overwrite to true to replace it"),
            ));
        }

        if let Some(parent) = target.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(ToolResult::error(
                "",
                format!("Failed to create directory: {e}"),
            ));
        }

        match tokio::fs::write(target, content).await {
            Ok(()) => Ok(ToolResult::ok("", format!("Written to {path}"))),
            Err(e) => Ok(ToolResult::error(
                "",
                format!("Failed to write {path}: {e}"),
            )),
        }
    }
}
