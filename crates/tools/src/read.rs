//! Read tool — file contents with optional skip/lines windowing.

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};

/// Whole-file reads are capped at this many characters.
const MAX_READ_CHARS: usize = 10_000;

pub struct ReadTool;

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read a file from the workspace. By default returns the whole file (up to 10,000 characters); use skip and lines to read a window."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file to read, relative to the workspace root"
                },
                "skip": {
                    "type": "integer",
                    "description": "Number of lines to skip from the beginning (0-indexed)"
                },
                "lines": {
                    "type": "integer",
                    "description": "Number of lines to read. If not specified, reads all remaining lines"
                }
            },
            "required": ["path"]
        })
    }

    fn path_parameters(&self) -> &'static [&'static str] {
        &["path"]
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let skip = arguments.get("skip").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let lines = arguments
            .get("lines")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize);

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                return Ok(ToolResult::error("", format!("Failed to read {path}: {e}")));
            }
        };

        let output = if skip == 0 && lines.is_none() {
            truncate_chars(&content, MAX_READ_CHARS)
        } else {
            let file_lines: Vec<&str> = content.lines().collect();
            if skip >= file_lines.len() {
                return Ok(ToolResult::error(
                    "",
                    format!(
                        "Skip value {skip} exceeds file length ({} lines)",
                        file_lines.len()
                    ),
                ));
            }
            let end = match lines {
                Some(n) => (skip + n).min(file_lines.len()),
                None => file_lines.len(),
            };
            truncate_chars(&file_lines[skip..end].join("\n"), MAX_READ_CHARS)
        };

        Ok(ToolResult::ok("", output))
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
