//! Glob tool — pattern-based file search, newest first.

use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};

/// Cap on returned matches to keep output bounded.
const MAX_RESULTS: usize = 200;

pub struct GlobTool {
    root: PathBuf,
}

impl GlobTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Tool for GlobTool {
    fn name(&self) -> &str {
        "glob"
    }

    fn description(&self) -> &str {
        "Find files matching a glob pattern such as '**/*.rs' or 'src/*.toml'. Results are sorted by modification time, newest first."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern to match, relative to the search directory"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search in. Defaults to the workspace root"
                }
            },
            "required": ["pattern"]
        })
    }

    fn path_parameters(&self) -> &'static [&'static str] {
        &["path"]
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let pattern = arguments
            .get("pattern")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'pattern' argument".into()))?;

        let base = arguments
            .get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.root.clone());

        if let Some(msg) = reject_pattern(pattern) {
            return Ok(ToolResult::error("", msg));
        }

        let Some(full) = base.join(pattern).to_str().map(String::from) else {
            return Ok(ToolResult::error(
                "",
                format!("Pattern is not valid UTF-8 under {}", base.display()),
            ));
        };

        let entries = match glob::glob(&full) {
            Ok(entries) => entries,
            Err(e) => {
                return Ok(ToolResult::error(
                    "",
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        };

        let mut matches: Vec<(SystemTime, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .map(|path| (modified_time(&path), path))
            .collect();

        if matches.is_empty() {
            return Ok(ToolResult::ok(
                "",
                format!(
                    "No files found matching pattern '{pattern}' in {}",
                    base.display()
                ),
            ));
        }

        matches.sort_by(|a, b| b.0.cmp(&a.0));
        matches.truncate(MAX_RESULTS);

        let listing: Vec<String> = matches
            .iter()
            .map(|(_, path)| path.display().to_string())
            .collect();

        Ok(ToolResult::ok("", listing.join("\n")))
    }
}

/// Patterns must stay inside the search directory. Absolute patterns and
/// parent components would bypass the containment the base path already
/// went through.
pub(crate) fn reject_pattern(pattern: &str) -> Option<String> {
    let as_path = Path::new(pattern);
    if as_path.is_absolute() {
        return Some(format!(
            "Pattern must be relative to the search directory, got absolute pattern '{pattern}'"
        ));
    }
    if as_path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Some(format!(
            "Pattern must not contain '..' components, got '{pattern}'"
        ));
    }
    None
}

fn modified_time(path: &Path) -> SystemTime {
    path.metadata()
        .and_then(|m| m.modified())
        .unwrap_or(UNIX_EPOCH)
}
