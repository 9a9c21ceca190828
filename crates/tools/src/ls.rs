//! Ls tool — recursive file listing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};

pub struct LsTool {
    root: PathBuf,
}

impl LsTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Tool for LsTool {
    fn name(&self) -> &str {
        "ls"
    }

    fn description(&self) -> &str {
        "List all files under a directory recursively. Paths are shown relative to the workspace root."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list, relative to the workspace root. Defaults to the root itself"
                }
            },
            "required": []
        })
    }

    fn path_parameters(&self) -> &'static [&'static str] {
        &["path"]
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments
            .get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.root.clone());

        if !path.is_dir() {
            return Ok(ToolResult::error(
                "",
                format!("Directory not found: {}", path.display()),
            ));
        }

        let mut files = Vec::new();
        if let Err(e) = collect_files(&path, &mut files) {
            return Ok(ToolResult::error(
                "",
                format!("Failed to list {}: {e}", path.display()),
            ));
        }

        if files.is_empty() {
            return Ok(ToolResult::ok(
                "",
                format!("No files found in {}", path.display()),
            ));
        }

        files.sort();
        let listing: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(&self.root).unwrap_or(f).display().to_string())
            .collect();

        Ok(ToolResult::ok("", listing.join("\n")))
    }
}

/// Walk `dir` depth-first collecting regular files. Symlinks are skipped.
fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> (tempfile::TempDir, LsTool) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, LsTool::new(root))
    }

    #[tokio::test]
    async fn lists_files_relative_to_root_sorted() {
        let (_dir, tool) = workspace();
        let root = tool.root.clone();
        std::fs::create_dir(root.join("sub")).unwrap();
        std::fs::write(root.join("b.txt"), "").unwrap();
        std::fs::write(root.join("a.txt"), "").unwrap();
        std::fs::write(root.join("sub/c.txt"), "").unwrap();

        let result = tool.execute(serde_json::json!({})).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "a.txt\nb.txt\nsub/c.txt");
    }

    #[tokio::test]
    async fn lists_subdirectory() {
        let (_dir, tool) = workspace();
        let root = tool.root.clone();
        std::fs::create_dir(root.join("sub")).unwrap();
        std::fs::write(root.join("top.txt"), "").unwrap();
        std::fs::write(root.join("sub/inner.txt"), "").unwrap();

        let result = tool
            .execute(serde_json::json!({"path": root.join("sub").to_str().unwrap()}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.output, "sub/inner.txt");
    }

    #[tokio::test]
    async fn empty_directory_reports_no_files() {
        let (_dir, tool) = workspace();

        let result = tool.execute(serde_json::json!({})).await.unwrap();

        assert!(result.success);
        assert!(result.output.starts_with("No files found in"));
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let (_dir, tool) = workspace();
        let missing = tool.root.join("nope");

        let result = tool
            .execute(serde_json::json!({"path": missing.to_str().unwrap()}))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.output.contains("Directory not found"));
    }
}
