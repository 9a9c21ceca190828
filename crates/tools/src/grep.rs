//! Grep tool — regex search across workspace files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};
use regex::RegexBuilder;

use crate::glob::reject_pattern;

pub struct GrepTool {
    root: PathBuf,
}

impl GrepTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search file contents with a regular expression. Supports full regex syntax, file filtering by glob or type, and content, files_with_matches, or count output modes."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "The regular expression pattern to search for in file contents"
                },
                "path": {
                    "type": "string",
                    "description": "File or directory to search in. Defaults to the workspace root"
                },
                "include": {
                    "type": "string",
                    "description": "Glob pattern to filter files (e.g. '*.js', 'src/**/*.rs')"
                },
                "file_type": {
                    "type": "string",
                    "description": "File type to search (e.g. 'py', 'js', 'ts', 'rust', 'go', 'java')"
                },
                "ignore_case": {
                    "type": "boolean",
                    "description": "Case insensitive search. Default is false"
                },
                "mode": {
                    "type": "string",
                    "enum": ["content", "files_with_matches", "count"],
                    "description": "Output mode: 'content' shows matching lines, 'files_with_matches' shows file paths, 'count' shows match counts"
                },
                "before": {
                    "type": "integer",
                    "description": "Number of lines to show before each match (content mode)"
                },
                "after": {
                    "type": "integer",
                    "description": "Number of lines to show after each match (content mode)"
                },
                "context": {
                    "type": "integer",
                    "description": "Number of lines to show before and after each match (content mode)"
                },
                "line_number": {
                    "type": "boolean",
                    "description": "Show line numbers in output (content mode)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Limit output to the first N result lines"
                },
                "multiline": {
                    "type": "boolean",
                    "description": "Allow patterns to span lines. Default is false"
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
        let include = arguments.get("include").and_then(|v| v.as_str());
        let file_type = arguments.get("file_type").and_then(|v| v.as_str());
        let ignore_case = arguments
            .get("ignore_case")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let mode = arguments
            .get("mode")
            .and_then(|v| v.as_str())
            .unwrap_or("files_with_matches");
        let before = arguments.get("before").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let after = arguments.get("after").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let context = arguments.get("context").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let line_number = arguments
            .get("line_number")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let limit = arguments
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize);
        let multiline = arguments
            .get("multiline")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !matches!(mode, "content" | "files_with_matches" | "count") {
            return Ok(ToolResult::error(
                "",
                format!("Unknown mode '{mode}'. Expected 'content', 'files_with_matches', or 'count'"),
            ));
        }

        if !base.exists() {
            return Ok(ToolResult::error(
                "",
                format!("Path not found: {}", base.display()),
            ));
        }

        let regex = match RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .multi_line(multiline)
            .dot_matches_new_line(multiline)
            .build()
        {
            Ok(regex) => regex,
            Err(e) => {
                return Ok(ToolResult::error(
                    "",
                    format!("Invalid regex pattern '{pattern}': {e}"),
                ));
            }
        };

        let files = match candidate_files(&base, include, file_type) {
            Ok(files) => files,
            Err(msg) => return Ok(ToolResult::error("", msg)),
        };

        // `context` shorthand expands to symmetric before/after.
        let (before, after) = if context > 0 {
            (context, context)
        } else {
            (before, after)
        };

        let mut results = Vec::new();
        let mut matched_files = Vec::new();

        for file in &files {
            // Binary and otherwise unreadable files are skipped.
            let Ok(content) = std::fs::read_to_string(file) else {
                continue;
            };
            let display = file.display().to_string();

            if multiline {
                let hits: Vec<&str> = regex.find_iter(&content).map(|m| m.as_str()).collect();
                if hits.is_empty() {
                    continue;
                }
                match mode {
                    "content" => {
                        for hit in &hits {
                            results.push(format!("{display}: {hit}"));
                        }
                    }
                    "count" => results.push(format!("{display}: {}", hits.len())),
                    _ => {}
                }
                matched_files.push(display);
                continue;
            }

            let lines: Vec<&str> = content.lines().collect();
            let hit_indices: Vec<usize> = (0..lines.len())
                .filter(|&i| regex.is_match(lines[i]))
                .collect();
            if hit_indices.is_empty() {
                continue;
            }
            match mode {
                "content" => {
                    for &i in &hit_indices {
                        for j in i.saturating_sub(before)..i {
                            let prefix = if line_number {
                                format!("{}-", j + 1)
                            } else {
                                String::new()
                            };
                            results.push(format!("{display}:{prefix}{}", lines[j]));
                        }
                        let prefix = if line_number {
                            format!("{}:", i + 1)
                        } else {
                            String::new()
                        };
                        results.push(format!("{display}:{prefix}{}", lines[i]));
                        let end = (i + 1 + after).min(lines.len());
                        for j in (i + 1)..end {
                            let prefix = if line_number {
                                format!("{}-", j + 1)
                            } else {
                                String::new()
                            };
                            results.push(format!("{display}:{prefix}{}", lines[j]));
                        }
                    }
                }
                "count" => {
                    let total: usize = lines.iter().map(|line| regex.find_iter(line).count()).sum();
                    results.push(format!("{display}: {total}"));
                }
                _ => {}
            }
            matched_files.push(display);
        }

        let mut output = if mode == "files_with_matches" {
            matched_files
        } else {
            results
        };

        if output.is_empty() {
            return Ok(ToolResult::ok(
                "",
                format!("No matches found for pattern '{pattern}'"),
            ));
        }

        if let Some(limit) = limit {
            output.truncate(limit);
        }

        Ok(ToolResult::ok("", output.join("\n")))
    }
}

/// Select the files a search will scan: a single file, an include glob,
/// a file-type extension filter, or every visible file under the base.
fn candidate_files(
    base: &Path,
    include: Option<&str>,
    file_type: Option<&str>,
) -> Result<Vec<PathBuf>, String> {
    if base.is_file() {
        return Ok(vec![base.to_path_buf()]);
    }

    let mut files = Vec::new();
    if let Some(include) = include {
        if let Some(msg) = reject_pattern(include) {
            return Err(msg);
        }
        let full = base
            .join(include)
            .to_str()
            .map(String::from)
            .ok_or_else(|| format!("Include pattern is not valid UTF-8 under {}", base.display()))?;
        let entries =
            glob::glob(&full).map_err(|e| format!("Invalid glob pattern '{include}': {e}"))?;
        files.extend(entries.filter_map(|entry| entry.ok()).filter(|p| p.is_file()));
    } else if let Some(file_type) = file_type {
        let extensions = extensions_for(file_type);
        let mut all = Vec::new();
        collect_visible_files(base, &mut all)
            .map_err(|e| format!("Failed to search {}: {e}", base.display()))?;
        files.extend(all.into_iter().filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        }));
    } else {
        collect_visible_files(base, &mut files)
            .map_err(|e| format!("Failed to search {}: {e}", base.display()))?;
    }

    files.sort();
    Ok(files)
}

/// Known type aliases and the extensions they cover. Unrecognized types
/// are treated as a literal extension.
fn extensions_for(file_type: &str) -> Vec<&str> {
    match file_type {
        "py" => vec!["py"],
        "js" => vec!["js"],
        "ts" => vec!["ts", "tsx"],
        "java" => vec!["java"],
        "go" => vec!["go"],
        "rust" => vec!["rs"],
        "cpp" => vec!["cpp", "cxx", "cc", "c"],
        "h" => vec!["h", "hpp"],
        other => vec![other],
    }
}

/// Walk `dir` depth-first collecting regular files. Hidden entries are
/// skipped.
fn collect_visible_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_visible_files(&entry.path(), files)?;
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}
