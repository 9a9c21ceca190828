//! # Ferrocode Tools
//!
//! The built-in tool suite: file access, search, shell execution, and task
//! tracking, plus the dispatcher that runs them. Handlers receive file-system
//! paths already resolved into the sandbox by the dispatcher; they never
//! interpret raw model-supplied paths themselves.

pub mod bash;
pub mod dispatch;
pub mod edit;
pub mod glob;
pub mod grep;
pub mod ls;
pub mod multiedit;
pub mod read;
pub mod todo;
pub mod write;

pub use dispatch::Dispatcher;

use std::path::Path;

use ferrocode_core::error::ToolError;
use ferrocode_core::tool::ToolRegistry;

use crate::bash::BashTool;
use crate::edit::EditTool;
use crate::glob::GlobTool;
use crate::grep::GrepTool;
use crate::ls::LsTool;
use crate::multiedit::MultieditTool;
use crate::read::ReadTool;
use crate::todo::TodoTool;
use crate::write::WriteTool;

/// Build a registry holding the full built-in tool suite. `root` is the
/// workspace directory the path-taking tools fall back to when no path
/// argument is given.
pub fn default_registry(root: &Path) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ReadTool))?;
    registry.register(Box::new(WriteTool))?;
    registry.register(Box::new(EditTool))?;
    registry.register(Box::new(MultieditTool))?;
    registry.register(Box::new(LsTool::new(root.to_path_buf())))?;
    registry.register(Box::new(GlobTool::new(root.to_path_buf())))?;
    registry.register(Box::new(GrepTool::new(root.to_path_buf())))?;
    registry.register(Box::new(BashTool::new(root.to_path_buf())))?;
    registry.register(Box::new(TodoTool::new()))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_holds_the_full_suite() {
        let registry = default_registry(Path::new("/tmp")).unwrap();
        assert_eq!(
            registry.names(),
            vec!["bash", "edit", "glob", "grep", "ls", "multiedit", "read", "todo", "write"]
        );
    }
}
