//! Path resolution — filesystem sandboxing to a single workspace root.
//!
//! Every path a tool receives is resolved through [`Sandbox::resolve`]
//! before any filesystem access happens. Relative paths are joined onto
//! the root, `.` and `..` components are normalized, and symlinks are
//! resolved, so the containment check runs against the real target.

use std::path::{Component, Path, PathBuf};

/// Error returned when sandbox construction or path resolution fails.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("path '{path}' escapes the sandbox root")]
    EscapesRoot { path: String },

    #[error("sandbox root '{path}' is not an existing directory")]
    NotADirectory { path: String },

    #[error("failed to resolve path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// A filesystem sandbox rooted at a single directory.
///
/// The root is canonicalized once at construction. [`Sandbox::resolve`]
/// maps tool-supplied path strings to absolute paths that are guaranteed
/// to stay inside the root.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a sandbox rooted at `root`. The directory must already exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SandboxError::NotADirectory {
                path: root.display().to_string(),
            });
        }
        let root = root
            .canonicalize()
            .map_err(|e| SandboxError::CanonicalizeFailed {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { root })
    }

    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tool-supplied path to an absolute path inside the root.
    ///
    /// Relative paths are joined onto the root. `.` and `..` components
    /// are normalized, and symlinks in the existing portion of the path
    /// are resolved before the containment check, so neither traversal
    /// nor symlink indirection can reach outside the root. The target
    /// itself does not have to exist yet (writes create new files).
    pub fn resolve(&self, candidate: &str) -> Result<PathBuf, SandboxError> {
        let raw = Path::new(candidate);
        let joined = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.root.join(raw)
        };

        let resolved = resolve_symlinks(&normalize(&joined), candidate)?;

        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(SandboxError::EscapesRoot {
                path: candidate.to_string(),
            })
        }
    }
}

/// Remove `.` components and apply `..` components lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest ancestor of `path` present in the filesystem
/// and re-append the components that do not exist yet.
///
/// A dangling symlink counts as present, so canonicalization fails on it
/// rather than letting a later write follow the link to an unchecked
/// location.
fn resolve_symlinks(path: &Path, candidate: &str) -> Result<PathBuf, SandboxError> {
    let mut existing = path.to_path_buf();
    let mut remainder = Vec::new();

    while existing.symlink_metadata().is_err() {
        match existing.file_name() {
            Some(name) => {
                remainder.push(name.to_os_string());
                existing.pop();
            }
            None => {
                return Err(SandboxError::CanonicalizeFailed {
                    path: candidate.to_string(),
                    reason: "no existing ancestor".into(),
                });
            }
        }
    }

    let mut resolved = existing
        .canonicalize()
        .map_err(|e| SandboxError::CanonicalizeFailed {
            path: candidate.to_string(),
            reason: e.to_string(),
        })?;
    for name in remainder.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sandbox() -> (tempfile::TempDir, Sandbox) {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        (dir, sandbox)
    }

    #[test]
    fn relative_path_resolves_inside_root() {
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve("notes.txt").unwrap();
        assert_eq!(resolved, sandbox.root().join("notes.txt"));
    }

    #[test]
    fn nested_relative_path_resolves() {
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve("src/main.rs").unwrap();
        assert_eq!(resolved, sandbox.root().join("src/main.rs"));
    }

    #[test]
    fn absolute_path_inside_root_accepted() {
        let (_dir, sandbox) = sandbox();
        let absolute = sandbox.root().join("file.txt");
        let resolved = sandbox.resolve(absolute.to_str().unwrap()).unwrap();
        assert_eq!(resolved, absolute);
    }

    #[test]
    fn absolute_path_outside_root_rejected() {
        let (_dir, sandbox) = sandbox();
        let result = sandbox.resolve("/etc/passwd");
        assert!(matches!(result, Err(SandboxError::EscapesRoot { .. })));
    }

    #[test]
    fn parent_traversal_rejected() {
        let (_dir, sandbox) = sandbox();
        let result = sandbox.resolve("../outside.txt");
        assert!(matches!(result, Err(SandboxError::EscapesRoot { .. })));
    }

    #[test]
    fn deep_traversal_rejected() {
        let (_dir, sandbox) = sandbox();
        let result = sandbox.resolve("a/b/../../../../etc/passwd");
        assert!(matches!(result, Err(SandboxError::EscapesRoot { .. })));
    }

    #[test]
    fn interior_traversal_that_stays_inside_accepted() {
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve("sub/../file.txt").unwrap();
        assert_eq!(resolved, sandbox.root().join("file.txt"));
    }

    #[test]
    fn nonexistent_target_resolves_for_writes() {
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve("new_dir/new_file.txt").unwrap();
        assert_eq!(resolved, sandbox.root().join("new_dir/new_file.txt"));
    }

    #[test]
    fn dot_resolves_to_root() {
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve(".").unwrap();
        assert_eq!(resolved, sandbox.root());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_pointing_outside_rejected() {
        let (_dir, sandbox) = sandbox();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), sandbox.root().join("link")).unwrap();

        let result = sandbox.resolve("link/secret.txt");
        assert!(matches!(result, Err(SandboxError::EscapesRoot { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_pointing_inside_resolves_to_target() {
        let (_dir, sandbox) = sandbox();
        fs::create_dir(sandbox.root().join("real")).unwrap();
        std::os::unix::fs::symlink(sandbox.root().join("real"), sandbox.root().join("alias"))
            .unwrap();

        let resolved = sandbox.resolve("alias/file.txt").unwrap();
        assert_eq!(resolved, sandbox.root().join("real/file.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_refused() {
        let (_dir, sandbox) = sandbox();
        std::os::unix::fs::symlink("/nonexistent/target", sandbox.root().join("broken")).unwrap();

        let result = sandbox.resolve("broken");
        assert!(matches!(
            result,
            Err(SandboxError::CanonicalizeFailed { .. })
        ));
    }

    #[test]
    fn missing_root_rejected() {
        let result = Sandbox::new("/definitely/not/a/real/dir");
        assert!(matches!(result, Err(SandboxError::NotADirectory { .. })));
    }

    #[test]
    fn root_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        assert_eq!(sandbox.root(), dir.path().canonicalize().unwrap());
    }
}
