//! Security layer for Ferrocode — filesystem sandboxing and audit logging.
//!
//! Provides:
//! - **Sandbox**: Resolves tool-supplied paths against a single workspace
//!   root and rejects anything that escapes it
//! - **Audit log**: Append-only JSON-lines record of every filesystem
//!   mutation the agent performs

pub mod audit;
pub mod sandbox;

pub use audit::{AuditError, AuditLog, AuditRecord};
pub use sandbox::{Sandbox, SandboxError};
