//! Tool dispatch — the single pipeline every tool call goes through.
//!
//! Lookup, schema validation, sandbox path resolution, execution, and
//! audit logging happen here in that order. Every failure along the way
//! becomes an error `ToolResult` carried back to the model; a tool call
//! can never take the process down.

use std::path::PathBuf;

use ferrocode_core::provider::ToolDefinition;
use ferrocode_core::tool::{ToolCall, ToolRegistry, ToolResult};
use ferrocode_security::{AuditLog, AuditRecord, Sandbox};
use serde_json::Value;
use tracing::{debug, warn};

/// Routes tool calls from the model to registered tool handlers.
pub struct Dispatcher {
    registry: ToolRegistry,
    sandbox: Sandbox,
    audit: AuditLog,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, sandbox: Sandbox, audit: AuditLog) -> Self {
        Self {
            registry,
            sandbox,
            audit,
        }
    }

    /// Schemas for every registered tool, for the model request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Execute one tool call to completion.
    ///
    /// The returned result always carries the originating `call_id`.
    /// Unknown tools, invalid arguments, sandbox violations, handler
    /// errors, and audit failures are all reported as error results.
    /// A successful mutating call appends exactly one audit record
    /// before its success is reported; if the append fails the result
    /// is converted to a failure.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.registry.get(&call.name) else {
            return ToolResult::error(&call.id, format!("Unknown tool: {}", call.name));
        };

        let mut arguments = call.arguments.clone();

        if let Err(message) = validate_arguments(&tool.parameters_schema(), &arguments) {
            return ToolResult::error(&call.id, message);
        }

        // Resolve declared path parameters through the sandbox and rewrite
        // them in place so handlers only ever see contained absolute paths.
        let mut first_path: Option<PathBuf> = None;
        for param in tool.path_parameters() {
            let Some(raw) = arguments.get(*param).and_then(Value::as_str) else {
                continue;
            };
            match self.sandbox.resolve(raw) {
                Ok(resolved) => {
                    if first_path.is_none() {
                        first_path = Some(resolved.clone());
                    }
                    arguments[*param] = Value::String(resolved.to_string_lossy().into_owned());
                }
                Err(e) => {
                    return ToolResult::error(&call.id, e.to_string());
                }
            }
        }

        let mutating = tool.is_mutating(&arguments);
        debug!(tool = %call.name, mutating, "Dispatching tool call");

        let mut result = match tool.execute(arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                return ToolResult::error(&call.id, e.to_string());
            }
        };
        result.call_id = call.id.clone();

        if mutating && result.success {
            let summary = arguments
                .get("summary")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| first_line(&result.output));
            let record = AuditRecord::new(&call.name, first_path, summary);
            if let Err(e) = self.audit.record(&record) {
                warn!(tool = %call.name, error = %e, "Audit append failed, reporting mutation as failed");
                return ToolResult::error(
                    &call.id,
                    format!("Mutation applied but audit append failed: {e}"),
                );
            }
        }

        result
    }
}

/// Check `arguments` against a tool's declared JSON schema: object shape,
/// required keys present, declared primitive types respected. Unknown keys
/// pass through.
fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), String> {
    let Some(object) = arguments.as_object() else {
        return Err("Arguments must be a JSON object".into());
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(name) {
                return Err(format!("Missing required parameter '{name}'"));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, value) in object {
            let Some(expected) = properties
                .get(name)
                .and_then(|prop| prop.get("type"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            if !type_matches(expected, value) {
                return Err(format!("Parameter '{name}' must be of type {expected}"));
            }
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "number" => value.is_number(),
        "integer" => {
            value.as_i64().is_some()
                || value.as_u64().is_some()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => true,
    }
}

fn first_line(output: &str) -> String {
    output.lines().next().unwrap_or("").chars().take(120).collect()
}
