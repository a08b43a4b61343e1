//! Capability registry: the tools the dispatcher may route a question to.
//!
//! Each tool declares a name, a natural-language description and a parameter
//! schema. The dispatcher only ever resolves a generated tool name through
//! `ToolRegistry::get`; generated output is never executed.
//!
//! Tool failures are values, not errors: `execute` always returns a
//! `ToolOutcome`, and the caller decides how to surface a failure.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::embeddings::Embedder;
use crate::llm_client::AnswerGenerator;

pub mod document_tools;
pub mod prompts;
pub mod resume_tools;

// ────────────────────────────────────────────────────────────────────────────
// Parameter schema
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
}

impl ParamType {
    fn json_type(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
        }
    }
}

/// One argument a tool accepts. The document text is always supplied
/// implicitly and is never part of the schema.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
    pub required: bool,
}

/// Renders a parameter list as a JSON-schema object.
pub fn parameter_schema(params: &[ParamSpec]) -> Value {
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| {
            (
                p.name.to_string(),
                json!({ "type": p.kind.json_type(), "description": p.description }),
            )
        })
        .collect();
    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Arguments that passed validation against a tool's schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(Map<String, Value>);

impl ToolArguments {
    /// Trimmed, non-empty string argument.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Integer argument. Numeric strings are accepted since models often quote numbers.
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Checks raw generated arguments against a schema.
/// Unknown keys are dropped; missing required keys and wrong types are rejected.
pub fn validate_arguments(params: &[ParamSpec], raw: &Value) -> Result<ToolArguments, ToolError> {
    let empty = Map::new();
    let object = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(ToolError::new(
                ToolErrorKind::InvalidArguments,
                format!("arguments must be an object, got {other}"),
            ))
        }
    };

    let mut accepted = Map::new();
    for param in params {
        let value = object.get(param.name).filter(|v| !v.is_null());
        let Some(value) = value else {
            if param.required {
                return Err(ToolError::new(
                    ToolErrorKind::InvalidArguments,
                    format!("missing required argument '{}'", param.name),
                ));
            }
            continue;
        };

        let valid = match param.kind {
            ParamType::String => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            ParamType::Integer => {
                value.as_i64().is_some()
                    || value.as_str().is_some_and(|s| s.trim().parse::<i64>().is_ok())
            }
        };
        if !valid {
            if param.required {
                return Err(ToolError::new(
                    ToolErrorKind::InvalidArguments,
                    format!(
                        "argument '{}' must be a non-empty {}",
                        param.name,
                        param.kind.json_type()
                    ),
                ));
            }
            warn!(argument = param.name, "dropping malformed optional argument");
            continue;
        }
        accepted.insert(param.name.to_string(), value.clone());
    }

    Ok(ToolArguments(accepted))
}

// ────────────────────────────────────────────────────────────────────────────
// Outcomes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidArguments,
    EmptyDocument,
    Retrieval,
    Generation,
    MalformedOutput,
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToolErrorKind::InvalidArguments => "invalid arguments",
            ToolErrorKind::EmptyDocument => "no content",
            ToolErrorKind::Retrieval => "retrieval failed",
            ToolErrorKind::Generation => "generation failed",
            ToolErrorKind::MalformedOutput => "malformed output",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Completed(String),
    Failed(ToolError),
}

impl ToolOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutcome::Failed(_))
    }
}

/// What a single request did with a tool. Logged, never persisted.
#[derive(Debug, Clone)]
pub struct ToolInvocationRecord {
    pub tool: &'static str,
    /// Marker prefixed to the failure text, e.g. `Summary Error`.
    pub error_marker: &'static str,
    pub arguments: Value,
    pub outcome: ToolOutcome,
}

impl ToolInvocationRecord {
    /// Human-readable failure text, prefixed with the tool's error marker.
    pub fn failure_text(&self) -> Option<String> {
        match &self.outcome {
            ToolOutcome::Failed(err) => Some(format!("{}: {}", self.error_marker, err)),
            ToolOutcome::Completed(_) => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tool trait + registry
// ────────────────────────────────────────────────────────────────────────────

/// Everything a tool may use while it runs.
pub struct ToolContext<'a> {
    pub document_text: &'a str,
    pub generator: &'a dyn AnswerGenerator,
    pub embedder: &'a dyn Embedder,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn error_marker(&self) -> &'static str;

    fn parameters(&self) -> &'static [ParamSpec] {
        &[]
    }

    async fn invoke(&self, ctx: &ToolContext<'_>, args: &ToolArguments) -> Result<String, ToolError>;
}

/// Validates arguments and runs the tool, folding every failure into the outcome.
pub async fn execute(tool: &dyn Tool, ctx: &ToolContext<'_>, raw_arguments: &Value) -> ToolInvocationRecord {
    let outcome = match validate_arguments(tool.parameters(), raw_arguments) {
        Ok(args) => match tool.invoke(ctx, &args).await {
            Ok(text) => ToolOutcome::Completed(text),
            Err(err) => ToolOutcome::Failed(err),
        },
        Err(err) => ToolOutcome::Failed(err),
    };

    match &outcome {
        ToolOutcome::Completed(text) => info!(
            tool = tool.name(),
            arguments = %raw_arguments,
            chars = text.len(),
            "tool completed"
        ),
        ToolOutcome::Failed(err) => warn!(
            tool = tool.name(),
            arguments = %raw_arguments,
            kind = ?err.kind,
            "tool failed: {}",
            err.message
        ),
    }

    ToolInvocationRecord {
        tool: tool.name(),
        error_marker: tool.error_marker(),
        arguments: raw_arguments.clone(),
        outcome,
    }
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five document and resume capabilities.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(document_tools::SummarizeTool));
        registry.register(Arc::new(document_tools::McqTool));
        registry.register(Arc::new(document_tools::KeyPointsTool));
        registry.register(Arc::new(resume_tools::ExtractResumeTool));
        registry.register(Arc::new(resume_tools::GapAnalysisTool));
        registry
    }

    /// Adds a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The catalog shown to the selection step.
    pub fn catalog(&self) -> Value {
        Value::Array(
            self.tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": parameter_schema(t.parameters()),
                    })
                })
                .collect(),
        )
    }
}
