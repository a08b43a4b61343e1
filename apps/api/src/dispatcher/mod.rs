//! Tool Dispatcher. Decides whether a question needs a capability, runs it,
//! and synthesizes the final answer.
//!
//! Flow: Idle → ToolSelection → ToolExecution (0..1) → Synthesis → Done.
//! Any generator failure during selection or synthesis ends the request with
//! a `DispatchError`. Tool failures never do: they travel to synthesis as a
//! `ToolOutcome::Failed` and the configured `ToolFailurePolicy` decides how
//! the final answer treats them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dispatcher::prompts::{
    COMPLETED_ANALYSIS_SECTION, FAILED_ANALYSIS_SECTION, NO_ANALYSIS_SECTION, SELECTION_PROMPT_TEMPLATE,
    SELECTION_SYSTEM, SYNTHESIS_PROMPT_TEMPLATE, SYNTHESIS_SYSTEM,
};
use crate::embeddings::Embedder;
use crate::llm_client::prompts::{fill_template, GROUNDING_INSTRUCTION};
use crate::llm_client::{generate_json, AnswerGenerator, LlmError};
use crate::tools::{self, Tool, ToolContext, ToolInvocationRecord, ToolOutcome, ToolRegistry};

pub mod prompts;

/// Characters of the document shown to the selection step.
const SELECTION_PREVIEW_CHARS: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Idle,
    ToolSelection,
    ToolExecution,
    Synthesis,
    Done,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchStage::Idle => "idle",
            DispatchStage::ToolSelection => "tool selection",
            DispatchStage::ToolExecution => "tool execution",
            DispatchStage::Synthesis => "synthesis",
            DispatchStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct DispatchError {
    pub stage: DispatchStage,
    #[source]
    pub source: LlmError,
}

/// How synthesis treats a failed tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolFailurePolicy {
    /// The answer must state that the requested analysis could not be completed.
    #[default]
    Disclose,
    /// The failure is dropped and the answer comes from the document alone.
    Suppress,
}

impl FromStr for ToolFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disclose" => Ok(ToolFailurePolicy::Disclose),
            "suppress" => Ok(ToolFailurePolicy::Suppress),
            other => Err(format!(
                "TOOL_FAILURE_POLICY must be 'disclose' or 'suppress', got '{other}'"
            )),
        }
    }
}

/// The selection step's raw JSON verdict.
#[derive(Debug, Default, Deserialize)]
struct ToolSelection {
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    arguments: Value,
}

/// A finished dispatch: the user-facing text plus what was invoked on the way.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub invocation: Option<ToolInvocationRecord>,
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    generator: Arc<dyn AnswerGenerator>,
    embedder: Arc<dyn Embedder>,
    failure_policy: ToolFailurePolicy,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        generator: Arc<dyn AnswerGenerator>,
        embedder: Arc<dyn Embedder>,
        failure_policy: ToolFailurePolicy,
    ) -> Self {
        Self {
            registry,
            generator,
            embedder,
            failure_policy,
        }
    }

    /// Runs one full answer cycle for a document and question.
    pub async fn answer(&self, document_text: &str, question: &str) -> Result<Answer, DispatchError> {
        let mut stage = DispatchStage::Idle;

        advance(&mut stage, DispatchStage::ToolSelection);
        let selected = self.select_tool(document_text, question).await?;

        let invocation = match selected {
            Some((tool, arguments)) => {
                advance(&mut stage, DispatchStage::ToolExecution);
                let ctx = ToolContext {
                    document_text,
                    generator: self.generator.as_ref(),
                    embedder: self.embedder.as_ref(),
                };
                Some(tools::execute(tool.as_ref(), &ctx, &arguments).await)
            }
            None => None,
        };

        advance(&mut stage, DispatchStage::Synthesis);
        let prompt = compose_synthesis_prompt(
            document_text,
            question,
            invocation.as_ref(),
            self.failure_policy,
        );
        let text = self
            .generator
            .generate(&prompt, SYNTHESIS_SYSTEM)
            .await
            .map_err(|source| DispatchError { stage, source })?;

        if text.trim().is_empty() {
            return Err(DispatchError {
                stage,
                source: LlmError::EmptyContent,
            });
        }

        if let Some(leaked) = self.registry.names().into_iter().find(|n| text.contains(n)) {
            warn!(tool = leaked, "final answer mentions an internal tool name");
        }

        advance(&mut stage, DispatchStage::Done);
        match &invocation {
            Some(record) => info!(
                tool = record.tool,
                arguments = %record.arguments,
                tool_failed = record.outcome.is_failure(),
                chars = text.len(),
                "answer produced"
            ),
            None => info!(tool = "none", chars = text.len(), "answer produced"),
        }

        Ok(Answer {
            text: text.trim().to_string(),
            invocation,
        })
    }

    /// Asks the generator to pick zero or one registered tool.
    /// Unparseable output and unknown names both mean "no tool".
    async fn select_tool(
        &self,
        document_text: &str,
        question: &str,
    ) -> Result<Option<(Arc<dyn Tool>, Value)>, DispatchError> {
        if self.registry.is_empty() {
            return Ok(None);
        }

        let catalog = self.registry.catalog().to_string();
        let prompt = fill_template(
            SELECTION_PROMPT_TEMPLATE,
            &[
                ("catalog", catalog.as_str()),
                ("document_preview", preview(document_text, SELECTION_PREVIEW_CHARS)),
                ("question", question),
            ],
        );

        let selection: ToolSelection =
            match generate_json(self.generator.as_ref(), &prompt, SELECTION_SYSTEM).await {
                Ok(selection) => selection,
                Err(LlmError::Parse(e)) => {
                    warn!("tool selection returned unparseable JSON, answering directly: {e}");
                    ToolSelection::default()
                }
                Err(source) => {
                    return Err(DispatchError {
                        stage: DispatchStage::ToolSelection,
                        source,
                    })
                }
            };

        let Some(name) = selection
            .tool
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && !n.eq_ignore_ascii_case("none"))
        else {
            debug!("no tool selected");
            return Ok(None);
        };

        match self.registry.get(&name) {
            Some(tool) => {
                info!(tool = tool.name(), "tool selected");
                Ok(Some((tool, selection.arguments)))
            }
            None => {
                warn!(tool = %name, "selection named an unregistered tool, answering directly");
                Ok(None)
            }
        }
    }
}

fn advance(stage: &mut DispatchStage, next: DispatchStage) {
    debug!(from = %stage, to = %next, "dispatch stage");
    *stage = next;
}

/// The first `max_chars` characters of `text`.
fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Builds the final prompt from the question, the document and the tool outcome.
pub fn compose_synthesis_prompt(
    document_text: &str,
    question: &str,
    invocation: Option<&ToolInvocationRecord>,
    policy: ToolFailurePolicy,
) -> String {
    let analysis_section = match invocation {
        None => NO_ANALYSIS_SECTION.to_string(),
        Some(record) => match (&record.outcome, policy) {
            (ToolOutcome::Completed(result), _) => {
                fill_template(COMPLETED_ANALYSIS_SECTION, &[("result", result)])
            }
            (ToolOutcome::Failed(_), ToolFailurePolicy::Disclose) => {
                let failure = record.failure_text().unwrap_or_default();
                fill_template(FAILED_ANALYSIS_SECTION, &[("failure", failure.as_str())])
            }
            (ToolOutcome::Failed(_), ToolFailurePolicy::Suppress) => NO_ANALYSIS_SECTION.to_string(),
        },
    };

    fill_template(
        SYNTHESIS_PROMPT_TEMPLATE,
        &[
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("question", question),
            ("analysis_section", analysis_section.as_str()),
            ("document", document_text),
        ],
    )
}
