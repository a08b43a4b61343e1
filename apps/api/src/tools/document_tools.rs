//! Retrieval-backed document tools: summarize, MCQs, key points.
//!
//! Flow per call: chunk (500 / 100 overlap) → embed into a fresh index →
//! top-k retrieval → fill template → one generation call. The index is
//! dropped when the call returns.

use async_trait::async_trait;
use tracing::debug;

use crate::document::chunking::{
    chunk_text, ChunkConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
use crate::document::index::SimilarityIndex;
use crate::llm_client::prompts::{fill_template, GROUNDING_INSTRUCTION};
use crate::tools::prompts::{
    DOCUMENT_TOOL_SYSTEM, KEY_POINTS_PROMPT_TEMPLATE, KEY_POINTS_QUERY, MCQ_PROMPT_TEMPLATE,
    MCQ_QUERY, SUMMARY_PROMPT_TEMPLATE, SUMMARY_QUERY,
};
use crate::tools::{ParamSpec, ParamType, Tool, ToolArguments, ToolContext, ToolError, ToolErrorKind};

const SUMMARY_TOP_K: usize = 5;
/// Question-worthy facts are spread out, so MCQs retrieve more widely.
const MCQ_TOP_K: usize = 8;
const KEY_POINTS_TOP_K: usize = 5;

const DEFAULT_MCQ_COUNT: i64 = 5;
const MAX_MCQ_COUNT: i64 = 20;

pub const NO_CONTENT_MESSAGE: &str = "The document contains no extractable text.";

const FOCUS_PARAM: ParamSpec = ParamSpec {
    name: "focus",
    kind: ParamType::String,
    description: "Optional topic or section to concentrate on, taken from the user's question",
    required: false,
};

const FOCUS_ONLY: &[ParamSpec] = &[FOCUS_PARAM];

const MCQ_PARAMS: &[ParamSpec] = &[
    FOCUS_PARAM,
    ParamSpec {
        name: "num_questions",
        kind: ParamType::Integer,
        description: "Number of questions to generate (default 5, at most 20)",
        required: false,
    },
];

/// Retrieves the `k` most relevant chunks, joined in document order.
async fn retrieve_context(ctx: &ToolContext<'_>, query: &str, k: usize) -> Result<String, ToolError> {
    if ctx.document_text.trim().is_empty() {
        return Err(ToolError::new(ToolErrorKind::EmptyDocument, NO_CONTENT_MESSAGE));
    }

    let config = ChunkConfig::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
        .map_err(|e| ToolError::new(ToolErrorKind::Retrieval, e.to_string()))?;
    let chunks = chunk_text(ctx.document_text, config);
    let index = SimilarityIndex::build(chunks, ctx.embedder)
        .await
        .map_err(|e| ToolError::new(ToolErrorKind::Retrieval, e.to_string()))?;
    debug!(
        size = config.size(),
        overlap = config.overlap(),
        chunks = index.len(),
        dimension = index.dimension(),
        k,
        "retrieving context"
    );

    let mut hits = index
        .top_k(query, k)
        .await
        .map_err(|e| ToolError::new(ToolErrorKind::Retrieval, e.to_string()))?;
    if hits.is_empty() {
        return Err(ToolError::new(ToolErrorKind::EmptyDocument, NO_CONTENT_MESSAGE));
    }

    hits.sort_by_key(|hit| hit.chunk.index);
    Ok(hits
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

async fn generate(ctx: &ToolContext<'_>, prompt: &str) -> Result<String, ToolError> {
    ctx.generator
        .generate(prompt, DOCUMENT_TOOL_SYSTEM)
        .await
        .map_err(|e| ToolError::new(ToolErrorKind::Generation, e.to_string()))
}

fn retrieval_query<'a>(args: &'a ToolArguments, default: &'a str) -> &'a str {
    args.string("focus").unwrap_or(default)
}

pub struct SummarizeTool;

#[async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &'static str {
        "summarize_document"
    }

    fn description(&self) -> &'static str {
        "Generate a structured summary of the uploaded document (key ideas, main focus, conclusion)."
    }

    fn error_marker(&self) -> &'static str {
        "Summary Error"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        FOCUS_ONLY
    }

    async fn invoke(&self, ctx: &ToolContext<'_>, args: &ToolArguments) -> Result<String, ToolError> {
        let context =
            retrieve_context(ctx, retrieval_query(args, SUMMARY_QUERY), SUMMARY_TOP_K).await?;
        let prompt = fill_template(
            SUMMARY_PROMPT_TEMPLATE,
            &[
                ("grounding_instruction", GROUNDING_INSTRUCTION),
                ("context", context.as_str()),
            ],
        );
        generate(ctx, &prompt).await
    }
}

pub struct McqTool;

#[async_trait]
impl Tool for McqTool {
    fn name(&self) -> &'static str {
        "generate_mcqs"
    }

    fn description(&self) -> &'static str {
        "Generate multiple-choice questions (4 options and the correct answer each) from the uploaded document."
    }

    fn error_marker(&self) -> &'static str {
        "MCQ Error"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        MCQ_PARAMS
    }

    async fn invoke(&self, ctx: &ToolContext<'_>, args: &ToolArguments) -> Result<String, ToolError> {
        let count = args
            .integer("num_questions")
            .unwrap_or(DEFAULT_MCQ_COUNT)
            .clamp(1, MAX_MCQ_COUNT);
        let context = retrieve_context(ctx, retrieval_query(args, MCQ_QUERY), MCQ_TOP_K).await?;
        let count = count.to_string();
        let prompt = fill_template(
            MCQ_PROMPT_TEMPLATE,
            &[
                ("grounding_instruction", GROUNDING_INSTRUCTION),
                ("context", context.as_str()),
                ("num_questions", count.as_str()),
            ],
        );
        generate(ctx, &prompt).await
    }
}

pub struct KeyPointsTool;

#[async_trait]
impl Tool for KeyPointsTool {
    fn name(&self) -> &'static str {
        "extract_key_points"
    }

    fn description(&self) -> &'static str {
        "Generate clear, concise bullet-point key takeaways from the uploaded document."
    }

    fn error_marker(&self) -> &'static str {
        "Key Points Error"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        FOCUS_ONLY
    }

    async fn invoke(&self, ctx: &ToolContext<'_>, args: &ToolArguments) -> Result<String, ToolError> {
        let context =
            retrieve_context(ctx, retrieval_query(args, KEY_POINTS_QUERY), KEY_POINTS_TOP_K)
                .await?;
        let prompt = fill_template(
            KEY_POINTS_PROMPT_TEMPLATE,
            &[
                ("grounding_instruction", GROUNDING_INSTRUCTION),
                ("context", context.as_str()),
            ],
        );
        generate(ctx, &prompt).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm_client::LlmError;
    use crate::tools::{execute, validate_arguments, ToolOutcome};
    use crate::test_support::{FailingEmbedder, HashingEmbedder, ScriptedGenerator};

    fn long_document() -> String {
        (0..200)
            .map(|i| format!("Paragraph {i} discusses topic number {i} in moderate detail. "))
            .collect::<String>()
    }

    fn no_args() -> ToolArguments {
        validate_arguments(&[], &json!({})).unwrap()
    }

    #[tokio::test]
    async fn test_summary_prompt_contains_retrieved_context_and_template() {
        let generator = ScriptedGenerator::new(|_, _| Ok("Key Ideas: ...".to_string()));
        let embedder = HashingEmbedder::default();
        let text = long_document();
        let ctx = ToolContext {
            document_text: &text,
            generator: &generator,
            embedder: &embedder,
        };

        let result = SummarizeTool.invoke(&ctx, &no_args()).await.unwrap();
        assert_eq!(result, "Key Ideas: ...");

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("Provide a detailed summary"));
        assert!(calls[0].prompt.contains("Paragraph"));
        assert_eq!(calls[0].system, DOCUMENT_TOOL_SYSTEM);
    }

    #[tokio::test]
    async fn test_mcq_uses_requested_count_and_clamps() {
        let generator = ScriptedGenerator::new(|_, _| Ok("1. Q?".to_string()));
        let embedder = HashingEmbedder::default();
        let text = long_document();
        let ctx = ToolContext {
            document_text: &text,
            generator: &generator,
            embedder: &embedder,
        };

        let args = validate_arguments(McqTool.parameters(), &json!({"num_questions": 3})).unwrap();
        McqTool.invoke(&ctx, &args).await.unwrap();
        let args = validate_arguments(McqTool.parameters(), &json!({"num_questions": 500})).unwrap();
        McqTool.invoke(&ctx, &args).await.unwrap();
        McqTool.invoke(&ctx, &no_args()).await.unwrap();

        let calls = generator.calls();
        assert!(calls[0].prompt.contains("Generate 3 multiple-choice questions"));
        assert!(calls[1].prompt.contains("Generate 20 multiple-choice questions"));
        assert!(calls[2].prompt.contains("Generate 5 multiple-choice questions"));
    }

    #[tokio::test]
    async fn test_placeholders_inside_document_stay_literal() {
        let generator = ScriptedGenerator::new(|_, _| Ok("1. Q?".to_string()));
        let embedder = HashingEmbedder::default();
        let ctx = ToolContext {
            document_text: "Set {num_questions} in the quiz config.",
            generator: &generator,
            embedder: &embedder,
        };

        let args = validate_arguments(McqTool.parameters(), &json!({"num_questions": 3})).unwrap();
        McqTool.invoke(&ctx, &args).await.unwrap();

        let prompt = &generator.calls()[0].prompt;
        assert!(prompt.contains("Set {num_questions} in the quiz config."));
        assert!(prompt.contains("Generate 3 multiple-choice questions"));
    }

    #[tokio::test]
    async fn test_mcq_retrieves_more_chunks_than_summary() {
        let generator = ScriptedGenerator::new(|_, _| Ok("ok".to_string()));
        let embedder = HashingEmbedder::default();
        let text = long_document();
        let ctx = ToolContext {
            document_text: &text,
            generator: &generator,
            embedder: &embedder,
        };

        let summary_context = retrieve_context(&ctx, SUMMARY_QUERY, SUMMARY_TOP_K).await.unwrap();
        let mcq_context = retrieve_context(&ctx, MCQ_QUERY, MCQ_TOP_K).await.unwrap();
        assert_eq!(summary_context.split("\n\n").count(), SUMMARY_TOP_K);
        assert_eq!(mcq_context.split("\n\n").count(), MCQ_TOP_K);
    }

    #[tokio::test]
    async fn test_short_document_uses_its_only_chunk() {
        let generator = ScriptedGenerator::new(|_, _| Ok("ok".to_string()));
        let embedder = HashingEmbedder::default();
        let ctx = ToolContext {
            document_text: "Cats sleep most of the day.",
            generator: &generator,
            embedder: &embedder,
        };
        let context = retrieve_context(&ctx, MCQ_QUERY, MCQ_TOP_K).await.unwrap();
        assert_eq!(context, "Cats sleep most of the day.");
    }

    #[tokio::test]
    async fn test_empty_document_is_a_no_content_failure() {
        let generator = ScriptedGenerator::new(|_, _| Ok("unused".to_string()));
        let embedder = HashingEmbedder::default();
        let ctx = ToolContext {
            document_text: "  \n ",
            generator: &generator,
            embedder: &embedder,
        };

        let record = execute(&KeyPointsTool, &ctx, &json!({})).await;
        match &record.outcome {
            ToolOutcome::Failed(err) => assert_eq!(err.kind, ToolErrorKind::EmptyDocument),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(record.failure_text().unwrap().starts_with("Key Points Error:"));
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_becomes_retrieval_failure() {
        let generator = ScriptedGenerator::new(|_, _| Ok("unused".to_string()));
        let text = long_document();
        let ctx = ToolContext {
            document_text: &text,
            generator: &generator,
            embedder: &FailingEmbedder,
        };

        let err = SummarizeTool.invoke(&ctx, &no_args()).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Retrieval);
    }

    #[tokio::test]
    async fn test_generator_failure_becomes_generation_failure() {
        let generator = ScriptedGenerator::new(|_, _| {
            Err(LlmError::Api {
                status: 500,
                message: "upstream exploded".to_string(),
            })
        });
        let embedder = HashingEmbedder::default();
        let text = long_document();
        let ctx = ToolContext {
            document_text: &text,
            generator: &generator,
            embedder: &embedder,
        };

        let err = McqTool.invoke(&ctx, &no_args()).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Generation);
        assert!(err.message.contains("upstream exploded"));
    }

    #[test]
    fn test_focus_overrides_default_query() {
        let args = validate_arguments(FOCUS_ONLY, &json!({"focus": "chapter 3"})).unwrap();
        assert_eq!(retrieval_query(&args, SUMMARY_QUERY), "chapter 3");
        assert_eq!(retrieval_query(&no_args(), SUMMARY_QUERY), SUMMARY_QUERY);
    }
}
