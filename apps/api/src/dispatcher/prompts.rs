// Prompts for tool selection and final answer synthesis.

/// Selection system prompt. The model only names a tool; it never runs anything.
pub const SELECTION_SYSTEM: &str = "You are the routing step of a document assistant. \
    Decide whether one of the listed capabilities is needed to answer the user's question. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Selection prompt. Replace `{catalog}`, `{question}`, `{document_preview}`.
pub const SELECTION_PROMPT_TEMPLATE: &str = r#"AVAILABLE CAPABILITIES (JSON):
{catalog}

DOCUMENT PREVIEW (may be truncated):
{document_preview}

USER QUESTION:
{question}

Guidelines:
- Understand the user's intent from the question.
- Pick a capability ONLY if the question clearly asks for what its description says.
- General questions about the document content need no capability.
- Fill "arguments" from the question, following the capability's parameter schema.
- Pick at most one capability.

Return exactly this JSON shape:
{"tool": "<capability name>" | null, "arguments": { ... }}"#;

/// Synthesis system prompt.
pub const SYNTHESIS_SYSTEM: &str = "You are an AI assistant that answers questions about an uploaded document. \
    Answer the user's question directly and helpfully. \
    Do NOT mention tool names, capabilities, internal steps or analysis pipelines in the final answer.";

/// Synthesis prompt. Replace `{grounding_instruction}`, `{document}`,
/// `{question}`, `{analysis_section}`.
pub const SYNTHESIS_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

DOCUMENT CONTENT:
{document}

USER QUESTION:
{question}

{analysis_section}"#;

pub const NO_ANALYSIS_SECTION: &str =
    "Answer directly from the document content.";

/// Replace `{result}`.
pub const COMPLETED_ANALYSIS_SECTION: &str = r#"ANALYSIS RESULT:
{result}

Base your answer on this analysis. Keep its structure and wording where the question asks for it."#;

/// Replace `{failure}`.
pub const FAILED_ANALYSIS_SECTION: &str = r#"ANALYSIS FAILURE:
{failure}

The requested analysis could not be completed. Tell the user plainly that this part of the request could not be completed, then answer from the document content where possible."#;
