//! Resume tools: verbatim section extraction and job-title gap analysis.
//!
//! Both work on the whole extracted text in a single generation call;
//! a resume is assumed to fit in one context window.

use async_trait::async_trait;
use tracing::warn;

use crate::llm_client::prompts::fill_template;
use crate::tools::prompts::{
    GAP_ANALYSIS_HEADER, GAP_ANALYSIS_PROMPT_TEMPLATE, GAP_DETAILS_HEADER,
    GAP_EXPECTATIONS_HEADER, GAP_VERDICT_HEADER, NO_MAJOR_GAPS, RESUME_EXTRACT_PROMPT_TEMPLATE,
    RESUME_SYSTEM,
};
use crate::tools::{ParamSpec, ParamType, Tool, ToolArguments, ToolContext, ToolError, ToolErrorKind};

const GAP_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "job_title",
    kind: ParamType::String,
    description: "The job title or role the resume is evaluated against, e.g. \"Backend Developer\"",
    required: true,
}];

/// Suitability verdict emitted in step 5 of the gap analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    High,
    Medium,
    Low,
}

impl Verdict {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "high" => Some(Verdict::High),
            "medium" => Some(Verdict::Medium),
            "low" => Some(Verdict::Low),
            _ => None,
        }
    }
}

/// Finds the suitability verdict in a gap report.
///
/// Only lines mentioning suitability or the verdict are considered, so a
/// "low-level programming" skill elsewhere in the report is not mistaken for
/// a verdict. The last matching line wins.
pub fn find_verdict(report: &str) -> Option<Verdict> {
    report
        .lines()
        .filter(|line| {
            let lower = line.to_ascii_lowercase();
            lower.contains("suitability") || lower.contains("verdict")
        })
        .filter_map(|line| {
            line.split(|c: char| !c.is_ascii_alphanumeric())
                .find_map(Verdict::from_word)
        })
        .last()
}

/// Structural check on the generated gap report.
///
/// A report without a High/Medium/Low verdict is rejected as malformed.
/// Missing intermediate sections are logged and tolerated.
pub fn check_gap_report(report: &str) -> Result<Verdict, ToolError> {
    for header in [GAP_DETAILS_HEADER, GAP_EXPECTATIONS_HEADER, GAP_ANALYSIS_HEADER] {
        if !report.contains(header) {
            warn!(section = header, "gap report is missing a section header");
        }
    }

    find_verdict(report).ok_or_else(|| {
        ToolError::new(
            ToolErrorKind::MalformedOutput,
            "the gap analysis did not include a High, Medium or Low suitability verdict",
        )
    })
}

async fn generate(ctx: &ToolContext<'_>, prompt: &str) -> Result<String, ToolError> {
    ctx.generator
        .generate(prompt, RESUME_SYSTEM)
        .await
        .map_err(|e| ToolError::new(ToolErrorKind::Generation, e.to_string()))
}

fn require_text(ctx: &ToolContext<'_>) -> Result<(), ToolError> {
    if ctx.document_text.trim().is_empty() {
        return Err(ToolError::new(
            ToolErrorKind::EmptyDocument,
            "The resume contains no extractable text.",
        ));
    }
    Ok(())
}

pub struct ExtractResumeTool;

#[async_trait]
impl Tool for ExtractResumeTool {
    fn name(&self) -> &'static str {
        "extract_resume"
    }

    fn description(&self) -> &'static str {
        "Extract resume sections (profile summary, skills, work experience, projects, education, certifications) exactly as written."
    }

    fn error_marker(&self) -> &'static str {
        "Resume Extraction Error"
    }

    async fn invoke(&self, ctx: &ToolContext<'_>, _args: &ToolArguments) -> Result<String, ToolError> {
        require_text(ctx)?;
        let prompt = fill_template(RESUME_EXTRACT_PROMPT_TEMPLATE, &[("resume", ctx.document_text)]);
        generate(ctx, &prompt).await
    }
}

pub struct GapAnalysisTool;

#[async_trait]
impl Tool for GapAnalysisTool {
    fn name(&self) -> &'static str {
        "resume_gap_analysis"
    }

    fn description(&self) -> &'static str {
        "Evaluate a resume against a job title: classify the candidate as fresher or experienced, list expected skills missing from the resume, and give a High/Medium/Low suitability verdict."
    }

    fn error_marker(&self) -> &'static str {
        "Gap Analysis Error"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        GAP_PARAMS
    }

    async fn invoke(&self, ctx: &ToolContext<'_>, args: &ToolArguments) -> Result<String, ToolError> {
        require_text(ctx)?;
        let job_title = args.string("job_title").ok_or_else(|| {
            ToolError::new(
                ToolErrorKind::InvalidArguments,
                "a job title is required for gap analysis",
            )
        })?;

        let prompt = fill_template(
            GAP_ANALYSIS_PROMPT_TEMPLATE,
            &[
                ("details_header", GAP_DETAILS_HEADER),
                ("expectations_header", GAP_EXPECTATIONS_HEADER),
                ("analysis_header", GAP_ANALYSIS_HEADER),
                ("verdict_header", GAP_VERDICT_HEADER),
                ("no_major_gaps", NO_MAJOR_GAPS),
                ("job_title", job_title),
                ("resume_text", ctx.document_text),
            ],
        );

        let report = generate(ctx, &prompt).await?;
        check_gap_report(&report)?;
        Ok(report)
    }
}
