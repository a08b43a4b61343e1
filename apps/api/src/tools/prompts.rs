// Instruction templates for the document and resume tools.
// Placeholders use `{name}` and are filled with `str::replace`.

/// System prompt shared by the retrieval-backed document tools.
pub const DOCUMENT_TOOL_SYSTEM: &str = "You are a careful study assistant. \
    You work only from the document excerpts you are given.";

/// Summary template. Replace `{grounding_instruction}`, `{context}`.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Context:
{context}

Provide a detailed summary including:
- Key Ideas
- Main Focus
- Conclusion (if any)"#;

/// MCQ template. Replace `{grounding_instruction}`, `{context}`, `{num_questions}`.
pub const MCQ_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Context:
{context}

Generate {num_questions} multiple-choice questions from the context.
Each question must include 4 options labelled A-D and the correct answer.
Every question must be answerable from the context alone."#;

/// Key-points template. Replace `{grounding_instruction}`, `{context}`.
pub const KEY_POINTS_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Context:
{context}

Generate clear and concise bullet points covering the most important information."#;

/// Retrieval queries used when the question carries no narrower focus.
pub const SUMMARY_QUERY: &str = "main ideas, central focus and conclusions of the document";
pub const MCQ_QUERY: &str = "key facts, definitions, figures and results worth testing";
pub const KEY_POINTS_QUERY: &str = "most important points, findings and takeaways";

/// System prompt for both resume tools.
pub const RESUME_SYSTEM: &str = "You are a Resume Evaluation AI used in a corporate hiring system. \
    You copy resume content exactly and never embellish it.";

/// Strict extraction template. Replace `{resume}`.
pub const RESUME_EXTRACT_PROMPT_TEMPLATE: &str = r#"You are a Resume Information Extractor.

STRICT RULES (MANDATORY):
- Extract ONLY the information that is EXPLICITLY written in the resume.
- DO NOT rephrase, summarize, improve, or infer anything.
- DO NOT add missing skills, soft skills, or descriptions.
- DO NOT combine or regroup information.
- Use the SAME wording as in the resume.
- If a section is NOT PRESENT, do NOT include it in the output.
- Do NOT add explanations, conclusions, or suggestions.

Resume Text:
--------------------
{resume}
--------------------

Extract and output ONLY the following sections
(ONLY if they exist in the resume):

Profile Summary:
- (copy exact lines from resume)

Technical Skills:
- (copy exact skills as listed)

Soft Skills:
- (copy exact skills ONLY if explicitly written)

Work Experience:
- (copy exact job titles, companies, durations, descriptions)

Projects:
- (copy exact project titles and descriptions)

Education:
- (copy exact education details)

Achievements / Certifications:
- (copy exact text ONLY if present)

OUTPUT FORMAT:
- Use plain text
- Do NOT use bullet points unless the resume uses them
- Do NOT reorder content"#;

/// Section headers the gap-analysis template asks for.
pub const GAP_DETAILS_HEADER: &str = "[RESUME DETAILS - EXACT EXTRACTION]";
pub const GAP_EXPECTATIONS_HEADER: &str = "[JOB ROLE EXPECTATIONS]";
pub const GAP_ANALYSIS_HEADER: &str = "[SKILL GAP ANALYSIS]";
pub const GAP_VERDICT_HEADER: &str = "[FINAL VERDICT]";
pub const NO_MAJOR_GAPS: &str = "No major gaps identified";

/// Five-step gap analysis. Replace `{job_title}`, `{resume_text}`, the four
/// section headers and `{no_major_gaps}`.
pub const GAP_ANALYSIS_PROMPT_TEMPLATE: &str = r#"STRICT RULES:
- Use ONLY information explicitly present in the resume.
- Do NOT rewrite, summarize, or improve resume content.
- Do NOT infer skills, experience, or seniority.
- Clearly separate resume extraction and gap analysis.
- Skill gaps must align with the candidate's experience level.
- If no gap is found, explicitly write "{no_major_gaps}".

JOB TITLE:
{job_title}

RESUME CONTENT:
------------------
{resume_text}
------------------

STEP 1: DETERMINE EXPERIENCE LEVEL
- Fresher: No full-time work experience mentioned OR only academic projects / internships
- Experienced: One or more full-time roles mentioned
- If unclear, state "Experience level unclear"
Write exactly one line: "Experience Level: Fresher", "Experience Level: Experienced" or "Experience Level: Unclear".

STEP 2: EXTRACT RESUME DETAILS (EXACT WORDING)
{details_header}
Profile Summary:
Technical Skills:
Soft Skills:
Work Experience:
Projects:
Education:
Certifications:

STEP 3: DEFINE JOB ROLE EXPECTATIONS
- If Fresher: list 5-7 fundamental skills expected for an entry-level role
- If Experienced: list 5-7 professional/production-level skills expected
- Base expectations on common industry standards for the job title

{expectations_header}

STEP 4: SKILL GAP ANALYSIS
- Compare resume skills with the job role expectations for the experience level
- List ONLY expected skills that are NOT present in the resume
- If the list is empty, write "{no_major_gaps}" instead of leaving the section empty
- Do NOT suggest improvements or learning paths

{analysis_header}

STEP 5: FINAL VERDICT
{verdict_header}
- State whether this resume is at fresher or experienced level
- Write exactly one line: "Resume suitability for this role: High", "Resume suitability for this role: Medium" or "Resume suitability for this role: Low"
- Base the verdict on experience level alignment and skill coverage"#;
