// Resume analysis prompt templates.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// Used in place of an empty job description.
pub const GENERAL_JOB_MATCH: &str = "General best practices";

pub fn analysis_system_prompt(job_description: &str) -> String {
    let job_match = match job_description.trim() {
        "" => GENERAL_JOB_MATCH,
        jd => jd,
    };

    format!(
        "Analyze this resume according to these criteria:
1. ATS Optimization: Check for proper formatting and keywords
2. Job Match: {job_match}
3. Strength Identification: Technical skills, achievements
4. Improvement Areas: Weak verbs, generic terms
5. Keyword Analysis: Frequency and relevance
6. Sentiment: Confidence and professionalism

Respond in JSON format with these keys:
- score (0-100)
- strengths (array)
- improvements (array)
- atsOptimization (array)
- keywordAnalysis (object)
- sentiment (string)

{JSON_ONLY_INSTRUCTION}"
    )
}
