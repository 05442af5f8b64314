//! Resume analysis: pluggable, trait-based analyzer producing an `AnalysisResult`.
//!
//! Default: `LlmResumeAnalyzer` (the hosted model scores the resume).
//! Alternative: `KeywordResumeAnalyzer` (the deterministic keyword report, no LLM call).
//!
//! `AppState` holds an `Arc<dyn ResumeAnalyzer>`, chosen at startup via config.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{
    ChatMessage, CompletionRequest, LlmClient, LlmError, ModelId, SamplingParams,
};
use crate::resume::prompts::analysis_system_prompt;
use crate::resume::report::{skill_frequencies, KeywordReport};
use crate::resume::AnalyzerBackend;

/// Message returned when the analysis step fails after the PDF was read.
pub const ANALYSIS_FAILED: &str = "Failed to analyze the resume content";

// ────────────────────────────────────────────────────────────────────────────
// Output data model (shared across all analyzer backends)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub score: f64, // 0 – 100
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub ats_optimization: Vec<String>,
    /// Keyword -> frequency or relevance. Non-numeric values from the model are dropped.
    #[serde(default, deserialize_with = "numeric_entries")]
    pub keyword_analysis: BTreeMap<String, f64>,
    #[serde(default)]
    pub sentiment: String,
}

fn numeric_entries<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(keyword, value)| value.as_f64().map(|n| (keyword, n)))
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Carried in `AppState` as `Arc<dyn ResumeAnalyzer>`.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, AppError>;

    fn backend(&self) -> AnalyzerBackend;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmResumeAnalyzer (default)
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmResumeAnalyzer {
    llm: LlmClient,
    model: ModelId,
}

impl LlmResumeAnalyzer {
    pub fn new(llm: LlmClient, model: ModelId) -> Self {
        Self { llm, model }
    }

    fn request(&self, resume_text: &str, job_description: &str) -> CompletionRequest {
        CompletionRequest::new(
            self.model.clone(),
            analysis_system_prompt(job_description),
            vec![ChatMessage::user(resume_text)],
        )
        .with_params(SamplingParams {
            temperature: 0.2,
            max_tokens: 2000,
            ..SamplingParams::default()
        })
    }
}

#[async_trait]
impl ResumeAnalyzer for LlmResumeAnalyzer {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, AppError> {
        let request = self.request(resume_text, job_description);
        let mut result: AnalysisResult = self
            .llm
            .complete_json(&request)
            .await
            .map_err(|e: LlmError| {
                warn!(model = %self.model, "Resume analysis failed: {e}");
                AppError::Upstream {
                    message: ANALYSIS_FAILED.to_string(),
                    details: e.to_string(),
                }
            })?;

        result.score = result.score.clamp(0.0, 100.0);
        info!(model = %self.model, score = result.score, "Resume analyzed");
        Ok(result)
    }

    fn backend(&self) -> AnalyzerBackend {
        AnalyzerBackend::Llm
    }
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordResumeAnalyzer
// ────────────────────────────────────────────────────────────────────────────

/// Maps the keyword report onto an `AnalysisResult`. Fast, deterministic, no LLM call.
pub struct KeywordResumeAnalyzer;

#[async_trait]
impl ResumeAnalyzer for KeywordResumeAnalyzer {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, AppError> {
        Ok(keyword_analysis(resume_text, job_description))
    }

    fn backend(&self) -> AnalyzerBackend {
        AnalyzerBackend::Keyword
    }
}

fn keyword_analysis(resume_text: &str, job_description: &str) -> AnalysisResult {
    let report = KeywordReport::analyze(resume_text);
    let sections = [
        (report.sections.contact, "Contact information"),
        (report.sections.education, "Education"),
        (report.sections.experience, "Work experience"),
        (report.sections.skills, "Skills"),
    ];

    let mut strengths: Vec<String> = sections
        .iter()
        .filter(|(found, _)| *found)
        .map(|(_, name)| format!("{name} section present"))
        .collect();
    if !report.detected_skills.is_empty() {
        strengths.push(format!(
            "Technical skills: {}",
            report.detected_skills.join(", ")
        ));
    }

    // The first three recommendations are the checks; only failed ones are improvements.
    let passed = [
        "Good length",
        "Contact info looks good",
        "Good technical skills coverage",
    ];
    let improvements = report
        .recommendations
        .iter()
        .filter(|r| !passed.contains(&r.as_str()))
        .cloned()
        .collect();

    let mut ats_optimization: Vec<String> = sections
        .iter()
        .filter(|(found, _)| !*found)
        .map(|(_, name)| format!("Add a clearly labelled {} section", name.to_lowercase()))
        .collect();
    if ats_optimization.is_empty() {
        ats_optimization.push("All standard sections detected".to_string());
    }

    let job_description = job_description.to_lowercase();
    let missing_from_resume: Vec<&str> = skill_frequencies(&job_description)
        .into_iter()
        .map(|(skill, _)| skill)
        .filter(|skill| !report.detected_skills.contains(skill))
        .collect();
    if !missing_from_resume.is_empty() {
        ats_optimization.push(format!(
            "Mention skills the job description asks for: {}",
            missing_from_resume.join(", ")
        ));
    }

    let keyword_analysis = skill_frequencies(resume_text)
        .into_iter()
        .map(|(skill, count)| (skill.to_string(), count as f64))
        .collect();

    let sentiment = if report.score >= 85.0 {
        "Confident and professional"
    } else {
        "Neutral"
    }
    .to_string();

    AnalysisResult {
        score: report.score,
        strengths,
        improvements,
        ats_optimization,
        keyword_analysis,
        sentiment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKeys;
    use crate::llm_client::test_support::openai_sse;
    use crate::llm_client::ModelRegistry;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn llm_analyzer(server: &MockServer) -> LlmResumeAnalyzer {
        let registry = ModelRegistry::from_keys(&ProviderKeys {
            openai_api_key: Some("test_key".to_string()),
            openai_base_url: Some(server.uri()),
            ..Default::default()
        });
        let llm = LlmClient::new(registry, Duration::from_secs(5), 0).unwrap();
        LlmResumeAnalyzer::new(llm, ModelId::parse("gpt-4").unwrap())
    }

    #[test]
    fn test_keyword_analysis_mapping() {
        let result = keyword_analysis(
            "email: a@b.c. Skills: Python, python, SQL",
            "We need Python and AWS",
        );
        assert!(result
            .strengths
            .contains(&"Contact information section present".to_string()));
        assert!(result
            .strengths
            .contains(&"Technical skills: Python, SQL".to_string()));
        assert!(result
            .improvements
            .contains(&"Consider adding more details".to_string()));
        assert!(!result
            .improvements
            .contains(&"Contact info looks good".to_string()));
        assert!(result
            .ats_optimization
            .contains(&"Add a clearly labelled education section".to_string()));
        assert!(result
            .ats_optimization
            .contains(&"Mention skills the job description asks for: AWS".to_string()));
        assert_eq!(result.keyword_analysis.get("Python"), Some(&2.0));
        assert_eq!(result.keyword_analysis.get("SQL"), Some(&1.0));
    }

    #[test]
    fn test_non_numeric_keyword_values_are_dropped() {
        let result: AnalysisResult = serde_json::from_value(serde_json::json!({
            "score": 72,
            "strengths": ["Clear layout"],
            "keywordAnalysis": {"rust": 3, "leadership": "high"},
            "sentiment": "Confident"
        }))
        .unwrap();
        assert_eq!(result.keyword_analysis.len(), 1);
        assert_eq!(result.keyword_analysis["rust"], 3.0);
        assert!(result.improvements.is_empty());
    }

    #[tokio::test]
    async fn test_llm_analyzer_parses_model_json() {
        let server = MockServer::start().await;
        let analysis = serde_json::json!({
            "score": 81,
            "strengths": ["Strong Rust experience"],
            "improvements": ["Replace 'responsible for' with action verbs"],
            "atsOptimization": ["Use standard section headings"],
            "keywordAnalysis": {"Rust": 4},
            "sentiment": "Confident"
        })
        .to_string();
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "temperature": 0.2,
                "max_tokens": 2000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                openai_sse(&[&analysis[..20], &analysis[20..]]),
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let result = llm_analyzer(&server)
            .analyze("Rust engineer, 5 years", "")
            .await
            .unwrap();
        assert_eq!(result.score, 81.0);
        assert_eq!(result.strengths, vec!["Strong Rust experience"]);
        assert_eq!(result.keyword_analysis["Rust"], 4.0);
    }

    #[tokio::test]
    async fn test_llm_analyzer_rejects_prose() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                openai_sse(&["I'm sorry, I can't score this resume."]),
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let err = llm_analyzer(&server)
            .analyze("text", "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { ref message, .. } if message == ANALYSIS_FAILED));
    }
}
