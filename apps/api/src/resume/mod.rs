// Resume analyzer: PDF upload scored by a pluggable analyzer,
// plus the deterministic keyword report.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::llm_client::{LlmClient, LlmError, ModelId};

pub mod analysis;
pub mod handlers;
pub mod prompts;
pub mod report;

use analysis::{KeywordResumeAnalyzer, LlmResumeAnalyzer, ResumeAnalyzer};

/// Which analyzer backs `/api/resume-analysis`. Set with `RESUME_ANALYZER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerBackend {
    Llm,
    Keyword,
}

#[derive(Debug, Error)]
#[error("Unknown resume analyzer '{0}', expected 'llm' or 'keyword'")]
pub struct UnknownAnalyzer(String);

impl FromStr for AnalyzerBackend {
    type Err = UnknownAnalyzer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(AnalyzerBackend::Llm),
            "keyword" => Ok(AnalyzerBackend::Keyword),
            other => Err(UnknownAnalyzer(other.to_string())),
        }
    }
}

impl fmt::Display for AnalyzerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnalyzerBackend::Llm => "llm",
            AnalyzerBackend::Keyword => "keyword",
        })
    }
}

/// Builds the configured analyzer.
pub fn build_analyzer(
    backend: AnalyzerBackend,
    llm: &LlmClient,
    model: &str,
) -> Result<Arc<dyn ResumeAnalyzer>, LlmError> {
    Ok(match backend {
        AnalyzerBackend::Llm => Arc::new(LlmResumeAnalyzer::new(llm.clone(), ModelId::parse(model)?)),
        AnalyzerBackend::Keyword => Arc::new(KeywordResumeAnalyzer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("LLM".parse::<AnalyzerBackend>().unwrap(), AnalyzerBackend::Llm);
        assert_eq!(
            " keyword ".parse::<AnalyzerBackend>().unwrap(),
            AnalyzerBackend::Keyword
        );
        assert!("semantic".parse::<AnalyzerBackend>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for backend in [AnalyzerBackend::Llm, AnalyzerBackend::Keyword] {
            assert_eq!(backend.to_string().parse::<AnalyzerBackend>().unwrap(), backend);
        }
    }
}
