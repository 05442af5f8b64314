use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::blog::BlogIndex;
use crate::config::Config;
use crate::humanize::history::HumanizeHistory;
use crate::humanize::rate_limiter::RateLimiter;
use crate::llm_client::{LlmClient, ModelRegistry};
use crate::reader::store::Library;
use crate::resume::{analysis::ResumeAnalyzer, build_analyzer};

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here lives in memory and is lost on restart.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub config: Config,
    pub humanize_limiter: Arc<RateLimiter>,
    pub humanize_history: Arc<HumanizeHistory>,
    pub library: Arc<Library>,
    pub blog: Arc<BlogIndex>,
    /// Pluggable resume analyzer. Default: LlmResumeAnalyzer. Swap via RESUME_ANALYZER.
    pub resume_analyzer: Arc<dyn ResumeAnalyzer>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let blog = BlogIndex::load(&config.blog_dir)?;
        Self::with_blog(config, blog)
    }

    pub fn with_blog(config: Config, blog: BlogIndex) -> Result<Self> {
        let registry = ModelRegistry::from_keys(&config.providers);
        let llm = LlmClient::new(
            registry,
            Duration::from_secs(config.llm_timeout_secs),
            config.llm_max_retries,
        )
        .context("Failed to build the LLM HTTP client")?;

        let resume_analyzer = build_analyzer(config.resume_analyzer, &llm, &config.resume_model)
            .with_context(|| format!("Invalid RESUME_MODEL '{}'", config.resume_model))?;

        Ok(AppState {
            humanize_limiter: Arc::new(RateLimiter::new(
                config.humanize_rate_limit,
                Duration::from_secs(config.humanize_window_secs),
            )),
            humanize_history: Arc::new(HumanizeHistory::default()),
            library: Arc::new(Library::default()),
            blog: Arc::new(blog),
            resume_analyzer,
            llm,
            config,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use wiremock::MockServer;

    use super::AppState;
    use crate::blog::BlogIndex;
    use crate::config::Config;
    use crate::routes::build_router;

    /// Full router with every provider pointed at the mock server.
    pub fn app_for(server: &MockServer) -> (Router, AppState) {
        app_with(AppState::new(Config::for_tests(&server.uri())).unwrap())
    }

    pub fn app_with_blog(server: &MockServer, blog: BlogIndex) -> Router {
        app_with(AppState::with_blog(Config::for_tests(&server.uri()), blog).unwrap()).0
    }

    fn app_with(state: AppState) -> (Router, AppState) {
        (build_router(state.clone()), state)
    }
}
