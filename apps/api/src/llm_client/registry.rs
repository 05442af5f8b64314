//! Model registry: resolves `"provider:model"` strings to an upstream endpoint.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ProviderKeys;
use crate::llm_client::LlmError;

/// Model id the playground pages default to. Served by Groq's R1 distill
/// with reasoning pulled out of the tagged text.
pub const REASONER_MODEL_ID: &str = "deepseek:deepseek-reasoner";
const REASONER_UPSTREAM_MODEL: &str = "deepseek-r1-distill-llama-70b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Groq,
    DeepSeek,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Groq,
        Provider::DeepSeek,
        Provider::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Groq => "groq",
            Provider::DeepSeek => "deepseek",
            Provider::Gemini => "gemini",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::DeepSeek => "https://api.deepseek.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Provider::Anthropic => Dialect::Anthropic,
            _ => Dialect::OpenAiCompatible,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "groq" => Ok(Provider::Groq),
            "deepseek" => Ok(Provider::DeepSeek),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

/// Wire format spoken by a provider's streaming endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `POST {base}/chat/completions`, bearer auth, `data:` chunks ending in `[DONE]`.
    OpenAiCompatible,
    /// `POST {base}/messages`, `x-api-key` auth, typed SSE events.
    Anthropic,
}

/// A parsed `provider:model` id. A bare model name belongs to OpenAI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    pub provider: Provider,
    pub model: String,
}

impl ModelId {
    pub fn parse(raw: &str) -> Result<Self, LlmError> {
        let raw = raw.trim();
        let (provider, model) = match raw.split_once(':') {
            Some((provider, model)) => (provider.parse::<Provider>()?, model.trim()),
            None => (Provider::OpenAi, raw),
        };
        if model.is_empty() {
            return Err(LlmError::InvalidModelId(raw.to_string()));
        }
        Ok(ModelId {
            provider,
            model: model.to_string(),
        })
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

impl FromStr for ModelId {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::parse(s)
    }
}

#[derive(Debug, Clone)]
struct ProviderEndpoint {
    base_url: String,
    api_key: Option<String>,
}

/// Everything the client needs to reach one model.
#[derive(Debug, Clone)]
pub struct ModelRoute {
    pub provider: Provider,
    pub upstream_model: String,
    pub dialect: Dialect,
    pub url: String,
    pub api_key: String,
    /// Reasoning arrives inline, wrapped in tags, and has to be split out of the text.
    pub tagged_reasoning: bool,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    endpoints: HashMap<Provider, ProviderEndpoint>,
}

impl ModelRegistry {
    pub fn from_keys(keys: &ProviderKeys) -> Self {
        let pairs = [
            (Provider::OpenAi, &keys.openai_base_url, &keys.openai_api_key),
            (Provider::Anthropic, &keys.anthropic_base_url, &keys.anthropic_api_key),
            (Provider::Groq, &keys.groq_base_url, &keys.groq_api_key),
            (Provider::DeepSeek, &keys.deepseek_base_url, &keys.deepseek_api_key),
            (Provider::Gemini, &keys.gemini_base_url, &keys.gemini_api_key),
        ];

        let endpoints = pairs
            .into_iter()
            .map(|(provider, base_url, api_key)| {
                let base_url = base_url
                    .clone()
                    .unwrap_or_else(|| provider.default_base_url().to_string());
                (
                    provider,
                    ProviderEndpoint {
                        base_url: base_url.trim_end_matches('/').to_string(),
                        api_key: api_key.clone(),
                    },
                )
            })
            .collect();

        Self { endpoints }
    }

    /// Providers with an API key, for startup logging.
    pub fn configured_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| {
                self.endpoints
                    .get(p)
                    .is_some_and(|endpoint| endpoint.api_key.is_some())
            })
            .collect()
    }

    pub fn resolve(&self, id: &ModelId) -> Result<ModelRoute, LlmError> {
        let (provider, upstream_model, tagged_reasoning) = if id.to_string() == REASONER_MODEL_ID {
            (Provider::Groq, REASONER_UPSTREAM_MODEL.to_string(), true)
        } else {
            (id.provider, id.model.clone(), false)
        };

        let endpoint = self
            .endpoints
            .get(&provider)
            .ok_or(LlmError::MissingApiKey(provider))?;
        let api_key = endpoint
            .api_key
            .clone()
            .ok_or(LlmError::MissingApiKey(provider))?;

        let dialect = provider.dialect();
        let path = match dialect {
            Dialect::OpenAiCompatible => "chat/completions",
            Dialect::Anthropic => "messages",
        };

        Ok(ModelRoute {
            provider,
            upstream_model,
            dialect,
            url: format!("{}/{}", endpoint.base_url, path),
            api_key,
            tagged_reasoning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::from_keys(&ProviderKeys {
            openai_api_key: Some("sk-openai".to_string()),
            groq_api_key: Some("gsk-groq".to_string()),
            anthropic_api_key: Some("sk-ant".to_string()),
            anthropic_base_url: Some("http://localhost:9999/v1/".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_provider_and_model() {
        let id = ModelId::parse("groq:llama3-70b-8192").unwrap();
        assert_eq!(id.provider, Provider::Groq);
        assert_eq!(id.model, "llama3-70b-8192");
    }

    #[test]
    fn test_bare_model_defaults_to_openai() {
        let id = ModelId::parse("gpt-4").unwrap();
        assert_eq!(id.provider, Provider::OpenAi);
        assert_eq!(id.to_string(), "openai:gpt-4");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = ModelId::parse("mistral:large").unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider(p) if p == "mistral"));
    }

    #[test]
    fn test_empty_model_is_rejected() {
        assert!(matches!(
            ModelId::parse("openai:"),
            Err(LlmError::InvalidModelId(_))
        ));
        assert!(matches!(ModelId::parse("  "), Err(LlmError::InvalidModelId(_))));
    }

    #[test]
    fn test_reasoner_routes_to_groq_distill() {
        let route = registry()
            .resolve(&ModelId::parse(REASONER_MODEL_ID).unwrap())
            .unwrap();
        assert_eq!(route.provider, Provider::Groq);
        assert_eq!(route.upstream_model, "deepseek-r1-distill-llama-70b");
        assert!(route.tagged_reasoning);
        assert_eq!(route.url, "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_anthropic_route_uses_messages_endpoint_and_trims_slash() {
        let route = registry()
            .resolve(&ModelId::parse("anthropic:claude-3-5-sonnet-latest").unwrap())
            .unwrap();
        assert_eq!(route.dialect, Dialect::Anthropic);
        assert_eq!(route.url, "http://localhost:9999/v1/messages");
        assert!(!route.tagged_reasoning);
    }

    #[test]
    fn test_missing_key_is_reported_per_provider() {
        let err = registry()
            .resolve(&ModelId::parse("gemini:gemini-1.5-pro").unwrap())
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(Provider::Gemini)));
    }

    #[test]
    fn test_configured_providers_lists_only_keyed() {
        let configured = registry().configured_providers();
        assert_eq!(
            configured,
            vec![Provider::OpenAi, Provider::Anthropic, Provider::Groq]
        );
    }
}
