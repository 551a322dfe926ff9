//! Pipeline configuration.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the generation service credential.
pub const API_KEY_ENV: &str = "API_KEY";

/// Default generation service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One stage of the research pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Author the research directive
    Directive,
    /// Produce the step-by-step plan
    Plan,
    /// Investigate one plan step with search grounding
    Research,
    /// Synthesize the final report
    Report,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Directive, Stage::Plan, Stage::Research, Stage::Report];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Directive => "directive",
            Stage::Plan => "plan",
            Stage::Research => "research",
            Stage::Report => "report",
        }
    }
}

/// Model options for a single stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOptions {
    /// The model to use (e.g., "gemini-2.5-pro")
    pub model: String,
    /// Temperature for sampling, `None` for the service default
    pub temperature: Option<f32>,
    /// Extended reasoning budget in tokens
    pub thinking_budget: Option<u32>,
}

impl StageOptions {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            temperature: None,
            thinking_budget: None,
        }
    }
}

/// Per-stage model options.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    pub directive: StageOptions,
    pub plan: StageOptions,
    pub research: StageOptions,
    pub report: StageOptions,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            directive: StageOptions {
                temperature: Some(0.5),
                ..StageOptions::new("gemini-2.5-pro")
            },
            plan: StageOptions::new("gemini-2.5-flash"),
            research: StageOptions::new("gemini-2.5-flash"),
            report: StageOptions {
                temperature: Some(0.2),
                thinking_budget: Some(16384),
                ..StageOptions::new("gemini-2.5-pro")
            },
        }
    }
}

impl StageSettings {
    pub fn get(&self, stage: Stage) -> &StageOptions {
        match stage {
            Stage::Directive => &self.directive,
            Stage::Plan => &self.plan,
            Stage::Research => &self.research,
            Stage::Report => &self.report,
        }
    }

    fn get_mut(&mut self, stage: Stage) -> &mut StageOptions {
        match stage {
            Stage::Directive => &mut self.directive,
            Stage::Plan => &mut self.plan,
            Stage::Research => &mut self.research,
            Stage::Report => &mut self.report,
        }
    }
}

/// Configuration for the research pipeline and its web front end.
#[derive(Clone)]
pub struct ResearchConfig {
    /// Credential for the generation service
    pub api_key: String,
    /// Base URL of the generation service
    pub base_url: String,
    /// Timeout for a whole request/response round trip
    pub request_timeout: Duration,
    /// Directory holding the prompt templates
    pub prompts_dir: PathBuf,
    /// Address the web UI listens on
    pub bind_addr: String,
    /// Model options per stage
    pub stages: StageSettings,
}

impl std::fmt::Debug for ResearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("prompts_dir", &self.prompts_dir)
            .field("bind_addr", &self.bind_addr)
            .field("stages", &self.stages)
            .finish()
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(300),
            prompts_dir: PathBuf::from("prompts"),
            bind_addr: "127.0.0.1:3000".to_string(),
            stages: StageSettings::default(),
        }
    }
}

impl ResearchConfig {
    /// Create a new config with the given credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Create a config from the environment.
    ///
    /// Only the service credential comes from the environment; everything else
    /// keeps its default.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::from_key(&key)
    }

    fn from_key(key: &str) -> Result<Self> {
        if key.trim().is_empty() {
            return Err(Error::Config(format!(
                "{} environment variable is not set",
                API_KEY_ENV
            )));
        }
        Ok(Self::new(key.trim()))
    }

    /// Set the credential.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the service base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the prompt template directory.
    pub fn prompts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompts_dir = dir.into();
        self
    }

    /// Set the web UI listen address.
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the model for a stage.
    pub fn model(mut self, stage: Stage, model: impl Into<String>) -> Self {
        self.stages.get_mut(stage).model = model.into();
        self
    }

    /// Set the temperature for a stage.
    pub fn temperature(mut self, stage: Stage, t: f32) -> Self {
        self.stages.get_mut(stage).temperature = Some(t);
        self
    }

    /// Set the thinking budget for a stage.
    pub fn thinking_budget(mut self, stage: Stage, tokens: u32) -> Self {
        self.stages.get_mut(stage).thinking_budget = Some(tokens);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stage_models() {
        let config = ResearchConfig::default();
        assert_eq!(config.stages.directive.model, "gemini-2.5-pro");
        assert_eq!(config.stages.directive.temperature, Some(0.5));
        assert_eq!(config.stages.plan.model, "gemini-2.5-flash");
        assert_eq!(config.stages.research.temperature, None);
        assert_eq!(config.stages.report.thinking_budget, Some(16384));
    }

    #[test]
    fn test_builder_overrides_one_stage() {
        let config = ResearchConfig::new("k")
            .model(Stage::Plan, "custom")
            .temperature(Stage::Plan, 0.9)
            .base_url("http://localhost:9000/");

        assert_eq!(config.stages.get(Stage::Plan).model, "custom");
        assert_eq!(config.stages.get(Stage::Plan).temperature, Some(0.9));
        assert_eq!(config.stages.get(Stage::Research).model, "gemini-2.5-flash");
        assert_eq!(config.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(matches!(ResearchConfig::from_key("  "), Err(Error::Config(_))));
        assert_eq!(ResearchConfig::from_key(" abc ").unwrap().api_key, "abc");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ResearchConfig::new("secret-key");
        assert!(!format!("{:?}", config).contains("secret-key"));
    }
}
