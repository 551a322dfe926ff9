//! Generation client: one adapter operation per pipeline stage.
//!
//! Each operation renders its stage template, issues exactly one request to
//! the [`ModelBackend`], and extracts the stage's result from the response.

mod gemini;

pub use gemini::GeminiBackend;

use crate::config::{Stage, StageSettings};
use crate::error::GenerationError;
use crate::prompt::PromptTemplates;
use crate::state::{ResearchResult, Source};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// A single request to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f32>,
    /// Structured-output schema; requests JSON output when set
    pub response_schema: Option<Value>,
    /// Enable the search-grounding tool
    pub search_grounding: bool,
    pub thinking_budget: Option<u32>,
}

/// A citation as reported by the service; either field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Citation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// Generated text plus any grounding citations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// The external generation service.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GenerationError>;
}

/// Summary and sources produced for one plan step.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchFinding {
    pub summary: String,
    pub sources: Vec<Source>,
}

/// Stage-aware adapter over a [`ModelBackend`].
pub struct GenerationClient {
    backend: Arc<dyn ModelBackend>,
    templates: Arc<PromptTemplates>,
    stages: StageSettings,
    /// Matches the first fenced block, with an optional info string
    fence_regex: Regex,
    plan_validator: jsonschema::Validator,
}

impl GenerationClient {
    /// Create a client over a backend with the given templates and stage options.
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        templates: Arc<PromptTemplates>,
        stages: StageSettings,
    ) -> Self {
        Self {
            backend,
            templates,
            stages,
            fence_regex: Regex::new(r"```(?:\w*\n)?([\s\S]*?)```").unwrap(),
            plan_validator: jsonschema::validator_for(&json!({
                "type": "array",
                "items": { "type": "string" }
            }))
            .unwrap(),
        }
    }

    /// Author the research directive for a subject.
    pub async fn directive(&self, subject: &str, notes: &str) -> Result<String, GenerationError> {
        let notes = if notes.trim().is_empty() { "None" } else { notes };
        let prompt = self
            .templates
            .render(Stage::Directive, &[("subject", subject), ("notes", notes)]);

        let response = self.call(Stage::Directive, prompt, None, false).await?;
        Ok(self.extract_fenced(&response.text))
    }

    /// Ask for the ordered list of plan steps.
    pub async fn plan(&self, directive: &str) -> Result<Vec<String>, GenerationError> {
        let prompt = self
            .templates
            .render(Stage::Plan, &[("authoredDirective", directive)]);

        let schema = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
        let response = self.call(Stage::Plan, prompt, Some(schema), false).await?;
        self.parse_plan(&response.text)
    }

    /// Investigate one plan step with search grounding.
    pub async fn research_step(
        &self,
        subject: &str,
        step: &str,
        directive: &str,
    ) -> Result<ResearchFinding, GenerationError> {
        let prompt = self.templates.render(
            Stage::Research,
            &[
                ("authoredDirective", directive),
                ("mainTopic", subject),
                ("subTopic", step),
            ],
        );

        let response = self.call(Stage::Research, prompt, None, true).await?;
        Ok(ResearchFinding {
            summary: response.text.trim().to_string(),
            sources: collect_sources(response.citations),
        })
    }

    /// Synthesize the final report from all findings.
    pub async fn report(
        &self,
        subject: &str,
        results: &[ResearchResult],
    ) -> Result<String, GenerationError> {
        let data = format_research_data(results);
        let prompt = self
            .templates
            .render(Stage::Report, &[("topic", subject), ("researchData", &data)]);

        let response = self.call(Stage::Report, prompt, None, false).await?;
        Ok(response.text.trim().to_string())
    }

    async fn call(
        &self,
        stage: Stage,
        prompt: String,
        response_schema: Option<Value>,
        search_grounding: bool,
    ) -> Result<GenerateResponse, GenerationError> {
        let options = self.stages.get(stage);
        debug!(
            stage = stage.name(),
            model = options.model.as_str(),
            prompt_chars = prompt.len(),
            "Sending generation request"
        );

        let response = self
            .backend
            .generate(GenerateRequest {
                model: options.model.clone(),
                prompt,
                temperature: options.temperature,
                response_schema,
                search_grounding,
                thinking_budget: options.thinking_budget,
            })
            .await?;

        if response.text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!(
            stage = stage.name(),
            response_chars = response.text.len(),
            citations = response.citations.len(),
            "Received generation response"
        );
        Ok(response)
    }

    /// Content of the first fenced block, or the whole text, trimmed.
    fn extract_fenced(&self, text: &str) -> String {
        let text = text.trim();
        self.fence_regex
            .captures(text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| text.to_string())
    }

    /// Parse the plan response, which must be a JSON array of strings.
    fn parse_plan(&self, text: &str) -> Result<Vec<String>, GenerationError> {
        let value: Value = serde_json::from_str(text.trim())
            .map_err(|e| GenerationError::MalformedPlan(format!("invalid JSON: {}", e)))?;

        if !self.plan_validator.is_valid(&value) {
            return Err(GenerationError::MalformedPlan(format!(
                "expected an array of strings, got {}",
                json_kind(&value)
            )));
        }

        serde_json::from_value(value).map_err(|e| GenerationError::MalformedPlan(e.to_string()))
    }
}

/// Keep citations that carry both a uri and a title, in order.
pub fn collect_sources(citations: Vec<Citation>) -> Vec<Source> {
    citations
        .into_iter()
        .filter_map(|c| match (c.uri, c.title) {
            (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => {
                Some(Source { uri, title })
            }
            _ => None,
        })
        .collect()
}

/// Render findings as the research-data block of the report prompt.
pub fn format_research_data(results: &[ResearchResult]) -> String {
    results
        .iter()
        .map(|result| {
            let sources = result
                .sources
                .iter()
                .map(|s| format!("- [{}]({})", s.title, s.uri))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "\n### Task: {}\n**Summary:**\n{}\n**Sources:**\n{}\n",
                result.task, result.summary, sources
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array with non-string items",
        Value::Object(_) => "an object",
    }
}
