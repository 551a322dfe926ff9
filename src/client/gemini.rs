//! Gemini `generateContent` backend.
//!
//! Requests are sent with `ureq` on tokio's blocking pool so the pipeline
//! stays a plain sequence of awaits.

use super::{Citation, GenerateRequest, GenerateResponse, ModelBackend};
use crate::config::ResearchConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

// ═══════════════════════════════════════════════════════════════════════════
// WIRE TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// BACKEND
// ═══════════════════════════════════════════════════════════════════════════

/// Production backend talking to the Gemini REST API.
#[derive(Clone)]
pub struct GeminiBackend {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a backend from the pipeline configuration.
    pub fn new(config: &ResearchConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.request_timeout))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Blocking round trip; runs on the blocking pool.
    fn send(
        &self,
        url: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let response = self
            .agent
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .send_json(body);

        match response {
            Ok(mut resp) => resp
                .body_mut()
                .read_json::<GenerateContentResponse>()
                .map_err(|e| GenerationError::InvalidResponse(e.to_string())),
            Err(ureq::Error::StatusCode(code)) => Err(GenerationError::Status(code)),
            Err(e) => Err(GenerationError::Transport(e.to_string())),
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, GenerationError> {
        let url = self.endpoint(&request.model);
        let body = build_request_body(&request);
        debug!(model = request.model.as_str(), url = url.as_str(), "Sending Gemini request");

        let backend = self.clone();
        let data = tokio::task::spawn_blocking(move || backend.send(&url, &body))
            .await
            .map_err(|e| GenerationError::Transport(format!("request task failed: {}", e)))??;

        parse_response(data)
    }
}

fn build_request_body(request: &GenerateRequest) -> GenerateContentRequest {
    let generation_config = GenerationConfig {
        temperature: request.temperature,
        response_mime_type: request.response_schema.as_ref().map(|_| "application/json"),
        response_schema: request.response_schema.clone(),
        thinking_config: request
            .thinking_budget
            .map(|thinking_budget| ThinkingConfig { thinking_budget }),
    };
    let has_config = generation_config.temperature.is_some()
        || generation_config.response_schema.is_some()
        || generation_config.thinking_config.is_some();

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![TextPart {
                text: request.prompt.clone(),
            }],
        }],
        generation_config: has_config.then_some(generation_config),
        tools: if request.search_grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        },
    }
}

fn parse_response(data: GenerateContentResponse) -> Result<GenerateResponse, GenerationError> {
    let Some(candidate) = data.candidates.into_iter().next() else {
        return Err(GenerationError::EmptyResponse);
    };

    if let Some(reason) = candidate.finish_reason.as_deref()
        && reason != "STOP"
    {
        warn!(finish_reason = reason, "Gemini candidate did not finish normally");
    }

    let text: String = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    let citations = candidate
        .grounding_metadata
        .map(|g| {
            g.grounding_chunks
                .into_iter()
                .map(|chunk| match chunk.web {
                    Some(web) => Citation {
                        uri: web.uri,
                        title: web.title,
                    },
                    None => Citation::default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(GenerateResponse { text, citations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> GenerateRequest {
        GenerateRequest {
            model: "gemini-2.5-flash".into(),
            prompt: "hello".into(),
            temperature: None,
            response_schema: None,
            search_grounding: false,
            thinking_budget: None,
        }
    }

    #[test]
    fn test_plain_request_body() {
        let body = serde_json::to_value(build_request_body(&request())).unwrap();
        assert_eq!(
            body,
            json!({ "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }] })
        );
    }

    #[test]
    fn test_structured_request_body() {
        let req = GenerateRequest {
            response_schema: Some(json!({ "type": "ARRAY", "items": { "type": "STRING" } })),
            ..request()
        };
        let body = serde_json::to_value(build_request_body(&req)).unwrap();
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_grounded_and_thinking_request_body() {
        let req = GenerateRequest {
            search_grounding: true,
            thinking_budget: Some(16384),
            temperature: Some(0.2),
            ..request()
        };
        let body = serde_json::to_value(build_request_body(&req)).unwrap();
        assert_eq!(body["tools"], json!([{ "googleSearch": {} }]));
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 16384);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_response_with_grounding() {
        let data: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "Panels " },
                    { "text": "pay off." }
                ]},
                "finishReason": "STOP",
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://a", "title": "A" } },
                    { "retrievedContext": {} },
                    { "web": { "uri": "https://b" } }
                ]}
            }]
        }))
        .unwrap();

        let response = parse_response(data).unwrap();
        assert_eq!(response.text, "Panels pay off.");
        assert_eq!(response.citations.len(), 3);
        assert_eq!(response.citations[0].title.as_deref(), Some("A"));
        assert_eq!(response.citations[1], Citation::default());
        assert_eq!(response.citations[2].title, None);
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let data: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(parse_response(data), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn test_endpoint() {
        let config = ResearchConfig::new("k").base_url("http://localhost:1/v1beta/");
        let backend = GeminiBackend::new(&config);
        assert_eq!(
            backend.endpoint("gemini-2.5-pro"),
            "http://localhost:1/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }
}
