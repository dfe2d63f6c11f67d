//! Google Gemini gateway
//!
//! Calls `generateContent` (`{base_url}/v1beta/models/{model}:generateContent`)
//! with the configured persona as the system instruction and, optionally, the
//! Google Search tool so answers come back with grounding sources.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AssistantGateway, GatewayError, EMPTY_RESPONSE_TEXT};
use crate::config::Config;
use crate::message::{Citation, Message};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    status: String,
    message: String,
}

#[derive(Clone)]
pub struct GeminiGateway {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    persona: String,
    subject: Option<String>,
    web_search: bool,
}

impl GeminiGateway {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let api_key = config.api_key();
        if api_key.is_none() {
            tracing::warn!("No Gemini API key configured; queries will fail until one is set");
        }

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url().to_string(),
            model: config.model().to_string(),
            persona: config.persona().to_string(),
            subject: config.subject.clone(),
            web_search: config.web_search(),
        })
    }

    fn build_request(&self, text: &str) -> GenerateContentRequest {
        let prompt = match &self.subject {
            Some(subject) => format!("User Query regarding {}: {}", subject, text),
            None => text.to_string(),
        };

        let tools = if self.web_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(self.persona.clone()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            tools,
        }
    }
}

#[async_trait]
impl AssistantGateway for GeminiGateway {
    async fn query(&self, text: &str) -> Result<Message, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = self.build_request(text);

        tracing::debug!(model = %self.model, web_search = self.web_search, "Sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Request(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            // Prefer the structured error message when the body has one
            let body = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => format!("{} {}", err.error.status, err.error.message),
                Err(_) => body,
            };
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }

    fn label(&self) -> String {
        self.model.clone()
    }
}

/// Convert a `generateContent` response body into an assistant message
fn parse_response(body: &str) -> Result<Message, GatewayError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Malformed(e.to_string()))?;

    let candidate = response.candidates.into_iter().next();

    let text = candidate
        .as_ref()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| EMPTY_RESPONSE_TEXT.to_string());

    let citations = candidate
        .and_then(|c| c.grounding_metadata)
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| {
                    let uri = web.uri.filter(|uri| !uri.is_empty())?;
                    Some(Citation::new(uri, web.title.unwrap_or_default()))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Message::assistant_with_citations(text, citations))
}
