use super::{GenerateRequest, GenerateResponse, GenerativeModel, GroundingSource};
use crate::error::GenAiError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// `generateContent` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
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
    google_search: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

/// `generateContent` response body, only the parts we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
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
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

/// Gemini REST client
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    /// Variable name reported when no key is set
    key_hint: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        key_hint: &str,
    ) -> Result<Self, GenAiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .gzip(true)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            key_hint: key_hint.to_string(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn wire_request(request: GenerateRequest) -> WireRequest {
        WireRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt),
                }],
            }],
            tools: if request.use_search {
                vec![Tool {
                    google_search: Value::Object(Default::default()),
                }]
            } else {
                Vec::new()
            },
            generation_config: request.response_schema.map(|schema| GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        }
    }

    fn into_response(wire: WireResponse) -> Result<GenerateResponse, GenAiError> {
        let candidate = wire
            .candidates
            .into_iter()
            .next()
            .ok_or(GenAiError::EmptyResponse)?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        let sources = candidate
            .grounding_metadata
            .map(|m| {
                m.grounding_chunks
                    .into_iter()
                    .filter_map(|c| c.web)
                    .filter_map(|w| {
                        w.uri.map(|uri| GroundingSource {
                            uri,
                            title: w.title,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(GenerateResponse { text, sources })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    #[tracing::instrument(skip_all, fields(model = %self.model, search = request.use_search))]
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GenAiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenAiError::MissingApiKey(self.key_hint.clone()))?;

        debug!("prompt length: {}", request.prompt.len());
        let body = Self::wire_request(request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireResponse = response.json().await?;
        trace!("response = {wire:?}");
        Self::into_response(wire)
    }
}
