//! Generative text backend.
//!
//! The HUD only ever needs "prompt in, text (maybe JSON) out" plus the web
//! sources the model grounded its answer on. [`GenerativeModel`] is that seam;
//! [`GeminiClient`] is the HTTP implementation.

mod gemini;

pub use gemini::GeminiClient;

use crate::error::GenAiError;
use async_trait::async_trait;
use serde_json::Value;

/// One generation request
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Let the model ground its answer with web search
    pub use_search: bool,
    /// Constrain output to JSON matching this schema
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_search(mut self) -> Self {
        self.use_search = true;
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// A web page the answer was grounded on
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroundingSource {
    pub uri: String,
    pub title: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

impl GenerateResponse {
    /// URI of the first grounding source, if any
    pub fn first_source(&self) -> Option<&str> {
        self.sources
            .first()
            .map(|s| s.uri.as_str())
            .filter(|u| !u.is_empty())
    }
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GenAiError>;
}
