use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{GenerationError, SummaryGenerator};
use crate::config::Secret;

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Secret,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_url: &str,
        model: &str,
        api_key: Secret,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            api_url.trim_end_matches('/'),
            model
        );
        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl SummaryGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_bytes = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        // The key travels in a header so it never ends up in an error's URL.
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::UnexpectedStatus {
                status,
                body: body.trim().to_string(),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = extract_text(parsed)?;
        debug!(summary_bytes = text.len(), "received generated summary");
        Ok(text)
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response.
fn extract_text(response: GenerateResponse) -> Result<String, GenerationError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(GenerationError::MalformedResponse("candidates[0]"))?;
    let content = candidate
        .content
        .ok_or(GenerationError::MalformedResponse("candidates[0].content"))?;
    let part = content
        .parts
        .into_iter()
        .next()
        .ok_or(GenerationError::MalformedResponse("candidates[0].content.parts[0]"))?;
    let text = part
        .text
        .ok_or(GenerationError::MalformedResponse("candidates[0].content.parts[0].text"))?;

    if text.trim().is_empty() {
        return Err(GenerationError::EmptySummary);
    }
    Ok(text)
}
