//! Gemini HTTP client

use async_trait::async_trait;
use futures_util::StreamExt;
use parlay_core::{
    LlmError, MatchupPayload, ParlayError, ParlayResult, RosterSnapshot, SchedulePayload,
};
use reqwest::{Client, Response};
use tracing::{debug, warn};

use super::types::{ApiError, GenerateContentRequest, GenerateContentResponse};
use crate::parse::{dedupe_sources, parse_analysis, parse_roster_snapshot, parse_schedule};
use crate::prompts::{analysis_prompt, roster_prompt, schedule_prompt};
use crate::sse::SseDecoder;
use crate::{AnalysisClient, PartialTextFn};

const PROVIDER: &str = "gemini";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client with Google Search grounding.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client. A missing or blank key is accepted here and
    /// reported as `MissingCredentials` on first use.
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client from environment variables.
    ///
    /// # Environment Variables
    /// - `GEMINI_API_KEY`: API key (required for any request)
    /// - `PARLAY_AI_MODEL`: model name (default: gemini-2.5-flash)
    pub fn from_env() -> Self {
        let model = std::env::var("PARLAY_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(std::env::var("GEMINI_API_KEY").ok(), model)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the key; blank keys clear it.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|k| !k.trim().is_empty());
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> ParlayResult<&str> {
        self.api_key
            .as_deref()
            .ok_or(ParlayError::Llm(LlmError::MissingCredentials))
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    async fn send(&self, url: &str, request: &GenerateContentRequest) -> ParlayResult<Response> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                ParlayError::Llm(LlmError::Transport {
                    provider: PROVIDER.to_string(),
                    reason: e.to_string(),
                })
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = match serde_json::from_str::<ApiError>(&error_text) {
            Ok(api_error) => api_error.error.message,
            Err(_) => error_text,
        };

        Err(ParlayError::Llm(LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            status: status.as_u16(),
            message,
        }))
    }

    /// One-shot generation.
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> ParlayResult<GenerateContentResponse> {
        let response = self.send(&self.endpoint("generateContent"), request).await?;
        response.json().await.map_err(|e| {
            ParlayError::Llm(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to parse response: {}", e),
            })
        })
    }

    /// Streaming generation over server-sent events.
    ///
    /// Returns the complete text and every chunk's response; `on_partial`
    /// sees the text accumulated so far after each chunk.
    pub async fn generate_streaming(
        &self,
        request: &GenerateContentRequest,
        on_partial: PartialTextFn<'_>,
    ) -> ParlayResult<(String, Vec<GenerateContentResponse>)> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.send(&url, request).await?;

        let mut decoder = SseDecoder::new();
        let mut text = String::new();
        let mut chunks = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(bytes) = stream.next().await {
            let bytes = bytes.map_err(|e| {
                ParlayError::Llm(LlmError::Transport {
                    provider: PROVIDER.to_string(),
                    reason: format!("stream interrupted: {}", e),
                })
            })?;
            for event in decoder.feed(&bytes) {
                absorb_event(&event, &mut text, &mut chunks, on_partial);
            }
        }
        if let Some(event) = decoder.finish() {
            absorb_event(&event, &mut text, &mut chunks, on_partial);
        }

        Ok((text, chunks))
    }
}

fn absorb_event(
    event: &str,
    text: &mut String,
    chunks: &mut Vec<GenerateContentResponse>,
    on_partial: PartialTextFn<'_>,
) {
    match serde_json::from_str::<GenerateContentResponse>(event) {
        Ok(chunk) => {
            let delta = chunk.text();
            if !delta.is_empty() {
                text.push_str(&delta);
                on_partial(text.as_str());
            }
            chunks.push(chunk);
        }
        Err(e) => warn!(provider = PROVIDER, error = %e, "Skipping malformed stream event"),
    }
}

#[async_trait]
impl AnalysisClient for GeminiClient {
    async fn fetch_schedule(&self, week: Option<&str>) -> ParlayResult<SchedulePayload> {
        let request = GenerateContentRequest::user_prompt(schedule_prompt(week), true)
            .with_temperature(0.1);
        let response = self.generate(&request).await?;
        let schedule = parse_schedule(PROVIDER, &response.text(), week)?;
        debug!(week = %schedule.week, games = schedule.games.len(), "Fetched schedule");
        Ok(schedule)
    }

    async fn fetch_roster_snapshot(
        &self,
        team_a: &str,
        team_b: &str,
    ) -> ParlayResult<Option<RosterSnapshot>> {
        let request = GenerateContentRequest::user_prompt(roster_prompt(team_a, team_b), true)
            .with_temperature(0.1);
        let response = self.generate(&request).await?;
        let snapshot = parse_roster_snapshot(&response.text());
        if snapshot.is_none() {
            debug!(team_a, team_b, "Roster answer had no usable JSON");
        }
        Ok(snapshot)
    }

    async fn fetch_deep_analysis(
        &self,
        team_a: &str,
        team_b: &str,
        roster_context: Option<&str>,
        on_partial: PartialTextFn<'_>,
    ) -> ParlayResult<MatchupPayload> {
        let prompt = analysis_prompt(team_a, team_b, roster_context);
        let request = GenerateContentRequest::user_prompt(prompt, true).with_temperature(0.4);
        let (raw_text, chunks) = self.generate_streaming(&request, on_partial).await?;

        if raw_text.trim().is_empty() {
            return Err(ParlayError::Llm(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "empty analysis".to_string(),
            }));
        }

        let sources = dedupe_sources(chunks.iter().flat_map(|c| c.sources()).collect());
        let analysis = parse_analysis(&raw_text);
        if analysis.is_none() {
            warn!(team_a, team_b, "Analysis text had no structured block");
        }

        Ok(MatchupPayload {
            analysis,
            sources,
            raw_text,
        })
    }

    fn provider_id(&self) -> &str {
        PROVIDER
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = GeminiClient::new(Some("   ".to_string()), DEFAULT_MODEL);
        assert!(!client.has_credentials());

        let err = client.fetch_schedule(None).await.expect_err("no key");
        assert!(matches!(err, ParlayError::Llm(LlmError::MissingCredentials)));

        let err = client
            .fetch_deep_analysis("Chiefs", "Raiders", None, &|_: &str| {})
            .await
            .expect_err("no key");
        assert!(matches!(err, ParlayError::Llm(LlmError::MissingCredentials)));
    }

    #[test]
    fn test_endpoint_and_debug() {
        let client = GeminiClient::new(Some("secret-key".to_string()), "gemini-test")
            .with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            client.endpoint("generateContent"),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_builder_overrides() {
        let client = GeminiClient::new(None, DEFAULT_MODEL)
            .with_api_key("k")
            .with_model("gemini-2.5-pro");
        assert!(client.has_credentials());
        assert_eq!(client.model(), "gemini-2.5-pro");
        assert!(!client.with_api_key("").has_credentials());
    }

    #[test]
    fn test_absorb_event_accumulates_text() {
        let seen = Mutex::new(Vec::new());
        let on_partial = |t: &str| {
            if let Ok(mut seen) = seen.lock() {
                seen.push(t.to_string());
            }
        };

        let mut text = String::new();
        let mut chunks = Vec::new();
        let first = r#"{"candidates":[{"content":{"parts":[{"text":"Chiefs "}]}}]}"#;
        let second = r#"{"candidates":[{"content":{"parts":[{"text":"cover."}]}}]}"#;
        absorb_event(first, &mut text, &mut chunks, &on_partial);
        absorb_event("not json", &mut text, &mut chunks, &on_partial);
        absorb_event(second, &mut text, &mut chunks, &on_partial);

        assert_eq!(text, "Chiefs cover.");
        assert_eq!(chunks.len(), 2);
        let seen = seen.lock().expect("lock should succeed");
        assert_eq!(*seen, vec!["Chiefs ".to_string(), "Chiefs cover.".to_string()]);
    }
}
