//! HTTP client for the hosted venue-detection agent.
//!
//! One `POST` per detection: the agent is asked to run the radius-search
//! tool for a fix and answer with a structured candidate list. The request
//! is raced against a [`CancellationToken`] so a cancelled detection drops
//! the in-flight HTTP exchange instead of letting it resolve later.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use sailvenue_core::AgentSettings;

use crate::error::AgentError;
use crate::types::DetectionRequest;

const INVOKE_PATH: &str = "v1/tools/invoke";

/// Name of the radius-search tool the agent is instructed to call.
pub const TOOL_NAME: &str = "find_venues_within_radius";

const INSTRUCTIONS: &str = "Call find_venues_within_radius exactly once with the given \
arguments. Answer with the nearest registered sailing venue as `venue` (or null when none \
is in range) and up to max_alternatives other venues as `alternatives`, sorted by \
distance_km ascending. Use only venue ids returned by the tool. Confidence is a number \
between 0 and 1.";

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    model: &'a str,
    tool: &'static str,
    instructions: &'static str,
    arguments: ToolArguments,
}

#[derive(Debug, Serialize)]
struct ToolArguments {
    latitude: f64,
    longitude: f64,
    radius_km: f64,
    max_alternatives: usize,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    status: String,
    #[serde(default)]
    result: Option<AgentDetection>,
    #[serde(default)]
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// The agent's structured answer, untrusted until validated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentDetection {
    #[serde(default)]
    pub venue: Option<AgentCandidate>,
    #[serde(default)]
    pub alternatives: Vec<AgentCandidate>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentCandidate {
    pub venue_id: String,
    #[serde(default)]
    pub venue_name: Option<String>,
    pub distance_km: f64,
    pub confidence: f64,
}

/// Client for the detection agent endpoint.
///
/// Use [`AgentClient::new`] with configured settings, or
/// [`AgentClient::with_base_url`] to point at a mock server in tests.
pub struct AgentClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl AgentClient {
    /// Creates a client from application settings.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`AgentError::InvalidBaseUrl`] if the
    /// configured URL does not parse.
    pub fn new(settings: &AgentSettings) -> Result<Self, AgentError> {
        Self::with_base_url(
            &settings.api_key,
            &settings.model,
            settings.request_timeout_secs,
            &settings.url,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`AgentError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("sailvenue/0.1 (venue-detection)")
            .build()?;

        // Exactly one trailing slash so `join` appends rather than replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(INVOKE_PATH))
            .map_err(|e| AgentError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Runs one tool-call round trip for `request`.
    ///
    /// No retries: any failure is reported immediately.
    ///
    /// # Errors
    ///
    /// - [`AgentError::Cancelled`] if `cancel` fires first.
    /// - [`AgentError::Http`] on network failure.
    /// - [`AgentError::Status`] on a non-2xx HTTP status.
    /// - [`AgentError::Provider`] if the agent reports `"status": "error"`.
    /// - [`AgentError::Deserialize`] / [`AgentError::InvalidResponse`] if the
    ///   body does not match the expected envelope.
    pub async fn invoke(
        &self,
        request: &DetectionRequest,
        cancel: &CancellationToken,
    ) -> Result<AgentDetection, AgentError> {
        let body = InvokeRequest {
            model: &self.model,
            tool: TOOL_NAME,
            instructions: INSTRUCTIONS,
            arguments: ToolArguments {
                latitude: request.point.latitude,
                longitude: request.point.longitude,
                radius_km: request.radius_km,
                max_alternatives: request.max_alternatives,
            },
        };

        let exchange = async {
            let response = self
                .client
                .post(self.endpoint.clone())
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(AgentError::Status(status.as_u16()));
            }

            Ok(response.text().await?)
        };

        // Dropping `exchange` on cancellation aborts the underlying request.
        let text = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AgentError::Cancelled),
            res = exchange => res?,
        };

        parse_envelope(&text)
    }
}

/// Decodes the agent envelope and surfaces provider-level errors.
fn parse_envelope(text: &str) -> Result<AgentDetection, AgentError> {
    let envelope: InvokeResponse =
        serde_json::from_str(text).map_err(|e| AgentError::Deserialize {
            context: format!("{TOOL_NAME} response"),
            source: e,
        })?;

    match envelope.status.as_str() {
        "ok" => envelope
            .result
            .ok_or_else(|| AgentError::InvalidResponse("missing `result` in ok response".into())),
        "error" => Err(AgentError::Provider(
            envelope
                .error
                .map_or_else(|| "unknown error".to_string(), |e| e.message),
        )),
        other => Err(AgentError::InvalidResponse(format!(
            "unexpected status '{other}'"
        ))),
    }
}
