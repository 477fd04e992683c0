use thiserror::Error;

/// Failure reported by a venue registry backend.
///
/// Distinct from an empty result: "no venues nearby" is `Ok(vec![])`.
#[derive(Debug, Clone, Error)]
#[error("venue registry error: {0}")]
pub struct RegistryError(pub String);

/// A registry record whose radius makes confidence undefined.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("degenerate venue radius {radius_km} km; must be a positive finite value")]
pub struct DegenerateVenue {
    pub radius_km: f64,
}

/// Errors from the hosted detection agent round trip.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The agent endpoint answered with a non-2xx status.
    #[error("agent returned HTTP status {0}")]
    Status(u16),

    /// The agent answered `"status": "error"`.
    #[error("agent provider error: {0}")]
    Provider(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The agent's answer broke a result invariant and cannot be trusted.
    #[error("agent response rejected: {0}")]
    InvalidResponse(String),

    /// The caller cancelled the round trip before it completed.
    #[error("agent request cancelled")]
    Cancelled,

    #[error("invalid agent base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Errors surfaced by detectors and the detection engine.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Malformed input; rejected before any I/O and never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// No agent credentials configured; callers route straight to fallback.
    #[error("AI detection is not configured")]
    AgentUnavailable,

    #[error("AI detection failed: {0}")]
    AgentInvocation(#[from] AgentError),

    #[error("AI detection exceeded its {deadline_ms} ms deadline")]
    Timeout { deadline_ms: u64 },

    /// The registry backing the deterministic path failed.
    #[error("venue registry unavailable: {0}")]
    RegistryUnavailable(#[from] RegistryError),
}
