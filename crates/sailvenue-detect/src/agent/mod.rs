//! AI-assisted detection path.

mod client;
mod validate;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use client::{AgentCandidate, AgentClient, AgentDetection, TOOL_NAME};

use crate::detector::Detector;
use crate::error::{AgentError, DetectError};
use crate::rank::rank;
use crate::registry::VenueRegistry;
use crate::types::{DetectionRequest, DetectionResult, DetectionSource};

/// Detector backed by the hosted agent.
///
/// The registry is queried alongside the agent call so the agent's answer
/// can be graded against the same candidates the fallback would use.
pub struct AgentDetector {
    client: AgentClient,
    registry: Arc<dyn VenueRegistry>,
}

impl AgentDetector {
    #[must_use]
    pub fn new(client: AgentClient, registry: Arc<dyn VenueRegistry>) -> Self {
        Self { client, registry }
    }
}

#[async_trait]
impl Detector for AgentDetector {
    fn source(&self) -> DetectionSource {
        DetectionSource::Ai
    }

    /// # Errors
    ///
    /// Returns [`DetectError::AgentInvocation`] for any transport, provider or
    /// validation failure, and [`DetectError::RegistryUnavailable`] if the
    /// registry lookup used for validation fails.
    async fn detect(
        &self,
        request: &DetectionRequest,
        cancel: CancellationToken,
    ) -> Result<DetectionResult, DetectError> {
        let agent_call = async {
            self.client
                .invoke(request, &cancel)
                .await
                .map_err(DetectError::from)
        };
        let registry_call = async {
            self.registry
                .find_within_radius(request.point, request.radius_km)
                .await
                .map_err(DetectError::from)
        };

        let (answer, venues) = tokio::try_join!(agent_call, registry_call)?;
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled.into());
        }

        let ranked = rank(request.point, request.radius_km, &venues);
        let result = validate::validate_agent_detection(request, &answer, &ranked)?;

        tracing::debug!(
            venue_id = result.venue_id.as_deref().unwrap_or("-"),
            alternatives = result.alternatives.len(),
            "agent detection accepted"
        );

        Ok(result)
    }
}
