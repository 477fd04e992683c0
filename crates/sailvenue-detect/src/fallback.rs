//! Deterministic, AI-free detection path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::detector::Detector;
use crate::error::DetectError;
use crate::rank::rank;
use crate::registry::VenueRegistry;
use crate::types::{DetectionRequest, DetectionResult, DetectionSource};

/// Registry lookup + ranking + confidence, with no external dependency
/// beyond the registry. This is the correctness baseline the AI path is
/// graded against.
pub struct DeterministicDetector {
    registry: Arc<dyn VenueRegistry>,
}

impl DeterministicDetector {
    #[must_use]
    pub fn new(registry: Arc<dyn VenueRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Detector for DeterministicDetector {
    fn source(&self) -> DetectionSource {
        DetectionSource::Fallback
    }

    /// The registry read is assumed fast and is not raced against `cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::RegistryUnavailable`] if the registry fails.
    async fn detect(
        &self,
        request: &DetectionRequest,
        _cancel: CancellationToken,
    ) -> Result<DetectionResult, DetectError> {
        let venues = self
            .registry
            .find_within_radius(request.point, request.radius_km)
            .await?;

        let ranked = rank(request.point, request.radius_km, &venues);

        match ranked.first() {
            Some(primary) => tracing::debug!(
                venue_id = %primary.venue.id,
                distance_km = primary.distance_km,
                confidence = primary.confidence,
                candidates = ranked.len(),
                "deterministic detection matched venue"
            ),
            None => tracing::debug!(
                point = %request.point,
                radius_km = request.radius_km,
                "deterministic detection found no venue in range"
            ),
        }

        Ok(DetectionResult::from_ranked(
            request.point,
            &ranked,
            request.max_alternatives,
            DetectionSource::Fallback,
        ))
    }
}
