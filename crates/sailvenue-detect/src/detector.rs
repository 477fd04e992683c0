use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::DetectError;
use crate::types::{DetectionRequest, DetectionResult, DetectionSource};

/// One way of answering a detection request.
///
/// The engine holds an optional AI implementation and a mandatory
/// deterministic one behind this trait, which also lets tests inject fakes.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Tag stamped on results produced by this detector.
    fn source(&self) -> DetectionSource;

    /// Run one detection.
    ///
    /// Implementations doing network I/O must stop promptly once `cancel`
    /// fires and return [`crate::AgentError::Cancelled`].
    async fn detect(
        &self,
        request: &DetectionRequest,
        cancel: CancellationToken,
    ) -> Result<DetectionResult, DetectError>;
}
