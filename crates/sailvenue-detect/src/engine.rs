//! Detection orchestrator: AI attempt under a deadline, silent fallback,
//! result caching and request coalescing.

use std::sync::Arc;
use std::time::Duration;

use sailvenue_core::{AgentSettings, DetectSettings, GeoPoint};
use tokio_util::sync::CancellationToken;

use crate::agent::{AgentClient, AgentDetector};
use crate::cache::ResultCache;
use crate::detector::Detector;
use crate::error::{AgentError, DetectError};
use crate::fallback::DeterministicDetector;
use crate::registry::VenueRegistry;
use crate::types::{DetectOptions, DetectionRequest, DetectionResult};

/// Lifecycle of one detection computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPhase {
    Idle,
    AiPending,
    AiSucceeded,
    AiFailed,
    FallbackPending,
    FallbackSucceeded,
    FallbackFailed,
    Done,
}

/// Top-level entry point for venue detection.
pub struct DetectionEngine {
    agent: Option<Arc<dyn Detector>>,
    fallback: Arc<dyn Detector>,
    cache: ResultCache,
    defaults: DetectSettings,
}

impl DetectionEngine {
    #[must_use]
    pub fn new(
        fallback: Arc<dyn Detector>,
        agent: Option<Arc<dyn Detector>>,
        defaults: DetectSettings,
    ) -> Self {
        let cache = ResultCache::new(
            Duration::from_secs(defaults.cache_ttl_secs),
            defaults.cache_cell_meters,
        );
        Self {
            agent,
            fallback,
            cache,
            defaults,
        }
    }

    /// Wire the standard detectors over `registry`.
    ///
    /// The AI path is enabled only when `agent` settings are present.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the agent HTTP client cannot be built.
    pub fn from_registry(
        registry: Arc<dyn VenueRegistry>,
        agent: Option<&AgentSettings>,
        defaults: DetectSettings,
    ) -> Result<Self, AgentError> {
        let fallback: Arc<dyn Detector> =
            Arc::new(DeterministicDetector::new(Arc::clone(&registry)));

        let agent: Option<Arc<dyn Detector>> = match agent {
            Some(settings) => {
                let client = AgentClient::new(settings)?;
                tracing::info!(
                    endpoint = %client.endpoint(),
                    model = %settings.model,
                    "AI venue detection enabled"
                );
                Some(Arc::new(AgentDetector::new(client, registry)))
            }
            None => {
                tracing::info!(
                    "AI venue detection not configured; using deterministic detection only"
                );
                None
            }
        };

        Ok(Self::new(fallback, agent, defaults))
    }

    #[must_use]
    pub fn agent_enabled(&self) -> bool {
        self.agent.is_some()
    }

    #[must_use]
    pub fn defaults(&self) -> &DetectSettings {
        &self.defaults
    }

    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Detect the venue at `point`.
    ///
    /// Always yields a [`DetectionResult`] for valid input; registry failure
    /// is reported inside the result as `RegistryUnavailable`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Validation`] for an invalid point or options.
    pub async fn detect(
        &self,
        point: GeoPoint,
        options: &DetectOptions,
    ) -> Result<DetectionResult, DetectError> {
        let request = DetectionRequest::new(point, options, &self.defaults)?;
        let key = self.cache.key_for(&request);

        let agent = self.agent.clone();
        let fallback = Arc::clone(&self.fallback);
        let computation = request.clone();
        let result = self
            .cache
            .get_or_compute(key, move || run_detection(agent, fallback, computation))
            .await;

        match result {
            Some(result) => Ok(result),
            // The shared task died; answer directly without the AI path.
            None => Ok(run_detection(None, Arc::clone(&self.fallback), request).await),
        }
    }
}

/// One uncached pass through the state machine.
async fn run_detection(
    agent: Option<Arc<dyn Detector>>,
    fallback: Arc<dyn Detector>,
    request: DetectionRequest,
) -> DetectionResult {
    let mut phase = DetectionPhase::Idle;

    if let Some(agent) = agent {
        advance(&mut phase, DetectionPhase::AiPending);
        match attempt_agent(agent.as_ref(), &request).await {
            Ok(mut result) => {
                advance(&mut phase, DetectionPhase::AiSucceeded);
                result.source = agent.source();
                advance(&mut phase, DetectionPhase::Done);
                return result;
            }
            Err(e) => {
                tracing::warn!(
                    point = %request.point,
                    error = %e,
                    "AI venue detection failed; falling back to deterministic detection"
                );
                advance(&mut phase, DetectionPhase::AiFailed);
            }
        }
    } else {
        tracing::debug!(reason = %DetectError::AgentUnavailable, "skipping AI detection");
    }

    advance(&mut phase, DetectionPhase::FallbackPending);
    let result = match fallback.detect(&request, CancellationToken::new()).await {
        Ok(mut result) => {
            advance(&mut phase, DetectionPhase::FallbackSucceeded);
            result.source = fallback.source();
            result
        }
        Err(e) => {
            tracing::error!(
                point = %request.point,
                error = %e,
                "deterministic venue detection failed"
            );
            advance(&mut phase, DetectionPhase::FallbackFailed);
            DetectionResult::registry_unavailable(request.point)
        }
    };
    advance(&mut phase, DetectionPhase::Done);
    result
}

/// Run the AI detector under the request deadline.
///
/// The token is cancelled on every exit path, so an abandoned call cannot
/// resolve after the fallback has answered.
async fn attempt_agent(
    agent: &dyn Detector,
    request: &DetectionRequest,
) -> Result<DetectionResult, DetectError> {
    let cancel = CancellationToken::new();
    let _cancel_on_exit = cancel.clone().drop_guard();

    match tokio::time::timeout(request.deadline, agent.detect(request, cancel.clone())).await {
        Ok(result) => result,
        Err(_) => {
            cancel.cancel();
            Err(DetectError::Timeout {
                deadline_ms: request.deadline_ms(),
            })
        }
    }
}

fn advance(phase: &mut DetectionPhase, next: DetectionPhase) {
    tracing::debug!(from = ?*phase, to = ?next, "detection phase");
    *phase = next;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sailvenue_core::VenueRecord;

    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::types::{DetectionSource, ErrorKind};

    /// Fake AI detector with a configurable behaviour.
    struct FakeAgent {
        calls: AtomicU32,
        behaviour: Behaviour,
        last_token: Mutex<Option<CancellationToken>>,
    }

    enum Behaviour {
        Fail,
        Hang,
        Answer(DetectionResult),
    }

    impl FakeAgent {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                calls: AtomicU32::new(0),
                behaviour,
                last_token: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Detector for FakeAgent {
        fn source(&self) -> DetectionSource {
            DetectionSource::Ai
        }

        async fn detect(
            &self,
            _request: &DetectionRequest,
            cancel: CancellationToken,
        ) -> Result<DetectionResult, DetectError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_token.lock().unwrap() = Some(cancel);
            match &self.behaviour {
                Behaviour::Fail => Err(AgentError::Provider("boom".to_string()).into()),
                Behaviour::Hang => std::future::pending().await,
                Behaviour::Answer(result) => Ok(result.clone()),
            }
        }
    }

    fn harbour_registry() -> Arc<dyn VenueRegistry> {
        Arc::new(InMemoryRegistry::new(vec![VenueRecord {
            id: "harbour".to_string(),
            name: "Harbour".to_string(),
            center: GeoPoint::new(0.0, 0.01),
            effective_radius_km: 20.0,
        }]))
    }

    fn engine_with(agent: Option<Arc<dyn Detector>>) -> DetectionEngine {
        let fallback: Arc<dyn Detector> = Arc::new(DeterministicDetector::new(harbour_registry()));
        DetectionEngine::new(fallback, agent, DetectSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn no_agent_routes_straight_to_fallback() {
        let engine = engine_with(None);
        assert!(!engine.agent_enabled());
        let result = engine
            .detect(GeoPoint::new(0.0, 0.0), &DetectOptions::default())
            .await
            .unwrap();
        assert_eq!(result.source, DetectionSource::Fallback);
        assert_eq!(result.venue_id.as_deref(), Some("harbour"));
    }

    #[tokio::test(start_paused = true)]
    async fn agent_failure_falls_back() {
        let agent = Arc::new(FakeAgent::new(Behaviour::Fail));
        let engine = engine_with(Some(agent.clone()));
        let result = engine
            .detect(GeoPoint::new(0.0, 0.0), &DetectOptions::default())
            .await
            .unwrap();
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.source, DetectionSource::Fallback);
        assert!(result.success);
        assert!(result.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn agent_success_is_tagged_ai() {
        let mut answer =
            DetectionResult::not_found(GeoPoint::new(0.0, 0.0), DetectionSource::Fallback);
        answer.reasoning = Some("open water".to_string());
        let agent = Arc::new(FakeAgent::new(Behaviour::Answer(answer)));
        let engine = engine_with(Some(agent));
        let result = engine
            .detect(GeoPoint::new(0.0, 0.0), &DetectOptions::default())
            .await
            .unwrap();
        assert_eq!(result.source, DetectionSource::Ai);
        assert_eq!(result.reasoning.as_deref(), Some("open water"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_agent_is_cancelled_at_deadline() {
        let agent = Arc::new(FakeAgent::new(Behaviour::Hang));
        let engine = engine_with(Some(agent.clone()));
        let started = tokio::time::Instant::now();

        let result = engine
            .detect(
                GeoPoint::new(0.0, 0.0),
                &DetectOptions {
                    deadline_ms: Some(500),
                    ..DetectOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.source, DetectionSource::Fallback);
        assert!(result.success);
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(started.elapsed() < Duration::from_millis(600));
        let token = agent.last_token.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled(), "abandoned agent call must be cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_request_still_cancels_agent_and_publishes_result() {
        let agent = Arc::new(FakeAgent::new(Behaviour::Hang));
        let engine = engine_with(Some(agent.clone()));
        let point = GeoPoint::new(0.0, 0.0);
        let options = DetectOptions {
            deadline_ms: Some(500),
            ..DetectOptions::default()
        };

        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), engine.detect(point, &options)).await;
        assert!(abandoned.is_err(), "caller should give up before the deadline");

        tokio::time::sleep(Duration::from_secs(1)).await;
        let token = agent.last_token.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled(), "agent call must be cancelled at the deadline");
        assert_eq!(engine.cache().len(), 1);

        let later = engine.detect(point, &options).await.unwrap();
        assert!(later.cached);
        assert_eq!(later.source, DetectionSource::Fallback);
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn validation_error_is_returned_before_any_io() {
        let agent = Arc::new(FakeAgent::new(Behaviour::Fail));
        let engine = engine_with(Some(agent.clone()));
        let err = engine
            .detect(GeoPoint::new(120.0, 0.0), &DetectOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DetectError::Validation(_)));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_detection_hits_cache() {
        let agent = Arc::new(FakeAgent::new(Behaviour::Fail));
        let engine = engine_with(Some(agent.clone()));
        let point = GeoPoint::new(0.0, 0.0);

        let first = engine.detect(point, &DetectOptions::default()).await.unwrap();
        let second = engine.detect(point, &DetectOptions::default()).await.unwrap();

        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
        assert!(second.cached);
        assert_eq!(first, DetectionResult { cached: false, ..second });
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_registry_failure_surfaces_error() {
        struct Down;

        #[async_trait]
        impl Detector for Down {
            fn source(&self) -> DetectionSource {
                DetectionSource::Fallback
            }

            async fn detect(
                &self,
                _request: &DetectionRequest,
                _cancel: CancellationToken,
            ) -> Result<DetectionResult, DetectError> {
                Err(crate::error::RegistryError("timeout".to_string()).into())
            }
        }

        let engine = DetectionEngine::new(
            Arc::new(Down),
            Some(Arc::new(FakeAgent::new(Behaviour::Fail))),
            DetectSettings::default(),
        );
        let result = engine
            .detect(GeoPoint::new(0.0, 0.0), &DetectOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error, Some(ErrorKind::RegistryUnavailable));
        assert_eq!(result.source, DetectionSource::Fallback);
        assert!(engine.cache().is_empty());
    }
}
