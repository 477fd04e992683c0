//! One-off venue detection from the command line.

use std::sync::Arc;

use sailvenue_core::{AppConfig, GeoPoint};
use sailvenue_detect::{DetectOptions, DetectionEngine, InMemoryRegistry};

/// Run a single detection and print the result as pretty JSON.
///
/// Uses the same engine wiring as the server, so the AI path is attempted
/// when agent credentials are configured.
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded, the agent client cannot
/// be built, or the coordinates fail validation.
pub(crate) async fn run_detect(
    config: &AppConfig,
    lat: f64,
    lng: f64,
    options: &DetectOptions,
) -> anyhow::Result<()> {
    let registry = Arc::new(InMemoryRegistry::from_file(&config.venues_path)?);
    let engine = DetectionEngine::from_registry(
        registry,
        config.agent().as_ref(),
        config.detect.clone(),
    )?;

    let result = engine.detect(GeoPoint::new(lat, lng), options).await?;
    tracing::debug!(
        source = %result.source,
        venue_id = result.venue_id.as_deref().unwrap_or("-"),
        "detection complete"
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
