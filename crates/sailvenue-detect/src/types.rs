use std::time::Duration;

use sailvenue_core::{DetectSettings, GeoPoint, VenueRecord};
use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// Which path produced a [`DetectionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionSource {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "FALLBACK")]
    Fallback,
}

impl std::fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionSource::Ai => write!(f, "AI"),
            DetectionSource::Fallback => write!(f, "FALLBACK"),
        }
    }
}

/// User-visible failure attached to a result.
///
/// Only the deterministic path can fail visibly; AI failures are absorbed by
/// the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RegistryUnavailable,
}

/// A venue scored against one GPS fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub venue: VenueRecord,
    pub distance_km: f64,
    pub confidence: f64,
}

/// The engine's sole output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub success: bool,
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub distance_km: Option<f64>,
    pub confidence: Option<f64>,
    pub coordinates: GeoPoint,
    /// Ranked runners-up, nearest first, excluding the chosen venue.
    pub alternatives: Vec<Candidate>,
    pub source: DetectionSource,
    pub error: Option<ErrorKind>,
    /// Served from the result cache or a coalesced in-flight computation.
    #[serde(default)]
    pub cached: bool,
    /// Narrative from the AI agent. Always `None` on the fallback path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl DetectionResult {
    /// Successful detection that found no venue in range.
    #[must_use]
    pub fn not_found(coordinates: GeoPoint, source: DetectionSource) -> Self {
        Self {
            success: false,
            venue_id: None,
            venue_name: None,
            distance_km: None,
            confidence: None,
            coordinates,
            alternatives: Vec::new(),
            source,
            error: None,
            cached: false,
            reasoning: None,
        }
    }

    /// Hard failure of the deterministic path's backing store.
    #[must_use]
    pub fn registry_unavailable(coordinates: GeoPoint) -> Self {
        Self {
            error: Some(ErrorKind::RegistryUnavailable),
            ..Self::not_found(coordinates, DetectionSource::Fallback)
        }
    }

    /// Build a result from a ranked candidate list.
    ///
    /// The head of `ranked` becomes the primary venue and up to
    /// `max_alternatives` of the remainder become alternatives.
    #[must_use]
    pub fn from_ranked(
        coordinates: GeoPoint,
        ranked: &[Candidate],
        max_alternatives: usize,
        source: DetectionSource,
    ) -> Self {
        let Some((primary, rest)) = ranked.split_first() else {
            return Self::not_found(coordinates, source);
        };

        Self {
            success: true,
            venue_id: Some(primary.venue.id.clone()),
            venue_name: Some(primary.venue.name.clone()),
            distance_km: Some(primary.distance_km),
            confidence: Some(primary.confidence),
            coordinates,
            alternatives: rest.iter().take(max_alternatives).cloned().collect(),
            source,
            error: None,
            cached: false,
            reasoning: None,
        }
    }
}

/// Per-call options; unset fields take the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectOptions {
    pub radius_km: Option<f64>,
    pub max_alternatives: Option<usize>,
    pub deadline_ms: Option<u64>,
}

/// One validated detection call. Constructed per call and never shared.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRequest {
    pub point: GeoPoint,
    pub radius_km: f64,
    pub max_alternatives: usize,
    pub deadline: Duration,
}

impl DetectionRequest {
    /// Resolve `options` against `defaults` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Validation`] for an out-of-range point or a
    /// non-positive search radius.
    pub fn new(
        point: GeoPoint,
        options: &DetectOptions,
        defaults: &DetectSettings,
    ) -> Result<Self, DetectError> {
        point
            .validate()
            .map_err(|e| DetectError::Validation(e.to_string()))?;

        let radius_km = options.radius_km.unwrap_or(defaults.radius_km);
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(DetectError::Validation(format!(
                "radius_km must be a positive number, got {radius_km}"
            )));
        }

        Ok(Self {
            point,
            radius_km,
            max_alternatives: options.max_alternatives.unwrap_or(defaults.max_alternatives),
            deadline: Duration::from_millis(options.deadline_ms.unwrap_or(defaults.deadline_ms)),
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn deadline_ms(&self) -> u64 {
        self.deadline.as_millis() as u64
    }
}
