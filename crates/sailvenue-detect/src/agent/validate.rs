//! Validation of agent answers against the deterministic ranking.
//!
//! The agent's structured answer is untrusted. It is accepted only if every
//! venue it names exists in the registry's ranked candidates, its numbers are
//! in range and consistent with the geodesy, and its choice of primary venue
//! agrees with the nearest candidate. Accepted answers are rebuilt from the
//! ranked candidates so the numeric fields always come from the confidence
//! model; only the agent's narrative is carried over.

use std::collections::{HashMap, HashSet};

use crate::agent::client::{AgentCandidate, AgentDetection};
use crate::error::AgentError;
use crate::rank::compare_candidates;
use crate::types::{Candidate, DetectionRequest, DetectionResult, DetectionSource};

/// Absolute slack allowed between the agent's distance and haversine.
const DISTANCE_TOLERANCE_KM: f64 = 0.5;

/// Relative slack allowed between the agent's distance and haversine.
const DISTANCE_TOLERANCE_RATIO: f64 = 0.05;

/// Check `agent` against `ranked` and build the trusted result.
///
/// # Errors
///
/// Returns [`AgentError::InvalidResponse`] describing the first violated
/// invariant.
pub(crate) fn validate_agent_detection(
    request: &DetectionRequest,
    agent: &AgentDetection,
    ranked: &[Candidate],
) -> Result<DetectionResult, AgentError> {
    if agent.alternatives.len() > request.max_alternatives {
        return Err(reject(format!(
            "{} alternatives exceeds max_alternatives {}",
            agent.alternatives.len(),
            request.max_alternatives
        )));
    }

    let by_id: HashMap<&str, &Candidate> =
        ranked.iter().map(|c| (c.venue.id.as_str(), c)).collect();

    let mut seen = HashSet::new();
    for reported in agent.venue.iter().chain(&agent.alternatives) {
        check_candidate(reported, &by_id)?;
        if !seen.insert(reported.venue_id.as_str()) {
            return Err(reject(format!(
                "venue '{}' appears more than once",
                reported.venue_id
            )));
        }
    }

    if agent
        .alternatives
        .windows(2)
        .any(|w| w[0].distance_km > w[1].distance_km)
    {
        return Err(reject("alternatives are not sorted by distance_km".into()));
    }

    let mut result = match (&agent.venue, ranked.first()) {
        (None, None) => DetectionResult::not_found(request.point, DetectionSource::Ai),
        (None, Some(nearest)) => {
            return Err(reject(format!(
                "agent reported no venue but '{}' is {:.2} km away",
                nearest.venue.id, nearest.distance_km
            )));
        }
        (Some(chosen), None) => {
            return Err(reject(format!(
                "agent chose '{}' but no venue is in range",
                chosen.venue_id
            )));
        }
        (Some(chosen), Some(nearest)) if chosen.venue_id != nearest.venue.id => {
            return Err(reject(format!(
                "agent chose '{}' but nearest venue is '{}'",
                chosen.venue_id, nearest.venue.id
            )));
        }
        (Some(_), Some(nearest)) => {
            let mut alternatives: Vec<Candidate> = agent
                .alternatives
                .iter()
                .filter_map(|a| by_id.get(a.venue_id.as_str()).map(|c| (*c).clone()))
                .collect();
            alternatives.sort_by(compare_candidates);

            DetectionResult {
                alternatives,
                ..DetectionResult::from_ranked(
                    request.point,
                    std::slice::from_ref(nearest),
                    0,
                    DetectionSource::Ai,
                )
            }
        }
    };

    result.reasoning = agent
        .reasoning
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned);

    Ok(result)
}

fn check_candidate(
    reported: &AgentCandidate,
    by_id: &HashMap<&str, &Candidate>,
) -> Result<(), AgentError> {
    let id = reported.venue_id.as_str();
    if id.trim().is_empty() {
        return Err(reject("candidate with empty venue_id".into()));
    }

    if !reported.confidence.is_finite() || !(0.0..=1.0).contains(&reported.confidence) {
        return Err(reject(format!(
            "venue '{id}' has confidence {} outside [0, 1]",
            reported.confidence
        )));
    }

    if !reported.distance_km.is_finite() || reported.distance_km < 0.0 {
        return Err(reject(format!(
            "venue '{id}' has invalid distance_km {}",
            reported.distance_km
        )));
    }

    let Some(known) = by_id.get(id) else {
        return Err(reject(format!("unknown or out-of-range venue '{id}'")));
    };

    let tolerance = DISTANCE_TOLERANCE_KM.max(known.distance_km * DISTANCE_TOLERANCE_RATIO);
    if (reported.distance_km - known.distance_km).abs() > tolerance {
        return Err(reject(format!(
            "venue '{id}' distance {:.3} km disagrees with computed {:.3} km",
            reported.distance_km, known.distance_km
        )));
    }

    Ok(())
}

fn reject(reason: String) -> AgentError {
    AgentError::InvalidResponse(reason)
}
