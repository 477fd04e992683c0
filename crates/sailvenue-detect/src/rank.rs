//! Candidate ranking: distance, reach filtering, dedup and ordering.

use std::cmp::Ordering;
use std::collections::HashSet;

use sailvenue_core::{GeoPoint, VenueRecord};

use crate::confidence::confidence;
use crate::geo::haversine_km;
use crate::types::Candidate;

/// Score and order `venues` against `point`.
///
/// A venue is kept when it lies within `search_radius_km` or within its own
/// effective radius, so a venue can widen the search but never narrow it.
/// Degenerate venues are logged and skipped. Duplicate ids keep the nearest
/// record. Output is sorted ascending by distance, ties by venue id.
///
/// Returns the full ranked list; callers decide how many alternatives to keep.
#[must_use]
pub fn rank(point: GeoPoint, search_radius_km: f64, venues: &[VenueRecord]) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = venues
        .iter()
        .filter_map(|venue| {
            let distance_km = haversine_km(point, venue.center);
            if distance_km > search_radius_km && distance_km > venue.effective_radius_km {
                return None;
            }

            match confidence(distance_km, venue.effective_radius_km) {
                Ok(confidence) => Some(Candidate {
                    venue: venue.clone(),
                    distance_km,
                    confidence,
                }),
                Err(e) => {
                    tracing::warn!(
                        venue_id = %venue.id,
                        error = %e,
                        "excluding degenerate venue from ranking"
                    );
                    None
                }
            }
        })
        .collect();

    candidates.sort_by(compare_candidates);

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.venue.id.clone()));
    candidates
}

/// Ascending distance, then venue id for a deterministic order.
pub(crate) fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| a.venue.id.cmp(&b.venue.id))
}
