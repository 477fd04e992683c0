//! Confidence model: maps fix-to-venue distance onto a `[0.1, 1.0]` score.
//!
//! Decay is linear in the normalised distance `d / r`: 1.0 at the venue
//! centre, falling to the floor at the edge of the venue's effective radius
//! and staying there beyond it.

use crate::error::DegenerateVenue;

/// Score at distance zero.
pub const CONFIDENCE_CEILING: f64 = 1.0;

/// Score at and beyond the venue's effective radius.
pub const CONFIDENCE_FLOOR: f64 = 0.1;

/// Confidence that a fix `distance_km` from a venue centre is at that venue.
///
/// # Errors
///
/// Returns [`DegenerateVenue`] when `effective_radius_km` is zero, negative
/// or non-finite.
pub fn confidence(distance_km: f64, effective_radius_km: f64) -> Result<f64, DegenerateVenue> {
    if !effective_radius_km.is_finite() || effective_radius_km <= 0.0 {
        return Err(DegenerateVenue {
            radius_km: effective_radius_km,
        });
    }

    let normalized = distance_km.max(0.0) / effective_radius_km;
    let score = CONFIDENCE_CEILING - (CONFIDENCE_CEILING - CONFIDENCE_FLOOR) * normalized;
    Ok(score.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING))
}
