use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::ConfigError;

/// A registered sailing venue: the registry's unit of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub id: String,
    pub name: String,
    pub center: GeoPoint,
    /// Detection reach of the venue in kilometres. Must be positive.
    pub effective_radius_km: f64,
}

/// One venue entry as written in the registry YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub effective_radius_km: f64,
    pub notes: Option<String>,
}

impl VenueConfig {
    #[must_use]
    pub fn to_record(&self) -> VenueRecord {
        VenueRecord {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            center: GeoPoint::new(self.latitude, self.longitude),
            effective_radius_km: self.effective_radius_km,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VenuesFile {
    venues: Vec<VenueConfig>,
}

/// Load and validate the venue registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_venues(path: &Path) -> Result<Vec<VenueRecord>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::VenuesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_venues(&content)
}

/// Parse and validate venue registry YAML that is already in memory.
///
/// # Errors
///
/// Returns [`ConfigError::VenuesFileParse`] on malformed YAML and
/// [`ConfigError::Validation`] when an entry breaks a registry invariant.
pub fn parse_venues(content: &str) -> Result<Vec<VenueRecord>, ConfigError> {
    let venues_file: VenuesFile = serde_yaml::from_str(content)?;

    validate_venues(&venues_file)?;

    Ok(venues_file.venues.iter().map(VenueConfig::to_record).collect())
}

fn validate_venues(venues_file: &VenuesFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for venue in &venues_file.venues {
        let id = venue.id.trim();
        if id.is_empty() {
            return Err(ConfigError::Validation(format!(
                "venue '{}' has an empty id",
                venue.name
            )));
        }

        if venue.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "venue '{id}' has an empty name"
            )));
        }

        if let Err(e) = GeoPoint::new(venue.latitude, venue.longitude).validate() {
            return Err(ConfigError::Validation(format!(
                "venue '{id}' has an invalid center: {e}"
            )));
        }

        if !venue.effective_radius_km.is_finite() || venue.effective_radius_km <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "venue '{id}' has invalid effective_radius_km {}; must be > 0",
                venue.effective_radius_km
            )));
        }

        if !seen_ids.insert(id.to_string()) {
            return Err(ConfigError::Validation(format!("duplicate venue id: '{id}'")));
        }
    }

    Ok(())
}
