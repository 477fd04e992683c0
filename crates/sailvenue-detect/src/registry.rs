//! Read-only venue registry capability consumed by both detection paths.

use std::path::Path;

use async_trait::async_trait;
use sailvenue_core::{GeoPoint, VenueRecord};

use crate::error::RegistryError;
use crate::geo::haversine_km;

/// Spatial lookup over registered venues.
///
/// Implementations return every venue that could be in range of `point`:
/// at least those within `radius_km`, plus any whose own effective radius
/// reaches the point. An `Err` means the store failed; zero matches is
/// `Ok(vec![])`.
#[async_trait]
pub trait VenueRegistry: Send + Sync {
    async fn find_within_radius(
        &self,
        point: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<VenueRecord>, RegistryError>;
}

/// Registry held entirely in memory, typically loaded from the venues YAML.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    venues: Vec<VenueRecord>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new(venues: Vec<VenueRecord>) -> Self {
        Self { venues }
    }

    /// Load a registry from a venues YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`sailvenue_core::ConfigError`] if the file cannot be read or
    /// fails validation.
    pub fn from_file(path: &Path) -> Result<Self, sailvenue_core::ConfigError> {
        let venues = sailvenue_core::load_venues(path)?;
        tracing::info!(path = %path.display(), count = venues.len(), "loaded venue registry");
        Ok(Self::new(venues))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.venues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    #[must_use]
    pub fn venues(&self) -> &[VenueRecord] {
        &self.venues
    }
}

#[async_trait]
impl VenueRegistry for InMemoryRegistry {
    async fn find_within_radius(
        &self,
        point: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<VenueRecord>, RegistryError> {
        Ok(self
            .venues
            .iter()
            .filter(|venue| {
                // NaN radii compare false on both sides and fall back to the search radius.
                let reach = radius_km.max(venue.effective_radius_km);
                haversine_km(point, venue.center) <= reach
            })
            .cloned()
            .collect())
    }
}
