//! Great-circle distance and fix coarsening.
//!
//! Coarsening snaps a GPS fix to a uniform grid cell. Longitude step widens
//! per latitude band so each cell spans roughly the same physical width
//! wherever it falls.

use sailvenue_core::GeoPoint;

/// IUGG mean Earth radius.
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

const METERS_PER_LAT_DEGREE: f64 = 111_320.0;

/// Haversine distance between two points in kilometres.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Integer grid cell a fix falls in for a given cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: i64,
    pub col: i64,
}

impl GridCell {
    /// Snap `point` to a cell roughly `cell_meters` on a side.
    ///
    /// The longitude step is computed from the row's centre latitude, so every
    /// point in one row shares the same column width.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn containing(point: GeoPoint, cell_meters: f64) -> Self {
        let lat_step = cell_meters / METERS_PER_LAT_DEGREE;
        let row = (point.latitude / lat_step).floor() as i64;

        #[allow(clippy::cast_precision_loss)]
        let row_center = (row as f64 + 0.5) * lat_step;
        // Near the poles cos→0; cap the widening so columns stay finite.
        let cos_lat = row_center.to_radians().cos().abs().max(0.01);
        let lng_step = lat_step / cos_lat;
        let col = (point.longitude / lng_step).floor() as i64;

        Self { row, col }
    }
}
