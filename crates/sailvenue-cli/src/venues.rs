//! Registry inspection command.

use std::path::Path;

use sailvenue_core::VenueRecord;

/// Load and validate the registry at `path`, then print one row per venue.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub(crate) fn run_venues(path: &Path) -> anyhow::Result<()> {
    let venues = sailvenue_core::load_venues(path)?;

    if venues.is_empty() {
        println!("no venues registered in {}", path.display());
        return Ok(());
    }

    println!("{}", format_header());
    for venue in &venues {
        println!("{}", format_row(venue));
    }
    println!("{} venues in {}", venues.len(), path.display());

    Ok(())
}

fn format_header() -> String {
    format!(
        "{:<28}{:<30}{:>10}{:>12}{:>11}",
        "ID", "NAME", "LAT", "LNG", "RADIUS_KM"
    )
}

fn format_row(venue: &VenueRecord) -> String {
    let name = if venue.name.chars().count() > 28 {
        format!("{}...", venue.name.chars().take(25).collect::<String>())
    } else {
        venue.name.clone()
    };
    format!(
        "{:<28}{:<30}{:>10.4}{:>12.4}{:>11.1}",
        venue.id,
        name,
        venue.center.latitude,
        venue.center.longitude,
        venue.effective_radius_km
    )
}

#[cfg(test)]
mod tests {
    use sailvenue_core::GeoPoint;

    use super::*;

    fn venue(name: &str) -> VenueRecord {
        VenueRecord {
            id: "cowes-solent".to_string(),
            name: name.to_string(),
            center: GeoPoint::new(50.7628, -1.2977),
            effective_radius_km: 25.0,
        }
    }

    #[test]
    fn row_formats_coordinates_and_radius() {
        let row = format_row(&venue("The Solent, Cowes"));
        assert!(row.starts_with("cowes-solent"));
        assert!(row.contains("The Solent, Cowes"));
        assert!(row.contains("50.7628"));
        assert!(row.contains("-1.2977"));
        assert!(row.trim_end().ends_with("25.0"));
    }

    #[test]
    fn row_truncates_long_names() {
        let row = format_row(&venue("A Very Long Venue Name That Keeps Going"));
        assert!(row.contains("A Very Long Venue Name Th..."));
    }

    #[test]
    fn bundled_registry_validates() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/venues.yaml");
        run_venues(&path).expect("bundled registry should validate");
    }
}
