//! Attendance geofencing.
//!
//! A device position is in range of a company location when its great-circle
//! distance to the location centre is within the location radius plus a
//! tolerance derived from the reported GPS accuracy.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{HrError, HrResult};
use crate::model::location::{CompanyLocation, GeoPosition};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
pub const DEFAULT_ACCURACY_METERS: f64 = 50.0;
pub const MIN_TOLERANCE_METERS: f64 = 50.0;
pub const MAX_TOLERANCE_METERS: f64 = 150.0;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NearestLocation {
    pub id: u64,
    pub name: String,
    pub name_ar: Option<String>,
    pub radius_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProximityCheck {
    pub is_within_range: bool,
    pub nearest_location: Option<NearestLocation>,
    pub distance_meters: Option<f64>,
    pub effective_radius_meters: Option<f64>,
    pub message: String,
}

impl ProximityCheck {
    /// Used when there is nothing to check against.
    pub fn fail_open(message: impl Into<String>) -> Self {
        Self {
            is_within_range: true,
            nearest_location: None,
            distance_meters: None,
            effective_radius_meters: None,
            message: message.into(),
        }
    }
}

/// Haversine distance in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

pub fn tolerance_for(accuracy: Option<f64>) -> f64 {
    accuracy
        .filter(|a| a.is_finite())
        .unwrap_or(DEFAULT_ACCURACY_METERS)
        .clamp(MIN_TOLERANCE_METERS, MAX_TOLERANCE_METERS)
}

pub fn validate_position(position: &GeoPosition) -> HrResult<()> {
    let GeoPosition { latitude, longitude, .. } = *position;
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(HrError::validation("latitude must be between -90 and 90"));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(HrError::validation("longitude must be between -180 and 180"));
    }
    Ok(())
}

/// Closest active location and its distance. Ties keep the first location
/// in iteration order.
pub fn nearest_active<'a>(
    position: &GeoPosition,
    locations: &'a [CompanyLocation],
) -> Option<(&'a CompanyLocation, f64)> {
    locations
        .iter()
        .filter(|l| l.is_active)
        .map(|l| {
            let distance = haversine_distance(position.latitude, position.longitude, l.latitude, l.longitude);
            (l, distance)
        })
        .fold(None, |best, candidate| match best {
            Some((_, best_distance)) if best_distance <= candidate.1 => best,
            _ => Some(candidate),
        })
}

pub fn validate_proximity(position: &GeoPosition, locations: &[CompanyLocation]) -> ProximityCheck {
    let Some((location, distance)) = nearest_active(position, locations) else {
        return ProximityCheck::fail_open(
            "No active company locations are configured; location check skipped",
        );
    };

    let effective_radius = location.radius_meters.max(0.0) + tolerance_for(position.accuracy);
    let is_within_range = distance <= effective_radius;
    let message = if is_within_range {
        format!("Within range of {} ({:.0} m)", location.name, distance)
    } else {
        format!(
            "Too far from {}: {:.0} m away, allowed {:.0} m",
            location.name, distance, effective_radius
        )
    };

    ProximityCheck {
        is_within_range,
        nearest_location: Some(NearestLocation {
            id: location.id,
            name: location.name.clone(),
            name_ar: location.name_ar.clone(),
            radius_meters: location.radius_meters,
        }),
        distance_meters: Some(distance),
        effective_radius_meters: Some(effective_radius),
        message,
    }
}

#[cfg(test)]
pub(crate) fn test_location(id: u64, latitude: f64, longitude: f64, radius_meters: f64) -> CompanyLocation {
    CompanyLocation {
        id,
        name: format!("Site {id}"),
        name_ar: None,
        latitude,
        longitude,
        radius_meters,
        work_start_time: chrono::NaiveTime::from_hms_opt(8, 0, 0),
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(latitude: f64, longitude: f64, accuracy: Option<f64>) -> GeoPosition {
        GeoPosition { latitude, longitude, accuracy }
    }

    #[test]
    fn known_distance_riyadh_to_jeddah() {
        // ~846 km great-circle
        let d = haversine_distance(24.7136, 46.6753, 21.4858, 39.1925);
        assert!((d - 846_000.0).abs() < 5_000.0, "got {d}");
    }

    #[test]
    fn no_active_locations_fails_open() {
        let mut inactive = test_location(1, 0.0, 0.0, 10.0);
        inactive.is_active = false;

        for locations in [vec![], vec![inactive]] {
            let check = validate_proximity(&position(89.0, 179.0, None), &locations);
            assert!(check.is_within_range);
            assert!(check.nearest_location.is_none());
        }
    }

    #[test]
    fn exact_center_is_in_range_for_zero_radius() {
        let site = test_location(7, 24.7136, 46.6753, 0.0);
        let check = validate_proximity(&position(24.7136, 46.6753, Some(5.0)), &[site]);
        assert!(check.is_within_range);
        assert!(check.distance_meters.unwrap() < 1e-6);
    }

    #[test]
    fn tolerance_is_clamped() {
        assert_eq!(tolerance_for(None), 50.0);
        assert_eq!(tolerance_for(Some(10.0)), 50.0);
        assert_eq!(tolerance_for(Some(90.0)), 90.0);
        assert_eq!(tolerance_for(Some(900.0)), 150.0);
        assert_eq!(tolerance_for(Some(f64::NAN)), 50.0);
    }

    #[test]
    fn accuracy_widens_the_radius() {
        // 0.002 deg latitude is ~222 m north of the site.
        let site = test_location(1, 24.0, 46.0, 100.0);
        let near_edge = position(24.002, 46.0, None);
        assert!(!validate_proximity(&near_edge, std::slice::from_ref(&site)).is_within_range);

        let poor_fix = position(24.002, 46.0, Some(140.0));
        let check = validate_proximity(&poor_fix, &[site]);
        assert!(check.is_within_range);
        assert_eq!(check.effective_radius_meters, Some(240.0));
    }

    #[test]
    fn picks_the_nearest_active_location() {
        let far = test_location(1, 25.0, 46.0, 100.0);
        let near = test_location(2, 24.0005, 46.0, 100.0);
        let mut nearer_but_inactive = test_location(3, 24.0, 46.0, 100.0);
        nearer_but_inactive.is_active = false;

        let check = validate_proximity(&position(24.0, 46.0, None), &[far, nearer_but_inactive, near]);
        assert_eq!(check.nearest_location.map(|l| l.id), Some(2));
        assert!(check.is_within_range);
    }

    #[test]
    fn ties_keep_the_first_location() {
        let a = test_location(1, 24.0, 46.0, 10.0);
        let b = test_location(2, 24.0, 46.0, 10.0);
        let sites = [a, b];
        let (nearest, _) = nearest_active(&position(24.0, 46.0, None), &sites).unwrap();
        assert_eq!(nearest.id, 1);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(validate_position(&position(91.0, 0.0, None)).is_err());
        assert!(validate_position(&position(0.0, -181.0, None)).is_err());
        assert!(validate_position(&position(f64::NAN, 0.0, None)).is_err());
        assert!(validate_position(&position(-90.0, 180.0, None)).is_ok());
    }
}
