//! Great-circle distance annotation and ranking.

use std::cmp::Ordering;

use crate::service::{Coordinates, Service};

const EARTH_RADIUS_KM: f64 = 6371.0;
const MILES_PER_KM: f64 = 0.621371;

/// Haversine great-circle distance between two coordinate pairs, in miles.
#[must_use]
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin() * MILES_PER_KM
}

/// Annotates each service with its distance from `origin`, drops those
/// beyond `radius_miles` (inclusive boundary), sorts ascending by distance,
/// and truncates to `limit`.
///
/// The sort is stable, so equidistant records keep their original relative
/// order, and it runs on full precision — rounding for display happens at
/// the presentation boundary, never here. Truncation happens after the full
/// eligible set is sorted, so the result is always the nearest `limit`.
#[must_use]
pub fn rank_by_distance(
    services: &[Service],
    origin: Coordinates,
    radius_miles: f64,
    limit: usize,
) -> Vec<Service> {
    let mut ranked: Vec<Service> = services
        .iter()
        .filter_map(|service| {
            let distance = haversine_miles(origin, service.location);
            if distance <= radius_miles {
                let mut annotated = service.clone();
                annotated.distance_miles = Some(distance);
                Some(annotated)
            } else {
                None
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_miles
            .partial_cmp(&b.distance_miles)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

/// Rounds a distance to two decimal places for display.
#[must_use]
pub fn display_miles(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Coordinates = Coordinates::new(-0.1419, 51.5010);

    fn service_at(name: &str, longitude: f64, latitude: f64) -> Service {
        Service {
            name: name.to_string(),
            description: String::new(),
            address: String::new(),
            postcode: String::new(),
            email: String::new(),
            website: String::new(),
            phone: String::new(),
            donate_url: String::new(),
            service_types: vec!["Refuge".to_string()],
            specialisms: Vec::new(),
            local_authority: String::new(),
            approved: true,
            location: Coordinates::new(longitude, latitude),
            distance_miles: None,
        }
    }

    #[test]
    fn zero_distance_for_identical_points() {
        assert!(haversine_miles(ORIGIN, ORIGIN).abs() < 1e-9);
    }

    #[test]
    fn westminster_to_spitalfields_is_about_three_and_a_quarter_miles() {
        let spitalfields = Coordinates::new(-0.0702, 51.5154);
        let d = haversine_miles(ORIGIN, spitalfields);
        assert!((d - 3.24).abs() < 0.05, "got {d}");
    }

    #[test]
    fn ranks_ascending_with_distances_attached() {
        let services = vec![
            service_at("B", -0.0702, 51.5154),
            service_at("A", -0.1419, 51.5010),
        ];

        let ranked = rank_by_distance(&services, ORIGIN, 10.0, 10);
        let names: Vec<&str> = ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(ranked[0].distance_miles.unwrap() < 0.001);
        let b = ranked[1].distance_miles.unwrap();
        assert!((b - 3.24).abs() < 0.05, "got {b}");
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let edge = service_at("edge", -0.1419, 51.5733);
        let exact_radius = haversine_miles(ORIGIN, edge.location);

        let included = rank_by_distance(std::slice::from_ref(&edge), ORIGIN, exact_radius, 10);
        assert_eq!(included.len(), 1);

        // A record even marginally farther out is excluded at the same radius.
        let beyond = service_at("beyond", -0.1419, 51.5833);
        let excluded = rank_by_distance(std::slice::from_ref(&beyond), ORIGIN, exact_radius, 10);
        assert!(excluded.is_empty());
    }

    #[test]
    fn truncation_keeps_the_nearest_not_an_arbitrary_subset() {
        // 15 services in-radius, farthest first, so truncation before sorting
        // would keep the wrong ones.
        let services: Vec<Service> = (0..15)
            .map(|i| {
                let offset = f64::from(15 - i) * 0.005;
                service_at(&format!("s{i}"), -0.1419, 51.5010 + offset)
            })
            .collect();

        let ranked = rank_by_distance(&services, ORIGIN, 10.0, 10);
        assert_eq!(ranked.len(), 10);
        // The five farthest (largest offsets, i.e. the first five pushed) are gone.
        for service in &ranked {
            let idx: usize = service.name[1..].parse().unwrap();
            assert!(idx >= 5, "{} should have been truncated away", service.name);
        }
        // And the output is ascending.
        let distances: Vec<f64> = ranked.iter().map(|s| s.distance_miles.unwrap()).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn stable_order_for_equidistant_records() {
        let services = vec![
            service_at("first", -0.0702, 51.5154),
            service_at("second", -0.0702, 51.5154),
        ];

        let ranked = rank_by_distance(&services, ORIGIN, 10.0, 10);
        let names: Vec<&str> = ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn unset_coordinates_never_rank_near_a_uk_origin() {
        let placeholder = service_at("missing", 0.0, 0.0);
        let ranked = rank_by_distance(std::slice::from_ref(&placeholder), ORIGIN, 10.0, 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn display_rounding_is_two_decimal_places() {
        assert!((display_miles(3.239_926) - 3.24).abs() < f64::EPSILON);
        assert!((display_miles(0.004) - 0.0).abs() < f64::EPSILON);
    }
}
