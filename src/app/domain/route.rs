//! The ordered list of destinations and everything derived from it.

use super::destination::{Coordinates, Destination};
use super::geo::Bounds;
use crate::app::services::geocoder::{GeocodeOutcome, Geocoder, resolve};

pub const ROUTE_SEPARATOR: &str = " → ";
pub const EMPTY_ROUTE_PLACEHOLDER: &str = "Añade destinos para ver tu ruta";

/// Perpendicular offset of the synthetic midpoint, as a fraction of the segment.
pub const CURVE_FACTOR: f64 = 0.2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    destinations: Vec<Destination>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_destinations(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn push(&mut self, destination: Destination) {
        self.destinations.push(destination);
    }

    /// Geocode `name` and append it. Returns false when the place could not be
    /// found or the lookup failed; the route is left untouched in that case.
    ///
    /// This blocks on the lookup. The desktop app geocodes on a worker thread
    /// through `StampSession::begin_geocode` and appends with [`Route::push`].
    pub fn add_destination(&mut self, geocoder: &dyn Geocoder, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match resolve(geocoder, name) {
            GeocodeOutcome::Found(coordinates) => {
                self.push(Destination::new(name, coordinates));
                true
            }
            GeocodeOutcome::NotFound | GeocodeOutcome::Failed(_) => false,
        }
    }

    /// Remove the destination at `index`. Out-of-range indices are ignored.
    pub fn remove_destination(&mut self, index: usize) -> bool {
        if index >= self.destinations.len() {
            return false;
        }
        self.destinations.remove(index);
        true
    }

    pub fn names(&self) -> Vec<&str> {
        self.destinations.iter().map(|d| d.name.as_str()).collect()
    }

    /// Names joined by the route arrow, empty string for an empty route.
    pub fn joined_names(&self) -> String {
        self.names().join(ROUTE_SEPARATOR)
    }

    pub fn display_string(&self) -> String {
        if self.is_empty() {
            EMPTY_ROUTE_PLACEHOLDER.to_string()
        } else {
            self.joined_names()
        }
    }

    pub fn coordinates(&self) -> Vec<Coordinates> {
        self.destinations.iter().map(|d| d.coordinates).collect()
    }

    /// Display geometry with one bowed midpoint per leg. Not the canonical route.
    pub fn curved_path(&self) -> Vec<Coordinates> {
        curve(&self.coordinates())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.coordinates())
    }

    /// Arithmetic mean of all destination coordinates.
    pub fn centroid(&self) -> Option<Coordinates> {
        if self.is_empty() {
            return None;
        }
        let n = self.destinations.len() as f64;
        let (lon, lat) = self
            .destinations
            .iter()
            .fold((0.0, 0.0), |(lon, lat), d| (lon + d.coordinates.lon, lat + d.coordinates.lat));
        Some(Coordinates::new(lon / n, lat / n))
    }
}

/// Insert a perpendicular-offset midpoint between every consecutive pair.
/// Zero or one point is returned unchanged.
pub fn curve(points: &[Coordinates]) -> Vec<Coordinates> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let mut curved = Vec::with_capacity(points.len() * 2 - 1);
    curved.push(points[0]);
    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let mid = start.midpoint(end);
        let dx = end.lon - start.lon;
        let dy = end.lat - start.lat;
        // Rotate the segment vector 90 degrees
        curved.push(Coordinates::new(mid.lon - dy * CURVE_FACTOR, mid.lat + dx * CURVE_FACTOR));
        curved.push(end);
    }
    curved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::infrastructure::error::{AppError, Result};
    use std::collections::HashMap;

    struct FakeGeocoder {
        places: HashMap<&'static str, Coordinates>,
    }

    impl FakeGeocoder {
        fn chile() -> Self {
            let mut places = HashMap::new();
            places.insert("Santiago", Coordinates::new(-70.66, -33.45));
            places.insert("Valparaíso", Coordinates::new(-71.6, -33.05));
            places.insert("Puerto Montt", Coordinates::new(-72.94, -41.47));
            Self { places }
        }
    }

    impl Geocoder for FakeGeocoder {
        fn lookup(&self, place: &str) -> Result<Option<Coordinates>> {
            if place == "offline" {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "geocoding service unreachable",
                )));
            }
            Ok(self.places.get(place).copied())
        }
    }

    fn santiago_valparaiso() -> Route {
        Route::from_destinations(vec![
            Destination::new("Santiago", Coordinates::new(-70.66, -33.45)),
            Destination::new("Valparaíso", Coordinates::new(-71.6, -33.05)),
        ])
    }

    #[test]
    fn test_display_string_example() {
        assert_eq!(santiago_valparaiso().display_string(), "Santiago → Valparaíso");
    }

    #[test]
    fn test_display_string_placeholder_when_empty() {
        assert_eq!(Route::new().display_string(), EMPTY_ROUTE_PLACEHOLDER);
        assert_eq!(Route::new().joined_names(), "");
    }

    #[test]
    fn test_add_destination_keeps_insertion_order() {
        let geocoder = FakeGeocoder::chile();
        let mut route = Route::new();
        assert!(route.add_destination(&geocoder, "Puerto Montt"));
        assert!(route.add_destination(&geocoder, "  Santiago "));
        assert!(route.add_destination(&geocoder, "Valparaíso"));
        assert_eq!(route.display_string(), "Puerto Montt → Santiago → Valparaíso");
    }

    #[test]
    fn test_add_destination_not_found_leaves_route() {
        let geocoder = FakeGeocoder::chile();
        let mut route = santiago_valparaiso();
        assert!(!route.add_destination(&geocoder, "Atlantis"));
        assert!(!route.add_destination(&geocoder, "offline"));
        assert!(!route.add_destination(&geocoder, "   "));
        assert_eq!(route, santiago_valparaiso());
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut route = santiago_valparaiso();
        assert!(!route.remove_destination(2));
        assert!(!route.remove_destination(usize::MAX));
        assert_eq!(route, santiago_valparaiso());
    }

    #[test]
    fn test_remove_in_range() {
        let mut route = santiago_valparaiso();
        assert!(route.remove_destination(0));
        assert_eq!(route.names(), vec!["Valparaíso"]);
    }

    #[test]
    fn test_curved_path_two_points() {
        let path = santiago_valparaiso().curved_path();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], Coordinates::new(-70.66, -33.45));
        assert_eq!(path[2], Coordinates::new(-71.6, -33.05));

        // mid = (-71.13, -33.25), dx = -0.94, dy = 0.4
        let mid = path[1];
        assert!((mid.lon - (-71.13 - 0.4 * 0.2)).abs() < 1e-9);
        assert!((mid.lat - (-33.25 + -0.94 * 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_curved_path_small_inputs_unchanged() {
        assert!(curve(&[]).is_empty());
        let single = [Coordinates::new(1.0, 2.0)];
        assert_eq!(curve(&single), single.to_vec());
    }

    #[test]
    fn test_curved_path_length() {
        let points: Vec<_> = (0..5).map(|i| Coordinates::new(i as f64, 0.0)).collect();
        assert_eq!(curve(&points).len(), 9);
    }

    #[test]
    fn test_centroid() {
        let route = santiago_valparaiso();
        let c = route.centroid().unwrap();
        assert!((c.lon - (-71.13)).abs() < 1e-9);
        assert!((c.lat - (-33.25)).abs() < 1e-9);
        assert!(Route::new().centroid().is_none());
    }
}
