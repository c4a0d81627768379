//! Web-Mercator helpers shared by the preview surface and the exporters.

use std::f64::consts::PI;

use super::destination::Coordinates;

pub const TILE_SIZE: f64 = 256.0;
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
pub const MAX_ZOOM: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn from_points(points: &[Coordinates]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            west: first.lon,
            south: first.lat,
            east: first.lon,
            north: first.lat,
        };
        for p in &points[1..] {
            bounds.extend(*p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: Coordinates) {
        self.west = self.west.min(p.lon);
        self.east = self.east.max(p.lon);
        self.south = self.south.min(p.lat);
        self.north = self.north.max(p.lat);
    }
}

/// Position in world pixels at zoom 0 (a 256x256 square).
fn project_unit(c: Coordinates) -> (f64, f64) {
    let lat = c.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (c.lon + 180.0) / 360.0 * TILE_SIZE;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * TILE_SIZE;
    (x, y)
}

fn unproject_unit(x: f64, y: f64) -> Coordinates {
    let lon = x / TILE_SIZE * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / TILE_SIZE);
    let lat = n.sinh().atan().to_degrees();
    Coordinates::new(lon, lat)
}

/// Where a map view is looking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: Coordinates,
    pub zoom: f64,
}

impl Default for Camera {
    /// Santiago de Chile at country level.
    fn default() -> Self {
        Self {
            center: Coordinates::new(-70.6693, -33.4489),
            zoom: 5.0,
        }
    }
}

impl Camera {
    pub fn new(center: Coordinates, zoom: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, MAX_ZOOM),
        }
    }

    fn scale(&self) -> f64 {
        2f64.powf(self.zoom)
    }

    /// Project to pixel coordinates inside a `width x height` viewport.
    pub fn project(&self, c: Coordinates, width: f64, height: f64) -> (f64, f64) {
        let scale = self.scale();
        let (cx, cy) = project_unit(self.center);
        let (x, y) = project_unit(c);
        (
            width / 2.0 + (x - cx) * scale,
            height / 2.0 + (y - cy) * scale,
        )
    }

    /// Camera showing all of `bounds` with `padding` pixels on every side.
    pub fn fit(bounds: Bounds, width: f64, height: f64, padding: f64) -> Camera {
        let (west, north) = project_unit(Coordinates::new(bounds.west, bounds.north));
        let (east, south) = project_unit(Coordinates::new(bounds.east, bounds.south));
        let center = unproject_unit((west + east) / 2.0, (north + south) / 2.0);

        let span_x = east - west;
        let span_y = south - north;
        let avail_w = (width - 2.0 * padding).max(1.0);
        let avail_h = (height - 2.0 * padding).max(1.0);

        let zoom = match (span_x > f64::EPSILON, span_y > f64::EPSILON) {
            (false, false) => MAX_ZOOM,
            (true, false) => (avail_w / span_x).log2(),
            (false, true) => (avail_h / span_y).log2(),
            (true, true) => (avail_w / span_x).min(avail_h / span_y).log2(),
        };
        Camera::new(center, zoom)
    }
}

/// Encode points with the precision-5 polyline algorithm (lat before lon).
pub fn encode_polyline(points: &[Coordinates]) -> String {
    let mut out = String::new();
    let (mut prev_lat, mut prev_lon) = (0i64, 0i64);
    for p in points {
        let lat = (p.lat * 1e5).round() as i64;
        let lon = (p.lon * 1e5).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lon - prev_lon, &mut out);
        prev_lat = lat;
        prev_lon = lon;
    }
    out
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push(char::from((((v & 0x1f) | 0x20) + 63) as u8));
        v >>= 5;
    }
    out.push(char::from((v + 63) as u8));
}
