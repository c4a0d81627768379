//! Map images from the hosted static images API.

use image::RgbaImage;
use tracing::debug;
use url::Url;

use super::fonts::FontBook;
use super::{MapImageRequest, MapImageSource};
use crate::app::domain::color::LineColor;
use crate::app::domain::geo::encode_polyline;
use crate::app::domain::map_style::style_path;
use crate::app::infrastructure::error::{AppError, Result};

pub const STATIC_ZOOM: u32 = 4;
pub const MAX_STATIC_SIZE: u32 = 1280;
const OVERLAY_WIDTH: u32 = 5;
const OVERLAY_OPACITY: u32 = 1;
const OVERLAY_COLOR: LineColor = LineColor::INDIGO;
const FETCH_TIMEOUT_SECS: u64 = 30;

pub struct StaticMapClient {
    endpoint: String,
    access_token: String,
}

impl StaticMapClient {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        }
    }

    /// `{endpoint}/{owner}/{style}/static/{overlay}/{lon},{lat},{zoom}/{w}x{h}[@2x]`
    pub fn request_url(&self, request: &MapImageRequest<'_>) -> Result<Url> {
        let center = request
            .route
            .centroid()
            .ok_or(AppError::NotEnoughDestinations(request.route.len()))?;
        let overlay = format!(
            "path-{}+{}-{}({})",
            OVERLAY_WIDTH,
            OVERLAY_COLOR.hex_digits(),
            OVERLAY_OPACITY,
            encode_polyline(&request.route.coordinates())
        );

        let retina = request.scale >= 2;
        let density = if retina { 2 } else { 1 };
        let side = |px: u32| px.div_ceil(density).clamp(1, MAX_STATIC_SIZE);
        let size = format!(
            "{}x{}{}",
            side(request.width),
            side(request.height),
            if retina { "@2x" } else { "" }
        );

        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("not a base URL: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(style_path(request.map_style_id).split('/'))
            .push("static")
            .push(&overlay)
            .push(&format!("{:.4},{:.4},{}", center.lon, center.lat, STATIC_ZOOM))
            .push(&size);
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token);
        Ok(url)
    }

    fn fetch(&self, url: &Url) -> Result<RgbaImage> {
        let response = minreq::get(url.as_str())
            .with_timeout(FETCH_TIMEOUT_SECS)
            .send()?;
        if !(200..300).contains(&response.status_code) {
            return Err(AppError::Map(format!(
                "static map request returned {}",
                response.status_code
            )));
        }
        Ok(image::load_from_memory(response.as_bytes())?.to_rgba8())
    }
}

impl MapImageSource for StaticMapClient {
    fn map_image(&mut self, request: &MapImageRequest<'_>, _fonts: &FontBook) -> Result<RgbaImage> {
        let url = self.request_url(request)?;
        debug!(width = request.width, height = request.height, "static map request");
        self.fetch(&url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::destination::{Coordinates, Destination};
    use crate::app::domain::route::Route;

    fn route() -> Route {
        Route::from_destinations(vec![
            Destination::new("A", Coordinates::new(-120.2, 38.5)),
            Destination::new("B", Coordinates::new(-120.95, 40.7)),
            Destination::new("C", Coordinates::new(-126.453, 43.252)),
        ])
    }

    fn client() -> StaticMapClient {
        StaticMapClient::new("https://api.mapbox.com/styles/v1", "pk.test")
    }

    fn request<'a>(route: &'a Route, width: u32, height: u32, scale: u32) -> MapImageRequest<'a> {
        MapImageRequest {
            map_style_id: "mapbox://styles/mapbox/dark-v11",
            route,
            width,
            height,
            scale,
        }
    }

    #[test]
    fn test_url_shape() {
        let route = route();
        let url = client().request_url(&request(&route, 1568, 840, 2)).unwrap();
        let segments: Vec<&str> = url.path_segments().unwrap().collect();

        assert_eq!(&segments[..5], &["styles", "v1", "mapbox", "dark-v11", "static"]);
        assert!(segments[5].starts_with("path-5+4F46E5-1("));
        assert!(segments[5].ends_with(')'));
        assert_eq!(segments[6], "-122.5343,40.8173,4");
        assert_eq!(segments[7], "784x420@2x");
        assert_eq!(url.query(), Some("access_token=pk.test"));
    }

    #[test]
    fn test_single_density_below_scale_two() {
        let route = route();
        let url = client().request_url(&request(&route, 784, 420, 1)).unwrap();
        assert!(url.path().ends_with("/784x420"));
    }

    #[test]
    fn test_size_is_capped() {
        let route = route();
        let url = client().request_url(&request(&route, 3136, 1680, 4)).unwrap();
        assert!(url.path().ends_with("/1280x840@2x"));
    }

    #[test]
    fn test_unknown_style_falls_back_to_streets() {
        let route = route();
        let mut req = request(&route, 100, 100, 1);
        req.map_style_id = "custom-style";
        let url = client().request_url(&req).unwrap();
        assert!(url.path().starts_with("/styles/v1/mapbox/streets-v12/static/"));
    }

    #[test]
    fn test_empty_route_is_rejected() {
        let route = Route::new();
        let err = client().request_url(&request(&route, 100, 100, 1)).unwrap_err();
        assert!(matches!(err, AppError::NotEnoughDestinations(0)));
    }
}
