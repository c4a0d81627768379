//! Place name → coordinates through the hosted geocoding API.

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::app::domain::destination::Coordinates;
use crate::app::infrastructure::error::{AppError, Result};

const LOOKUP_TIMEOUT_SECS: u64 = 10;

pub trait Geocoder {
    /// `Ok(None)` when the service answered but knows no such place.
    fn lookup(&self, place: &str) -> Result<Option<Coordinates>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Found(Coordinates),
    NotFound,
    /// Transport or decoding failure; reported to the user as not found.
    Failed(String),
}

/// Run a lookup and fold errors into an outcome. Errors are logged, never raised.
pub fn resolve(geocoder: &dyn Geocoder, place: &str) -> GeocodeOutcome {
    match geocoder.lookup(place) {
        Ok(Some(coordinates)) => GeocodeOutcome::Found(coordinates),
        Ok(None) => GeocodeOutcome::NotFound,
        Err(e) => {
            warn!(place, "geocoding failed: {}", e);
            GeocodeOutcome::Failed(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: [f64; 2],
}

fn first_feature(body: &str) -> Result<Option<Coordinates>> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    Ok(collection
        .features
        .into_iter()
        .next()
        .map(|f| Coordinates::from(f.geometry.coordinates)))
}

pub struct MapboxGeocoder {
    endpoint: String,
    access_token: String,
}

impl MapboxGeocoder {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        }
    }

    /// `{endpoint}/{place}.json?access_token=…&limit=1`
    pub fn request_url(&self, place: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("not a base URL: {}", self.endpoint)))?
            .pop_if_empty()
            .push(&format!("{}.json", place));
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .append_pair("limit", "1");
        Ok(url)
    }
}

impl Geocoder for MapboxGeocoder {
    fn lookup(&self, place: &str) -> Result<Option<Coordinates>> {
        let url = self.request_url(place)?;
        debug!(place, "geocoding request");
        let response = minreq::get(url.as_str())
            .with_timeout(LOOKUP_TIMEOUT_SECS)
            .send()?;
        if !(200..300).contains(&response.status_code) {
            return Err(AppError::NotFound(format!(
                "{} (geocoder returned {})",
                place, response.status_code
            )));
        }
        first_feature(response.as_str()?)
    }
}
