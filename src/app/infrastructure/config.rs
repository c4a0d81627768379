use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::AppError;

pub const TOKEN_ENV: &str = "TRAVELPRINT_MAPBOX_TOKEN";
pub const VERIFY_ENDPOINT_ENV: &str = "TRAVELPRINT_VERIFY_ENDPOINT";
pub const PAYMENT_ADDR_ENV: &str = "TRAVELPRINT_PAYMENT_ADDR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    #[default]
    Redirect,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportStrategy {
    /// Rasterize the preview map the user is looking at.
    #[default]
    Live,
    /// Fetch a static map image for the route.
    Static,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapboxConfig {
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_geocoding_endpoint")]
    pub geocoding_endpoint: String,

    #[serde(default = "default_static_endpoint")]
    pub static_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConfig {
    #[serde(default)]
    pub mode: CheckoutMode,

    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,

    /// Script the overlay widget depends on; fetched once before first use.
    #[serde(default = "default_script_url")]
    pub script_url: String,

    #[serde(default = "default_store_url")]
    pub store_url: String,

    #[serde(default = "default_product_id")]
    pub product_id: String,

    #[serde(default = "default_verify_endpoint")]
    pub verify_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub strategy: ExportStrategy,

    #[serde(default = "default_scale")]
    pub scale: u32,

    /// Where stamps are written. Falls back to the user's download directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FontConfig {
    #[serde(default)]
    pub serif: Option<PathBuf>,
    #[serde(default)]
    pub serif_bold: Option<PathBuf>,
    #[serde(default)]
    pub sans: Option<PathBuf>,
    #[serde(default)]
    pub sans_bold: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub mapbox: MapboxConfig,

    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub fonts: FontConfig,
}

fn default_geocoding_endpoint() -> String {
    "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string()
}

fn default_static_endpoint() -> String {
    "https://api.mapbox.com/styles/v1".to_string()
}

fn default_checkout_url() -> String {
    "https://travelprint.lemonsqueezy.com/checkout/buy/12345".to_string()
}

fn default_script_url() -> String {
    "https://app.lemonsqueezy.com/js/lemon.js".to_string()
}

fn default_store_url() -> String {
    "https://travelprint.lemonsqueezy.com".to_string()
}

fn default_product_id() -> String {
    "12345".to_string()
}

fn default_verify_endpoint() -> String {
    "http://127.0.0.1:8888/payment".to_string()
}

fn default_scale() -> u32 {
    2
}

impl Default for MapboxConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            geocoding_endpoint: default_geocoding_endpoint(),
            static_endpoint: default_static_endpoint(),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            mode: CheckoutMode::default(),
            checkout_url: default_checkout_url(),
            script_url: default_script_url(),
            store_url: default_store_url(),
            product_id: default_product_id(),
            verify_endpoint: default_verify_endpoint(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            strategy: ExportStrategy::default(),
            scale: default_scale(),
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Load the config file, apply environment overrides.
    /// A missing or malformed file yields defaults.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::get_config_path()).unwrap_or_else(|e| {
            warn!("Failed to parse config: {}. Using defaults.", e);
            Self::default()
        });
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.mapbox.access_token = token;
        }
        if let Some(endpoint) = lookup(VERIFY_ENDPOINT_ENV).filter(|e| !e.is_empty()) {
            self.payment.verify_endpoint = endpoint;
        }
    }

    /// Export scale, never below 1.
    pub fn export_scale(&self) -> u32 {
        self.export.scale.max(1)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get config file path (cross-platform)
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("travelprint");
        path.push("config.toml");
        path
    }
}

/// Bind address of the payment verification server.
pub fn payment_bind_addr() -> String {
    std::env::var(PAYMENT_ADDR_ENV)
        .ok()
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "127.0.0.1:8888".to_string())
}
