//! Hosted checkout integration and the payment verification call.
//!
//! Two checkout modes exist, selected by configuration:
//!
//! - redirect: the payload goes into query parameters of a fixed checkout URL
//!   that is opened in the browser.
//! - overlay: the provider's checkout script is fetched once, then the embedded
//!   checkout is opened with the payload as structured custom data.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use url::Url;

use crate::app::infrastructure::config::{CheckoutMode, PaymentConfig};
use crate::app::infrastructure::error::{AppError, Result};

const VERIFY_TIMEOUT_SECS: u64 = 15;
const SCRIPT_TIMEOUT_SECS: u64 = 10;

/// Custom fields attached to a checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub title: String,
    /// Destination names joined by `,`
    pub destinations: String,
    pub template_style: String,
}

impl CheckoutPayload {
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("title", self.title.as_str()),
            ("destinations", self.destinations.as_str()),
            ("templateStyle", self.template_style.as_str()),
        ]
    }
}

pub trait CheckoutProvider {
    fn open(&mut self, payload: &CheckoutPayload) -> Result<()>;
}

pub trait UrlOpener {
    fn open_url(&self, url: &str) -> Result<()>;
}

/// Opens URLs in the user's default browser.
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open_url(&self, url: &str) -> Result<()> {
        open::that(url)?;
        Ok(())
    }
}

pub struct RedirectCheckout {
    checkout_url: String,
    opener: Box<dyn UrlOpener>,
}

impl RedirectCheckout {
    pub fn new(checkout_url: impl Into<String>, opener: Box<dyn UrlOpener>) -> Self {
        Self {
            checkout_url: checkout_url.into(),
            opener,
        }
    }

    pub fn checkout_url(&self, payload: &CheckoutPayload) -> Result<Url> {
        let mut url = Url::parse(&self.checkout_url)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in payload.fields() {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl CheckoutProvider for RedirectCheckout {
    fn open(&mut self, payload: &CheckoutPayload) -> Result<()> {
        let url = self.checkout_url(payload)?;
        self.opener.open_url(url.as_str())
    }
}

pub trait ScriptLoader {
    fn load(&mut self, script_url: &str) -> Result<()>;
}

/// Considers the script loaded once it downloads with a 2xx status.
pub struct HttpScriptLoader;

impl ScriptLoader for HttpScriptLoader {
    fn load(&mut self, script_url: &str) -> Result<()> {
        let response = minreq::get(script_url)
            .with_timeout(SCRIPT_TIMEOUT_SECS)
            .send()?;
        if !(200..300).contains(&response.status_code) {
            return Err(AppError::Payment(format!(
                "checkout script returned {}",
                response.status_code
            )));
        }
        Ok(())
    }
}

pub trait CheckoutWidget {
    fn open_checkout(&mut self, product_id: &str, custom: &CheckoutPayload) -> Result<()>;
}

/// The provider's embeddable checkout page, opened with `embed=1`.
pub struct EmbeddedCheckout {
    store_url: String,
    opener: Box<dyn UrlOpener>,
}

impl EmbeddedCheckout {
    pub fn new(store_url: impl Into<String>, opener: Box<dyn UrlOpener>) -> Self {
        Self {
            store_url: store_url.into(),
            opener,
        }
    }

    pub fn checkout_url(&self, product_id: &str, custom: &CheckoutPayload) -> Result<Url> {
        let mut url = Url::parse(&self.store_url)?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("not a base URL: {}", self.store_url)))?
            .pop_if_empty()
            .extend(["checkout", "buy", product_id]);

        let custom_data = serde_json::to_value(custom)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("embed", "1");
            if let serde_json::Value::Object(fields) = custom_data {
                for (key, value) in fields {
                    let value = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    query.append_pair(&format!("checkout[custom][{}]", key), &value);
                }
            }
        }
        Ok(url)
    }
}

impl CheckoutWidget for EmbeddedCheckout {
    fn open_checkout(&mut self, product_id: &str, custom: &CheckoutPayload) -> Result<()> {
        let url = self.checkout_url(product_id, custom)?;
        self.opener.open_url(url.as_str())
    }
}

pub struct OverlayCheckout {
    script_url: String,
    product_id: String,
    loader: Box<dyn ScriptLoader>,
    widget: Box<dyn CheckoutWidget>,
    loaded: bool,
}

impl OverlayCheckout {
    pub fn new(
        script_url: impl Into<String>,
        product_id: impl Into<String>,
        loader: Box<dyn ScriptLoader>,
        widget: Box<dyn CheckoutWidget>,
    ) -> Self {
        Self {
            script_url: script_url.into(),
            product_id: product_id.into(),
            loader,
            widget,
            loaded: false,
        }
    }

    /// Load the checkout script on first use. A failed load is retried next time.
    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loader.load(&self.script_url)?;
        self.loaded = true;
        info!(script = %self.script_url, "checkout script loaded");
        Ok(())
    }
}

impl CheckoutProvider for OverlayCheckout {
    fn open(&mut self, payload: &CheckoutPayload) -> Result<()> {
        self.ensure_loaded()?;
        self.widget.open_checkout(&self.product_id, payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub order_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub order_id: Option<serde_json::Value>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct PaymentVerifier {
    endpoint: String,
}

impl PaymentVerifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn request(&self, order_id: &str) -> Result<VerificationResponse> {
        let body = VerificationRequest {
            order_id: order_id.to_string(),
        };
        let response = minreq::post(&self.endpoint)
            .with_timeout(VERIFY_TIMEOUT_SECS)
            .with_json(&body)?
            .send()?;
        Ok(response.json::<VerificationResponse>()?)
    }

    /// Whether the endpoint confirms the order. Any failure counts as unverified.
    pub fn verify_payment(&self, order_id: &str) -> bool {
        match self.request(order_id) {
            Ok(response) => {
                info!(order_id, success = response.success, "{}", response.message);
                response.success
            }
            Err(e) => {
                error!(order_id, "Failed to verify payment: {}", e);
                false
            }
        }
    }
}

pub struct PaymentBridge {
    provider: Box<dyn CheckoutProvider>,
    verifier: PaymentVerifier,
}

impl PaymentBridge {
    pub fn new(provider: Box<dyn CheckoutProvider>, verifier: PaymentVerifier) -> Self {
        Self { provider, verifier }
    }

    pub fn from_config(config: &PaymentConfig) -> Self {
        let provider: Box<dyn CheckoutProvider> = match config.mode {
            CheckoutMode::Redirect => Box::new(RedirectCheckout::new(
                config.checkout_url.clone(),
                Box::new(SystemOpener),
            )),
            CheckoutMode::Overlay => Box::new(OverlayCheckout::new(
                config.script_url.clone(),
                config.product_id.clone(),
                Box::new(HttpScriptLoader),
                Box::new(EmbeddedCheckout::new(
                    config.store_url.clone(),
                    Box::new(SystemOpener),
                )),
            )),
        };
        Self::new(provider, PaymentVerifier::new(config.verify_endpoint.clone()))
    }

    /// Open the checkout. Returns false (after logging) on any failure.
    pub fn initiate_payment(&mut self, payload: &CheckoutPayload) -> bool {
        match self.provider.open(payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to start checkout: {}", e);
                false
            }
        }
    }

    /// A clone for use on a worker thread.
    pub fn verifier(&self) -> PaymentVerifier {
        self.verifier.clone()
    }
}
