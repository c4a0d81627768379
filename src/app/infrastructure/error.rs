use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] minreq::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Place not found: {0}")]
    NotFound(String),

    #[error("At least 2 destinations are required, got {0}")]
    NotEnoughDestinations(usize),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Map error: {0}")]
    Map(String),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Convenience type alias for Results with AppError
pub type Result<T> = std::result::Result<T, AppError>;
