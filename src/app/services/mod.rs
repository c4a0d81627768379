//! Services layer - business operations.
//!
//! - Geocoding place names
//! - State persistence
//! - Stamp export
//! - Checkout and payment verification

pub mod export;
pub mod geocoder;
pub mod payment;
pub mod payment_endpoint;
pub mod persistence;
