//! Application layer, split the same way the data flows.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (Destination, Route, Template, Messages)
//! - `controllers/` - Orchestration (map presenter, preview scene, stamp session)
//! - `services/` - Business operations (geocoding, persistence, export, payment)
//! - `infrastructure/` - Config, logging, errors and async tickets
//! - `state.rs` - Main application coordinator

pub mod controllers;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod state;

pub use domain::messages::Message;
pub use infrastructure::config::AppConfig;
pub use infrastructure::error::{AppError, Result};
pub use state::AppController;
