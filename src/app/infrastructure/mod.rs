//! Infrastructure layer - configuration, logging, errors and tickets.

pub mod config;
pub mod error;
pub mod logging;
pub mod token;
