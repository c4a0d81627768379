//! Domain layer - core data structures and types.
//!
//! - Destinations and the ordered route
//! - Projection and fitting math
//! - Line colors, stamp templates and map styles
//! - Persisted state and message types for the event system

pub mod app_state;
pub mod color;
pub mod destination;
pub mod geo;
pub mod map_style;
pub mod messages;
pub mod route;
pub mod template;

pub use app_state::AppState;
pub use destination::{Coordinates, Destination};
pub use route::Route;
