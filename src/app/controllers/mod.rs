//! Controllers layer - orchestration and coordination.
//!
//! - Map presenter driving a map surface
//! - The in-process map scene used by the preview
//! - The stamp session tying state, persistence and map together

pub mod map;
pub mod scene;
pub mod session;
