//! Keeps a map surface in sync with the route, the basemap style and the
//! line color.
//!
//! Layers can only be added once the style has finished loading, and a style
//! change wipes them, so the presenter tracks where the surface is:
//!
//! ```text
//! Uninitialized --init--> Loading --style loaded--> Ready
//!                            ^                        |
//!                            +------set_style---------+
//! ```

use image::RgbaImage;
use tracing::{debug, warn};

use crate::app::domain::color::LineColor;
use crate::app::domain::destination::Coordinates;
use crate::app::domain::geo::Bounds;
use crate::app::domain::map_style::DEFAULT_MAP_STYLE;
use crate::app::domain::route::Route;
use crate::app::infrastructure::error::Result;
use crate::app::infrastructure::token::{Supersede, Ticket};
use crate::app::services::export::fonts::FontBook;

pub const ROUTE_LAYER: &str = "route";
pub const POINTS_LAYER: &str = "points";

pub const ROUTE_WIDTH: f32 = 4.0;
pub const CAPTURE_ROUTE_WIDTH: f32 = 5.0;
pub const POINT_RADIUS: f32 = 6.0;

pub const FIT_PADDING: u32 = 50;
pub const FIT_DURATION_MS: u32 = 1000;
pub const FLY_ZOOM: f64 = 10.0;
pub const FLY_DURATION_MS: u32 = 1000;
pub const CAPTURE_FIT_DURATION_MS: u32 = 300;
pub const MAX_ANIMATION_MS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPhase {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayer {
    pub id: &'static str,
    pub color: LineColor,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleLayer {
    pub id: &'static str,
    pub color: LineColor,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    LineColor(LineColor),
    LineWidth(f32),
    CircleColor(LineColor),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub label: char,
    pub coordinates: Coordinates,
}

/// `A`..`Z`, wrapping back to `A` after the 26th stop.
pub fn marker_label(index: usize) -> char {
    char::from(b'A' + (index % 26) as u8)
}

fn clamp_duration(ms: u32) -> u32 {
    ms.min(MAX_ANIMATION_MS)
}

/// What the presenter needs from a map widget.
pub trait MapSurface {
    /// Swap the basemap. Custom layers are dropped; the surface reports the
    /// load later with the same ticket.
    fn set_style(&mut self, style_id: &str, ticket: Ticket) -> Result<()>;
    fn is_style_loaded(&self) -> bool;
    fn has_layer(&self, id: &str) -> bool;
    fn add_line_layer(&mut self, layer: LineLayer) -> Result<()>;
    fn add_circle_layer(&mut self, layer: CircleLayer) -> Result<()>;
    fn set_paint(&mut self, layer: &str, paint: Paint) -> Result<()>;
    fn set_route_data(&mut self, path: &[Coordinates]) -> Result<()>;
    fn render_markers(&mut self, markers: &[Marker]) -> Result<()>;
    fn fit_bounds(&mut self, bounds: Bounds, padding: u32, duration_ms: u32) -> Result<()>;
    fn fly_to(&mut self, center: Coordinates, zoom: f64, duration_ms: u32) -> Result<()>;
}

/// Surfaces that can rasterize what they show.
pub trait MapCapture {
    /// `density` multiplies line widths, radii and padding.
    fn capture(
        &self,
        width: u32,
        height: u32,
        density: u32,
        fonts: &FontBook,
    ) -> Result<RgbaImage>;
}

pub struct MapPresenter<S: MapSurface> {
    surface: S,
    phase: MapPhase,
    style_id: String,
    line_color: LineColor,
    route: Route,
    style_loads: Supersede,
}

impl<S: MapSurface> MapPresenter<S> {
    pub fn new(surface: S, style_id: &str, line_color: LineColor) -> Self {
        let style_id = if style_id.is_empty() {
            DEFAULT_MAP_STYLE
        } else {
            style_id
        };
        Self {
            surface,
            phase: MapPhase::Uninitialized,
            style_id: style_id.to_string(),
            line_color,
            route: Route::new(),
            style_loads: Supersede::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    pub fn style_id(&self) -> &str {
        &self.style_id
    }

    pub fn line_color(&self) -> LineColor {
        self.line_color
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Start loading the initial style. Only the first call does anything.
    pub fn init(&mut self) {
        if self.phase == MapPhase::Uninitialized {
            self.load_style();
        }
    }

    pub fn set_style(&mut self, style_id: &str) {
        self.style_id = style_id.to_string();
        self.load_style();
    }

    fn load_style(&mut self) {
        let ticket = self.style_loads.issue();
        match self.surface.set_style(&self.style_id, ticket) {
            Ok(()) => {
                debug!(style = %self.style_id, ticket = ticket.value(), "style loading");
                self.phase = MapPhase::Loading;
            }
            Err(e) => warn!(style = %self.style_id, "failed to switch map style: {}", e),
        }
    }

    /// Returns false when the load was superseded by a newer style change.
    pub fn on_style_loaded(&mut self, ticket: Ticket) -> bool {
        if !self.style_loads.is_current(ticket) || self.phase != MapPhase::Loading {
            debug!(ticket = ticket.value(), "ignoring stale style load");
            return false;
        }
        if let Err(e) = self.ensure_layers() {
            warn!("failed to add route layers: {}", e);
            return false;
        }
        self.phase = MapPhase::Ready;
        self.paint_color();
        self.draw();
        true
    }

    fn ensure_layers(&mut self) -> Result<()> {
        if !self.surface.has_layer(ROUTE_LAYER) {
            self.surface.add_line_layer(LineLayer {
                id: ROUTE_LAYER,
                color: self.line_color,
                width: ROUTE_WIDTH,
            })?;
        }
        if !self.surface.has_layer(POINTS_LAYER) {
            self.surface.add_circle_layer(CircleLayer {
                id: POINTS_LAYER,
                color: self.line_color,
                radius: POINT_RADIUS,
            })?;
        }
        Ok(())
    }

    pub fn set_line_color(&mut self, color: LineColor) {
        self.line_color = color;
        self.paint_color();
    }

    fn paint_color(&mut self) {
        if self.phase != MapPhase::Ready || !self.surface.is_style_loaded() {
            return;
        }
        let result = self
            .surface
            .set_paint(ROUTE_LAYER, Paint::LineColor(self.line_color))
            .and_then(|_| {
                self.surface
                    .set_paint(POINTS_LAYER, Paint::CircleColor(self.line_color))
            });
        if let Err(e) = result {
            warn!("failed to paint route color: {}", e);
        }
    }

    /// Remember `route` and show it once the map is ready.
    pub fn render(&mut self, route: &Route) {
        self.route = route.clone();
        self.draw();
    }

    fn draw(&mut self) {
        if self.phase != MapPhase::Ready {
            return;
        }
        if let Err(e) = self.push_route() {
            warn!("failed to render route: {}", e);
        }
    }

    fn push_route(&mut self) -> Result<()> {
        self.surface.set_route_data(&self.route.curved_path())?;

        let markers: Vec<Marker> = self
            .route
            .destinations()
            .iter()
            .enumerate()
            .map(|(i, d)| Marker {
                label: marker_label(i),
                coordinates: d.coordinates,
            })
            .collect();
        self.surface.render_markers(&markers)?;

        match self.route.destinations() {
            [] => {}
            [only] => self.surface.fly_to(
                only.coordinates,
                FLY_ZOOM,
                clamp_duration(FLY_DURATION_MS),
            )?,
            _ => {
                if let Some(bounds) = self.route.bounds() {
                    self.surface
                        .fit_bounds(bounds, FIT_PADDING, clamp_duration(FIT_DURATION_MS))?;
                }
            }
        }
        Ok(())
    }

    /// Make the route stand out before the surface is rasterized.
    pub fn prepare_capture(&mut self) {
        if self.phase != MapPhase::Ready {
            return;
        }
        let result = self
            .surface
            .set_paint(ROUTE_LAYER, Paint::LineWidth(CAPTURE_ROUTE_WIDTH))
            .and_then(|_| self.surface.set_paint(ROUTE_LAYER, Paint::LineColor(self.line_color)));
        if let Err(e) = result {
            warn!("failed to restyle route for capture: {}", e);
        }
        if self.route.len() >= 2
            && let Some(bounds) = self.route.bounds()
            && let Err(e) = self.surface.fit_bounds(
                bounds,
                FIT_PADDING,
                clamp_duration(CAPTURE_FIT_DURATION_MS),
            )
        {
            warn!("failed to fit route for capture: {}", e);
        }
    }
}
