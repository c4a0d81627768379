//! In-memory map used by the preview widget.
//!
//! There is no tile renderer: the basemap is the style's land color with a
//! 10° graticule. Route geometry, point circles and lettered markers are drawn
//! with Web-Mercator projection, so what the user sees and what gets captured
//! line up with a real map of the same camera.

use ab_glyph::PxScale;
use image::RgbaImage;
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut, draw_text_mut, text_size,
};
use imageproc::point::Point;
use imageproc::rect::Rect;

use super::map::{CircleLayer, LineLayer, Marker, Paint};
use crate::app::domain::color::LineColor;
use crate::app::domain::destination::Coordinates;
use crate::app::domain::geo::{Bounds, Camera, MAX_LATITUDE};
use crate::app::domain::map_style::{MapStyle, Palette};
use crate::app::domain::template::FontFamily;
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::export::fonts::FontBook;

const GRATICULE_STEP: i32 = 10;
const MARKER_BADGE_RADIUS: f32 = 9.0;
const MARKER_BADGE_OFFSET: f32 = 18.0;
const MARKER_LABEL_PX: f32 = 12.0;
const POINT_HALO: f32 = 2.0;
// Keeps projected coordinates castable to i32 at high zoom.
const PIXEL_LIMIT: f64 = 1.0e6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FitRequest {
    bounds: Bounds,
    padding: u32,
}

#[derive(Debug, Clone)]
pub struct MapScene {
    palette: Palette,
    style_loaded: bool,
    line_layer: Option<LineLayer>,
    circle_layer: Option<CircleLayer>,
    path: Vec<Coordinates>,
    markers: Vec<Marker>,
    camera: Camera,
    fit: Option<FitRequest>,
    viewport: (u32, u32),
}

impl Default for MapScene {
    fn default() -> Self {
        Self {
            palette: MapStyle::palette_for(""),
            style_loaded: false,
            line_layer: None,
            circle_layer: None,
            path: Vec::new(),
            markers: Vec::new(),
            camera: Camera::default(),
            fit: None,
            viewport: (0, 0),
        }
    }
}

impl MapScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn line_layer(&self) -> Option<&LineLayer> {
        self.line_layer.as_ref()
    }

    pub fn circle_layer(&self) -> Option<&CircleLayer> {
        self.circle_layer.as_ref()
    }

    /// Switching style drops every custom layer.
    pub fn set_style(&mut self, style_id: &str) {
        self.palette = MapStyle::palette_for(style_id);
        self.line_layer = None;
        self.circle_layer = None;
        self.style_loaded = true;
    }

    pub fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.line_layer.as_ref().is_some_and(|l| l.id == id)
            || self.circle_layer.as_ref().is_some_and(|c| c.id == id)
    }

    pub fn add_line_layer(&mut self, layer: LineLayer) -> Result<()> {
        if self.has_layer(layer.id) {
            return Err(AppError::Map(format!("layer '{}' already exists", layer.id)));
        }
        self.line_layer = Some(layer);
        Ok(())
    }

    pub fn add_circle_layer(&mut self, layer: CircleLayer) -> Result<()> {
        if self.has_layer(layer.id) {
            return Err(AppError::Map(format!("layer '{}' already exists", layer.id)));
        }
        self.circle_layer = Some(layer);
        Ok(())
    }

    pub fn set_paint(&mut self, layer: &str, paint: Paint) -> Result<()> {
        match (paint, &mut self.line_layer, &mut self.circle_layer) {
            (Paint::LineColor(color), Some(line), _) if line.id == layer => line.color = color,
            (Paint::LineWidth(width), Some(line), _) if line.id == layer => line.width = width,
            (Paint::CircleColor(color), _, Some(circle)) if circle.id == layer => {
                circle.color = color
            }
            _ => {
                return Err(AppError::Map(format!(
                    "cannot apply {:?} to layer '{}'",
                    paint, layer
                )));
            }
        }
        Ok(())
    }

    pub fn set_route_data(&mut self, path: &[Coordinates]) {
        self.path = path.to_vec();
    }

    pub fn render_markers(&mut self, markers: &[Marker]) {
        self.markers = markers.to_vec();
    }

    /// Camera moves are applied at once; the preview does not animate.
    pub fn fit_bounds(&mut self, bounds: Bounds, padding: u32) {
        self.fit = Some(FitRequest { bounds, padding });
        self.refit();
    }

    pub fn fly_to(&mut self, center: Coordinates, zoom: f64) {
        self.fit = None;
        self.camera = Camera::new(center, zoom);
    }

    /// The widget size changed; keep a fitted route fitted.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if self.viewport != (width, height) {
            self.viewport = (width, height);
            self.refit();
        }
    }

    fn refit(&mut self) {
        let (w, h) = self.viewport;
        if let Some(fit) = self.fit
            && w > 0
            && h > 0
        {
            self.camera = Camera::fit(fit.bounds, w as f64, h as f64, fit.padding as f64);
        }
    }

    /// Camera for a raster of `width x height`. A fitted route is refitted to
    /// the new size; otherwise the view is scaled with the width.
    fn camera_for(&self, width: u32, height: u32, density: f32) -> Camera {
        if let Some(fit) = self.fit {
            return Camera::fit(
                fit.bounds,
                width as f64,
                height as f64,
                fit.padding as f64 * density as f64,
            );
        }
        let (vw, _) = self.viewport;
        if vw == 0 || vw == width {
            return self.camera;
        }
        Camera::new(
            self.camera.center,
            self.camera.zoom + (width as f64 / vw as f64).log2(),
        )
    }

    /// Draw the scene into a new image. Marker letters need `fonts`; without
    /// them only the badges are drawn.
    pub fn rasterize(
        &self,
        width: u32,
        height: u32,
        density: f32,
        fonts: Option<&FontBook>,
    ) -> RgbaImage {
        let (width, height) = (width.max(1), height.max(1));
        let mut canvas = RgbaImage::from_pixel(width, height, self.palette.land.to_rgba());
        let camera = self.camera_for(width, height, density);
        let project = |c: Coordinates| {
            let (x, y) = camera.project(c, width as f64, height as f64);
            (
                x.clamp(-PIXEL_LIMIT, PIXEL_LIMIT) as f32,
                y.clamp(-PIXEL_LIMIT, PIXEL_LIMIT) as f32,
            )
        };

        self.draw_graticule(&mut canvas, &project, density);

        if let Some(line) = &self.line_layer {
            let points: Vec<(f32, f32)> = self.path.iter().map(|c| project(*c)).collect();
            draw_thick_polyline(&mut canvas, &points, line.width * density, line.color);
        }

        if let Some(circle) = &self.circle_layer {
            let radius = circle.radius * density;
            for marker in &self.markers {
                let (x, y) = project(marker.coordinates);
                let center = (x.round() as i32, y.round() as i32);
                draw_filled_circle_mut(
                    &mut canvas,
                    center,
                    (radius + POINT_HALO * density).round() as i32,
                    LineColor::WHITE.to_rgba(),
                );
                draw_filled_circle_mut(
                    &mut canvas,
                    center,
                    radius.round() as i32,
                    circle.color.to_rgba(),
                );
            }
        }

        let badge_color = self
            .line_layer
            .as_ref()
            .map(|l| l.color)
            .unwrap_or_default();
        for marker in &self.markers {
            let (x, y) = project(marker.coordinates);
            draw_marker(&mut canvas, (x, y), marker.label, badge_color, density, fonts);
        }

        canvas
    }

    fn draw_graticule(
        &self,
        canvas: &mut RgbaImage,
        project: &impl Fn(Coordinates) -> (f32, f32),
        density: f32,
    ) {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        let thickness = density.max(1.0).round() as u32;
        let color = self.palette.grid.to_rgba();

        for lon in (-180..=180).step_by(GRATICULE_STEP as usize) {
            let (x, top) = project(Coordinates::new(lon as f64, MAX_LATITUDE));
            let (_, bottom) = project(Coordinates::new(lon as f64, -MAX_LATITUDE));
            let (top, bottom) = (top.max(0.0), bottom.min(h));
            if x >= 0.0 && x < w && bottom > top {
                let rect =
                    Rect::at(x as i32, top as i32).of_size(thickness, (bottom - top) as u32 + 1);
                draw_filled_rect_mut(canvas, rect, color);
            }
        }

        let max_lat = MAX_LATITUDE as i32 / GRATICULE_STEP * GRATICULE_STEP;
        for lat in (-max_lat..=max_lat).step_by(GRATICULE_STEP as usize) {
            let (left, y) = project(Coordinates::new(-180.0, lat as f64));
            let (right, _) = project(Coordinates::new(180.0, lat as f64));
            let (left, right) = (left.max(0.0), right.min(w));
            if y >= 0.0 && y < h && right > left {
                let rect =
                    Rect::at(left as i32, y as i32).of_size((right - left) as u32 + 1, thickness);
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
    }
}

/// Segments as quads, joints and ends as discs (round join and cap).
fn draw_thick_polyline(
    canvas: &mut RgbaImage,
    points: &[(f32, f32)],
    width: f32,
    color: LineColor,
) {
    let half = (width / 2.0).max(1.0);
    let rgba = color.to_rgba();

    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = (dx * dx + dy * dy).sqrt();
        if len < 0.5 {
            continue;
        }
        let (nx, ny) = (-dy / len * half, dx / len * half);
        let quad = [
            Point::new((x0 + nx).round() as i32, (y0 + ny).round() as i32),
            Point::new((x1 + nx).round() as i32, (y1 + ny).round() as i32),
            Point::new((x1 - nx).round() as i32, (y1 - ny).round() as i32),
            Point::new((x0 - nx).round() as i32, (y0 - ny).round() as i32),
        ];
        draw_polygon_mut(canvas, &quad, rgba);
    }

    for &(x, y) in points {
        let center = (x.round() as i32, y.round() as i32);
        draw_filled_circle_mut(canvas, center, half.round() as i32, rgba);
    }
}

fn draw_marker(
    canvas: &mut RgbaImage,
    (x, y): (f32, f32),
    label: char,
    color: LineColor,
    density: f32,
    fonts: Option<&FontBook>,
) {
    let center = (
        x.round() as i32,
        (y - MARKER_BADGE_OFFSET * density).round() as i32,
    );
    let radius = MARKER_BADGE_RADIUS * density;
    draw_filled_circle_mut(
        canvas,
        center,
        (radius + POINT_HALO * density).round() as i32,
        LineColor::WHITE.to_rgba(),
    );
    draw_filled_circle_mut(canvas, center, radius.round() as i32, color.to_rgba());

    let Some(fonts) = fonts else {
        return;
    };
    let font = fonts.bold(FontFamily::Sans);
    let scale = PxScale::from(MARKER_LABEL_PX * density);
    let text = label.to_string();
    let (tw, th) = text_size(scale, font, &text);
    draw_text_mut(
        canvas,
        LineColor::WHITE.to_rgba(),
        center.0 - tw as i32 / 2,
        center.1 - th as i32 / 2,
        scale,
        font,
        &text,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::controllers::map::{POINTS_LAYER, ROUTE_LAYER};
    use crate::app::domain::map_style::DEFAULT_MAP_STYLE;

    fn scene_with_route() -> MapScene {
        let mut scene = MapScene::new();
        scene.set_style(DEFAULT_MAP_STYLE);
        scene
            .add_line_layer(LineLayer {
                id: ROUTE_LAYER,
                color: LineColor::rgb(255, 0, 0),
                width: 4.0,
            })
            .unwrap();
        scene
            .add_circle_layer(CircleLayer {
                id: POINTS_LAYER,
                color: LineColor::rgb(255, 0, 0),
                radius: 6.0,
            })
            .unwrap();
        let a = Coordinates::new(-70.6693, -33.4489);
        let b = Coordinates::new(-71.6127, -33.0472);
        scene.set_route_data(&[a, a.midpoint(b), b]);
        scene.render_markers(&[
            Marker { label: 'A', coordinates: a },
            Marker { label: 'B', coordinates: b },
        ]);
        scene.set_viewport(400, 300);
        scene.fit_bounds(Bounds::from_points(&[a, b]).unwrap(), 50);
        scene
    }

    #[test]
    fn test_style_change_drops_layers() {
        let mut scene = scene_with_route();
        assert!(scene.has_layer(ROUTE_LAYER));
        assert!(scene.has_layer(POINTS_LAYER));
        scene.set_style("mapbox://styles/mapbox/dark-v11");
        assert!(!scene.has_layer(ROUTE_LAYER));
        assert!(!scene.has_layer(POINTS_LAYER));
        assert!(scene.is_style_loaded());
    }

    #[test]
    fn test_duplicate_layer_is_rejected() {
        let mut scene = scene_with_route();
        let again = scene.add_line_layer(LineLayer {
            id: ROUTE_LAYER,
            color: LineColor::INDIGO,
            width: 4.0,
        });
        assert!(matches!(again, Err(AppError::Map(_))));
    }

    #[test]
    fn test_paint_targets_matching_layer() {
        let mut scene = scene_with_route();
        scene.set_paint(ROUTE_LAYER, Paint::LineWidth(5.0)).unwrap();
        assert_eq!(scene.line_layer().unwrap().width, 5.0);
        scene
            .set_paint(POINTS_LAYER, Paint::CircleColor(LineColor::INDIGO))
            .unwrap();
        assert_eq!(scene.circle_layer().unwrap().color, LineColor::INDIGO);
        assert!(scene.set_paint(POINTS_LAYER, Paint::LineWidth(2.0)).is_err());
        assert!(scene.set_paint("missing", Paint::LineColor(LineColor::INDIGO)).is_err());
    }

    #[test]
    fn test_fly_to_replaces_fit() {
        let mut scene = scene_with_route();
        scene.fly_to(Coordinates::new(0.0, 0.0), 10.0);
        assert_eq!(scene.camera().zoom, 10.0);
        scene.set_viewport(800, 600);
        assert_eq!(scene.camera().center, Coordinates::new(0.0, 0.0));
    }

    #[test]
    fn test_rasterize_draws_route_in_line_color() {
        let scene = scene_with_route();
        let image = scene.rasterize(400, 300, 1.0, None);
        assert_eq!(image.dimensions(), (400, 300));
        let red = LineColor::rgb(255, 0, 0).to_rgba();
        assert!(image.pixels().any(|p| *p == red));
    }

    #[test]
    fn test_rasterize_without_layers_is_basemap_only() {
        let mut scene = MapScene::new();
        scene.set_style(DEFAULT_MAP_STYLE);
        let image = scene.rasterize(64, 64, 1.0, None);
        let palette = MapStyle::palette_for(DEFAULT_MAP_STYLE);
        assert!(image
            .pixels()
            .all(|p| *p == palette.land.to_rgba() || *p == palette.grid.to_rgba()));
    }

    #[test]
    fn test_capture_size_refits_route() {
        let scene = scene_with_route();
        let a = scene.markers()[0].coordinates;
        let camera = scene.camera_for(1600, 1200, 2.0);
        let (x, y) = camera.project(a, 1600.0, 1200.0);
        assert!((0.0..=1600.0).contains(&x));
        assert!((0.0..=1200.0).contains(&y));
    }
}
