//! The map preview widget: a frame that paints a [`MapScene`].

use std::cell::RefCell;
use std::rc::Rc;

use fltk::{
    app::Sender,
    enums::{ColorDepth, FrameType},
    frame::Frame,
    image::RgbImage,
    prelude::*,
};
use image::RgbaImage;
use tracing::warn;

use crate::app::controllers::map::{
    CircleLayer, LineLayer, MapCapture, MapSurface, Marker, Paint,
};
use crate::app::controllers::scene::MapScene;
use crate::app::domain::destination::Coordinates;
use crate::app::domain::geo::Bounds;
use crate::app::domain::messages::Message;
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::infrastructure::token::Ticket;
use crate::app::services::export::fonts::FontBook;

pub struct PreviewMap {
    frame: Frame,
    scene: Rc<RefCell<MapScene>>,
    sender: Sender<Message>,
}

impl PreviewMap {
    pub fn new(mut frame: Frame, sender: Sender<Message>, fonts: Option<Rc<FontBook>>) -> Self {
        frame.set_frame(FrameType::FlatBox);
        let scene = Rc::new(RefCell::new(MapScene::new()));

        let scene_draw = scene.clone();
        frame.draw(move |f| {
            let (w, h) = (f.w().max(1) as u32, f.h().max(1) as u32);
            scene_draw.borrow_mut().set_viewport(w, h);
            let raster = scene_draw.borrow().rasterize(w, h, 1.0, fonts.as_deref());
            match RgbImage::new(raster.as_raw(), w as i32, h as i32, ColorDepth::Rgba8) {
                Ok(mut img) => img.draw(f.x(), f.y(), f.w(), f.h()),
                Err(e) => warn!("failed to paint map preview: {}", e),
            }
        });

        Self {
            frame,
            scene,
            sender,
        }
    }

    fn redraw(&mut self) {
        self.frame.redraw();
    }
}

impl MapSurface for PreviewMap {
    /// Style palettes are built in, so the load completes at once. The
    /// notification still goes through the channel so it arrives after the
    /// current message has been handled.
    fn set_style(&mut self, style_id: &str, ticket: Ticket) -> Result<()> {
        self.scene.borrow_mut().set_style(style_id);
        self.sender.send(Message::MapStyleLoaded(ticket));
        self.redraw();
        Ok(())
    }

    fn is_style_loaded(&self) -> bool {
        self.scene.borrow().is_style_loaded()
    }

    fn has_layer(&self, id: &str) -> bool {
        self.scene.borrow().has_layer(id)
    }

    fn add_line_layer(&mut self, layer: LineLayer) -> Result<()> {
        self.scene.borrow_mut().add_line_layer(layer)?;
        self.redraw();
        Ok(())
    }

    fn add_circle_layer(&mut self, layer: CircleLayer) -> Result<()> {
        self.scene.borrow_mut().add_circle_layer(layer)?;
        self.redraw();
        Ok(())
    }

    fn set_paint(&mut self, layer: &str, paint: Paint) -> Result<()> {
        self.scene.borrow_mut().set_paint(layer, paint)?;
        self.redraw();
        Ok(())
    }

    fn set_route_data(&mut self, path: &[Coordinates]) -> Result<()> {
        self.scene.borrow_mut().set_route_data(path);
        self.redraw();
        Ok(())
    }

    fn render_markers(&mut self, markers: &[Marker]) -> Result<()> {
        self.scene.borrow_mut().render_markers(markers);
        self.redraw();
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32, _duration_ms: u32) -> Result<()> {
        self.scene.borrow_mut().fit_bounds(bounds, padding);
        self.redraw();
        Ok(())
    }

    fn fly_to(&mut self, center: Coordinates, zoom: f64, _duration_ms: u32) -> Result<()> {
        self.scene.borrow_mut().fly_to(center, zoom);
        self.redraw();
        Ok(())
    }
}

impl MapCapture for PreviewMap {
    fn capture(
        &self,
        width: u32,
        height: u32,
        density: u32,
        fonts: &FontBook,
    ) -> Result<RgbaImage> {
        if width == 0 || height == 0 {
            return Err(AppError::Render(format!(
                "cannot capture a {}x{} map",
                width, height
            )));
        }
        Ok(self
            .scene
            .borrow()
            .rasterize(width, height, density as f32, Some(fonts)))
    }
}
