//! Stamp export: pick a map image, lay out the stamp, encode it as PNG.

pub mod fonts;
pub mod layout;
pub mod static_map;

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info};

use crate::app::controllers::map::{MapCapture, MapPresenter, MapSurface};
use crate::app::domain::app_state::AppState;
use crate::app::domain::route::Route;
use crate::app::domain::template::TemplateCatalog;
use crate::app::infrastructure::config::FontConfig;
use crate::app::infrastructure::error::{AppError, Result};

use fonts::FontBook;
use layout::{StampLayout, StampText, compose};

pub const MIN_DESTINATIONS: usize = 2;

/// What a map image source is asked to produce.
pub struct MapImageRequest<'a> {
    pub map_style_id: &'a str,
    pub route: &'a Route,
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

pub trait MapImageSource {
    fn map_image(&mut self, request: &MapImageRequest<'_>, fonts: &FontBook) -> Result<RgbaImage>;
}

/// Rasterizes the preview map the user is looking at.
pub struct LiveCapture<'a, S: MapSurface + MapCapture> {
    presenter: &'a mut MapPresenter<S>,
}

impl<'a, S: MapSurface + MapCapture> LiveCapture<'a, S> {
    pub fn new(presenter: &'a mut MapPresenter<S>) -> Self {
        Self { presenter }
    }
}

impl<S: MapSurface + MapCapture> MapImageSource for LiveCapture<'_, S> {
    fn map_image(&mut self, request: &MapImageRequest<'_>, fonts: &FontBook) -> Result<RgbaImage> {
        self.presenter.prepare_capture();
        self.presenter
            .surface()
            .capture(request.width, request.height, request.scale, fonts)
    }
}

/// Exports need a route, not a single point.
pub fn ensure_exportable(route: &Route) -> Result<()> {
    if route.len() < MIN_DESTINATIONS {
        return Err(AppError::NotEnoughDestinations(route.len()));
    }
    Ok(())
}

/// `travelprint-<title>.png`, whitespace runs become `-`, lower-cased.
pub fn stamp_file_name(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        // Keep the name a single path component
        match c {
            '/' | '\\' => slug.push('-'),
            c => slug.extend(c.to_lowercase()),
        }
    }
    format!("travelprint-{}.png", slug)
}

/// A rendered stamp ready to be saved or shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub png: Vec<u8>,
    pub file_name: String,
}

impl Stamp {
    /// The PNG as a `data:` URL, for embedding the stamp in HTML or JSON.
    ///
    /// The desktop app saves with [`Stamp::save_into`] instead.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }

    /// Write the PNG into `dir`. The file appears only once fully written.
    pub fn save_into(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let target = dir.join(&self.file_name);
        let partial = dir.join(format!(".{}.part", self.file_name));
        let written = fs::write(&partial, &self.png).and_then(|_| fs::rename(&partial, &target));
        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        info!(path = %target.display(), bytes = self.png.len(), "stamp saved");
        Ok(target)
    }
}

fn encode_png(image: RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

pub struct StampExporter {
    font_config: FontConfig,
    fonts: Option<FontBook>,
    scale: u32,
}

impl StampExporter {
    /// Fonts are loaded on first export.
    pub fn new(font_config: FontConfig, scale: u32) -> Self {
        Self {
            font_config,
            fonts: None,
            scale: scale.max(1),
        }
    }

    pub fn with_fonts(fonts: FontBook, scale: u32) -> Self {
        Self {
            font_config: FontConfig::default(),
            fonts: Some(fonts),
            scale: scale.max(1),
        }
    }

    pub fn layout_for(&self, template_id: &str) -> StampLayout {
        StampLayout::new(TemplateCatalog::resolve(template_id), self.scale)
    }

    fn fonts(&mut self) -> Result<&FontBook> {
        if self.fonts.is_none() {
            self.fonts = Some(FontBook::load(&self.font_config)?);
        }
        self.fonts
            .as_ref()
            .ok_or_else(|| AppError::Font("fonts not loaded".to_string()))
    }

    /// Render the stamp for `state`. Premium stamps carry no watermark.
    pub fn export(
        &mut self,
        state: &AppState,
        route: &Route,
        source: &mut dyn MapImageSource,
        premium: bool,
    ) -> Result<Stamp> {
        ensure_exportable(route)?;

        let layout = self.layout_for(&state.template_id);
        let scale = self.scale;
        let fonts = self.fonts()?;

        let (width, height) = layout.map_size();
        let request = MapImageRequest {
            map_style_id: &state.map_style_id,
            route,
            width,
            height,
            scale,
        };
        let map = source.map_image(&request, fonts)?;
        debug!(width = map.width(), height = map.height(), "map image ready");

        let route_text = route.display_string();
        let text = StampText {
            title: &state.title,
            route: &route_text,
        };
        let image = compose(&layout, &map, &text, premium, fonts);
        let png = encode_png(image)?;

        info!(premium, template = %state.template_id, bytes = png.len(), "stamp rendered");
        Ok(Stamp {
            png,
            file_name: stamp_file_name(&state.title),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::destination::{Coordinates, Destination};
    use image::Rgba;

    struct SolidMap {
        calls: usize,
    }

    impl MapImageSource for SolidMap {
        fn map_image(
            &mut self,
            request: &MapImageRequest<'_>,
            _fonts: &FontBook,
        ) -> Result<RgbaImage> {
            self.calls += 1;
            Ok(RgbaImage::from_pixel(
                request.width,
                request.height,
                Rgba([30, 90, 60, 255]),
            ))
        }
    }

    struct FailingMap;

    impl MapImageSource for FailingMap {
        fn map_image(
            &mut self,
            _request: &MapImageRequest<'_>,
            _fonts: &FontBook,
        ) -> Result<RgbaImage> {
            Err(AppError::Map("tiles unavailable".to_string()))
        }
    }

    fn two_stops() -> Route {
        Route::from_destinations(vec![
            Destination::new("Santiago", Coordinates::new(-70.6693, -33.4489)),
            Destination::new("Valparaíso", Coordinates::new(-71.6127, -33.0472)),
        ])
    }

    #[test]
    fn test_file_name_slug() {
        assert_eq!(stamp_file_name("Mi viaje por Chile"), "travelprint-mi-viaje-por-chile.png");
        assert_eq!(stamp_file_name("Sur  \t Austral"), "travelprint-sur-austral.png");
        assert_eq!(stamp_file_name(" Ruta "), "travelprint--ruta-.png");
        assert_eq!(stamp_file_name("A/B"), "travelprint-a-b.png");
    }

    #[test]
    fn test_single_destination_is_rejected_before_rendering() {
        let mut exporter = StampExporter::new(FontConfig::default(), 2);
        let mut source = SolidMap { calls: 0 };
        let route = Route::from_destinations(vec![Destination::new(
            "Santiago",
            Coordinates::new(-70.6693, -33.4489),
        )]);
        let err = exporter
            .export(&AppState::default(), &route, &mut source, false)
            .unwrap_err();
        assert!(matches!(err, AppError::NotEnoughDestinations(1)));
        assert_eq!(source.calls, 0);
    }

    #[test]
    fn test_data_url_prefix() {
        let stamp = Stamp {
            png: vec![0x89, b'P', b'N', b'G'],
            file_name: "travelprint-x.png".to_string(),
        };
        assert_eq!(stamp.data_url(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_save_into_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stamps");
        let stamp = Stamp {
            png: vec![1, 2, 3],
            file_name: "travelprint-sur.png".to_string(),
        };
        let path = stamp.save_into(&out).unwrap();
        assert_eq!(path, out.join("travelprint-sur.png"));
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_rename_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stamps");
        // A non-empty directory squatting on the target name makes the rename fail.
        let squatter = out.join("travelprint-sur.png");
        fs::create_dir_all(&squatter).unwrap();
        fs::write(squatter.join("keep"), b"x").unwrap();

        let stamp = Stamp {
            png: vec![1, 2, 3],
            file_name: "travelprint-sur.png".to_string(),
        };
        assert!(matches!(stamp.save_into(&out), Err(AppError::Io(_))));
        assert!(!out.join(".travelprint-sur.png.part").exists());
        assert!(squatter.join("keep").exists());
    }

    #[test]
    fn test_export_renders_png_at_template_size() {
        let fonts = FontBook::load(&fonts::fixture_config()).unwrap();
        let mut exporter = StampExporter::with_fonts(fonts, 1);
        let mut source = SolidMap { calls: 0 };
        let state = AppState {
            template_id: "wide".to_string(),
            ..Default::default()
        };

        let stamp = exporter.export(&state, &two_stops(), &mut source, false).unwrap();
        assert_eq!(source.calls, 1);
        assert_eq!(stamp.file_name, "travelprint-mi-viaje-por-chile.png");

        let decoded = image::load_from_memory(&stamp.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (960, 540));
    }

    #[test]
    fn test_map_failure_is_propagated() {
        let fonts = FontBook::load(&fonts::fixture_config()).unwrap();
        let mut exporter = StampExporter::with_fonts(fonts, 1);
        let result = exporter.export(&AppState::default(), &two_stops(), &mut FailingMap, true);
        assert!(matches!(result, Err(AppError::Map(_))));
    }
}
