//! Stamp geometry and pixel composition.
//!
//! All sizes are CSS pixels multiplied by the export scale: a classic stamp at
//! scale 2 is 1600x1200 with a 16 px frame.

use ab_glyph::{Font, PxScale};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use super::fonts::FontBook;
use crate::app::domain::color::LineColor;
use crate::app::domain::template::{FontFamily, Template};

pub const WATERMARK_TEXT: &str = "TravelPrint.me - Versión gratuita";
const WATERMARK_OPACITY: f32 = 0.8;

const TITLE_PX: f32 = 20.0;
const TITLE_LINE_PX: f32 = 28.0;
const BODY_PX: f32 = 16.0;
const BODY_LINE_PX: f32 = 24.0;
const WATERMARK_PX: f32 = 12.0;
const WATERMARK_LINE_PX: f32 = 16.0;
const TITLE_GAP_PX: f32 = 4.0;
const PANEL_PADDING_PX: u32 = 16;
const WATERMARK_INSET_PX: u32 = 8;

const PANEL_COLOR: LineColor = LineColor::WHITE;
const TITLE_COLOR: LineColor = LineColor::rgb(0x1F, 0x29, 0x37);
const BODY_COLOR: LineColor = LineColor::rgb(0x4B, 0x55, 0x63);
const WATERMARK_COLOR: LineColor = LineColor::rgb(0x6B, 0x72, 0x80);

/// Pixel geometry of one stamp at one export scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampLayout {
    pub scale: u32,
    pub width: u32,
    pub height: u32,
    pub border: u32,
    pub border_color: LineColor,
    pub map_width: u32,
    pub map_height: u32,
    pub font: FontFamily,
}

impl StampLayout {
    pub fn new(template: &Template, scale: u32) -> Self {
        let scale = scale.max(1);
        let width = template.width * scale;
        let border = template.border.width * scale;
        Self {
            scale,
            width,
            height: template.height * scale,
            border,
            border_color: template.border.color,
            map_width: width.saturating_sub(2 * border),
            map_height: template.map_height() * scale,
            font: template.font,
        }
    }

    /// Size the map image is requested at.
    pub fn map_size(&self) -> (u32, u32) {
        (self.map_width, self.map_height)
    }

    fn px(&self, css: f32) -> f32 {
        css * self.scale as f32
    }

    fn panel_top(&self) -> u32 {
        self.border + self.map_height
    }

    fn padding(&self) -> u32 {
        PANEL_PADDING_PX * self.scale
    }

    /// Usable text width inside frame and padding.
    fn text_width(&self) -> u32 {
        self.width
            .saturating_sub(2 * (self.border + self.padding()))
            .max(1)
    }
}

pub struct StampText<'a> {
    pub title: &'a str,
    pub route: &'a str,
}

/// Scale `image` to fill `width x height`, cropping the overflow evenly.
pub fn cover(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
        return RgbaImage::from_pixel(width, height, PANEL_COLOR.to_rgba());
    }
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    DynamicImage::ImageRgba8(image.clone())
        .resize_to_fill(width, height, FilterType::Triangle)
        .to_rgba8()
}

/// Greedy word wrap. A word wider than `max_width` gets a line of its own.
fn wrap_lines(font: &impl Font, scale: PxScale, text: &str, max_width: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if text_size(scale, font, &candidate).0 <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn draw_centered(
    canvas: &mut RgbaImage,
    font: &impl Font,
    scale: PxScale,
    color: LineColor,
    line: &str,
    top: f32,
) {
    let (w, _) = text_size(scale, font, line);
    let x = (canvas.width() as i32 - w as i32) / 2;
    draw_text_mut(canvas, color.to_rgba(), x, top.round() as i32, scale, font, line);
}

fn draw_frame(canvas: &mut RgbaImage, layout: &StampLayout) {
    let b = layout.border;
    if b == 0 {
        return;
    }
    let (w, h) = (layout.width, layout.height);
    let color = layout.border_color.to_rgba();
    draw_filled_rect_mut(canvas, Rect::at(0, 0).of_size(w, b), color);
    draw_filled_rect_mut(canvas, Rect::at(0, (h - b) as i32).of_size(w, b), color);
    draw_filled_rect_mut(canvas, Rect::at(0, 0).of_size(b, h), color);
    draw_filled_rect_mut(canvas, Rect::at((w - b) as i32, 0).of_size(b, h), color);
}

/// Lay out the final stamp: map on top, text panel below, frame around it.
pub fn compose(
    layout: &StampLayout,
    map: &RgbaImage,
    text: &StampText<'_>,
    premium: bool,
    fonts: &FontBook,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, PANEL_COLOR.to_rgba());

    let map = cover(map, layout.map_width, layout.map_height);
    imageops::replace(&mut canvas, &map, layout.border as i64, layout.border as i64);

    let bold = fonts.bold(layout.font);
    let regular = fonts.regular(layout.font);
    let title_scale = PxScale::from(layout.px(TITLE_PX));
    let body_scale = PxScale::from(layout.px(BODY_PX));

    let mut y = (layout.panel_top() + layout.padding()) as f32;
    for line in wrap_lines(bold, title_scale, text.title, layout.text_width()) {
        let top = y + layout.px(TITLE_LINE_PX - TITLE_PX) / 2.0;
        draw_centered(&mut canvas, bold, title_scale, TITLE_COLOR, &line, top);
        y += layout.px(TITLE_LINE_PX);
    }
    y += layout.px(TITLE_GAP_PX);
    for line in wrap_lines(regular, body_scale, text.route, layout.text_width()) {
        let top = y + layout.px(BODY_LINE_PX - BODY_PX) / 2.0;
        draw_centered(&mut canvas, regular, body_scale, BODY_COLOR, &line, top);
        y += layout.px(BODY_LINE_PX);
    }

    if !premium {
        let scale = PxScale::from(layout.px(WATERMARK_PX));
        let (w, _) = text_size(scale, regular, WATERMARK_TEXT);
        let inset = layout.border + WATERMARK_INSET_PX * layout.scale;
        let x = layout.width as i32 - inset as i32 - w as i32;
        let y = layout.height as f32 - inset as f32 - layout.px(WATERMARK_LINE_PX)
            + layout.px(WATERMARK_LINE_PX - WATERMARK_PX) / 2.0;
        let color = WATERMARK_COLOR.over(PANEL_COLOR, WATERMARK_OPACITY);
        draw_text_mut(
            &mut canvas,
            color.to_rgba(),
            x,
            y.round() as i32,
            scale,
            regular,
            WATERMARK_TEXT,
        );
    }

    draw_frame(&mut canvas, layout);
    canvas
}
