use super::color::LineColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Serif,
    Sans,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderStyle {
    pub width: u32,
    pub color: LineColor,
}

/// `border-8 border-indigo-100`
pub const INDIGO_FRAME: BorderStyle = BorderStyle {
    width: 8,
    color: LineColor::rgb(0xE0, 0xE7, 0xFF),
};

/// A stamp layout. The catalog is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Template {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Width : height
    pub aspect_ratio: (u32, u32),
    pub width: u32,
    pub height: u32,
    /// Share of the height taken by the map, the rest is the text panel.
    pub map_area: f32,
    pub border: BorderStyle,
    pub font: FontFamily,
}

impl Template {
    pub fn map_height(&self) -> u32 {
        (self.height as f32 * self.map_area).round() as u32
    }

    pub fn text_height(&self) -> u32 {
        self.height - self.map_height()
    }
}

pub const DEFAULT_TEMPLATE_ID: &str = "classic";

static TEMPLATES: [Template; 5] = [
    Template {
        id: "classic",
        display_name: "Clásico",
        aspect_ratio: (4, 3),
        width: 800,
        height: 600,
        map_area: 0.70,
        border: INDIGO_FRAME,
        font: FontFamily::Serif,
    },
    Template {
        id: "square",
        display_name: "Cuadrado",
        aspect_ratio: (1, 1),
        width: 800,
        height: 800,
        map_area: 0.80,
        border: INDIGO_FRAME,
        font: FontFamily::Sans,
    },
    Template {
        id: "vertical",
        display_name: "Vertical",
        aspect_ratio: (4, 5),
        width: 600,
        height: 750,
        map_area: 0.65,
        border: INDIGO_FRAME,
        font: FontFamily::Sans,
    },
    Template {
        id: "story",
        display_name: "Historia",
        aspect_ratio: (9, 16),
        width: 540,
        height: 960,
        map_area: 0.60,
        border: INDIGO_FRAME,
        font: FontFamily::Sans,
    },
    Template {
        id: "wide",
        display_name: "Panorámico",
        aspect_ratio: (16, 9),
        width: 960,
        height: 540,
        map_area: 0.75,
        border: INDIGO_FRAME,
        font: FontFamily::Sans,
    },
];

pub struct TemplateCatalog;

impl TemplateCatalog {
    pub fn all() -> &'static [Template] {
        &TEMPLATES
    }

    pub fn get(id: &str) -> Option<&'static Template> {
        TEMPLATES.iter().find(|t| t.id == id)
    }

    /// Look up `id`, falling back to the default layout for unknown ids.
    pub fn resolve(id: &str) -> &'static Template {
        Self::get(id).unwrap_or(&TEMPLATES[0])
    }

    pub fn position(id: &str) -> Option<usize> {
        TEMPLATES.iter().position(|t| t.id == id)
    }
}
