use super::color::LineColor;

pub const DEFAULT_MAP_STYLE: &str = "mapbox://styles/mapbox/streets-v12";
const STYLE_URL_PREFIX: &str = "mapbox://styles/";

/// Colors the preview surface paints a basemap with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub land: LineColor,
    pub grid: LineColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapStyle {
    pub id: &'static str,
    pub display_name: &'static str,
    pub palette: Palette,
}

static STYLES: [MapStyle; 5] = [
    MapStyle {
        id: DEFAULT_MAP_STYLE,
        display_name: "Calles",
        palette: Palette {
            land: LineColor::rgb(0xF2, 0xEF, 0xE9),
            grid: LineColor::rgb(0xD9, 0xD4, 0xCA),
        },
    },
    MapStyle {
        id: "mapbox://styles/mapbox/outdoors-v12",
        display_name: "Exterior",
        palette: Palette {
            land: LineColor::rgb(0xE8, 0xF0, 0xDC),
            grid: LineColor::rgb(0xC8, 0xD6, 0xB4),
        },
    },
    MapStyle {
        id: "mapbox://styles/mapbox/light-v11",
        display_name: "Claro",
        palette: Palette {
            land: LineColor::rgb(0xF5, 0xF5, 0xF5),
            grid: LineColor::rgb(0xE0, 0xE0, 0xE0),
        },
    },
    MapStyle {
        id: "mapbox://styles/mapbox/dark-v11",
        display_name: "Oscuro",
        palette: Palette {
            land: LineColor::rgb(0x34, 0x34, 0x32),
            grid: LineColor::rgb(0x4A, 0x4A, 0x48),
        },
    },
    MapStyle {
        id: "mapbox://styles/mapbox/satellite-streets-v12",
        display_name: "Satélite",
        palette: Palette {
            land: LineColor::rgb(0x3B, 0x4A, 0x36),
            grid: LineColor::rgb(0x55, 0x64, 0x4E),
        },
    },
];

impl MapStyle {
    pub fn all() -> &'static [MapStyle] {
        &STYLES
    }

    pub fn position(id: &str) -> Option<usize> {
        STYLES.iter().position(|s| s.id == id)
    }

    /// Preview palette for `id`; unknown styles are previewed like streets.
    pub fn palette_for(id: &str) -> Palette {
        STYLES
            .iter()
            .find(|s| s.id == id)
            .unwrap_or(&STYLES[0])
            .palette
    }
}

/// `mapbox://styles/<owner>/<style>` → `<owner>/<style>` for the static images API.
pub fn style_path(id: &str) -> &str {
    id.strip_prefix(STYLE_URL_PREFIX).unwrap_or("mapbox/streets-v12")
}
