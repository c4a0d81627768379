use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::color::LineColor;
use super::destination::Destination;
use super::map_style::DEFAULT_MAP_STYLE;
use super::template::{DEFAULT_TEMPLATE_ID, TemplateCatalog};

pub const DEFAULT_TITLE: &str = "Mi viaje por Chile";
/// Title used when the user clears the title field.
pub const UNTITLED: &str = "Mi viaje";

/// Everything the user has set up, as persisted between runs.
///
/// Each stored field falls back to its default on its own, so one bad value
/// never costs the user the rest of the saved stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default = "default_title", deserialize_with = "lenient_title")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient_color")]
    pub line_color: LineColor,

    #[serde(
        default = "default_map_style",
        alias = "mapStyle",
        deserialize_with = "lenient_map_style"
    )]
    pub map_style_id: String,

    #[serde(
        default = "default_template_id",
        alias = "templateStyle",
        deserialize_with = "lenient_template_id"
    )]
    pub template_id: String,

    #[serde(default, deserialize_with = "lenient_destinations")]
    pub destinations: Vec<Destination>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_map_style() -> String {
    DEFAULT_MAP_STYLE.to_string()
}

fn default_template_id() -> String {
    DEFAULT_TEMPLATE_ID.to_string()
}

/// The stored string, if the stored value is one.
fn string_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_value(deserializer)?.unwrap_or_else(default_title))
}

fn lenient_map_style<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_value(deserializer)?.unwrap_or_else(default_map_style))
}

fn lenient_template_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_value(deserializer)?.unwrap_or_else(default_template_id))
}

/// A stored color that no longer parses falls back to the default one.
fn lenient_color<'de, D>(deserializer: D) -> Result<LineColor, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = string_value(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
}

/// Anything but an array reads as no destinations; unreadable entries are skipped.
fn lenient_destinations<'de, D>(deserializer: D) -> Result<Vec<Destination>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            title: default_title(),
            line_color: LineColor::default(),
            map_style_id: default_map_style(),
            template_id: default_template_id(),
            destinations: Vec::new(),
        }
    }
}

impl AppState {
    /// Replace empty or unknown values with defaults.
    pub fn normalized(mut self) -> Self {
        if self.title.trim().is_empty() {
            self.title = default_title();
        }
        if self.map_style_id.trim().is_empty() {
            self.map_style_id = default_map_style();
        }
        if TemplateCatalog::get(&self.template_id).is_none() {
            self.template_id = default_template_id();
        }
        self
    }
}
