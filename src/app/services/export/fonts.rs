use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::FontVec;
use tracing::debug;

use crate::app::domain::template::FontFamily;
use crate::app::infrastructure::config::FontConfig;
use crate::app::infrastructure::error::{AppError, Result};

const SERIF_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
    "C:\\Windows\\Fonts\\times.ttf",
];

const SERIF_BOLD_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSerif-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Times New Roman Bold.ttf",
    "C:\\Windows\\Fonts\\timesbd.ttf",
];

const SANS_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const SANS_BOLD_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Regular and bold faces for both template font families.
pub struct FontBook {
    serif: Arc<FontVec>,
    serif_bold: Arc<FontVec>,
    sans: Arc<FontVec>,
    sans_bold: Arc<FontVec>,
}

fn read_font(path: &Path) -> Result<FontVec> {
    let data = fs::read(path)?;
    FontVec::try_from_vec(data)
        .map_err(|e| AppError::Font(format!("{}: {}", path.display(), e)))
}

/// First loadable font: the configured path if any, then the system candidates.
fn first_available(configured: Option<&PathBuf>, candidates: &[&str]) -> Option<Arc<FontVec>> {
    configured
        .map(PathBuf::as_path)
        .into_iter()
        .chain(candidates.iter().map(Path::new))
        .find_map(|path| match read_font(path) {
            Ok(font) => {
                debug!(path = %path.display(), "font loaded");
                Some(Arc::new(font))
            }
            Err(_) => None,
        })
}

impl FontBook {
    pub fn load(config: &FontConfig) -> Result<Self> {
        let serif = first_available(config.serif.as_ref(), SERIF_CANDIDATES);
        let sans = first_available(config.sans.as_ref(), SANS_CANDIDATES);

        // One family may stand in for the other, but at least one must exist.
        let (serif, sans) = match (serif, sans) {
            (Some(serif), Some(sans)) => (serif, sans),
            (Some(only), None) | (None, Some(only)) => (only.clone(), only),
            (None, None) => {
                return Err(AppError::Font(
                    "no usable serif or sans-serif font found; set [fonts] in config.toml"
                        .to_string(),
                ));
            }
        };

        let serif_bold = first_available(config.serif_bold.as_ref(), SERIF_BOLD_CANDIDATES)
            .unwrap_or_else(|| serif.clone());
        let sans_bold = first_available(config.sans_bold.as_ref(), SANS_BOLD_CANDIDATES)
            .unwrap_or_else(|| sans.clone());

        Ok(Self {
            serif,
            serif_bold,
            sans,
            sans_bold,
        })
    }

    pub fn regular(&self, family: FontFamily) -> &FontVec {
        match family {
            FontFamily::Serif => &self.serif,
            FontFamily::Sans => &self.sans,
        }
    }

    pub fn bold(&self, family: FontFamily) -> &FontVec {
        match family {
            FontFamily::Serif => &self.serif_bold,
            FontFamily::Sans => &self.sans_bold,
        }
    }
}

/// The font bundled with the test suite, used for every family.
#[cfg(test)]
pub(crate) fn fixture_config() -> FontConfig {
    let font = PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/fonts/DejaVuSans.ttf"
    ));
    FontConfig {
        serif: Some(font.clone()),
        serif_bold: Some(font.clone()),
        sans: Some(font.clone()),
        sans_bold: Some(font),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_font_loads() {
        let config = fixture_config();
        assert!(read_font(config.sans.as_deref().unwrap()).is_ok());
        assert!(FontBook::load(&config).is_ok());
    }

    #[test]
    fn test_configured_garbage_font_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.ttf");
        fs::write(&bogus, b"not a font").unwrap();
        assert!(read_font(&bogus).is_err());
        assert!(first_available(Some(&bogus), &[]).is_none());
    }

    #[test]
    fn test_missing_font_file_is_io_error() {
        let err = read_font(Path::new("/definitely/not/here.ttf")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
