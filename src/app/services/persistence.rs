use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, warn};

use crate::app::domain::app_state::AppState;
use crate::app::infrastructure::error::Result;

pub const STORAGE_KEY: &str = "travelprint_state";

/// The single saved `AppState`, one JSON file per user.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// data_dir/travelprint/travelprint_state.json
    pub fn default_location() -> Self {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("travelprint");
        path.push(format!("{}.json", STORAGE_KEY));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved state. Missing or corrupt data yields defaults.
    pub fn load(&self) -> AppState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppState::default(),
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read saved state: {}", e);
                return AppState::default();
            }
        };

        match serde_json::from_str::<AppState>(&contents) {
            Ok(state) => state.normalized(),
            Err(e) => {
                error!("Failed to parse saved state: {}. Using defaults.", e);
                AppState::default()
            }
        }
    }

    pub fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
