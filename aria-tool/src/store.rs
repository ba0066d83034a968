use std::path::{Path, PathBuf};

use aria_cal::{AppState, EventStore, FileStorage};
use chrono::Local;
use tracing::info;

use crate::error::AriaError;

pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aria")
}

pub fn default_store_path() -> PathBuf {
    data_dir().join("events.json")
}

/// Rehydrates the event file into a fresh application state.
pub fn open_state(path: &Path, horizon_weeks: u32) -> Result<AppState<FileStorage>, AriaError> {
    let store = EventStore::open(FileStorage::new(path))?;
    info!(path = %path.display(), events = store.len(), "Loaded events");
    Ok(AppState::new(store, Local::now().date_naive()).with_horizon(horizon_weeks))
}
