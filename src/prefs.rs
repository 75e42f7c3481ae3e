use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::domain::{APP_NAME, TableError};
use crate::pipeline::VisibleColumns;

pub const COLUMN_PREFS_KEY: &str = "columnPrefs";

/// A small persistent key/value store for ui preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), TableError>;
}

pub fn default_prefs_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("prefs.json")
}

/// Stores all entries as one json object in a file. The whole file is
/// rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store. A missing or unreadable file starts an empty store.
    pub fn open(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring malformed preference file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Could not read preference file {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        debug!("Opened preference store {} with {} entries", path.display(), entries.len());
        Self { path, entries }
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), TableError> {
        self.entries.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

/// In memory store, nothing survives the process.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), TableError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Reads the visible column preference. Missing or unparsable values,
/// including unknown field ids, fall back to the default columns.
pub fn load_visible_columns(store: &dyn PreferenceStore) -> VisibleColumns {
    let Some(raw) = store.get(COLUMN_PREFS_KEY) else {
        return VisibleColumns::default();
    };
    match serde_json::from_str::<Option<VisibleColumns>>(&raw) {
        Ok(Some(columns)) => {
            info!("Loaded column preference {:?}", columns.fields());
            columns
        }
        Ok(None) => VisibleColumns::default(),
        Err(e) => {
            debug!("Discarding column preference {raw:?}: {e}");
            VisibleColumns::default()
        }
    }
}

pub fn save_visible_columns(
    store: &mut dyn PreferenceStore,
    columns: &VisibleColumns,
) -> Result<(), TableError> {
    store.set(COLUMN_PREFS_KEY, serde_json::to_string(columns)?)
}
