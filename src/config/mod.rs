//! Persisted variations and modifiers.
//!
//! The store is one pretty-printed JSON document holding the [`RuleBook`].
//! Reading never fails: a missing file gives empty collections, an
//! unreadable or corrupt one also does but tells the user why. Writing
//! copies the previous file to `<path>.bak` first and reports errors.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use bevy::window::WindowCloseRequested;

use crate::constants::BACKUP_EXTENSION;
use crate::error::{Result, VariationError};
use crate::paths::with_appended_extension;
use crate::rules::RuleBook;
use crate::session::Session;

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Runtime state of the store
#[derive(Resource)]
pub struct RuleStore {
    /// Path to the config file
    pub path: PathBuf,
    /// Whether the rule book changed since it was last saved
    pub dirty: bool,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self {
            path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource to notify user when the store was reset to empty collections
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Resource holding the last save failure for display to user
#[derive(Resource, Default)]
pub struct ConfigSaveError {
    pub message: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Result of loading the store from disk
pub struct LoadConfigResult {
    pub book: RuleBook,
    /// Error message if the store was reset due to an error
    pub reset_reason: Option<String>,
}

/// Load the rule book at `path`.
pub fn load_config(path: &Path) -> LoadConfigResult {
    if !path.exists() {
        info!("No config file found at {:?}, starting empty", path);
        return LoadConfigResult {
            book: RuleBook::default(),
            reset_reason: None,
        };
    }

    let (book, reset_reason) = match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str::<RuleBook>(&json) {
            Ok(book) => {
                info!(
                    "Loaded {} variation(s) and {} modifier(s) from {:?}",
                    book.variations.len(),
                    book.modifiers.len(),
                    path
                );
                (book, None)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                (
                    RuleBook::default(),
                    Some(format!("Configuration file was corrupted: {}", e)),
                )
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            (
                RuleBook::default(),
                Some(format!("Could not read configuration file: {}", e)),
            )
        }
    };

    LoadConfigResult { book, reset_reason }
}

/// Write `book` to `path`, keeping the previous file as `<path>.bak`.
pub fn save_config(book: &RuleBook, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(book)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| VariationError::io("Failed to create config directory", parent, e))?;
    }
    if path.exists() {
        let backup = with_appended_extension(path, BACKUP_EXTENSION);
        std::fs::copy(path, &backup)
            .map_err(|e| VariationError::io("Failed to back up config", &backup, e))?;
    }
    std::fs::write(path, json).map_err(|e| VariationError::io("Failed to save config", path, e))?;
    info!("Config saved to {:?}", path);
    Ok(())
}

/// Startup system to load the store into the session
fn load_config_system(
    store: Res<RuleStore>,
    mut session: ResMut<Session>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config(&store.path);
    session.book = result.book;

    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

fn write_store(store: &mut RuleStore, session: &Session, save_error: &mut ConfigSaveError) {
    match save_config(&session.book, &store.path) {
        Ok(()) => {
            store.dirty = false;
            save_error.message = None;
        }
        Err(e) => {
            error!("{}", e);
            save_error.message = Some(e.to_string());
        }
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut store: ResMut<RuleStore>,
    session: Res<Session>,
    mut save_error: ResMut<ConfigSaveError>,
) {
    for _ in events.read() {
        if store.dirty {
            write_store(&mut store, &session, &mut save_error);
        }
    }
}

/// Saves pending changes when the window is closed
fn save_on_close_system(
    mut events: MessageReader<WindowCloseRequested>,
    mut store: ResMut<RuleStore>,
    session: Res<Session>,
    mut save_error: ResMut<ConfigSaveError>,
) {
    for _ in events.read() {
        if store.dirty {
            info!("Saving rule book before exit");
            write_store(&mut store, &session, &mut save_error);
        }
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RuleStore>()
            .init_resource::<ConfigResetNotification>()
            .init_resource::<ConfigSaveError>()
            .add_message::<SaveConfigRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                    save_on_close_system.run_if(on_message::<WindowCloseRequested>),
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Combination, Modifier, Variation};
    use tempfile::TempDir;

    fn sample_book() -> RuleBook {
        let mut hat = Modifier::new(1, "Hat");
        hat.inclusions = vec!["glob:hat*".to_string()];
        let mut winter = Variation::new(1, "Winter");
        winter.modifiers = vec![1];
        winter.combinations = vec![Combination::new("WinterHat", "1")];
        RuleBook {
            variations: vec![winter],
            modifiers: vec![hat],
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let result = load_config(&dir.path().join("none.json"));
        assert!(result.book.is_empty());
        assert!(result.reset_reason.is_none());
    }

    #[test]
    fn test_corrupt_file_loads_empty_with_reason() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = load_config(&path);
        assert!(result.book.is_empty());
        assert!(result
            .reset_reason
            .unwrap()
            .starts_with("Configuration file was corrupted"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        save_config(&sample_book(), &path).unwrap();

        let result = load_config(&path);
        assert_eq!(result.book, sample_book());
        assert!(!with_appended_extension(&path, BACKUP_EXTENSION).exists());
    }

    #[test]
    fn test_save_keeps_previous_file_as_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "previous").unwrap();

        save_config(&sample_book(), &path).unwrap();

        let backup = dir.path().join("settings.json.bak");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "previous");
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["variations"][0]["combinations"][0]["bitmask"], "1");
        assert_eq!(saved["modifiers"][0]["inclusions"][0], "glob:hat*");
    }

    #[test]
    fn test_save_error_propagates() {
        let dir = TempDir::new().unwrap();
        // a directory where the file should be
        let path = dir.path().join("settings.json");
        std::fs::create_dir(&path).unwrap();
        let err = save_config(&sample_book(), &path).unwrap_err();
        assert!(matches!(err, VariationError::Io { .. }));
    }

    #[test]
    fn test_store_defaults_to_config_file() {
        let store = RuleStore::default();
        assert!(!store.dirty);
        assert_eq!(store.path, crate::paths::config_file());
    }
}
