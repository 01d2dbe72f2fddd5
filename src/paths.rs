//! Centralized path resolution for platform-appropriate user data directories.
//!
//! In development mode (cargo run), paths resolve to local directories.
//! In installed mode, paths resolve to platform-specific locations:
//! - Windows: `%APPDATA%\IllVariations\`
//! - macOS: `~/Library/Application Support/IllVariations/`
//! - Linux: `~/.config/illvariations/` (config), `~/.local/share/illvariations/` (data)

use std::path::{Path, PathBuf};

use crate::constants::CONFIG_FILE_NAME;

/// Returns true when running in development mode (cargo run).
///
/// Detection methods:
/// - `CARGO` env var is set (cargo run sets this)
/// - Debug assertions enabled (debug builds)
pub fn is_dev_mode() -> bool {
    std::env::var("CARGO").is_ok() || cfg!(debug_assertions)
}

/// Platform-appropriate config directory.
///
/// - Dev mode: current directory
/// - Linux: `~/.config/illvariations/`
/// - Windows/macOS: same as data_dir
pub fn config_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }

    #[cfg(target_os = "linux")]
    {
        dirs::config_dir().map(|p| p.join("illvariations"))
    }

    #[cfg(not(target_os = "linux"))]
    {
        data_dir()
    }
}

/// Platform-appropriate data directory.
pub fn data_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }

    dirs::data_dir().map(|p| p.join("illvariations"))
}

/// Path to the variations/modifiers store.
///
/// - Dev mode: `./variations_settings.json`
/// - Installed: `{config_dir}/variations_settings.json`
pub fn config_file() -> PathBuf {
    config_dir()
        .map(|p| p.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Path to the logs directory.
pub fn logs_dir() -> PathBuf {
    data_dir()
        .map(|p| p.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Ensure the config and data directories exist.
pub fn ensure_directories() -> std::io::Result<()> {
    if is_dev_mode() {
        return Ok(());
    }

    if let Some(config) = config_dir() {
        std::fs::create_dir_all(&config)?;
    }
    if let Some(data) = data_dir() {
        std::fs::create_dir_all(data.join("logs"))?;
    }
    Ok(())
}

/// File stem of the loaded document, used as the base name of every export.
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export")
        .to_string()
}

/// Appends `.{extension}` to the full file name (`a.json` -> `a.json.bak`).
pub fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_not_none() {
        assert!(config_dir().is_some());
    }

    #[test]
    fn test_config_file_name() {
        let path = config_file();
        assert!(path.to_string_lossy().ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_dev_mode_returns_local_paths() {
        // In tests, is_dev_mode() should be true due to debug_assertions
        assert!(is_dev_mode());
        assert_eq!(config_dir(), Some(PathBuf::from(".")));
        assert_eq!(data_dir(), Some(PathBuf::from(".")));
    }

    #[test]
    fn test_document_stem_drops_extension() {
        assert_eq!(document_stem(Path::new("/art/cover.v2.psd")), "cover.v2");
        assert_eq!(document_stem(Path::new("poster.psd")), "poster");
    }

    #[test]
    fn test_with_appended_extension_keeps_original_extension() {
        let path = with_appended_extension(Path::new("dir/settings.json"), "bak");
        assert_eq!(path, PathBuf::from("dir/settings.json.bak"));
    }
}
