//! Centralized constants used across the application.
//!
//! This module contains magic strings and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1280.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 860.0;

/// Base title of the main window; the active variation and modifiers are appended
pub const BASE_WINDOW_TITLE: &str = "ILLustration Variations Exporter";

/// Reserved address segment that switches into a layer's clip-layer sublist
pub const CLIP_SEGMENT: &str = "clip";

/// Placeholder name for the sentinel modifier and for combinations selecting nothing
pub const EMPTY_NAME: &str = "<Empty>";

/// Name given to combinations added by hand in the combinations editor
pub const NEW_COMBINATION_NAME: &str = "New comb";

/// File name of the persisted variations/modifiers store
pub const CONFIG_FILE_NAME: &str = "variations_settings.json";

/// Extension appended to the previous config file before it is overwritten
pub const BACKUP_EXTENSION: &str = "bak";

/// Extension of exported images
pub const EXPORT_EXTENSION: &str = ".png";

/// Extension used for in-progress exports before they are renamed into place
pub const PARTIAL_EXTENSION: &str = ".part";

/// Maximum preview height; the width follows the preview panel
pub const MAX_PREVIEW_HEIGHT: u32 = 10_000;

/// Fallback preview width used before the panel has been laid out
pub const DEFAULT_PREVIEW_WIDTH: u32 = 800;
