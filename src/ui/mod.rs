//! egui shell around the session.
//!
//! ## Module Structure
//!
//! - [`main_panel`] - menu bar, document and output paths, action buttons
//! - [`layers_panel`] - layer tree with visibility checkboxes
//! - [`preview`] - rendered preview
//! - [`rule_editor`] - variation, modifier and combinations editors
//! - [`dialogs`] - errors, confirmations and progress

mod dialogs;
mod layers_panel;
mod main_panel;
mod preview;
pub mod rule_editor;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::{ConfigResetNotification, ConfigSaveError};
use crate::export::ExportState;
use crate::session::{Session, SessionError};

/// Resource that tracks whether any modal dialog is currently open.
/// The panels behind the dialogs are disabled while it is set.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block the panels
    pub any_modal_open: bool,
}

/// System to aggregate all dialog open states into a single resource.
/// Runs in First schedule before the egui pass.
#[allow(clippy::too_many_arguments)]
fn update_dialog_state(
    main_panel: Res<main_panel::MainPanelState>,
    editor: Res<rule_editor::RuleEditorState>,
    session: Res<Session>,
    session_error: Res<SessionError>,
    export: Res<ExportState>,
    config_reset: Res<ConfigResetNotification>,
    save_error: Res<ConfigSaveError>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open = editor.is_open()
        || session.is_busy()
        || session_error.message.is_some()
        || export.is_running
        || export.outcome.is_some()
        || export.pending_confirmation.is_some()
        || config_reset.show
        || save_error.message.is_some()
        || main_panel.any_browse_pending();
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .init_resource::<main_panel::MainPanelState>()
            .init_resource::<rule_editor::RuleEditorState>()
            .add_systems(Update, main_panel::poll_browse_tasks)
            // Top panels and the side panel must be laid out before the
            // central preview takes the remaining space
            .add_systems(
                EguiPrimaryContextPass,
                (
                    main_panel::menu_bar_ui,
                    main_panel::controls_ui,
                    layers_panel::layers_panel_ui,
                    preview::preview_ui,
                )
                    .chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    // Editors first so their warnings stack on top
                    rule_editor::variation_editor_ui,
                    rule_editor::combinations_editor_ui,
                    rule_editor::modifier_editor_ui,
                    rule_editor::delete_confirmation_ui,
                    rule_editor::warning_ui,
                    dialogs::export_confirmation_ui,
                    dialogs::export_progress_ui,
                    dialogs::busy_modal_ui,
                    dialogs::session_error_ui,
                    dialogs::config_reset_notification_ui,
                    dialogs::config_save_error_ui,
                )
                    .chain()
                    .after(preview::preview_ui),
            )
            // Update dialog state at the start of each frame
            .add_systems(First, update_dialog_state);
    }
}
