//! Notification, confirmation and progress dialogs.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::{ConfigResetNotification, ConfigSaveError};
use crate::export::{CancelExportRequest, ExportOutcome, ExportState, StartExportRequest};
use crate::session::{Activity, Session, SessionError};

fn error_window(ctx: &egui::Context, title: &str, message: &str) -> bool {
    let mut dismissed = false;
    egui::Window::new(title)
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                ui.colored_label(egui::Color32::RED, message);
            });
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    dismissed
}

/// Errors from loading, rendering, applying rule sets or starting exports
pub fn session_error_ui(mut contexts: EguiContexts, mut errors: ResMut<SessionError>) -> Result {
    let Some(message) = errors.message.clone() else {
        return Ok(());
    };
    if error_window(contexts.ctx_mut()?, "Error", &message) {
        errors.message = None;
    }
    Ok(())
}

pub fn config_save_error_ui(
    mut contexts: EguiContexts,
    mut save_error: ResMut<ConfigSaveError>,
) -> Result {
    let Some(message) = save_error.message.clone() else {
        return Ok(());
    };
    if error_window(contexts.ctx_mut()?, "Could Not Save Variations", &message) {
        save_error.message = None;
    }
    Ok(())
}

/// Shown once at startup when the stored variations could not be read
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Variations Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("The stored variations and modifiers could not be loaded.");
            ui.label("Starting with empty collections.");
            if let Some(reason) = &notification.reason {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(reason).weak());
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
                notification.reason = None;
            }
        });
    Ok(())
}

/// Asks before writing into a directory that already has files
pub fn export_confirmation_ui(
    mut contexts: EguiContexts,
    mut export: ResMut<ExportState>,
    mut export_events: MessageWriter<StartExportRequest>,
) -> Result {
    let Some(dir) = export.pending_confirmation.clone() else {
        return Ok(());
    };

    egui::Window::new("Output Directory Not Empty")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("The output directory already contains files:");
            ui.label(egui::RichText::new(dir.to_string_lossy()).weak());
            ui.label("Existing images are kept; new ones get a numbered name on clashes.");
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("Export anyway").clicked() {
                    export.pending_confirmation = None;
                    export_events.write(StartExportRequest { confirmed: true });
                }
                if ui.button("Cancel").clicked() {
                    export.pending_confirmation = None;
                }
            });
        });
    Ok(())
}

/// Progress of a running export, then its outcome until dismissed
pub fn export_progress_ui(
    mut contexts: EguiContexts,
    mut export: ResMut<ExportState>,
    mut cancel_events: MessageWriter<CancelExportRequest>,
) -> Result {
    if export.is_running {
        egui::Window::new("Exporting")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                ui.set_min_width(320.0);
                ui.label(format!(
                    "{} of {} image(s)",
                    export.exported.len(),
                    export.total
                ));
                ui.add(egui::ProgressBar::new(export.progress()).show_percentage());
                if let Some(last) = export.exported.last() {
                    ui.label(egui::RichText::new(last.to_string_lossy()).small().weak());
                }
                ui.add_space(8.0);
                if export.is_cancelling() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Cancelling after the current image...");
                    });
                } else if ui.button("Cancel").clicked() {
                    cancel_events.write(CancelExportRequest);
                }
            });
        return Ok(());
    }

    let Some(outcome) = &export.outcome else {
        return Ok(());
    };
    let (title, text, failed) = match outcome {
        ExportOutcome::Finished(count) => (
            "Export Finished",
            format!("{} image(s) exported.", count),
            false,
        ),
        ExportOutcome::Cancelled(count) => (
            "Export Cancelled",
            format!("Cancelled after {} image(s).", count),
            false,
        ),
        ExportOutcome::Failed(message) => ("Export Failed", message.clone(), true),
    };

    let mut dismissed = false;
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            if failed {
                ui.colored_label(egui::Color32::RED, &text);
            } else {
                ui.label(&text);
            }
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    if dismissed {
        export.outcome = None;
    }
    Ok(())
}

/// Blocks the window while a load or render holds the document
pub fn busy_modal_ui(mut contexts: EguiContexts, session: Res<Session>) -> Result {
    let Some(activity) = session.activity else {
        return Ok(());
    };
    // exports have their own progress window
    if activity == Activity::Exporting {
        return Ok(());
    }

    egui::Window::new("Working")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(activity.description());
            });
        });
    Ok(())
}
