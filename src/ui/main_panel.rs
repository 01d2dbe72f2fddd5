//! Top menu bar and the document / export controls.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{egui, EguiContexts};
use futures_lite::future;
use std::path::{Path, PathBuf};

use crate::combinations::expected_image_count;
use crate::config::{RuleStore, SaveConfigRequest};
use crate::export::{ExportState, StartExportRequest};
use crate::session::{LoadDocumentRequest, RenderPreviewRequest, Session, SessionError};

use super::rule_editor::{DeleteRequest, RuleEditorState};
use super::DialogState;

/// Pending native file dialogs opened from the main panel
#[derive(Resource, Default)]
pub struct MainPanelState {
    pub pending_document: Option<Task<Option<PathBuf>>>,
    pub pending_output_dir: Option<Task<Option<PathBuf>>>,
}

impl MainPanelState {
    pub fn any_browse_pending(&self) -> bool {
        self.pending_document.is_some() || self.pending_output_dir.is_some()
    }

    fn browse_document(&mut self) {
        if self.pending_document.is_some() {
            return;
        }
        self.pending_document = Some(AsyncComputeTaskPool::get().spawn(async {
            rfd::AsyncFileDialog::new()
                .add_filter("Photoshop Document", &["psd"])
                .set_title("Open PSD")
                .pick_file()
                .await
                .map(|h| h.path().to_path_buf())
        }));
    }

    fn browse_output_dir(&mut self) {
        if self.pending_output_dir.is_some() {
            return;
        }
        self.pending_output_dir = Some(AsyncComputeTaskPool::get().spawn(async {
            rfd::AsyncFileDialog::new()
                .set_title("Select Output Directory")
                .pick_folder()
                .await
                .map(|h| h.path().to_path_buf())
        }));
    }
}

/// Shortens long paths from the left so the file name stays visible
fn display_path(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    let count = path_str.chars().count();
    if count > 60 {
        let tail: String = path_str.chars().skip(count - 57).collect();
        format!("...{}", tail)
    } else {
        path_str.to_string()
    }
}

/// Polls the browse dialogs and forwards their results
pub fn poll_browse_tasks(
    mut state: ResMut<MainPanelState>,
    mut session: ResMut<Session>,
    mut load_events: MessageWriter<LoadDocumentRequest>,
) {
    if let Some(ref mut task) = state.pending_document
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        state.pending_document = None;
        if let Some(path) = result {
            load_events.write(LoadDocumentRequest { path });
        }
    }

    if let Some(ref mut task) = state.pending_output_dir
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        state.pending_output_dir = None;
        if let Some(path) = result {
            info!("Output directory set to {:?}", path);
            session.output_dir = Some(path);
        }
    }
}

/// Menu bar with the File, Variations and Modifiers menus
#[allow(clippy::too_many_arguments)]
pub fn menu_bar_ui(
    mut contexts: EguiContexts,
    mut state: ResMut<MainPanelState>,
    mut session: ResMut<Session>,
    mut editor: ResMut<RuleEditorState>,
    mut errors: ResMut<SessionError>,
    mut store: ResMut<RuleStore>,
    mut save_events: MessageWriter<SaveConfigRequest>,
    dialog_state: Res<DialogState>,
) -> Result {
    egui::TopBottomPanel::top("menu_bar").show(contexts.ctx_mut()?, |ui| {
        ui.add_enabled_ui(!dialog_state.any_modal_open, |ui| {
            ui.horizontal(|ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open PSD...").clicked() {
                        state.browse_document();
                        ui.close();
                    }
                    if ui.button("Output directory...").clicked() {
                        state.browse_output_dir();
                        ui.close();
                    }
                });

                ui.menu_button("Variations", |ui| {
                    if ui.button("New variation...").clicked() {
                        editor.new_variation(&session.book);
                        ui.close();
                    }
                    if !session.book.variations.is_empty() {
                        ui.separator();
                    }
                    let has_document = session.has_document();
                    let mut action = None;
                    let last = session.book.variations.len().saturating_sub(1);
                    for (index, variation) in session.book.variations.iter().enumerate() {
                        ui.menu_button(variation.name.as_str(), |ui| {
                            if ui.button("Edit...").clicked() {
                                action = Some(MenuAction::Edit(variation.id));
                                ui.close();
                            }
                            let mut applied = session.active_variation == Some(variation.id);
                            if ui
                                .add_enabled(has_document, egui::Checkbox::new(&mut applied, "Apply"))
                                .changed()
                            {
                                action = Some(MenuAction::Apply(variation.id, applied));
                                ui.close();
                            }
                            ui.separator();
                            if ui.add_enabled(index > 0, egui::Button::new("Move up")).clicked() {
                                action = Some(MenuAction::Move(index, true));
                                ui.close();
                            }
                            if ui.add_enabled(index < last, egui::Button::new("Move down")).clicked() {
                                action = Some(MenuAction::Move(index, false));
                                ui.close();
                            }
                            ui.separator();
                            if ui.button("Delete").clicked() {
                                action = Some(MenuAction::Delete(variation.id));
                                ui.close();
                            }
                        });
                    }
                    match action {
                        Some(MenuAction::Edit(id)) => {
                            if let Some(variation) = session.book.variation(id) {
                                editor.edit_variation(variation);
                            }
                        }
                        Some(MenuAction::Apply(id, apply)) => {
                            if let Err(e) = session.apply_variation(id, apply) {
                                errors.message = Some(e.to_string());
                            }
                        }
                        Some(MenuAction::Delete(id)) => {
                            editor.pending_delete = Some(DeleteRequest::Variation(id));
                        }
                        Some(MenuAction::Move(index, up)) => {
                            if session.book.move_variation(index, up) {
                                store.dirty = true;
                                save_events.write(SaveConfigRequest);
                            }
                        }
                        None => {}
                    }
                });

                ui.menu_button("Modifiers", |ui| {
                    if ui.button("New modifier...").clicked() {
                        editor.new_modifier(&session.book);
                        ui.close();
                    }
                    if !session.book.modifiers.is_empty() {
                        ui.separator();
                    }
                    let linked = session
                        .active_variation()
                        .map(|v| v.modifiers.clone())
                        .unwrap_or_default();
                    let mut action = None;
                    let last = session.book.modifiers.len().saturating_sub(1);
                    for (index, modifier) in session.book.modifiers.iter().enumerate() {
                        ui.menu_button(modifier.name.as_str(), |ui| {
                            if ui.button("Edit...").clicked() {
                                action = Some(MenuAction::Edit(modifier.id));
                                ui.close();
                            }
                            let mut applied = session.active_modifiers.contains(&modifier.id);
                            let enabled = linked.contains(&modifier.id);
                            if ui
                                .add_enabled(enabled, egui::Checkbox::new(&mut applied, "Apply"))
                                .on_disabled_hover_text("Not linked to the applied variation")
                                .changed()
                            {
                                action = Some(MenuAction::Apply(modifier.id, applied));
                                ui.close();
                            }
                            ui.separator();
                            if ui.add_enabled(index > 0, egui::Button::new("Move up")).clicked() {
                                action = Some(MenuAction::Move(index, true));
                                ui.close();
                            }
                            if ui.add_enabled(index < last, egui::Button::new("Move down")).clicked() {
                                action = Some(MenuAction::Move(index, false));
                                ui.close();
                            }
                            ui.separator();
                            if ui.button("Delete").clicked() {
                                action = Some(MenuAction::Delete(modifier.id));
                                ui.close();
                            }
                        });
                    }
                    match action {
                        Some(MenuAction::Edit(id)) => {
                            if let Some(modifier) = session.book.modifier(id) {
                                editor.edit_modifier(modifier);
                            }
                        }
                        Some(MenuAction::Apply(id, apply)) => {
                            if let Err(e) = session.apply_modifier(id, apply) {
                                errors.message = Some(e.to_string());
                            }
                        }
                        Some(MenuAction::Delete(id)) => {
                            match session.book.check_modifier_removable(id) {
                                Ok(()) => editor.pending_delete = Some(DeleteRequest::Modifier(id)),
                                Err(e) => editor.warning = Some(e.to_string()),
                            }
                        }
                        Some(MenuAction::Move(index, up)) => {
                            if session.book.move_modifier(index, up) {
                                store.dirty = true;
                                save_events.write(SaveConfigRequest);
                            }
                        }
                        None => {}
                    }
                });
            });
        });
    });
    Ok(())
}

enum MenuAction {
    Edit(u32),
    Apply(u32, bool),
    Delete(u32),
    /// Index in the book and direction (up when true)
    Move(usize, bool),
}

/// Input file, output directory and the action buttons
#[allow(clippy::too_many_arguments)]
pub fn controls_ui(
    mut contexts: EguiContexts,
    mut state: ResMut<MainPanelState>,
    mut session: ResMut<Session>,
    export: Res<ExportState>,
    dialog_state: Res<DialogState>,
    mut render_events: MessageWriter<RenderPreviewRequest>,
    mut export_events: MessageWriter<StartExportRequest>,
) -> Result {
    egui::TopBottomPanel::top("controls")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_enabled_ui(!dialog_state.any_modal_open, |ui| {
                egui::Grid::new("paths_grid")
                    .num_columns(3)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Input PSD:");
                        match &session.document_path {
                            Some(path) => {
                                ui.label(display_path(path))
                                    .on_hover_text(path.to_string_lossy().as_ref());
                            }
                            None => {
                                ui.label(egui::RichText::new("No document loaded").weak().italics());
                            }
                        }
                        if ui.button("Browse...").clicked() {
                            state.browse_document();
                        }
                        ui.end_row();

                        ui.label("Output directory:");
                        match &session.output_dir {
                            Some(path) => {
                                ui.label(display_path(path))
                                    .on_hover_text(path.to_string_lossy().as_ref());
                            }
                            None => {
                                ui.label(egui::RichText::new("Not set").weak().italics());
                            }
                        }
                        if ui.button("Browse...").clicked() {
                            state.browse_output_dir();
                        }
                        ui.end_row();
                    });

                ui.add_space(6.0);

                ui.horizontal(|ui| {
                    let idle = session.has_document() && !session.is_busy();

                    if ui
                        .add_enabled(idle, egui::Button::new("Update preview"))
                        .clicked()
                    {
                        render_events.write(RenderPreviewRequest);
                    }

                    if ui
                        .add_enabled(idle, egui::Button::new("Reset layers"))
                        .clicked()
                    {
                        session.reset_layers();
                        render_events.write(RenderPreviewRequest);
                    }

                    ui.separator();

                    let can_export = idle && session.output_dir.is_some() && !export.is_running;
                    if ui
                        .add_enabled(can_export, egui::Button::new("Start export"))
                        .clicked()
                    {
                        export_events.write(StartExportRequest { confirmed: false });
                    }

                    ui.label(
                        egui::RichText::new(format!(
                            "{} image(s) to export",
                            expected_image_count(&session.book.variations)
                        ))
                        .weak(),
                    );
                });
            });
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_keeps_short_paths() {
        assert_eq!(display_path(Path::new("/art/cover.psd")), "/art/cover.psd");
    }

    #[test]
    fn test_display_path_truncates_from_the_left() {
        let long = format!("/{}/cover.psd", "a".repeat(80));
        let shown = display_path(Path::new(&long));
        assert!(shown.starts_with("..."));
        assert!(shown.ends_with("cover.psd"));
        assert_eq!(shown.chars().count(), 60);
    }
}
