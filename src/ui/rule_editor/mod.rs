//! Editor windows for variations, modifiers and combinations.
//!
//! ## Module Structure
//!
//! - [`draft`] - working copies and their editing operations
//!
//! ## Systems
//!
//! - [`variation_editor_ui`]: name, patterns, linked modifiers
//! - [`combinations_editor_ui`]: curated combinations of a variation
//! - [`modifier_editor_ui`]: name, suffix, patterns
//! - [`delete_confirmation_ui`]: confirm removing a variation or modifier
//! - [`warning_ui`]: messages raised while editing

pub mod draft;

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::combinations::CombinationListExt;
use crate::config::{RuleStore, SaveConfigRequest};
use crate::error::Result as VariationResult;
use crate::rules::{Modifier, PatternKind, RuleBook, RulePattern, Variation};
use crate::session::{RenderPreviewRequest, Session};

use draft::{ModifierDraft, PatternInput, VariationDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRequest {
    Variation(u32),
    Modifier(u32),
}

/// Open editor windows
#[derive(Resource, Default)]
pub struct RuleEditorState {
    pub variation: Option<VariationDraft>,
    pub modifier: Option<ModifierDraft>,
    pub pending_delete: Option<DeleteRequest>,
    /// Message shown on top of the editors until dismissed
    pub warning: Option<String>,
}

impl RuleEditorState {
    pub fn is_open(&self) -> bool {
        self.variation.is_some()
            || self.modifier.is_some()
            || self.pending_delete.is_some()
            || self.warning.is_some()
    }

    pub fn new_variation(&mut self, book: &RuleBook) {
        self.variation = Some(VariationDraft::new(book));
    }

    pub fn edit_variation(&mut self, variation: &Variation) {
        self.variation = Some(VariationDraft::edit(variation));
    }

    pub fn new_modifier(&mut self, book: &RuleBook) {
        self.modifier = Some(ModifierDraft::new(book));
    }

    pub fn edit_modifier(&mut self, modifier: &Modifier) {
        self.modifier = Some(ModifierDraft::edit(modifier));
    }
}

/// `Wildcard: hat*` for a stored `glob:hat*`
fn pattern_label(stored: &str) -> String {
    match stored.parse::<RulePattern>() {
        Ok(pattern) => format!("{}: {}", pattern.kind.display_name(), pattern.body),
        Err(_) => stored.to_string(),
    }
}

/// One pattern list with its input row. Returns the outcome of an add attempt.
fn pattern_list(
    ui: &mut egui::Ui,
    id_salt: &str,
    title: &str,
    list: &mut Vec<String>,
    input: &mut PatternInput,
) -> Option<VariationResult<()>> {
    ui.label(egui::RichText::new(title).strong());

    let mut remove = None;
    egui::ScrollArea::vertical()
        .id_salt(id_salt)
        .max_height(120.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            if list.is_empty() {
                ui.label(egui::RichText::new("None").weak().italics());
            }
            for (i, pattern) in list.iter().enumerate() {
                ui.horizontal(|ui| {
                    if ui.small_button("✖").on_hover_text("Remove").clicked() {
                        remove = Some(i);
                    }
                    ui.label(pattern_label(pattern));
                });
            }
        });
    if let Some(i) = remove {
        list.remove(i);
    }

    let mut result = None;
    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt(format!("{}_kind", id_salt))
            .width(140.0)
            .selected_text(input.kind.display_name())
            .show_ui(ui, |ui| {
                for kind in PatternKind::all() {
                    ui.selectable_value(&mut input.kind, *kind, kind.display_name());
                }
            });
        let response = ui.add(
            egui::TextEdit::singleline(&mut input.body)
                .desired_width(160.0)
                .hint_text("Layer name"),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Add").clicked() || submitted {
            result = Some(input.commit(list));
        }
    });
    result
}

fn name_fields(ui: &mut egui::Ui, id: &str, name: &mut String, suffix: &mut String, subfolder: Option<&mut String>) {
    egui::Grid::new(id)
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label("Name:");
            ui.text_edit_singleline(name);
            ui.end_row();

            ui.label("Suffix:");
            ui.add(egui::TextEdit::singleline(suffix).hint_text("Appended to file names"));
            ui.end_row();

            if let Some(subfolder) = subfolder {
                ui.label("Subfolder:");
                ui.add(egui::TextEdit::singleline(subfolder).hint_text("Inside the output directory"));
                ui.end_row();
            }
        });
}

/// Store the book and re-render when an applied rule set changed
fn after_book_change(
    session: &mut Session,
    store: &mut RuleStore,
    save_events: &mut MessageWriter<SaveConfigRequest>,
    render_events: &mut MessageWriter<RenderPreviewRequest>,
    touches_selection: bool,
) {
    store.dirty = true;
    save_events.write(SaveConfigRequest);
    if touches_selection {
        session.reset_layers();
        if session.has_document() {
            render_events.write(RenderPreviewRequest);
        }
    }
}

enum LinkAction {
    Link,
    Unlink,
    LinkAll,
    UnlinkAll,
    MoveUp,
    MoveDown,
}

pub fn variation_editor_ui(
    mut contexts: EguiContexts,
    mut editor: ResMut<RuleEditorState>,
    mut session: ResMut<Session>,
    mut store: ResMut<RuleStore>,
    mut save_events: MessageWriter<SaveConfigRequest>,
    mut render_events: MessageWriter<RenderPreviewRequest>,
) -> Result {
    let editor = &mut *editor;
    let Some(draft) = editor.variation.as_mut() else {
        return Ok(());
    };

    let mut should_save = false;
    let mut should_close = false;
    let mut open_combinations = false;
    let mut link_action = None;
    let mut pattern_error = None;

    let title = if draft.is_new {
        "New Variation"
    } else {
        "Edit Variation"
    };
    let book = &session.book;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(true)
        .min_width(560.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_enabled_ui(draft.combinations.is_none(), |ui| {
                {
                    let variation = &mut draft.variation;
                    name_fields(
                        ui,
                        "variation_fields",
                        &mut variation.name,
                        &mut variation.suffix,
                        Some(&mut variation.subfolder),
                    );
                }

                ui.add_space(8.0);
                ui.columns(2, |columns| {
                    if let Some(outcome) = pattern_list(
                        &mut columns[0],
                        "variation_inclusions",
                        "Inclusions",
                        &mut draft.variation.inclusions,
                        &mut draft.inputs.inclusion,
                    ) {
                        pattern_error = Some(outcome.err().map(|e| e.to_string()));
                    }
                    if let Some(outcome) = pattern_list(
                        &mut columns[1],
                        "variation_exclusions",
                        "Exclusions",
                        &mut draft.variation.exclusions,
                        &mut draft.inputs.exclusion,
                    ) {
                        pattern_error = Some(outcome.err().map(|e| e.to_string()));
                    }
                });
                if let Some(error) = &draft.inputs.error {
                    ui.colored_label(egui::Color32::RED, error);
                }

                ui.add_space(8.0);
                ui.separator();

                let mut select_linked = None;
                let mut select_available = None;
                ui.horizontal_top(|ui| {
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new("Linked modifiers").strong());
                        egui::ScrollArea::vertical()
                            .id_salt("linked_modifiers")
                            .max_height(140.0)
                            .show(ui, |ui| {
                                ui.set_min_width(180.0);
                                for (i, id) in draft.linked.iter().enumerate() {
                                    let name = book.modifier(*id).map_or("?", |m| m.name.as_str());
                                    let selected = draft.selected_linked == Some(i);
                                    if ui.add(egui::Button::new(name).selected(selected)).clicked() {
                                        select_linked = Some(i);
                                    }
                                }
                            });
                    });

                    ui.vertical(|ui| {
                        ui.add_space(16.0);
                        if ui.button("◀ Link").clicked() {
                            link_action = Some(LinkAction::Link);
                        }
                        if ui.button("Unlink ▶").clicked() {
                            link_action = Some(LinkAction::Unlink);
                        }
                        if ui.button("Link all").clicked() {
                            link_action = Some(LinkAction::LinkAll);
                        }
                        if ui.button("Unlink all").clicked() {
                            link_action = Some(LinkAction::UnlinkAll);
                        }
                        ui.add_space(4.0);
                        if ui.button("Move up").clicked() {
                            link_action = Some(LinkAction::MoveUp);
                        }
                        if ui.button("Move down").clicked() {
                            link_action = Some(LinkAction::MoveDown);
                        }
                    });

                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new("Available modifiers").strong());
                        egui::ScrollArea::vertical()
                            .id_salt("available_modifiers")
                            .max_height(140.0)
                            .show(ui, |ui| {
                                ui.set_min_width(180.0);
                                for (i, modifier) in draft.available(book).iter().enumerate() {
                                    let selected = draft.selected_available == Some(i);
                                    if ui
                                        .add(egui::Button::new(modifier.name.as_str()).selected(selected))
                                        .clicked()
                                    {
                                        select_available = Some(i);
                                    }
                                }
                            });
                    });
                });
                if select_linked.is_some() {
                    draft.selected_linked = select_linked;
                }
                if select_available.is_some() {
                    draft.selected_available = select_available;
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Configure combinations...").clicked() {
                        open_combinations = true;
                    }
                    let summary = if draft.variation.combinations.is_empty() {
                        "Every combination is exported".to_string()
                    } else {
                        format!("{} curated combination(s)", draft.variation.combinations.len())
                    };
                    ui.label(egui::RichText::new(summary).weak());
                });
                if draft.combinations_stale && !draft.variation.combinations.is_empty() {
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        "The linked modifiers changed, review the combinations",
                    );
                }

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        should_save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        should_close = true;
                    }
                });
            });
        });

    if let Some(error) = pattern_error {
        draft.inputs.error = error;
    }

    match link_action {
        Some(LinkAction::Link) => {
            let id = draft
                .selected_available
                .and_then(|i| draft.available(book).get(i).map(|m| m.id));
            if let Some(id) = id {
                draft.link(id);
                draft.selected_available = None;
            }
        }
        Some(LinkAction::Unlink) => {
            if let Some(id) = draft.selected_linked.and_then(|i| draft.linked.get(i).copied()) {
                draft.unlink(id);
                draft.selected_linked = None;
            }
        }
        Some(LinkAction::LinkAll) => draft.link_all(book),
        Some(LinkAction::UnlinkAll) => {
            draft.unlink_all();
            draft.selected_linked = None;
        }
        Some(LinkAction::MoveUp) => {
            if let Some(i) = draft.selected_linked {
                draft.move_linked(i, true);
            }
        }
        Some(LinkAction::MoveDown) => {
            if let Some(i) = draft.selected_linked {
                draft.move_linked(i, false);
            }
        }
        None => {}
    }

    if open_combinations && let Err(e) = draft.open_combinations(book) {
        editor.warning = Some(e.to_string());
    }

    if should_save {
        match draft.finish().and_then(|v| session.book.upsert_variation(v)) {
            Ok(id) => {
                info!("Saved variation {}", id);
                let applied = session.active_variation == Some(id);
                after_book_change(
                    &mut session,
                    &mut store,
                    &mut save_events,
                    &mut render_events,
                    applied,
                );
                should_close = true;
            }
            Err(e) => editor.warning = Some(e.to_string()),
        }
    }

    if should_close {
        editor.variation = None;
    }
    Ok(())
}

pub fn combinations_editor_ui(
    mut contexts: EguiContexts,
    mut editor: ResMut<RuleEditorState>,
) -> Result {
    let editor = &mut *editor;
    let Some(draft) = editor.variation.as_mut() else {
        return Ok(());
    };
    let name = draft.variation.name.clone();
    let Some(combinations) = draft.combinations.as_mut() else {
        return Ok(());
    };

    let mut accept = false;
    let mut cancel = false;
    let mut toggle = None;

    egui::Window::new(format!("Combinations of {}", name))
        .order(egui::Order::Foreground)
        .collapsible(false)
        .resizable(true)
        .min_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Add").clicked() {
                    combinations.add();
                }
                let has_selection = combinations.selected.is_some();
                if ui.add_enabled(has_selection, egui::Button::new("Remove")).clicked() {
                    combinations.remove_selected();
                }
                if ui.add_enabled(has_selection, egui::Button::new("Move up")).clicked() {
                    combinations.move_selected(true);
                }
                if ui.add_enabled(has_selection, egui::Button::new("Move down")).clicked() {
                    combinations.move_selected(false);
                }
            });
            ui.add_space(4.0);

            egui::ScrollArea::both().max_height(320.0).show(ui, |ui| {
                egui::Grid::new("combinations_grid")
                    .striped(true)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("");
                        ui.label(egui::RichText::new("Name").strong());
                        for header in &combinations.headers {
                            ui.label(egui::RichText::new(header).strong());
                        }
                        ui.end_row();

                        let bits = combinations.headers.len();
                        let mut select = None;
                        for (i, row) in combinations.rows.iter_mut().enumerate() {
                            if ui.radio(combinations.selected == Some(i), "").clicked() {
                                select = Some(i);
                            }
                            ui.text_edit_singleline(&mut row.name);
                            let flags: Vec<char> = row.bitmask.chars().collect();
                            for bit in 0..bits {
                                let mut on = flags.get(bit) == Some(&'1');
                                if ui.checkbox(&mut on, "").changed() {
                                    toggle = Some((i, bit));
                                }
                            }
                            ui.end_row();
                        }
                        if select.is_some() {
                            combinations.selected = select;
                        }
                    });
            });

            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(format!("{} image(s)", combinations.rows.len())).weak(),
            );
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    accept = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if let Some((row, bit)) = toggle
        && let Err(e) = combinations.rows.toggle_bit(row, bit)
    {
        editor.warning = Some(e.to_string());
    }
    if accept {
        draft.accept_combinations();
    } else if cancel {
        draft.discard_combinations();
    }
    Ok(())
}

pub fn modifier_editor_ui(
    mut contexts: EguiContexts,
    mut editor: ResMut<RuleEditorState>,
    mut session: ResMut<Session>,
    mut store: ResMut<RuleStore>,
    mut save_events: MessageWriter<SaveConfigRequest>,
    mut render_events: MessageWriter<RenderPreviewRequest>,
) -> Result {
    let editor = &mut *editor;
    let Some(draft) = editor.modifier.as_mut() else {
        return Ok(());
    };

    let mut should_save = false;
    let mut should_close = false;
    let mut pattern_error = None;
    let title = if draft.is_new {
        "New Modifier"
    } else {
        "Edit Modifier"
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(true)
        .min_width(480.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            name_fields(
                ui,
                "modifier_fields",
                &mut draft.modifier.name,
                &mut draft.modifier.suffix,
                None,
            );

            ui.add_space(8.0);
            ui.columns(2, |columns| {
                if let Some(outcome) = pattern_list(
                    &mut columns[0],
                    "modifier_inclusions",
                    "Inclusions",
                    &mut draft.modifier.inclusions,
                    &mut draft.inputs.inclusion,
                ) {
                    pattern_error = Some(outcome.err().map(|e| e.to_string()));
                }
                if let Some(outcome) = pattern_list(
                    &mut columns[1],
                    "modifier_exclusions",
                    "Exclusions",
                    &mut draft.modifier.exclusions,
                    &mut draft.inputs.exclusion,
                ) {
                    pattern_error = Some(outcome.err().map(|e| e.to_string()));
                }
            });
            if let Some(error) = &draft.inputs.error {
                ui.colored_label(egui::Color32::RED, error);
            }

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    should_save = true;
                }
                if ui.button("Cancel").clicked() {
                    should_close = true;
                }
            });
        });

    if let Some(error) = pattern_error {
        draft.inputs.error = error;
    }

    if should_save {
        match draft.finish() {
            Ok(modifier) => {
                let id = session.book.upsert_modifier(modifier);
                info!("Saved modifier {}", id);
                let applied = session.active_modifiers.contains(&id);
                after_book_change(
                    &mut session,
                    &mut store,
                    &mut save_events,
                    &mut render_events,
                    applied,
                );
                should_close = true;
            }
            Err(e) => editor.warning = Some(e.to_string()),
        }
    }

    if should_close {
        editor.modifier = None;
    }
    Ok(())
}

pub fn delete_confirmation_ui(
    mut contexts: EguiContexts,
    mut editor: ResMut<RuleEditorState>,
    mut session: ResMut<Session>,
    mut store: ResMut<RuleStore>,
    mut save_events: MessageWriter<SaveConfigRequest>,
    mut render_events: MessageWriter<RenderPreviewRequest>,
) -> Result {
    let Some(request) = editor.pending_delete else {
        return Ok(());
    };
    let target = match request {
        DeleteRequest::Variation(id) => session
            .book
            .variation(id)
            .map(|v| format!("variation \"{}\"", v.name)),
        DeleteRequest::Modifier(id) => session
            .book
            .modifier(id)
            .map(|m| format!("modifier \"{}\"", m.name)),
    };
    let Some(target) = target else {
        editor.pending_delete = None;
        return Ok(());
    };

    let mut confirmed = false;
    let mut cancelled = false;
    egui::Window::new("Confirm Delete")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label(format!("Delete the {}?", target));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Delete").clicked() {
                    confirmed = true;
                }
                if ui.button("Cancel").clicked() {
                    cancelled = true;
                }
            });
        });

    if confirmed {
        editor.pending_delete = None;
        let result = match request {
            DeleteRequest::Variation(id) => {
                session.book.remove_variation(id);
                Ok(session.active_variation == Some(id))
            }
            DeleteRequest::Modifier(id) => session.book.remove_modifier(id).map(|_| false),
        };
        match result {
            Ok(applied) => {
                info!("Deleted {}", target);
                after_book_change(
                    &mut session,
                    &mut store,
                    &mut save_events,
                    &mut render_events,
                    applied,
                );
            }
            Err(e) => editor.warning = Some(e.to_string()),
        }
    } else if cancelled {
        editor.pending_delete = None;
    }
    Ok(())
}

pub fn warning_ui(mut contexts: EguiContexts, mut editor: ResMut<RuleEditorState>) -> Result {
    let Some(warning) = editor.warning.clone() else {
        return Ok(());
    };
    egui::Window::new("Warning")
        .collapsible(false)
        .resizable(false)
        .order(egui::Order::Foreground)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label(warning);
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                editor.warning = None;
            }
        });
    Ok(())
}
