//! Layer tree with visibility checkboxes.
//!
//! Toggling a checkbox only edits the session's view of the layers; the
//! change reaches the document on the next "Update preview".

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::document::{Address, LayerNode};
use crate::session::Session;

use super::DialogState;

pub fn layers_panel_ui(
    mut contexts: EguiContexts,
    mut session: ResMut<Session>,
    dialog_state: Res<DialogState>,
) -> Result {
    egui::SidePanel::left("layers_panel")
        .default_width(260.0)
        .resizable(true)
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Layers").heading().size(18.0));
            ui.add_space(4.0);
            ui.separator();

            if session.view.is_empty() {
                let text = if session.is_busy() {
                    "Working..."
                } else {
                    "Open a PSD to see its layers"
                };
                ui.label(egui::RichText::new(text).weak().italics());
                return;
            }

            let mut toggled = Vec::new();
            ui.add_enabled_ui(!session.is_busy() && !dialog_state.any_modal_open, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for node in &session.view.nodes {
                            render_node(ui, node, &mut toggled);
                        }
                    });
            });

            for (address, visible) in toggled {
                if !session.set_visible(&address, visible) {
                    warn!("No layer at {}", address);
                }
            }
        });
    Ok(())
}

fn render_node(ui: &mut egui::Ui, node: &LayerNode, toggled: &mut Vec<(Address, bool)>) {
    let mut visible = node.visible;
    let label = if node.address.is_clip() {
        format!("↳ {}", node.label)
    } else {
        node.label.clone()
    };

    if node.children.is_empty() {
        if ui.checkbox(&mut visible, label).changed() {
            toggled.push((node.address.clone(), visible));
        }
        return;
    }

    let id = ui.make_persistent_id(node.address.to_string());
    egui::collapsing_header::CollapsingState::load_with_default_open(ui.ctx(), id, true)
        .show_header(ui, |ui| {
            if ui
                .checkbox(&mut visible, egui::RichText::new(label).strong())
                .changed()
            {
                toggled.push((node.address.clone(), visible));
            }
        })
        .body(|ui| {
            for child in &node.children {
                render_node(ui, child, toggled);
            }
        });
}
