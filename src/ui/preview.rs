//! Central panel showing the rendered preview.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::session::{PreviewImage, Session};

pub fn preview_ui(
    mut contexts: EguiContexts,
    mut preview: ResMut<PreviewImage>,
    session: Res<Session>,
) -> Result {
    egui::CentralPanel::default().show(contexts.ctx_mut()?, |ui| {
        // Next render is scaled to the space available here
        let available = ui.available_width().floor().max(1.0) as u32;
        if preview.max_width != available {
            preview.max_width = available;
        }

        match preview.texture_id {
            Some(texture_id) => {
                let [width, height] = preview.size;
                egui::ScrollArea::both().show(ui, |ui| {
                    ui.add(egui::Image::new(egui::load::SizedTexture::new(
                        texture_id,
                        egui::vec2(width as f32, height as f32),
                    )));
                });
            }
            None => {
                ui.centered_and_justified(|ui| {
                    let text = match session.activity {
                        Some(activity) => activity.description(),
                        None => "No preview",
                    };
                    ui.label(egui::RichText::new(text).weak().italics());
                });
            }
        }
    });
    Ok(())
}
