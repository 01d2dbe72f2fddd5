//! Session state and the background tasks that hold the document.
//!
//! ## Module Structure
//!
//! - [`state`] - `Session` resource, interactive apply / reset / toggle
//! - [`tasks`] - document load and preview render tasks
//! - [`preview`] - downscaling and texture upload of the preview

pub mod preview;
pub mod state;
mod tasks;

pub use preview::PreviewImage;
pub use state::{Activity, Session};
pub use tasks::{LoadDocumentRequest, RenderPreviewRequest};

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

/// Error shown to the user in a dialog until dismissed
#[derive(Resource, Default)]
pub struct SessionError {
    pub message: Option<String>,
}

/// Keeps the window title in sync with the applied variation and modifiers
fn sync_window_title(session: Res<Session>, mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if !session.is_changed() {
        return;
    }
    let title = session.window_title();
    for mut window in windows.iter_mut() {
        if window.title != title {
            window.title = title.clone();
        }
    }
}

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Session>()
            .init_resource::<PreviewImage>()
            .init_resource::<SessionError>()
            .add_message::<LoadDocumentRequest>()
            .add_message::<RenderPreviewRequest>()
            .add_systems(
                Update,
                (
                    tasks::start_load_system.run_if(on_message::<LoadDocumentRequest>),
                    tasks::poll_load_tasks,
                    tasks::start_render_system.run_if(on_message::<RenderPreviewRequest>),
                    tasks::poll_render_tasks,
                    preview::upload_preview_system,
                    sync_window_title,
                ),
            );
    }
}
