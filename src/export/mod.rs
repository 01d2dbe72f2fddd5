//! Batch export of every variation and combination to PNG.
//!
//! The pipeline itself ([`pipeline::run_export`]) is a plain function over a
//! [`LayerDocument`](crate::document::LayerDocument). The plugin moves the
//! session's document into a compute task, streams progress back over a
//! channel and returns the document when the run ends.

pub mod pipeline;
mod state;
mod systems;

pub use pipeline::{run_export, unique_filename, ExportEvent, ExportJob};
pub use state::{CancelExportRequest, ExportOutcome, ExportState, StartExportRequest};

use bevy::prelude::*;

pub struct ExportPlugin;

impl Plugin for ExportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ExportState>()
            .add_message::<StartExportRequest>()
            .add_message::<CancelExportRequest>()
            .add_systems(
                Update,
                (
                    systems::start_export_system.run_if(on_message::<StartExportRequest>),
                    systems::cancel_export_system.run_if(on_message::<CancelExportRequest>),
                    systems::poll_export_tasks,
                ),
            );
    }
}
