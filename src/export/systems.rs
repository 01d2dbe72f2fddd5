//! Bevy systems that start, drive and finish export runs.

use bevy::prelude::*;
use bevy::tasks::AsyncComputeTaskPool;
use futures_lite::future;

use crate::error::VariationError;
use crate::paths::document_stem;
use crate::session::{Activity, RenderPreviewRequest, Session, SessionError};

use super::pipeline::{is_non_empty_dir, run_export, ExportJob};
use super::state::{
    CancelExportRequest, ExportOutcome, ExportResult, ExportState, ExportTask, StartExportRequest,
};

/// Starts an export run on the compute pool
pub fn start_export_system(
    mut commands: Commands,
    mut events: MessageReader<StartExportRequest>,
    mut session: ResMut<Session>,
    mut export: ResMut<ExportState>,
    mut errors: ResMut<SessionError>,
) {
    for event in events.read() {
        if export.is_running {
            warn!("Export already in progress");
            continue;
        }
        let (Some(output_dir), Some(document_path)) =
            (session.output_dir.clone(), session.document_path.clone())
        else {
            errors.message = Some("Select a PSD file and an output directory first".to_string());
            continue;
        };
        if !session.has_document() {
            errors.message = Some(VariationError::NoDocument.to_string());
            continue;
        }
        if !event.confirmed && is_non_empty_dir(&output_dir) {
            export.pending_confirmation = Some(output_dir);
            continue;
        }

        let job = ExportJob {
            output_dir,
            base_name: document_stem(&document_path),
            baseline: session.baseline.clone(),
            book: session.book.clone(),
        };
        let mut document = match session.take_document(Activity::Exporting) {
            Ok(document) => document,
            Err(e) => {
                errors.message = Some(e.to_string());
                continue;
            }
        };

        let (cancel, sender) = export.begin();
        let task = AsyncComputeTaskPool::get().spawn(async move {
            let outcome = run_export(document.as_mut(), &job, &sender, &cancel);
            ExportResult { document, outcome }
        });
        commands.spawn(ExportTask(task));
    }
}

pub fn cancel_export_system(
    mut events: MessageReader<CancelExportRequest>,
    export: Res<ExportState>,
) {
    for _ in events.read() {
        if export.is_running {
            info!("Cancelling export");
            export.request_cancel();
        }
    }
}

/// Drains progress and finishes the run when the task completes
pub fn poll_export_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut ExportTask)>,
    mut session: ResMut<Session>,
    mut export: ResMut<ExportState>,
    mut render: MessageWriter<RenderPreviewRequest>,
) {
    export.drain();

    for (entity, mut task) in tasks.iter_mut() {
        if let Some(result) = future::block_on(future::poll_once(&mut task.0)) {
            export.drain();
            session.return_document(result.document);
            let written = export.exported.len();
            export.outcome = Some(match result.outcome {
                Ok(count) => ExportOutcome::Finished(count),
                Err(VariationError::Cancelled) => ExportOutcome::Cancelled(written),
                Err(e) => {
                    error!("Export failed after {} image(s): {}", written, e);
                    ExportOutcome::Failed(e.to_string())
                }
            });
            export.is_running = false;
            export.receiver = None;
            export.cancel = None;

            // The run left its last combination on the document; the render
            // pushes the layer panel state back before flattening
            render.write(RenderPreviewRequest);
            commands.entity(entity).despawn();
        }
    }
}
