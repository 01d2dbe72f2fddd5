//! Export state resources and task components.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::Task;

use crate::document::LayerDocument;
use crate::error::Result;

use super::pipeline::ExportEvent;

/// Message to start exporting into the session's output directory.
///
/// `confirmed` skips the non-empty directory check.
#[derive(Message)]
pub struct StartExportRequest {
    pub confirmed: bool,
}

/// Message to stop a running export after the current image
#[derive(Message)]
pub struct CancelExportRequest;

/// State of the current or last export run
#[derive(Resource, Default)]
pub struct ExportState {
    pub is_running: bool,
    /// Images the run will write, known once planning is done
    pub total: usize,
    pub exported: Vec<PathBuf>,
    /// Set when the run finished, failed or was cancelled
    pub outcome: Option<ExportOutcome>,
    /// Output directory waiting for the user to confirm it despite existing files
    pub pending_confirmation: Option<PathBuf>,
    pub(crate) receiver: Option<flume::Receiver<ExportEvent>>,
    pub(crate) cancel: Option<Arc<AtomicBool>>,
}

impl ExportState {
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.exported.len() as f32 / self.total as f32
        }
    }

    pub fn request_cancel(&self) {
        if let Some(flag) = &self.cancel {
            flag.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Reset for a new run and hand out its cancel flag and progress sender.
    pub(crate) fn begin(&mut self) -> (Arc<AtomicBool>, flume::Sender<ExportEvent>) {
        let (sender, receiver) = flume::unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        *self = Self {
            is_running: true,
            receiver: Some(receiver),
            cancel: Some(cancel.clone()),
            ..Default::default()
        };
        (cancel, sender)
    }

    /// Apply every progress event sent so far.
    pub(crate) fn drain(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        let events: Vec<ExportEvent> = receiver.try_iter().collect();
        for event in events {
            match event {
                ExportEvent::Planned { total } => self.total = total,
                ExportEvent::ImageExported { path } => self.exported.push(path),
                ExportEvent::Finished { count } => debug!("Export reported {} image(s)", count),
            }
        }
    }
}

/// How an export run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Finished(usize),
    Cancelled(usize),
    Failed(String),
}

/// Result of an export task; the document always comes back
pub struct ExportResult {
    pub document: Box<dyn LayerDocument>,
    pub outcome: Result<usize>,
}

/// Background export task
#[derive(Component)]
pub struct ExportTask(pub Task<ExportResult>);
