//! Document load and preview render on the task pools.

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, IoTaskPool, Task};
use futures_lite::future;
use image::RgbaImage;

use crate::document::{LayerDocument, PsdDocument};
use crate::error::Result;

use super::preview::{fit_preview, PreviewImage};
use super::state::{Activity, Session};
use super::SessionError;

/// Message to open a document
#[derive(Message)]
pub struct LoadDocumentRequest {
    pub path: PathBuf,
}

/// Message to push the layer panel state and re-render the preview
#[derive(Message)]
pub struct RenderPreviewRequest;

/// Outcome of a load: the document and its first preview
pub struct LoadResult {
    pub path: PathBuf,
    pub outcome: Result<(Box<dyn LayerDocument>, RgbaImage)>,
}

/// Outcome of a render; the document always comes back
pub struct RenderResult {
    pub document: Box<dyn LayerDocument>,
    pub preview: Result<RgbaImage>,
}

#[derive(Component)]
pub struct LoadDocumentTask(pub Task<LoadResult>);

#[derive(Component)]
pub struct RenderPreviewTask(pub Task<RenderResult>);

fn open_and_render(path: &std::path::Path, max_width: u32) -> Result<(Box<dyn LayerDocument>, RgbaImage)> {
    let document = PsdDocument::open(path)?;
    let image = document.flatten()?;
    Ok((Box::new(document), fit_preview(image, max_width)))
}

/// Starts an async document load
pub fn start_load_system(
    mut commands: Commands,
    mut events: MessageReader<LoadDocumentRequest>,
    mut session: ResMut<Session>,
    mut preview: ResMut<PreviewImage>,
    mut errors: ResMut<SessionError>,
) {
    for event in events.read() {
        if let Err(e) = session.begin_load(event.path.clone()) {
            warn!("Cannot load {:?}: {}", event.path, e);
            errors.message = Some(e.to_string());
            continue;
        }
        preview.clear();

        let path = event.path.clone();
        let max_width = preview.max_width;
        info!("Loading document {:?}", path);
        let task = IoTaskPool::get().spawn(async move {
            let outcome = open_and_render(&path, max_width);
            LoadResult { path, outcome }
        });
        commands.spawn(LoadDocumentTask(task));
    }
}

/// Polls load tasks and installs the document
pub fn poll_load_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LoadDocumentTask)>,
    mut session: ResMut<Session>,
    mut preview: ResMut<PreviewImage>,
    mut errors: ResMut<SessionError>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        if let Some(result) = future::block_on(future::poll_once(&mut task.0)) {
            match result.outcome {
                Ok((document, image)) => {
                    session.install_document(document);
                    preview.set(image);
                    info!(
                        "Loaded {:?} with {} layer node(s)",
                        result.path,
                        session.baseline.len()
                    );
                }
                Err(e) => {
                    error!("Failed to load {:?}: {}", result.path, e);
                    session.fail_load();
                    errors.message = Some(format!("Failed to load document: {}", e));
                }
            }
            commands.entity(entity).despawn();
        }
    }
}

/// Pushes the edited layers and starts an async render
pub fn start_render_system(
    mut commands: Commands,
    mut events: MessageReader<RenderPreviewRequest>,
    mut session: ResMut<Session>,
    preview: Res<PreviewImage>,
    mut errors: ResMut<SessionError>,
) {
    for _ in events.read() {
        let document = match session.push_view().and_then(|_| session.take_document(Activity::Rendering)) {
            Ok(document) => document,
            Err(e) => {
                warn!("Cannot render preview: {}", e);
                errors.message = Some(e.to_string());
                continue;
            }
        };

        let max_width = preview.max_width;
        let task = AsyncComputeTaskPool::get().spawn(async move {
            let preview = document.flatten().map(|image| fit_preview(image, max_width));
            RenderResult { document, preview }
        });
        commands.spawn(RenderPreviewTask(task));
    }
}

/// Polls render tasks and swaps in the new preview
pub fn poll_render_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut RenderPreviewTask)>,
    mut session: ResMut<Session>,
    mut preview: ResMut<PreviewImage>,
    mut errors: ResMut<SessionError>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        if let Some(result) = future::block_on(future::poll_once(&mut task.0)) {
            session.return_document(result.document);
            match result.preview {
                Ok(image) => preview.set(image),
                Err(e) => {
                    error!("Failed to render preview: {}", e);
                    errors.message = Some(format!("Failed to render preview: {}", e));
                }
            }
            commands.entity(entity).despawn();
        }
    }
}
