//! PSD-backed document engine.
//!
//! Decoding and compositing are done by the `psd` crate. The crate keeps
//! groups and pixel layers in two flat lists linked by parent ids, so the
//! hierarchy is rebuilt here once at load time. Visibility lives on the
//! rebuilt [`LiveLayer`]s and is turned into a per-layer filter when
//! flattening, hiding everything under an invisible group.
//!
//! The engine lists layers top-down; sibling lists here are bottom-up, the
//! order the layers panel and addresses use.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use image::RgbaImage;
use psd::{Psd, PsdLayer};

use crate::error::{Result, VariationError};

use super::{LayerDocument, LayerKind, LiveLayer};

pub struct PsdDocument {
    psd: Psd,
    path: PathBuf,
    layers: Vec<LiveLayer>,
}

impl PsdDocument {
    /// Read and decode the file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).map_err(|e| VariationError::io("Failed to read document", path, e))?;
        let psd = Psd::from_bytes(&bytes)
            .map_err(|e| VariationError::Document(format!("{:?}", e)))?;
        let layers = build_hierarchy(&psd);
        info!(
            "Decoded {:?}: {}x{}, {} layers, {} groups",
            path,
            psd.width(),
            psd.height(),
            psd.layers().len(),
            psd.groups().len()
        );
        Ok(Self {
            psd,
            path: path.to_path_buf(),
            layers,
        })
    }

    /// Effective visibility per engine layer index: a layer is drawn only
    /// when it and every enclosing group are visible.
    pub(super) fn visibility_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.psd.layers().len()];
        fill_mask(&self.layers, true, &mut mask);
        mask
    }
}

fn fill_mask(layers: &[LiveLayer], parent_visible: bool, mask: &mut [bool]) {
    for layer in layers {
        let visible = parent_visible && layer.visible;
        match &layer.kind {
            LayerKind::Pixel { source: Some(idx) } => {
                if let Some(slot) = mask.get_mut(*idx) {
                    *slot = visible;
                }
            }
            LayerKind::Pixel { source: None } => {}
            LayerKind::Group { children } => fill_mask(children, visible, mask),
        }
        if let Some(clips) = &layer.clip_layers {
            fill_mask(clips, visible, mask);
        }
    }
}

impl LayerDocument for PsdDocument {
    fn layers(&self) -> &[LiveLayer] {
        &self.layers
    }

    fn layers_mut(&mut self) -> &mut [LiveLayer] {
        &mut self.layers
    }

    fn size(&self) -> (u32, u32) {
        (self.psd.width(), self.psd.height())
    }

    fn flatten(&self) -> Result<RgbaImage> {
        let mask = self.visibility_mask();
        debug!(
            "Flattening {:?} with {} of {} layers visible",
            self.path,
            mask.iter().filter(|v| **v).count(),
            mask.len()
        );
        let pixels = self
            .psd
            .flatten_layers_rgba(&|(idx, _layer)| mask.get(idx).copied().unwrap_or(false))
            .map_err(|e| VariationError::Document(format!("{:?}", e)))?;
        let (width, height) = self.size();
        RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            VariationError::Document(format!(
                "flattened buffer does not match a {}x{} canvas",
                width, height
            ))
        })
    }
}

/// Whether a layer record is shown, given the flag `psd` reports as `visible()`.
///
/// The crate reads bit 1 of the record flags as "visible", but Photoshop sets
/// that bit for hidden layers, so the reported flag is the inverse.
fn shown(reported_visible: bool) -> bool {
    !reported_visible
}

/// Engine index of the first layer inside group `id`.
///
/// The crate only exposes a group's contained range as a subslice of
/// `layers()`, so the start is recovered from the slice offset. Empty groups
/// get the index of the layer that follows them.
fn group_start(psd: &Psd, id: u32) -> Option<usize> {
    let sub = psd.get_group_sub_layers(&id)?;
    let offset = (sub.as_ptr() as usize).checked_sub(psd.layers().as_ptr() as usize)?;
    Some(offset / std::mem::size_of::<PsdLayer>().max(1))
}

/// A node waiting to be placed under its parent group.
struct Pending {
    parent: Option<u32>,
    /// Top-down position among siblings: engine index, groups before the
    /// layer at the same index, then group id (open order)
    order: (usize, u8, u32),
    layer: PendingKind,
}

enum PendingKind {
    Pixel { name: String, visible: bool, source: usize },
    Group { id: u32, name: String, visible: bool },
}

fn build_hierarchy(psd: &Psd) -> Vec<LiveLayer> {
    let mut pending: Vec<Pending> = Vec::new();
    for (idx, layer) in psd.layers().iter().enumerate() {
        pending.push(Pending {
            parent: layer.parent_id(),
            order: (idx, 1, 0),
            layer: PendingKind::Pixel {
                name: layer.name().to_string(),
                visible: shown(layer.visible()),
                source: idx,
            },
        });
    }
    for id in psd.group_ids_in_order() {
        let Some(group) = psd.groups().get(id) else {
            continue;
        };
        let start = group_start(psd, *id).unwrap_or_else(|| {
            warn!("Group {} has no layer range, placing it last", id);
            usize::MAX
        });
        pending.push(Pending {
            parent: group.parent_id(),
            order: (start, 0, *id),
            layer: PendingKind::Group {
                id: *id,
                name: group.name().to_string(),
                visible: shown(group.visible()),
            },
        });
    }

    assemble(&mut pending, None, 0)
}

fn assemble(pending: &mut Vec<Pending>, parent: Option<u32>, depth: usize) -> Vec<LiveLayer> {
    let (mut mine, rest): (Vec<Pending>, Vec<Pending>) =
        std::mem::take(pending).into_iter().partition(|p| p.parent == parent);
    *pending = rest;
    // Bottom-up
    mine.sort_by_key(|p| std::cmp::Reverse(p.order));

    mine.into_iter()
        .map(|p| match p.layer {
            PendingKind::Pixel {
                name,
                visible,
                source,
            } => LiveLayer::pixel(name, visible).with_source(source),
            PendingKind::Group { id, name, visible } => {
                let children = if depth < 64 {
                    assemble(pending, Some(id), depth + 1)
                } else {
                    Vec::new()
                };
                LiveLayer::group(name, visible, children)
            }
        })
        .collect()
}
