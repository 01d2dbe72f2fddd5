//! Live layered document and its immutable snapshots.
//!
//! The live document is owned by a [`LayerDocument`] engine, which is the only
//! thing that knows how to decode and flatten pixels. Everything else talks to
//! it through index-path [`Address`]es, never through references, so that a
//! [`LayerTree`] snapshot taken at load time can be pushed back onto the
//! document any number of times.
//!
//! ## Module Structure
//!
//! - [`address`] - `Address` / `Segment` parsing and formatting
//! - [`tree`] - `LayerNode` snapshots, building and pushing visibility
//! - [`psd_file`] - PSD-backed engine

mod address;
mod psd_file;
mod tree;

#[cfg(test)]
pub mod fixtures;

pub use address::{Address, Segment};
pub use psd_file::PsdDocument;
pub use tree::{LayerNode, LayerTree};

use image::RgbaImage;

use crate::error::{Result, VariationError};

/// One layer of the live document.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveLayer {
    pub name: String,
    pub visible: bool,
    pub kind: LayerKind,
    /// `None` when the engine has no clip-layer support for this layer
    pub clip_layers: Option<Vec<LiveLayer>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    /// Pixel layer; `source` is the engine's own index for the layer, if any
    Pixel { source: Option<usize> },
    Group { children: Vec<LiveLayer> },
}

impl LiveLayer {
    pub fn pixel(name: impl Into<String>, visible: bool) -> Self {
        Self {
            name: name.into(),
            visible,
            kind: LayerKind::Pixel { source: None },
            clip_layers: None,
        }
    }

    pub fn group(name: impl Into<String>, visible: bool, children: Vec<LiveLayer>) -> Self {
        Self {
            name: name.into(),
            visible,
            kind: LayerKind::Group { children },
            clip_layers: None,
        }
    }

    pub fn with_source(mut self, source: usize) -> Self {
        if let LayerKind::Pixel { source: s } = &mut self.kind {
            *s = Some(source);
        }
        self
    }

    pub fn with_clip_layers(mut self, clips: Vec<LiveLayer>) -> Self {
        self.clip_layers = Some(clips);
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group { .. })
    }

    pub fn children(&self) -> Option<&[LiveLayer]> {
        match &self.kind {
            LayerKind::Group { children } => Some(children),
            LayerKind::Pixel { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut [LiveLayer]> {
        match &mut self.kind {
            LayerKind::Group { children } => Some(children),
            LayerKind::Pixel { .. } => None,
        }
    }
}

/// The external document engine.
///
/// Structure (group membership, ordering, clip attachment) is fixed for the
/// lifetime of a loaded document; only `visible` flags are mutated.
pub trait LayerDocument: Send + Sync {
    /// Top-level layers in document order.
    fn layers(&self) -> &[LiveLayer];

    fn layers_mut(&mut self) -> &mut [LiveLayer];

    /// Canvas size in pixels.
    fn size(&self) -> (u32, u32);

    /// Composite the document honoring the current visibility flags.
    fn flatten(&self) -> Result<RgbaImage>;
}

enum Scope<'a> {
    List(&'a [LiveLayer]),
    Layer(&'a LiveLayer),
}

enum ScopeMut<'a> {
    List(&'a mut [LiveLayer]),
    Layer(&'a mut LiveLayer),
}

fn pick<'a>(list: &'a [LiveLayer], index: usize, address: &Address) -> Result<&'a LiveLayer> {
    let len = list.len();
    list.get(index).ok_or_else(|| {
        VariationError::address(address, format!("index {} out of range ({} layers)", index, len))
    })
}

fn pick_mut<'a>(
    list: &'a mut [LiveLayer],
    index: usize,
    address: &Address,
) -> Result<&'a mut LiveLayer> {
    let len = list.len();
    list.get_mut(index).ok_or_else(|| {
        VariationError::address(address, format!("index {} out of range ({} layers)", index, len))
    })
}

/// Walk `address` against the live layers.
pub fn resolve<'a>(layers: &'a [LiveLayer], address: &Address) -> Result<&'a LiveLayer> {
    let mut scope = Scope::List(layers);
    for segment in address.segments() {
        scope = match (scope, *segment) {
            (Scope::List(list), Segment::Index(i)) => Scope::Layer(pick(list, i, address)?),
            (Scope::Layer(layer), Segment::Index(i)) => {
                let children = layer.children().ok_or_else(|| {
                    VariationError::address(address, format!("`{}` is not a group", layer.name))
                })?;
                Scope::Layer(pick(children, i, address)?)
            }
            (Scope::Layer(layer), Segment::Clip) => {
                Scope::List(layer.clip_layers.as_deref().ok_or_else(|| {
                    VariationError::address(
                        address,
                        format!("`{}` has no clip-layer support", layer.name),
                    )
                })?)
            }
            (Scope::List(_), Segment::Clip) => {
                return Err(VariationError::address(address, "clip segment must follow a layer"));
            }
        };
    }
    match scope {
        Scope::Layer(layer) => Ok(layer),
        Scope::List(_) => Err(VariationError::address(address, "address does not end at a layer")),
    }
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a>(
    layers: &'a mut [LiveLayer],
    address: &Address,
) -> Result<&'a mut LiveLayer> {
    let mut scope = ScopeMut::List(layers);
    for segment in address.segments() {
        scope = match (scope, *segment) {
            (ScopeMut::List(list), Segment::Index(i)) => ScopeMut::Layer(pick_mut(list, i, address)?),
            (ScopeMut::Layer(layer), Segment::Index(i)) => {
                let name = layer.name.clone();
                let children = layer.children_mut().ok_or_else(|| {
                    VariationError::address(address, format!("`{}` is not a group", name))
                })?;
                ScopeMut::Layer(pick_mut(children, i, address)?)
            }
            (ScopeMut::Layer(layer), Segment::Clip) => {
                let name = layer.name.clone();
                ScopeMut::List(layer.clip_layers.as_deref_mut().ok_or_else(|| {
                    VariationError::address(address, format!("`{}` has no clip-layer support", name))
                })?)
            }
            (ScopeMut::List(_), Segment::Clip) => {
                return Err(VariationError::address(address, "clip segment must follow a layer"));
            }
        };
    }
    match scope {
        ScopeMut::Layer(layer) => Ok(layer),
        ScopeMut::List(_) => {
            Err(VariationError::address(address, "address does not end at a layer"))
        }
    }
}

#[cfg(test)]
mod tests;
