//! Immutable layer snapshots addressed back into the live document.

use crate::error::Result;

use super::{resolve_mut, Address, LayerDocument, LiveLayer};

/// One layer or group as seen at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerNode {
    /// Display name (not unique)
    pub label: String,
    pub visible: bool,
    pub address: Address,
    /// Empty for pixel layers
    pub children: Vec<LayerNode>,
}

impl LayerNode {
    pub fn new(label: impl Into<String>, visible: bool, address: Address) -> Self {
        Self {
            label: label.into(),
            visible,
            address,
            children: Vec::new(),
        }
    }

    /// Copy of this node without its children.
    pub fn shallow_copy(&self) -> Self {
        Self::new(self.label.clone(), self.visible, self.address.clone())
    }
}

/// Ordered list of top-level nodes. Clip layers sit right after the layer
/// they are clipped to, addressed through the clip segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerTree {
    pub nodes: Vec<LayerNode>,
}

impl LayerTree {
    pub fn new(nodes: Vec<LayerNode>) -> Self {
        Self { nodes }
    }

    /// Snapshot the live document. Only structure and current visibility are read.
    pub fn build(document: &dyn LayerDocument) -> Self {
        Self {
            nodes: build_level(document.layers(), None),
        }
    }

    /// All nodes, depth-first in document order.
    pub fn iter(&self) -> impl Iterator<Item = &LayerNode> {
        let mut out = Vec::new();
        collect(&self.nodes, &mut out);
        out.into_iter()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[allow(dead_code)]
    pub fn find(&self, address: &Address) -> Option<&LayerNode> {
        self.iter().find(|n| &n.address == address)
    }

    pub fn find_mut(&mut self, address: &Address) -> Option<&mut LayerNode> {
        find_in(&mut self.nodes, address)
    }

    /// Write every node's visibility onto the live layer it addresses.
    ///
    /// Children are only walked when the live layer is a group, whatever the
    /// node's own flag says, so hidden groups still get their children set.
    pub fn apply_to(&self, document: &mut dyn LayerDocument) -> Result<()> {
        apply_level(&self.nodes, document.layers_mut())
    }
}

fn build_level(layers: &[LiveLayer], parent: Option<&Address>) -> Vec<LayerNode> {
    let mut nodes = Vec::with_capacity(layers.len());
    for (i, layer) in layers.iter().enumerate() {
        let address = match parent {
            Some(p) => p.child(i),
            None => Address::root(i),
        };
        let mut node = LayerNode::new(layer.name.clone(), layer.visible, address.clone());
        if let Some(children) = layer.children() {
            node.children = build_level(children, Some(&address));
        }
        nodes.push(node);

        if let Some(clips) = &layer.clip_layers {
            for (c, clip) in clips.iter().enumerate() {
                nodes.push(LayerNode::new(clip.name.clone(), clip.visible, address.clip(c)));
            }
        }
    }
    nodes
}

fn collect<'a>(nodes: &'a [LayerNode], out: &mut Vec<&'a LayerNode>) {
    for node in nodes {
        out.push(node);
        collect(&node.children, out);
    }
}

fn find_in<'a>(nodes: &'a mut [LayerNode], address: &Address) -> Option<&'a mut LayerNode> {
    for node in nodes {
        if &node.address == address {
            return Some(node);
        }
        if let Some(found) = find_in(&mut node.children, address) {
            return Some(found);
        }
    }
    None
}

fn apply_level(nodes: &[LayerNode], live: &mut [LiveLayer]) -> Result<()> {
    for node in nodes {
        let layer = resolve_mut(live, &node.address)?;
        layer.visible = node.visible;
        if layer.is_group() {
            apply_level(&node.children, live)?;
        }
    }
    Ok(())
}
