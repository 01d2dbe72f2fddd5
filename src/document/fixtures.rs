//! In-memory document engine for tests.

use image::{Rgba, RgbaImage};

use crate::error::Result;

use super::{LayerDocument, LiveLayer};

/// Document whose flatten output encodes how many layers are visible, so
/// tests can tell renders apart without real compositing.
pub struct MemoryDocument {
    pub layers: Vec<LiveLayer>,
}

impl MemoryDocument {
    pub fn new(layers: Vec<LiveLayer>) -> Self {
        Self { layers }
    }

    /// Flat document of pixel layers, all visible.
    pub fn flat(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| LiveLayer::pixel(*n, true)).collect())
    }

    /// `bg`, a `chars` group holding `char_a` (with one clip layer) and
    /// `char_b`, then `fx` hidden.
    pub fn nested() -> Self {
        Self::new(vec![
            LiveLayer::pixel("bg", true),
            LiveLayer::group(
                "chars",
                true,
                vec![
                    LiveLayer::pixel("char_a", true)
                        .with_clip_layers(vec![LiveLayer::pixel("char_a_shade", true)]),
                    LiveLayer::pixel("char_b", false),
                ],
            ),
            LiveLayer::pixel("fx", false),
        ])
    }

    pub fn visible_count(&self) -> u8 {
        fn count(layers: &[LiveLayer]) -> u8 {
            layers
                .iter()
                .map(|l| {
                    let own = u8::from(l.visible);
                    let children = l.children().map(count).unwrap_or(0);
                    let clips = l.clip_layers.as_deref().map(count).unwrap_or(0);
                    own + children + clips
                })
                .sum()
        }
        count(&self.layers)
    }
}

impl LayerDocument for MemoryDocument {
    fn layers(&self) -> &[LiveLayer] {
        &self.layers
    }

    fn layers_mut(&mut self) -> &mut [LiveLayer] {
        &mut self.layers
    }

    fn size(&self) -> (u32, u32) {
        (2, 2)
    }

    fn flatten(&self) -> Result<RgbaImage> {
        let shade = self.visible_count();
        Ok(RgbaImage::from_pixel(2, 2, Rgba([shade, shade, shade, 255])))
    }
}
