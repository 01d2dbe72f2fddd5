//! Preview image: downscaling and egui texture registration.

use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy_egui::{egui, EguiTextureHandle, EguiUserTextures};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::constants::{DEFAULT_PREVIEW_WIDTH, MAX_PREVIEW_HEIGHT};

/// Latest rendered preview and its texture.
#[derive(Resource)]
pub struct PreviewImage {
    /// Rendered but not yet uploaded
    pending: Option<RgbaImage>,
    pub handle: Option<Handle<Image>>,
    pub texture_id: Option<egui::TextureId>,
    pub size: [u32; 2],
    /// Width renders are scaled down to, follows the preview panel
    pub max_width: u32,
}

impl Default for PreviewImage {
    fn default() -> Self {
        Self {
            pending: None,
            handle: None,
            texture_id: None,
            size: [0, 0],
            max_width: DEFAULT_PREVIEW_WIDTH,
        }
    }
}

impl PreviewImage {
    pub fn set(&mut self, image: RgbaImage) {
        self.pending = Some(image);
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.texture_id = None;
        self.handle = None;
        self.size = [0, 0];
    }
}

/// Scale `image` down to fit `max_width` and the height cap, keeping its
/// aspect ratio. Smaller images are returned as they are.
pub fn fit_preview(image: RgbaImage, max_width: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image;
    }
    let max_width = max_width.max(1);
    let scale = (max_width as f64 / width as f64).min(MAX_PREVIEW_HEIGHT as f64 / height as f64);
    if scale >= 1.0 {
        return image;
    }
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}

fn to_bevy_image(image: RgbaImage) -> Image {
    let (width, height) = image.dimensions();
    Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        image.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        default(),
    )
}

/// Uploads a pending preview and registers it with egui.
/// Runs in Update before the egui pass.
pub fn upload_preview_system(
    mut preview: ResMut<PreviewImage>,
    mut images: ResMut<Assets<Image>>,
    mut egui_textures: ResMut<EguiUserTextures>,
) {
    let Some(image) = preview.pending.take() else {
        return;
    };
    if let Some(old) = preview.handle.take() {
        images.remove(old.id());
    }
    preview.size = [image.width(), image.height()];
    let handle = images.add(to_bevy_image(image));
    preview.texture_id = Some(egui_textures.add_image(EguiTextureHandle::Weak(handle.id())));
    preview.handle = Some(handle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_preview_keeps_small_images() {
        let image = RgbaImage::new(100, 50);
        assert_eq!(fit_preview(image, 800).dimensions(), (100, 50));
    }

    #[test]
    fn test_fit_preview_scales_to_width() {
        let image = RgbaImage::new(1600, 800);
        assert_eq!(fit_preview(image, 800).dimensions(), (800, 400));
    }

    #[test]
    fn test_fit_preview_respects_height_cap() {
        let image = RgbaImage::new(100, 20_000);
        assert_eq!(fit_preview(image, 800).dimensions(), (50, 10_000));
    }
}
