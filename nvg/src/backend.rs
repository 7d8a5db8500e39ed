// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use nvg_encoding::{ImageFlags, ImageId};

use crate::recording::DrawList;
use crate::Result;

/// Pixel format of a texture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Single coverage channel, one byte per pixel.
    Alpha,
    /// Four bytes per pixel.
    Rgba,
}

impl TextureKind {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Alpha => 1,
            Self::Rgba => 4,
        }
    }
}

/// The device-side half of the renderer.
///
/// A backend owns textures and consumes one [`DrawList`] per frame.
pub trait RenderBackend {
    /// Creates a texture, optionally initialized with tightly packed rows of
    /// `data`.
    fn create_texture(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: Option<&[u8]>,
    ) -> Result<ImageId>;

    fn delete_texture(&mut self, image: ImageId) -> Result<()>;

    /// Replaces the `[x, y, width, height]` region of a texture with the
    /// tightly packed rows of `data`.
    fn update_texture(&mut self, image: ImageId, region: [u32; 4], data: &[u8]) -> Result<()>;

    fn texture_size(&self, image: ImageId) -> Option<(u32, u32)>;

    fn texture_kind(&self, image: ImageId) -> Option<TextureKind>;

    fn texture_flags(&self, image: ImageId) -> Option<ImageFlags>;

    /// Called at the start of every frame.
    fn viewport(&mut self, width: f32, height: f32, device_pixel_ratio: f32);

    /// Maximum number of vertices a single flush can upload.
    fn transient_vertex_capacity(&self) -> usize {
        usize::MAX
    }

    /// Executes the draws of a frame.
    fn flush(&mut self, list: &DrawList) -> Result<()>;
}
