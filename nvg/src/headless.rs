// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::HashMap;
use std::num::NonZeroU32;

use nvg_encoding::{ImageFlags, ImageId};

use crate::backend::{RenderBackend, TextureKind};
use crate::recording::DrawList;
use crate::{Error, Result};

#[derive(Clone, Debug)]
struct Texture {
    kind: TextureKind,
    width: u32,
    height: u32,
    flags: ImageFlags,
    data: Vec<u8>,
}

/// Backend that keeps textures in memory and records the last flushed
/// [`DrawList`] instead of drawing it.
#[derive(Clone, Debug)]
pub struct HeadlessBackend {
    textures: HashMap<ImageId, Texture>,
    next_id: NonZeroU32,
    viewport: [f32; 3],
    vertex_capacity: usize,
    last: DrawList,
    flush_count: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            next_id: NonZeroU32::MIN,
            viewport: [0.0; 3],
            vertex_capacity: usize::MAX,
            last: DrawList::default(),
            flush_count: 0,
        }
    }

    /// Limits the number of vertices accepted per flush.
    pub fn with_vertex_capacity(mut self, capacity: usize) -> Self {
        self.vertex_capacity = capacity;
        self
    }

    /// The draw list of the most recent flush.
    pub fn last_draw_list(&self) -> &DrawList {
        &self.last
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Width, height and device pixel ratio of the current frame.
    pub fn viewport_size(&self) -> [f32; 3] {
        self.viewport
    }

    pub fn texture_data(&self, image: ImageId) -> Option<&[u8]> {
        self.textures.get(&image).map(|t| t.data.as_slice())
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_texture(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: Option<&[u8]>,
    ) -> Result<ImageId> {
        let len = width as usize * height as usize * kind.bytes_per_pixel();
        let data = match data {
            Some(data) if data.len() == len => data.to_vec(),
            Some(_) => return Err(Error::InvalidImageData),
            None => vec![0; len],
        };
        let id = ImageId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.textures.insert(
            id,
            Texture {
                kind,
                width,
                height,
                flags,
                data,
            },
        );
        Ok(id)
    }

    fn delete_texture(&mut self, image: ImageId) -> Result<()> {
        self.textures
            .remove(&image)
            .map(drop)
            .ok_or(Error::InvalidHandle(image))
    }

    fn update_texture(&mut self, image: ImageId, region: [u32; 4], data: &[u8]) -> Result<()> {
        let texture = self
            .textures
            .get_mut(&image)
            .ok_or(Error::InvalidHandle(image))?;
        let [x, y, w, h] = region.map(|v| v as usize);
        let bpp = texture.kind.bytes_per_pixel();
        let (tw, th) = (texture.width as usize, texture.height as usize);
        if x + w > tw || y + h > th || data.len() != w * h * bpp {
            return Err(Error::InvalidImageData);
        }
        if w == 0 {
            return Ok(());
        }
        for (row, src) in data.chunks_exact(w * bpp).enumerate() {
            let start = ((y + row) * tw + x) * bpp;
            texture.data[start..start + src.len()].copy_from_slice(src);
        }
        Ok(())
    }

    fn texture_size(&self, image: ImageId) -> Option<(u32, u32)> {
        self.textures.get(&image).map(|t| (t.width, t.height))
    }

    fn texture_kind(&self, image: ImageId) -> Option<TextureKind> {
        self.textures.get(&image).map(|t| t.kind)
    }

    fn texture_flags(&self, image: ImageId) -> Option<ImageFlags> {
        self.textures.get(&image).map(|t| t.flags)
    }

    fn viewport(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.viewport = [width, height, device_pixel_ratio];
    }

    fn transient_vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    fn flush(&mut self, list: &DrawList) -> Result<()> {
        for cmd in &list.commands {
            if let Some(image) = cmd.image {
                if !self.textures.contains_key(&image) {
                    log::warn!("draw references deleted image {image:?}");
                }
            }
        }
        self.last.clone_from(list);
        self.flush_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nvg_encoding::ImageFlags;

    use super::HeadlessBackend;
    use crate::backend::{RenderBackend, TextureKind};
    use crate::Error;

    #[test]
    fn handles_are_unique() {
        let mut backend = HeadlessBackend::new();
        let a = backend
            .create_texture(TextureKind::Rgba, 1, 1, ImageFlags::empty(), None)
            .unwrap();
        let b = backend
            .create_texture(TextureKind::Alpha, 1, 1, ImageFlags::NEAREST, None)
            .unwrap();
        assert_ne!(a, b);
        backend.delete_texture(a).unwrap();
        assert!(matches!(backend.delete_texture(a), Err(Error::InvalidHandle(_))));
        assert_eq!(backend.texture_flags(b), Some(ImageFlags::NEAREST));
        assert_eq!(backend.texture_count(), 1);
    }

    #[test]
    fn region_update_writes_rows() {
        let mut backend = HeadlessBackend::new();
        let id = backend
            .create_texture(TextureKind::Rgba, 2, 2, ImageFlags::empty(), None)
            .unwrap();
        backend
            .update_texture(id, [1, 0, 1, 2], &[1, 2, 3, 4, 5, 6, 7, 8])
            .unwrap();
        assert_eq!(
            backend.texture_data(id).unwrap(),
            &[0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8]
        );
    }
}
