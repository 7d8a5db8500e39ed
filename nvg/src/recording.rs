// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::ops::Range;

use nvg_encoding::alloc::{self, AllocError};
use nvg_encoding::{ImageId, Vertex};

use crate::batch::FragUniforms;

/// Stencil configuration of a single draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StencilMode {
    /// No stencil test, color written.
    Disabled,
    /// Nonzero winding accumulation: front faces increment and back faces
    /// decrement the stencil (wrapping), with color writes disabled.
    FillWinding,
    /// Color written where the stencil is zero. The stencil is kept.
    EqualZero,
    /// Color written where the stencil is nonzero. The stencil is zeroed
    /// wherever the draw covers.
    NotEqualZeroClear,
}

/// Geometry of a single draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    /// Triangle strip over a range of [`DrawList::vertices`].
    Strip(Range<u32>),
    /// Triangle list over a range of [`DrawList::vertices`].
    List(Range<u32>),
    /// Triangle list over a range of [`DrawList::indices`].
    Indexed(Range<u32>),
}

/// Single draw inside a [`DrawList`] to get executed by a backend.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub primitive: Primitive,
    pub stencil: StencilMode,
    /// Index into [`DrawList::uniforms`].
    pub uniform: u32,
    /// Texture bound for the draw.
    pub image: Option<ImageId>,
}

/// List of [`DrawCommand`]s for a backend to execute in order, together
/// with the vertex, index and uniform data they reference.
///
/// All draws blend premultiplied colors (`one`, `one - src_alpha`).
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    /// Viewport size in logical pixels.
    pub view_size: [f32; 2],
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub uniforms: Vec<FragUniforms>,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Removes all draws, retaining the allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.uniforms.clear();
        self.commands.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Appends a [`DrawCommand`] to the back of the list.
    pub fn push(&mut self, cmd: DrawCommand) -> Result<(), AllocError> {
        alloc::push(&mut self.commands, "draw command", cmd)
    }

    pub fn draw_strip(
        &mut self,
        vertices: Range<u32>,
        stencil: StencilMode,
        uniform: u32,
        image: Option<ImageId>,
    ) -> Result<(), AllocError> {
        self.push(DrawCommand {
            primitive: Primitive::Strip(vertices),
            stencil,
            uniform,
            image,
        })
    }

    pub fn draw_list(
        &mut self,
        vertices: Range<u32>,
        stencil: StencilMode,
        uniform: u32,
        image: Option<ImageId>,
    ) -> Result<(), AllocError> {
        self.push(DrawCommand {
            primitive: Primitive::List(vertices),
            stencil,
            uniform,
            image,
        })
    }

    /// Draws a triangle fan over `vertices`, converted to an indexed list.
    ///
    /// Fans of fewer than three vertices are skipped.
    pub fn draw_fan(
        &mut self,
        vertices: Range<u32>,
        stencil: StencilMode,
        uniform: u32,
        image: Option<ImageId>,
    ) -> Result<(), AllocError> {
        if vertices.len() < 3 {
            return Ok(());
        }
        alloc::reserve(&mut self.indices, "index", (vertices.len() - 2) * 3)?;
        let start = self.indices.len() as u32;
        let first = vertices.start;
        for i in vertices.start..vertices.end - 2 {
            self.indices.extend([first, i + 1, i + 2]);
        }
        let end = self.indices.len() as u32;
        self.push(DrawCommand {
            primitive: Primitive::Indexed(start..end),
            stencil,
            uniform,
            image,
        })
    }

    /// Number of triangles drawn by the list.
    pub fn triangle_count(&self) -> usize {
        self.commands
            .iter()
            .map(|cmd| match &cmd.primitive {
                Primitive::Strip(r) => r.len().saturating_sub(2),
                Primitive::List(r) | Primitive::Indexed(r) => r.len() / 3,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawList, Primitive, StencilMode};

    #[test]
    fn fan_becomes_indexed_list() {
        let mut list = DrawList::default();
        list.draw_fan(10..15, StencilMode::FillWinding, 0, None)
            .unwrap();
        assert_eq!(list.indices, [10, 11, 12, 10, 12, 13, 10, 13, 14]);
        assert_eq!(list.commands[0].primitive, Primitive::Indexed(0..9));
        assert_eq!(list.triangle_count(), 3);
    }

    #[test]
    fn degenerate_fan_is_skipped() {
        let mut list = DrawList::default();
        list.draw_fan(0..2, StencilMode::Disabled, 0, None).unwrap();
        assert!(list.is_empty());
    }
}
