// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulation of fill, stroke and triangle calls over a frame.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use nvg_encoding::alloc::{self, AllocError};
use nvg_encoding::{ImageFlags, ImageId, PaintParams, PathCache, Scissor, Transform, Vertex};

use crate::backend::TextureKind;
use crate::recording::{DrawList, StencilMode};

/// Fragment shader variant, stored in [`FragUniforms::kind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderKind {
    /// Box gradient (also covers solid colors and linear/radial gradients).
    FillGradient,
    /// Image pattern.
    FillImage,
    /// Opaque white, used for stencil passes.
    Simple,
    /// Textured triangles tinted by the inner color.
    Image,
}

impl ShaderKind {
    pub const fn to_f32(self) -> f32 {
        match self {
            Self::FillGradient => 0.0,
            Self::FillImage => 1.0,
            Self::Simple => 2.0,
            Self::Image => 3.0,
        }
    }
}

/// Sampling mode for textured shaders, stored in [`FragUniforms::tex_type`].
pub mod tex_type {
    /// RGBA texels already premultiplied by alpha.
    pub const PREMULTIPLIED: f32 = 0.0;
    /// RGBA texels with straight alpha.
    pub const STRAIGHT: f32 = 1.0;
    /// Single channel coverage.
    pub const ALPHA: f32 = 2.0;
}

/// Per-draw fragment uniform block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct FragUniforms {
    /// Inverse scissor transform, three padded columns.
    pub scissor_mat: [f32; 12],
    /// Inverse paint transform, three padded columns.
    pub paint_mat: [f32; 12],
    /// Premultiplied.
    pub inner_col: [f32; 4],
    /// Premultiplied.
    pub outer_col: [f32; 4],
    pub scissor_ext: [f32; 2],
    pub scissor_scale: [f32; 2],
    pub extent: [f32; 2],
    pub radius: f32,
    pub feather: f32,
    pub stroke_mult: f32,
    pub tex_type: f32,
    pub kind: f32,
    pub _padding: f32,
}

static_assertions::assert_eq_size!(FragUniforms, [u8; 176]);

impl FragUniforms {
    /// Uniforms for the stencil pass of a non-convex fill.
    pub fn simple() -> Self {
        Self {
            kind: ShaderKind::Simple.to_f32(),
            ..Self::zeroed()
        }
    }
}

fn premultiply([r, g, b, a]: [f32; 4]) -> [f32; 4] {
    [r * a, g * a, b * a, a]
}

/// Lowers a paint and scissor into a uniform block.
///
/// `width` is the stroke width (the fringe width for fills) and `texture`
/// describes the image of the paint, if any.
pub fn convert_paint(
    paint: &PaintParams,
    texture: Option<(TextureKind, ImageFlags)>,
    scissor: &Scissor,
    width: f32,
    fringe: f32,
) -> FragUniforms {
    let flip_y = matches!(texture, Some((_, flags)) if flags.contains(ImageFlags::FLIP_Y));
    let paint_transform = if paint.image.is_some() && flip_y {
        let half = paint.extent[1] * 0.5;
        Transform::translate(0.0, -half)
            .then(Transform::scale(1.0, -1.0))
            .then(Transform::translate(0.0, half))
            .then(paint.transform)
    } else {
        paint.transform
    };
    let mut frag = FragUniforms {
        inner_col: premultiply(paint.inner_color),
        outer_col: premultiply(paint.outer_color),
        paint_mat: paint_transform.inverse().to_mat3x4(),
        extent: paint.extent,
        stroke_mult: (width * 0.5 + fringe * 0.5) / fringe,
        ..FragUniforms::zeroed()
    };

    if scissor.extent[0] < 0.5 || scissor.extent[1] < 0.5 {
        frag.scissor_ext = [1.0, 1.0];
        frag.scissor_scale = [1.0, 1.0];
    } else {
        let m = scissor.transform.matrix;
        frag.scissor_mat = scissor.transform.inverse().to_mat3x4();
        frag.scissor_ext = scissor.extent;
        frag.scissor_scale = [
            (m[0] * m[0] + m[2] * m[2]).sqrt() / fringe,
            (m[1] * m[1] + m[3] * m[3]).sqrt() / fringe,
        ];
    }

    match (paint.image, texture) {
        (Some(_), Some((kind, flags))) => {
            frag.kind = ShaderKind::FillImage.to_f32();
            frag.tex_type = match kind {
                TextureKind::Alpha => tex_type::ALPHA,
                TextureKind::Rgba if flags.contains(ImageFlags::PREMULTIPLIED) => {
                    tex_type::PREMULTIPLIED
                }
                TextureKind::Rgba => tex_type::STRAIGHT,
            };
        }
        _ => {
            frag.kind = ShaderKind::FillGradient.to_f32();
            frag.radius = paint.radius;
            frag.feather = paint.feather;
        }
    }
    frag
}

/// Vertex ranges of one path inside the batch vertex buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderPath {
    pub fill_offset: u32,
    pub fill_count: u32,
    pub stroke_offset: u32,
    pub stroke_count: u32,
}

impl RenderPath {
    pub fn fill_range(&self) -> Range<u32> {
        self.fill_offset..self.fill_offset + self.fill_count
    }

    pub fn stroke_range(&self) -> Range<u32> {
        self.stroke_offset..self.stroke_offset + self.stroke_count
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// Stencil-then-cover fill of arbitrary paths.
    Fill,
    /// Direct fill of a single convex path.
    ConvexFill,
    Stroke,
    Triangles,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    pub image: Option<ImageId>,
    /// Range of [`Batcher::paths`].
    pub paths: Range<usize>,
    /// Cover quad of a fill, or the vertices of a triangles call.
    pub vertices: Range<u32>,
    /// Index of the first uniform block of the call.
    pub uniform: u32,
}

/// Collects render calls until the end of the frame.
#[derive(Debug, Default)]
pub struct Batcher {
    calls: Vec<Call>,
    paths: Vec<RenderPath>,
    verts: Vec<Vertex>,
    uniforms: Vec<FragUniforms>,
    edge_antialias: bool,
    list: DrawList,
}

impl Batcher {
    pub fn new(edge_antialias: bool) -> Self {
        Self {
            edge_antialias,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn paths(&self) -> &[RenderPath] {
        &self.paths
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.verts
    }

    pub fn uniforms(&self) -> &[FragUniforms] {
        &self.uniforms
    }

    /// Discards all pending calls, retaining the allocations.
    pub fn reset(&mut self) {
        self.calls.clear();
        self.paths.clear();
        self.verts.clear();
        self.uniforms.clear();
    }

    /// Runs `f`, discarding everything it appended if it fails.
    fn transaction(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), AllocError>,
    ) -> Result<(), AllocError> {
        let marks = (
            self.calls.len(),
            self.paths.len(),
            self.verts.len(),
            self.uniforms.len(),
        );
        let result = f(self);
        if result.is_err() {
            self.calls.truncate(marks.0);
            self.paths.truncate(marks.1);
            self.verts.truncate(marks.2);
            self.uniforms.truncate(marks.3);
        }
        result
    }

    /// Copies the expanded paths of `cache` into the batch, returning the
    /// range of render paths.
    fn push_paths(&mut self, cache: &PathCache, fill: bool) -> Result<Range<usize>, AllocError> {
        let nverts: usize = cache
            .paths()
            .iter()
            .map(|p| p.stroke.len() + if fill { p.fill.len() } else { 0 })
            .sum();
        alloc::reserve(&mut self.verts, "vertex", nverts + 6)?;
        alloc::reserve(&mut self.paths, "render path", cache.paths().len())?;

        let start = self.paths.len();
        for path in cache.paths() {
            let mut copy = RenderPath::default();
            let fill_verts = cache.fill_vertices(path);
            if fill && !fill_verts.is_empty() {
                copy.fill_offset = self.verts.len() as u32;
                copy.fill_count = fill_verts.len() as u32;
                self.verts.extend_from_slice(fill_verts);
            }
            let stroke_verts = cache.stroke_vertices(path);
            if !stroke_verts.is_empty() {
                copy.stroke_offset = self.verts.len() as u32;
                copy.stroke_count = stroke_verts.len() as u32;
                self.verts.extend_from_slice(stroke_verts);
            }
            self.paths.push(copy);
        }
        Ok(start..self.paths.len())
    }

    /// Records a fill of the expanded paths in `cache`.
    pub fn fill(
        &mut self,
        paint: &PaintParams,
        texture: Option<(TextureKind, ImageFlags)>,
        scissor: &Scissor,
        fringe: f32,
        cache: &PathCache,
    ) -> Result<(), AllocError> {
        self.transaction(|this| {
            let convex = matches!(cache.paths(), [path] if path.convex);
            let kind = if convex {
                CallKind::ConvexFill
            } else {
                CallKind::Fill
            };
            let paths = this.push_paths(cache, true)?;

            // Cover quad of the path bounds.
            let [x0, y0, x1, y1] = cache.bounds();
            let start = this.verts.len() as u32;
            this.verts.extend([
                Vertex::new(x0, y1, 0.5, 1.0),
                Vertex::new(x1, y1, 0.5, 1.0),
                Vertex::new(x1, y0, 0.5, 1.0),
                Vertex::new(x0, y1, 0.5, 1.0),
                Vertex::new(x1, y0, 0.5, 1.0),
                Vertex::new(x0, y0, 0.5, 1.0),
            ]);

            let uniform = this.uniforms.len() as u32;
            if kind == CallKind::Fill {
                alloc::reserve(&mut this.uniforms, "uniform", 2)?;
                this.uniforms.push(FragUniforms::simple());
            }
            let frag = convert_paint(paint, texture, scissor, fringe, fringe);
            alloc::push(&mut this.uniforms, "uniform", frag)?;

            alloc::push(
                &mut this.calls,
                "call",
                Call {
                    kind,
                    image: paint.image,
                    paths,
                    vertices: start..start + 6,
                    uniform,
                },
            )
        })
    }

    /// Records a stroke of the expanded paths in `cache`.
    pub fn stroke(
        &mut self,
        paint: &PaintParams,
        texture: Option<(TextureKind, ImageFlags)>,
        scissor: &Scissor,
        fringe: f32,
        stroke_width: f32,
        cache: &PathCache,
    ) -> Result<(), AllocError> {
        self.transaction(|this| {
            let paths = this.push_paths(cache, false)?;
            let end = this.verts.len() as u32;
            let uniform = this.uniforms.len() as u32;
            let frag = convert_paint(paint, texture, scissor, stroke_width, fringe);
            alloc::push(&mut this.uniforms, "uniform", frag)?;
            alloc::push(
                &mut this.calls,
                "call",
                Call {
                    kind: CallKind::Stroke,
                    image: paint.image,
                    paths,
                    vertices: end..end,
                    uniform,
                },
            )
        })
    }

    /// Records a list of textured triangles.
    pub fn triangles(
        &mut self,
        paint: &PaintParams,
        texture: Option<(TextureKind, ImageFlags)>,
        scissor: &Scissor,
        verts: &[Vertex],
    ) -> Result<(), AllocError> {
        self.transaction(|this| {
            let start = this.verts.len() as u32;
            alloc::extend(&mut this.verts, "vertex", verts)?;
            let uniform = this.uniforms.len() as u32;
            let frag = FragUniforms {
                kind: ShaderKind::Image.to_f32(),
                ..convert_paint(paint, texture, scissor, 1.0, 1.0)
            };
            alloc::push(&mut this.uniforms, "uniform", frag)?;
            alloc::push(
                &mut this.calls,
                "call",
                Call {
                    kind: CallKind::Triangles,
                    image: paint.image,
                    paths: 0..0,
                    vertices: start..start + verts.len() as u32,
                    uniform,
                },
            )
        })
    }

    /// Lowers the pending calls into a [`DrawList`] and resets the batch.
    ///
    /// Vertices beyond `vertex_capacity` are dropped along with every draw
    /// that references them. The batch is reset even when the list cannot
    /// be allocated.
    pub fn lower(
        &mut self,
        view_size: [f32; 2],
        vertex_capacity: usize,
    ) -> Result<&DrawList, AllocError> {
        let result = self.lower_calls(view_size, vertex_capacity);
        self.reset();
        result.map(|()| &self.list)
    }

    fn lower_calls(
        &mut self,
        view_size: [f32; 2],
        vertex_capacity: usize,
    ) -> Result<(), AllocError> {
        let Self {
            calls,
            paths,
            verts,
            uniforms,
            edge_antialias,
            list,
        } = self;
        list.clear();
        list.view_size = view_size;

        let nverts = vertex_limit(verts.len(), vertex_capacity);
        if nverts < verts.len() {
            log::warn!(
                "vertex count {} truncated to transient buffer capacity {nverts}",
                verts.len()
            );
        }
        let (ncommands, nindices) = draw_bounds(calls, paths);
        alloc::reserve(&mut list.commands, "draw command", ncommands)?;
        alloc::reserve(&mut list.indices, "index", nindices)?;
        alloc::extend(&mut list.vertices, "vertex", &verts[..nverts])?;
        alloc::extend(&mut list.uniforms, "uniform", uniforms)?;

        let limit = nverts as u32;
        let fits = |r: &Range<u32>| r.end <= limit;
        for call in calls.iter() {
            let call_paths = &paths[call.paths.clone()];
            match call.kind {
                CallKind::Fill => {
                    let paint = call.uniform + 1;
                    for path in call_paths {
                        let fill = path.fill_range();
                        if path.fill_count > 2 && fits(&fill) {
                            list.draw_fan(fill, StencilMode::FillWinding, call.uniform, None)?;
                        }
                    }
                    if *edge_antialias {
                        for path in call_paths {
                            let stroke = path.stroke_range();
                            if path.stroke_count > 2 && fits(&stroke) {
                                list.draw_strip(
                                    stroke,
                                    StencilMode::EqualZero,
                                    paint,
                                    call.image,
                                )?;
                            }
                        }
                    }
                    if fits(&call.vertices) {
                        list.draw_list(
                            call.vertices.clone(),
                            StencilMode::NotEqualZeroClear,
                            paint,
                            call.image,
                        )?;
                    }
                }
                CallKind::ConvexFill => {
                    for path in call_paths {
                        let fill = path.fill_range();
                        if fits(&fill) {
                            list.draw_fan(fill, StencilMode::Disabled, call.uniform, call.image)?;
                        }
                    }
                    if *edge_antialias {
                        for path in call_paths {
                            let stroke = path.stroke_range();
                            if path.stroke_count > 2 && fits(&stroke) {
                                list.draw_strip(
                                    stroke,
                                    StencilMode::Disabled,
                                    call.uniform,
                                    call.image,
                                )?;
                            }
                        }
                    }
                }
                CallKind::Stroke => {
                    for path in call_paths {
                        let stroke = path.stroke_range();
                        if path.stroke_count > 2 && fits(&stroke) {
                            list.draw_strip(
                                stroke,
                                StencilMode::Disabled,
                                call.uniform,
                                call.image,
                            )?;
                        }
                    }
                }
                CallKind::Triangles => {
                    if call.vertices.len() >= 3 && fits(&call.vertices) {
                        list.draw_list(
                            call.vertices.clone(),
                            StencilMode::Disabled,
                            call.uniform,
                            call.image,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Number of vertices a draw list can hold: at most `capacity`, and no more
/// than `u32` ranges can address.
fn vertex_limit(len: usize, capacity: usize) -> usize {
    len.min(capacity).min(u32::MAX as usize)
}

/// Upper bounds of the commands and fan indices lowering `calls` emits.
fn draw_bounds(calls: &[Call], paths: &[RenderPath]) -> (usize, usize) {
    let mut commands = 0;
    let mut indices = 0;
    for call in calls {
        let call_paths = &paths[call.paths.clone()];
        commands += match call.kind {
            CallKind::Fill => 2 * call_paths.len() + 1,
            CallKind::ConvexFill => 2 * call_paths.len(),
            CallKind::Stroke => call_paths.len(),
            CallKind::Triangles => 1,
        };
        if matches!(call.kind, CallKind::Fill | CallKind::ConvexFill) {
            indices += call_paths
                .iter()
                .map(|p| (p.fill_count as usize).saturating_sub(2) * 3)
                .sum::<usize>();
        }
    }
    (commands, indices)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use nvg_encoding::{
        ImageFlags, ImageId, Paint, PathCache, PathCommands, Scissor, Tolerances, Transform, Vertex,
    };
    use peniko::kurbo::Join;
    use peniko::Color;

    use nvg_encoding::alloc;

    use super::{
        convert_paint, draw_bounds, tex_type, vertex_limit, Batcher, CallKind, FragUniforms,
        ShaderKind,
    };
    use crate::backend::TextureKind;
    use crate::recording::{Primitive, StencilMode};
    use crate::Error;

    fn expanded(aa: bool, f: impl FnOnce(&mut nvg_encoding::PathEncoder<'_>)) -> PathCache {
        let tol = Tolerances::default();
        let mut commands = PathCommands::new();
        f(&mut commands.encoder(Transform::IDENTITY, tol.dist_tol));
        let mut cache = PathCache::new();
        cache.flatten(&commands, &tol).unwrap();
        if aa {
            cache
                .expand_fill(tol.fringe_width, Join::Miter, 3.6, &tol)
                .unwrap();
        } else {
            cache.expand_fill(0.0, Join::Miter, 1.2, &tol).unwrap();
        }
        cache
    }

    fn star(p: &mut nvg_encoding::PathEncoder<'_>) {
        p.move_to(50.0, 0.0);
        p.line_to(61.0, 35.0);
        p.line_to(98.0, 35.0);
        p.line_to(68.0, 57.0);
        p.line_to(79.0, 91.0);
        p.line_to(50.0, 70.0);
        p.line_to(21.0, 91.0);
        p.line_to(32.0, 57.0);
        p.line_to(2.0, 35.0);
        p.line_to(39.0, 35.0);
        p.close();
    }

    #[test]
    fn disabled_scissor_payload() {
        let paint = Paint::solid(Color::RED).to_params();
        let frag = convert_paint(&paint, None, &Scissor::DISABLED, 1.0, 1.0);
        assert_eq!(frag.scissor_mat, [0.0; 12]);
        assert_eq!(frag.scissor_ext, [1.0, 1.0]);
        assert_eq!(frag.scissor_scale, [1.0, 1.0]);
        assert_eq!(frag.kind, ShaderKind::FillGradient.to_f32());
        assert_eq!(frag.inner_col, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn colors_are_premultiplied() {
        let paint = Paint::solid(Color::rgba8(255, 255, 255, 51)).to_params();
        let frag = convert_paint(&paint, None, &Scissor::DISABLED, 1.0, 1.0);
        for c in frag.inner_col {
            assert!((c - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn enabled_scissor_is_inverted() {
        let paint = Paint::default().to_params();
        let scissor = Scissor::new(10.0, 10.0, 20.0, 40.0, Transform::scale(2.0, 2.0));
        let frag = convert_paint(&paint, None, &scissor, 1.0, 1.0);
        assert_eq!(frag.scissor_ext, [10.0, 20.0]);
        assert_eq!(frag.scissor_scale, [2.0, 2.0]);
        // Scissor center (40, 60) in device space maps to the origin.
        let m = frag.scissor_mat;
        assert_eq!([m[0] * 40.0 + m[4] * 60.0 + m[8], m[1] * 40.0 + m[5] * 60.0 + m[9]], [0.0, 0.0]);
    }

    #[test]
    fn flipped_image_mirrors_paint_space() {
        let id = ImageId::new(NonZeroU32::MIN);
        let paint = Paint::image_pattern(0.0, 0.0, 10.0, 20.0, 0.0, id, 1.0).to_params();
        let texture = Some((TextureKind::Rgba, ImageFlags::FLIP_Y));
        let frag = convert_paint(&paint, texture, &Scissor::DISABLED, 1.0, 1.0);
        assert_eq!(frag.kind, ShaderKind::FillImage.to_f32());
        assert_eq!(frag.tex_type, tex_type::STRAIGHT);
        // The top edge of the pattern samples the bottom row.
        let m = frag.paint_mat;
        assert_eq!([m[0] * 5.0 + m[4] * 0.0 + m[8], m[1] * 5.0 + m[5] * 0.0 + m[9]], [5.0, 20.0]);
    }

    #[test]
    fn convex_fill_uses_one_uniform() {
        let cache = expanded(false, |p| p.rect(10.0, 10.0, 100.0, 50.0));
        let mut batch = Batcher::new(false);
        let paint = Paint::default().to_params();
        batch
            .fill(&paint, None, &Scissor::DISABLED, 1.0, &cache)
            .unwrap();
        assert_eq!(batch.calls().len(), 1);
        assert_eq!(batch.calls()[0].kind, CallKind::ConvexFill);
        assert_eq!(batch.uniforms().len(), 1);
        assert_eq!(batch.paths()[0].fill_count, 4);
        assert_eq!(batch.paths()[0].stroke_count, 0);
        assert_eq!(batch.vertices().len(), 4 + 6);
    }

    #[test]
    fn stencil_fill_passes() {
        let cache = expanded(true, star);
        let mut batch = Batcher::new(true);
        let paint = Paint::default().to_params();
        batch
            .fill(&paint, None, &Scissor::DISABLED, 1.0, &cache)
            .unwrap();
        let call = batch.calls()[0].clone();
        assert_eq!(call.kind, CallKind::Fill);
        assert_eq!(batch.uniforms()[0].kind, ShaderKind::Simple.to_f32());

        let list = batch.lower([100.0, 100.0], usize::MAX).unwrap();
        let stencils: Vec<_> = list.commands.iter().map(|c| c.stencil).collect();
        assert_eq!(
            stencils,
            [
                StencilMode::FillWinding,
                StencilMode::EqualZero,
                StencilMode::NotEqualZeroClear
            ]
        );
        assert_eq!(list.commands[0].uniform, 0);
        assert_eq!(list.commands[2].uniform, 1);
        assert_eq!(list.commands[2].primitive, Primitive::List(call.vertices));
        assert!(batch.calls().is_empty());
        assert!(batch.vertices().is_empty());
    }

    #[test]
    fn truncated_vertices_drop_draws() {
        let cache = expanded(false, |p| p.rect(0.0, 0.0, 10.0, 10.0));
        let mut batch = Batcher::new(false);
        let paint = Paint::default().to_params();
        for _ in 0..3 {
            batch
                .fill(&paint, None, &Scissor::DISABLED, 1.0, &cache)
                .unwrap();
        }
        // Each fill writes 4 fan vertices and a 6 vertex quad.
        let list = batch.lower([10.0, 10.0], 15).unwrap();
        assert_eq!(list.vertices.len(), 15);
        assert_eq!(list.commands.len(), 2);
    }

    #[test]
    fn short_triangle_lists_are_skipped() {
        let mut batch = Batcher::new(true);
        let paint = Paint::default().to_params();
        let verts = [Vertex::new(0.0, 0.0, 0.0, 0.0); 2];
        batch
            .triangles(&paint, None, &Scissor::DISABLED, &verts)
            .unwrap();
        assert_eq!(batch.uniforms()[0].kind, ShaderKind::Image.to_f32());
        assert!(batch.lower([1.0, 1.0], usize::MAX).unwrap().is_empty());
    }

    #[test]
    fn failed_call_is_rolled_back() {
        let cache = expanded(true, star);
        let mut batch = Batcher::new(true);
        let paint = Paint::default().to_params();
        batch
            .fill(&paint, None, &Scissor::DISABLED, 1.0, &cache)
            .unwrap();
        let lens = |b: &Batcher| {
            (
                b.calls().len(),
                b.paths().len(),
                b.vertices().len(),
                b.uniforms().len(),
            )
        };
        let before = lens(&batch);

        let err = batch
            .transaction(|this| {
                this.push_paths(&cache, true)?;
                this.uniforms.push(FragUniforms::simple());
                alloc::reserve(&mut Vec::<u8>::new(), "test", usize::MAX)
            })
            .unwrap_err();
        assert_eq!(err.buffer, "test");
        assert_eq!(lens(&batch), before);
        assert!(matches!(Error::from(err), Error::OutOfMemory(_)));

        // The surviving call still lowers.
        let list = batch.lower([100.0, 100.0], usize::MAX).unwrap();
        assert_eq!(list.commands.len(), 3);
    }

    #[test]
    fn lowering_reserves_every_command() {
        let mut batch = Batcher::new(true);
        let paint = Paint::default().to_params();
        let star = expanded(true, star);
        let rect = expanded(true, |p| p.rect(0.0, 0.0, 10.0, 10.0));
        batch
            .fill(&paint, None, &Scissor::DISABLED, 1.0, &star)
            .unwrap();
        batch
            .fill(&paint, None, &Scissor::DISABLED, 1.0, &rect)
            .unwrap();
        let (commands, indices) = draw_bounds(&batch.calls, &batch.paths);
        let list = batch.lower([100.0, 100.0], usize::MAX).unwrap();
        assert_eq!(list.commands.len(), commands);
        assert_eq!(list.indices.len(), indices);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn vertex_limit_fits_u32_ranges() {
        assert_eq!(vertex_limit(10, usize::MAX), 10);
        assert_eq!(vertex_limit(10, 4), 4);
        let huge = u32::MAX as usize + 5;
        assert_eq!(vertex_limit(huge, usize::MAX), u32::MAX as usize);
    }
}
