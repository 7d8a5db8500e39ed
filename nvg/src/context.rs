// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use nvg_encoding::alloc;
use nvg_encoding::{
    ImageFlags, ImageId, Paint, PaintParams, PathCache, PathCommands, PathEncoder, Scissor,
    Tolerances, Transform, Vertex, Winding,
};
use peniko::kurbo::{Cap, Join, Shape};
use peniko::Color;

use crate::backend::{RenderBackend, TextureKind};
use crate::batch::Batcher;
use crate::state::{DrawState, StateStack, TextAlign, TextStyle};
use crate::{ContextOptions, Error, Result};

/// Counters of the geometry submitted during a frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub fill_tri_count: usize,
    pub stroke_tri_count: usize,
    pub text_tri_count: usize,
    pub draw_call_count: usize,
}

/// A positioned glyph: the screen rectangle `(x0, y0)..(x1, y1)` in user
/// space and its texture coordinates `(s0, t0)..(s1, t1)` in the atlas.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlyphQuad {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub s0: f32,
    pub t0: f32,
    pub s1: f32,
    pub t1: f32,
}

/// Immediate-mode drawing context.
///
/// Paths are built with the path methods, then painted with [`fill`] or
/// [`stroke`] between [`begin_frame`] and [`end_frame`]. The batched draws
/// of a frame are handed to the backend at [`end_frame`].
///
/// [`fill`]: Self::fill
/// [`stroke`]: Self::stroke
/// [`begin_frame`]: Self::begin_frame
/// [`end_frame`]: Self::end_frame
#[derive(Debug)]
pub struct Context<B: RenderBackend> {
    backend: B,
    options: ContextOptions,
    commands: PathCommands,
    cache: PathCache,
    states: StateStack,
    tol: Tolerances,
    batcher: Batcher,
    view_size: [f32; 2],
    in_frame: bool,
    stats: FrameStats,
    pending_deletes: Vec<ImageId>,
    glyph_verts: Vec<Vertex>,
}

impl<B: RenderBackend> Context<B> {
    pub fn new(backend: B, options: ContextOptions) -> Self {
        Self {
            backend,
            options,
            commands: PathCommands::new(),
            cache: PathCache::new(),
            states: StateStack::new(),
            tol: Tolerances::default(),
            batcher: Batcher::new(options.edge_antialias),
            view_size: [0.0; 2],
            in_frame: false,
            stats: FrameStats::default(),
            pending_deletes: Vec::new(),
            glyph_verts: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Consumes the context, returning the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tol
    }

    /// The calls recorded so far in the current frame.
    pub fn batcher(&self) -> &Batcher {
        &self.batcher
    }

    /// The flattened and expanded form of the current path, as of the last
    /// [`fill`](Self::fill) or [`stroke`](Self::stroke).
    pub fn path_cache(&self) -> &PathCache {
        &self.cache
    }

    pub fn state(&self) -> &DrawState {
        self.states.current()
    }

    // Frame

    /// Starts a new frame of `width` by `height` logical pixels.
    ///
    /// The state stack is reset to a single default state and the
    /// tolerances are derived from `device_pixel_ratio`.
    pub fn begin_frame(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        if self.in_frame {
            log::warn!("begin_frame called during a frame, discarding recorded calls");
            self.batcher.reset();
        }
        self.states.clear();
        self.tol = Tolerances::from_device_pixel_ratio(device_pixel_ratio);
        self.view_size = [width, height];
        self.backend
            .viewport(width, height, self.tol.device_px_ratio);
        self.stats = FrameStats::default();
        self.in_frame = true;
    }

    /// Discards the calls recorded in the current frame.
    pub fn cancel_frame(&mut self) -> Result<()> {
        self.batcher.reset();
        self.in_frame = false;
        self.apply_deferred_deletes()
    }

    /// Hands the recorded calls to the backend and ends the frame.
    ///
    /// Images deleted during the frame are released afterwards.
    pub fn end_frame(&mut self) -> Result<()> {
        if !self.in_frame {
            return Err(Error::FrameNotStarted);
        }
        self.in_frame = false;
        let capacity = self.backend.transient_vertex_capacity();
        let flushed = match self.batcher.lower(self.view_size, capacity) {
            Ok(list) => {
                log::debug!(
                    "frame: {} draws, {} vertices, {} triangles",
                    list.commands.len(),
                    list.vertices.len(),
                    list.triangle_count()
                );
                self.backend.flush(list)
            }
            Err(err) => Err(err.into()),
        };
        let deleted = self.apply_deferred_deletes();
        flushed.and(deleted)
    }

    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    /// Counters of the current frame, or of the last one once it ended.
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    fn ensure_frame(&self) -> Result<()> {
        if self.in_frame {
            Ok(())
        } else {
            Err(Error::FrameNotStarted)
        }
    }

    fn apply_deferred_deletes(&mut self) -> Result<()> {
        let mut result = Ok(());
        for image in self.pending_deletes.drain(..) {
            if let Err(err) = self.backend.delete_texture(image) {
                log::warn!("failed to delete image {image:?}: {err}");
                result = Err(err);
            }
        }
        result
    }

    // State

    /// Pushes a copy of the current render state. Does nothing past
    /// [`MAX_STATES`](crate::MAX_STATES).
    pub fn save(&mut self) {
        self.states.save();
    }

    /// Pops the render state. Does nothing if nothing was saved.
    pub fn restore(&mut self) {
        self.states.restore();
    }

    /// Resets the current render state to defaults.
    pub fn reset(&mut self) {
        self.states.reset();
    }

    pub fn stroke_color(&mut self, color: Color) {
        self.states.current_mut().stroke = Paint::Solid(color);
    }

    /// Sets the stroke paint. Its transform is relative to the current
    /// transform.
    pub fn stroke_paint(&mut self, paint: Paint) {
        let state = self.states.current_mut();
        state.stroke = paint.transformed(state.transform);
    }

    pub fn fill_color(&mut self, color: Color) {
        self.states.current_mut().fill = Paint::Solid(color);
    }

    /// Sets the fill paint. Its transform is relative to the current
    /// transform.
    pub fn fill_paint(&mut self, paint: Paint) {
        let state = self.states.current_mut();
        state.fill = paint.transformed(state.transform);
    }

    pub fn stroke_width(&mut self, width: f32) {
        self.states.current_mut().stroke_width = width;
    }

    pub fn miter_limit(&mut self, limit: f32) {
        self.states.current_mut().miter_limit = limit;
    }

    pub fn line_cap(&mut self, cap: Cap) {
        self.states.current_mut().line_cap = cap;
    }

    pub fn line_join(&mut self, join: Join) {
        self.states.current_mut().line_join = join;
    }

    /// Sets the alpha applied to every paint.
    pub fn global_alpha(&mut self, alpha: f32) {
        self.states.current_mut().global_alpha = alpha;
    }

    // Transforms

    pub fn reset_transform(&mut self) {
        self.states.current_mut().transform = Transform::IDENTITY;
    }

    /// Premultiplies the current transform by `[a b c d e f]`.
    pub fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.pre_multiply(Transform::new([a, b, c, d, e, f]));
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.pre_multiply(Transform::translate(x, y));
    }

    /// Rotates the coordinate system by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        self.pre_multiply(Transform::rotate(angle));
    }

    pub fn skew_x(&mut self, angle: f32) {
        self.pre_multiply(Transform::skew_x(angle));
    }

    pub fn skew_y(&mut self, angle: f32) {
        self.pre_multiply(Transform::skew_y(angle));
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.pre_multiply(Transform::scale(x, y));
    }

    pub fn current_transform(&self) -> Transform {
        self.states.current().transform
    }

    fn pre_multiply(&mut self, t: Transform) {
        let state = self.states.current_mut();
        state.transform = t.then(state.transform);
    }

    // Scissoring

    /// Restricts drawing to the rectangle in the current coordinate system.
    pub fn scissor(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let state = self.states.current_mut();
        state.scissor = Scissor::new(x, y, w, h, state.transform);
    }

    /// Intersects the current scissor with the rectangle.
    pub fn intersect_scissor(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let state = self.states.current_mut();
        state.scissor = state.scissor.intersect(x, y, w, h, state.transform);
    }

    pub fn reset_scissor(&mut self) {
        self.states.current_mut().scissor = Scissor::DISABLED;
    }

    // Paths

    /// Clears the current path.
    pub fn begin_path(&mut self) {
        self.commands.clear();
        self.cache.clear();
    }

    /// Records through the current transform, invalidating the cache.
    fn path(&mut self, f: impl FnOnce(&mut PathEncoder<'_>)) {
        self.cache.clear();
        let transform = self.states.current().transform;
        f(&mut self.commands.encoder(transform, self.tol.dist_tol));
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.path(|p| p.move_to(x, y));
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.path(|p| p.line_to(x, y));
    }

    pub fn bezier_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.path(|p| p.bezier_to(c1x, c1y, c2x, c2y, x, y));
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.path(|p| p.quad_to(cx, cy, x, y));
    }

    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        self.path(|p| p.arc_to(x1, y1, x2, y2, radius));
    }

    pub fn arc(&mut self, cx: f32, cy: f32, r: f32, a0: f32, a1: f32, dir: Winding) {
        self.path(|p| p.arc(cx, cy, r, a0, a1, dir));
    }

    pub fn close_path(&mut self) {
        self.path(|p| p.close());
    }

    /// Sets the winding of the current subpath.
    pub fn path_winding(&mut self, dir: Winding) {
        self.path(|p| p.winding(dir));
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.path(|p| p.rect(x, y, w, h));
    }

    pub fn rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, r: f32) {
        self.path(|p| p.rounded_rect(x, y, w, h, r));
    }

    #[allow(clippy::too_many_arguments, reason = "one radius per corner")]
    pub fn rounded_rect_varying(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        top_left: f32,
        top_right: f32,
        bottom_right: f32,
        bottom_left: f32,
    ) {
        self.path(|p| {
            p.rounded_rect_varying(x, y, w, h, top_left, top_right, bottom_right, bottom_left);
        });
    }

    pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        self.path(|p| p.ellipse(cx, cy, rx, ry));
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32) {
        self.path(|p| p.circle(cx, cy, r));
    }

    /// Appends a [`kurbo`](crate::kurbo) shape to the current path.
    pub fn shape(&mut self, shape: &impl Shape) {
        self.path(|p| p.shape(shape));
    }

    // Painting

    fn texture_for(&self, paint: &PaintParams) -> Result<Option<(TextureKind, ImageFlags)>> {
        let Some(image) = paint.image else {
            return Ok(None);
        };
        let kind = self
            .backend
            .texture_kind(image)
            .ok_or(Error::InvalidHandle(image))?;
        let flags = self.backend.texture_flags(image).unwrap_or_default();
        Ok(Some((kind, flags)))
    }

    /// Fills the current path with the fill paint.
    pub fn fill(&mut self) -> Result<()> {
        self.ensure_frame()?;
        let state = *self.states.current();
        let paint = state.fill.to_params().with_alpha(state.global_alpha);
        let texture = self.texture_for(&paint)?;

        self.cache.flatten(&self.commands, &self.tol)?;
        if self.options.edge_antialias {
            self.cache
                .expand_fill(self.tol.fringe_width, Join::Miter, 3.6, &self.tol)?;
        } else {
            self.cache.expand_fill(0.0, Join::Miter, 1.2, &self.tol)?;
        }

        self.batcher.fill(
            &paint,
            texture,
            &state.scissor,
            self.tol.fringe_width,
            &self.cache,
        )?;

        for path in self.cache.paths() {
            self.stats.fill_tri_count +=
                path.fill.len().saturating_sub(2) + path.stroke.len().saturating_sub(2);
            self.stats.draw_call_count += 2;
        }
        Ok(())
    }

    /// Strokes the current path with the stroke paint.
    ///
    /// The width is scaled by the current transform. Strokes thinner than
    /// the antialiasing fringe are drawn at fringe width with reduced alpha.
    pub fn stroke(&mut self) -> Result<()> {
        self.ensure_frame()?;
        let state = *self.states.current();
        let fringe = self.tol.fringe_width;
        let mut width = (state.stroke_width * state.transform.average_scale()).clamp(0.0, 20.0);
        let mut paint = state.stroke.to_params();
        if width < fringe {
            let alpha = (width / fringe).clamp(0.0, 1.0);
            paint = paint.with_alpha(alpha * alpha);
            width = fringe;
        }
        let paint = paint.with_alpha(state.global_alpha);
        let texture = self.texture_for(&paint)?;

        self.cache.flatten(&self.commands, &self.tol)?;
        let aa = if self.options.edge_antialias { fringe } else { 0.0 };
        self.cache.expand_stroke(
            width * 0.5,
            aa,
            state.line_cap,
            state.line_join,
            state.miter_limit,
            &self.tol,
        )?;

        self.batcher
            .stroke(&paint, texture, &state.scissor, fringe, width, &self.cache)?;

        for path in self.cache.paths() {
            self.stats.stroke_tri_count += path.stroke.len().saturating_sub(2);
            self.stats.draw_call_count += 1;
        }
        Ok(())
    }

    /// Draws textured glyph quads from `atlas`, tinted with the fill paint.
    ///
    /// Quads are positioned in the current coordinate system.
    pub fn draw_glyph_quads(&mut self, quads: &[GlyphQuad], atlas: ImageId) -> Result<()> {
        self.ensure_frame()?;
        let state = *self.states.current();
        let mut paint = state.fill.to_params().with_alpha(state.global_alpha);
        paint.image = Some(atlas);
        let texture = self.texture_for(&paint)?;

        let t = state.transform;
        self.glyph_verts.clear();
        alloc::reserve(&mut self.glyph_verts, "glyph vertex", quads.len() * 6)?;
        for q in quads {
            let [x0, y0] = t.transform_point(q.x0, q.y0);
            let [x1, y1] = t.transform_point(q.x1, q.y0);
            let [x2, y2] = t.transform_point(q.x1, q.y1);
            let [x3, y3] = t.transform_point(q.x0, q.y1);
            let c0 = Vertex::new(x0, y0, q.s0, q.t0);
            let c1 = Vertex::new(x1, y1, q.s1, q.t0);
            let c2 = Vertex::new(x2, y2, q.s1, q.t1);
            let c3 = Vertex::new(x3, y3, q.s0, q.t1);
            self.glyph_verts.extend([c0, c2, c1, c0, c3, c2]);
        }

        self.batcher
            .triangles(&paint, texture, &state.scissor, &self.glyph_verts)?;
        self.stats.draw_call_count += 1;
        self.stats.text_tri_count += self.glyph_verts.len() / 3;
        Ok(())
    }

    // Text state

    pub fn font_size(&mut self, size: f32) {
        self.states.current_mut().text.font_size = size;
    }

    pub fn font_blur(&mut self, blur: f32) {
        self.states.current_mut().text.blur = blur;
    }

    pub fn text_letter_spacing(&mut self, spacing: f32) {
        self.states.current_mut().text.letter_spacing = spacing;
    }

    /// Sets the line height as a multiple of the font size.
    pub fn text_line_height(&mut self, line_height: f32) {
        self.states.current_mut().text.line_height = line_height;
    }

    pub fn text_align(&mut self, align: TextAlign) {
        self.states.current_mut().text.align = align;
    }

    pub fn font_face_id(&mut self, font: u32) {
        self.states.current_mut().text.font_id = Some(font);
    }

    pub fn text_style(&self) -> &TextStyle {
        &self.states.current().text
    }

    // Images

    /// Creates an RGBA image from tightly packed rows of `data`.
    pub fn create_image_rgba(
        &mut self,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: &[u8],
    ) -> Result<ImageId> {
        self.create_image(TextureKind::Rgba, width, height, flags, data)
    }

    /// Creates a single channel image, sampled as coverage.
    pub fn create_image_alpha(
        &mut self,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: &[u8],
    ) -> Result<ImageId> {
        self.create_image(TextureKind::Alpha, width, height, flags, data)
    }

    fn create_image(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: &[u8],
    ) -> Result<ImageId> {
        if width == 0 || height == 0 || data.len() != image_len(kind, width, height) {
            return Err(Error::InvalidImageData);
        }
        self.backend
            .create_texture(kind, width, height, flags, Some(data))
    }

    /// Replaces the whole contents of an image.
    pub fn update_image(&mut self, image: ImageId, data: &[u8]) -> Result<()> {
        let (width, height) = self.image_size(image)?;
        self.update_image_region(image, 0, 0, width, height, data)
    }

    /// Replaces a sub-rectangle of an image with tightly packed rows of
    /// `data`.
    pub fn update_image_region(
        &mut self,
        image: ImageId,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<()> {
        let (iw, ih) = self.image_size(image)?;
        let kind = self
            .backend
            .texture_kind(image)
            .ok_or(Error::InvalidHandle(image))?;
        let in_bounds = x.checked_add(width).is_some_and(|r| r <= iw)
            && y.checked_add(height).is_some_and(|b| b <= ih);
        if !in_bounds || data.len() != image_len(kind, width, height) {
            return Err(Error::InvalidImageData);
        }
        self.backend
            .update_texture(image, [x, y, width, height], data)
    }

    pub fn image_size(&self, image: ImageId) -> Result<(u32, u32)> {
        self.backend
            .texture_size(image)
            .ok_or(Error::InvalidHandle(image))
    }

    /// Deletes an image.
    ///
    /// Within a frame the texture stays alive until [`end_frame`] so that
    /// calls already recorded can still sample it.
    ///
    /// [`end_frame`]: Self::end_frame
    pub fn delete_image(&mut self, image: ImageId) -> Result<()> {
        if self.backend.texture_size(image).is_none() || self.pending_deletes.contains(&image) {
            return Err(Error::InvalidHandle(image));
        }
        if self.in_frame {
            alloc::push(&mut self.pending_deletes, "pending delete", image)?;
            Ok(())
        } else {
            self.backend.delete_texture(image)
        }
    }
}

fn image_len(kind: TextureKind, width: u32, height: u32) -> usize {
    width as usize * height as usize * kind.bytes_per_pixel()
}

#[cfg(not(target_arch = "wasm32"))]
static_assertions::assert_impl_all!(Context<crate::HeadlessBackend>: Send);

#[cfg(test)]
mod tests {
    use nvg_encoding::{ImageFlags, Paint};
    use peniko::kurbo::Cap;
    use peniko::Color;

    use super::{Context, GlyphQuad};
    use crate::batch::CallKind;
    use crate::{ContextOptions, Error, HeadlessBackend, Primitive};

    fn context() -> Context<HeadlessBackend> {
        Context::new(HeadlessBackend::new(), ContextOptions::default())
    }

    #[test]
    fn fill_outside_frame_fails() {
        let mut ctx = context();
        ctx.rect(0.0, 0.0, 10.0, 10.0);
        assert!(matches!(ctx.fill(), Err(Error::FrameNotStarted)));
        assert!(matches!(ctx.end_frame(), Err(Error::FrameNotStarted)));
    }

    #[test]
    fn thin_stroke_fades() {
        let mut ctx = context();
        ctx.begin_frame(100.0, 100.0, 1.0);
        ctx.stroke_width(0.5);
        ctx.stroke_color(Color::WHITE);
        ctx.move_to(10.0, 10.0);
        ctx.line_to(90.0, 10.0);
        ctx.stroke().unwrap();
        let frag = ctx.batcher().uniforms()[0];
        assert!((frag.inner_col[3] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn global_alpha_scales_paint() {
        let mut ctx = context();
        ctx.begin_frame(100.0, 100.0, 1.0);
        ctx.global_alpha(0.5);
        ctx.rect(0.0, 0.0, 10.0, 10.0);
        ctx.fill().unwrap();
        assert_eq!(ctx.batcher().uniforms()[0].inner_col, [0.5; 4]);
    }

    #[test]
    fn fill_then_stroke_shares_path() {
        let mut ctx = context();
        ctx.begin_frame(100.0, 100.0, 1.0);
        ctx.circle(50.0, 50.0, 20.0);
        ctx.fill().unwrap();
        ctx.line_cap(Cap::Round);
        ctx.stroke().unwrap();
        let kinds: Vec<_> = ctx.batcher().calls().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [CallKind::ConvexFill, CallKind::Stroke]);
        let stats = ctx.frame_stats();
        assert_eq!(stats.draw_call_count, 3);
        assert!(stats.fill_tri_count > 0 && stats.stroke_tri_count > 0);
    }

    #[test]
    fn image_paint_needs_live_image() {
        let mut ctx = context();
        let image = ctx
            .create_image_rgba(2, 2, ImageFlags::empty(), &[255; 16])
            .unwrap();
        ctx.delete_image(image).unwrap();
        ctx.begin_frame(100.0, 100.0, 1.0);
        ctx.fill_paint(Paint::image_pattern(0.0, 0.0, 2.0, 2.0, 0.0, image, 1.0));
        ctx.rect(0.0, 0.0, 10.0, 10.0);
        assert!(matches!(ctx.fill(), Err(Error::InvalidHandle(id)) if id == image));
    }

    #[test]
    fn deletion_is_deferred_to_end_frame() {
        let mut ctx = context();
        let image = ctx
            .create_image_alpha(4, 4, ImageFlags::empty(), &[0; 16])
            .unwrap();
        ctx.begin_frame(100.0, 100.0, 1.0);
        ctx.delete_image(image).unwrap();
        assert_eq!(ctx.image_size(image).unwrap(), (4, 4));
        assert!(matches!(ctx.delete_image(image), Err(Error::InvalidHandle(_))));
        ctx.end_frame().unwrap();
        assert!(matches!(ctx.image_size(image), Err(Error::InvalidHandle(_))));
    }

    #[test]
    fn image_data_is_validated() {
        let mut ctx = context();
        let result = ctx.create_image_rgba(2, 2, ImageFlags::empty(), &[0; 15]);
        assert!(matches!(result, Err(Error::InvalidImageData)));
        let image = ctx
            .create_image_alpha(4, 4, ImageFlags::empty(), &[0; 16])
            .unwrap();
        let result = ctx.update_image_region(image, 3, 3, 2, 2, &[1; 4]);
        assert!(matches!(result, Err(Error::InvalidImageData)));
        ctx.update_image_region(image, 2, 2, 2, 2, &[9; 4]).unwrap();
        let data = ctx.backend().texture_data(image).unwrap();
        assert_eq!(&data[8..12], &[0, 0, 9, 9]);
        assert_eq!(&data[12..16], &[0, 0, 9, 9]);
    }

    #[test]
    fn glyph_quads_become_triangles() {
        let mut ctx = context();
        let atlas = ctx
            .create_image_alpha(8, 8, ImageFlags::empty(), &[255; 64])
            .unwrap();
        ctx.begin_frame(100.0, 100.0, 1.0);
        ctx.translate(10.0, 20.0);
        let quad = GlyphQuad {
            x0: 0.0,
            y0: 0.0,
            x1: 4.0,
            y1: 8.0,
            s0: 0.0,
            t0: 0.0,
            s1: 0.5,
            t1: 1.0,
        };
        ctx.draw_glyph_quads(&[quad, quad], atlas).unwrap();
        assert_eq!(ctx.frame_stats().text_tri_count, 4);
        let verts = ctx.batcher().vertices();
        assert_eq!(verts.len(), 12);
        assert_eq!([verts[0].x, verts[0].y], [10.0, 20.0]);
        assert_eq!([verts[1].x, verts[1].y, verts[1].u, verts[1].v], [14.0, 28.0, 0.5, 1.0]);
        assert_eq!([verts[2].x, verts[2].y], [14.0, 20.0]);
        assert_eq!([verts[4].x, verts[4].y], [10.0, 28.0]);

        ctx.end_frame().unwrap();
        let list = ctx.backend().last_draw_list();
        assert_eq!(list.commands.len(), 1);
        assert_eq!(list.commands[0].primitive, Primitive::List(0..12));
        assert_eq!(list.commands[0].image, Some(atlas));
    }

    #[test]
    fn cancel_frame_discards_calls() {
        let mut ctx = context();
        ctx.begin_frame(100.0, 100.0, 1.0);
        ctx.rect(0.0, 0.0, 10.0, 10.0);
        ctx.fill().unwrap();
        ctx.cancel_frame().unwrap();
        assert!(ctx.batcher().calls().is_empty());
        assert_eq!(ctx.backend().flush_count(), 0);
    }

    #[test]
    fn zero_pixel_ratio_keeps_geometry() {
        let mut ctx = context();
        ctx.begin_frame(100.0, 100.0, 0.0);
        assert_eq!(ctx.tolerances().fringe_width, 1.0);
        ctx.rect(10.0, 10.0, 50.0, 50.0);
        ctx.fill().unwrap();
        let path = ctx.batcher().paths()[0];
        assert_eq!(path.fill_count, 4);
        assert!(path.stroke_count > 0);
    }
}
