// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paints, scissor rectangles and color helpers.

use std::num::NonZeroU32;
use std::ops::{BitOr, BitOrAssign};

use peniko::Color;

use crate::math::Transform;

/// Handle to a texture owned by the render backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(NonZeroU32);

impl ImageId {
    pub const fn new(id: NonZeroU32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Sampling and upload options for an image.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageFlags(pub u32);

impl ImageFlags {
    pub const GENERATE_MIPMAPS: Self = Self(1 << 0);
    pub const REPEAT_X: Self = Self(1 << 1);
    pub const REPEAT_Y: Self = Self(1 << 2);
    /// Rows are stored bottom to top.
    pub const FLIP_Y: Self = Self(1 << 3);
    /// Pixel data is already premultiplied by alpha.
    pub const PREMULTIPLIED: Self = Self(1 << 4);
    /// Nearest neighbour sampling instead of linear filtering.
    pub const NEAREST: Self = Self(1 << 5);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ImageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ImageFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Defines how a filled or stroked shape is colored.
///
/// Gradient and pattern coordinates are in the local space of `transform`.
/// The context captures its current transform into the paint when the paint
/// is set, so later transform changes do not move it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Gradient along the line from `start` to `end`.
    LinearGradient {
        start: [f32; 2],
        end: [f32; 2],
        inner: Color,
        outer: Color,
        transform: Transform,
    },
    /// Circular gradient between two radii around `center`.
    RadialGradient {
        center: [f32; 2],
        inner_radius: f32,
        outer_radius: f32,
        inner: Color,
        outer: Color,
        transform: Transform,
    },
    /// Feathered rounded rectangle, useful for drop shadows and highlights.
    BoxGradient {
        /// `[x, y, width, height]`.
        rect: [f32; 4],
        radius: f32,
        feather: f32,
        inner: Color,
        outer: Color,
        transform: Transform,
    },
    /// Image tiled from `origin` with one repetition of `size`, rotated by
    /// `angle` radians around `origin`.
    ImagePattern {
        origin: [f32; 2],
        size: [f32; 2],
        angle: f32,
        image: ImageId,
        alpha: f32,
        transform: Transform,
    },
}

impl Default for Paint {
    fn default() -> Self {
        Self::Solid(Color::WHITE)
    }
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Self::Solid(color)
    }

    pub fn linear_gradient(sx: f32, sy: f32, ex: f32, ey: f32, inner: Color, outer: Color) -> Self {
        Self::LinearGradient {
            start: [sx, sy],
            end: [ex, ey],
            inner,
            outer,
            transform: Transform::IDENTITY,
        }
    }

    pub fn radial_gradient(
        cx: f32,
        cy: f32,
        inner_radius: f32,
        outer_radius: f32,
        inner: Color,
        outer: Color,
    ) -> Self {
        Self::RadialGradient {
            center: [cx, cy],
            inner_radius,
            outer_radius,
            inner,
            outer,
            transform: Transform::IDENTITY,
        }
    }

    #[allow(clippy::too_many_arguments, reason = "rect plus gradient parameters")]
    pub fn box_gradient(
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        feather: f32,
        inner: Color,
        outer: Color,
    ) -> Self {
        Self::BoxGradient {
            rect: [x, y, w, h],
            radius,
            feather,
            inner,
            outer,
            transform: Transform::IDENTITY,
        }
    }

    pub fn image_pattern(
        ox: f32,
        oy: f32,
        w: f32,
        h: f32,
        angle: f32,
        image: ImageId,
        alpha: f32,
    ) -> Self {
        Self::ImagePattern {
            origin: [ox, oy],
            size: [w, h],
            angle,
            image,
            alpha,
            transform: Transform::IDENTITY,
        }
    }

    /// Returns the paint with `outer` applied after its current transform.
    #[must_use]
    pub fn transformed(mut self, outer: Transform) -> Self {
        match &mut self {
            Self::Solid(_) => {}
            Self::LinearGradient { transform, .. }
            | Self::RadialGradient { transform, .. }
            | Self::BoxGradient { transform, .. }
            | Self::ImagePattern { transform, .. } => *transform = transform.then(outer),
        }
        self
    }

    /// Lowers the paint to the uniform parameters consumed by the renderer.
    pub fn to_params(&self) -> PaintParams {
        match *self {
            Self::Solid(color) => PaintParams {
                transform: Transform::IDENTITY,
                extent: [0.0; 2],
                radius: 0.0,
                feather: 1.0,
                inner_color: color_to_f32(color),
                outer_color: color_to_f32(color),
                image: None,
            },
            Self::LinearGradient {
                start: [sx, sy],
                end: [ex, ey],
                inner,
                outer,
                transform,
            } => {
                const LARGE: f32 = 1e5;
                let (mut dx, mut dy) = (ex - sx, ey - sy);
                let d = (dx * dx + dy * dy).sqrt();
                if d > 0.0001 {
                    dx /= d;
                    dy /= d;
                } else {
                    dx = 0.0;
                    dy = 1.0;
                }
                // Aligned to the gradient line, origin pushed far away so the
                // box gradient degenerates into a linear ramp.
                let local = Transform::new([dy, -dx, dx, dy, sx - dx * LARGE, sy - dy * LARGE]);
                PaintParams {
                    transform: local.then(transform),
                    extent: [LARGE, LARGE + d * 0.5],
                    radius: 0.0,
                    feather: d.max(1.0),
                    inner_color: color_to_f32(inner),
                    outer_color: color_to_f32(outer),
                    image: None,
                }
            }
            Self::RadialGradient {
                center: [cx, cy],
                inner_radius,
                outer_radius,
                inner,
                outer,
                transform,
            } => {
                let r = (inner_radius + outer_radius) * 0.5;
                PaintParams {
                    transform: Transform::translate(cx, cy).then(transform),
                    extent: [r, r],
                    radius: r,
                    feather: (outer_radius - inner_radius).max(1.0),
                    inner_color: color_to_f32(inner),
                    outer_color: color_to_f32(outer),
                    image: None,
                }
            }
            Self::BoxGradient {
                rect: [x, y, w, h],
                radius,
                feather,
                inner,
                outer,
                transform,
            } => PaintParams {
                transform: Transform::translate(x + w * 0.5, y + h * 0.5).then(transform),
                extent: [w * 0.5, h * 0.5],
                radius,
                feather: feather.max(1.0),
                inner_color: color_to_f32(inner),
                outer_color: color_to_f32(outer),
                image: None,
            },
            Self::ImagePattern {
                origin: [ox, oy],
                size,
                angle,
                image,
                alpha,
                transform,
            } => {
                let local = Transform::translate(ox, oy) * Transform::rotate(angle);
                let tint = [1.0, 1.0, 1.0, alpha];
                PaintParams {
                    transform: local.then(transform),
                    extent: size,
                    radius: 0.0,
                    feather: 0.0,
                    inner_color: tint,
                    outer_color: tint,
                    image: Some(image),
                }
            }
        }
    }
}

/// Paint lowered to the parameters of the fill shader.
///
/// Colors are straight (not premultiplied) RGBA in `0..=1`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PaintParams {
    /// Maps paint space to device space.
    pub transform: Transform,
    pub extent: [f32; 2],
    pub radius: f32,
    pub feather: f32,
    pub inner_color: [f32; 4],
    pub outer_color: [f32; 4],
    pub image: Option<ImageId>,
}

impl PaintParams {
    /// Scales the alpha of both colors.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.inner_color[3] *= alpha;
        self.outer_color[3] *= alpha;
        self
    }
}

/// Scissor rectangle, stored as a centered transform and half extents.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Scissor {
    pub transform: Transform,
    pub extent: [f32; 2],
}

impl Default for Scissor {
    fn default() -> Self {
        Self::DISABLED
    }
}

impl Scissor {
    pub const DISABLED: Self = Self {
        transform: Transform::new([0.0; 6]),
        extent: [-1.0, -1.0],
    };

    /// Scissor for the rectangle `(x, y, w, h)` in the space of `transform`.
    pub fn new(x: f32, y: f32, w: f32, h: f32, transform: Transform) -> Self {
        let w = w.max(0.0);
        let h = h.max(0.0);
        Self {
            transform: Transform::translate(x + w * 0.5, y + h * 0.5).then(transform),
            extent: [w * 0.5, h * 0.5],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.extent[0] >= 0.5 && self.extent[1] >= 0.5
    }

    /// Intersects with the rectangle `(x, y, w, h)` in the space of
    /// `transform`.
    ///
    /// When the two spaces are rotated relative to each other the current
    /// scissor is approximated by its axis-aligned bounds in the new space.
    #[must_use]
    pub fn intersect(&self, x: f32, y: f32, w: f32, h: f32, transform: Transform) -> Self {
        if self.extent[0] < 0.0 {
            return Self::new(x, y, w, h, transform);
        }
        let [ex, ey] = self.extent;
        let p = self.transform.then(transform.inverse());
        let m = p.matrix;
        let tex = ex * m[0].abs() + ey * m[2].abs();
        let tey = ex * m[1].abs() + ey * m[3].abs();
        let [rx, ry, rw, rh] = intersect_rects(
            [p.translation[0] - tex, p.translation[1] - tey, tex * 2.0, tey * 2.0],
            [x, y, w, h],
        );
        Self::new(rx, ry, rw, rh, transform)
    }
}

fn intersect_rects(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let minx = a[0].max(b[0]);
    let miny = a[1].max(b[1]);
    let maxx = (a[0] + a[2]).min(b[0] + b[2]);
    let maxy = (a[1] + a[3]).min(b[1] + b[3]);
    [minx, miny, (maxx - minx).max(0.0), (maxy - miny).max(0.0)]
}

pub fn color_to_f32(c: Color) -> [f32; 4] {
    [c.r, c.g, c.b, c.a].map(|v| f32::from(v) / 255.0)
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Color {
    Color::rgba8(r, g, b, a)
}

/// Color from components in `0..=1`.
pub fn rgbaf(r: f32, g: f32, b: f32, a: f32) -> Color {
    Color::rgba8(unit_to_u8(r), unit_to_u8(g), unit_to_u8(b), unit_to_u8(a))
}

/// Replaces the alpha of `c`.
pub fn trans_rgba(c: Color, a: u8) -> Color {
    Color { a, ..c }
}

/// Linear interpolation between two colors, `u` clamped to `0..=1`.
pub fn lerp_rgba(c0: Color, c1: Color, u: f32) -> Color {
    let u = u.clamp(0.0, 1.0);
    let a = color_to_f32(c0);
    let b = color_to_f32(c1);
    let [r, g, bl, al] = [0, 1, 2, 3].map(|i| a[i] * (1.0 - u) + b[i] * u);
    rgbaf(r, g, bl, al)
}

/// Color from hue (wrapping, in turns), saturation and lightness.
pub fn hsla(h: f32, s: f32, l: f32, a: u8) -> Color {
    fn hue(mut h: f32, m1: f32, m2: f32) -> f32 {
        if h < 0.0 {
            h += 1.0;
        }
        if h > 1.0 {
            h -= 1.0;
        }
        if h < 1.0 / 6.0 {
            m1 + (m2 - m1) * h * 6.0
        } else if h < 3.0 / 6.0 {
            m2
        } else if h < 4.0 / 6.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
        } else {
            m1
        }
    }

    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    Color::rgba8(
        unit_to_u8(hue(h + 1.0 / 3.0, m1, m2)),
        unit_to_u8(hue(h, m1, m2)),
        unit_to_u8(hue(h - 1.0 / 3.0, m1, m2)),
        a,
    )
}

#[cfg(test)]
mod tests {
    use peniko::Color;

    use super::{hsla, lerp_rgba, trans_rgba, Paint, Scissor};
    use crate::Transform;

    #[test]
    fn linear_gradient_params() {
        let p = Paint::linear_gradient(0.0, 0.0, 0.0, 10.0, Color::BLACK, Color::WHITE).to_params();
        assert_eq!(p.extent, [1e5, 1e5 + 5.0]);
        assert_eq!(p.feather, 10.0);
        assert_eq!(p.radius, 0.0);
        assert_eq!(p.transform.coeffs(), [1.0, -0.0, 0.0, 1.0, 0.0, -1e5]);
    }

    #[test]
    fn degenerate_linear_gradient_points_down() {
        let p = Paint::linear_gradient(5.0, 5.0, 5.0, 5.0, Color::BLACK, Color::WHITE).to_params();
        assert_eq!(p.feather, 1.0);
        assert_eq!(p.transform.matrix, [1.0, -0.0, 0.0, 1.0]);
    }

    #[test]
    fn radial_and_box_gradients() {
        let p = Paint::radial_gradient(10.0, 20.0, 4.0, 8.0, Color::BLACK, Color::WHITE).to_params();
        assert_eq!(p.extent, [6.0, 6.0]);
        assert_eq!(p.radius, 6.0);
        assert_eq!(p.feather, 4.0);
        assert_eq!(p.transform.translation, [10.0, 20.0]);

        let p = Paint::box_gradient(0.0, 0.0, 20.0, 10.0, 3.0, 0.5, Color::BLACK, Color::WHITE)
            .to_params();
        assert_eq!(p.extent, [10.0, 5.0]);
        assert_eq!(p.feather, 1.0);
        assert_eq!(p.transform.translation, [10.0, 5.0]);
    }

    #[test]
    fn paint_captures_outer_transform() {
        let p = Paint::radial_gradient(1.0, 2.0, 0.0, 1.0, Color::BLACK, Color::WHITE)
            .transformed(Transform::scale(2.0, 3.0));
        assert_eq!(p.to_params().transform.translation, [2.0, 6.0]);
    }

    #[test]
    fn scissor_intersection() {
        let s = Scissor::new(0.0, 0.0, 100.0, 100.0, Transform::IDENTITY);
        assert_eq!(s.extent, [50.0, 50.0]);
        let s = s.intersect(50.0, 25.0, 100.0, 50.0, Transform::IDENTITY);
        assert_eq!(s.extent, [25.0, 25.0]);
        assert_eq!(s.transform.translation, [75.0, 50.0]);

        let disjoint = s.intersect(500.0, 500.0, 10.0, 10.0, Transform::IDENTITY);
        assert!(!disjoint.is_enabled());

        let fresh = Scissor::DISABLED.intersect(1.0, 2.0, 4.0, 6.0, Transform::IDENTITY);
        assert_eq!(fresh, Scissor::new(1.0, 2.0, 4.0, 6.0, Transform::IDENTITY));
    }

    #[test]
    fn color_helpers() {
        assert_eq!(trans_rgba(Color::WHITE, 10).a, 10);
        let mid = lerp_rgba(Color::BLACK, Color::WHITE, 0.5);
        assert_eq!((mid.r, mid.a), (128, 255));
        assert_eq!(lerp_rgba(Color::BLACK, Color::WHITE, 7.0), Color::WHITE);
        let red = hsla(0.0, 1.0, 0.5, 255);
        assert_eq!((red.r, red.g, red.b), (255, 0, 0));
        assert_eq!(hsla(1.0, 1.0, 0.5, 255), red);
    }
}
