// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use peniko::kurbo::{PathEl, Shape};

use crate::alloc::{self, AllocError};
use crate::math::{self, Transform};

/// Length proportional to radius of a cubic bezier handle for 90deg arcs.
pub const KAPPA90: f32 = 0.552_284_8;

const INIT_COMMANDS_SIZE: usize = 256;

/// Path tag representation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PathTag(pub u8);

impl PathTag {
    /// Starts a new subpath. One point.
    pub const MOVE_TO: Self = Self(0);

    /// Straight segment. One point.
    pub const LINE_TO: Self = Self(1);

    /// Cubic segment. Two control points and an end point.
    pub const BEZIER_TO: Self = Self(2);

    /// Closes the current subpath.
    pub const CLOSE: Self = Self(3);

    /// Sets the winding of the current subpath. One value.
    pub const WINDING: Self = Self(4);

    /// Number of `f32` values that follow the tag in the data stream.
    pub const fn data_len(self) -> usize {
        match self {
            Self::MOVE_TO | Self::LINE_TO => 2,
            Self::BEZIER_TO => 6,
            Self::WINDING => 1,
            _ => 0,
        }
    }
}

/// Winding direction of a subpath.
///
/// Counter-clockwise subpaths are solid and clockwise subpaths are holes
/// under the non-zero fill rule.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Winding {
    #[default]
    Ccw,
    Cw,
}

impl Winding {
    pub const SOLID: Self = Self::Ccw;
    pub const HOLE: Self = Self::Cw;

    fn encode(self) -> f32 {
        match self {
            Self::Ccw => 1.0,
            Self::Cw => 2.0,
        }
    }

    fn decode(value: f32) -> Self {
        if value == 2.0 {
            Self::Cw
        } else {
            Self::Ccw
        }
    }
}

/// A decoded path command. Coordinates are in device space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo([f32; 2]),
    LineTo([f32; 2]),
    BezierTo([f32; 2], [f32; 2], [f32; 2]),
    Close,
    Winding(Winding),
}

/// Recorded path commands for the path under construction.
///
/// Points are transformed when they are recorded, so changing the
/// transform afterwards does not affect segments already in the buffer.
#[derive(Clone, Debug, Default)]
pub struct PathCommands {
    tags: Vec<PathTag>,
    data: Vec<f32>,
    /// Last recorded point, in device space.
    current: [f32; 2],
    alloc_error: Option<AllocError>,
}

impl PathCommands {
    pub fn new() -> Self {
        Self {
            tags: Vec::with_capacity(INIT_COMMANDS_SIZE / 4),
            data: Vec::with_capacity(INIT_COMMANDS_SIZE),
            current: [0.0; 2],
            alloc_error: None,
        }
    }

    /// Removes all commands, retaining the allocations.
    pub fn clear(&mut self) {
        self.tags.clear();
        self.data.clear();
        self.current = [0.0; 2];
        self.alloc_error = None;
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// The last recorded point in device space, if any command exists.
    pub fn current_point(&self) -> Option<[f32; 2]> {
        (!self.tags.is_empty()).then_some(self.current)
    }

    /// Reports an allocation failure that occurred while recording.
    pub fn check(&self) -> Result<(), AllocError> {
        match &self.alloc_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn iter(&self) -> Commands<'_> {
        Commands {
            tags: self.tags.iter(),
            data: &self.data,
        }
    }

    /// Returns an encoder that records commands through `transform`.
    pub fn encoder(&mut self, transform: Transform, dist_tol: f32) -> PathEncoder<'_> {
        PathEncoder::new(self, transform, dist_tol)
    }

    fn push(&mut self, tag: PathTag, values: &[f32]) {
        if self.alloc_error.is_some() {
            return;
        }
        let result = alloc::push(&mut self.tags, "command tag", tag)
            .and_then(|()| alloc::extend(&mut self.data, "command data", values));
        match result {
            Ok(()) => {
                if tag != PathTag::CLOSE && tag != PathTag::WINDING {
                    if let &[.., x, y] = values {
                        self.current = [x, y];
                    }
                }
            }
            Err(err) => self.alloc_error = Some(err),
        }
    }
}

/// Iterator over the commands of a [`PathCommands`].
#[derive(Clone, Debug)]
pub struct Commands<'a> {
    tags: std::slice::Iter<'a, PathTag>,
    data: &'a [f32],
}

impl Iterator for Commands<'_> {
    type Item = PathCommand;

    fn next(&mut self) -> Option<PathCommand> {
        let tag = *self.tags.next()?;
        let data = self.data;
        let values = data.get(..tag.data_len())?;
        self.data = &data[values.len()..];
        Some(match (tag, values) {
            (PathTag::MOVE_TO, &[x, y]) => PathCommand::MoveTo([x, y]),
            (PathTag::LINE_TO, &[x, y]) => PathCommand::LineTo([x, y]),
            (PathTag::BEZIER_TO, &[c1x, c1y, c2x, c2y, x, y]) => {
                PathCommand::BezierTo([c1x, c1y], [c2x, c2y], [x, y])
            }
            (PathTag::WINDING, &[dir]) => PathCommand::Winding(Winding::decode(dir)),
            _ => PathCommand::Close,
        })
    }
}

/// Encoder for the commands of a single path.
///
/// All coordinates are in user space and are mapped through the transform
/// given at construction.
#[derive(Debug)]
pub struct PathEncoder<'a> {
    commands: &'a mut PathCommands,
    transform: Transform,
    dist_tol: f32,
}

impl<'a> PathEncoder<'a> {
    /// Creates a new path encoder appending to `commands`.
    ///
    /// `dist_tol` is the distance below which two points are considered
    /// coincident by [`arc_to`](Self::arc_to).
    pub fn new(commands: &'a mut PathCommands, transform: Transform, dist_tol: f32) -> Self {
        Self {
            commands,
            transform,
            dist_tol,
        }
    }

    fn point(&self, x: f32, y: f32) -> [f32; 2] {
        self.transform.transform_point(x, y)
    }

    /// The current point mapped back into user space.
    fn current_user_point(&self) -> Option<[f32; 2]> {
        let [x, y] = self.commands.current_point()?;
        Some(self.transform.inverse().transform_point(x, y))
    }

    /// Starts a new subpath at the specified point.
    pub fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(PathTag::MOVE_TO, &p);
    }

    /// Adds a line segment from the current point to the specified point.
    pub fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(PathTag::LINE_TO, &p);
    }

    /// Adds a cubic bezier segment from the current point.
    pub fn bezier_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        let [c1x, c1y] = self.point(c1x, c1y);
        let [c2x, c2y] = self.point(c2x, c2y);
        let [x, y] = self.point(x, y);
        self.commands
            .push(PathTag::BEZIER_TO, &[c1x, c1y, c2x, c2y, x, y]);
    }

    /// Adds a quadratic bezier segment from the current point, raised to a cubic.
    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let Some([x0, y0]) = self.current_user_point() else {
            return;
        };
        self.bezier_to(
            x0 + 2.0 / 3.0 * (cx - x0),
            y0 + 2.0 / 3.0 * (cy - y0),
            x + 2.0 / 3.0 * (cx - x),
            y + 2.0 / 3.0 * (cy - y),
            x,
            y,
        );
    }

    /// Closes the current subpath with a line segment.
    pub fn close(&mut self) {
        self.commands.push(PathTag::CLOSE, &[]);
    }

    /// Sets the winding of the current subpath.
    pub fn winding(&mut self, dir: Winding) {
        self.commands.push(PathTag::WINDING, &[dir.encode()]);
    }

    /// Adds an arc segment at the corner defined by the last path point and
    /// two specified points.
    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        let Some([x0, y0]) = self.current_user_point() else {
            return;
        };
        let tol = self.dist_tol;

        // Degenerate corners collapse to a straight line.
        if math::pt_equals(x0, y0, x1, y1, tol)
            || math::pt_equals(x1, y1, x2, y2, tol)
            || math::dist_pt_seg(x1, y1, x0, y0, x2, y2) < tol * tol
            || radius < tol
        {
            self.line_to(x1, y1);
            return;
        }

        let (mut dx0, mut dy0) = (x0 - x1, y0 - y1);
        let (mut dx1, mut dy1) = (x2 - x1, y2 - y1);
        math::normalize(&mut dx0, &mut dy0);
        math::normalize(&mut dx1, &mut dy1);
        let a = (dx0 * dx1 + dy0 * dy1).clamp(-1.0, 1.0).acos();
        let d = radius / (a / 2.0).tan();

        if d > 10000.0 {
            self.line_to(x1, y1);
            return;
        }

        let (cx, cy, a0, a1, dir) = if math::cross(dx0, dy0, dx1, dy1) > 0.0 {
            (
                x1 + dx0 * d + dy0 * radius,
                y1 + dy0 * d + -dx0 * radius,
                dx0.atan2(-dy0),
                (-dx1).atan2(dy1),
                Winding::Cw,
            )
        } else {
            (
                x1 + dx0 * d + -dy0 * radius,
                y1 + dy0 * d + dx0 * radius,
                (-dx0).atan2(dy0),
                dx1.atan2(-dy1),
                Winding::Ccw,
            )
        };
        self.arc(cx, cy, radius, a0, a1, dir);
    }

    /// Adds a circular arc centered at `(cx, cy)` from angle `a0` to `a1`
    /// (radians), sweeping in direction `dir`.
    ///
    /// Connects to the current point with a line, or starts a new subpath
    /// if the path is empty.
    pub fn arc(&mut self, cx: f32, cy: f32, r: f32, a0: f32, a1: f32, dir: Winding) {
        let mut da = a1 - a0;
        match dir {
            Winding::Cw => {
                if da.abs() >= PI * 2.0 {
                    da = PI * 2.0;
                } else {
                    while da < 0.0 {
                        da += PI * 2.0;
                    }
                }
            }
            Winding::Ccw => {
                if da.abs() >= PI * 2.0 {
                    da = -PI * 2.0;
                } else {
                    while da > 0.0 {
                        da -= PI * 2.0;
                    }
                }
            }
        }

        // Split arc into max 90 degree segments.
        let ndivs = ((da.abs() / (PI * 0.5) + 0.5) as usize).clamp(1, 5);
        let hda = (da / ndivs as f32) / 2.0;
        let mut kappa = (4.0 / 3.0 * (1.0 - hda.cos()) / hda.sin()).abs();
        if dir == Winding::Ccw {
            kappa = -kappa;
        }

        let move_to = self.commands.is_empty();
        let (mut px, mut py, mut ptanx, mut ptany) = (0.0, 0.0, 0.0, 0.0);
        for i in 0..=ndivs {
            let a = a0 + da * (i as f32 / ndivs as f32);
            let (dy, dx) = a.sin_cos();
            let x = cx + dx * r;
            let y = cy + dy * r;
            let tanx = -dy * r * kappa;
            let tany = dx * r * kappa;
            if i == 0 {
                if move_to {
                    self.move_to(x, y);
                } else {
                    self.line_to(x, y);
                }
            } else {
                self.bezier_to(px + ptanx, py + ptany, x - tanx, y - tany, x, y);
            }
            px = x;
            py = y;
            ptanx = tanx;
            ptany = tany;
        }
    }

    /// Adds a closed rectangle subpath.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.move_to(x, y);
        self.line_to(x + w, y);
        self.line_to(x + w, y + h);
        self.line_to(x, y + h);
        self.close();
    }

    /// Adds a closed rectangle subpath with rounded corners.
    pub fn rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, r: f32) {
        if r < 0.1 {
            self.rect(x, y, w, h);
            return;
        }
        let k = r * (1.0 - KAPPA90);
        self.move_to(x + r, y);
        self.line_to(x + w - r, y);
        self.bezier_to(x + w - k, y, x + w, y + k, x + w, y + r);
        self.line_to(x + w, y + h - r);
        self.bezier_to(x + w, y + h - k, x + w - k, y + h, x + w - r, y + h);
        self.line_to(x + r, y + h);
        self.bezier_to(x + k, y + h, x, y + h - k, x, y + h - r);
        self.line_to(x, y + r);
        self.bezier_to(x, y + k, x + k, y, x + r, y);
        self.close();
    }

    /// Adds a rounded rectangle subpath with a separate radius per corner.
    ///
    /// Radii are clamped to half the rectangle size.
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
        if top_left < 0.1 && top_right < 0.1 && bottom_right < 0.1 && bottom_left < 0.1 {
            self.rect(x, y, w, h);
            return;
        }
        let halfw = w.abs() * 0.5;
        let halfh = h.abs() * 0.5;
        let (sw, sh) = (w.signum(), h.signum());
        let radii = |r: f32| (r.min(halfw) * sw, r.min(halfh) * sh);
        let (rx_bl, ry_bl) = radii(bottom_left);
        let (rx_br, ry_br) = radii(bottom_right);
        let (rx_tr, ry_tr) = radii(top_right);
        let (rx_tl, ry_tl) = radii(top_left);
        let k = 1.0 - KAPPA90;
        self.move_to(x, y + ry_tl);
        self.line_to(x, y + h - ry_bl);
        self.bezier_to(
            x,
            y + h - ry_bl * k,
            x + rx_bl * k,
            y + h,
            x + rx_bl,
            y + h,
        );
        self.line_to(x + w - rx_br, y + h);
        self.bezier_to(
            x + w - rx_br * k,
            y + h,
            x + w,
            y + h - ry_br * k,
            x + w,
            y + h - ry_br,
        );
        self.line_to(x + w, y + ry_tr);
        self.bezier_to(x + w, y + ry_tr * k, x + w - rx_tr * k, y, x + w - rx_tr, y);
        self.line_to(x + rx_tl, y);
        self.bezier_to(x + rx_tl * k, y, x, y + ry_tl * k, x, y + ry_tl);
        self.close();
    }

    /// Adds a closed ellipse subpath made of four cubic segments.
    pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        let (kx, ky) = (rx * KAPPA90, ry * KAPPA90);
        self.move_to(cx + rx, cy);
        self.bezier_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
        self.bezier_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
        self.bezier_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
        self.bezier_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
        self.close();
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32) {
        self.ellipse(cx, cy, r, r);
    }

    /// Encodes a shape.
    pub fn shape(&mut self, shape: &impl Shape) {
        self.path_elements(shape.path_elements(0.1));
    }

    /// Encodes a path iterator.
    pub fn path_elements(&mut self, path: impl Iterator<Item = PathEl>) {
        for el in path {
            match el {
                PathEl::MoveTo(p0) => self.move_to(p0.x as f32, p0.y as f32),
                PathEl::LineTo(p0) => self.line_to(p0.x as f32, p0.y as f32),
                PathEl::QuadTo(p0, p1) => {
                    self.quad_to(p0.x as f32, p0.y as f32, p1.x as f32, p1.y as f32);
                }
                PathEl::CurveTo(p0, p1, p2) => self.bezier_to(
                    p0.x as f32,
                    p0.y as f32,
                    p1.x as f32,
                    p1.y as f32,
                    p2.x as f32,
                    p2.y as f32,
                ),
                PathEl::ClosePath => self.close(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use peniko::kurbo::Rect;

    use super::{PathCommand, PathCommands, Winding};
    use crate::math::Transform;

    fn record(transform: Transform, f: impl FnOnce(&mut super::PathEncoder<'_>)) -> Vec<PathCommand> {
        let mut commands = PathCommands::new();
        f(&mut commands.encoder(transform, 0.01));
        commands.iter().collect()
    }

    #[test]
    fn points_are_transformed_at_record_time() {
        let cmds = record(Transform::translate(5.0, 7.0), |p| {
            p.move_to(1.0, 2.0);
            p.line_to(3.0, 4.0);
            p.close();
            p.winding(Winding::HOLE);
        });
        assert_eq!(
            cmds,
            [
                PathCommand::MoveTo([6.0, 9.0]),
                PathCommand::LineTo([8.0, 11.0]),
                PathCommand::Close,
                PathCommand::Winding(Winding::Cw),
            ]
        );
    }

    #[test]
    fn current_point_ignores_close_and_winding() {
        let mut commands = PathCommands::new();
        assert_eq!(commands.current_point(), None);
        let mut p = commands.encoder(Transform::IDENTITY, 0.01);
        p.move_to(1.0, 2.0);
        p.line_to(3.0, 4.0);
        p.close();
        p.winding(Winding::Cw);
        assert_eq!(commands.current_point(), Some([3.0, 4.0]));
        commands.clear();
        assert!(commands.is_empty());
        assert_eq!(commands.current_point(), None);
    }

    #[test]
    fn arc_to_without_current_point_is_noop() {
        let cmds = record(Transform::IDENTITY, |p| p.arc_to(0.0, 0.0, 10.0, 10.0, 5.0));
        assert!(cmds.is_empty());
    }

    #[test]
    fn arc_to_colinear_degenerates_to_line() {
        let cmds = record(Transform::IDENTITY, |p| {
            p.move_to(0.0, 0.0);
            p.arc_to(10.0, 0.0, 20.0, 0.0, 5.0);
        });
        assert_eq!(cmds[1], PathCommand::LineTo([10.0, 0.0]));
        assert_eq!(cmds.len(), 2);
    }

    #[test]
    fn arc_to_uses_user_space_current_point() {
        let scaled = record(Transform::scale(2.0, 2.0), |p| {
            p.move_to(0.0, 0.0);
            p.arc_to(10.0, 0.0, 10.0, 10.0, 2.0);
        });
        let plain = record(Transform::IDENTITY, |p| {
            p.move_to(0.0, 0.0);
            p.arc_to(10.0, 0.0, 10.0, 10.0, 2.0);
        });
        assert_eq!(scaled.len(), plain.len());
        let (PathCommand::LineTo(a), PathCommand::LineTo(b)) = (scaled[1], plain[1]) else {
            panic!("arc should connect with a line: {scaled:?}");
        };
        assert!((a[0] - b[0] * 2.0).abs() < 1e-3 && (a[1] - b[1] * 2.0).abs() < 1e-3);
    }

    #[test]
    fn arc_segments_are_bounded() {
        let cmds = record(Transform::IDENTITY, |p| {
            p.arc(0.0, 0.0, 10.0, 0.0, std::f32::consts::PI * 2.0, Winding::Cw);
        });
        assert!(matches!(cmds[0], PathCommand::MoveTo(_)));
        assert_eq!(cmds.len(), 5);
        let PathCommand::BezierTo(_, _, end) = cmds[4] else {
            panic!("expected bezier");
        };
        assert!((end[0] - 10.0).abs() < 1e-3 && end[1].abs() < 1e-3);
    }

    #[test]
    fn rounded_rect_small_radius_is_rect() {
        let cmds = record(Transform::IDENTITY, |p| p.rounded_rect(0.0, 0.0, 10.0, 10.0, 0.05));
        assert_eq!(cmds.len(), 5);
        let cmds = record(Transform::IDENTITY, |p| {
            p.rounded_rect_varying(0.0, 0.0, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0);
        });
        assert_eq!(cmds.len(), 5);
    }

    #[test]
    fn kurbo_shape() {
        let cmds = record(Transform::IDENTITY, |p| {
            p.shape(&Rect::new(0.0, 0.0, 4.0, 2.0));
        });
        assert_eq!(cmds[0], PathCommand::MoveTo([0.0, 0.0]));
        assert_eq!(cmds.last(), Some(&PathCommand::Close));
    }
}
