// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of recorded path commands into polylines.

use std::ops::{BitOr, BitOrAssign, Range};

use crate::alloc::{self, AllocError};
use crate::expand::Vertex;
use crate::math;
use crate::{PathCommand, PathCommands, Tolerances, Winding};

const INIT_POINTS_SIZE: usize = 128;
const INIT_PATHS_SIZE: usize = 16;
const INIT_VERTS_SIZE: usize = 256;

/// Maximum recursion depth of bezier subdivision.
pub const MAX_TESSELLATION_LEVEL: u32 = 10;

/// Classification of a polyline point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PointFlags {
    /// The point is a segment endpoint rather than an interior point of a
    /// flattened curve.
    pub corner: bool,
    /// The path turns left at this point.
    pub left: bool,
    /// The outer side of the join needs bevel (or round) geometry.
    pub bevel: bool,
    /// The inner side of the join is too tight for a miter.
    pub inner_bevel: bool,
}

impl PointFlags {
    pub const NONE: Self = Self {
        corner: false,
        left: false,
        bevel: false,
        inner_bevel: false,
    };

    pub const CORNER: Self = Self {
        corner: true,
        ..Self::NONE
    };
}

impl BitOr for PointFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            corner: self.corner | rhs.corner,
            left: self.left | rhs.left,
            bevel: self.bevel | rhs.bevel,
            inner_bevel: self.inner_bevel | rhs.inner_bevel,
        }
    }
}

impl BitOrAssign for PointFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// A point of a flattened subpath.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    /// Unit direction to the next point.
    pub dx: f32,
    pub dy: f32,
    /// Length of the segment to the next point.
    pub len: f32,
    /// Miter direction, scaled so that offsetting by `dm * w` reaches the
    /// miter point of a stroke of half width `w`.
    pub dmx: f32,
    pub dmy: f32,
    pub flags: PointFlags,
}

/// A flattened subpath.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CachePath {
    /// Index of the first point in the cache.
    pub first: usize,
    pub count: usize,
    pub closed: bool,
    /// Number of points that need bevel geometry.
    pub bevel_count: usize,
    pub winding: Winding,
    pub convex: bool,
    /// Triangle fan vertices in the cache vertex array.
    pub fill: Range<usize>,
    /// Triangle strip vertices (stroke or antialiasing fringe).
    pub stroke: Range<usize>,
}

/// Flattened geometry of the current path along with the vertices most
/// recently expanded from it.
#[derive(Clone, Debug)]
pub struct PathCache {
    pub(crate) points: Vec<Point>,
    pub(crate) paths: Vec<CachePath>,
    pub(crate) verts: Vec<Vertex>,
    bounds: [f32; 4],
    flattened: bool,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PathCache {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(INIT_POINTS_SIZE),
            paths: Vec::with_capacity(INIT_PATHS_SIZE),
            verts: Vec::with_capacity(INIT_VERTS_SIZE),
            bounds: [0.0; 4],
            flattened: false,
        }
    }

    /// Discards the flattened path, retaining the allocations.
    pub fn clear(&mut self) {
        self.points.clear();
        self.paths.clear();
        self.verts.clear();
        self.bounds = [0.0; 4];
        self.flattened = false;
    }

    pub fn is_flattened(&self) -> bool {
        self.flattened
    }

    pub fn paths(&self) -> &[CachePath] {
        &self.paths
    }

    /// Points of `path`, excluding any dropped closing duplicate.
    pub fn points(&self, path: &CachePath) -> &[Point] {
        &self.points[path.first..path.first + path.count]
    }

    pub fn fill_vertices(&self, path: &CachePath) -> &[Vertex] {
        &self.verts[path.fill.clone()]
    }

    pub fn stroke_vertices(&self, path: &CachePath) -> &[Vertex] {
        &self.verts[path.stroke.clone()]
    }

    /// Bounding box `[min_x, min_y, max_x, max_y]` of all points.
    pub fn bounds(&self) -> [f32; 4] {
        self.bounds
    }

    /// Flattens `commands` into polylines.
    ///
    /// Does nothing if the cache is already flattened, so that a fill
    /// followed by a stroke of the same path shares the work.
    pub fn flatten(
        &mut self,
        commands: &PathCommands,
        tol: &Tolerances,
    ) -> Result<(), AllocError> {
        if self.flattened {
            return Ok(());
        }
        commands.check()?;
        self.points.clear();
        self.paths.clear();
        self.verts.clear();

        for command in commands.iter() {
            match command {
                PathCommand::MoveTo(p) => {
                    self.add_path()?;
                    self.add_point(p, PointFlags::CORNER, tol.dist_tol)?;
                }
                PathCommand::LineTo(p) => self.add_point(p, PointFlags::CORNER, tol.dist_tol)?,
                PathCommand::BezierTo(c1, c2, p) => {
                    if let Some(last) = self.last_point() {
                        self.tessellate_bezier(
                            [last.x, last.y],
                            c1,
                            c2,
                            p,
                            0,
                            PointFlags::CORNER,
                            tol,
                        )?;
                    }
                }
                PathCommand::Close => {
                    if let Some(path) = self.paths.last_mut() {
                        path.closed = true;
                    }
                }
                PathCommand::Winding(dir) => {
                    if let Some(path) = self.paths.last_mut() {
                        path.winding = dir;
                    }
                }
            }
        }

        self.bounds = [1e6, 1e6, -1e6, -1e6];
        for path in &mut self.paths {
            let pts = &mut self.points[path.first..path.first + path.count];

            // A closing point that repeats the first point is dropped.
            if let [first, .., last] = pts {
                if math::pt_equals(last.x, last.y, first.x, first.y, tol.dist_tol) {
                    path.count -= 1;
                    path.closed = true;
                }
            }
            let pts = &mut self.points[path.first..path.first + path.count];

            // Enforce winding.
            if pts.len() > 2 {
                let area = math::poly_area(pts.iter().map(|p| [p.x, p.y]));
                let reverse = match path.winding {
                    Winding::Ccw => area < 0.0,
                    Winding::Cw => area > 0.0,
                };
                if reverse {
                    pts.reverse();
                }
            }

            let n = pts.len();
            for i in 0..n {
                let next = pts[(i + 1) % n];
                let p = &mut pts[i];
                p.dx = next.x - p.x;
                p.dy = next.y - p.y;
                p.len = math::normalize(&mut p.dx, &mut p.dy);
                self.bounds[0] = self.bounds[0].min(p.x);
                self.bounds[1] = self.bounds[1].min(p.y);
                self.bounds[2] = self.bounds[2].max(p.x);
                self.bounds[3] = self.bounds[3].max(p.y);
            }
        }
        self.flattened = true;
        Ok(())
    }

    fn add_path(&mut self) -> Result<(), AllocError> {
        let first = self.points.len();
        alloc::push(
            &mut self.paths,
            "path",
            CachePath {
                first,
                winding: Winding::Ccw,
                ..CachePath::default()
            },
        )
    }

    fn last_point(&self) -> Option<Point> {
        let path = self.paths.last()?;
        if path.count == 0 {
            return None;
        }
        self.points.last().copied()
    }

    fn add_point(
        &mut self,
        [x, y]: [f32; 2],
        flags: PointFlags,
        dist_tol: f32,
    ) -> Result<(), AllocError> {
        let Some(path) = self.paths.last_mut() else {
            return Ok(());
        };
        if path.count > 0 {
            if let Some(last) = self.points.last_mut() {
                if math::pt_equals(last.x, last.y, x, y, dist_tol) {
                    last.flags |= flags;
                    return Ok(());
                }
            }
        }
        alloc::push(
            &mut self.points,
            "point",
            Point {
                x,
                y,
                flags,
                ..Point::default()
            },
        )?;
        path.count += 1;
        Ok(())
    }

    /// Recursively subdivides a cubic bezier until each piece is flat
    /// within `tol.tess_tol`, appending the end points of the pieces.
    ///
    /// Only the final piece carries `flags`.
    #[allow(clippy::too_many_arguments, reason = "four control points")]
    fn tessellate_bezier(
        &mut self,
        [x1, y1]: [f32; 2],
        [x2, y2]: [f32; 2],
        [x3, y3]: [f32; 2],
        [x4, y4]: [f32; 2],
        level: u32,
        flags: PointFlags,
        tol: &Tolerances,
    ) -> Result<(), AllocError> {
        if level > MAX_TESSELLATION_LEVEL {
            return Ok(());
        }

        let dx = x4 - x1;
        let dy = y4 - y1;
        let d2 = ((x2 - x4) * dy - (y2 - y4) * dx).abs();
        let d3 = ((x3 - x4) * dy - (y3 - y4) * dx).abs();

        if (d2 + d3) * (d2 + d3) < tol.tess_tol * (dx * dx + dy * dy) {
            return self.add_point([x4, y4], flags, tol.dist_tol);
        }

        let x12 = (x1 + x2) * 0.5;
        let y12 = (y1 + y2) * 0.5;
        let x23 = (x2 + x3) * 0.5;
        let y23 = (y2 + y3) * 0.5;
        let x34 = (x3 + x4) * 0.5;
        let y34 = (y3 + y4) * 0.5;
        let x123 = (x12 + x23) * 0.5;
        let y123 = (y12 + y23) * 0.5;
        let x234 = (x23 + x34) * 0.5;
        let y234 = (y23 + y34) * 0.5;
        let x1234 = (x123 + x234) * 0.5;
        let y1234 = (y123 + y234) * 0.5;

        self.tessellate_bezier(
            [x1, y1],
            [x12, y12],
            [x123, y123],
            [x1234, y1234],
            level + 1,
            PointFlags::NONE,
            tol,
        )?;
        self.tessellate_bezier(
            [x1234, y1234],
            [x234, y234],
            [x34, y34],
            [x4, y4],
            level + 1,
            flags,
            tol,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{PathCache, PointFlags};
    use crate::{PathCommands, Tolerances, Transform, Winding};

    fn flatten(f: impl FnOnce(&mut crate::PathEncoder<'_>)) -> PathCache {
        let tol = Tolerances::default();
        let mut commands = PathCommands::new();
        f(&mut commands.encoder(Transform::IDENTITY, tol.dist_tol));
        let mut cache = PathCache::new();
        cache.flatten(&commands, &tol).unwrap();
        cache
    }

    #[test]
    fn rect_is_reversed_to_ccw() {
        let cache = flatten(|p| p.rect(10.0, 10.0, 100.0, 50.0));
        assert_eq!(cache.paths().len(), 1);
        let path = &cache.paths()[0];
        assert!(path.closed);
        assert_eq!(path.count, 4);
        let pts = cache.points(path);
        assert_eq!([pts[0].x, pts[0].y], [10.0, 60.0]);
        assert_eq!(cache.bounds(), [10.0, 10.0, 110.0, 60.0]);
        assert!(pts.iter().all(|p| p.flags.corner));
        assert_eq!([pts[0].dx, pts[0].dy, pts[0].len], [1.0, 0.0, 100.0]);
    }

    #[test]
    fn hole_winding_is_clockwise() {
        let cache = flatten(|p| {
            p.rect(0.0, 0.0, 10.0, 10.0);
            p.winding(Winding::HOLE);
        });
        let path = &cache.paths()[0];
        assert_eq!(path.winding, Winding::Cw);
        let area = crate::math::poly_area(cache.points(path).iter().map(|p| [p.x, p.y]));
        assert!(area < 0.0);
    }

    #[test]
    fn coincident_points_merge_flags() {
        let cache = flatten(|p| {
            p.move_to(0.0, 0.0);
            p.line_to(10.0, 0.0);
            p.line_to(10.001, 0.0);
        });
        let path = &cache.paths()[0];
        assert_eq!(path.count, 2);
        assert!(!path.closed);
    }

    #[test]
    fn line_before_move_is_ignored() {
        let cache = flatten(|p| {
            p.line_to(5.0, 5.0);
            p.bezier_to(1.0, 1.0, 2.0, 2.0, 3.0, 3.0);
        });
        assert!(cache.paths().is_empty());
    }

    #[test]
    fn bezier_interior_points_are_not_corners() {
        let cache = flatten(|p| {
            p.move_to(0.0, 0.0);
            p.bezier_to(0.0, 100.0, 100.0, 100.0, 100.0, 0.0);
        });
        let path = &cache.paths()[0];
        let pts = cache.points(path);
        assert!(pts.len() > 4);
        assert_eq!(pts.iter().filter(|p| p.flags.corner).count(), 2);
        assert_eq!(pts.last().map(|p| p.flags), Some(PointFlags::CORNER));
    }

    #[test]
    fn flatten_is_idempotent_until_cleared() {
        let tol = Tolerances::default();
        let mut commands = PathCommands::new();
        commands
            .encoder(Transform::IDENTITY, tol.dist_tol)
            .rect(0.0, 0.0, 1.0, 1.0);
        let mut cache = PathCache::new();
        cache.flatten(&commands, &tol).unwrap();
        commands
            .encoder(Transform::IDENTITY, tol.dist_tol)
            .rect(5.0, 5.0, 1.0, 1.0);
        cache.flatten(&commands, &tol).unwrap();
        assert_eq!(cache.paths().len(), 1);
        cache.clear();
        cache.flatten(&commands, &tol).unwrap();
        assert_eq!(cache.paths().len(), 2);
    }
}
