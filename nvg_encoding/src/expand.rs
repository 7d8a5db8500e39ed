// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expansion of flattened paths into fill fans and antialiased strips.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use peniko::kurbo::{Cap, Join};

use crate::alloc::{self, AllocError};
use crate::flatten::{PathCache, Point};
use crate::math;
use crate::Tolerances;

/// Vertex emitted by the expander.
///
/// `u` fades across the width of a stroke or fringe and `v` fades along
/// the antialiasing skirt of a cap. Triangle passthrough draws use `(u, v)`
/// as texture coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { x, y, u, v }
    }
}

/// Stroke geometry parameters shared by joins and caps.
#[derive(Copy, Clone)]
struct Sides {
    lw: f32,
    rw: f32,
    lu: f32,
    ru: f32,
}

impl PathCache {
    /// Classifies every point's join and each path's convexity for a
    /// stroke of half width `w`.
    fn calculate_joins(&mut self, w: f32, join: Join, miter_limit: f32) {
        let iw = if w > 0.0 { 1.0 / w } else { 0.0 };
        let Self { points, paths, .. } = self;

        for path in paths.iter_mut() {
            let pts = &mut points[path.first..path.first + path.count];
            let n = pts.len();
            let mut nleft = 0;
            path.bevel_count = 0;

            for i in 0..n {
                let p0 = pts[(i + n - 1) % n];
                let p1 = &mut pts[i];
                let dlx0 = p0.dy;
                let dly0 = -p0.dx;
                let dlx1 = p1.dy;
                let dly1 = -p1.dx;

                // Calculate extrusions.
                p1.dmx = (dlx0 + dlx1) * 0.5;
                p1.dmy = (dly0 + dly1) * 0.5;
                let dmr2 = p1.dmx * p1.dmx + p1.dmy * p1.dmy;
                if dmr2 > 0.000_001 {
                    let scale = (1.0 / dmr2).min(600.0);
                    p1.dmx *= scale;
                    p1.dmy *= scale;
                }

                // Clear flags, but keep the corner.
                p1.flags.left = false;
                p1.flags.bevel = false;
                p1.flags.inner_bevel = false;

                if math::cross(p0.dx, p0.dy, p1.dx, p1.dy) > 0.0 {
                    nleft += 1;
                    p1.flags.left = true;
                }

                let limit = (p0.len.min(p1.len) * iw).max(1.01);
                if dmr2 * limit * limit < 1.0 {
                    p1.flags.inner_bevel = true;
                }

                if p1.flags.corner
                    && (dmr2 * miter_limit * miter_limit < 1.0
                        || matches!(join, Join::Bevel | Join::Round))
                {
                    p1.flags.bevel = true;
                }

                if p1.flags.bevel || p1.flags.inner_bevel {
                    path.bevel_count += 1;
                }
            }

            path.convex = nleft == n;
        }
    }

    /// Expands the flattened paths for filling.
    ///
    /// With `w > 0` the fan is inset by half the fringe width of `tol` and
    /// an antialiasing fringe strip of width `w` is emitted around it.
    pub fn expand_fill(
        &mut self,
        w: f32,
        join: Join,
        miter_limit: f32,
        tol: &Tolerances,
    ) -> Result<(), AllocError> {
        let aa = tol.fringe_width;
        let fringe = w > 0.0;
        self.calculate_joins(w, join, miter_limit);

        let mut cverts = 0;
        for path in &self.paths {
            cverts += path.count + path.bevel_count + 1;
            if fringe {
                cverts += (path.count + path.bevel_count * 5 + 1) * 2;
            }
        }
        self.verts.clear();
        alloc::reserve(&mut self.verts, "vertex", cverts)?;

        let convex = self.paths.len() == 1 && self.paths[0].convex;
        let Self {
            points,
            paths,
            verts,
            ..
        } = self;

        for path in paths.iter_mut() {
            let pts = &points[path.first..path.first + path.count];
            let n = pts.len();
            let woff = 0.5 * aa;

            let start = verts.len();
            if n >= 3 {
                if fringe {
                    for i in 0..n {
                        let p0 = &pts[(i + n - 1) % n];
                        let p1 = &pts[i];
                        if p1.flags.bevel && !p1.flags.left {
                            let (dlx0, dly0) = (p0.dy, -p0.dx);
                            let (dlx1, dly1) = (p1.dy, -p1.dx);
                            verts.push(Vertex::new(
                                p1.x + dlx0 * woff,
                                p1.y + dly0 * woff,
                                0.5,
                                1.0,
                            ));
                            verts.push(Vertex::new(
                                p1.x + dlx1 * woff,
                                p1.y + dly1 * woff,
                                0.5,
                                1.0,
                            ));
                        } else {
                            verts.push(Vertex::new(
                                p1.x + p1.dmx * woff,
                                p1.y + p1.dmy * woff,
                                0.5,
                                1.0,
                            ));
                        }
                    }
                } else {
                    verts.extend(pts.iter().map(|p| Vertex::new(p.x, p.y, 0.5, 1.0)));
                }
            }
            path.fill = start..verts.len();

            let start = verts.len();
            if fringe && n >= 3 {
                let mut sides = Sides {
                    lw: w + woff,
                    rw: w - woff,
                    lu: 0.0,
                    ru: 1.0,
                };
                // Only half a fringe for convex shapes, so they can be
                // drawn without stenciling.
                if convex {
                    sides.lw = woff;
                    sides.lu = 0.5;
                }

                for i in 0..n {
                    let p0 = &pts[(i + n - 1) % n];
                    let p1 = &pts[i];
                    if p1.flags.bevel || p1.flags.inner_bevel {
                        bevel_join(verts, p0, p1, sides);
                    } else {
                        miter_pair(verts, p1, sides);
                    }
                }
                close_loop(verts, start, sides.lu, sides.ru);
            }
            path.stroke = start..verts.len();
        }
        Ok(())
    }

    /// Expands the flattened paths into stroke strips.
    ///
    /// `w` is half the stroke width and `fringe` the antialiasing width,
    /// zero when antialiasing is disabled.
    pub fn expand_stroke(
        &mut self,
        w: f32,
        fringe: f32,
        cap: Cap,
        join: Join,
        miter_limit: f32,
        tol: &Tolerances,
    ) -> Result<(), AllocError> {
        let aa = fringe;
        let ncap = math::curve_divs(w, PI, tol.tess_tol / 4.0);
        let w = w + aa * 0.5;
        // Without antialiasing the fade gradient is disabled.
        let (u0, u1) = if aa == 0.0 { (0.5, 0.5) } else { (0.0, 1.0) };
        let sides = Sides {
            lw: w,
            rw: w,
            lu: u0,
            ru: u1,
        };
        self.calculate_joins(w, join, miter_limit);

        let mut cverts = 0;
        for path in &self.paths {
            cverts += if join == Join::Round {
                (path.count + path.bevel_count * (ncap + 2) + 1) * 2
            } else {
                (path.count + path.bevel_count * 5 + 1) * 2
            };
            if !path.closed {
                cverts += if cap == Cap::Round {
                    (ncap * 2 + 2) * 2
                } else {
                    (3 + 3) * 2
                };
            }
        }
        self.verts.clear();
        alloc::reserve(&mut self.verts, "vertex", cverts)?;

        let Self {
            points,
            paths,
            verts,
            ..
        } = self;

        for path in paths.iter_mut() {
            let pts = &points[path.first..path.first + path.count];
            let n = pts.len();
            path.fill = verts.len()..verts.len();

            let start = verts.len();
            if n < 2 {
                path.stroke = start..start;
                continue;
            }

            let looped = path.closed;
            let (mut i0, mut i1, s, e) = if looped {
                (n - 1, 0, 0, n)
            } else {
                (0, 1, 1, n - 1)
            };

            if !looped {
                let (dx, dy) = direction(&pts[i0], &pts[i1]);
                match cap {
                    Cap::Butt => butt_cap_start(verts, &pts[i0], dx, dy, w, -aa * 0.5, aa, sides),
                    Cap::Square => butt_cap_start(verts, &pts[i0], dx, dy, w, w - aa, aa, sides),
                    Cap::Round => round_cap_start(verts, &pts[i0], dx, dy, w, ncap, sides),
                }
            }

            for _ in s..e {
                let (p0, p1) = (&pts[i0], &pts[i1]);
                if p1.flags.bevel || p1.flags.inner_bevel {
                    if join == Join::Round {
                        round_join(verts, p0, p1, sides, ncap);
                    } else {
                        bevel_join(verts, p0, p1, sides);
                    }
                } else {
                    miter_pair(verts, p1, sides);
                }
                i0 = i1;
                i1 += 1;
            }

            if looped {
                close_loop(verts, start, u0, u1);
            } else {
                let (dx, dy) = direction(&pts[i0], &pts[i1]);
                match cap {
                    Cap::Butt => butt_cap_end(verts, &pts[i1], dx, dy, w, -aa * 0.5, aa, sides),
                    Cap::Square => butt_cap_end(verts, &pts[i1], dx, dy, w, w - aa, aa, sides),
                    Cap::Round => round_cap_end(verts, &pts[i1], dx, dy, w, ncap, sides),
                }
            }
            path.stroke = start..verts.len();
        }
        Ok(())
    }
}

fn direction(p0: &Point, p1: &Point) -> (f32, f32) {
    let (mut dx, mut dy) = (p1.x - p0.x, p1.y - p0.y);
    math::normalize(&mut dx, &mut dy);
    (dx, dy)
}

fn miter_pair(dst: &mut Vec<Vertex>, p1: &Point, s: Sides) {
    dst.push(Vertex::new(
        p1.x + p1.dmx * s.lw,
        p1.y + p1.dmy * s.lw,
        s.lu,
        1.0,
    ));
    dst.push(Vertex::new(
        p1.x - p1.dmx * s.rw,
        p1.y - p1.dmy * s.rw,
        s.ru,
        1.0,
    ));
}

/// Repeats the first two vertices of the strip starting at `start`.
fn close_loop(dst: &mut Vec<Vertex>, start: usize, lu: f32, ru: f32) {
    let (Some(&v0), Some(&v1)) = (dst.get(start), dst.get(start + 1)) else {
        return;
    };
    dst.push(Vertex::new(v0.x, v0.y, lu, 1.0));
    dst.push(Vertex::new(v1.x, v1.y, ru, 1.0));
}

/// Offset end points of the two edges meeting at `p1`, either along each
/// edge normal (`bevel`) or both at the miter point.
fn choose_bevel(bevel: bool, p0: &Point, p1: &Point, w: f32) -> [f32; 4] {
    if bevel {
        [
            p1.x + p0.dy * w,
            p1.y - p0.dx * w,
            p1.x + p1.dy * w,
            p1.y - p1.dx * w,
        ]
    } else {
        [
            p1.x + p1.dmx * w,
            p1.y + p1.dmy * w,
            p1.x + p1.dmx * w,
            p1.y + p1.dmy * w,
        ]
    }
}

fn round_join(dst: &mut Vec<Vertex>, p0: &Point, p1: &Point, s: Sides, ncap: usize) {
    let Sides { lw, rw, lu, ru } = s;
    let (dlx0, dly0) = (p0.dy, -p0.dx);
    let (dlx1, dly1) = (p1.dy, -p1.dx);
    let steps = |da: f32| ((da / PI * ncap as f32).ceil() as usize).clamp(2, ncap.max(2));

    if p1.flags.left {
        let [lx0, ly0, lx1, ly1] = choose_bevel(p1.flags.inner_bevel, p0, p1, lw);
        let a0 = (-dly0).atan2(-dlx0);
        let mut a1 = (-dly1).atan2(-dlx1);
        if a1 > a0 {
            a1 -= PI * 2.0;
        }

        dst.push(Vertex::new(lx0, ly0, lu, 1.0));
        dst.push(Vertex::new(p1.x - dlx0 * rw, p1.y - dly0 * rw, ru, 1.0));

        let n = steps(a0 - a1);
        for i in 0..n {
            let u = i as f32 / (n - 1) as f32;
            let a = a0 + u * (a1 - a0);
            let rx = p1.x + a.cos() * rw;
            let ry = p1.y + a.sin() * rw;
            dst.push(Vertex::new(p1.x, p1.y, 0.5, 1.0));
            dst.push(Vertex::new(rx, ry, ru, 1.0));
        }

        dst.push(Vertex::new(lx1, ly1, lu, 1.0));
        dst.push(Vertex::new(p1.x - dlx1 * rw, p1.y - dly1 * rw, ru, 1.0));
    } else {
        let [rx0, ry0, rx1, ry1] = choose_bevel(p1.flags.inner_bevel, p0, p1, -rw);
        let a0 = dly0.atan2(dlx0);
        let mut a1 = dly1.atan2(dlx1);
        if a1 < a0 {
            a1 += PI * 2.0;
        }

        dst.push(Vertex::new(p1.x + dlx0 * rw, p1.y + dly0 * rw, lu, 1.0));
        dst.push(Vertex::new(rx0, ry0, ru, 1.0));

        let n = steps(a1 - a0);
        for i in 0..n {
            let u = i as f32 / (n - 1) as f32;
            let a = a0 + u * (a1 - a0);
            let lx = p1.x + a.cos() * lw;
            let ly = p1.y + a.sin() * lw;
            dst.push(Vertex::new(lx, ly, lu, 1.0));
            dst.push(Vertex::new(p1.x, p1.y, 0.5, 1.0));
        }

        dst.push(Vertex::new(p1.x + dlx1 * rw, p1.y + dly1 * rw, lu, 1.0));
        dst.push(Vertex::new(rx1, ry1, ru, 1.0));
    }
}

fn bevel_join(dst: &mut Vec<Vertex>, p0: &Point, p1: &Point, s: Sides) {
    let Sides { lw, rw, lu, ru } = s;
    let (dlx0, dly0) = (p0.dy, -p0.dx);
    let (dlx1, dly1) = (p1.dy, -p1.dx);

    if p1.flags.left {
        let [lx0, ly0, lx1, ly1] = choose_bevel(p1.flags.inner_bevel, p0, p1, lw);

        dst.push(Vertex::new(lx0, ly0, lu, 1.0));
        dst.push(Vertex::new(p1.x - dlx0 * rw, p1.y - dly0 * rw, ru, 1.0));

        if p1.flags.bevel {
            dst.push(Vertex::new(lx0, ly0, lu, 1.0));
            dst.push(Vertex::new(p1.x - dlx0 * rw, p1.y - dly0 * rw, ru, 1.0));

            dst.push(Vertex::new(lx1, ly1, lu, 1.0));
            dst.push(Vertex::new(p1.x - dlx1 * rw, p1.y - dly1 * rw, ru, 1.0));
        } else {
            let rx0 = p1.x - p1.dmx * rw;
            let ry0 = p1.y - p1.dmy * rw;

            dst.push(Vertex::new(p1.x, p1.y, 0.5, 1.0));
            dst.push(Vertex::new(p1.x - dlx0 * rw, p1.y - dly0 * rw, ru, 1.0));

            dst.push(Vertex::new(rx0, ry0, ru, 1.0));
            dst.push(Vertex::new(rx0, ry0, ru, 1.0));

            dst.push(Vertex::new(p1.x, p1.y, 0.5, 1.0));
            dst.push(Vertex::new(p1.x - dlx1 * rw, p1.y - dly1 * rw, ru, 1.0));
        }

        dst.push(Vertex::new(lx1, ly1, lu, 1.0));
        dst.push(Vertex::new(p1.x - dlx1 * rw, p1.y - dly1 * rw, ru, 1.0));
    } else {
        let [rx0, ry0, rx1, ry1] = choose_bevel(p1.flags.inner_bevel, p0, p1, -rw);

        dst.push(Vertex::new(p1.x + dlx0 * lw, p1.y + dly0 * lw, lu, 1.0));
        dst.push(Vertex::new(rx0, ry0, ru, 1.0));

        if p1.flags.bevel {
            dst.push(Vertex::new(p1.x + dlx0 * lw, p1.y + dly0 * lw, lu, 1.0));
            dst.push(Vertex::new(rx0, ry0, ru, 1.0));

            dst.push(Vertex::new(p1.x + dlx1 * lw, p1.y + dly1 * lw, lu, 1.0));
            dst.push(Vertex::new(rx1, ry1, ru, 1.0));
        } else {
            let lx0 = p1.x + p1.dmx * lw;
            let ly0 = p1.y + p1.dmy * lw;

            dst.push(Vertex::new(p1.x + dlx0 * lw, p1.y + dly0 * lw, lu, 1.0));
            dst.push(Vertex::new(p1.x, p1.y, 0.5, 1.0));

            dst.push(Vertex::new(lx0, ly0, lu, 1.0));
            dst.push(Vertex::new(lx0, ly0, lu, 1.0));

            dst.push(Vertex::new(p1.x + dlx1 * lw, p1.y + dly1 * lw, lu, 1.0));
            dst.push(Vertex::new(p1.x, p1.y, 0.5, 1.0));
        }

        dst.push(Vertex::new(p1.x + dlx1 * lw, p1.y + dly1 * lw, lu, 1.0));
        dst.push(Vertex::new(rx1, ry1, ru, 1.0));
    }
}

/// Flat cap at the start of an open subpath, offset by `d` along the
/// direction of travel, with an `aa` wide fade.
#[allow(clippy::too_many_arguments, reason = "cap geometry")]
fn butt_cap_start(
    dst: &mut Vec<Vertex>,
    p: &Point,
    dx: f32,
    dy: f32,
    w: f32,
    d: f32,
    aa: f32,
    s: Sides,
) {
    let px = p.x - dx * d;
    let py = p.y - dy * d;
    let (dlx, dly) = (dy, -dx);
    dst.push(Vertex::new(px + dlx * w - dx * aa, py + dly * w - dy * aa, s.lu, 0.0));
    dst.push(Vertex::new(px - dlx * w - dx * aa, py - dly * w - dy * aa, s.ru, 0.0));
    dst.push(Vertex::new(px + dlx * w, py + dly * w, s.lu, 1.0));
    dst.push(Vertex::new(px - dlx * w, py - dly * w, s.ru, 1.0));
}

#[allow(clippy::too_many_arguments, reason = "cap geometry")]
fn butt_cap_end(
    dst: &mut Vec<Vertex>,
    p: &Point,
    dx: f32,
    dy: f32,
    w: f32,
    d: f32,
    aa: f32,
    s: Sides,
) {
    let px = p.x + dx * d;
    let py = p.y + dy * d;
    let (dlx, dly) = (dy, -dx);
    dst.push(Vertex::new(px + dlx * w, py + dly * w, s.lu, 1.0));
    dst.push(Vertex::new(px - dlx * w, py - dly * w, s.ru, 1.0));
    dst.push(Vertex::new(px + dlx * w + dx * aa, py + dly * w + dy * aa, s.lu, 0.0));
    dst.push(Vertex::new(px - dlx * w + dx * aa, py - dly * w + dy * aa, s.ru, 0.0));
}

fn round_cap_start(
    dst: &mut Vec<Vertex>,
    p: &Point,
    dx: f32,
    dy: f32,
    w: f32,
    ncap: usize,
    s: Sides,
) {
    let (px, py) = (p.x, p.y);
    let (dlx, dly) = (dy, -dx);
    for i in 0..ncap {
        let a = i as f32 / (ncap - 1) as f32 * PI;
        let (ay, ax) = a.sin_cos();
        let (ax, ay) = (ax * w, ay * w);
        dst.push(Vertex::new(px - dlx * ax - dx * ay, py - dly * ax - dy * ay, s.lu, 1.0));
        dst.push(Vertex::new(px, py, 0.5, 1.0));
    }
    dst.push(Vertex::new(px + dlx * w, py + dly * w, s.lu, 1.0));
    dst.push(Vertex::new(px - dlx * w, py - dly * w, s.ru, 1.0));
}

fn round_cap_end(
    dst: &mut Vec<Vertex>,
    p: &Point,
    dx: f32,
    dy: f32,
    w: f32,
    ncap: usize,
    s: Sides,
) {
    let (px, py) = (p.x, p.y);
    let (dlx, dly) = (dy, -dx);
    dst.push(Vertex::new(px + dlx * w, py + dly * w, s.lu, 1.0));
    dst.push(Vertex::new(px - dlx * w, py - dly * w, s.ru, 1.0));
    for i in 0..ncap {
        let a = i as f32 / (ncap - 1) as f32 * PI;
        let (ay, ax) = a.sin_cos();
        let (ax, ay) = (ax * w, ay * w);
        dst.push(Vertex::new(px, py, 0.5, 1.0));
        dst.push(Vertex::new(px - dlx * ax + dx * ay, py - dly * ax + dy * ay, s.lu, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use peniko::kurbo::{Cap, Join};

    use crate::{PathCache, PathCommands, PathEncoder, Tolerances, Transform};

    fn cache(f: impl FnOnce(&mut PathEncoder<'_>)) -> (PathCache, Tolerances) {
        let tol = Tolerances::default();
        let mut commands = PathCommands::new();
        f(&mut commands.encoder(Transform::IDENTITY, tol.dist_tol));
        let mut cache = PathCache::new();
        cache.flatten(&commands, &tol).unwrap();
        (cache, tol)
    }

    #[test]
    fn rect_fill_without_fringe() {
        let (mut cache, tol) = cache(|p| p.rect(10.0, 10.0, 100.0, 50.0));
        cache.expand_fill(0.0, Join::Miter, 1.2, &tol).unwrap();
        let path = &cache.paths()[0];
        assert!(path.convex);
        assert_eq!(cache.fill_vertices(path).len(), 4);
        assert!(cache.stroke_vertices(path).is_empty());
    }

    #[test]
    fn rect_fill_with_fringe() {
        let (mut cache, tol) = cache(|p| p.rect(10.0, 10.0, 100.0, 50.0));
        cache
            .expand_fill(tol.fringe_width, Join::Miter, 3.6, &tol)
            .unwrap();
        let path = &cache.paths()[0];
        assert_eq!(path.bevel_count, 0);
        assert_eq!(cache.fill_vertices(path).len(), 4);
        assert_eq!(cache.stroke_vertices(path).len(), 10);
        // Convex fringe starts halfway faded.
        assert_eq!(cache.stroke_vertices(path)[0].u, 0.5);
    }

    #[test]
    fn degenerate_fill_is_empty() {
        let (mut cache, tol) = cache(|p| {
            p.move_to(0.0, 0.0);
            p.line_to(10.0, 0.0);
        });
        cache.expand_fill(1.0, Join::Miter, 3.6, &tol).unwrap();
        let path = &cache.paths()[0];
        assert!(cache.fill_vertices(path).is_empty());
        assert!(cache.stroke_vertices(path).is_empty());
    }

    #[test]
    fn closed_stroke_loops_back() {
        let (mut cache, tol) = cache(|p| p.rect(0.0, 0.0, 10.0, 10.0));
        cache
            .expand_stroke(2.0, 1.0, Cap::Butt, Join::Miter, 10.0, &tol)
            .unwrap();
        let path = &cache.paths()[0];
        let verts = cache.stroke_vertices(path);
        assert_eq!(verts.len(), 4 * 2 + 2);
        assert_eq!([verts[8].x, verts[8].y], [verts[0].x, verts[0].y]);
        assert_eq!([verts[9].x, verts[9].y], [verts[1].x, verts[1].y]);
    }

    #[test]
    fn round_cap_vertex_count() {
        let (mut cache, tol) = cache(|p| {
            p.move_to(0.0, 0.0);
            p.line_to(100.0, 0.0);
        });
        cache
            .expand_stroke(5.0, 1.0, Cap::Round, Join::Miter, 10.0, &tol)
            .unwrap();
        let ncap = crate::math::curve_divs(5.0, std::f32::consts::PI, tol.tess_tol / 4.0);
        let path = &cache.paths()[0];
        assert_eq!(cache.stroke_vertices(path).len(), 2 * (ncap * 2 + 2));
    }

    #[test]
    fn round_join_emits_fan() {
        let (mut cache, tol) = cache(|p| {
            p.move_to(0.0, 0.0);
            p.line_to(50.0, 0.0);
            p.line_to(50.0, 50.0);
        });
        cache
            .expand_stroke(5.0, 0.0, Cap::Butt, Join::Round, 10.0, &tol)
            .unwrap();
        let path = &cache.paths()[0];
        assert!(cache.points(path)[1].flags.bevel);
        let verts = cache.stroke_vertices(path);
        assert!(verts.len() > 4 + 4 + 2);
        // No antialiasing: fade disabled.
        assert!(verts.iter().all(|v| v.u == 0.5));
    }
}
