// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::f32::consts::PI;
use std::ops::Mul;

use bytemuck::{Pod, Zeroable};
use peniko::kurbo;

/// Affine transformation matrix.
///
/// The coefficients follow the `[a b c d e f]` convention: a point `(x, y)`
/// maps to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// 2x2 matrix.
    pub matrix: [f32; 4],
    /// Translation.
    pub translation: [f32; 2],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        matrix: [1.0, 0.0, 0.0, 1.0],
        translation: [0.0; 2],
    };

    /// Creates a transform from the six `[a b c d e f]` coefficients.
    pub const fn new(coeffs: [f32; 6]) -> Self {
        Self {
            matrix: [coeffs[0], coeffs[1], coeffs[2], coeffs[3]],
            translation: [coeffs[4], coeffs[5]],
        }
    }

    /// Returns the six `[a b c d e f]` coefficients.
    pub const fn coeffs(&self) -> [f32; 6] {
        [
            self.matrix[0],
            self.matrix[1],
            self.matrix[2],
            self.matrix[3],
            self.translation[0],
            self.translation[1],
        ]
    }

    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::new([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    /// Rotation by `angle` radians.
    pub fn rotate(angle: f32) -> Self {
        let (sn, cs) = angle.sin_cos();
        Self::new([cs, sn, -sn, cs, 0.0, 0.0])
    }

    /// Skew along the x axis by `angle` radians.
    pub fn skew_x(angle: f32) -> Self {
        Self::new([1.0, 0.0, angle.tan(), 1.0, 0.0, 0.0])
    }

    /// Skew along the y axis by `angle` radians.
    pub fn skew_y(angle: f32) -> Self {
        Self::new([1.0, angle.tan(), 0.0, 1.0, 0.0, 0.0])
    }

    /// Returns a transform that applies `self` first, then `outer`.
    #[must_use]
    pub fn then(self, outer: Self) -> Self {
        outer * self
    }

    /// Returns the inverse of the transform.
    ///
    /// Near-singular transforms (`|det| < 1e-6`) invert to the identity.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let t = self.coeffs().map(f64::from);
        let det = t[0] * t[3] - t[2] * t[1];
        if det.abs() < 1e-6 {
            return Self::IDENTITY;
        }
        let invdet = 1.0 / det;
        Self::new(
            [
                t[3] * invdet,
                -t[1] * invdet,
                -t[2] * invdet,
                t[0] * invdet,
                (t[2] * t[5] - t[3] * t[4]) * invdet,
                (t[1] * t[4] - t[0] * t[5]) * invdet,
            ]
            .map(|x| x as f32),
        )
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> [f32; 2] {
        let m = &self.matrix;
        [
            x * m[0] + y * m[2] + self.translation[0],
            x * m[1] + y * m[3] + self.translation[1],
        ]
    }

    /// Average of the lengths of the two basis vectors.
    pub fn average_scale(&self) -> f32 {
        let m = &self.matrix;
        let sx = (m[0] * m[0] + m[2] * m[2]).sqrt();
        let sy = (m[1] * m[1] + m[3] * m[3]).sqrt();
        (sx + sy) * 0.5
    }

    /// Expands the transform into three `vec4` columns as laid out in
    /// uniform buffers.
    pub fn to_mat3x4(&self) -> [f32; 12] {
        let t = self.coeffs();
        [
            t[0], t[1], 0.0, 0.0, //
            t[2], t[3], 0.0, 0.0, //
            t[4], t[5], 1.0, 0.0,
        ]
    }

    /// Creates a transform from a kurbo affine matrix.
    pub fn from_kurbo(transform: &kurbo::Affine) -> Self {
        let c = transform.as_coeffs().map(|x| x as f32);
        Self::new(c)
    }

    /// Converts the transform to a kurbo affine matrix.
    pub fn to_kurbo(&self) -> kurbo::Affine {
        kurbo::Affine::new(self.coeffs().map(f64::from))
    }
}

impl Mul for Transform {
    type Output = Self;

    /// Composes two transforms, applying `other` first.
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self {
            matrix: [
                self.matrix[0] * other.matrix[0] + self.matrix[2] * other.matrix[1],
                self.matrix[1] * other.matrix[0] + self.matrix[3] * other.matrix[1],
                self.matrix[0] * other.matrix[2] + self.matrix[2] * other.matrix[3],
                self.matrix[1] * other.matrix[2] + self.matrix[3] * other.matrix[3],
            ],
            translation: [
                self.matrix[0] * other.translation[0]
                    + self.matrix[2] * other.translation[1]
                    + self.translation[0],
                self.matrix[1] * other.translation[0]
                    + self.matrix[3] * other.translation[1]
                    + self.translation[1],
            ],
        }
    }
}

pub fn point_to_f32(point: kurbo::Point) -> [f32; 2] {
    [point.x as f32, point.y as f32]
}

/// Normalizes `(x, y)` in place and returns its original length.
///
/// Vectors shorter than `1e-6` are left untouched.
pub fn normalize(x: &mut f32, y: &mut f32) -> f32 {
    let d = (*x * *x + *y * *y).sqrt();
    if d > 1e-6 {
        let id = 1.0 / d;
        *x *= id;
        *y *= id;
    }
    d
}

pub fn cross(dx0: f32, dy0: f32, dx1: f32, dy1: f32) -> f32 {
    dx1 * dy0 - dx0 * dy1
}

pub fn pt_equals(x1: f32, y1: f32, x2: f32, y2: f32, tol: f32) -> bool {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy < tol * tol
}

/// Squared distance from `(x, y)` to the segment `(px, py)`-`(qx, qy)`.
pub fn dist_pt_seg(x: f32, y: f32, px: f32, py: f32, qx: f32, qy: f32) -> f32 {
    let pqx = qx - px;
    let pqy = qy - py;
    let dx = x - px;
    let dy = y - py;
    let d = pqx * pqx + pqy * pqy;
    let mut t = pqx * dx + pqy * dy;
    if d > 0.0 {
        t /= d;
    }
    let t = t.clamp(0.0, 1.0);
    let dx = px + t * pqx - x;
    let dy = py + t * pqy - y;
    dx * dx + dy * dy
}

/// Twice the signed area of the triangle `a`, `b`, `c`.
pub fn tri_area2(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    let abx = b[0] - a[0];
    let aby = b[1] - a[1];
    let acx = c[0] - a[0];
    let acy = c[1] - a[1];
    acx * aby - abx * acy
}

/// Signed area of a polygon. Counter-clockwise polygons (in a y-down
/// coordinate system) have positive area.
pub fn poly_area(pts: impl IntoIterator<Item = [f32; 2]>) -> f32 {
    let mut pts = pts.into_iter();
    let Some(a) = pts.next() else {
        return 0.0;
    };
    let Some(mut b) = pts.next() else {
        return 0.0;
    };
    let mut area = 0.0;
    for c in pts {
        area += tri_area2(a, b, c);
        b = c;
    }
    area * 0.5
}

/// Number of segments needed to approximate an arc of `arc` radians with
/// radius `r` within tolerance `tol`.
pub fn curve_divs(r: f32, arc: f32, tol: f32) -> usize {
    let da = (r / (r + tol)).acos() * 2.0;
    let divs = (arc / da).ceil();
    if divs.is_finite() && divs > 2.0 {
        divs as usize
    } else {
        2
    }
}

pub fn deg_to_rad(deg: f32) -> f32 {
    deg / 180.0 * PI
}

pub fn rad_to_deg(rad: f32) -> f32 {
    rad / PI * 180.0
}

#[cfg(test)]
mod tests {
    use super::{curve_divs, dist_pt_seg, normalize, poly_area, Transform};

    fn assert_close(a: Transform, b: Transform) {
        for (x, y) in a.coeffs().iter().zip(b.coeffs()) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn inverse_round_trip() {
        let t = Transform::translate(10.0, -4.0) * Transform::rotate(0.3) * Transform::scale(2.0, 3.0);
        assert_close(t * t.inverse(), Transform::IDENTITY);
        assert_close(t.inverse() * t, Transform::IDENTITY);
    }

    #[test]
    fn singular_inverse_is_identity() {
        let t = Transform::scale(0.0, 5.0);
        assert_eq!(t.inverse(), Transform::IDENTITY);
    }

    #[test]
    fn mul_applies_right_operand_first() {
        let t = Transform::translate(5.0, 0.0) * Transform::scale(2.0, 2.0);
        assert_eq!(t.transform_point(1.0, 1.0), [7.0, 2.0]);
        let t = Transform::translate(5.0, 0.0).then(Transform::scale(2.0, 2.0));
        assert_eq!(t.transform_point(1.0, 1.0), [12.0, 2.0]);
    }

    #[test]
    fn kurbo_round_trip() {
        let t = Transform::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(Transform::from_kurbo(&t.to_kurbo()), t);
    }

    #[test]
    fn normalize_short_vector_is_noop() {
        let (mut x, mut y) = (1e-8, 0.0);
        let len = normalize(&mut x, &mut y);
        assert!(len < 1e-6);
        assert_eq!((x, y), (1e-8, 0.0));
        let (mut x, mut y) = (3.0, 4.0);
        assert_eq!(normalize(&mut x, &mut y), 5.0);
        assert!((x - 0.6).abs() < 1e-6 && (y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn segment_distance() {
        assert_eq!(dist_pt_seg(5.0, 3.0, 0.0, 0.0, 10.0, 0.0), 9.0);
        assert_eq!(dist_pt_seg(-2.0, 0.0, 0.0, 0.0, 10.0, 0.0), 4.0);
    }

    #[test]
    fn polygon_area_sign() {
        let ccw = [[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]];
        assert_eq!(poly_area(ccw), 100.0);
        assert_eq!(poly_area(ccw.into_iter().rev()), -100.0);
    }

    #[test]
    fn curve_divs_minimum() {
        assert_eq!(curve_divs(0.0, std::f32::consts::PI, 0.25), 2);
        assert!(curve_divs(100.0, std::f32::consts::PI, 0.25) > 10);
    }
}
