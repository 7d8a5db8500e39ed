// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Geometric tolerances derived from the device pixel ratio.
///
/// All three scale inversely with the ratio so that the visual error stays
/// below a device pixel at any zoom level.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tolerances {
    /// Flatness threshold for bezier subdivision.
    pub tess_tol: f32,
    /// Distance below which two points are merged.
    pub dist_tol: f32,
    /// Width of the antialiasing fringe.
    pub fringe_width: f32,
    pub device_px_ratio: f32,
}

impl Tolerances {
    /// Ratios that are not finite and positive fall back to 1.
    pub fn from_device_pixel_ratio(ratio: f32) -> Self {
        let ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            log::warn!("invalid device pixel ratio {ratio}, using 1.0");
            1.0
        };
        Self {
            tess_tol: 1.0 / ratio,
            dist_tol: 0.01 / ratio,
            fringe_width: 1.0 / ratio,
            device_px_ratio: ratio,
        }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::from_device_pixel_ratio(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Tolerances;

    #[test]
    fn invalid_ratio_falls_back_to_one() {
        for ratio in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            assert_eq!(Tolerances::from_device_pixel_ratio(ratio), Tolerances::default());
        }
        assert_eq!(Tolerances::from_device_pixel_ratio(2.0).fringe_width, 0.5);
    }
}
