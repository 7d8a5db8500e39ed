// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shader sources.

/// WGSL source of the fill shader, with `vs_main` and `fs_main` entry points.
///
/// Bind group 0 holds the viewport size (binding 0) and the
/// [`FragUniforms`](crate::batch::FragUniforms) of the draw at a dynamic
/// offset (binding 1). Bind group 1 holds the paint texture and its sampler.
pub const FILL_SHADER: &str = include_str!("../shader/fill.wgsl");

#[cfg(test)]
mod tests {
    use super::FILL_SHADER;

    #[test]
    fn uniform_block_matches_layout() {
        // Field order of `FragUniforms` as declared in WGSL.
        let fields = [
            "scissor_mat",
            "paint_mat",
            "inner_col",
            "outer_col",
            "scissor_ext",
            "scissor_scale",
            "extent",
            "radius",
            "feather",
            "stroke_mult",
            "tex_type",
            "kind",
        ];
        let block = FILL_SHADER
            .split("struct FragUniforms {")
            .nth(1)
            .and_then(|rest| rest.split('}').next())
            .unwrap();
        let declared: Vec<_> = block
            .lines()
            .filter_map(|line| line.trim().split(':').next())
            .filter(|name| !name.is_empty() && !name.starts_with('_'))
            .collect();
        assert_eq!(declared, fields);
    }
}
