// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renders small frames on the GPU and counts pixels.

// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
#![allow(
    clippy::missing_assert_message,
    clippy::allow_attributes_without_reason
)]

use nvg::peniko::Color;
use nvg::{ContextOptions, Winding};
use nvg_tests::{Image, TestParams};

/// Counts red pixels, panicking on anything that is neither red nor black.
fn count_red(image: &Image) -> usize {
    let mut red_count = 0;
    for pixel in image.data.chunks_exact(4) {
        let &[r, g, b, a] = pixel else { unreachable!() };
        assert_eq!((g, b, a), (0, 0, 255), "unexpected pixel {pixel:?}");
        if r > 127 {
            red_count += 1;
        }
    }
    red_count
}

#[test]
#[cfg_attr(skip_gpu_tests, ignore)]
fn simple_square() {
    let params = TestParams::new(150, 150);
    let Some(image) = nvg_tests::render_sync(&params, |ctx| {
        ctx.rect(50.0, 50.0, 50.0, 50.0);
        ctx.fill_color(Color::rgba8(255, 0, 0, 255));
        ctx.fill()
    })
    .unwrap() else {
        return;
    };
    assert_eq!(count_red(&image), 50 * 50);
    assert_eq!(image.pixel(75, 75), [255, 0, 0, 255]);
    assert_eq!(image.pixel(10, 10), [0, 0, 0, 255]);
}

#[test]
#[cfg_attr(skip_gpu_tests, ignore)]
fn empty_frame_keeps_background() {
    let params = TestParams::new(64, 64);
    let Some(image) = nvg_tests::render_sync(&params, |_| Ok(())).unwrap() else {
        return;
    };
    assert_eq!(count_red(&image), 0);
}

#[test]
#[cfg_attr(skip_gpu_tests, ignore)]
fn concave_fill_uses_stencil() {
    let params = TestParams {
        options: ContextOptions {
            edge_antialias: false,
        },
        ..TestParams::new(150, 150)
    };
    let Some(image) = nvg_tests::render_sync(&params, |ctx| {
        ctx.move_to(50.0, 50.0);
        ctx.line_to(100.0, 50.0);
        ctx.line_to(100.0, 75.0);
        ctx.line_to(75.0, 75.0);
        ctx.line_to(75.0, 100.0);
        ctx.line_to(50.0, 100.0);
        ctx.close_path();
        ctx.fill_color(Color::rgba8(255, 0, 0, 255));
        ctx.fill()
    })
    .unwrap() else {
        return;
    };
    assert_eq!(count_red(&image), 50 * 50 - 25 * 25);
    assert_eq!(image.pixel(90, 90), [0, 0, 0, 255]);
}

#[test]
#[cfg_attr(skip_gpu_tests, ignore)]
fn hole_is_left_unfilled() {
    let params = TestParams {
        options: ContextOptions {
            edge_antialias: false,
        },
        ..TestParams::new(150, 150)
    };
    let Some(image) = nvg_tests::render_sync(&params, |ctx| {
        ctx.rect(50.0, 50.0, 50.0, 50.0);
        ctx.rect(60.0, 60.0, 20.0, 20.0);
        ctx.path_winding(Winding::HOLE);
        ctx.fill_color(Color::rgba8(255, 0, 0, 255));
        ctx.fill()
    })
    .unwrap() else {
        return;
    };
    assert_eq!(count_red(&image), 50 * 50 - 20 * 20);
    assert_eq!(image.pixel(70, 70), [0, 0, 0, 255]);
}
