// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nvg is an immediate-mode 2D vector graphics renderer.
//!
//! Paths are recorded through a [`Context`], flattened and expanded into
//! antialiased triangle geometry on the CPU, and batched into a [`DrawList`]
//! per frame. The list is handed to a [`RenderBackend`], which draws fills
//! with a stencil-then-cover scheme and strokes as triangle strips.
//!
//! [`HeadlessBackend`] keeps textures in memory and records the last flushed
//! list. With the `wgpu` feature enabled, `WgpuBackend` renders with
//! [`wgpu`].
//!
//! # Example
//!
//! ```
//! use nvg::{Context, ContextOptions, HeadlessBackend};
//! use nvg::peniko::Color;
//!
//! let mut ctx = Context::new(HeadlessBackend::new(), ContextOptions::default());
//! ctx.begin_frame(640.0, 480.0, 1.0);
//! ctx.begin_path();
//! ctx.rounded_rect(10.0, 10.0, 200.0, 100.0, 8.0);
//! ctx.fill_color(Color::rgba8(40, 120, 200, 255));
//! ctx.fill()?;
//! ctx.end_frame()?;
//! assert!(!ctx.backend().last_draw_list().is_empty());
//! # Ok::<(), nvg::Error>(())
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    clippy::missing_panics_doc,
    clippy::shadow_unrelated,
    reason = "Deferred"
)]

mod backend;
mod context;
mod headless;
mod recording;
mod shaders;
mod state;

pub mod batch;
#[cfg(feature = "wgpu")]
mod wgpu_engine;

pub use peniko;
pub use peniko::kurbo;

#[cfg(feature = "wgpu")]
pub use wgpu;

pub use nvg_encoding::{
    AllocError, ImageFlags, ImageId, Paint, Scissor, Tolerances, Transform, Vertex, Winding,
};

pub use backend::{RenderBackend, TextureKind};
pub use context::{Context, FrameStats, GlyphQuad};
pub use headless::HeadlessBackend;
pub use recording::{DrawCommand, DrawList, Primitive, StencilMode};
pub use shaders::FILL_SHADER;
pub use state::{DrawState, StateStack, TextAlign, TextStyle, MAX_STATES};
#[cfg(feature = "wgpu")]
pub use wgpu_engine::WgpuBackend;

use thiserror::Error;

/// Errors that can occur in nvg.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A frame buffer could not grow.
    #[error(transparent)]
    OutOfMemory(#[from] AllocError),

    /// The image handle does not name a live texture.
    #[error("Image {0:?} does not exist")]
    InvalidHandle(ImageId),

    /// A frame operation was used outside `begin_frame`/`end_frame`.
    #[error("No frame in progress")]
    FrameNotStarted,

    /// Pixel data does not match the image dimensions.
    #[error("Image data does not match its dimensions")]
    InvalidImageData,

    /// The backend was flushed before a render target was set.
    #[cfg(feature = "wgpu")]
    #[error("No render target set")]
    NoRenderTarget,
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// Options which are set at context creation time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContextOptions {
    /// Whether to expand paths with an antialiasing fringe.
    ///
    /// Without it, fills are not fringed and strokes are drawn with hard
    /// edges, which is preferable when the target is multisampled.
    pub edge_antialias: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            edge_antialias: true,
        }
    }
}
