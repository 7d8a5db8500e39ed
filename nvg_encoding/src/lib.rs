// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path recording, flattening and expansion into triangle geometry.

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
    single_use_lifetimes,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    clippy::missing_panics_doc,
    clippy::shadow_unrelated,
    reason = "Deferred"
)]

pub mod alloc;
mod config;
pub mod expand;
pub mod flatten;
pub mod math;
pub mod paint;
pub mod path;

pub use alloc::AllocError;
pub use config::Tolerances;
pub use expand::Vertex;
pub use flatten::{CachePath, PathCache, Point, PointFlags, MAX_TESSELLATION_LEVEL};
pub use math::Transform;
pub use paint::{ImageFlags, ImageId, Paint, PaintParams, Scissor};
pub use path::{Commands, PathCommand, PathCommands, PathEncoder, PathTag, Winding, KAPPA90};
