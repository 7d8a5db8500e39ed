// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nvg tests.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
#![allow(
    missing_debug_implementations,
    unreachable_pub,
    missing_docs,
    clippy::missing_assert_message,
    clippy::print_stderr,
    clippy::allow_attributes_without_reason
)]

use anyhow::{bail, Result};
use nvg::wgpu::{
    self, BufferDescriptor, BufferUsages, CommandEncoderDescriptor, Extent3d, TexelCopyBufferInfo,
    TextureDescriptor, TextureFormat, TextureUsages,
};
use nvg::{Context, ContextOptions, HeadlessBackend, WgpuBackend};
// Used by the integration tests.
use nvg_encoding as _;

/// A context recording into a [`HeadlessBackend`].
pub fn headless(edge_antialias: bool) -> Context<HeadlessBackend> {
    Context::new(HeadlessBackend::new(), ContextOptions { edge_antialias })
}

/// Rendered RGBA8 pixels, tightly packed.
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Image {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let start = ((y * self.width + x) * 4) as usize;
        let mut px = [0; 4];
        px.copy_from_slice(&self.data[start..start + 4]);
        px
    }
}

pub struct TestParams {
    pub width: u32,
    pub height: u32,
    pub options: ContextOptions,
}

impl TestParams {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            options: ContextOptions::default(),
        }
    }
}

pub fn render_sync(
    params: &TestParams,
    draw: impl FnOnce(&mut Context<WgpuBackend>) -> Result<(), nvg::Error>,
) -> Result<Option<Image>> {
    pollster::block_on(render(params, draw))
}

/// Renders one frame over an opaque black background and reads it back.
///
/// Returns `None` when no adapter is available.
pub async fn render(
    params: &TestParams,
    draw: impl FnOnce(&mut Context<WgpuBackend>) -> Result<(), nvg::Error>,
) -> Result<Option<Image>> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let Some(adapter) = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
    else {
        eprintln!("No compatible adapter found, skipping");
        return Ok(None);
    };
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor::default(), None)
        .await?;

    let (width, height) = (params.width, params.height);
    let size = Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let target = device.create_texture(&TextureDescriptor {
        label: Some("Target texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TextureFormat::Rgba8Unorm,
        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let background: Vec<u8> = [0, 0, 0, 255].repeat((width * height) as usize);
    queue.write_texture(
        target.as_image_copy(),
        &background,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: None,
        },
        size,
    );

    let mut backend = WgpuBackend::new(device, queue, TextureFormat::Rgba8Unorm);
    backend.set_target(
        target.create_view(&wgpu::TextureViewDescriptor::default()),
        width,
        height,
    );
    let mut ctx = Context::new(backend, params.options);
    ctx.begin_frame(width as f32, height as f32, 1.0);
    draw(&mut ctx)?;
    ctx.end_frame()?;

    let backend = ctx.into_backend();
    let (device, queue) = (backend.device(), backend.queue());
    let padded_byte_width = (width * 4).next_multiple_of(256);
    let buffer = device.create_buffer(&BufferDescriptor {
        label: Some("val"),
        size: u64::from(padded_byte_width) * u64::from(height),
        usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
        label: Some("Copy out buffer"),
    });
    encoder.copy_texture_to_buffer(
        target.as_image_copy(),
        TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_byte_width),
                rows_per_image: None,
            },
        },
        size,
    );
    queue.submit([encoder.finish()]);
    let buf_slice = buffer.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    buf_slice.map_async(wgpu::MapMode::Read, move |v| {
        let _ = sender.send(v);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    match receiver.receive().await {
        Some(result) => result?,
        None => bail!("channel was closed"),
    }
    let mapped = buf_slice.get_mapped_range();
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for row in 0..height {
        let start = (row * padded_byte_width) as usize;
        data.extend(&mapped[start..start + (width * 4) as usize]);
    }
    drop(mapped);
    buffer.unmap();
    Ok(Some(Image {
        width,
        height,
        data,
    }))
}
