// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render backend on top of [`wgpu`].

use std::collections::HashMap;
use std::num::{NonZeroU32, NonZeroU64};

use nvg_encoding::{ImageFlags, ImageId, Vertex};
use wgpu::{
    BindGroup, BindGroupLayout, BlendState, Buffer, BufferUsages, ColorTargetState, ColorWrites,
    CompareFunction, Device, PipelineCompilationOptions, Queue, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, RenderPipeline, StencilFaceState,
    StencilOperation, StencilState, Texture, TextureFormat, TextureView,
};

use crate::backend::{RenderBackend, TextureKind};
use crate::batch::FragUniforms;
use crate::recording::{DrawList, Primitive, StencilMode};
use crate::{Error, Result, FILL_SHADER};

const STENCIL_FORMAT: TextureFormat = TextureFormat::Stencil8;
const FRAG_SIZE: u64 = size_of::<FragUniforms>() as u64;
const INITIAL_BUFFER_SIZE: u64 = 64 * 1024;

#[derive(Debug)]
struct GpuTexture {
    texture: Texture,
    bind_group: BindGroup,
    kind: TextureKind,
    flags: ImageFlags,
}

#[derive(Debug)]
struct RenderTarget {
    view: TextureView,
    stencil: TextureView,
    width: u32,
    height: u32,
}

/// One pipeline per stencil mode, for triangle lists and triangle strips.
#[derive(Debug)]
struct Pipelines {
    list: [RenderPipeline; 4],
    strip: [RenderPipeline; 4],
}

impl Pipelines {
    const MODES: [StencilMode; 4] = [
        StencilMode::Disabled,
        StencilMode::FillWinding,
        StencilMode::EqualZero,
        StencilMode::NotEqualZeroClear,
    ];

    fn new(device: &Device, format: TextureFormat, layout: &wgpu::PipelineLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("nvg fill shader"),
            source: wgpu::ShaderSource::Wgsl(FILL_SHADER.into()),
        });
        let build = |topology| {
            Self::MODES.map(|mode| create_pipeline(device, &shader, layout, format, mode, topology))
        };
        Self {
            list: build(wgpu::PrimitiveTopology::TriangleList),
            strip: build(wgpu::PrimitiveTopology::TriangleStrip),
        }
    }

    fn get(&self, mode: StencilMode, strip: bool) -> &RenderPipeline {
        let ix = match mode {
            StencilMode::Disabled => 0,
            StencilMode::FillWinding => 1,
            StencilMode::EqualZero => 2,
            StencilMode::NotEqualZeroClear => 3,
        };
        if strip {
            &self.strip[ix]
        } else {
            &self.list[ix]
        }
    }
}

fn stencil_state(mode: StencilMode) -> (StencilState, ColorWrites) {
    let face = |compare, fail_op, pass_op| StencilFaceState {
        compare,
        fail_op,
        depth_fail_op: fail_op,
        pass_op,
    };
    let both = |face: StencilFaceState| StencilState {
        front: face,
        back: face,
        read_mask: 0xff,
        write_mask: 0xff,
    };
    match mode {
        StencilMode::Disabled => (
            StencilState {
                front: StencilFaceState::IGNORE,
                back: StencilFaceState::IGNORE,
                read_mask: 0,
                write_mask: 0,
            },
            ColorWrites::ALL,
        ),
        StencilMode::FillWinding => (
            StencilState {
                front: face(
                    CompareFunction::Always,
                    StencilOperation::Keep,
                    StencilOperation::IncrementWrap,
                ),
                back: face(
                    CompareFunction::Always,
                    StencilOperation::Keep,
                    StencilOperation::DecrementWrap,
                ),
                read_mask: 0xff,
                write_mask: 0xff,
            },
            ColorWrites::empty(),
        ),
        StencilMode::EqualZero => (
            both(face(
                CompareFunction::Equal,
                StencilOperation::Keep,
                StencilOperation::Keep,
            )),
            ColorWrites::ALL,
        ),
        StencilMode::NotEqualZeroClear => (
            both(face(
                CompareFunction::NotEqual,
                StencilOperation::Zero,
                StencilOperation::Zero,
            )),
            ColorWrites::ALL,
        ),
    }
}

fn create_pipeline(
    device: &Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: TextureFormat,
    mode: StencilMode,
    topology: wgpu::PrimitiveTopology,
) -> RenderPipeline {
    let (stencil, write_mask) = stencil_state(mode);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("nvg pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
            }],
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask,
            })],
            compilation_options: PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: STENCIL_FORMAT,
            depth_write_enabled: false,
            depth_compare: CompareFunction::Always,
            stencil,
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn texture_format(kind: TextureKind) -> TextureFormat {
    match kind {
        TextureKind::Alpha => TextureFormat::R8Unorm,
        TextureKind::Rgba => TextureFormat::Rgba8Unorm,
    }
}

/// Backend drawing with a wgpu device into a caller-provided render target.
///
/// Fills use a stencil attachment that is cleared at the start of every
/// frame. The color target is loaded, not cleared.
#[derive(Debug)]
pub struct WgpuBackend {
    device: Device,
    queue: Queue,
    pipelines: Pipelines,
    uniform_layout: BindGroupLayout,
    texture_layout: BindGroupLayout,
    viewport_buffer: Buffer,
    uniform_buffer: Buffer,
    uniform_bind_group: BindGroup,
    uniform_stride: u64,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    /// Bound by draws without a texture.
    blank: BindGroup,
    textures: HashMap<ImageId, GpuTexture>,
    next_id: NonZeroU32,
    target: Option<RenderTarget>,
    staging: Vec<u8>,
}

impl WgpuBackend {
    /// Creates a backend rendering into targets of `format`.
    pub fn new(device: Device, queue: Queue, format: TextureFormat) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nvg uniform layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(FRAG_SIZE),
                    },
                    count: None,
                },
            ],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nvg texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("nvg pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let pipelines = Pipelines::new(&device, format, &pipeline_layout);

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let uniform_stride = FRAG_SIZE.next_multiple_of(alignment);
        let viewport_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nvg viewport"),
            size: 16,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_buffer = create_buffer(
            &device,
            "nvg uniforms",
            INITIAL_BUFFER_SIZE.max(uniform_stride),
            BufferUsages::UNIFORM,
        );
        let uniform_bind_group =
            create_uniform_bind_group(&device, &uniform_layout, &viewport_buffer, &uniform_buffer);
        let vertex_buffer = create_buffer(
            &device,
            "nvg vertices",
            INITIAL_BUFFER_SIZE,
            BufferUsages::VERTEX,
        );
        let index_buffer =
            create_buffer(&device, "nvg indices", INITIAL_BUFFER_SIZE, BufferUsages::INDEX);

        let (blank_texture, blank) = create_gpu_texture(
            &device,
            &texture_layout,
            TextureKind::Rgba,
            1,
            1,
            ImageFlags::empty(),
        );
        write_region(&queue, &blank_texture, TextureKind::Rgba, [0, 0, 1, 1], &[255; 4]);

        Self {
            device,
            queue,
            pipelines,
            uniform_layout,
            texture_layout,
            viewport_buffer,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            vertex_buffer,
            index_buffer,
            blank,
            textures: HashMap::new(),
            next_id: NonZeroU32::MIN,
            target: None,
            staging: Vec::new(),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Sets the view the next flush renders into.
    ///
    /// The stencil attachment is reallocated when the size changes.
    pub fn set_target(&mut self, view: TextureView, width: u32, height: u32) {
        let stencil = match self.target.take() {
            Some(old) if old.width == width && old.height == height => old.stencil,
            _ => self
                .device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("nvg stencil"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: STENCIL_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default()),
        };
        self.target = Some(RenderTarget {
            view,
            stencil,
            width,
            height,
        });
    }

    fn upload(&mut self, list: &DrawList) {
        let vertices: &[u8] = bytemuck::cast_slice(&list.vertices);
        if grow_buffer(
            &self.device,
            &mut self.vertex_buffer,
            "nvg vertices",
            vertices.len() as u64,
            BufferUsages::VERTEX,
        ) {
            log::debug!("vertex buffer grown to {} bytes", self.vertex_buffer.size());
        }
        if !vertices.is_empty() {
            self.queue.write_buffer(&self.vertex_buffer, 0, vertices);
        }

        let indices: &[u8] = bytemuck::cast_slice(&list.indices);
        grow_buffer(
            &self.device,
            &mut self.index_buffer,
            "nvg indices",
            indices.len() as u64,
            BufferUsages::INDEX,
        );
        if !indices.is_empty() {
            self.queue.write_buffer(&self.index_buffer, 0, indices);
        }

        let stride = self.uniform_stride as usize;
        self.staging.clear();
        self.staging.resize(list.uniforms.len() * stride, 0);
        for (chunk, frag) in self.staging.chunks_exact_mut(stride).zip(&list.uniforms) {
            chunk[..size_of::<FragUniforms>()].copy_from_slice(bytemuck::bytes_of(frag));
        }
        if grow_buffer(
            &self.device,
            &mut self.uniform_buffer,
            "nvg uniforms",
            self.staging.len() as u64,
            BufferUsages::UNIFORM,
        ) {
            self.uniform_bind_group = create_uniform_bind_group(
                &self.device,
                &self.uniform_layout,
                &self.viewport_buffer,
                &self.uniform_buffer,
            );
        }
        if !self.staging.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &self.staging);
        }
    }
}

fn create_buffer(device: &Device, label: &'static str, size: u64, usage: BufferUsages) -> Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Replaces `buffer` with a larger one if it cannot hold `needed` bytes.
fn grow_buffer(
    device: &Device,
    buffer: &mut Buffer,
    label: &'static str,
    needed: u64,
    usage: BufferUsages,
) -> bool {
    if needed <= buffer.size() {
        return false;
    }
    *buffer = create_buffer(device, label, needed.next_power_of_two(), usage);
    true
}

fn create_uniform_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    viewport: &Buffer,
    uniforms: &Buffer,
) -> BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("nvg uniforms"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: uniforms,
                    offset: 0,
                    size: NonZeroU64::new(FRAG_SIZE),
                }),
            },
        ],
    })
}

fn create_gpu_texture(
    device: &Device,
    layout: &BindGroupLayout,
    kind: TextureKind,
    width: u32,
    height: u32,
    flags: ImageFlags,
) -> (Texture, BindGroup) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("nvg image"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: texture_format(kind),
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let address_mode = |repeat| {
        if flags.contains(repeat) {
            wgpu::AddressMode::Repeat
        } else {
            wgpu::AddressMode::ClampToEdge
        }
    };
    let filter = if flags.contains(ImageFlags::NEAREST) {
        wgpu::FilterMode::Nearest
    } else {
        wgpu::FilterMode::Linear
    };
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("nvg sampler"),
        address_mode_u: address_mode(ImageFlags::REPEAT_X),
        address_mode_v: address_mode(ImageFlags::REPEAT_Y),
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("nvg image"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });
    (texture, bind_group)
}

fn write_region(queue: &Queue, texture: &Texture, kind: TextureKind, region: [u32; 4], data: &[u8]) {
    let [x, y, width, height] = region;
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x, y, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * kind.bytes_per_pixel() as u32),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

impl RenderBackend for WgpuBackend {
    fn create_texture(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: Option<&[u8]>,
    ) -> Result<ImageId> {
        let len = width as usize * height as usize * kind.bytes_per_pixel();
        if width == 0 || height == 0 || data.is_some_and(|data| data.len() != len) {
            return Err(Error::InvalidImageData);
        }
        if flags.contains(ImageFlags::GENERATE_MIPMAPS) {
            log::warn!("mipmap generation is not supported, sampling the base level");
        }
        let (texture, bind_group) =
            create_gpu_texture(&self.device, &self.texture_layout, kind, width, height, flags);
        if let Some(data) = data {
            write_region(&self.queue, &texture, kind, [0, 0, width, height], data);
        }
        let id = ImageId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.textures.insert(
            id,
            GpuTexture {
                texture,
                bind_group,
                kind,
                flags,
            },
        );
        Ok(id)
    }

    fn delete_texture(&mut self, image: ImageId) -> Result<()> {
        let texture = self
            .textures
            .remove(&image)
            .ok_or(Error::InvalidHandle(image))?;
        texture.texture.destroy();
        Ok(())
    }

    fn update_texture(&mut self, image: ImageId, region: [u32; 4], data: &[u8]) -> Result<()> {
        let texture = self
            .textures
            .get(&image)
            .ok_or(Error::InvalidHandle(image))?;
        let [x, y, w, h] = region;
        let fits = x.checked_add(w).is_some_and(|r| r <= texture.texture.width())
            && y.checked_add(h).is_some_and(|b| b <= texture.texture.height());
        let len = w as usize * h as usize * texture.kind.bytes_per_pixel();
        if !fits || data.len() != len {
            return Err(Error::InvalidImageData);
        }
        if len > 0 {
            write_region(&self.queue, &texture.texture, texture.kind, region, data);
        }
        Ok(())
    }

    fn texture_size(&self, image: ImageId) -> Option<(u32, u32)> {
        self.textures
            .get(&image)
            .map(|t| (t.texture.width(), t.texture.height()))
    }

    fn texture_kind(&self, image: ImageId) -> Option<TextureKind> {
        self.textures.get(&image).map(|t| t.kind)
    }

    fn texture_flags(&self, image: ImageId) -> Option<ImageFlags> {
        self.textures.get(&image).map(|t| t.flags)
    }

    fn viewport(&mut self, width: f32, height: f32, _device_pixel_ratio: f32) {
        self.queue.write_buffer(
            &self.viewport_buffer,
            0,
            bytemuck::bytes_of(&[width, height, 0.0, 0.0]),
        );
    }

    fn transient_vertex_capacity(&self) -> usize {
        (self.device.limits().max_buffer_size / size_of::<Vertex>() as u64) as usize
    }

    fn flush(&mut self, list: &DrawList) -> Result<()> {
        if self.target.is_none() {
            return Err(Error::NoRenderTarget);
        }
        self.upload(list);
        let target = self.target.as_ref().ok_or(Error::NoRenderTarget)?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("nvg frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("nvg frame"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &target.stencil,
                    depth_ops: None,
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Discard,
                    }),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.set_stencil_reference(0);
            for cmd in &list.commands {
                let offset = (u64::from(cmd.uniform) * self.uniform_stride) as u32;
                pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                let textures = match cmd.image {
                    Some(image) => match self.textures.get(&image) {
                        Some(texture) => &texture.bind_group,
                        None => {
                            log::warn!("draw references deleted image {image:?}");
                            &self.blank
                        }
                    },
                    None => &self.blank,
                };
                pass.set_bind_group(1, textures, &[]);
                match &cmd.primitive {
                    Primitive::Strip(vertices) => {
                        pass.set_pipeline(self.pipelines.get(cmd.stencil, true));
                        pass.draw(vertices.clone(), 0..1);
                    }
                    Primitive::List(vertices) => {
                        pass.set_pipeline(self.pipelines.get(cmd.stencil, false));
                        pass.draw(vertices.clone(), 0..1);
                    }
                    Primitive::Indexed(indices) => {
                        pass.set_pipeline(self.pipelines.get(cmd.stencil, false));
                        pass.draw_indexed(indices.clone(), 0, 0..1);
                    }
                }
            }
        }
        self.queue.submit([encoder.finish()]);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
static_assertions::assert_impl_all!(WgpuBackend: Send);

#[cfg(test)]
mod tests {
    use super::{stencil_state, Pipelines};
    use crate::recording::StencilMode;
    use wgpu::{ColorWrites, CompareFunction, StencilOperation};

    #[test]
    fn winding_pass_writes_no_color() {
        let (stencil, writes) = stencil_state(StencilMode::FillWinding);
        assert_eq!(writes, ColorWrites::empty());
        assert_eq!(stencil.front.pass_op, StencilOperation::IncrementWrap);
        assert_eq!(stencil.back.pass_op, StencilOperation::DecrementWrap);
    }

    #[test]
    fn cover_pass_clears_stencil() {
        let (stencil, writes) = stencil_state(StencilMode::NotEqualZeroClear);
        assert_eq!(writes, ColorWrites::ALL);
        assert_eq!(stencil.front.compare, CompareFunction::NotEqual);
        assert_eq!(stencil.front.pass_op, StencilOperation::Zero);
        assert_eq!(stencil.back, stencil.front);
    }

    #[test]
    fn every_mode_has_a_pipeline_slot() {
        for (ix, mode) in Pipelines::MODES.into_iter().enumerate() {
            let (stencil, _) = stencil_state(mode);
            assert_eq!(stencil.is_enabled(), ix != 0);
        }
    }
}
