//! The textured-quad shading pipeline.
//!
//! Bindings:
//!
//! - **Group 0**: the `mvp` matrix, a dynamic-offset uniform. Each draw in a
//!   frame gets its own aligned slot so matrices never overwrite each other
//!   before the command buffer runs.
//! - **Group 1**: the texture and its sampler.
//!
//! Vertex input is [`QuadVertex`], drawn as a 4-vertex triangle strip.
//! Fragments write the sampled color with straight alpha blending.

use glam::Mat4;

use crate::error::InitError;
use crate::gpu::GpuContext;
use crate::quad::{QUAD_VERTEX_COUNT, Quad, QuadVertex};
use crate::texture::Texture;

/// Bytes in one `mat4x4<f32>`.
const MATRIX_SIZE: u64 = std::mem::size_of::<[f32; 16]>() as u64;

/// Size of one transform slot, rounded up to the device's dynamic-offset alignment.
pub fn slot_stride(alignment: u32) -> u64 {
    MATRIX_SIZE.div_ceil(alignment as u64) * alignment as u64
}

/// Receives one frame's draw commands.
///
/// Implemented by [`QuadPass`] for the GPU and by recording fakes in tests.
pub trait QuadRenderer {
    /// Make the pipeline and its bound texture current.
    fn activate(&mut self);

    /// Upload the matrix used by subsequent draws.
    fn set_transform(&mut self, mvp: Mat4);

    /// Draw the quad once with the current transform.
    ///
    /// Returns `false` if the draw was dropped.
    fn draw_quad(&mut self) -> bool;
}

/// Compiled pipeline plus the uniform storage it reads from.
pub struct QuadPipeline {
    pipeline: wgpu::RenderPipeline,
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group: Option<wgpu::BindGroup>,
    stride: u64,
    capacity: usize,
}

impl QuadPipeline {
    /// Build the pipeline with room for `capacity` draws per frame.
    ///
    /// Shader compilation and pipeline linking run inside a validation error
    /// scope. Any error there is returned as [`InitError::Pipeline`]; once this
    /// succeeds the pipeline is assumed valid for every frame.
    pub fn new(gpu: &GpuContext, capacity: usize) -> Result<Self, InitError> {
        let device = &gpu.device;
        let capacity = capacity.max(1);
        let stride = slot_stride(device.limits().min_uniform_buffer_offset_alignment);

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let transform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quad Transforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Quad Transform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(MATRIX_SIZE),
                    },
                    count: None,
                }],
            });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quad Transform Bind Group"),
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &transform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(MATRIX_SIZE),
                }),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Quad Texture Layout"),
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
            label: Some("Quad Pipeline Layout"),
            bind_group_layouts: &[&transform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Straight alpha: src * a + dst * (1 - a)
        let blend_state = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Quad Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[QuadVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            log::debug!("quad pipeline failed validation: {err}");
            return Err(InitError::Pipeline(err.to_string()));
        }

        log::debug!(
            "quad pipeline ready: {} transform slots of {} bytes",
            capacity,
            stride
        );

        Ok(Self {
            pipeline,
            transform_buffer,
            transform_bind_group,
            texture_bind_group_layout,
            texture_bind_group: None,
            stride,
            capacity,
        })
    }

    /// Bind `texture` as the image sampled by every subsequent draw.
    pub fn bind_texture(&mut self, gpu: &GpuContext, texture: &Texture) {
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quad Texture Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });
        self.texture_bind_group = Some(bind_group);
    }

    /// Write this frame's staged transforms into the uniform buffer.
    ///
    /// Must run before the encoder holding the matching draws is submitted.
    pub fn upload(&self, gpu: &GpuContext, staged: &[u8]) {
        if !staged.is_empty() {
            gpu.queue.write_buffer(&self.transform_buffer, 0, staged);
        }
    }
}

/// One frame's worth of quad draws recorded into a render pass.
///
/// Transforms are staged in CPU memory, one slot per draw, and must be
/// flushed with [`QuadPipeline::upload`] after the pass ends.
pub struct QuadPass<'a> {
    render_pass: wgpu::RenderPass<'a>,
    pipeline: &'a QuadPipeline,
    quad: &'a Quad,
    staged: &'a mut Vec<u8>,
    current_offset: Option<u32>,
    dropped: usize,
}

impl<'a> QuadPass<'a> {
    pub fn new(
        render_pass: wgpu::RenderPass<'a>,
        pipeline: &'a QuadPipeline,
        quad: &'a Quad,
        staged: &'a mut Vec<u8>,
    ) -> Self {
        staged.clear();
        Self {
            render_pass,
            pipeline,
            quad,
            staged,
            current_offset: None,
            dropped: 0,
        }
    }

    fn slots_used(&self) -> usize {
        self.staged.len() / self.pipeline.stride as usize
    }
}

impl Drop for QuadPass<'_> {
    fn drop(&mut self) {
        if self.dropped > 0 {
            log::warn!(
                "dropped {} draws past the {} transform slots",
                self.dropped,
                self.pipeline.capacity
            );
        }
    }
}

impl QuadRenderer for QuadPass<'_> {
    fn activate(&mut self) {
        self.render_pass.set_pipeline(&self.pipeline.pipeline);
        if let Some(bind_group) = &self.pipeline.texture_bind_group {
            self.render_pass.set_bind_group(1, bind_group, &[]);
        }
        self.render_pass
            .set_vertex_buffer(0, self.quad.vertex_buffer.slice(..));
    }

    fn set_transform(&mut self, mvp: Mat4) {
        if self.slots_used() >= self.pipeline.capacity {
            self.current_offset = None;
            return;
        }

        let start = self.staged.len();
        self.staged.resize(start + self.pipeline.stride as usize, 0);
        self.staged[start..start + MATRIX_SIZE as usize]
            .copy_from_slice(bytemuck::cast_slice(&mvp.to_cols_array()));
        self.current_offset = Some(start as u32);
    }

    fn draw_quad(&mut self) -> bool {
        let Some(offset) = self.current_offset else {
            self.dropped += 1;
            return false;
        };
        self.render_pass
            .set_bind_group(0, &self.pipeline.transform_bind_group, &[offset]);
        self.render_pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
        true
    }
}
