//! One presentation cycle.
//!
//! [`FramePlan`] turns elapsed time and viewport size into draw commands
//! against any [`QuadRenderer`]. [`draw_frame`] wires that to the surface:
//! acquire, clear, record, upload transforms, submit, present.

use glam::Mat4;
use winit::dpi::PhysicalSize;

use crate::error::InitError;
use crate::gpu::{GpuContext, SurfaceRecovery};
use crate::pipeline::{QuadPass, QuadPipeline, QuadRenderer};
use crate::projection::FrameParameters;
use crate::quad::Quad;
use crate::spiral::{SpiralParams, SpiralTransforms};
use crate::texture::Texture;

/// GPU resources created once at startup and only referenced per frame.
pub struct RenderContext {
    pub pipeline: QuadPipeline,
    pub quad: Quad,
    pub texture: Texture,
    staged_transforms: Vec<u8>,
}

impl RenderContext {
    /// Build the pipeline, bind `texture` and upload the quad.
    ///
    /// `capacity` is the most instances any frame will draw.
    pub fn new(gpu: &GpuContext, texture: Texture, capacity: usize) -> Result<Self, InitError> {
        let mut pipeline = QuadPipeline::new(gpu, capacity)?;
        pipeline.bind_texture(gpu, &texture);
        let quad = Quad::new(gpu, texture.uv_extent);

        Ok(Self {
            pipeline,
            quad,
            texture,
            staged_transforms: Vec::new(),
        })
    }
}

/// What happened to a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Drawn { instances: usize },
    /// Nothing was drawn this tick (empty viewport or a transient surface error).
    Skipped,
    /// The surface cannot be recovered.
    Fatal,
}

/// Everything needed to record one frame, computed up front.
#[derive(Clone, Debug)]
pub struct FramePlan {
    pub parameters: FrameParameters,
    models: SpiralTransforms,
}

impl FramePlan {
    /// Plan the frame at `elapsed` seconds for a `width` x `height` viewport.
    ///
    /// Returns `None` when the viewport has zero width or height.
    pub fn new(params: &SpiralParams, elapsed: f32, width: u32, height: u32) -> Option<Self> {
        let parameters = FrameParameters::new(params, elapsed, width, height)?;
        Some(Self {
            parameters,
            models: params.transforms(elapsed),
        })
    }

    pub fn instance_count(&self) -> usize {
        self.parameters.instance_count
    }

    /// Issue every draw, in generation order, and return how many the renderer accepted.
    pub fn record<R: QuadRenderer + ?Sized>(self, renderer: &mut R) -> usize {
        let projection = self.parameters.projection;
        renderer.activate();

        let mut drawn = 0;
        for model in self.models {
            renderer.set_transform(projection * model);
            if renderer.draw_quad() {
                drawn += 1;
            }
        }
        drawn
    }
}

/// Run one full cycle against the window surface.
///
/// `viewport` is the framebuffer size queried this frame; the surface is
/// reconfigured first if it changed.
pub fn draw_frame(
    gpu: &mut GpuContext,
    ctx: &mut RenderContext,
    params: &SpiralParams,
    elapsed: f32,
    viewport: PhysicalSize<u32>,
) -> FrameOutcome {
    let Some(plan) = FramePlan::new(params, elapsed, viewport.width, viewport.height) else {
        log::trace!("skipping frame: {}x{} viewport", viewport.width, viewport.height);
        return FrameOutcome::Skipped;
    };

    if viewport.width != gpu.width() || viewport.height != gpu.height() {
        gpu.resize(viewport.width, viewport.height);
    }

    let output = match gpu.surface.get_current_texture() {
        Ok(output) => output,
        Err(err) => {
            let reason = err.to_string();
            return match gpu.recover(err) {
                SurfaceRecovery::Fatal => {
                    log::error!("surface lost beyond recovery: {reason}");
                    FrameOutcome::Fatal
                }
                recovery => {
                    log::debug!("skipping frame after surface error ({reason}): {recovery:?}");
                    FrameOutcome::Skipped
                }
            };
        }
    };

    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Spiral Encoder"),
        });

    let instances = {
        let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Spiral Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let mut pass = QuadPass::new(
            render_pass,
            &ctx.pipeline,
            &ctx.quad,
            &mut ctx.staged_transforms,
        );
        plan.record(&mut pass)
    };

    ctx.pipeline.upload(gpu, &ctx.staged_transforms);
    gpu.queue.submit(std::iter::once(encoder.finish()));
    output.present();

    log::trace!("frame at {elapsed:.3}s: {instances} instances");
    FrameOutcome::Drawn { instances }
}

/// Model-view-projection matrices for a frame, in draw order.
///
/// Convenience for callers that want the uploaded matrices without a renderer.
pub fn mvp_matrices(plan: &FramePlan) -> impl Iterator<Item = Mat4> + '_ {
    let projection = plan.parameters.projection;
    plan.models.clone().map(move |model| projection * model)
}
