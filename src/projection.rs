//! Per-frame parameters and the orthographic view.

use glam::Mat4;

use crate::spiral::SpiralParams;

/// Orthographic projection centered on the origin.
///
/// Covers `[-half_extent * aspect, half_extent * aspect]` horizontally and
/// `[-half_extent, half_extent]` vertically. Depth spans the same half extent
/// so the quads at `z = 0` land mid-range in wgpu's `[0, 1]` clip depth.
pub fn orthographic(aspect: f32, half_extent: f32) -> Mat4 {
    let half_width = half_extent * aspect;
    Mat4::orthographic_rh(
        -half_width,
        half_width,
        -half_extent,
        half_extent,
        -half_extent,
        half_extent,
    )
}

/// Everything one frame needs that is derived from time and viewport size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParameters {
    pub instance_count: usize,
    /// Starting rotation angle before the first per-instance growth step.
    pub rotation_step: f32,
    pub scale_factor: f32,
    pub offset_step: f32,
    pub aspect_ratio: f32,
    pub projection: Mat4,
}

impl FrameParameters {
    /// Derive the parameters for a frame.
    ///
    /// Returns `None` when either side of the viewport is zero (e.g. a
    /// minimized window), in which case the frame should be skipped.
    pub fn new(params: &SpiralParams, elapsed: f32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let aspect_ratio = width as f32 / height as f32;

        Some(Self {
            instance_count: params.instance_count(elapsed),
            rotation_step: params.initial_angle(elapsed),
            scale_factor: params.scale_factor,
            offset_step: params.offset_step,
            aspect_ratio,
            projection: orthographic(aspect_ratio, params.view_half_extent),
        })
    }

    /// Horizontal half-extent of the visible region in world units.
    pub fn half_width(&self) -> f32 {
        1.0 / self.projection.x_axis.x
    }

    /// Vertical half-extent of the visible region in world units.
    pub fn half_height(&self) -> f32 {
        1.0 / self.projection.y_axis.y
    }
}
