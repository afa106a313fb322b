//! Spiral transform generation.
//!
//! Every frame the whole spiral is rebuilt from the elapsed time alone. Starting
//! from the identity, each instance takes the previous instance's model matrix
//! and composes one more scale, Z rotation and local translation onto it:
//!
//! ```text
//! M[i] = M[i-1] * Scale(s) * RotZ(angle[i]) * Translate(offset[i], 0, 0)
//! ```
//!
//! The rotation angle grows geometrically with nesting depth, and the
//! translation distance decays towards a fixed point, so the quads wind
//! inwards into a tightening curl.
//!
//! # Example
//!
//! ```
//! use gyre::SpiralParams;
//!
//! let params = SpiralParams::default();
//! let models: Vec<_> = params.transforms(1.0).collect();
//! assert_eq!(models.len(), 60);
//! ```

use std::iter::FusedIterator;

use glam::{Mat4, Vec3};

/// Tunable constants of the spiral.
///
/// All values are fixed for the lifetime of a run. The defaults give a 1%
/// shrink per instance and sixty new instances per second, capped at ten
/// thousand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpiralParams {
    /// Uniform scale applied per nesting level, in `(0, 1)`.
    pub scale_factor: f32,
    /// Radians per second added to the starting angle.
    pub base_rotation_speed: f32,
    /// Starting angle at `t = 0`, in radians.
    pub phase_offset: f32,
    /// Multiplier applied to the angle once per instance. Must exceed 1.
    pub rotation_growth_rate: f32,
    /// Translation added per instance before decay.
    pub offset_step: f32,
    /// How many instances appear per second of elapsed time.
    pub instances_per_second: f32,
    /// Upper bound on instances generated in one frame.
    pub max_instances: usize,
    /// Vertical half-extent of the orthographic view.
    pub view_half_extent: f32,
}

impl Default for SpiralParams {
    fn default() -> Self {
        Self {
            scale_factor: 0.99,
            base_rotation_speed: 0.01,
            phase_offset: std::f32::consts::FRAC_PI_4,
            rotation_growth_rate: 1.0001,
            offset_step: 0.05,
            instances_per_second: 60.0,
            max_instances: 10_000,
            view_half_extent: 2.0,
        }
    }
}

impl SpiralParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_rotation(mut self, base_speed: f32, phase_offset: f32, growth_rate: f32) -> Self {
        self.base_rotation_speed = base_speed;
        self.phase_offset = phase_offset;
        self.rotation_growth_rate = growth_rate;
        self
    }

    pub fn with_offset_step(mut self, offset_step: f32) -> Self {
        self.offset_step = offset_step;
        self
    }

    pub fn with_growth(mut self, instances_per_second: f32, max_instances: usize) -> Self {
        self.instances_per_second = instances_per_second;
        self.max_instances = max_instances;
        self
    }

    pub fn with_view_half_extent(mut self, half_extent: f32) -> Self {
        self.view_half_extent = half_extent;
        self
    }

    /// Number of instances drawn at `elapsed` seconds.
    ///
    /// Grows linearly with time and saturates at [`max_instances`](Self::max_instances).
    /// Negative or NaN input yields zero (the float-to-int cast saturates).
    pub fn instance_count(&self, elapsed: f32) -> usize {
        let uncapped = (elapsed * self.instances_per_second).floor() as usize;
        uncapped.min(self.max_instances)
    }

    /// Starting rotation angle for a frame at `elapsed` seconds.
    pub fn initial_angle(&self, elapsed: f32) -> f32 {
        self.base_rotation_speed * elapsed + self.phase_offset
    }

    /// Lazily generate this frame's model matrices.
    pub fn transforms(&self, elapsed: f32) -> SpiralTransforms {
        SpiralTransforms {
            params: *self,
            state: GenerationState::new(self.initial_angle(elapsed)),
            remaining: self.instance_count(elapsed),
        }
    }
}

/// Accumulator threaded through one frame's generation.
///
/// Never outlives a frame: [`SpiralParams::transforms`] starts from a fresh
/// state every time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationState {
    pub accumulated_model: Mat4,
    pub rotation_angle: f32,
    pub offset_distance: f32,
}

impl GenerationState {
    pub fn new(initial_angle: f32) -> Self {
        Self {
            accumulated_model: Mat4::IDENTITY,
            rotation_angle: initial_angle,
            offset_distance: 0.0,
        }
    }

    /// Advance by one instance, returning the next state and the emitted model matrix.
    pub fn step(self, params: &SpiralParams) -> (Self, Mat4) {
        let s = params.scale_factor;
        let rotation_angle = self.rotation_angle * params.rotation_growth_rate;
        let offset_distance = self.offset_distance * s;

        let model = self.accumulated_model
            * Mat4::from_scale(Vec3::splat(s))
            * Mat4::from_rotation_z(rotation_angle)
            * Mat4::from_translation(Vec3::new(offset_distance, 0.0, 0.0));

        let next = Self {
            accumulated_model: model,
            rotation_angle,
            offset_distance: offset_distance + params.offset_step * s,
        };
        (next, model)
    }
}

/// Iterator over one frame's model matrices, in draw order.
///
/// Cloning yields an independent iterator that replays the same sequence.
#[derive(Clone, Debug)]
pub struct SpiralTransforms {
    params: SpiralParams,
    state: GenerationState,
    remaining: usize,
}

impl Iterator for SpiralTransforms {
    type Item = Mat4;

    fn next(&mut self) -> Option<Mat4> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let (state, model) = self.state.step(&self.params);
        self.state = state;
        Some(model)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SpiralTransforms {}

impl FusedIterator for SpiralTransforms {}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_of(m: &Mat4) -> f32 {
        m.x_axis.truncate().length()
    }

    #[test]
    fn instance_count_grows_then_saturates() {
        let params = SpiralParams::default();
        let mut last = 0;
        for step in 0..2000 {
            let t = step as f32 * 0.173;
            let n = params.instance_count(t);
            assert!(n >= last, "count decreased at t={t}");
            last = n;
        }

        let saturation = params.max_instances as f32 / params.instances_per_second;
        for t in [saturation + 1e-3, saturation + 0.5, saturation * 3.0, 1.0e6] {
            assert_eq!(params.instance_count(t), params.max_instances);
        }
    }

    #[test]
    fn instance_count_scenarios() {
        let params = SpiralParams::default();
        assert_eq!(params.instance_count(0.0), 0);
        assert_eq!(params.instance_count(1.0), 60);
        assert_eq!(params.instance_count(0.5), 30);
        assert_eq!(params.transforms(0.0).count(), 0);
    }

    #[test]
    fn cap_is_independent_of_rate() {
        let params = SpiralParams::default().with_growth(1000.0, 7);
        assert_eq!(params.instance_count(0.004), 4);
        assert_eq!(params.instance_count(1.0), 7);
        assert_eq!(params.transforms(1.0).len(), 7);
    }

    #[test]
    fn generation_is_deterministic() {
        let params = SpiralParams::default();
        let a: Vec<Mat4> = params.transforms(3.7).collect();
        let b: Vec<Mat4> = params.transforms(3.7).collect();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.to_cols_array(), y.to_cols_array());
        }

        let iter = params.transforms(2.0);
        let replay: Vec<Mat4> = iter.clone().collect();
        assert_eq!(iter.collect::<Vec<_>>(), replay);
    }

    #[test]
    fn scale_decays_geometrically() {
        let params = SpiralParams::default();
        for t in [1.0, 4.25] {
            for (i, m) in params.transforms(t).enumerate().take(200) {
                let expected = params.scale_factor.powi(i as i32 + 1);
                let actual = scale_of(&m);
                assert!(
                    (actual - expected).abs() < 1e-4,
                    "instance {i} at t={t}: {actual} != {expected}"
                );
            }
        }
    }

    #[test]
    fn one_second_scenario() {
        let params = SpiralParams::default().with_scale_factor(0.99);
        let models: Vec<Mat4> = params.transforms(1.0).collect();
        assert_eq!(models.len(), 60);
        assert!((scale_of(&models[0]) - 0.99).abs() < 1e-5);
        assert!((scale_of(&models[59]) - 0.547).abs() < 1e-3);
    }

    #[test]
    fn first_instance_has_no_offset() {
        let params = SpiralParams::default();
        let first = params.transforms(2.0).next().unwrap();
        assert_eq!(first.w_axis.truncate(), Vec3::ZERO);

        let angle = params.initial_angle(2.0) * params.rotation_growth_rate;
        let expected = Mat4::from_scale(Vec3::splat(params.scale_factor))
            * Mat4::from_rotation_z(angle);
        assert!(first.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn composition_is_scale_rotate_translate() {
        let params = SpiralParams::default();
        let t = 2.0;
        let s = params.scale_factor;
        let models: Vec<Mat4> = params.transforms(t).collect();
        assert_eq!(models.len(), 120);

        // Instance 1 is the first with a non-zero offset.
        let a1 = params.initial_angle(t) * params.rotation_growth_rate.powi(2);
        let o1 = params.offset_step * s * s;
        let expected = models[0]
            * Mat4::from_scale(Vec3::splat(s))
            * Mat4::from_rotation_z(a1)
            * Mat4::from_translation(Vec3::new(o1, 0.0, 0.0));
        assert!(
            models[1].abs_diff_eq(expected, 1e-6),
            "instance 1 translation {} vs {}",
            models[1].w_axis,
            expected.w_axis
        );

        let swapped = models[0]
            * Mat4::from_scale(Vec3::splat(s))
            * Mat4::from_translation(Vec3::new(o1, 0.0, 0.0))
            * Mat4::from_rotation_z(a1);
        assert!(!models[1].w_axis.abs_diff_eq(swapped.w_axis, 1e-3));

        let mut angle = params.initial_angle(t);
        let mut offset = 0.0f32;
        let mut previous = Mat4::IDENTITY;
        for (k, model) in models.iter().enumerate() {
            angle *= params.rotation_growth_rate;
            offset *= s;
            let expected = previous
                * Mat4::from_scale(Vec3::splat(s))
                * Mat4::from_rotation_z(angle)
                * Mat4::from_translation(Vec3::new(offset, 0.0, 0.0));
            assert!(model.abs_diff_eq(expected, 1e-5), "instance {k} diverged");
            offset += params.offset_step * s;
            previous = *model;
        }
    }

    #[test]
    fn rotation_increments_grow() {
        // A steep growth rate keeps successive increments well apart in f32.
        let params =
            SpiralParams::default().with_rotation(0.01, std::f32::consts::FRAC_PI_4, 1.05);
        let mut state = GenerationState::new(params.initial_angle(5.0));
        let mut angles = vec![state.rotation_angle];
        for _ in 0..100 {
            let (next, _) = state.step(&params);
            angles.push(next.rotation_angle);
            state = next;
        }

        let increments: Vec<f32> = angles.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        for pair in increments.windows(2) {
            assert!(pair[1] > pair[0], "{} !> {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn offsets_follow_recurrence() {
        let params = SpiralParams::default();
        let s = params.scale_factor;
        let mut state = GenerationState::new(0.0);
        let mut expected = 0.0f32;
        for _ in 0..50 {
            let (next, _) = state.step(&params);
            expected = expected * s + params.offset_step * s;
            assert!((next.offset_distance - expected).abs() < 1e-6);
            state = next;
        }
    }

    #[test]
    fn fold_matches_iterator() {
        let params = SpiralParams::default();
        let t = 0.8;
        let (_, folded) = (0..params.instance_count(t)).fold(
            (GenerationState::new(params.initial_angle(t)), Vec::new()),
            |(state, mut out), _| {
                let (next, model) = state.step(&params);
                out.push(model);
                (next, out)
            },
        );
        assert_eq!(folded, params.transforms(t).collect::<Vec<_>>());
    }

    #[test]
    fn size_hint_tracks_remaining() {
        let mut it = SpiralParams::default().transforms(0.1);
        assert_eq!(it.len(), 6);
        it.next();
        it.next();
        assert_eq!(it.size_hint(), (4, Some(4)));
        assert_eq!(it.by_ref().count(), 4);
        assert_eq!(it.next(), None);
    }
}
