//! # Gyre
//!
//! **A spiral of textured quads that grows with time.**
//!
//! Every frame, Gyre rebuilds a chain of model matrices from the elapsed time
//! alone. Each link is the previous one scaled down a little, rotated a little
//! further and nudged sideways, and the same textured quad is drawn once per
//! link on top of the last.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> anyhow::Result<()> {
//!     gyre::init_logging(None);
//!     gyre::run_with_config(
//!         gyre::AppConfig::new()
//!             .title("Gyre")
//!             .size(1280, 720)
//!             .image_file("assets/emblem60.png"),
//!     )
//! }
//! ```
//!
//! ## Without a window
//!
//! The generator is plain math and needs no GPU:
//!
//! ```
//! use gyre::{FramePlan, SpiralParams};
//!
//! let params = SpiralParams::default();
//! let plan = FramePlan::new(&params, 2.0, 800, 600).unwrap();
//! assert_eq!(plan.instance_count(), 120);
//! ```

mod app;
mod error;
mod frame;
mod gpu;
mod logging;
mod pipeline;
mod projection;
mod quad;
mod spiral;
mod texture;
mod tick;

pub use app::{AppConfig, ImageSource, run, run_with_config};
pub use error::InitError;
pub use frame::{FrameOutcome, FramePlan, RenderContext, draw_frame, mvp_matrices};
pub use gpu::{GpuContext, SurfaceRecovery};
pub use logging::{DEFAULT_FILTER, init_logging};
pub use pipeline::{QuadPass, QuadPipeline, QuadRenderer, slot_stride};
pub use projection::{FrameParameters, orthographic};
pub use quad::{QUAD_VERTEX_COUNT, QUAD_VERTICES, Quad, QuadVertex, quad_vertices};
pub use spiral::{GenerationState, SpiralParams, SpiralTransforms};
pub use texture::{PaddedImage, Texture, decode_bytes, decode_file, padded_dimension};
pub use tick::TickScheduler;

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3};
