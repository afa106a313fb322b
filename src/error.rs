//! Startup failures.
//!
//! Anything that goes wrong before the first frame is fatal: without a
//! surface, a valid pipeline and a texture there is nothing to draw.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("shader pipeline is invalid: {0}")]
    Pipeline(String),

    #[error("failed to decode image '{}': {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "image '{}' needs a {width}x{height} texture, device limit is {max}",
        .path.display()
    )]
    TextureTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_carries_validation_message() {
        // The only place this is logged is the top-level handler in `main`.
        let err = InitError::Pipeline("entry point `vs` not found".into());
        assert_eq!(
            err.to_string(),
            "shader pipeline is invalid: entry point `vs` not found"
        );
    }

    #[test]
    fn oversized_texture_message_names_the_image() {
        let err = InitError::TextureTooLarge {
            path: "big.png".into(),
            width: 16384,
            height: 64,
            max: 8192,
        };
        assert_eq!(
            err.to_string(),
            "image 'big.png' needs a 16384x64 texture, device limit is 8192"
        );
    }
}
