//! Logger initialization.

use std::sync::Once;

/// Filter used when neither the caller nor `RUST_LOG` provides one.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Initializes the global `env_logger` once.
///
/// `filter` uses the `env_logger` syntax (e.g. `"gyre=trace,wgpu_core=warn"`).
/// Without one, `RUST_LOG` is honored, then [`DEFAULT_FILTER`]. Later calls
/// are ignored.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match filter.map(str::to_owned).or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => builder.parse_filters(&filter),
            None => builder.parse_filters(DEFAULT_FILTER),
        };

        // Another logger may already be installed (e.g. by a host application).
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}
