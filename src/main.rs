use std::process::ExitCode;

use gyre::AppConfig;

fn main() -> ExitCode {
    gyre::init_logging(None);

    // Optional first argument: an image file to draw instead of the built-in emblem.
    let mut config = AppConfig::new();
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.image_file(path);
    }

    match gyre::run_with_config(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
