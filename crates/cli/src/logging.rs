//! Run logging: DEBUG to a per-run log file, `--verbose`/`RUST_LOG` to stderr.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use cartons_recon::render::centered_line;

use crate::error::CliError;

const BANNER_WIDTH: usize = 60;

/// `origin_<origin>_sets_<bool>_mags_<bool>.log`
pub fn log_file_name(origin: &str, sets: bool, mags: bool) -> String {
    format!("origin_{origin}_sets_{sets}_mags_{mags}.log")
}

/// Install the global subscriber. With `log_file`, its parent directory is
/// created when missing and the file is truncated.
pub fn init(log_file: Option<&Path>, verbose: bool) -> Result<Option<PathBuf>, CliError> {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(stderr_filter);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .map_err(|e| CliError::io(format!("cannot create log directory {}: {e}", dir.display())))?;
            }
            let file = File::create(path)
                .map_err(|e| CliError::io(format!("cannot create log file {}: {e}", path.display())))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::general(format!("cannot install logger: {e}")))?;

    Ok(log_file.map(Path::to_path_buf))
}

/// Log the run banner and every effective parameter as `name=value`.
pub fn banner(command: &str, params: &[(&str, String)]) {
    info!("{}", "#".repeat(BANNER_WIDTH));
    info!("{}", centered_line("STARTING CODE EXECUTION", BANNER_WIDTH));
    info!("{}", "#".repeat(BANNER_WIDTH));
    info!("started at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("Ran {command} using the following arguments");
    for (name, value) in params {
        info!("{name}={value}");
    }
    info!(" ");
}
