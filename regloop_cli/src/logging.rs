//! Console and file logging setup.

use std::io::IsTerminal;
use std::path::Path;

use regloop_config::Logging;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// Console: pretty or JSON lines on stdout, filtered by `RUST_LOG` if set,
/// otherwise by `level`. File (optional): JSON lines at `logging.level`
/// (default info), rotated per `logging.rotation`.
pub fn init_tracing(json: bool, level: &str, cfg: &Logging) -> eyre::Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| eyre::eyre!("invalid log level '{level}': {e}"))?;

    let console: BoxedLayer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(std::io::stdout().is_terminal())
            .with_writer(std::io::stdout)
            .with_filter(console_filter)
            .boxed()
    };
    let mut layers = vec![console];

    if let Some(path) = cfg.file.as_deref() {
        let (dir, name) = split_log_path(Path::new(path))?;
        let appender = match cfg.rotation.as_deref().unwrap_or("never") {
            "daily" => rolling::daily(dir, name),
            "hourly" => rolling::hourly(dir, name),
            _ => rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        // The guard flushes on drop; keep it for the life of the process.
        let _ = FILE_GUARD.set(guard);

        let file_level = cfg.level.as_deref().unwrap_or("info");
        let file_filter = EnvFilter::try_new(file_level)
            .map_err(|e| eyre::eyre!("invalid logging.level '{file_level}': {e}"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("failed to install logger: {e}"))
}

fn split_log_path(path: &Path) -> eyre::Result<(&Path, &std::ffi::OsStr)> {
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("logging.file '{}' has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok((dir, name))
}
