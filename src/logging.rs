use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with a file writer under the user data directory.
///
/// The alternate screen owns stdout/stderr while the app runs, so log
/// output goes to `<data_dir>/arena/arena.log` instead. Default level is
/// INFO, override via RUST_LOG. The returned guard must stay alive for the
/// duration of the process or buffered lines are dropped.
pub fn init() -> Result<WorkerGuard> {
    let log_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("arena");
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::never(log_dir, "arena.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
