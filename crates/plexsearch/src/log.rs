//! File logging for plexsearch, enabled with `--debug`.
use std::io::LineWriter;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use plexsearch_core::get_data_dir;
use tracing_subscriber::fmt::time::OffsetTime;

const LOG_FILE: &str = "plexsearch.log";
const MAX_LOG_SIZE: u64 = 100 * 1024;

/// Moves `log_path` aside to `<name>.old` once it grows past `max_size`.
fn rotate_log(log_path: &Path, max_size: u64) -> anyhow::Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let metadata = std::fs::metadata(log_path)?;
    if metadata.len() > max_size {
        let backup_path = log_path.with_extension("log.old");
        if backup_path.exists() {
            std::fs::remove_file(&backup_path)?;
        }
        std::fs::rename(log_path, backup_path)?;
    }
    Ok(())
}

/// Installs a tracing subscriber writing to `<data_dir>/plexsearch.log`.
///
/// The previous log is kept as `plexsearch.log.old` when it exceeds 100KB.
pub fn setup_logging() -> anyhow::Result<()> {
    let data_dir = get_data_dir().context("Failed to get data directory")?;
    let log_path = data_dir.join(LOG_FILE);
    rotate_log(&log_path, MAX_LOG_SIZE)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    // Flush after every line
    let writer = Mutex::new(LineWriter::new(log_file));

    tracing_subscriber::fmt()
        .with_env_filter("plexsearch=debug,plexsearch_core=debug,rustyline=info")
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(OffsetTime::local_rfc_3339()?)
        .init();
    Ok(())
}
