use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{CalendarError, CalendarResult};

pub const LOG_FILE: &str = "daygrid.log";
const DEFAULT_FILTER: &str = "daygrid=info";

/// Send tracing output to `<dir>/daygrid.log`; the terminal belongs to the UI.
/// `RUST_LOG` overrides the default filter.
pub fn init(dir: &Path) -> CalendarResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| CalendarError::Config(format!("Could not start logging: {e}")))?;

    Ok(path)
}
