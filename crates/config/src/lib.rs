use app_error::{AppErrorExt, AppResult};
use std::path::Path;

mod config_loader;
pub use config_loader::*;

/// Load variables from a `.env` file into the process environment.
///
/// Variables already present in the environment are left untouched. A missing
/// or unreadable file is reported as a configuration error so callers can
/// decide whether running without it is acceptable.
pub fn load_env<P: AsRef<Path>>(path: P) -> AppResult<()> {
    let path = path.as_ref();
    dotenv::from_path(path).config_err()?;
    tracing::debug!("Loaded environment from {}", path.display());
    Ok(())
}
