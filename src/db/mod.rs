pub mod connection;
pub mod invoices;
pub mod migrations;
pub mod queries;

use anyhow::Result;
use std::path::PathBuf;

pub use connection::Database;

/// Default database location under the platform data directory. Callers may
/// override this with the `data_dir` config setting; services always receive
/// the resolved path explicitly.
pub fn get_database_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

    let timebill_dir = data_dir.join(".timebill");
    std::fs::create_dir_all(&timebill_dir)?;

    Ok(timebill_dir.join("timebill.db"))
}

pub fn resolve_database_path(config: &crate::models::Config) -> Result<PathBuf> {
    match &config.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(dir.join("timebill.db"))
        }
        None => get_database_path(),
    }
}
