mod hash;

pub use hash::compute_hash;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// The name of the configuration file inside the data folder
pub const CONFIG_FILE: &str = "config.json";

/// Get the path to a file inside the data folder
pub fn get_data_file(data_dir: &Path, file_name: &str) -> PathBuf {
    data_dir.join(file_name)
}

/// Get current timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way views display it
pub fn display_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M").to_string()
}
