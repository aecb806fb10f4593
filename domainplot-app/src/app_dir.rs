//! Directories used by the command-line front-end.

use std::path::PathBuf;

/// Directory containing the running executable. Falls back to current directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Per-user configuration directory, if the platform has one.
pub fn config_directory() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "DomainPlot").map(|d| d.config_dir().to_path_buf())
}

/// Default directory for exported images.
pub fn images_directory() -> PathBuf {
    exe_directory().join("images")
}

/// A fresh file name for an export, unique to the second.
pub fn export_file_name() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("domainplot_{secs}.png")
}
