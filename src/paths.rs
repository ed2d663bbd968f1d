//! Where snipstamp keeps its config and logs.
//!
//! Debug builds and `cargo run` keep everything next to the working
//! directory. Installed builds use the platform's per-user locations
//! (`~/.config/snipstamp` for config on Linux, the data dir elsewhere).

use std::path::PathBuf;

const APP_DIR: &str = "snipstamp";

/// `cargo run` or a debug build
pub fn is_dev_mode() -> bool {
    std::env::var("CARGO").is_ok() || cfg!(debug_assertions)
}

pub fn config_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }

    #[cfg(target_os = "linux")]
    {
        dirs::config_dir().map(|p| p.join(APP_DIR))
    }

    #[cfg(not(target_os = "linux"))]
    {
        data_dir()
    }
}

pub fn data_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }
    dirs::data_dir().map(|p| p.join(APP_DIR))
}

/// `config.json` inside [`config_dir`], or in the working directory as a
/// last resort.
pub fn config_file() -> PathBuf {
    config_dir()
        .map(|p| p.join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

pub fn logs_dir() -> PathBuf {
    data_dir()
        .map(|p| p.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Start directory for the open dialog before any PDF was opened.
pub fn default_documents_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Create the config, data and log directories. Nothing to do in dev mode.
pub fn ensure_directories() -> std::io::Result<()> {
    if is_dev_mode() {
        return Ok(());
    }

    if let Some(config) = config_dir() {
        std::fs::create_dir_all(&config)?;
    }
    if data_dir().is_some() {
        std::fs::create_dir_all(logs_dir())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_json() {
        assert_eq!(config_file(), PathBuf::from("./config.json"));
    }

    #[test]
    fn test_debug_builds_stay_local() {
        assert!(is_dev_mode());
        assert_eq!(config_dir(), Some(PathBuf::from(".")));
        assert_eq!(data_dir(), Some(PathBuf::from(".")));
        assert!(ensure_directories().is_ok());
    }

    #[test]
    fn test_logs_dir_is_under_data_dir() {
        assert_eq!(logs_dir(), PathBuf::from("./logs"));
    }

    #[test]
    fn test_documents_dir_is_never_empty() {
        assert!(!default_documents_dir().as_os_str().is_empty());
    }
}
