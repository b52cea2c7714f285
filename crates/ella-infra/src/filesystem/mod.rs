//! Data directory layout.
//!
//! Everything Ella persists lives under one directory: the SQLite database
//! and `config.toml`.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ELLA_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `ELLA_DATA_DIR` environment variable
/// 2. `~/.ella`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".ella");
    }

    PathBuf::from(".ella")
}

/// SQLite URL for the database inside `data_dir`.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join("ella.db").display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url() {
        let url = database_url(Path::new("/home/user/.ella"));
        assert_eq!(url, "sqlite:///home/user/.ella/ella.db?mode=rwc");
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-ella");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-ella"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }
}
