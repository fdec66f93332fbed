//! Centralized path functions for app storage locations.

use std::path::PathBuf;

/// App cache root: `~/Library/Caches/forum-harvest/` (macOS) or `~/.cache/forum-harvest/` (Linux).
pub fn app_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("forum-harvest"))
}

/// SQLite database file: `<app_cache_dir>/forum-harvest.db`.
pub fn db_path() -> Option<PathBuf> {
    app_cache_dir().map(|d| d.join("forum-harvest.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_cache_dir() {
        let dir = app_cache_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains("forum-harvest"));
    }

    #[test]
    fn test_db_path() {
        let path = db_path().unwrap();
        assert!(path.to_string_lossy().ends_with("forum-harvest.db"));
    }
}
