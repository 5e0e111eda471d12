use std::path::{Path, PathBuf};

const BASE_DIR_ENV: &str = "PO_TRANSLATOR_DIR";

pub(crate) fn config_dir() -> PathBuf {
    if let Some(dir) = base_dir_override() {
        return dir;
    }
    home_join(".po-translator").unwrap_or_else(|| PathBuf::from(".po-translator"))
}

pub(crate) fn cache_dir() -> PathBuf {
    if let Some(dir) = base_dir_override() {
        return dir.join(".cache");
    }
    home_join(".po-translator/.cache").unwrap_or_else(|| PathBuf::from(".po-translator/.cache"))
}

fn base_dir_override() -> Option<PathBuf> {
    std::env::var(BASE_DIR_ENV).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    })
}

fn home_join(suffix: &str) -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(suffix))
        }
    })
}
