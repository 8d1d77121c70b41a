use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Paths ─────────────────────────────────────────────────────────────────────

/// Directory holding the two persisted blobs and the log file.
///
/// `SHOWCASE_DATA_DIR` overrides the platform data dir, mainly so several
/// profiles can run side by side.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SHOWCASE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join("showcase"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn users_file(base: &Path) -> PathBuf {
    base.join("users.json")
}
pub fn session_file(base: &Path) -> PathBuf {
    base.join("session.json")
}
pub fn log_file(base: &Path) -> PathBuf {
    base.join("showcase.log")
}

// ── Image files ───────────────────────────────────────────────────────────────

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|a| *a == e)
        })
        .unwrap_or(false)
}

pub fn image_mime(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

// ── JSON helpers ──────────────────────────────────────────────────────────────

/// Load a JSON blob, falling back to `T::default()` when the file is absent
/// or unreadable. A file that exists but fails to parse is logged and then
/// treated the same way; the caller never sees the error.
pub fn load_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str(&s) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("malformed {}: {e}; starting empty", path.display());
                T::default()
            }
        },
        Err(_) => T::default(),
    }
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

// ── Theme ─────────────────────────────────────────────────────────────────────

pub const THEME: Color = Color::Cyan;

// ── Header ────────────────────────────────────────────────────────────────────

pub const HEADER_LINES: &[&str] = &[
    "CREATIVE SHOWCASE",
    "SHARE AND BROWSE LOCAL GALLERIES",
    "-OFFLINE EDITION-",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extension_filter_is_case_insensitive() {
        assert!(is_image_file(Path::new("a.PNG")));
        assert!(is_image_file(Path::new("photo.jpeg")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn mime_matches_extension() {
        assert_eq!(image_mime(Path::new("a.png")), Some("image/png"));
        assert_eq!(image_mime(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("a.tiff")), None);
    }
}
