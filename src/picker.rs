//! Filesystem image picker. Stands in for the browser file-input: the user
//! walks directories, picks an image file, and the file is read once and
//! staged as an inline `data:` URL ready for upload.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{image_mime, is_image_file};
use crate::ui::{flash_message, human_size, run_menu, MenuResult, Term};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

// ── Staged upload ─────────────────────────────────────────────────────────────

/// A picked file, encoded and ready to hand to the store.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub name: String,
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl StagedUpload {
    pub fn summary(&self) -> String {
        format!(
            "{} ({}x{}, {})",
            self.name,
            self.width,
            self.height,
            human_size(self.data_url.len())
        )
    }
}

/// Read, validate, and encode one file. The payload must actually decode as
/// an image; the decoded dimensions are kept for the preview line.
pub fn stage_file(path: &Path) -> Result<StagedUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let decoded = image::load_from_memory(&bytes)
        .with_context(|| format!("{} does not decode as an image", path.display()))?
        .into_rgba8();
    let (width, height) = decoded.dimensions();

    let mime = image_mime(path).unwrap_or("application/octet-stream");
    let data_url = format!("data:{mime};base64,{}", STANDARD.encode(&bytes));

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(StagedUpload {
        name,
        data_url,
        width,
        height,
    })
}

// ── Directory scanning ────────────────────────────────────────────────────────

pub fn scan_images(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(rd) = std::fs::read_dir(folder) {
        for entry in rd.flatten() {
            let p = entry.path();
            if p.is_file() && is_image_file(&p) {
                files.push(p);
            }
        }
    }
    files.sort_by_key(|f| f.file_name().unwrap_or_default().to_string_lossy().to_lowercase().to_string());
    files
}

pub fn scan_subfolders(folder: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(rd) = std::fs::read_dir(folder) {
        for entry in rd.flatten() {
            let p = entry.path();
            let hidden = p
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true);
            if p.is_dir() && !hidden {
                dirs.push(p);
            }
        }
    }
    dirs.sort_by_key(|d| d.file_name().unwrap_or_default().to_string_lossy().to_lowercase().to_string());
    dirs
}

// ── Picker screen ─────────────────────────────────────────────────────────────

fn file_label(p: &Path) -> String {
    p.file_name().unwrap_or_default().to_string_lossy().into_owned()
}

fn dir_label(p: &Path) -> String {
    format!("{}/", file_label(p))
}

/// Browse from the home directory; `None` when the user backs out.
pub fn pick_image(terminal: &mut Term) -> Result<Option<StagedUpload>> {
    let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

    loop {
        let subdirs = scan_subfolders(&dir);
        let files = scan_images(&dir);

        let mut labels: Vec<String> = Vec::new();
        labels.push("../".to_string());
        labels.extend(subdirs.iter().map(|d| dir_label(d)));
        labels.extend(files.iter().map(|f| file_label(f)));
        labels.push("---".to_string());
        labels.push("Cancel".to_string());
        let opts: Vec<&str> = labels.iter().map(String::as_str).collect();

        let subtitle = format!("{}  ({} images here)", dir.display(), files.len());
        let result = run_menu(terminal, "Choose an Image", &opts, Some(&subtitle))?;

        match result {
            MenuResult::Back => return Ok(None),
            MenuResult::Selected(sel) => {
                if sel == "Cancel" {
                    return Ok(None);
                }
                if sel == "../" {
                    if let Some(parent) = dir.parent() {
                        dir = parent.to_path_buf();
                    }
                    continue;
                }
                if let Some(d) = subdirs.iter().find(|d| dir_label(d) == sel) {
                    dir = d.clone();
                    continue;
                }
                if let Some(f) = files.iter().find(|f| file_label(f) == sel) {
                    match stage_file(f) {
                        Ok(staged) => return Ok(Some(staged)),
                        Err(e) => flash_message(terminal, &format!("Cannot use file: {e:#}"), 1500)?,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn staging_a_png_yields_a_png_data_url_with_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let staged = stage_file(&path).unwrap();
        assert!(staged.data_url.starts_with("data:image/png;base64,"));
        assert_eq!((staged.width, staged.height), (2, 3));
        assert_eq!(staged.name, "tiny.png");
    }

    #[test]
    fn staging_a_non_image_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(stage_file(&path).is_err());
    }

    #[test]
    fn scan_only_returns_image_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes()).unwrap();
        std::fs::write(dir.path().join("b.txt"), b"hi").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let files = scan_images(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.png"));

        let dirs = scan_subfolders(dir.path());
        assert_eq!(dirs.len(), 1);
        assert!(dirs[0].ends_with("sub"));
    }
}
