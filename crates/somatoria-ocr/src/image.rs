//! Loading answer-sheet photos from disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};

use somatoria_core::traits::OcrRequest;

/// Whether the file extension maps to an `image/*` MIME type.
pub fn is_image_path(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
}

/// Read one image into an OCR request. Returns `None` for non-image files.
pub fn load_image(path: &Path) -> Result<Option<OcrRequest>> {
    if !is_image_path(path) {
        tracing::warn!("skipping {}: not an image", path.display());
        return Ok(None);
    }

    let data = std::fs::read(path)
        .with_context(|| format!("failed to read image: {}", path.display()))?;
    let encoded = general_purpose::STANDARD.encode(&data);

    Ok(Some(
        OcrRequest::new(encoded).with_source(path.display().to_string()),
    ))
}

/// Load images in the given order. Directories contribute their image files
/// sorted by name; non-image files are skipped.
pub fn load_images(paths: &[PathBuf]) -> Result<Vec<OcrRequest>> {
    let mut requests = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries = std::fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()?;
            entries.sort();
            for entry in entries.iter().filter(|p| p.is_file()) {
                requests.extend(load_image(entry)?);
            }
        } else {
            requests.extend(load_image(path)?);
        }
    }

    Ok(requests)
}
