//! Local-disk [`LayerStore`].
//!
//! Edit layers live next to their original as hidden PNGs:
//! `.name_d.png` (draw), `.name_m.png` (mask) and `.name_r.png` (the
//! composite written on every save).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::{imageops, RgbaImage};
use tracing::{debug, info, warn};

use putimage_core::{
    file_stem, DirectoryLabel, EditedLayers, ImageRecord, LayerStore, StoreError,
};

/// File extensions picked up by a listing.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerFile {
    Draw,
    Mask,
    Result,
}

impl LayerFile {
    const ALL: [LayerFile; 3] = [LayerFile::Draw, LayerFile::Mask, LayerFile::Result];

    fn suffix(self) -> &'static str {
        match self {
            Self::Draw => "d",
            Self::Mask => "m",
            Self::Result => "r",
        }
    }

    /// Name (without extension) and path of this layer for `original`.
    fn locate(self, original: &Path) -> Result<(String, PathBuf), StoreError> {
        let base = original
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::InvalidPath(original.display().to_string()))?;
        let name = format!(".{}_{}", file_stem(base), self.suffix());
        let path = original.with_file_name(format!("{name}.png"));
        Ok((name, path))
    }
}

/// Stores layers beside the originals and resolves the `input` / `output`
/// labels under `root`.
#[derive(Debug, Clone)]
pub struct FsLayerStore {
    root: PathBuf,
}

impl FsLayerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn label_dir(&self, label: DirectoryLabel) -> PathBuf {
        self.root.join(label.as_str())
    }

    /// Path of the composite written by the last save, if any.
    pub fn result_path(original_path: &str) -> Option<PathBuf> {
        LayerFile::Result
            .locate(Path::new(original_path))
            .ok()
            .map(|(_, path)| path)
    }

    fn record_for(original: &Path, name: &str) -> ImageRecord {
        let mut record = ImageRecord::new(path_string(original), file_stem(name));
        if let Ok((name, path)) = LayerFile::Draw.locate(original) {
            if path.is_file() {
                record.draw_name = Some(name);
                record.draw_path = Some(path_string(&path));
            }
        }
        if let Ok((name, path)) = LayerFile::Mask.locate(original) {
            if path.is_file() {
                record.mask_name = Some(name);
                record.mask_path = Some(path_string(&path));
            }
        }
        record
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn is_listed(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    match name.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|e| ext.eq_ignore_ascii_case(e)),
        None => false,
    }
}

fn image_err(e: image::ImageError) -> StoreError {
    StoreError::Image(e.to_string())
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    fs::write(path, bytes).map_err(|e| StoreError::io(path, e))
}

/// Original as RGBA, draw layer composited over it, alpha taken from the
/// stored mask.
fn composite(original: &Path, draw: &[u8], mask: &[u8]) -> Result<RgbaImage, StoreError> {
    let mut base = image::open(original).map_err(image_err)?.to_rgba8();
    let draw = image::load_from_memory(draw).map_err(image_err)?.to_rgba8();
    let mask = image::load_from_memory(mask).map_err(image_err)?.to_rgba8();

    for (kind, layer) in [("draw", &draw), ("mask", &mask)] {
        if layer.dimensions() != base.dimensions() {
            return Err(StoreError::Rejected(format!(
                "{kind} layer is {:?}, original is {:?}",
                layer.dimensions(),
                base.dimensions()
            )));
        }
    }

    imageops::overlay(&mut base, &draw, 0, 0);
    for (px, m) in base.pixels_mut().zip(mask.pixels()) {
        px[3] = m[3];
    }
    Ok(base)
}

impl LayerStore for FsLayerStore {
    fn list_images(&self, dir: &str) -> Result<Vec<ImageRecord>, StoreError> {
        if dir.trim().is_empty() {
            return Ok(Vec::new());
        }
        let path = Path::new(dir);
        if !path.is_dir() {
            debug!("{dir:?} is not a directory, listing nothing");
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| StoreError::io(path, e))? {
            let entry = entry.map_err(|e| StoreError::io(path, e))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_listed(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        Ok(names
            .iter()
            .map(|name| Self::record_for(&path.join(name), name))
            .collect())
    }

    fn fetch_raster(&self, path: &str, cache_token: u64) -> Result<Vec<u8>, StoreError> {
        debug!("fetching {path:?} (token {cache_token})");
        fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
            _ => StoreError::io(path, e),
        })
    }

    fn save_edited_layers(
        &self,
        original_path: &str,
        draw: &[u8],
        mask: &[u8],
    ) -> Result<EditedLayers, StoreError> {
        let original = Path::new(original_path);
        if !original.is_file() {
            return Err(StoreError::NotFound(original_path.to_string()));
        }
        let (draw_name, draw_path) = LayerFile::Draw.locate(original)?;
        let (mask_name, mask_path) = LayerFile::Mask.locate(original)?;
        let (_, result_path) = LayerFile::Result.locate(original)?;

        // Nothing is written unless every layer decodes and lines up.
        let result = composite(original, draw, mask)?;
        let written = write(&draw_path, draw)
            .and_then(|()| write(&mask_path, mask))
            .and_then(|()| result.save(&result_path).map_err(image_err));
        if let Err(e) = written {
            warn!("saving layers for {original_path:?} failed, removing partial files");
            for path in [&draw_path, &mask_path, &result_path] {
                let _ = fs::remove_file(path);
            }
            return Err(e);
        }
        info!("saved edit layers for {original_path:?}");

        Ok(EditedLayers {
            draw_name,
            draw_path: path_string(&draw_path),
            mask_name,
            mask_path: path_string(&mask_path),
        })
    }

    fn clear_edited_layers(&self, original_path: &str) -> Result<(), StoreError> {
        let original = Path::new(original_path);
        for layer in LayerFile::ALL {
            let (_, path) = layer.locate(original)?;
            match fs::remove_file(&path) {
                Ok(()) => debug!("removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
        info!("cleared edit layers for {original_path:?}");
        Ok(())
    }

    fn send_to_dir(&self, path: &str, label: DirectoryLabel) -> Result<(), StoreError> {
        let src = Path::new(path);
        if !src.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let dir = self.label_dir(label);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let ext = src
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let mut dest = dir.join(format!("{millis}{ext}"));
        while dest.exists() {
            millis += 1;
            dest = dir.join(format!("{millis}{ext}"));
        }

        fs::copy(src, &dest).map_err(|e| StoreError::io(&dest, e))?;
        info!("sent {path:?} to {}", dest.display());
        Ok(())
    }
}
