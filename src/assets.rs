//! # Raster Assets
//!
//! Image files staged next to the app (the payment QR code, logos) and
//! turned into [`TextRaster`]s at print time.
//!
//! Downloading and caching the files is somebody else's job; a store only
//! answers "is it there?" and "give me its pixels".

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use tracing::debug;

use crate::error::PrinterError;
use crate::layout::TextRaster;

/// Lookup of named raster images.
pub trait AssetStore: Send + Sync {
    fn exists(&self, name: &str) -> bool;

    fn load(&self, name: &str) -> Result<TextRaster, PrinterError>;
}

/// Assets read from files in one directory.
///
/// Images wider than `max_width` are scaled down, preserving aspect ratio,
/// then thresholded to black and white.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
    max_width: usize,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>, max_width: usize) -> Self {
        Self {
            root: root.into(),
            max_width,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names are bare file names; anything that could escape the root is
    /// treated as absent.
    fn path_for(&self, name: &str) -> Option<PathBuf> {
        let bare = Path::new(name).file_name()?;
        if bare != name {
            return None;
        }
        Some(self.root.join(bare))
    }
}

impl AssetStore for DirAssetStore {
    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_some_and(|p| p.is_file())
    }

    fn load(&self, name: &str) -> Result<TextRaster, PrinterError> {
        let path = self
            .path_for(name)
            .filter(|p| p.is_file())
            .ok_or_else(|| PrinterError::AssetMissing(format!("{} not found", name)))?;

        let mut image = image::open(&path)
            .map_err(|e| PrinterError::Image(format!("Failed to decode {}: {}", name, e)))?;

        if image.width() as usize > self.max_width {
            let aspect = image.height() as f32 / image.width() as f32;
            let height = (self.max_width as f32 * aspect).round().max(1.0) as u32;
            image = image.resize_exact(self.max_width as u32, height, FilterType::Triangle);
        }
        debug!(name, width = image.width(), height = image.height(), "loaded asset");

        Ok(TextRaster::from_gray(&image.to_luma8()))
    }
}

/// A store with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetStore for NoAssets {
    fn exists(&self, _name: &str) -> bool {
        false
    }

    fn load(&self, name: &str) -> Result<TextRaster, PrinterError> {
        Err(PrinterError::AssetMissing(format!("{} not found", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("printer-drivers-assets-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_is_asset_missing() {
        let store = DirAssetStore::new(temp_dir("missing"), 576);
        assert!(!store.exists("qr-code.png"));
        let err = store.load("qr-code.png").unwrap_err();
        assert_eq!(err.to_string(), "Asset missing: qr-code.png not found");
    }

    #[test]
    fn test_path_escape_is_absent() {
        let store = DirAssetStore::new(temp_dir("escape"), 576);
        assert!(!store.exists("../etc/passwd"));
        assert!(matches!(store.load("a/b.png"), Err(PrinterError::AssetMissing(_))));
    }

    #[test]
    fn test_load_thresholds_and_scales() {
        let dir = temp_dir("load");
        let mut img = GrayImage::from_pixel(1152, 40, Luma([255]));
        for x in 0..576 {
            for y in 0..40 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        img.save(dir.join("half.png")).unwrap();

        let store = DirAssetStore::new(&dir, 576);
        assert!(store.exists("half.png"));
        let raster = store.load("half.png").unwrap();
        assert_eq!(raster.width(), 576);
        assert_eq!(raster.height(), 20);
        assert!(raster.get(10, 10));
        assert!(!raster.get(570, 10));
    }

    #[test]
    fn test_no_assets() {
        assert!(!NoAssets.exists("anything.png"));
        assert!(NoAssets.load("anything.png").is_err());
    }
}
