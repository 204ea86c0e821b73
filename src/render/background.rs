//! Optional background figure images.
//!
//! A figure named `arm` is drawn over `arm.png` from the backgrounds
//! directory when that file exists. A missing file is not an error: the
//! caller falls back to a flat gray plot area.

use crate::error::BodymapError;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A decoded background image.
#[derive(Debug, Clone)]
pub struct Background {
    pub path: PathBuf,
    pub image: RgbaImage,
}

impl Background {
    /// Stretch to `width` x `height` and fade over white at `alpha`.
    ///
    /// Returns a packed RGB buffer, row-major.
    pub fn faded_rgb(&self, width: u32, height: u32, alpha: f32) -> Vec<u8> {
        let scaled = imageops::resize(&self.image, width, height, FilterType::Triangle);
        let mut buf = Vec::with_capacity((width * height * 3) as usize);

        for px in scaled.pixels() {
            let coverage = alpha.clamp(0.0, 1.0) * (px[3] as f32 / 255.0);
            for c in 0..3 {
                let mixed = px[c] as f32 * coverage + 255.0 * (1.0 - coverage);
                buf.push(mixed.round() as u8);
            }
        }
        buf
    }
}

/// Outcome of a background lookup.
#[derive(Debug, Clone)]
pub enum BackgroundLookup {
    Present(Background),
    Absent(PathBuf),
}

impl BackgroundLookup {
    /// File that was looked for.
    pub fn path(&self) -> &Path {
        match self {
            BackgroundLookup::Present(bg) => &bg.path,
            BackgroundLookup::Absent(path) => path,
        }
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        match self {
            BackgroundLookup::Present(bg) => Some(&bg.image),
            BackgroundLookup::Absent(_) => None,
        }
    }
}

/// Resolves `<figure>.png` files inside one directory.
#[derive(Debug, Clone)]
pub struct BackgroundStore {
    dir: PathBuf,
}

impl BackgroundStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a figure's background would have.
    ///
    /// Relative to the working directory when the store is `.`.
    pub fn path_for(&self, figure: &str) -> PathBuf {
        let file = format!("{}.png", figure);
        if self.dir == Path::new(".") {
            PathBuf::from(file)
        } else {
            self.dir.join(file)
        }
    }

    /// Look up and decode a figure's background.
    ///
    /// A file that exists but cannot be decoded is an error.
    pub fn lookup(&self, figure: &str) -> Result<BackgroundLookup, BodymapError> {
        let path = self.path_for(figure);

        if !path.is_file() {
            debug!("No background at {}", path.display());
            return Ok(BackgroundLookup::Absent(path));
        }

        let image = image::open(&path)
            .map_err(|source| BodymapError::Image {
                path: path.clone(),
                source,
            })?
            .to_rgba8();

        debug!(
            "Loaded background {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(BackgroundLookup::Present(Background { path, image }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_missing_background_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackgroundStore::new(dir.path());

        let lookup = store.lookup("arm").unwrap();
        assert!(lookup.image().is_none());
        assert_eq!(lookup.path(), dir.path().join("arm.png"));
    }

    #[test]
    fn test_present_background_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        img.save(dir.path().join("torso.png")).unwrap();

        let store = BackgroundStore::new(dir.path());
        let lookup = store.lookup("torso").unwrap();
        let decoded = lookup.image().expect("background should be present");
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_path_for_working_directory_is_bare_file_name() {
        let store = BackgroundStore::new(".");
        assert_eq!(store.path_for("arm"), PathBuf::from("arm.png"));

        let store = BackgroundStore::new("figures");
        assert_eq!(store.path_for("arm"), Path::new("figures").join("arm.png"));
    }

    #[test]
    fn test_faded_rgb_blends_over_white() {
        let background = Background {
            path: PathBuf::from("arm.png"),
            image: RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])),
        };

        let opaque = background.faded_rgb(4, 3, 1.0);
        assert_eq!(opaque.len(), 4 * 3 * 3);
        assert!(opaque.iter().all(|&v| v == 0));

        let half = background.faded_rgb(1, 1, 0.5);
        assert_eq!(half, vec![128, 128, 128]);

        let hidden = background.faded_rgb(1, 1, 0.0);
        assert_eq!(hidden, vec![255, 255, 255]);
    }

    #[test]
    fn test_corrupt_background_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("head.png"), b"not a png").unwrap();

        let store = BackgroundStore::new(dir.path());
        assert!(matches!(
            store.lookup("head"),
            Err(BodymapError::Image { .. })
        ));
    }
}
