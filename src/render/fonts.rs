//! Font registration for chart text.
//!
//! Charts draw text with the `sans-serif` family. A font file is loaded
//! from the configured path or a well-known system location and
//! registered under that family; without one, charts are drawn with no
//! text at all.

use ab_glyph::FontRef;
use anyhow::{anyhow, Context, Result};
use plotters::style::{register_font, FontStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Family name every chart text style uses.
pub const FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Whether chart text can be drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fonts {
    available: bool,
}

impl Fonts {
    /// Register the configured font, or the first usable system font.
    ///
    /// A configured font that cannot be loaded is an error.
    pub fn resolve(configured: Option<&Path>) -> Result<Self> {
        if let Some(path) = configured {
            register(path).with_context(|| format!("Failed to load font {}", path.display()))?;
            return Ok(Self { available: true });
        }

        for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
            if !candidate.is_file() {
                continue;
            }
            match register(&candidate) {
                Ok(()) => {
                    debug!("Using font {}", candidate.display());
                    return Ok(Self { available: true });
                }
                Err(e) => debug!("Skipping font {}: {}", candidate.display(), e),
            }
        }

        warn!("No usable font found; titles and labels will be omitted (set --font)");
        Ok(Self::none())
    }

    /// Draw charts without text.
    pub fn none() -> Self {
        Self { available: false }
    }

    pub fn available(&self) -> bool {
        self.available
    }
}

fn register(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)?;
    FontRef::try_from_slice(&bytes).map_err(|e| anyhow!("invalid font data: {}", e))?;

    // Registered fonts live for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| anyhow!("font rejected by the chart backend"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_has_no_text() {
        assert!(!Fonts::none().available());
    }

    #[test]
    fn test_bad_configured_font_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"definitely not a font").unwrap();
        assert!(Fonts::resolve(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_configured_font_is_error() {
        assert!(Fonts::resolve(Some(Path::new("/nonexistent/font.ttf"))).is_err());
    }
}
