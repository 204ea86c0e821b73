//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bodymap.toml` files.

use crate::render::Colormap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".bodymap.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Rendering settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the PNG outputs are written to.
    #[serde(default = "default_dir")]
    pub output_dir: PathBuf,

    /// Directory searched for `<figure>.png` backgrounds.
    #[serde(default = "default_dir")]
    pub backgrounds_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_dir(),
            backgrounds_dir: default_dir(),
            verbose: false,
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Image layout and per-breakdown settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Width of one panel's plot area in pixels.
    #[serde(default = "default_panel_width")]
    pub panel_width: u32,

    /// Height of one panel's plot area in pixels.
    #[serde(default = "default_panel_height")]
    pub panel_height: u32,

    /// Scatter marker radius in pixels.
    #[serde(default = "default_point_radius")]
    pub point_radius: u32,

    /// Font used for titles and labels. Falls back to well-known system fonts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Panels per figure region.
    #[serde(default = "BreakdownStyle::figure")]
    pub figure: BreakdownStyle,

    /// Panels per contact type.
    #[serde(default = "BreakdownStyle::contact_type")]
    pub contact_type: BreakdownStyle,

    /// Panels per contact direction.
    #[serde(default = "BreakdownStyle::direction")]
    pub direction: BreakdownStyle,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            panel_width: default_panel_width(),
            panel_height: default_panel_height(),
            point_radius: default_point_radius(),
            font_path: None,
            figure: BreakdownStyle::figure(),
            contact_type: BreakdownStyle::contact_type(),
            direction: BreakdownStyle::direction(),
        }
    }
}

fn default_panel_width() -> u32 {
    600
}

fn default_panel_height() -> u32 {
    800
}

fn default_point_radius() -> u32 {
    10
}

/// Settings for one breakdown image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownStyle {
    /// Histogram bins per axis.
    pub bins: usize,
    /// Colormap for the bin counts.
    pub colormap: Colormap,
    /// Opacity of the heatmap layer.
    pub heatmap_alpha: f32,
    /// Opacity of the background figure image.
    pub background_alpha: f32,
    /// Output file name, relative to the output directory.
    pub output: String,
}

impl BreakdownStyle {
    pub fn figure() -> Self {
        Self {
            bins: 15,
            colormap: Colormap::Hot,
            heatmap_alpha: 0.5,
            background_alpha: 0.7,
            output: "heatmaps_on_figures.png".to_string(),
        }
    }

    pub fn contact_type() -> Self {
        Self {
            bins: 12,
            colormap: Colormap::Reds,
            heatmap_alpha: 0.6,
            background_alpha: 0.6,
            output: "heatmaps_by_contacttype.png".to_string(),
        }
    }

    pub fn direction() -> Self {
        Self {
            bins: 12,
            colormap: Colormap::Blues,
            heatmap_alpha: 0.6,
            background_alpha: 0.6,
            output: "heatmaps_by_direction.png".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Reject settings the renderer cannot honor.
    pub fn validate(&self) -> Result<()> {
        let render = &self.render;
        if render.panel_width == 0 || render.panel_height == 0 {
            anyhow::bail!("Panel dimensions must be at least 1 pixel");
        }

        for (name, style) in [
            ("figure", &render.figure),
            ("contact_type", &render.contact_type),
            ("direction", &render.direction),
        ] {
            if style.bins == 0 {
                anyhow::bail!("[render.{}] bins must be at least 1", name);
            }
            for alpha in [style.heatmap_alpha, style.background_alpha] {
                if !(0.0..=1.0).contains(&alpha) {
                    anyhow::bail!("[render.{}] alpha values must be between 0.0 and 1.0", name);
                }
            }
            if style.output.trim().is_empty() {
                anyhow::bail!("[render.{}] output file name is empty", name);
            }
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(ref dir) = args.backgrounds {
            self.general.backgrounds_dir = dir.clone();
        }
        if let Some(ref font) = args.font {
            self.render.font_path = Some(font.clone());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
