//! Colormaps as HSL ramps.

use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Colormap used to shade bin counts or scatter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Black → red → yellow → white.
    Hot,
    /// Near-white → dark red.
    Reds,
    /// Near-white → dark blue.
    Blues,
    /// Purple → teal → yellow.
    Viridis,
}

impl Colormap {
    /// Color at `t`, clamped to `[0, 1]`. NaN maps to the low end.
    pub fn color(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let hsl = match self {
            Colormap::Hot => HSLColor(60.0 * t / 360.0, 1.0, 0.05 + 0.9 * t),
            Colormap::Reds => HSLColor(0.0, 0.85, 0.96 - 0.6 * t),
            Colormap::Blues => HSLColor(210.0 / 360.0, 0.8, 0.96 - 0.6 * t),
            Colormap::Viridis => HSLColor((280.0 - 220.0 * t) / 360.0, 0.7, 0.3 + 0.35 * t),
        };
        let (r, g, b) = hsl.to_backend_color().rgb;
        RGBColor(r, g, b)
    }

    /// Color for `value` normalized over `[min, max]`.
    ///
    /// A degenerate range maps every value to the low end.
    pub fn color_in_range(&self, value: f64, min: f64, max: f64) -> RGBColor {
        if max > min {
            self.color((value - min) / (max - min))
        } else {
            self.color(0.0)
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colormap::Hot => "hot",
            Colormap::Reds => "reds",
            Colormap::Blues => "blues",
            Colormap::Viridis => "viridis",
        };
        write!(f, "{}", name)
    }
}
