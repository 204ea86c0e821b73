//! Heatmap rendering.
//!
//! Each [`Breakdown`] partitions the point table by one categorical
//! column and renders one panel per category, side by side, into a
//! single PNG. A panel stacks, bottom to top: the background figure (or a
//! flat gray fill), the color-mapped bin counts, and a scatter of the raw
//! points. Title, axis labels and a color bar surround the plot area.

pub mod background;
pub mod colormap;
pub mod fonts;

pub use background::{BackgroundLookup, BackgroundStore};
pub use colormap::Colormap;

use crate::analysis::{Histogram2d, PointTable};
use crate::config::{BreakdownStyle, RenderConfig};
use crate::error::BodymapError;
use crate::models::{Column, Direction, TouchPoint};
use anyhow::{Context, Result};
use fonts::Fonts;
use indicatif::{ProgressBar, ProgressStyle};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PANEL_MARGIN: u32 = 10;
const TITLE_AREA: u32 = 40;
const X_LABEL_AREA: u32 = 50;
const Y_LABEL_AREA: u32 = 60;
const COLORBAR_WIDTH: u32 = 20;
const COLORBAR_LABEL_AREA: u32 = 70;
const COLORBAR_AREA: u32 = COLORBAR_WIDTH + COLORBAR_LABEL_AREA + 2 * PANEL_MARGIN;
const COLORBAR_STRIPES: usize = 64;
const TITLE_SIZE: f64 = 22.0;
const AXIS_TICKS: usize = 6;

/// Plot fill when a figure has no background image.
const LIGHT_GRAY: RGBColor = RGBColor(211, 211, 211);

/// One categorical partition of the touch log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    Figure,
    ContactType,
    Direction,
}

/// How scatter markers are colored.
#[derive(Debug, Clone, Copy)]
pub enum MarkerFill {
    /// Confidence mapped through a colormap over the subset's range.
    Confidence(Colormap),
    Fixed(RGBColor),
}

impl Breakdown {
    /// All breakdowns in rendering order.
    pub const ALL: [Breakdown; 3] = [Breakdown::Figure, Breakdown::ContactType, Breakdown::Direction];

    pub fn column(&self) -> Column {
        match self {
            Breakdown::Figure => Column::Figure,
            Breakdown::ContactType => Column::ContactType,
            Breakdown::Direction => Column::Direction,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Breakdown::Figure => "figure",
            Breakdown::ContactType => "contact type",
            Breakdown::Direction => "direction",
        }
    }

    pub fn style<'a>(&self, config: &'a RenderConfig) -> &'a BreakdownStyle {
        match self {
            Breakdown::Figure => &config.figure,
            Breakdown::ContactType => &config.contact_type,
            Breakdown::Direction => &config.direction,
        }
    }

    /// Panel title for `value` with `count` points.
    pub fn title(&self, value: &str, count: usize) -> Result<String, BodymapError> {
        Ok(match self {
            Breakdown::Figure => format!("{} - Contact Heatmap ({} points)", capitalize(value), count),
            Breakdown::ContactType => format!("{} Contacts ({} points)", capitalize(value), count),
            Breakdown::Direction => {
                let direction: Direction = value.parse()?;
                format!("{} ({} points)", direction.label(), count)
            }
        })
    }

    pub fn marker_fill(&self) -> MarkerFill {
        match self {
            Breakdown::Figure => MarkerFill::Confidence(Colormap::Viridis),
            Breakdown::ContactType => MarkerFill::Fixed(BLUE),
            Breakdown::Direction => MarkerFill::Fixed(RED),
        }
    }

    pub fn marker_alpha(&self) -> f64 {
        match self {
            Breakdown::Figure => 0.7,
            Breakdown::ContactType | Breakdown::Direction => 0.6,
        }
    }

    pub fn colorbar_label(&self) -> &'static str {
        match self {
            Breakdown::Figure => "Contact Intensity",
            Breakdown::ContactType | Breakdown::Direction => "Count",
        }
    }

    /// Only the figure breakdown labels its axes.
    pub fn has_axis_labels(&self) -> bool {
        matches!(self, Breakdown::Figure)
    }

    /// Only the figure breakdown reports each background lookup.
    pub fn announces_backgrounds(&self) -> bool {
        matches!(self, Breakdown::Figure)
    }

    /// Console line announcing the written image.
    pub fn saved_message(&self, path: &Path) -> String {
        let what = match self {
            Breakdown::Figure => "Heatmaps overlaid on figures",
            Breakdown::ContactType => "Heatmaps by contact type",
            Breakdown::Direction => "Heatmaps by direction",
        };
        format!("✓ {} saved as '{}'", what, path.display())
    }
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Renders breakdown images into an output directory.
pub struct Renderer {
    config: RenderConfig,
    backgrounds: BackgroundStore,
    fonts: Fonts,
    output_dir: PathBuf,
    show_progress: bool,
}

/// Everything one panel needs, resolved before any drawing starts.
struct Panel<'a> {
    value: &'a str,
    title: String,
    rows: &'a [&'a TouchPoint],
    background: BackgroundLookup,
    hist: Histogram2d,
}

impl Renderer {
    pub fn new(
        config: RenderConfig,
        backgrounds: BackgroundStore,
        fonts: Fonts,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            backgrounds,
            fonts,
            output_dir: output_dir.into(),
            show_progress: false,
        }
    }

    /// Show a progress bar while panels render.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Width of one panel including its label area and color bar.
    pub fn tile_width(&self) -> u32 {
        Y_LABEL_AREA + self.config.panel_width + 2 * PANEL_MARGIN + COLORBAR_AREA
    }

    /// Height of one panel including title and axis label areas.
    pub fn tile_height(&self) -> u32 {
        TITLE_AREA + 2 * PANEL_MARGIN + self.config.panel_height + X_LABEL_AREA
    }

    /// Render every breakdown in order, returning the written paths.
    pub fn render_all(&self, table: &PointTable) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(Breakdown::ALL.len());
        for breakdown in Breakdown::ALL {
            let path = self.render(table, breakdown)?;
            println!("{}", breakdown.saved_message(&path));
            written.push(path);
        }
        Ok(written)
    }

    /// Render one breakdown to its configured output file.
    ///
    /// Titles, backgrounds and histograms are resolved first, so a bad
    /// direction value or a corrupt background leaves no output file.
    pub fn render(&self, table: &PointTable, breakdown: Breakdown) -> Result<PathBuf> {
        let style = breakdown.style(&self.config);
        let groups = table.group_by(breakdown.column());
        if groups.is_empty() {
            return Err(BodymapError::EmptyBreakdown(breakdown.name()).into());
        }

        info!(
            "Rendering {} panels for the {} breakdown",
            groups.len(),
            breakdown.name()
        );

        let panels = groups
            .iter()
            .map(|(value, rows)| self.prepare_panel(breakdown, style, value, rows))
            .collect::<Result<Vec<_>>>()?;

        let path = self.output_dir.join(&style.output);
        self.draw_sheet(&path, breakdown, style, &panels)
            .map_err(|e| BodymapError::Plot {
                path: path.clone(),
                message: e.to_string(),
            })?;
        debug!("Wrote {}", path.display());

        Ok(path)
    }

    fn progress_bar(&self, len: u64, breakdown: Breakdown) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_prefix(format!("Rendering by {}", breakdown.name()));
        pb
    }

    fn prepare_panel<'a>(
        &self,
        breakdown: Breakdown,
        style: &BreakdownStyle,
        value: &'a str,
        rows: &'a [&'a TouchPoint],
    ) -> Result<Panel<'a>> {
        let title = breakdown.title(value, rows.len())?;

        // Contact-type and direction panels borrow the first row's figure.
        let figure = match breakdown {
            Breakdown::Figure => value,
            _ => rows.first().map(|row| row.figure.as_str()).unwrap_or(value),
        };

        let background = self
            .backgrounds
            .lookup(figure)
            .with_context(|| format!("Failed to load background for figure '{}'", figure))?;

        if breakdown.announces_backgrounds() {
            match background {
                BackgroundLookup::Present(ref bg) => println!("✓ Loaded {}", bg.path.display()),
                BackgroundLookup::Absent(ref path) => {
                    println!("⚠ {} not found - will show heatmap only", path.display())
                }
            }
        } else {
            debug!("Background for '{}': {}", value, background.path().display());
        }

        let hist = Histogram2d::compute(rows.iter().copied(), style.bins)?;
        debug!(
            "{} '{}': {} of {} points binned, max bin {}",
            breakdown.name(),
            value,
            hist.total(),
            rows.len(),
            hist.max()
        );

        Ok(Panel {
            value,
            title,
            rows,
            background,
            hist,
        })
    }

    /// Draw all panels side by side into one PNG.
    fn draw_sheet(
        &self,
        path: &Path,
        breakdown: Breakdown,
        style: &BreakdownStyle,
        panels: &[Panel],
    ) -> Result<(), Box<dyn Error>> {
        let progress = self.progress_bar(panels.len() as u64, breakdown);
        let size = (self.tile_width() * panels.len() as u32, self.tile_height());

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        for (cell, panel) in root.split_evenly((1, panels.len())).iter().zip(panels) {
            progress.set_message(panel.value.to_string());
            self.draw_panel(cell, breakdown, style, panel)?;
            progress.inc(1);
        }

        root.present()?;
        progress.finish_and_clear();
        Ok(())
    }

    fn draw_panel(
        &self,
        cell: &DrawingArea<BitMapBackend, Shift>,
        breakdown: Breakdown,
        style: &BreakdownStyle,
        panel: &Panel,
    ) -> Result<(), Box<dyn Error>> {
        let (title_area, body) = cell.split_vertically(TITLE_AREA);
        if self.fonts.available() {
            title_area.titled(&panel.title, (fonts::FAMILY, TITLE_SIZE))?;
        }

        let (width, _) = body.dim_in_pixel();
        let (plot_area, bar_area) = body.split_horizontally(width.saturating_sub(COLORBAR_AREA));

        self.draw_plot(&plot_area, breakdown, style, panel)?;
        self.draw_colorbar(&bar_area, breakdown, style.colormap, panel.hist.max())?;
        Ok(())
    }

    /// Background, bin counts and scatter over the unit square.
    ///
    /// Chart y runs bottom-up while touch coordinates run top-down, so
    /// every y is drawn at `1 - y` and the tick labels are flipped back.
    fn draw_plot(
        &self,
        area: &DrawingArea<BitMapBackend, Shift>,
        breakdown: Breakdown,
        style: &BreakdownStyle,
        panel: &Panel,
    ) -> Result<(), Box<dyn Error>> {
        let mut chart = ChartBuilder::on(area)
            .margin(PANEL_MARGIN)
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(Y_LABEL_AREA)
            .build_cartesian_2d(0.0f64..1.0, 0.0f64..1.0)?;

        let text = self.fonts.available();
        let ticks = if text { AXIS_TICKS } else { 0 };
        let x_fmt = |x: &f64| format!("{:.1}", x);
        let y_fmt = |y: &f64| format!("{:.1}", 1.0 - y);
        {
            let mut mesh = chart.configure_mesh();
            mesh.disable_mesh()
                .x_labels(ticks)
                .y_labels(ticks)
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt);
            if text && breakdown.has_axis_labels() {
                mesh.x_desc("X Position").y_desc("Y Position");
            }
            mesh.draw()?;
        }

        let (pw, ph) = chart.plotting_area().dim_in_pixel();
        match panel.background {
            BackgroundLookup::Present(ref bg) => {
                let pixels = bg.faded_rgb(pw, ph, style.background_alpha);
                let element: Option<BitMapElement<(f64, f64)>> =
                    BitMapElement::with_owned_buffer((0.0, 1.0), (pw, ph), pixels);
                if let Some(element) = element {
                    chart.draw_series(std::iter::once(element))?;
                }
            }
            BackgroundLookup::Absent(_) => chart.plotting_area().fill(&LIGHT_GRAY)?,
        }

        let hist = &panel.hist;
        let bins = hist.bins();
        let step = 1.0 / bins as f64;
        let vmax = hist.max();
        let heat_alpha = style.heatmap_alpha as f64;
        chart.draw_series(
            (0..bins)
                .flat_map(|ix| (0..bins).map(move |iy| (ix, iy)))
                .map(|(ix, iy)| {
                    let t = if vmax > 0 {
                        hist.get(ix, iy) as f64 / vmax as f64
                    } else {
                        0.0
                    };
                    let (left, top) = (ix as f64 * step, 1.0 - iy as f64 * step);
                    Rectangle::new(
                        [(left, top), (left + step, top - step)],
                        style.colormap.color(t).mix(heat_alpha).filled(),
                    )
                }),
        )?;

        let radius = self.config.point_radius;
        let visible: Vec<&TouchPoint> = panel
            .rows
            .iter()
            .copied()
            .filter(|row| marker_in_view(row.x_norm, row.y_norm, (pw, ph), radius))
            .collect();
        let fill = breakdown.marker_fill();
        let alpha = breakdown.marker_alpha();
        let (lo, hi) = confidence_range(panel.rows);

        chart.draw_series(visible.iter().map(|row| {
            let color = match fill {
                MarkerFill::Confidence(colormap) => colormap.color_in_range(row.confidence, lo, hi),
                MarkerFill::Fixed(color) => color,
            };
            Circle::new((row.x_norm, 1.0 - row.y_norm), radius, color.mix(alpha).filled())
        }))?;
        chart.draw_series(visible.iter().map(|row| {
            Circle::new((row.x_norm, 1.0 - row.y_norm), radius, BLACK.stroke_width(1))
        }))?;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(0.0, 1.0), (1.0, 0.0)],
            BLACK.stroke_width(1),
        )))?;
        Ok(())
    }

    /// Vertical color bar from 0 to the panel's maximum bin count.
    fn draw_colorbar(
        &self,
        area: &DrawingArea<BitMapBackend, Shift>,
        breakdown: Breakdown,
        colormap: Colormap,
        vmax: u32,
    ) -> Result<(), Box<dyn Error>> {
        let top = vmax.max(1) as f64;
        let mut chart = ChartBuilder::on(area)
            .margin(PANEL_MARGIN)
            .x_label_area_size(X_LABEL_AREA)
            .right_y_label_area_size(COLORBAR_LABEL_AREA)
            .build_cartesian_2d(0.0f64..1.0, 0.0f64..top)?;

        let text = self.fonts.available();
        let count_fmt = |v: &f64| format!("{:.0}", v);
        {
            let mut mesh = chart.configure_mesh();
            mesh.disable_mesh()
                .x_labels(0)
                .y_labels(if text { 5 } else { 0 })
                .y_label_formatter(&count_fmt);
            if text {
                mesh.y_desc(breakdown.colorbar_label());
            }
            mesh.draw()?;
        }

        let step = top / COLORBAR_STRIPES as f64;
        chart.draw_series((0..COLORBAR_STRIPES).map(|i| {
            let low = i as f64 * step;
            let t = (i as f64 + 0.5) / COLORBAR_STRIPES as f64;
            Rectangle::new([(0.0, low + step), (1.0, low)], colormap.color(t).filled())
        }))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(0.0, top), (1.0, 0.0)],
            BLACK.stroke_width(1),
        )))?;
        Ok(())
    }
}

/// Whether a marker at normalized `(x, y)` touches a `width` x `height`
/// plot. Far-off or non-finite points are skipped before any pixel
/// arithmetic.
fn marker_in_view(x: f64, y: f64, (width, height): (u32, u32), radius: u32) -> bool {
    let r = radius as f64;
    let (px, py) = (x * width as f64, y * height as f64);
    px.is_finite()
        && py.is_finite()
        && px >= -r
        && px <= width as f64 + r
        && py >= -r
        && py <= height as f64 + r
}

/// Min and max confidence over `rows`, ignoring NaN.
fn confidence_range(rows: &[&TouchPoint]) -> (f64, f64) {
    rows.iter()
        .map(|row| row.confidence)
        .filter(|c| !c.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| (lo.min(c), hi.max(c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn point(figure: &str, contact: &str, direction: &str, x: f64, y: f64, confidence: f64) -> TouchPoint {
        TouchPoint {
            participant_id: "p1".to_string(),
            figure: figure.to_string(),
            contact_type: contact.to_string(),
            direction: direction.to_string(),
            x_norm: x,
            y_norm: y,
            confidence,
        }
    }

    fn small_config() -> RenderConfig {
        RenderConfig {
            panel_width: 60,
            panel_height: 80,
            point_radius: 3,
            ..RenderConfig::default()
        }
    }

    fn renderer(backgrounds: &Path, output: &Path) -> Renderer {
        Renderer::new(
            small_config(),
            BackgroundStore::new(backgrounds),
            Fonts::none(),
            output,
        )
    }

    fn sample_table() -> PointTable {
        PointTable::new(vec![
            point("arm", "pat", "touched", 0.2, 0.3, 0.9),
            point("torso", "stroke", "touched_by", 0.6, 0.6, 0.4),
            point("arm", "stroke", "touched_by", 0.8, 0.1, 0.7),
        ])
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("arm"), "Arm");
        assert_eq!(capitalize("LEFT hand"), "Left hand");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_titles() {
        assert_eq!(
            Breakdown::Figure.title("arm", 4).unwrap(),
            "Arm - Contact Heatmap (4 points)"
        );
        assert_eq!(
            Breakdown::ContactType.title("pat", 2).unwrap(),
            "Pat Contacts (2 points)"
        );
        assert_eq!(
            Breakdown::Direction.title("touched_by", 3).unwrap(),
            "I was touched (3 points)"
        );
        assert!(matches!(
            Breakdown::Direction.title("poked", 1),
            Err(BodymapError::UnknownDirection(_))
        ));
    }

    #[test]
    fn test_render_all_writes_three_images() {
        let out = tempfile::tempdir().unwrap();
        let renderer = renderer(out.path(), out.path());
        let table = sample_table();

        let written = renderer.render_all(&table).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "heatmaps_on_figures.png",
                "heatmaps_by_contacttype.png",
                "heatmaps_by_direction.png",
            ]
        );

        // Two figures, two contact types, two directions.
        for path in &written {
            let img = image::open(path).unwrap();
            assert_eq!(img.width(), renderer.tile_width() * 2);
            assert_eq!(img.height(), renderer.tile_height());
        }
    }

    #[test]
    fn test_background_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(8, 8, Rgba([0, 200, 0, 255]))
            .save(dir.path().join("arm.png"))
            .unwrap();

        let renderer = renderer(dir.path(), dir.path());
        let table = PointTable::new(vec![point("arm", "pat", "touched", 0.95, 0.95, 0.5)]);
        let path = renderer.render(&table, Breakdown::Figure).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        // A pixel far from the point: background green shows through the
        // lowest heatmap color.
        let px = img.get_pixel(Y_LABEL_AREA + PANEL_MARGIN + 3, TITLE_AREA + PANEL_MARGIN + 3);
        assert!(px[1] > px[0] && px[1] > px[2], "expected green tint, got {:?}", px);
    }

    #[test]
    fn test_unknown_direction_aborts_direction_breakdown() {
        let out = tempfile::tempdir().unwrap();
        let renderer = renderer(out.path(), out.path());
        let table = PointTable::new(vec![point("arm", "pat", "sideways", 0.5, 0.5, 0.5)]);

        assert!(renderer.render(&table, Breakdown::Figure).is_ok());
        let err = renderer.render(&table, Breakdown::Direction).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BodymapError>(),
            Some(BodymapError::UnknownDirection(_))
        ));
        assert!(!out.path().join("heatmaps_by_direction.png").exists());
    }

    #[test]
    fn test_empty_table_is_error() {
        let out = tempfile::tempdir().unwrap();
        let renderer = renderer(out.path(), out.path());
        let err = renderer
            .render(&PointTable::default(), Breakdown::ContactType)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BodymapError>(),
            Some(BodymapError::EmptyBreakdown("contact type"))
        ));
    }

    #[test]
    fn test_far_off_point_is_drawn_without_marker() {
        let out = tempfile::tempdir().unwrap();
        let renderer = renderer(out.path(), out.path());
        let table = PointTable::new(vec![
            point("arm", "pat", "touched", 1e12, 0.5, 0.5),
            point("arm", "pat", "touched", 0.5, -1e12, 0.5),
        ]);

        let path = renderer.render(&table, Breakdown::Figure).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_marker_in_view() {
        assert!(marker_in_view(0.5, 0.5, (100, 100), 5));
        assert!(marker_in_view(1.04, -0.04, (100, 100), 5));
        assert!(!marker_in_view(1.2, 0.5, (100, 100), 5));
        assert!(!marker_in_view(1e12, 0.5, (100, 100), 5));
        assert!(!marker_in_view(0.5, f64::NAN, (100, 100), 5));
        assert!(!marker_in_view(f64::INFINITY, 0.5, (100, 100), 5));
    }

    #[test]
    fn test_confidence_range() {
        let a = point("arm", "pat", "touched", 0.1, 0.1, 0.3);
        let b = point("arm", "pat", "touched", 0.1, 0.1, f64::NAN);
        let c = point("arm", "pat", "touched", 0.1, 0.1, 0.8);
        assert_eq!(confidence_range(&[&a, &b, &c]), (0.3, 0.8));
    }
}
