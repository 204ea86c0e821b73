//! Bodymap - Touch Log Heatmap Renderer
//!
//! A CLI tool that reads a JSON log of body-contact touch events and
//! renders heatmaps per figure region, contact type and contact
//! direction, overlaid on reference body-figure images.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Usage error or runtime error (missing file, malformed JSON,
//!       invalid record, unknown direction, image I/O)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod render;
mod report;

use analysis::PointTable;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::Config;
use models::{RunMetadata, SummaryReport};
use render::fonts::Fonts;
use render::{BackgroundStore, Renderer};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration can turn on verbose logging, so it loads first
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("Bodymap v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    if let Err(e) = run(&args, &config) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .bodymap.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .bodymap.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .bodymap.toml")?;

    println!("✅ Created .bodymap.toml with default settings.");
    println!("   Edit it to customize bins, colormaps, output names, and more.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the pipeline, then write the optional JSON summary.
fn run(args: &Args, config: &Config) -> Result<()> {
    let input = args.input_path();
    let outcome = run_pipeline(&input, config, !args.quiet)?;

    if let Some(ref summary_path) = args.summary_json {
        let summary = SummaryReport {
            metadata: RunMetadata {
                input: input.display().to_string(),
                generated_at: Utc::now(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            statistics: outcome.statistics,
            images: outcome
                .images
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        };
        report::write_json_summary(&summary, summary_path)?;
        info!("Summary written to {}", summary_path.display());
    }

    Ok(())
}

/// Everything a run produced.
struct RunOutcome {
    statistics: models::Statistics,
    images: Vec<PathBuf>,
}

/// Load, tabulate, render and report. Any failure aborts the run.
fn run_pipeline(input: &Path, config: &Config, show_progress: bool) -> Result<RunOutcome> {
    let start_time = Instant::now();

    // Step 1: Load and flatten the touch log
    let points = loader::load_points(input)?;

    // Step 2: Tabulate and summarize
    let table = PointTable::new(points);
    if table.is_empty() {
        warn!("{} contains no touch points", input.display());
    }
    let unique = analysis::unique_summary(&table);
    print!("{}", report::generate_data_summary(table.len(), &unique));

    // Step 3: Render the three breakdowns
    let fonts = Fonts::resolve(config.render.font_path.as_deref())?;
    debug!("Chart text enabled: {}", fonts.available());

    let output_dir = &config.general.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let renderer = Renderer::new(
        config.render.clone(),
        BackgroundStore::new(&config.general.backgrounds_dir),
        fonts,
        output_dir,
    )
    .with_progress(show_progress);

    println!();
    let images = renderer.render_all(&table)?;

    // Step 4: Statistics
    let statistics = analysis::compute_statistics(&table)?;
    print!("{}", report::generate_statistics(&statistics));
    println!("\n✓ Analysis complete!");

    debug!(
        "Pipeline finished in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(RunOutcome { statistics, images })
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems go to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!(
                "⚠️  Ignoring {}: {:#}",
                config::DEFAULT_CONFIG_FILE,
                e
            );
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BodymapError;
    use crate::models::Column;

    const SCENARIO: &str = r#"{"data": [{"t0": {"participantId":"p1","figure":"arm","contactType":"pat","direction":"touched","xNorm":0.5,"yNorm":0.5,"confidence":0.9}}, null]}"#;

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.general.output_dir = dir.join("out");
        config.general.backgrounds_dir = dir.to_path_buf();
        config.render.panel_width = 40;
        config.render.panel_height = 50;
        config
    }

    #[test]
    fn test_single_point_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("touches.json");
        std::fs::write(&input, SCENARIO).unwrap();

        let points = loader::load_points(&input).unwrap();
        assert_eq!(points.len(), 1);

        let table = PointTable::new(points);
        assert_eq!(table.unique(Column::Figure), vec!["arm"]);

        let hist = analysis::Histogram2d::compute(table.rows(), 1).unwrap();
        assert_eq!(hist.get(0, 0), 1);
    }

    #[test]
    fn test_pipeline_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("touches.json");
        std::fs::write(&input, SCENARIO).unwrap();

        let config = test_config(dir.path());
        let outcome = run_pipeline(&input, &config, false).unwrap();

        assert_eq!(outcome.images.len(), 3);
        for image in &outcome.images {
            assert!(image.exists(), "missing {}", image.display());
        }
        assert_eq!(outcome.statistics.total_points, 1);
        assert_eq!(outcome.statistics.mean_confidence[0].mean, 0.9);
    }

    #[test]
    fn test_pipeline_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let input = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/touches.json");

        let config = test_config(dir.path());
        let outcome = run_pipeline(&input, &config, false).unwrap();

        let stats = outcome.statistics;
        assert_eq!(stats.total_points, 8);
        assert_eq!(stats.unique.participants, vec!["p1", "p2", "p3"]);
        assert_eq!(stats.unique.figures, vec!["front", "back"]);
        let per_direction: usize = stats.direction_counts.iter().map(|d| d.count).sum();
        assert_eq!(per_direction, stats.total_points);
    }

    #[test]
    fn test_pipeline_unknown_direction_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("touches.json");
        std::fs::write(&input, SCENARIO.replace("\"touched\"", "\"nudged\"")).unwrap();

        let config = test_config(dir.path());
        let err = match run_pipeline(&input, &config, false) {
            Ok(_) => panic!("unknown direction should abort the run"),
            Err(e) => e,
        };
        assert!(matches!(
            err.downcast_ref::<BodymapError>(),
            Some(BodymapError::UnknownDirection(_))
        ));

        // Earlier breakdowns are already on disk; the direction image is not.
        let out = dir.path().join("out");
        assert!(out.join("heatmaps_on_figures.png").exists());
        assert!(!out.join("heatmaps_by_direction.png").exists());
    }

    #[test]
    fn test_pipeline_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let err = match run_pipeline(&dir.path().join("absent.json"), &config, false) {
            Ok(_) => panic!("missing input should fail"),
            Err(e) => e,
        };
        assert!(matches!(
            err.downcast_ref::<BodymapError>(),
            Some(BodymapError::InputNotFound(_))
        ));
    }
}
