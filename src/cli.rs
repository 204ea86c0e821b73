//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Usage line printed when the input file is missing.
pub const USAGE: &str = "Usage: bodymap <path_to_json_file>";

/// Bodymap - heatmaps of body-contact touch logs
///
/// Reads a JSON touch log, bins touch points per figure, contact type and
/// direction, and writes heatmap PNGs overlaid on body-figure images.
///
/// Examples:
///   bodymap session.json
///   bodymap session.json --backgrounds figures/ --output-dir out/
///   bodymap session.json --summary-json summary.json
///   bodymap --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the JSON touch log
    #[arg(value_name = "JSON_FILE")]
    pub input: Option<PathBuf>,

    /// Directory the heatmap PNGs are written to
    #[arg(short, long, value_name = "DIR", env = "BODYMAP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory holding `<figure>.png` background images
    #[arg(short, long, value_name = "DIR", env = "BODYMAP_BACKGROUNDS")]
    pub backgrounds: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bodymap.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// TrueType/OpenType font for titles and labels
    ///
    /// Defaults to a well-known system font; labels are omitted if none is found.
    #[arg(long, value_name = "FILE", env = "BODYMAP_FONT")]
    pub font: Option<PathBuf>,

    /// Also write the statistics as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .bodymap.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.input.is_none() {
            return Err(USAGE.to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!("Output path is not a directory: {}", dir.display()));
            }
        }

        if let Some(ref dir) = self.backgrounds {
            if !dir.is_dir() {
                return Err(format!(
                    "Backgrounds directory does not exist: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Input path; only valid after [`Args::validate`] succeeded.
    pub fn input_path(&self) -> PathBuf {
        self.input.clone().unwrap_or_default()
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from("touches.json")),
            output_dir: None,
            backgrounds: None,
            config: None,
            font: None,
            summary_json: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_missing_input_prints_usage() {
        let mut args = make_args();
        args.input = None;
        assert_eq!(args.validate(), Err(USAGE.to_string()));
    }

    #[test]
    fn test_init_config_needs_no_input() {
        let mut args = make_args();
        args.input = None;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_backgrounds_dir() {
        let mut args = make_args();
        args.backgrounds = Some(PathBuf::from("/nonexistent/figures"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_positional_and_flags() {
        let args = Args::try_parse_from([
            "bodymap",
            "session.json",
            "--output-dir",
            "out",
            "--summary-json",
            "summary.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("session.json")));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.summary_json, Some(PathBuf::from("summary.json")));
        assert!(args.verbose);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
