//! Command-line interface.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::geometry::NullConverter;
use crate::ingest::Ingestor;
use crate::output::{render, save, OutputFormat};
use crate::types::{IngestOutcome, LatLng, SourceKind};

/// Cadastre ingest - Normalize KMZ, KML and GeoJSON parcel documents.
#[derive(Parser)]
#[command(name = "cadastre-ingest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file (default: $CADASTRE_INGEST_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a local .kmz, .kml, .json or .geojson file.
    Ingest {
        /// Input file
        file: PathBuf,

        #[command(flatten)]
        options: IngestOptions,
    },

    /// Retrieve a document from a URL or path, then ingest it.
    Fetch {
        /// http(s) URL or file path
        location: String,

        #[command(flatten)]
        options: IngestOptions,
    },

    /// Generate a synthetic dataset.
    Mock {
        /// Number of parcels (default: from configuration)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Region label used as location
        #[arg(short, long)]
        region: Option<String>,

        /// Center latitude
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Center longitude
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        output: OutputOptions,
    },
}

/// Options shared by `ingest` and `fetch`.
#[derive(Args, Debug, Clone)]
pub struct IngestOptions {
    /// Substitute the mock dataset when nothing could be ingested
    #[arg(long)]
    pub mock_on_empty: bool,

    /// Skip the primary converter and parse polygons manually
    #[arg(long)]
    pub manual_geometry: bool,

    #[command(flatten)]
    pub output: OutputOptions,
}

/// Where and how to write the outcome.
#[derive(Args, Debug, Clone)]
pub struct OutputOptions {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Yaml => Self::Yaml,
        }
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => IngestConfig::from_yaml_file(path)?,
        None => IngestConfig::from_env()?,
    };

    match cli.command {
        Commands::Ingest { file, options } => ingest_command(config, &file, &options),
        Commands::Fetch { location, options } => fetch_command(config, &location, &options),
        Commands::Mock {
            count,
            region,
            lat,
            lng,
            seed,
            output,
        } => {
            let mut config = config;
            if let Some(count) = count {
                config.mock.count = count;
            }
            if let Some(region) = region {
                config.mock.region_label = region;
            }
            if let (Some(lat), Some(lng)) = (lat, lng) {
                config.mock.center = LatLng { lat, lng };
            }
            mock_command(config, seed, &output)
        }
    }
}

fn build_ingestor(config: IngestConfig, options: &IngestOptions) -> Ingestor {
    let ingestor = Ingestor::new(config);
    if options.manual_geometry {
        ingestor.with_converter(NullConverter)
    } else {
        ingestor
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Execute the ingest command.
fn ingest_command(config: IngestConfig, file: &Path, options: &IngestOptions) -> Result<()> {
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // Reject unsupported names before touching the file
    SourceKind::from_file_name(&file_name)?;
    let ingestor = build_ingestor(config, options);

    let pb = spinner("Reading document...");
    let bytes = match std::fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            pb.finish_and_clear();
            return Err(IngestError::Io(e));
        }
    };

    pb.set_message("Extracting parcels...");
    let outcome = match ingestor.ingest_upload(&bytes, &file_name) {
        Ok(outcome) => outcome,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    let outcome = substitute_empty(&ingestor, outcome, options.mock_on_empty);
    write_outcome(&outcome, &options.output)
}

/// Execute the fetch command.
fn fetch_command(config: IngestConfig, location: &str, options: &IngestOptions) -> Result<()> {
    let ingestor = build_ingestor(config, options);

    let pb = spinner("Retrieving document...");
    let result = ingestor.ingest_from_location(location);
    pb.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => substitute_empty(&ingestor, outcome, options.mock_on_empty),
        Err(e) if e.is_resource_unavailable() && options.mock_on_empty => {
            eprintln!("{} {e}", style("Warning:").yellow().bold());
            ingestor.mock_outcome(&mut rand::thread_rng())
        }
        Err(e) => return Err(e),
    };

    write_outcome(&outcome, &options.output)
}

/// Execute the mock command.
fn mock_command(config: IngestConfig, seed: Option<u64>, output: &OutputOptions) -> Result<()> {
    config.validate()?;
    let ingestor = Ingestor::new(config);
    let outcome = match seed {
        Some(seed) => ingestor.mock_outcome(&mut StdRng::seed_from_u64(seed)),
        None => ingestor.mock_outcome(&mut rand::thread_rng()),
    };
    write_outcome(&outcome, output)
}

fn substitute_empty(ingestor: &Ingestor, outcome: IngestOutcome, mock_on_empty: bool) -> IngestOutcome {
    if outcome.is_empty() && mock_on_empty {
        eprintln!(
            "{} no parcels found, using mock dataset",
            style("Warning:").yellow().bold()
        );
        return ingestor.mock_outcome(&mut rand::thread_rng());
    }
    outcome
}

fn write_outcome(outcome: &IngestOutcome, options: &OutputOptions) -> Result<()> {
    let format = OutputFormat::from(options.format);

    let Some(path) = &options.output else {
        print!("{}", render(outcome, format)?);
        return Ok(());
    };

    save(outcome, format, path)?;

    let mock_count = outcome.properties.iter().filter(|r| r.is_mock()).count();
    println!("  Parcels: {}", style(outcome.count).green());
    if mock_count > 0 {
        println!("  Mock: {}", style(mock_count).yellow().bold());
    }
    println!();
    println!("{} {}", style("Saved to:").green().bold(), path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_ingest() {
        let cli = Cli::parse_from(["cadastre-ingest", "ingest", "13.kmz"]);

        let Commands::Ingest { file, options } = cli.command else {
            panic!("expected ingest command");
        };
        assert_eq!(file, PathBuf::from("13.kmz"));
        assert!(!options.mock_on_empty);
        assert!(!options.manual_geometry);
        assert_eq!(options.output.format, FormatArg::Json);
        assert!(options.output.output.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_fetch_with_options() {
        let cli = Cli::parse_from([
            "cadastre-ingest",
            "fetch",
            "https://example.org/13.kmz",
            "--format",
            "yaml",
            "--output",
            "out.yaml",
            "--mock-on-empty",
            "--config",
            "ingest.yaml",
        ]);

        let Commands::Fetch { location, options } = cli.command else {
            panic!("expected fetch command");
        };
        assert_eq!(location, "https://example.org/13.kmz");
        assert!(options.mock_on_empty);
        assert_eq!(options.output.format, FormatArg::Yaml);
        assert_eq!(options.output.output, Some(PathBuf::from("out.yaml")));
        assert_eq!(cli.config, Some(PathBuf::from("ingest.yaml")));
    }

    #[test]
    fn test_cli_parse_mock() {
        let cli = Cli::parse_from([
            "cadastre-ingest",
            "mock",
            "-n",
            "10",
            "--lat",
            "-33.5",
            "--lng",
            "36.2",
            "--seed",
            "7",
        ]);

        let Commands::Mock {
            count, lat, lng, seed, ..
        } = cli.command
        else {
            panic!("expected mock command");
        };
        assert_eq!(count, Some(10));
        assert_eq!(lat, Some(-33.5));
        assert_eq!(lng, Some(36.2));
        assert_eq!(seed, Some(7));
    }

    #[test]
    fn test_format_arg_selects_output_format() {
        assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
        assert_eq!(OutputFormat::from(FormatArg::Yaml), OutputFormat::Yaml);
        assert!(Cli::try_parse_from(["cadastre-ingest", "mock", "--format", "csv"]).is_err());
    }

    #[test]
    fn test_cli_mock_lat_requires_lng() {
        let result = Cli::try_parse_from(["cadastre-ingest", "mock", "--lat", "1.0"]);
        assert!(result.is_err());
    }
}
