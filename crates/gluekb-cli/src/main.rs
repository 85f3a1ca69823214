use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gluekb_catalog::{FetchError, InMemorySource, SourceDump};
use gluekb_core::{HarvestConfig, HarvestSettings};
use gluekb_engine::{HarvestServices, Harvester, ServiceConnector};
use gluekb_sink::LocalDirectorySink;

/// gluekb - Glue catalog and saved query harvester
#[derive(Parser)]
#[command(name = "gluekb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: gluekb.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured source dump and write snapshots to a local directory
    Run {
        /// JSON dump of workgroups, saved queries, databases and tables
        #[arg(short, long)]
        dump: PathBuf,

        /// Directory standing in for the bucket store
        #[arg(short, long, default_value = "gluekb-output")]
        output_dir: PathBuf,
    },

    /// Validate configuration without contacting any service
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Run { dump, output_dir } => run_command(settings, &dump, output_dir, cli.verbose).await,
        Commands::CheckConfig => check_config_command(&settings),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Settings from the config file (if any), overridden by the environment
fn load_settings(config_path: Option<&Path>, verbose: bool) -> Result<HarvestSettings> {
    let settings = if let Some(path) = config_path {
        HarvestSettings::from_file(path)?
    } else if Path::new("gluekb.toml").exists() {
        HarvestSettings::from_file(Path::new("gluekb.toml"))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using environment only".yellow());
        }
        HarvestSettings::default()
    };

    Ok(settings.merge_env())
}

/// Run command - harvest a dump into `<output_dir>/<bucket>/`
async fn run_command(settings: HarvestSettings, dump: &Path, output_dir: PathBuf, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Loading source dump from:".cyan(), dump.display());
    }

    let source = InMemorySource::from_dump(SourceDump::from_file(dump)?);
    let harvester = Harvester::new(settings, LocalConnector::new(source, output_dir));

    let result = harvester.run().await;

    if verbose {
        let status = if result.is_success() { "succeeded".green() } else { "failed".red() };
        eprintln!("{} {}", "Harvest".cyan(), status);
    }

    println!("{}", result.to_json()?);
    Ok(())
}

/// Check config command - report the validated configuration
fn check_config_command(settings: &HarvestSettings) -> Result<()> {
    match settings.validate() {
        Ok(config) => {
            println!("{}", "Configuration OK".green().bold());
            println!("  {} {}", "bucket:".cyan(), config.sink_location);
            println!("  {} {}", "role:".cyan(), config.assumed_identity);
            println!("  {} {}", "catalog:".cyan(), config.catalog_name);
            Ok(())
        }
        Err(err) => {
            eprintln!("{} {}", "Configuration invalid:".red().bold(), err);
            std::process::exit(1);
        }
    }
}

/// Connector for offline replays
///
/// Serves a dump-backed source for both the query and catalog services and
/// writes into a directory named after the configured bucket.
struct LocalConnector {
    source: Arc<InMemorySource>,
    output_dir: PathBuf,
}

impl LocalConnector {
    fn new(source: InMemorySource, output_dir: PathBuf) -> Self {
        Self {
            source: Arc::new(source),
            output_dir,
        }
    }
}

#[async_trait::async_trait]
impl ServiceConnector for LocalConnector {
    async fn connect(&self, config: &HarvestConfig) -> Result<HarvestServices, FetchError> {
        let mut components = Path::new(&config.sink_location).components();
        let single_component = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_component {
            return Err(FetchError::ConfigError(format!(
                "Bucket name '{}' cannot be used as a directory name",
                config.sink_location
            )));
        }

        let root = self.output_dir.join(&config.sink_location);
        tracing::debug!(role = %config.assumed_identity, root = %root.display(), "replaying offline");

        Ok(HarvestServices::new(
            self.source.clone(),
            self.source.clone(),
            Arc::new(LocalDirectorySink::new(root)),
        ))
    }
}
