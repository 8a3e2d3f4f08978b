//! CLI interface for rust-trip-planner

use clap::{Parser, Subcommand};
use rust_trip_planner::{
    logging::init_logging, resolve_route, CityListNormalizer, LocationResolver, PlannerConfig,
    ReferenceIndex, ResolverMode,
};
use std::io::Read;
use std::path::PathBuf;
use std::{fs, io};
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "rust-trip-planner")]
#[command(about = "Resolve trip locations to airport codes and clean generated city lists")]
#[command(version)]
pub struct Cli {
    /// Airport dataset JSON (defaults to $TRIP_PLANNER_DATASET or data/iata_codes_full.json)
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,
    /// Resolver mode (staged, flat); inferred from the dataset when omitted
    #[arg(long, global = true)]
    pub mode: Option<String>,
    /// Write JSON logs to this directory instead of stderr
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve city names, airport names or codes to airport codes
    Resolve {
        /// Locations to resolve
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Resolve an origin and a destination, failing if either is unknown
    Route {
        /// Origin city name or airport code
        #[arg(short, long)]
        from: String,
        /// Destination city name or airport code
        #[arg(short, long)]
        to: String,
    },
    /// Normalize generated text into a list of city names
    Cities {
        /// Keep only cities known for this country
        #[arg(short, long)]
        country: Option<String>,
        /// Read the text from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Show reference index sizes
    Stats,
}

fn build_config(cli: &Cli) -> Result<PlannerConfig, Box<dyn std::error::Error>> {
    let mut config = PlannerConfig::from_env()?;
    if let Some(ref dataset) = cli.dataset {
        config.dataset_path = dataset.clone();
    }
    if let Some(ref mode) = cli.mode {
        config.resolver_mode = Some(mode.parse::<ResolverMode>()?);
    }
    if let Some(ref log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    if let Err(e) = init_logging(config.log_dir.as_deref(), "rust-trip-planner.log") {
        eprintln!("Failed to initialize logging: {}", e);
    }
    debug!(?config, "Configuration loaded");

    let index = ReferenceIndex::load(&config.dataset_path);
    let mut resolver = LocationResolver::new(&index);
    if let Some(mode) = config.resolver_mode {
        resolver = resolver.with_mode(mode);
    }

    match cli.command {
        Commands::Resolve { inputs } => {
            for input in inputs {
                println!("{} -> {}", input.trim(), resolver.resolve(&input));
            }
        }
        Commands::Route { from, to } => match resolve_route(&resolver, &from, &to) {
            Ok((origin, destination)) => {
                println!("{} -> {}", origin, destination);
            }
            Err(e) => {
                error!(error = %e, "Route resolution failed");
                eprintln!("Invalid origin or destination: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Cities { country, file } => {
            let raw = match file {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let normalizer = CityListNormalizer::new(&index);
            let cities = normalizer.normalize(&raw, country.as_deref());
            println!("{}", serde_json::to_string_pretty(&cities)?);

            if cities.is_empty() {
                eprintln!("No cities found");
                std::process::exit(1);
            }
        }
        Commands::Stats => {
            println!("Dataset: {}", config.dataset_path.display());
            println!("Layout: {:?}", index.layout());
            println!("Resolver mode: {:?}", resolver.mode());
            println!("Airports: {}", index.len());
            println!("Countries: {}", index.country_count());
        }
    }

    Ok(())
}
