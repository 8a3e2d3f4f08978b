use clap::Parser;
use rust_trip_planner::dataset::{parse_dataset, records_from_openflights};
use rust_trip_planner::logging::init_logging;
use rust_trip_planner::ReferenceIndex;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

const OPENFLIGHTS_AIRPORTS_URL: &str =
    "https://raw.githubusercontent.com/jpatokal/openflights/master/data/airports.dat";

/// Convert the OpenFlights airports.dat list into the airport dataset JSON
#[derive(Parser, Debug)]
#[command(name = "build-airport-dataset")]
#[command(version)]
struct Args {
    /// Where to download airports.dat from
    #[arg(short, long, default_value = OPENFLIGHTS_AIRPORTS_URL)]
    url: String,
    /// Local airports.dat (CSV, no header); skips the download
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Where to write the dataset JSON
    #[arg(short, long, default_value = "data/iata_codes_full.json")]
    output: PathBuf,
}

async fn download(url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if let Err(e) = init_logging(None, "build-airport-dataset.log") {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let records = match &args.input {
        Some(input) => {
            println!("🚀 Converting {} ...", input.display());
            records_from_openflights(BufReader::new(File::open(input)?))?
        }
        None => {
            println!("🌐 Downloading {} ...", args.url);
            let body = download(&args.url).await?;
            println!("📦 Downloaded {} bytes", body.len());
            records_from_openflights(body.as_slice())?
        }
    };

    let json_content = serde_json::to_string_pretty(&records)?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(&args.output)?;
    file.write_all(json_content.as_bytes())?;

    println!("✅ Saved {} airports to {}", records.len(), args.output.display());

    // Read the output back the way the services will
    let index = ReferenceIndex::from_dataset(parse_dataset(&json_content)?);
    println!("📊 Countries indexed: {}", index.country_count());

    Ok(())
}
