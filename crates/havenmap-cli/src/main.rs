mod search;
mod seed;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use havenmap_postcodes::{Geocoder, PostcodesClient};

#[derive(Debug, Parser)]
#[command(name = "havenmap-cli")]
#[command(about = "havenmap service-directory command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import a raw JSON/YAML service export into the store
    Seed {
        /// Path to the export file (.json, .yaml, or .yml)
        file: PathBuf,
        /// Geocode imported rows that lack coordinates
        #[arg(long)]
        geocode: bool,
        /// Approve every imported row immediately
        #[arg(long)]
        approve: bool,
    },
    /// Look up a single postcode
    Geocode { postcode: String },
    /// Run a search against the approved record set
    Search {
        /// Postcode or free text
        query: String,
        #[arg(long, default_value_t = 10.0)]
        radius: f64,
        #[arg(long)]
        service_type: Option<String>,
        /// Comma-separated specialism selection
        #[arg(long, value_delimiter = ',')]
        specialisms: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Seed {
            file,
            geocode,
            approve,
        } => seed::run(&file, geocode, approve).await,
        Commands::Geocode { postcode } => geocode_one(&postcode).await,
        Commands::Search {
            query,
            radius,
            service_type,
            specialisms,
        } => search::run(&query, radius, service_type, specialisms).await,
    }
}

async fn geocode_one(postcode: &str) -> anyhow::Result<()> {
    let geocoder = Geocoder::new(PostcodesClient::new(10)?);
    match geocoder.geocode(postcode).await {
        Ok(coordinates) => {
            println!(
                "{postcode}: longitude {}, latitude {}",
                coordinates.longitude, coordinates.latitude
            );
        }
        Err(failure) => println!("{postcode}: {failure}"),
    }
    Ok(())
}
