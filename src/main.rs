#![allow(non_snake_case)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use savedMedia2archive::config::Config;
use savedMedia2archive::import::{ImportSummary, Importer, Source, plan_item, scan_existing};
use savedMedia2archive::inspect::read_embedded;
use savedMedia2archive::localize::{localize, parse_capture_time};
use savedMedia2archive::location::parse_location;
use savedMedia2archive::manifest::Manifest;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Rebuild a local media archive from a Saved Media export"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize with a default config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Download, repair and tag every item in the manifest
    Import {
        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Manifest to read instead of the configured one
        #[arg(short, long, value_name = "FILE")]
        manifest: Option<PathBuf>,

        /// Destination directory instead of the configured one
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Show how much of the manifest is already archived
    Status {
        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Show the local time that would be written for a capture
    Localize {
        /// Capture time, e.g. "2025-06-15 12:00:00 UTC"
        #[arg(short, long)]
        time: String,

        /// Location, e.g. "Latitude, Longitude: 40.0, -74.0"
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Show the capture time and GPS position embedded in an image
    Inspect {
        /// Image to read
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { force, config } => init_config(config, *force),
        Commands::Import {
            config,
            manifest,
            out_dir,
        } => {
            let mut config_data = load_config(config)?;
            if let Some(manifest) = manifest {
                config_data.manifest = manifest.display().to_string();
            }
            if let Some(out_dir) = out_dir {
                config_data.out_dir = out_dir.display().to_string();
            }
            import(&config_data).await
        }
        Commands::Status { config } => {
            let config_data = load_config(config)?;
            status(&config_data)
        }
        Commands::Localize { time, location } => localize_command(time, location.as_deref()),
        Commands::Inspect { file } => inspect(file),
    }
}

async fn import(config: &Config) -> Result<()> {
    println!("Importing saved media...");
    println!("Manifest: {}", config.manifest);
    println!("Output directory: {}", config.out_dir);

    let manifest = Manifest::load(&PathBuf::from(&config.manifest))?;
    println!("Manifest lists {} items", manifest.item_count());

    let importer = Importer::new(PathBuf::from(&config.out_dir), config.toolkit())
        .with_repair(config.repair_videos);
    let results = importer.run(&manifest).await?;

    let summary = ImportSummary::from_results(&results);
    println!(
        "Imported: {}, with warnings: {}, skipped: {}, failed: {}",
        summary.imported, summary.partial, summary.skipped, summary.failed
    );
    println!("All remaining saved media downloaded");

    Ok(())
}

fn status(config: &Config) -> Result<()> {
    let manifest = Manifest::load(&PathBuf::from(&config.manifest))?;
    let out_dir = PathBuf::from(&config.out_dir);

    let existing = if out_dir.exists() {
        scan_existing(&out_dir)
            .with_context(|| format!("Failed to list {}", out_dir.display()))?
    } else {
        Default::default()
    };

    let mut present = 0;
    let mut unavailable = 0;
    let mut pending = 0;
    for (position, item) in manifest.items.iter().enumerate() {
        let plan = plan_item(position + 1, item);
        if existing.contains(&plan.stem) {
            present += 1;
        } else if matches!(plan.source, Source::Url(_)) {
            pending += 1;
        } else {
            unavailable += 1;
        }
    }

    println!("savedMedia2archive Status");
    println!("Configuration:");
    println!("  Manifest: {}", config.manifest);
    println!("  Output directory: {}", config.out_dir);
    println!("Items in manifest: {}", manifest.item_count());
    println!("  Already archived: {present}");
    println!("  Without usable URL: {unavailable}");
    println!("  Pending: {pending}");

    Ok(())
}

fn localize_command(time: &str, location: Option<&str>) -> Result<()> {
    let utc = parse_capture_time(time).with_context(|| {
        format!("Invalid capture time {time:?}, expected \"YYYY-MM-DD HH:MM:SS UTC\"")
    })?;
    let coordinate = parse_location(location);
    let localized = localize(utc, coordinate);

    println!("UTC: {}", localized.utc);
    match coordinate {
        Some(c) => println!("Location: {:.6}, {:.6}", c.latitude, c.longitude),
        None => println!("Location: none"),
    }
    println!("Offset: {:+} h", localized.offset_hours);
    println!("DST region: {}", localized.region.unwrap_or("none"));
    println!("DST applied: {}", if localized.dst { "yes" } else { "no" });
    println!("Local: {}", localized.local);

    Ok(())
}

fn inspect(file: &Path) -> Result<()> {
    let embedded = read_embedded(file)?;

    println!("File: {}", file.display());
    match embedded.captured_at {
        Some(captured_at) => println!("Captured: {captured_at}"),
        None => println!("Captured: unknown"),
    }
    match (embedded.latitude, embedded.longitude) {
        (Some(lat), Some(lon)) => println!("GPS: {lat:.6}, {lon:.6}"),
        _ => println!("GPS: none"),
    }

    Ok(())
}

fn init_config(config_path_opt: &Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = Config::get_config_path(config_path_opt);

    if config_path.exists() && !force {
        println!("Config file already exists at {}", config_path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = Config::default();
    config
        .save_to_file(&config_path)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!("Created config file at {}", config_path.display());
    Ok(())
}

fn load_config(config_path_opt: &Option<PathBuf>) -> Result<Config> {
    let config_path = Config::get_config_path(config_path_opt);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run 'savedMedia2archive init' to create one.",
            config_path.display()
        );
    }

    Config::load_from_file(&config_path)
}
