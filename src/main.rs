mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use cli::{Cli, Commands, RegionArgs};
use mculink::io::FlashImage;
use mculink::report::{render_readings, CatalogReport};
use mculink::{logging, read_all, scan_with, write_f64, RamImage, ScanResult};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Scan {
            images,
            region,
            json,
        } => run_scan(&images, &region, json),
        Commands::Inspect {
            image,
            region,
            ram,
            ram_base,
        } => run_inspect(&image, &region, &ram, ram_base),
        Commands::Poke {
            image,
            region,
            ram,
            ram_base,
            name,
            value,
        } => run_poke(&image, &region, &ram, ram_base, &name, value),
    }
}

fn load_catalog(path: &Path, region: &RegionArgs) -> Result<(FlashImage, ScanResult)> {
    let image = FlashImage::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;
    let result = scan_with(&image, &region.options())
        .with_context(|| format!("Invalid scan region for {}", path.display()))?;
    Ok((image, result))
}

/// Rendered catalog of one image.
enum Output {
    Table(String),
    Json(serde_json::Value),
}

fn run_scan(images: &[PathBuf], region: &RegionArgs, json: bool) -> Result<()> {
    let outputs: Vec<Result<Output>> = images
        .par_iter()
        .map(|path| -> Result<Output> {
            let (image, result) = load_catalog(path, region)?;
            let report = CatalogReport::new(path.display().to_string(), &image, &result);
            if json {
                Ok(Output::Json(serde_json::to_value(&report)?))
            } else {
                Ok(Output::Table(report.to_table()))
            }
        })
        .collect();

    let mut failed = 0usize;
    let mut documents = Vec::new();

    for (path, output) in images.iter().zip(outputs) {
        match output {
            Ok(Output::Table(table)) => println!("{}", table),
            Ok(Output::Json(document)) => documents.push(document),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {:#}", path.display(), e);
            }
        }
    }

    if json {
        let rendered = if documents.len() == 1 {
            serde_json::to_string_pretty(&documents[0])?
        } else {
            serde_json::to_string_pretty(&documents)?
        };
        println!("{}", rendered);
    }

    if failed > 0 {
        bail!("{} of {} images could not be scanned", failed, images.len());
    }
    Ok(())
}

fn run_inspect(image: &Path, region: &RegionArgs, ram: &Path, ram_base: u32) -> Result<()> {
    let (_image, catalog) = load_catalog(image, region)?;
    let mut ram = RamImage::load(ram, ram_base)
        .with_context(|| format!("Failed to load RAM dump: {}", ram.display()))?;

    let readings = read_all(&mut ram, &catalog);
    let failures = readings.iter().filter(|r| !r.is_ok()).count();
    print!("{}", render_readings(&readings));

    info!(variables = readings.len(), failures, "inspection complete");
    Ok(())
}

fn run_poke(
    image: &Path,
    region: &RegionArgs,
    ram_path: &Path,
    ram_base: u32,
    name: &str,
    value: f64,
) -> Result<()> {
    let (_image, catalog) = load_catalog(image, region)?;

    let Some(entry) = catalog.find(name) else {
        bail!("No variable named '{}' in {}", name, image.display());
    };
    if catalog.find_all(name).count() > 1 {
        warn!(name, "name is exposed more than once; using the first record");
    }

    let mut ram = RamImage::load(ram_path, ram_base)
        .with_context(|| format!("Failed to load RAM dump: {}", ram_path.display()))?;

    write_f64(&mut ram, &entry.record, value)
        .with_context(|| format!("Failed to write '{}'", name))?;
    ram.save(ram_path)
        .with_context(|| format!("Failed to save RAM dump: {}", ram_path.display()))?;

    println!("{} = {}", entry.record, value);
    Ok(())
}
