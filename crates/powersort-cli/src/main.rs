use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use powersort_core::pipeline::{run_pipeline, RunOptions};
use powersort_core::Config;

#[derive(Parser)]
#[command(name = "powersort")]
#[command(about = "Sort digitization output files into catalog number buckets")]
#[command(version)]
struct Cli {
    /// Path to the configuration file to be used for processing images
    #[arg(short, long)]
    config: PathBuf,

    /// Input directory path - overrides input_path in config file
    #[arg(short, long)]
    input_path: Option<PathBuf>,

    /// Detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Simulate the sort process without moving files or creating directories
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Force overwrite of existing files
    #[arg(short, long)]
    force: bool,

    /// Subset input folders by parent folder name of image
    #[arg(short, long)]
    subset: bool,

    /// Attempt to unpack any archive files found
    #[arg(short, long)]
    unpack: bool,

    /// Attempt to make derivatives if missing
    #[arg(short, long)]
    generate_derivatives: bool,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Initialize logger; verbose mode echoes every individual outcome
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "info" } else { "warn" },
    ))
    .init();

    // An overwrite run only proceeds after interactive confirmation
    let overwrite_confirmed = cli.force && confirm_overwrite()?;
    if cli.force && !overwrite_confirmed {
        println!("Overwrite not confirmed. Exiting...");
        std::process::exit(1);
    }

    // Fails on wrong config format version before anything is touched
    let config = Config::from_file(&cli.config)?;

    let options = RunOptions {
        dry_run: cli.dry_run,
        overwrite: overwrite_confirmed,
        subset: cli.subset,
        unpack: cli.unpack,
        generate_derivatives: cli.generate_derivatives,
        input_path: cli.input_path,
    };

    log::info!("Sorting files from input_path: {}",
        options
            .input_path
            .as_ref()
            .unwrap_or(&config.files.input_path)
            .display()
    );
    let reports = run_pipeline(&config, &options)?;

    println!("SORT COMPLETE");
    for report in &reports {
        if cli.verbose {
            println!("sorted_file_count {}", report.sort.sorted);
            println!("unmoved_file_count {}", report.sort.unmoved);
        }
        println!("Log file written to: {}", report.sort.log_path.display());
        println!("URL file written to: {}", report.urls_path.display());
    }
    let sorted: u64 = reports.iter().map(|r| r.sort.sorted).sum();
    let unmoved: u64 = reports.iter().map(|r| r.sort.unmoved).sum();
    println!("Total sorted: {sorted}, unmoved: {unmoved}");

    Ok(())
}

/// Require a typed "overwrite" before an overwrite run proceeds.
fn confirm_overwrite() -> Result<bool, anyhow::Error> {
    println!("Files with identical names will be overwritten if you proceed.");
    print!("Type 'overwrite' and [RETURN/ENTER] to confirm desire to overwrite files: ");
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().lock().read_line(&mut response)?;
    if response.trim() == "overwrite" {
        println!("Will overwrite duplicate file names...");
        Ok(true)
    } else {
        Ok(false)
    }
}
