mod cli;
mod cluster_map;
mod consensus;
mod contig_order;
mod globals;
mod location;
mod logger;
mod merge;
mod read_merged;
mod run_stats;
mod sv_locations;
mod variant_record;
mod vcf_input;
mod vcf_output;

use std::{error, process};

use hhmmss::Hhmmss;
use log::info;

use crate::cli::Commands;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_logger_from_settings;
use crate::merge::run_merge;
use crate::read_merged::run_summarize;

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let start = std::time::Instant::now();

    match &settings.command {
        Commands::Merge(x) => {
            run_merge(&settings.shared, x)?;
        }
        Commands::Summarize(x) => {
            run_summarize(&settings.shared, x)?;
        }
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    setup_logger_from_settings(&settings.shared);

    if let Err(err) = run(&settings) {
        eprintln!("{err}");
        process::exit(2);
    }
}
