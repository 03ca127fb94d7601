//! Methods specific to the svconsensus logger
//!

use camino::Utf8Path;

use crate::cli::SharedSettings;
use crate::globals::PROGRAM_NAME;

fn get_log_level(verbose: bool, debug: bool) -> log::LevelFilter {
    if debug {
        log::LevelFilter::Debug
    } else if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    }
}

/// Setup the logger to write to stderr, and optionally copy all output to a log file
///
fn setup_logger(log_filename: Option<&Utf8Path>, level: log::LevelFilter) -> Result<(), fern::InitError> {
    let logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                PROGRAM_NAME,
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    let logger = if let Some(log_filename) = log_filename {
        logger.chain(fern::log_file(log_filename)?)
    } else {
        logger
    };

    logger.apply()?;
    Ok(())
}

/// Setup logger from the shared command-line settings
///
/// Exits the program if the log file can't be created
///
pub fn setup_logger_from_settings(settings: &SharedSettings) {
    // No logger is setup yet, so match the pre-logging error pattern used in the command-line
    // settings verification methods
    let level = get_log_level(settings.verbose, settings.debug);
    if let Err(e) = setup_logger(settings.log_file.as_deref(), level) {
        eprintln!("Unable to setup logger: {e}");
        std::process::exit(exitcode::CANTCREAT);
    }
}
