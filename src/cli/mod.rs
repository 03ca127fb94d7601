mod merge;
mod shared;
mod summarize;
mod utils;

use chrono::Datelike;
use clap::{Parser, Subcommand};
use simple_error::SimpleResult;

use self::merge::validate_and_fix_merge_settings;
pub use self::merge::MergeSettings;
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;
use self::summarize::validate_and_fix_summarize_settings;
pub use self::summarize::SummarizeSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Merge variant calls from multiple callers into one consensus VCF
    Merge(MergeSettings),

    /// Summarize the caller support of each record in a merged VCF, in JSON format
    Summarize(SummarizeSettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    after_help = format!("Copyright (C) {}
This program comes with ABSOLUTELY NO WARRANTY.", chrono::Utc::now().year()),
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

/// Validate settings and update parameters that can't be processed by clap
///
/// Assumes no logger has been configured yet
///
fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;

    settings.command = match settings.command {
        Commands::Merge(x) => Commands::Merge(validate_and_fix_merge_settings(x)?),
        Commands::Summarize(x) => Commands::Summarize(validate_and_fix_summarize_settings(x)?),
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Exits the program with a usage error if any setting is invalid
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
