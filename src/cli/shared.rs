use camino::Utf8PathBuf;
use clap::Args;
use simple_error::SimpleResult;

use super::utils::check_output_filename_dir;

#[derive(Args)]
pub struct SharedSettings {
    /// Turn on info level logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Turn on extra debug logging
    ///
    /// This option enables debug level logging, including the input records supporting each
    /// merged SV. Any input file which can't be read stops the run, instead of being skipped.
    ///
    #[arg(long, global = true)]
    pub debug: bool,

    /// Copy all log output to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<Utf8PathBuf>,
}

pub fn validate_and_fix_shared_settings(settings: SharedSettings) -> SimpleResult<SharedSettings> {
    if let Some(log_file) = &settings.log_file {
        check_output_filename_dir(log_file, "log")?;
    }
    Ok(settings)
}
