use camino::Utf8PathBuf;
use clap::Args;
use regex::Regex;
use simple_error::{SimpleResult, map_err_with};

use super::utils::{check_output_filename_dir, check_required_filename};
use crate::contig_order::DEFAULT_UNPLACED_CHROM_REGEX;
use crate::vcf_output::STDOUT_FILENAME;

#[derive(Args)]
pub struct SummarizeSettings {
    /// Merged VCF file produced by the merge command (required)
    #[arg(long = "merged-vcf", value_name = "FILE")]
    pub merged_vcf_filename: Utf8PathBuf,

    /// Remove this caller from all records before summarizing. Can be specified multiple times
    #[arg(long = "skip-caller", value_name = "NAME")]
    pub skip_callers: Vec<String>,

    /// Summarize records on all contigs, including unplaced and mitochondrial contigs
    #[arg(long)]
    pub no_chrom_filter: bool,

    /// Regex used to select contigs which are skipped, unless --no-chrom-filter is given
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_UNPLACED_CHROM_REGEX)]
    pub unplaced_chrom_regex: String,

    /// JSON summary output file, or '-' for stdout
    #[arg(long = "output-json", value_name = "FILE", default_value = STDOUT_FILENAME)]
    pub output_json_filename: Utf8PathBuf,
}

pub fn validate_and_fix_summarize_settings(
    settings: SummarizeSettings,
) -> SimpleResult<SummarizeSettings> {
    check_required_filename(&settings.merged_vcf_filename, "merged VCF")?;

    if settings.output_json_filename.as_str() != STDOUT_FILENAME {
        check_output_filename_dir(&settings.output_json_filename, "output JSON")?;
    }

    // Check that regex is valid
    let _ = map_err_with!(
        Regex::new(&settings.unplaced_chrom_regex),
        "Invalid regex for --unplaced-chrom-regex"
    )?;

    Ok(settings)
}
