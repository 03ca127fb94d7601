use std::collections::HashSet;

use camino::Utf8PathBuf;
use clap::Args;
use regex::Regex;
use simple_error::{SimpleResult, bail, map_err_with};

use super::utils::{check_output_filename_dir, check_required_filename};
use crate::contig_order::DEFAULT_UNPLACED_CHROM_REGEX;
use crate::vcf_output::STDOUT_FILENAME;

#[derive(Args)]
pub struct MergeSettings {
    /// Input VCF or BCF file from one caller (required). Specify once for each input file, in the
    /// same order as --caller
    ///
    #[arg(long = "vcf", value_name = "FILE", required = true)]
    pub vcf_filenames: Vec<Utf8PathBuf>,

    /// Name of the caller for each --vcf input file, in the same order (required)
    #[arg(long = "caller", value_name = "NAME", required = true)]
    pub callers: Vec<String>,

    /// Treat all records from this caller as SVs. Can be specified multiple times
    ///
    /// This is intended for callers which report SVs without consistent SVTYPE tags.
    ///
    #[arg(long = "force-sv-caller", value_name = "NAME")]
    pub force_sv_callers: Vec<String>,

    /// Merged VCF output file, or '-' for stdout. Output is bgzip compressed if the filename
    /// ends in '.gz'
    ///
    #[arg(long = "output", value_name = "FILE", default_value = STDOUT_FILENAME)]
    pub output_filename: Utf8PathBuf,

    /// Max distance between breakpoints on each side of two SV calls for the calls to be merged
    #[arg(long, default_value_t = 0)]
    pub slop: u32,

    /// Max distance between two SNV/indel calls with the same alleles for the calls to be merged
    #[arg(hide = true, long, default_value_t = 0)]
    pub point_window: u32,

    /// Add the NumCallers INFO field to each output record
    #[arg(long)]
    pub ncallers: bool,

    /// Output records with fewer distinct callers than this are marked with the LOWSUPPORT filter
    #[arg(long, default_value_t = 0)]
    pub min_num_callers: usize,

    /// Merge calls on all contigs, including unplaced and mitochondrial contigs
    #[arg(long)]
    pub no_chrom_filter: bool,

    /// Regex used to select contigs which are removed from the merge, unless --no-chrom-filter is
    /// given
    ///
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_UNPLACED_CHROM_REGEX)]
    pub unplaced_chrom_regex: String,

    /// Merge all input records regardless of their FILTER value
    #[arg(long)]
    pub no_filter: bool,

    /// Write run statistics in JSON format to this file
    #[arg(long = "run-stats", value_name = "FILE")]
    pub run_stats_filename: Option<Utf8PathBuf>,
}

pub fn validate_and_fix_merge_settings(settings: MergeSettings) -> SimpleResult<MergeSettings> {
    if settings.vcf_filenames.len() != settings.callers.len() {
        bail!(
            "Number of --vcf input files ({}) does not match the number of --caller names ({})",
            settings.vcf_filenames.len(),
            settings.callers.len()
        );
    }

    for filename in settings.vcf_filenames.iter() {
        check_required_filename(filename, "input variant")?;
    }

    let mut caller_set = HashSet::new();
    for caller in settings.callers.iter() {
        if caller.is_empty() {
            bail!("Caller names can't be empty");
        }
        if caller.contains([',', ';', '=', ' ']) {
            bail!("Caller name contains an invalid character: '{}'", caller);
        }
        caller_set.insert(caller.as_str());
    }

    for caller in settings.force_sv_callers.iter() {
        if !caller_set.contains(caller.as_str()) {
            bail!(
                "--force-sv-caller name does not match any --caller name: '{}'",
                caller
            );
        }
    }

    if settings.output_filename.as_str() != STDOUT_FILENAME {
        check_output_filename_dir(&settings.output_filename, "output VCF")?;
    }
    if let Some(filename) = &settings.run_stats_filename {
        check_output_filename_dir(filename, "run statistics")?;
    }

    // Check that regex is valid
    let _ = map_err_with!(
        Regex::new(&settings.unplaced_chrom_regex),
        "Invalid regex for --unplaced-chrom-regex"
    )?;

    Ok(settings)
}
