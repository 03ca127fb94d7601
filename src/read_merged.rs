//! Summarize the caller support of each record in a merged VCF
//!

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use itertools::Itertools;
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, try_with};

use crate::cli;
use crate::contig_order::mapped_to_chromosome;
use crate::variant_record::VariantRecord;
use crate::vcf_input::read_variant_file;
use crate::vcf_output::{CALLERS_INFO_KEY, STDOUT_FILENAME};

/// Summary of one merged call
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MergedCallSummary {
    /// Number of distinct callers, after removing skipped callers
    pub caller_count: usize,

    pub chrom: String,

    /// 1-indexed position
    pub pos: i64,

    pub ref_allele: String,
    pub alt_allele: String,

    /// Comma-separated list of distinct callers
    pub callers: String,
}

/// Caller support for all calls in a merged VCF
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MergedCallsSummary {
    /// Map from caller name to caller index, with indexes assigned in first observed order
    pub caller_to_index: BTreeMap<String, usize>,

    /// Indexes of all calls made by each caller, indexed by caller index
    pub caller_call_indexes: Vec<Vec<usize>>,

    /// Summary of each call, indexed by call index
    pub calls: Vec<MergedCallSummary>,
}

/// Build the caller support summary from merged records
///
/// # Arguments
/// * `unplaced_chrom_regex` - Records on chromosomes matching this pattern are skipped
/// * `skip_callers` - Callers to remove from all records. Records left without any caller are
///   skipped
///
pub fn summarize_merged_records(
    records: &[VariantRecord],
    unplaced_chrom_regex: Option<&Regex>,
    skip_callers: &[String],
) -> MergedCallsSummary {
    let mut summary = MergedCallsSummary::default();

    for record in records.iter() {
        if let Some(regex) = unplaced_chrom_regex
            && !mapped_to_chromosome(&record.chrom, regex)
        {
            continue;
        }

        let callers = match record.info.get(CALLERS_INFO_KEY) {
            Some(x) => x
                .iter()
                .filter(|&x| !skip_callers.contains(x))
                .unique()
                .cloned()
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };
        if callers.is_empty() {
            continue;
        }

        let call_index = summary.calls.len();
        for caller in callers.iter() {
            let next_caller_index = summary.caller_to_index.len();
            let caller_index = *summary
                .caller_to_index
                .entry(caller.clone())
                .or_insert(next_caller_index);
            if caller_index == summary.caller_call_indexes.len() {
                summary.caller_call_indexes.push(Vec::new());
            }
            summary.caller_call_indexes[caller_index].push(call_index);
        }

        summary.calls.push(MergedCallSummary {
            caller_count: callers.len(),
            chrom: record.chrom.clone(),
            pos: record.pos + 1,
            ref_allele: record.ref_allele.clone(),
            alt_allele: record
                .alt_alleles
                .first()
                .cloned()
                .unwrap_or_else(|| ".".to_string()),
            callers: callers.join(","),
        });
    }
    summary
}

/// Read a merged VCF and summarize the caller support of each record
pub fn read_merged_calls(
    filename: &Utf8Path,
    unplaced_chrom_regex: Option<&Regex>,
    skip_callers: &[String],
) -> SimpleResult<MergedCallsSummary> {
    let data = read_variant_file(filename)?;
    Ok(summarize_merged_records(
        &data.records,
        unplaced_chrom_regex,
        skip_callers,
    ))
}

fn write_summary_json(filename: &Utf8Path, summary: &MergedCallsSummary) -> SimpleResult<()> {
    let mut writer: Box<dyn Write> = if filename.as_str() == STDOUT_FILENAME {
        Box::new(BufWriter::new(std::io::stdout().lock()))
    } else {
        info!("Writing merged call summary to file: '{filename}'");
        let f = try_with!(
            File::create(filename),
            "Unable to create summary json file: '{}'",
            filename
        );
        Box::new(BufWriter::new(f))
    };
    try_with!(
        serde_json::to_writer_pretty(&mut writer, summary),
        "Unable to write summary json"
    );
    try_with!(writeln!(writer), "Unable to write summary json");
    try_with!(writer.flush(), "Unable to write summary json");
    Ok(())
}

pub fn run_summarize(
    _shared_settings: &cli::SharedSettings,
    settings: &cli::SummarizeSettings,
) -> SimpleResult<()> {
    let unplaced_chrom_regex = if settings.no_chrom_filter {
        None
    } else {
        Some(try_with!(
            Regex::new(&settings.unplaced_chrom_regex),
            "Invalid unplaced chromosome regex"
        ))
    };

    let summary = read_merged_calls(
        &settings.merged_vcf_filename,
        unplaced_chrom_regex.as_ref(),
        &settings.skip_callers,
    )?;
    info!(
        "Summarized {} merged calls from {} callers",
        summary.calls.len(),
        summary.caller_to_index.len()
    );

    write_summary_json(&settings.output_json_filename, &summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contig_order::DEFAULT_UNPLACED_CHROM_REGEX;
    use crate::variant_record::test_utils::*;
    use crate::vcf_input::test_utils::make_temp_vcf;

    fn get_test_records() -> Vec<VariantRecord> {
        vec![
            make_record("chr1", 99, "N", "N[chr1:500[", &[("Callers", "manta,delly")]),
            make_record("GL000220.1", 10, "A", "T", &[("Callers", "delly")]),
            make_record("chr2", 199, "A", "G", &[("Callers", "lumpy,manta,lumpy")]),
            make_record("chr3", 5, "C", "T", &[("Callers", "delly")]),
        ]
    }

    #[test]
    fn test_summarize_merged_records() {
        let regex = Regex::new(DEFAULT_UNPLACED_CHROM_REGEX).unwrap();
        let summary = summarize_merged_records(&get_test_records(), Some(&regex), &[]);

        assert_eq!(summary.calls.len(), 3);
        assert_eq!(
            summary.caller_to_index,
            BTreeMap::from([
                ("manta".to_string(), 0),
                ("delly".to_string(), 1),
                ("lumpy".to_string(), 2)
            ])
        );
        assert_eq!(summary.caller_call_indexes, vec![vec![0, 1], vec![0, 2], vec![1]]);

        let call = &summary.calls[1];
        assert_eq!(call.caller_count, 2);
        assert_eq!(call.chrom, "chr2");
        assert_eq!(call.pos, 200);
        assert_eq!(call.ref_allele, "A");
        assert_eq!(call.alt_allele, "G");
        assert_eq!(call.callers, "lumpy,manta");
    }

    #[test]
    fn test_summarize_skip_callers() {
        let summary =
            summarize_merged_records(&get_test_records(), None, &["delly".to_string()]);

        // Calls supported only by the skipped caller are dropped
        assert_eq!(summary.calls.len(), 2);
        assert!(!summary.caller_to_index.contains_key("delly"));
        assert_eq!(summary.calls[0].callers, "manta");
        assert_eq!(summary.calls[0].caller_count, 1);
    }

    #[test]
    fn test_read_merged_calls() {
        let vcf = "\
##fileformat=VCFv4.2
##FILTER=<ID=LOWSUPPORT,Description=\"Not called by enough callers in ensemble\">
##contig=<ID=chr1>
##INFO=<ID=Callers,Number=.,Type=String,Description=\"Callers that made this call\">
##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
chr1\t100\t.\tN\tN[chr1:500[\t.\t.\tCallers=manta,delly;SVTYPE=DEL
chr1\t300\t.\tA\tT\t.\tLOWSUPPORT\tCallers=gatk
";
        let file = make_temp_vcf(vcf);
        let path = Utf8Path::from_path(file.path()).unwrap();
        let summary = read_merged_calls(path, None, &[]).unwrap();

        assert_eq!(summary.calls.len(), 2);
        assert_eq!(summary.calls[0].callers, "manta,delly");
        assert_eq!(summary.calls[0].pos, 100);
        assert_eq!(summary.calls[0].alt_allele, "N[chr1:500[");
        assert_eq!(summary.calls[1].caller_count, 1);
        assert_eq!(summary.caller_call_indexes[2], vec![1]);
    }
}
