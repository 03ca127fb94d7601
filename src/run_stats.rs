//! Track stats for the whole merge run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

/// Record counts from one input file
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct InputRecordCounts {
    pub total_record_count: usize,

    /// Records removed for a non-passing FILTER value
    pub filtered_record_count: usize,

    /// Records removed for falling on an unplaced contig
    pub unplaced_contig_record_count: usize,

    pub point_record_count: usize,
    pub sv_record_count: usize,
}

impl InputRecordCounts {
    pub fn merged_record_count(&self) -> usize {
        self.point_record_count + self.sv_record_count
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InputFileStatus {
    Merged(InputRecordCounts),
    Failed { message: String },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InputFileStats {
    pub filename: String,
    pub caller: String,
    pub force_sv: bool,
    pub result: InputFileStatus,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConsensusStats {
    pub point_cluster_count: usize,
    pub sv_cluster_count: usize,

    pub point_output_record_count: usize,
    pub sv_output_record_count: usize,

    /// Output records marked with the LOWSUPPORT filter
    pub low_support_record_count: usize,

    /// SV clusters skipped because the mate is on an unplaced contig
    pub unplaced_mate_skip_count: usize,

    /// Point clusters skipped because they have no alt allele
    pub missing_allele_skip_count: usize,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MergeRunStats {
    pub input_files: Vec<InputFileStats>,
    pub consensus_stats: ConsensusStats,
}

impl MergeRunStats {
    pub fn failed_file_count(&self) -> usize {
        self.input_files
            .iter()
            .filter(|x| matches!(x.result, InputFileStatus::Failed { .. }))
            .count()
    }

    /// Log a short summary of the run
    pub fn log_summary(&self) {
        for file_stats in self.input_files.iter() {
            match &file_stats.result {
                InputFileStatus::Merged(counts) => {
                    info!(
                        "Input '{}' ({}): {} records read, {} merged",
                        file_stats.filename,
                        file_stats.caller,
                        counts.total_record_count,
                        counts.merged_record_count()
                    );
                }
                InputFileStatus::Failed { message } => {
                    info!(
                        "Input '{}' ({}): failed and excluded from merge: {message}",
                        file_stats.filename, file_stats.caller
                    );
                }
            }
        }
        let x = &self.consensus_stats;
        info!(
            "Wrote {} SNV/indel and {} SV consensus records, {} marked LOWSUPPORT",
            x.point_output_record_count, x.sv_output_record_count, x.low_support_record_count
        );
    }
}

/// Write run_stats structure out in json format
pub fn write_merge_run_stats(filename: &Utf8Path, run_stats: &MergeRunStats) {
    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &run_stats).unwrap();
}
