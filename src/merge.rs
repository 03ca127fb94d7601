//! Merge call sets from multiple callers into one consensus call set
//!

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use regex::Regex;
use simple_error::{SimpleResult, bail, try_with};

use crate::cli;
use crate::cluster_map::variant_cluster::FinalizedCluster;
use crate::cluster_map::{ClusterMap, RecordClass};
use crate::consensus::{
    ConsensusFilter, ConsensusRecord, ConsensusSettings, get_point_consensus_record,
    get_sv_consensus_record,
};
use crate::contig_order::mapped_to_chromosome;
use crate::run_stats::{
    ConsensusStats, InputFileStats, InputFileStatus, InputRecordCounts, MergeRunStats,
    write_merge_run_stats,
};
use crate::variant_record::VariantRecord;
use crate::vcf_input::{ContigInfo, VariantFileData, read_variant_file};
use crate::vcf_output::{CallerFileInfo, MergedVcfHeaderInfo, write_merged_vcf};

/// One caller's input file
#[derive(Clone, Debug)]
pub struct CallerInput {
    pub filename: Utf8PathBuf,
    pub caller: String,

    /// Treat all records from this input as SVs
    pub force_sv: bool,
}

pub struct CallSetMergeSettings {
    pub point_window: u32,
    pub sv_window: u32,

    /// Contigs matching this pattern are removed from the merge. No contigs are removed if None
    pub unplaced_chrom_regex: Option<Regex>,

    /// Merge all records regardless of their FILTER value
    pub no_filter: bool,

    /// Stop at the first input file which can't be read, instead of merging the remaining files
    pub strict: bool,

    pub consensus: ConsensusSettings,
}

impl CallSetMergeSettings {
    fn is_unplaced_chrom(&self, chrom: &str) -> bool {
        match &self.unplaced_chrom_regex {
            Some(regex) => !mapped_to_chromosome(chrom, regex),
            None => false,
        }
    }
}

pub struct MergedCallSet {
    /// Contigs from all successfully read input files, in first observed order
    pub contigs: Vec<ContigInfo>,

    pub records: Vec<ConsensusRecord>,

    pub run_stats: MergeRunStats,
}

/// True if the record should be included in the merge based on its FILTER value
fn passed_variant(record: &VariantRecord, no_filter: bool) -> bool {
    no_filter || record.is_pass()
}

/// Accumulates the union of contigs over all input files
#[derive(Default)]
struct ContigAccumulator {
    contigs: Vec<ContigInfo>,
    name_to_index: HashMap<String, usize>,
}

impl ContigAccumulator {
    fn add(&mut self, contig: &ContigInfo) {
        match self.name_to_index.get(&contig.name) {
            Some(&index) => {
                let x = &mut self.contigs[index];
                if x.length.is_none() {
                    x.length = contig.length;
                }
            }
            None => {
                self.name_to_index
                    .insert(contig.name.clone(), self.contigs.len());
                self.contigs.push(contig.clone());
            }
        }
    }

    fn add_name(&mut self, name: &str) {
        if !self.name_to_index.contains_key(name) {
            self.add(&ContigInfo {
                name: name.to_string(),
                length: None,
            });
        }
    }
}

/// Add all records from one input file to the cluster map
///
fn add_input_records(
    settings: &CallSetMergeSettings,
    input: &CallerInput,
    records: &[VariantRecord],
    cluster_map: &mut ClusterMap,
) -> InputRecordCounts {
    let mut counts = InputRecordCounts {
        total_record_count: records.len(),
        ..Default::default()
    };

    for (record_index, record) in records.iter().enumerate() {
        if !passed_variant(record, settings.no_filter) {
            counts.filtered_record_count += 1;
            continue;
        }

        if settings.is_unplaced_chrom(&record.chrom) {
            counts.unplaced_contig_record_count += 1;
            continue;
        }

        if record_index % 100 == 0 {
            debug!("Merging record from {}: {record}", input.caller);
        }

        match cluster_map.add_record(record, &input.caller, input.force_sv) {
            RecordClass::Point => counts.point_record_count += 1,
            RecordClass::Sv => counts.sv_record_count += 1,
        }
    }
    counts
}

/// Convert the sorted clusters into consensus records
///
fn get_consensus_records(
    settings: &CallSetMergeSettings,
    cluster_map: ClusterMap,
    stats: &mut ConsensusStats,
) -> Vec<ConsensusRecord> {
    let cluster_counts = cluster_map.cluster_counts();
    stats.point_cluster_count = cluster_counts.point_clusters;
    stats.sv_cluster_count = cluster_counts.sv_clusters;

    let mut records = Vec::new();
    for cluster in cluster_map.into_sorted_clusters() {
        let record = match cluster {
            FinalizedCluster::Point(cluster) => {
                match get_point_consensus_record(&cluster, &settings.consensus) {
                    Some(x) => {
                        stats.point_output_record_count += 1;
                        x
                    }
                    None => {
                        warn!(
                            "Skipping variant cluster with no alt allele at {}:{} from callers: {}",
                            cluster.location.chrom(),
                            cluster.location.pos() + 1,
                            cluster.callers.join(",")
                        );
                        stats.missing_allele_skip_count += 1;
                        continue;
                    }
                }
            }
            FinalizedCluster::Sv(cluster) => {
                if let Some(loc2) = &cluster.location2
                    && settings.is_unplaced_chrom(loc2.chrom())
                {
                    stats.unplaced_mate_skip_count += 1;
                    continue;
                }

                let record = get_sv_consensus_record(&cluster, &settings.consensus);
                if log::log_enabled!(log::Level::Debug) {
                    debug!(
                        "Consensus SV {}:{} {} from members:",
                        record.chrom,
                        record.pos + 1,
                        record.alt_allele
                    );
                    for member in cluster.members.iter() {
                        debug!("#{} ({})", member.record, member.caller);
                    }
                }
                stats.sv_output_record_count += 1;
                record
            }
        };

        if record.filter == ConsensusFilter::LowSupport {
            stats.low_support_record_count += 1;
        }
        records.push(record);
    }
    records
}

/// Merge variant calls from all input files
///
/// Input files are processed in order. Each file is read completely through `read_input`
/// before any of its records are merged, so that a file which can't be read contributes
/// nothing to the output. Such files are reported in the run stats and otherwise skipped,
/// unless strict mode is set.
///
/// # Arguments
/// * `read_input` - Read all contigs and records from an input file
///
pub fn merge_call_sets<F>(
    settings: &CallSetMergeSettings,
    inputs: &[CallerInput],
    mut read_input: F,
) -> SimpleResult<MergedCallSet>
where
    F: FnMut(&Utf8Path) -> SimpleResult<VariantFileData>,
{
    let mut cluster_map = ClusterMap::new(settings.point_window, settings.sv_window);
    let mut contigs = ContigAccumulator::default();
    let mut run_stats = MergeRunStats::default();

    for input in inputs.iter() {
        info!(
            "Reading calls from caller '{}' in file '{}'",
            input.caller, input.filename
        );
        let result = match read_input(&input.filename) {
            Ok(data) => {
                for contig in data.contigs.iter() {
                    contigs.add(contig);
                }
                let counts = add_input_records(settings, input, &data.records, &mut cluster_map);
                InputFileStatus::Merged(counts)
            }
            Err(e) => {
                if settings.strict {
                    bail!(
                        "Failed to read calls from caller '{}' in file '{}': {}",
                        input.caller,
                        input.filename,
                        e
                    );
                }
                warn!(
                    "Skipping all calls from caller '{}' in file '{}': {}",
                    input.caller, input.filename, e
                );
                InputFileStatus::Failed {
                    message: e.to_string(),
                }
            }
        };
        run_stats.input_files.push(InputFileStats {
            filename: input.filename.to_string(),
            caller: input.caller.clone(),
            force_sv: input.force_sv,
            result,
        });
    }

    let records = get_consensus_records(settings, cluster_map, &mut run_stats.consensus_stats);

    // Every output chromosome needs a contig entry in the output header
    for record in records.iter() {
        contigs.add_name(&record.chrom);
    }

    Ok(MergedCallSet {
        contigs: contigs.contigs,
        records,
        run_stats,
    })
}

/// Get caller inputs from the command-line settings
fn get_caller_inputs(settings: &cli::MergeSettings) -> Vec<CallerInput> {
    settings
        .vcf_filenames
        .iter()
        .zip(settings.callers.iter())
        .map(|(filename, caller)| CallerInput {
            filename: filename.clone(),
            caller: caller.clone(),
            force_sv: settings.force_sv_callers.contains(caller),
        })
        .collect()
}

pub fn run_merge(
    shared_settings: &cli::SharedSettings,
    settings: &cli::MergeSettings,
) -> SimpleResult<()> {
    let unplaced_chrom_regex = if settings.no_chrom_filter {
        None
    } else {
        Some(try_with!(
            Regex::new(&settings.unplaced_chrom_regex),
            "Invalid unplaced chromosome regex"
        ))
    };

    let merge_settings = CallSetMergeSettings {
        point_window: settings.point_window,
        sv_window: settings.slop,
        unplaced_chrom_regex,
        no_filter: settings.no_filter,
        strict: shared_settings.debug,
        consensus: ConsensusSettings {
            min_num_callers: settings.min_num_callers,
            output_caller_count: settings.ncallers,
        },
    };

    let inputs = get_caller_inputs(settings);
    let merged = merge_call_sets(&merge_settings, &inputs, read_variant_file)?;

    let header_info = MergedVcfHeaderInfo {
        contigs: merged.contigs,
        inputs: inputs
            .iter()
            .map(|x| CallerFileInfo {
                caller: x.caller.clone(),
                filename: x.filename.to_string(),
            })
            .collect(),
        add_low_support_filter: settings.min_num_callers > 0,
        output_caller_count: settings.ncallers,
    };
    write_merged_vcf(&settings.output_filename, &header_info, &merged.records)?;

    merged.run_stats.log_summary();
    if let Some(filename) = &settings.run_stats_filename {
        write_merge_run_stats(filename, &merged.run_stats);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant_record::test_utils::*;
    use simple_error::SimpleError;

    fn get_test_settings(strict: bool) -> CallSetMergeSettings {
        CallSetMergeSettings {
            point_window: 0,
            sv_window: 10,
            unplaced_chrom_regex: Some(
                Regex::new(crate::contig_order::DEFAULT_UNPLACED_CHROM_REGEX).unwrap(),
            ),
            no_filter: false,
            strict,
            consensus: ConsensusSettings {
                min_num_callers: 2,
                output_caller_count: true,
            },
        }
    }

    fn get_inputs(callers: &[&str]) -> Vec<CallerInput> {
        callers
            .iter()
            .map(|x| CallerInput {
                filename: Utf8PathBuf::from(format!("{x}.vcf")),
                caller: x.to_string(),
                force_sv: false,
            })
            .collect()
    }

    fn make_file_data(records: Vec<VariantRecord>) -> VariantFileData {
        VariantFileData {
            contigs: vec![ContigInfo {
                name: "chr1".to_string(),
                length: Some(248956422),
            }],
            records,
        }
    }

    /// Read input from a map of filename to test records, failing for any unknown file
    fn read_test_input(
        files: &HashMap<&str, Vec<VariantRecord>>,
        filename: &Utf8Path,
    ) -> SimpleResult<VariantFileData> {
        match files.get(filename.as_str()) {
            Some(records) => Ok(make_file_data(records.clone())),
            None => Err(SimpleError::new(format!("Can't open '{filename}'"))),
        }
    }

    #[test]
    fn test_point_records_at_median_position() {
        let files = HashMap::from([
            (
                "gatk.vcf",
                vec![
                    make_record("chr1", 100, "A", "T", &[]),
                    make_record("chr1", 95, "A", "G", &[]),
                ],
            ),
            ("freebayes.vcf", vec![make_record("chr1", 85, "A", "T", &[])]),
            ("varscan.vcf", vec![make_record("chr1", 82, "A", "T", &[])]),
        ]);
        let inputs = get_inputs(&["gatk", "freebayes", "varscan"]);
        let mut settings = get_test_settings(false);
        settings.point_window = 20;
        let merged =
            merge_call_sets(&settings, &inputs, |x| read_test_input(&files, x)).unwrap();

        let positions = merged.records.iter().map(|x| x.pos).collect::<Vec<_>>();
        assert_eq!(positions, vec![85, 95]);
        assert!(positions.is_sorted());

        let record = &merged.records[0];
        assert_eq!(record.alt_allele, "T");
        assert_eq!(record.callers, vec!["gatk", "freebayes", "varscan"]);
        assert_eq!(merged.records[1].alt_allele, "G");
    }

    #[test]
    fn test_three_caller_deletion() {
        let files = HashMap::from([
            ("manta.vcf", vec![make_deletion("chr1", 1000, 2000)]),
            ("delly.vcf", vec![make_deletion("chr1", 995, 2005)]),
            ("lumpy.vcf", vec![make_deletion("chr1", 1005, 1996)]),
        ]);
        let inputs = get_inputs(&["manta", "delly", "lumpy"]);
        let merged = merge_call_sets(&get_test_settings(false), &inputs, |x| {
            read_test_input(&files, x)
        })
        .unwrap();

        assert_eq!(merged.records.len(), 1);
        let record = &merged.records[0];
        assert_eq!(record.callers, vec!["manta", "delly", "lumpy"]);
        assert_eq!(record.filter, ConsensusFilter::Pass);
        assert_eq!(record.svtype.as_deref(), Some("DEL"));
        assert_eq!(record.svlen.as_deref(), Some("999"));

        assert_eq!(merged.contigs.len(), 1);
        let stats = &merged.run_stats;
        assert_eq!(stats.failed_file_count(), 0);
        assert_eq!(stats.consensus_stats.sv_cluster_count, 1);
        assert_eq!(stats.consensus_stats.sv_output_record_count, 1);
    }

    #[test]
    fn test_failed_file_is_dropped() {
        let files = HashMap::from([
            ("manta.vcf", vec![make_deletion("chr1", 1000, 2000)]),
            ("lumpy.vcf", vec![make_deletion("chr1", 1005, 1996)]),
        ]);
        let inputs = get_inputs(&["manta", "delly", "lumpy"]);
        let merged = merge_call_sets(&get_test_settings(false), &inputs, |x| {
            read_test_input(&files, x)
        })
        .unwrap();

        assert_eq!(merged.records.len(), 1);
        assert_eq!(merged.records[0].callers, vec!["manta", "lumpy"]);

        let stats = &merged.run_stats;
        assert_eq!(stats.failed_file_count(), 1);
        assert!(matches!(
            stats.input_files[1].result,
            InputFileStatus::Failed { .. }
        ));
        assert_eq!(stats.input_files[1].caller, "delly");
    }

    #[test]
    fn test_failed_file_strict_mode() {
        let files = HashMap::from([("manta.vcf", vec![make_deletion("chr1", 1000, 2000)])]);
        let inputs = get_inputs(&["manta", "delly"]);
        let result = merge_call_sets(&get_test_settings(true), &inputs, |x| {
            read_test_input(&files, x)
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_chrom_filter() {
        let files = HashMap::from([(
            "manta.vcf",
            vec![
                make_record("GL000220.1", 100, "A", "T", &[]),
                make_record("chr1", 100, "A", "T", &[]),
            ],
        )]);
        let inputs = get_inputs(&["manta"]);

        let merged = merge_call_sets(&get_test_settings(false), &inputs, |x| {
            read_test_input(&files, x)
        })
        .unwrap();
        assert_eq!(merged.records.len(), 1);
        assert_eq!(merged.records[0].chrom, "chr1");
        let InputFileStatus::Merged(counts) = &merged.run_stats.input_files[0].result else {
            panic!("Unexpected input file status");
        };
        assert_eq!(counts.unplaced_contig_record_count, 1);
        assert_eq!(counts.point_record_count, 1);

        let mut settings = get_test_settings(false);
        settings.unplaced_chrom_regex = None;
        let merged = merge_call_sets(&settings, &inputs, |x| read_test_input(&files, x)).unwrap();
        assert_eq!(merged.records.len(), 2);

        // Contigs missing from the input header are added for output
        assert!(merged.contigs.iter().any(|x| x.name == "GL000220.1"));
    }

    #[test]
    fn test_unplaced_mate_filter() {
        let bnd = make_record("chr1", 100, "N", "N[GL000220.1:500[", &[("SVTYPE", "BND")]);
        let files = HashMap::from([("manta.vcf", vec![bnd])]);
        let inputs = get_inputs(&["manta"]);

        let merged = merge_call_sets(&get_test_settings(false), &inputs, |x| {
            read_test_input(&files, x)
        })
        .unwrap();
        assert!(merged.records.is_empty());
        assert_eq!(merged.run_stats.consensus_stats.unplaced_mate_skip_count, 1);
    }

    #[test]
    fn test_pass_filter() {
        let mut filtered = make_record("chr1", 100, "A", "T", &[]);
        filtered.filters = vec!["LowQual".to_string()];
        let files = HashMap::from([("manta.vcf", vec![filtered])]);
        let inputs = get_inputs(&["manta"]);

        let merged = merge_call_sets(&get_test_settings(false), &inputs, |x| {
            read_test_input(&files, x)
        })
        .unwrap();
        assert!(merged.records.is_empty());

        let mut settings = get_test_settings(false);
        settings.no_filter = true;
        let merged = merge_call_sets(&settings, &inputs, |x| read_test_input(&files, x)).unwrap();
        assert_eq!(merged.records.len(), 1);
        assert_eq!(merged.records[0].filter, ConsensusFilter::LowSupport);
        assert_eq!(merged.run_stats.consensus_stats.low_support_record_count, 1);
    }

    #[test]
    fn test_forced_sv_caller() {
        let files = HashMap::from([
            ("a.vcf", vec![make_record("chr1", 100, "A", "T", &[])]),
            ("b.vcf", vec![make_record("chr1", 100, "A", "T", &[])]),
        ]);
        let mut inputs = get_inputs(&["a", "b"]);
        inputs[1].force_sv = true;

        let merged = merge_call_sets(&get_test_settings(false), &inputs, |x| {
            read_test_input(&files, x)
        })
        .unwrap();

        // The forced SV record has no mate, and can't cluster with the point record
        assert_eq!(merged.records.len(), 2);
        assert_eq!(merged.run_stats.consensus_stats.point_cluster_count, 1);
        assert_eq!(merged.run_stats.consensus_stats.sv_cluster_count, 1);
        let sv_record = merged
            .records
            .iter()
            .find(|x| x.callers == vec!["b".to_string()])
            .unwrap();
        assert_eq!(sv_record.alt_allele, "N.");
    }
}
